//! Client for OpenAI-compatible `/chat/completions` endpoints.
//!
//! Serves both OpenAI and Perplexity, which share the wire format and
//! differ only in API base.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use sidechat_core::Result;

use crate::http;
use crate::registry::ProviderSpec;
use crate::traits::{ChatProvider, QueryRequest};

// ─────────────────────────────────────────────
// Wire types
// ─────────────────────────────────────────────

#[derive(Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: Vec<WireMessage<'a>>,
    max_tokens: u32,
    temperature: f64,
}

#[derive(Serialize)]
struct WireMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

// ─────────────────────────────────────────────
// ChatCompletionsProvider
// ─────────────────────────────────────────────

pub struct ChatCompletionsProvider {
    client: reqwest::Client,
    spec: &'static ProviderSpec,
    api_base: String,
}

impl std::fmt::Debug for ChatCompletionsProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChatCompletionsProvider")
            .field("provider", &self.spec.name)
            .field("api_base", &self.api_base)
            .finish()
    }
}

impl ChatCompletionsProvider {
    pub fn new(client: reqwest::Client, spec: &'static ProviderSpec, api_base: impl Into<String>) -> Self {
        Self {
            client,
            spec,
            api_base: api_base.into(),
        }
    }
}

#[async_trait]
impl ChatProvider for ChatCompletionsProvider {
    fn spec(&self) -> &'static ProviderSpec {
        self.spec
    }

    async fn send_query(&self, request: &QueryRequest) -> Result<String> {
        let url = self.spec.endpoint_url(&self.api_base, &request.model);
        debug!(provider = self.spec.name, model = %request.model, url = %url, "sending chat completion");

        let body = ChatCompletionRequest {
            model: &request.model,
            messages: vec![WireMessage {
                role: "user",
                content: &request.prompt,
            }],
            max_tokens: request.max_tokens,
            temperature: request.temperature,
        };

        let call = self
            .client
            .post(&url)
            .bearer_auth(request.api_key.expose())
            .json(&body);
        let response = http::execute(self.spec, call).await?;
        let parsed: ChatCompletionResponse = http::parse_json(self.spec, response).await?;

        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .map(|text| text.trim().to_string())
            .ok_or_else(|| http::malformed(self.spec, "missing choices[0].message.content"))
    }
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────
