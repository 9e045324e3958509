//! Client for Google's `generateContent` endpoint.
//!
//! The key travels in the `x-goog-api-key` header rather than the query
//! string, so request URLs are safe to log.

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
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest<'a> {
    contents: Vec<Content<'a>>,
    generation_config: GenerationConfig,
}

#[derive(Serialize)]
struct Content<'a> {
    role: &'static str,
    parts: Vec<Part<'a>>,
}

#[derive(Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    max_output_tokens: u32,
    temperature: f64,
}

#[derive(Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Deserialize)]
struct CandidatePart {
    text: Option<String>,
}

// ─────────────────────────────────────────────
// GeminiProvider
// ─────────────────────────────────────────────

pub struct GeminiProvider {
    client: reqwest::Client,
    spec: &'static ProviderSpec,
    api_base: String,
}

impl GeminiProvider {
    pub fn new(client: reqwest::Client, spec: &'static ProviderSpec, api_base: impl Into<String>) -> Self {
        Self {
            client,
            spec,
            api_base: api_base.into(),
        }
    }
}

#[async_trait]
impl ChatProvider for GeminiProvider {
    fn spec(&self) -> &'static ProviderSpec {
        self.spec
    }

    async fn send_query(&self, request: &QueryRequest) -> Result<String> {
        let url = self.spec.endpoint_url(&self.api_base, &request.model);
        debug!(provider = self.spec.name, url = %url, "sending generateContent request");

        let body = GenerateContentRequest {
            contents: vec![Content {
                role: "user",
                parts: vec![Part {
                    text: &request.prompt,
                }],
            }],
            generation_config: GenerationConfig {
                max_output_tokens: request.max_tokens,
                temperature: request.temperature,
            },
        };

        let call = self
            .client
            .post(&url)
            .header("x-goog-api-key", request.api_key.expose())
            .json(&body);
        let response = http::execute(self.spec, call).await?;
        let parsed: GenerateContentResponse = http::parse_json(self.spec, response).await?;

        parsed
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .and_then(|c| c.parts.into_iter().next())
            .and_then(|p| p.text)
            .map(|text| text.trim().to_string())
            .ok_or_else(|| http::malformed(self.spec, "missing candidates[0].content.parts[0].text"))
    }
}
