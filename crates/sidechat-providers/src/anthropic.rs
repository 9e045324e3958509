//! Client for the Anthropic Messages API.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use sidechat_core::Result;

use crate::http;
use crate::registry::ProviderSpec;
use crate::traits::{ChatProvider, QueryRequest};

const ANTHROPIC_VERSION: &str = "2023-06-01";

#[derive(Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    messages: Vec<WireMessage<'a>>,
}

#[derive(Serialize)]
struct WireMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Deserialize)]
struct MessagesResponse {
    #[serde(default)]
    content: Vec<ContentBlock>,
}

#[derive(Deserialize)]
struct ContentBlock {
    text: Option<String>,
}

pub struct AnthropicProvider {
    client: reqwest::Client,
    spec: &'static ProviderSpec,
    api_base: String,
}

impl AnthropicProvider {
    pub fn new(client: reqwest::Client, spec: &'static ProviderSpec, api_base: impl Into<String>) -> Self {
        Self {
            client,
            spec,
            api_base: api_base.into(),
        }
    }
}

#[async_trait]
impl ChatProvider for AnthropicProvider {
    fn spec(&self) -> &'static ProviderSpec {
        self.spec
    }

    async fn send_query(&self, request: &QueryRequest) -> Result<String> {
        let url = self.spec.endpoint_url(&self.api_base, &request.model);
        debug!(provider = self.spec.name, model = %request.model, "sending messages request");

        let body = MessagesRequest {
            model: &request.model,
            max_tokens: request.max_tokens,
            messages: vec![WireMessage {
                role: "user",
                content: &request.prompt,
            }],
        };

        let call = self
            .client
            .post(&url)
            .header("x-api-key", request.api_key.expose())
            .header("anthropic-version", ANTHROPIC_VERSION)
            .json(&body);
        let response = http::execute(self.spec, call).await?;
        let parsed: MessagesResponse = http::parse_json(self.spec, response).await?;

        parsed
            .content
            .into_iter()
            .next()
            .and_then(|block| block.text)
            .map(|text| text.trim().to_string())
            .ok_or_else(|| http::malformed(self.spec, "missing content[0].text"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::find_by_name;
    use serde_json::json;
    use sidechat_core::Secret;
    use std::time::Duration;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn provider(base: &str) -> AnthropicProvider {
        let client = http::build_client(Duration::from_secs(5)).unwrap();
        AnthropicProvider::new(client, find_by_name("anthropic").unwrap(), base)
    }

    fn request(prompt: &str) -> QueryRequest {
        QueryRequest {
            prompt: prompt.to_string(),
            model: "claude-3-haiku-20240307".to_string(),
            api_key: Secret::new("sk-ant-test"),
            max_tokens: 4096,
            temperature: 0.7,
        }
    }

    #[tokio::test]
    async fn test_send_query_success() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/messages"))
            .and(header("x-api-key", "sk-ant-test"))
            .and(header("anthropic-version", "2023-06-01"))
            .and(body_partial_json(json!({
                "model": "claude-3-haiku-20240307",
                "max_tokens": 4096,
                "messages": [{"role": "user", "content": "Say hi"}]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": "msg_01",
                "type": "message",
                "role": "assistant",
                "content": [{"type": "text", "text": "Hi there!"}],
                "stop_reason": "end_turn"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let text = provider(&server.uri()).send_query(&request("Say hi")).await.unwrap();
        assert_eq!(text, "Hi there!");
    }

    #[tokio::test]
    async fn test_request_body_is_exact() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/messages"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "content": [{"type": "text", "text": "ok"}]
            })))
            .mount(&server)
            .await;

        provider(&server.uri()).send_query(&request("Say hi")).await.unwrap();

        let received = server.received_requests().await.unwrap();
        assert_eq!(received.len(), 1);
        let body: serde_json::Value = serde_json::from_slice(&received[0].body).unwrap();
        assert_eq!(
            body,
            json!({
                "model": "claude-3-haiku-20240307",
                "max_tokens": 4096,
                "messages": [{"role": "user", "content": "Say hi"}]
            })
        );
    }

    #[tokio::test]
    async fn test_auth_error_is_upstream() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/messages"))
            .respond_with(ResponseTemplate::new(401).set_body_json(json!({
                "type": "error",
                "error": {"type": "authentication_error", "message": "invalid x-api-key"}
            })))
            .mount(&server)
            .await;

        let err = provider(&server.uri()).send_query(&request("hi")).await.unwrap_err();
        assert_eq!(err.status(), Some(401));
        assert_eq!(
            err.to_string(),
            "Anthropic (Claude) API error (401): invalid x-api-key"
        );
    }

    #[tokio::test]
    async fn test_empty_content_is_malformed() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"content": []})))
            .mount(&server)
            .await;

        let err = provider(&server.uri()).send_query(&request("hi")).await.unwrap_err();
        assert_eq!(err.kind(), "malformed_response");
    }
}
