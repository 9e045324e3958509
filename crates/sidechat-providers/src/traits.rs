//! Chat provider trait: one implementation per wire format.
//!
//! The dispatcher resolves credentials and model defaults, then hands a fully
//! populated [`QueryRequest`] to the provider registered under that name.

use async_trait::async_trait;
use sidechat_core::{Result, Secret};

use crate::registry::ProviderSpec;

/// Everything one upstream call needs.
#[derive(Clone, Debug)]
pub struct QueryRequest {
    pub prompt: String,
    pub model: String,
    /// Redacted in `Debug`.
    pub api_key: Secret,
    /// Response token budget.
    pub max_tokens: u32,
    /// Sampling temperature (0.0 – 2.0).
    pub temperature: f64,
}

/// A single-turn text generation backend.
#[async_trait]
pub trait ChatProvider: Send + Sync {
    /// Static metadata for the provider this instance talks to.
    fn spec(&self) -> &'static ProviderSpec;

    /// Send one prompt and return the generated text.
    ///
    /// Exactly one HTTP call. No retries, no streaming.
    async fn send_query(&self, request: &QueryRequest) -> Result<String>;

    fn name(&self) -> &'static str {
        self.spec().name
    }
}
