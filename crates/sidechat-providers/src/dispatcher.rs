//! Request dispatcher: provider id + prompt → generated text.
//!
//! Holds one provider client per chat vendor, all sharing a single
//! `reqwest::Client`. The only state is immutable configuration, so one
//! dispatcher can serve any number of concurrent sessions.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::{debug, info, warn};

use sidechat_core::config::Config;
use sidechat_core::{CredentialStore, Result, SidechatError};

use crate::anthropic::AnthropicProvider;
use crate::gemini::GeminiProvider;
use crate::http;
use crate::openai::ChatCompletionsProvider;
use crate::registry::{self, ProviderSpec, WireFormat};
use crate::traits::{ChatProvider, QueryRequest};

// ─────────────────────────────────────────────
// Options
// ─────────────────────────────────────────────

/// Connection settings shared by the dispatcher and speech client.
#[derive(Clone, Debug)]
pub struct DispatchOptions {
    pub timeout: Duration,
    pub temperature: f64,
    /// Per-provider API base overrides, keyed by provider name.
    pub api_bases: HashMap<String, String>,
}

impl Default for DispatchOptions {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            temperature: 0.7,
            api_bases: HashMap::new(),
        }
    }
}

impl DispatchOptions {
    pub fn from_config(config: &Config) -> Self {
        Self {
            timeout: Duration::from_secs(config.dispatch.timeout_secs),
            temperature: config.dispatch.temperature,
            api_bases: config.providers.api_bases(),
        }
    }

    /// Configured override, or the registry default.
    pub fn api_base_for(&self, spec: &ProviderSpec) -> String {
        self.api_bases
            .get(spec.name)
            .cloned()
            .unwrap_or_else(|| spec.default_api_base.to_string())
    }
}

// ─────────────────────────────────────────────
// Completion
// ─────────────────────────────────────────────

/// Successful dispatch result.
#[derive(Clone, Debug, PartialEq)]
pub struct Completion {
    pub text: String,
    pub provider: String,
    /// The model actually used (after defaulting).
    pub model: String,
}

// ─────────────────────────────────────────────
// Dispatcher
// ─────────────────────────────────────────────

pub struct Dispatcher {
    credentials: Arc<CredentialStore>,
    providers: HashMap<&'static str, Arc<dyn ChatProvider>>,
    temperature: f64,
}

impl Dispatcher {
    /// Build a dispatcher with a client for every chat provider in the registry.
    pub fn new(credentials: Arc<CredentialStore>, options: &DispatchOptions) -> Result<Self> {
        let client = http::build_client(options.timeout)?;
        let mut providers: HashMap<&'static str, Arc<dyn ChatProvider>> = HashMap::new();

        for spec in registry::chat_providers() {
            let base = options.api_base_for(spec);
            let provider: Arc<dyn ChatProvider> = match spec.wire {
                WireFormat::ChatCompletions => {
                    Arc::new(ChatCompletionsProvider::new(client.clone(), spec, base))
                }
                WireFormat::AnthropicMessages => {
                    Arc::new(AnthropicProvider::new(client.clone(), spec, base))
                }
                WireFormat::GeminiGenerateContent => {
                    Arc::new(GeminiProvider::new(client.clone(), spec, base))
                }
                WireFormat::Speech => continue,
            };
            providers.insert(spec.name, provider);
        }

        debug!(providers = providers.len(), timeout = ?options.timeout, "dispatcher ready");
        Ok(Self {
            credentials,
            providers,
            temperature: options.temperature,
        })
    }

    /// Build with the dispatch section of loaded config.
    pub fn from_config(credentials: Arc<CredentialStore>, config: &Config) -> Result<Self> {
        Self::new(credentials, &DispatchOptions::from_config(config))
    }

    /// Register (or replace) the client used for `provider.name()`.
    pub fn with_provider(mut self, provider: Arc<dyn ChatProvider>) -> Self {
        self.providers.insert(provider.name(), provider);
        self
    }

    /// Send `prompt` to `provider`.
    ///
    /// Checks run in a fixed order so the error names the first problem:
    /// blank prompt, unknown provider, non-chat provider, missing key. Only
    /// then is one HTTP call made. `model` defaults to the provider's first.
    pub async fn send(&self, provider: &str, prompt: &str, model: Option<&str>) -> Result<Completion> {
        if prompt.trim().is_empty() {
            return Err(SidechatError::validation("prompt cannot be empty"));
        }

        let spec = registry::describe(provider)?;
        if !spec.is_chat() {
            return Err(SidechatError::validation(format!(
                "'{}' is not a chat provider",
                provider
            )));
        }
        let client = self
            .providers
            .get(spec.name)
            .ok_or_else(|| SidechatError::UnknownProvider(provider.to_string()))?;

        let api_key = self
            .credentials
            .get(spec.name)
            .ok_or_else(|| SidechatError::MissingCredential {
                provider: spec.name.to_string(),
            })?;

        let model = match model.map(str::trim).filter(|m| !m.is_empty()) {
            Some(m) => m.to_string(),
            None => spec
                .default_model()
                .ok_or_else(|| SidechatError::validation(format!("'{}' has no models", provider)))?
                .to_string(),
        };
        if spec.model(&model).is_none() {
            warn!(provider = spec.name, model = %model, "model not in registry, using fallback token budget");
        }

        let request = QueryRequest {
            prompt: prompt.to_string(),
            max_tokens: spec.response_token_budget(&model),
            model,
            api_key,
            temperature: self.temperature,
        };

        let started = Instant::now();
        let result = client.send_query(&request).await;
        let elapsed_ms = started.elapsed().as_millis() as u64;

        match result {
            Ok(text) => {
                info!(
                    provider = spec.name,
                    model = %request.model,
                    elapsed_ms,
                    chars = text.chars().count(),
                    "query completed"
                );
                Ok(Completion {
                    text,
                    provider: spec.name.to_string(),
                    model: request.model,
                })
            }
            Err(e) => {
                warn!(
                    provider = spec.name,
                    model = %request.model,
                    kind = e.kind(),
                    status = e.status(),
                    elapsed_ms,
                    "query failed"
                );
                Err(e)
            }
        }
    }

    /// Whether `provider` is a chat provider with a configured key.
    pub fn is_provider_available(&self, provider: &str) -> bool {
        registry::find_by_name(provider).is_some_and(|spec| {
            spec.is_chat() && self.providers.contains_key(spec.name) && self.credentials.is_available(spec.name)
        })
    }

    /// Registered chat providers, in registry order.
    pub fn chat_providers(&self) -> Vec<&'static ProviderSpec> {
        registry::chat_providers()
            .filter(|spec| self.providers.contains_key(spec.name))
            .collect()
    }
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────
