//! Provider registry: static specs for every supported vendor.
//!
//! Each `ProviderSpec` says how to reach one vendor (default API base, wire
//! format) and which models it offers. The first model listed is the
//! provider's default.

use sidechat_core::{Result, SidechatError};

// ─────────────────────────────────────────────
// Spec types
// ─────────────────────────────────────────────

/// Request/response shape a provider speaks.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WireFormat {
    /// `POST {base}/chat/completions` (OpenAI and compatible vendors).
    ChatCompletions,
    /// `POST {base}/messages`.
    AnthropicMessages,
    /// `POST {base}/models/{model}:generateContent`.
    GeminiGenerateContent,
    /// Text-to-speech only; not a chat provider.
    Speech,
}

#[derive(Clone, Debug)]
pub struct ModelSpec {
    pub id: &'static str,
    pub description: &'static str,
    /// Context window advertised by the vendor.
    pub max_tokens: u32,
}

/// Static specification describing one provider.
#[derive(Clone, Debug)]
pub struct ProviderSpec {
    /// Internal name, also the credential key (e.g. `"anthropic"`).
    pub name: &'static str,
    /// Human-readable name used in errors and listings.
    pub display_name: &'static str,
    pub default_api_base: &'static str,
    pub wire: WireFormat,
    pub models: &'static [ModelSpec],
}

impl ProviderSpec {
    pub fn is_chat(&self) -> bool {
        self.wire != WireFormat::Speech
    }

    pub fn default_model(&self) -> Option<&'static str> {
        self.models.first().map(|m| m.id)
    }

    pub fn model(&self, id: &str) -> Option<&'static ModelSpec> {
        self.models.iter().find(|m| m.id == id)
    }

    /// Request URL for `model` against `base`.
    ///
    /// Speech providers have several endpoints, so `base` is returned as is.
    pub fn endpoint_url(&self, base: &str, model: &str) -> String {
        let base = base.trim_end_matches('/');
        match self.wire {
            WireFormat::ChatCompletions => format!("{}/chat/completions", base),
            WireFormat::AnthropicMessages => format!("{}/messages", base),
            WireFormat::GeminiGenerateContent => {
                format!("{}/models/{}:generateContent", base, model)
            }
            WireFormat::Speech => base.to_string(),
        }
    }

    /// Tokens to request for a response: half the model's window, capped
    /// at 4096. Models not in the table get 500.
    pub fn response_token_budget(&self, model: &str) -> u32 {
        match self.model(model) {
            Some(spec) => (spec.max_tokens / 2).min(MAX_RESPONSE_TOKENS),
            None => FALLBACK_RESPONSE_TOKENS,
        }
    }
}

const MAX_RESPONSE_TOKENS: u32 = 4096;
const FALLBACK_RESPONSE_TOKENS: u32 = 500;

// ─────────────────────────────────────────────
// All providers
// ─────────────────────────────────────────────

pub static PROVIDERS: &[ProviderSpec] = &[
    ProviderSpec {
        name: "openai",
        display_name: "OpenAI (GPT)",
        default_api_base: "https://api.openai.com/v1",
        wire: WireFormat::ChatCompletions,
        models: &[
            ModelSpec {
                id: "gpt-3.5-turbo",
                description: "Fast and cost-effective",
                max_tokens: 4096,
            },
            ModelSpec {
                id: "gpt-4",
                description: "Most capable GPT model",
                max_tokens: 8192,
            },
        ],
    },
    ProviderSpec {
        name: "anthropic",
        display_name: "Anthropic (Claude)",
        default_api_base: "https://api.anthropic.com/v1",
        wire: WireFormat::AnthropicMessages,
        models: &[
            ModelSpec {
                id: "claude-3-haiku-20240307",
                description: "Fastest Claude model",
                max_tokens: 200_000,
            },
            ModelSpec {
                id: "claude-3-sonnet-20240229",
                description: "Balanced speed and capability",
                max_tokens: 200_000,
            },
            ModelSpec {
                id: "claude-3-opus-20240229",
                description: "Most capable Claude model",
                max_tokens: 200_000,
            },
        ],
    },
    ProviderSpec {
        name: "gemini",
        display_name: "Google (Gemini)",
        default_api_base: "https://generativelanguage.googleapis.com/v1",
        wire: WireFormat::GeminiGenerateContent,
        models: &[
            ModelSpec {
                id: "gemini-pro",
                description: "Text generation",
                max_tokens: 8192,
            },
            ModelSpec {
                id: "gemini-pro-vision",
                description: "Text and image input",
                max_tokens: 8192,
            },
        ],
    },
    ProviderSpec {
        name: "perplexity",
        display_name: "Perplexity",
        default_api_base: "https://api.perplexity.ai",
        wire: WireFormat::ChatCompletions,
        models: &[
            ModelSpec {
                id: "sonar-small-online",
                description: "Small model with web search",
                max_tokens: 4096,
            },
            ModelSpec {
                id: "sonar-medium-online",
                description: "Medium model with web search",
                max_tokens: 4096,
            },
        ],
    },
    ProviderSpec {
        name: "elevenlabs",
        display_name: "ElevenLabs",
        default_api_base: "https://api.elevenlabs.io/v1",
        wire: WireFormat::Speech,
        models: &[],
    },
];

// ─────────────────────────────────────────────
// Lookup
// ─────────────────────────────────────────────

pub fn find_by_name(name: &str) -> Option<&'static ProviderSpec> {
    PROVIDERS.iter().find(|s| s.name == name)
}

/// Like [`find_by_name`], but an unknown name is an error.
pub fn describe(name: &str) -> Result<&'static ProviderSpec> {
    find_by_name(name).ok_or_else(|| SidechatError::UnknownProvider(name.to_string()))
}

/// Model ids for a provider, in table order.
pub fn models_for(name: &str) -> Result<Vec<&'static str>> {
    Ok(describe(name)?.models.iter().map(|m| m.id).collect())
}

pub fn chat_providers() -> impl Iterator<Item = &'static ProviderSpec> {
    PROVIDERS.iter().filter(|s| s.is_chat())
}

/// Human-friendly model name: `"gpt-3.5-turbo"` → `"Gpt 3.5 Turbo"`.
pub fn model_display_name(model: &str) -> String {
    model
        .split('-')
        .filter(|part| !part.is_empty())
        .map(|part| {
            let mut chars = part.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join(" ")
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_find_by_name() {
        let spec = find_by_name("anthropic").unwrap();
        assert_eq!(spec.display_name, "Anthropic (Claude)");
        assert_eq!(spec.wire, WireFormat::AnthropicMessages);
        assert!(find_by_name("groq").is_none());
    }

    #[test]
    fn test_describe_unknown() {
        let err = describe("groq").unwrap_err();
        assert!(matches!(err, SidechatError::UnknownProvider(ref n) if n == "groq"));
    }

    #[test]
    fn test_models_for_in_order() {
        assert_eq!(
            models_for("anthropic").unwrap(),
            vec![
                "claude-3-haiku-20240307",
                "claude-3-sonnet-20240229",
                "claude-3-opus-20240229"
            ]
        );
        assert!(models_for("elevenlabs").unwrap().is_empty());
        assert!(models_for("nope").is_err());
    }

    #[test]
    fn test_default_model_is_first() {
        assert_eq!(find_by_name("openai").unwrap().default_model(), Some("gpt-3.5-turbo"));
        assert_eq!(find_by_name("gemini").unwrap().default_model(), Some("gemini-pro"));
        assert_eq!(find_by_name("elevenlabs").unwrap().default_model(), None);
    }

    #[test]
    fn test_chat_providers_exclude_speech() {
        let names: Vec<&str> = chat_providers().map(|s| s.name).collect();
        assert_eq!(names, vec!["openai", "anthropic", "gemini", "perplexity"]);
    }

    #[test]
    fn test_endpoint_url() {
        let openai = find_by_name("openai").unwrap();
        assert_eq!(
            openai.endpoint_url("https://api.openai.com/v1/", "gpt-4"),
            "https://api.openai.com/v1/chat/completions"
        );

        let perplexity = find_by_name("perplexity").unwrap();
        assert_eq!(
            perplexity.endpoint_url(perplexity.default_api_base, "sonar-small-online"),
            "https://api.perplexity.ai/chat/completions"
        );

        let anthropic = find_by_name("anthropic").unwrap();
        assert_eq!(
            anthropic.endpoint_url(anthropic.default_api_base, "claude-3-haiku-20240307"),
            "https://api.anthropic.com/v1/messages"
        );

        let gemini = find_by_name("gemini").unwrap();
        assert_eq!(
            gemini.endpoint_url(gemini.default_api_base, "gemini-pro"),
            "https://generativelanguage.googleapis.com/v1/models/gemini-pro:generateContent"
        );
    }

    #[test]
    fn test_response_token_budget() {
        let openai = find_by_name("openai").unwrap();
        assert_eq!(openai.response_token_budget("gpt-3.5-turbo"), 2048);
        assert_eq!(openai.response_token_budget("gpt-4"), 4096);
        assert_eq!(openai.response_token_budget("gpt-9"), 500);

        let anthropic = find_by_name("anthropic").unwrap();
        assert_eq!(anthropic.response_token_budget("claude-3-opus-20240229"), 4096);
    }

    #[test]
    fn test_model_display_name() {
        assert_eq!(model_display_name("gpt-3.5-turbo"), "Gpt 3.5 Turbo");
        assert_eq!(model_display_name("sonar-small-online"), "Sonar Small Online");
        assert_eq!(model_display_name("gpt-4"), "Gpt 4");
    }

    #[test]
    fn test_provider_names_match_credential_keys() {
        let names: Vec<&str> = PROVIDERS.iter().map(|s| s.name).collect();
        assert_eq!(names, sidechat_core::credentials::KNOWN_PROVIDERS);
    }
}
