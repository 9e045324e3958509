//! Error taxonomy shared by every Sidechat component.
//!
//! None of these are fatal: the front end renders `to_string()` in the
//! response area and keeps running.

use thiserror::Error;

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, SidechatError>;

#[derive(Debug, Error)]
pub enum SidechatError {
    /// Caller-side input problem (empty prompt, missing selection, blank name).
    #[error("{0}")]
    Validation(String),

    /// No key configured for the requested provider.
    #[error("no API key configured for provider '{provider}'")]
    MissingCredential { provider: String },

    /// Provider id not present in the registry.
    #[error("unknown provider '{0}'")]
    UnknownProvider(String),

    /// Non-2xx response from a vendor API.
    #[error("{provider} API error ({status}): {message}")]
    Upstream {
        provider: String,
        status: u16,
        message: String,
    },

    /// Transport failure, including timeouts.
    #[error("network error calling {provider}: {message}")]
    Network { provider: String, message: String },

    /// 2xx response whose body does not carry the expected payload.
    #[error("malformed response from {provider}: {detail}")]
    MalformedResponse { provider: String, detail: String },

    #[error("project '{0}' not found")]
    ProjectNotFound(String),

    /// A dispatch is already outstanding for this session.
    #[error("a request is already in progress")]
    RequestInFlight,

    /// Local persistence failure.
    #[error("storage error: {0}")]
    Storage(String),
}

impl SidechatError {
    pub fn validation(message: impl Into<String>) -> Self {
        SidechatError::Validation(message.into())
    }

    pub fn storage(message: impl std::fmt::Display) -> Self {
        SidechatError::Storage(message.to_string())
    }

    /// Stable short name, used as a structured log field.
    pub fn kind(&self) -> &'static str {
        match self {
            SidechatError::Validation(_) => "validation",
            SidechatError::MissingCredential { .. } => "missing_credential",
            SidechatError::UnknownProvider(_) => "unknown_provider",
            SidechatError::Upstream { .. } => "upstream",
            SidechatError::Network { .. } => "network",
            SidechatError::MalformedResponse { .. } => "malformed_response",
            SidechatError::ProjectNotFound(_) => "project_not_found",
            SidechatError::RequestInFlight => "request_in_flight",
            SidechatError::Storage(_) => "storage",
        }
    }

    /// HTTP status for upstream errors.
    pub fn status(&self) -> Option<u16> {
        match self {
            SidechatError::Upstream { status, .. } => Some(*status),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_credential_names_provider() {
        let err = SidechatError::MissingCredential {
            provider: "anthropic".into(),
        };
        assert!(err.to_string().contains("'anthropic'"));
        assert_eq!(err.kind(), "missing_credential");
    }

    #[test]
    fn test_upstream_carries_status() {
        let err = SidechatError::Upstream {
            provider: "OpenAI (GPT)".into(),
            status: 429,
            message: "Rate limit exceeded".into(),
        };
        assert_eq!(err.status(), Some(429));
        assert_eq!(
            err.to_string(),
            "OpenAI (GPT) API error (429): Rate limit exceeded"
        );
    }

    #[test]
    fn test_status_absent_for_other_kinds() {
        assert_eq!(SidechatError::RequestInFlight.status(), None);
        assert_eq!(SidechatError::validation("x").status(), None);
    }
}
