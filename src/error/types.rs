//! Error types

use thiserror::Error;

use crate::types::{ProviderAttempt, ProviderId};

/// Errors produced by the assistant.
///
/// Provider-level variants (`ProviderUnavailable`, `ProviderAuthError`,
/// `ProviderQuotaExceeded`, `ProviderRejected`) are consumed by the
/// orchestrator's fallback chain. Callers of `analyze` only ever see
/// `UnsupportedSubject`, `InvalidRequest`, or `AllProvidersFailed` via
/// `AnalysisResult::into_result`.
#[derive(Debug, Clone, Error)]
pub enum AssistantError {
    /// Subject outside the defined set, or without a prompt template
    #[error("Unsupported analysis subject: {0}")]
    UnsupportedSubject(String),

    /// Request invariants violated (empty dataset, blank prompt)
    #[error("Invalid analysis request: {0}")]
    InvalidRequest(String),

    /// Network failure, timeout, server error, or unusable response body
    #[error("{provider} unavailable: {message}")]
    ProviderUnavailable {
        provider: ProviderId,
        message: String,
    },

    /// Credential rejected by the provider
    #[error("{provider} rejected the credential: {message}")]
    ProviderAuthError {
        provider: ProviderId,
        message: String,
    },

    /// Rate limit or quota signal from the provider
    #[error("{provider} quota exceeded: {message}")]
    ProviderQuotaExceeded {
        provider: ProviderId,
        message: String,
    },

    /// Provider refused the request for another client-side reason
    #[error("{provider} rejected the request (HTTP {status}): {message}")]
    ProviderRejected {
        provider: ProviderId,
        status: u16,
        message: String,
    },

    /// Every provider in the fallback chain failed or was unavailable
    #[error("All providers failed: {summary}")]
    AllProvidersFailed {
        summary: String,
        attempts: Vec<ProviderAttempt>,
    },

    #[error("Configuration error: {0}")]
    ConfigurationError(String),

    #[error("JSON error: {0}")]
    JsonError(String),
}

/// Coarse classification used for presentation and fallback decisions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Validation,
    Unsupported,
    Network,
    Authentication,
    RateLimit,
    Client,
    Terminal,
    Configuration,
    Parsing,
}

impl AssistantError {
    pub fn unavailable<S: Into<String>>(provider: ProviderId, message: S) -> Self {
        Self::ProviderUnavailable {
            provider,
            message: message.into(),
        }
    }

    pub fn auth<S: Into<String>>(provider: ProviderId, message: S) -> Self {
        Self::ProviderAuthError {
            provider,
            message: message.into(),
        }
    }

    pub fn quota<S: Into<String>>(provider: ProviderId, message: S) -> Self {
        Self::ProviderQuotaExceeded {
            provider,
            message: message.into(),
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::UnsupportedSubject(_) => ErrorCategory::Unsupported,
            Self::InvalidRequest(_) => ErrorCategory::Validation,
            Self::ProviderUnavailable { .. } => ErrorCategory::Network,
            Self::ProviderAuthError { .. } => ErrorCategory::Authentication,
            Self::ProviderQuotaExceeded { .. } => ErrorCategory::RateLimit,
            Self::ProviderRejected { .. } => ErrorCategory::Client,
            Self::AllProvidersFailed { .. } => ErrorCategory::Terminal,
            Self::ConfigurationError(_) => ErrorCategory::Configuration,
            Self::JsonError(_) => ErrorCategory::Parsing,
        }
    }

    /// Whether the orchestrator should move on to the next provider.
    pub const fn triggers_fallback(&self) -> bool {
        matches!(
            self,
            Self::ProviderUnavailable { .. }
                | Self::ProviderAuthError { .. }
                | Self::ProviderQuotaExceeded { .. }
                | Self::ProviderRejected { .. }
        )
    }

    /// Whether the same provider might succeed if asked again later.
    pub const fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::ProviderUnavailable { .. } | Self::ProviderQuotaExceeded { .. }
        )
    }

    /// Failures an operator should fix in the deployment configuration.
    pub const fn is_configuration_issue(&self) -> bool {
        matches!(
            self,
            Self::ProviderAuthError { .. } | Self::ConfigurationError(_)
        )
    }

    /// Provider the error originated from, if any.
    pub const fn provider(&self) -> Option<ProviderId> {
        match self {
            Self::ProviderUnavailable { provider, .. }
            | Self::ProviderAuthError { provider, .. }
            | Self::ProviderQuotaExceeded { provider, .. }
            | Self::ProviderRejected { provider, .. } => Some(*provider),
            _ => None,
        }
    }

    /// HTTP status carried by the error, when one was observed.
    pub const fn status_code(&self) -> Option<u16> {
        match self {
            Self::ProviderRejected { status, .. } => Some(*status),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_errors_trigger_fallback() {
        let errs = [
            AssistantError::unavailable(ProviderId::OpenAi, "timeout"),
            AssistantError::auth(ProviderId::OpenAi, "bad key"),
            AssistantError::quota(ProviderId::OpenAi, "429"),
            AssistantError::ProviderRejected {
                provider: ProviderId::OpenAi,
                status: 404,
                message: "no such model".into(),
            },
        ];
        assert!(errs.iter().all(AssistantError::triggers_fallback));
        assert!(errs.iter().all(|e| e.provider() == Some(ProviderId::OpenAi)));
    }

    #[test]
    fn caller_errors_do_not_trigger_fallback() {
        assert!(!AssistantError::UnsupportedSubject("x".into()).triggers_fallback());
        assert!(!AssistantError::InvalidRequest("x".into()).triggers_fallback());
    }

    #[test]
    fn auth_is_a_configuration_issue() {
        let err = AssistantError::auth(ProviderId::Anthropic, "invalid x-api-key");
        assert!(err.is_configuration_issue());
        assert!(!err.is_retryable());
        assert_eq!(err.category(), ErrorCategory::Authentication);
        assert_eq!(
            err.to_string(),
            "anthropic rejected the credential: invalid x-api-key"
        );
    }
}
