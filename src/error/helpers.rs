//! User-facing error helpers.
//!
//! Structured summaries and friendly suggestions suitable for dashboard
//! rendering, kept provider-agnostic apart from the credential hints.

use serde::{Deserialize, Serialize};

use super::types::{AssistantError, ErrorCategory};
use crate::types::FailureDetail;

/// Error kind for presentation (coarse-grained)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Auth,
    RateLimit,
    Client,
    Network,
    Parsing,
    Validation,
    Unsupported,
    Configuration,
    Unknown,
}

/// Structured error summary for UI consumption
#[derive(Debug, Clone)]
pub struct ErrorSummary {
    pub kind: ErrorKind,
    pub status: Option<u16>,
    pub message: String,
    pub suggestions: Vec<String>,
}

/// Summarize an error with friendly suggestions.
pub fn summarize_error(err: &AssistantError) -> ErrorSummary {
    ErrorSummary {
        kind: map_error_kind(err),
        status: err.status_code(),
        message: err.to_string(),
        suggestions: suggest_fixes(err),
    }
}

/// Map an error to its presentation kind.
pub fn map_error_kind(err: &AssistantError) -> ErrorKind {
    match err.category() {
        ErrorCategory::Authentication => ErrorKind::Auth,
        ErrorCategory::RateLimit => ErrorKind::RateLimit,
        ErrorCategory::Client => ErrorKind::Client,
        ErrorCategory::Network => ErrorKind::Network,
        ErrorCategory::Parsing => ErrorKind::Parsing,
        ErrorCategory::Validation => ErrorKind::Validation,
        ErrorCategory::Unsupported => ErrorKind::Unsupported,
        ErrorCategory::Configuration => ErrorKind::Configuration,
        ErrorCategory::Terminal => ErrorKind::Unknown,
    }
}

/// Suggest next steps for the dashboard user or operator.
pub fn suggest_fixes(err: &AssistantError) -> Vec<String> {
    let mut out = Vec::new();
    match err {
        AssistantError::ProviderAuthError { provider, .. } => {
            out.push(format!(
                "Check the {} credential in {}",
                provider.display_name(),
                provider.api_key_env()
            ));
            out.push("Rotate the key if it was revoked or expired".to_string());
        }
        AssistantError::ProviderQuotaExceeded { provider, .. } => {
            out.push(format!(
                "Review the {} plan limits and billing status",
                provider.display_name()
            ));
            out.push("Wait a moment before requesting another analysis".to_string());
        }
        AssistantError::ProviderUnavailable { .. } => {
            out.push("Check network connectivity from the dashboard host".to_string());
            out.push("Try again later; the provider may be degraded".to_string());
        }
        AssistantError::ProviderRejected { provider, .. } => {
            out.push(format!(
                "Verify the model name and endpoint configured for {}",
                provider.display_name()
            ));
        }
        AssistantError::AllProvidersFailed { .. } => {
            out.push("Configure at least one working AI provider on the Settings page".to_string());
            out.push("The statistical overview remains available without AI".to_string());
        }
        AssistantError::InvalidRequest(_) => {
            out.push("Select a non-empty date range and enter a question".to_string());
        }
        AssistantError::UnsupportedSubject(_) => {
            out.push("Use one of: daily_monitoring, trainee_evaluation, interlab_comparison, gold_type_analysis, mass_impact".to_string());
        }
        AssistantError::ConfigurationError(_) => {
            out.push("Review the ASSAY_INSIGHT_* and provider environment variables".to_string());
        }
        AssistantError::JsonError(_) => {
            out.push("Check that the request body is valid JSON".to_string());
        }
    }
    out
}

impl From<&AssistantError> for FailureDetail {
    fn from(err: &AssistantError) -> Self {
        let summary = summarize_error(err);
        Self {
            kind: summary.kind,
            summary: summary.message,
            suggestions: summary.suggestions,
        }
    }
}
