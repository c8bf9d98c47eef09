//! Response transformation traits
//!
//! Pulls the completion text out of a provider's JSON response.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::AssistantError;
use crate::types::ProviderId;

/// Token accounting reported by the provider, when present.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Usage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
}

impl Usage {
    pub const fn total(&self) -> u32 {
        self.prompt_tokens + self.completion_tokens
    }
}

/// Completion text as returned by a provider, before normalization.
#[derive(Debug, Clone, PartialEq)]
pub struct RawResponse {
    pub provider: ProviderId,
    /// Model reported by the provider (falls back to the requested one)
    pub model: Option<String>,
    pub text: String,
    pub usage: Option<Usage>,
    /// When the completion arrived; carried into the result unchanged
    pub received_at: DateTime<Utc>,
}

impl RawResponse {
    pub fn new<S: Into<String>>(provider: ProviderId, text: S) -> Self {
        Self {
            provider,
            model: None,
            text: text.into(),
            usage: None,
            received_at: Utc::now(),
        }
    }

    pub fn with_model<S: Into<String>>(mut self, model: S) -> Self {
        self.model = Some(model.into());
        self
    }

    pub fn with_received_at(mut self, received_at: DateTime<Utc>) -> Self {
        self.received_at = received_at;
        self
    }

    pub fn with_usage(mut self, usage: Usage) -> Self {
        self.usage = Some(usage);
        self
    }
}

/// Transform provider-specific response JSON into a [`RawResponse`]
pub trait ResponseTransformer: Send + Sync {
    fn provider_id(&self) -> ProviderId;

    /// A body without usable text is an [`AssistantError::ProviderUnavailable`].
    fn transform_chat_response(&self, raw: &serde_json::Value) -> Result<RawResponse, AssistantError>;
}
