//! Provider identifiers

use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::error::AssistantError;

/// Hosted completion service the assistant can talk to.
///
/// The declaration order is the fixed fallback priority:
/// `OpenAi` → `Anthropic` → `DeepSeek`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderId {
    OpenAi,
    Anthropic,
    DeepSeek,
}

impl ProviderId {
    /// All providers in fallback priority order.
    pub const PRIORITY: [ProviderId; 3] = [Self::OpenAi, Self::Anthropic, Self::DeepSeek];

    /// Stable lowercase identifier.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::OpenAi => "openai",
            Self::Anthropic => "anthropic",
            Self::DeepSeek => "deepseek",
        }
    }

    /// Human readable vendor name.
    pub const fn display_name(&self) -> &'static str {
        match self {
            Self::OpenAi => "OpenAI",
            Self::Anthropic => "Anthropic",
            Self::DeepSeek => "DeepSeek",
        }
    }

    /// Zero-based slot in [`ProviderId::PRIORITY`].
    pub const fn index(&self) -> usize {
        match self {
            Self::OpenAi => 0,
            Self::Anthropic => 1,
            Self::DeepSeek => 2,
        }
    }

    /// Position in the fallback chain (1-based, as shown on the settings page).
    pub const fn priority(&self) -> usize {
        self.index() + 1
    }

    /// Environment variable holding the credential.
    pub const fn api_key_env(&self) -> &'static str {
        match self {
            Self::OpenAi => "OPENAI_API_KEY",
            Self::Anthropic => "ANTHROPIC_API_KEY",
            Self::DeepSeek => "DEEPSEEK_API_KEY",
        }
    }

    pub const fn base_url_env(&self) -> &'static str {
        match self {
            Self::OpenAi => "OPENAI_BASE_URL",
            Self::Anthropic => "ANTHROPIC_BASE_URL",
            Self::DeepSeek => "DEEPSEEK_BASE_URL",
        }
    }

    pub const fn model_env(&self) -> &'static str {
        match self {
            Self::OpenAi => "OPENAI_MODEL",
            Self::Anthropic => "ANTHROPIC_MODEL",
            Self::DeepSeek => "DEEPSEEK_MODEL",
        }
    }
}

impl std::fmt::Display for ProviderId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ProviderId {
    type Err = AssistantError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "openai" | "open_ai" | "gpt" => Ok(Self::OpenAi),
            "anthropic" | "claude" => Ok(Self::Anthropic),
            "deepseek" | "deep_seek" => Ok(Self::DeepSeek),
            other => Err(AssistantError::ConfigurationError(format!(
                "Unknown provider: {other}"
            ))),
        }
    }
}
