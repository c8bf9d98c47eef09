//! Provider configuration
//!
//! Credentials and endpoints are read once at process start and passed down
//! as an explicit [`AssistantConfig`]. A provider without a credential is
//! simply not configured for the session; that is never an error.
//!
//! Environment variables:
//! - `OPENAI_API_KEY`, `ANTHROPIC_API_KEY`, `DEEPSEEK_API_KEY`
//! - `OPENAI_BASE_URL`, `ANTHROPIC_BASE_URL`, `DEEPSEEK_BASE_URL`
//! - `OPENAI_MODEL`, `ANTHROPIC_MODEL`, `DEEPSEEK_MODEL`
//! - `ASSAY_INSIGHT_TIMEOUT_SECS`, `ASSAY_INSIGHT_TEMPERATURE`,
//!   `ASSAY_INSIGHT_MAX_TOKENS`, `ASSAY_INSIGHT_FALLBACK`

use secrecy::{ExposeSecret, SecretString};
use std::time::Duration;

use crate::error::AssistantError;
use crate::types::ProviderId;

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);
pub const DEFAULT_TEMPERATURE: f64 = 0.2;

/// Default endpoints and models per provider
pub mod defaults {
    pub const OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
    pub const OPENAI_MODEL: &str = "gpt-4o";
    pub const ANTHROPIC_BASE_URL: &str = "https://api.anthropic.com/v1";
    pub const ANTHROPIC_MODEL: &str = "claude-3-5-sonnet-20241022";
    pub const DEEPSEEK_BASE_URL: &str = "https://api.deepseek.com/v1";
    pub const DEEPSEEK_MODEL: &str = "deepseek-chat";
}

/// Connection settings for one provider.
#[derive(Clone)]
pub struct ProviderConfig {
    pub provider: ProviderId,
    pub credential: Option<SecretString>,
    pub endpoint: String,
    pub model: String,
}

impl std::fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("provider", &self.provider)
            .field("has_credential", &self.is_available())
            .field("endpoint", &self.endpoint)
            .field("model", &self.model)
            .finish()
    }
}

impl ProviderConfig {
    /// Unconfigured provider with default endpoint and model.
    pub fn new(provider: ProviderId) -> Self {
        let (endpoint, model) = match provider {
            ProviderId::OpenAi => (defaults::OPENAI_BASE_URL, defaults::OPENAI_MODEL),
            ProviderId::Anthropic => (defaults::ANTHROPIC_BASE_URL, defaults::ANTHROPIC_MODEL),
            ProviderId::DeepSeek => (defaults::DEEPSEEK_BASE_URL, defaults::DEEPSEEK_MODEL),
        };
        Self {
            provider,
            credential: None,
            endpoint: endpoint.to_string(),
            model: model.to_string(),
        }
    }

    /// Surrounding whitespace (a trailing newline from a secrets file) is
    /// stripped before the key is stored.
    pub fn with_api_key<S: Into<String>>(mut self, api_key: S) -> Self {
        let api_key = api_key.into();
        self.credential = Some(SecretString::from(api_key.trim().to_string()));
        self
    }

    pub fn with_endpoint<S: Into<String>>(mut self, endpoint: S) -> Self {
        self.endpoint = endpoint.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_model<S: Into<String>>(mut self, model: S) -> Self {
        self.model = model.into();
        self
    }

    /// Build from a key/value lookup using the provider's variable names.
    pub fn from_lookup<F>(provider: ProviderId, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::new(provider);
        if let Some(key) = non_blank(lookup(provider.api_key_env())) {
            config = config.with_api_key(key);
        }
        if let Some(url) = non_blank(lookup(provider.base_url_env())) {
            config = config.with_endpoint(url);
        }
        if let Some(model) = non_blank(lookup(provider.model_env())) {
            config = config.with_model(model);
        }
        config
    }

    /// Credential present and non-blank.
    pub fn is_available(&self) -> bool {
        self.credential
            .as_ref()
            .map(|c| !c.expose_secret().trim().is_empty())
            .unwrap_or(false)
    }
}

/// Process-wide, read-only assistant configuration.
#[derive(Debug, Clone)]
pub struct AssistantConfig {
    providers: [ProviderConfig; 3],
    pub timeout: Duration,
    pub temperature: f64,
    /// Overrides the per-report token budget when set
    pub max_tokens: Option<u32>,
    /// Try the remaining providers after the preferred one fails
    pub fallback: bool,
}

impl Default for AssistantConfig {
    fn default() -> Self {
        Self {
            providers: ProviderId::PRIORITY.map(ProviderConfig::new),
            timeout: DEFAULT_TIMEOUT,
            temperature: DEFAULT_TEMPERATURE,
            max_tokens: None,
            fallback: true,
        }
    }
}

impl AssistantConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load from the process environment.
    pub fn from_env() -> Result<Self, AssistantError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load from an arbitrary key/value source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, AssistantError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self {
            providers: ProviderId::PRIORITY.map(|p| ProviderConfig::from_lookup(p, &lookup)),
            ..Self::default()
        };

        if let Some(raw) = non_blank(lookup("ASSAY_INSIGHT_TIMEOUT_SECS")) {
            let secs: u64 = raw.trim().parse().map_err(|_| {
                AssistantError::ConfigurationError(format!(
                    "ASSAY_INSIGHT_TIMEOUT_SECS must be a whole number of seconds, got {raw}"
                ))
            })?;
            config = config.with_timeout(Duration::from_secs(secs))?;
        }
        if let Some(raw) = non_blank(lookup("ASSAY_INSIGHT_TEMPERATURE")) {
            let t: f64 = raw.trim().parse().map_err(|_| {
                AssistantError::ConfigurationError(format!(
                    "ASSAY_INSIGHT_TEMPERATURE must be a number, got {raw}"
                ))
            })?;
            config = config.with_temperature(t)?;
        }
        if let Some(raw) = non_blank(lookup("ASSAY_INSIGHT_MAX_TOKENS")) {
            let n: u32 = raw.trim().parse().map_err(|_| {
                AssistantError::ConfigurationError(format!(
                    "ASSAY_INSIGHT_MAX_TOKENS must be a positive integer, got {raw}"
                ))
            })?;
            config = config.with_max_tokens(n)?;
        }
        if let Some(raw) = non_blank(lookup("ASSAY_INSIGHT_FALLBACK")) {
            config.fallback = match raw.trim().to_lowercase().as_str() {
                "1" | "true" | "yes" | "on" => true,
                "0" | "false" | "no" | "off" => false,
                other => {
                    return Err(AssistantError::ConfigurationError(format!(
                        "ASSAY_INSIGHT_FALLBACK must be true or false, got {other}"
                    )));
                }
            };
        }

        Ok(config)
    }

    /// Replace the settings for one provider.
    pub fn with_provider(mut self, provider: ProviderConfig) -> Self {
        let slot = provider.provider.index();
        self.providers[slot] = provider;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Result<Self, AssistantError> {
        if timeout.is_zero() {
            return Err(AssistantError::ConfigurationError(
                "timeout must be greater than zero".to_string(),
            ));
        }
        self.timeout = timeout;
        Ok(self)
    }

    pub fn with_temperature(mut self, temperature: f64) -> Result<Self, AssistantError> {
        if !(0.0..=2.0).contains(&temperature) {
            return Err(AssistantError::ConfigurationError(format!(
                "temperature must be between 0.0 and 2.0, got {temperature}"
            )));
        }
        self.temperature = temperature;
        Ok(self)
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Result<Self, AssistantError> {
        if max_tokens == 0 {
            return Err(AssistantError::ConfigurationError(
                "max_tokens must be greater than zero".to_string(),
            ));
        }
        self.max_tokens = Some(max_tokens);
        Ok(self)
    }

    pub fn with_fallback(mut self, fallback: bool) -> Self {
        self.fallback = fallback;
        self
    }

    pub fn provider(&self, id: ProviderId) -> &ProviderConfig {
        &self.providers[id.index()]
    }

    pub fn providers(&self) -> impl Iterator<Item = &ProviderConfig> {
        self.providers.iter()
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}
