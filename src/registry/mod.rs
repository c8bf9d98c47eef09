//! Provider registry
//!
//! Answers which providers are usable in this session and in which order
//! they are tried. Pure: reads the configuration, never the network.

use serde::Serialize;
use std::collections::BTreeSet;

use crate::config::AssistantConfig;
use crate::types::ProviderId;

/// Settings-page description of one provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProviderDetails {
    pub provider: ProviderId,
    pub name: &'static str,
    pub model: String,
    pub description: &'static str,
    pub configured: bool,
    /// 1-based position in the fallback chain
    pub order: usize,
}

/// Snapshot of provider availability
#[derive(Debug, Clone)]
pub struct ProviderRegistry {
    details: Vec<ProviderDetails>,
    fallback: bool,
}

impl ProviderRegistry {
    pub fn from_config(config: &AssistantConfig) -> Self {
        let details = ProviderId::PRIORITY
            .into_iter()
            .map(|provider| {
                let cfg = config.provider(provider);
                ProviderDetails {
                    provider,
                    name: provider.display_name(),
                    model: cfg.model.clone(),
                    description: description(provider),
                    configured: cfg.is_available(),
                    order: provider.priority(),
                }
            })
            .collect();
        Self {
            details,
            fallback: config.fallback,
        }
    }

    /// Providers with a usable credential.
    pub fn available_providers(&self) -> BTreeSet<ProviderId> {
        self.details
            .iter()
            .filter(|d| d.configured)
            .map(|d| d.provider)
            .collect()
    }

    pub fn is_available(&self, provider: ProviderId) -> bool {
        self.details
            .iter()
            .any(|d| d.provider == provider && d.configured)
    }

    /// All providers in priority order, configured or not.
    pub fn provider_details(&self) -> &[ProviderDetails] {
        &self.details
    }

    /// Order in which providers are tried: `preferred` first, then the rest
    /// by priority. Only `preferred` when fallback is disabled.
    pub fn fallback_chain(&self, preferred: ProviderId) -> Vec<ProviderId> {
        let mut chain = vec![preferred];
        if self.fallback {
            chain.extend(ProviderId::PRIORITY.into_iter().filter(|p| *p != preferred));
        }
        chain
    }
}

fn description(provider: ProviderId) -> &'static str {
    match provider {
        ProviderId::OpenAi => "Primary narrative provider with strong analytical capabilities",
        ProviderId::Anthropic => "Detailed, careful analysis; first fallback",
        ProviderId::DeepSeek => "OpenAI-compatible, cost-efficient second fallback",
    }
}
