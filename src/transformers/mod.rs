//! Transformers
//!
//! Request/response transformation between the shared prompt and each
//! provider's wire format. The prompt is built once; each provider only
//! wraps it in its own envelope.

pub mod request;
pub mod response;

pub use request::RequestTransformer;
pub use response::{RawResponse, ResponseTransformer, Usage};

use serde::Serialize;

use crate::config::AssistantConfig;
use crate::error::AssistantError;
use crate::prompt::{Prompt, PromptCatalog};
use crate::providers;
use crate::types::{AnalysisRequest, ProviderId};

/// Provider-specific request body, ready to send.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProviderPayload {
    pub provider: ProviderId,
    pub model: String,
    pub body: serde_json::Value,
}

impl ProviderPayload {
    /// Serialized size of the body in bytes.
    pub fn body_len(&self) -> usize {
        serde_json::to_vec(&self.body).map(|b| b.len()).unwrap_or(0)
    }
}

/// Build the payload for `provider` with the default prompt catalog.
pub fn format(
    request: &AnalysisRequest,
    provider: ProviderId,
    config: &AssistantConfig,
) -> Result<ProviderPayload, AssistantError> {
    format_with(&PromptCatalog::default(), request, provider, config)
}

/// Build the payload for `provider` with a specific prompt catalog.
pub fn format_with(
    catalog: &PromptCatalog,
    request: &AnalysisRequest,
    provider: ProviderId,
    config: &AssistantConfig,
) -> Result<ProviderPayload, AssistantError> {
    let prompt = catalog.build(request, config)?;
    encode(&prompt, provider, config)
}

/// Wrap an already built prompt in `provider`'s envelope.
pub fn encode(
    prompt: &Prompt,
    provider: ProviderId,
    config: &AssistantConfig,
) -> Result<ProviderPayload, AssistantError> {
    let model = config.provider(provider).model.clone();
    let transformer = providers::spec_for(provider).request_transformer();
    let body = transformer.transform_chat(prompt, &model)?;
    Ok(ProviderPayload {
        provider,
        model,
        body,
    })
}
