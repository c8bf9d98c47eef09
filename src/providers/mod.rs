//! Provider specs
//!
//! A [`ProviderSpec`] describes everything provider-specific about one chat
//! call: the URL, the authentication headers and the request/response
//! transformers. The HTTP plumbing itself lives in [`crate::executors`].

pub mod anthropic;
pub mod headers;
pub mod openai_compatible;

use reqwest::header::HeaderMap;
use secrecy::SecretString;
use std::sync::Arc;

use crate::error::AssistantError;
use crate::transformers::{RequestTransformer, ResponseTransformer};
use crate::types::ProviderId;

pub use anthropic::AnthropicSpec;
pub use openai_compatible::OpenAiCompatibleSpec;

/// Provider-specific pieces of a chat request
pub trait ProviderSpec: Send + Sync {
    fn id(&self) -> ProviderId;

    /// Full chat URL for the configured base endpoint
    fn chat_url(&self, endpoint: &str) -> String;

    /// Authentication and content headers
    fn build_headers(&self, api_key: &SecretString) -> Result<HeaderMap, AssistantError>;

    fn request_transformer(&self) -> Arc<dyn RequestTransformer>;

    fn response_transformer(&self) -> Arc<dyn ResponseTransformer>;
}

/// Spec for a provider id.
pub fn spec_for(provider: ProviderId) -> Arc<dyn ProviderSpec> {
    match provider {
        ProviderId::OpenAi => Arc::new(OpenAiCompatibleSpec::openai()),
        ProviderId::Anthropic => Arc::new(AnthropicSpec),
        ProviderId::DeepSeek => Arc::new(OpenAiCompatibleSpec::deepseek()),
    }
}
