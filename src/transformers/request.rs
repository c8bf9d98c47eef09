//! Request transformation traits
//!
//! Converts the provider-neutral [`Prompt`] into a provider-specific JSON body.

use crate::error::AssistantError;
use crate::prompt::Prompt;
use crate::types::ProviderId;

/// Transform a prompt into a provider-specific payload
pub trait RequestTransformer: Send + Sync {
    /// Provider the produced body is meant for
    fn provider_id(&self) -> ProviderId;

    /// Build the JSON body for a chat completion with `model`
    fn transform_chat(&self, prompt: &Prompt, model: &str) -> Result<serde_json::Value, AssistantError>;
}

/// Checks shared by every transformer before a body is built.
pub(crate) fn check_prompt(
    provider: ProviderId,
    prompt: &Prompt,
    model: &str,
) -> Result<(), AssistantError> {
    if model.trim().is_empty() {
        return Err(AssistantError::ConfigurationError(format!(
            "{provider}: model must be specified"
        )));
    }
    if prompt.user.trim().is_empty() {
        return Err(AssistantError::InvalidRequest(
            "user message must not be empty".to_string(),
        ));
    }
    if prompt.max_tokens == 0 {
        return Err(AssistantError::ConfigurationError(format!(
            "{provider}: max_tokens must be greater than zero"
        )));
    }
    Ok(())
}
