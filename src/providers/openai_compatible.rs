//! OpenAI-compatible chat completions
//!
//! OpenAI and DeepSeek speak the same `/chat/completions` protocol; only the
//! base URL, the default model and the provider id differ.

use reqwest::header::HeaderMap;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use std::sync::Arc;

use super::ProviderSpec;
use super::headers::HttpHeaderBuilder;
use crate::error::AssistantError;
use crate::prompt::Prompt;
use crate::transformers::{RawResponse, RequestTransformer, ResponseTransformer, Usage};
use crate::types::ProviderId;

/// Request transformer for OpenAI-compatible providers
#[derive(Debug, Clone, Copy)]
pub struct OpenAiCompatibleRequestTransformer {
    pub provider: ProviderId,
}

impl RequestTransformer for OpenAiCompatibleRequestTransformer {
    fn provider_id(&self) -> ProviderId {
        self.provider
    }

    fn transform_chat(&self, prompt: &Prompt, model: &str) -> Result<serde_json::Value, AssistantError> {
        crate::transformers::request::check_prompt(self.provider, prompt, model)?;
        Ok(serde_json::json!({
            "model": model,
            "messages": [
                { "role": "system", "content": prompt.system },
                { "role": "user", "content": prompt.user },
            ],
            "temperature": prompt.temperature,
            "max_tokens": prompt.max_tokens,
        }))
    }
}

#[derive(Debug, Deserialize)]
struct ChatCompletion {
    #[serde(default)]
    model: Option<String>,
    #[serde(default)]
    choices: Vec<Choice>,
    #[serde(default)]
    usage: Option<CompletionUsage>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CompletionUsage {
    #[serde(default)]
    prompt_tokens: u32,
    #[serde(default)]
    completion_tokens: u32,
}

/// Response transformer for OpenAI-compatible providers
#[derive(Debug, Clone, Copy)]
pub struct OpenAiCompatibleResponseTransformer {
    pub provider: ProviderId,
}

impl ResponseTransformer for OpenAiCompatibleResponseTransformer {
    fn provider_id(&self) -> ProviderId {
        self.provider
    }

    fn transform_chat_response(&self, raw: &serde_json::Value) -> Result<RawResponse, AssistantError> {
        let completion: ChatCompletion = serde_json::from_value(raw.clone()).map_err(|e| {
            AssistantError::unavailable(self.provider, format!("invalid chat completion: {e}"))
        })?;

        let text = completion
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .filter(|t| !t.trim().is_empty())
            .ok_or_else(|| AssistantError::unavailable(self.provider, "empty completion"))?;

        let mut response = RawResponse::new(self.provider, text);
        response.model = completion.model;
        if let Some(u) = completion.usage {
            response = response.with_usage(Usage {
                prompt_tokens: u.prompt_tokens,
                completion_tokens: u.completion_tokens,
            });
        }
        Ok(response)
    }
}

/// Endpoint, headers and transformers for an OpenAI-compatible provider
#[derive(Debug, Clone, Copy)]
pub struct OpenAiCompatibleSpec {
    provider: ProviderId,
}

impl OpenAiCompatibleSpec {
    pub const fn openai() -> Self {
        Self {
            provider: ProviderId::OpenAi,
        }
    }

    pub const fn deepseek() -> Self {
        Self {
            provider: ProviderId::DeepSeek,
        }
    }
}

impl ProviderSpec for OpenAiCompatibleSpec {
    fn id(&self) -> ProviderId {
        self.provider
    }

    fn chat_url(&self, endpoint: &str) -> String {
        format!("{}/chat/completions", endpoint.trim_end_matches('/'))
    }

    fn build_headers(&self, api_key: &SecretString) -> Result<HeaderMap, AssistantError> {
        Ok(HttpHeaderBuilder::new(self.provider)
            .with_bearer_auth(api_key.expose_secret())?
            .with_json_content_type()
            .with_user_agent()
            .build())
    }

    fn request_transformer(&self) -> Arc<dyn RequestTransformer> {
        Arc::new(OpenAiCompatibleRequestTransformer {
            provider: self.provider,
        })
    }

    fn response_transformer(&self) -> Arc<dyn ResponseTransformer> {
        Arc::new(OpenAiCompatibleResponseTransformer {
            provider: self.provider,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn prompt() -> Prompt {
        Prompt {
            system: "You are an assay analyst.".into(),
            user: "Summarize.".into(),
            max_tokens: 800,
            temperature: 0.2,
        }
    }

    #[test]
    fn body_has_system_and_user_messages() {
        let tx = OpenAiCompatibleRequestTransformer {
            provider: ProviderId::OpenAi,
        };
        let body = tx.transform_chat(&prompt(), "gpt-4o").unwrap();
        assert_eq!(body["model"], "gpt-4o");
        assert_eq!(body["messages"][0]["role"], "system");
        assert_eq!(body["messages"][1]["content"], "Summarize.");
        assert_eq!(body["max_tokens"], 800);
        assert_eq!(body["temperature"], 0.2);
    }

    #[test]
    fn blank_model_is_rejected() {
        let tx = OpenAiCompatibleRequestTransformer {
            provider: ProviderId::DeepSeek,
        };
        let err = tx.transform_chat(&prompt(), " ").unwrap_err();
        assert!(matches!(err, AssistantError::ConfigurationError(_)));
    }

    #[test]
    fn extracts_first_choice() {
        let tx = OpenAiCompatibleResponseTransformer {
            provider: ProviderId::DeepSeek,
        };
        let raw = serde_json::json!({
            "id": "chatcmpl-1",
            "model": "deepseek-chat",
            "choices": [{"index": 0, "message": {"role": "assistant", "content": "All good."}}],
            "usage": {"prompt_tokens": 120, "completion_tokens": 8, "total_tokens": 128}
        });
        let resp = tx.transform_chat_response(&raw).unwrap();
        assert_eq!(resp.text, "All good.");
        assert_eq!(resp.model.as_deref(), Some("deepseek-chat"));
        assert_eq!(resp.usage.map(|u| u.total()), Some(128));
    }

    #[test]
    fn empty_choices_are_unavailable() {
        let tx = OpenAiCompatibleResponseTransformer {
            provider: ProviderId::OpenAi,
        };
        let err = tx
            .transform_chat_response(&serde_json::json!({"choices": []}))
            .unwrap_err();
        assert!(matches!(err, AssistantError::ProviderUnavailable { .. }));
    }

    #[test]
    fn chat_url_appends_path() {
        assert_eq!(
            OpenAiCompatibleSpec::deepseek().chat_url("https://api.deepseek.com/v1/"),
            "https://api.deepseek.com/v1/chat/completions"
        );
    }
}
