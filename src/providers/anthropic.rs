//! Anthropic Messages API

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

pub const ANTHROPIC_VERSION: &str = "2023-06-01";

/// Request transformer for Anthropic
#[derive(Debug, Clone, Copy, Default)]
pub struct AnthropicRequestTransformer;

impl RequestTransformer for AnthropicRequestTransformer {
    fn provider_id(&self) -> ProviderId {
        ProviderId::Anthropic
    }

    fn transform_chat(&self, prompt: &Prompt, model: &str) -> Result<serde_json::Value, AssistantError> {
        crate::transformers::request::check_prompt(ProviderId::Anthropic, prompt, model)?;
        // Anthropic only accepts 0.0..=1.0
        let temperature = prompt.temperature.clamp(0.0, 1.0);
        Ok(serde_json::json!({
            "model": model,
            "system": prompt.system,
            "messages": [
                { "role": "user", "content": prompt.user },
            ],
            "max_tokens": prompt.max_tokens,
            "temperature": temperature,
        }))
    }
}

#[derive(Debug, Deserialize)]
struct MessagesResponse {
    #[serde(default)]
    model: Option<String>,
    #[serde(default)]
    content: Vec<ContentBlock>,
    #[serde(default)]
    usage: Option<MessagesUsage>,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct MessagesUsage {
    #[serde(default)]
    input_tokens: u32,
    #[serde(default)]
    output_tokens: u32,
}

/// Response transformer for Anthropic
#[derive(Debug, Clone, Copy, Default)]
pub struct AnthropicResponseTransformer;

impl ResponseTransformer for AnthropicResponseTransformer {
    fn provider_id(&self) -> ProviderId {
        ProviderId::Anthropic
    }

    fn transform_chat_response(&self, raw: &serde_json::Value) -> Result<RawResponse, AssistantError> {
        let response: MessagesResponse = serde_json::from_value(raw.clone()).map_err(|e| {
            AssistantError::unavailable(ProviderId::Anthropic, format!("invalid messages response: {e}"))
        })?;

        let text = response
            .content
            .into_iter()
            .filter(|b| b.kind == "text")
            .filter_map(|b| b.text)
            .collect::<Vec<_>>()
            .join("\n");
        if text.trim().is_empty() {
            return Err(AssistantError::unavailable(
                ProviderId::Anthropic,
                "response contained no text blocks",
            ));
        }

        let mut out = RawResponse::new(ProviderId::Anthropic, text);
        out.model = response.model;
        if let Some(u) = response.usage {
            out = out.with_usage(Usage {
                prompt_tokens: u.input_tokens,
                completion_tokens: u.output_tokens,
            });
        }
        Ok(out)
    }
}

/// Endpoint, headers and transformers for Anthropic
#[derive(Debug, Clone, Copy, Default)]
pub struct AnthropicSpec;

impl ProviderSpec for AnthropicSpec {
    fn id(&self) -> ProviderId {
        ProviderId::Anthropic
    }

    fn chat_url(&self, endpoint: &str) -> String {
        format!("{}/messages", endpoint.trim_end_matches('/'))
    }

    fn build_headers(&self, api_key: &SecretString) -> Result<HeaderMap, AssistantError> {
        Ok(HttpHeaderBuilder::new(ProviderId::Anthropic)
            .with_custom_auth("x-api-key", api_key.expose_secret())?
            .with_header("anthropic-version", ANTHROPIC_VERSION)
            .with_json_content_type()
            .with_user_agent()
            .build())
    }

    fn request_transformer(&self) -> Arc<dyn RequestTransformer> {
        Arc::new(AnthropicRequestTransformer)
    }

    fn response_transformer(&self) -> Arc<dyn ResponseTransformer> {
        Arc::new(AnthropicResponseTransformer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn system_prompt_is_top_level_and_temperature_clamped() {
        let prompt = Prompt {
            system: "You are an assay analyst.".into(),
            user: "Summarize.".into(),
            max_tokens: 750,
            temperature: 1.6,
        };
        let body = AnthropicRequestTransformer
            .transform_chat(&prompt, "claude-3-5-sonnet-20241022")
            .unwrap();
        assert_eq!(body["system"], "You are an assay analyst.");
        assert_eq!(body["messages"].as_array().unwrap().len(), 1);
        assert_eq!(body["messages"][0]["role"], "user");
        assert_eq!(body["max_tokens"], 750);
        assert_eq!(body["temperature"], 1.0);
    }

    #[test]
    fn joins_text_blocks_and_skips_others() {
        let raw = serde_json::json!({
            "id": "msg_1",
            "type": "message",
            "model": "claude-3-5-sonnet-20241022",
            "content": [
                {"type": "text", "text": "First part."},
                {"type": "tool_use", "id": "t1", "name": "x", "input": {}},
                {"type": "text", "text": "Second part."}
            ],
            "usage": {"input_tokens": 50, "output_tokens": 10}
        });
        let resp = AnthropicResponseTransformer.transform_chat_response(&raw).unwrap();
        assert_eq!(resp.text, "First part.\nSecond part.");
        assert_eq!(resp.usage.unwrap().prompt_tokens, 50);
    }

    #[test]
    fn headers_use_api_key_and_version() {
        let headers = AnthropicSpec
            .build_headers(&SecretString::from("sk-ant-test".to_string()))
            .unwrap();
        assert_eq!(headers.get("x-api-key").unwrap(), "sk-ant-test");
        assert_eq!(headers.get("anthropic-version").unwrap(), ANTHROPIC_VERSION);
        assert!(headers.get("authorization").is_none());
    }
}
