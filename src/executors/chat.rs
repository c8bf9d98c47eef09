//! Chat executor
//!
//! [`ProviderClient`] is the seam between the orchestrator and the network.
//! [`HttpProviderClient`] wires a [`ProviderSpec`] to a pooled
//! `reqwest::Client`; tests substitute their own implementations.

use secrecy::SecretString;
use std::sync::Arc;
use std::time::Duration;

use super::errors::{classify_http_error, classify_transport_error};
use crate::config::{DEFAULT_TIMEOUT, ProviderConfig};
use crate::error::AssistantError;
use crate::providers::{self, ProviderSpec};
use crate::telemetry::format_headers_for_logging;
use crate::transformers::{ProviderPayload, RawResponse};
use crate::types::ProviderId;

/// Sends one provider payload and returns the completion text.
///
/// Implementations make a single attempt; retries and fallback belong to
/// the orchestrator.
#[async_trait::async_trait]
pub trait ProviderClient: Send + Sync {
    async fn call(
        &self,
        payload: &ProviderPayload,
        credential: &SecretString,
    ) -> Result<RawResponse, AssistantError>;
}

/// HTTPS client for one provider
pub struct HttpProviderClient {
    pub provider: ProviderId,
    pub http_client: reqwest::Client,
    pub spec: Arc<dyn ProviderSpec>,
    pub endpoint: String,
    pub timeout: Duration,
}

impl HttpProviderClient {
    pub fn new(provider: ProviderId, endpoint: impl Into<String>, http_client: reqwest::Client) -> Self {
        Self {
            provider,
            http_client,
            spec: providers::spec_for(provider),
            endpoint: endpoint.into(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Client for a configured provider sharing `http_client`'s pool.
    pub fn from_config(config: &ProviderConfig, http_client: reqwest::Client, timeout: Duration) -> Self {
        Self::new(config.provider, config.endpoint.clone(), http_client).with_timeout(timeout)
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

#[async_trait::async_trait]
impl ProviderClient for HttpProviderClient {
    async fn call(
        &self,
        payload: &ProviderPayload,
        credential: &SecretString,
    ) -> Result<RawResponse, AssistantError> {
        let url = self.spec.chat_url(&self.endpoint);
        let headers = self.spec.build_headers(credential)?;

        tracing::debug!(
            provider = %self.provider,
            model = %payload.model,
            url = %url,
            body_bytes = payload.body_len(),
            "sending chat request"
        );
        tracing::trace!(headers = %format_headers_for_logging(&headers), "request headers");

        let resp = self
            .http_client
            .post(&url)
            .headers(headers)
            .timeout(self.timeout)
            .json(&payload.body)
            .send()
            .await
            .map_err(|e| classify_transport_error(self.provider, &e, self.timeout))?;

        let status = resp.status();
        let response_headers = resp.headers().clone();
        let text = resp
            .text()
            .await
            .map_err(|e| classify_transport_error(self.provider, &e, self.timeout))?;

        if !status.is_success() {
            return Err(classify_http_error(
                self.provider,
                status.as_u16(),
                &text,
                &response_headers,
            ));
        }

        let json: serde_json::Value = serde_json::from_str(&text).map_err(|e| {
            AssistantError::unavailable(self.provider, format!("failed to parse response JSON: {e}"))
        })?;
        let mut raw = self.spec.response_transformer().transform_chat_response(&json)?;
        if raw.model.is_none() {
            raw.model = Some(payload.model.clone());
        }

        tracing::debug!(
            provider = %self.provider,
            completion_chars = raw.text.len(),
            total_tokens = raw.usage.map(|u| u.total()),
            "chat response received"
        );
        Ok(raw)
    }
}
