//! HTTP header building shared by the provider specs.

use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderName, HeaderValue, USER_AGENT};

use crate::error::AssistantError;
use crate::types::ProviderId;

pub const DEFAULT_USER_AGENT: &str = concat!("assay-insight/", env!("CARGO_PKG_VERSION"));

/// HTTP header builder for provider requests
pub struct HttpHeaderBuilder {
    provider: ProviderId,
    headers: HeaderMap,
}

impl HttpHeaderBuilder {
    pub fn new(provider: ProviderId) -> Self {
        Self {
            provider,
            headers: HeaderMap::new(),
        }
    }

    /// Add Bearer token authorization
    pub fn with_bearer_auth(mut self, token: &str) -> Result<Self, AssistantError> {
        let mut value = HeaderValue::from_str(&format!("Bearer {token}"))
            .map_err(|_| self.unusable_credential())?;
        value.set_sensitive(true);
        self.headers.insert(AUTHORIZATION, value);
        Ok(self)
    }

    /// Add a credential under a custom header name (e.g. `x-api-key`)
    pub fn with_custom_auth(mut self, name: &'static str, value: &str) -> Result<Self, AssistantError> {
        let mut value = HeaderValue::from_str(value).map_err(|_| self.unusable_credential())?;
        value.set_sensitive(true);
        self.headers.insert(HeaderName::from_static(name), value);
        Ok(self)
    }

    pub fn with_json_content_type(mut self) -> Self {
        self.headers
            .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        self
    }

    pub fn with_user_agent(mut self) -> Self {
        self.headers
            .insert(USER_AGENT, HeaderValue::from_static(DEFAULT_USER_AGENT));
        self
    }

    pub fn with_header(mut self, name: &'static str, value: &'static str) -> Self {
        self.headers
            .insert(HeaderName::from_static(name), HeaderValue::from_static(value));
        self
    }

    pub fn build(self) -> HeaderMap {
        self.headers
    }

    fn unusable_credential(&self) -> AssistantError {
        AssistantError::auth(
            self.provider,
            "credential contains characters not allowed in an HTTP header",
        )
    }
}
