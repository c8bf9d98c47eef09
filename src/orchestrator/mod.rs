//! Orchestrator
//!
//! [`Assistant::analyze`] validates the request, builds the shared prompt
//! once, then walks the fallback chain: preferred provider first, the rest
//! in priority order. Providers without a credential are skipped without a
//! network call. Any provider failure moves on to the next provider; only
//! when the chain is exhausted does the caller get a failed result.

use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::Instrument;

use crate::config::AssistantConfig;
use crate::error::{AssistantError, suggest_fixes};
use crate::executors::{HttpProviderClient, ProviderClient};
use crate::normalize::{normalize, render_findings};
use crate::prompt::PromptCatalog;
use crate::providers::headers::DEFAULT_USER_AGENT;
use crate::registry::ProviderRegistry;
use crate::transformers;
use crate::types::{
    AnalysisRequest, AnalysisResult, AttemptOutcome, FailureDetail, ProviderAttempt, ProviderId,
};

/// Provider-abstracted AI assistant.
///
/// Holds only read-only configuration and a pooled HTTP client, so one
/// instance can serve concurrent requests behind an `Arc`.
pub struct Assistant {
    config: Arc<AssistantConfig>,
    registry: ProviderRegistry,
    catalog: PromptCatalog,
    clients: BTreeMap<ProviderId, Arc<dyn ProviderClient>>,
}

impl std::fmt::Debug for Assistant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Assistant")
            .field("config", &self.config)
            .field("registry", &self.registry)
            .finish_non_exhaustive()
    }
}

impl Assistant {
    /// Assistant with HTTPS clients for every provider.
    pub fn new(config: AssistantConfig) -> Result<Self, AssistantError> {
        let http_client = reqwest::Client::builder()
            .user_agent(DEFAULT_USER_AGENT)
            .build()
            .map_err(|e| {
                AssistantError::ConfigurationError(format!("failed to build HTTP client: {e}"))
            })?;

        let clients = config
            .providers()
            .map(|p| {
                let client: Arc<dyn ProviderClient> = Arc::new(HttpProviderClient::from_config(
                    p,
                    http_client.clone(),
                    config.timeout,
                ));
                (p.provider, client)
            })
            .collect();

        Ok(Self {
            registry: ProviderRegistry::from_config(&config),
            config: Arc::new(config),
            catalog: PromptCatalog::default(),
            clients,
        })
    }

    /// Assistant configured from the process environment.
    pub fn from_env() -> Result<Self, AssistantError> {
        Self::new(AssistantConfig::from_env()?)
    }

    /// Replace the client used for one provider.
    pub fn with_client(mut self, provider: ProviderId, client: Arc<dyn ProviderClient>) -> Self {
        self.clients.insert(provider, client);
        self
    }

    pub fn with_catalog(mut self, catalog: PromptCatalog) -> Self {
        self.catalog = catalog;
        self
    }

    pub fn config(&self) -> &AssistantConfig {
        &self.config
    }

    pub fn registry(&self) -> &ProviderRegistry {
        &self.registry
    }

    pub fn catalog(&self) -> &PromptCatalog {
        &self.catalog
    }

    /// Analyze with the provider named in the request as preference.
    pub async fn analyze_request(
        &self,
        request: &AnalysisRequest,
    ) -> Result<AnalysisResult, AssistantError> {
        self.analyze(request, request.provider).await
    }

    /// Run one analysis.
    ///
    /// Errors only for [`AssistantError::InvalidRequest`] and
    /// [`AssistantError::UnsupportedSubject`], both raised before any network
    /// call. Provider failures are absorbed by the fallback chain; when every
    /// provider fails the result has `success == false` and an empty narrative.
    pub async fn analyze(
        &self,
        request: &AnalysisRequest,
        preferred: ProviderId,
    ) -> Result<AnalysisResult, AssistantError> {
        let span = tracing::info_span!(
            "analyze",
            request_id = %request.id,
            subject = %request.subject,
            report = request.report.as_str(),
            preferred = %preferred,
        );
        self.run(request, preferred).instrument(span).await
    }

    async fn run(
        &self,
        request: &AnalysisRequest,
        preferred: ProviderId,
    ) -> Result<AnalysisResult, AssistantError> {
        request.check()?;
        let prompt = self.catalog.build(request, &self.config)?;
        tracing::debug!(
            records = request.dataset.len(),
            system_chars = prompt.system.len(),
            user_chars = prompt.user.len(),
            max_tokens = prompt.max_tokens,
            "prompt built"
        );

        let mut attempts = Vec::new();
        let mut warnings = Vec::new();
        let mut last_error: Option<AssistantError> = None;

        for provider in self.registry.fallback_chain(preferred) {
            let settings = self.config.provider(provider);
            let credential = match settings.credential.as_ref() {
                Some(c) if settings.is_available() => c,
                _ => {
                    tracing::debug!(provider = %provider, "no credential configured, skipping");
                    attempts.push(ProviderAttempt::skipped(provider));
                    continue;
                }
            };
            let Some(client) = self.clients.get(&provider) else {
                attempts.push(ProviderAttempt::skipped(provider));
                continue;
            };

            let outcome = match transformers::encode(&prompt, provider, &self.config) {
                Ok(payload) => client.call(&payload, credential).await,
                Err(e) => Err(e),
            };

            match outcome {
                Ok(raw) => {
                    let mut result = normalize(&raw);
                    attempts.push(ProviderAttempt::succeeded(provider));
                    result.request_id = Some(request.id);
                    result.attempts = attempts;
                    result.warnings = warnings;
                    tracing::info!(
                        provider = %provider,
                        model = result.model.as_deref().unwrap_or_default(),
                        findings = result.findings.len(),
                        "analysis completed"
                    );
                    if !result.findings.is_empty() {
                        tracing::debug!(findings = %render_findings(&result.findings), "parsed findings");
                    }
                    return Ok(result);
                }
                Err(err) => {
                    if matches!(err, AssistantError::ProviderAuthError { .. }) {
                        let warning = format!(
                            "{} rejected the configured credential; check {}",
                            provider.display_name(),
                            provider.api_key_env()
                        );
                        tracing::warn!(provider = %provider, "{warning}");
                        warnings.push(warning);
                    } else if err.triggers_fallback() {
                        tracing::warn!(
                            provider = %provider,
                            error = %err,
                            retryable = err.is_retryable(),
                            "provider failed, trying next"
                        );
                    } else {
                        // Local failure building the payload; still try the next provider.
                        tracing::error!(provider = %provider, error = %err, "could not prepare request");
                    }
                    attempts.push(ProviderAttempt::failed(provider, &err));
                    last_error = Some(err);
                }
            }
        }

        let detail = failure_detail(last_error.as_ref(), &attempts);
        tracing::warn!(summary = %detail.summary, "analysis unavailable");
        let mut result = AnalysisResult::failed(detail);
        result.request_id = Some(request.id);
        result.attempts = attempts;
        result.warnings = warnings;
        Ok(result)
    }
}

fn failure_detail(last_error: Option<&AssistantError>, attempts: &[ProviderAttempt]) -> FailureDetail {
    let exhausted = AssistantError::AllProvidersFailed {
        summary: String::new(),
        attempts: attempts.to_vec(),
    };
    match last_error {
        Some(err) => {
            let mut detail = FailureDetail::from(err);
            let failed = attempts
                .iter()
                .filter(|a| matches!(a.outcome, AttemptOutcome::Failed { .. }))
                .count();
            if failed > 1 {
                detail.summary = format!("{failed} providers failed; last error: {}", detail.summary);
            }
            detail.suggestions.extend(suggest_fixes(&exhausted));
            detail
        }
        None => FailureDetail {
            kind: crate::error::ErrorKind::Configuration,
            summary: "No AI provider is configured".to_string(),
            suggestions: suggest_fixes(&exhausted),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ProviderConfig;
    use crate::transformers::{ProviderPayload, RawResponse};
    use crate::types::{Record, Subject};
    use secrecy::SecretString;
    use std::sync::atomic::{AtomicU32, Ordering};
    use tracing_test::traced_test;

    struct ScriptedClient {
        provider: ProviderId,
        reply: Result<&'static str, AssistantError>,
        calls: AtomicU32,
    }

    impl ScriptedClient {
        fn new(provider: ProviderId, reply: Result<&'static str, AssistantError>) -> Arc<Self> {
            Arc::new(Self {
                provider,
                reply,
                calls: AtomicU32::new(0),
            })
        }
    }

    #[async_trait::async_trait]
    impl ProviderClient for ScriptedClient {
        async fn call(
            &self,
            payload: &ProviderPayload,
            _credential: &SecretString,
        ) -> Result<RawResponse, AssistantError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            assert_eq!(payload.provider, self.provider);
            self.reply
                .clone()
                .map(|text| RawResponse::new(self.provider, text).with_model(payload.model.clone()))
        }
    }

    fn request() -> AnalysisRequest {
        AnalysisRequest::builder()
            .subject(Subject::DailyMonitoring)
            .record(
                Record::new()
                    .with("assayer_name", "Kofi")
                    .with("percentage_deviation", 0.12),
            )
            .prompt("How did the team do?")
            .build()
            .unwrap()
    }

    fn configured(providers: &[ProviderId]) -> AssistantConfig {
        providers.iter().fold(AssistantConfig::default(), |cfg, p| {
            cfg.with_provider(ProviderConfig::new(*p).with_api_key("test-key-0123456789"))
        })
    }

    #[test]
    fn assistant_is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Assistant>();
    }

    #[tokio::test]
    #[traced_test]
    async fn auth_failure_falls_back_with_warning() {
        let openai = ScriptedClient::new(
            ProviderId::OpenAi,
            Err(AssistantError::auth(ProviderId::OpenAi, "http=401 invalid api key")),
        );
        let anthropic = ScriptedClient::new(ProviderId::Anthropic, Ok("Team accuracy is good."));
        let assistant = Assistant::new(configured(&[ProviderId::OpenAi, ProviderId::Anthropic]))
            .unwrap()
            .with_client(ProviderId::OpenAi, openai.clone())
            .with_client(ProviderId::Anthropic, anthropic.clone());

        let result = assistant.analyze(&request(), ProviderId::OpenAi).await.unwrap();
        assert!(result.success);
        assert_eq!(result.provider_used, Some(ProviderId::Anthropic));
        assert_eq!(result.narrative, "Team accuracy is good.");
        assert_eq!(result.warnings.len(), 1);
        assert!(result.warnings[0].contains("OPENAI_API_KEY"));
        assert_eq!(openai.calls.load(Ordering::SeqCst), 1);
        assert!(logs_contain("rejected the configured credential"));
        assert!(!logs_contain("test-key-0123456789"));
    }

    #[tokio::test]
    async fn unconfigured_providers_are_skipped() {
        let deepseek = ScriptedClient::new(ProviderId::DeepSeek, Ok("Fine."));
        let assistant = Assistant::new(configured(&[ProviderId::DeepSeek]))
            .unwrap()
            .with_client(ProviderId::DeepSeek, deepseek.clone());

        let result = assistant.analyze_request(&request()).await.unwrap();
        assert_eq!(result.provider_used, Some(ProviderId::DeepSeek));
        assert_eq!(
            result.attempts,
            vec![
                ProviderAttempt::skipped(ProviderId::OpenAi),
                ProviderAttempt::skipped(ProviderId::Anthropic),
                ProviderAttempt::succeeded(ProviderId::DeepSeek),
            ]
        );
    }

    #[tokio::test]
    async fn nothing_configured_is_a_failed_result() {
        let assistant = Assistant::new(AssistantConfig::default()).unwrap();
        let result = assistant.analyze_request(&request()).await.unwrap();
        assert!(!result.success);
        assert!(result.narrative.is_empty());
        let detail = result.error.clone().unwrap();
        assert_eq!(detail.summary, "No AI provider is configured");
        assert!(!detail.suggestions.is_empty());
        assert!(matches!(
            result.into_result(),
            Err(AssistantError::AllProvidersFailed { .. })
        ));
    }

    #[tokio::test]
    async fn fallback_disabled_tries_only_preferred() {
        let openai = ScriptedClient::new(
            ProviderId::OpenAi,
            Err(AssistantError::unavailable(ProviderId::OpenAi, "timed out after 30s")),
        );
        let anthropic = ScriptedClient::new(ProviderId::Anthropic, Ok("never used"));
        let config = configured(&[ProviderId::OpenAi, ProviderId::Anthropic]).with_fallback(false);
        let assistant = Assistant::new(config)
            .unwrap()
            .with_client(ProviderId::OpenAi, openai)
            .with_client(ProviderId::Anthropic, anthropic.clone());

        let result = assistant.analyze(&request(), ProviderId::OpenAi).await.unwrap();
        assert!(!result.success);
        assert_eq!(anthropic.calls.load(Ordering::SeqCst), 0);
        assert_eq!(
            result.display_text(),
            "Analysis unavailable: openai unavailable: timed out after 30s"
        );
    }
}
