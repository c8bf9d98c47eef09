//! Fallback chain behaviour with in-process provider clients

use assay_insight::prelude::*;
use assay_insight::{
    AttemptOutcome, ErrorKind, PromptCatalog, ProviderAttempt, ProviderClient, ProviderPayload,
    RawResponse,
};
use secrecy::SecretString;
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};

struct FakeClient {
    reply: Result<String, AssistantError>,
    calls: AtomicU32,
}

impl FakeClient {
    fn ok(text: &str) -> Arc<Self> {
        Arc::new(Self {
            reply: Ok(text.to_string()),
            calls: AtomicU32::new(0),
        })
    }

    fn err(error: AssistantError) -> Arc<Self> {
        Arc::new(Self {
            reply: Err(error),
            calls: AtomicU32::new(0),
        })
    }

    fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl ProviderClient for FakeClient {
    async fn call(
        &self,
        payload: &ProviderPayload,
        _credential: &SecretString,
    ) -> Result<RawResponse, AssistantError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.reply
            .clone()
            .map(|text| RawResponse::new(payload.provider, text).with_model(payload.model.clone()))
    }
}

struct Harness {
    assistant: Assistant,
    openai: Arc<FakeClient>,
    anthropic: Arc<FakeClient>,
    deepseek: Arc<FakeClient>,
}

fn harness(openai: Arc<FakeClient>, anthropic: Arc<FakeClient>, deepseek: Arc<FakeClient>) -> Harness {
    let config = ProviderId::PRIORITY
        .into_iter()
        .fold(AssistantConfig::default(), |cfg, p| {
            cfg.with_provider(ProviderConfig::new(p).with_api_key("sk-integration-0001"))
        });
    let assistant = Assistant::new(config)
        .unwrap()
        .with_client(ProviderId::OpenAi, openai.clone())
        .with_client(ProviderId::Anthropic, anthropic.clone())
        .with_client(ProviderId::DeepSeek, deepseek.clone());
    Harness {
        assistant,
        openai,
        anthropic,
        deepseek,
    }
}

fn daily_request() -> AnalysisRequest {
    AnalysisRequest::builder()
        .subject(Subject::DailyMonitoring)
        .report(ReportKind::Recommendations)
        .record(
            Record::new()
                .with("assayer_name", "Yaw Boateng")
                .with("percentage_deviation", 0.62),
        )
        .record(
            Record::new()
                .with("assayer_name", "Efua Owusu")
                .with("percentage_deviation", -0.04),
        )
        .group_by("assayer_name")
        .time_period("Last 7 days")
        .prompt("Who should be retrained?")
        .build()
        .unwrap()
}

fn unavailable(provider: ProviderId) -> AssistantError {
    AssistantError::unavailable(provider, "connection refused")
}

#[tokio::test]
async fn auth_error_on_preferred_falls_back_to_anthropic() {
    let h = harness(
        FakeClient::err(AssistantError::auth(ProviderId::OpenAi, "http=401 invalid api key")),
        FakeClient::ok("Yaw Boateng should be retrained.\n=== FINDINGS ===\n- Flagged Assayers: Yaw Boateng\n=== END FINDINGS ==="),
        FakeClient::ok("unused"),
    );

    let result = h.assistant.analyze(&daily_request(), ProviderId::OpenAi).await.unwrap();

    assert!(result.success);
    assert_eq!(result.provider_used, Some(ProviderId::Anthropic));
    assert_eq!(result.narrative, "Yaw Boateng should be retrained.");
    assert_eq!(
        result.findings.get("flagged_assayers").unwrap(),
        &["Yaw Boateng".to_string()]
    );
    assert_eq!(result.warnings.len(), 1);
    assert_eq!(h.deepseek.calls(), 0);
    assert!(matches!(
        result.attempts[0].outcome,
        AttemptOutcome::Failed {
            kind: ErrorKind::Auth,
            ..
        }
    ));
}

#[tokio::test]
async fn quota_and_rejection_fall_through_to_deepseek() {
    let h = harness(
        FakeClient::err(AssistantError::quota(ProviderId::OpenAi, "insufficient_quota")),
        FakeClient::err(AssistantError::ProviderRejected {
            provider: ProviderId::Anthropic,
            status: 400,
            message: "max_tokens too large".to_string(),
        }),
        FakeClient::ok("DeepSeek answer."),
    );

    let result = h.assistant.analyze(&daily_request(), ProviderId::OpenAi).await.unwrap();
    assert_eq!(result.provider_used, Some(ProviderId::DeepSeek));
    assert_eq!(result.model.as_deref(), Some("deepseek-chat"));
    assert!(result.warnings.is_empty());
    assert_eq!(result.attempts.len(), 3);
    assert_eq!(result.attempts[2], ProviderAttempt::succeeded(ProviderId::DeepSeek));
}

#[tokio::test]
async fn preferred_provider_is_tried_first() {
    let h = harness(FakeClient::ok("openai"), FakeClient::ok("anthropic"), FakeClient::ok("deepseek"));

    let result = h.assistant.analyze(&daily_request(), ProviderId::DeepSeek).await.unwrap();
    assert_eq!(result.narrative, "deepseek");
    assert_eq!(h.openai.calls(), 0);
    assert_eq!(h.anthropic.calls(), 0);
}

#[tokio::test]
async fn every_provider_unavailable_yields_failed_result() {
    let h = harness(
        FakeClient::err(unavailable(ProviderId::OpenAi)),
        FakeClient::err(unavailable(ProviderId::Anthropic)),
        FakeClient::err(unavailable(ProviderId::DeepSeek)),
    );

    let request = daily_request();
    let result = h.assistant.analyze(&request, ProviderId::OpenAi).await.unwrap();

    assert!(!result.success);
    assert!(result.narrative.is_empty());
    assert!(result.findings.is_empty());
    assert_eq!(result.provider_used, None);
    assert_eq!(result.request_id, Some(request.id));
    let detail = result.error.clone().unwrap();
    assert!(detail.summary.starts_with("3 providers failed; last error:"));
    assert!(detail.summary.contains("deepseek"));
    assert!(result.display_text().starts_with("Analysis unavailable:"));
    assert!(matches!(
        result.into_result(),
        Err(AssistantError::AllProvidersFailed { .. })
    ));
    assert_eq!(h.openai.calls() + h.anthropic.calls() + h.deepseek.calls(), 3);
}

#[test]
fn unknown_subject_is_rejected_at_parse_time() {
    let json = r#"{
        "subject": "furnace_temperature",
        "dataset": [{"assayer_name": "Kofi", "percentage_deviation": 0.1}],
        "prompt": "How hot?",
        "provider": "openai"
    }"#;
    let err = AnalysisRequest::from_json(json).unwrap_err();
    assert!(matches!(err, AssistantError::UnsupportedSubject(ref s) if s == "furnace_temperature"));
}

#[tokio::test]
async fn subject_missing_from_catalog_makes_no_calls() {
    let h = harness(FakeClient::ok("a"), FakeClient::ok("b"), FakeClient::ok("c"));
    let assistant = h
        .assistant
        .with_catalog(PromptCatalog::default().without(Subject::DailyMonitoring));

    let err = assistant.analyze(&daily_request(), ProviderId::OpenAi).await.unwrap_err();
    assert!(matches!(err, AssistantError::UnsupportedSubject(_)));
    assert_eq!(h.openai.calls() + h.anthropic.calls() + h.deepseek.calls(), 0);
}

#[tokio::test]
async fn blank_prompt_is_invalid_before_any_call() {
    let h = harness(FakeClient::ok("a"), FakeClient::ok("b"), FakeClient::ok("c"));
    let mut request = daily_request();
    request.prompt = "   ".to_string();

    let err = h.assistant.analyze_request(&request).await.unwrap_err();
    assert!(matches!(err, AssistantError::InvalidRequest(_)));

    request.prompt = "ok".to_string();
    request.dataset.clear();
    let err = h.assistant.analyze_request(&request).await.unwrap_err();
    assert!(matches!(err, AssistantError::InvalidRequest(_)));
    assert_eq!(h.openai.calls(), 0);
}

#[tokio::test]
async fn dashboard_json_round_trip() {
    let h = harness(FakeClient::ok("unused"), FakeClient::ok("From Claude."), FakeClient::ok("unused"));
    let json = r#"{
        "subject": "Interlab Comparison",
        "report": "trend",
        "dataset": [
            {"lab_name": "Accra", "percentage_deviation": 0.3},
            {"lab_name": "Kumasi", "percentage_deviation": -0.9}
        ],
        "prompt": "Which lab drifts?",
        "provider": "anthropic",
        "group_by": "lab_name"
    }"#;
    let request = AnalysisRequest::from_json(json).unwrap();
    assert_eq!(request.subject, Subject::InterlabComparison);

    let result = h.assistant.analyze_request(&request).await.unwrap();
    assert_eq!(result.provider_used, Some(ProviderId::Anthropic));
    assert_eq!(h.openai.calls(), 0);

    let encoded = serde_json::to_value(&result).unwrap();
    assert_eq!(encoded["success"], true);
    assert_eq!(encoded["provider_used"], "anthropic");
}
