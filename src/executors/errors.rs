//! HTTP error classification
//!
//! Maps a non-success HTTP response or a transport failure onto the
//! provider error taxonomy the orchestrator's fallback chain understands.

use reqwest::header::HeaderMap;
use std::time::Duration;

use crate::error::AssistantError;
use crate::types::ProviderId;

const BODY_SAMPLE_CHARS: usize = 200;

/// Classify a non-success HTTP response.
///
/// - 429, or 400/402/403 bodies that talk about quota, rate limits or billing
///   → [`AssistantError::ProviderQuotaExceeded`]
/// - 401, other 403 → [`AssistantError::ProviderAuthError`]
/// - 408, 5xx → [`AssistantError::ProviderUnavailable`]
/// - any other status → [`AssistantError::ProviderRejected`]
pub fn classify_http_error(
    provider: ProviderId,
    status: u16,
    body_text: &str,
    headers: &HeaderMap,
) -> AssistantError {
    let lower = body_text.to_lowercase();
    let request_id = ["x-request-id", "request-id", "x-trace-id"]
        .iter()
        .find_map(|k| headers.get(*k).and_then(|v| v.to_str().ok()))
        .map(|id| format!(" request_id={id}"))
        .unwrap_or_default();
    let sample = error_message(body_text);

    if status == 429 {
        let retry_after = headers
            .get("retry-after")
            .and_then(|v| v.to_str().ok())
            .map(|v| format!(" retry_after={v}"))
            .unwrap_or_default();
        return AssistantError::quota(
            provider,
            format!("http=429{retry_after}{request_id} {sample}").trim_end().to_string(),
        );
    }

    if matches!(status, 400 | 402 | 403) && mentions_quota(&lower) {
        return AssistantError::quota(
            provider,
            format!("http={status}{request_id} {sample}").trim_end().to_string(),
        );
    }

    if status == 401 || status == 403 {
        return AssistantError::auth(
            provider,
            format!("http={status}{request_id} {sample}").trim_end().to_string(),
        );
    }

    if status == 408 || (500..=599).contains(&status) {
        return AssistantError::unavailable(
            provider,
            format!("http={status}{request_id} {sample}").trim_end().to_string(),
        );
    }

    AssistantError::ProviderRejected {
        provider,
        status,
        message: if sample.is_empty() {
            format!("request rejected{request_id}")
        } else {
            format!("{sample}{request_id}")
        },
    }
}

/// Classify a failure that happened before a status code was available.
pub fn classify_transport_error(
    provider: ProviderId,
    err: &reqwest::Error,
    timeout: Duration,
) -> AssistantError {
    if err.is_timeout() {
        AssistantError::unavailable(
            provider,
            format!("timed out after {}s", timeout.as_secs()),
        )
    } else if err.is_connect() {
        AssistantError::unavailable(provider, format!("connection failed: {err}"))
    } else {
        AssistantError::unavailable(provider, format!("request failed: {err}"))
    }
}

fn mentions_quota(lower: &str) -> bool {
    [
        "quota",
        "rate limit",
        "rate_limit",
        "ratelimit",
        "billing",
        "insufficient_balance",
        "insufficient balance",
        "credit balance",
    ]
    .iter()
    .any(|p| lower.contains(p))
}

/// Best-effort human message from an error body.
///
/// Understands `{"error": {"message": ..}}` (OpenAI, DeepSeek, Anthropic)
/// and `{"error": ".."}`; anything else is cut to a short sample.
fn error_message(body_text: &str) -> String {
    let from_json = serde_json::from_str::<serde_json::Value>(body_text)
        .ok()
        .and_then(|json| {
            let error = json.get("error")?;
            error
                .get("message")
                .and_then(|m| m.as_str())
                .or_else(|| error.as_str())
                .map(str::to_string)
        });
    from_json
        .unwrap_or_else(|| body_text.trim().to_string())
        .chars()
        .take(BODY_SAMPLE_CHARS)
        .collect()
}
