//! Analysis result types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

use super::ProviderId;
use crate::error::{AssistantError, ErrorKind};

/// Structured findings extracted from a narrative: category → entries.
///
/// Entries keep the order in which the provider listed them; duplicates
/// within a category are dropped.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Findings(BTreeMap<String, Vec<String>>);

impl Findings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an entry, returning `false` when it was already present.
    pub fn insert<C: Into<String>, E: Into<String>>(&mut self, category: C, entry: E) -> bool {
        let entries = self.0.entry(category.into()).or_default();
        let entry = entry.into();
        if entries.contains(&entry) {
            return false;
        }
        entries.push(entry);
        true
    }

    pub fn get(&self, category: &str) -> Option<&[String]> {
        self.0.get(category).map(Vec::as_slice)
    }

    pub fn categories(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }

    pub fn is_empty(&self) -> bool {
        self.0.values().all(Vec::is_empty)
    }

    pub fn len(&self) -> usize {
        self.0.values().map(Vec::len).sum()
    }
}

/// What happened when the orchestrator reached a provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum AttemptOutcome {
    /// Provider answered
    Succeeded,
    /// No credential configured; never contacted
    Skipped,
    /// Contacted and failed
    Failed { kind: ErrorKind, message: String },
}

/// One step of the fallback chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderAttempt {
    pub provider: ProviderId,
    #[serde(flatten)]
    pub outcome: AttemptOutcome,
}

impl ProviderAttempt {
    pub fn succeeded(provider: ProviderId) -> Self {
        Self {
            provider,
            outcome: AttemptOutcome::Succeeded,
        }
    }

    pub fn skipped(provider: ProviderId) -> Self {
        Self {
            provider,
            outcome: AttemptOutcome::Skipped,
        }
    }

    pub fn failed(provider: ProviderId, error: &AssistantError) -> Self {
        Self {
            provider,
            outcome: AttemptOutcome::Failed {
                kind: crate::error::map_error_kind(error),
                message: error.to_string(),
            },
        }
    }
}

/// Why an analysis produced no narrative.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailureDetail {
    pub kind: ErrorKind,
    /// Human readable summary of the last failure
    pub summary: String,
    pub suggestions: Vec<String>,
}

/// Display-only outcome of one analysis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub request_id: Option<Uuid>,
    pub success: bool,
    pub narrative: String,
    #[serde(default, skip_serializing_if = "Findings::is_empty")]
    pub findings: Findings,
    pub provider_used: Option<ProviderId>,
    pub model: Option<String>,
    pub error: Option<FailureDetail>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub attempts: Vec<ProviderAttempt>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
    pub generated_at: DateTime<Utc>,
}

impl AnalysisResult {
    /// Successful result from a provider narrative.
    pub fn answered(
        provider: ProviderId,
        model: Option<String>,
        narrative: String,
        findings: Findings,
        generated_at: DateTime<Utc>,
    ) -> Self {
        Self {
            request_id: None,
            success: true,
            narrative,
            findings,
            provider_used: Some(provider),
            model,
            error: None,
            attempts: Vec::new(),
            warnings: Vec::new(),
            generated_at,
        }
    }

    /// Failed result. The narrative stays empty: nothing is made up.
    pub fn failed(detail: FailureDetail) -> Self {
        Self {
            request_id: None,
            success: false,
            narrative: String::new(),
            findings: Findings::default(),
            provider_used: None,
            model: None,
            error: Some(detail),
            attempts: Vec::new(),
            warnings: Vec::new(),
            generated_at: Utc::now(),
        }
    }

    /// Text the dashboard should show for this result.
    pub fn display_text(&self) -> String {
        if self.success {
            return self.narrative.clone();
        }
        match &self.error {
            Some(detail) => format!("Analysis unavailable: {}", detail.summary),
            None => "Analysis unavailable".to_string(),
        }
    }

    /// Turn a failed result into [`AssistantError::AllProvidersFailed`].
    pub fn into_result(self) -> Result<Self, AssistantError> {
        if self.success {
            return Ok(self);
        }
        let summary = self
            .error
            .as_ref()
            .map(|d| d.summary.clone())
            .unwrap_or_else(|| "analysis unavailable".to_string());
        Err(AssistantError::AllProvidersFailed {
            summary,
            attempts: self.attempts,
        })
    }
}
