//! Analysis request types

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;
use validator::Validate;

use super::{ProviderId, ReportKind, Subject};
use crate::error::AssistantError;

/// A single cell of an assay record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Null,
    Bool(bool),
    Number(f64),
    Text(String),
}

impl FieldValue {
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Number(n) if n.is_finite() => Some(*n),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s.as_str()),
            _ => None,
        }
    }

    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }
}

impl From<f64> for FieldValue {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl From<i64> for FieldValue {
    fn from(value: i64) -> Self {
        Self::Number(value as f64)
    }
}

impl From<bool> for FieldValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

/// One row of the dataset the dashboard has already loaded and filtered.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Record {
    pub fields: BTreeMap<String, FieldValue>,
}

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with<K: Into<String>, V: Into<FieldValue>>(mut self, key: K, value: V) -> Self {
        self.fields.insert(key.into(), value.into());
        self
    }

    pub fn get(&self, key: &str) -> Option<&FieldValue> {
        self.fields.get(key)
    }
}

/// Structured analysis request handed over by the dashboard.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct AnalysisRequest {
    pub id: Uuid,
    pub subject: Subject,
    #[serde(default)]
    pub report: ReportKind,
    #[validate(length(min = 1, message = "dataset must contain at least one record"))]
    pub dataset: Vec<Record>,
    pub prompt: String,
    pub provider: ProviderId,
    /// Column used to break statistics down per entity (assayer, trainee, lab)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group_by: Option<String>,
    /// Label such as "Last 30 days", quoted in the prompt
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_period: Option<String>,
}

impl AnalysisRequest {
    pub fn builder() -> AnalysisRequestBuilder {
        AnalysisRequestBuilder::default()
    }

    /// Parse a request from dashboard JSON, reporting unknown subjects
    /// as [`AssistantError::UnsupportedSubject`].
    pub fn from_json(json: &str) -> Result<Self, AssistantError> {
        #[derive(Deserialize)]
        struct Wire {
            #[serde(default)]
            id: Option<Uuid>,
            subject: String,
            #[serde(default)]
            report: Option<ReportKind>,
            #[serde(default)]
            dataset: Vec<Record>,
            #[serde(default)]
            prompt: String,
            provider: ProviderId,
            #[serde(default)]
            group_by: Option<String>,
            #[serde(default)]
            time_period: Option<String>,
        }

        let wire: Wire = serde_json::from_str(json)?;
        let mut builder = Self::builder()
            .subject_name(&wire.subject)?
            .dataset(wire.dataset)
            .prompt(wire.prompt)
            .provider(wire.provider);
        if let Some(id) = wire.id {
            builder = builder.id(id);
        }
        if let Some(report) = wire.report {
            builder = builder.report(report);
        }
        if let Some(column) = wire.group_by {
            builder = builder.group_by(column);
        }
        if let Some(period) = wire.time_period {
            builder = builder.time_period(period);
        }
        builder.build()
    }

    /// Check the request invariants: non-empty dataset, non-blank prompt.
    pub fn check(&self) -> Result<(), AssistantError> {
        self.validate()
            .map_err(|e| AssistantError::InvalidRequest(e.to_string()))?;
        if self.prompt.trim().is_empty() {
            return Err(AssistantError::InvalidRequest(
                "prompt must not be empty".to_string(),
            ));
        }
        Ok(())
    }

    /// The question with surrounding whitespace removed.
    pub fn question(&self) -> &str {
        self.prompt.trim()
    }
}

/// Builder for [`AnalysisRequest`]
#[derive(Debug, Default)]
pub struct AnalysisRequestBuilder {
    id: Option<Uuid>,
    subject: Option<Subject>,
    report: Option<ReportKind>,
    dataset: Vec<Record>,
    prompt: String,
    provider: Option<ProviderId>,
    group_by: Option<String>,
    time_period: Option<String>,
}

impl AnalysisRequestBuilder {
    pub fn id(mut self, id: Uuid) -> Self {
        self.id = Some(id);
        self
    }

    pub fn subject(mut self, subject: Subject) -> Self {
        self.subject = Some(subject);
        self
    }

    /// Set the subject from its dashboard identifier.
    pub fn subject_name(mut self, name: &str) -> Result<Self, AssistantError> {
        self.subject = Some(name.parse()?);
        Ok(self)
    }

    pub fn report(mut self, report: ReportKind) -> Self {
        self.report = Some(report);
        self
    }

    pub fn dataset(mut self, dataset: Vec<Record>) -> Self {
        self.dataset = dataset;
        self
    }

    pub fn record(mut self, record: Record) -> Self {
        self.dataset.push(record);
        self
    }

    pub fn prompt<S: Into<String>>(mut self, prompt: S) -> Self {
        self.prompt = prompt.into();
        self
    }

    pub fn provider(mut self, provider: ProviderId) -> Self {
        self.provider = Some(provider);
        self
    }

    pub fn group_by<S: Into<String>>(mut self, column: S) -> Self {
        self.group_by = Some(column.into());
        self
    }

    pub fn time_period<S: Into<String>>(mut self, period: S) -> Self {
        self.time_period = Some(period.into());
        self
    }

    pub fn build(self) -> Result<AnalysisRequest, AssistantError> {
        let subject = self
            .subject
            .ok_or_else(|| AssistantError::InvalidRequest("subject is required".to_string()))?;
        let request = AnalysisRequest {
            id: self.id.unwrap_or_else(Uuid::new_v4),
            subject,
            report: self.report.unwrap_or_default(),
            dataset: self.dataset,
            prompt: self.prompt,
            provider: self.provider.unwrap_or(ProviderId::OpenAi),
            group_by: self.group_by,
            time_period: self.time_period,
        };
        request.check()?;
        Ok(request)
    }
}
