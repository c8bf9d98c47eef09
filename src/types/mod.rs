//! Core data types shared across the assistant

mod provider;
mod request;
mod result;
mod subject;

pub use provider::ProviderId;
pub use request::{AnalysisRequest, AnalysisRequestBuilder, FieldValue, Record};
pub use result::{AnalysisResult, AttemptOutcome, FailureDetail, Findings, ProviderAttempt};
pub use subject::{ReportKind, Subject};
