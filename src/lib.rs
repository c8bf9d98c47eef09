//! # assay-insight
//!
//! Provider-abstracted AI narratives for gold assay laboratory monitoring.
//!
//! The dashboard hands over an [`AnalysisRequest`] (subject, report kind,
//! already filtered assay records and a question). The [`Assistant`] builds
//! one shared prompt, sends it to OpenAI, Anthropic or DeepSeek, falls back
//! along a fixed chain when a provider fails, and returns an
//! [`AnalysisResult`] with narrative text and structured findings.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use assay_insight::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let assistant = Assistant::from_env()?;
//!
//!     let request = AnalysisRequest::builder()
//!         .subject(Subject::DailyMonitoring)
//!         .record(Record::new().with("assayer_name", "Kofi").with("percentage_deviation", 0.12))
//!         .prompt("Who needs retraining?")
//!         .build()?;
//!
//!     let result = assistant.analyze(&request, ProviderId::OpenAi).await?;
//!     println!("{}", result.display_text());
//!     Ok(())
//! }
//! ```

#![deny(unsafe_code)]

pub mod config;
pub mod error;
pub mod executors;
pub mod normalize;
pub mod orchestrator;
pub mod prompt;
pub mod providers;
pub mod registry;
pub mod stats;
pub mod telemetry;
pub mod transformers;
pub mod types;

pub use config::{AssistantConfig, ProviderConfig};
pub use error::{AssistantError, ErrorCategory, ErrorKind, Result};
pub use executors::{HttpProviderClient, ProviderClient};
pub use normalize::normalize;
pub use orchestrator::Assistant;
pub use prompt::{Prompt, PromptCatalog, SubjectTemplate};
pub use registry::{ProviderDetails, ProviderRegistry};
pub use stats::{DatasetSummary, offline_report};
pub use transformers::{ProviderPayload, RawResponse, format};
pub use types::{
    AnalysisRequest, AnalysisResult, AttemptOutcome, FailureDetail, FieldValue, Findings,
    ProviderAttempt, ProviderId, Record, ReportKind, Subject,
};

/// Commonly used types
pub mod prelude {
    pub use crate::config::{AssistantConfig, ProviderConfig};
    pub use crate::error::AssistantError;
    pub use crate::orchestrator::Assistant;
    pub use crate::types::{
        AnalysisRequest, AnalysisResult, FieldValue, Findings, ProviderId, Record, ReportKind,
        Subject,
    };
}
