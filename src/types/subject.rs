//! Analysis subjects and report kinds

use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::error::AssistantError;

/// Analytical topic of a request. Selects the prompt template.
///
/// Dashboard pages pass the subject as a string; anything outside these
/// five members is rejected with [`AssistantError::UnsupportedSubject`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", try_from = "String", into = "String")]
pub enum Subject {
    DailyMonitoring,
    TraineeEvaluation,
    InterlabComparison,
    GoldTypeAnalysis,
    MassImpact,
}

impl Subject {
    pub const ALL: [Subject; 5] = [
        Self::DailyMonitoring,
        Self::TraineeEvaluation,
        Self::InterlabComparison,
        Self::GoldTypeAnalysis,
        Self::MassImpact,
    ];

    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::DailyMonitoring => "daily_monitoring",
            Self::TraineeEvaluation => "trainee_evaluation",
            Self::InterlabComparison => "interlab_comparison",
            Self::GoldTypeAnalysis => "gold_type_analysis",
            Self::MassImpact => "mass_impact",
        }
    }

    /// Page title used by the dashboard.
    pub const fn title(&self) -> &'static str {
        match self {
            Self::DailyMonitoring => "Daily Monitoring",
            Self::TraineeEvaluation => "Trainee Evaluation",
            Self::InterlabComparison => "Interlab Comparison",
            Self::GoldTypeAnalysis => "Gold Type Analysis",
            Self::MassImpact => "Mass Impact",
        }
    }
}

impl std::fmt::Display for Subject {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Subject {
    type Err = AssistantError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key = s.trim().to_lowercase().replace(['-', ' '], "_");
        Self::ALL
            .into_iter()
            .find(|subject| subject.as_str() == key)
            .ok_or_else(|| AssistantError::UnsupportedSubject(s.trim().to_string()))
    }
}

impl TryFrom<String> for Subject {
    type Error = AssistantError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Subject> for String {
    fn from(value: Subject) -> Self {
        value.as_str().to_string()
    }
}

/// Dashboard view the narrative is written for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportKind {
    /// Performance overview of the whole dataset
    #[default]
    Overview,
    /// Deviations by entity and week
    Heatmap,
    /// Moving-average trend over time
    Trend,
    /// Spread of deviations
    Distribution,
    /// Actionable recommendations for lab management
    Recommendations,
    /// Free-form question from the chat widget
    Question,
}

impl ReportKind {
    /// Default completion budget for this kind of report.
    pub const fn default_max_tokens(&self) -> u32 {
        match self {
            Self::Overview => 800,
            Self::Heatmap | Self::Trend | Self::Distribution => 600,
            Self::Recommendations => 750,
            Self::Question => 500,
        }
    }

    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Overview => "overview",
            Self::Heatmap => "heatmap",
            Self::Trend => "trend",
            Self::Distribution => "distribution",
            Self::Recommendations => "recommendations",
            Self::Question => "question",
        }
    }
}
