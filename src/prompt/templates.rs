//! Built-in prompt text

use crate::types::{ReportKind, Subject};

/// User message; placeholders are substituted by [`super::PromptCatalog::build`].
pub const USER_TEMPLATE: &str = r#"Here is the {{SUBJECT_TITLE}} data for {{TIME_PERIOD}}, summarized as JSON:

{{DATASET_SUMMARY}}

{{QUESTION}}"#;

pub const STYLE_RULES: &str = "Write in a professional tone. Use specific numbers and percentages from the data. \
Mention people, labs and gold types by name when the data supports it. \
Focus only on the data provided and avoid assumptions beyond it.";

/// Closing instructions describing the machine-readable findings block.
pub const FINDINGS_INSTRUCTIONS: &str = r#"After the narrative, list the entities that need attention in this exact format:

=== FINDINGS ===
- <category>: <name>
=== END FINDINGS ===

Use only these categories: {{CATEGORIES}}. One entity per line. Omit the block entirely when nothing needs attention."#;

pub(super) fn role(subject: Subject) -> &'static str {
    match subject {
        Subject::DailyMonitoring => {
            "You are an expert gold assay analyst reviewing the daily performance of laboratory technicians (assayers) against a benchmark assayer."
        }
        Subject::TraineeEvaluation => {
            "You are an expert gold assay trainer evaluating trainee assayers against the results of experienced staff."
        }
        Subject::InterlabComparison => {
            "You are an expert in interlaboratory proficiency testing comparing the gold assay results of several laboratories."
        }
        Subject::GoldTypeAnalysis => {
            "You are an expert gold assay analyst studying how assay accuracy varies between gold types and purities."
        }
        Subject::MassImpact => {
            "You are an expert gold assay analyst studying how sample mass affects assay deviations."
        }
    }
}

pub(super) fn focus(subject: Subject) -> &'static [&'static str] {
    match subject {
        Subject::DailyMonitoring => &[
            "Overall performance summary",
            "Top and bottom performers with specific insights",
            "Consistency issues among assayers",
            "Recent trends (improving, worsening, or stable)",
        ],
        Subject::TraineeEvaluation => &[
            "Which trainees are ready to work unsupervised",
            "Which trainees deviate most from the reference results",
            "Progress over the evaluation period",
            "Training priorities for each trainee",
        ],
        Subject::InterlabComparison => &[
            "Agreement between laboratories and the consensus value",
            "Laboratories with systematic bias",
            "Laboratories with poor repeatability",
            "Follow-up actions for outlying laboratories",
        ],
        Subject::GoldTypeAnalysis => &[
            "Gold types with the largest and smallest deviations",
            "Whether accuracy depends on purity",
            "Gold types that need procedure changes",
        ],
        Subject::MassImpact => &[
            "Relationship between sample mass and deviation",
            "Mass ranges where accuracy degrades",
            "Recommended mass ranges for routine work",
        ],
    }
}

pub(super) fn categories(subject: Subject) -> &'static [&'static str] {
    match subject {
        Subject::DailyMonitoring => &["flagged_assayers", "top_performers"],
        Subject::TraineeEvaluation => &["flagged_trainees", "ready_trainees"],
        Subject::InterlabComparison => &["flagged_labs"],
        Subject::GoldTypeAnalysis => &["flagged_gold_types"],
        Subject::MassImpact => &["flagged_mass_ranges"],
    }
}

/// Extra instructions for the dashboard view being explained.
pub fn report_focus(report: ReportKind) -> &'static str {
    match report {
        ReportKind::Overview => {
            "Provide a comprehensive analysis in 3-4 paragraphs with specific data points."
        }
        ReportKind::Heatmap => {
            "Interpret the data as a heatmap of deviations by entity and week: time-based patterns, notable hotspots and consistency. Use 2-3 paragraphs."
        }
        ReportKind::Trend => {
            "Interpret the moving-average trend: overall direction, entities that are improving or worsening, and anomalies. Use 2-3 paragraphs."
        }
        ReportKind::Distribution => {
            "Interpret the distribution of deviations: shape, spread and comparisons between entities. Use 2-3 paragraphs."
        }
        ReportKind::Recommendations => {
            "Give specific, actionable recommendations for quality improvement, training, process standardization and quality control."
        }
        ReportKind::Question => "Answer the user's question directly and concisely.",
    }
}
