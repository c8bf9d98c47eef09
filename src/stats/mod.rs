//! Dataset statistics
//!
//! [`DatasetSummary`] is the compact, serializable view of a dataset that
//! goes into every prompt. Chart and recommendation reports attach a
//! [`ReportDetail`] section. [`offline_report`] renders the same numbers as
//! deterministic markdown that needs no provider at all.

pub mod detail;
mod offline;

use serde::Serialize;
use std::collections::BTreeMap;

use crate::types::{FieldValue, Record, ReportKind};

pub use detail::{Direction, ReportDetail};
pub use offline::{accuracy_band, offline_report};

/// Number of most frequent values kept per text column.
pub const TOP_VALUES: usize = 5;

/// Columns that carry the deviation from the benchmark assayer, in lookup order.
const DEVIATION_COLUMNS: [&str; 4] = [
    "percentage_deviation",
    "deviation_percentage",
    "deviation_percent",
    "deviation",
];

/// Descriptive statistics for one numeric column.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColumnStats {
    pub count: usize,
    pub mean: f64,
    /// Mean of absolute values; the ranking key for deviations
    pub mean_abs: f64,
    /// Sample standard deviation (0 for a single value)
    pub std: f64,
    pub min: f64,
    pub max: f64,
}

impl ColumnStats {
    /// `None` when `values` is empty.
    pub fn from_values(values: &[f64]) -> Option<Self> {
        if values.is_empty() {
            return None;
        }
        let n = values.len() as f64;
        let mean = values.iter().sum::<f64>() / n;
        let mean_abs = values.iter().map(|v| v.abs()).sum::<f64>() / n;
        let std = if values.len() > 1 {
            let var = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (n - 1.0);
            var.sqrt()
        } else {
            0.0
        };
        let min = values.iter().copied().fold(f64::INFINITY, f64::min);
        let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        Some(Self {
            count: values.len(),
            mean: round4(mean),
            mean_abs: round4(mean_abs),
            std: round4(std),
            min: round4(min),
            max: round4(max),
        })
    }
}

/// Value counts for one text column.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TextColumn {
    pub distinct: usize,
    /// Most frequent values, highest count first, ties by value
    pub top: Vec<(String, usize)>,
}

/// Numeric statistics for one value of the grouping column.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupStats {
    pub count: usize,
    pub columns: BTreeMap<String, ColumnStats>,
}

/// Compact statistical view of a dataset.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DatasetSummary {
    pub record_count: usize,
    pub numeric: BTreeMap<String, ColumnStats>,
    pub text: BTreeMap<String, TextColumn>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub group_by: Option<String>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub groups: BTreeMap<String, GroupStats>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<ReportDetail>,
}

impl DatasetSummary {
    /// Summarize `records`, optionally broken down by the `group_by` column.
    ///
    /// Non-finite numbers and nulls are ignored. Records missing the grouping
    /// column only count toward the overall statistics.
    pub fn from_records(records: &[Record], group_by: Option<&str>) -> Self {
        let mut numbers: BTreeMap<&str, Vec<f64>> = BTreeMap::new();
        let mut texts: BTreeMap<&str, BTreeMap<&str, usize>> = BTreeMap::new();
        let mut grouped: BTreeMap<String, (usize, BTreeMap<&str, Vec<f64>>)> = BTreeMap::new();

        for record in records {
            let group_key = group_by
                .and_then(|column| record.get(column))
                .and_then(group_label);

            for (column, value) in &record.fields {
                let column = column.as_str();
                match value {
                    FieldValue::Number(_) => {
                        let Some(n) = value.as_f64() else { continue };
                        numbers.entry(column).or_default().push(n);
                        if let Some(key) = &group_key
                            && Some(column) != group_by
                        {
                            grouped
                                .entry(key.clone())
                                .or_default()
                                .1
                                .entry(column)
                                .or_default()
                                .push(n);
                        }
                    }
                    FieldValue::Text(s) => {
                        *texts.entry(column).or_default().entry(s.as_str()).or_default() += 1;
                    }
                    FieldValue::Bool(_) | FieldValue::Null => {}
                }
            }

            if let Some(key) = group_key {
                grouped.entry(key).or_default().0 += 1;
            }
        }

        let numeric = numbers
            .into_iter()
            .filter_map(|(column, values)| {
                ColumnStats::from_values(&values).map(|s| (column.to_string(), s))
            })
            .collect();

        let text = texts
            .into_iter()
            .map(|(column, counts)| {
                let distinct = counts.len();
                let mut top: Vec<(String, usize)> =
                    counts.into_iter().map(|(v, c)| (v.to_string(), c)).collect();
                top.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
                top.truncate(TOP_VALUES);
                (column.to_string(), TextColumn { distinct, top })
            })
            .collect();

        let groups = grouped
            .into_iter()
            .map(|(key, (count, columns))| {
                let columns = columns
                    .into_iter()
                    .filter_map(|(column, values)| {
                        ColumnStats::from_values(&values).map(|s| (column.to_string(), s))
                    })
                    .collect();
                (key, GroupStats { count, columns })
            })
            .collect();

        Self {
            record_count: records.len(),
            numeric,
            text,
            group_by: group_by.map(str::to_string),
            groups,
            detail: None,
        }
    }

    /// [`from_records`](Self::from_records) plus the section `report` needs:
    /// weekly means for heatmaps, moving-average tails for trends, percentiles
    /// for distributions, performance buckets for recommendations.
    pub fn for_report(records: &[Record], group_by: Option<&str>, report: ReportKind) -> Self {
        let mut summary = Self::from_records(records, group_by);
        summary.detail = ReportDetail::build(report, records, &summary);
        summary
    }

    /// The column holding deviations from the benchmark, if the dataset has one.
    pub fn deviation_column(&self) -> Option<&str> {
        DEVIATION_COLUMNS
            .iter()
            .find(|c| self.numeric.contains_key(**c))
            .copied()
            .or_else(|| {
                self.numeric
                    .keys()
                    .find(|k| k.contains("deviation"))
                    .map(String::as_str)
            })
    }

    /// Groups ranked by mean absolute value of `column`, best first.
    pub fn ranked_groups(&self, column: &str) -> Vec<(&str, &GroupStats, &ColumnStats)> {
        let mut ranked: Vec<_> = self
            .groups
            .iter()
            .filter_map(|(name, group)| {
                group
                    .columns
                    .get(column)
                    .map(|stats| (name.as_str(), group, stats))
            })
            .collect();
        ranked.sort_by(|a, b| {
            a.2.mean_abs
                .total_cmp(&b.2.mean_abs)
                .then_with(|| a.0.cmp(b.0))
        });
        ranked
    }

    /// Pretty JSON for embedding in a prompt.
    pub fn to_prompt_json(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_else(|_| "{}".to_string())
    }
}

fn group_label(value: &FieldValue) -> Option<String> {
    match value {
        FieldValue::Text(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        FieldValue::Number(n) if n.is_finite() => Some(n.to_string()),
        FieldValue::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn round4(v: f64) -> f64 {
    (v * 10_000.0).round() / 10_000.0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(assayer: &str, deviation: f64) -> Record {
        Record::new()
            .with("assayer_name", assayer)
            .with("percentage_deviation", deviation)
            .with("gold_content", 91.6)
    }

    fn dataset() -> Vec<Record> {
        vec![
            row("Kofi", 0.05),
            row("Kofi", -0.07),
            row("Ama", 0.9),
            row("Ama", 1.4),
            row("Ama", -0.2),
            Record::new().with("percentage_deviation", f64::NAN),
        ]
    }

    #[test]
    fn column_stats_basic() {
        let stats = ColumnStats::from_values(&[1.0, 2.0, 3.0]).unwrap();
        assert_eq!(stats.count, 3);
        assert_eq!(stats.mean, 2.0);
        assert_eq!(stats.std, 1.0);
        assert_eq!(stats.min, 1.0);
        assert_eq!(stats.max, 3.0);
        assert!(ColumnStats::from_values(&[]).is_none());
        assert_eq!(ColumnStats::from_values(&[4.0]).unwrap().std, 0.0);
    }

    #[test]
    fn summary_groups_by_column() {
        let summary = DatasetSummary::from_records(&dataset(), Some("assayer_name"));
        assert_eq!(summary.record_count, 6);
        assert_eq!(summary.numeric["percentage_deviation"].count, 5);
        assert_eq!(summary.text["assayer_name"].distinct, 2);
        assert_eq!(summary.text["assayer_name"].top[0], ("Ama".to_string(), 3));
        assert_eq!(summary.groups.len(), 2);
        assert_eq!(summary.groups["Kofi"].count, 2);
        assert_eq!(summary.groups["Ama"].columns["percentage_deviation"].count, 3);
        assert_eq!(summary.deviation_column(), Some("percentage_deviation"));
    }

    #[test]
    fn ranking_prefers_smallest_absolute_deviation() {
        let summary = DatasetSummary::from_records(&dataset(), Some("assayer_name"));
        let ranked = summary.ranked_groups("percentage_deviation");
        assert_eq!(ranked.first().map(|r| r.0), Some("Kofi"));
        assert_eq!(ranked.last().map(|r| r.0), Some("Ama"));
    }

    #[test]
    fn report_detail_is_serialized_only_when_present() {
        let plain = DatasetSummary::for_report(&dataset(), Some("assayer_name"), ReportKind::Overview);
        assert!(plain.detail.is_none());
        assert!(!plain.to_prompt_json().contains("\"detail\""));

        let spread = DatasetSummary::for_report(&dataset(), Some("assayer_name"), ReportKind::Distribution);
        let json = spread.to_prompt_json();
        assert!(json.contains("\"distribution\""));
        assert!(json.contains("\"p90\""));
        assert_eq!(json, spread.to_prompt_json());
    }
}
