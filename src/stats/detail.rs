//! Report-specific views of a dataset
//!
//! Heatmaps and trend charts need the records in date order, so these views
//! are built from the records rather than from the aggregates in
//! [`DatasetSummary`].

use chrono::{DateTime, NaiveDate};
use serde::Serialize;
use std::cmp::Reverse;
use std::collections::BTreeMap;

use super::{ColumnStats, DatasetSummary, group_label, round4};
use crate::types::{FieldValue, Record, ReportKind};

/// Weekly means beyond this absolute deviation (percent) are hotspots.
pub const HOTSPOT_THRESHOLD: f64 = 5.0;
/// Preferred moving-average window, in days with results.
pub const MOVING_AVERAGE_WINDOW: usize = 7;
/// Moving-average points kept per group.
pub const TREND_TAIL: usize = 10;
/// Most recent heatmap cells kept in the prompt.
pub const MAX_WEEKLY_CELLS: usize = 120;
/// Group label used when the request has no grouping column.
pub const ALL_RECORDS: &str = "all records";

const HIGH_BIAS: f64 = 2.0;
const HIGH_VARIANCE: f64 = 1.5;

/// Extra section attached to a [`DatasetSummary`] for chart and
/// recommendation reports.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportDetail {
    Heatmap(HeatmapDetail),
    Trend(TrendDetail),
    Distribution(DistributionDetail),
    Performance(PerformanceDetail),
}

impl ReportDetail {
    /// `None` when the report needs nothing beyond the aggregates, or the
    /// dataset lacks the columns it needs (no deviation or no dates).
    pub fn build(report: ReportKind, records: &[Record], summary: &DatasetSummary) -> Option<Self> {
        let column = summary.deviation_column()?;
        let group_by = summary.group_by.as_deref();
        match report {
            ReportKind::Heatmap => {
                Series::collect(records, group_by, column).map(|s| Self::Heatmap(HeatmapDetail::from_series(&s)))
            }
            ReportKind::Trend => Series::collect(records, group_by, column)
                .and_then(|s| TrendDetail::from_series(&s))
                .map(Self::Trend),
            ReportKind::Distribution => {
                DistributionDetail::from_records(records, group_by, column).map(Self::Distribution)
            }
            ReportKind::Recommendations => PerformanceDetail::from_summary(summary, column).map(Self::Performance),
            ReportKind::Overview | ReportKind::Question => None,
        }
    }
}

/// Parse a text value as a calendar date.
///
/// Accepts `YYYY-MM-DD`, RFC 3339 timestamps and anything whose first ten
/// characters are a `YYYY-MM-DD` date (`2024-05-10 14:30:00`).
pub fn parse_date(value: &FieldValue) -> Option<NaiveDate> {
    let text = value.as_text()?.trim();
    if let Ok(date) = NaiveDate::parse_from_str(text, "%Y-%m-%d") {
        return Some(date);
    }
    if let Ok(ts) = DateTime::parse_from_rfc3339(text) {
        return Some(ts.date_naive());
    }
    NaiveDate::parse_from_str(text.get(..10)?, "%Y-%m-%d").ok()
}

/// The text column holding test dates, if any.
///
/// A column qualifies when at least half of its text values parse as dates.
/// Columns named like dates (`test_date`, `created_at`) win over others,
/// then the column with the most dates, then the first name.
pub fn detect_date_column(records: &[Record]) -> Option<String> {
    let mut counts: BTreeMap<&str, (usize, usize)> = BTreeMap::new();
    for record in records {
        for (column, value) in &record.fields {
            if value.as_text().is_none() {
                continue;
            }
            let entry = counts.entry(column.as_str()).or_default();
            entry.1 += 1;
            if parse_date(value).is_some() {
                entry.0 += 1;
            }
        }
    }
    counts
        .into_iter()
        .filter(|(_, (dated, total))| *dated > 0 && dated * 2 >= *total)
        .max_by_key(|(name, (dated, _))| (looks_like_date(name), *dated, Reverse(*name)))
        .map(|(name, _)| name.to_string())
}

fn looks_like_date(column: &str) -> bool {
    let column = column.to_lowercase();
    column.contains("date") || column.contains("time") || column.ends_with("_at") || column == "day"
}

fn group_key(record: &Record, group_by: Option<&str>) -> Option<String> {
    match group_by {
        Some(column) => record.get(column).and_then(group_label),
        None => Some(ALL_RECORDS.to_string()),
    }
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        0.0
    } else {
        values.iter().sum::<f64>() / values.len() as f64
    }
}

/// Deviations per group and date.
#[derive(Debug, Clone, PartialEq)]
pub struct Series {
    pub date_column: String,
    pub groups: BTreeMap<String, BTreeMap<NaiveDate, Vec<f64>>>,
}

impl Series {
    /// `None` without a date column or without any dated value.
    pub fn collect(records: &[Record], group_by: Option<&str>, column: &str) -> Option<Self> {
        let date_column = detect_date_column(records)?;
        let mut groups: BTreeMap<String, BTreeMap<NaiveDate, Vec<f64>>> = BTreeMap::new();
        for record in records {
            let (Some(date), Some(value), Some(group)) = (
                record.get(&date_column).and_then(parse_date),
                record.get(column).and_then(FieldValue::as_f64),
                group_key(record, group_by),
            ) else {
                continue;
            };
            groups.entry(group).or_default().entry(date).or_default().push(value);
        }
        (!groups.is_empty()).then_some(Self { date_column, groups })
    }

    pub fn first_date(&self) -> Option<NaiveDate> {
        self.groups.values().filter_map(|days| days.keys().next()).min().copied()
    }

    pub fn last_date(&self) -> Option<NaiveDate> {
        self.groups.values().filter_map(|days| days.keys().next_back()).max().copied()
    }
}

/// Mean deviation of one group in one week.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WeeklyCell {
    /// `%Y-%U`: year and Sunday-based week number
    pub week: String,
    pub group: String,
    pub mean: f64,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupSpread {
    pub group: String,
    pub std: f64,
    pub count: usize,
}

/// Deviations by group and week.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HeatmapDetail {
    pub date_column: String,
    pub total_weeks: usize,
    pub total_groups: usize,
    /// Cells beyond [`HOTSPOT_THRESHOLD`], largest first
    pub hotspots: Vec<WeeklyCell>,
    pub most_consistent: Vec<GroupSpread>,
    pub least_consistent: Vec<GroupSpread>,
    /// Ordered by week then group; only the latest [`MAX_WEEKLY_CELLS`]
    pub weekly: Vec<WeeklyCell>,
}

impl HeatmapDetail {
    pub fn from_series(series: &Series) -> Self {
        let mut cells: BTreeMap<(String, &str), Vec<f64>> = BTreeMap::new();
        let mut spreads = Vec::new();

        for (group, days) in &series.groups {
            let mut all = Vec::new();
            for (date, values) in days {
                let week = date.format("%Y-%U").to_string();
                cells.entry((week, group.as_str())).or_default().extend(values);
                all.extend(values);
            }
            if let Some(stats) = ColumnStats::from_values(&all)
                && stats.count > 1
            {
                spreads.push(GroupSpread {
                    group: group.clone(),
                    std: stats.std,
                    count: stats.count,
                });
            }
        }

        let mut weekly: Vec<WeeklyCell> = cells
            .into_iter()
            .map(|((week, group), values)| WeeklyCell {
                week,
                group: group.to_string(),
                mean: round4(mean(&values)),
                count: values.len(),
            })
            .collect();
        let mut weeks: Vec<&str> = weekly.iter().map(|c| c.week.as_str()).collect();
        weeks.dedup();
        let total_weeks = weeks.len();

        let mut hotspots: Vec<WeeklyCell> = weekly
            .iter()
            .filter(|c| c.mean.abs() > HOTSPOT_THRESHOLD)
            .cloned()
            .collect();
        hotspots.sort_by(|a, b| b.mean.abs().total_cmp(&a.mean.abs()).then_with(|| a.week.cmp(&b.week)));

        if weekly.len() > MAX_WEEKLY_CELLS {
            weekly.drain(..weekly.len() - MAX_WEEKLY_CELLS);
        }

        // most consistent take the lower half, so the two lists never overlap
        spreads.sort_by(|a, b| a.std.total_cmp(&b.std).then_with(|| a.group.cmp(&b.group)));
        let split = spreads.len().div_ceil(2);
        let least_consistent = spreads[split..].iter().rev().take(3).cloned().collect();
        let most_consistent = spreads.into_iter().take(split.min(3)).collect();

        Self {
            date_column: series.date_column.clone(),
            total_weeks,
            total_groups: series.groups.len(),
            hotspots,
            most_consistent,
            least_consistent,
            weekly,
        }
    }
}

/// Direction of a moving-average deviation, judged on absolute values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    StronglyImproving,
    Improving,
    Stable,
    Worsening,
    StronglyWorsening,
}

impl Direction {
    /// Compare the start and end of a series of absolute deviations.
    pub fn classify(first: f64, last: f64) -> Self {
        if last < first * 0.8 {
            Self::StronglyImproving
        } else if last < first * 0.95 {
            Self::Improving
        } else if last > first * 1.2 {
            Self::StronglyWorsening
        } else if last > first * 1.05 {
            Self::Worsening
        } else {
            Self::Stable
        }
    }

    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::StronglyImproving => "strongly improving",
            Self::Improving => "improving",
            Self::Stable => "stable",
            Self::Worsening => "worsening",
            Self::StronglyWorsening => "strongly worsening",
        }
    }

    pub const fn is_improving(&self) -> bool {
        matches!(self, Self::StronglyImproving | Self::Improving)
    }

    pub const fn is_worsening(&self) -> bool {
        matches!(self, Self::StronglyWorsening | Self::Worsening)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrendPoint {
    pub date: NaiveDate,
    pub value: f64,
}

/// Moving-average tail of one group.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupTrend {
    pub group: String,
    /// Window in days with results; shrinks for short series
    pub window: usize,
    pub direction: Direction,
    /// Mean absolute moving average at the start of the tail
    pub first_value: f64,
    /// Mean absolute moving average at the end of the tail
    pub last_value: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub change_percentage: Option<f64>,
    pub latest_date: NaiveDate,
    pub recent: Vec<TrendPoint>,
}

impl GroupTrend {
    /// `None` for fewer than two days with results.
    pub fn from_days(group: &str, days: &BTreeMap<NaiveDate, Vec<f64>>) -> Option<Self> {
        if days.len() < 2 {
            return None;
        }
        let daily: Vec<(NaiveDate, f64)> = days.iter().map(|(date, values)| (*date, mean(values))).collect();
        let window = MOVING_AVERAGE_WINDOW.min(daily.len().div_ceil(2)).max(1);

        let averaged: Vec<TrendPoint> = daily
            .windows(window)
            .map(|w| TrendPoint {
                date: w[w.len() - 1].0,
                value: round4(w.iter().map(|(_, v)| v).sum::<f64>() / window as f64),
            })
            .collect();
        let recent = averaged[averaged.len().saturating_sub(TREND_TAIL)..].to_vec();
        let latest_date = recent.last()?.date;

        let k = (recent.len() / 2).clamp(1, 3);
        let abs_mean = |points: &[TrendPoint]| mean(&points.iter().map(|p| p.value.abs()).collect::<Vec<_>>());
        let first = abs_mean(&recent[..k]);
        let last = abs_mean(&recent[recent.len() - k..]);

        Some(Self {
            group: group.to_string(),
            window,
            direction: Direction::classify(first, last),
            first_value: round4(first),
            last_value: round4(last),
            change_percentage: (first > 0.0).then(|| round4((last - first) / first * 100.0)),
            latest_date,
            recent,
        })
    }
}

/// Moving-average trends per group.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrendDetail {
    pub date_column: String,
    pub first_date: NaiveDate,
    pub last_date: NaiveDate,
    pub groups: Vec<GroupTrend>,
}

impl TrendDetail {
    /// `None` when no group has two days with results.
    pub fn from_series(series: &Series) -> Option<Self> {
        let groups: Vec<GroupTrend> = series
            .groups
            .iter()
            .filter_map(|(group, days)| GroupTrend::from_days(group, days))
            .collect();
        if groups.is_empty() {
            return None;
        }
        Some(Self {
            date_column: series.date_column.clone(),
            first_date: series.first_date()?,
            last_date: series.last_date()?,
            groups,
        })
    }
}

/// Linear-interpolated quantiles.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Percentiles {
    pub p10: f64,
    pub p25: f64,
    pub p50: f64,
    pub p75: f64,
    pub p90: f64,
}

impl Percentiles {
    pub fn from_values(values: &[f64]) -> Option<Self> {
        if values.is_empty() {
            return None;
        }
        let mut sorted = values.to_vec();
        sorted.sort_by(f64::total_cmp);
        let at = |q: f64| round4(quantile(&sorted, q));
        Some(Self {
            p10: at(0.10),
            p25: at(0.25),
            p50: at(0.50),
            p75: at(0.75),
            p90: at(0.90),
        })
    }

    pub fn iqr(&self) -> f64 {
        round4(self.p75 - self.p25)
    }
}

fn quantile(sorted: &[f64], q: f64) -> f64 {
    let pos = q * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    sorted[lo] + (sorted[hi] - sorted[lo]) * (pos - lo as f64)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Shape {
    Symmetric,
    RightSkewed,
    LeftSkewed,
}

impl Shape {
    /// Skew from the gap between mean and median, in standard deviations.
    pub fn classify(mean: f64, median: f64, std: f64) -> Self {
        let ratio = if std == 0.0 { 0.0 } else { (mean - median) / std };
        if ratio.abs() < 0.2 {
            Self::Symmetric
        } else if ratio > 0.0 {
            Self::RightSkewed
        } else {
            Self::LeftSkewed
        }
    }

    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Symmetric => "approximately symmetric",
            Self::RightSkewed => "right-skewed",
            Self::LeftSkewed => "left-skewed",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Width {
    Narrow,
    Moderate,
    Wide,
}

impl Width {
    /// From the coefficient of variation.
    pub fn classify(mean: f64, std: f64) -> Self {
        let cv = if std == 0.0 {
            0.0
        } else if mean == 0.0 {
            f64::INFINITY
        } else {
            (std / mean).abs()
        };
        if cv < 0.5 {
            Self::Narrow
        } else if cv < 1.0 {
            Self::Moderate
        } else {
            Self::Wide
        }
    }

    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Narrow => "narrow",
            Self::Moderate => "moderate",
            Self::Wide => "wide",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupDistribution {
    pub group: String,
    pub count: usize,
    pub mean: f64,
    pub std: f64,
    pub percentiles: Percentiles,
    pub iqr: f64,
    pub shape: Shape,
    pub spread: Width,
}

/// Spread of deviations overall and per group.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DistributionDetail {
    pub overall: Percentiles,
    pub groups: Vec<GroupDistribution>,
}

impl DistributionDetail {
    pub fn from_records(records: &[Record], group_by: Option<&str>, column: &str) -> Option<Self> {
        let mut all = Vec::new();
        let mut by_group: BTreeMap<String, Vec<f64>> = BTreeMap::new();
        for record in records {
            let Some(value) = record.get(column).and_then(FieldValue::as_f64) else {
                continue;
            };
            all.push(value);
            if group_by.is_some()
                && let Some(group) = group_key(record, group_by)
            {
                by_group.entry(group).or_default().push(value);
            }
        }

        let groups = by_group
            .into_iter()
            .filter_map(|(group, values)| {
                let stats = ColumnStats::from_values(&values)?;
                let percentiles = Percentiles::from_values(&values)?;
                Some(GroupDistribution {
                    group,
                    count: stats.count,
                    mean: stats.mean,
                    std: stats.std,
                    iqr: percentiles.iqr(),
                    shape: Shape::classify(stats.mean, percentiles.p50, stats.std),
                    spread: Width::classify(stats.mean, stats.std),
                    percentiles,
                })
            })
            .collect();

        Some(Self {
            overall: Percentiles::from_values(&all)?,
            groups,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupPerformance {
    pub group: String,
    pub mean: f64,
    pub std: f64,
    pub count: usize,
}

/// Groups sorted into the buckets recommendations are written for.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PerformanceDetail {
    /// Mean deviation beyond 2%
    pub high_bias: Vec<GroupPerformance>,
    /// Standard deviation beyond 1.5%
    pub high_variance: Vec<GroupPerformance>,
    /// Fewer than half the median sample count
    pub low_experience: Vec<GroupPerformance>,
    /// Low bias, low variance and at least the median sample count
    pub well_performing: Vec<GroupPerformance>,
    pub mean_deviation: f64,
    pub mean_group_std: f64,
}

impl PerformanceDetail {
    /// `None` without groups.
    pub fn from_summary(summary: &DatasetSummary, column: &str) -> Option<Self> {
        let groups: Vec<GroupPerformance> = summary
            .groups
            .iter()
            .filter_map(|(name, group)| {
                group.columns.get(column).map(|stats| GroupPerformance {
                    group: name.clone(),
                    mean: stats.mean,
                    std: stats.std,
                    count: stats.count,
                })
            })
            .collect();
        if groups.is_empty() {
            return None;
        }

        let mut counts: Vec<usize> = groups.iter().map(|g| g.count).collect();
        counts.sort_unstable();
        let median = if counts.len() % 2 == 0 {
            (counts[counts.len() / 2 - 1] + counts[counts.len() / 2]) as f64 / 2.0
        } else {
            counts[counts.len() / 2] as f64
        };

        let pick = |keep: &dyn Fn(&GroupPerformance) -> bool| -> Vec<GroupPerformance> {
            groups.iter().filter(|g| keep(g)).cloned().collect()
        };
        let high_bias = pick(&|g| g.mean.abs() > HIGH_BIAS);
        let high_variance = pick(&|g| g.std > HIGH_VARIANCE);
        let low_experience = pick(&|g| (g.count as f64) < median / 2.0);
        let well_performing = pick(&|g| {
            g.mean.abs() < HIGH_BIAS / 2.0 && g.std < HIGH_VARIANCE / 2.0 && g.count as f64 >= median
        });

        Some(Self {
            high_bias,
            high_variance,
            low_experience,
            well_performing,
            mean_deviation: summary.numeric.get(column).map(|s| s.mean).unwrap_or_default(),
            mean_group_std: round4(mean(&groups.iter().map(|g| g.std).collect::<Vec<_>>())),
        })
    }
}
