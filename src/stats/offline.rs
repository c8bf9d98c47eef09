//! Deterministic markdown reports
//!
//! Shown next to an "analysis unavailable" message; they never replace a
//! provider narrative. Chart reports fall back to the overview when the
//! dataset has no dates.

use std::cmp::Ordering;
use std::fmt::Write as _;

use super::DatasetSummary;
use super::detail::{
    DistributionDetail, GroupTrend, HeatmapDetail, PerformanceDetail, ReportDetail, Shape, TrendDetail,
    Width,
};
use crate::types::{AnalysisRequest, ReportKind};

/// Render the offline report for `request.report`.
///
/// [`ReportKind::Question`] gets a one-paragraph answer for common questions
/// (lowest or highest deviation, consistency, threshold counts, totals).
pub fn offline_report(request: &AnalysisRequest) -> String {
    let summary = DatasetSummary::for_report(&request.dataset, request.group_by.as_deref(), request.report);
    let ctx = Context {
        period: request.time_period.as_deref().unwrap_or("the selected period"),
        nouns: Nouns::for_column(request.group_by.as_deref()),
    };

    match (request.report, &summary.detail) {
        (ReportKind::Question, _) => answer_question(&ctx, request.question(), &summary),
        (ReportKind::Heatmap, Some(ReportDetail::Heatmap(detail))) => heatmap_report(&ctx, detail),
        (ReportKind::Trend, Some(ReportDetail::Trend(detail))) => trend_report(&ctx, detail),
        (ReportKind::Distribution, Some(ReportDetail::Distribution(detail))) if !detail.groups.is_empty() => {
            distribution_report(&ctx, detail)
        }
        (ReportKind::Recommendations, Some(ReportDetail::Performance(detail))) => {
            recommendations_report(&ctx, detail)
        }
        _ => overview_report(&ctx, &summary),
    }
}

struct Context<'a> {
    period: &'a str,
    nouns: Nouns,
}

struct Nouns {
    plural: &'static str,
    singular: &'static str,
}

impl Nouns {
    fn for_column(column: Option<&str>) -> Self {
        let column = column.map(str::to_lowercase).unwrap_or_default();
        let (singular, plural) = if column.contains("assayer") {
            ("assayer", "assayers")
        } else if column.contains("trainee") {
            ("trainee", "trainees")
        } else if column.contains("lab") {
            ("laboratory", "laboratories")
        } else if column.contains("gold_type") {
            ("gold type", "gold types")
        } else {
            ("group", "groups")
        };
        Self { plural, singular }
    }

    fn count(&self, n: usize) -> String {
        format!("{n} {}", if n == 1 { self.singular } else { self.plural })
    }

    fn there_are(&self, n: usize) -> String {
        format!("There {} {}", if n == 1 { "is" } else { "are" }, self.count(n))
    }
}

/// Numbered list that numbers items as they are added.
#[derive(Default)]
struct Steps(Vec<String>);

impl Steps {
    fn push(&mut self, step: impl Into<String>) {
        self.0.push(step.into());
    }

    fn write_to(&self, out: &mut String) {
        for (i, step) in self.0.iter().enumerate() {
            let _ = writeln!(out, "{}. {step}", i + 1);
        }
    }
}

fn overview_report(ctx: &Context<'_>, summary: &DatasetSummary) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "## Statistical Overview for {}\n", ctx.period);
    let _ = writeln!(out, "### Overall Summary");
    let _ = write!(out, "{} records were analyzed", summary.record_count);
    if !summary.groups.is_empty() {
        let _ = write!(out, " across {}", ctx.nouns.count(summary.groups.len()));
    }
    let _ = writeln!(out, ".");

    let Some(column) = summary.deviation_column() else {
        let _ = writeln!(out, "\n### Column Statistics");
        for (name, stats) in &summary.numeric {
            let _ = writeln!(
                out,
                "- {name}: mean {:.2}, std {:.2}, range {:.2} to {:.2} (n={})",
                stats.mean, stats.std, stats.min, stats.max, stats.count
            );
        }
        return out;
    };

    if let Some(overall) = summary.numeric.get(column) {
        let worst = overall.max.abs().max(overall.min.abs());
        let _ = writeln!(
            out,
            "The average absolute deviation was {:.2}% with a maximum of {:.2}%. {}",
            overall.mean_abs,
            worst,
            accuracy_band(overall.mean_abs)
        );
    }

    let ranked = summary.ranked_groups(column);
    if let (Some(best), Some(worst)) = (ranked.first(), ranked.last())
        && ranked.len() > 1
    {
        let _ = writeln!(out, "\n### Performance Highlights");
        let _ = writeln!(
            out,
            "**Closest to benchmark:** {} with an average deviation of {:.2}% across {} samples (std {:.2}).",
            best.0, best.2.mean_abs, best.2.count, best.2.std
        );
        let _ = writeln!(
            out,
            "**Needs improvement:** {} with an average deviation of {:.2}% across {} samples (std {:.2}).",
            worst.0, worst.2.mean_abs, worst.2.count, worst.2.std
        );

        let mean_std = ranked.iter().map(|r| r.2.std).sum::<f64>() / ranked.len() as f64;
        let mut inconsistent: Vec<_> = ranked
            .iter()
            .filter(|r| r.2.count > 1 && r.2.std > mean_std)
            .collect();
        inconsistent.sort_by(|a, b| b.2.std.total_cmp(&a.2.std).then_with(|| a.0.cmp(b.0)));
        if !inconsistent.is_empty() {
            let _ = writeln!(out, "\n### Consistency Concerns");
            for r in inconsistent.iter().take(3) {
                let _ = writeln!(
                    out,
                    "- {}: standard deviation of {:.2}% across {} samples",
                    r.0, r.2.std, r.2.count
                );
            }
        }

        let mut steps = Steps::default();
        steps.push(format!("Provide additional training to {} to improve accuracy", worst.0));
        if let Some(first) = inconsistent.first() {
            steps.push(format!("Review testing procedures with {} to improve consistency", first.0));
        }
        steps.push(format!("Consider recognizing {} for consistently accurate results", best.0));
        steps.push("Keep regular calibration checks for all testing equipment");
        let _ = writeln!(out, "\n### Recommendations");
        steps.write_to(&mut out);
    }

    out
}

fn heatmap_report(ctx: &Context<'_>, detail: &HeatmapDetail) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "## Heatmap Analysis for {}\n", ctx.period);
    let _ = writeln!(out, "### Overview");
    let _ = writeln!(
        out,
        "The heatmap covers {} of data across {}.",
        if detail.total_weeks == 1 { "1 week".to_string() } else { format!("{} weeks", detail.total_weeks) },
        ctx.nouns.count(detail.total_groups)
    );

    let _ = writeln!(out, "\n### Notable Hotspots");
    if detail.hotspots.is_empty() {
        let _ = writeln!(
            out,
            "No weekly average exceeded {:.0}%, suggesting stable performance across all weeks.",
            super::detail::HOTSPOT_THRESHOLD
        );
    } else {
        let _ = writeln!(out, "The heatmap shows {} significant deviation hotspots:", detail.hotspots.len());
        for spot in detail.hotspots.iter().take(5) {
            let _ = writeln!(out, "- Week {}: {} with {:.2}% deviation", spot.week, spot.group, spot.mean);
        }
    }

    if !detail.most_consistent.is_empty() || !detail.least_consistent.is_empty() {
        let _ = writeln!(out, "\n### Consistency Patterns");
        for (label, spreads) in [("Most consistent", &detail.most_consistent), ("Least consistent", &detail.least_consistent)] {
            if spreads.is_empty() {
                continue;
            }
            let _ = writeln!(out, "**{label} {}:**", ctx.nouns.plural);
            for s in spreads {
                let _ = writeln!(out, "- {} (std dev: {:.2}%)", s.group, s.std);
            }
        }
    }

    let mut steps = Steps::default();
    if !detail.hotspots.is_empty() {
        steps.push("Check weeks with several hotspots for equipment or procedure issues");
    }
    if let Some(s) = detail.least_consistent.first() {
        steps.push(format!("Provide additional training to {} to improve consistency", s.group));
    }
    if let Some(s) = detail.most_consistent.first() {
        steps.push(format!("Consider {}'s methods as a best practice template", s.group));
    }
    steps.push(format!(
        "Review the testing methodology in weeks with unusual patterns across several {}",
        ctx.nouns.plural
    ));
    let _ = writeln!(out, "\n### Recommendations");
    steps.write_to(&mut out);
    out
}

fn trend_report(ctx: &Context<'_>, detail: &TrendDetail) -> String {
    let improving: Vec<&GroupTrend> = detail.groups.iter().filter(|g| g.direction.is_improving()).collect();
    let worsening: Vec<&GroupTrend> = detail.groups.iter().filter(|g| g.direction.is_worsening()).collect();
    let stable = detail.groups.len() - improving.len() - worsening.len();

    let change = |g: &&GroupTrend| g.change_percentage.unwrap_or_default();
    let most_improved = improving.iter().copied().min_by(|a, b| change(a).total_cmp(&change(b)));
    let most_concerning = worsening.iter().copied().max_by(|a, b| change(a).total_cmp(&change(b)));

    let mut out = String::new();
    let _ = writeln!(out, "## Moving Average Trend Analysis for {}\n", ctx.period);
    let _ = writeln!(out, "### Overall Trend Summary");
    let _ = write!(
        out,
        "Between {} and {}, ",
        detail.first_date.format("%Y-%m-%d"),
        detail.last_date.format("%Y-%m-%d")
    );
    if improving.len() > worsening.len() && improving.len() > stable {
        let _ = write!(out, "the moving averages show an overall improving trend");
    } else if worsening.len() > improving.len() && worsening.len() > stable {
        let _ = write!(out, "the moving averages show a concerning overall worsening trend");
    } else {
        let _ = write!(out, "the moving averages show a generally stable trend");
    }
    let _ = writeln!(
        out,
        ": {} improving, {} stable and {} worsening.",
        improving.len(),
        stable,
        worsening.len()
    );

    if most_improved.is_some() || most_concerning.is_some() {
        let _ = writeln!(out, "\n### Notable Trends");
    }
    if let Some(g) = most_improved {
        let _ = writeln!(
            out,
            "**Most improved:** {} fell from {:.2}% to {:.2}% ({}-day moving average, latest {}).",
            g.group,
            g.first_value,
            g.last_value,
            g.window,
            g.latest_date.format("%Y-%m-%d")
        );
    }
    if let Some(g) = most_concerning {
        let _ = writeln!(
            out,
            "**Most concerning:** {} rose from {:.2}% to {:.2}% ({}-day moving average, latest {}).",
            g.group,
            g.first_value,
            g.last_value,
            g.window,
            g.latest_date.format("%Y-%m-%d")
        );
    }

    let mut steps = Steps::default();
    steps.push(format!(
        "Keep monitoring all {} with the moving average to catch long-term drift",
        ctx.nouns.plural
    ));
    if let Some(g) = most_concerning {
        steps.push(format!("Investigate what is affecting {}'s results", g.group));
    }
    if let Some(g) = most_improved {
        steps.push(format!("Identify which procedures or changes led to {}'s improvement", g.group));
    }
    let _ = writeln!(out, "\n### Recommendations");
    steps.write_to(&mut out);
    out
}

fn distribution_report(ctx: &Context<'_>, detail: &DistributionDetail) -> String {
    let by_shape = |shape: Shape| detail.groups.iter().filter(move |g| g.shape == shape);
    let symmetric: Vec<_> = by_shape(Shape::Symmetric).collect();
    let right: Vec<_> = by_shape(Shape::RightSkewed).collect();
    let left: Vec<_> = by_shape(Shape::LeftSkewed).collect();
    let narrow: Vec<_> = detail.groups.iter().filter(|g| g.spread == Width::Narrow).collect();
    let wide: Vec<_> = detail.groups.iter().filter(|g| g.spread == Width::Wide).collect();

    let mut out = String::new();
    let _ = writeln!(out, "## Distribution Analysis for {}\n", ctx.period);
    let _ = writeln!(out, "### Distribution Summary");
    let _ = writeln!(
        out,
        "Across {}, {} distributions are symmetric, {} right-skewed and {} left-skewed; {} narrow and {} wide. \
Overall the middle half of deviations lies between {:.2}% and {:.2}% (median {:.2}%).",
        ctx.nouns.count(detail.groups.len()),
        symmetric.len(),
        right.len(),
        left.len(),
        narrow.len(),
        wide.len(),
        detail.overall.p25,
        detail.overall.p75,
        detail.overall.p50,
    );

    for (title, groups) in [("Most Consistent", &narrow), ("Most Variable", &wide)] {
        if groups.is_empty() {
            continue;
        }
        let _ = writeln!(out, "\n### {title} {}", capitalize(ctx.nouns.plural));
        for g in groups.iter().take(3) {
            let _ = writeln!(
                out,
                "- {}: {} distribution with std dev of {:.2}% and IQR of {:.2}%",
                g.group,
                g.shape.as_str(),
                g.std,
                g.iqr
            );
        }
    }

    let mut steps = Steps::default();
    if let Some(g) = wide.first() {
        steps.push(format!("Provide additional training to {} to narrow the spread of results", g.group));
    }
    if let Some(g) = right.first() {
        steps.push(format!("Investigate why {} occasionally overestimates gold content", g.group));
    }
    if let Some(g) = left.first() {
        steps.push(format!("Investigate why {} occasionally underestimates gold content", g.group));
    }
    if let Some(g) = narrow.first() {
        steps.push(format!("Consider {}'s methods as a best practice template", g.group));
    }
    if !steps.0.is_empty() {
        let _ = writeln!(out, "\n### Recommendations");
        steps.write_to(&mut out);
    }
    out
}

fn recommendations_report(ctx: &Context<'_>, detail: &PerformanceDetail) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "## Performance Recommendations for {}\n", ctx.period);
    let _ = writeln!(out, "### Laboratory Quality Improvement");
    let mut steps = Steps::default();
    steps.push("Keep a regular calibration schedule for all gold testing equipment");
    steps.push(format!(
        "Peer review samples with deviations beyond {:.1}%",
        (detail.mean_deviation.abs() * 2.0).max(0.1)
    ));
    steps.push(format!("Make sure every {} follows the standard testing procedure", ctx.nouns.singular));
    steps.push("Run blind duplicate tests to validate assay results");
    steps.write_to(&mut out);

    let mut named: Vec<&str> = Vec::new();
    let mut individual = String::new();
    for g in detail.high_bias.iter().take(3) {
        named.push(&g.group);
        let _ = writeln!(
            individual,
            "**{}** (high bias: {:.2}% average deviation): targeted training on calibration and measurement, \
with a second check on every result.",
            g.group, g.mean
        );
    }
    for g in detail.high_variance.iter().take(3) {
        if named.contains(&g.group.as_str()) {
            continue;
        }
        named.push(&g.group);
        let _ = writeln!(
            individual,
            "**{}** (high variance: std dev of {:.2}%): focus on consistency and review sample preparation.",
            g.group, g.std
        );
    }
    for g in detail.low_experience.iter().take(3) {
        if named.contains(&g.group.as_str()) {
            continue;
        }
        let _ = writeln!(
            individual,
            "**{}** (low experience: {} samples): pair with an experienced {} for supervised testing.",
            g.group, g.count, ctx.nouns.singular
        );
    }
    if !individual.is_empty() {
        let _ = writeln!(out, "\n### Individual Recommendations");
        out.push_str(&individual);
    }

    if !detail.well_performing.is_empty() {
        let _ = writeln!(out, "\n### Recognition and Best Practices");
        for g in detail.well_performing.iter().take(3) {
            let _ = writeln!(
                out,
                "- **{}**: accurate ({:.2}% average deviation) and reliable (std dev {:.2}%)",
                g.group, g.mean, g.std
            );
        }
    }
    out
}

/// Name, mean, std and count of one group's deviations.
type GroupRow<'a> = (&'a str, f64, f64, usize);

// ties keep map order: the first name for a minimum, the last for a maximum
fn by_abs_mean(a: &&GroupRow<'_>, b: &&GroupRow<'_>) -> Ordering {
    a.1.abs().total_cmp(&b.1.abs())
}

fn answer_question(ctx: &Context<'_>, question: &str, summary: &DatasetSummary) -> String {
    let Some(column) = summary.deviation_column() else {
        return format!(
            "There are {} records in the current dataset, but none carries a deviation from the benchmark.",
            summary.record_count
        );
    };
    let groups: Vec<GroupRow<'_>> = summary
        .groups
        .iter()
        .filter_map(|(name, g)| g.columns.get(column).map(|s| (name.as_str(), s.mean, s.std, s.count)))
        .collect();
    let q = question.to_lowercase();
    let noun = ctx.nouns.singular;

    if q.contains("total") && (q.contains("sample") || q.contains("record")) {
        return format!("There are {} total samples in the current dataset.", summary.record_count);
    }
    if groups.is_empty() {
        return format!(
            "Without a grouping column I can only report totals: {} samples.",
            summary.record_count
        );
    }

    let above = |threshold: f64| groups.iter().filter(|g| g.1.abs() > threshold).count();
    let mentions_deviation = q.contains("deviation");

    if mentions_deviation && (q.contains("minimum") || q.contains("lowest"))
        && let Some(best) = groups.iter().min_by(by_abs_mean)
    {
        format!(
            "The {noun} with the minimum deviation is {} with an average deviation of {:.2}%.",
            best.0, best.1
        )
    } else if mentions_deviation && (q.contains("maximum") || q.contains("highest"))
        && let Some(worst) = groups.iter().max_by(by_abs_mean)
    {
        format!(
            "The {noun} with the maximum deviation is {} with an average deviation of {:.2}%.",
            worst.0, worst.1
        )
    } else if q.contains("consistent")
        && let Some(steady) = groups
            .iter()
            .filter(|g| g.3 > 1)
            .min_by(|a, b| a.2.total_cmp(&b.2).then_with(|| a.0.cmp(b.0)))
    {
        format!(
            "The most consistent {noun} is {} with a standard deviation of {:.2}%.",
            steady.0, steady.2
        )
    } else if q.contains("above 0.1") {
        format!("{} with absolute deviation above 0.1%.", ctx.nouns.there_are(above(0.1)))
    } else if q.contains("above 0.5") {
        format!("{} with absolute deviation above 0.5%.", ctx.nouns.there_are(above(0.5)))
    } else if q.contains("above 1") {
        format!("{} with absolute deviation above 1.0%.", ctx.nouns.there_are(above(1.0)))
    } else if q.contains("how many") {
        format!("{} in the current dataset.", ctx.nouns.there_are(groups.len()))
    } else {
        format!(
            "I can answer questions about the minimum or maximum deviation, consistency, \
the number of {} above 0.1%, 0.5% or 1% deviation, and sample totals.",
            ctx.nouns.plural
        )
    }
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Qualitative band for a mean absolute deviation in percent.
pub fn accuracy_band(mean_abs: f64) -> &'static str {
    if mean_abs < 0.1 {
        "Accuracy is excellent."
    } else if mean_abs < 0.5 {
        "Accuracy is good."
    } else if mean_abs < 1.0 {
        "Accuracy is acceptable but worth monitoring."
    } else {
        "Accuracy needs attention."
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Record, Subject};

    fn row(assayer: &str, deviation: f64) -> Record {
        Record::new()
            .with("assayer_name", assayer)
            .with("percentage_deviation", deviation)
            .with("gold_content", 91.6)
    }

    fn dated(assayer: &str, date: &str, deviation: f64) -> Record {
        row(assayer, deviation).with("test_date", date)
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

    fn request(report: ReportKind, records: Vec<Record>, prompt: &str) -> AnalysisRequest {
        AnalysisRequest::builder()
            .subject(Subject::DailyMonitoring)
            .report(report)
            .dataset(records)
            .prompt(prompt)
            .group_by("assayer_name")
            .time_period("Last 30 days")
            .build()
            .unwrap()
    }

    #[test]
    fn offline_report_is_deterministic() {
        let request = request(ReportKind::Overview, dataset(), "Summarize");
        let first = offline_report(&request);
        assert_eq!(first, offline_report(&request));
        assert!(first.starts_with("## Statistical Overview for Last 30 days"));
        assert!(first.contains("across 2 assayers"));
        assert!(first.contains("**Closest to benchmark:** Kofi"));
        assert!(first.contains("**Needs improvement:** Ama"));
    }

    #[test]
    fn recommendations_are_numbered_in_order() {
        // equal spread in both groups, so no consistency step
        let records = vec![row("Kofi", 0.1), row("Kofi", 0.3), row("Ama", 1.0), row("Ama", 1.2)];
        let report = offline_report(&request(ReportKind::Overview, records, "Summarize"));
        assert!(!report.contains("### Consistency Concerns"));
        assert!(report.contains("1. Provide additional training to Ama"));
        assert!(report.contains("2. Consider recognizing Kofi"));
        assert!(report.contains("3. Keep regular calibration checks"));
        assert!(!report.contains("4. "));

        let report = offline_report(&request(ReportKind::Overview, dataset(), "Summarize"));
        assert!(report.contains("2. Review testing procedures with Ama"));
        assert!(report.contains("4. Keep regular calibration checks"));
    }

    #[test]
    fn offline_report_without_deviation_lists_columns() {
        let request = AnalysisRequest::builder()
            .subject(Subject::MassImpact)
            .record(Record::new().with("sample_mass", 12.5))
            .record(Record::new().with("sample_mass", 14.5))
            .prompt("Does mass matter?")
            .build()
            .unwrap();
        let report = offline_report(&request);
        assert!(report.contains("the selected period"));
        assert!(report.contains("- sample_mass: mean 13.50"));
    }

    #[test]
    fn heatmap_report_lists_hotspots() {
        let records = vec![
            dated("Ama", "2024-05-06", 6.0),
            dated("Ama", "2024-05-07", 7.0),
            dated("Ama", "2024-05-14", 0.4),
            dated("Kofi", "2024-05-06", 0.1),
            dated("Kofi", "2024-05-14", 0.2),
        ];
        let report = offline_report(&request(ReportKind::Heatmap, records, "What stands out?"));
        assert!(report.starts_with("## Heatmap Analysis for Last 30 days"));
        assert!(report.contains("covers 2 weeks of data across 2 assayers"));
        assert!(report.contains("- Week 2024-18: Ama with 6.50% deviation"));
        assert!(report.contains("**Most consistent assayers:**\n- Kofi"));
        assert!(report.contains("2. Provide additional training to Ama"));
    }

    #[test]
    fn chart_reports_without_dates_fall_back_to_overview() {
        let heatmap = offline_report(&request(ReportKind::Heatmap, dataset(), "Patterns?"));
        let trend = offline_report(&request(ReportKind::Trend, dataset(), "Trends?"));
        assert!(heatmap.starts_with("## Statistical Overview"));
        assert!(trend.starts_with("## Statistical Overview"));
    }

    #[test]
    fn trend_report_names_most_improved() {
        let mut records: Vec<Record> = (0..10)
            .map(|i| dated("Kofi", &format!("2024-05-{:02}", i + 1), 0.9 - 0.1 * i as f64))
            .collect();
        for i in 0..10 {
            records.push(dated("Ama", &format!("2024-05-{:02}", i + 1), 0.5));
        }
        let report = offline_report(&request(ReportKind::Trend, records, "Trends?"));
        assert!(report.starts_with("## Moving Average Trend Analysis for Last 30 days"));
        assert!(report.contains("Between 2024-05-01 and 2024-05-10"));
        assert!(report.contains("1 improving, 1 stable and 0 worsening"));
        assert!(report.contains("**Most improved:** Kofi fell from 0.60% to 0.30% (5-day moving average, latest 2024-05-10)"));
        assert!(!report.contains("Most concerning"));
        assert!(report.contains("2. Identify which procedures or changes led to Kofi's improvement"));
    }

    #[test]
    fn distribution_report_describes_shapes() {
        let mut records: Vec<Record> = [0.1, 0.1, 0.1, 0.2, 1.5].iter().map(|d| row("Yaw", *d)).collect();
        records.push(row("Efua", 0.5));
        records.push(row("Efua", 0.5));
        let report = offline_report(&request(ReportKind::Distribution, records, "Spread?"));
        assert!(report.starts_with("## Distribution Analysis for Last 30 days"));
        assert!(report.contains("1 right-skewed"));
        assert!(report.contains("### Most Consistent Assayers\n- Efua: approximately symmetric"));
        assert!(report.contains("### Most Variable Assayers\n- Yaw: right-skewed"));
        assert!(report.contains("1. Provide additional training to Yaw"));
        assert!(report.contains("2. Investigate why Yaw occasionally overestimates"));
        assert!(report.contains("3. Consider Efua's methods"));
    }

    #[test]
    fn recommendations_report_buckets_assayers() {
        let mut records = Vec::new();
        for d in [2.5, 3.0, 2.8, 2.9] {
            records.push(row("Biased", d));
        }
        for d in [0.1, -0.1, 0.2, 0.0] {
            records.push(row("Steady", d));
        }
        records.push(row("New", 0.3));
        let report = offline_report(&request(ReportKind::Recommendations, records, "What should we do?"));
        assert!(report.starts_with("## Performance Recommendations for Last 30 days"));
        assert!(report.contains("**Biased** (high bias: 2.80% average deviation)"));
        assert!(report.contains("**New** (low experience: 1 samples)"));
        assert!(report.contains("- **Steady**: accurate"));
        assert!(report.contains("4. Run blind duplicate tests"));
    }

    #[test]
    fn questions_get_keyword_answers() {
        let ask = |prompt: &str| offline_report(&request(ReportKind::Question, dataset(), prompt));
        assert_eq!(
            ask("Who has the lowest deviation?"),
            "The assayer with the minimum deviation is Kofi with an average deviation of -0.01%."
        );
        assert_eq!(
            ask("Which assayer has the maximum deviation?"),
            "The assayer with the maximum deviation is Ama with an average deviation of 0.70%."
        );
        assert_eq!(
            ask("Who is the most consistent?"),
            "The most consistent assayer is Kofi with a standard deviation of 0.08%."
        );
        assert_eq!(
            ask("How many are above 0.1%?"),
            "There is 1 assayer with absolute deviation above 0.1%."
        );
        assert_eq!(
            ask("Anyone above 0.5?"),
            "There is 1 assayer with absolute deviation above 0.5%."
        );
        assert_eq!(
            ask("Anyone above 1%?"),
            "There are 0 assayers with absolute deviation above 1.0%."
        );
        assert_eq!(ask("How many assayers are there?"), "There are 2 assayers in the current dataset.");
        assert_eq!(ask("Total samples?"), "There are 6 total samples in the current dataset.");
        assert!(ask("What is the weather?").starts_with("I can answer questions about"));
    }

    #[test]
    fn accuracy_bands() {
        assert_eq!(accuracy_band(0.05), "Accuracy is excellent.");
        assert_eq!(accuracy_band(0.3), "Accuracy is good.");
        assert_eq!(accuracy_band(0.7), "Accuracy is acceptable but worth monitoring.");
        assert_eq!(accuracy_band(2.0), "Accuracy needs attention.");
    }
}
