//! Response normalization
//!
//! Splits a provider's completion into narrative text and structured
//! findings. Providers are asked to end their answer with:
//!
//! ```text
//! === FINDINGS ===
//! - flagged_trainees: Jane Doe
//! - flagged_labs: Kumasi Assay Office
//! === END FINDINGS ===
//! ```
//!
//! The closing marker is optional. Lines that do not match the entry shape
//! are dropped; a response without the block is pure narrative.

use lazy_static::lazy_static;
use regex::Regex;

use crate::transformers::RawResponse;
use crate::types::{AnalysisResult, Findings};

pub const FINDINGS_OPEN: &str = "=== FINDINGS ===";
pub const FINDINGS_CLOSE: &str = "=== END FINDINGS ===";

lazy_static! {
    // `- category: entry`, `* category: entry`; the category may be wrapped
    // in markdown emphasis (`- **category**: entry`, `- **category:** entry`)
    static ref ENTRY_LINE: Regex = Regex::new(
        r"^\s*[-*•]\s*[*_]*\s*([A-Za-z][A-Za-z0-9 _\-]*?)\s*[*_]*\s*:\s*[*_]*\s*(\S.*?)\s*$"
    )
    .expect("findings entry pattern is a valid regex");
}

/// Narrative and findings parsed from completion text.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ParsedCompletion {
    pub narrative: String,
    pub findings: Findings,
}

/// Turn a raw provider response into a successful [`AnalysisResult`].
///
/// Never fails: malformed findings degrade to narrative-only results. A
/// pure function of `raw`; the timestamp is the response's `received_at`.
pub fn normalize(raw: &RawResponse) -> AnalysisResult {
    let parsed = parse_completion(&raw.text);
    AnalysisResult::answered(
        raw.provider,
        raw.model.clone(),
        parsed.narrative,
        parsed.findings,
        raw.received_at,
    )
}

/// Split completion text into narrative and findings.
pub fn parse_completion(text: &str) -> ParsedCompletion {
    let mut before = Vec::new();
    let mut after = Vec::new();
    let mut findings = Findings::new();

    #[derive(Clone, Copy)]
    enum Section {
        Before,
        Block,
        After,
    }
    let mut section = Section::Before;

    for line in text.lines() {
        let marker = line.trim();
        match section {
            Section::Before if is_marker(marker, FINDINGS_OPEN) => section = Section::Block,
            Section::Before => before.push(line),
            Section::Block if is_marker(marker, FINDINGS_CLOSE) => section = Section::After,
            Section::Block => {
                if marker.starts_with("```") {
                    continue;
                }
                if let Some((category, entry)) = parse_entry(line) {
                    findings.insert(category, entry);
                }
            }
            Section::After => after.push(line),
        }
    }

    let mut narrative = strip_trailing_fence(before.join("\n").trim()).to_string();
    let tail = strip_leading_fence(after.join("\n").trim()).trim().to_string();
    if !tail.is_empty() {
        if !narrative.is_empty() {
            narrative.push_str("\n\n");
        }
        narrative.push_str(&tail);
    }

    ParsedCompletion {
        narrative,
        findings,
    }
}

/// Render findings back into the block format (used to echo findings in logs
/// and to round-trip in tests).
pub fn render_findings(findings: &Findings) -> String {
    let mut out = String::from(FINDINGS_OPEN);
    out.push('\n');
    for (category, entries) in findings.iter() {
        for entry in entries {
            out.push_str(&format!("- {category}: {entry}\n"));
        }
    }
    out.push_str(FINDINGS_CLOSE);
    out
}

/// Lowercase snake_case category key.
pub fn normalize_category(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.trim().chars() {
        if c.is_ascii_alphanumeric() {
            out.push(c.to_ascii_lowercase());
        } else if !out.ends_with('_') {
            out.push('_');
        }
    }
    out.trim_matches('_').to_string()
}

fn is_marker(line: &str, marker: &str) -> bool {
    line.eq_ignore_ascii_case(marker)
}

fn parse_entry(line: &str) -> Option<(String, String)> {
    let caps = ENTRY_LINE.captures(line)?;
    let category = normalize_category(caps.get(1)?.as_str());
    let entry = caps.get(2)?.as_str().trim().to_string();
    if category.is_empty() || entry.is_empty() {
        return None;
    }
    Some((category, entry))
}

fn strip_trailing_fence(text: &str) -> &str {
    text.strip_suffix("```").map(str::trim_end).unwrap_or(text)
}

fn strip_leading_fence(text: &str) -> &str {
    text.strip_prefix("```").map(str::trim_start).unwrap_or(text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ProviderId;

    const SAMPLE: &str = "Overall accuracy was good (0.21% mean deviation).\n\
Ama and Yaw drifted upward in the last week.\n\
\n\
=== FINDINGS ===\n\
- flagged_trainees: Ama Mensah\n\
- Flagged Trainees: Yaw Boateng\n\
- flagged_trainees: Ama Mensah\n\
* ready_trainees: Kofi Asante\n\
this line is not an entry\n\
- : missing category\n\
=== END FINDINGS ===\n";

    #[test]
    fn splits_narrative_and_findings() {
        let parsed = parse_completion(SAMPLE);
        assert_eq!(
            parsed.narrative,
            "Overall accuracy was good (0.21% mean deviation).\nAma and Yaw drifted upward in the last week."
        );
        assert_eq!(
            parsed.findings.get("flagged_trainees").unwrap(),
            &["Ama Mensah".to_string(), "Yaw Boateng".to_string()]
        );
        assert_eq!(
            parsed.findings.get("ready_trainees").unwrap(),
            &["Kofi Asante".to_string()]
        );
        assert_eq!(parsed.findings.len(), 3);
    }

    #[test]
    fn no_block_means_pure_narrative() {
        let parsed = parse_completion("  Just a summary.\n- not: a finding outside the block  ");
        assert_eq!(parsed.narrative, "Just a summary.\n- not: a finding outside the block");
        assert!(parsed.findings.is_empty());
    }

    #[test]
    fn closing_marker_is_optional_and_fences_ignored() {
        let text = "Narrative.\n=== findings ===\n```\n- flagged_labs: Tarkwa\n```";
        let parsed = parse_completion(text);
        assert_eq!(parsed.narrative, "Narrative.");
        assert_eq!(parsed.findings.get("flagged_labs").unwrap(), &["Tarkwa".to_string()]);
    }

    #[test]
    fn text_after_block_is_kept() {
        let text = "Intro.\n=== FINDINGS ===\n- flagged_gold_types: 18K\n=== END FINDINGS ===\nClosing remark.";
        let parsed = parse_completion(text);
        assert_eq!(parsed.narrative, "Intro.\n\nClosing remark.");
    }

    #[test]
    fn round_trips_rendered_findings() {
        let mut findings = Findings::new();
        findings.insert("flagged_assayers", "Kwame Nkrumah");
        findings.insert("flagged_assayers", "Efua: senior");
        findings.insert("top_performers", "Abena");
        let text = format!("Narrative text.\n\n{}", render_findings(&findings));
        let parsed = parse_completion(&text);
        assert_eq!(parsed.findings, findings);
        assert_eq!(parsed.narrative, "Narrative text.");
    }

    #[test]
    fn normalize_same_response_twice_is_identical() {
        let raw = RawResponse::new(ProviderId::OpenAi, SAMPLE).with_model("gpt-4o");
        let first = normalize(&raw);
        std::thread::sleep(std::time::Duration::from_millis(2));
        let second = normalize(&raw);
        assert_eq!(first, second);
        assert_eq!(first.generated_at, raw.received_at);
    }

    #[test]
    fn normalized_output_normalizes_to_itself() {
        let raw = RawResponse::new(ProviderId::Anthropic, SAMPLE).with_model("claude-3-5-sonnet-20241022");
        let first = normalize(&raw);
        let again = RawResponse::new(
            ProviderId::Anthropic,
            format!("{}\n\n{}", first.narrative, render_findings(&first.findings)),
        )
        .with_model("claude-3-5-sonnet-20241022");
        let second = normalize(&again);
        assert_eq!(first.narrative, second.narrative);
        assert_eq!(first.findings, second.findings);
        assert!(first.success);
        assert_eq!(first.provider_used, Some(ProviderId::Anthropic));
    }

    #[test]
    fn entry_pattern_compiles_and_accepts_markdown_emphasis() {
        lazy_static::initialize(&ENTRY_LINE);
        let text = "Summary.\n=== FINDINGS ===\n\
- **flagged_trainees**: Ama Mensah\n\
- **Ready Trainees:** Kofi Asante\n\
* __flagged_trainees__: Yaw Boateng\n\
=== END FINDINGS ===";
        let parsed = parse_completion(text);
        assert_eq!(
            parsed.findings.get("flagged_trainees").unwrap(),
            &["Ama Mensah".to_string(), "Yaw Boateng".to_string()]
        );
        assert_eq!(
            parsed.findings.get("ready_trainees").unwrap(),
            &["Kofi Asante".to_string()]
        );
    }

    #[test]
    fn category_normalization() {
        assert_eq!(normalize_category(" Flagged Mass-Ranges "), "flagged_mass_ranges");
        assert_eq!(normalize_category("flagged_labs"), "flagged_labs");
    }
}
