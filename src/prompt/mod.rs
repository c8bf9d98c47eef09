//! Prompt construction
//!
//! Every provider receives the same system instructions and user message;
//! only the transport envelope differs (see [`crate::transformers`]).
//! The instructions come from a per-subject [`SubjectTemplate`], the report
//! kind, and the findings block convention parsed by [`crate::normalize`].

pub mod templates;

use std::collections::BTreeMap;

use crate::config::AssistantConfig;
use crate::error::AssistantError;
use crate::stats::DatasetSummary;
use crate::types::{AnalysisRequest, Subject};

/// Instructions for one analysis subject.
#[derive(Debug, Clone, PartialEq)]
pub struct SubjectTemplate {
    /// Opening role statement of the system prompt
    pub role: String,
    /// Points the narrative should cover
    pub focus: Vec<String>,
    /// Findings categories the provider may emit
    pub categories: Vec<String>,
}

impl SubjectTemplate {
    pub fn new<S: Into<String>>(role: S) -> Self {
        Self {
            role: role.into(),
            focus: Vec::new(),
            categories: Vec::new(),
        }
    }

    pub fn with_focus<S: Into<String>>(mut self, point: S) -> Self {
        self.focus.push(point.into());
        self
    }

    pub fn with_category<S: Into<String>>(mut self, category: S) -> Self {
        self.categories.push(category.into());
        self
    }

    /// Built-in template for `subject`.
    pub fn builtin(subject: Subject) -> Self {
        Self {
            role: templates::role(subject).to_string(),
            focus: templates::focus(subject)
                .iter()
                .map(|s| s.to_string())
                .collect(),
            categories: templates::categories(subject)
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }
}

/// Provider-neutral prompt.
#[derive(Debug, Clone, PartialEq)]
pub struct Prompt {
    pub system: String,
    pub user: String,
    pub max_tokens: u32,
    pub temperature: f64,
}

/// Subject → template lookup.
#[derive(Debug, Clone, PartialEq)]
pub struct PromptCatalog {
    templates: BTreeMap<Subject, SubjectTemplate>,
}

impl Default for PromptCatalog {
    fn default() -> Self {
        Self {
            templates: Subject::ALL
                .into_iter()
                .map(|s| (s, SubjectTemplate::builtin(s)))
                .collect(),
        }
    }
}

impl PromptCatalog {
    /// Catalog with no templates at all.
    pub fn empty() -> Self {
        Self {
            templates: BTreeMap::new(),
        }
    }

    pub fn with_template(mut self, subject: Subject, template: SubjectTemplate) -> Self {
        self.templates.insert(subject, template);
        self
    }

    pub fn without(mut self, subject: Subject) -> Self {
        self.templates.remove(&subject);
        self
    }

    pub fn get(&self, subject: Subject) -> Option<&SubjectTemplate> {
        self.templates.get(&subject)
    }

    pub fn supports(&self, subject: Subject) -> bool {
        self.templates.contains_key(&subject)
    }

    /// Build the prompt for `request`.
    ///
    /// Fails with [`AssistantError::UnsupportedSubject`] when the catalog has
    /// no template for the request's subject. Deterministic for a given
    /// request and configuration.
    pub fn build(
        &self,
        request: &AnalysisRequest,
        config: &AssistantConfig,
    ) -> Result<Prompt, AssistantError> {
        let template = self
            .get(request.subject)
            .ok_or_else(|| AssistantError::UnsupportedSubject(request.subject.to_string()))?;

        let mut system = String::with_capacity(1024);
        system.push_str(template.role.trim());
        if !template.focus.is_empty() {
            system.push_str("\n\nAnalyze the data and provide insights on:\n");
            for (i, point) in template.focus.iter().enumerate() {
                system.push_str(&format!("{}. {}\n", i + 1, point));
            }
        } else {
            system.push('\n');
        }
        system.push('\n');
        system.push_str(templates::report_focus(request.report));
        system.push_str("\n\n");
        system.push_str(templates::STYLE_RULES);
        if !template.categories.is_empty() {
            system.push_str("\n\n");
            system.push_str(
                &templates::FINDINGS_INSTRUCTIONS
                    .replace("{{CATEGORIES}}", &template.categories.join(", ")),
            );
        }

        let dataset =
            DatasetSummary::for_report(&request.dataset, request.group_by.as_deref(), request.report)
                .to_prompt_json();
        let user = fill_placeholders(
            templates::USER_TEMPLATE,
            &[
                ("SUBJECT_TITLE", request.subject.title()),
                (
                    "TIME_PERIOD",
                    request.time_period.as_deref().unwrap_or("the selected period"),
                ),
                ("DATASET_SUMMARY", dataset.as_str()),
                ("QUESTION", request.question()),
            ],
        );

        Ok(Prompt {
            system,
            user,
            max_tokens: config
                .max_tokens
                .unwrap_or_else(|| request.report.default_max_tokens()),
            temperature: config.temperature,
        })
    }
}

/// Substitute `{{NAME}}` placeholders in one pass. Inserted values are
/// never scanned again, so caller text containing `{{...}}` stays literal.
pub fn fill_placeholders(template: &str, values: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(template.len() + 256);
    let mut rest = template;
    while let Some(start) = rest.find("{{") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        let Some(end) = after.find("}}") else {
            out.push_str(&rest[start..]);
            return out;
        };
        let name = &after[..end];
        match values.iter().find(|(key, _)| *key == name) {
            Some((_, value)) => out.push_str(value),
            None => out.push_str(&rest[start..start + 2 + end + 2]),
        }
        rest = &after[end + 2..];
    }
    out.push_str(rest);
    out
}
