//! Prompt templates with named `{placeholder}` tokens.
//!
//! Placeholders are scanned once at construction, so the set of required
//! fields is known up front and a render with missing inputs fails before any
//! model call is made. Substitution is a single pass: field values are opaque
//! text and are never re-scanned for placeholders.

use std::collections::{BTreeSet, HashMap};

use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use serde::Serialize;
use thiserror::Error;

use crate::analysis::prompts::DUAL_DOCUMENT_FRAME;

/// Field holding the grounding document (resume) text.
pub const RESUME_FIELD: &str = "resume";
/// Field holding the secondary context (job description) text.
pub const JD_FIELD: &str = "jd";

static PLACEHOLDER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\{([A-Za-z_][A-Za-z0-9_]*)\}").expect("placeholder regex is valid"));

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TemplateError {
    #[error("Missing required field '{0}'")]
    MissingField(String),
}

/// Whether a template is grounded on the resume alone or on resume + JD.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentShape {
    SingleDocument,
    DualDocument,
}

#[derive(Debug, Clone)]
pub struct PromptTemplate {
    name: String,
    body: String,
    /// Placeholder names in order of first appearance.
    placeholders: Vec<String>,
}

impl PromptTemplate {
    pub fn new(name: impl Into<String>, body: impl Into<String>) -> Self {
        let body = body.into();
        let mut placeholders: Vec<String> = Vec::new();
        for caps in PLACEHOLDER.captures_iter(&body) {
            let field = &caps[1];
            if !placeholders.iter().any(|p| p == field) {
                placeholders.push(field.to_string());
            }
        }
        Self {
            name: name.into(),
            body,
            placeholders,
        }
    }

    /// `"<instruction>: {resume}"`
    pub fn single_document(name: impl Into<String>, instruction: &str) -> Self {
        Self::new(name, format!("{instruction}: {{{RESUME_FIELD}}}"))
    }

    /// Shared resume + job description frame followed by `instruction`.
    pub fn dual_document(name: impl Into<String>, instruction: &str) -> Self {
        Self::new(name, format!("{DUAL_DOCUMENT_FRAME}{instruction}"))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    #[cfg(test)]
    pub fn body(&self) -> &str {
        &self.body
    }

    pub fn required_fields(&self) -> BTreeSet<String> {
        self.placeholders.iter().cloned().collect()
    }

    pub fn shape(&self) -> DocumentShape {
        if self.placeholders.iter().any(|p| p == JD_FIELD) {
            DocumentShape::DualDocument
        } else {
            DocumentShape::SingleDocument
        }
    }

    /// Fills every placeholder from `fields`. Extra fields are ignored.
    pub fn render(&self, fields: &HashMap<String, String>) -> Result<String, TemplateError> {
        if let Some(missing) = self
            .placeholders
            .iter()
            .find(|p| !fields.contains_key(p.as_str()))
        {
            return Err(TemplateError::MissingField(missing.clone()));
        }

        let rendered = PLACEHOLDER.replace_all(&self.body, |caps: &Captures| {
            fields
                .get(&caps[1])
                .cloned()
                .unwrap_or_default()
        });

        Ok(rendered.into_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn fields(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_single_document_body() {
        let t = PromptTemplate::single_document("summarize", "Summarize this resume");
        assert_eq!(t.body(), "Summarize this resume: {resume}");
        assert_eq!(t.shape(), DocumentShape::SingleDocument);
        assert_eq!(t.required_fields(), BTreeSet::from(["resume".to_string()]));
    }

    #[test]
    fn test_dual_document_requires_both_fields() {
        let t = PromptTemplate::dual_document("jobMatch", "List the percentage match.");
        assert_eq!(t.shape(), DocumentShape::DualDocument);
        assert_eq!(
            t.required_fields(),
            BTreeSet::from(["jd".to_string(), "resume".to_string()])
        );
        assert!(t.body().ends_with("List the percentage match."));
    }

    #[test]
    fn test_render_substitutes_every_occurrence() {
        let t = PromptTemplate::new("t", "{a} and {b}, then {a} again");
        let out = t.render(&fields(&[("a", "x"), ("b", "y")])).unwrap();
        assert_eq!(out, "x and y, then x again");
    }

    #[test]
    fn test_render_reports_first_missing_field_in_body_order() {
        let t = PromptTemplate::new("t", "{resume} vs {jd} vs {extra}");
        let err = t.render(&fields(&[("resume", "r")])).unwrap_err();
        assert_eq!(err, TemplateError::MissingField("jd".to_string()));
    }

    #[test]
    fn test_values_are_not_rescanned_for_placeholders() {
        let t = PromptTemplate::new("t", "A: {resume} B: {jd}");
        let out = t
            .render(&fields(&[("resume", "literal {jd}"), ("jd", "job")]))
            .unwrap();
        assert_eq!(out, "A: literal {jd} B: job");
    }

    #[test]
    fn test_extra_fields_are_ignored() {
        let t = PromptTemplate::single_document("s", "Summarize this resume");
        let out = t
            .render(&fields(&[("resume", "R"), ("jd", "unused")]))
            .unwrap();
        assert_eq!(out, "Summarize this resume: R");
    }

    #[test]
    fn test_body_without_placeholders_renders_verbatim() {
        let t = PromptTemplate::new("static", "No inputs needed.");
        assert!(t.required_fields().is_empty());
        assert_eq!(t.render(&HashMap::new()).unwrap(), "No inputs needed.");
    }

    proptest! {
        #[test]
        fn prop_sufficient_fields_leave_no_placeholders(
            names in proptest::collection::btree_set("[a-z_]{1,8}", 1..5),
            value in "[A-Za-z0-9 ,.]{0,40}",
        ) {
            let body = names
                .iter()
                .map(|n| format!("<{{{n}}}>"))
                .collect::<Vec<_>>()
                .join(" ");
            let t = PromptTemplate::new("generated", body);
            let f: HashMap<String, String> =
                names.iter().map(|n| (n.clone(), value.clone())).collect();

            let out = t.render(&f).unwrap();
            prop_assert!(!PLACEHOLDER.is_match(&out), "unresolved token in {out:?}");
        }

        #[test]
        fn prop_missing_field_is_named(
            names in proptest::collection::btree_set("[a-z_]{1,8}", 2..5),
            drop_index in 0usize..5,
        ) {
            let names: Vec<String> = names.into_iter().collect();
            let dropped = &names[drop_index % names.len()];
            let body = names
                .iter()
                .map(|n| format!("{{{n}}}"))
                .collect::<Vec<_>>()
                .join("\n");
            let t = PromptTemplate::new("generated", body);
            let f: HashMap<String, String> = names
                .iter()
                .filter(|n| *n != dropped)
                .map(|n| (n.clone(), "v".to_string()))
                .collect();

            match t.render(&f) {
                Err(TemplateError::MissingField(name)) => prop_assert_eq!(&name, dropped),
                Ok(out) => prop_assert!(false, "rendered despite missing field: {}", out),
            }
        }
    }
}
