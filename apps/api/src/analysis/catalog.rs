//! Analysis Catalog: the fixed registry of analysis operations.
//!
//! Built once at startup and shared read-only (`Arc<AnalysisCatalog>`).
//! Each entry pairs an operation name with its display title and template;
//! the template's placeholders are the operation's required fields.

use std::collections::BTreeSet;

use serde::Serialize;
use thiserror::Error;

use crate::analysis::prompts::{
    FINAL_THOUGHTS_INSTRUCTION, JOB_MATCH_INSTRUCTION, RECOMMEND_ROLES_INSTRUCTION,
    STRENGTHS_INSTRUCTION, SUGGEST_IMPROVEMENTS_INSTRUCTION, SUMMARIZE_INSTRUCTION,
    WEAKNESSES_INSTRUCTION,
};
use crate::analysis::template::{DocumentShape, PromptTemplate};

pub const SUMMARIZE: &str = "summarize";
pub const STRENGTHS: &str = "strengths";
pub const WEAKNESSES: &str = "weaknesses";
pub const JOB_MATCH: &str = "jobMatch";
pub const RECOMMEND_ROLES: &str = "recommendRoles";
pub const FINAL_THOUGHTS: &str = "finalThoughts";
pub const SUGGEST_IMPROVEMENTS: &str = "suggestImprovements";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CatalogError {
    #[error("Unknown analysis operation '{0}'")]
    UnknownOperation(String),
}

#[derive(Debug, Clone)]
pub struct CatalogEntry {
    pub operation: &'static str,
    pub title: &'static str,
    pub template: PromptTemplate,
    /// Follow-ups are only offered once another operation has unlocked them.
    pub follow_up: bool,
    /// Follow-up operations made available after this one succeeds.
    pub unlocks: &'static [&'static str],
}

impl CatalogEntry {
    fn single(operation: &'static str, title: &'static str, instruction: &str) -> Self {
        Self {
            operation,
            title,
            template: PromptTemplate::single_document(operation, instruction),
            follow_up: false,
            unlocks: &[],
        }
    }

    fn dual(operation: &'static str, title: &'static str, instruction: &str) -> Self {
        Self {
            operation,
            title,
            template: PromptTemplate::dual_document(operation, instruction),
            follow_up: false,
            unlocks: &[],
        }
    }

    pub fn required_fields(&self) -> BTreeSet<String> {
        self.template.required_fields()
    }

    pub fn summary(&self) -> OperationSummary {
        OperationSummary {
            operation: self.operation,
            title: self.title,
            required_fields: self.required_fields(),
            shape: self.template.shape(),
            follow_up: self.follow_up,
        }
    }
}

/// Public listing of a catalog entry.
#[derive(Debug, Clone, Serialize)]
pub struct OperationSummary {
    pub operation: &'static str,
    pub title: &'static str,
    pub required_fields: BTreeSet<String>,
    pub shape: DocumentShape,
    pub follow_up: bool,
}

#[derive(Debug, Clone)]
pub struct AnalysisCatalog {
    entries: Vec<CatalogEntry>,
}

impl AnalysisCatalog {
    pub fn new(entries: Vec<CatalogEntry>) -> Self {
        Self { entries }
    }

    /// The seven resume analyses, in the order they are offered to users.
    pub fn standard() -> Self {
        let mut final_thoughts = CatalogEntry::dual(
            FINAL_THOUGHTS,
            "Final Thoughts",
            FINAL_THOUGHTS_INSTRUCTION,
        );
        final_thoughts.unlocks = &[SUGGEST_IMPROVEMENTS];

        let mut suggest_improvements = CatalogEntry::single(
            SUGGEST_IMPROVEMENTS,
            "Suggested Improvements",
            SUGGEST_IMPROVEMENTS_INSTRUCTION,
        );
        suggest_improvements.follow_up = true;

        Self::new(vec![
            CatalogEntry::single(SUMMARIZE, "Resume Summary", SUMMARIZE_INSTRUCTION),
            CatalogEntry::single(STRENGTHS, "Strengths", STRENGTHS_INSTRUCTION),
            CatalogEntry::single(WEAKNESSES, "Weaknesses", WEAKNESSES_INSTRUCTION),
            CatalogEntry::dual(
                JOB_MATCH,
                "Job Percentage Match and Missing Keywords",
                JOB_MATCH_INSTRUCTION,
            ),
            CatalogEntry::single(
                RECOMMEND_ROLES,
                "Recommended Job Roles",
                RECOMMEND_ROLES_INSTRUCTION,
            ),
            final_thoughts,
            suggest_improvements,
        ])
    }

    pub fn get(&self, operation: &str) -> Option<&CatalogEntry> {
        self.entries.iter().find(|e| e.operation == operation)
    }

    pub fn resolve(&self, operation: &str) -> Result<&CatalogEntry, CatalogError> {
        self.get(operation)
            .ok_or_else(|| CatalogError::UnknownOperation(operation.to_string()))
    }

    pub fn required_fields(&self, operation: &str) -> Result<BTreeSet<String>, CatalogError> {
        self.resolve(operation).map(CatalogEntry::required_fields)
    }

    pub fn entries(&self) -> impl Iterator<Item = &CatalogEntry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }
}

impl Default for AnalysisCatalog {
    fn default() -> Self {
        Self::standard()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(items: &[&str]) -> BTreeSet<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_standard_catalog_has_all_operations_in_order() {
        let catalog = AnalysisCatalog::standard();
        let names: Vec<_> = catalog.entries().map(|e| e.operation).collect();
        assert_eq!(
            names,
            vec![
                "summarize",
                "strengths",
                "weaknesses",
                "jobMatch",
                "recommendRoles",
                "finalThoughts",
                "suggestImprovements",
            ]
        );
    }

    #[test]
    fn test_job_match_requires_resume_and_jd() {
        let catalog = AnalysisCatalog::standard();
        assert_eq!(
            catalog.required_fields("jobMatch").unwrap(),
            set(&["resume", "jd"])
        );
        assert_eq!(
            catalog.required_fields("finalThoughts").unwrap(),
            set(&["resume", "jd"])
        );
    }

    #[test]
    fn test_single_document_operations_require_only_resume() {
        let catalog = AnalysisCatalog::standard();
        for op in [
            "summarize",
            "strengths",
            "weaknesses",
            "recommendRoles",
            "suggestImprovements",
        ] {
            assert_eq!(catalog.required_fields(op).unwrap(), set(&["resume"]), "{op}");
        }
    }

    #[test]
    fn test_unknown_operation_fails() {
        let catalog = AnalysisCatalog::standard();
        assert_eq!(
            catalog.resolve("unknownOp").unwrap_err(),
            CatalogError::UnknownOperation("unknownOp".to_string())
        );
        assert!(catalog.get("unknownOp").is_none());
        assert!(catalog.required_fields("unknownOp").is_err());
    }

    #[test]
    fn test_operation_lookup_is_case_sensitive() {
        let catalog = AnalysisCatalog::standard();
        assert!(catalog.get("jobmatch").is_none());
    }

    #[test]
    fn test_dual_entries_share_the_base_frame() {
        let catalog = AnalysisCatalog::standard();
        let job_match = catalog.resolve(JOB_MATCH).unwrap().template.body();
        let final_thoughts = catalog.resolve(FINAL_THOUGHTS).unwrap().template.body();
        let frame = crate::analysis::prompts::DUAL_DOCUMENT_FRAME;
        assert!(job_match.starts_with(frame));
        assert!(final_thoughts.starts_with(frame));
    }

    #[test]
    fn test_final_thoughts_unlocks_suggest_improvements() {
        let catalog = AnalysisCatalog::standard();
        assert_eq!(
            catalog.resolve(FINAL_THOUGHTS).unwrap().unlocks,
            &[SUGGEST_IMPROVEMENTS]
        );
        assert!(catalog.resolve(SUGGEST_IMPROVEMENTS).unwrap().follow_up);
        assert!(!catalog.resolve(SUMMARIZE).unwrap().follow_up);
    }

    #[test]
    fn test_summary_lists_titles() {
        let catalog = AnalysisCatalog::standard();
        let summary = catalog.resolve(RECOMMEND_ROLES).unwrap().summary();
        assert_eq!(summary.title, "Recommended Job Roles");
        assert_eq!(summary.shape, DocumentShape::SingleDocument);
    }
}
