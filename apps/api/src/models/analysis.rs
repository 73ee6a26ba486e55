use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::analysis::template::{JD_FIELD, RESUME_FIELD};
use crate::document::Document;

/// One user action: an operation name plus the inputs its template needs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisRequest {
    pub operation: String,
    pub fields: HashMap<String, String>,
}

impl AnalysisRequest {
    /// Builds a request from user-supplied fields. Blank values are dropped so
    /// an empty job description counts as missing.
    pub fn new(operation: impl Into<String>, fields: HashMap<String, String>) -> Self {
        let fields = fields
            .into_iter()
            .filter(|(_, value)| !value.trim().is_empty())
            .collect();
        Self {
            operation: operation.into(),
            fields,
        }
    }

    /// Grounds the request on an extracted resume and an optional job description.
    pub fn for_document(
        operation: impl Into<String>,
        resume: &Document,
        job_description: Option<String>,
    ) -> Self {
        let mut fields = HashMap::from([(RESUME_FIELD.to_string(), resume.text.clone())]);
        if let Some(jd) = job_description {
            fields.insert(JD_FIELD.to_string(), jd);
        }
        Self::new(operation, fields)
    }
}

/// Model output for one operation. Held only for display, never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub operation: String,
    pub title: String,
    pub text: String,
    pub produced_at: DateTime<Utc>,
}

impl AnalysisResult {
    pub fn presentation(&self) -> Presentation {
        Presentation {
            title: self.title.clone(),
            body: self.text.clone(),
        }
    }
}

/// The `(title, body)` pair handed to the presentation surface.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Presentation {
    pub title: String,
    pub body: String,
}
