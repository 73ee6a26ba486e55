//! Prompt Pipeline: runs one catalog operation against the model.
//!
//! Flow: resolve catalog entry → render template → one model call → wrap result.
//!
//! Validation happens before dispatch, so a request with missing inputs never
//! reaches the model. Errors are returned tagged by stage and are not retried
//! here; wrap the injected client in `RetryingModel` for backoff. Nothing is
//! cached between runs.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::analysis::catalog::{AnalysisCatalog, CatalogError};
use crate::analysis::template::TemplateError;
use crate::document::ExtractionError;
use crate::llm_client::{ModelClient, ModelError};
use crate::models::analysis::{AnalysisRequest, AnalysisResult};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PipelineError {
    #[error("Extraction failed: {0}")]
    Extraction(#[from] ExtractionError),

    #[error("Template rendering failed: {0}")]
    Template(#[from] TemplateError),

    #[error("Catalog lookup failed: {0}")]
    Catalog(#[from] CatalogError),

    #[error("Model call failed: {0}")]
    Model(#[from] ModelError),
}

pub struct PromptPipeline {
    catalog: Arc<AnalysisCatalog>,
    model: Arc<dyn ModelClient>,
}

impl PromptPipeline {
    pub fn new(catalog: Arc<AnalysisCatalog>, model: Arc<dyn ModelClient>) -> Self {
        Self { catalog, model }
    }

    pub fn catalog(&self) -> &AnalysisCatalog {
        &self.catalog
    }

    pub async fn execute(&self, request: &AnalysisRequest) -> Result<AnalysisResult, PipelineError> {
        self.run(&request.operation, &request.fields).await
    }

    pub async fn run(
        &self,
        operation: &str,
        fields: &HashMap<String, String>,
    ) -> Result<AnalysisResult, PipelineError> {
        let entry = self.catalog.resolve(operation)?;
        let prompt = entry.template.render(fields)?;

        info!("Running analysis '{}'", entry.operation);
        debug!("Rendered template '{}': {} chars", entry.template.name(), prompt.len());

        let text = self.model.generate(&prompt).await.map_err(|e| {
            warn!("Analysis '{}' failed at model call: {}", entry.operation, e);
            e
        })?;

        debug!("Analysis '{}' returned {} chars", entry.operation, text.len());

        Ok(AnalysisResult {
            operation: entry.operation.to_string(),
            title: entry.title.to_string(),
            text,
            produced_at: Utc::now(),
        })
    }
}
