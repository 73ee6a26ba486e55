use std::sync::Arc;

use crate::analysis::pipeline::PromptPipeline;
use crate::config::Config;
use crate::document::DocumentExtractor;
use crate::narration::Narrator;

/// Shared application state injected into all route handlers via Axum extractors.
/// Everything here is read-only after startup; per-user state travels with requests.
#[derive(Clone)]
pub struct AppState {
    /// Owns the analysis catalog and the injected model client.
    pub pipeline: Arc<PromptPipeline>,
    pub extractor: Arc<dyn DocumentExtractor>,
    /// `None` when NARRATOR_COMMAND is unset.
    pub narrator: Option<Arc<dyn Narrator>>,
    pub config: Config,
}
