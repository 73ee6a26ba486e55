//! Axum route handlers for the Analysis API.

use std::collections::HashMap;

use axum::{
    extract::{multipart::MultipartError, Multipart, Path, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::analysis::catalog::{AnalysisCatalog, CatalogEntry, OperationSummary};
use crate::analysis::session::SessionState;
use crate::document::Document;
use crate::errors::AppError;
use crate::models::analysis::{AnalysisRequest, AnalysisResult, Presentation};
use crate::state::AppState;

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct AnalyzeRequest {
    #[serde(default)]
    pub fields: HashMap<String, String>,
    #[serde(default)]
    pub session: SessionState,
    #[serde(default)]
    pub narrate: bool,
}

#[derive(Debug, Serialize)]
pub struct AnalyzeResponse {
    pub result: AnalysisResult,
    pub presentation: Presentation,
    /// Updated session; send it back with the next request.
    pub session: SessionState,
    pub narrated: bool,
}

/// Multipart form accepted by the upload endpoints.
#[derive(Debug, Default)]
struct UploadForm {
    resume: Option<Vec<u8>>,
    jd: Option<String>,
    session: SessionState,
    narrate: bool,
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// GET /api/v1/analyses
///
/// Lists every analysis operation with its title and required inputs.
pub async fn handle_list_operations(State(state): State<AppState>) -> Json<Vec<OperationSummary>> {
    Json(
        state
            .pipeline
            .catalog()
            .entries()
            .map(|e| e.summary())
            .collect(),
    )
}

/// POST /api/v1/resumes/extract
///
/// Extracts the text of an uploaded resume (multipart field `resume`).
pub async fn handle_extract(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Json<Document>, AppError> {
    let form = read_upload_form(multipart, state.config.max_upload_bytes).await?;
    let resume = require_resume(form.resume)?;
    Ok(Json(extract_document(&state, resume).await?))
}

/// POST /api/v1/analyses/:operation
///
/// Runs one analysis over text the client already has (e.g. from /extract).
pub async fn handle_run_analysis(
    State(state): State<AppState>,
    Path(operation): Path<String>,
    Json(body): Json<AnalyzeRequest>,
) -> Result<Json<AnalyzeResponse>, AppError> {
    let request = AnalysisRequest::new(operation, body.fields);
    let response = run_analysis(&state, request, body.session, body.narrate).await?;
    Ok(Json(response))
}

/// POST /api/v1/analyses/:operation/upload
///
/// Extracts an uploaded resume and runs one analysis over it in a single call.
/// Form fields: `resume` (PDF), optional `jd`, `session` (JSON) and `narrate`.
pub async fn handle_run_analysis_upload(
    State(state): State<AppState>,
    Path(operation): Path<String>,
    multipart: Multipart,
) -> Result<Json<AnalyzeResponse>, AppError> {
    // Fail on unknown or locked operations before paying for extraction.
    let catalog = state.pipeline.catalog();
    let entry = catalog.resolve(&operation)?;

    let form = read_upload_form(multipart, state.config.max_upload_bytes).await?;
    ensure_permitted(catalog, entry, &form.session)?;

    let resume = require_resume(form.resume)?;
    let document = extract_document(&state, resume).await?;

    let request = AnalysisRequest::for_document(operation, &document, form.jd);
    let response = run_analysis(&state, request, form.session, form.narrate).await?;
    Ok(Json(response))
}

// ────────────────────────────────────────────────────────────────────────────
// Shared steps
// ────────────────────────────────────────────────────────────────────────────

async fn run_analysis(
    state: &AppState,
    request: AnalysisRequest,
    mut session: SessionState,
    narrate: bool,
) -> Result<AnalyzeResponse, AppError> {
    let catalog = state.pipeline.catalog();
    let entry = catalog.resolve(&request.operation)?;

    ensure_permitted(catalog, entry, &session)?;

    let result = state.pipeline.execute(&request).await?;
    session.record(entry);

    let narrated = narrate && narrate_result(state, &result.text).await;

    Ok(AnalyzeResponse {
        presentation: result.presentation(),
        result,
        session,
        narrated,
    })
}

fn ensure_permitted(
    catalog: &AnalysisCatalog,
    entry: &CatalogEntry,
    session: &SessionState,
) -> Result<(), AppError> {
    if session.permits(entry) {
        return Ok(());
    }
    let unlocked_by: Vec<&str> = catalog
        .entries()
        .filter(|e| e.unlocks.contains(&entry.operation))
        .map(|e| e.title)
        .collect();
    Err(AppError::Conflict(format!(
        "{} becomes available after running: {}.",
        entry.title,
        unlocked_by.join(", ")
    )))
}

async fn narrate_result(state: &AppState, text: &str) -> bool {
    let Some(narrator) = &state.narrator else {
        debug!("Narration requested but no narrator is configured");
        return false;
    };
    match narrator.speak(text).await {
        Ok(()) => true,
        Err(e) => {
            warn!("Narration failed: {e}");
            false
        }
    }
}

async fn extract_document(state: &AppState, bytes: Vec<u8>) -> Result<Document, AppError> {
    let extractor = state.extractor.clone();
    let document = tokio::task::spawn_blocking(move || extractor.extract(&bytes))
        .await
        .map_err(|e| AppError::Internal(anyhow::anyhow!("Extraction task failed: {e}")))??;

    info!(
        "Extracted resume: {} pages, {} chars",
        document.page_count,
        document.text.len()
    );
    if !document.has_text() {
        warn!("Uploaded resume contains no extractable text");
    } else if !document.blank_pages.is_empty() {
        info!("Pages without extractable text: {:?}", document.blank_pages);
    }

    Ok(document)
}

fn require_resume(resume: Option<Vec<u8>>) -> Result<Vec<u8>, AppError> {
    resume.ok_or_else(|| {
        AppError::Validation("Please upload your resume in the 'resume' field.".to_string())
    })
}

async fn read_upload_form(
    mut multipart: Multipart,
    max_upload_bytes: usize,
) -> Result<UploadForm, AppError> {
    let mut form = UploadForm::default();
    let invalid_multipart = |e: MultipartError| multipart_error(e, max_upload_bytes);

    while let Some(field) = multipart.next_field().await.map_err(invalid_multipart)? {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "resume" => form.resume = Some(field.bytes().await.map_err(invalid_multipart)?.to_vec()),
            "jd" => form.jd = Some(field.text().await.map_err(invalid_multipart)?),
            "session" => {
                let raw = field.text().await.map_err(invalid_multipart)?;
                if !raw.trim().is_empty() {
                    form.session = serde_json::from_str(&raw)
                        .map_err(|e| AppError::Validation(format!("Invalid session: {e}")))?;
                }
            }
            "narrate" => {
                let raw = field.text().await.map_err(invalid_multipart)?;
                form.narrate = matches!(raw.trim(), "true" | "1" | "on");
            }
            other => debug!("Ignoring multipart field '{other}'"),
        }
    }

    Ok(form)
}

fn multipart_error(e: MultipartError, max_upload_bytes: usize) -> AppError {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        return AppError::PayloadTooLarge(format!(
            "The uploaded resume exceeds the {} limit.",
            describe_size(max_upload_bytes)
        ));
    }
    AppError::Validation(format!("Invalid multipart body: {e}"))
}

fn describe_size(bytes: usize) -> String {
    const KB: usize = 1024;
    const MB: usize = 1024 * KB;
    if bytes >= MB && bytes % MB == 0 {
        format!("{} MB", bytes / MB)
    } else if bytes >= KB {
        format!("{} KB", bytes / KB)
    } else {
        format!("{bytes} bytes")
    }
}
