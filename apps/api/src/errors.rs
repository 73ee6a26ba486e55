use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::analysis::catalog::CatalogError;
use crate::analysis::pipeline::PipelineError;
use crate::analysis::template::{TemplateError, JD_FIELD, RESUME_FIELD};
use crate::document::ExtractionError;
use crate::llm_client::ModelError;

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Unprocessable entity: {0}")]
    UnprocessableEntity(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Payload too large: {0}")]
    PayloadTooLarge(String),

    #[error("Model error: {0}")]
    Model(ModelError),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl From<PipelineError> for AppError {
    fn from(e: PipelineError) -> Self {
        match e {
            PipelineError::Catalog(CatalogError::UnknownOperation(op)) => {
                AppError::NotFound(format!("There is no '{op}' analysis."))
            }
            PipelineError::Template(TemplateError::MissingField(field)) => {
                AppError::Validation(missing_field_message(&field))
            }
            PipelineError::Extraction(ExtractionError::Unreadable { .. }) => {
                AppError::UnprocessableEntity(
                    "The uploaded file could not be read as a PDF.".to_string(),
                )
            }
            PipelineError::Extraction(ExtractionError::Empty) => {
                AppError::UnprocessableEntity("The uploaded PDF has no pages.".to_string())
            }
            PipelineError::Model(e) => AppError::Model(e),
        }
    }
}

impl From<CatalogError> for AppError {
    fn from(e: CatalogError) -> Self {
        PipelineError::from(e).into()
    }
}

impl From<ExtractionError> for AppError {
    fn from(e: ExtractionError) -> Self {
        PipelineError::from(e).into()
    }
}

fn missing_field_message(field: &str) -> String {
    match field {
        RESUME_FIELD => {
            "Please upload a resume with readable text before running this analysis.".to_string()
        }
        JD_FIELD => {
            "Please provide a job description before running this analysis.".to_string()
        }
        other => format!("Missing required input '{other}'."),
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg.clone()),
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone()),
            AppError::UnprocessableEntity(msg) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "UNPROCESSABLE_ENTITY",
                msg.clone(),
            ),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, "CONFLICT", msg.clone()),
            AppError::PayloadTooLarge(msg) => {
                (StatusCode::PAYLOAD_TOO_LARGE, "PAYLOAD_TOO_LARGE", msg.clone())
            }
            AppError::Model(e) => {
                tracing::error!("Model error: {e}");
                match e {
                    ModelError::RateLimited { .. } => (
                        StatusCode::TOO_MANY_REQUESTS,
                        "MODEL_RATE_LIMITED",
                        "The analysis service is busy. Please try again shortly.".to_string(),
                    ),
                    ModelError::Unavailable(_) => (
                        StatusCode::SERVICE_UNAVAILABLE,
                        "MODEL_UNAVAILABLE",
                        "The analysis service is currently unavailable.".to_string(),
                    ),
                    ModelError::Unauthorized(_) => (
                        StatusCode::BAD_GATEWAY,
                        "MODEL_UNAUTHORIZED",
                        "The analysis service rejected our credentials.".to_string(),
                    ),
                    ModelError::Malformed(_) => (
                        StatusCode::BAD_GATEWAY,
                        "MODEL_MALFORMED",
                        "The analysis service returned an unusable response.".to_string(),
                    ),
                }
            }
            AppError::Internal(e) => {
                tracing::error!("Internal error: {e:?}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "An internal server error occurred".to_string(),
                )
            }
        };

        let body = Json(json!({
            "error": {
                "code": code,
                "message": message
            }
        }));

        (status, body).into_response()
    }
}
