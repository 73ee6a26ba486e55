//! LLM Client: the single point of entry for all model calls in ResumeMate.
//!
//! ARCHITECTURAL RULE: No other module may call the model provider directly.
//! The analysis pipeline depends only on the [`ModelClient`] capability; the
//! concrete [`GeminiClient`] is constructed once in `main` and injected.
//!
//! Wire protocol: Gemini `generateContent` (v1beta), one user turn, text only.
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::header::RETRY_AFTER;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

pub mod retry;

#[cfg(test)]
pub mod testing;

pub use retry::RetryingModel;

pub const DEFAULT_MODEL: &str = "gemini-1.5-flash";
pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";
const API_KEY_HEADER: &str = "x-goog-api-key";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ModelError {
    #[error("Model provider rejected the request credentials: {0}")]
    Unauthorized(String),

    #[error("Model provider rate limit exceeded")]
    RateLimited { retry_after_secs: Option<u64> },

    #[error("Model provider unavailable: {0}")]
    Unavailable(String),

    #[error("Malformed model response: {0}")]
    Malformed(String),
}

impl ModelError {
    /// Rate limits and outages may clear on their own; everything else will not.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::RateLimited { .. } | Self::Unavailable(_))
    }
}

impl From<reqwest::Error> for ModelError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            Self::Malformed(e.to_string())
        } else {
            Self::Unavailable(e.to_string())
        }
    }
}

/// The model capability the analysis pipeline is written against.
///
/// Carried in the pipeline as `Arc<dyn ModelClient>` so tests can substitute
/// a double without touching any caller.
#[async_trait]
pub trait ModelClient: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<String, ModelError>;
}

// ────────────────────────────────────────────────────────────────────────────
// Gemini wire types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct GenerateContentRequest<'a> {
    contents: Vec<RequestContent<'a>>,
}

#[derive(Debug, Serialize)]
struct RequestContent<'a> {
    role: &'a str,
    parts: Vec<RequestPart<'a>>,
}

#[derive(Debug, Serialize)]
struct RequestPart<'a> {
    text: &'a str,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentResponse {
    #[serde(default)]
    pub candidates: Vec<Candidate>,
    pub prompt_feedback: Option<PromptFeedback>,
    pub usage_metadata: Option<UsageMetadata>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Candidate {
    pub content: Option<CandidateContent>,
    pub finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CandidateContent {
    #[serde(default)]
    pub parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
pub struct ResponsePart {
    pub text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PromptFeedback {
    pub block_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UsageMetadata {
    #[serde(default)]
    pub prompt_token_count: u32,
    #[serde(default)]
    pub candidates_token_count: u32,
}

impl GenerateContentResponse {
    /// Joins the text parts of the first candidate.
    pub fn into_text(self) -> Result<String, ModelError> {
        let Self {
            candidates,
            prompt_feedback,
            ..
        } = self;

        let Some(candidate) = candidates.into_iter().next() else {
            let reason = prompt_feedback
                .and_then(|f| f.block_reason)
                .unwrap_or_else(|| "none given".to_string());
            return Err(ModelError::Malformed(format!(
                "response contained no candidates (block reason: {reason})"
            )));
        };

        let text: String = candidate
            .content
            .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect())
            .unwrap_or_default();

        if text.trim().is_empty() {
            let finish = candidate.finish_reason.as_deref().unwrap_or("unknown");
            return Err(ModelError::Malformed(format!(
                "candidate contained no text (finish reason: {finish})"
            )));
        }

        Ok(text)
    }
}

#[derive(Debug, Deserialize)]
struct GeminiError {
    error: GeminiErrorBody,
}

#[derive(Debug, Deserialize)]
struct GeminiErrorBody {
    message: String,
}

/// Reads a `Retry-After` value: either delta-seconds or an HTTP-date.
/// Dates in the past yield zero.
fn parse_retry_after(value: &str, now: DateTime<Utc>) -> Option<u64> {
    let value = value.trim();
    if let Ok(secs) = value.parse::<u64>() {
        return Some(secs);
    }
    let at = DateTime::parse_from_rfc2822(value).ok()?;
    Some((at.with_timezone(&Utc) - now).num_seconds().max(0) as u64)
}

/// Maps a non-success HTTP status onto the capability's error kinds.
pub fn classify_status(status: u16, retry_after_secs: Option<u64>, body: &str) -> ModelError {
    let message = serde_json::from_str::<GeminiError>(body)
        .map(|e| e.error.message)
        .unwrap_or_else(|_| body.to_string());

    match status {
        401 | 403 => ModelError::Unauthorized(message),
        429 => ModelError::RateLimited { retry_after_secs },
        500..=599 => ModelError::Unavailable(format!("status {status}: {message}")),
        _ => ModelError::Malformed(format!("status {status}: {message}")),
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Client
// ────────────────────────────────────────────────────────────────────────────

/// Gemini `generateContent` client. Makes exactly one HTTP call per
/// `generate`; wrap it in [`RetryingModel`] for backoff.
#[derive(Clone)]
pub struct GeminiClient {
    client: Client,
    api_key: String,
    model: String,
    base_url: String,
}

impl GeminiClient {
    pub fn new(api_key: String, model: String, timeout: Duration) -> reqwest::Result<Self> {
        Ok(Self {
            client: Client::builder().timeout(timeout).build()?,
            api_key,
            model,
            base_url: DEFAULT_BASE_URL.to_string(),
        })
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url.trim_end_matches('/'),
            self.model
        )
    }
}

#[async_trait]
impl ModelClient for GeminiClient {
    async fn generate(&self, prompt: &str) -> Result<String, ModelError> {
        let request_body = GenerateContentRequest {
            contents: vec![RequestContent {
                role: "user",
                parts: vec![RequestPart { text: prompt }],
            }],
        };

        let response = self
            .client
            .post(self.endpoint())
            .header(API_KEY_HEADER, &self.api_key)
            .json(&request_body)
            .send()
            .await?;

        let status = response.status();

        if !status.is_success() {
            let retry_after = response
                .headers()
                .get(RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| parse_retry_after(v, Utc::now()));
            let body = response.text().await.unwrap_or_default();
            warn!("Gemini API returned {}: {}", status, body);
            return Err(classify_status(status.as_u16(), retry_after, &body));
        }

        let payload: GenerateContentResponse = response
            .json()
            .await
            .map_err(|e| ModelError::Malformed(e.to_string()))?;

        if let Some(usage) = &payload.usage_metadata {
            debug!(
                "Gemini call succeeded: prompt_tokens={}, candidate_tokens={}",
                usage.prompt_token_count, usage.candidates_token_count
            );
        }

        payload.into_text()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decode(json: &str) -> GenerateContentResponse {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_into_text_joins_parts_of_first_candidate() {
        let response = decode(
            r#"{
                "candidates": [
                    {
                        "content": {"role": "model", "parts": [{"text": "Strong "}, {"text": "Rust skills."}]},
                        "finishReason": "STOP"
                    },
                    {
                        "content": {"role": "model", "parts": [{"text": "ignored"}]},
                        "finishReason": "STOP"
                    }
                ],
                "usageMetadata": {"promptTokenCount": 12, "candidatesTokenCount": 4, "totalTokenCount": 16}
            }"#,
        );
        assert_eq!(response.usage_metadata.as_ref().unwrap().prompt_token_count, 12);
        assert_eq!(response.into_text().unwrap(), "Strong Rust skills.");
    }

    #[test]
    fn test_blocked_prompt_is_malformed_with_reason() {
        let response = decode(r#"{"promptFeedback": {"blockReason": "SAFETY"}}"#);
        match response.into_text() {
            Err(ModelError::Malformed(msg)) => assert!(msg.contains("SAFETY"), "got: {msg}"),
            other => panic!("expected Malformed, got {other:?}"),
        }
    }

    #[test]
    fn test_candidate_without_text_is_malformed() {
        let response = decode(r#"{"candidates": [{"finishReason": "MAX_TOKENS"}]}"#);
        match response.into_text() {
            Err(ModelError::Malformed(msg)) => assert!(msg.contains("MAX_TOKENS")),
            other => panic!("expected Malformed, got {other:?}"),
        }
    }

    #[test]
    fn test_classify_status_unauthorized_extracts_message() {
        let body = r#"{"error": {"code": 403, "message": "API key not valid", "status": "PERMISSION_DENIED"}}"#;
        assert_eq!(
            classify_status(403, None, body),
            ModelError::Unauthorized("API key not valid".to_string())
        );
    }

    #[test]
    fn test_classify_status_rate_limited_keeps_retry_after() {
        assert_eq!(
            classify_status(429, Some(30), ""),
            ModelError::RateLimited {
                retry_after_secs: Some(30)
            }
        );
    }

    #[test]
    fn test_classify_status_server_error_is_unavailable() {
        let err = classify_status(503, None, "overloaded");
        assert!(matches!(err, ModelError::Unavailable(ref m) if m.contains("overloaded")));
        assert!(err.is_transient());
    }

    #[test]
    fn test_classify_status_bad_request_is_not_transient() {
        let err = classify_status(400, None, "bad");
        assert!(matches!(err, ModelError::Malformed(_)));
        assert!(!err.is_transient());
    }

    #[test]
    fn test_request_body_shape() {
        let body = GenerateContentRequest {
            contents: vec![RequestContent {
                role: "user",
                parts: vec![RequestPart { text: "hi" }],
            }],
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["contents"][0]["role"], "user");
        assert_eq!(json["contents"][0]["parts"][0]["text"], "hi");
    }

    #[test]
    fn test_endpoint_trims_trailing_slash() {
        let client = GeminiClient::new(
            "key".to_string(),
            "gemini-pro".to_string(),
            Duration::from_secs(5),
        )
        .unwrap()
        .with_base_url("http://localhost:9999/");
        assert_eq!(
            client.endpoint(),
            "http://localhost:9999/v1beta/models/gemini-pro:generateContent"
        );
    }

    fn fixed_now() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2015-10-21T07:28:00Z")
            .unwrap()
            .with_timezone(&Utc)
    }

    #[test]
    fn test_retry_after_delta_seconds() {
        assert_eq!(parse_retry_after("120", fixed_now()), Some(120));
        assert_eq!(parse_retry_after(" 5 ", fixed_now()), Some(5));
    }

    #[test]
    fn test_retry_after_http_date() {
        assert_eq!(
            parse_retry_after("Wed, 21 Oct 2015 07:28:30 GMT", fixed_now()),
            Some(30)
        );
        assert_eq!(
            parse_retry_after("Wed, 21 Oct 2015 07:00:00 GMT", fixed_now()),
            Some(0)
        );
    }

    #[test]
    fn test_retry_after_garbage_is_ignored() {
        assert_eq!(parse_retry_after("soon", fixed_now()), None);
        assert_eq!(parse_retry_after("-3", fixed_now()), None);
        assert_eq!(parse_retry_after("", fixed_now()), None);
    }
}
