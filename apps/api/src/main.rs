mod analysis;
mod config;
mod document;
mod errors;
mod llm_client;
mod models;
mod narration;
mod routes;
mod state;

use anyhow::{Context, Result};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::analysis::catalog::AnalysisCatalog;
use crate::analysis::pipeline::PromptPipeline;
use crate::config::Config;
use crate::document::PdfExtractor;
use crate::llm_client::{GeminiClient, ModelClient, RetryingModel};
use crate::narration::{CommandNarrator, Narrator};
use crate::routes::build_router;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_CRATE_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting ResumeMate API v{}", env!("CARGO_PKG_VERSION"));

    // Initialize the model client once; everything downstream gets it injected
    let model = build_model_client(&config)?;

    // The catalog is read-only after startup
    let catalog = Arc::new(AnalysisCatalog::standard());
    info!("Analysis catalog loaded: {} operations", catalog.len());

    let pipeline = Arc::new(PromptPipeline::new(catalog, model));

    let narrator = config
        .narrator_command
        .as_deref()
        .and_then(CommandNarrator::from_command_line)
        .map(|n| {
            info!("Narration enabled via '{}'", n.program());
            Arc::new(n) as Arc<dyn Narrator>
        });

    let state = AppState {
        pipeline,
        extractor: Arc::new(PdfExtractor),
        narrator,
        config: config.clone(),
    };

    // Build router
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive()); // TODO: restrict origins once the front-end host is fixed

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Builds the Gemini client, wrapped in the retry decorator when MODEL_MAX_RETRIES > 0.
fn build_model_client(config: &Config) -> Result<Arc<dyn ModelClient>> {
    let gemini = GeminiClient::new(
        config.google_api_key.clone(),
        config.gemini_model.clone(),
        Duration::from_secs(config.model_timeout_secs),
    )
    .context("Failed to build HTTP client")?
    .with_base_url(config.gemini_base_url.clone());

    info!("LLM client initialized (model: {})", gemini.model());

    if config.model_max_retries > 0 {
        info!("Retrying transient model errors up to {} times", config.model_max_retries);
        Ok(Arc::new(RetryingModel::new(gemini, config.model_max_retries)))
    } else {
        Ok(Arc::new(gemini))
    }
}
