//! setu-triage library interface
//!
//! Multimodal disaster-report triage: modality analyzers, metadata
//! aggregation, weighted fusion with graceful degradation, and an emergency
//! assistant with deterministic fallback, served over HTTP.

pub mod analyzers;
pub mod api;
pub mod assistant;
pub mod config;
pub mod error;
pub mod fusion;
pub mod pipeline;
pub mod resilience;
pub mod types;

pub use crate::error::{ApiError, ApiResult};

use crate::analyzers::{ImageAnalyzerClient, TextAnalyzerClient};
use crate::assistant::AssistantClient;
use crate::config::TriageConfig;
use crate::fusion::FusionEngine;
use crate::pipeline::TriagePipeline;
use crate::resilience::ResilientAnalyzer;
use anyhow::Context;
use axum::Router;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tower_http::trace::TraceLayer;
use tracing::info;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    /// Analyzer orchestration + fusion engine
    pub pipeline: Arc<TriagePipeline>,
    /// Emergency assistant; `None` when not configured
    pub assistant: Option<Arc<AssistantClient>>,
    /// Cancelled on shutdown; in-flight decisions use child tokens
    pub shutdown: CancellationToken,
    /// Service startup timestamp for uptime tracking
    pub startup_time: DateTime<Utc>,
}

impl AppState {
    pub fn new(pipeline: TriagePipeline, assistant: Option<AssistantClient>) -> Self {
        Self {
            pipeline: Arc::new(pipeline),
            assistant: assistant.map(Arc::new),
            shutdown: CancellationToken::new(),
            startup_time: Utc::now(),
        }
    }

    /// Wire analyzers, engine and assistant from configuration
    pub fn from_config(config: &TriageConfig) -> anyhow::Result<Self> {
        let engine = FusionEngine::new(config.fusion).context("Invalid fusion configuration")?;
        let mut pipeline = TriagePipeline::new(Arc::new(engine));

        let analyzers = &config.analyzers;
        if let Some(url) = analyzers.text_endpoint() {
            let client = TextAnalyzerClient::new(url, analyzers.timeout(), analyzers.probe_timeout())
                .context("Failed to create text analyzer client")?;
            info!(url, budget_ms = analyzers.timeout_ms, "Text analyzer configured");
            pipeline = pipeline
                .with_text_analyzer(ResilientAnalyzer::new(Arc::new(client), analyzers.timeout()));
        } else {
            info!("Text analyzer not configured");
        }

        if let Some(url) = analyzers.image_endpoint() {
            let client = ImageAnalyzerClient::new(url, analyzers.timeout(), analyzers.probe_timeout())
                .context("Failed to create image analyzer client")?;
            info!(url, budget_ms = analyzers.timeout_ms, "Image analyzer configured");
            pipeline = pipeline
                .with_image_analyzer(ResilientAnalyzer::new(Arc::new(client), analyzers.timeout()));
        } else {
            info!("Image analyzer not configured");
        }

        let assistant = match config.assistant.endpoint() {
            Some(url) => {
                info!(url, model = %config.assistant.model, "Assistant configured");
                Some(
                    AssistantClient::new(
                        url,
                        config.assistant.model.clone(),
                        config.assistant.timeout(),
                        analyzers.probe_timeout(),
                    )
                    .context("Failed to create assistant client")?,
                )
            }
            None => {
                info!("Assistant not configured, /chat will answer with the fallback message");
                None
            }
        };

        Ok(Self::new(pipeline, assistant))
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .merge(api::fusion_routes())
        .merge(api::triage_routes())
        .merge(api::chat_routes())
        .merge(api::health_routes())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
