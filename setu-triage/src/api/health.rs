//! Health check endpoints
//!
//! `/health` is liveness only. `/health/dependencies` probes the analyzers
//! and the assistant concurrently and reports readiness.

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::resilience::ResilientAnalyzer;
use crate::AppState;

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    /// Module name ("setu-triage")
    pub module: String,
    /// Crate version from Cargo.toml
    pub version: String,
    /// Seconds since service started
    pub uptime_seconds: u64,
}

/// GET /health
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let uptime = Utc::now().signed_duration_since(state.startup_time);
    let uptime_seconds = uptime.num_seconds().max(0) as u64;

    Json(HealthResponse {
        status: "ok".to_string(),
        module: "setu-triage".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_seconds,
    })
}

/// Reachability of one dependency
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DependencyState {
    Ok,
    Unreachable,
    NotConfigured,
}

/// Aggregate readiness
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OverallHealth {
    /// Every dependency reachable
    Healthy,
    /// An analyzer is down; decisions will be degraded
    Degraded,
    /// Analyzers fine (or deliberately off) but something is missing
    Partial,
}

impl OverallHealth {
    pub fn from_states(text: DependencyState, image: DependencyState, assistant: DependencyState) -> Self {
        if [text, image, assistant].iter().all(|s| *s == DependencyState::Ok) {
            OverallHealth::Healthy
        } else if text == DependencyState::Unreachable || image == DependencyState::Unreachable {
            OverallHealth::Degraded
        } else {
            OverallHealth::Partial
        }
    }
}

#[derive(Debug, Serialize)]
pub struct DependencyStates {
    pub text_analyzer: DependencyState,
    pub image_analyzer: DependencyState,
    pub assistant: DependencyState,
}

/// GET /health/dependencies response
#[derive(Debug, Serialize)]
pub struct DependencyHealthResponse {
    pub overall: OverallHealth,
    pub dependencies: DependencyStates,
    pub checked_at: DateTime<Utc>,
}

async fn probe_analyzer(analyzer: Option<&ResilientAnalyzer>) -> DependencyState {
    match analyzer {
        None => DependencyState::NotConfigured,
        Some(analyzer) if analyzer.probe().await => DependencyState::Ok,
        Some(_) => DependencyState::Unreachable,
    }
}

/// GET /health/dependencies
///
/// 200 only when healthy, 503 otherwise.
pub async fn dependency_health(State(state): State<AppState>) -> Response {
    let assistant_probe = async {
        match &state.assistant {
            None => DependencyState::NotConfigured,
            Some(assistant) if assistant.probe().await.online => DependencyState::Ok,
            Some(_) => DependencyState::Unreachable,
        }
    };

    let (text, image, assistant) = tokio::join!(
        probe_analyzer(state.pipeline.text_analyzer()),
        probe_analyzer(state.pipeline.image_analyzer()),
        assistant_probe,
    );

    let overall = OverallHealth::from_states(text, image, assistant);
    if overall != OverallHealth::Healthy {
        tracing::warn!(?text, ?image, ?assistant, ?overall, "Dependency check not healthy");
    }

    let code = if overall == OverallHealth::Healthy {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (
        code,
        Json(DependencyHealthResponse {
            overall,
            dependencies: DependencyStates {
                text_analyzer: text,
                image_analyzer: image,
                assistant,
            },
            checked_at: Utc::now(),
        }),
    )
        .into_response()
}

/// Build health check routes
pub fn health_routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health_check))
        .route("/health/dependencies", get(dependency_health))
}
