//! HTTP API handlers for setu-triage
//!
//! - `POST /analyze/fusion` - fuse precomputed scores
//! - `POST /triage` - run analyzers, then fuse
//! - `POST /chat`, `GET /chat/health` - emergency assistant
//! - `GET /health`, `GET /health/dependencies` - liveness / readiness

pub mod chat;
pub mod fusion;
pub mod health;
pub mod triage;

pub use chat::chat_routes;
pub use fusion::fusion_routes;
pub use health::health_routes;
pub use triage::triage_routes;

use crate::types::{FusionResult, Modality, Priority};
use serde::Serialize;
use std::collections::BTreeMap;

/// Decision fields shared by `/analyze/fusion` and `/triage`
#[derive(Debug, Clone, Serialize)]
pub struct DecisionResponse {
    pub success: bool,
    pub report_id: String,
    pub fusion_score: f64,
    /// Same value as `fusion_score`, kept for existing consumers
    pub confidence: f64,
    pub should_verify: bool,
    pub priority: Priority,
    pub degraded: bool,
    pub contributing_weights: BTreeMap<Modality, f64>,
    pub metadata_score: f64,
}

impl From<FusionResult> for DecisionResponse {
    fn from(result: FusionResult) -> Self {
        Self {
            success: true,
            report_id: result.report_id,
            fusion_score: result.fusion_score,
            confidence: result.fusion_score,
            should_verify: result.should_verify,
            priority: result.priority,
            degraded: result.degraded,
            contributing_weights: result.contributing_weights,
            metadata_score: result.metadata_score,
        }
    }
}
