//! Modality Analyzers
//!
//! Contract every analyzer (text, image) satisfies: given one report input,
//! return a bounded confidence signal with auxiliary flags, or fail with an
//! explicit `AnalyzerError`.
//!
//! # Analyzers
//! 1. **text_client** - HTTP client for the text classification service
//! 2. **image_client** - HTTP client for the image classification / tamper / duplicate service
//!
//! Analyzer internals (models, architectures) live behind these clients and are
//! swappable. Failures never abort a decision: the resilience wrapper turns them
//! into absent signals.

pub mod endpoint;
pub mod image_client;
pub mod text_client;

pub use endpoint::{AnalyzerEndpoint, AnalyzerResponse};
pub use image_client::ImageAnalyzerClient;
pub use text_client::TextAnalyzerClient;

use crate::types::{AnalyzerError, Modality, ModalitySignal};
use async_trait::async_trait;

/// Input handed to an analyzer
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnalyzerPayload {
    /// Free-text report description
    Text(String),
    /// Raw image bytes as submitted
    Image(Vec<u8>),
}

impl AnalyzerPayload {
    pub fn modality(&self) -> Modality {
        match self {
            AnalyzerPayload::Text(_) => Modality::Text,
            AnalyzerPayload::Image(_) => Modality::Image,
        }
    }
}

/// One analyzer invocation for one report
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalyzerRequest {
    /// Correlation id of the report
    pub report_id: String,
    pub payload: AnalyzerPayload,
}

impl AnalyzerRequest {
    pub fn text(report_id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            report_id: report_id.into(),
            payload: AnalyzerPayload::Text(text.into()),
        }
    }

    pub fn image(report_id: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            report_id: report_id.into(),
            payload: AnalyzerPayload::Image(bytes),
        }
    }
}

/// Modality analyzer trait
///
/// # Example
/// ```rust,ignore
/// use setu_triage::analyzers::{AnalyzerRequest, ModalityAnalyzer, TextAnalyzerClient};
///
/// let client = TextAnalyzerClient::new("http://127.0.0.1:8000", timeout, probe_timeout)?;
/// let signal = client.analyze(&AnalyzerRequest::text("rpt-1", "Flood near station")).await?;
/// println!("text score: {:?}", signal.score());
/// ```
#[async_trait]
pub trait ModalityAnalyzer: Send + Sync {
    /// Analyzer name for provenance and logging
    fn name(&self) -> &str;

    /// Modality this analyzer scores
    fn modality(&self) -> Modality;

    /// Score one report input
    ///
    /// # Returns
    /// * `Ok(ModalitySignal)` - present signal, score within 0.0-1.0
    /// * `Err(AnalyzerError)` - unavailable, timed out, or failed
    async fn analyze(&self, request: &AnalyzerRequest) -> Result<ModalitySignal, AnalyzerError>;

    /// Check whether the analyzer dependency is reachable
    async fn probe(&self) -> bool {
        true
    }
}
