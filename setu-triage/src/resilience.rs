//! Resilience Wrapper
//!
//! Bounds every analyzer call with a timeout budget and turns every failure
//! kind into an absent signal. Nothing is retried within a decision cycle:
//! the triage decision needs bounded latency, not eventual success of one
//! analyzer.

use crate::analyzers::{AnalyzerRequest, ModalityAnalyzer};
use crate::types::{AbsenceReason, AnalyzerError, Modality, ModalitySignal};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// Analyzer guarded by a timeout budget
#[derive(Clone)]
pub struct ResilientAnalyzer {
    inner: Arc<dyn ModalityAnalyzer>,
    budget: Duration,
}

impl ResilientAnalyzer {
    pub fn new(inner: Arc<dyn ModalityAnalyzer>, budget: Duration) -> Self {
        Self { inner, budget }
    }

    pub fn name(&self) -> &str {
        self.inner.name()
    }

    pub fn modality(&self) -> Modality {
        self.inner.modality()
    }

    pub async fn probe(&self) -> bool {
        self.inner.probe().await
    }

    /// Invoke the analyzer; always returns a signal
    ///
    /// The call is abandoned (its future dropped) when the budget elapses or
    /// the token is cancelled, whichever comes first.
    pub async fn invoke(&self, request: &AnalyzerRequest, cancel: &CancellationToken) -> ModalitySignal {
        let name = self.inner.name();
        let started = Instant::now();

        let outcome = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                debug!(analyzer = name, report_id = %request.report_id, "Analyzer call cancelled");
                return ModalitySignal::absent(AbsenceReason::Cancelled);
            }
            result = tokio::time::timeout(self.budget, self.inner.analyze(request)) => {
                result.unwrap_or(Err(AnalyzerError::Timeout(self.budget)))
            }
        };

        match outcome {
            Ok(signal) if signal.is_present() => {
                debug!(
                    analyzer = name,
                    report_id = %request.report_id,
                    score = ?signal.score(),
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "Analyzer signal received"
                );
                signal
            }
            Ok(signal) => {
                // Analyzer reported an absent signal itself
                debug!(analyzer = name, report_id = %request.report_id, "Analyzer returned no score");
                ModalitySignal::absent(signal.absence().unwrap_or(AbsenceReason::Failed))
            }
            Err(e) => {
                warn!(
                    analyzer = name,
                    report_id = %request.report_id,
                    error = %e,
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "Analyzer failed, continuing without this modality"
                );
                ModalitySignal::absent(AbsenceReason::from(&e))
            }
        }
    }
}

/// Invoke an optional analyzer on an optional input
///
/// A missing analyzer or a missing input yields `NotRequested` without any call.
pub async fn invoke_optional(
    analyzer: Option<&ResilientAnalyzer>,
    request: Option<AnalyzerRequest>,
    cancel: &CancellationToken,
) -> ModalitySignal {
    match (analyzer, request) {
        (Some(analyzer), Some(request)) => analyzer.invoke(&request, cancel).await,
        _ => ModalitySignal::absent(AbsenceReason::NotRequested),
    }
}
