//! Shared HTTP plumbing for analyzer services
//!
//! Both analyzer services speak the same response contract:
//! `{score, classification_label, flags}`. Older deployments answer with
//! `text_score` / `image_score`, `classification` and the booleans
//! `is_duplicate` / `is_tampered`; those are accepted as aliases.

use crate::types::{AnalyzerError, ModalitySignal, SignalFlag};
use anyhow::Context;
use reqwest::{Client, Response, StatusCode};
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

/// Analyzer service response body
#[derive(Debug, Clone, Deserialize)]
pub struct AnalyzerResponse {
    /// Explicit failure marker (`success: false`)
    #[serde(default)]
    pub success: Option<bool>,

    #[serde(default, alias = "text_score", alias = "image_score")]
    pub score: Option<f64>,

    #[serde(default, alias = "classification")]
    pub classification_label: Option<String>,

    #[serde(default)]
    pub flags: Vec<String>,

    #[serde(default)]
    pub is_duplicate: bool,

    #[serde(default)]
    pub is_tampered: bool,

    #[serde(default)]
    pub error: Option<String>,
}

impl AnalyzerResponse {
    /// Convert the wire response into a signal
    ///
    /// Scores are clamped to 0.0-1.0; a missing or non-finite score, or an
    /// explicit `success: false`, is an analyzer failure.
    pub fn into_signal(self, analyzer: &str) -> Result<ModalitySignal, AnalyzerError> {
        if self.success == Some(false) {
            let reason = self
                .error
                .unwrap_or_else(|| "analyzer reported failure".to_string());
            return Err(AnalyzerError::Failed(format!("{}: {}", analyzer, reason)));
        }

        let score = match self.score {
            Some(score) if score.is_finite() => score,
            Some(score) => {
                return Err(AnalyzerError::Failed(format!(
                    "{} returned non-finite score {}",
                    analyzer, score
                )))
            }
            None => {
                return Err(AnalyzerError::Failed(format!(
                    "{} response has no score",
                    analyzer
                )))
            }
        };

        if !(0.0..=1.0).contains(&score) {
            debug!(analyzer, score, "Clamping out-of-range analyzer score");
        }

        let mut flags: Vec<SignalFlag> = self.flags.iter().map(|f| SignalFlag::from(f.as_str())).collect();
        if self.is_duplicate {
            flags.push(SignalFlag::Duplicate);
        }
        if self.is_tampered {
            flags.push(SignalFlag::Tampered);
        }

        let mut signal = ModalitySignal::present(score).with_flags(flags);
        if let Some(label) = self.classification_label {
            signal = signal.with_label(label);
        }
        Ok(signal)
    }
}

/// Base URL + HTTP client for one analyzer service
#[derive(Debug, Clone)]
pub struct AnalyzerEndpoint {
    base_url: String,
    http_client: Client,
    request_timeout: Duration,
    probe_timeout: Duration,
}

impl AnalyzerEndpoint {
    pub fn new(
        base_url: impl Into<String>,
        request_timeout: Duration,
        probe_timeout: Duration,
    ) -> anyhow::Result<Self> {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        let http_client = Client::builder()
            .timeout(request_timeout)
            .build()
            .context("Failed to build analyzer HTTP client")?;

        Ok(Self {
            base_url,
            http_client,
            request_timeout,
            probe_timeout,
        })
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    pub fn client(&self) -> &Client {
        &self.http_client
    }

    /// Map a transport failure onto the analyzer failure kinds
    pub fn classify_error(&self, analyzer: &str, err: reqwest::Error) -> AnalyzerError {
        if err.is_timeout() {
            AnalyzerError::Timeout(self.request_timeout)
        } else if err.is_connect() || err.is_builder() {
            AnalyzerError::Unavailable(format!("{} at {}: {}", analyzer, self.base_url, err))
        } else if err.is_decode() || err.is_body() {
            AnalyzerError::Failed(format!("{} sent an unreadable response: {}", analyzer, err))
        } else {
            AnalyzerError::Unavailable(format!("{} request failed: {}", analyzer, err))
        }
    }

    /// Reject non-success responses
    ///
    /// 503 means the service is up but cannot serve (e.g. model not loaded),
    /// which is treated like an unreachable analyzer.
    pub fn check_status(&self, analyzer: &str, response: Response) -> Result<Response, AnalyzerError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        if status == StatusCode::SERVICE_UNAVAILABLE {
            Err(AnalyzerError::Unavailable(format!("{} returned HTTP {}", analyzer, status)))
        } else {
            Err(AnalyzerError::Failed(format!("{} returned HTTP {}", analyzer, status)))
        }
    }

    /// Decode a successful analyzer response into a signal
    pub async fn read_signal(&self, analyzer: &str, response: Response) -> Result<ModalitySignal, AnalyzerError> {
        let response = self.check_status(analyzer, response)?;
        let body: AnalyzerResponse = response
            .json()
            .await
            .map_err(|e| self.classify_error(analyzer, e))?;
        body.into_signal(analyzer)
    }

    /// `GET {base}/health` within the probe timeout
    pub async fn probe(&self) -> bool {
        match self
            .http_client
            .get(self.url("health"))
            .timeout(self.probe_timeout)
            .send()
            .await
        {
            Ok(response) => response.status().is_success(),
            Err(e) => {
                debug!(base_url = %self.base_url, error = %e, "Analyzer probe failed");
                false
            }
        }
    }
}
