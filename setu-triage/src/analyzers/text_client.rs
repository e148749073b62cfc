//! Text Analyzer Client
//!
//! Sends a report's free-text description to the text classification service.
//!
//! # API Reference
//! - Endpoint: `POST {text_url}/analyze/text`
//! - Request: `{"text": "...", "report_id": "..."}`
//! - Response: `{"score": 0.0-1.0, "classification_label": "...", "flags": [...]}`

use super::{AnalyzerEndpoint, AnalyzerPayload, AnalyzerRequest, ModalityAnalyzer};
use crate::types::{AnalyzerError, Modality, ModalitySignal};
use async_trait::async_trait;
use serde::Serialize;
use std::time::Duration;
use tracing::debug;

const ANALYZER_NAME: &str = "TextClassifier";

#[derive(Debug, Serialize)]
struct TextAnalysisRequest<'a> {
    text: &'a str,
    report_id: &'a str,
}

/// Text classification service client
pub struct TextAnalyzerClient {
    endpoint: AnalyzerEndpoint,
}

impl TextAnalyzerClient {
    pub fn new(
        base_url: impl Into<String>,
        request_timeout: Duration,
        probe_timeout: Duration,
    ) -> anyhow::Result<Self> {
        Ok(Self {
            endpoint: AnalyzerEndpoint::new(base_url, request_timeout, probe_timeout)?,
        })
    }
}

#[async_trait]
impl ModalityAnalyzer for TextAnalyzerClient {
    fn name(&self) -> &str {
        ANALYZER_NAME
    }

    fn modality(&self) -> Modality {
        Modality::Text
    }

    async fn analyze(&self, request: &AnalyzerRequest) -> Result<ModalitySignal, AnalyzerError> {
        let text = match &request.payload {
            AnalyzerPayload::Text(text) => text,
            other => {
                return Err(AnalyzerError::Failed(format!(
                    "{} cannot score {} input",
                    ANALYZER_NAME,
                    other.modality()
                )))
            }
        };

        debug!(
            report_id = %request.report_id,
            text_length = text.len(),
            "Querying text analyzer"
        );

        let response = self
            .endpoint
            .client()
            .post(self.endpoint.url("analyze/text"))
            .json(&TextAnalysisRequest {
                text,
                report_id: &request.report_id,
            })
            .send()
            .await
            .map_err(|e| self.endpoint.classify_error(ANALYZER_NAME, e))?;

        self.endpoint.read_signal(ANALYZER_NAME, response).await
    }

    async fn probe(&self) -> bool {
        self.endpoint.probe().await
    }
}
