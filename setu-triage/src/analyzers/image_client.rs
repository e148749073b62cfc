//! Image Analyzer Client
//!
//! Uploads a report photo to the image classification service, which also
//! performs tamper detection and duplicate checking.
//!
//! # API Reference
//! - Endpoint: `POST {image_url}/analyze/image`
//! - Request: multipart form, `file` part (image bytes) + `report_id` text part
//! - Response: `{"score": 0.0-1.0, "classification_label": "...", "flags": ["tampered", ...]}`

use super::{AnalyzerEndpoint, AnalyzerPayload, AnalyzerRequest, ModalityAnalyzer};
use crate::types::{AnalyzerError, Modality, ModalitySignal};
use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use std::time::Duration;
use tracing::debug;

const ANALYZER_NAME: &str = "ImageClassifier";

/// Image classification service client
pub struct ImageAnalyzerClient {
    endpoint: AnalyzerEndpoint,
}

impl ImageAnalyzerClient {
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
impl ModalityAnalyzer for ImageAnalyzerClient {
    fn name(&self) -> &str {
        ANALYZER_NAME
    }

    fn modality(&self) -> Modality {
        Modality::Image
    }

    async fn analyze(&self, request: &AnalyzerRequest) -> Result<ModalitySignal, AnalyzerError> {
        let bytes = match &request.payload {
            AnalyzerPayload::Image(bytes) => bytes,
            other => {
                return Err(AnalyzerError::Failed(format!(
                    "{} cannot score {} input",
                    ANALYZER_NAME,
                    other.modality()
                )))
            }
        };

        if bytes.is_empty() {
            return Err(AnalyzerError::Failed(format!("{}: empty image", ANALYZER_NAME)));
        }

        debug!(
            report_id = %request.report_id,
            size_kb = bytes.len() as f64 / 1024.0,
            "Uploading image to analyzer"
        );

        let form = Form::new()
            .text("report_id", request.report_id.clone())
            .part("file", Part::bytes(bytes.clone()).file_name("report-image"));

        let response = self
            .endpoint
            .client()
            .post(self.endpoint.url("analyze/image"))
            .multipart(form)
            .send()
            .await
            .map_err(|e| self.endpoint.classify_error(ANALYZER_NAME, e))?;

        self.endpoint.read_signal(ANALYZER_NAME, response).await
    }

    async fn probe(&self) -> bool {
        self.endpoint.probe().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> ImageAnalyzerClient {
        ImageAnalyzerClient::new(
            "http://127.0.0.1:1",
            Duration::from_millis(200),
            Duration::from_millis(200),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_empty_image_is_failure() {
        let err = client()
            .analyze(&AnalyzerRequest::image("rpt-1", Vec::new()))
            .await
            .unwrap_err();
        assert!(matches!(err, AnalyzerError::Failed(_)));
    }

    #[tokio::test]
    async fn test_refused_connection_is_unavailable() {
        // Port 1 is never served in the test environment
        let err = client()
            .analyze(&AnalyzerRequest::image("rpt-1", vec![0xFF, 0xD8, 0xFF]))
            .await
            .unwrap_err();
        assert!(matches!(err, AnalyzerError::Unavailable(_)), "got {:?}", err);
    }
}
