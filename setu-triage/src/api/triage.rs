//! Triage endpoint
//!
//! `POST /triage` runs the configured analyzers on the raw report and fuses
//! their signals. The decision is produced even when analyzers fail.

use axum::{extract::rejection::JsonRejection, extract::State, routing::post, Json, Router};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::DecisionResponse;
use crate::pipeline::{decode_image_base64, TriageRequest};
use crate::types::{AbsenceReason, MetadataFeatures, ModalitySignal, SignalFlag, ValidationError};
use crate::{error::ApiResult, AppState};

/// POST /triage request
#[derive(Debug, Deserialize)]
pub struct TriageHttpRequest {
    #[serde(default)]
    pub report_id: String,
    #[serde(default)]
    pub text: Option<String>,
    /// Photo bytes, standard base64
    #[serde(default)]
    pub image_base64: Option<String>,
    #[serde(default)]
    pub metadata_features: Option<Map<String, Value>>,
}

impl TriageHttpRequest {
    pub fn into_request(self) -> Result<TriageRequest, ValidationError> {
        if self.report_id.trim().is_empty() {
            return Err(ValidationError::MissingReportId);
        }

        let metadata = match &self.metadata_features {
            Some(map) => MetadataFeatures::from_json_map(map)?,
            None => MetadataFeatures::new(),
        };

        let image = self
            .image_base64
            .as_deref()
            .filter(|encoded| !encoded.trim().is_empty())
            .map(decode_image_base64)
            .transpose()?;

        Ok(TriageRequest {
            report_id: self.report_id,
            text: self.text,
            image,
            metadata,
        })
    }
}

/// Per-modality signal summary
#[derive(Debug, Clone, Serialize)]
pub struct SignalSummary {
    pub present: bool,
    pub score: Option<f64>,
    pub label: Option<String>,
    pub flags: Vec<SignalFlag>,
    pub absence: Option<AbsenceReason>,
}

impl From<&ModalitySignal> for SignalSummary {
    fn from(signal: &ModalitySignal) -> Self {
        Self {
            present: signal.is_present(),
            score: signal.score(),
            label: signal.label().map(str::to_string),
            flags: signal.flags().iter().cloned().collect(),
            absence: signal.absence(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SignalsResponse {
    pub text: SignalSummary,
    pub image: SignalSummary,
}

/// POST /triage response
#[derive(Debug, Clone, Serialize)]
pub struct TriageResponse {
    #[serde(flatten)]
    pub decision: DecisionResponse,
    pub signals: SignalsResponse,
}

/// POST /triage
pub async fn triage_report(
    State(state): State<AppState>,
    payload: Result<Json<TriageHttpRequest>, JsonRejection>,
) -> ApiResult<Json<TriageResponse>> {
    let Json(request) = payload?;
    let request = request.into_request()?;

    tracing::debug!(
        report_id = %request.report_id,
        has_text = request.text.is_some(),
        has_image = request.image.is_some(),
        "Triage request"
    );

    let cancel = state.shutdown.child_token();
    let outcome = state.pipeline.triage(request, &cancel).await?;

    Ok(Json(TriageResponse {
        signals: SignalsResponse {
            text: SignalSummary::from(&outcome.text),
            image: SignalSummary::from(&outcome.image),
        },
        decision: DecisionResponse::from(outcome.result),
    }))
}

/// Build triage routes
pub fn triage_routes() -> Router<AppState> {
    Router::new().route("/triage", post(triage_report))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn request(value: Value) -> TriageHttpRequest {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_image_decoded() {
        let converted = request(json!({"report_id": "r1", "image_base64": "AAEC"}))
            .into_request()
            .unwrap();
        assert_eq!(converted.image, Some(vec![0, 1, 2]));
    }

    #[test]
    fn test_blank_image_treated_as_missing() {
        let converted = request(json!({"report_id": "r1", "image_base64": ""}))
            .into_request()
            .unwrap();
        assert_eq!(converted.image, None);
    }

    #[test]
    fn test_invalid_image_rejected() {
        let err = request(json!({"report_id": "r1", "image_base64": "@@@"}))
            .into_request()
            .unwrap_err();
        assert_eq!(err, ValidationError::InvalidImageEncoding);
    }

    #[test]
    fn test_absent_signal_summary() {
        let summary = SignalSummary::from(&ModalitySignal::absent(AbsenceReason::Timeout));
        let value = serde_json::to_value(summary).unwrap();
        assert_eq!(value["present"], json!(false));
        assert_eq!(value["absence"], json!("timeout"));
        assert_eq!(value["score"], Value::Null);
    }
}
