//! Fusion endpoint
//!
//! `POST /analyze/fusion` combines scores the caller already has. A null or
//! omitted score means that modality is absent.

use axum::{extract::rejection::JsonRejection, extract::State, routing::post, Json, Router};
use serde::Deserialize;
use serde_json::{Map, Value};

use super::DecisionResponse;
use crate::types::{
    AbsenceReason, FusionInput, MetadataFeatures, Modality, ModalitySignal, ValidationError,
};
use crate::{error::ApiResult, AppState};

/// POST /analyze/fusion request
#[derive(Debug, Deserialize)]
pub struct FusionRequest {
    #[serde(default)]
    pub report_id: String,
    #[serde(default)]
    pub text_score: Option<f64>,
    #[serde(default)]
    pub image_score: Option<f64>,
    #[serde(default)]
    pub metadata_features: Option<Map<String, Value>>,
}

impl FusionRequest {
    /// Validate and convert into a fusion input
    pub fn into_input(self) -> Result<FusionInput, ValidationError> {
        let text = score_signal(Modality::Text, self.text_score)?;
        let image = score_signal(Modality::Image, self.image_score)?;
        let metadata = match &self.metadata_features {
            Some(map) => MetadataFeatures::from_json_map(map)?,
            None => MetadataFeatures::new(),
        };

        FusionInput::new(self.report_id, text, image, metadata)
    }
}

fn score_signal(modality: Modality, score: Option<f64>) -> Result<ModalitySignal, ValidationError> {
    match score {
        None => Ok(ModalitySignal::absent(AbsenceReason::NotRequested)),
        Some(value) if value.is_finite() && (0.0..=1.0).contains(&value) => {
            Ok(ModalitySignal::present(value))
        }
        Some(value) => Err(ValidationError::ScoreOutOfRange { modality, value }),
    }
}

/// POST /analyze/fusion
pub async fn analyze_fusion(
    State(state): State<AppState>,
    payload: Result<Json<FusionRequest>, JsonRejection>,
) -> ApiResult<Json<DecisionResponse>> {
    let Json(request) = payload?;
    let input = request.into_input()?;

    let result = state.pipeline.engine().fuse(&input);

    Ok(Json(DecisionResponse::from(result)))
}

/// Build fusion routes
pub fn fusion_routes() -> Router<AppState> {
    Router::new().route("/analyze/fusion", post(analyze_fusion))
}
