//! Triage Pipeline
//!
//! One decision cycle for one report: validate, run the text and image
//! analyzers concurrently through their resilience wrappers, derive the
//! metadata features, fuse.

use crate::analyzers::AnalyzerRequest;
use crate::fusion::FusionEngine;
use crate::resilience::{invoke_optional, ResilientAnalyzer};
use crate::types::{FusionInput, FusionResult, MetadataFeatures, ModalitySignal, ValidationError};
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Metadata key derived from whether the report carried an image
pub const HAS_MEDIA_FEATURE: &str = "has_media";

/// Raw inputs of one report
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TriageRequest {
    pub report_id: String,
    pub text: Option<String>,
    pub image: Option<Vec<u8>>,
    pub metadata: MetadataFeatures,
}

impl TriageRequest {
    pub fn new(report_id: impl Into<String>) -> Self {
        Self {
            report_id: report_id.into(),
            ..Default::default()
        }
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    pub fn with_image(mut self, bytes: Vec<u8>) -> Self {
        self.image = Some(bytes);
        self
    }

    pub fn with_metadata(mut self, metadata: MetadataFeatures) -> Self {
        self.metadata = metadata;
        self
    }
}

/// Decision plus the signals it was made from
#[derive(Debug, Clone, PartialEq)]
pub struct TriageOutcome {
    pub result: FusionResult,
    pub text: ModalitySignal,
    pub image: ModalitySignal,
}

/// Decode a base64 image payload (standard alphabet, surrounding whitespace ignored)
pub fn decode_image_base64(encoded: &str) -> Result<Vec<u8>, ValidationError> {
    STANDARD
        .decode(encoded.trim())
        .map_err(|_| ValidationError::InvalidImageEncoding)
}

/// Analyzer orchestration in front of the fusion engine
///
/// Analyzers are optional: an unconfigured analyzer leaves its modality
/// absent (`not_requested`) on every decision.
#[derive(Clone)]
pub struct TriagePipeline {
    engine: Arc<FusionEngine>,
    text: Option<ResilientAnalyzer>,
    image: Option<ResilientAnalyzer>,
}

impl TriagePipeline {
    pub fn new(engine: Arc<FusionEngine>) -> Self {
        Self {
            engine,
            text: None,
            image: None,
        }
    }

    pub fn with_text_analyzer(mut self, analyzer: ResilientAnalyzer) -> Self {
        self.text = Some(analyzer);
        self
    }

    pub fn with_image_analyzer(mut self, analyzer: ResilientAnalyzer) -> Self {
        self.image = Some(analyzer);
        self
    }

    pub fn engine(&self) -> &FusionEngine {
        &self.engine
    }

    pub fn text_analyzer(&self) -> Option<&ResilientAnalyzer> {
        self.text.as_ref()
    }

    pub fn image_analyzer(&self) -> Option<&ResilientAnalyzer> {
        self.image.as_ref()
    }

    /// Run one decision cycle
    ///
    /// Only a malformed request fails; analyzer trouble degrades the decision.
    /// Cancelling the token marks still-pending analyzers absent and the
    /// decision is produced from what remains.
    pub async fn triage(
        &self,
        request: TriageRequest,
        cancel: &CancellationToken,
    ) -> Result<TriageOutcome, ValidationError> {
        let TriageRequest {
            report_id,
            text,
            image,
            mut metadata,
        } = request;

        if report_id.trim().is_empty() {
            return Err(ValidationError::MissingReportId);
        }

        let has_media = image.as_ref().is_some_and(|bytes| !bytes.is_empty());

        let text_request = text
            .filter(|t| !t.trim().is_empty())
            .map(|t| AnalyzerRequest::text(report_id.clone(), t));
        let image_request = image
            .filter(|bytes| !bytes.is_empty())
            .map(|bytes| AnalyzerRequest::image(report_id.clone(), bytes));

        let (text_signal, image_signal) = tokio::join!(
            invoke_optional(self.text.as_ref(), text_request, cancel),
            invoke_optional(self.image.as_ref(), image_request, cancel),
        );

        if !metadata.contains_key(HAS_MEDIA_FEATURE) {
            metadata.insert(HAS_MEDIA_FEATURE, if has_media { 1.0 } else { 0.0 });
        }

        debug!(
            report_id = %report_id,
            text_present = text_signal.is_present(),
            image_present = image_signal.is_present(),
            features = metadata.len(),
            "Signals collected"
        );

        let input = FusionInput::new(report_id, text_signal.clone(), image_signal.clone(), metadata)?;
        let result = self.engine.fuse(&input);

        Ok(TriageOutcome {
            result,
            text: text_signal,
            image: image_signal,
        })
    }
}
