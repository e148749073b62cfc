// Fusion Engine - Weighted Signal Fusion and Decision
//
// applied_weight(m) = base(m) / Σ base(m') over present modalities (metadata always present)
// fusion_score = Σ applied_weight(m) * score(m), rounded to 12 decimals before thresholding

use super::aggregator::aggregate_metadata;
use super::weights::{ConfigError, FusionConfig};
use crate::types::{clamp_unit, Confidence, FusionInput, FusionResult, Modality};
use std::collections::BTreeMap;
use tracing::{debug, info};

/// Fused scores are rounded to this many units per 1.0 so renormalization
/// drift (0.6999999999999998) cannot flip a threshold decision
const SCORE_PRECISION: f64 = 1e12;

/// Combines per-modality signals into a decision
///
/// Holds only immutable configuration: one engine can be shared across
/// concurrent decisions without locking.
#[derive(Debug, Clone, Default)]
pub struct FusionEngine {
    config: FusionConfig,
}

impl FusionEngine {
    /// Create an engine after validating its configuration
    pub fn new(config: FusionConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &FusionConfig {
        &self.config
    }

    /// Weights applied for a given presence pattern
    ///
    /// Absent modalities get no entry; the returned weights sum to 1.0.
    pub fn applied_weights(&self, text_present: bool, image_present: bool) -> BTreeMap<Modality, f64> {
        let weights = &self.config.weights;

        let participating: Vec<Modality> = [
            (Modality::Text, text_present),
            (Modality::Image, image_present),
            (Modality::Metadata, true),
        ]
        .into_iter()
        .filter_map(|(modality, present)| present.then_some(modality))
        .collect();

        let total: f64 = participating.iter().map(|m| weights.base(*m)).sum();

        participating
            .into_iter()
            .map(|m| (m, weights.base(m) / total))
            .collect()
    }

    /// Fuse all signals of one report into a decision
    ///
    /// Never fails: missing text/image signals degrade the decision instead.
    pub fn fuse(&self, input: &FusionInput) -> FusionResult {
        let text_score = input.text().score();
        let image_score = input.image().score();
        let metadata_score = aggregate_metadata(input.metadata());

        let contributing_weights = self.applied_weights(text_score.is_some(), image_score.is_some());

        let weighted_sum: f64 = contributing_weights
            .iter()
            .map(|(modality, weight)| {
                let score = match modality {
                    Modality::Text => text_score.unwrap_or_default(),
                    Modality::Image => image_score.unwrap_or_default(),
                    Modality::Metadata => metadata_score,
                };
                weight * score
            })
            .sum();
        let fusion_score: Confidence =
            clamp_unit((weighted_sum * SCORE_PRECISION).round() / SCORE_PRECISION);

        let degraded = text_score.is_none() || image_score.is_none();
        let thresholds = &self.config.thresholds;
        let priority = thresholds.priority_for(fusion_score);
        let should_verify = thresholds.requires_verification(fusion_score);

        if degraded {
            info!(
                report_id = input.report_id(),
                text_present = text_score.is_some(),
                image_present = image_score.is_some(),
                fusion_score,
                %priority,
                "Degraded decision (weights renormalized)"
            );
        } else {
            debug!(
                report_id = input.report_id(),
                fusion_score,
                %priority,
                should_verify,
                "Decision produced"
            );
        }

        FusionResult {
            report_id: input.report_id().to_string(),
            fusion_score,
            priority,
            should_verify,
            degraded,
            contributing_weights,
            metadata_score,
        }
    }
}
