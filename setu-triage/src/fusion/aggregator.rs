// Feature Aggregator - Metadata Reduction
//
// Reduces an arbitrary caller-defined feature map to a single 0.0-1.0 signal.
// Every value is clamped before averaging so one outlier cannot dominate the mean.

use crate::types::{clamp_unit, Confidence, MetadataFeatures};
use tracing::trace;

/// Score used when no metadata features were supplied
pub const NEUTRAL_METADATA_SCORE: Confidence = 0.5;

/// Aggregate metadata features into a single score
///
/// # Returns
/// * `NEUTRAL_METADATA_SCORE` for an empty map
/// * Otherwise the mean of the per-value clamped features
pub fn aggregate_metadata(features: &MetadataFeatures) -> Confidence {
    if features.is_empty() {
        return NEUTRAL_METADATA_SCORE;
    }

    let sum: f64 = features.values().map(clamp_unit).sum();
    let mean = sum / features.len() as f64;

    trace!(features = features.len(), mean, "Metadata aggregated");

    clamp_unit(mean)
}
