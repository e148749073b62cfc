// Fusion Module - Signal Fusion and Decision Core
//
// Metadata aggregation → weighted fusion of text/image/metadata → priority + verification decision.
// Missing text or image signals are tolerated by renormalizing the remaining weights.

pub mod aggregator;
pub mod engine;
pub mod weights;

pub use aggregator::{aggregate_metadata, NEUTRAL_METADATA_SCORE};
pub use engine::FusionEngine;
pub use weights::{ConfigError, DecisionThresholds, FusionConfig, FusionWeights};
