// Fusion Configuration - Base Weights and Decision Thresholds
//
// Immutable configuration injected into the fusion engine at construction.
// Loaded from the `[fusion]` TOML section; compiled defaults apply per field.

use crate::types::{Confidence, Modality, Priority};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Tolerance for the weight sum check
const WEIGHT_SUM_TOLERANCE: f64 = 1e-9;

/// Invalid fusion configuration
#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("{modality} weight {value} must be finite and non-negative")]
    InvalidWeight { modality: Modality, value: f64 },

    #[error("metadata weight must be positive (metadata always participates)")]
    ZeroMetadataWeight,

    #[error("weights sum to {0}, expected 1.0")]
    WeightSum(f64),

    #[error("threshold {name} = {value} must be within 0.0-1.0")]
    InvalidThreshold { name: &'static str, value: f64 },

    #[error("medium_priority ({medium}) must be below high_priority ({high})")]
    ThresholdOrder { medium: f64, high: f64 },
}

/// Base weight per modality (must sum to 1.0)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FusionWeights {
    pub text: f64,
    pub image: f64,
    pub metadata: f64,
}

impl Default for FusionWeights {
    /// Visual evidence weighted most heavily, metadata least
    fn default() -> Self {
        Self {
            text: 0.35,
            image: 0.45,
            metadata: 0.20,
        }
    }
}

impl FusionWeights {
    pub fn base(&self, modality: Modality) -> f64 {
        match modality {
            Modality::Text => self.text,
            Modality::Image => self.image,
            Modality::Metadata => self.metadata,
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        for modality in [Modality::Text, Modality::Image, Modality::Metadata] {
            let value = self.base(modality);
            if !value.is_finite() || value < 0.0 {
                return Err(ConfigError::InvalidWeight { modality, value });
            }
        }

        if self.metadata <= 0.0 {
            return Err(ConfigError::ZeroMetadataWeight);
        }

        let sum = self.text + self.image + self.metadata;
        if (sum - 1.0).abs() > WEIGHT_SUM_TOLERANCE {
            return Err(ConfigError::WeightSum(sum));
        }

        Ok(())
    }
}

/// Score thresholds for routing decisions
///
/// Priority is `high` above `high_priority`, `medium` above `medium_priority`
/// (inclusive of `high_priority`), `low` otherwise. Verification is required
/// strictly below `verify_below`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DecisionThresholds {
    pub high_priority: Confidence,
    pub medium_priority: Confidence,
    pub verify_below: Confidence,
}

impl Default for DecisionThresholds {
    fn default() -> Self {
        Self {
            high_priority: 0.8,
            medium_priority: 0.6,
            verify_below: 0.7,
        }
    }
}

impl DecisionThresholds {
    pub fn priority_for(&self, score: Confidence) -> Priority {
        if score > self.high_priority {
            Priority::High
        } else if score > self.medium_priority {
            Priority::Medium
        } else {
            Priority::Low
        }
    }

    pub fn requires_verification(&self, score: Confidence) -> bool {
        score < self.verify_below
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        for (name, value) in [
            ("high_priority", self.high_priority),
            ("medium_priority", self.medium_priority),
            ("verify_below", self.verify_below),
        ] {
            if !value.is_finite() || !(0.0..=1.0).contains(&value) {
                return Err(ConfigError::InvalidThreshold { name, value });
            }
        }

        if self.medium_priority >= self.high_priority {
            return Err(ConfigError::ThresholdOrder {
                medium: self.medium_priority,
                high: self.high_priority,
            });
        }

        Ok(())
    }
}

/// Complete fusion configuration
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FusionConfig {
    pub weights: FusionWeights,
    pub thresholds: DecisionThresholds,
}

impl FusionConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.weights.validate()?;
        self.thresholds.validate()
    }
}
