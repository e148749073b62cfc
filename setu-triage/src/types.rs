//! Core Types for Report Triage
//!
//! Defines the data model shared by the triage layers:
//! - **Signals:** per-modality analyzer output (`ModalitySignal`)
//! - **Inputs:** caller metadata (`MetadataFeatures`) and the fused input (`FusionInput`)
//! - **Decisions:** the immutable decision artifact (`FusionResult`)
//! - **Errors:** analyzer failures (absorbed) and validation failures (propagated)

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// Confidence score (0.0-1.0)
pub type Confidence = f64;

/// Clamp a score into 0.0-1.0 (NaN maps to 0.0)
pub fn clamp_unit(value: f64) -> Confidence {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}

// ============================================================================
// Modalities and Flags
// ============================================================================

/// One independent channel of evidence about a report
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Modality {
    Text,
    Image,
    Metadata,
}

impl Modality {
    pub fn as_str(&self) -> &'static str {
        match self {
            Modality::Text => "text",
            Modality::Image => "image",
            Modality::Metadata => "metadata",
        }
    }
}

impl fmt::Display for Modality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Auxiliary boolean fact reported by an analyzer
///
/// Known wire strings map to named variants; anything else is kept verbatim.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum SignalFlag {
    Duplicate,
    Tampered,
    KeywordFlagged,
    Urgent,
    Other(String),
}

impl SignalFlag {
    pub fn as_str(&self) -> &str {
        match self {
            SignalFlag::Duplicate => "duplicate",
            SignalFlag::Tampered => "tampered",
            SignalFlag::KeywordFlagged => "keyword_flagged",
            SignalFlag::Urgent => "urgent",
            SignalFlag::Other(name) => name,
        }
    }
}

impl From<&str> for SignalFlag {
    fn from(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "duplicate" | "is_duplicate" => SignalFlag::Duplicate,
            "tampered" | "is_tampered" => SignalFlag::Tampered,
            "keyword_flagged" => SignalFlag::KeywordFlagged,
            "urgent" => SignalFlag::Urgent,
            other => SignalFlag::Other(other.to_string()),
        }
    }
}

impl From<String> for SignalFlag {
    fn from(value: String) -> Self {
        SignalFlag::from(value.as_str())
    }
}

impl From<SignalFlag> for String {
    fn from(flag: SignalFlag) -> Self {
        flag.as_str().to_string()
    }
}

impl fmt::Display for SignalFlag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Modality Signal
// ============================================================================

/// Why a modality signal is missing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AbsenceReason {
    /// No analyzer configured, or no input for this modality (e.g. no photo)
    NotRequested,
    /// Analyzer could not be reached
    Unavailable,
    /// Analyzer did not answer within its budget
    Timeout,
    /// Analyzer answered with a failure
    Failed,
    /// Caller abandoned the decision before the analyzer answered
    Cancelled,
}

impl From<&AnalyzerError> for AbsenceReason {
    fn from(err: &AnalyzerError) -> Self {
        match err {
            AnalyzerError::Unavailable(_) => AbsenceReason::Unavailable,
            AnalyzerError::Timeout(_) => AbsenceReason::Timeout,
            AnalyzerError::Failed(_) => AbsenceReason::Failed,
        }
    }
}

/// One analyzer's output for one report
///
/// The signal is present iff `score()` is `Some`; a present score is always
/// within 0.0-1.0. Absent signals carry no flags or label.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModalitySignal {
    score: Option<Confidence>,
    label: Option<String>,
    flags: BTreeSet<SignalFlag>,
    absence: Option<AbsenceReason>,
}

impl ModalitySignal {
    /// Present signal with the score clamped to 0.0-1.0
    ///
    /// A non-finite score carries no evidence and yields an absent signal
    /// marked [`AbsenceReason::Failed`].
    pub fn present(score: Confidence) -> Self {
        if !score.is_finite() {
            return Self::absent(AbsenceReason::Failed);
        }
        Self {
            score: Some(clamp_unit(score)),
            label: None,
            flags: BTreeSet::new(),
            absence: None,
        }
    }

    /// Absent signal with the reason it is missing
    pub fn absent(reason: AbsenceReason) -> Self {
        Self {
            score: None,
            label: None,
            flags: BTreeSet::new(),
            absence: Some(reason),
        }
    }

    /// Attach a classification label (ignored on absent signals)
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        if self.is_present() {
            self.label = Some(label.into());
        }
        self
    }

    /// Attach flags (ignored on absent signals)
    pub fn with_flags<I>(mut self, flags: I) -> Self
    where
        I: IntoIterator<Item = SignalFlag>,
    {
        if self.is_present() {
            self.flags.extend(flags);
        }
        self
    }

    pub fn is_present(&self) -> bool {
        self.score.is_some()
    }

    pub fn score(&self) -> Option<Confidence> {
        self.score
    }

    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    pub fn flags(&self) -> &BTreeSet<SignalFlag> {
        &self.flags
    }

    pub fn has_flag(&self, flag: &SignalFlag) -> bool {
        self.flags.contains(flag)
    }

    pub fn absence(&self) -> Option<AbsenceReason> {
        self.absence
    }
}

// ============================================================================
// Metadata Features
// ============================================================================

/// Caller-supplied numeric metadata features (arbitrary cardinality, may be empty)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MetadataFeatures(BTreeMap<String, f64>);

impl MetadataFeatures {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from a JSON object
    ///
    /// Accepts numbers, booleans (true = 1.0) and strings holding a finite
    /// number. Anything else is rejected, naming the offending key.
    pub fn from_json_map(map: &Map<String, Value>) -> Result<Self, ValidationError> {
        let mut features = BTreeMap::new();

        for (key, value) in map {
            let number = match value {
                Value::Number(n) => n.as_f64(),
                Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
                Value::String(s) => s.trim().parse::<f64>().ok(),
                _ => None,
            };

            match number {
                Some(n) if n.is_finite() => {
                    features.insert(key.clone(), n);
                }
                _ => {
                    return Err(ValidationError::NonNumericFeature { key: key.clone() });
                }
            }
        }

        Ok(Self(features))
    }

    pub fn insert(&mut self, key: impl Into<String>, value: f64) -> Option<f64> {
        self.0.insert(key.into(), value)
    }

    pub fn get(&self, key: &str) -> Option<f64> {
        self.0.get(key).copied()
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn values(&self) -> impl Iterator<Item = f64> + '_ {
        self.0.values().copied()
    }
}

impl<K: Into<String>> FromIterator<(K, f64)> for MetadataFeatures {
    fn from_iter<I: IntoIterator<Item = (K, f64)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }
}

// ============================================================================
// Fusion Input / Result
// ============================================================================

/// All signals for one report, consumed once by the fusion engine
#[derive(Debug, Clone, PartialEq)]
pub struct FusionInput {
    report_id: String,
    text: ModalitySignal,
    image: ModalitySignal,
    metadata: MetadataFeatures,
}

impl FusionInput {
    /// Build a fusion input; the report id must be non-blank
    pub fn new(
        report_id: impl Into<String>,
        text: ModalitySignal,
        image: ModalitySignal,
        metadata: MetadataFeatures,
    ) -> Result<Self, ValidationError> {
        let report_id = report_id.into();
        if report_id.trim().is_empty() {
            return Err(ValidationError::MissingReportId);
        }

        Ok(Self {
            report_id,
            text,
            image,
            metadata,
        })
    }

    pub fn report_id(&self) -> &str {
        &self.report_id
    }

    pub fn text(&self) -> &ModalitySignal {
        &self.text
    }

    pub fn image(&self) -> &ModalitySignal {
        &self.image
    }

    pub fn metadata(&self) -> &MetadataFeatures {
        &self.metadata
    }
}

/// Coarse routing bucket derived from the fusion score
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    High,
    Medium,
    Low,
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Priority::High => write!(f, "high"),
            Priority::Medium => write!(f, "medium"),
            Priority::Low => write!(f, "low"),
        }
    }
}

/// Decision artifact produced by the fusion engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FusionResult {
    /// Correlation id of the report (not used by the decision)
    pub report_id: String,
    /// Combined confidence (0.0-1.0)
    pub fusion_score: Confidence,
    /// Routing tier
    pub priority: Priority,
    /// True when a human must review before action
    pub should_verify: bool,
    /// True when text or image was missing and weights were renormalized
    pub degraded: bool,
    /// Weights actually applied, per participating modality (sum to 1.0)
    pub contributing_weights: BTreeMap<Modality, f64>,
    /// Aggregated metadata signal used in the fusion
    pub metadata_score: Confidence,
}

// ============================================================================
// Errors
// ============================================================================

/// Analyzer failure kinds
///
/// None of these is fatal: the resilience wrapper turns each into an absent signal.
#[derive(Debug, Error)]
pub enum AnalyzerError {
    /// Analyzer could not be reached at all (e.g. connection refused)
    #[error("Analyzer unavailable: {0}")]
    Unavailable(String),

    /// Analyzer did not respond within the bound
    #[error("Analyzer timed out after {0:?}")]
    Timeout(Duration),

    /// Analyzer responded but signaled a failure
    #[error("Analyzer failed: {0}")]
    Failed(String),
}

/// Malformed input; the only error class surfaced to fusion callers
#[derive(Debug, Error, PartialEq)]
pub enum ValidationError {
    #[error("report_id is required")]
    MissingReportId,

    #[error("metadata feature '{key}' is not numeric")]
    NonNumericFeature { key: String },

    #[error("{modality} score {value} is outside 0.0-1.0")]
    ScoreOutOfRange { modality: Modality, value: f64 },

    #[error("image_base64 is not valid base64")]
    InvalidImageEncoding,

    #[error("message is required")]
    EmptyMessage,
}

// ============================================================================
// Tests
// ============================================================================
