//! # Quality Scorer
//!
//! Advisory confidence in `[0, 1]` for an extraction. Two signals are
//! blended as a weighted average:
//!
//! - length: word count relative to a saturation point
//! - completeness: share of the strategy's expected fields that were found
//!
//! Site-specific extractions get a flat bonus. The score never gates output.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::extractor::{ExpectedField, RawExtraction, Strategy};

/// Tunable weights for [`QualityScorer`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoreWeights {
    /// Weight of the length signal
    pub length: f64,

    /// Weight of the completeness signal
    pub completeness: f64,

    /// Added when a site-specific strategy produced the extraction
    pub site_specific_bonus: f64,

    /// Word count at which the length signal saturates
    pub length_saturation_words: f64,
}

impl Default for ScoreWeights {
    fn default() -> Self {
        Self {
            length: 0.5,
            completeness: 0.5,
            site_specific_bonus: 0.1,
            length_saturation_words: 300.0,
        }
    }
}

impl ScoreWeights {
    /// Reject negative or non-finite weights
    pub fn validate(&self) -> Result<()> {
        let named = [
            ("length", self.length),
            ("completeness", self.completeness),
            ("site_specific_bonus", self.site_specific_bonus),
            ("length_saturation_words", self.length_saturation_words),
        ];
        for (name, value) in named {
            if !value.is_finite() || value < 0.0 {
                return Err(Error::Config(format!(
                    "scoring.{} must be a non-negative number, got {}",
                    name, value
                )));
            }
        }
        Ok(())
    }
}

/// Inputs to the quality score
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QualitySignals {
    /// Words in the normalized text
    pub word_count: usize,

    /// Fields the strategy expects
    pub expected_fields: usize,

    /// Expected fields that were actually found
    pub present_fields: usize,

    /// Whether a site-specific strategy produced the extraction
    pub site_specific: bool,
}

impl QualitySignals {
    /// Signals for an extraction made by `strategy`
    pub fn new(strategy: Strategy, raw: &RawExtraction, word_count: usize) -> Self {
        let expected = strategy.expected_fields();
        let present = expected
            .iter()
            .filter(|field| is_present(**field, raw, word_count))
            .count();
        Self {
            word_count,
            expected_fields: expected.len(),
            present_fields: present,
            site_specific: !strategy.is_generic(),
        }
    }
}

fn is_present(field: ExpectedField, raw: &RawExtraction, word_count: usize) -> bool {
    let filled = |value: &Option<String>| value.as_deref().is_some_and(|v| !v.trim().is_empty());
    match field {
        ExpectedField::Title => !raw.title.trim().is_empty(),
        ExpectedField::Body => word_count > 0,
        ExpectedField::Author => filled(&raw.author),
        ExpectedField::PublishDate => filled(&raw.publish_date),
    }
}

/// Computes the advisory confidence score
#[derive(Debug, Clone, Default)]
pub struct QualityScorer {
    weights: ScoreWeights,
}

impl QualityScorer {
    pub fn new(weights: ScoreWeights) -> Self {
        Self { weights }
    }

    /// Confidence in `[0, 1]`; degenerate weights score 0
    pub fn score(&self, signals: &QualitySignals) -> f64 {
        let weights = &self.weights;
        let total = weights.length + weights.completeness;
        if !(total > 0.0) || !(weights.length_saturation_words > 0.0) {
            return 0.0;
        }

        let length = (signals.word_count as f64 / weights.length_saturation_words).min(1.0);
        let completeness = if signals.expected_fields == 0 {
            0.0
        } else {
            signals.present_fields as f64 / signals.expected_fields as f64
        };

        let mut score =
            (weights.length * length + weights.completeness * completeness) / total;
        if signals.site_specific {
            score += weights.site_specific_bonus;
        }
        if score.is_nan() {
            0.0
        } else {
            score.clamp(0.0, 1.0)
        }
    }
}
