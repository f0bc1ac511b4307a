//! Confidence scoring: a clamped linear blend of member count and quality.
//!
//! `confidence = base + count_weight * min((count - min) / count_span, 1) + quality_weight * quality`

use archive_core::config::{ScoringConfig, ScoringWeights};
use archive_core::models::ArcType;

use crate::detectors::CandidateArc;

/// The two terms of a confidence score before clamping.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoreBreakdown {
    /// Count term in `[0, 1]`, before weighting.
    pub count_factor: f64,
    /// Quality term in `[0, 1]`, before weighting.
    pub quality_factor: f64,
    /// Final confidence in `[0, 1]`.
    pub confidence: f64,
}

/// Assigns a confidence in `[0, 1]` to candidate arcs.
///
/// Non-decreasing in both member count and quality for non-negative weights.
#[derive(Debug, Clone, Default)]
pub struct ConfidenceScorer {
    config: ScoringConfig,
}

impl ConfidenceScorer {
    pub fn new(config: ScoringConfig) -> Self {
        Self { config }
    }

    pub fn score_candidate(&self, candidate: &CandidateArc) -> f64 {
        self.score(candidate.arc_type, candidate.count, candidate.quality)
    }

    pub fn score(&self, arc_type: ArcType, count: usize, quality: f64) -> f64 {
        self.breakdown(arc_type, count, quality).confidence
    }

    pub fn breakdown(&self, arc_type: ArcType, count: usize, quality: f64) -> ScoreBreakdown {
        let weights = self.config.weights(arc_type);
        let count_factor = count_factor(weights, count.saturating_sub(arc_type.min_count()));
        let quality_factor = if quality.is_finite() {
            quality.clamp(0.0, 1.0)
        } else {
            0.0
        };
        let raw = weights.base
            + weights.count_weight * count_factor
            + weights.quality_weight * quality_factor;
        ScoreBreakdown {
            count_factor,
            quality_factor,
            confidence: raw.clamp(0.0, 1.0),
        }
    }
}

fn count_factor(weights: &ScoringWeights, surplus: usize) -> f64 {
    if weights.count_span == 0 {
        return 1.0;
    }
    (surplus as f64 / weights.count_span as f64).min(1.0)
}
