use serde::{Deserialize, Serialize};

use crate::models::ArcType;

use super::defaults;

/// Coefficients of one detector's confidence function.
///
/// `confidence = base + count_weight * min((count - min) / count_span, 1) + quality_weight * quality`,
/// clamped to `[0, 1]`. A TOML table overriding a detector must set all four fields.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoringWeights {
    pub base: f64,
    pub count_weight: f64,
    pub quality_weight: f64,
    /// Members beyond the minimum at which the count term saturates.
    pub count_span: usize,
}

impl ScoringWeights {
    pub const fn from_tuple(t: (f64, f64, f64, usize)) -> Self {
        Self {
            base: t.0,
            count_weight: t.1,
            quality_weight: t.2,
            count_span: t.3,
        }
    }

    /// Highest confidence these weights can produce.
    pub fn ceiling(&self) -> f64 {
        (self.base + self.count_weight + self.quality_weight).clamp(0.0, 1.0)
    }
}

/// Per-detector confidence coefficients.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
    pub game_winning_rally: ScoringWeights,
    pub player_highlight_reel: ScoringWeights,
    pub season_journey: ScoringWeights,
    pub comeback_story: ScoringWeights,
    pub technical_excellence: ScoringWeights,
    pub emotion_spectrum: ScoringWeights,
}

impl ScoringConfig {
    pub fn weights(&self, arc_type: ArcType) -> &ScoringWeights {
        match arc_type {
            ArcType::GameWinningRally => &self.game_winning_rally,
            ArcType::PlayerHighlightReel => &self.player_highlight_reel,
            ArcType::SeasonJourney => &self.season_journey,
            ArcType::ComebackStory => &self.comeback_story,
            ArcType::TechnicalExcellence => &self.technical_excellence,
            ArcType::EmotionSpectrum => &self.emotion_spectrum,
        }
    }
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            game_winning_rally: ScoringWeights::from_tuple(defaults::DEFAULT_RALLY_WEIGHTS),
            player_highlight_reel: ScoringWeights::from_tuple(defaults::DEFAULT_HIGHLIGHT_WEIGHTS),
            season_journey: ScoringWeights::from_tuple(defaults::DEFAULT_SEASON_WEIGHTS),
            comeback_story: ScoringWeights::from_tuple(defaults::DEFAULT_COMEBACK_WEIGHTS),
            technical_excellence: ScoringWeights::from_tuple(defaults::DEFAULT_TECHNICAL_WEIGHTS),
            emotion_spectrum: ScoringWeights::from_tuple(defaults::DEFAULT_SPECTRUM_WEIGHTS),
        }
    }
}
