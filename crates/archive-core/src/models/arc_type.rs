use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::constants;

use super::Scope;

/// The six narrative patterns the engine detects.
///
/// Declaration order is significant: it is the tie-break order when two arcs
/// share the same confidence.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS,
)]
#[ts(export)]
#[serde(rename_all = "kebab-case")]
pub enum ArcType {
    GameWinningRally,
    PlayerHighlightReel,
    SeasonJourney,
    ComebackStory,
    TechnicalExcellence,
    EmotionSpectrum,
}

impl ArcType {
    /// All arc types, in tie-break order.
    pub const ALL: [ArcType; 6] = [
        Self::GameWinningRally,
        Self::PlayerHighlightReel,
        Self::SeasonJourney,
        Self::ComebackStory,
        Self::TechnicalExcellence,
        Self::EmotionSpectrum,
    ];

    /// Wire name, also used in cache keys.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::GameWinningRally => "game-winning-rally",
            Self::PlayerHighlightReel => "player-highlight-reel",
            Self::SeasonJourney => "season-journey",
            Self::ComebackStory => "comeback-story",
            Self::TechnicalExcellence => "technical-excellence",
            Self::EmotionSpectrum => "emotion-spectrum",
        }
    }

    /// Human-readable title.
    pub fn display_name(self) -> &'static str {
        match self {
            Self::GameWinningRally => "Game-Winning Rally",
            Self::PlayerHighlightReel => "Player Highlight Reel",
            Self::SeasonJourney => "Season Journey",
            Self::ComebackStory => "Comeback Story",
            Self::TechnicalExcellence => "Technical Excellence",
            Self::EmotionSpectrum => "Emotion Spectrum",
        }
    }

    /// Minimum member count an arc of this type must reach.
    ///
    /// For Season Journey this counts distinct events, for Emotion Spectrum
    /// distinct emotions; for the rest it counts photos.
    pub fn min_count(self) -> usize {
        match self {
            Self::GameWinningRally => constants::RALLY_MIN_PHOTOS,
            Self::PlayerHighlightReel => constants::HIGHLIGHT_MIN_PHOTOS,
            Self::SeasonJourney => constants::SEASON_MIN_EVENTS,
            Self::ComebackStory => constants::COMEBACK_MIN_PHOTOS,
            Self::TechnicalExcellence => constants::TECHNICAL_MIN_PHOTOS,
            Self::EmotionSpectrum => constants::SPECTRUM_MIN_EMOTIONS,
        }
    }

    /// Whether this detector runs for the given scope.
    pub fn applies_to(self, scope: &Scope) -> bool {
        match scope {
            Scope::Event { .. } => matches!(
                self,
                Self::GameWinningRally
                    | Self::ComebackStory
                    | Self::EmotionSpectrum
                    | Self::TechnicalExcellence
            ),
            Scope::Athlete { .. } => self == Self::PlayerHighlightReel,
            Scope::Global | Scope::Season { .. } => {
                matches!(self, Self::SeasonJourney | Self::TechnicalExcellence)
            }
        }
    }

    /// The applicable subset for a scope, in tie-break order.
    pub fn for_scope(scope: &Scope) -> Vec<ArcType> {
        Self::ALL
            .into_iter()
            .filter(|t| t.applies_to(scope))
            .collect()
    }
}

impl fmt::Display for ArcType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ArcType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|t| t.as_str() == s.trim())
            .ok_or_else(|| format!("unknown arc type '{s}'"))
    }
}
