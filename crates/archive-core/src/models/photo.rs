use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::constants::MAX_PHOTO_SCORE;
use crate::errors::{ArchiveError, ArchiveResult};

/// Volleyball play captured in a photo.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum PlayType {
    Attack,
    Block,
    Dig,
    Set,
    Serve,
    Celebration,
    Transition,
}

impl PlayType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Attack => "attack",
            Self::Block => "block",
            Self::Dig => "dig",
            Self::Set => "set",
            Self::Serve => "serve",
            Self::Celebration => "celebration",
            Self::Transition => "transition",
        }
    }
}

impl FromStr for PlayType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "attack" => Ok(Self::Attack),
            "block" => Ok(Self::Block),
            "dig" => Ok(Self::Dig),
            "set" => Ok(Self::Set),
            "serve" => Ok(Self::Serve),
            "celebration" => Ok(Self::Celebration),
            "transition" => Ok(Self::Transition),
            other => Err(format!("unknown play type '{other}'")),
        }
    }
}

/// Ordinal action intensity. Declaration order is the intensity order.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS,
)]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum ActionIntensity {
    Low,
    Medium,
    High,
    Peak,
}

impl ActionIntensity {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::Peak => "peak",
        }
    }
}

impl FromStr for ActionIntensity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "low" => Ok(Self::Low),
            "medium" => Ok(Self::Medium),
            "high" => Ok(Self::High),
            "peak" => Ok(Self::Peak),
            other => Err(format!("unknown action intensity '{other}'")),
        }
    }
}

/// Dominant emotion tagged on a photo.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS,
)]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum Emotion {
    Triumph,
    Determination,
    Intensity,
    Focus,
    Excitement,
    Serenity,
}

impl Emotion {
    /// All emotions, in declaration order.
    pub const ALL: [Emotion; 6] = [
        Self::Triumph,
        Self::Determination,
        Self::Intensity,
        Self::Focus,
        Self::Excitement,
        Self::Serenity,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Triumph => "triumph",
            Self::Determination => "determination",
            Self::Intensity => "intensity",
            Self::Focus => "focus",
            Self::Excitement => "excitement",
            Self::Serenity => "serenity",
        }
    }
}

impl FromStr for Emotion {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "triumph" => Ok(Self::Triumph),
            "determination" => Ok(Self::Determination),
            "intensity" => Ok(Self::Intensity),
            "focus" => Ok(Self::Focus),
            "excitement" => Ok(Self::Excitement),
            "serenity" => Ok(Self::Serenity),
            other => Err(format!("unknown emotion '{other}'")),
        }
    }
}

impl fmt::Display for Emotion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Phase of the game in which a photo was captured.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS,
)]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum TimeInGame {
    Early,
    Middle,
    Final,
    Overtime,
}

impl TimeInGame {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Early => "early",
            Self::Middle => "middle",
            Self::Final => "final",
            Self::Overtime => "overtime",
        }
    }
}

impl FromStr for TimeInGame {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "early" => Ok(Self::Early),
            "middle" => Ok(Self::Middle),
            "final" => Ok(Self::Final),
            "overtime" => Ok(Self::Overtime),
            other => Err(format!("unknown time in game '{other}'")),
        }
    }
}

/// An AI-tagged photograph. Read-only to the engine.
///
/// Produced by the enrichment pipeline and validated at the store boundary
/// (see [`RawPhotoRecord`](super::RawPhotoRecord)), so detectors can rely on
/// every score being finite and within `0..=10`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Photo {
    pub id: String,
    pub event_id: String,
    /// Absent for team and crowd shots.
    pub athlete_id: Option<String>,
    pub captured_at: DateTime<Utc>,
    pub play_type: Option<PlayType>,
    pub action_intensity: ActionIntensity,
    pub emotion: Emotion,
    pub sharpness: f64,
    pub composition_score: f64,
    pub emotional_impact: f64,
    pub time_in_game: Option<TimeInGame>,
}

impl Photo {
    /// `sharpness + composition_score`, used to rank technical quality.
    pub fn combined_score(&self) -> f64 {
        self.sharpness + self.composition_score
    }

    /// Check the invariants a typed photo must hold.
    pub fn validate(&self) -> ArchiveResult<()> {
        let invalid = |reason: String| ArchiveError::InvalidPhotoRecord {
            photo_id: self.id.clone(),
            reason,
        };

        if self.id.trim().is_empty() {
            return Err(invalid("empty id".to_string()));
        }
        if self.event_id.trim().is_empty() {
            return Err(invalid("empty eventId".to_string()));
        }
        for (field, value) in [
            ("sharpness", self.sharpness),
            ("compositionScore", self.composition_score),
            ("emotionalImpact", self.emotional_impact),
        ] {
            if !value.is_finite() || !(0.0..=MAX_PHOTO_SCORE).contains(&value) {
                return Err(invalid(format!(
                    "{field} must be within 0..={MAX_PHOTO_SCORE}, got {value}"
                )));
            }
        }
        Ok(())
    }
}
