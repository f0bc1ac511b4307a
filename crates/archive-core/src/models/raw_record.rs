use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::ArchiveError;

use super::Photo;

/// A photo record as emitted by the enrichment pipeline, before validation.
///
/// Every field is optional and enum values are free-form strings. Converting
/// into a [`Photo`] is the only way a record reaches the detectors.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RawPhotoRecord {
    pub id: Option<String>,
    pub event_id: Option<String>,
    pub athlete_id: Option<String>,
    pub captured_at: Option<String>,
    pub play_type: Option<String>,
    pub action_intensity: Option<String>,
    pub emotion: Option<String>,
    pub sharpness: Option<f64>,
    pub composition_score: Option<f64>,
    pub emotional_impact: Option<f64>,
    pub time_in_game: Option<String>,
}

impl RawPhotoRecord {
    /// Best-effort identifier for log messages.
    pub fn display_id(&self) -> &str {
        self.id.as_deref().unwrap_or("<missing id>")
    }
}

impl From<&Photo> for RawPhotoRecord {
    fn from(photo: &Photo) -> Self {
        Self {
            id: Some(photo.id.clone()),
            event_id: Some(photo.event_id.clone()),
            athlete_id: photo.athlete_id.clone(),
            captured_at: Some(photo.captured_at.to_rfc3339()),
            play_type: photo.play_type.map(|p| p.as_str().to_string()),
            action_intensity: Some(photo.action_intensity.as_str().to_string()),
            emotion: Some(photo.emotion.as_str().to_string()),
            sharpness: Some(photo.sharpness),
            composition_score: Some(photo.composition_score),
            emotional_impact: Some(photo.emotional_impact),
            time_in_game: photo.time_in_game.map(|t| t.as_str().to_string()),
        }
    }
}

impl TryFrom<RawPhotoRecord> for Photo {
    type Error = ArchiveError;

    fn try_from(raw: RawPhotoRecord) -> Result<Self, Self::Error> {
        let photo_id = raw.display_id().to_string();
        let invalid = |reason: String| ArchiveError::InvalidPhotoRecord {
            photo_id: photo_id.clone(),
            reason,
        };

        let id = required(raw.id, "id").map_err(invalid)?;
        let event_id = required(raw.event_id, "eventId").map_err(invalid)?;
        let captured_at = required(raw.captured_at, "capturedAt").map_err(invalid)?;
        let captured_at = DateTime::parse_from_rfc3339(&captured_at)
            .map(|t| t.with_timezone(&Utc))
            .map_err(|e| invalid(format!("capturedAt '{captured_at}': {e}")))?;

        let action_intensity = required(raw.action_intensity, "actionIntensity")
            .and_then(|s| s.parse())
            .map_err(invalid)?;
        let emotion = required(raw.emotion, "emotion")
            .and_then(|s| s.parse())
            .map_err(invalid)?;
        let play_type = optional_enum(raw.play_type).map_err(invalid)?;
        let time_in_game = optional_enum(raw.time_in_game).map_err(invalid)?;

        let photo = Photo {
            id,
            event_id,
            athlete_id: raw.athlete_id.filter(|a| !a.trim().is_empty()),
            captured_at,
            play_type,
            action_intensity,
            emotion,
            sharpness: raw.sharpness.ok_or_else(|| invalid("missing sharpness".into()))?,
            composition_score: raw
                .composition_score
                .ok_or_else(|| invalid("missing compositionScore".into()))?,
            emotional_impact: raw
                .emotional_impact
                .ok_or_else(|| invalid("missing emotionalImpact".into()))?,
            time_in_game,
        };
        photo.validate()?;
        Ok(photo)
    }
}

fn required(value: Option<String>, field: &str) -> Result<String, String> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(v),
        _ => Err(format!("missing {field}")),
    }
}

/// Nullable enum columns: absent or blank means `None`, anything else must parse.
fn optional_enum<T: FromStr<Err = String>>(value: Option<String>) -> Result<Option<T>, String> {
    match value {
        Some(v) if !v.trim().is_empty() => v.parse().map(Some),
        _ => Ok(None),
    }
}
