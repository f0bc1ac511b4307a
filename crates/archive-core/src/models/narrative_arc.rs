use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use super::ArcType;

/// One point of an arc's emotional curve.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct EmotionalPoint {
    pub photo_id: String,
    /// The photo's `emotionalImpact`, unsmoothed.
    pub intensity: f64,
}

/// A detected story: an ordered collection of photo references with a
/// confidence and an emotional curve.
///
/// `photo_ids` and `emotional_curve` always have the same length and
/// index-to-index correspondence. Arcs reference photos by id only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct NarrativeArc {
    pub id: String,
    #[serde(rename = "type")]
    pub arc_type: ArcType,
    pub title: String,
    pub description: String,
    pub scope_key: String,
    pub photo_ids: Vec<String>,
    pub emotional_curve: Vec<EmotionalPoint>,
    pub confidence: f64,
    pub generated_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl NarrativeArc {
    /// Deterministic arc id: blake3 over type, scope key, and ordered photo ids.
    pub fn compute_id(arc_type: ArcType, scope_key: &str, photo_ids: &[String]) -> String {
        let mut hasher = blake3::Hasher::new();
        hasher.update(arc_type.as_str().as_bytes());
        hasher.update(&[0]);
        hasher.update(scope_key.as_bytes());
        for id in photo_ids {
            hasher.update(&[0]);
            hasher.update(id.as_bytes());
        }
        let hex = hasher.finalize().to_hex();
        format!("{}-{}", arc_type.as_str(), &hex.as_str()[..16])
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }

    /// Whether the curve is in lockstep with `photo_ids`.
    pub fn curve_matches_photos(&self) -> bool {
        self.photo_ids.len() == self.emotional_curve.len()
            && self
                .photo_ids
                .iter()
                .zip(&self.emotional_curve)
                .all(|(id, point)| *id == point.photo_id)
    }
}
