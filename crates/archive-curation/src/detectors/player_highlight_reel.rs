use std::cmp::Ordering;

use archive_core::constants::{
    HIGHLIGHT_MAX_PHOTOS, HIGHLIGHT_MIN_COMPOSITION, HIGHLIGHT_MIN_SHARPNESS, MAX_PHOTO_SCORE,
};
use archive_core::errors::ArchiveResult;
use archive_core::models::{ArcType, Photo};

use super::{dominant_group, require_min, CandidateArc};

/// Player Highlight Reel: an athlete's best-composed sharp photos, at most ten.
pub struct PlayerHighlightReelDetector;

impl PlayerHighlightReelDetector {
    pub fn detect(photos: &[Photo]) -> ArchiveResult<CandidateArc> {
        let mut members: Vec<usize> = dominant_group(photos, |p| p.athlete_id.as_deref())
            .into_iter()
            .filter(|&idx| qualifies(&photos[idx]))
            .collect();
        require_min(ArcType::PlayerHighlightReel, members.len())?;

        members.sort_by(|&a, &b| by_composition_desc(&photos[a], &photos[b]));
        members.truncate(HIGHLIGHT_MAX_PHOTOS);

        let mean = members
            .iter()
            .map(|&idx| photos[idx].composition_score)
            .sum::<f64>()
            / members.len() as f64;

        Ok(CandidateArc {
            arc_type: ArcType::PlayerHighlightReel,
            count: members.len(),
            members,
            quality: (mean / MAX_PHOTO_SCORE).clamp(0.0, 1.0),
        })
    }
}

fn qualifies(photo: &Photo) -> bool {
    photo.sharpness >= HIGHLIGHT_MIN_SHARPNESS
        && photo.composition_score >= HIGHLIGHT_MIN_COMPOSITION
}

/// `compositionScore` descending, then photo id.
pub(crate) fn by_composition_desc(a: &Photo, b: &Photo) -> Ordering {
    b.composition_score
        .partial_cmp(&a.composition_score)
        .unwrap_or(Ordering::Equal)
        .then_with(|| a.id.cmp(&b.id))
}
