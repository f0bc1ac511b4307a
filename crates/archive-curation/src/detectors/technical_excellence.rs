use archive_core::constants::{
    MAX_PHOTO_SCORE, TECHNICAL_MIN_COMPOSITION, TECHNICAL_MIN_SHARPNESS,
};
use archive_core::errors::ArchiveResult;
use archive_core::models::{ArcType, Photo};

use super::{require_min, CandidateArc};

/// Technical Excellence: every photo in scope that is both very sharp and
/// very well composed.
pub struct TechnicalExcellenceDetector;

impl TechnicalExcellenceDetector {
    pub fn detect(photos: &[Photo]) -> ArchiveResult<CandidateArc> {
        let members: Vec<usize> = photos
            .iter()
            .enumerate()
            .filter(|(_, p)| qualifies(p))
            .map(|(idx, _)| idx)
            .collect();
        require_min(ArcType::TechnicalExcellence, members.len())?;

        let mean_combined = members
            .iter()
            .map(|&idx| photos[idx].combined_score())
            .sum::<f64>()
            / members.len() as f64;

        Ok(CandidateArc {
            arc_type: ArcType::TechnicalExcellence,
            count: members.len(),
            members,
            quality: (mean_combined / (2.0 * MAX_PHOTO_SCORE)).clamp(0.0, 1.0),
        })
    }
}

fn qualifies(photo: &Photo) -> bool {
    photo.sharpness >= TECHNICAL_MIN_SHARPNESS
        && photo.composition_score >= TECHNICAL_MIN_COMPOSITION
}
