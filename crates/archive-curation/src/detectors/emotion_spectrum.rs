use std::collections::BTreeSet;

use archive_core::errors::ArchiveResult;
use archive_core::models::{ArcType, Emotion, Photo};

use super::{dominant_event, require_min, CandidateArc};

/// Emotion Spectrum: the breadth of emotions captured within one event.
///
/// The count is the number of distinct emotions, and every photo of the event
/// is a member.
pub struct EmotionSpectrumDetector;

impl EmotionSpectrumDetector {
    pub fn detect(photos: &[Photo]) -> ArchiveResult<CandidateArc> {
        let members = dominant_event(photos);
        let distinct: BTreeSet<Emotion> = members.iter().map(|&idx| photos[idx].emotion).collect();
        require_min(ArcType::EmotionSpectrum, distinct.len())?;

        Ok(CandidateArc {
            arc_type: ArcType::EmotionSpectrum,
            members,
            count: distinct.len(),
            quality: distinct.len() as f64 / Emotion::ALL.len() as f64,
        })
    }
}
