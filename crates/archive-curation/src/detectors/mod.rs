//! The six narrative detectors.
//!
//! Detectors are pure: they take the scope's photo snapshot and either return
//! a [`CandidateArc`] or `InsufficientData`. Candidates hold indices into the
//! snapshot, never photo copies. Photos lacking a nullable field a predicate
//! needs are skipped.

pub mod comeback_story;
pub mod emotion_spectrum;
pub mod game_winning_rally;
pub mod player_highlight_reel;
pub mod season_journey;
pub mod technical_excellence;

pub use comeback_story::ComebackStoryDetector;
pub use emotion_spectrum::EmotionSpectrumDetector;
pub use game_winning_rally::GameWinningRallyDetector;
pub use player_highlight_reel::PlayerHighlightReelDetector;
pub use season_journey::SeasonJourneyDetector;
pub use technical_excellence::TechnicalExcellenceDetector;

use std::collections::BTreeMap;

use archive_core::errors::{ArchiveError, ArchiveResult};
use archive_core::models::{ArcType, Photo};

/// A detected but not yet scored or ordered arc.
#[derive(Debug, Clone, PartialEq)]
pub struct CandidateArc {
    pub arc_type: ArcType,
    /// Indices into the snapshot the detector was given.
    pub members: Vec<usize>,
    /// What the minimum is measured against: photos, events, or emotions.
    pub count: usize,
    /// Quality signal in `[0, 1]`.
    pub quality: f64,
}

/// Run the detector for `arc_type` over a snapshot.
pub fn detect(arc_type: ArcType, photos: &[Photo]) -> ArchiveResult<CandidateArc> {
    match arc_type {
        ArcType::GameWinningRally => GameWinningRallyDetector::detect(photos),
        ArcType::PlayerHighlightReel => PlayerHighlightReelDetector::detect(photos),
        ArcType::SeasonJourney => SeasonJourneyDetector::detect(photos),
        ArcType::ComebackStory => ComebackStoryDetector::detect(photos),
        ArcType::TechnicalExcellence => TechnicalExcellenceDetector::detect(photos),
        ArcType::EmotionSpectrum => EmotionSpectrumDetector::detect(photos),
    }
}

/// `InsufficientData` unless `found` reaches the type minimum.
pub(crate) fn require_min(arc_type: ArcType, found: usize) -> ArchiveResult<()> {
    let required = arc_type.min_count();
    if found < required {
        return Err(ArchiveError::InsufficientData {
            arc_type,
            found,
            required,
        });
    }
    Ok(())
}

/// Indices of the photos belonging to the largest group under `key`.
///
/// Ties go to the smallest key. Photos for which `key` returns `None` are
/// ignored. Used to narrow a mixed snapshot down to one event or athlete.
pub(crate) fn dominant_group<'a, F>(photos: &'a [Photo], key: F) -> Vec<usize>
where
    F: Fn(&'a Photo) -> Option<&'a str>,
{
    let mut groups: BTreeMap<&str, Vec<usize>> = BTreeMap::new();
    for (idx, photo) in photos.iter().enumerate() {
        if let Some(k) = key(photo) {
            groups.entry(k).or_default().push(idx);
        }
    }
    // Strict `>` keeps the smallest key among equal sizes.
    groups
        .into_values()
        .fold(Vec::new(), |best, group| {
            if group.len() > best.len() {
                group
            } else {
                best
            }
        })
}

/// Indices of the photos of the event holding the most photos.
pub(crate) fn dominant_event(photos: &[Photo]) -> Vec<usize> {
    dominant_group(photos, |p| Some(p.event_id.as_str()))
}

/// Sort indices by capture time, then photo id.
pub(crate) fn sort_chronologically(photos: &[Photo], indices: &mut [usize]) {
    indices.sort_by(|&a, &b| {
        photos[a]
            .captured_at
            .cmp(&photos[b].captured_at)
            .then_with(|| photos[a].id.cmp(&photos[b].id))
    });
}
