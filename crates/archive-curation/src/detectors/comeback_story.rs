use archive_core::errors::ArchiveResult;
use archive_core::models::{ArcType, Emotion, Photo};

use super::{dominant_event, require_min, sort_chronologically, CandidateArc};

/// Comeback Story: determination, then intensity, then triumph within one event.
///
/// Members are the chronological span from the first determination that is
/// followed by an intensity and then a triumph, through the last triumph.
/// Quality is the share of the span carrying one of those three emotions.
pub struct ComebackStoryDetector;

impl ComebackStoryDetector {
    pub fn detect(photos: &[Photo]) -> ArchiveResult<CandidateArc> {
        let mut ordered = dominant_event(photos);
        sort_chronologically(photos, &mut ordered);

        let span = comeback_span(photos, &ordered).unwrap_or(&[]);
        require_min(ArcType::ComebackStory, span.len())?;

        let on_arc = span
            .iter()
            .filter(|&&idx| {
                matches!(
                    photos[idx].emotion,
                    Emotion::Determination | Emotion::Intensity | Emotion::Triumph
                )
            })
            .count();

        Ok(CandidateArc {
            arc_type: ArcType::ComebackStory,
            members: span.to_vec(),
            count: span.len(),
            quality: on_arc as f64 / span.len() as f64,
        })
    }
}

/// The sub-slice of `ordered` forming the comeback, if the sequence exists.
fn comeback_span<'a>(photos: &[Photo], ordered: &'a [usize]) -> Option<&'a [usize]> {
    let emotion_at = |pos: usize| photos[ordered[pos]].emotion;
    let last_triumph = (0..ordered.len())
        .rev()
        .find(|&pos| emotion_at(pos) == Emotion::Triumph)?;
    // A determination qualifies iff it precedes the last intensity that
    // precedes the last triumph.
    let last_intensity = (0..last_triumph)
        .rev()
        .find(|&pos| emotion_at(pos) == Emotion::Intensity)?;
    let first_determination =
        (0..last_intensity).find(|&pos| emotion_at(pos) == Emotion::Determination)?;
    Some(&ordered[first_determination..=last_triumph])
}
