use archive_core::errors::ArchiveResult;
use archive_core::models::{ActionIntensity, ArcType, Emotion, Photo, TimeInGame};

use super::{dominant_event, require_min, CandidateArc};

/// Game-Winning Rally: the decisive final-phase moments of one event.
///
/// Qualifying photos are captured in the final phase at high or peak
/// intensity, carrying triumph or intensity. Quality is the fraction at peak.
pub struct GameWinningRallyDetector;

impl GameWinningRallyDetector {
    pub fn detect(photos: &[Photo]) -> ArchiveResult<CandidateArc> {
        let members: Vec<usize> = dominant_event(photos)
            .into_iter()
            .filter(|&idx| qualifies(&photos[idx]))
            .collect();
        require_min(ArcType::GameWinningRally, members.len())?;

        let peaks = members
            .iter()
            .filter(|&&idx| photos[idx].action_intensity == ActionIntensity::Peak)
            .count();
        let quality = peaks as f64 / members.len() as f64;

        Ok(CandidateArc {
            arc_type: ArcType::GameWinningRally,
            count: members.len(),
            members,
            quality,
        })
    }
}

fn qualifies(photo: &Photo) -> bool {
    photo.time_in_game == Some(TimeInGame::Final)
        && photo.action_intensity >= ActionIntensity::High
        && matches!(photo.emotion, Emotion::Triumph | Emotion::Intensity)
}
