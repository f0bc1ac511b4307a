use std::collections::BTreeMap;

use chrono::{DateTime, Utc};

use archive_core::errors::ArchiveResult;
use archive_core::models::{ArcType, Photo};

use super::player_highlight_reel::by_composition_desc;
use super::{require_min, CandidateArc};

/// Season Journey: one representative photo per event across the season.
///
/// The representative is the event's best-composed photo. Quality grows with
/// the number of events and saturates at twice the minimum.
pub struct SeasonJourneyDetector;

impl SeasonJourneyDetector {
    pub fn detect(photos: &[Photo]) -> ArchiveResult<CandidateArc> {
        let mut representatives: BTreeMap<&str, usize> = BTreeMap::new();
        for (idx, photo) in photos.iter().enumerate() {
            representatives
                .entry(photo.event_id.as_str())
                .and_modify(|best| {
                    if by_composition_desc(photo, &photos[*best]).is_lt() {
                        *best = idx;
                    }
                })
                .or_insert(idx);
        }

        let events = representatives.len();
        require_min(ArcType::SeasonJourney, events)?;

        let saturation = 2 * ArcType::SeasonJourney.min_count();
        Ok(CandidateArc {
            arc_type: ArcType::SeasonJourney,
            members: representatives.into_values().collect(),
            count: events,
            quality: (events as f64 / saturation as f64).min(1.0),
        })
    }
}

/// Earliest capture time per event in the snapshot.
pub(crate) fn event_starts(photos: &[Photo]) -> BTreeMap<&str, DateTime<Utc>> {
    let mut starts: BTreeMap<&str, DateTime<Utc>> = BTreeMap::new();
    for photo in photos {
        starts
            .entry(photo.event_id.as_str())
            .and_modify(|start| *start = (*start).min(photo.captured_at))
            .or_insert(photo.captured_at);
    }
    starts
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_fixtures::PhotoBuilder;

    fn season(events: usize) -> Vec<Photo> {
        (0..events)
            .flat_map(|e| {
                let event = format!("S{e}");
                vec![
                    PhotoBuilder::new(&format!("{event}-a"), &event)
                        .at_minute(e as i64 * 10_000)
                        .scores(6.0, 6.0)
                        .build(),
                    PhotoBuilder::new(&format!("{event}-b"), &event)
                        .at_minute(e as i64 * 10_000 + 30)
                        .scores(6.0, 8.0)
                        .build(),
                ]
            })
            .collect()
    }

    #[test]
    fn eight_events_form_a_journey() {
        let photos = season(8);
        let candidate = SeasonJourneyDetector::detect(&photos).unwrap();
        assert_eq!(candidate.count, 8);
        assert_eq!(candidate.members.len(), 8);
        assert!((candidate.quality - 0.5).abs() < 1e-12);
    }

    #[test]
    fn seven_events_are_insufficient() {
        assert!(SeasonJourneyDetector::detect(&season(7)).is_err());
    }

    #[test]
    fn representative_is_best_composed() {
        let photos = season(8);
        let candidate = SeasonJourneyDetector::detect(&photos).unwrap();
        assert!(candidate
            .members
            .iter()
            .all(|&i| photos[i].id.ends_with("-b")));
    }

    #[test]
    fn many_photos_in_few_events_do_not_count() {
        let photos: Vec<Photo> = (0..20)
            .map(|i| PhotoBuilder::new(&format!("p{i}"), "E1").build())
            .collect();
        assert!(SeasonJourneyDetector::detect(&photos).is_err());
    }

    #[test]
    fn quality_saturates() {
        let candidate = SeasonJourneyDetector::detect(&season(20)).unwrap();
        assert_eq!(candidate.quality, 1.0);
    }

    #[test]
    fn event_start_is_earliest_capture() {
        let photos = season(2);
        let starts = event_starts(&photos);
        assert_eq!(starts["S1"], photos[2].captured_at);
    }
}
