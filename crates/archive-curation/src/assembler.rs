//! Arc assembly: ordering, emotional curve, copy, and identity.

use std::cmp::Ordering;
use std::time::Duration;

use chrono::{DateTime, Utc};

use archive_core::models::{ArcType, EmotionalPoint, NarrativeArc, Photo, Scope};

use crate::detectors::player_highlight_reel::by_composition_desc;
use crate::detectors::season_journey::event_starts;
use crate::detectors::{sort_chronologically, CandidateArc};

/// Turns scored candidates into [`NarrativeArc`]s.
#[derive(Debug, Clone)]
pub struct ArcAssembler {
    arc_ttl: chrono::Duration,
}

impl ArcAssembler {
    pub fn new(arc_ttl: Duration) -> Self {
        // Beyond chrono's range means "effectively never"; a century will do.
        let arc_ttl =
            chrono::Duration::from_std(arc_ttl).unwrap_or_else(|_| chrono::Duration::weeks(5_200));
        Self { arc_ttl }
    }

    pub fn assemble(
        &self,
        candidate: &CandidateArc,
        photos: &[Photo],
        scope: &Scope,
        confidence: f64,
        now: DateTime<Utc>,
    ) -> NarrativeArc {
        let mut members = candidate.members.clone();
        order_members(candidate.arc_type, photos, &mut members);

        let photo_ids: Vec<String> = members.iter().map(|&idx| photos[idx].id.clone()).collect();
        let emotional_curve = members
            .iter()
            .map(|&idx| EmotionalPoint {
                photo_id: photos[idx].id.clone(),
                intensity: photos[idx].emotional_impact,
            })
            .collect();

        let scope_key = scope.key();
        NarrativeArc {
            id: NarrativeArc::compute_id(candidate.arc_type, &scope_key, &photo_ids),
            arc_type: candidate.arc_type,
            title: title(candidate.arc_type, scope),
            description: description(candidate, scope),
            scope_key,
            photo_ids,
            emotional_curve,
            confidence,
            generated_at: now,
            expires_at: now
                .checked_add_signed(self.arc_ttl)
                .unwrap_or(DateTime::<Utc>::MAX_UTC),
        }
    }
}

/// Sort member indices into the arc type's presentation order.
///
/// Every ordering falls back to photo id, so the result never depends on
/// input order.
pub fn order_members(arc_type: ArcType, photos: &[Photo], members: &mut [usize]) {
    match arc_type {
        ArcType::GameWinningRally | ArcType::ComebackStory | ArcType::EmotionSpectrum => {
            sort_chronologically(photos, members)
        }
        ArcType::PlayerHighlightReel => {
            members.sort_by(|&a, &b| by_composition_desc(&photos[a], &photos[b]))
        }
        ArcType::TechnicalExcellence => members.sort_by(|&a, &b| {
            photos[b]
                .combined_score()
                .partial_cmp(&photos[a].combined_score())
                .unwrap_or(Ordering::Equal)
                .then_with(|| photos[a].id.cmp(&photos[b].id))
        }),
        ArcType::SeasonJourney => {
            let starts = event_starts(photos);
            members.sort_by(|&a, &b| {
                let (pa, pb) = (&photos[a], &photos[b]);
                starts
                    .get(pa.event_id.as_str())
                    .cmp(&starts.get(pb.event_id.as_str()))
                    .then_with(|| pa.event_id.cmp(&pb.event_id))
                    .then_with(|| pa.id.cmp(&pb.id))
            });
        }
    }
}

fn scope_label(scope: &Scope) -> String {
    match scope {
        Scope::Event { event_id } => event_id.clone(),
        Scope::Athlete { athlete_id } => athlete_id.clone(),
        Scope::Global => "the archive".to_string(),
        Scope::Season { from, to } => format!(
            "{} to {}",
            from.format("%Y-%m-%d"),
            to.format("%Y-%m-%d")
        ),
    }
}

fn title(arc_type: ArcType, scope: &Scope) -> String {
    format!("{}: {}", arc_type.display_name(), scope_label(scope))
}

fn description(candidate: &CandidateArc, scope: &Scope) -> String {
    let label = scope_label(scope);
    let n = candidate.count;
    match candidate.arc_type {
        ArcType::GameWinningRally => {
            format!("The {n} decisive final-phase moments of {label}.")
        }
        ArcType::PlayerHighlightReel => {
            format!("The {n} sharpest, best-composed shots of {label}.")
        }
        ArcType::SeasonJourney => {
            format!("One defining photo from each of {n} events across {label}.")
        }
        ArcType::ComebackStory => {
            format!("From determination through intensity to triumph at {label}, in {n} photos.")
        }
        ArcType::TechnicalExcellence => {
            format!("{n} technically outstanding photos from {label}.")
        }
        ArcType::EmotionSpectrum => {
            format!("{n} distinct emotions captured at {label}.")
        }
    }
}
