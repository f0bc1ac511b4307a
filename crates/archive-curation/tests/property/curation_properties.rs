//! Property tests for archive-curation: curve invariant, determinism,
//! scorer monotonicity.

use std::time::Duration;

use chrono::Utc;
use proptest::prelude::*;

use archive_core::models::{ActionIntensity, ArcType, Emotion, Photo, Scope, TimeInGame};
use archive_curation::detectors;
use archive_curation::{ArcAssembler, ConfidenceScorer};
use test_fixtures::PhotoBuilder;

const INTENSITIES: [ActionIntensity; 4] = [
    ActionIntensity::Low,
    ActionIntensity::Medium,
    ActionIntensity::High,
    ActionIntensity::Peak,
];

const PHASES: [Option<TimeInGame>; 5] = [
    None,
    Some(TimeInGame::Early),
    Some(TimeInGame::Middle),
    Some(TimeInGame::Final),
    Some(TimeInGame::Overtime),
];

fn arb_photo() -> impl Strategy<Value = (usize, i64, usize, usize, usize, f64, f64, f64, bool)> {
    (
        0usize..3,
        0i64..600,
        0usize..4,
        0usize..6,
        0usize..5,
        6.0f64..=10.0,
        6.0f64..=10.0,
        0.0f64..=10.0,
        any::<bool>(),
    )
}

fn build(specs: &[(usize, i64, usize, usize, usize, f64, f64, f64, bool)]) -> Vec<Photo> {
    specs
        .iter()
        .enumerate()
        .map(|(i, &(event, minute, intensity, emotion, phase, sharp, comp, impact, has_athlete))| {
            let mut builder = PhotoBuilder::new(&format!("p{i:03}"), &format!("E{event}"))
                .at_minute(minute)
                .intensity(INTENSITIES[intensity])
                .emotion(Emotion::ALL[emotion])
                .scores(sharp, comp)
                .impact(impact);
            if let Some(phase) = PHASES[phase] {
                builder = builder.time_in_game(phase);
            }
            if has_athlete {
                builder = builder.athlete("A1");
            }
            builder.build()
        })
        .collect()
}

fn assemble_all(photos: &[Photo]) -> Vec<archive_core::NarrativeArc> {
    let scorer = ConfidenceScorer::default();
    let assembler = ArcAssembler::new(Duration::from_secs(86_400));
    let now = Utc::now();
    ArcType::ALL
        .into_iter()
        .filter_map(|arc_type| detectors::detect(arc_type, photos).ok())
        .map(|candidate| {
            let confidence = scorer.score_candidate(&candidate);
            assembler.assemble(&candidate, photos, &Scope::Global, confidence, now)
        })
        .collect()
}

// Curve and photo ids stay in lockstep; confidence stays in range.
proptest! {
    #[test]
    fn prop_curve_matches_photo_ids(specs in prop::collection::vec(arb_photo(), 0..40)) {
        let photos = build(&specs);
        for arc in assemble_all(&photos) {
            prop_assert!(arc.curve_matches_photos());
            prop_assert!(!arc.photo_ids.is_empty());
            prop_assert!((0.0..=1.0).contains(&arc.confidence));
            if !matches!(arc.arc_type, ArcType::SeasonJourney | ArcType::EmotionSpectrum) {
                prop_assert!(arc.photo_ids.len() >= arc.arc_type.min_count());
            }
        }
    }
}

// Input order never changes the outcome.
proptest! {
    #[test]
    fn prop_deterministic_under_reordering(specs in prop::collection::vec(arb_photo(), 0..40)) {
        let photos = build(&specs);
        let mut reversed = photos.clone();
        reversed.reverse();

        let a = assemble_all(&photos);
        let b = assemble_all(&reversed);
        prop_assert_eq!(a.len(), b.len());
        for (x, y) in a.iter().zip(&b) {
            prop_assert_eq!(&x.id, &y.id);
            prop_assert_eq!(&x.photo_ids, &y.photo_ids);
            prop_assert!((x.confidence - y.confidence).abs() < 1e-12);
        }
    }
}

// Reels never exceed ten photos.
proptest! {
    #[test]
    fn prop_highlight_reel_capped(specs in prop::collection::vec(arb_photo(), 0..60)) {
        let photos = build(&specs);
        if let Ok(candidate) = detectors::detect(ArcType::PlayerHighlightReel, &photos) {
            prop_assert!(candidate.members.len() <= 10);
        }
    }
}

// Scorer is non-decreasing in count and in quality.
proptest! {
    #[test]
    fn prop_scorer_monotonic(
        type_idx in 0usize..6,
        count in 0usize..40,
        extra in 0usize..20,
        quality in 0.0f64..=1.0,
        bump in 0.0f64..=1.0,
    ) {
        let scorer = ConfidenceScorer::default();
        let arc_type = ArcType::ALL[type_idx];
        let base = scorer.score(arc_type, count, quality);
        prop_assert!(scorer.score(arc_type, count + extra, quality) >= base);
        prop_assert!(scorer.score(arc_type, count, (quality + bump).min(1.0)) >= base);
        prop_assert!((0.0..=1.0).contains(&base));
    }
}
