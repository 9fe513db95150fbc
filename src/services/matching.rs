use serde::Serialize;

use crate::models::mood_event::{MoodEvent, MoodLabel};

/// Mean Earth radius in metres.
pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// Cap on the candidate pool read for one ranking pass. This is a
/// scalability safeguard, not a correctness bound: the pool is ordered by
/// recency, so once the user base is large enough the cap silently drops
/// valid matches beyond the newest 200 located events.
pub const CANDIDATE_POOL_LIMIT: i64 = 200;

/// Score gap below which two moods match even when their labels are
/// incompatible per the table.
const SCORE_PROXIMITY: f64 = 0.2;

/// One ranked match. Ephemeral: computed per request, never persisted.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct MatchSuggestion {
    pub user_id: i64,
    pub distance_m: Option<f64>,
    pub mood_label: MoodLabel,
    pub display_name: String,
    pub lat: Option<f64>,
    pub lng: Option<f64>,
}

/// Display info for one candidate, as read from the user directory.
#[derive(Debug, Clone)]
pub struct CandidateProfile {
    pub user_id: i64,
    pub display_name: Option<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum MatchError {
    #[error("User location/mood required")]
    LocationRequired,
}

/// Great-circle distance in metres between two WGS84 points (haversine).
pub fn haversine_m(lat1: f64, lng1: f64, lat2: f64, lng2: f64) -> f64 {
    let dlat = (lat2 - lat1).to_radians();
    let dlng = (lng2 - lng1).to_radians();
    let a = (dlat / 2.0).sin().powi(2)
        + lat1.to_radians().cos() * lat2.to_radians().cos() * (dlng / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().asin();
    EARTH_RADIUS_M * c
}

impl MoodLabel {
    /// Candidate labels this subject label accepts. Directional: the table
    /// is keyed by the subject side only and must not be symmetrized.
    /// Stress accepts calm; calm does not accept stress.
    pub fn accepts(self) -> &'static [MoodLabel] {
        use MoodLabel::*;
        match self {
            Calm => &[Calm, Joy],
            Joy => &[Joy, Calm, Energy],
            Energy => &[Energy, Joy],
            Fatigue => &[Calm, Joy],
            Stress => &[Calm],
            // Labels outside the complementary table match only themselves.
            Lonely => &[Lonely],
            Social => &[Social],
            Reflective => &[Reflective],
        }
    }
}

pub fn is_mood_compatible(subject: MoodLabel, candidate: MoodLabel) -> bool {
    subject == candidate || subject.accepts().contains(&candidate)
}

/// Stable display pseudonym for a user id. Not a privacy guarantee: the id
/// mod 10000 is guessable and collides across large populations.
pub fn pseudonym(user_id: i64) -> String {
    format!("Anonyme #{:04}", user_id.rem_euclid(10000))
}

pub fn round_distance_m(distance: f64) -> f64 {
    (distance * 10.0).round() / 10.0
}

/// Rank nearby, mood-compatible candidates for a subject mood event.
///
/// The pool is expected to already satisfy the retrieval preconditions:
/// located events only, the subject's own event excluded, newest first,
/// capped at [`CANDIDATE_POOL_LIMIT`]. Pure function over its inputs.
pub fn find_matches(
    subject: &MoodEvent,
    pool: &[(MoodEvent, CandidateProfile)],
    radius_m: f64,
    anonymize: bool,
) -> Result<Vec<MatchSuggestion>, MatchError> {
    let (Some(lat), Some(lng)) = (subject.lat, subject.lng) else {
        return Err(MatchError::LocationRequired);
    };

    let mut out = Vec::new();
    for (event, profile) in pool {
        let (Some(ev_lat), Some(ev_lng)) = (event.lat, event.lng) else {
            continue;
        };
        let distance = haversine_m(lat, lng, ev_lat, ev_lng);
        if distance > radius_m {
            continue;
        }
        // Label compatibility, with numeric score proximity as a secondary
        // channel: close scores match even across incompatible labels.
        if !is_mood_compatible(subject.mood_label, event.mood_label)
            && (event.mood_score - subject.mood_score).abs() >= SCORE_PROXIMITY
        {
            continue;
        }
        let display_name = match (&profile.display_name, anonymize) {
            (Some(name), false) => name.clone(),
            _ => pseudonym(profile.user_id),
        };
        out.push(MatchSuggestion {
            user_id: profile.user_id,
            distance_m: Some(round_distance_m(distance)),
            mood_label: event.mood_label,
            display_name,
            lat: event.lat,
            lng: event.lng,
        });
    }

    sort_by_distance(&mut out);
    Ok(out)
}

/// Ascending by distance; a suggestion without a computed distance sorts
/// as distance zero.
pub fn sort_by_distance(suggestions: &mut [MatchSuggestion]) {
    suggestions.sort_by(|a, b| {
        a.distance_m
            .unwrap_or(0.0)
            .partial_cmp(&b.distance_m.unwrap_or(0.0))
            .unwrap_or(std::cmp::Ordering::Equal)
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn event(id: i64, user_id: i64, label: MoodLabel, score: f64) -> MoodEvent {
        MoodEvent {
            id,
            user_id,
            text: None,
            mood_label: label,
            mood_score: score,
            lat: Some(0.0),
            lng: Some(0.0),
            created_at: Utc::now(),
        }
    }

    fn located(mut ev: MoodEvent, lat: f64, lng: f64) -> MoodEvent {
        ev.lat = Some(lat);
        ev.lng = Some(lng);
        ev
    }

    fn profile(user_id: i64, name: Option<&str>) -> CandidateProfile {
        CandidateProfile {
            user_id,
            display_name: name.map(String::from),
        }
    }

    // ── haversine ────────────────────────────────────────────────────────

    #[test]
    fn test_haversine_zero_distance() {
        assert_eq!(haversine_m(0.0, 0.0, 0.0, 0.0), 0.0);
        assert_eq!(haversine_m(48.85, 2.35, 48.85, 2.35), 0.0);
    }

    #[test]
    fn test_haversine_symmetric() {
        let d1 = haversine_m(48.8566, 2.3522, 45.7640, 4.8357);
        let d2 = haversine_m(45.7640, 4.8357, 48.8566, 2.3522);
        assert!((d1 - d2).abs() < 1e-9);
    }

    #[test]
    fn test_haversine_one_degree_latitude() {
        // One degree of latitude is ~111.19 km on a 6371 km sphere.
        let d = haversine_m(0.0, 0.0, 1.0, 0.0);
        assert!((d - 111_194.9).abs() < 1.0, "got {d}");
    }

    // ── compatibility ────────────────────────────────────────────────────

    #[test]
    fn test_compatibility_is_directional() {
        assert!(is_mood_compatible(MoodLabel::Stress, MoodLabel::Calm));
        assert!(!is_mood_compatible(MoodLabel::Calm, MoodLabel::Stress));
        assert!(is_mood_compatible(MoodLabel::Fatigue, MoodLabel::Joy));
        assert!(!is_mood_compatible(MoodLabel::Joy, MoodLabel::Fatigue));
    }

    #[test]
    fn test_identity_always_compatible() {
        for label in [
            MoodLabel::Joy,
            MoodLabel::Calm,
            MoodLabel::Energy,
            MoodLabel::Fatigue,
            MoodLabel::Stress,
            MoodLabel::Lonely,
            MoodLabel::Social,
            MoodLabel::Reflective,
        ] {
            assert!(is_mood_compatible(label, label), "{label:?} vs itself");
        }
    }

    #[test]
    fn test_extended_labels_match_only_themselves() {
        assert!(!is_mood_compatible(MoodLabel::Lonely, MoodLabel::Calm));
        assert!(!is_mood_compatible(MoodLabel::Social, MoodLabel::Joy));
        assert!(!is_mood_compatible(MoodLabel::Reflective, MoodLabel::Calm));
    }

    // ── pseudonym ────────────────────────────────────────────────────────

    #[test]
    fn test_pseudonym_exact_format() {
        assert_eq!(pseudonym(12345), "Anonyme #2345");
        assert_eq!(pseudonym(7), "Anonyme #0007");
        assert_eq!(pseudonym(10000), "Anonyme #0000");
    }

    #[test]
    fn test_pseudonym_stable() {
        assert_eq!(pseudonym(42), pseudonym(42));
    }

    // ── find_matches ─────────────────────────────────────────────────────

    #[test]
    fn test_subject_without_location_is_rejected() {
        let mut subject = event(1, 1, MoodLabel::Joy, 0.9);
        subject.lat = None;
        subject.lng = None;
        let result = find_matches(&subject, &[], 1500.0, true);
        assert!(matches!(result, Err(MatchError::LocationRequired)));
    }

    #[test]
    fn test_radius_filter() {
        // Subject at the origin; candidates ~100 m and ~2000 m due north.
        let subject = event(1, 1, MoodLabel::Joy, 0.9);
        let pool = vec![
            (
                located(event(2, 2, MoodLabel::Calm, 0.6), 0.0009, 0.0),
                profile(2, Some("Alice")),
            ),
            (
                located(event(3, 3, MoodLabel::Calm, 0.6), 0.018, 0.0),
                profile(3, Some("Bob")),
            ),
        ];

        let matches = find_matches(&subject, &pool, 1500.0, true).unwrap();
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].user_id, 2);
        assert!(matches[0].distance_m.unwrap() <= 1500.0);
    }

    #[test]
    fn test_incompatible_label_excluded() {
        // calm does not accept stress, and scores are far apart.
        let subject = event(1, 1, MoodLabel::Calm, 0.6);
        let pool = vec![(
            located(event(2, 2, MoodLabel::Stress, 0.2), 0.0009, 0.0),
            profile(2, Some("Alice")),
        )];

        let matches = find_matches(&subject, &pool, 1500.0, true).unwrap();
        assert!(matches.is_empty());
    }

    #[test]
    fn test_score_proximity_overrides_label_table() {
        // Same pair as above, but scores within 0.2 of each other.
        let subject = event(1, 1, MoodLabel::Calm, 0.3);
        let pool = vec![(
            located(event(2, 2, MoodLabel::Stress, 0.2), 0.0009, 0.0),
            profile(2, Some("Alice")),
        )];

        let matches = find_matches(&subject, &pool, 1500.0, true).unwrap();
        assert_eq!(matches.len(), 1);
    }

    #[test]
    fn test_score_gap_of_exactly_point_two_does_not_match() {
        let subject = event(1, 1, MoodLabel::Calm, 0.4);
        let pool = vec![(
            located(event(2, 2, MoodLabel::Stress, 0.2), 0.0009, 0.0),
            profile(2, Some("Alice")),
        )];

        let matches = find_matches(&subject, &pool, 1500.0, true).unwrap();
        assert!(matches.is_empty());
    }

    #[test]
    fn test_anonymize_replaces_name() {
        let subject = event(1, 1, MoodLabel::Joy, 0.9);
        let pool = vec![(
            located(event(2, 12345, MoodLabel::Joy, 0.9), 0.0009, 0.0),
            profile(12345, Some("Alice")),
        )];

        let matches = find_matches(&subject, &pool, 1500.0, true).unwrap();
        assert_eq!(matches[0].display_name, "Anonyme #2345");
    }

    #[test]
    fn test_missing_name_falls_back_to_pseudonym() {
        let subject = event(1, 1, MoodLabel::Joy, 0.9);
        let pool = vec![(
            located(event(2, 77, MoodLabel::Joy, 0.9), 0.0009, 0.0),
            profile(77, None),
        )];

        let matches = find_matches(&subject, &pool, 1500.0, false).unwrap();
        assert_eq!(matches[0].display_name, "Anonyme #0077");
    }

    #[test]
    fn test_real_name_shown_when_not_anonymized() {
        let subject = event(1, 1, MoodLabel::Joy, 0.9);
        let pool = vec![(
            located(event(2, 2, MoodLabel::Joy, 0.9), 0.0009, 0.0),
            profile(2, Some("Alice")),
        )];

        let matches = find_matches(&subject, &pool, 1500.0, false).unwrap();
        assert_eq!(matches[0].display_name, "Alice");
    }

    #[test]
    fn test_output_sorted_ascending_by_distance() {
        let subject = event(1, 1, MoodLabel::Joy, 0.9);
        let pool = vec![
            (
                located(event(2, 2, MoodLabel::Joy, 0.9), 0.008, 0.0),
                profile(2, None),
            ),
            (
                located(event(3, 3, MoodLabel::Joy, 0.9), 0.0009, 0.0),
                profile(3, None),
            ),
            (
                located(event(4, 4, MoodLabel::Joy, 0.9), 0.004, 0.0),
                profile(4, None),
            ),
        ];

        let matches = find_matches(&subject, &pool, 1500.0, true).unwrap();
        assert_eq!(
            matches.iter().map(|m| m.user_id).collect::<Vec<_>>(),
            vec![3, 4, 2]
        );
        let distances: Vec<f64> = matches.iter().filter_map(|m| m.distance_m).collect();
        assert!(distances.windows(2).all(|w| w[0] <= w[1]));
    }

    #[test]
    fn test_distance_rounded_to_one_decimal() {
        let subject = event(1, 1, MoodLabel::Joy, 0.9);
        let pool = vec![(
            located(event(2, 2, MoodLabel::Joy, 0.9), 0.0009, 0.0),
            profile(2, None),
        )];

        let matches = find_matches(&subject, &pool, 1500.0, true).unwrap();
        let d = matches[0].distance_m.unwrap();
        assert_eq!(d, round_distance_m(d));
    }

    #[test]
    fn test_missing_distance_sorts_first() {
        let mut suggestions = vec![
            MatchSuggestion {
                user_id: 1,
                distance_m: Some(10.0),
                mood_label: MoodLabel::Calm,
                display_name: "a".into(),
                lat: None,
                lng: None,
            },
            MatchSuggestion {
                user_id: 2,
                distance_m: None,
                mood_label: MoodLabel::Calm,
                display_name: "b".into(),
                lat: None,
                lng: None,
            },
        ];
        sort_by_distance(&mut suggestions);
        assert_eq!(suggestions[0].user_id, 2);
    }
}
