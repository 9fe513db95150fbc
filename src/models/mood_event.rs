use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

/// One user's mood observation at a point in time. Create-only: events are
/// never updated or deleted, and matching always reads the newest one.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct MoodEvent {
    pub id: i64,
    pub user_id: i64,
    pub text: Option<String>,
    pub mood_label: MoodLabel,
    pub mood_score: f64,
    pub lat: Option<f64>,
    pub lng: Option<f64>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "mood_label", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum MoodLabel {
    Joy,
    Calm,
    Energy,
    Fatigue,
    Stress,
    Lonely,
    Social,
    Reflective,
}

impl MoodLabel {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "joy" => Some(Self::Joy),
            "calm" => Some(Self::Calm),
            "energy" => Some(Self::Energy),
            "fatigue" => Some(Self::Fatigue),
            "stress" => Some(Self::Stress),
            "lonely" => Some(Self::Lonely),
            "social" => Some(Self::Social),
            "reflective" => Some(Self::Reflective),
            _ => None,
        }
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateMoodRequest {
    #[validate(length(max = 500, message = "Mood text too long"))]
    pub text: Option<String>,

    #[validate(range(min = -90.0, max = 90.0, message = "Latitude out of range"))]
    pub lat: Option<f64>,

    #[validate(range(min = -180.0, max = 180.0, message = "Longitude out of range"))]
    pub lng: Option<f64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_known_labels() {
        assert_eq!(MoodLabel::parse("joy"), Some(MoodLabel::Joy));
        assert_eq!(MoodLabel::parse("  Calm "), Some(MoodLabel::Calm));
        assert_eq!(MoodLabel::parse("REFLECTIVE"), Some(MoodLabel::Reflective));
    }

    #[test]
    fn test_parse_unknown_label() {
        assert_eq!(MoodLabel::parse("euphoric"), None);
        assert_eq!(MoodLabel::parse(""), None);
    }
}
