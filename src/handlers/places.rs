use axum::{extract::State, Extension, Json};
use serde::Serialize;

use crate::auth::middleware::AuthUser;
use crate::error::{AppError, AppResult};
use crate::models::mood_event::MoodEvent;
use crate::AppState;

#[derive(Debug, Serialize)]
pub struct PlaceSuggestion {
    pub name: String,
    pub lat: f64,
    pub lng: f64,
    #[serde(rename = "type")]
    pub kind: String,
    pub distance_m: Option<f64>,
}

/// Generic safe public spots offset from the caller's latest located mood.
pub async fn suggest_places(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
) -> AppResult<Json<Vec<PlaceSuggestion>>> {
    let last_mood = sqlx::query_as::<_, MoodEvent>(
        r#"
        SELECT * FROM mood_events
        WHERE user_id = $1
        ORDER BY created_at DESC
        LIMIT 1
        "#,
    )
    .bind(auth_user.id)
    .fetch_optional(&state.db)
    .await?;

    let (lat, lng) = match last_mood {
        Some(MoodEvent {
            lat: Some(lat),
            lng: Some(lng),
            ..
        }) => (lat, lng),
        _ => return Err(AppError::LocationRequired),
    };

    Ok(Json(default_spots(lat, lng)))
}

fn default_spots(lat: f64, lng: f64) -> Vec<PlaceSuggestion> {
    let spot = |name: &str, dlat: f64, dlng: f64, kind: &str| PlaceSuggestion {
        name: name.into(),
        lat: lat + dlat,
        lng: lng + dlng,
        kind: kind.into(),
        distance_m: None,
    };
    vec![
        spot("Parc", 0.001, 0.001, "park"),
        spot("Café", -0.001, 0.001, "cafe"),
        spot("Bibliothèque", 0.001, -0.001, "library"),
    ]
}
