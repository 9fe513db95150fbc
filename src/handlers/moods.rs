use axum::{
    extract::{Query, State},
    Extension, Json,
};
use serde::Deserialize;
use sqlx::FromRow;
use validator::Validate;

use crate::auth::middleware::AuthUser;
use crate::error::{AppError, AppResult};
use crate::models::mood_event::{CreateMoodRequest, MoodEvent, MoodLabel};
use crate::services::matching::{self, MatchSuggestion, CANDIDATE_POOL_LIMIT};
use crate::AppState;

pub async fn submit_mood(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Json(body): Json<CreateMoodRequest>,
) -> AppResult<Json<MoodEvent>> {
    body.validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    // Coordinates come in pairs.
    if body.lat.is_some() != body.lng.is_some() {
        return Err(AppError::Validation(
            "lat and lng must be provided together".into(),
        ));
    }

    let reading = state.classifier.classify(body.text.as_deref()).await;

    let event = sqlx::query_as::<_, MoodEvent>(
        r#"
        INSERT INTO mood_events (user_id, text, mood_label, mood_score, lat, lng)
        VALUES ($1, $2, $3, $4, $5, $6)
        RETURNING *
        "#,
    )
    .bind(auth_user.id)
    .bind(&body.text)
    .bind(reading.label)
    .bind(reading.score)
    .bind(body.lat)
    .bind(body.lng)
    .fetch_one(&state.db)
    .await?;

    tracing::info!(
        user_id = auth_user.id,
        mood = ?event.mood_label,
        located = event.lat.is_some(),
        "Mood event recorded"
    );

    Ok(Json(event))
}

pub async fn list_my_moods(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
) -> AppResult<Json<Vec<MoodEvent>>> {
    let moods = sqlx::query_as::<_, MoodEvent>(
        r#"
        SELECT * FROM mood_events
        WHERE user_id = $1
        ORDER BY created_at DESC
        LIMIT 50
        "#,
    )
    .bind(auth_user.id)
    .fetch_all(&state.db)
    .await?;

    Ok(Json(moods))
}

#[derive(Debug, Deserialize)]
pub struct NearbyQuery {
    pub lat: f64,
    pub lng: f64,
    pub radius_m: Option<f64>,
}

#[derive(FromRow)]
struct NearbyRow {
    user_id: i64,
    mood_label: MoodLabel,
    lat: Option<f64>,
    lng: Option<f64>,
    display_name: Option<String>,
}

/// Approximate metres-to-degrees conversion for the SQL window prefilter.
/// One degree of latitude is ~111 km.
fn meters_to_degrees(delta_m: f64) -> f64 {
    delta_m / 111_000.0
}

/// Latest located mood per user around a point. The degree window only
/// narrows the scan; inclusion is decided by the exact haversine distance.
pub async fn nearby_moods(
    State(state): State<AppState>,
    Extension(_auth_user): Extension<AuthUser>,
    Query(query): Query<NearbyQuery>,
) -> AppResult<Json<Vec<MatchSuggestion>>> {
    let radius_m = query
        .radius_m
        .unwrap_or(state.config.default_matching_radius_m);
    let deg = meters_to_degrees(radius_m);

    let rows = sqlx::query_as::<_, NearbyRow>(
        r#"
        SELECT DISTINCT ON (m.user_id)
               m.user_id, m.mood_label, m.lat, m.lng, u.display_name
        FROM mood_events m
        JOIN users u ON u.id = m.user_id
        WHERE m.lat IS NOT NULL AND m.lng IS NOT NULL
          AND m.lat BETWEEN $1 AND $2
          AND m.lng BETWEEN $3 AND $4
        ORDER BY m.user_id, m.created_at DESC
        LIMIT $5
        "#,
    )
    .bind(query.lat - deg)
    .bind(query.lat + deg)
    .bind(query.lng - deg)
    .bind(query.lng + deg)
    .bind(CANDIDATE_POOL_LIMIT)
    .fetch_all(&state.db)
    .await?;

    let mut out = Vec::with_capacity(rows.len());
    for row in rows {
        let (Some(lat), Some(lng)) = (row.lat, row.lng) else {
            continue;
        };
        let distance = matching::haversine_m(query.lat, query.lng, lat, lng);
        if distance > radius_m {
            continue;
        }
        let display_name = row
            .display_name
            .unwrap_or_else(|| matching::pseudonym(row.user_id));
        out.push(MatchSuggestion {
            user_id: row.user_id,
            distance_m: Some(matching::round_distance_m(distance)),
            mood_label: row.mood_label,
            display_name,
            lat: row.lat,
            lng: row.lng,
        });
    }

    matching::sort_by_distance(&mut out);
    Ok(Json(out))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_meters_to_degrees() {
        assert!((meters_to_degrees(111_000.0) - 1.0).abs() < 1e-9);
        assert!((meters_to_degrees(1500.0) - 0.01351).abs() < 1e-4);
    }
}
