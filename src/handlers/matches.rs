use axum::{
    extract::{Query, State},
    Extension, Json,
};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use sqlx::FromRow;

use crate::auth::middleware::AuthUser;
use crate::error::{AppError, AppResult};
use crate::models::mood_event::{MoodEvent, MoodLabel};
use crate::services::matching::{self, CandidateProfile, MatchSuggestion, CANDIDATE_POOL_LIMIT};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct SuggestionsQuery {
    pub radius_m: Option<f64>,
    #[serde(default = "default_anonymous")]
    pub anonymous: bool,
}

fn default_anonymous() -> bool {
    true
}

#[derive(FromRow)]
struct CandidateRow {
    id: i64,
    user_id: i64,
    text: Option<String>,
    mood_label: MoodLabel,
    mood_score: f64,
    lat: Option<f64>,
    lng: Option<f64>,
    created_at: DateTime<Utc>,
    display_name: Option<String>,
}

pub async fn match_suggestions(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Query(query): Query<SuggestionsQuery>,
) -> AppResult<Json<Vec<MatchSuggestion>>> {
    let radius_m = query
        .radius_m
        .unwrap_or(state.config.default_matching_radius_m);

    // The subject's current state is their single most recent mood event.
    let subject = sqlx::query_as::<_, MoodEvent>(
        r#"
        SELECT * FROM mood_events
        WHERE user_id = $1
        ORDER BY created_at DESC
        LIMIT 1
        "#,
    )
    .bind(auth_user.id)
    .fetch_optional(&state.db)
    .await?
    .ok_or(AppError::LocationRequired)?;

    // Pool preconditions: located events only, the subject's own event
    // excluded, newest first, capped before ranking.
    let rows = sqlx::query_as::<_, CandidateRow>(
        r#"
        SELECT m.id, m.user_id, m.text, m.mood_label, m.mood_score,
               m.lat, m.lng, m.created_at, u.display_name
        FROM mood_events m
        JOIN users u ON u.id = m.user_id
        WHERE m.id != $1 AND m.lat IS NOT NULL AND m.lng IS NOT NULL
        ORDER BY m.created_at DESC
        LIMIT $2
        "#,
    )
    .bind(subject.id)
    .bind(CANDIDATE_POOL_LIMIT)
    .fetch_all(&state.db)
    .await?;

    let pool: Vec<(MoodEvent, CandidateProfile)> = rows
        .into_iter()
        .map(|r| {
            (
                MoodEvent {
                    id: r.id,
                    user_id: r.user_id,
                    text: r.text,
                    mood_label: r.mood_label,
                    mood_score: r.mood_score,
                    lat: r.lat,
                    lng: r.lng,
                    created_at: r.created_at,
                },
                CandidateProfile {
                    user_id: r.user_id,
                    display_name: r.display_name,
                },
            )
        })
        .collect();

    let suggestions = matching::find_matches(&subject, &pool, radius_m, query.anonymous)?;

    tracing::debug!(
        user_id = auth_user.id,
        pool_size = pool.len(),
        matched = suggestions.len(),
        radius_m,
        "Match suggestions computed"
    );

    Ok(Json(suggestions))
}
