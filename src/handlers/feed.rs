use axum::{extract::State, Extension, Json};
use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;

use crate::auth::middleware::AuthUser;
use crate::error::AppResult;
use crate::models::mood_event::MoodLabel;
use crate::AppState;

/// One feed entry, shaped for the mobile client. Likes and comments are
/// placeholders until social reactions land.
#[derive(Debug, Serialize)]
pub struct FeedPost {
    pub id: String,
    pub author: String,
    pub content: String,
    pub timestamp: DateTime<Utc>,
    pub likes: i64,
    pub comments: i64,
    pub mood: MoodLabel,
}

#[derive(FromRow)]
struct FeedRow {
    id: i64,
    text: Option<String>,
    mood_label: MoodLabel,
    created_at: DateTime<Utc>,
    display_name: Option<String>,
}

/// A feed of the latest mood events across all users.
pub async fn list_feed_posts(
    State(state): State<AppState>,
    Extension(_auth_user): Extension<AuthUser>,
) -> AppResult<Json<Vec<FeedPost>>> {
    let rows = sqlx::query_as::<_, FeedRow>(
        r#"
        SELECT m.id, m.text, m.mood_label, m.created_at, u.display_name
        FROM mood_events m
        JOIN users u ON u.id = m.user_id
        ORDER BY m.created_at DESC
        LIMIT 50
        "#,
    )
    .fetch_all(&state.db)
    .await?;

    let posts = rows
        .into_iter()
        .map(|r| FeedPost {
            id: r.id.to_string(),
            author: r.display_name.unwrap_or_else(|| "Utilisateur".into()),
            content: r.text.unwrap_or_default(),
            timestamp: r.created_at,
            likes: 0,
            comments: 0,
            mood: r.mood_label,
        })
        .collect();

    Ok(Json(posts))
}
