use axum::{extract::State, Extension, Json};
use validator::Validate;

use crate::auth::middleware::AuthUser;
use crate::error::{AppError, AppResult};
use crate::models::feedback::{CreateFeedbackRequest, Feedback};
use crate::AppState;

pub async fn submit_feedback(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Json(body): Json<CreateFeedbackRequest>,
) -> AppResult<Json<Feedback>> {
    body.validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let feedback = sqlx::query_as::<_, Feedback>(
        r#"
        INSERT INTO feedbacks (user_id, mood_event_id, sentiment, note)
        VALUES ($1, $2, $3, $4)
        RETURNING *
        "#,
    )
    .bind(auth_user.id)
    .bind(body.mood_event_id)
    .bind(&body.sentiment)
    .bind(&body.note)
    .fetch_one(&state.db)
    .await?;

    Ok(Json(feedback))
}

pub async fn list_my_feedback(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
) -> AppResult<Json<Vec<Feedback>>> {
    let feedback = sqlx::query_as::<_, Feedback>(
        r#"
        SELECT * FROM feedbacks
        WHERE user_id = $1
        ORDER BY created_at DESC
        LIMIT 50
        "#,
    )
    .bind(auth_user.id)
    .fetch_all(&state.db)
    .await?;

    Ok(Json(feedback))
}
