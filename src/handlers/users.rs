use axum::{extract::State, Extension, Json};
use validator::Validate;

use crate::auth::middleware::AuthUser;
use crate::error::{AppError, AppResult};
use crate::models::user::{UpdateProfileRequest, User};
use crate::AppState;

pub async fn me(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
) -> AppResult<Json<User>> {
    let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
        .bind(auth_user.id)
        .fetch_optional(&state.db)
        .await?
        .ok_or(AppError::NotFound("User not found".into()))?;

    Ok(Json(user))
}

pub async fn update_me(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Json(body): Json<UpdateProfileRequest>,
) -> AppResult<Json<User>> {
    body.validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
        .bind(auth_user.id)
        .fetch_optional(&state.db)
        .await?
        .ok_or(AppError::NotFound("User not found".into()))?;

    // An omitted field keeps its value; a present-but-blank field clears it.
    let display_name = match body.display_name {
        Some(s) => clean(&s),
        None => user.display_name,
    };
    let bio = match body.bio {
        Some(s) => clean(&s),
        None => user.bio,
    };

    let updated = sqlx::query_as::<_, User>(
        r#"
        UPDATE users SET display_name = $2, bio = $3, updated_at = NOW()
        WHERE id = $1
        RETURNING *
        "#,
    )
    .bind(auth_user.id)
    .bind(&display_name)
    .bind(&bio)
    .fetch_one(&state.db)
    .await?;

    Ok(Json(updated))
}

fn clean(s: &str) -> Option<String> {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}
