use axum::{Extension, Json, Router, extract::State, routing::get};

use crate::{
    dto::{
        attempt::{AttemptView, CreateAttemptRequest, CreateAttemptResponse},
        error::ErrorBody,
    },
    error::AppError,
    services::attempt_service,
    state::{CurrentUser, SharedState},
};

/// Attempt endpoints scoped to the signed-in user.
pub fn router() -> Router<SharedState> {
    Router::new().route("/api/attempts", get(list_attempts).post(create_attempt))
}

/// Log a new attempt; the response says whether it is a personal best.
#[utoipa::path(
    post,
    path = "/api/attempts",
    tag = "attempts",
    request_body = CreateAttemptRequest,
    responses(
        (status = 200, description = "Attempt recorded", body = CreateAttemptResponse),
        (status = 400, description = "Invalid duration or date", body = ErrorBody),
        (status = 401, description = "No session", body = ErrorBody),
        (status = 503, description = "Storage unavailable", body = ErrorBody)
    )
)]
pub async fn create_attempt(
    State(state): State<SharedState>,
    Extension(user): Extension<CurrentUser>,
    Json(request): Json<CreateAttemptRequest>,
) -> Result<Json<CreateAttemptResponse>, AppError> {
    Ok(Json(
        attempt_service::create_attempt(&state, &user, request).await?,
    ))
}

/// The caller's attempts, newest first.
#[utoipa::path(
    get,
    path = "/api/attempts",
    tag = "attempts",
    responses(
        (status = 200, description = "Attempts of the caller", body = [AttemptView]),
        (status = 401, description = "No session", body = ErrorBody)
    )
)]
pub async fn list_attempts(
    State(state): State<SharedState>,
    Extension(user): Extension<CurrentUser>,
) -> Result<Json<Vec<AttemptView>>, AppError> {
    Ok(Json(attempt_service::list_attempts(&state, &user).await?))
}
