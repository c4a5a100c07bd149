use axum::{
    Extension, Json, Router,
    extract::{Query, State},
    routing::get,
};

use crate::{
    dto::{
        error::ErrorBody,
        leaderboard::{LeaderboardEntry, TotalTimeEntry, TotalTimeQuery},
    },
    error::AppError,
    services::leaderboard_service,
    state::{CurrentUser, SharedState},
};

/// Both leaderboards.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/api/leaderboard", get(best_times))
        .route("/api/leaderboard/total", get(total_times))
}

/// Best plank of every user who logged one, longest first.
#[utoipa::path(
    get,
    path = "/api/leaderboard",
    tag = "leaderboard",
    responses(
        (status = 200, description = "Best-time ranking", body = [LeaderboardEntry]),
        (status = 401, description = "No session", body = ErrorBody)
    )
)]
pub async fn best_times(
    State(state): State<SharedState>,
    Extension(user): Extension<CurrentUser>,
) -> Result<Json<Vec<LeaderboardEntry>>, AppError> {
    Ok(Json(leaderboard_service::best_times(&state, &user).await?))
}

/// Cumulative plank time per user over a calendar year.
#[utoipa::path(
    get,
    path = "/api/leaderboard/total",
    tag = "leaderboard",
    params(TotalTimeQuery),
    responses(
        (status = 200, description = "Total-time ranking", body = [TotalTimeEntry]),
        (status = 400, description = "Invalid year", body = ErrorBody),
        (status = 401, description = "No session", body = ErrorBody)
    )
)]
pub async fn total_times(
    State(state): State<SharedState>,
    Extension(user): Extension<CurrentUser>,
    Query(query): Query<TotalTimeQuery>,
) -> Result<Json<Vec<TotalTimeEntry>>, AppError> {
    Ok(Json(
        leaderboard_service::total_times(&state, &user, query).await?,
    ))
}
