//! Page routes. Presentation lives elsewhere, so these return view data or plain text.

use axum::{Extension, Json, Router, extract::State, routing::get};

use crate::{
    dto::{dashboard::DashboardResponse, error::ErrorBody},
    error::AppError,
    services::dashboard_service,
    state::{CurrentUser, SharedState},
};

const PRIVACY_NOTICE: &str = "Privacy: we store your email, display name, a salted hash of \
your password and the plank attempts you log. Attempts are shown to other signed-in users \
on the leaderboards together with your display name. Nothing is shared outside this service.";

/// Dashboard and page routes.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/", get(dashboard))
        .route("/api/dashboard", get(dashboard_api))
        .route("/privacy", get(privacy))
        .route("/login", get(|| async { "Sign in with POST /api/auth/login" }))
        .route(
            "/register",
            get(|| async { "Create an account with POST /api/auth/register" }),
        )
}

/// Landing page data for the signed-in user.
#[utoipa::path(
    get,
    path = "/",
    tag = "dashboard",
    responses(
        (status = 200, description = "Dashboard", body = DashboardResponse),
        (status = 303, description = "No session; redirected to /login")
    )
)]
pub async fn dashboard(
    State(state): State<SharedState>,
    Extension(user): Extension<CurrentUser>,
) -> Result<Json<DashboardResponse>, AppError> {
    Ok(Json(dashboard_service::dashboard(&state, &user).await?))
}

/// Same data as `/`, answering 401 instead of redirecting.
#[utoipa::path(
    get,
    path = "/api/dashboard",
    tag = "dashboard",
    responses(
        (status = 200, description = "Dashboard", body = DashboardResponse),
        (status = 401, description = "No session", body = ErrorBody)
    )
)]
pub async fn dashboard_api(
    state: State<SharedState>,
    user: Extension<CurrentUser>,
) -> Result<Json<DashboardResponse>, AppError> {
    dashboard(state, user).await
}

async fn privacy() -> &'static str {
    PRIVACY_NOTICE
}
