use axum::{Router, middleware};

use crate::state::SharedState;

/// Attempt logging and history.
pub mod attempts;
/// Registration, login and logout.
pub mod auth;
/// OpenAPI document and Swagger UI.
pub mod docs;
pub mod guard;
/// Health check.
pub mod health;
/// Best-time and cumulative leaderboards.
pub mod leaderboard;
pub mod pages;

/// Compose all route trees behind the session guard.
pub fn router(state: SharedState) -> Router<()> {
    health::router()
        .merge(auth::router())
        .merge(attempts::router())
        .merge(leaderboard::router())
        .merge(pages::router())
        .merge(docs::router())
        .layer(middleware::from_fn_with_state(
            state.clone(),
            guard::require_session,
        ))
        .with_state(state)
}
