use crate::{
    dto::dashboard::{DashboardResponse, NO_DURATION},
    duration,
    error::ServiceError,
    services::leaderboard_service::{current_year, rank_best_times, year_bounds},
    state::{CurrentUser, SharedState},
};

/// Personal overview for `user`: best time and rank, recent attempts and this year's total.
pub async fn dashboard(
    state: &SharedState,
    user: &CurrentUser,
) -> Result<DashboardResponse, ServiceError> {
    let store = state.require_store().await?;

    let board = rank_best_times(store.best_attempts().await?, user.id);
    let total_users = u32::try_from(board.len()).unwrap_or(u32::MAX);
    let mine = board.into_iter().find(|entry| entry.is_current_user);

    let recent_attempts = store
        .list_attempts(user.id)
        .await?
        .into_iter()
        .take(state.config().recent_attempts)
        .map(Into::into)
        .collect();

    let year = current_year();
    let (from, until) = year_bounds(year)?;
    let total_time = store
        .total_durations(from, until)
        .await?
        .into_iter()
        .find(|total| total.user_id == user.id)
        .map_or(0, |total| total.total_seconds);

    Ok(DashboardResponse {
        display_name: user.display_name.clone(),
        personal_best: mine.as_ref().map(|entry| entry.best_time),
        personal_best_display: mine
            .as_ref()
            .map_or_else(|| NO_DURATION.to_owned(), |entry| entry.best_time_display.clone()),
        rank: mine.as_ref().map(|entry| entry.rank),
        total_users,
        recent_attempts,
        year,
        total_time,
        total_time_display: if total_time > 0 {
            duration::format(total_time)
        } else {
            NO_DURATION.to_owned()
        },
    })
}
