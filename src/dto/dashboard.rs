use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::dto::attempt::AttemptView;

/// Placeholder shown when a duration is not available.
pub const NO_DURATION: &str = "--:--";

/// Personal overview shown on the landing page.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DashboardResponse {
    /// Name of the signed-in user.
    pub display_name: String,
    /// Best duration in seconds, absent before the first attempt.
    pub personal_best: Option<u32>,
    /// `mm:ss` personal best, or `--:--`.
    pub personal_best_display: String,
    /// Position on the best-time leaderboard, absent before the first attempt.
    pub rank: Option<u32>,
    /// Number of users with at least one attempt.
    pub total_users: u32,
    /// Latest attempts, newest first.
    pub recent_attempts: Vec<AttemptView>,
    /// Calendar year the cumulative time covers.
    pub year: i32,
    /// Sum of durations attempted this year, in seconds.
    pub total_time: u64,
    /// `mm:ss` rendering of `total_time`.
    pub total_time_display: String,
}
