use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

/// One row of the best-time leaderboard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LeaderboardEntry {
    /// 1-based position; rank 1 holds the longest plank.
    pub rank: u32,
    /// User identifier.
    pub id: Uuid,
    /// Name shown for the user.
    pub display_name: String,
    /// Best duration in seconds.
    pub best_time: u32,
    /// `mm:ss` rendering of `best_time`.
    pub best_time_display: String,
    /// RFC 3339 timestamp of the best attempt.
    pub achieved_at: String,
    /// Whether the row belongs to the caller.
    pub is_current_user: bool,
}

/// One row of the cumulative-time leaderboard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TotalTimeEntry {
    /// 1-based position; rank 1 held the plank longest in total.
    pub rank: u32,
    /// User identifier.
    pub id: Uuid,
    /// Name shown for the user.
    pub display_name: String,
    /// Sum of durations in the requested year, in seconds.
    pub total_time: u64,
    /// `mm:ss` rendering of `total_time`.
    pub total_time_display: String,
    /// Whether the row belongs to the caller.
    pub is_current_user: bool,
}

/// Query string of the cumulative-time leaderboard.
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
pub struct TotalTimeQuery {
    /// Calendar year (UTC); defaults to the current year.
    pub year: Option<i32>,
}
