use serde::{Deserialize, Serialize};
use std::time::SystemTime;
use uuid::Uuid;

/// Registered participant.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct UserEntity {
    /// Stable identifier for the user.
    pub id: Uuid,
    /// Login email, unique across users.
    pub email: String,
    /// Argon2 PHC string; the plaintext password is never stored.
    pub password_hash: String,
    /// Name shown on leaderboards.
    pub display_name: String,
    /// Registration timestamp.
    pub created_at: SystemTime,
}

/// One recorded plank attempt.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AttemptEntity {
    /// Primary key of the attempt.
    pub id: Uuid,
    /// Owner of the attempt.
    pub user_id: Uuid,
    /// Held duration in whole seconds (1..=3600).
    pub duration_seconds: u32,
    /// When the attempt happened; may be backdated by the client.
    pub attempted_at: SystemTime,
    /// Whether this attempt is currently the owner's personal best.
    pub is_personal_best: bool,
}

/// Attempt data supplied by the service before the store decides personal-best status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewAttemptEntity {
    /// Owner of the attempt.
    pub user_id: Uuid,
    /// Held duration in whole seconds.
    pub duration_seconds: u32,
    /// When the attempt happened.
    pub attempted_at: SystemTime,
}

/// Outcome of recording an attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedAttempt {
    /// The stored attempt, personal-best flag included.
    pub attempt: AttemptEntity,
    /// Previous personal best whose flag was cleared, if any.
    pub superseded: Option<Uuid>,
}

/// Best attempt of a single user, used for rankings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserBestEntity {
    /// User owning the best attempt.
    pub user_id: Uuid,
    /// Display name of that user.
    pub display_name: String,
    /// Longest duration recorded by the user.
    pub duration_seconds: u32,
    /// When that duration was achieved.
    pub attempted_at: SystemTime,
}

/// Cumulative time of a single user over a period.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserTotalEntity {
    /// User the total belongs to.
    pub user_id: Uuid,
    /// Display name of that user.
    pub display_name: String,
    /// Sum of attempt durations in the period, in seconds.
    pub total_seconds: u64,
}

/// Decide whether a new duration beats the current maximum.
///
/// Only a strictly greater duration takes the title; the first user attempt always does.
pub fn beats_best(current_best: Option<u32>, candidate: u32) -> bool {
    current_best.is_none_or(|best| candidate > best)
}
