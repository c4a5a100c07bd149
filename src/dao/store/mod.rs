pub mod memory;
/// MongoDB backend.
#[cfg(feature = "mongo-store")]
pub mod mongodb;

use std::time::SystemTime;

use futures::future::BoxFuture;
use uuid::Uuid;

use crate::dao::models::{
    AttemptEntity, NewAttemptEntity, RecordedAttempt, UserBestEntity, UserEntity, UserTotalEntity,
};
use crate::dao::storage::StorageResult;

/// Abstraction over the persistence layer for users and attempts.
pub trait PlankStore: Send + Sync {
    /// Short backend name reported by the health check.
    fn backend(&self) -> &'static str;
    /// Insert a user; fails with a conflict when the email is already taken.
    fn create_user(&self, user: UserEntity) -> BoxFuture<'static, StorageResult<()>>;
    /// Look up a user by exact email.
    fn find_user_by_email(&self, email: String)
    -> BoxFuture<'static, StorageResult<Option<UserEntity>>>;
    /// Insert an attempt and maintain the owner's personal-best flag as one unit of work.
    fn record_attempt(
        &self,
        attempt: NewAttemptEntity,
    ) -> BoxFuture<'static, StorageResult<RecordedAttempt>>;
    /// Attempts of `user_id`, newest first.
    fn list_attempts(&self, user_id: Uuid) -> BoxFuture<'static, StorageResult<Vec<AttemptEntity>>>;
    /// Best attempt of every user that has at least one, in registration order.
    fn best_attempts(&self) -> BoxFuture<'static, StorageResult<Vec<UserBestEntity>>>;
    /// Per-user sums of durations attempted in `[from, until)`, in registration order.
    fn total_durations(
        &self,
        from: SystemTime,
        until: SystemTime,
    ) -> BoxFuture<'static, StorageResult<Vec<UserTotalEntity>>>;
    /// Cheap round trip proving the backend answers.
    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>>;
    /// Re-establish the connection after a failed health check.
    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>>;
}
