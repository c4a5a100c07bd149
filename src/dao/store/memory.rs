//! In-process store used when no database is configured and by the test-suite.

use std::{collections::HashMap, sync::Arc, time::SystemTime};

use futures::future::BoxFuture;
use indexmap::IndexMap;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::dao::{
    models::{
        AttemptEntity, NewAttemptEntity, RecordedAttempt, UserBestEntity, UserEntity,
        UserTotalEntity, beats_best,
    },
    storage::{StorageError, StorageResult},
    store::PlankStore,
};

/// Volatile store keeping everything behind a single lock.
///
/// Every write takes the write half of the lock, which makes the
/// personal-best update and the insert a single atomic step.
#[derive(Clone, Default)]
pub struct MemoryStore {
    inner: Arc<RwLock<MemoryInner>>,
}

#[derive(Default)]
struct MemoryInner {
    users: IndexMap<Uuid, UserEntity>,
    emails: HashMap<String, Uuid>,
    attempts: Vec<AttemptEntity>,
}

impl MemoryInner {
    fn user_attempts(&self, user_id: Uuid) -> impl Iterator<Item = &AttemptEntity> {
        self.attempts
            .iter()
            .filter(move |attempt| attempt.user_id == user_id)
    }

    /// Longest attempt of the user; on ties the earliest recorded wins.
    fn best_of(&self, user_id: Uuid) -> Option<&AttemptEntity> {
        self.user_attempts(user_id).fold(None, |best, attempt| match best {
            Some(current) if current.duration_seconds >= attempt.duration_seconds => Some(current),
            _ => Some(attempt),
        })
    }
}

impl MemoryStore {
    /// Empty store.
    pub fn new() -> Self {
        Self::default()
    }

    async fn create_user(&self, user: UserEntity) -> StorageResult<()> {
        let mut guard = self.inner.write().await;
        if guard.emails.contains_key(&user.email) {
            return Err(StorageError::conflict(format!(
                "email `{}` already registered",
                user.email
            )));
        }
        guard.emails.insert(user.email.clone(), user.id);
        guard.users.insert(user.id, user);
        Ok(())
    }

    async fn find_user_by_email(&self, email: &str) -> Option<UserEntity> {
        let guard = self.inner.read().await;
        guard
            .emails
            .get(email)
            .and_then(|id| guard.users.get(id))
            .cloned()
    }

    async fn record_attempt(&self, new: NewAttemptEntity) -> RecordedAttempt {
        let mut guard = self.inner.write().await;

        let current_best = guard.best_of(new.user_id).map(|a| a.duration_seconds);
        let is_personal_best = beats_best(current_best, new.duration_seconds);

        let mut superseded = None;
        if is_personal_best {
            for attempt in guard.attempts.iter_mut() {
                if attempt.user_id == new.user_id && attempt.is_personal_best {
                    attempt.is_personal_best = false;
                    superseded = Some(attempt.id);
                }
            }
        }

        let attempt = AttemptEntity {
            id: Uuid::new_v4(),
            user_id: new.user_id,
            duration_seconds: new.duration_seconds,
            attempted_at: new.attempted_at,
            is_personal_best,
        };
        guard.attempts.push(attempt.clone());

        RecordedAttempt {
            attempt,
            superseded,
        }
    }

    async fn list_attempts(&self, user_id: Uuid) -> Vec<AttemptEntity> {
        let guard = self.inner.read().await;
        let mut attempts: Vec<AttemptEntity> = guard.user_attempts(user_id).cloned().collect();
        attempts.sort_by(|a, b| b.attempted_at.cmp(&a.attempted_at));
        attempts
    }

    async fn best_attempts(&self) -> Vec<UserBestEntity> {
        let guard = self.inner.read().await;
        guard
            .users
            .values()
            .filter_map(|user| {
                guard.best_of(user.id).map(|best| UserBestEntity {
                    user_id: user.id,
                    display_name: user.display_name.clone(),
                    duration_seconds: best.duration_seconds,
                    attempted_at: best.attempted_at,
                })
            })
            .collect()
    }

    async fn total_durations(&self, from: SystemTime, until: SystemTime) -> Vec<UserTotalEntity> {
        let guard = self.inner.read().await;
        guard
            .users
            .values()
            .filter_map(|user| {
                let mut in_range = guard
                    .user_attempts(user.id)
                    .filter(|a| a.attempted_at >= from && a.attempted_at < until)
                    .peekable();
                in_range.peek()?;
                let total_seconds = in_range.map(|a| u64::from(a.duration_seconds)).sum();
                Some(UserTotalEntity {
                    user_id: user.id,
                    display_name: user.display_name.clone(),
                    total_seconds,
                })
            })
            .collect()
    }
}

impl PlankStore for MemoryStore {
    fn backend(&self) -> &'static str {
        "memory"
    }

    fn create_user(&self, user: UserEntity) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.create_user(user).await })
    }

    fn find_user_by_email(
        &self,
        email: String,
    ) -> BoxFuture<'static, StorageResult<Option<UserEntity>>> {
        let store = self.clone();
        Box::pin(async move { Ok(store.find_user_by_email(&email).await) })
    }

    fn record_attempt(
        &self,
        attempt: NewAttemptEntity,
    ) -> BoxFuture<'static, StorageResult<RecordedAttempt>> {
        let store = self.clone();
        Box::pin(async move { Ok(store.record_attempt(attempt).await) })
    }

    fn list_attempts(&self, user_id: Uuid) -> BoxFuture<'static, StorageResult<Vec<AttemptEntity>>> {
        let store = self.clone();
        Box::pin(async move { Ok(store.list_attempts(user_id).await) })
    }

    fn best_attempts(&self) -> BoxFuture<'static, StorageResult<Vec<UserBestEntity>>> {
        let store = self.clone();
        Box::pin(async move { Ok(store.best_attempts().await) })
    }

    fn total_durations(
        &self,
        from: SystemTime,
        until: SystemTime,
    ) -> BoxFuture<'static, StorageResult<Vec<UserTotalEntity>>> {
        let store = self.clone();
        Box::pin(async move { Ok(store.total_durations(from, until).await) })
    }

    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
        Box::pin(async { Ok(()) })
    }

    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>> {
        Box::pin(async { Ok(()) })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn user(email: &str, name: &str) -> UserEntity {
        UserEntity {
            id: Uuid::new_v4(),
            email: email.into(),
            password_hash: "$argon2id$stub".into(),
            display_name: name.into(),
            created_at: SystemTime::now(),
        }
    }

    fn at(secs: u64) -> SystemTime {
        SystemTime::UNIX_EPOCH + Duration::from_secs(secs)
    }

    fn attempt(user_id: Uuid, duration_seconds: u32, when: u64) -> NewAttemptEntity {
        NewAttemptEntity {
            user_id,
            duration_seconds,
            attempted_at: at(when),
        }
    }

    async fn flagged(store: &MemoryStore, user_id: Uuid) -> Vec<AttemptEntity> {
        store
            .list_attempts(user_id)
            .await
            .into_iter()
            .filter(|a| a.is_personal_best)
            .collect()
    }

    #[tokio::test]
    async fn duplicate_email_is_a_conflict() {
        let store = MemoryStore::new();
        store.create_user(user("a@example.com", "Ann")).await.unwrap();
        let err = store
            .create_user(user("a@example.com", "Other"))
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::Conflict { .. }));
    }

    #[tokio::test]
    async fn first_attempt_is_personal_best() {
        let store = MemoryStore::new();
        let ann = user("a@example.com", "Ann");
        store.create_user(ann.clone()).await.unwrap();

        let recorded = store.record_attempt(attempt(ann.id, 30, 10)).await;
        assert!(recorded.attempt.is_personal_best);
        assert_eq!(recorded.superseded, None);
    }

    #[tokio::test]
    async fn longer_attempt_moves_the_flag() {
        let store = MemoryStore::new();
        let ann = user("a@example.com", "Ann");
        store.create_user(ann.clone()).await.unwrap();

        let first = store.record_attempt(attempt(ann.id, 30, 10)).await;
        let second = store.record_attempt(attempt(ann.id, 45, 20)).await;

        assert!(second.attempt.is_personal_best);
        assert_eq!(second.superseded, Some(first.attempt.id));
        let flagged = flagged(&store, ann.id).await;
        assert_eq!(flagged.len(), 1);
        assert_eq!(flagged[0].id, second.attempt.id);
    }

    #[tokio::test]
    async fn equal_or_shorter_attempt_keeps_the_flag() {
        let store = MemoryStore::new();
        let ann = user("a@example.com", "Ann");
        store.create_user(ann.clone()).await.unwrap();

        let first = store.record_attempt(attempt(ann.id, 60, 10)).await;
        let equal = store.record_attempt(attempt(ann.id, 60, 20)).await;
        let shorter = store.record_attempt(attempt(ann.id, 20, 30)).await;

        assert!(!equal.attempt.is_personal_best);
        assert!(!shorter.attempt.is_personal_best);
        let flagged = flagged(&store, ann.id).await;
        assert_eq!(flagged.len(), 1);
        assert_eq!(flagged[0].id, first.attempt.id);
    }

    #[tokio::test]
    async fn concurrent_records_leave_a_single_best() {
        let store = MemoryStore::new();
        let ann = user("a@example.com", "Ann");
        store.create_user(ann.clone()).await.unwrap();

        let tasks: Vec<_> = (1..=20)
            .map(|secs| {
                let store = store.clone();
                let new = attempt(ann.id, secs, u64::from(secs));
                tokio::spawn(async move { store.record_attempt(new).await })
            })
            .collect();
        for task in tasks {
            task.await.unwrap();
        }

        let flagged = flagged(&store, ann.id).await;
        assert_eq!(flagged.len(), 1);
        assert_eq!(flagged[0].duration_seconds, 20);
    }

    #[tokio::test]
    async fn attempts_are_listed_newest_first() {
        let store = MemoryStore::new();
        let ann = user("a@example.com", "Ann");
        store.create_user(ann.clone()).await.unwrap();

        store.record_attempt(attempt(ann.id, 10, 200)).await;
        store.record_attempt(attempt(ann.id, 20, 100)).await;
        store.record_attempt(attempt(ann.id, 30, 300)).await;

        let durations: Vec<u32> = store
            .list_attempts(ann.id)
            .await
            .iter()
            .map(|a| a.duration_seconds)
            .collect();
        assert_eq!(durations, vec![30, 10, 20]);
    }

    #[tokio::test]
    async fn best_attempts_skip_users_without_attempts() {
        let store = MemoryStore::new();
        let ann = user("a@example.com", "Ann");
        let bob = user("b@example.com", "Bob");
        store.create_user(ann.clone()).await.unwrap();
        store.create_user(bob.clone()).await.unwrap();

        store.record_attempt(attempt(ann.id, 40, 10)).await;
        store.record_attempt(attempt(ann.id, 40, 20)).await;

        let bests = store.best_attempts().await;
        assert_eq!(bests.len(), 1);
        assert_eq!(bests[0].user_id, ann.id);
        assert_eq!(bests[0].attempted_at, at(10));
    }

    #[tokio::test]
    async fn totals_only_count_attempts_in_range() {
        let store = MemoryStore::new();
        let ann = user("a@example.com", "Ann");
        let bob = user("b@example.com", "Bob");
        store.create_user(ann.clone()).await.unwrap();
        store.create_user(bob.clone()).await.unwrap();

        store.record_attempt(attempt(ann.id, 40, 99)).await;
        store.record_attempt(attempt(ann.id, 50, 100)).await;
        store.record_attempt(attempt(ann.id, 60, 199)).await;
        store.record_attempt(attempt(bob.id, 70, 200)).await;

        let totals = store.total_durations(at(100), at(200)).await;
        assert_eq!(totals.len(), 1);
        assert_eq!(totals[0].user_id, ann.id);
        assert_eq!(totals[0].total_seconds, 110);
    }
}
