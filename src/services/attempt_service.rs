use std::time::SystemTime;

use tracing::{debug, info};

use crate::{
    dao::models::NewAttemptEntity,
    dto::{
        attempt::{AttemptView, CreateAttemptRequest, CreateAttemptResponse},
        parse_timestamp,
        validation::validate_attempt_duration,
    },
    error::ServiceError,
    state::{CurrentUser, SharedState},
};

/// Validate and record an attempt for `user`, maintaining the personal-best flag.
///
/// Every check runs before anything is written. The best-time comparison, the
/// flag move and the insert happen while holding the user's attempt lock.
pub async fn create_attempt(
    state: &SharedState,
    user: &CurrentUser,
    request: CreateAttemptRequest,
) -> Result<CreateAttemptResponse, ServiceError> {
    let duration_seconds = validate_attempt_duration(request.duration_seconds)?;
    let attempted_at = match request.attempted_at.as_deref().filter(|raw| !raw.is_empty()) {
        Some(raw) => parse_timestamp(raw)
            .ok_or_else(|| ServiceError::InvalidInput("Invalid date format".into()))?,
        None => SystemTime::now(),
    };

    let store = state.require_store().await?;
    let lock = state.attempt_lock(user.id);
    let recorded = {
        let _serialized = lock.lock().await;
        store
            .record_attempt(NewAttemptEntity {
                user_id: user.id,
                duration_seconds,
                attempted_at,
            })
            .await?
    };

    if let Some(previous) = recorded.superseded {
        debug!(user_id = %user.id, %previous, "personal best superseded");
    }
    info!(
        user_id = %user.id,
        attempt_id = %recorded.attempt.id,
        duration_seconds,
        personal_best = recorded.attempt.is_personal_best,
        "attempt recorded"
    );

    Ok(recorded.attempt.into())
}

/// Attempts of `user`, newest first.
pub async fn list_attempts(
    state: &SharedState,
    user: &CurrentUser,
) -> Result<Vec<AttemptView>, ServiceError> {
    let store = state.require_store().await?;
    let attempts = store.list_attempts(user.id).await?;
    Ok(attempts.into_iter().map(Into::into).collect())
}
