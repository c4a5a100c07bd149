use std::time::{Duration, SystemTime};

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
};
use tokio::time::{MissedTickBehavior, interval};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::{
    dao::{models::UserEntity, storage::StorageError},
    dto::{
        auth::{LoginRequest, LoginResponse, RegisterRequest, RegisterResponse, UserView},
        format_system_time,
    },
    error::ServiceError,
    state::{CurrentUser, SharedState},
};

const EMAIL_TAKEN: &str = "Email already registered";
const BAD_CREDENTIALS: &str = "Invalid email or password";
const SESSION_PURGE_INTERVAL: Duration = Duration::from_secs(10 * 60);

/// Create an account after validating the payload; only the argon2 hash is stored.
pub async fn register(
    state: &SharedState,
    request: RegisterRequest,
) -> Result<RegisterResponse, ServiceError> {
    let input = request.into_input()?;
    let store = state.require_store().await?;

    if store.find_user_by_email(input.email.clone()).await?.is_some() {
        return Err(ServiceError::Conflict(EMAIL_TAKEN.into()));
    }

    let user = UserEntity {
        id: Uuid::new_v4(),
        email: input.email,
        password_hash: hash_password(input.password).await?,
        display_name: input.display_name,
        created_at: SystemTime::now(),
    };

    match store.create_user(user.clone()).await {
        Ok(()) => {}
        // Lost a race against a concurrent registration.
        Err(StorageError::Conflict { .. }) => {
            return Err(ServiceError::Conflict(EMAIL_TAKEN.into()));
        }
        Err(err) => return Err(err.into()),
    }

    info!(user_id = %user.id, "user registered");
    Ok(RegisterResponse {
        message: "User created successfully".into(),
        user: user.into(),
    })
}

/// Check credentials and open a session.
pub async fn login(
    state: &SharedState,
    request: LoginRequest,
) -> Result<LoginResponse, ServiceError> {
    let present = |field: Option<String>| field.filter(|value| !value.is_empty());
    let (Some(email), Some(password)) = (present(request.email), present(request.password))
    else {
        return Err(ServiceError::InvalidInput("Email and password required".into()));
    };

    let store = state.require_store().await?;
    let Some(user) = store.find_user_by_email(email).await? else {
        debug!("login for unknown email");
        return Err(ServiceError::Unauthorized(BAD_CREDENTIALS.into()));
    };

    if !verify_password(password, user.password_hash.clone()).await? {
        debug!(user_id = %user.id, "login with wrong password");
        return Err(ServiceError::Unauthorized(BAD_CREDENTIALS.into()));
    }

    let issued = state.sessions().issue(CurrentUser {
        id: user.id,
        email: user.email.clone(),
        display_name: user.display_name.clone(),
    });
    info!(user_id = %user.id, "session opened");

    Ok(LoginResponse {
        token: issued.token,
        expires_at: format_system_time(issued.expires_at),
        user: UserView::from(user),
    })
}

/// Revoke the session behind `token`. Unknown tokens are ignored.
pub fn logout(state: &SharedState, token: &str) {
    if state.sessions().revoke(token) {
        debug!("session revoked");
    }
}

/// Periodically drop expired sessions so the registry does not grow unbounded.
pub async fn run_session_janitor(state: SharedState) {
    let mut ticker = interval(SESSION_PURGE_INTERVAL);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    loop {
        ticker.tick().await;
        let removed = state.sessions().purge_expired();
        if removed > 0 {
            debug!(removed, "purged expired sessions");
        }
    }
}

async fn hash_password(password: String) -> Result<String, ServiceError> {
    tokio::task::spawn_blocking(move || -> Result<String, argon2::password_hash::Error> {
        let salt_bytes: [u8; 16] = rand::random();
        let salt = SaltString::encode_b64(&salt_bytes)?;
        Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map(|hash| hash.to_string())
    })
    .await
    .map_err(|err| ServiceError::Internal(format!("password hashing task failed: {err}")))?
    .map_err(|err| ServiceError::Internal(format!("password hashing failed: {err}")))
}

async fn verify_password(password: String, stored_hash: String) -> Result<bool, ServiceError> {
    tokio::task::spawn_blocking(move || match PasswordHash::new(&stored_hash) {
        Ok(parsed) => Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok(),
        Err(err) => {
            warn!(error = %err, "stored password hash is malformed");
            false
        }
    })
    .await
    .map_err(|err| ServiceError::Internal(format!("password check task failed: {err}")))
}
