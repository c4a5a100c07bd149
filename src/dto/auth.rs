use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::ValidationError;

use crate::{
    dao::models::UserEntity,
    dto::validation::{validate_display_name, validate_email_shape, validate_password},
};

/// Payload submitted to create an account.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    /// Login email, unique across accounts.
    #[serde(default)]
    pub email: Option<String>,
    /// Plain-text password; only its hash is stored.
    #[serde(default)]
    pub password: Option<String>,
    /// Name shown on leaderboards.
    #[serde(default)]
    pub display_name: Option<String>,
}

/// Registration fields once every check has passed.
#[derive(Debug)]
pub struct RegistrationInput {
    /// Trimmed email.
    pub email: String,
    /// Password of at least 8 characters.
    pub password: String,
    /// Display name of 2-30 characters.
    pub display_name: String,
}

impl RegisterRequest {
    /// Run the registration checks in order and report the first failure.
    pub fn into_input(self) -> Result<RegistrationInput, ValidationError> {
        let present = |field: Option<String>| field.filter(|value| !value.is_empty());
        let (Some(email), Some(password), Some(display_name)) = (
            present(self.email),
            present(self.password),
            present(self.display_name),
        ) else {
            let mut err = ValidationError::new("required");
            err.message = Some("Email, password, and display name are required".into());
            return Err(err);
        };

        validate_email_shape(&email)?;
        validate_password(&password)?;
        validate_display_name(&display_name)?;

        Ok(RegistrationInput {
            email,
            password,
            display_name,
        })
    }
}

/// Public part of a user account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserView {
    /// User identifier.
    pub id: Uuid,
    /// Login email.
    pub email: String,
    /// Name shown on leaderboards.
    pub display_name: String,
}

impl From<UserEntity> for UserView {
    fn from(value: UserEntity) -> Self {
        Self {
            id: value.id,
            email: value.email,
            display_name: value.display_name,
        }
    }
}

/// Confirmation of a new account.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct RegisterResponse {
    /// Confirmation line for the user.
    pub message: String,
    /// The created account.
    pub user: UserView,
}

/// Credentials submitted to open a session.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct LoginRequest {
    /// Account email.
    #[serde(default)]
    pub email: Option<String>,
    /// Account password.
    #[serde(default)]
    pub password: Option<String>,
}

/// Session issued after a successful login.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    /// Opaque bearer token, also set as the session cookie.
    pub token: String,
    /// RFC 3339 expiry of the token.
    pub expires_at: String,
    /// Owner of the session.
    pub user: UserView,
}
