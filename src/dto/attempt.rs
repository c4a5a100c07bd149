use serde::{Deserialize, Deserializer, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    dao::models::AttemptEntity,
    dto::format_system_time,
    duration,
};

/// Response message when the attempt became the new personal best.
pub const PERSONAL_BEST_MESSAGE: &str = "New personal best!";
/// Response message for any other stored attempt.
pub const ATTEMPT_LOGGED_MESSAGE: &str = "Attempt logged successfully";

/// Payload to log a new attempt for the caller.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateAttemptRequest {
    /// Held duration in seconds; fractional values are rounded after validation.
    #[serde(default, deserialize_with = "number_or_none")]
    #[schema(value_type = f64)]
    pub duration_seconds: Option<f64>,
    /// ISO-8601 timestamp of the attempt; defaults to the submission time.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attempted_at: Option<String>,
}

impl CreateAttemptRequest {
    /// Request for a whole number of seconds attempted right now.
    pub fn seconds(seconds: u32) -> Self {
        Self {
            duration_seconds: Some(f64::from(seconds)),
            attempted_at: None,
        }
    }
}

/// Accept any JSON value and keep it only when it is a number.
fn number_or_none<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(serde_json::Value::as_f64))
}

/// Attempt as exposed over the API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AttemptView {
    /// Attempt identifier.
    pub id: Uuid,
    /// Owner of the attempt.
    pub user_id: Uuid,
    /// Held duration in whole seconds.
    pub duration_seconds: u32,
    /// `mm:ss` rendering of the duration.
    pub display: String,
    /// RFC 3339 timestamp.
    pub attempted_at: String,
    /// Whether this is the owner's flagged best.
    pub is_personal_best: bool,
}

impl From<AttemptEntity> for AttemptView {
    fn from(value: AttemptEntity) -> Self {
        Self {
            id: value.id,
            user_id: value.user_id,
            duration_seconds: value.duration_seconds,
            display: duration::format(value.duration_seconds.into()),
            attempted_at: format_system_time(value.attempted_at),
            is_personal_best: value.is_personal_best,
        }
    }
}

/// Result of logging an attempt.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateAttemptResponse {
    /// The stored attempt.
    pub attempt: AttemptView,
    /// Whether the attempt beat the previous best.
    pub is_personal_best: bool,
    /// Confirmation line for the user.
    pub message: String,
}

impl From<AttemptEntity> for CreateAttemptResponse {
    fn from(value: AttemptEntity) -> Self {
        let is_personal_best = value.is_personal_best;
        let message = if is_personal_best {
            PERSONAL_BEST_MESSAGE
        } else {
            ATTEMPT_LOGGED_MESSAGE
        };
        Self {
            attempt: value.into(),
            is_personal_best,
            message: message.to_owned(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn non_numeric_duration_reads_as_missing() {
        let req: CreateAttemptRequest =
            serde_json::from_str(r#"{"durationSeconds":"90"}"#).unwrap();
        assert_eq!(req.duration_seconds, None);

        let req: CreateAttemptRequest = serde_json::from_str(r#"{}"#).unwrap();
        assert_eq!(req.duration_seconds, None);

        let req: CreateAttemptRequest =
            serde_json::from_str(r#"{"durationSeconds":42.5,"attemptedAt":"2026-02-01"}"#)
                .unwrap();
        assert_eq!(req.duration_seconds, Some(42.5));
        assert_eq!(req.attempted_at.as_deref(), Some("2026-02-01"));
    }

    #[test]
    fn whole_seconds_request_serializes_camel_case() {
        let body = serde_json::to_value(CreateAttemptRequest::seconds(75)).unwrap();
        assert_eq!(body, serde_json::json!({ "durationSeconds": 75.0 }));
    }
}
