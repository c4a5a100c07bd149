//! Typed-in attempts (`mm:ss`), logged without running the timer.

use thiserror::Error;
use tracing::warn;

use super::{AttemptApi, StatusMessage};
use crate::{dto::attempt::CreateAttemptRequest, duration};

/// Why a manual entry was refused before reaching the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ManualEntryError {
    /// Not `mm:ss`.
    #[error("Invalid format. Use mm:ss (e.g., 1:30)")]
    InvalidFormat,
    /// Outside 1 second to 1 hour.
    #[error("Duration must be between 1 second and 1 hour")]
    OutOfRange,
}

/// Parse and range-check a manual entry.
pub fn parse_entry(text: &str) -> Result<u32, ManualEntryError> {
    let seconds = duration::parse(text).ok_or(ManualEntryError::InvalidFormat)?;
    if !duration::is_valid(seconds) {
        return Err(ManualEntryError::OutOfRange);
    }
    Ok(seconds)
}

/// Validate `text` locally, then log it. The returned message is what the user sees.
pub async fn submit_entry(api: &dyn AttemptApi, text: &str) -> StatusMessage {
    let seconds = match parse_entry(text) {
        Ok(seconds) => seconds,
        Err(err) => return StatusMessage::Error(err.to_string()),
    };

    match api.create_attempt(CreateAttemptRequest::seconds(seconds)).await {
        Ok(response) => StatusMessage::saved(&response),
        Err(err) => {
            warn!(error = %err, seconds, "failed to log manual attempt");
            StatusMessage::failed(&err)
        }
    }
}
