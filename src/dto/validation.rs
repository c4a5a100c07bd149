//! Validation helpers for DTOs.

use validator::ValidationError;

use crate::duration::{MAX_DURATION_SECS, MIN_DURATION_SECS};

/// Shortest accepted password, in characters.
pub const MIN_PASSWORD_CHARS: usize = 8;
/// Accepted display name lengths, in characters.
pub const DISPLAY_NAME_CHARS: std::ops::RangeInclusive<usize> = 2..=30;

fn failure(code: &'static str, message: &'static str) -> ValidationError {
    let mut err = ValidationError::new(code);
    err.message = Some(message.into());
    err
}

/// Check an email has the `local@domain.tld` shape: no whitespace, a single `@`,
/// and a dot somewhere after the first domain character.
///
/// ```ignore
/// validate_email_shape("ann@example.com") // Ok
/// validate_email_shape("ann@example")     // Err - no dot in domain
/// validate_email_shape("a nn@example.com") // Err - whitespace
/// ```
pub fn validate_email_shape(email: &str) -> Result<(), ValidationError> {
    let invalid = || failure("email_format", "Invalid email format");
    if email.chars().any(char::is_whitespace) {
        return Err(invalid());
    }

    let (local, domain) = email.split_once('@').ok_or_else(invalid)?;
    if local.is_empty() || domain.contains('@') {
        return Err(invalid());
    }

    let dotted = domain
        .char_indices()
        .any(|(index, c)| c == '.' && index > 0 && index + 1 < domain.len());
    if dotted { Ok(()) } else { Err(invalid()) }
}

/// Reject passwords shorter than [`MIN_PASSWORD_CHARS`].
pub fn validate_password(password: &str) -> Result<(), ValidationError> {
    if password.chars().count() < MIN_PASSWORD_CHARS {
        return Err(failure(
            "password_length",
            "Password must be at least 8 characters",
        ));
    }
    Ok(())
}

/// Reject display names outside [`DISPLAY_NAME_CHARS`].
pub fn validate_display_name(name: &str) -> Result<(), ValidationError> {
    if !DISPLAY_NAME_CHARS.contains(&name.chars().count()) {
        return Err(failure(
            "display_name_length",
            "Display name must be 2-30 characters",
        ));
    }
    Ok(())
}

/// Validate a submitted attempt duration and round it to whole seconds.
///
/// Zero and non-numbers count as missing; range checking happens before rounding.
pub fn validate_attempt_duration(raw: Option<f64>) -> Result<u32, ValidationError> {
    let seconds = raw.filter(|value| value.is_finite() && *value != 0.0).ok_or_else(|| {
        failure(
            "duration_required",
            "Duration is required and must be a number",
        )
    })?;

    if seconds < f64::from(MIN_DURATION_SECS) || seconds > f64::from(MAX_DURATION_SECS) {
        return Err(failure(
            "duration_range",
            "Duration must be between 1 second and 1 hour",
        ));
    }

    // In range, so the cast cannot truncate.
    Ok(seconds.round() as u32)
}
