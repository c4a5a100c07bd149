use std::time::SystemTime;
use time::{
    Date, OffsetDateTime, format_description::well_known::Rfc3339,
    macros::format_description,
};

/// Attempt submission and listing bodies.
pub mod attempt;
/// Registration and login bodies.
pub mod auth;
/// Dashboard summary.
pub mod dashboard;
/// Error body.
pub mod error;
/// Health check body.
pub mod health;
/// Leaderboard rows and query.
pub mod leaderboard;
pub mod validation;

pub(crate) fn format_system_time(time: SystemTime) -> String {
    OffsetDateTime::from(time)
        .format(&Rfc3339)
        .unwrap_or_else(|_| "invalid-timestamp".into())
}

/// Parse an ISO-8601 timestamp as sent by clients.
///
/// Full RFC 3339 date-times are accepted, as is a bare `YYYY-MM-DD` date which
/// is read as midnight UTC.
pub fn parse_timestamp(raw: &str) -> Option<SystemTime> {
    let raw = raw.trim();
    if let Ok(parsed) = OffsetDateTime::parse(raw, &Rfc3339) {
        return Some(parsed.into());
    }

    Date::parse(raw, format_description!("[year]-[month]-[day]"))
        .ok()
        .map(|date| date.midnight().assume_utc().into())
}
