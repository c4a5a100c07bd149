/// Attempt creation and listing.
pub mod attempt_service;
/// Registration, login and session housekeeping.
pub mod auth_service;
/// Per-user landing page aggregates.
pub mod dashboard_service;
/// OpenAPI documentation generation.
pub mod documentation;
/// Health check service.
pub mod health_service;
/// Best-time and cumulative-time rankings.
pub mod leaderboard_service;
/// Storage connection supervision and degraded-mode handling.
pub mod storage_supervisor;
