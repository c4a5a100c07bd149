use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Health payload returned by the `/healthcheck` route.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct HealthResponse {
    /// Health status ("ok" or "degraded").
    pub status: String,
    /// Storage backend currently installed, absent in degraded mode.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub backend: Option<String>,
}

impl HealthResponse {
    /// The service has a working storage backend.
    pub fn ok(backend: &str) -> Self {
        Self {
            status: "ok".to_owned(),
            backend: Some(backend.to_owned()),
        }
    }

    /// No usable storage backend; data routes answer 503.
    pub fn degraded() -> Self {
        Self {
            status: "degraded".to_owned(),
            backend: None,
        }
    }
}
