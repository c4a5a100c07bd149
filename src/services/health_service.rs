use tracing::warn;

use crate::{dto::health::HealthResponse, state::SharedState};

/// Ping the installed store and report whether the service can serve data routes.
pub async fn health_status(state: &SharedState) -> HealthResponse {
    let store = match state.require_store().await {
        Ok(store) => store,
        Err(_) => {
            warn!("storage unavailable (degraded mode)");
            return HealthResponse::degraded();
        }
    };

    match store.health_check().await {
        Ok(()) => HealthResponse::ok(store.backend()),
        Err(err) => {
            warn!(error = %err, backend = store.backend(), "storage health check failed");
            HealthResponse::degraded()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use crate::{config::AppConfig, dao::store::memory::MemoryStore, state::AppState};

    #[tokio::test]
    async fn reports_backend_when_healthy() {
        let state = AppState::with_store(AppConfig::default(), Arc::new(MemoryStore::new()));
        let health = health_status(&state).await;
        assert_eq!(health.status, "ok");
        assert_eq!(health.backend.as_deref(), Some("memory"));
    }

    #[tokio::test]
    async fn reports_degraded_without_store() {
        let health = health_status(&AppState::new(AppConfig::default())).await;
        assert_eq!(health.status, "degraded");
        assert!(health.backend.is_none());
    }
}
