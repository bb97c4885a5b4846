//! Health probe combining the store round trip with the degraded flag.

use tracing::warn;

use crate::{
    dto::health::{HealthResponse, StorageProbe},
    state::SharedState,
};

/// Probe the installed store and report whether the service runs degraded.
pub async fn health_status(state: &SharedState) -> HealthResponse {
    let storage = match state.require_store().await {
        Ok(store) => match store.health_check().await {
            Ok(()) => StorageProbe::Answering,
            Err(err) => {
                warn!(error = %err, "tournament store health check failed");
                StorageProbe::Failing
            }
        },
        Err(_) => {
            warn!("no tournament store installed (degraded mode)");
            StorageProbe::NotInstalled
        }
    };

    HealthResponse::from_probe(storage, state.is_degraded().await)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::{
        config::AppConfig, dao::tournament_store::MemoryStore, dto::health::HealthStatus,
        state::AppState,
    };

    #[tokio::test]
    async fn reports_degraded_until_a_store_is_installed() {
        let state = AppState::new(AppConfig::default());
        let before = health_status(&state).await;
        assert_eq!(before.status, HealthStatus::Degraded);
        assert_eq!(before.storage, StorageProbe::NotInstalled);

        state.install_store(Arc::new(MemoryStore::new())).await;
        let after = health_status(&state).await;
        assert_eq!(after.status, HealthStatus::Ok);
        assert_eq!(after.storage, StorageProbe::Answering);
    }
}
