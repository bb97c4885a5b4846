//! Payload of the health probe.

use serde::Serialize;
use utoipa::ToSchema;

/// Overall verdict of the probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    /// Data endpoints are served.
    Ok,
    /// Data endpoints answer 503 until storage comes back.
    Degraded,
}

/// What the probe saw of the tournament store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum StorageProbe {
    /// The store answered its health check.
    Answering,
    /// A store is installed but its health check failed.
    Failing,
    /// No store is installed yet.
    NotInstalled,
}

/// Body of `GET /healthcheck`.
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    /// `ok` only when the store answers and degraded mode is off.
    pub status: HealthStatus,
    /// Result of probing the store.
    pub storage: StorageProbe,
}

impl HealthResponse {
    /// Combine the store probe with the degraded flag kept by the supervisor.
    pub fn from_probe(storage: StorageProbe, degraded: bool) -> Self {
        let status = if degraded || storage != StorageProbe::Answering {
            HealthStatus::Degraded
        } else {
            HealthStatus::Ok
        };
        Self { status, storage }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn failing_store_degrades_even_without_the_flag() {
        let response = HealthResponse::from_probe(StorageProbe::Failing, false);
        assert_eq!(response.status, HealthStatus::Degraded);
        assert_eq!(
            serde_json::to_value(&response).unwrap(),
            serde_json::json!({ "status": "degraded", "storage": "failing" })
        );

        let healthy = HealthResponse::from_probe(StorageProbe::Answering, false);
        assert_eq!(
            serde_json::to_value(&healthy).unwrap(),
            serde_json::json!({ "status": "ok", "storage": "answering" })
        );
    }
}
