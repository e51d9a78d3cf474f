use serde::Serialize;
use utoipa::ToSchema;

/// Whether the backend currently has working storage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum HealthStatus {
    /// Storage is connected.
    Ok,
    /// Running without storage.
    Degraded,
}

/// Body of `/healthcheck`.
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    /// Storage status.
    pub status: HealthStatus,
    /// Rounds currently held in memory, ended ones included until evicted.
    pub live_rounds: usize,
}

impl HealthResponse {
    /// Build the body from the degraded flag and the registry size.
    pub fn new(degraded: bool, live_rounds: usize) -> Self {
        let status = if degraded {
            HealthStatus::Degraded
        } else {
            HealthStatus::Ok
        };
        Self {
            status,
            live_rounds,
        }
    }
}
