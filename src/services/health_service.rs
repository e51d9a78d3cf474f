use tracing::warn;

use crate::{dto::health::HealthResponse, state::SharedState};

/// Ping both stores and report the degraded flag with the number of live rounds.
///
/// Ping failures are only logged; the storage supervisor owns the degraded flag.
pub async fn health_status(state: &SharedState) -> HealthResponse {
    match state.stores().await {
        Some(stores) => {
            if let Err(err) = stores.pokemons.health_check().await {
                warn!(error = %err, "pokemon storage health check failed");
            }
            if let Err(err) = stores.scores.health_check().await {
                warn!(error = %err, "score storage health check failed");
            }
        }
        None => warn!("storage unavailable (degraded mode)"),
    }

    HealthResponse::new(state.is_degraded(), state.rounds().len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        config::AppConfig,
        dao::store::memory::MemoryStore,
        dto::health::HealthStatus,
        state::{AppState, Stores},
    };

    #[tokio::test]
    async fn status_follows_installed_storage() {
        let state = AppState::new(AppConfig::default());
        assert_eq!(health_status(&state).await.status, HealthStatus::Degraded);

        state
            .install_stores(Stores::shared(MemoryStore::new()))
            .await;
        let health = health_status(&state).await;
        assert_eq!(health.status, HealthStatus::Ok);
        assert_eq!(health.live_rounds, 0);
    }
}
