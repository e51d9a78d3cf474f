use std::{future::Future, time::Duration};

use tokio::time::sleep;
use tracing::{info, warn};

use crate::{
    dao::storage::{StorageError, StorageResult},
    state::{SharedState, Stores},
};

const INITIAL_DELAY: Duration = Duration::from_millis(1_000);
const MAX_DELAY: Duration = Duration::from_secs(10);
const HEALTH_POLL_INTERVAL: Duration = Duration::from_secs(5);
const MAX_RECONNECT_ATTEMPTS: u32 = 3;

/// Reconnect to the storage backend and keep the shared state in degraded mode when it is unavailable.
pub async fn run<F, Fut>(state: SharedState, mut connect: F)
where
    F: FnMut() -> Fut + Send + 'static,
    Fut: Future<Output = Result<Stores, StorageError>> + Send,
{
    let mut delay = INITIAL_DELAY;

    loop {
        match connect().await {
            Ok(stores) => {
                state.install_stores(stores.clone()).await;
                info!("storage connection established; leaving degraded mode");
                delay = INITIAL_DELAY;

                loop {
                    match health_check(&stores).await {
                        Ok(()) => {
                            if state.is_degraded() {
                                info!("storage healthy again; leaving degraded mode");
                                state.update_degraded(false);
                            }
                            sleep(HEALTH_POLL_INTERVAL).await;
                        }
                        Err(err) if !err.is_transient() => {
                            warn!(error = %err, "storage health check hit bad data; keeping connection");
                            sleep(HEALTH_POLL_INTERVAL).await;
                        }
                        Err(err) => {
                            warn!(error = %err, "storage health check failed");
                            if reconnect(&state, &stores).await {
                                state.update_degraded(false);
                                sleep(HEALTH_POLL_INTERVAL).await;
                                continue;
                            }

                            warn!("exhausted storage reconnect attempts; staying in degraded mode");
                            state.clear_stores().await;
                            break;
                        }
                    }
                }

                sleep(delay).await;
                delay = (delay * 2).min(MAX_DELAY);
            }
            Err(err) => {
                warn!(error = %err, "storage connection attempt failed");
                sleep(delay).await;
                delay = (delay * 2).min(MAX_DELAY);
            }
        }
    }
}

async fn health_check(stores: &Stores) -> StorageResult<()> {
    stores.pokemons.health_check().await?;
    stores.scores.health_check().await
}

/// Try to revive both handles, entering degraded mode after the first failed attempt.
async fn reconnect(state: &SharedState, stores: &Stores) -> bool {
    let mut reconnect_delay = INITIAL_DELAY;

    for attempt in 0..MAX_RECONNECT_ATTEMPTS {
        let result = match stores.pokemons.try_reconnect().await {
            Ok(()) => stores.scores.try_reconnect().await,
            Err(err) => Err(err),
        };

        match result {
            Ok(()) => {
                info!(attempt, "storage reconnection succeeded after health check failure");
                return true;
            }
            Err(reconnect_err) => {
                if attempt == 0 {
                    warn!(
                        attempt, error = %reconnect_err,
                        "storage reconnect first attempt failed; entering degraded mode"
                    );
                    state.update_degraded(true);
                } else {
                    warn!(attempt, error = %reconnect_err, "storage reconnect attempt failed");
                }
                sleep(reconnect_delay).await;
                reconnect_delay = (reconnect_delay * 2).min(MAX_DELAY);
            }
        }
    }

    false
}

#[cfg(test)]
mod tests {
    use std::sync::{
        Arc,
        atomic::{AtomicU32, Ordering},
    };

    use super::*;
    use crate::{config::AppConfig, dao::store::memory::MemoryStore, state::AppState};

    #[tokio::test(start_paused = true)]
    async fn retries_until_connected_then_leaves_degraded_mode() {
        let state = AppState::new(AppConfig::default());
        let mut degraded = state.degraded_watcher();
        assert!(*degraded.borrow());

        let attempts = Arc::new(AtomicU32::new(0));
        let counter = attempts.clone();
        let task = tokio::spawn(run(state.clone(), move || {
            let counter = counter.clone();
            async move {
                if counter.fetch_add(1, Ordering::SeqCst) < 2 {
                    Err(StorageError::unavailable(
                        "not yet",
                        std::io::Error::other("refused"),
                    ))
                } else {
                    Ok(Stores::shared(MemoryStore::new()))
                }
            }
        }));

        degraded.changed().await.unwrap();
        assert!(!*degraded.borrow());
        assert_eq!(attempts.load(Ordering::SeqCst), 3);
        assert!(state.stores().await.is_some());
        task.abort();
    }
}
