use tracing::{info, warn};

use crate::{
    dto::score::{SaveScoreForm, ScoreSummary},
    error::ServiceError,
    state::{SharedState, game::Score},
};

/// Upper bound applied to client-provided leaderboard sizes.
const MAX_LEADERBOARD_LIMIT: usize = 100;

/// Validate, normalise and persist a submitted score.
///
/// Invalid fields yield [`ServiceError::Validation`] and nothing is written. Any storage problem,
/// including a missing backend, is reported as [`ServiceError::Persistence`].
pub async fn save_score(state: &SharedState, form: SaveScoreForm) -> Result<Score, ServiceError> {
    let score = form.into_score().map_err(ServiceError::Validation)?;

    let store = state.require_score_store().await.map_err(|err| {
        warn!(error = %err, "cannot save score without storage");
        ServiceError::Persistence(err.to_string())
    })?;

    let saved = store.save_score(score.into()).await.map_err(|err| {
        warn!(error = %err, "failed to persist score");
        ServiceError::Persistence(err.to_string())
    })?;

    let saved = Score::from(saved);
    info!(
        pseudonym = %saved.pseudonym,
        time_seconds = saved.time_seconds,
        "score saved"
    );
    Ok(saved)
}

/// Best scores, ascending by time. Read failures degrade to an empty leaderboard.
pub async fn best_scores(state: &SharedState, limit: Option<usize>) -> Vec<ScoreSummary> {
    let limit = limit
        .unwrap_or_else(|| state.config().leaderboard_limit())
        .min(MAX_LEADERBOARD_LIMIT);
    // Some backends read a zero limit as "no limit".
    if limit == 0 {
        return Vec::new();
    }

    let store = match state.require_score_store().await {
        Ok(store) => store,
        Err(err) => {
            warn!(error = %err, "leaderboard unavailable; returning no scores");
            return Vec::new();
        }
    };

    match store.find_best_scores(limit).await {
        Ok(scores) => scores
            .into_iter()
            .map(Score::from)
            .map(ScoreSummary::from)
            .collect(),
        Err(err) => {
            warn!(error = %err, "failed to load leaderboard; returning no scores");
            Vec::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use futures::future::BoxFuture;
    use uuid::Uuid;

    use super::*;
    use crate::{
        config::AppConfig,
        dao::{
            models::ScoreEntity,
            storage::{StorageError, StorageResult},
            store::{PokemonStore, ScoreStore, memory::MemoryStore},
        },
        state::{AppState, Stores},
    };

    struct BrokenScores;

    impl ScoreStore for BrokenScores {
        fn save_score(&self, _: ScoreEntity) -> BoxFuture<'static, StorageResult<ScoreEntity>> {
            Box::pin(async { Err(broken()) })
        }

        fn find_best_scores(&self, _: usize) -> BoxFuture<'static, StorageResult<Vec<ScoreEntity>>> {
            Box::pin(async { Err(broken()) })
        }

        fn delete_score(&self, _: Uuid) -> BoxFuture<'static, StorageResult<bool>> {
            Box::pin(async { Err(broken()) })
        }

        fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
            Box::pin(async { Err(broken()) })
        }

        fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>> {
            Box::pin(async { Err(broken()) })
        }
    }

    /// Ignores the requested limit, like a database where zero means unbounded.
    struct UnboundedScores;

    impl ScoreStore for UnboundedScores {
        fn save_score(&self, score: ScoreEntity) -> BoxFuture<'static, StorageResult<ScoreEntity>> {
            Box::pin(async move { Ok(score) })
        }

        fn find_best_scores(&self, _: usize) -> BoxFuture<'static, StorageResult<Vec<ScoreEntity>>> {
            Box::pin(async {
                Ok(vec![
                    ScoreEntity {
                        id: Some(Uuid::nil()),
                        pseudonym: "Gary".into(),
                        time_seconds: 15,
                    },
                    ScoreEntity {
                        id: Some(Uuid::nil()),
                        pseudonym: "Ash".into(),
                        time_seconds: 90,
                    },
                ])
            })
        }

        fn delete_score(&self, _: Uuid) -> BoxFuture<'static, StorageResult<bool>> {
            Box::pin(async { Ok(false) })
        }

        fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
            Box::pin(async { Ok(()) })
        }

        fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>> {
            Box::pin(async { Ok(()) })
        }
    }

    fn broken() -> StorageError {
        StorageError::unavailable(
            "backend down",
            std::io::Error::other("connection refused"),
        )
    }

    fn form(pseudonym: &str, time: &str) -> SaveScoreForm {
        SaveScoreForm {
            pseudonym: Some(pseudonym.into()),
            time: Some(time.into()),
        }
    }

    async fn state_with_memory() -> (SharedState, MemoryStore) {
        let state = AppState::new(AppConfig::default());
        let store = MemoryStore::new();
        state.install_stores(Stores::shared(store.clone())).await;
        (state, store)
    }

    #[tokio::test]
    async fn valid_score_is_trimmed_rounded_and_saved() {
        let (state, store) = state_with_memory().await;
        let saved = save_score(&state, form(" Ash ", "41.5")).await.unwrap();
        assert!(saved.id.is_some());
        assert_eq!(saved.pseudonym, "Ash");
        assert_eq!(saved.time_seconds, 42);

        let stored = store.find_best_scores(5).await.unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].pseudonym, "Ash");
    }

    #[tokio::test]
    async fn invalid_score_is_not_persisted() {
        let (state, store) = state_with_memory().await;
        let err = save_score(&state, form("???", "0")).await.unwrap_err();
        let ServiceError::Validation(errors) = err else {
            panic!("expected validation error, got {err:?}");
        };
        assert_eq!(errors.field_errors().len(), 2);
        assert!(store.find_best_scores(5).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn storage_failure_is_a_persistence_error() {
        let state = AppState::new(AppConfig::default());
        state
            .install_stores(Stores {
                pokemons: Arc::new(MemoryStore::new()) as Arc<dyn PokemonStore>,
                scores: Arc::new(BrokenScores),
            })
            .await;

        let err = save_score(&state, form("Ash", "10")).await.unwrap_err();
        assert!(matches!(err, ServiceError::Persistence(_)));
        assert!(best_scores(&state, None).await.is_empty());
    }

    #[tokio::test]
    async fn degraded_mode_fails_writes_and_empties_reads() {
        let state = AppState::new(AppConfig::default());
        let err = save_score(&state, form("Ash", "10")).await.unwrap_err();
        assert!(matches!(err, ServiceError::Persistence(_)));
        assert!(best_scores(&state, Some(3)).await.is_empty());
    }

    #[tokio::test]
    async fn leaderboard_is_ascending_and_limited() {
        let (state, _) = state_with_memory().await;
        for (name, time) in [("Ash", "90"), ("Misty", "30"), ("Brock", "60"), ("Gary", "15")] {
            save_score(&state, form(name, time)).await.unwrap();
        }

        let best = best_scores(&state, Some(3)).await;
        let names: Vec<_> = best.iter().map(|s| s.pseudonym.as_str()).collect();
        assert_eq!(names, vec!["Gary", "Misty", "Brock"]);
        assert_eq!(best[1].time.seconds, 30);

        assert_eq!(best_scores(&state, None).await.len(), 4);
    }

    #[tokio::test]
    async fn zero_limit_is_an_empty_leaderboard_on_every_backend() {
        let (state, _) = state_with_memory().await;
        save_score(&state, form("Ash", "90")).await.unwrap();
        assert!(best_scores(&state, Some(0)).await.is_empty());

        let state = AppState::new(AppConfig::default());
        state
            .install_stores(Stores {
                pokemons: Arc::new(MemoryStore::new()) as Arc<dyn PokemonStore>,
                scores: Arc::new(UnboundedScores),
            })
            .await;
        assert!(best_scores(&state, Some(0)).await.is_empty());
        assert_eq!(best_scores(&state, Some(1)).await.len(), 2);
    }
}
