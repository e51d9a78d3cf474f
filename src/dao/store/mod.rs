/// In-process backend.
pub mod memory;
#[cfg(feature = "mongo-store")]
/// MongoDB backend.
pub mod mongodb;

use crate::dao::models::{PokemonEntity, ScoreEntity};
use crate::dao::storage::StorageResult;
use futures::future::BoxFuture;
use uuid::Uuid;

/// Source of the Pokémon printed on the cards.
pub trait PokemonStore: Send + Sync {
    /// Up to `limit` distinct records in random order. An empty list means no data.
    fn find_random(&self, limit: usize) -> BoxFuture<'static, StorageResult<Vec<PokemonEntity>>>;
    /// Insert or replace a record, keyed by its id.
    fn save_pokemon(&self, pokemon: PokemonEntity) -> BoxFuture<'static, StorageResult<()>>;
    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>>;
    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>>;
}

/// Leaderboard persistence.
pub trait ScoreStore: Send + Sync {
    /// Insert the score when it has no id yet (assigning one), update it otherwise.
    fn save_score(&self, score: ScoreEntity) -> BoxFuture<'static, StorageResult<ScoreEntity>>;
    /// Best scores first, i.e. ascending completion time.
    fn find_best_scores(&self, limit: usize)
    -> BoxFuture<'static, StorageResult<Vec<ScoreEntity>>>;
    fn delete_score(&self, id: Uuid) -> BoxFuture<'static, StorageResult<bool>>;
    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>>;
    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>>;
}
