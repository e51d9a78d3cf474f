use std::{collections::BTreeMap, sync::Arc};

use futures::future::BoxFuture;
use rand::seq::{IteratorRandom, SliceRandom};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::dao::{
    models::{PokemonEntity, ScoreEntity},
    storage::StorageResult,
    store::{PokemonStore, ScoreStore},
};

/// Process-local store used when no database is configured, and in tests.
#[derive(Clone, Default)]
pub struct MemoryStore {
    inner: Arc<MemoryInner>,
}

#[derive(Default)]
struct MemoryInner {
    pokemons: RwLock<BTreeMap<u32, PokemonEntity>>,
    scores: RwLock<Vec<ScoreEntity>>,
}

impl MemoryStore {
    /// Empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Store pre-filled with a Pokémon roster.
    pub fn with_pokemons(roster: impl IntoIterator<Item = PokemonEntity>) -> Self {
        let pokemons = roster
            .into_iter()
            .map(|pokemon| (pokemon.id, pokemon))
            .collect();
        Self {
            inner: Arc::new(MemoryInner {
                pokemons: RwLock::new(pokemons),
                scores: RwLock::default(),
            }),
        }
    }
}

impl PokemonStore for MemoryStore {
    fn find_random(&self, limit: usize) -> BoxFuture<'static, StorageResult<Vec<PokemonEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            let guard = store.inner.pokemons.read().await;
            let mut picked = guard
                .values()
                .cloned()
                .choose_multiple(&mut rand::rng(), limit);
            // `choose_multiple` keeps the source order when it does not need to replace.
            picked.shuffle(&mut rand::rng());
            Ok(picked)
        })
    }

    fn save_pokemon(&self, pokemon: PokemonEntity) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move {
            store
                .inner
                .pokemons
                .write()
                .await
                .insert(pokemon.id, pokemon);
            Ok(())
        })
    }

    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
        Box::pin(async { Ok(()) })
    }

    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>> {
        Box::pin(async { Ok(()) })
    }
}

impl ScoreStore for MemoryStore {
    fn save_score(&self, score: ScoreEntity) -> BoxFuture<'static, StorageResult<ScoreEntity>> {
        let store = self.clone();
        Box::pin(async move {
            let mut guard = store.inner.scores.write().await;
            let Some(id) = score.id else {
                let inserted = ScoreEntity {
                    id: Some(Uuid::new_v4()),
                    ..score
                };
                guard.push(inserted.clone());
                return Ok(inserted);
            };

            match guard.iter_mut().find(|existing| existing.id == Some(id)) {
                Some(existing) => *existing = score.clone(),
                None => guard.push(score.clone()),
            }
            Ok(score)
        })
    }

    fn find_best_scores(
        &self,
        limit: usize,
    ) -> BoxFuture<'static, StorageResult<Vec<ScoreEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            let mut scores = store.inner.scores.read().await.clone();
            // Stable sort: ties keep insertion order.
            scores.sort_by_key(|score| score.time_seconds);
            scores.truncate(limit);
            Ok(scores)
        })
    }

    fn delete_score(&self, id: Uuid) -> BoxFuture<'static, StorageResult<bool>> {
        let store = self.clone();
        Box::pin(async move {
            let mut guard = store.inner.scores.write().await;
            let before = guard.len();
            guard.retain(|score| score.id != Some(id));
            Ok(guard.len() != before)
        })
    }

    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
        Box::pin(async { Ok(()) })
    }

    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>> {
        Box::pin(async { Ok(()) })
    }
}
