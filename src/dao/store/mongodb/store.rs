use std::sync::Arc;

use futures::{TryStreamExt, future::BoxFuture};
use mongodb::{Client, Collection, Database, IndexModel, bson::doc, options::IndexOptions};
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{
    config::MongoConfig,
    connection::open,
    error::{MongoDaoError, MongoResult},
    models::{
        MongoPokemonDocument, MongoScoreDocument, POKEMON_COLLECTION_NAME, SCORE_COLLECTION_NAME,
        pokemon_id, score_id,
    },
};
use crate::dao::{
    models::{PokemonEntity, ScoreEntity},
    storage::StorageResult,
    store::{PokemonStore, ScoreStore},
};

/// MongoDB backend serving both the Pokémon catalogue and the leaderboard.
#[derive(Clone)]
pub struct MongoStore {
    inner: Arc<MongoInner>,
}

struct MongoInner {
    state: RwLock<MongoState>,
    config: MongoConfig,
}

struct MongoState {
    #[allow(dead_code)]
    client: Client,
    database: Database,
}

impl MongoInner {
    async fn ping(&self) -> MongoResult<()> {
        let database = {
            let guard = self.state.read().await;
            guard.database.clone()
        };

        database
            .run_command(doc! { "ping": 1 })
            .await
            .map_err(|source| MongoDaoError::HealthPing { source })?;
        Ok(())
    }

    async fn reconnect(&self) -> MongoResult<()> {
        let (client, database) = open(&self.config).await?;
        let mut guard = self.state.write().await;
        guard.client = client;
        guard.database = database;
        Ok(())
    }
}

impl MongoStore {
    /// Establish a connection to MongoDB and ensure indexes are present.
    pub async fn connect(config: MongoConfig) -> MongoResult<Self> {
        let (client, database) = open(&config).await?;

        let inner = Arc::new(MongoInner {
            state: RwLock::new(MongoState { client, database }),
            config,
        });

        let store = Self { inner };
        store.ensure_indexes().await?;
        Ok(store)
    }

    async fn ensure_indexes(&self) -> MongoResult<()> {
        let index = IndexModel::builder()
            .keys(doc! {"time_seconds": 1})
            .options(
                IndexOptions::builder()
                    .name(Some("score_time_idx".to_owned()))
                    .build(),
            )
            .build();

        self.scores()
            .await
            .create_index(index)
            .await
            .map_err(|source| MongoDaoError::EnsureIndex {
                collection: SCORE_COLLECTION_NAME,
                index: "time_seconds",
                source,
            })?;

        Ok(())
    }

    async fn pokemons(&self) -> Collection<MongoPokemonDocument> {
        let guard = self.inner.state.read().await;
        guard
            .database
            .collection::<MongoPokemonDocument>(POKEMON_COLLECTION_NAME)
    }

    async fn scores(&self) -> Collection<MongoScoreDocument> {
        let guard = self.inner.state.read().await;
        guard
            .database
            .collection::<MongoScoreDocument>(SCORE_COLLECTION_NAME)
    }

    async fn find_random(&self, limit: usize) -> MongoResult<Vec<PokemonEntity>> {
        let size = i64::try_from(limit).unwrap_or(i64::MAX);
        let documents: Vec<MongoPokemonDocument> = self
            .pokemons()
            .await
            .aggregate([doc! { "$sample": { "size": size } }])
            .with_type::<MongoPokemonDocument>()
            .await
            .map_err(|source| MongoDaoError::SamplePokemons { source })?
            .try_collect()
            .await
            .map_err(|source| MongoDaoError::SamplePokemons { source })?;

        documents.into_iter().map(PokemonEntity::try_from).collect()
    }

    async fn save_pokemon(&self, pokemon: PokemonEntity) -> MongoResult<()> {
        let id = pokemon.id;
        let document = MongoPokemonDocument::from(pokemon);
        self.pokemons()
            .await
            .replace_one(pokemon_id(id), &document)
            .upsert(true)
            .await
            .map_err(|source| MongoDaoError::SavePokemon { id, source })?;
        Ok(())
    }

    async fn save_score(&self, score: ScoreEntity) -> MongoResult<ScoreEntity> {
        let scores = self.scores().await;
        match score.id {
            None => {
                let id = Uuid::new_v4();
                let document = MongoScoreDocument::new(id, score.clone());
                scores
                    .insert_one(&document)
                    .await
                    .map_err(|source| MongoDaoError::SaveScore { id, source })?;
                Ok(ScoreEntity {
                    id: Some(id),
                    ..score
                })
            }
            Some(id) => {
                let document = MongoScoreDocument::new(id, score.clone());
                scores
                    .replace_one(score_id(id), &document)
                    .upsert(true)
                    .await
                    .map_err(|source| MongoDaoError::SaveScore { id, source })?;
                Ok(score)
            }
        }
    }

    async fn find_best_scores(&self, limit: usize) -> MongoResult<Vec<ScoreEntity>> {
        // MongoDB reads a zero limit as unbounded.
        if limit == 0 {
            return Ok(Vec::new());
        }
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        let documents: Vec<MongoScoreDocument> = self
            .scores()
            .await
            .find(doc! {})
            .sort(doc! { "time_seconds": 1 })
            .limit(limit)
            .await
            .map_err(|source| MongoDaoError::ListScores { source })?
            .try_collect()
            .await
            .map_err(|source| MongoDaoError::ListScores { source })?;

        documents.into_iter().map(ScoreEntity::try_from).collect()
    }

    async fn delete_score(&self, id: Uuid) -> MongoResult<bool> {
        let result = self
            .scores()
            .await
            .delete_one(score_id(id))
            .await
            .map_err(|source| MongoDaoError::DeleteScore { id, source })?;
        Ok(result.deleted_count > 0)
    }
}

impl PokemonStore for MongoStore {
    fn find_random(&self, limit: usize) -> BoxFuture<'static, StorageResult<Vec<PokemonEntity>>> {
        let store = self.clone();
        Box::pin(async move { store.find_random(limit).await.map_err(Into::into) })
    }

    fn save_pokemon(&self, pokemon: PokemonEntity) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.save_pokemon(pokemon).await.map_err(Into::into) })
    }

    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.inner.ping().await.map_err(Into::into) })
    }

    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.inner.reconnect().await.map_err(Into::into) })
    }
}

impl ScoreStore for MongoStore {
    fn save_score(&self, score: ScoreEntity) -> BoxFuture<'static, StorageResult<ScoreEntity>> {
        let store = self.clone();
        Box::pin(async move { store.save_score(score).await.map_err(Into::into) })
    }

    fn find_best_scores(
        &self,
        limit: usize,
    ) -> BoxFuture<'static, StorageResult<Vec<ScoreEntity>>> {
        let store = self.clone();
        Box::pin(async move { store.find_best_scores(limit).await.map_err(Into::into) })
    }

    fn delete_score(&self, id: Uuid) -> BoxFuture<'static, StorageResult<bool>> {
        let store = self.clone();
        Box::pin(async move { store.delete_score(id).await.map_err(Into::into) })
    }

    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.inner.ping().await.map_err(Into::into) })
    }

    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.inner.reconnect().await.map_err(Into::into) })
    }
}
