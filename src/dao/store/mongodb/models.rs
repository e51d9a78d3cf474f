use mongodb::bson::{self, Document, doc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::error::MongoDaoError;
use crate::dao::models::{PokemonEntity, ScoreEntity};

pub const POKEMON_COLLECTION_NAME: &str = "pokemons";
pub const SCORE_COLLECTION_NAME: &str = "scores";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MongoPokemonDocument {
    #[serde(rename = "_id")]
    id: i64,
    name: String,
    display_name: String,
    image_url: String,
}

impl From<PokemonEntity> for MongoPokemonDocument {
    fn from(value: PokemonEntity) -> Self {
        Self {
            id: i64::from(value.id),
            name: value.name,
            display_name: value.display_name,
            image_url: value.image_url,
        }
    }
}

impl TryFrom<MongoPokemonDocument> for PokemonEntity {
    type Error = MongoDaoError;

    fn try_from(value: MongoPokemonDocument) -> Result<Self, Self::Error> {
        let id = u32::try_from(value.id).map_err(|_| MongoDaoError::Corrupted {
            collection: POKEMON_COLLECTION_NAME,
            id: value.id.to_string(),
            reason: "id is not a valid Pokédex number".to_owned(),
        })?;

        Ok(Self {
            id,
            name: value.name,
            display_name: value.display_name,
            image_url: value.image_url,
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MongoScoreDocument {
    #[serde(rename = "_id")]
    id: bson::Uuid,
    pseudonym: String,
    time_seconds: i64,
}

impl MongoScoreDocument {
    /// Build the stored form of a score that already has its id.
    pub fn new(id: Uuid, score: ScoreEntity) -> Self {
        Self {
            id: uuid_as_bson(id),
            pseudonym: score.pseudonym,
            time_seconds: i64::from(score.time_seconds),
        }
    }
}

impl TryFrom<MongoScoreDocument> for ScoreEntity {
    type Error = MongoDaoError;

    fn try_from(value: MongoScoreDocument) -> Result<Self, Self::Error> {
        let id = Uuid::from_bytes(value.id.bytes());
        let time_seconds =
            u32::try_from(value.time_seconds).map_err(|_| MongoDaoError::Corrupted {
                collection: SCORE_COLLECTION_NAME,
                id: id.to_string(),
                reason: format!("time_seconds {} out of range", value.time_seconds),
            })?;

        Ok(Self {
            id: Some(id),
            pseudonym: value.pseudonym,
            time_seconds,
        })
    }
}

fn uuid_as_bson(id: Uuid) -> bson::Uuid {
    bson::Uuid::from_bytes(id.into_bytes())
}

pub fn score_id(id: Uuid) -> Document {
    doc! {"_id": uuid_as_bson(id)}
}

pub fn pokemon_id(id: u32) -> Document {
    doc! {"_id": i64::from(id)}
}
