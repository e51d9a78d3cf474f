use uuid::Uuid;

use crate::dao::models::{PokemonEntity, ScoreEntity};

/// Pokémon printed on a pair of cards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pokemon {
    /// Storage identifier.
    pub id: u32,
    /// Identity token shared by the two cards of a pair (e.g. "pikachu").
    pub name: String,
    /// Localised name shown under the picture.
    pub display_name: String,
    /// Picture URL.
    pub image_url: String,
}

/// Best-time entry of the leaderboard.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Score {
    /// Identifier assigned by storage on first save.
    pub id: Option<Uuid>,
    /// Trimmed player pseudonym.
    pub pseudonym: String,
    /// Completion time in whole seconds.
    pub time_seconds: u32,
}

impl Score {
    /// Build a score from all its fields, `id` being `None` until storage assigns one.
    pub fn new(id: Option<Uuid>, pseudonym: impl Into<String>, time_seconds: u32) -> Self {
        Self {
            id,
            pseudonym: pseudonym.into(),
            time_seconds,
        }
    }
}

impl From<PokemonEntity> for Pokemon {
    fn from(value: PokemonEntity) -> Self {
        Self {
            id: value.id,
            name: value.name,
            display_name: value.display_name,
            image_url: value.image_url,
        }
    }
}

impl From<Pokemon> for PokemonEntity {
    fn from(value: Pokemon) -> Self {
        Self {
            id: value.id,
            name: value.name,
            display_name: value.display_name,
            image_url: value.image_url,
        }
    }
}

impl From<ScoreEntity> for Score {
    fn from(value: ScoreEntity) -> Self {
        Self::new(value.id, value.pseudonym, value.time_seconds)
    }
}

impl From<Score> for ScoreEntity {
    fn from(value: Score) -> Self {
        Self {
            id: value.id,
            pseudonym: value.pseudonym,
            time_seconds: value.time_seconds,
        }
    }
}
