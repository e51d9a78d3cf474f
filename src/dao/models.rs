use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Pokémon record as persisted by the stores.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PokemonEntity {
    /// Pokédex number, unique per record.
    pub id: u32,
    /// Lowercase identity token, e.g. `pikachu`.
    pub name: String,
    /// Name shown to players.
    pub display_name: String,
    /// Picture URL.
    pub image_url: String,
}

/// Leaderboard entry as persisted by the stores.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ScoreEntity {
    /// Identifier, `None` until the entry has been inserted.
    pub id: Option<Uuid>,
    /// Trimmed pseudonym.
    pub pseudonym: String,
    /// Completion time in seconds.
    pub time_seconds: u32,
}
