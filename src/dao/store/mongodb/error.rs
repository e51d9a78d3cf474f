use mongodb::error::Error as MongoError;
use thiserror::Error;
use uuid::Uuid;

/// Result of a MongoDB operation.
pub type MongoResult<T> = std::result::Result<T, MongoDaoError>;

/// Failures of the MongoDB backend.
#[derive(Debug, Error)]
pub enum MongoDaoError {
    #[error("missing environment variable `{var}`")]
    /// A required variable is unset.
    MissingEnvVar {
        /// Variable name.
        var: &'static str,
    },
    #[error("failed to parse MongoDB connection URI `{uri}`")]
    /// The connection string did not parse.
    InvalidUri {
        /// Rejected URI.
        uri: String,
        /// Driver error.
        #[source]
        source: MongoError,
    },
    #[error("failed to build MongoDB client from options")]
    /// The driver refused the options.
    ClientConstruction {
        /// Driver error.
        #[source]
        source: MongoError,
    },
    #[error("database `{database}` did not answer a ping after {attempts} attempt(s)")]
    /// The server never answered while connecting.
    InitialPing {
        /// Database pinged.
        database: String,
        /// Pings sent.
        attempts: u32,
        /// Driver error.
        #[source]
        source: MongoError,
    },
    #[error("MongoDB ping health check failed")]
    /// A later ping failed.
    HealthPing {
        /// Driver error.
        #[source]
        source: MongoError,
    },
    #[error("failed to ensure index `{index}` on collection `{collection}`")]
    /// Index creation failed.
    EnsureIndex {
        /// Collection name.
        collection: &'static str,
        /// Index name.
        index: &'static str,
        /// Driver error.
        #[source]
        source: MongoError,
    },
    #[error("failed to sample pokemons")]
    /// `$sample` aggregation failed.
    SamplePokemons {
        /// Driver error.
        #[source]
        source: MongoError,
    },
    #[error("failed to save pokemon `{id}`")]
    /// Pokémon upsert failed.
    SavePokemon {
        /// Pokédex number.
        id: u32,
        /// Driver error.
        #[source]
        source: MongoError,
    },
    #[error("failed to save score `{id}`")]
    /// Score upsert failed.
    SaveScore {
        /// Score id.
        id: Uuid,
        /// Driver error.
        #[source]
        source: MongoError,
    },
    #[error("failed to delete score `{id}`")]
    /// Score deletion failed.
    DeleteScore {
        /// Score id.
        id: Uuid,
        /// Driver error.
        #[source]
        source: MongoError,
    },
    #[error("failed to list best scores")]
    /// Leaderboard query failed.
    ListScores {
        /// Driver error.
        #[source]
        source: MongoError,
    },
    #[error("document `{id}` in `{collection}` is malformed: {reason}")]
    /// A stored document could not be decoded.
    Corrupted {
        /// Collection name.
        collection: &'static str,
        /// Document id as text.
        id: String,
        /// What was wrong.
        reason: String,
    },
}
