use mongodb::options::ClientOptions;

use super::{
    connection::ConnectBackoff,
    error::{MongoDaoError, MongoResult},
};

const DEFAULT_DB: &str = "pokemory";

/// Connection settings for [`super::MongoStore`].
#[derive(Clone)]
pub struct MongoConfig {
    /// Parsed client options.
    pub options: ClientOptions,
    /// Database holding the `pokemons` and `scores` collections.
    pub database_name: String,
    /// Start-up ping policy.
    pub backoff: ConnectBackoff,
}

impl MongoConfig {
    /// Parse `uri`; the database defaults to `pokemory`.
    pub async fn from_uri(uri: &str, db_name: Option<&str>) -> MongoResult<Self> {
        let options = ClientOptions::parse(uri)
            .await
            .map_err(|source| MongoDaoError::InvalidUri {
                uri: uri.to_owned(),
                source,
            })?;

        Ok(Self {
            options,
            database_name: db_name
                .filter(|name| !name.trim().is_empty())
                .unwrap_or(DEFAULT_DB)
                .to_owned(),
            backoff: ConnectBackoff::default(),
        })
    }

    /// Read `MONGO_URI` (required), `MONGO_DB` and `MONGO_CONNECT_ATTEMPTS` (optional).
    pub async fn from_env() -> MongoResult<Self> {
        let uri = std::env::var("MONGO_URI")
            .map_err(|_| MongoDaoError::MissingEnvVar { var: "MONGO_URI" })?;
        let db = std::env::var("MONGO_DB").ok();
        let mut config = Self::from_uri(&uri, db.as_deref()).await?;
        if let Some(attempts) = std::env::var("MONGO_CONNECT_ATTEMPTS")
            .ok()
            .and_then(|value| value.parse().ok())
        {
            config.backoff.attempts = attempts;
        }
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn blank_database_name_falls_back_to_default() {
        let config = MongoConfig::from_uri("mongodb://localhost:27017", Some("  "))
            .await
            .unwrap();
        assert_eq!(config.database_name, "pokemory");
        assert_eq!(config.backoff, ConnectBackoff::default());

        let config = MongoConfig::from_uri("mongodb://localhost:27017", Some("arena"))
            .await
            .unwrap();
        assert_eq!(config.database_name, "arena");
    }

    #[tokio::test]
    async fn malformed_uri_is_reported() {
        let err = MongoConfig::from_uri("not-a-uri", None).await.err().unwrap();
        assert!(matches!(err, MongoDaoError::InvalidUri { .. }));
    }
}
