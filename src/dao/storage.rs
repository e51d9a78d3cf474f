use std::error::Error as StdError;

use thiserror::Error;

/// Result alias shared by the Pokémon and score stores.
pub type StorageResult<T> = Result<T, StorageError>;

/// Backend-neutral storage failure.
#[derive(Debug, Error)]
pub enum StorageError {
    /// The backend could not be reached or refused the operation.
    #[error("storage unavailable: {message}")]
    Unavailable {
        /// What was being attempted.
        message: String,
        /// Backend error.
        #[source]
        source: Box<dyn StdError + Send + Sync>,
    },
    /// A stored record cannot be turned back into an entity.
    #[error("record `{id}` is malformed: {reason}")]
    Corrupted {
        /// Location of the record, `collection/id` for document stores.
        id: String,
        /// Why the record was rejected.
        reason: String,
    },
}

impl StorageError {
    /// Wrap a backend failure.
    pub fn unavailable(
        message: impl Into<String>,
        source: impl StdError + Send + Sync + 'static,
    ) -> Self {
        Self::Unavailable {
            message: message.into(),
            source: Box::new(source),
        }
    }

    /// Whether reconnecting may fix the failure. Corrupted records stay corrupted.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Unavailable { .. })
    }
}

#[cfg(test)]
mod tests {
    use std::io;

    use super::*;

    #[test]
    fn unavailable_keeps_its_source() {
        let err = StorageError::unavailable("ping", io::Error::other("refused"));
        assert!(err.is_transient());
        assert_eq!(err.to_string(), "storage unavailable: ping");
        assert_eq!(err.source().map(ToString::to_string).as_deref(), Some("refused"));
    }

    #[test]
    fn corrupted_records_are_not_transient() {
        let err = StorageError::Corrupted {
            id: "scores/42".into(),
            reason: "negative time".into(),
        };
        assert!(!err.is_transient());
    }
}
