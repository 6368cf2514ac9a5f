//! Error types for ranking and the fingerprint engine.

use thiserror::Error;

use riskprint_embeddings::EmbeddingError;
use riskprint_profiles::{ProfileError, ProfileId, StorageError};

/// Result type alias for retrieval operations.
pub type Result<T> = std::result::Result<T, RetrievalError>;

/// Errors that can occur while ranking or serving requests.
#[derive(Error, Debug)]
pub enum RetrievalError {
    /// Profile, storage or ingestion error.
    #[error(transparent)]
    Profile(#[from] ProfileError),

    /// Vector decoding or similarity error.
    #[error("embedding error: {0}")]
    Embedding(#[from] EmbeddingError),

    /// The target profile has no fingerprint to compare against.
    #[error("profile {0} has no embedding and cannot be a similarity target")]
    TargetNotEligible(ProfileId),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),

    /// IO error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Coarse classification a boundary layer can map to responses and alerts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The caller can fix the request (short history, unknown id, bad input).
    UserCorrectable,
    /// Stored vectors are corrupt or inconsistent.
    Integrity,
    /// An external collaborator failed.
    Upstream,
    /// The engine was wired or configured incorrectly.
    Configuration,
    /// Anything else: storage IO, serialization.
    Internal,
}

impl RetrievalError {
    /// Classify this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::TargetNotEligible(_) => ErrorKind::UserCorrectable,
            Self::Embedding(e) => embedding_kind(e),
            Self::Profile(e) => match e {
                ProfileError::NotFound(_)
                | ProfileError::InvalidInput(_)
                | ProfileError::InsufficientHistory { .. }
                | ProfileError::Storage(StorageError::AlreadyExists(_)) => ErrorKind::UserCorrectable,
                ProfileError::EmbeddingGeneration(_) | ProfileError::TextGeneration(_) => {
                    ErrorKind::Upstream
                }
                ProfileError::Embedding(e) => embedding_kind(e),
                ProfileError::Storage(StorageError::CorruptRecord { .. }) => ErrorKind::Integrity,
                ProfileError::Storage(_) | ProfileError::Serialization(_) => ErrorKind::Internal,
            },
            Self::Config(_) => ErrorKind::Configuration,
            Self::Io(_) => ErrorKind::Internal,
        }
    }
}

fn embedding_kind(error: &EmbeddingError) -> ErrorKind {
    if error.is_integrity() {
        ErrorKind::Integrity
    } else {
        ErrorKind::Upstream
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_error_kinds() {
        let short: RetrievalError = ProfileError::InsufficientHistory {
            length: 10,
            minimum: 30,
        }
        .into();
        assert_eq!(short.kind(), ErrorKind::UserCorrectable);

        let missing: RetrievalError = ProfileError::NotFound(ProfileId::new()).into();
        assert_eq!(missing.kind(), ErrorKind::UserCorrectable);

        let corrupt: RetrievalError = EmbeddingError::MalformedVector { length: 7 }.into();
        assert_eq!(corrupt.kind(), ErrorKind::Integrity);

        let mismatch: RetrievalError =
            ProfileError::Embedding(EmbeddingError::DimensionMismatch {
                expected: 1024,
                actual: 512,
            })
            .into();
        assert_eq!(mismatch.kind(), ErrorKind::Integrity);

        let upstream: RetrievalError =
            ProfileError::EmbeddingGeneration("timeout".to_string()).into();
        assert_eq!(upstream.kind(), ErrorKind::Upstream);
    }
}
