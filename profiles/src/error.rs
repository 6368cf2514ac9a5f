//! Error types for profiles and ingestion.

use thiserror::Error;

use riskprint_embeddings::EmbeddingError;

use crate::profile::ProfileId;

/// Result type alias for profile operations.
pub type Result<T> = std::result::Result<T, ProfileError>;

/// Errors that can occur while building, storing or ingesting profiles.
#[derive(Error, Debug)]
pub enum ProfileError {
    /// Profile not found.
    #[error("profile not found: {0}")]
    NotFound(ProfileId),

    /// Caller-supplied field failed validation.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Behavior text too short to fingerprint.
    #[error("insufficient history: {length} characters after normalization, need at least {minimum}")]
    InsufficientHistory { length: usize, minimum: usize },

    /// The embedding generator failed or returned an unusable vector.
    #[error("embedding generation failed: {0}")]
    EmbeddingGeneration(String),

    /// The narrative generator failed.
    #[error("text generation failed: {0}")]
    TextGeneration(String),

    /// Stored vector data is corrupt or inconsistent.
    #[error("embedding error: {0}")]
    Embedding(#[from] EmbeddingError),

    /// Storage operation failed.
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    /// Serialization/deserialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Storage-specific errors.
#[derive(Error, Debug)]
pub enum StorageError {
    /// Failed to create storage directory.
    #[error("failed to create directory: {0}")]
    CreateDirectory(String),

    /// Failed to read profile file.
    #[error("failed to read file: {0}")]
    ReadFile(String),

    /// Failed to write profile file.
    #[error("failed to write file: {0}")]
    WriteFile(String),

    /// A stored record could not be parsed.
    #[error("corrupt record {path}: {reason}")]
    CorruptRecord { path: String, reason: String },

    /// Insert would reuse an existing identity.
    #[error("profile already exists: {0}")]
    AlreadyExists(ProfileId),
}
