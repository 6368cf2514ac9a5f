//! Error types for the embeddings system.

use thiserror::Error;

/// Result type alias for embedding operations.
pub type Result<T> = std::result::Result<T, EmbeddingError>;

/// Errors that can occur in the embeddings system.
#[derive(Error, Debug)]
pub enum EmbeddingError {
    /// Provider not configured.
    #[error("embedding provider not configured")]
    ProviderNotConfigured,

    /// API request failed.
    #[error("API request failed: {0}")]
    ApiRequest(String),

    /// Invalid response from provider.
    #[error("invalid response: {0}")]
    InvalidResponse(String),

    /// Rate limit exceeded.
    #[error("rate limit exceeded, retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    /// Two vectors (or a vector and its expected shape) disagree on length.
    #[error("dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    /// Stored embedding bytes are not a whole number of `f32` values.
    #[error("malformed vector: {length} bytes is not a multiple of 4")]
    MalformedVector { length: usize },

    /// Similarity evaluated to NaN or infinity.
    #[error("similarity is not a finite number")]
    NonFiniteSimilarity,

    /// Serialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// HTTP error.
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
}

impl EmbeddingError {
    /// Whether this error points at corrupt or inconsistent vector data
    /// rather than a collaborator failure.
    pub fn is_integrity(&self) -> bool {
        matches!(
            self,
            Self::DimensionMismatch { .. } | Self::MalformedVector { .. } | Self::NonFiniteSimilarity
        )
    }
}
