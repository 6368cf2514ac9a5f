//! # Embeddings
//!
//! Vector plumbing for behavioral fingerprints.
//!
//! - **Codec**: flat little-endian byte form used to store embeddings
//! - **Similarity**: cosine similarity with an explicit zero-norm fallback
//! - **Providers**: external embedding generators (OpenAI-compatible HTTP)
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                         Embeddings                              │
//! ├─────────────────────────────────────────────────────────────────┤
//! │  EmbeddingProvider ──► Embedding ──► codec::encode ──► bytes    │
//! │                            ▲                              │     │
//! │                            │                              ▼     │
//! │  cosine_similarity ◄───────┴──────── codec::decode ◄── store    │
//! └─────────────────────────────────────────────────────────────────┘
//! ```

pub mod codec;
pub mod error;
pub mod provider;
pub mod similarity;

pub use codec::{decode, decode_with_dimension, encode};
pub use error::{EmbeddingError, Result};
pub use provider::{EmbeddingProvider, EmbeddingRequest, EmbeddingResponse, OpenAIProvider};
pub use similarity::{cosine_similarity, dot_product};

/// A dense vector embedding.
pub type Embedding = Vec<f32>;

/// Dimension of behavioral fingerprints produced by the embedding generator.
pub const DEFAULT_DIMENSION: usize = 1024;
