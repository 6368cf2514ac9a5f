//! Storage codec for embeddings.
//!
//! Vectors are stored as a flat buffer of little-endian IEEE-754 `f32`
//! values, four bytes per element, in vector order. A 1024-dimension
//! fingerprint therefore occupies exactly 4096 bytes.

use crate::Embedding;
use crate::error::{EmbeddingError, Result};

/// Number of bytes used per vector element.
pub const BYTES_PER_ELEMENT: usize = std::mem::size_of::<f32>();

/// Encode a vector into its storage form.
///
/// Non-finite values are written bit-for-bit; rejecting them is left to
/// similarity computation.
pub fn encode(vector: &[f32]) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(vector.len() * BYTES_PER_ELEMENT);
    for value in vector {
        bytes.extend_from_slice(&value.to_le_bytes());
    }
    bytes
}

/// Decode a stored buffer back into a vector.
pub fn decode(bytes: &[u8]) -> Result<Embedding> {
    if bytes.len() % BYTES_PER_ELEMENT != 0 {
        return Err(EmbeddingError::MalformedVector {
            length: bytes.len(),
        });
    }

    Ok(bytes
        .chunks_exact(BYTES_PER_ELEMENT)
        .map(|chunk| f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
        .collect())
}

/// Decode a stored buffer and require a specific dimensionality.
///
/// A length that does not match is reported, never truncated or padded.
pub fn decode_with_dimension(bytes: &[u8], expected: usize) -> Result<Embedding> {
    let vector = decode(bytes)?;
    if vector.len() != expected {
        return Err(EmbeddingError::DimensionMismatch {
            expected,
            actual: vector.len(),
        });
    }
    Ok(vector)
}
