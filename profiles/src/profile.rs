//! Core profile types.
//!
//! A profile pairs a traditional credit score with a behavioral fingerprint:
//! the embedding of the person's free-text financial history. The embedding
//! is held in its storage form (see [`riskprint_embeddings::codec`]) and is
//! never mutated once attached.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use riskprint_embeddings::{Embedding, codec};

use crate::error::{ProfileError, Result};

/// Highest valid credit score.
pub const MAX_NUMERIC_SCORE: u16 = 1000;

/// Maximum display name length, in characters.
pub const MAX_DISPLAY_NAME_CHARS: usize = 100;

/// Maximum behavior text length, in characters.
pub const MAX_BEHAVIOR_TEXT_CHARS: usize = 5000;

/// Stable identity of a profile.
///
/// Ordering is used to break ranking ties deterministically.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProfileId(Uuid);

impl ProfileId {
    /// Allocate a fresh identity.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ProfileId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ProfileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for ProfileId {
    type Err = ProfileError;

    fn from_str(s: &str) -> Result<Self> {
        Uuid::parse_str(s.trim())
            .map(Self)
            .map_err(|e| ProfileError::InvalidInput(format!("invalid profile id {s:?}: {e}")))
    }
}

/// A credit score in `[0, 1000]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "u16")]
pub struct NumericScore(u16);

impl NumericScore {
    /// Validate and wrap a raw score.
    pub fn new(value: i64) -> Result<Self> {
        if !(0..=i64::from(MAX_NUMERIC_SCORE)).contains(&value) {
            return Err(ProfileError::InvalidInput(format!(
                "numeric score {value} outside [0, {MAX_NUMERIC_SCORE}]"
            )));
        }
        Ok(Self(value as u16))
    }

    /// The raw score.
    pub fn value(self) -> u16 {
        self.0
    }

    /// Proximity of two scores: `1 - |a - b| / 1000`, always in `[0, 1]`.
    pub fn proximity(self, other: Self) -> f32 {
        1.0 - f32::from(self.0.abs_diff(other.0)) / f32::from(MAX_NUMERIC_SCORE)
    }
}

impl TryFrom<i64> for NumericScore {
    type Error = ProfileError;

    fn try_from(value: i64) -> Result<Self> {
        Self::new(value)
    }
}

impl From<NumericScore> for u16 {
    fn from(score: NumericScore) -> Self {
        score.0
    }
}

impl fmt::Display for NumericScore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A risk profile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    id: ProfileId,
    display_name: String,
    numeric_score: NumericScore,
    behavior_text: String,
    #[serde(default, with = "embedding_blob", skip_serializing_if = "Option::is_none")]
    embedding: Option<Vec<u8>>,
    created_at: DateTime<Utc>,
}

impl Profile {
    /// Create a profile without a fingerprint.
    ///
    /// The display name is trimmed and must be non-empty; both text fields
    /// are bounded by the default limits.
    pub fn new(
        display_name: impl Into<String>,
        numeric_score: NumericScore,
        behavior_text: impl Into<String>,
    ) -> Result<Self> {
        Self::new_bounded(
            display_name,
            numeric_score,
            behavior_text,
            MAX_DISPLAY_NAME_CHARS,
            MAX_BEHAVIOR_TEXT_CHARS,
        )
    }

    /// Like [`Profile::new`], with explicit character limits.
    pub fn new_bounded(
        display_name: impl Into<String>,
        numeric_score: NumericScore,
        behavior_text: impl Into<String>,
        max_display_name_chars: usize,
        max_behavior_text_chars: usize,
    ) -> Result<Self> {
        let display_name = display_name.into().trim().to_string();
        if display_name.is_empty() {
            return Err(ProfileError::InvalidInput(
                "display name must not be empty".to_string(),
            ));
        }
        let name_chars = display_name.chars().count();
        if name_chars > max_display_name_chars {
            return Err(ProfileError::InvalidInput(format!(
                "display name is {name_chars} characters, max {max_display_name_chars}"
            )));
        }

        let behavior_text = behavior_text.into();
        let text_chars = behavior_text.chars().count();
        if text_chars > max_behavior_text_chars {
            return Err(ProfileError::InvalidInput(format!(
                "behavior text is {text_chars} characters, max {max_behavior_text_chars}"
            )));
        }

        Ok(Self {
            id: ProfileId::new(),
            display_name,
            numeric_score,
            behavior_text,
            embedding: None,
            created_at: Utc::now(),
        })
    }

    /// Attach a fingerprint, encoding it for storage.
    pub fn with_embedding(self, vector: &[f32]) -> Self {
        self.with_embedding_bytes(codec::encode(vector))
    }

    /// Attach an already-encoded fingerprint, as read back from storage.
    pub fn with_embedding_bytes(mut self, bytes: Vec<u8>) -> Self {
        self.embedding = Some(bytes);
        self
    }

    pub fn id(&self) -> ProfileId {
        self.id
    }

    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    pub fn numeric_score(&self) -> NumericScore {
        self.numeric_score
    }

    pub fn behavior_text(&self) -> &str {
        &self.behavior_text
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Whether the profile can take part in similarity search.
    pub fn has_embedding(&self) -> bool {
        self.embedding.is_some()
    }

    /// Stored fingerprint bytes, if any.
    pub fn embedding_bytes(&self) -> Option<&[u8]> {
        self.embedding.as_deref()
    }

    /// Decode the fingerprint, requiring `expected_dimension` elements.
    ///
    /// Corrupt bytes are an error, not `None`.
    pub fn embedding_vector(&self, expected_dimension: usize) -> Result<Option<Embedding>> {
        self.embedding
            .as_deref()
            .map(|bytes| codec::decode_with_dimension(bytes, expected_dimension))
            .transpose()
            .map_err(ProfileError::from)
    }
}

/// Base64 representation of the encoded embedding in JSON records.
mod embedding_blob {
    use base64::Engine as _;
    use base64::engine::general_purpose::STANDARD;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(
        bytes: &Option<Vec<u8>>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match bytes {
            Some(bytes) => serializer.serialize_some(&STANDARD.encode(bytes)),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<Vec<u8>>, D::Error> {
        let encoded: Option<String> = Option::deserialize(deserializer)?;
        encoded
            .map(|s| STANDARD.decode(s).map_err(serde::de::Error::custom))
            .transpose()
    }
}
