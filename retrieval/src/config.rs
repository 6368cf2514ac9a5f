//! Configuration for the fingerprint engine.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use riskprint_embeddings::DEFAULT_DIMENSION;
use riskprint_profiles::IngestConfig;

use crate::error::{Result, RetrievalError};

/// Configuration for the fingerprint engine.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalConfig {
    /// Profile storage.
    pub storage: StorageConfig,

    /// Embedding provider configuration.
    pub embedding: EmbeddingConfig,

    /// Narrative generator configuration.
    pub generation: GenerationConfig,

    /// Ingestion limits.
    pub ingest: IngestConfig,

    /// Ranking policy.
    pub ranking: RankingPolicy,
}

impl RetrievalConfig {
    /// Parse a TOML document. Missing sections take their defaults.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Self =
            toml::from_str(content).map_err(|e| RetrievalError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::from_toml_str(&content)
    }

    /// Set the profile directory.
    pub fn with_profile_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.storage.profile_dir = dir.into();
        self
    }

    /// Set the embedding configuration.
    pub fn with_embedding(mut self, config: EmbeddingConfig) -> Self {
        self.embedding = config;
        self
    }

    /// Set the ranking policy.
    pub fn with_ranking(mut self, policy: RankingPolicy) -> Self {
        self.ranking = policy;
        self
    }

    /// Check cross-field consistency.
    pub fn validate(&self) -> Result<()> {
        self.ranking.validate()?;
        if self.embedding.dimension == 0 {
            return Err(RetrievalError::Config(
                "embedding dimension must be positive".to_string(),
            ));
        }
        if self.ingest.embedding_dimension != self.embedding.dimension {
            return Err(RetrievalError::Config(format!(
                "ingest expects {} dimensions but the provider produces {}",
                self.ingest.embedding_dimension, self.embedding.dimension
            )));
        }
        if self.ingest.min_history_chars > self.ingest.max_history_chars {
            return Err(RetrievalError::Config(format!(
                "minimum history length {} exceeds maximum {}",
                self.ingest.min_history_chars, self.ingest.max_history_chars
            )));
        }
        Ok(())
    }
}

/// Where profiles are persisted.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Directory holding one JSON record per profile.
    pub profile_dir: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            profile_dir: dirs::data_dir().unwrap_or_default().join("riskprint/profiles"),
        }
    }
}

/// Configuration for the embedding provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingConfig {
    /// OpenAI-compatible API base URL.
    pub base_url: String,

    /// Model to use for embeddings.
    pub model: String,

    /// Dimension of generated fingerprints.
    pub dimension: usize,

    /// Environment variable holding the API key.
    pub api_key_env: String,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.openai.com/v1".to_string(),
            model: "text-embedding-3-large".to_string(),
            dimension: DEFAULT_DIMENSION,
            api_key_env: "OPENAI_API_KEY".to_string(),
        }
    }
}

/// Configuration for the narrative generator.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationConfig {
    /// Whether the raw-data ingestion path is available.
    pub enabled: bool,

    /// OpenAI-compatible API base URL.
    pub base_url: String,

    /// Chat model.
    pub model: String,

    /// Sampling temperature.
    pub temperature: f32,

    /// Environment variable holding the API key.
    pub api_key_env: String,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            base_url: "https://api.openai.com/v1".to_string(),
            model: "gpt-4o-mini".to_string(),
            temperature: 0.2,
            api_key_env: "OPENAI_API_KEY".to_string(),
        }
    }
}

/// Which score orders ranked matches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RankingKey {
    /// Weighted blend of vector similarity and score proximity.
    FinalScore,
    /// Raw vector similarity; the blended score is still reported.
    VectorSimilarity,
}

/// Weights, gate and ordering used by the hybrid ranker.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RankingPolicy {
    /// Candidates with vector similarity below this are dropped. Inclusive.
    pub relevance_threshold: f32,

    /// Weight of vector similarity in the final score.
    pub vector_weight: f32,

    /// Weight of score proximity in the final score.
    pub score_weight: f32,

    /// Ordering of the results.
    pub ranking_key: RankingKey,

    /// Whether matches carry a rationale.
    pub include_rationale: bool,
}

impl RankingPolicy {
    /// Policy with the given vector weight; score proximity takes the rest.
    pub fn weighted(vector_weight: f32) -> Self {
        Self {
            vector_weight,
            score_weight: 1.0 - vector_weight,
            ..Self::default()
        }
    }

    /// Set the ranking key.
    pub fn with_ranking_key(mut self, key: RankingKey) -> Self {
        self.ranking_key = key;
        self
    }

    /// Enable or disable rationale text.
    pub fn with_rationale(mut self, enabled: bool) -> Self {
        self.include_rationale = enabled;
        self
    }

    /// Whether a vector similarity passes the relevance gate.
    pub fn is_relevant(&self, vector_similarity: f32) -> bool {
        vector_similarity >= self.relevance_threshold
    }

    /// Weights must be finite, non-negative and sum to one.
    pub fn validate(&self) -> Result<()> {
        let weights = [self.vector_weight, self.score_weight];
        if weights.iter().any(|w| !w.is_finite() || *w < 0.0) {
            return Err(RetrievalError::Config(format!(
                "ranking weights must be finite and non-negative, got {} and {}",
                self.vector_weight, self.score_weight
            )));
        }
        if (self.vector_weight + self.score_weight - 1.0).abs() > 1e-6 {
            return Err(RetrievalError::Config(format!(
                "ranking weights must sum to 1, got {}",
                self.vector_weight + self.score_weight
            )));
        }
        if !(-1.0..=1.0).contains(&self.relevance_threshold) {
            return Err(RetrievalError::Config(format!(
                "relevance threshold {} outside [-1, 1]",
                self.relevance_threshold
            )));
        }
        Ok(())
    }
}

impl Default for RankingPolicy {
    fn default() -> Self {
        Self {
            relevance_threshold: 0.75,
            vector_weight: 0.95,
            score_weight: 0.05,
            ranking_key: RankingKey::FinalScore,
            include_rationale: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_default_policy() {
        let policy = RankingPolicy::default();
        assert_eq!(policy.relevance_threshold, 0.75);
        assert_eq!(policy.ranking_key, RankingKey::FinalScore);
        policy.validate().unwrap();
    }

    #[test]
    fn test_relevance_gate_is_inclusive() {
        let policy = RankingPolicy::default();
        assert!(policy.is_relevant(0.75));
        assert!(!policy.is_relevant(0.74));
        assert!(!policy.is_relevant(0.749_999));
    }

    #[test]
    fn test_weights_must_sum_to_one() {
        let policy = RankingPolicy {
            vector_weight: 0.9,
            score_weight: 0.2,
            ..RankingPolicy::default()
        };
        assert!(policy.validate().is_err());

        let policy = RankingPolicy {
            vector_weight: 1.1,
            score_weight: -0.1,
            ..RankingPolicy::default()
        };
        assert!(policy.validate().is_err());

        RankingPolicy::weighted(0.7).validate().unwrap();
    }

    #[test]
    fn test_from_toml() {
        let config = RetrievalConfig::from_toml_str(
            r#"
            [storage]
            profile_dir = "/tmp/profiles"

            [embedding]
            model = "bge-m3"
            base_url = "http://localhost:8080/v1"

            [ranking]
            vector_weight = 0.8
            score_weight = 0.2
            ranking_key = "vector_similarity"
            include_rationale = false
            "#,
        )
        .unwrap();

        assert_eq!(config.storage.profile_dir, PathBuf::from("/tmp/profiles"));
        assert_eq!(config.embedding.model, "bge-m3");
        assert_eq!(config.embedding.dimension, 1024);
        assert_eq!(config.ranking.ranking_key, RankingKey::VectorSimilarity);
        assert_eq!(config.ranking.relevance_threshold, 0.75);
        assert!(!config.ranking.include_rationale);
        assert_eq!(config.ingest.min_history_chars, 30);
        assert_eq!(config.ingest.max_history_chars, 5000);
        assert_eq!(config.ingest.max_display_name_chars, 100);
    }

    #[test]
    fn test_toml_ingest_limits() {
        let config = RetrievalConfig::from_toml_str(
            r#"
            [ingest]
            max_history_chars = 2000
            max_display_name_chars = 40
            "#,
        )
        .unwrap();
        assert_eq!(config.ingest.max_history_chars, 2000);
        assert_eq!(config.ingest.max_display_name_chars, 40);

        let err = RetrievalConfig::from_toml_str(
            r#"
            [ingest]
            min_history_chars = 100
            max_history_chars = 50
            "#,
        )
        .unwrap_err();
        assert!(matches!(err, RetrievalError::Config(_)));
    }

    #[test]
    fn test_toml_rejects_bad_weights() {
        let err = RetrievalConfig::from_toml_str(
            r#"
            [ranking]
            vector_weight = 0.5
            "#,
        )
        .unwrap_err();
        assert!(matches!(err, RetrievalError::Config(_)));
    }

    #[test]
    fn test_dimension_consistency() {
        let err = RetrievalConfig::from_toml_str(
            r#"
            [embedding]
            dimension = 768
            "#,
        )
        .unwrap_err();
        assert!(matches!(err, RetrievalError::Config(_)));

        RetrievalConfig::from_toml_str(
            r#"
            [embedding]
            dimension = 768

            [ingest]
            embedding_dimension = 768
            "#,
        )
        .unwrap();
    }
}
