//! Fingerprint ingestion.
//!
//! [`ProfileIngestor`] turns a name, a score and a free-text history into a
//! stored [`Profile`]: the history is normalized, embedded by the external
//! generator, encoded and persisted exactly once.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use riskprint_embeddings::{DEFAULT_DIMENSION, EmbeddingProvider, EmbeddingRequest};

use crate::error::{ProfileError, Result};
use crate::narrative::{NarrativeRequest, TextGenerator};
use crate::profile::{MAX_BEHAVIOR_TEXT_CHARS, MAX_DISPLAY_NAME_CHARS, NumericScore, Profile};
use crate::store::ProfileStore;

/// Configuration for ingestion.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IngestConfig {
    /// Minimum normalized history length, in characters.
    pub min_history_chars: usize,

    /// Maximum behavior text length, in characters.
    pub max_history_chars: usize,

    /// Maximum display name length, in characters.
    pub max_display_name_chars: usize,

    /// Dimension every generated fingerprint must have.
    pub embedding_dimension: usize,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            min_history_chars: 30,
            max_history_chars: MAX_BEHAVIOR_TEXT_CHARS,
            max_display_name_chars: MAX_DISPLAY_NAME_CHARS,
            embedding_dimension: DEFAULT_DIMENSION,
        }
    }
}

/// Input for [`ProfileIngestor::ingest`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestRequest {
    pub display_name: String,
    pub numeric_score: i64,
    pub behavior_text: String,
}

impl IngestRequest {
    pub fn new(
        display_name: impl Into<String>,
        numeric_score: i64,
        behavior_text: impl Into<String>,
    ) -> Self {
        Self {
            display_name: display_name.into(),
            numeric_score,
            behavior_text: behavior_text.into(),
        }
    }
}

/// Input for [`ProfileIngestor::ingest_from_raw_data`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawDataRequest {
    pub display_name: String,
    pub numeric_score: i64,

    /// Raw financial data to narrate.
    pub raw_data: String,

    /// Overrides the default narrative instruction.
    pub instruction: Option<String>,
}

impl RawDataRequest {
    pub fn new(display_name: impl Into<String>, numeric_score: i64, raw_data: impl Into<String>) -> Self {
        Self {
            display_name: display_name.into(),
            numeric_score,
            raw_data: raw_data.into(),
            instruction: None,
        }
    }

    /// Set the narrative instruction.
    pub fn with_instruction(mut self, instruction: impl Into<String>) -> Self {
        self.instruction = Some(instruction.into());
        self
    }
}

/// Canonical form of behavior text sent to the embedding generator.
///
/// Trims surrounding whitespace, turns every line break into a single space
/// and lowercases. The persisted text keeps its original casing.
pub fn normalize_behavior_text(text: &str) -> String {
    text.trim()
        .replace("\r\n", " ")
        .replace(['\n', '\r'], " ")
        .to_lowercase()
}

/// Builds and persists profiles from raw input.
pub struct ProfileIngestor {
    embedder: Arc<dyn EmbeddingProvider>,
    store: Arc<dyn ProfileStore>,
    text_generator: Option<Arc<dyn TextGenerator>>,
    config: IngestConfig,
}

impl ProfileIngestor {
    /// Create an ingestor over the given collaborators.
    pub fn new(
        embedder: Arc<dyn EmbeddingProvider>,
        store: Arc<dyn ProfileStore>,
        config: IngestConfig,
    ) -> Self {
        Self {
            embedder,
            store,
            text_generator: None,
            config,
        }
    }

    /// Enable the raw-data path.
    pub fn with_text_generator(mut self, generator: Arc<dyn TextGenerator>) -> Self {
        self.text_generator = Some(generator);
        self
    }

    pub fn config(&self) -> &IngestConfig {
        &self.config
    }

    /// Fingerprint and persist a profile.
    pub async fn ingest(&self, request: IngestRequest) -> Result<Profile> {
        let score = NumericScore::new(request.numeric_score)?;
        let behavior_text = request.behavior_text.trim().to_string();
        let profile = Profile::new_bounded(
            request.display_name,
            score,
            behavior_text,
            self.config.max_display_name_chars,
            self.config.max_history_chars,
        )?;

        let normalized = normalize_behavior_text(profile.behavior_text());
        let length = normalized.chars().count();
        if length < self.config.min_history_chars {
            return Err(ProfileError::InsufficientHistory {
                length,
                minimum: self.config.min_history_chars,
            });
        }

        let embedding = self.generate_embedding(normalized).await?;
        let profile = profile.with_embedding(&embedding);

        self.store.insert(profile.clone()).await?;
        info!(
            "Ingested profile {} ({} dimensions)",
            profile.id(),
            embedding.len()
        );

        Ok(profile)
    }

    /// Narrate raw data with the text generator, then ingest the narrative.
    pub async fn ingest_from_raw_data(&self, request: RawDataRequest) -> Result<Profile> {
        let generator = self.text_generator.as_ref().ok_or_else(|| {
            ProfileError::TextGeneration("text generator not configured".to_string())
        })?;

        let mut narrative_request = NarrativeRequest::new(request.raw_data);
        if let Some(instruction) = request.instruction {
            narrative_request = narrative_request.with_instruction(instruction);
        }

        debug!("Requesting narrative from {}", generator.name());
        let narrative = generator.generate(&narrative_request).await?;

        self.ingest(IngestRequest::new(
            request.display_name,
            request.numeric_score,
            narrative,
        ))
        .await
    }

    async fn generate_embedding(&self, text: String) -> Result<Vec<f32>> {
        let mut responses = self
            .embedder
            .embed_batch(vec![EmbeddingRequest::new(text)])
            .await
            .map_err(|e| {
                ProfileError::EmbeddingGeneration(format!("{}: {e}", self.embedder.name()))
            })?;

        if responses.len() != 1 {
            return Err(ProfileError::EmbeddingGeneration(format!(
                "expected one embedding, received {}",
                responses.len()
            )));
        }
        let embedding = responses.swap_remove(0).embedding;

        if embedding.len() != self.config.embedding_dimension {
            return Err(ProfileError::EmbeddingGeneration(format!(
                "expected {} dimensions, received {}",
                self.config.embedding_dimension,
                embedding.len()
            )));
        }

        Ok(embedding)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryProfileStore;
    use async_trait::async_trait;
    use pretty_assertions::assert_eq;
    use riskprint_embeddings::{EmbeddingError, EmbeddingResponse};
    use std::sync::Mutex;

    /// Returns a fixed vector and records every text it was asked to embed.
    struct RecordingEmbedder {
        vector: Vec<f32>,
        seen: Mutex<Vec<Vec<String>>>,
        fail: bool,
    }

    impl RecordingEmbedder {
        fn new(vector: Vec<f32>) -> Self {
            Self {
                vector,
                seen: Mutex::new(Vec::new()),
                fail: false,
            }
        }

        fn failing() -> Self {
            Self {
                fail: true,
                ..Self::new(Vec::new())
            }
        }

        fn calls(&self) -> Vec<Vec<String>> {
            self.seen.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl EmbeddingProvider for RecordingEmbedder {
        fn name(&self) -> &str {
            "recording"
        }

        fn default_model(&self) -> &str {
            "fixed"
        }

        fn dimension(&self) -> usize {
            self.vector.len()
        }

        async fn embed(&self, request: EmbeddingRequest) -> riskprint_embeddings::Result<EmbeddingResponse> {
            let mut responses = self.embed_batch(vec![request]).await?;
            Ok(responses.remove(0))
        }

        async fn embed_batch(
            &self,
            requests: Vec<EmbeddingRequest>,
        ) -> riskprint_embeddings::Result<Vec<EmbeddingResponse>> {
            self.seen
                .lock()
                .unwrap()
                .push(requests.iter().map(|r| r.text.clone()).collect());
            if self.fail {
                return Err(EmbeddingError::ApiRequest("unavailable".to_string()));
            }
            Ok(requests
                .iter()
                .map(|_| EmbeddingResponse {
                    embedding: self.vector.clone(),
                    model: "fixed".to_string(),
                    dimension: self.vector.len(),
                    tokens_used: None,
                })
                .collect())
        }

        fn is_available(&self) -> bool {
            true
        }
    }

    struct CannedGenerator(String);

    #[async_trait]
    impl TextGenerator for CannedGenerator {
        fn name(&self) -> &str {
            "canned"
        }

        async fn generate(&self, request: &NarrativeRequest) -> Result<String> {
            assert!(!request.raw_data.is_empty());
            Ok(self.0.clone())
        }
    }

    fn config() -> IngestConfig {
        IngestConfig {
            min_history_chars: 30,
            embedding_dimension: 4,
            ..IngestConfig::default()
        }
    }

    fn ingestor(embedder: Arc<RecordingEmbedder>, store: Arc<MemoryProfileStore>) -> ProfileIngestor {
        ProfileIngestor::new(embedder, store, config())
    }

    #[test]
    fn test_normalize_behavior_text() {
        assert_eq!(
            normalize_behavior_text("  Pays Rent\r\nOn Time\nEvery\rMonth  "),
            "pays rent on time every month"
        );
    }

    #[tokio::test]
    async fn test_ingest_persists_profile_once() {
        let embedder = Arc::new(RecordingEmbedder::new(vec![0.1, 0.2, 0.3, 0.4]));
        let store = Arc::new(MemoryProfileStore::new());
        let ingestor = ingestor(embedder.clone(), store.clone());

        let text = "  Pays the Mortgage early,\nnever misses a card payment.  ";
        let profile = ingestor
            .ingest(IngestRequest::new("Ada Lovelace", 712, text))
            .await
            .unwrap();

        assert_eq!(
            embedder.calls(),
            vec![vec![
                "pays the mortgage early, never misses a card payment.".to_string()
            ]]
        );
        assert_eq!(
            profile.behavior_text(),
            "Pays the Mortgage early,\nnever misses a card payment."
        );
        assert_eq!(profile.numeric_score().value(), 712);
        assert_eq!(
            profile.embedding_vector(4).unwrap(),
            Some(vec![0.1, 0.2, 0.3, 0.4])
        );
        assert_eq!(store.len().await, 1);
        assert_eq!(store.get(profile.id()).await.unwrap(), Some(profile));
    }

    #[tokio::test]
    async fn test_minimum_history_boundary() {
        let embedder = Arc::new(RecordingEmbedder::new(vec![1.0; 4]));
        let store = Arc::new(MemoryProfileStore::new());
        let ingestor = ingestor(embedder.clone(), store.clone());

        let err = ingestor
            .ingest(IngestRequest::new("Ada", 700, format!("  {}\n", "a".repeat(29))))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ProfileError::InsufficientHistory {
                length: 29,
                minimum: 30
            }
        ));
        assert!(embedder.calls().is_empty());
        assert!(store.is_empty().await);

        ingestor
            .ingest(IngestRequest::new("Ada", 700, "a".repeat(30)))
            .await
            .unwrap();
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn test_invalid_score_rejected_before_embedding() {
        let embedder = Arc::new(RecordingEmbedder::new(vec![1.0; 4]));
        let store = Arc::new(MemoryProfileStore::new());
        let ingestor = ingestor(embedder.clone(), store);

        let err = ingestor
            .ingest(IngestRequest::new("Ada", 1001, "a".repeat(40)))
            .await
            .unwrap_err();
        assert!(matches!(err, ProfileError::InvalidInput(_)));
        assert!(embedder.calls().is_empty());
    }

    #[tokio::test]
    async fn test_configured_length_limits() {
        let embedder = Arc::new(RecordingEmbedder::new(vec![1.0; 4]));
        let store = Arc::new(MemoryProfileStore::new());
        let ingestor = ProfileIngestor::new(
            embedder.clone(),
            store.clone(),
            IngestConfig {
                max_history_chars: 40,
                max_display_name_chars: 5,
                ..config()
            },
        );

        let err = ingestor
            .ingest(IngestRequest::new("Ada", 700, "a".repeat(41)))
            .await
            .unwrap_err();
        assert!(matches!(err, ProfileError::InvalidInput(_)));

        let err = ingestor
            .ingest(IngestRequest::new("Adelaide", 700, "a".repeat(40)))
            .await
            .unwrap_err();
        assert!(matches!(err, ProfileError::InvalidInput(_)));
        assert!(embedder.calls().is_empty());

        ingestor
            .ingest(IngestRequest::new("Ada", 700, "a".repeat(40)))
            .await
            .unwrap();
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn test_wrong_dimension_is_generation_error() {
        let embedder = Arc::new(RecordingEmbedder::new(vec![1.0; 3]));
        let store = Arc::new(MemoryProfileStore::new());
        let ingestor = ingestor(embedder, store.clone());

        let err = ingestor
            .ingest(IngestRequest::new("Ada", 700, "a".repeat(40)))
            .await
            .unwrap_err();
        assert!(matches!(err, ProfileError::EmbeddingGeneration(_)));
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn test_generator_failure_surfaces() {
        let embedder = Arc::new(RecordingEmbedder::failing());
        let store = Arc::new(MemoryProfileStore::new());
        let ingestor = ingestor(embedder.clone(), store.clone());

        let err = ingestor
            .ingest(IngestRequest::new("Ada", 700, "a".repeat(40)))
            .await
            .unwrap_err();
        match err {
            ProfileError::EmbeddingGeneration(message) => assert!(message.contains("unavailable")),
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(embedder.calls().len(), 1);
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn test_ingest_from_raw_data() {
        let embedder = Arc::new(RecordingEmbedder::new(vec![1.0; 4]));
        let store = Arc::new(MemoryProfileStore::new());
        let ingestor = ingestor(embedder.clone(), store.clone()).with_text_generator(Arc::new(
            CannedGenerator("Steady salary, saves a fifth of income each month.".to_string()),
        ));

        let profile = ingestor
            .ingest_from_raw_data(RawDataRequest::new("Ada", 640, "salary=3000;savings=600"))
            .await
            .unwrap();

        assert_eq!(
            profile.behavior_text(),
            "Steady salary, saves a fifth of income each month."
        );
        assert_eq!(
            embedder.calls(),
            vec![vec!["steady salary, saves a fifth of income each month.".to_string()]]
        );
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn test_raw_data_without_generator() {
        let embedder = Arc::new(RecordingEmbedder::new(vec![1.0; 4]));
        let store = Arc::new(MemoryProfileStore::new());
        let ingestor = ingestor(embedder, store);

        let err = ingestor
            .ingest_from_raw_data(RawDataRequest::new("Ada", 640, "data"))
            .await
            .unwrap_err();
        assert!(matches!(err, ProfileError::TextGeneration(_)));
    }
}
