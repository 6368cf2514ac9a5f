//! Fingerprint engine: the entry point a boundary layer calls.

use std::sync::Arc;

use tracing::{debug, info};

use riskprint_embeddings::{EmbeddingProvider, OpenAIProvider};
use riskprint_profiles::{
    IngestConfig, IngestRequest, JsonProfileStore, OpenAIChatGenerator, Profile, ProfileError,
    ProfileId, ProfileIngestor, ProfileStore, RawDataRequest, TextGenerator,
};

use crate::config::{RankingPolicy, RetrievalConfig};
use crate::error::{Result, RetrievalError};
use crate::ranker::{HybridRanker, RankedMatch};

/// Ingests profiles and finds behaviorally similar ones.
///
/// All collaborators are passed in explicitly; the engine keeps no mutable
/// state of its own, so one instance can serve concurrent calls.
pub struct FingerprintEngine {
    store: Arc<dyn ProfileStore>,
    ingestor: ProfileIngestor,
    ranker: HybridRanker,
}

impl FingerprintEngine {
    /// Create a new engine builder.
    pub fn builder() -> FingerprintEngineBuilder {
        FingerprintEngineBuilder::new()
    }

    /// Wire the engine from configuration: a JSON store under the
    /// configured directory and OpenAI-compatible collaborators.
    pub async fn from_config(config: &RetrievalConfig) -> Result<Self> {
        config.validate()?;
        info!("Initializing fingerprint engine");

        let store = JsonProfileStore::open(&config.storage.profile_dir).await?;
        debug!("Profile store at {}", store.root().display());

        let mut embedder = OpenAIProvider::new()
            .with_base_url(&config.embedding.base_url)
            .with_model(&config.embedding.model)
            .with_dimension(config.embedding.dimension);
        if let Ok(key) = std::env::var(&config.embedding.api_key_env) {
            embedder = embedder.with_api_key(key);
        }

        let mut builder = Self::builder()
            .with_store(Arc::new(store))
            .with_embedding_provider(Arc::new(embedder))
            .with_ranking_policy(config.ranking.clone())
            .with_ingest_config(config.ingest.clone());

        if config.generation.enabled {
            let mut generator = OpenAIChatGenerator::new()
                .with_base_url(&config.generation.base_url)
                .with_model(&config.generation.model)
                .with_temperature(config.generation.temperature);
            if let Ok(key) = std::env::var(&config.generation.api_key_env) {
                generator = generator.with_api_key(key);
            }
            builder = builder.with_text_generator(Arc::new(generator));
        }

        builder.build()
    }

    /// Fingerprint and store a new profile.
    pub async fn ingest(&self, request: IngestRequest) -> Result<Profile> {
        Ok(self.ingestor.ingest(request).await?)
    }

    /// Narrate raw data, then fingerprint and store the result.
    pub async fn ingest_from_raw_data(&self, request: RawDataRequest) -> Result<Profile> {
        Ok(self.ingestor.ingest_from_raw_data(request).await?)
    }

    /// Fetch a profile by identity.
    pub async fn get_profile(&self, id: ProfileId) -> Result<Profile> {
        self.store
            .get(id)
            .await?
            .ok_or_else(|| ProfileError::NotFound(id).into())
    }

    /// Find the profiles most behaviorally similar to `target`.
    ///
    /// The caller bounds `limit`; the engine returns at most that many.
    pub async fn find_similar(&self, target: ProfileId, limit: usize) -> Result<Vec<RankedMatch>> {
        let target = self.get_profile(target).await?;
        if !target.has_embedding() {
            return Err(RetrievalError::TargetNotEligible(target.id()));
        }

        let candidates = self.store.list_embedded_excluding(target.id()).await?;
        debug!(
            "Scanning {} candidates for {}",
            candidates.len(),
            target.id()
        );

        self.ranker.rank(&target, &candidates, limit)
    }

    /// The active ranking policy.
    pub fn ranking_policy(&self) -> &RankingPolicy {
        self.ranker.policy()
    }
}

/// Builder for [`FingerprintEngine`].
pub struct FingerprintEngineBuilder {
    store: Option<Arc<dyn ProfileStore>>,
    embedder: Option<Arc<dyn EmbeddingProvider>>,
    text_generator: Option<Arc<dyn TextGenerator>>,
    policy: RankingPolicy,
    ingest: IngestConfig,
}

impl FingerprintEngineBuilder {
    /// Create a new builder with default policy and limits.
    pub fn new() -> Self {
        Self {
            store: None,
            embedder: None,
            text_generator: None,
            policy: RankingPolicy::default(),
            ingest: IngestConfig::default(),
        }
    }

    /// Set the profile store.
    pub fn with_store(mut self, store: Arc<dyn ProfileStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Set the embedding provider.
    pub fn with_embedding_provider(mut self, embedder: Arc<dyn EmbeddingProvider>) -> Self {
        self.embedder = Some(embedder);
        self
    }

    /// Enable raw-data ingestion through a narrative generator.
    pub fn with_text_generator(mut self, generator: Arc<dyn TextGenerator>) -> Self {
        self.text_generator = Some(generator);
        self
    }

    /// Set the ranking policy.
    pub fn with_ranking_policy(mut self, policy: RankingPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Set ingestion limits.
    pub fn with_ingest_config(mut self, config: IngestConfig) -> Self {
        self.ingest = config;
        self
    }

    /// Build the engine.
    pub fn build(self) -> Result<FingerprintEngine> {
        let store = self
            .store
            .ok_or_else(|| RetrievalError::Config("profile store not set".to_string()))?;
        let embedder = self
            .embedder
            .ok_or_else(|| RetrievalError::Config("embedding provider not set".to_string()))?;

        if embedder.dimension() != self.ingest.embedding_dimension {
            return Err(RetrievalError::Config(format!(
                "provider {} produces {} dimensions, ingestion expects {}",
                embedder.name(),
                embedder.dimension(),
                self.ingest.embedding_dimension
            )));
        }

        let ranker = HybridRanker::new(self.policy)?.with_dimension(self.ingest.embedding_dimension);

        let mut ingestor = ProfileIngestor::new(embedder, Arc::clone(&store), self.ingest);
        if let Some(generator) = self.text_generator {
            ingestor = ingestor.with_text_generator(generator);
        }

        Ok(FingerprintEngine {
            store,
            ingestor,
            ranker,
        })
    }
}

impl Default for FingerprintEngineBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use riskprint_profiles::MemoryProfileStore;
    use tempfile::TempDir;

    #[test]
    fn test_builder_requires_collaborators() {
        let err = FingerprintEngine::builder().build().err().unwrap();
        assert!(matches!(err, RetrievalError::Config(_)));

        let err = FingerprintEngine::builder()
            .with_store(Arc::new(MemoryProfileStore::new()))
            .build()
            .err()
            .unwrap();
        assert!(matches!(err, RetrievalError::Config(_)));
    }

    #[test]
    fn test_builder_checks_provider_dimension() {
        let err = FingerprintEngine::builder()
            .with_store(Arc::new(MemoryProfileStore::new()))
            .with_embedding_provider(Arc::new(OpenAIProvider::new().with_dimension(512)))
            .build()
            .err()
            .unwrap();
        assert!(matches!(err, RetrievalError::Config(_)));
    }

    #[tokio::test]
    async fn test_from_config() {
        let temp_dir = TempDir::new().unwrap();
        let config = RetrievalConfig::default().with_profile_dir(temp_dir.path());

        let engine = FingerprintEngine::from_config(&config).await.unwrap();
        assert_eq!(engine.ranking_policy().relevance_threshold, 0.75);

        let err = engine.find_similar(ProfileId::new(), 5).await.unwrap_err();
        assert!(matches!(
            err,
            RetrievalError::Profile(ProfileError::NotFound(_))
        ));
    }
}
