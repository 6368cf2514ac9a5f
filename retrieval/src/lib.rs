//! # Retrieval
//!
//! Similarity search over behavioral fingerprints.
//!
//! The [`HybridRanker`] scores every candidate against a target by cosine
//! similarity of their fingerprints, drops candidates below the relevance
//! gate, blends in credit-score proximity and returns a bounded, ordered
//! list. [`FingerprintEngine`] wires ranking, ingestion and storage together
//! for a boundary layer.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                      Fingerprint Engine                         │
//! ├─────────────────────────────────────────────────────────────────┤
//! │  ingest ──► ProfileIngestor ──► ProfileStore                    │
//! │                                      │                          │
//! │  find_similar ──► target + candidates┘                          │
//! │                          │                                      │
//! │                          ▼                                      │
//! │  HybridRanker: decode ► cosine ► gate ► blend ► sort ► truncate │
//! │                          │                                      │
//! │                          ▼                                      │
//! │                   Vec<RankedMatch>                              │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```rust,ignore
//! use riskprint_retrieval::{FingerprintEngine, RetrievalConfig};
//!
//! let config = RetrievalConfig::load("riskprint.toml")?;
//! let engine = FingerprintEngine::from_config(&config).await?;
//!
//! let profile = engine
//!     .ingest(IngestRequest::new("Ada", 712, "Pays every card in full each month..."))
//!     .await?;
//! let matches = engine.find_similar(profile.id(), 10).await?;
//! ```

pub mod config;
pub mod engine;
pub mod error;
pub mod rationale;
pub mod ranker;

pub use config::{RankingKey, RankingPolicy, RetrievalConfig};
pub use engine::{FingerprintEngine, FingerprintEngineBuilder};
pub use error::{ErrorKind, Result, RetrievalError};
pub use ranker::{HybridRanker, RankedMatch};

// Re-export from dependencies for convenience
pub use riskprint_embeddings::EmbeddingProvider;
pub use riskprint_profiles::{
    IngestConfig, IngestRequest, Profile, ProfileId, ProfileStore, RawDataRequest, TextGenerator,
};
