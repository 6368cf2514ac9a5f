//! # Profiles
//!
//! Risk profiles and the pipeline that fingerprints them.
//!
//! - **Profile**: identity, display name, credit score, behavior text and an
//!   immutable behavioral fingerprint
//! - **Storage**: the [`ProfileStore`] seam with in-memory and JSON backends
//! - **Ingestion**: normalization, embedding and persistence of new profiles
//! - **Narratives**: optional generation of behavior text from raw data
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                      Ingestion Pipeline                         │
//! ├─────────────────────────────────────────────────────────────────┤
//! │  raw data ──► TextGenerator ──┐                                 │
//! │                               ▼                                 │
//! │  behavior text ──► normalize ──► EmbeddingProvider              │
//! │                                        │                        │
//! │                                        ▼                        │
//! │                 Profile ◄── codec::encode ──► ProfileStore      │
//! └─────────────────────────────────────────────────────────────────┘
//! ```

pub mod error;
pub mod ingest;
pub mod narrative;
pub mod profile;
pub mod store;

pub use error::{ProfileError, Result, StorageError};
pub use ingest::{IngestConfig, IngestRequest, ProfileIngestor, RawDataRequest, normalize_behavior_text};
pub use narrative::{NarrativeRequest, OpenAIChatGenerator, TextGenerator};
pub use profile::{NumericScore, Profile, ProfileId};
pub use store::{JsonProfileStore, MemoryProfileStore, ProfileStore};
