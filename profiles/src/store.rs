//! Profile storage.
//!
//! The [`ProfileStore`] trait is the persistence seam used by ingestion and
//! ranking. Two backends are provided: an in-memory map and a directory of
//! JSON records written atomically.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs;
use tokio::sync::RwLock;
use tracing::{debug, info};

use crate::error::{Result, StorageError};
use crate::profile::{Profile, ProfileId};

/// Persistence operations needed by ingestion and similarity search.
#[async_trait]
pub trait ProfileStore: Send + Sync {
    /// Fetch one profile by identity.
    async fn get(&self, id: ProfileId) -> Result<Option<Profile>>;

    /// Fetch every profile that carries an embedding, except `exclude`,
    /// ordered by identity.
    async fn list_embedded_excluding(&self, exclude: ProfileId) -> Result<Vec<Profile>>;

    /// Insert a new profile. Identities are never reused.
    async fn insert(&self, profile: Profile) -> Result<()>;
}

fn embedded_excluding<'a>(
    profiles: impl Iterator<Item = &'a Profile>,
    exclude: ProfileId,
) -> Vec<Profile> {
    let mut selected: Vec<Profile> = profiles
        .filter(|p| p.id() != exclude && p.has_embedding())
        .cloned()
        .collect();
    selected.sort_by_key(Profile::id);
    selected
}

/// In-memory profile store.
#[derive(Default)]
pub struct MemoryProfileStore {
    profiles: RwLock<HashMap<ProfileId, Profile>>,
}

impl MemoryProfileStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored profiles.
    pub async fn len(&self) -> usize {
        self.profiles.read().await.len()
    }

    /// Whether the store is empty.
    pub async fn is_empty(&self) -> bool {
        self.profiles.read().await.is_empty()
    }
}

#[async_trait]
impl ProfileStore for MemoryProfileStore {
    async fn get(&self, id: ProfileId) -> Result<Option<Profile>> {
        Ok(self.profiles.read().await.get(&id).cloned())
    }

    async fn list_embedded_excluding(&self, exclude: ProfileId) -> Result<Vec<Profile>> {
        Ok(embedded_excluding(self.profiles.read().await.values(), exclude))
    }

    async fn insert(&self, profile: Profile) -> Result<()> {
        let mut profiles = self.profiles.write().await;
        if profiles.contains_key(&profile.id()) {
            return Err(StorageError::AlreadyExists(profile.id()).into());
        }
        profiles.insert(profile.id(), profile);
        Ok(())
    }
}

/// Directory-backed profile store.
///
/// Each profile is a `<id>.json` file under the root directory. All records
/// are loaded when the store opens; a record that fails to parse fails the
/// open rather than disappearing from search results.
pub struct JsonProfileStore {
    /// Root directory for profile files.
    root: PathBuf,

    /// In-memory copy of every record on disk.
    cache: RwLock<HashMap<ProfileId, Profile>>,
}

impl JsonProfileStore {
    /// Open a store at the given root directory, creating it if needed.
    pub async fn open(root: impl AsRef<Path>) -> Result<Self> {
        let root = root.as_ref().to_path_buf();

        fs::create_dir_all(&root)
            .await
            .map_err(|e| StorageError::CreateDirectory(format!("{}: {e}", root.display())))?;

        let cache = Self::load_all(&root).await?;
        info!("Loaded {} profiles from {}", cache.len(), root.display());

        Ok(Self {
            root,
            cache: RwLock::new(cache),
        })
    }

    /// Root directory of this store.
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn profile_path(&self, id: ProfileId) -> PathBuf {
        self.root.join(format!("{id}.json"))
    }

    async fn load_all(root: &Path) -> Result<HashMap<ProfileId, Profile>> {
        let mut entries = fs::read_dir(root)
            .await
            .map_err(|e| StorageError::ReadFile(format!("{}: {e}", root.display())))?;

        let mut profiles = HashMap::new();
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| StorageError::ReadFile(format!("{e}")))?
        {
            let path = entry.path();
            if path.extension().is_some_and(|ext| ext == "json") {
                let profile = Self::load_file(&path).await?;
                let stem = path.file_stem().and_then(|s| s.to_str()).unwrap_or_default();
                if stem != profile.id().to_string() {
                    return Err(StorageError::CorruptRecord {
                        path: path.display().to_string(),
                        reason: format!("file name does not match profile id {}", profile.id()),
                    }
                    .into());
                }
                debug!("Loaded profile: {}", profile.id());
                profiles.insert(profile.id(), profile);
            }
        }

        Ok(profiles)
    }

    async fn load_file(path: &Path) -> Result<Profile> {
        let content = fs::read_to_string(path)
            .await
            .map_err(|e| StorageError::ReadFile(format!("{}: {e}", path.display())))?;

        serde_json::from_str(&content).map_err(|e| {
            StorageError::CorruptRecord {
                path: path.display().to_string(),
                reason: e.to_string(),
            }
            .into()
        })
    }

    async fn save_file(&self, profile: &Profile) -> Result<()> {
        let path = self.profile_path(profile.id());
        let content = serde_json::to_string_pretty(profile)?;

        // Write atomically using a temp file
        let temp_path = path.with_extension("json.tmp");
        fs::write(&temp_path, &content)
            .await
            .map_err(|e| StorageError::WriteFile(format!("{}: {e}", temp_path.display())))?;

        fs::rename(&temp_path, &path)
            .await
            .map_err(|e| StorageError::WriteFile(format!("{}: {e}", path.display())))?;

        debug!("Saved profile: {}", profile.id());
        Ok(())
    }
}

#[async_trait]
impl ProfileStore for JsonProfileStore {
    async fn get(&self, id: ProfileId) -> Result<Option<Profile>> {
        Ok(self.cache.read().await.get(&id).cloned())
    }

    async fn list_embedded_excluding(&self, exclude: ProfileId) -> Result<Vec<Profile>> {
        Ok(embedded_excluding(self.cache.read().await.values(), exclude))
    }

    async fn insert(&self, profile: Profile) -> Result<()> {
        // Held across the write so two inserts of one id cannot both land.
        let mut cache = self.cache.write().await;
        if cache.contains_key(&profile.id()) {
            return Err(StorageError::AlreadyExists(profile.id()).into());
        }

        self.save_file(&profile).await?;
        cache.insert(profile.id(), profile);
        Ok(())
    }
}
