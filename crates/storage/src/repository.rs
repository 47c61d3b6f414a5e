//! Local Store Implementation

use crate::{ArtifactId, CredentialStore, StorageError};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::{debug, info, warn};

/// Logged-in user as cached after login
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionUser {
    pub id: i64,
    #[serde(default)]
    pub firstname: String,
    #[serde(default)]
    pub points: i64,
}

/// Everything the store persists
#[derive(Debug, Default, Serialize, Deserialize)]
struct StoreData {
    #[serde(default)]
    access_token: Option<String>,
    #[serde(default)]
    user: Option<SessionUser>,
    #[serde(default)]
    scored_artifacts: BTreeSet<ArtifactId>,
}

/// Key-value store, in memory with optional JSON file backing
pub struct LocalStore {
    data: Mutex<StoreData>,
    /// Backing file; `None` keeps everything in memory
    path: Option<PathBuf>,
}

impl LocalStore {
    /// Create a store that lives only in memory
    pub fn in_memory() -> Self {
        debug!("Creating in-memory local store");
        Self {
            data: Mutex::new(StoreData::default()),
            path: None,
        }
    }

    /// Open (or create) a JSON-file backed store
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StorageError> {
        let path = path.as_ref().to_path_buf();

        let data = match std::fs::read_to_string(&path) {
            Ok(contents) => serde_json::from_str(&contents)
                .map_err(|e| StorageError::SerializationError(e.to_string()))?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => StoreData::default(),
            Err(e) => return Err(StorageError::Io(e.to_string())),
        };

        info!("Opened local store at {}", path.display());
        Ok(Self {
            data: Mutex::new(data),
            path: Some(path),
        })
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, StoreData>, StorageError> {
        self.data
            .lock()
            .map_err(|e| StorageError::Lock(e.to_string()))
    }

    fn persist(&self, data: &StoreData) -> Result<(), StorageError> {
        let Some(path) = &self.path else {
            return Ok(());
        };

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|e| StorageError::Io(e.to_string()))?;
            }
        }

        let json = serde_json::to_string_pretty(data)
            .map_err(|e| StorageError::SerializationError(e.to_string()))?;
        std::fs::write(path, json).map_err(|e| StorageError::Io(e.to_string()))
    }

    /// Stored bearer token
    pub fn token(&self) -> Option<String> {
        self.lock().ok().and_then(|d| d.access_token.clone())
    }

    pub fn set_access_token(&self, token: impl Into<String>) -> Result<(), StorageError> {
        let mut data = self.lock()?;
        data.access_token = Some(token.into());
        self.persist(&data)
    }

    /// Cached session user
    pub fn session_user(&self) -> Option<SessionUser> {
        self.lock().ok().and_then(|d| d.user.clone())
    }

    pub fn set_session_user(&self, user: SessionUser) -> Result<(), StorageError> {
        let mut data = self.lock()?;
        info!("Caching session user {}", user.id);
        data.user = Some(user);
        self.persist(&data)
    }

    /// Add points to the cached user after a successful commit
    pub fn credit_session_user(&self, points: u32) -> Result<(), StorageError> {
        let mut data = self.lock()?;
        if let Some(user) = data.user.as_mut() {
            user.points += i64::from(points);
        }
        self.persist(&data)
    }

    /// Forget user and token
    pub fn logout(&self) -> Result<(), StorageError> {
        let mut data = self.lock()?;
        data.user = None;
        data.access_token = None;
        self.persist(&data)
    }

    /// Whether an artifact's points were already committed
    pub fn is_artifact_scored(&self, artifact: &ArtifactId) -> bool {
        self.lock()
            .map(|d| d.scored_artifacts.contains(artifact))
            .unwrap_or(false)
    }

    /// Record an artifact as committed.
    ///
    /// Returns `true` when the artifact was not recorded before. The in-memory
    /// set is updated before the file is written; a failed write is logged and
    /// does not undo the insertion.
    pub fn mark_artifact_scored(&self, artifact: ArtifactId) -> Result<bool, StorageError> {
        let mut data = self.lock()?;
        if !data.scored_artifacts.insert(artifact.clone()) {
            return Ok(false);
        }

        if let Err(e) = self.persist(&data) {
            warn!("Could not persist scored artifact {}: {}", artifact, e);
        }
        Ok(true)
    }

    /// Number of scored artifacts
    pub fn scored_count(&self) -> usize {
        self.lock().map(|d| d.scored_artifacts.len()).unwrap_or(0)
    }
}

impl Default for LocalStore {
    fn default() -> Self {
        Self::in_memory()
    }
}

#[async_trait]
impl CredentialStore for LocalStore {
    async fn access_token(&self) -> Option<String> {
        self.token()
    }
}
