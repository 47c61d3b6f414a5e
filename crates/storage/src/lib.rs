//! Storage Layer
//!
//! Local key-value persistence standing in for the device's secure and
//! non-secure storage: the bearer token, the cached session user and the
//! set of recorded artifacts whose points were already committed.

mod repository;

pub use repository::{LocalStore, SessionUser};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Storage errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Storage I/O error: {0}")]
    Io(String),
    #[error("Lock error: {0}")]
    Lock(String),
    #[error("Serialization error: {0}")]
    SerializationError(String),
}

/// Identity of a recorded driving artifact (backend driving session id)
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ArtifactId(pub String);

impl ArtifactId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<i64> for ArtifactId {
    fn from(id: i64) -> Self {
        Self(id.to_string())
    }
}

impl fmt::Display for ArtifactId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Source of the bearer credential attached to backend calls
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Current access token, if one is stored
    async fn access_token(&self) -> Option<String>;
}
