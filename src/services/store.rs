use async_trait::async_trait;
use thiserror::Error;

use crate::models::{Candidate, Profile, Transcript};

/// Errors that can occur when reading or writing persisted records
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("SQLx error: {0}")]
    SqlxError(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    MigrateError(#[from] sqlx::migrate::MigrateError),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Not found: {0}")]
    NotFound(String),
}

/// Read-only access to the tribe catalog
#[async_trait]
pub trait CatalogStore: Send + Sync {
    async fn list_candidates(&self) -> Result<Vec<Candidate>, StoreError>;

    async fn find_candidate(&self, id: i64) -> Result<Option<Candidate>, StoreError>;

    /// Check that the backing store is reachable
    async fn health_check(&self) -> Result<(), StoreError> {
        Ok(())
    }
}

/// Profile lookup and persistence keyed by owning user
#[async_trait]
pub trait ProfileStore: Send + Sync {
    async fn find_by_owner(&self, owner_id: i64) -> Result<Option<Profile>, StoreError>;

    /// Persist a profile, assigning an id on first save
    async fn save(&self, profile: Profile) -> Result<Profile, StoreError>;
}

/// Conversation transcript persistence keyed by session id
#[async_trait]
pub trait TranscriptStore: Send + Sync {
    async fn find_by_session(&self, session_id: &str) -> Result<Option<Transcript>, StoreError>;

    async fn save(&self, transcript: Transcript) -> Result<Transcript, StoreError>;
}
