use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;

use crate::models::{Candidate, Profile, Transcript};
use crate::services::store::{CatalogStore, ProfileStore, StoreError, TranscriptStore};

/// In-memory implementation of every store
///
/// Backs local development when no database is configured, and the test suite.
#[derive(Default)]
pub struct MemoryStore {
    tribes: RwLock<Vec<Candidate>>,
    profiles: RwLock<Vec<Profile>>,
    transcripts: RwLock<HashMap<String, Transcript>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_tribes(tribes: Vec<Candidate>) -> Self {
        Self {
            tribes: RwLock::new(tribes),
            ..Self::default()
        }
    }

    /// The two tribes a fresh deployment starts with
    pub fn seeded() -> Self {
        Self::with_tribes(vec![
            Candidate {
                id: 1,
                name: "Climate Action Coalition".to_string(),
                description: "Fighting climate change".to_string(),
                location: Some("Global".to_string()),
            },
            Candidate {
                id: 2,
                name: "Tech for Good".to_string(),
                description: "Tech solutions for social impact".to_string(),
                location: Some("San Francisco".to_string()),
            },
        ])
    }

    pub async fn profile_count(&self) -> usize {
        self.profiles.read().await.len()
    }
}

#[async_trait]
impl CatalogStore for MemoryStore {
    async fn list_candidates(&self) -> Result<Vec<Candidate>, StoreError> {
        Ok(self.tribes.read().await.clone())
    }

    async fn find_candidate(&self, id: i64) -> Result<Option<Candidate>, StoreError> {
        Ok(self.tribes.read().await.iter().find(|t| t.id == id).cloned())
    }
}

#[async_trait]
impl ProfileStore for MemoryStore {
    async fn find_by_owner(&self, owner_id: i64) -> Result<Option<Profile>, StoreError> {
        Ok(self
            .profiles
            .read()
            .await
            .iter()
            .find(|p| p.owner_id == Some(owner_id))
            .cloned())
    }

    async fn save(&self, mut profile: Profile) -> Result<Profile, StoreError> {
        let mut profiles = self.profiles.write().await;

        match profile.id {
            Some(id) => {
                let slot = profiles
                    .iter_mut()
                    .find(|p| p.id == Some(id))
                    .ok_or_else(|| StoreError::NotFound(format!("Profile {} not found", id)))?;
                *slot = profile.clone();
            }
            None => {
                let next_id = profiles.iter().filter_map(|p| p.id).max().unwrap_or(0) + 1;
                profile.id = Some(next_id);
                profiles.push(profile.clone());
            }
        }

        Ok(profile)
    }
}

#[async_trait]
impl TranscriptStore for MemoryStore {
    async fn find_by_session(&self, session_id: &str) -> Result<Option<Transcript>, StoreError> {
        Ok(self.transcripts.read().await.get(session_id).cloned())
    }

    async fn save(&self, transcript: Transcript) -> Result<Transcript, StoreError> {
        self.transcripts
            .write()
            .await
            .insert(transcript.session_id.clone(), transcript.clone());
        Ok(transcript)
    }
}
