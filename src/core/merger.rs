use chrono::Utc;
use std::collections::BTreeSet;
use std::sync::Arc;

use crate::models::{Profile, ProfileDelta, ProfileUpdate};
use crate::services::{ProfileStore, StoreError};

/// Trim, drop empties, dedupe and sort tags for storage
pub fn normalize_tags<I, S>(tags: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    tags.into_iter()
        .map(|t| t.as_ref().trim().to_string())
        .filter(|t| !t.is_empty())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Fold a conversational delta into a profile without losing data
///
/// Tags are unioned; city and country are only overwritten by non-empty
/// values; coordinates are never touched. Applying the same delta twice
/// gives the same result as applying it once.
pub fn merge_delta(
    existing: Option<Profile>,
    owner_id: Option<i64>,
    delta: &ProfileDelta,
) -> Profile {
    let mut profile = existing.unwrap_or_else(|| Profile::empty(owner_id));

    profile.interests = normalize_tags(profile.interests.iter().chain(delta.interests.iter()));
    profile.skills = normalize_tags(profile.skills.iter().chain(delta.skills.iter()));

    if let Some(city) = non_empty(delta.location_city.as_deref()) {
        profile.location_city = Some(city);
    }
    if let Some(country) = non_empty(delta.location_country.as_deref()) {
        profile.location_country = Some(country);
    }

    profile
}

/// Overwrite a profile from an explicit save form
///
/// Unlike [`merge_delta`] this replaces tag sets and location outright,
/// and is the only way coordinates get set.
pub fn apply_update(existing: Option<Profile>, update: &ProfileUpdate) -> Profile {
    let mut profile = existing.unwrap_or_else(|| Profile::empty(update.user_id));

    profile.interests = normalize_tags(&update.interests);
    profile.skills = normalize_tags(&update.skills);
    profile.location_city = update.location_city.clone();
    profile.location_country = update.location_country.clone();
    profile.location_lat = update.location_lat;
    profile.location_lng = update.location_lng;

    if update.complete && profile.onboarding_completed_at.is_none() {
        profile.onboarding_completed_at = Some(Utc::now());
    }

    profile
}

fn non_empty(value: Option<&str>) -> Option<String> {
    value.map(str::trim).filter(|v| !v.is_empty()).map(str::to_string)
}

/// Loads, merges and persists profiles by owning user
#[derive(Clone)]
pub struct ProfileMerger {
    store: Arc<dyn ProfileStore>,
}

impl ProfileMerger {
    pub fn new(store: Arc<dyn ProfileStore>) -> Self {
        Self { store }
    }

    async fn existing(&self, owner_id: Option<i64>) -> Result<Option<Profile>, StoreError> {
        match owner_id {
            Some(owner) => self.store.find_by_owner(owner).await,
            None => Ok(None),
        }
    }

    /// Apply a delta to the owner's profile, creating it if needed
    ///
    /// Without an owner a fresh anonymous profile is created. An empty delta
    /// against an existing profile is not written back.
    pub async fn merge(
        &self,
        owner_id: Option<i64>,
        delta: &ProfileDelta,
    ) -> Result<Profile, StoreError> {
        let existing = match self.existing(owner_id).await? {
            Some(profile) if delta.is_empty() => {
                tracing::debug!("Empty delta for owner {:?}, profile unchanged", owner_id);
                return Ok(profile);
            }
            other => other,
        };
        let created = existing.is_none();

        let saved = self.store.save(merge_delta(existing, owner_id, delta)).await?;

        tracing::debug!(
            "Merged delta into profile {:?} (owner: {:?}, created: {}, interests: {}, skills: {})",
            saved.id,
            owner_id,
            created,
            saved.interests.len(),
            saved.skills.len()
        );

        Ok(saved)
    }

    /// Upsert a profile from an explicit save form
    pub async fn save(&self, update: &ProfileUpdate) -> Result<Profile, StoreError> {
        let existing = self.existing(update.user_id).await?;
        let saved = self.store.save(apply_update(existing, update)).await?;

        tracing::info!("Saved profile {:?} (owner: {:?})", saved.id, saved.owner_id);

        Ok(saved)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::MemoryStore;
    use async_trait::async_trait;

    /// Holds one profile and rejects every write
    struct FrozenProfiles(Profile);

    #[async_trait]
    impl ProfileStore for FrozenProfiles {
        async fn find_by_owner(&self, _owner_id: i64) -> Result<Option<Profile>, StoreError> {
            Ok(Some(self.0.clone()))
        }

        async fn save(&self, _profile: Profile) -> Result<Profile, StoreError> {
            Err(StoreError::NotFound("user_profiles".to_string()))
        }
    }

    fn tags(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    fn delta(interests: &[&str], skills: &[&str]) -> ProfileDelta {
        ProfileDelta {
            interests: tags(interests),
            skills: tags(skills),
            ..ProfileDelta::default()
        }
    }

    #[test]
    fn test_union_sorted_and_deduplicated() {
        let mut existing = Profile::empty(Some(1));
        existing.interests = tags(&["water"]);

        let merged = merge_delta(Some(existing), Some(1), &delta(&["climate", "water"], &[]));
        assert_eq!(merged.interests, tags(&["climate", "water"]));
    }

    #[test]
    fn test_merge_is_idempotent() {
        let d = ProfileDelta {
            interests: tags(&["oceans", "climate"]),
            skills: tags(&["design"]),
            location_city: Some("Nairobi".to_string()),
            location_country: Some("Kenya".to_string()),
        };

        let once = merge_delta(None, Some(3), &d);
        let twice = merge_delta(Some(once.clone()), Some(3), &d);

        assert_eq!(once.interests, twice.interests);
        assert_eq!(once.skills, twice.skills);
        assert_eq!(twice.location_city.as_deref(), Some("Nairobi"));
    }

    #[test]
    fn test_merge_never_removes_or_clears() {
        let mut existing = Profile::empty(Some(1));
        existing.interests = tags(&["education"]);
        existing.skills = tags(&["teaching"]);
        existing.location_city = Some("Lagos".to_string());
        existing.location_country = Some("Nigeria".to_string());
        existing.location_lat = Some(6.5);

        let d = ProfileDelta {
            location_city: Some("   ".to_string()),
            location_country: None,
            ..ProfileDelta::default()
        };
        let merged = merge_delta(Some(existing), Some(1), &d);

        assert_eq!(merged.interests, tags(&["education"]));
        assert_eq!(merged.skills, tags(&["teaching"]));
        assert_eq!(merged.location_city.as_deref(), Some("Lagos"));
        assert_eq!(merged.location_country.as_deref(), Some("Nigeria"));
        assert_eq!(merged.location_lat, Some(6.5));
    }

    #[test]
    fn test_normalize_tags_drops_blank() {
        assert_eq!(normalize_tags(["b", " a ", "", "b"]), tags(&["a", "b"]));
    }

    #[test]
    fn test_apply_update_replaces_and_completes() {
        let mut existing = Profile::empty(Some(1));
        existing.interests = tags(&["water", "climate"]);

        let update = ProfileUpdate {
            user_id: Some(1),
            interests: tags(&["education"]),
            location_lat: Some(-1.29),
            location_lng: Some(36.82),
            complete: true,
            ..ProfileUpdate::default()
        };
        let saved = apply_update(Some(existing), &update);

        assert_eq!(saved.interests, tags(&["education"]));
        assert_eq!(saved.location_lat, Some(-1.29));
        assert!(saved.onboarding_completed_at.is_some());
    }

    #[tokio::test]
    async fn test_merge_creates_then_updates() {
        let store = Arc::new(MemoryStore::new());
        let merger = ProfileMerger::new(store.clone());

        let first = merger.merge(Some(5), &delta(&["climate"], &[])).await.unwrap();
        let second = merger.merge(Some(5), &delta(&["oceans"], &["writing"])).await.unwrap();

        assert_eq!(first.id, second.id);
        assert_eq!(second.interests, tags(&["climate", "oceans"]));
        assert_eq!(second.skills, tags(&["writing"]));
        assert_eq!(store.profile_count().await, 1);
    }

    #[tokio::test]
    async fn test_merge_without_owner_is_anonymous() {
        let store = Arc::new(MemoryStore::new());
        let merger = ProfileMerger::new(store.clone());

        let a = merger.merge(None, &delta(&["climate"], &[])).await.unwrap();
        let b = merger.merge(None, &delta(&["climate"], &[])).await.unwrap();

        assert_ne!(a.id, b.id);
        assert!(a.owner_id.is_none());
        assert_eq!(store.profile_count().await, 2);
    }

    #[tokio::test]
    async fn test_empty_delta_skips_write() {
        let mut existing = Profile::empty(Some(6));
        existing.id = Some(11);
        existing.interests = tags(&["climate"]);
        let merger = ProfileMerger::new(Arc::new(FrozenProfiles(existing)));

        let unchanged = merger.merge(Some(6), &ProfileDelta::default()).await.unwrap();
        assert_eq!(unchanged.id, Some(11));
        assert_eq!(unchanged.interests, tags(&["climate"]));

        let result = merger.merge(Some(6), &delta(&["oceans"], &[])).await;
        assert!(matches!(result, Err(StoreError::NotFound(_))));
    }
}
