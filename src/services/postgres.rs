use async_trait::async_trait;
use sqlx::postgres::{PgPoolOptions, PgRow};
use sqlx::types::Json;
use sqlx::{PgPool, Row};
use std::time::Duration;

use crate::models::{Candidate, Profile, Transcript, Turn};
use crate::services::store::{CatalogStore, ProfileStore, StoreError, TranscriptStore};

/// PostgreSQL client backing the tribe catalog, profiles and transcripts
///
/// Tags and conversation turns are stored as JSONB columns; the schema lives
/// in `./migrations` and is applied on startup.
pub struct PostgresClient {
    pool: PgPool,
}

impl PostgresClient {
    /// Create a new PostgreSQL client from a connection string
    pub async fn new(
        database_url: &str,
        max_connections: u32,
        min_connections: u32,
        acquire_timeout: Duration,
        idle_timeout: Duration,
    ) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .min_connections(min_connections)
            .acquire_timeout(acquire_timeout)
            .idle_timeout(idle_timeout)
            .test_before_acquire(true)
            .connect(database_url)
            .await?;

        // Run migrations on startup
        sqlx::migrate!("./migrations").run(&pool).await?;

        Ok(Self { pool })
    }

    /// Create a new PostgreSQL client from settings
    pub async fn from_settings(
        url: &str,
        max_connections: Option<u32>,
        min_connections: Option<u32>,
        acquire_timeout_secs: Option<u64>,
        idle_timeout_secs: Option<u64>,
    ) -> Result<Self, StoreError> {
        tracing::info!("Connecting to PostgreSQL");

        Self::new(
            url,
            max_connections.unwrap_or(10),
            min_connections.unwrap_or(1),
            Duration::from_secs(acquire_timeout_secs.unwrap_or(5)),
            Duration::from_secs(idle_timeout_secs.unwrap_or(600)),
        )
        .await
    }
}

fn candidate_from_row(row: &PgRow) -> Candidate {
    Candidate {
        id: row.get("id"),
        name: row.get("name"),
        description: row.get("description"),
        location: row.get("location"),
    }
}

fn profile_from_row(row: &PgRow) -> Profile {
    let Json(interests): Json<Vec<String>> = row.get("interests");
    let Json(skills): Json<Vec<String>> = row.get("skills");

    Profile {
        id: Some(row.get("id")),
        owner_id: row.get("user_id"),
        interests,
        skills,
        location_city: row.get("location_city"),
        location_country: row.get("location_country"),
        location_lat: row.get("location_lat"),
        location_lng: row.get("location_lng"),
        onboarding_completed_at: row.get("onboarding_completed_at"),
        created_at: row.get("created_at"),
    }
}

#[async_trait]
impl CatalogStore for PostgresClient {
    async fn list_candidates(&self) -> Result<Vec<Candidate>, StoreError> {
        let query = r#"
            SELECT id, name, description, location
            FROM tribes
            ORDER BY id
        "#;

        let rows = sqlx::query(query).fetch_all(&self.pool).await?;

        tracing::debug!("Loaded {} tribes from catalog", rows.len());

        Ok(rows.iter().map(candidate_from_row).collect())
    }

    async fn find_candidate(&self, id: i64) -> Result<Option<Candidate>, StoreError> {
        let query = r#"
            SELECT id, name, description, location
            FROM tribes
            WHERE id = $1
        "#;

        let row = sqlx::query(query).bind(id).fetch_optional(&self.pool).await?;

        Ok(row.as_ref().map(candidate_from_row))
    }

    async fn health_check(&self) -> Result<(), StoreError> {
        sqlx::query("SELECT 1").fetch_one(&self.pool).await?;
        Ok(())
    }
}

#[async_trait]
impl ProfileStore for PostgresClient {
    async fn find_by_owner(&self, owner_id: i64) -> Result<Option<Profile>, StoreError> {
        let query = r#"
            SELECT id, user_id, interests, skills, location_city, location_country,
                   location_lat, location_lng, onboarding_completed_at, created_at
            FROM user_profiles
            WHERE user_id = $1
            ORDER BY id
            LIMIT 1
        "#;

        let row = sqlx::query(query)
            .bind(owner_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.as_ref().map(profile_from_row))
    }

    /// Insert a new profile or update an existing one by id
    async fn save(&self, profile: Profile) -> Result<Profile, StoreError> {
        let row = match profile.id {
            None => {
                let query = r#"
                    INSERT INTO user_profiles (
                        user_id, interests, skills, location_city, location_country,
                        location_lat, location_lng, onboarding_completed_at, created_at
                    )
                    VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
                    RETURNING id, user_id, interests, skills, location_city, location_country,
                              location_lat, location_lng, onboarding_completed_at, created_at
                "#;

                sqlx::query(query)
                    .bind(profile.owner_id)
                    .bind(Json(&profile.interests))
                    .bind(Json(&profile.skills))
                    .bind(&profile.location_city)
                    .bind(&profile.location_country)
                    .bind(profile.location_lat)
                    .bind(profile.location_lng)
                    .bind(profile.onboarding_completed_at)
                    .bind(profile.created_at)
                    .fetch_one(&self.pool)
                    .await?
            }
            Some(id) => {
                let query = r#"
                    UPDATE user_profiles SET
                        user_id = $2,
                        interests = $3,
                        skills = $4,
                        location_city = $5,
                        location_country = $6,
                        location_lat = $7,
                        location_lng = $8,
                        onboarding_completed_at = $9
                    WHERE id = $1
                    RETURNING id, user_id, interests, skills, location_city, location_country,
                              location_lat, location_lng, onboarding_completed_at, created_at
                "#;

                sqlx::query(query)
                    .bind(id)
                    .bind(profile.owner_id)
                    .bind(Json(&profile.interests))
                    .bind(Json(&profile.skills))
                    .bind(&profile.location_city)
                    .bind(&profile.location_country)
                    .bind(profile.location_lat)
                    .bind(profile.location_lng)
                    .bind(profile.onboarding_completed_at)
                    .fetch_optional(&self.pool)
                    .await?
                    .ok_or_else(|| StoreError::NotFound(format!("Profile {} not found", id)))?
            }
        };

        let saved = profile_from_row(&row);
        tracing::debug!("Saved profile {:?} for owner {:?}", saved.id, saved.owner_id);

        Ok(saved)
    }
}

#[async_trait]
impl TranscriptStore for PostgresClient {
    async fn find_by_session(&self, session_id: &str) -> Result<Option<Transcript>, StoreError> {
        let query = r#"
            SELECT session_id, user_id, messages, created_at, updated_at
            FROM onboarding_sessions
            WHERE session_id = $1
        "#;

        let row = sqlx::query(query)
            .bind(session_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(|row| {
            let Json(turns): Json<Vec<Turn>> = row.get("messages");
            Transcript {
                session_id: row.get("session_id"),
                owner_id: row.get("user_id"),
                turns,
                created_at: row.get("created_at"),
                updated_at: row.get("updated_at"),
            }
        }))
    }

    /// Upsert the whole transcript keyed by session id
    async fn save(&self, transcript: Transcript) -> Result<Transcript, StoreError> {
        let query = r#"
            INSERT INTO onboarding_sessions (session_id, user_id, messages, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (session_id)
            DO UPDATE SET
                user_id = COALESCE(onboarding_sessions.user_id, EXCLUDED.user_id),
                messages = EXCLUDED.messages,
                updated_at = EXCLUDED.updated_at
        "#;

        sqlx::query(query)
            .bind(&transcript.session_id)
            .bind(transcript.owner_id)
            .bind(Json(&transcript.turns))
            .bind(transcript.created_at)
            .bind(transcript.updated_at)
            .execute(&self.pool)
            .await?;

        tracing::debug!(
            "Saved transcript {} ({} turns)",
            transcript.session_id,
            transcript.turns.len()
        );

        Ok(transcript)
    }
}
