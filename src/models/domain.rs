use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// A community group ("tribe") eligible for suggestion
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub location: Option<String>,
}

/// Raw suggestion query as the caller phrased it
///
/// Kept alongside [`QueryAttributes`] so the model prompt sees the original casing.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SuggestQuery {
    #[serde(default)]
    pub interests: Vec<String>,
    #[serde(default)]
    pub skills: Vec<String>,
    #[serde(default)]
    pub locations: Vec<String>,
}

/// Lowercased, deduplicated token sets used by heuristic scoring
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryAttributes {
    pub interests: BTreeSet<String>,
    pub skills: BTreeSet<String>,
    pub locations: BTreeSet<String>,
}

impl QueryAttributes {
    pub fn new<I, S, L>(interests: I, skills: S, locations: L) -> Self
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
        S: IntoIterator,
        S::Item: AsRef<str>,
        L: IntoIterator,
        L::Item: AsRef<str>,
    {
        Self {
            interests: lowercase_set(interests),
            skills: lowercase_set(skills),
            locations: lowercase_set(locations),
        }
    }
}

impl From<&SuggestQuery> for QueryAttributes {
    fn from(query: &SuggestQuery) -> Self {
        Self::new(&query.interests, &query.skills, &query.locations)
    }
}

fn lowercase_set<I>(tokens: I) -> BTreeSet<String>
where
    I: IntoIterator,
    I::Item: AsRef<str>,
{
    tokens.into_iter().map(|t| t.as_ref().to_lowercase()).collect()
}

/// Candidate with a relevance score and optional explanation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredCandidate {
    #[serde(flatten)]
    pub candidate: Candidate,
    pub score: f64,
    #[serde(default)]
    pub explanation: Option<String>,
}

impl ScoredCandidate {
    pub fn id(&self) -> i64 {
        self.candidate.id
    }

    /// Derive a new value carrying a replacement score and explanation
    pub fn rescored(&self, score: f64, explanation: Option<String>) -> Self {
        Self {
            candidate: self.candidate.clone(),
            score,
            explanation,
        }
    }
}

/// Persisted onboarding profile
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    pub id: Option<i64>,
    #[serde(rename = "user_id")]
    pub owner_id: Option<i64>,
    #[serde(default)]
    pub interests: Vec<String>,
    #[serde(default)]
    pub skills: Vec<String>,
    pub location_city: Option<String>,
    pub location_country: Option<String>,
    pub location_lat: Option<f64>,
    pub location_lng: Option<f64>,
    pub onboarding_completed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl Profile {
    /// Fresh profile with empty tag sets, not yet persisted
    pub fn empty(owner_id: Option<i64>) -> Self {
        Self {
            id: None,
            owner_id,
            interests: Vec::new(),
            skills: Vec::new(),
            location_city: None,
            location_country: None,
            location_lat: None,
            location_lng: None,
            onboarding_completed_at: None,
            created_at: Utc::now(),
        }
    }
}

/// Partial, additive profile update extracted from a conversation
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProfileDelta {
    #[serde(default)]
    pub interests: Vec<String>,
    #[serde(default)]
    pub skills: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location_city: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location_country: Option<String>,
}

impl ProfileDelta {
    pub fn is_empty(&self) -> bool {
        self.interests.is_empty()
            && self.skills.is_empty()
            && self.location_city.is_none()
            && self.location_country.is_none()
    }
}

/// Full profile form submitted on the explicit save path
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProfileUpdate {
    #[serde(default)]
    pub user_id: Option<i64>,
    #[serde(default)]
    pub interests: Vec<String>,
    #[serde(default)]
    pub skills: Vec<String>,
    #[serde(default)]
    pub location_city: Option<String>,
    #[serde(default)]
    pub location_country: Option<String>,
    #[serde(default)]
    pub location_lat: Option<f64>,
    #[serde(default)]
    pub location_lng: Option<f64>,
    #[serde(default)]
    pub complete: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

/// One message in an onboarding conversation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Turn {
    pub role: Role,
    pub content: String,
}

impl Turn {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// Ordered, append-only record of an onboarding session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transcript {
    pub session_id: String,
    pub owner_id: Option<i64>,
    pub turns: Vec<Turn>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Transcript {
    pub fn new(session_id: impl Into<String>, owner_id: Option<i64>) -> Self {
        let now = Utc::now();
        Self {
            session_id: session_id.into(),
            owner_id,
            turns: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn append<I: IntoIterator<Item = Turn>>(&mut self, turns: I) {
        self.turns.extend(turns);
        self.updated_at = Utc::now();
    }
}

/// Per-field weights for heuristic relevance scoring
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MatchWeights {
    pub interest: f64,
    pub skill: f64,
    pub location: f64,
}

impl Default for MatchWeights {
    fn default() -> Self {
        Self {
            interest: 2.0,
            skill: 1.5,
            location: 1.0,
        }
    }
}
