use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::models::domain::{ProfileDelta, SuggestQuery, Turn};

/// Request to suggest tribes
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SuggestTribesRequest {
    #[serde(default)]
    pub interests: Vec<String>,
    #[serde(default)]
    pub skills: Vec<String>,
    #[serde(default, alias = "locations")]
    pub location: Vec<String>,
}

impl From<SuggestTribesRequest> for SuggestQuery {
    fn from(req: SuggestTribesRequest) -> Self {
        SuggestQuery {
            interests: req.interests,
            skills: req.skills,
            locations: req.location,
        }
    }
}

/// Request to fold a delta into a profile
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MergeProfileRequest {
    #[serde(default)]
    pub user_id: Option<i64>,
    #[serde(default)]
    pub delta: ProfileDelta,
}

/// Conversation turn submission, shared by the plain and AI chat endpoints
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ChatRequest {
    #[validate(length(min = 1, max = 64))]
    pub session_id: String,
    #[serde(default)]
    pub user_id: Option<i64>,
    #[serde(default)]
    pub messages: Vec<Turn>,
}
