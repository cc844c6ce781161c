use serde::{Deserialize, Serialize};

use crate::models::domain::ProfileDelta;

/// Response for the AI chat endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatResponse {
    pub reply: String,
    pub profile_delta: ProfileDelta,
}

/// Acknowledgement for transcript-only submissions
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordChatResponse {
    pub ok: bool,
}

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub storage_ok: bool,
    pub ai_enabled: bool,
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

/// Error response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
    pub status_code: u16,
}
