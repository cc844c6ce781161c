use serde::Deserialize;
use std::sync::Arc;

use crate::core::merger::ProfileMerger;
use crate::models::{ProfileDelta, Role, Transcript, Turn};
use crate::services::{
    ResponseFormat, ServiceError, StoreError, TextGenerationClient, TranscriptStore,
};

const ONBOARDING_SYSTEM_PROMPT: &str = "You are a warm, concise onboarding guide. \
Carry a short, engaging conversation to collect: interests (tags), skills (tags), \
and location (city and country). \
Always keep replies under 2 sentences. \
Respond with a valid JSON object ONLY, with keys: reply (string), profile_delta (object with keys: \
interests (array of strings), skills (array of strings), location_city (string|optional), \
location_country (string|optional)). \
Do not add any extra keys. If you are unsure, leave fields empty or omit them.";

const PROMPTING_QUESTION: &str = "Thanks! What causes do you care about?";
const DEFAULT_REPLY: &str = "Thanks!";

/// Result of one model round trip, classified at the boundary
#[derive(Debug)]
pub enum ChatOutcome {
    Success { reply: String, delta: ProfileDelta },
    Malformed(String),
    ServiceError(ServiceError),
}

/// How a reply was produced
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplySource {
    Model,
    Scripted,
    Fallback,
}

/// Reply and extracted profile delta for one chat call
#[derive(Debug, Clone, PartialEq)]
pub struct ChatReply {
    pub reply: String,
    pub profile_delta: ProfileDelta,
    pub source: ReplySource,
}

impl ChatReply {
    pub fn is_degraded(&self) -> bool {
        self.source != ReplySource::Model
    }
}

#[derive(Deserialize)]
struct RawChatResponse {
    #[serde(default)]
    reply: Option<String>,
    #[serde(default)]
    profile_delta: Option<ProfileDelta>,
}

/// Scripted reply used when no text-generation service is configured
///
/// Echoes the most recent user turn, or asks an opening question when there
/// is none or it is empty.
pub fn scripted_reply(turns: &[Turn]) -> String {
    match turns.iter().rev().find(|t| t.role == Role::User) {
        Some(turn) if !turn.content.is_empty() => {
            format!("Thanks! Tell me more: {}", turn.content)
        }
        _ => PROMPTING_QUESTION.to_string(),
    }
}

/// Parse the model's JSON object into a reply and delta
///
/// Empty content is read as an empty object.
pub fn parse_chat_response(raw: &str) -> ChatOutcome {
    let raw = match raw.trim() {
        "" => "{}",
        trimmed => trimmed,
    };

    match serde_json::from_str::<RawChatResponse>(raw) {
        Ok(parsed) => ChatOutcome::Success {
            reply: parsed
                .reply
                .filter(|r| !r.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_REPLY.to_string()),
            delta: parsed.profile_delta.unwrap_or_default(),
        },
        Err(e) => ChatOutcome::Malformed(e.to_string()),
    }
}

/// Drives onboarding conversations and accumulates their transcripts
///
/// Sessions go from NEW to ACTIVE on their first turn and stay ACTIVE.
/// Model failures never reach the caller; only storage errors do.
#[derive(Clone)]
pub struct ConversationAccumulator {
    client: Option<Arc<dyn TextGenerationClient>>,
    transcripts: Arc<dyn TranscriptStore>,
    merger: ProfileMerger,
}

impl ConversationAccumulator {
    pub fn new(
        client: Option<Arc<dyn TextGenerationClient>>,
        transcripts: Arc<dyn TranscriptStore>,
        merger: ProfileMerger,
    ) -> Self {
        Self {
            client,
            transcripts,
            merger,
        }
    }

    /// Produce a reply for the submitted turns and fold the result into state
    ///
    /// Nothing is written until the model call has resolved (or been skipped).
    /// The profile merge runs before the transcript is saved: a failed merge
    /// leaves both untouched, and merging is idempotent so a retry after a
    /// failed transcript save converges.
    pub async fn chat(
        &self,
        session_id: &str,
        owner_id: Option<i64>,
        turns: Vec<Turn>,
    ) -> Result<ChatReply, StoreError> {
        let reply = self.generate(&turns).await;

        let mut transcript = self.load(session_id, owner_id).await?;
        transcript.append(turns);
        transcript.append([Turn::assistant(reply.reply.clone())]);

        if let Some(owner) = owner_id {
            self.merger.merge(Some(owner), &reply.profile_delta).await?;
        }
        self.transcripts.save(transcript).await?;

        tracing::info!(
            "Chat turn for session {} answered ({:?}, owner: {:?})",
            session_id,
            reply.source,
            owner_id
        );

        Ok(reply)
    }

    /// Append turns to the session transcript without generating a reply
    pub async fn record(
        &self,
        session_id: &str,
        owner_id: Option<i64>,
        turns: Vec<Turn>,
    ) -> Result<Transcript, StoreError> {
        let mut transcript = self.load(session_id, owner_id).await?;
        transcript.append(turns);
        self.transcripts.save(transcript).await
    }

    async fn generate(&self, turns: &[Turn]) -> ChatReply {
        let Some(client) = &self.client else {
            return ChatReply {
                reply: scripted_reply(turns),
                profile_delta: ProfileDelta::default(),
                source: ReplySource::Scripted,
            };
        };

        let outcome = match client
            .complete(ONBOARDING_SYSTEM_PROMPT, turns, ResponseFormat::JsonObject)
            .await
        {
            Ok(raw) => parse_chat_response(&raw),
            Err(e) => ChatOutcome::ServiceError(e),
        };

        match outcome {
            ChatOutcome::Success { reply, delta } => ChatReply {
                reply,
                profile_delta: delta,
                source: ReplySource::Model,
            },
            ChatOutcome::Malformed(reason) => {
                tracing::warn!("Chat response malformed, using fallback reply: {}", reason);
                fallback_reply()
            }
            ChatOutcome::ServiceError(e) => {
                tracing::warn!("Chat service unavailable, using fallback reply: {}", e);
                fallback_reply()
            }
        }
    }

    async fn load(
        &self,
        session_id: &str,
        owner_id: Option<i64>,
    ) -> Result<Transcript, StoreError> {
        let mut transcript = match self.transcripts.find_by_session(session_id).await? {
            Some(existing) => existing,
            None => {
                tracing::debug!("Starting transcript for new session {}", session_id);
                Transcript::new(session_id, owner_id)
            }
        };

        if transcript.owner_id.is_none() {
            transcript.owner_id = owner_id;
        }

        Ok(transcript)
    }
}

fn fallback_reply() -> ChatReply {
    ChatReply {
        reply: PROMPTING_QUESTION.to_string(),
        profile_delta: ProfileDelta::default(),
        source: ReplySource::Fallback,
    }
}
