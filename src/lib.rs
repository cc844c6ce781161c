//! Tribe Match - suggestion and conversational onboarding service
//!
//! This library ranks community groups ("tribes") against a person's stated
//! interests, skills and locations, and builds up their profile over a
//! multi-turn onboarding chat. Both paths can delegate to an external
//! text-generation service and fall back to deterministic local behavior
//! whenever that service is missing or misbehaves.

pub mod config;
pub mod core;
pub mod models;
pub mod routes;
pub mod services;

// Re-export commonly used types
pub use crate::core::{
    heuristic_score, ConversationAccumulator, ProfileMerger, RankRefiner, SuggestionPipeline,
};
pub use crate::models::{
    Candidate, Profile, ProfileDelta, QueryAttributes, ScoredCandidate, SuggestQuery, Turn,
};
