// Model exports
pub mod domain;
pub mod requests;
pub mod responses;

pub use domain::{
    Candidate, MatchWeights, Profile, ProfileDelta, ProfileUpdate, QueryAttributes, Role,
    ScoredCandidate, SuggestQuery, Transcript, Turn,
};
pub use requests::{ChatRequest, MergeProfileRequest, SuggestTribesRequest};
pub use responses::{ChatResponse, ErrorResponse, HealthResponse, RecordChatResponse};
