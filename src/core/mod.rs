// Core algorithm exports
pub mod conversation;
pub mod merger;
pub mod pipeline;
pub mod refiner;
pub mod scoring;

pub use conversation::{ChatOutcome, ChatReply, ConversationAccumulator, ReplySource};
pub use merger::{apply_update, merge_delta, normalize_tags, ProfileMerger};
pub use pipeline::{SuggestionPipeline, Suggestions, MAX_SUGGESTIONS};
pub use refiner::{RankRefiner, RankedEntry, RankingOutcome, RefineSource, Refined};
pub use scoring::{heuristic_score, score_catalog};
