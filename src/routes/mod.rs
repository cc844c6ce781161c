// Route exports
pub mod onboarding;
pub mod public;

use actix_web::{web, HttpResponse};
use std::sync::Arc;

use crate::core::{ConversationAccumulator, ProfileMerger, RankRefiner, SuggestionPipeline};
use crate::models::{ErrorResponse, MatchWeights};
use crate::services::{
    CatalogStore, ProfileStore, StoreError, TextGenerationClient, TranscriptStore,
};

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub catalog: Arc<dyn CatalogStore>,
    pub pipeline: SuggestionPipeline,
    pub merger: ProfileMerger,
    pub conversation: ConversationAccumulator,
    pub ai_enabled: bool,
}

impl AppState {
    /// Wire the core components onto the given stores and optional model clients
    pub fn new(
        catalog: Arc<dyn CatalogStore>,
        profiles: Arc<dyn ProfileStore>,
        transcripts: Arc<dyn TranscriptStore>,
        rank_client: Option<Arc<dyn TextGenerationClient>>,
        chat_client: Option<Arc<dyn TextGenerationClient>>,
        weights: MatchWeights,
    ) -> Self {
        let ai_enabled = rank_client.is_some() || chat_client.is_some();
        let merger = ProfileMerger::new(profiles);

        Self {
            pipeline: SuggestionPipeline::new(
                catalog.clone(),
                RankRefiner::new(rank_client),
                weights,
            ),
            conversation: ConversationAccumulator::new(chat_client, transcripts, merger.clone()),
            catalog,
            merger,
            ai_enabled,
        }
    }
}

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/v1")
            .configure(public::configure)
            .configure(onboarding::configure),
    );
}

/// Map a storage failure to a JSON error response
pub(crate) fn store_error_response(context: &str, err: &StoreError) -> HttpResponse {
    match err {
        StoreError::NotFound(message) => HttpResponse::NotFound().json(ErrorResponse {
            error: "Not found".to_string(),
            message: message.clone(),
            status_code: 404,
        }),
        other => {
            tracing::error!("{}: {}", context, other);
            HttpResponse::InternalServerError().json(ErrorResponse {
                error: context.to_string(),
                message: other.to_string(),
                status_code: 500,
            })
        }
    }
}
