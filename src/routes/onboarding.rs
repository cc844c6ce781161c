use actix_web::{web, HttpResponse, Responder};
use validator::Validate;

use crate::models::{
    ChatRequest, ChatResponse, ErrorResponse, MergeProfileRequest, ProfileUpdate,
    RecordChatResponse, SuggestQuery, SuggestTribesRequest,
};
use crate::routes::{store_error_response, AppState};

/// Configure all onboarding routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/onboarding")
            .route("/suggest-tribes", web::post().to(suggest_tribes))
            .route("/save-profile", web::post().to(save_profile))
            .route("/merge-profile", web::post().to(merge_profile))
            .route("/chat", web::post().to(record_chat))
            .route("/ai-chat", web::post().to(ai_chat)),
    );
}

fn validation_error(errors: validator::ValidationErrors) -> HttpResponse {
    HttpResponse::BadRequest().json(ErrorResponse {
        error: "Validation failed".to_string(),
        message: errors.to_string(),
        status_code: 400,
    })
}

/// Suggest tribes endpoint
///
/// POST /api/v1/onboarding/suggest-tribes
///
/// Request body:
/// ```json
/// {
///   "interests": ["climate"],
///   "skills": ["design"],
///   "location": ["nairobi"]
/// }
/// ```
async fn suggest_tribes(
    state: web::Data<AppState>,
    req: web::Json<SuggestTribesRequest>,
) -> impl Responder {
    let query = SuggestQuery::from(req.into_inner());

    tracing::info!(
        "Suggesting tribes for {} interests, {} skills, {} locations",
        query.interests.len(),
        query.skills.len(),
        query.locations.len()
    );

    match state.pipeline.suggest(&query).await {
        Ok(result) => {
            tracing::info!(
                "Returning {} suggestions (from {} tribes, {:?})",
                result.tribes.len(),
                result.total_candidates,
                result.source
            );
            HttpResponse::Ok().json(result.tribes)
        }
        Err(e) => store_error_response("Failed to load tribes", &e),
    }
}

/// POST /api/v1/onboarding/save-profile
async fn save_profile(
    state: web::Data<AppState>,
    req: web::Json<ProfileUpdate>,
) -> impl Responder {
    match state.merger.save(&req).await {
        Ok(profile) => HttpResponse::Ok().json(profile),
        Err(e) => store_error_response("Failed to save profile", &e),
    }
}

/// POST /api/v1/onboarding/merge-profile
async fn merge_profile(
    state: web::Data<AppState>,
    req: web::Json<MergeProfileRequest>,
) -> impl Responder {
    match state.merger.merge(req.user_id, &req.delta).await {
        Ok(profile) => HttpResponse::Ok().json(profile),
        Err(e) => store_error_response("Failed to merge profile", &e),
    }
}

/// Record turns for auditability without generating a reply
///
/// POST /api/v1/onboarding/chat
async fn record_chat(
    state: web::Data<AppState>,
    req: web::Json<ChatRequest>,
) -> impl Responder {
    if let Err(errors) = req.validate() {
        return validation_error(errors);
    }

    let ChatRequest {
        session_id,
        user_id,
        messages,
    } = req.into_inner();

    match state.conversation.record(&session_id, user_id, messages).await {
        Ok(_) => HttpResponse::Ok().json(RecordChatResponse { ok: true }),
        Err(e) => store_error_response("Failed to record chat", &e),
    }
}

/// Conversational onboarding endpoint
///
/// POST /api/v1/onboarding/ai-chat
///
/// Request body:
/// ```json
/// {
///   "session_id": "string",
///   "user_id": 1,
///   "messages": [{"role": "user", "content": "I love oceans"}]
/// }
/// ```
async fn ai_chat(
    state: web::Data<AppState>,
    req: web::Json<ChatRequest>,
) -> impl Responder {
    if let Err(errors) = req.validate() {
        return validation_error(errors);
    }

    let ChatRequest {
        session_id,
        user_id,
        messages,
    } = req.into_inner();

    match state.conversation.chat(&session_id, user_id, messages).await {
        Ok(reply) => {
            if reply.is_degraded() {
                tracing::debug!(
                    "Session {} answered without the model ({:?})",
                    session_id,
                    reply.source
                );
            }
            HttpResponse::Ok().json(ChatResponse {
                reply: reply.reply,
                profile_delta: reply.profile_delta,
            })
        }
        Err(e) => store_error_response("Failed to process chat", &e),
    }
}
