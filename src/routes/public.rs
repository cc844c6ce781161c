use actix_web::{web, HttpResponse, Responder};

use crate::models::HealthResponse;
use crate::routes::{store_error_response, AppState};
use crate::services::StoreError;

/// Maximum tribes returned by the public listing
const LIST_LIMIT: usize = 50;

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/health", web::get().to(health_check))
        .route("/public/tribes", web::get().to(list_tribes))
        .route("/public/tribes/{id}", web::get().to(get_tribe));
}

/// Health check endpoint
///
/// Reports "degraded" while the backing store is unreachable.
async fn health_check(state: web::Data<AppState>) -> impl Responder {
    let storage_ok = match state.catalog.health_check().await {
        Ok(()) => true,
        Err(e) => {
            tracing::warn!("Storage health check failed: {}", e);
            false
        }
    };

    HttpResponse::Ok().json(HealthResponse {
        status: if storage_ok { "healthy" } else { "degraded" }.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        storage_ok,
        ai_enabled: state.ai_enabled,
        timestamp: chrono::Utc::now(),
    })
}

/// GET /api/v1/public/tribes
async fn list_tribes(state: web::Data<AppState>) -> impl Responder {
    match state.catalog.list_candidates().await {
        Ok(mut tribes) => {
            tribes.truncate(LIST_LIMIT);
            HttpResponse::Ok().json(tribes)
        }
        Err(e) => store_error_response("Failed to list tribes", &e),
    }
}

/// GET /api/v1/public/tribes/{id}
async fn get_tribe(state: web::Data<AppState>, path: web::Path<i64>) -> impl Responder {
    let id = path.into_inner();

    match state.catalog.find_candidate(id).await {
        Ok(Some(tribe)) => HttpResponse::Ok().json(tribe),
        Ok(None) => store_error_response(
            "Failed to fetch tribe",
            &StoreError::NotFound(format!("Tribe {} not found", id)),
        ),
        Err(e) => store_error_response("Failed to fetch tribe", &e),
    }
}
