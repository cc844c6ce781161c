use actix_cors::Cors;
use actix_web::{error, http::StatusCode, middleware, web, App, HttpResponse, HttpServer};
use std::sync::Arc;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use tribe_match::config::Settings;
use tribe_match::models::{ErrorResponse, MatchWeights};
use tribe_match::routes::{self, AppState};
use tribe_match::services::{
    CachedCatalog, CatalogStore, MemoryStore, OpenAiClient, PostgresClient, ProfileStore,
    TextGenerationClient, TranscriptStore,
};

/// JSON error response for JSON payload errors
#[derive(Debug)]
pub struct JsonError(ErrorResponse);

impl std::fmt::Display for JsonError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.0.error, self.0.message)
    }
}

impl std::error::Error for JsonError {}

impl error::ResponseError for JsonError {
    fn error_response(&self) -> HttpResponse {
        let status = StatusCode::from_u16(self.0.status_code).unwrap_or(StatusCode::BAD_REQUEST);
        HttpResponse::build(status).json(&self.0)
    }
}

/// Handle JSON payload errors
pub fn handle_json_payload_error(
    err: error::JsonPayloadError,
    req: &actix_web::HttpRequest,
) -> actix_web::Error {
    tracing::info!("JSON payload error on {}: {}", req.path(), err);
    JsonError(ErrorResponse {
        error: "invalid_json".to_string(),
        message: format!("Invalid JSON: {}", err),
        status_code: 400,
    })
    .into()
}

/// Handle path parameter errors
pub fn handle_path_error(err: error::PathError, _req: &actix_web::HttpRequest) -> actix_web::Error {
    JsonError(ErrorResponse {
        error: "invalid_path".to_string(),
        message: format!("Invalid path: {}", err),
        status_code: 400,
    })
    .into()
}

fn init_logging(settings: &Settings) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&settings.logging.level));

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_level(true);

    if settings.logging.format == "pretty" {
        subscriber.pretty().init();
    } else {
        subscriber.json().init();
    }
}

fn model_client(settings: &Settings, temperature: f32) -> Option<Arc<dyn TextGenerationClient>> {
    match OpenAiClient::from_settings(&settings.ai, temperature) {
        Ok(Some(client)) => Some(Arc::new(client)),
        Ok(None) => None,
        Err(e) => {
            error!("Failed to build text-generation client ({}), running heuristic-only", e);
            None
        }
    }
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Load .env file if present
    dotenv::dotenv().ok();

    let settings = Settings::load().map_err(|e| {
        eprintln!("Failed to load configuration: {}", e);
        std::io::Error::new(std::io::ErrorKind::InvalidInput, e.to_string())
    })?;

    init_logging(&settings);

    info!("Starting Tribe Match service...");

    // Pick the storage backend
    let (catalog, profiles, transcripts): (
        Arc<dyn CatalogStore>,
        Arc<dyn ProfileStore>,
        Arc<dyn TranscriptStore>,
    ) = match settings.database.url.as_deref() {
        Some(url) => {
            let postgres = PostgresClient::from_settings(
                url,
                settings.database.max_connections,
                settings.database.min_connections,
                settings.database.acquire_timeout_secs,
                settings.database.idle_timeout_secs,
            )
            .await
            .map_err(|e| {
                error!("Failed to connect to PostgreSQL: {}", e);
                std::io::Error::new(std::io::ErrorKind::Other, e.to_string())
            })?;

            info!("PostgreSQL store initialized");

            let postgres = Arc::new(postgres);
            let catalog = CachedCatalog::new(
                postgres.clone(),
                settings.cache.catalog_capacity,
                settings.cache.catalog_ttl_secs,
            );
            (Arc::new(catalog), postgres.clone(), postgres)
        }
        None => {
            warn!("No database configured, using the in-memory store");
            let memory = Arc::new(MemoryStore::seeded());
            (memory.clone(), memory.clone(), memory)
        }
    };

    let rank_client = model_client(&settings, settings.ai.rank_temperature);
    let chat_client = model_client(&settings, settings.ai.chat_temperature);

    if !settings.ai.enabled() {
        warn!("No text-generation API key configured, running heuristic-only");
    } else if rank_client.is_some() && chat_client.is_some() {
        info!("Text-generation service enabled (model: {})", settings.ai.model);
    }

    let weights = MatchWeights::from(&settings.scoring.weights);
    info!("Scoring weights: {:?}", weights);

    let app_state =
        AppState::new(catalog, profiles, transcripts, rank_client, chat_client, weights);

    let host = settings.server.host.clone();
    let port = settings.server.port;
    let workers = settings.server.workers.unwrap_or(4);

    info!("Starting HTTP server on {}:{}", host, port);

    HttpServer::new(move || {
        let cors = Cors::permissive();

        App::new()
            .app_data(web::Data::new(app_state.clone()))
            .app_data(web::JsonConfig::default().error_handler(handle_json_payload_error))
            .app_data(web::PathConfig::default().error_handler(handle_path_error))
            .wrap(cors)
            .wrap(middleware::Logger::default())
            .wrap(middleware::Compress::default())
            .configure(routes::configure_routes)
    })
    .workers(workers)
    .bind((host, port))?
    .run()
    .await
}
