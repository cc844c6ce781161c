// Integration tests for Tribe Match

use actix_web::{test, web, App};
use async_trait::async_trait;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;

use tribe_match::models::{Candidate, MatchWeights};
use tribe_match::routes::{configure_routes, AppState};
use tribe_match::services::{
    CatalogStore, MemoryStore, OpenAiClient, ProfileStore, StoreError, TextGenerationClient,
    TranscriptStore,
};

fn state_with(store: &Arc<MemoryStore>, client: Option<Arc<dyn TextGenerationClient>>) -> AppState {
    AppState::new(
        store.clone(),
        store.clone(),
        store.clone(),
        client.clone(),
        client,
        MatchWeights::default(),
    )
}

fn model_client(base_url: &str) -> Arc<dyn TextGenerationClient> {
    Arc::new(
        OpenAiClient::new(
            base_url.to_string(),
            "sk-test".to_string(),
            "gpt-4o-mini".to_string(),
            0.2,
            Duration::from_secs(5),
        )
        .expect("client"),
    )
}

fn completion(content: &str) -> String {
    json!({ "choices": [{ "message": { "role": "assistant", "content": content } }] }).to_string()
}

fn many_tribes(count: i64) -> Vec<Candidate> {
    (1..=count)
        .map(|i| Candidate {
            id: i,
            name: format!("Climate Circle {}", i),
            description: "Local climate volunteers".to_string(),
            location: Some("Nairobi".to_string()),
        })
        .collect()
}

#[actix_web::test]
async fn test_suggest_heuristic_only() {
    let store = Arc::new(MemoryStore::seeded());
    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(state_with(&store, None)))
            .configure(configure_routes),
    )
    .await;

    let req = test::TestRequest::post()
        .uri("/api/v1/onboarding/suggest-tribes")
        .set_json(json!({ "interests": ["climate"], "skills": [], "location": ["africa"] }))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;

    let items = body.as_array().expect("array");
    assert_eq!(items.len(), 2);
    assert_eq!(items[0]["name"], "Climate Action Coalition");
    assert_eq!(items[0]["score"], 2.0);
    assert_eq!(items[0]["explanation"], Value::Null);
    assert_eq!(items[1]["score"], 0.0);
}

#[actix_web::test]
async fn test_suggest_caps_at_five() {
    let store = Arc::new(MemoryStore::with_tribes(many_tribes(9)));
    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(state_with(&store, None)))
            .configure(configure_routes),
    )
    .await;

    let req = test::TestRequest::post()
        .uri("/api/v1/onboarding/suggest-tribes")
        .set_json(json!({
            "interests": ["climate"],
            "skills": ["volunteer"],
            "location": ["nairobi"]
        }))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;

    assert_eq!(body.as_array().map(Vec::len), Some(5));
}

#[actix_web::test]
async fn test_suggest_empty_catalog() {
    let store = Arc::new(MemoryStore::new());
    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(state_with(&store, None)))
            .configure(configure_routes),
    )
    .await;

    let req = test::TestRequest::post()
        .uri("/api/v1/onboarding/suggest-tribes")
        .set_json(json!({ "interests": ["climate"] }))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;

    assert_eq!(body, json!([]));
}

#[actix_web::test]
async fn test_suggest_uses_model_ranking() {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("POST", "/chat/completions")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(completion(
            r#"[
                {"id": 2, "score": 9, "explanation": "Builds tech for impact"},
                {"id": 1, "score": 4}
            ]"#,
        ))
        .create_async()
        .await;

    let store = Arc::new(MemoryStore::seeded());
    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(state_with(&store, Some(model_client(&server.url())))))
            .configure(configure_routes),
    )
    .await;

    let req = test::TestRequest::post()
        .uri("/api/v1/onboarding/suggest-tribes")
        .set_json(json!({ "interests": ["climate"], "skills": [], "location": [] }))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;

    assert_eq!(body[0]["id"], 2);
    assert_eq!(body[0]["score"], 9.0);
    assert_eq!(body[0]["explanation"], "Builds tech for impact");
    assert_eq!(body[1]["id"], 1);
    assert_eq!(body[1]["score"], 4.0);
}

#[actix_web::test]
async fn test_suggest_survives_model_outage() {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("POST", "/chat/completions")
        .with_status(500)
        .with_body("upstream exploded")
        .create_async()
        .await;

    let store = Arc::new(MemoryStore::seeded());
    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(state_with(&store, Some(model_client(&server.url())))))
            .configure(configure_routes),
    )
    .await;

    let req = test::TestRequest::post()
        .uri("/api/v1/onboarding/suggest-tribes")
        .set_json(json!({ "interests": ["tech"], "skills": [], "location": [] }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert!(resp.status().is_success());

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body[0]["name"], "Tech for Good");
    assert_eq!(body[0]["score"], 2.0);
}

#[actix_web::test]
async fn test_ai_chat_without_service() {
    let store = Arc::new(MemoryStore::new());
    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(state_with(&store, None)))
            .configure(configure_routes),
    )
    .await;

    let req = test::TestRequest::post()
        .uri("/api/v1/onboarding/ai-chat")
        .set_json(json!({
            "session_id": "abc",
            "messages": [{ "role": "user", "content": "I love oceans" }]
        }))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;

    assert_eq!(body["reply"], "Thanks! Tell me more: I love oceans");
    assert_eq!(body["profile_delta"], json!({ "interests": [], "skills": [] }));

    let transcript = store.find_by_session("abc").await.unwrap().expect("transcript");
    assert_eq!(transcript.turns.len(), 2);
    assert_eq!(store.profile_count().await, 0);
}

#[actix_web::test]
async fn test_ai_chat_merges_model_delta() {
    let mut server = mockito::Server::new_async().await;
    let reply = json!({
        "reply": "Lovely! Which city are you in?",
        "profile_delta": {
            "interests": ["oceans", "climate"],
            "skills": [],
            "location_country": "Portugal"
        }
    });
    let _mock = server
        .mock("POST", "/chat/completions")
        .with_status(200)
        .with_body(completion(&reply.to_string()))
        .create_async()
        .await;

    let store = Arc::new(MemoryStore::new());
    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(state_with(&store, Some(model_client(&server.url())))))
            .configure(configure_routes),
    )
    .await;

    let req = test::TestRequest::post()
        .uri("/api/v1/onboarding/ai-chat")
        .set_json(json!({
            "session_id": "sess-42",
            "user_id": 42,
            "messages": [{ "role": "user", "content": "I care about oceans and climate" }]
        }))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;

    assert_eq!(body["reply"], "Lovely! Which city are you in?");

    let profile = store.find_by_owner(42).await.unwrap().expect("profile");
    assert_eq!(profile.interests, vec!["climate", "oceans"]);
    assert_eq!(profile.location_country.as_deref(), Some("Portugal"));
}

#[actix_web::test]
async fn test_ai_chat_rejects_empty_session() {
    let store = Arc::new(MemoryStore::new());
    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(state_with(&store, None)))
            .configure(configure_routes),
    )
    .await;

    let req = test::TestRequest::post()
        .uri("/api/v1/onboarding/ai-chat")
        .set_json(json!({ "session_id": "", "messages": [] }))
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), 400);
}

#[actix_web::test]
async fn test_save_then_merge_profile() {
    let store = Arc::new(MemoryStore::new());
    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(state_with(&store, None)))
            .configure(configure_routes),
    )
    .await;

    let req = test::TestRequest::post()
        .uri("/api/v1/onboarding/save-profile")
        .set_json(json!({
            "user_id": 7,
            "interests": ["water", "education", "water"],
            "skills": ["teaching"],
            "location_city": "Kampala",
            "location_lat": 0.35,
            "location_lng": 32.58
        }))
        .to_request();
    let saved: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(saved["interests"], json!(["education", "water"]));
    assert_eq!(saved["user_id"], 7);

    let req = test::TestRequest::post()
        .uri("/api/v1/onboarding/merge-profile")
        .set_json(json!({
            "user_id": 7,
            "delta": { "interests": ["climate"], "location_city": "" }
        }))
        .to_request();
    let merged: Value = test::call_and_read_body_json(&app, req).await;

    assert_eq!(merged["id"], saved["id"]);
    assert_eq!(merged["interests"], json!(["climate", "education", "water"]));
    assert_eq!(merged["location_city"], "Kampala");
    assert_eq!(merged["location_lat"], 0.35);
}

#[actix_web::test]
async fn test_public_tribes() {
    let store = Arc::new(MemoryStore::seeded());
    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(state_with(&store, None)))
            .configure(configure_routes),
    )
    .await;

    let req = test::TestRequest::get().uri("/api/v1/public/tribes").to_request();
    let tribes: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(tribes.as_array().map(Vec::len), Some(2));

    let req = test::TestRequest::get().uri("/api/v1/public/tribes/99").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 404);

    let req = test::TestRequest::get().uri("/api/v1/health").to_request();
    let health: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(health["status"], "healthy");
    assert_eq!(health["storage_ok"], true);
    assert_eq!(health["ai_enabled"], false);
}

/// Catalog whose backing database is down
struct UnreachableCatalog;

#[async_trait]
impl CatalogStore for UnreachableCatalog {
    async fn list_candidates(&self) -> Result<Vec<Candidate>, StoreError> {
        Err(StoreError::NotFound("tribes".to_string()))
    }

    async fn find_candidate(&self, _id: i64) -> Result<Option<Candidate>, StoreError> {
        Err(StoreError::NotFound("tribes".to_string()))
    }

    async fn health_check(&self) -> Result<(), StoreError> {
        Err(StoreError::NotFound("connection refused".to_string()))
    }
}

#[actix_web::test]
async fn test_health_reports_unreachable_storage() {
    let store = Arc::new(MemoryStore::new());
    let state = AppState::new(
        Arc::new(UnreachableCatalog),
        store.clone(),
        store,
        None,
        None,
        MatchWeights::default(),
    );
    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(state))
            .configure(configure_routes),
    )
    .await;

    let req = test::TestRequest::get().uri("/api/v1/health").to_request();
    let resp = test::call_service(&app, req).await;
    assert!(resp.status().is_success());

    let health: Value = test::read_body_json(resp).await;
    assert_eq!(health["status"], "degraded");
    assert_eq!(health["storage_ok"], false);
}
