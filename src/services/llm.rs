use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde_json::{json, Value};
use std::time::Duration;
use thiserror::Error;

use crate::config::AiSettings;
use crate::models::Turn;

/// Errors that can occur when calling the text-generation service
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("HTTP request failed: {0}")]
    RequestError(#[from] reqwest::Error),

    #[error("API returned error: {0}")]
    ApiError(String),

    #[error("Unauthorized: invalid API key")]
    Unauthorized,

    #[error("Invalid response format: {0}")]
    InvalidResponse(String),
}

/// Shape the service is asked to produce
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseFormat {
    Text,
    JsonObject,
}

/// A chat-completion style text generator
///
/// An unconfigured service is represented by the absence of a client
/// (`Option<Arc<dyn TextGenerationClient>>`), never by an error from `complete`.
#[async_trait]
pub trait TextGenerationClient: Send + Sync {
    /// Send one system prompt plus the conversation and return the raw reply text
    async fn complete(
        &self,
        system_prompt: &str,
        turns: &[Turn],
        format: ResponseFormat,
    ) -> Result<String, ServiceError>;
}

/// Client for an OpenAI-compatible `/chat/completions` endpoint
pub struct OpenAiClient {
    base_url: String,
    api_key: String,
    model: String,
    temperature: f32,
    client: Client,
}

impl OpenAiClient {
    pub fn new(
        base_url: String,
        api_key: String,
        model: String,
        temperature: f32,
        timeout: Duration,
    ) -> Result<Self, ServiceError> {
        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            base_url,
            api_key,
            model,
            temperature,
            client,
        })
    }

    /// Build a client from settings, or `None` when no API key is configured
    pub fn from_settings(
        settings: &AiSettings,
        temperature: f32,
    ) -> Result<Option<Self>, ServiceError> {
        let api_key = match settings.api_key.as_deref().map(str::trim) {
            Some(key) if !key.is_empty() => key.to_string(),
            _ => return Ok(None),
        };

        Self::new(
            settings.base_url.clone(),
            api_key,
            settings.model.clone(),
            temperature,
            Duration::from_secs(settings.timeout_secs),
        )
        .map(Some)
    }

    fn request_body(&self, system_prompt: &str, turns: &[Turn], format: ResponseFormat) -> Value {
        let mut messages = Vec::with_capacity(turns.len() + 1);
        messages.push(json!({ "role": "system", "content": system_prompt }));
        messages.extend(
            turns
                .iter()
                .map(|t| json!({ "role": t.role.as_str(), "content": t.content })),
        );

        let mut body = json!({
            "model": self.model,
            "messages": messages,
            "temperature": self.temperature,
        });

        if format == ResponseFormat::JsonObject {
            body["response_format"] = json!({ "type": "json_object" });
        }

        body
    }
}

#[async_trait]
impl TextGenerationClient for OpenAiClient {
    async fn complete(
        &self,
        system_prompt: &str,
        turns: &[Turn],
        format: ResponseFormat,
    ) -> Result<String, ServiceError> {
        let url = format!("{}/chat/completions", self.base_url.trim_end_matches('/'));

        tracing::debug!("Requesting completion from {} ({} turns)", url, turns.len());

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&self.request_body(system_prompt, turns, format))
            .send()
            .await?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED {
            return Err(ServiceError::Unauthorized);
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_else(|_| "Unable to read body".to_string());
            return Err(ServiceError::ApiError(format!("{} - {}", status, body)));
        }

        let json: Value = response.json().await?;

        let message = json
            .get("choices")
            .and_then(|c| c.as_array())
            .and_then(|c| c.first())
            .and_then(|c| c.get("message"))
            .ok_or_else(|| ServiceError::InvalidResponse("Missing choices[0].message".into()))?;

        Ok(message
            .get("content")
            .and_then(|c| c.as_str())
            .unwrap_or_default()
            .to_string())
    }
}
