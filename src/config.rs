use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

use crate::models::MatchWeights;

/// Application configuration
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub server: ServerSettings,
    #[serde(default)]
    pub database: DatabaseSettings,
    #[serde(default)]
    pub ai: AiSettings,
    #[serde(default)]
    pub cache: CacheSettings,
    #[serde(default)]
    pub scoring: ScoringSettings,
    #[serde(default)]
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerSettings {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    pub workers: Option<usize>,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            workers: None,
        }
    }
}

fn default_host() -> String { "0.0.0.0".to_string() }
fn default_port() -> u16 { 8000 }

/// Database connection; without a URL the in-memory store is used
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DatabaseSettings {
    pub url: Option<String>,
    pub max_connections: Option<u32>,
    pub min_connections: Option<u32>,
    pub acquire_timeout_secs: Option<u64>,
    pub idle_timeout_secs: Option<u64>,
}

/// Text-generation service; without an API key ranking and chat run heuristic-only
#[derive(Debug, Clone, Deserialize)]
pub struct AiSettings {
    pub api_key: Option<String>,
    #[serde(default = "default_ai_base_url")]
    pub base_url: String,
    #[serde(default = "default_ai_model")]
    pub model: String,
    #[serde(default = "default_ai_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_rank_temperature")]
    pub rank_temperature: f32,
    #[serde(default = "default_chat_temperature")]
    pub chat_temperature: f32,
}

impl Default for AiSettings {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: default_ai_base_url(),
            model: default_ai_model(),
            timeout_secs: default_ai_timeout_secs(),
            rank_temperature: default_rank_temperature(),
            chat_temperature: default_chat_temperature(),
        }
    }
}

impl AiSettings {
    pub fn enabled(&self) -> bool {
        self.api_key.as_deref().map_or(false, |k| !k.trim().is_empty())
    }
}

fn default_ai_base_url() -> String { "https://api.openai.com/v1".to_string() }
fn default_ai_model() -> String { "gpt-4o-mini".to_string() }
fn default_ai_timeout_secs() -> u64 { 30 }
fn default_rank_temperature() -> f32 { 0.2 }
fn default_chat_temperature() -> f32 { 0.3 }

#[derive(Debug, Clone, Deserialize)]
pub struct CacheSettings {
    #[serde(default = "default_catalog_ttl_secs")]
    pub catalog_ttl_secs: u64,
    #[serde(default = "default_catalog_capacity")]
    pub catalog_capacity: u64,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            catalog_ttl_secs: default_catalog_ttl_secs(),
            catalog_capacity: default_catalog_capacity(),
        }
    }
}

fn default_catalog_ttl_secs() -> u64 { 60 }
fn default_catalog_capacity() -> u64 { 16 }

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ScoringSettings {
    #[serde(default)]
    pub weights: WeightsConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WeightsConfig {
    #[serde(default = "default_interest_weight")]
    pub interest: f64,
    #[serde(default = "default_skill_weight")]
    pub skill: f64,
    #[serde(default = "default_location_weight")]
    pub location: f64,
}

impl Default for WeightsConfig {
    fn default() -> Self {
        Self {
            interest: default_interest_weight(),
            skill: default_skill_weight(),
            location: default_location_weight(),
        }
    }
}

impl From<&WeightsConfig> for MatchWeights {
    fn from(config: &WeightsConfig) -> Self {
        MatchWeights {
            interest: config.interest,
            skill: config.skill,
            location: config.location,
        }
    }
}

fn default_interest_weight() -> f64 { 2.0 }
fn default_skill_weight() -> f64 { 1.5 }
fn default_location_weight() -> f64 { 1.0 }

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingSettings {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default = "default_log_format")]
    pub format: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

fn default_log_level() -> String { "info".to_string() }
fn default_log_format() -> String { "json".to_string() }

impl Settings {
    /// Load configuration from file and environment variables
    ///
    /// Configuration is loaded in the following order (later overrides earlier):
    /// 1. Default values in the struct
    /// 2. Configuration file (config/default.toml)
    /// 3. Local overrides (config/local.toml)
    /// 4. Environment variables (prefixed with TRIBE_)
    /// 5. Well-known variables: DATABASE_URL, OPENAI_API_KEY
    pub fn load() -> Result<Self, ConfigError> {
        let mut settings = Config::builder()
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name("config/local").required(false))
            // e.g., TRIBE__SERVER__PORT -> server.port
            .add_source(
                Environment::with_prefix("TRIBE")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        settings = substitute_env_vars(settings)?;

        settings.try_deserialize()
    }
}

/// Apply the conventional unprefixed variables on top of the layered config
fn substitute_env_vars(settings: Config) -> Result<Config, ConfigError> {
    use std::env;

    let mut builder = Config::builder().add_source(settings);

    if let Ok(database_url) = env::var("DATABASE_URL") {
        builder = builder.set_override("database.url", database_url)?;
    }
    if let Ok(api_key) = env::var("OPENAI_API_KEY") {
        builder = builder.set_override("ai.api_key", api_key)?;
    }

    builder.build()
}
