use crate::domain::radial::DialGeometry;
use async_trait::async_trait;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("Failed to read configuration: {0}")]
    ReadError(String),

    #[error("Failed to write configuration: {0}")]
    WriteError(String),

    #[error("Invalid configuration format: {0}")]
    InvalidFormat(String),
}

pub type ConfigResult<T> = Result<T, ConfigError>;

pub const DEFAULT_API_BASE_URL: &str = "http://localhost:3001/api";
pub const DEFAULT_AI_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_AI_MODEL: &str = "gpt-4o-mini";

#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    pub api_base_url: String,
    pub api_token: Option<String>,
    pub ai_base_url: String,
    pub ai_model: String,
    pub ai_api_key: Option<String>,
    pub cache_ttl_seconds: u64,
    pub dial: DialGeometry,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            api_token: None,
            ai_base_url: DEFAULT_AI_BASE_URL.to_string(),
            ai_model: DEFAULT_AI_MODEL.to_string(),
            ai_api_key: None,
            cache_ttl_seconds: 300, // 5 minutes
            dial: DialGeometry::default(),
        }
    }
}

/// Secrets kept out of the plain config file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Secret {
    ApiToken,
    AiApiKey,
}

impl Secret {
    pub fn key(&self) -> &'static str {
        match self {
            Secret::ApiToken => "api_token",
            Secret::AiApiKey => "ai_api_key",
        }
    }

    pub fn env_var(&self) -> &'static str {
        match self {
            Secret::ApiToken => "FAMCAL_TOKEN",
            Secret::AiApiKey => "FAMCAL_AI_KEY",
        }
    }
}

#[async_trait]
pub trait ConfigStore: Send + Sync {
    async fn load_config(&self) -> ConfigResult<AppConfig>;
    async fn save_config(&self, config: &AppConfig) -> ConfigResult<()>;
    async fn get_secret(&self, secret: Secret) -> ConfigResult<Option<String>>;
    async fn set_secret(&self, secret: Secret, value: &str) -> ConfigResult<()>;
}
