use crate::{
    domain::radial::DialGeometry,
    ports::{AppConfig, ConfigError, ConfigResult, ConfigStore, Secret},
};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::fs;

const APP_DIR: &str = "famcal";

#[derive(Debug, Default, Serialize, Deserialize)]
struct ConfigFile {
    api_base_url: Option<String>,
    ai_base_url: Option<String>,
    ai_model: Option<String>,
    cache_ttl_seconds: Option<u64>,
    dial: Option<DialGeometry>,
}

pub struct FileConfigStore {
    config_path: PathBuf,
    keyring_service: Option<String>,
}

impl FileConfigStore {
    pub fn new() -> ConfigResult<Self> {
        let config_dir = dirs::config_dir().ok_or_else(|| {
            ConfigError::ReadError("Cannot determine config directory".to_string())
        })?;

        Ok(Self {
            config_path: config_dir.join(APP_DIR).join("config.json"),
            keyring_service: Some(APP_DIR.to_string()),
        })
    }

    /// Store rooted at `dir` that keeps secrets in files only.
    pub fn in_dir(dir: impl AsRef<Path>) -> Self {
        Self {
            config_path: dir.as_ref().join("config.json"),
            keyring_service: None,
        }
    }

    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    fn config_dir(&self) -> PathBuf {
        self.config_path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default()
    }

    async fn ensure_config_dir(&self) -> ConfigResult<()> {
        fs::create_dir_all(self.config_dir())
            .await
            .map_err(|e| ConfigError::WriteError(e.to_string()))
    }

    fn secret_file_path(&self, secret: Secret) -> PathBuf {
        self.config_dir().join(format!(".{}", secret.key()))
    }

    async fn get_secret_from_file(&self, secret: Secret) -> Option<String> {
        fs::read_to_string(self.secret_file_path(secret))
            .await
            .ok()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
    }

    async fn set_secret_in_file(&self, secret: Secret, value: &str) -> ConfigResult<()> {
        self.ensure_config_dir().await?;
        let path = self.secret_file_path(secret);
        fs::write(&path, value)
            .await
            .map_err(|e| ConfigError::WriteError(e.to_string()))?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(&path, std::fs::Permissions::from_mode(0o600))
                .await
                .map_err(|e| ConfigError::WriteError(e.to_string()))?;
        }

        Ok(())
    }

    fn keyring_entry(&self, secret: Secret) -> Option<keyring::Entry> {
        let service = self.keyring_service.as_ref()?;
        match keyring::Entry::new(service, secret.key()) {
            Ok(entry) => Some(entry),
            Err(e) => {
                tracing::warn!("Keyring service not available: {}", e);
                None
            }
        }
    }
}

#[async_trait]
impl ConfigStore for FileConfigStore {
    async fn load_config(&self) -> ConfigResult<AppConfig> {
        let file = match fs::read_to_string(&self.config_path).await {
            Ok(content) => serde_json::from_str::<ConfigFile>(&content)
                .map_err(|e| ConfigError::InvalidFormat(e.to_string()))?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => ConfigFile::default(),
            Err(e) => return Err(ConfigError::ReadError(e.to_string())),
        };

        let defaults = AppConfig::default();
        Ok(AppConfig {
            api_base_url: file.api_base_url.unwrap_or(defaults.api_base_url),
            api_token: self.get_secret(Secret::ApiToken).await?,
            ai_base_url: file.ai_base_url.unwrap_or(defaults.ai_base_url),
            ai_model: file.ai_model.unwrap_or(defaults.ai_model),
            ai_api_key: self.get_secret(Secret::AiApiKey).await?,
            cache_ttl_seconds: file.cache_ttl_seconds.unwrap_or(defaults.cache_ttl_seconds),
            dial: file.dial.unwrap_or(defaults.dial),
        })
    }

    async fn save_config(&self, config: &AppConfig) -> ConfigResult<()> {
        self.ensure_config_dir().await?;

        let file = ConfigFile {
            api_base_url: Some(config.api_base_url.clone()),
            ai_base_url: Some(config.ai_base_url.clone()),
            ai_model: Some(config.ai_model.clone()),
            cache_ttl_seconds: Some(config.cache_ttl_seconds),
            dial: Some(config.dial),
        };
        let content = serde_json::to_string_pretty(&file)
            .map_err(|e| ConfigError::WriteError(e.to_string()))?;
        fs::write(&self.config_path, content)
            .await
            .map_err(|e| ConfigError::WriteError(e.to_string()))?;

        if let Some(token) = &config.api_token {
            self.set_secret(Secret::ApiToken, token).await?;
        }
        if let Some(key) = &config.ai_api_key {
            self.set_secret(Secret::AiApiKey, key).await?;
        }
        Ok(())
    }

    /// Environment first, then the keyring, then the owner-only file.
    async fn get_secret(&self, secret: Secret) -> ConfigResult<Option<String>> {
        if let Ok(value) = std::env::var(secret.env_var()) {
            if !value.trim().is_empty() {
                return Ok(Some(value));
            }
        }

        if let Some(entry) = self.keyring_entry(secret) {
            match entry.get_password() {
                Ok(value) => return Ok(Some(value)),
                Err(keyring::Error::NoEntry) => {}
                Err(e) => {
                    tracing::warn!("Keyring read failed, falling back to file storage: {}", e);
                }
            }
        }

        Ok(self.get_secret_from_file(secret).await)
    }

    async fn set_secret(&self, secret: Secret, value: &str) -> ConfigResult<()> {
        if let Some(entry) = self.keyring_entry(secret) {
            match entry.set_password(value) {
                Ok(()) => return Ok(()),
                Err(e) => {
                    tracing::warn!("Failed to store in keyring, falling back to file storage: {}", e);
                }
            }
        }

        self.set_secret_in_file(secret, value).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch_dir() -> PathBuf {
        std::env::temp_dir().join(format!("famcal-test-{}", uuid::Uuid::new_v4()))
    }

    #[tokio::test]
    async fn test_missing_file_yields_defaults() {
        let dir = scratch_dir();
        let store = FileConfigStore::in_dir(&dir);
        let config = store.load_config().await.unwrap();

        assert_eq!(config.api_base_url, AppConfig::default().api_base_url);
        assert_eq!(config.cache_ttl_seconds, 300);
        assert_eq!(config.dial, DialGeometry::default());
    }

    #[tokio::test]
    async fn test_partial_file_keeps_other_defaults() {
        let dir = scratch_dir();
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(
            dir.join("config.json"),
            r#"{"api_base_url": "https://planner.example.com/api", "cache_ttl_seconds": 30}"#,
        )
        .unwrap();

        let config = FileConfigStore::in_dir(&dir).load_config().await.unwrap();
        assert_eq!(config.api_base_url, "https://planner.example.com/api");
        assert_eq!(config.cache_ttl_seconds, 30);
        assert_eq!(config.ai_model, AppConfig::default().ai_model);
        std::fs::remove_dir_all(&dir).ok();
    }

    #[tokio::test]
    async fn test_malformed_file_is_reported() {
        let dir = scratch_dir();
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("config.json"), "{ not json").unwrap();

        let result = FileConfigStore::in_dir(&dir).load_config().await;
        assert!(matches!(result, Err(ConfigError::InvalidFormat(_))));
        std::fs::remove_dir_all(&dir).ok();
    }

    #[tokio::test]
    async fn test_save_round_trips_settings_and_file_secret() {
        let dir = scratch_dir();
        let store = FileConfigStore::in_dir(&dir);
        let config = AppConfig {
            ai_model: "local-model".to_string(),
            cache_ttl_seconds: 45,
            ..AppConfig::default()
        };
        store.save_config(&config).await.unwrap();
        store.set_secret(Secret::AiApiKey, "sk-test\n").await.unwrap();

        let loaded = store.load_config().await.unwrap();
        assert_eq!(loaded.ai_model, "local-model");
        assert_eq!(loaded.cache_ttl_seconds, 45);
        if std::env::var(Secret::AiApiKey.env_var()).is_err() {
            assert_eq!(loaded.ai_api_key.as_deref(), Some("sk-test"));
        }

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mode = std::fs::metadata(dir.join(".ai_api_key"))
                .unwrap()
                .permissions()
                .mode();
            assert_eq!(mode & 0o777, 0o600);
        }
        std::fs::remove_dir_all(&dir).ok();
    }
}
