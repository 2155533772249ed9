//! The on-disk key store at `~/.shellgpt/config.json`.
//!
//! Environment variables take precedence over stored keys so a key can be
//! supplied per invocation without touching the file.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub const CONFIG_DIR_NAME: &str = ".shellgpt";
pub const CONFIG_FILE_NAME: &str = "config.json";
pub const OPENAI_API_KEY_ENV: &str = "OPENAI_API_KEY";
pub const SEARCHAPI_API_KEY_ENV: &str = "SEARCHAPI_API_KEY";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub search_api_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl StoredConfig {
    fn touch(&mut self, now: DateTime<Utc>) {
        self.updated_at = Some(now);
        self.created_at.get_or_insert(now);
    }
}

#[derive(Debug, Clone)]
pub struct ConfigManager {
    config_dir: PathBuf,
    read_env: bool,
}

impl ConfigManager {
    /// Uses `~/.shellgpt` and honors the key environment variables.
    pub fn new() -> Result<Self> {
        let home = dirs::home_dir().context("could not determine the home directory")?;
        Ok(Self::at(home.join(CONFIG_DIR_NAME)))
    }

    pub fn at(config_dir: impl Into<PathBuf>) -> Self {
        Self {
            config_dir: config_dir.into(),
            read_env: true,
        }
    }

    /// Ignores `OPENAI_API_KEY` and `SEARCHAPI_API_KEY`.
    pub fn without_env(mut self) -> Self {
        self.read_env = false;
        self
    }

    pub fn config_dir(&self) -> &Path {
        &self.config_dir
    }

    pub fn config_file(&self) -> PathBuf {
        self.config_dir.join(CONFIG_FILE_NAME)
    }

    pub fn has_config(&self) -> bool {
        self.config_file().is_file()
    }

    pub fn load(&self) -> Result<Option<StoredConfig>> {
        let path = self.config_file();
        if !path.is_file() {
            return Ok(None);
        }

        let raw = fs::read_to_string(&path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        let config = serde_json::from_str(&raw)
            .with_context(|| format!("failed to parse {}", path.display()))?;
        Ok(Some(config))
    }

    pub fn load_api_key(&self) -> Result<Option<String>> {
        self.resolve_key(OPENAI_API_KEY_ENV, |config| config.api_key)
    }

    pub fn load_search_api_key(&self) -> Result<Option<String>> {
        self.resolve_key(SEARCHAPI_API_KEY_ENV, |config| config.search_api_key)
    }

    pub fn save_api_key(&self, api_key: &str) -> Result<()> {
        self.update(|config| config.api_key = Some(api_key.trim().to_string()))
    }

    pub fn save_search_api_key(&self, search_api_key: &str) -> Result<()> {
        self.update(|config| config.search_api_key = Some(search_api_key.trim().to_string()))
    }

    /// Deletes the config file. Returns `false` when there was none.
    pub fn clear(&self) -> Result<bool> {
        let path = self.config_file();
        if !path.is_file() {
            return Ok(false);
        }

        fs::remove_file(&path).with_context(|| format!("failed to remove {}", path.display()))?;
        tracing::debug!(phase = "config", event = "cleared", path = %path.display());
        Ok(true)
    }

    /// Removes only the SearchAPI key. Returns `false` when there was no file.
    pub fn clear_search(&self) -> Result<bool> {
        if !self.has_config() {
            return Ok(false);
        }

        self.update(|config| config.search_api_key = None)?;
        Ok(true)
    }

    fn resolve_key(
        &self,
        variable: &str,
        stored: impl FnOnce(StoredConfig) -> Option<String>,
    ) -> Result<Option<String>> {
        if self.read_env
            && let Some(value) = std::env::var(variable)
                .ok()
                .filter(|value| !value.trim().is_empty())
        {
            tracing::debug!(phase = "config", event = "env_override", variable);
            return Ok(Some(value.trim().to_string()));
        }

        Ok(self
            .load()?
            .and_then(stored)
            .filter(|value| !value.trim().is_empty()))
    }

    fn update(&self, apply: impl FnOnce(&mut StoredConfig)) -> Result<()> {
        let mut config = self.load()?.unwrap_or_default();
        apply(&mut config);
        config.touch(Utc::now());

        fs::create_dir_all(&self.config_dir)
            .with_context(|| format!("failed to create {}", self.config_dir.display()))?;

        let path = self.config_file();
        let json = serde_json::to_string_pretty(&config).context("failed to encode config")?;
        fs::write(&path, json).with_context(|| format!("failed to write {}", path.display()))?;
        restrict_permissions(&path)?;

        tracing::debug!(phase = "config", event = "saved", path = %path.display());
        Ok(())
    }
}

#[cfg(unix)]
fn restrict_permissions(path: &Path) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;

    fs::set_permissions(path, fs::Permissions::from_mode(0o600))
        .with_context(|| format!("failed to set permissions on {}", path.display()))
}

#[cfg(not(unix))]
fn restrict_permissions(_path: &Path) -> Result<()> {
    Ok(())
}
