//! Application configuration management.
//!
//! Configuration is stored at `~/.config/evbook/config.json`. Session and
//! token entries live in the data directory (`~/.local/share/evbook/`) or
//! in the OS keychain, depending on `storage`.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::api::client::DEFAULT_API_URL;
use crate::api::ClientSettings;
use crate::guard::GuardConfig;
use crate::models::Locale;
use crate::storage::{FileStorage, KeychainStorage, Storage};

/// Application name used for config/data directory paths and the keychain service
pub const APP_NAME: &str = "evbook";

/// Config file name
const CONFIG_FILE: &str = "config.json";

/// HTTP request timeout in seconds.
/// 30s allows for slow API responses while failing fast enough for good UX.
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    #[default]
    File,
    Keychain,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub api_url: Option<String>,
    pub locale: Option<Locale>,
    pub storage: StorageBackend,
    pub request_timeout_secs: u64,
    pub guard: GuardConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_url: None,
            locale: None,
            storage: StorageBackend::default(),
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            guard: GuardConfig::default(),
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let contents = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file {}", path.display()))?;
            serde_json::from_str(&contents)
                .with_context(|| format!("Failed to parse config file {}", path.display()))
        } else {
            Ok(Self::default())
        }
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(self)?;
        std::fs::write(path, contents)
            .with_context(|| format!("Failed to write config file {}", path.display()))?;
        Ok(())
    }

    fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find config directory"))?;
        Ok(config_dir.join(APP_NAME).join(CONFIG_FILE))
    }

    /// Directory holding the persisted session and logs
    pub fn data_dir() -> Result<PathBuf> {
        let data_dir = dirs::data_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find data directory"))?;
        Ok(data_dir.join(APP_NAME))
    }

    /// Configured locale, else one detected from a `LANG`-style value
    pub fn resolve_locale(&self, lang: Option<&str>) -> Locale {
        self.locale.unwrap_or_else(|| Locale::detect(lang))
    }

    /// Settings for [`crate::api::ApiClient`]. An explicit URL wins over the
    /// configured one.
    pub fn client_settings(&self, api_url: Option<String>, locale: Locale) -> ClientSettings {
        let base_url = api_url
            .or_else(|| self.api_url.clone())
            .unwrap_or_else(|| DEFAULT_API_URL.to_string());
        ClientSettings {
            base_url,
            timeout: Duration::from_secs(self.request_timeout_secs),
            locale,
            guard: self.guard.clone(),
        }
    }

    pub fn open_storage(&self) -> Result<Arc<dyn Storage>> {
        Ok(match self.storage {
            StorageBackend::File => Arc::new(FileStorage::new(Self::data_dir()?)),
            StorageBackend::Keychain => Arc::new(KeychainStorage::new(APP_NAME)),
        })
    }
}
