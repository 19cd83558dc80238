use anyhow::{Context, Result, anyhow};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{collections::HashMap, env, fs, path::PathBuf};

use crate::extract::ApiConfig;

/// Name the host's secret store uses for the WeatherAPI credential.
pub const WEATHERAPI_KEY_NAME: &str = "secret_weatherapi_key";

/// Top-level configuration stored on disk.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Endpoint settings for the extractor.
    #[serde(default)]
    pub api: ApiConfig,

    /// Example TOML:
    /// [secrets]
    /// secret_weatherapi_key = "..."
    #[serde(default)]
    pub secrets: HashMap<String, String>,
}

impl Config {
    /// Resolve a named secret: the environment (the host's secret store)
    /// wins over the local config file.
    pub fn secret(&self, name: &str) -> Option<String> {
        if let Ok(value) = env::var(env_var_name(name)) {
            return Some(value);
        }

        self.secrets.get(name).cloned()
    }

    /// The WeatherAPI credential, or an actionable error when unset.
    pub fn api_key(&self) -> Result<String> {
        self.secret(WEATHERAPI_KEY_NAME).ok_or_else(|| {
            anyhow!(
                "No WeatherAPI key configured.\n\
                 Hint: run `ingest configure` or set the {} environment variable.",
                env_var_name(WEATHERAPI_KEY_NAME)
            )
        })
    }

    /// Store the WeatherAPI credential in the local secrets table.
    pub fn set_api_key(&mut self, api_key: String) {
        self.secrets.insert(WEATHERAPI_KEY_NAME.to_string(), api_key);
    }

    pub fn has_api_key(&self) -> bool {
        self.secret(WEATHERAPI_KEY_NAME).is_some()
    }

    /// Load config from disk, or return an empty default if it doesn't exist yet.
    pub fn load() -> Result<Self> {
        let path = Self::config_file_path()?;
        if !path.exists() {
            // First run: no config file, return empty.
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let cfg: Config = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(cfg)
    }

    /// Save config to disk, creating parent directories as needed.
    pub fn save(&self) -> Result<()> {
        let path = Self::config_file_path()?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let toml =
            toml::to_string_pretty(self).context("Failed to serialize configuration to TOML")?;

        fs::write(&path, toml)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }

    /// Path to the config file.
    pub fn config_file_path() -> Result<PathBuf> {
        let dirs = ProjectDirs::from("dev", "weather-ingest", "ingest-cli")
            .ok_or_else(|| anyhow!("Could not determine platform config directory"))?;

        Ok(dirs.config_dir().join("config.toml"))
    }
}

/// Environment variable for a secret name: uppercased, separators normalized.
fn env_var_name(name: &str) -> String {
    name.replace(['/', '-'], "_").to_uppercase()
}
