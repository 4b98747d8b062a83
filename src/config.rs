use anyhow::{Context, Result};
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Environment variable that overrides the configured API URL
pub const API_URL_ENV: &str = "BLUEPRINT_API_URL";

pub const DEFAULT_API_URL: &str = "http://localhost:3000/api";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_api_url")]
    pub api_url: String,
    #[serde(default)]
    pub settings: Settings,
    /// Set from the environment at load time, never written back
    #[serde(skip)]
    api_url_override: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    #[serde(default = "default_retry_attempts")]
    pub retry_attempts: u32,
    #[serde(default = "default_request_logging")]
    pub request_logging: bool,
}

fn default_api_url() -> String {
    DEFAULT_API_URL.to_string()
}

fn default_request_timeout_secs() -> u64 {
    30
}

fn default_retry_attempts() -> u32 {
    3
}

fn default_request_logging() -> bool {
    true
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            request_timeout_secs: default_request_timeout_secs(),
            retry_attempts: default_retry_attempts(),
            request_logging: default_request_logging(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_url: default_api_url(),
            settings: Settings::default(),
            api_url_override: None,
        }
    }
}

impl Config {
    /// Directory holding `config.toml` and the session file, created on demand
    pub fn config_dir() -> Result<PathBuf> {
        let config_dir = if cfg!(target_os = "linux") {
            dirs::config_dir()
                .context("Failed to get XDG config directory")?
                .join("blueprint-cli")
        } else {
            dirs::home_dir()
                .context("Failed to get home directory")?
                .join(".blueprint-cli")
        };

        if !config_dir.exists() {
            fs::create_dir_all(&config_dir)
                .with_context(|| format!("Failed to create config directory: {:?}", config_dir))?;
            info!("Created config directory: {:?}", config_dir);
        }

        Ok(config_dir)
    }

    pub fn get_config_path() -> Result<PathBuf> {
        Ok(Self::config_dir()?.join("config.toml"))
    }

    /// Loads the user's config and applies the environment override
    pub fn load() -> Result<Self> {
        let mut config = Self::load_from(&Self::get_config_path()?);
        config.apply_env_override(std::env::var(API_URL_ENV).ok());
        Ok(config)
    }

    /// Reads a config file, falling back to defaults when it is missing or unreadable
    pub fn load_from(path: &Path) -> Self {
        debug!("Loading config from: {:?}", path);

        if !path.exists() {
            info!("Config file doesn't exist, using default config");
            return Self::default();
        }

        let parsed = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))
            .and_then(|content| {
                toml::from_str::<Config>(&content)
                    .with_context(|| format!("Failed to parse config file: {:?}", path))
            });

        match parsed {
            Ok(config) => config,
            Err(e) => {
                warn!("Could not load config, using defaults: {:#}", e);
                Self::default()
            }
        }
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::get_config_path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        debug!("Saving config to: {:?}", path);

        let config_content =
            toml::to_string_pretty(self).context("Failed to serialize config to TOML")?;

        fs::write(path, config_content)
            .with_context(|| format!("Failed to write config file: {:?}", path))?;

        info!("Config saved successfully");
        Ok(())
    }

    pub fn apply_env_override(&mut self, value: Option<String>) {
        self.api_url_override = value
            .map(|v| v.trim().trim_end_matches('/').to_string())
            .filter(|v| !v.is_empty());

        if let Some(url) = &self.api_url_override {
            debug!("Using API URL from {}: {}", API_URL_ENV, url);
        }
    }

    /// The URL requests go to: the environment override, else the saved value
    pub fn api_url(&self) -> &str {
        self.api_url_override.as_deref().unwrap_or(&self.api_url)
    }

    pub fn is_api_url_overridden(&self) -> bool {
        self.api_url_override.is_some()
    }

    pub fn set_api_url(&mut self, url: &str) -> Result<()> {
        let url = url.trim().trim_end_matches('/');
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            anyhow::bail!("API URL must start with http:// or https://, got '{}'", url);
        }

        info!("Setting API URL to: {}", url);
        self.api_url = url.to_string();
        Ok(())
    }
}
