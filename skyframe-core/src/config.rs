use anyhow::{Context, Result, anyhow};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{fs, path::Path, path::PathBuf, time::Duration};

use crate::model::Coordinates;

/// Top-level configuration stored on disk.
///
/// Example TOML:
/// ```toml
/// weather_api_key = "..."
/// render_api_key = "..."
/// render_secret_key = "..."
/// poll_interval_ms = 2000
///
/// [default_location]
/// lat = 55.75
/// lon = 37.62
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Visual Crossing API key.
    pub weather_api_key: Option<String>,
    /// Fusion Brain `X-Key` value.
    pub render_api_key: Option<String>,
    /// Fusion Brain `X-Secret` value.
    pub render_secret_key: Option<String>,

    /// Delay between generation status checks.
    pub poll_interval_ms: u64,
    /// Absolute limit on waiting for a job, counted from submission.
    pub poll_ceiling_ms: u64,

    /// Locale used for weekday labels, e.g. "ru_RU" or "en_US".
    pub locale: String,
    /// Visual Crossing unit group passed through untouched.
    pub unit_group: String,
    pub http_timeout_secs: u64,

    pub weather_base_url: String,
    pub render_base_url: String,
    pub geocoder_base_url: String,

    pub default_location: Option<Coordinates>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            weather_api_key: None,
            render_api_key: None,
            render_secret_key: None,
            poll_interval_ms: 2_000,
            poll_ceiling_ms: 30_000,
            locale: "ru_RU".to_string(),
            unit_group: "metric".to_string(),
            http_timeout_secs: 30,
            weather_base_url: "https://weather.visualcrossing.com".to_string(),
            render_base_url: "https://api-key.fusionbrain.ai".to_string(),
            geocoder_base_url: "https://nominatim.openstreetmap.org".to_string(),
            default_location: None,
        }
    }
}

impl Config {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn poll_ceiling(&self) -> Duration {
        Duration::from_millis(self.poll_ceiling_ms)
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs)
    }

    pub fn weather_api_key(&self) -> Result<&str> {
        self.weather_api_key.as_deref().filter(|k| !k.is_empty()).ok_or_else(|| {
            anyhow!(
                "No weather API key configured.\n\
                 Hint: run `skyframe configure` and enter your Visual Crossing key."
            )
        })
    }

    /// Returns the (key, secret) pair for the rendering pipeline.
    pub fn render_credentials(&self) -> Result<(&str, &str)> {
        let key = self.render_api_key.as_deref().filter(|k| !k.is_empty());
        let secret = self.render_secret_key.as_deref().filter(|k| !k.is_empty());

        match (key, secret) {
            (Some(key), Some(secret)) => Ok((key, secret)),
            _ => Err(anyhow!(
                "Image generation credentials are incomplete.\n\
                 Hint: run `skyframe configure` and enter both the API key and the secret key."
            )),
        }
    }

    pub fn is_render_configured(&self) -> bool {
        self.render_credentials().is_ok()
    }

    /// Load config from disk, or return defaults if it doesn't exist yet.
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_file_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            // First run: no config file, use defaults.
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let cfg: Config = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        cfg.validate()?;
        Ok(cfg)
    }

    /// Save config to disk, creating parent directories as needed.
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_file_path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let toml =
            toml::to_string_pretty(self).context("Failed to serialize configuration to TOML")?;

        fs::write(path, toml)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }

    /// Path to the config file.
    pub fn config_file_path() -> Result<PathBuf> {
        let dirs = ProjectDirs::from("dev", "skyframe", "skyframe")
            .ok_or_else(|| anyhow!("Could not determine platform config directory"))?;

        Ok(dirs.config_dir().join("config.toml"))
    }

    fn validate(&self) -> Result<()> {
        if self.poll_interval_ms == 0 {
            return Err(anyhow!("poll_interval_ms must be greater than zero"));
        }
        if self.poll_ceiling_ms < self.poll_interval_ms {
            return Err(anyhow!(
                "poll_ceiling_ms ({}) must not be shorter than poll_interval_ms ({})",
                self.poll_ceiling_ms,
                self.poll_interval_ms
            ));
        }
        Ok(())
    }
}
