use anyhow::{Context, Result, anyhow};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{fs, path::PathBuf};

use crate::{
    firebase::{FIRESTORE_URL, FirebaseSettings, IDENTITY_TOOLKIT_URL},
    model::DEFAULT_CITY,
    provider::{ApiCredentials, QueryTemplate},
};

pub const ENV_RAPIDAPI_KEY: &str = "WEATHERHUB_RAPIDAPI_KEY";
pub const ENV_RAPIDAPI_HOST: &str = "WEATHERHUB_RAPIDAPI_HOST";
pub const ENV_FORECAST_URL: &str = "WEATHERHUB_FORECAST_URL";
pub const ENV_FORECAST_DAYS: &str = "WEATHERHUB_FORECAST_DAYS";
pub const ENV_DEFAULT_CITY: &str = "WEATHERHUB_DEFAULT_CITY";
pub const ENV_FIREBASE_API_KEY: &str = "WEATHERHUB_FIREBASE_API_KEY";
pub const ENV_FIREBASE_PROJECT_ID: &str = "WEATHERHUB_FIREBASE_PROJECT_ID";

/// Weather API settings.
///
/// Example TOML:
/// [weather]
/// rapidapi_key = "..."
/// days = 3
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WeatherApiConfig {
    pub forecast_url: String,
    pub rapidapi_key: Option<String>,
    pub rapidapi_host: String,
    pub days: u8,
    pub default_city: String,
}

impl Default for WeatherApiConfig {
    fn default() -> Self {
        Self {
            forecast_url: "https://weatherapi-com.p.rapidapi.com/forecast.json".to_string(),
            rapidapi_key: None,
            rapidapi_host: "weatherapi-com.p.rapidapi.com".to_string(),
            days: 3,
            default_city: DEFAULT_CITY.to_string(),
        }
    }
}

/// Identity and document store settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FirebaseConfig {
    pub api_key: Option<String>,
    pub project_id: Option<String>,
    pub auth_url: String,
    pub firestore_url: String,
}

impl Default for FirebaseConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            project_id: None,
            auth_url: IDENTITY_TOOLKIT_URL.to_string(),
            firestore_url: FIRESTORE_URL.to_string(),
        }
    }
}

/// Top-level configuration stored on disk.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub weather: WeatherApiConfig,
    pub firebase: FirebaseConfig,
}

impl Config {
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

    /// [`Config::load`] with `WEATHERHUB_*` environment overrides applied.
    pub fn load_with_env() -> Result<Self> {
        let mut cfg = Self::load()?;
        cfg.apply_env(|name| std::env::var(name).ok());
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
        let dirs = ProjectDirs::from("dev", "weather-hub", "weatherhub")
            .ok_or_else(|| anyhow!("Could not determine platform config directory"))?;

        Ok(dirs.config_dir().join("config.toml"))
    }

    /// Override fields from environment-style variables; blank values are ignored.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let get = |name: &str| lookup(name).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        if let Some(v) = get(ENV_RAPIDAPI_KEY) {
            self.weather.rapidapi_key = Some(v);
        }
        if let Some(v) = get(ENV_RAPIDAPI_HOST) {
            self.weather.rapidapi_host = v;
        }
        if let Some(v) = get(ENV_FORECAST_URL) {
            self.weather.forecast_url = v;
        }
        if let Some(v) = get(ENV_FORECAST_DAYS) {
            match v.parse() {
                Ok(days) => self.weather.days = days,
                Err(_) => tracing::warn!(value = %v, "ignoring invalid {ENV_FORECAST_DAYS}"),
            }
        }
        if let Some(v) = get(ENV_DEFAULT_CITY) {
            self.weather.default_city = v;
        }
        if let Some(v) = get(ENV_FIREBASE_API_KEY) {
            self.firebase.api_key = Some(v);
        }
        if let Some(v) = get(ENV_FIREBASE_PROJECT_ID) {
            self.firebase.project_id = Some(v);
        }
    }

    pub fn set_rapidapi_key(&mut self, key: String) {
        self.weather.rapidapi_key = Some(key);
    }

    pub fn set_firebase_project(&mut self, api_key: String, project_id: String) {
        self.firebase.api_key = Some(api_key);
        self.firebase.project_id = Some(project_id);
    }

    pub fn is_weather_configured(&self) -> bool {
        self.weather.rapidapi_key.is_some()
    }

    pub fn is_firebase_configured(&self) -> bool {
        self.firebase.api_key.is_some() && self.firebase.project_id.is_some()
    }

    /// Request template for the weather API.
    pub fn query_template(&self) -> Result<QueryTemplate> {
        let key = self.weather.rapidapi_key.as_ref().ok_or_else(|| {
            anyhow!(
                "No RapidAPI key configured.\n\
                 Hint: run `weatherhub configure` or set {ENV_RAPIDAPI_KEY}."
            )
        })?;

        Ok(QueryTemplate {
            base_url: self.weather.forecast_url.clone(),
            days: (self.weather.days > 0).then_some(self.weather.days),
            credentials: ApiCredentials {
                key: key.clone(),
                host: self.weather.rapidapi_host.clone(),
            },
        })
    }

    pub fn firebase_settings(&self) -> Result<FirebaseSettings> {
        let (Some(api_key), Some(project_id)) = (&self.firebase.api_key, &self.firebase.project_id)
        else {
            return Err(anyhow!(
                "Account features are not configured.\n\
                 Hint: run `weatherhub configure` or set {ENV_FIREBASE_API_KEY} \
                 and {ENV_FIREBASE_PROJECT_ID}."
            ));
        };

        Ok(FirebaseSettings {
            api_key: api_key.clone(),
            project_id: project_id.clone(),
            auth_url: self.firebase.auth_url.clone(),
            firestore_url: self.firebase.firestore_url.clone(),
        })
    }
}
