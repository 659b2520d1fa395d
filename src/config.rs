use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, warn};

use crate::error::Result;

const APP_DIR: &str = "wetter";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Endpoints {
    /// Visual Crossing timeline base; the city is appended as a path segment.
    #[serde(default = "default_weather_url")]
    pub weather: String,

    #[serde(default = "default_cities_url")]
    pub cities: String,

    #[serde(default = "default_geolocation_url")]
    pub geolocation: String,
}

fn default_weather_url() -> String {
    "https://weather.visualcrossing.com/VisualCrossingWebServices/rest/services/timeline".to_string()
}

fn default_cities_url() -> String {
    "https://countriesnow.space/api/v0.1/countries/cities".to_string()
}

fn default_geolocation_url() -> String {
    "https://ipapi.co/json/".to_string()
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            weather: default_weather_url(),
            cities: default_cities_url(),
            geolocation: default_geolocation_url(),
        }
    }
}

/// User configuration, read from `<config dir>/wetter/config.toml`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub api_key: Option<String>,

    #[serde(default = "default_city")]
    pub default_city: String,

    /// Country whose cities feed the search suggestions.
    #[serde(default = "default_country")]
    pub country: String,

    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    #[serde(default)]
    pub endpoints: Endpoints,
}

fn default_city() -> String {
    "Hamburg".to_string()
}

fn default_country() -> String {
    "Germany".to_string()
}

const fn default_timeout() -> u64 {
    30
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_key: None,
            default_city: default_city(),
            country: default_country(),
            timeout_secs: default_timeout(),
            endpoints: Endpoints::default(),
        }
    }
}

/// `<config dir>/wetter`, falling back to the working directory.
pub fn app_dir() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_DIR)
}

impl Config {
    pub fn default_path() -> PathBuf {
        app_dir().join("config.toml")
    }

    /// Missing file means defaults.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            debug!(path = %path.display(), "no config file, using defaults");
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct SavedState {
    last_city: Option<String>,
}

/// The single value kept between runs: the last resolved city.
#[derive(Debug, Clone)]
pub struct PreferenceStore {
    path: PathBuf,
}

impl PreferenceStore {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn default_path() -> PathBuf {
        app_dir().join("state.toml")
    }

    pub fn last_city(&self) -> Option<String> {
        let content = std::fs::read_to_string(&self.path).ok()?;
        match toml::from_str::<SavedState>(&content) {
            Ok(state) => state.last_city.filter(|c| !c.is_empty()),
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "ignoring unreadable state file");
                None
            }
        }
    }

    pub fn save_city(&self, city: &str) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(&SavedState {
            last_city: Some(city.to_string()),
        })?;
        std::fs::write(&self.path, content)?;
        debug!(city, "saved last city");
        Ok(())
    }
}
