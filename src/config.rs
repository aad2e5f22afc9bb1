//! Configuration management for the SkyFlow database connection and map defaults.
//!
//! Reads settings from `~/.config/skyflow/settings.conf` (Linux/macOS)
//! or `%LOCALAPPDATA%\skyflow\settings.conf` (Windows). The connection
//! URL and API key can be overridden with `SKYFLOW_SUPABASE_URL` and
//! `SKYFLOW_SUPABASE_KEY`.

use crate::map::center;
use crate::types::{Result, SkyflowError};
use configparser::ini::Ini;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Environment variable overriding `[supabase] url`.
pub const ENV_URL: &str = "SKYFLOW_SUPABASE_URL";

/// Environment variable overriding `[supabase] api_key`.
pub const ENV_API_KEY: &str = "SKYFLOW_SUPABASE_KEY";

/// Default map zoom level.
pub const DEFAULT_ZOOM: u8 = 12;

/// Default map center, as `(lat, lon)`.
pub const DEFAULT_CENTER: (f64, f64) = (center::DEFAULT_CENTER.lat, center::DEFAULT_CENTER.lon);

const DEFAULT_SCHEMA: &str = "public";
const DEFAULT_TIMEOUT_SECS: u64 = 30;
const DEFAULT_PAGE_SIZE: usize = 1000;

/// SkyFlow configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Supabase project URL (e.g. `https://xyz.supabase.co`)
    pub url: Option<String>,
    /// Supabase API key (anon or service key)
    pub api_key: Option<String>,
    /// Postgres schema exposed through the REST API
    pub schema: String,
    /// HTTP request timeout
    pub timeout: Duration,
    /// Rows requested per page
    pub page_size: usize,
    /// Initial map zoom level
    pub zoom: u8,
    /// Map center used when no coordinates are available
    pub fallback_center: (f64, f64),
}

impl Default for Config {
    fn default() -> Self {
        Self {
            url: None,
            api_key: None,
            schema: DEFAULT_SCHEMA.to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            page_size: DEFAULT_PAGE_SIZE,
            zoom: DEFAULT_ZOOM,
            fallback_center: DEFAULT_CENTER,
        }
    }
}

impl Config {
    /// Load configuration from the default config file, then apply
    /// environment overrides. A missing file yields defaults.
    pub fn load() -> Result<Self> {
        Ok(Self::load_file()?.with_env_overrides())
    }

    /// Load the config file as written, without environment overrides.
    /// A missing file yields defaults; a malformed one is an error.
    pub fn load_file() -> Result<Self> {
        Self::load_or_default(&Self::config_path()?)
    }

    /// Load `path` if it exists, otherwise defaults.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if path.exists() {
            Self::load_from_path(path)
        } else {
            Ok(Self::default())
        }
    }

    /// Load configuration from a specific path.
    pub fn load_from_path(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(SkyflowError::Config(format!(
                "Config file not found: {}. Run `skyflow config --url <URL> --api-key <KEY>` to create it.",
                path.display()
            )));
        }

        let mut ini = Ini::new();
        ini.load(path).map_err(SkyflowError::Config)?;

        let defaults = Self::default();
        let get = |section: &str, key: &str| ini.get(section, key).filter(|s| !s.is_empty());

        let config = Config {
            url: get("supabase", "url"),
            api_key: get("supabase", "api_key"),
            schema: get("supabase", "schema").unwrap_or(defaults.schema),
            timeout: parse_value(get("supabase", "timeout"), "supabase.timeout")?
                .map(Duration::from_secs)
                .unwrap_or(defaults.timeout),
            page_size: parse_value(get("supabase", "page_size"), "supabase.page_size")?
                .unwrap_or(defaults.page_size),
            zoom: parse_value(get("map", "zoom"), "map.zoom")?.unwrap_or(defaults.zoom),
            fallback_center: (
                parse_value(get("map", "fallback_lat"), "map.fallback_lat")?
                    .unwrap_or(defaults.fallback_center.0),
                parse_value(get("map", "fallback_lon"), "map.fallback_lon")?
                    .unwrap_or(defaults.fallback_center.1),
            ),
        };

        if config.page_size == 0 {
            return Err(SkyflowError::Config("supabase.page_size must be greater than zero".into()));
        }

        Ok(config)
    }

    /// Apply `SKYFLOW_SUPABASE_URL` / `SKYFLOW_SUPABASE_KEY` if set.
    pub fn with_env_overrides(mut self) -> Self {
        if let Some(url) = std::env::var(ENV_URL).ok().filter(|s| !s.is_empty()) {
            self.url = Some(url);
        }
        if let Some(key) = std::env::var(ENV_API_KEY).ok().filter(|s| !s.is_empty()) {
            self.api_key = Some(key);
        }
        self
    }

    /// Write the configuration to the default config file.
    pub fn save(&self) -> Result<PathBuf> {
        let path = Self::config_path()?;
        self.save_to_path(&path)?;
        Ok(path)
    }

    /// Write the configuration to a specific path.
    pub fn save_to_path(&self, path: &Path) -> Result<()> {
        if let Some(dir) = path.parent() {
            std::fs::create_dir_all(dir)?;
        }

        let mut ini = Ini::new();
        ini.set("supabase", "url", self.url.clone());
        ini.set("supabase", "api_key", self.api_key.clone());
        ini.set("supabase", "schema", Some(self.schema.clone()));
        ini.set("supabase", "timeout", Some(self.timeout.as_secs().to_string()));
        ini.set("supabase", "page_size", Some(self.page_size.to_string()));
        ini.set("map", "zoom", Some(self.zoom.to_string()));
        ini.set("map", "fallback_lat", Some(self.fallback_center.0.to_string()));
        ini.set("map", "fallback_lon", Some(self.fallback_center.1.to_string()));
        ini.write(path)?;
        Ok(())
    }

    /// Get the platform-specific config directory for SkyFlow.
    pub fn config_dir() -> Result<PathBuf> {
        #[cfg(target_os = "windows")]
        {
            dirs::data_local_dir()
                .map(|p| p.join("skyflow"))
                .ok_or_else(|| SkyflowError::Config("Could not determine config directory".into()))
        }

        #[cfg(any(target_os = "linux", target_os = "macos"))]
        {
            dirs::config_dir()
                .map(|p| p.join("skyflow"))
                .ok_or_else(|| SkyflowError::Config("Could not determine config directory".into()))
        }

        #[cfg(not(any(target_os = "linux", target_os = "macos", target_os = "windows")))]
        {
            dirs::home_dir()
                .map(|p| p.join(".skyflow"))
                .ok_or_else(|| SkyflowError::Config("Could not determine home directory".into()))
        }
    }

    /// Get the config file path.
    pub fn config_path() -> Result<PathBuf> {
        Ok(Self::config_dir()?.join("settings.conf"))
    }

    /// Check if connection settings are configured.
    pub fn has_credentials(&self) -> bool {
        self.url.is_some() && self.api_key.is_some()
    }

    /// Get URL or return error.
    pub fn require_url(&self) -> Result<&str> {
        self.url
            .as_deref()
            .ok_or_else(|| SkyflowError::Config("Supabase URL not configured".into()))
    }

    /// Get API key or return error.
    pub fn require_api_key(&self) -> Result<&str> {
        self.api_key
            .as_deref()
            .ok_or_else(|| SkyflowError::Config("Supabase API key not configured".into()))
    }
}

fn parse_value<T: std::str::FromStr>(raw: Option<String>, key: &str) -> Result<Option<T>> {
    raw.map(|s| {
        s.trim()
            .parse::<T>()
            .map_err(|_| SkyflowError::Config(format!("Invalid value for {}: {}", key, s)))
    })
    .transpose()
}

/// Default config file content template.
pub const DEFAULT_CONFIG: &str = r#"[supabase]
url =
api_key =
schema = public
timeout = 30
page_size = 1000

[map]
zoom = 12
fallback_lat = -23.55
fallback_lon = -46.633
"#;
