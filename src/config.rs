//! Configuration System
//!
//! Handles loading configuration from files and environment variables.
//! Supports TOML config files and environment variable overrides.

use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::air_quality::OpenWeatherConfig;
use crate::dashboard::{ChartType, DashboardSettings, TimeFilter};
use crate::preferences::FilePreferenceStore;
use crate::source::HttpSourceConfig;

/// Main configuration structure
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub dashboard: DashboardConfig,

    #[serde(default)]
    pub air_quality: AirQualityConfig,

    #[serde(default)]
    pub export: ExportConfig,

    #[serde(default)]
    pub preferences: PreferencesConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Data endpoint and controller configuration
#[derive(Debug, Clone, Deserialize)]
pub struct DashboardConfig {
    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    /// Link included in shared achievements
    #[serde(default = "default_page_url")]
    pub page_url: String,

    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,

    #[serde(default = "default_auto_refresh")]
    pub auto_refresh_secs: u64,

    #[serde(default = "default_voice_timeout")]
    pub voice_timeout_secs: u64,

    #[serde(default)]
    pub default_filter: TimeFilter,

    #[serde(default)]
    pub default_chart_type: ChartType,
}

fn default_endpoint() -> String {
    "http://localhost:8000/dashboard/api/data/".to_string()
}

fn default_page_url() -> String {
    "http://localhost:8000/dashboard/".to_string()
}

fn default_request_timeout() -> u64 {
    10
}

fn default_auto_refresh() -> u64 {
    30
}

fn default_voice_timeout() -> u64 {
    5
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            page_url: default_page_url(),
            request_timeout_secs: default_request_timeout(),
            auto_refresh_secs: default_auto_refresh(),
            voice_timeout_secs: default_voice_timeout(),
            default_filter: TimeFilter::default(),
            default_chart_type: ChartType::default(),
        }
    }
}

impl DashboardConfig {
    pub fn source_config(&self) -> HttpSourceConfig {
        HttpSourceConfig {
            endpoint: self.endpoint.clone(),
            request_timeout_ms: self.request_timeout_secs.saturating_mul(1000),
        }
    }

    pub fn settings(&self) -> DashboardSettings {
        DashboardSettings {
            auto_refresh_interval: Duration::from_secs(self.auto_refresh_secs),
            voice_timeout: Duration::from_secs(self.voice_timeout_secs),
            page_url: self.page_url.clone(),
            initial_filter: self.default_filter,
            initial_chart_type: self.default_chart_type,
        }
    }
}

/// Air-quality lookup configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AirQualityConfig {
    #[serde(default = "default_air_quality_enabled")]
    pub enabled: bool,

    #[serde(default = "default_openweather_url")]
    pub base_url: String,

    #[serde(default)]
    pub api_key: String,

    /// Position used for "here" lookups
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

fn default_air_quality_enabled() -> bool {
    true
}

fn default_openweather_url() -> String {
    "https://api.openweathermap.org".to_string()
}

impl Default for AirQualityConfig {
    fn default() -> Self {
        Self {
            enabled: default_air_quality_enabled(),
            base_url: default_openweather_url(),
            api_key: String::new(),
            latitude: None,
            longitude: None,
        }
    }
}

impl AirQualityConfig {
    /// Lookups need both the switch and a key
    pub fn is_usable(&self) -> bool {
        self.enabled && !self.api_key.is_empty()
    }

    pub fn client_config(&self, request_timeout_secs: u64) -> OpenWeatherConfig {
        OpenWeatherConfig {
            base_url: self.base_url.clone(),
            api_key: self.api_key.clone(),
            request_timeout_ms: request_timeout_secs.saturating_mul(1000),
        }
    }

    /// Configured position, if both coordinates are set
    pub fn position(&self) -> Option<(f64, f64)> {
        self.latitude.zip(self.longitude)
    }
}

/// Export configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ExportConfig {
    /// Directory downloads are written into
    #[serde(default = "default_output_dir")]
    pub output_dir: String,
}

fn default_output_dir() -> String {
    dirs::download_dir()
        .map(|p| p.to_string_lossy().to_string())
        .unwrap_or_else(|| "./exports".to_string())
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            output_dir: default_output_dir(),
        }
    }
}

/// Preference storage configuration
#[derive(Debug, Clone, Deserialize)]
pub struct PreferencesConfig {
    #[serde(default = "default_preferences_path")]
    pub path: String,
}

fn default_preferences_path() -> String {
    FilePreferenceStore::default_path()
        .to_string_lossy()
        .to_string()
}

impl Default for PreferencesConfig {
    fn default() -> Self {
        Self {
            path: default_preferences_path(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,

    #[serde(default = "default_log_format")]
    pub format: String,

    pub file: Option<String>,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
            file: None,
        }
    }
}

impl Config {
    /// Load configuration from a file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            error: e.to_string(),
        })?;

        let config: Config = toml::from_str(&content).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            error: e.to_string(),
        })?;

        Ok(config)
    }

    /// Load configuration from environment variables only
    pub fn from_env() -> Self {
        let mut config = Config::default();
        config.apply_env_overrides();
        config
    }

    /// Load configuration with environment variable overrides
    pub fn load_with_env(path: &Path) -> Result<Self, ConfigError> {
        let mut config = Self::load(path)?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Load from default locations or environment
    pub fn load_default() -> Self {
        // Try default config locations
        let config_paths = [
            dirs::config_dir().map(|p| p.join("ecoguard").join("config.toml")),
            Some(PathBuf::from("/etc/ecoguard/config.toml")),
            Some(PathBuf::from("./config.toml")),
        ];

        for path_opt in config_paths.iter().flatten() {
            if path_opt.exists() {
                match Self::load_with_env(path_opt) {
                    Ok(config) => {
                        tracing::info!("Loaded config from {:?}", path_opt);
                        return config;
                    }
                    Err(e) => {
                        tracing::warn!("Failed to load config from {:?}: {}", path_opt, e);
                    }
                }
            }
        }

        // Fall back to environment-only config
        tracing::info!("Using default config with environment overrides");
        Self::from_env()
    }

    /// Apply environment variable overrides to an existing config
    fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    fn apply_overrides(&mut self, var: impl Fn(&str) -> Option<String>) {
        // Dashboard overrides
        if let Some(endpoint) = var("ECOGUARD_ENDPOINT") {
            self.dashboard.endpoint = endpoint;
        }
        if let Some(page_url) = var("ECOGUARD_PAGE_URL") {
            self.dashboard.page_url = page_url;
        }
        if let Some(secs) = var("ECOGUARD_REFRESH_SECS") {
            match secs.parse() {
                Ok(s) => self.dashboard.auto_refresh_secs = s,
                Err(_) => tracing::warn!("Ignoring invalid ECOGUARD_REFRESH_SECS: {}", secs),
            }
        }

        // Air quality overrides
        if let Some(key) = var("ECOGUARD_OPENWEATHER_KEY") {
            self.air_quality.api_key = key;
        }
        if let Some(url) = var("ECOGUARD_OPENWEATHER_URL") {
            self.air_quality.base_url = url;
        }

        // Export and preference overrides
        if let Some(dir) = var("ECOGUARD_EXPORT_DIR") {
            self.export.output_dir = dir;
        }
        if let Some(path) = var("ECOGUARD_PREFERENCES") {
            self.preferences.path = path;
        }

        // Logging overrides
        if let Some(level) = var("ECOGUARD_LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Some(format) = var("ECOGUARD_LOG_FORMAT") {
            self.logging.format = format;
        }
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path:?}: {error}")]
    Io { path: PathBuf, error: String },

    #[error("Failed to parse config file {path:?}: {error}")]
    Parse { path: PathBuf, error: String },
}

/// Generate a default config file content
pub fn generate_default_config() -> String {
    r#"# EcoGuard Configuration
#
# Environment variables override these settings:
# - ECOGUARD_ENDPOINT
# - ECOGUARD_PAGE_URL
# - ECOGUARD_REFRESH_SECS
# - ECOGUARD_OPENWEATHER_KEY
# - ECOGUARD_OPENWEATHER_URL
# - ECOGUARD_EXPORT_DIR
# - ECOGUARD_PREFERENCES
# - ECOGUARD_LOG_LEVEL
# - ECOGUARD_LOG_FORMAT

[dashboard]
# Dashboard data endpoint
endpoint = "http://localhost:8000/dashboard/api/data/"

# Page link included when sharing achievements
page_url = "http://localhost:8000/dashboard/"

# Request timeout in seconds
request_timeout_secs = 10

# Auto-refresh period in seconds
auto_refresh_secs = 30

# How long the voice listening indicator stays on (seconds)
voice_timeout_secs = 5

# Initial time range: day, week, month, quarter, year, all
default_filter = "month"

# Initial main chart: line, bar, pie, heatmap
default_chart_type = "line"

[air_quality]
# Enable air-quality lookups
enabled = true

# OpenWeather API base URL
base_url = "https://api.openweathermap.org"

# OpenWeather API key (get from openweathermap.org)
api_key = ""

# Position used for local lookups
# latitude = 23.03
# longitude = 72.58

[export]
# Directory exported files are written into
# output_dir = "~/Downloads"

[preferences]
# JSON file holding the dark-mode preference
# path = "~/.local/share/ecoguard/preferences.json"

[logging]
# Log level: trace, debug, info, warn, error
level = "info"

# Log format: pretty (for development) or json (for production)
format = "pretty"

# Optional log file path
# file = "/var/log/ecoguard/ecoguard.log"
"#
    .to_string()
}
