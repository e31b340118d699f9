use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use url::Url;

use crate::error::ConfigError;
use crate::retry::RetryConfig;

/// Configuration validation errors
#[derive(Debug, Clone)]
pub struct ConfigValidationError {
    pub field: String,
    pub message: String,
}

impl std::fmt::Display for ConfigValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Result of config validation
#[derive(Debug, Clone, Default)]
pub struct ValidationResult {
    pub errors: Vec<ConfigValidationError>,
    pub warnings: Vec<ConfigValidationError>,
}

impl ValidationResult {
    /// Returns true if there are no errors (warnings are OK)
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn add_error(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.errors.push(ConfigValidationError {
            field: field.into(),
            message: message.into(),
        });
    }

    pub fn add_warning(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.warnings.push(ConfigValidationError {
            field: field.into(),
            message: message.into(),
        });
    }

    /// Get a single-line summary of all errors
    pub fn error_summary(&self) -> String {
        self.errors
            .iter()
            .map(|e| e.to_string())
            .collect::<Vec<_>>()
            .join("; ")
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Directory holding persisted state (last arrival file)
    pub data_dir: PathBuf,

    /// Upstream location feeds
    #[serde(default)]
    pub sources: SourcesConfig,

    /// Fan-out timing
    #[serde(default)]
    pub resolver: ResolverConfig,

    /// Schedule feed window
    #[serde(default)]
    pub calendar: CalendarConfig,

    /// Weather lookup settings
    #[serde(default)]
    pub weather: WeatherConfig,

    /// HTTP retry policy shared by all adapters
    #[serde(default)]
    pub retry: RetrySettings,
}

/// Default upstream endpoints
pub const OPENSKY_URL: &str = "https://opensky-network.org/api";
pub const ADSBFI_URL: &str = "https://api.adsb.fi";
pub const CALENDAR_FEED_URL: &str = "https://media-cdn.factba.se/rss/json/trump/calendar-full.json";
pub const GDELT_URL: &str = "https://api.gdeltproject.org/api/v2/doc/doc";
pub const OPEN_METEO_URL: &str = "https://api.open-meteo.com/v1/forecast";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SourcesConfig {
    pub opensky_url: String,
    pub adsbfi_url: String,
    pub calendar_feed_url: String,
    pub gdelt_url: String,

    /// Per-request timeout for source adapters
    pub request_timeout_secs: u64,

    pub enable_opensky: bool,
    pub enable_adsbfi: bool,
    pub enable_calendar: bool,
    pub enable_newswire: bool,
    pub enable_last_arrival: bool,
}

impl Default for SourcesConfig {
    fn default() -> Self {
        Self {
            opensky_url: OPENSKY_URL.to_string(),
            adsbfi_url: ADSBFI_URL.to_string(),
            calendar_feed_url: CALENDAR_FEED_URL.to_string(),
            gdelt_url: GDELT_URL.to_string(),
            request_timeout_secs: 10,
            enable_opensky: true,
            enable_adsbfi: true,
            enable_calendar: true,
            enable_newswire: true,
            enable_last_arrival: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolverConfig {
    /// Upper bound for a single adapter's fetch
    pub adapter_timeout_secs: u64,

    /// Wall-clock budget for the whole fan-out; late adapters are dropped
    pub overall_budget_secs: u64,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            adapter_timeout_secs: 15,
            overall_budget_secs: 20,
        }
    }
}

impl ResolverConfig {
    pub fn adapter_timeout(&self) -> Duration {
        Duration::from_secs(self.adapter_timeout_secs)
    }

    pub fn overall_budget(&self) -> Duration {
        Duration::from_secs(self.overall_budget_secs)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CalendarConfig {
    /// How far back schedule entries are turned into observations. Entries
    /// past the 72 h staleness window but inside this lookback are the only
    /// schedule entries that can back a stale result.
    pub lookback_hours: u32,

    /// How far ahead schedule entries are kept for overnight inference
    pub lookahead_hours: u32,

    /// In-process feed cache lifetime
    pub cache_minutes: u32,
}

impl Default for CalendarConfig {
    fn default() -> Self {
        Self {
            lookback_hours: 96,
            lookahead_hours: 18,
            cache_minutes: 15,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WeatherConfig {
    /// Open-Meteo forecast endpoint
    pub api_url: String,

    /// Cache lifetime per coordinate bucket
    pub cache_ttl_secs: u64,
}

impl Default for WeatherConfig {
    fn default() -> Self {
        Self {
            api_url: OPEN_METEO_URL.to_string(),
            cache_ttl_secs: 300,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrySettings {
    pub max_retries: u32,
    pub initial_delay_ms: u64,
    pub max_delay_ms: u64,
}

impl Default for RetrySettings {
    fn default() -> Self {
        let defaults = RetryConfig::default();
        Self {
            max_retries: defaults.max_retries,
            initial_delay_ms: defaults.initial_delay.as_millis() as u64,
            max_delay_ms: defaults.max_delay.as_millis() as u64,
        }
    }
}

impl RetrySettings {
    pub fn to_retry_config(&self) -> RetryConfig {
        RetryConfig::new(self.max_retries, self.initial_delay_ms, self.max_delay_ms)
    }
}

fn default_data_dir() -> PathBuf {
    if let Ok(dir) = std::env::var("RAINWATCH_DATA_DIR") {
        return PathBuf::from(dir);
    }
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("rainwatch")
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            sources: SourcesConfig::default(),
            resolver: ResolverConfig::default(),
            calendar: CalendarConfig::default(),
            weather: WeatherConfig::default(),
            retry: RetrySettings::default(),
        }
    }
}

impl Config {
    /// Load configuration from the default location, creating it if missing
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path()?;
        Self::load_from(&config_path)
    }

    /// Load configuration from an explicit path, writing defaults there if absent
    pub fn load_from(config_path: &Path) -> Result<Self> {
        if !config_path.exists() {
            let config = Self::default();
            config.save_to(config_path)?;
            tracing::info!("Wrote default config to {}", config_path.display());
            return Ok(config);
        }

        let contents =
            std::fs::read_to_string(config_path).context("Failed to read config file")?;

        let config: Config = toml::from_str(&contents)
            .map_err(|e| ConfigError::ParseError(e.to_string()))
            .with_context(|| format!("Failed to load {}", config_path.display()))?;

        Ok(config)
    }

    /// Load configuration and validate it
    ///
    /// Warnings are logged; errors fail the load.
    pub fn load_validated(config_path: Option<&Path>) -> Result<(Self, ValidationResult)> {
        let config = match config_path {
            Some(path) => Self::load_from(path)?,
            None => Self::load()?,
        };
        let validation = config.validate();

        if !validation.is_valid() {
            return Err(ConfigError::Invalid(validation.error_summary()).into());
        }

        for warning in &validation.warnings {
            tracing::warn!("Config warning: {}", warning);
        }

        Ok((config, validation))
    }

    pub fn validate(&self) -> ValidationResult {
        let mut result = ValidationResult::default();

        for (field, url) in [
            ("sources.opensky_url", &self.sources.opensky_url),
            ("sources.adsbfi_url", &self.sources.adsbfi_url),
            ("sources.calendar_feed_url", &self.sources.calendar_feed_url),
            ("sources.gdelt_url", &self.sources.gdelt_url),
            ("weather.api_url", &self.weather.api_url),
        ] {
            validate_url(url, field, &mut result);
        }

        if self.sources.request_timeout_secs == 0 {
            result.add_error(
                "sources.request_timeout_secs",
                "Request timeout must be greater than 0",
            );
        }

        if self.resolver.adapter_timeout_secs == 0 {
            result.add_error(
                "resolver.adapter_timeout_secs",
                "Adapter timeout must be greater than 0",
            );
        }

        if self.resolver.overall_budget_secs == 0 {
            result.add_error(
                "resolver.overall_budget_secs",
                "Overall budget must be greater than 0",
            );
        } else if self.resolver.overall_budget_secs < self.resolver.adapter_timeout_secs {
            result.add_warning(
                "resolver.overall_budget_secs",
                "Overall budget is shorter than the adapter timeout; slow sources will be cut off early",
            );
        }

        if self.calendar.lookback_hours < 72 {
            result.add_warning(
                "calendar.lookback_hours",
                "Lookback shorter than the 72h staleness window; stale fallbacks will be unavailable",
            );
        }

        if self.weather.cache_ttl_secs > 3600 {
            result.add_warning(
                "weather.cache_ttl_secs",
                "Weather cache is longer than an hour",
            );
        }

        let enabled = [
            self.sources.enable_opensky,
            self.sources.enable_adsbfi,
            self.sources.enable_calendar,
            self.sources.enable_newswire,
            self.sources.enable_last_arrival,
        ];
        if !enabled.iter().any(|e| *e) {
            result.add_error("sources", "At least one location source must be enabled");
        }

        result
    }

    /// Save configuration to an explicit path
    pub fn save_to(&self, config_path: &Path) -> Result<()> {
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent).context("Failed to create config directory")?;
        }

        let contents = toml::to_string_pretty(self).context("Failed to serialize config")?;

        std::fs::write(config_path, contents).context("Failed to write config file")?;

        Ok(())
    }

    /// Get the path to the default configuration file
    pub fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .context("Failed to get config directory")?
            .join("rainwatch");

        Ok(config_dir.join("config.toml"))
    }
}

fn validate_url(url_str: &str, field_name: &str, result: &mut ValidationResult) {
    match Url::parse(url_str) {
        Ok(url) => {
            if url.scheme() != "http" && url.scheme() != "https" {
                result.add_error(
                    field_name,
                    format!("URL must use http or https scheme, got: {}", url.scheme()),
                );
            }

            if url.host().is_none() {
                result.add_error(field_name, "URL must have a host");
            }

            if url.port() == Some(0) {
                result.add_error(field_name, "Port cannot be 0");
            }
        }
        Err(e) => {
            result.add_error(field_name, format!("Invalid URL: {}", e));
        }
    }
}
