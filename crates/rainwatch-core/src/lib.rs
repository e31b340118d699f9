pub mod config;
pub mod error;
pub mod retry;

pub use config::{
    CalendarConfig, Config, ResolverConfig, RetrySettings, SourcesConfig, ValidationResult,
    WeatherConfig,
};
pub use error::{ConfigError, NetworkError, ReqwestErrorExt};
pub use retry::{with_retry, RetryConfig, RetryDecision};

use anyhow::Result;

/// User-Agent sent with every outbound request.
pub const USER_AGENT: &str = concat!(
    "rainwatch/",
    env!("CARGO_PKG_VERSION"),
    " (+https://github.com/rainwatch/rainwatch)"
);

/// Initialize logging for the process
pub fn init() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to install tracing subscriber: {}", e))?;

    tracing::info!("rainwatch core initialized");
    Ok(())
}
