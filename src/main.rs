use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::Utc;
use rainwatch_calendar::CalendarClient;
use rainwatch_core::Config;
use rainwatch_resolver::sources::{
    AdsbFiSource, ArrivalCache, CalendarSource, LastArrivalSource, NewswireSource, OpenSkySource,
};
use rainwatch_resolver::{RainReport, Resolver};
use rainwatch_weather::WeatherProvider;

/// Wire every enabled source into a resolver.
fn build_resolver(config: &Config, arrivals: &ArrivalCache) -> Result<Resolver> {
    let sources = &config.sources;
    let timeout = Duration::from_secs(sources.request_timeout_secs);
    let retry = config.retry.to_retry_config();
    let mut resolver = Resolver::from_config(&config.resolver);

    if sources.enable_opensky {
        resolver.add_source(Arc::new(OpenSkySource::new(
            &sources.opensky_url,
            timeout,
            retry.clone(),
        )?));
    }

    if sources.enable_adsbfi {
        resolver.add_source(Arc::new(AdsbFiSource::new(
            &sources.adsbfi_url,
            timeout,
            retry.clone(),
        )?));
    }

    if sources.enable_calendar {
        let client = CalendarClient::new(
            &sources.calendar_feed_url,
            timeout,
            Duration::from_secs(u64::from(config.calendar.cache_minutes) * 60),
            retry.clone(),
        )?;
        resolver.add_source(Arc::new(CalendarSource::new(
            client,
            config.calendar.lookback_hours,
            config.calendar.lookahead_hours,
        )));
    }

    if sources.enable_newswire {
        resolver.add_source(Arc::new(NewswireSource::new(
            &sources.gdelt_url,
            timeout,
            retry,
        )?));
    }

    if sources.enable_last_arrival {
        resolver.add_source(Arc::new(LastArrivalSource::new(arrivals.clone())));
    }

    Ok(resolver)
}

#[tokio::main]
async fn main() -> Result<()> {
    rainwatch_core::init()?;

    let config_path = std::env::args().nth(1).map(PathBuf::from);
    let (config, _) = Config::load_validated(config_path.as_deref())?;
    tracing::info!("Data directory: {}", config.data_dir.display());

    let arrivals = ArrivalCache::new(&config.data_dir);
    let resolver = build_resolver(&config, &arrivals).context("Failed to set up location sources")?;
    tracing::info!("Location sources: {}", resolver.source_names().join(", "));

    let weather = WeatherProvider::new(
        &config.weather.api_url,
        Duration::from_secs(config.sources.request_timeout_secs),
        Duration::from_secs(config.weather.cache_ttl_secs),
        config.retry.to_retry_config(),
    )
    .context("Failed to set up weather client")?;

    let now = Utc::now();
    let resolution = resolver.resolve(now).await;
    if let Ok(result) = &resolution {
        if let Err(e) = arrivals.record_landing(result) {
            tracing::warn!("Failed to record arrival: {}", e);
        }
    }

    let report = RainReport::build(&resolution, &weather, now).await;
    println!("{}", serde_json::to_string_pretty(&report)?);

    Ok(())
}
