//! Configuration layer: typed settings with layered precedence (file → env → CLI).

use std::{net::SocketAddr, path::PathBuf, str::FromStr, time::Duration};

use chrono_tz::Tz;
use clap::{Args, Parser, Subcommand, builder::BoolishValueParser};
use config::{Config, Environment, File};
use serde::Deserialize;
use thiserror::Error;
use tracing::level_filters::LevelFilter;
use url::Url;

use crate::application::sources::ListingSource;
use crate::cache::DEFAULT_TTL_SECS;
use crate::domain::collate::DEFAULT_RESULT_CEILING;
use crate::domain::races::Distance;
use crate::infra::scrape::DEFAULT_USER_AGENT;

const DEFAULT_CONFIG_BASENAME: &str = "config/default";
const LOCAL_CONFIG_BASENAME: &str = "racefinder";
const ENV_PREFIX: &str = "RACEFINDER";
const DEFAULT_HOST: &str = "127.0.0.1";
const DEFAULT_PORT: u16 = 3000;
const DEFAULT_GRACEFUL_SHUTDOWN_SECS: u64 = 30;
const DEFAULT_SCRAPE_TIMEOUT_SECS: u64 = 10;
const DEFAULT_SCRAPE_RETRIES: u32 = 1;
const DEFAULT_SCRAPE_BACKOFF_MILLIS: u64 = 1_000;
const DEFAULT_TIMEZONE: &str = "America/Los_Angeles";
const DEFAULT_SOURCES: &[(Distance, &str)] = &[
    (Distance::Half, "https://www.ironman.com/ironman-70-3-events"),
    (Distance::Full, "https://www.ironman.com/ironman-events"),
];

/// Command-line arguments for the racefinder binary.
#[derive(Debug, Parser)]
#[command(name = "racefinder", version, about = "Triathlon race listing aggregator")]
pub struct CliArgs {
    /// Optional path to a configuration file.
    #[arg(long = "config-file", env = "RACEFINDER_CONFIG_FILE", value_name = "PATH")]
    pub config_file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Subcommand, Clone)]
pub enum Command {
    /// Run the race listing HTTP service.
    Serve(Box<ServeArgs>),
    /// Aggregate all sources once and print the races as JSON.
    Scrape(ScrapeArgs),
}

#[derive(Debug, Args, Default, Clone)]
pub struct ServeArgs {
    #[command(flatten)]
    pub overrides: ServeOverrides,
}

#[derive(Debug, Args, Default, Clone)]
pub struct ScrapeArgs {
    #[command(flatten)]
    pub overrides: ScrapeOverrides,

    /// Pretty-print the JSON output.
    #[arg(long, action = clap::ArgAction::SetTrue)]
    pub pretty: bool,
}

#[derive(Debug, Args, Default, Clone)]
pub struct ScrapeOverrides {
    /// Override the per-request upstream timeout.
    #[arg(long = "scrape-timeout-seconds", value_name = "SECONDS")]
    pub timeout_seconds: Option<u64>,

    /// Override the number of retries after a failed fetch.
    #[arg(long = "scrape-retries", value_name = "COUNT")]
    pub retries: Option<u32>,

    /// Override the linear retry backoff unit.
    #[arg(long = "scrape-backoff-millis", value_name = "MILLIS")]
    pub backoff_millis: Option<u64>,

    /// Override the IANA zone that defines "today" for the date window.
    #[arg(long = "scrape-timezone", value_name = "ZONE")]
    pub timezone: Option<String>,

    /// Override the base log level (trace|debug|info|warn|error).
    #[arg(long = "log-level", value_name = "LEVEL")]
    pub log_level: Option<String>,

    /// Toggle JSON logging.
    #[arg(
        long = "log-json",
        value_name = "BOOL",
        value_parser = BoolishValueParser::new()
    )]
    pub log_json: Option<bool>,
}

#[derive(Debug, Args, Default, Clone)]
pub struct ServeOverrides {
    #[command(flatten)]
    pub scrape: ScrapeOverrides,

    /// Override the listener host.
    #[arg(long = "server-host", value_name = "HOST")]
    pub server_host: Option<String>,

    /// Override the listener port.
    #[arg(long = "server-port", value_name = "PORT")]
    pub server_port: Option<u16>,

    /// Override the graceful shutdown timeout.
    #[arg(long = "server-graceful-shutdown-seconds", value_name = "SECONDS")]
    pub server_graceful_shutdown_seconds: Option<u64>,

    /// Override how long an aggregation is served from cache.
    #[arg(long = "cache-ttl-seconds", value_name = "SECONDS")]
    pub cache_ttl_seconds: Option<u64>,
}

/// Fully-resolved deployment settings after precedence resolution and validation.
#[derive(Debug, Clone)]
pub struct Settings {
    pub server: ServerSettings,
    pub logging: LoggingSettings,
    pub scrape: ScrapeSettings,
    pub cache: CacheSettings,
    pub sources: Vec<ListingSource>,
}

#[derive(Debug, Clone)]
pub struct ServerSettings {
    pub addr: SocketAddr,
    pub graceful_shutdown: Duration,
}

#[derive(Debug, Clone)]
pub struct LoggingSettings {
    pub level: LevelFilter,
    pub format: LogFormat,
}

#[derive(Debug, Clone, Copy)]
pub enum LogFormat {
    Json,
    Compact,
}

#[derive(Debug, Clone)]
pub struct ScrapeSettings {
    pub timeout: Duration,
    pub retries: u32,
    pub backoff: Duration,
    pub user_agent: String,
    pub timezone: Tz,
    pub result_ceiling: usize,
}

#[derive(Debug, Clone)]
pub struct CacheSettings {
    pub ttl: Duration,
}

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to build configuration: {0}")]
    Build(#[from] config::ConfigError),
    #[error("invalid configuration for `{key}`: {reason}")]
    Invalid { key: &'static str, reason: String },
}

impl LoadError {
    fn invalid(key: &'static str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            key,
            reason: reason.into(),
        }
    }
}

/// Load settings using the configured precedence (file → environment → CLI).
pub fn load(cli: &CliArgs) -> Result<Settings, LoadError> {
    let mut builder = Config::builder()
        .add_source(File::with_name(DEFAULT_CONFIG_BASENAME).required(false))
        .add_source(File::with_name(LOCAL_CONFIG_BASENAME).required(false));

    if let Some(path) = cli.config_file.as_ref() {
        builder = builder.add_source(File::from(path.as_path()).required(true));
    }

    builder = builder.add_source(Environment::with_prefix(ENV_PREFIX).separator("__"));

    let mut raw: RawSettings = builder.build()?.try_deserialize()?;

    match cli.command.as_ref() {
        Some(Command::Serve(args)) => raw.apply_serve_overrides(&args.overrides),
        Some(Command::Scrape(args)) => raw.apply_scrape_overrides(&args.overrides),
        None => raw.apply_serve_overrides(&ServeOverrides::default()),
    }

    Settings::from_raw(raw)
}

pub fn load_with_cli() -> Result<(CliArgs, Settings), LoadError> {
    let args = CliArgs::parse();
    let settings = load(&args)?;
    Ok((args, settings))
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawSettings {
    server: RawServerSettings,
    logging: RawLoggingSettings,
    scrape: RawScrapeSettings,
    cache: RawCacheSettings,
    sources: Option<Vec<RawSourceSettings>>,
}

impl RawSettings {
    fn apply_serve_overrides(&mut self, overrides: &ServeOverrides) {
        if let Some(host) = overrides.server_host.as_ref() {
            self.server.host = Some(host.clone());
        }
        if let Some(port) = overrides.server_port {
            self.server.port = Some(port);
        }
        if let Some(seconds) = overrides.server_graceful_shutdown_seconds {
            self.server.graceful_shutdown_seconds = Some(seconds);
        }
        if let Some(seconds) = overrides.cache_ttl_seconds {
            self.cache.ttl_seconds = Some(seconds);
        }
        self.apply_scrape_overrides(&overrides.scrape);
    }

    fn apply_scrape_overrides(&mut self, overrides: &ScrapeOverrides) {
        if let Some(seconds) = overrides.timeout_seconds {
            self.scrape.timeout_seconds = Some(seconds);
        }
        if let Some(retries) = overrides.retries {
            self.scrape.retries = Some(retries);
        }
        if let Some(millis) = overrides.backoff_millis {
            self.scrape.backoff_millis = Some(millis);
        }
        if let Some(zone) = overrides.timezone.as_ref() {
            self.scrape.timezone = Some(zone.clone());
        }
        if let Some(level) = overrides.log_level.as_ref() {
            self.logging.level = Some(level.clone());
        }
        if let Some(json) = overrides.log_json {
            self.logging.json = Some(json);
        }
    }
}

impl Settings {
    fn from_raw(raw: RawSettings) -> Result<Self, LoadError> {
        let RawSettings {
            server,
            logging,
            scrape,
            cache,
            sources,
        } = raw;

        Ok(Self {
            server: build_server_settings(server)?,
            logging: build_logging_settings(logging)?,
            scrape: build_scrape_settings(scrape)?,
            cache: build_cache_settings(cache)?,
            sources: build_sources(sources)?,
        })
    }
}

fn build_server_settings(server: RawServerSettings) -> Result<ServerSettings, LoadError> {
    let host = server.host.unwrap_or_else(|| DEFAULT_HOST.to_string());
    let port = server.port.unwrap_or(DEFAULT_PORT);
    if port == 0 {
        return Err(LoadError::invalid(
            "server.port",
            "port must be greater than zero",
        ));
    }

    let addr = parse_socket_addr(&host, port)
        .map_err(|reason| LoadError::invalid("server.addr", reason))?;

    let graceful_secs = non_zero(
        server
            .graceful_shutdown_seconds
            .unwrap_or(DEFAULT_GRACEFUL_SHUTDOWN_SECS),
        "server.graceful_shutdown_seconds",
    )?;

    Ok(ServerSettings {
        addr,
        graceful_shutdown: Duration::from_secs(graceful_secs),
    })
}

fn build_logging_settings(logging: RawLoggingSettings) -> Result<LoggingSettings, LoadError> {
    let level = match logging.level {
        Some(level) => LevelFilter::from_str(level.as_str()).map_err(|err| {
            LoadError::invalid("logging.level", format!("failed to parse: {err}"))
        })?,
        None => LevelFilter::INFO,
    };

    let format = if logging.json.unwrap_or(false) {
        LogFormat::Json
    } else {
        LogFormat::Compact
    };

    Ok(LoggingSettings { level, format })
}

fn build_scrape_settings(scrape: RawScrapeSettings) -> Result<ScrapeSettings, LoadError> {
    let timeout_secs = non_zero(
        scrape.timeout_seconds.unwrap_or(DEFAULT_SCRAPE_TIMEOUT_SECS),
        "scrape.timeout_seconds",
    )?;

    let user_agent = scrape
        .user_agent
        .map(|value| value.trim().to_string())
        .unwrap_or_else(|| DEFAULT_USER_AGENT.to_string());
    if user_agent.is_empty() {
        return Err(LoadError::invalid("scrape.user_agent", "must not be empty"));
    }

    let zone = scrape
        .timezone
        .unwrap_or_else(|| DEFAULT_TIMEZONE.to_string());
    let timezone = zone.trim().parse::<Tz>().map_err(|_| {
        LoadError::invalid("scrape.timezone", format!("unknown IANA zone `{zone}`"))
    })?;

    let ceiling = non_zero(
        scrape
            .result_ceiling
            .unwrap_or(DEFAULT_RESULT_CEILING as u64),
        "scrape.result_ceiling",
    )?;
    let result_ceiling = usize::try_from(ceiling).map_err(|_| {
        LoadError::invalid(
            "scrape.result_ceiling",
            "value exceeds supported range for usize",
        )
    })?;

    Ok(ScrapeSettings {
        timeout: Duration::from_secs(timeout_secs),
        retries: scrape.retries.unwrap_or(DEFAULT_SCRAPE_RETRIES),
        backoff: Duration::from_millis(
            scrape
                .backoff_millis
                .unwrap_or(DEFAULT_SCRAPE_BACKOFF_MILLIS),
        ),
        user_agent,
        timezone,
        result_ceiling,
    })
}

fn build_cache_settings(cache: RawCacheSettings) -> Result<CacheSettings, LoadError> {
    let ttl_secs = non_zero(
        cache.ttl_seconds.unwrap_or(DEFAULT_TTL_SECS),
        "cache.ttl_seconds",
    )?;
    Ok(CacheSettings {
        ttl: Duration::from_secs(ttl_secs),
    })
}

fn build_sources(sources: Option<Vec<RawSourceSettings>>) -> Result<Vec<ListingSource>, LoadError> {
    let Some(sources) = sources else {
        return DEFAULT_SOURCES
            .iter()
            .map(|(distance, url)| {
                Url::parse(url)
                    .map(|url| ListingSource::new(*distance, url))
                    .map_err(|err| LoadError::invalid("sources.url", err.to_string()))
            })
            .collect();
    };

    if sources.is_empty() {
        return Err(LoadError::invalid(
            "sources",
            "at least one listing source is required",
        ));
    }

    sources
        .into_iter()
        .map(|source| {
            let label = source
                .distance
                .ok_or_else(|| LoadError::invalid("sources.distance", "missing value"))?;
            let distance = parse_distance(&label).ok_or_else(|| {
                LoadError::invalid(
                    "sources.distance",
                    format!("expected `70.3` or `Full`, got `{label}`"),
                )
            })?;

            let raw_url = source
                .url
                .ok_or_else(|| LoadError::invalid("sources.url", "missing value"))?;
            let url = Url::parse(raw_url.trim()).map_err(|err| {
                LoadError::invalid("sources.url", format!("invalid url `{raw_url}`: {err}"))
            })?;
            if !matches!(url.scheme(), "http" | "https") {
                return Err(LoadError::invalid(
                    "sources.url",
                    format!("`{raw_url}` must use http or https"),
                ));
            }

            Ok(ListingSource::new(distance, url))
        })
        .collect()
}

fn parse_distance(label: &str) -> Option<Distance> {
    match label.trim().to_ascii_lowercase().as_str() {
        "70.3" | "half" => Some(Distance::Half),
        "full" => Some(Distance::Full),
        _ => None,
    }
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawServerSettings {
    host: Option<String>,
    port: Option<u16>,
    graceful_shutdown_seconds: Option<u64>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawLoggingSettings {
    level: Option<String>,
    json: Option<bool>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawScrapeSettings {
    timeout_seconds: Option<u64>,
    retries: Option<u32>,
    backoff_millis: Option<u64>,
    user_agent: Option<String>,
    timezone: Option<String>,
    result_ceiling: Option<u64>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawCacheSettings {
    ttl_seconds: Option<u64>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawSourceSettings {
    distance: Option<String>,
    url: Option<String>,
}

fn parse_socket_addr(host: &str, port: u16) -> Result<SocketAddr, String> {
    let candidate = format!("{host}:{port}");
    candidate
        .parse()
        .map_err(|err| format!("invalid address `{candidate}`: {err}"))
}

fn non_zero(value: u64, key: &'static str) -> Result<u64, LoadError> {
    if value == 0 {
        return Err(LoadError::invalid(key, "must be greater than zero"));
    }
    Ok(value)
}
