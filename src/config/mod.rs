//! Configuration layer: typed settings with layered precedence (file → env → CLI).

use std::{path::PathBuf, str::FromStr, time::Duration};

use clap::{Args, Parser, Subcommand, builder::BoolishValueParser};
use config::{Config, Environment, File};
use serde::Deserialize;
use thiserror::Error;
use tracing::level_filters::LevelFilter;
use url::Url;

const DEFAULT_CONFIG_BASENAME: &str = "config/default";
const LOCAL_CONFIG_BASENAME: &str = "bayaz";
const DEFAULT_ENDPOINT: &str = "https://cloud.appwrite.io/v1/";
const DEFAULT_POEMS_COLLECTION: &str = "poems";
const DEFAULT_CATEGORIES_COLLECTION: &str = "categories";
const DEFAULT_TTL_SECS: u64 = 30 * 60;
const DEFAULT_FETCH_LIMIT: u32 = 1000;
const DEFAULT_FEATURED_LIMIT: usize = 6;
const DEFAULT_DEBOUNCE_MS: u64 = 250;
const DEFAULT_DURABLE_PATH: &str = "bayaz-cache.db";

/// Command-line arguments for the Bayaz binary.
#[derive(Debug, Parser)]
#[command(name = "bayaz", version, about = "Bayaz poetry cache")]
pub struct CliArgs {
    /// Optional path to a configuration file.
    #[arg(long = "config-file", env = "BAYAZ_CONFIG_FILE", value_name = "PATH")]
    pub config_file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Subcommand, Clone)]
pub enum Command {
    /// Preload every dataset into the cache.
    Warm(WarmArgs),
    /// Filter the cached corpus, fetching it first if needed.
    Search(SearchArgs),
    /// Report cache counters and durable-store contents.
    Stats(StatsArgs),
    /// Empty both cache tiers.
    Clear(ClearArgs),
}

impl Command {
    pub fn overrides(&self) -> &CommonOverrides {
        match self {
            Self::Warm(args) => &args.overrides,
            Self::Search(args) => &args.overrides,
            Self::Stats(args) => &args.overrides,
            Self::Clear(args) => &args.overrides,
        }
    }
}

#[derive(Debug, Args, Default, Clone)]
pub struct WarmArgs {
    #[command(flatten)]
    pub overrides: CommonOverrides,
}

#[derive(Debug, Args, Default, Clone)]
pub struct SearchArgs {
    #[command(flatten)]
    pub overrides: CommonOverrides,

    /// Free-text terms; every term must match somewhere in a poem.
    #[arg(long, value_name = "TEXT")]
    pub query: Option<String>,

    /// Restrict results to one category slug.
    #[arg(long, value_name = "SLUG")]
    pub category: Option<String>,

    /// Bypass any valid cache and refetch from the remote store.
    #[arg(long, action = clap::ArgAction::SetTrue)]
    pub refresh: bool,
}

#[derive(Debug, Args, Default, Clone)]
pub struct StatsArgs {
    #[command(flatten)]
    pub overrides: CommonOverrides,
}

#[derive(Debug, Args, Default, Clone)]
pub struct ClearArgs {
    #[command(flatten)]
    pub overrides: CommonOverrides,
}

#[derive(Debug, Args, Default, Clone)]
pub struct CommonOverrides {
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

    /// Override the remote API endpoint URL.
    #[arg(long = "remote-endpoint", value_name = "URL")]
    pub remote_endpoint: Option<String>,

    /// Override the remote project identifier.
    #[arg(long = "remote-project-id", value_name = "ID")]
    pub remote_project_id: Option<String>,

    /// Override the remote database identifier.
    #[arg(long = "remote-database-id", value_name = "ID")]
    pub remote_database_id: Option<String>,

    /// Override the poems collection identifier.
    #[arg(long = "remote-poems-collection", value_name = "ID")]
    pub remote_poems_collection: Option<String>,

    /// Override the categories collection identifier.
    #[arg(long = "remote-categories-collection", value_name = "ID")]
    pub remote_categories_collection: Option<String>,

    /// Override the remote API key.
    #[arg(long = "remote-api-key", value_name = "KEY", env = "BAYAZ_REMOTE__API_KEY")]
    pub remote_api_key: Option<String>,

    /// Override the poems cache validity window.
    #[arg(long = "cache-poems-ttl-seconds", value_name = "SECONDS")]
    pub cache_poems_ttl_seconds: Option<u64>,

    /// Override the categories cache validity window.
    #[arg(long = "cache-categories-ttl-seconds", value_name = "SECONDS")]
    pub cache_categories_ttl_seconds: Option<u64>,

    /// Override the featured cache validity window.
    #[arg(long = "cache-featured-ttl-seconds", value_name = "SECONDS")]
    pub cache_featured_ttl_seconds: Option<u64>,

    /// Override the maximum corpus fetch size.
    #[arg(long = "cache-fetch-limit", value_name = "COUNT")]
    pub cache_fetch_limit: Option<u32>,

    /// Override the durable cache database path.
    #[arg(long = "cache-durable-path", value_name = "PATH")]
    pub cache_durable_path: Option<PathBuf>,

    /// Disable the durable SQLite tier entirely.
    #[arg(long = "cache-disable-durable", action = clap::ArgAction::SetTrue)]
    pub cache_disable_durable: bool,
}

/// Fully-resolved settings after precedence resolution and validation.
#[derive(Debug, Clone)]
pub struct Settings {
    pub logging: LoggingSettings,
    pub remote: RemoteSettings,
    pub cache: CacheSettings,
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
pub struct RemoteSettings {
    pub endpoint: Url,
    pub project_id: String,
    pub database_id: String,
    pub poems_collection_id: String,
    pub categories_collection_id: String,
    pub api_key: Option<String>,
}

#[derive(Debug, Clone)]
pub struct CacheSettings {
    pub poems_ttl: Duration,
    pub categories_ttl: Duration,
    pub featured_ttl: Duration,
    pub fetch_limit: u32,
    pub featured_limit: usize,
    pub debounce_window: Duration,
    pub durable_path: Option<PathBuf>,
    pub enable_durable: bool,
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

    builder = builder.add_source(Environment::with_prefix("BAYAZ").separator("__"));

    let mut raw: RawSettings = builder.build()?.try_deserialize()?;

    match cli.command.as_ref() {
        Some(command) => raw.apply_overrides(command.overrides()),
        None => raw.apply_overrides(&CommonOverrides::default()),
    }

    Settings::from_raw(raw)
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawSettings {
    logging: RawLoggingSettings,
    remote: RawRemoteSettings,
    cache: RawCacheSettings,
}

impl RawSettings {
    fn apply_overrides(&mut self, overrides: &CommonOverrides) {
        if let Some(level) = overrides.log_level.as_ref() {
            self.logging.level = Some(level.clone());
        }
        if let Some(json) = overrides.log_json {
            self.logging.json = Some(json);
        }
        if let Some(endpoint) = overrides.remote_endpoint.as_ref() {
            self.remote.endpoint = Some(endpoint.clone());
        }
        if let Some(project) = overrides.remote_project_id.as_ref() {
            self.remote.project_id = Some(project.clone());
        }
        if let Some(database) = overrides.remote_database_id.as_ref() {
            self.remote.database_id = Some(database.clone());
        }
        if let Some(collection) = overrides.remote_poems_collection.as_ref() {
            self.remote.poems_collection_id = Some(collection.clone());
        }
        if let Some(collection) = overrides.remote_categories_collection.as_ref() {
            self.remote.categories_collection_id = Some(collection.clone());
        }
        if let Some(key) = overrides.remote_api_key.as_ref() {
            self.remote.api_key = Some(key.clone());
        }
        if let Some(secs) = overrides.cache_poems_ttl_seconds {
            self.cache.poems_ttl_seconds = Some(secs);
        }
        if let Some(secs) = overrides.cache_categories_ttl_seconds {
            self.cache.categories_ttl_seconds = Some(secs);
        }
        if let Some(secs) = overrides.cache_featured_ttl_seconds {
            self.cache.featured_ttl_seconds = Some(secs);
        }
        if let Some(limit) = overrides.cache_fetch_limit {
            self.cache.fetch_limit = Some(limit);
        }
        if let Some(path) = overrides.cache_durable_path.as_ref() {
            self.cache.durable_path = Some(path.clone());
        }
        if overrides.cache_disable_durable {
            self.cache.enable_durable = Some(false);
        }
    }
}

impl Settings {
    fn from_raw(raw: RawSettings) -> Result<Self, LoadError> {
        let RawSettings {
            logging,
            remote,
            cache,
        } = raw;

        let logging = build_logging_settings(logging)?;
        let remote = build_remote_settings(remote)?;
        let cache = build_cache_settings(cache)?;

        Ok(Self {
            logging,
            remote,
            cache,
        })
    }
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

fn build_remote_settings(remote: RawRemoteSettings) -> Result<RemoteSettings, LoadError> {
    let mut endpoint = remote
        .endpoint
        .unwrap_or_else(|| DEFAULT_ENDPOINT.to_string());
    // Url::join treats a path without a trailing slash as a file component.
    if !endpoint.ends_with('/') {
        endpoint.push('/');
    }
    let endpoint = Url::parse(&endpoint)
        .map_err(|err| LoadError::invalid("remote.endpoint", err.to_string()))?;

    let project_id = require_non_empty(remote.project_id, "remote.project_id")?;
    let database_id = require_non_empty(remote.database_id, "remote.database_id")?;

    let poems_collection_id = remote
        .poems_collection_id
        .unwrap_or_else(|| DEFAULT_POEMS_COLLECTION.to_string());
    let categories_collection_id = remote
        .categories_collection_id
        .unwrap_or_else(|| DEFAULT_CATEGORIES_COLLECTION.to_string());

    let api_key = remote.api_key.and_then(|value| {
        let trimmed = value.trim();
        (!trimmed.is_empty()).then(|| trimmed.to_string())
    });

    Ok(RemoteSettings {
        endpoint,
        project_id,
        database_id,
        poems_collection_id,
        categories_collection_id,
        api_key,
    })
}

fn build_cache_settings(cache: RawCacheSettings) -> Result<CacheSettings, LoadError> {
    let poems_ttl = ttl_from_secs(cache.poems_ttl_seconds, "cache.poems_ttl_seconds")?;
    let categories_ttl =
        ttl_from_secs(cache.categories_ttl_seconds, "cache.categories_ttl_seconds")?;
    let featured_ttl = ttl_from_secs(cache.featured_ttl_seconds, "cache.featured_ttl_seconds")?;

    let fetch_limit = cache.fetch_limit.unwrap_or(DEFAULT_FETCH_LIMIT);
    if fetch_limit == 0 {
        return Err(LoadError::invalid(
            "cache.fetch_limit",
            "must be greater than zero",
        ));
    }

    let featured_limit = cache.featured_limit.unwrap_or(DEFAULT_FEATURED_LIMIT);
    if featured_limit == 0 {
        return Err(LoadError::invalid(
            "cache.featured_limit",
            "must be greater than zero",
        ));
    }

    let debounce_window =
        Duration::from_millis(cache.debounce_window_ms.unwrap_or(DEFAULT_DEBOUNCE_MS));

    let enable_durable = cache.enable_durable.unwrap_or(true);
    let durable_path = enable_durable.then(|| {
        cache
            .durable_path
            .unwrap_or_else(|| PathBuf::from(DEFAULT_DURABLE_PATH))
    });

    Ok(CacheSettings {
        poems_ttl,
        categories_ttl,
        featured_ttl,
        fetch_limit,
        featured_limit,
        debounce_window,
        durable_path,
        enable_durable,
    })
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawLoggingSettings {
    level: Option<String>,
    json: Option<bool>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawRemoteSettings {
    endpoint: Option<String>,
    project_id: Option<String>,
    database_id: Option<String>,
    poems_collection_id: Option<String>,
    categories_collection_id: Option<String>,
    api_key: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawCacheSettings {
    poems_ttl_seconds: Option<u64>,
    categories_ttl_seconds: Option<u64>,
    featured_ttl_seconds: Option<u64>,
    fetch_limit: Option<u32>,
    featured_limit: Option<usize>,
    debounce_window_ms: Option<u64>,
    durable_path: Option<PathBuf>,
    enable_durable: Option<bool>,
}

fn ttl_from_secs(value: Option<u64>, key: &'static str) -> Result<Duration, LoadError> {
    let secs = value.unwrap_or(DEFAULT_TTL_SECS);
    if secs == 0 {
        return Err(LoadError::invalid(key, "must be greater than zero"));
    }
    Ok(Duration::from_secs(secs))
}

fn require_non_empty(value: Option<String>, key: &'static str) -> Result<String, LoadError> {
    let value = value.unwrap_or_default();
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(LoadError::invalid(key, "must not be empty"));
    }
    Ok(trimmed.to_string())
}
