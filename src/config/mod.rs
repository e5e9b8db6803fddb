//! Configuration layer: typed settings with layered precedence (file → env → CLI).

use std::{
    env,
    net::SocketAddr,
    num::NonZeroUsize,
    str::FromStr,
    time::Duration,
};

use clap::Parser;
use config::{Config, Environment, File};
use serde::Deserialize;
use thiserror::Error;
use tracing::level_filters::LevelFilter;

use crate::domain::version::{VersionPrefix, VersionSpec};

mod cli;

pub use cli::{CliArgs, Command, ServeArgs, ServeOverrides};

const DEFAULT_CONFIG_BASENAME: &str = "config/default";
const LOCAL_CONFIG_BASENAME: &str = "satchel";
const ENVIRONMENT_VARIABLE: &str = "SATCHEL_ENV";
const DEFAULT_HOST: &str = "127.0.0.1";
const DEFAULT_PORT: u16 = 3000;
const DEFAULT_GRACEFUL_SHUTDOWN_SECS: u64 = 30;
const DEFAULT_ENVIRONMENT: &str = "development";
const DEFAULT_VERSION_MINIMUM: u32 = 1;
const DEFAULT_VERSION_MAXIMUM: u32 = 1;
const DEFAULT_CACHE_MAX_AGE_SECS: u64 = 15 * 60;
const DEFAULT_CACHE_STORE_LIMIT: usize = 10_000;
pub(crate) const DEFAULT_JSONP_PARAMETER: &str = "callback";

/// Fully-resolved deployment settings after precedence resolution and validation.
#[derive(Debug, Clone)]
pub struct Settings {
    pub server: ServerSettings,
    pub logging: LoggingSettings,
    pub api: ApiSettings,
    pub caching: CachingSettings,
    pub jsonp: JsonpSettings,
    pub errors: ErrorSettings,
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
pub struct ApiSettings {
    pub version: VersionSpec,
    pub serializers_enabled: bool,
}

#[derive(Debug, Clone)]
pub struct CachingSettings {
    pub enabled: bool,
    pub max_age: Duration,
    pub store_limit: NonZeroUsize,
}

#[derive(Debug, Clone)]
pub struct JsonpSettings {
    pub enabled: bool,
    pub parameter: String,
}

#[derive(Debug, Clone)]
pub struct ErrorSettings {
    pub environment: String,
    pub show_exception_message: bool,
}

impl ErrorSettings {
    /// Environments where internal error messages are shown by default.
    pub fn is_development_like(&self) -> bool {
        matches!(self.environment.as_str(), "development" | "test")
    }
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

    builder = builder.add_source(Environment::with_prefix("SATCHEL").separator("__"));

    let mut raw: RawSettings = builder.build()?.try_deserialize()?;

    if raw.errors.environment.is_none() {
        raw.errors.environment = env::var(ENVIRONMENT_VARIABLE).ok();
    }

    match cli.command.as_ref() {
        Some(Command::Serve(args)) => raw.apply_serve_overrides(&args.overrides),
        None => raw.apply_serve_overrides(&ServeOverrides::default()),
    }

    Settings::from_raw(raw)
}

/// Resolve configuration using the supplied CLI arguments, returning both for downstream use.
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
    api: RawApiSettings,
    caching: RawCachingSettings,
    jsonp: RawJsonpSettings,
    errors: RawErrorSettings,
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
        if let Some(level) = overrides.log_level.as_ref() {
            self.logging.level = Some(level.clone());
        }
        if let Some(json) = overrides.log_json {
            self.logging.json = Some(json);
        }
        if let Some(enabled) = overrides.caching_enabled {
            self.caching.enabled = Some(enabled);
        }
        if let Some(seconds) = overrides.caching_max_age_seconds {
            self.caching.max_age_secs = Some(seconds);
        }
        if let Some(enabled) = overrides.jsonp_enabled {
            self.jsonp.enabled = Some(enabled);
        }
        if let Some(environment) = overrides.environment.as_ref() {
            self.errors.environment = Some(environment.clone());
        }
    }
}

impl Settings {
    fn from_raw(raw: RawSettings) -> Result<Self, LoadError> {
        let RawSettings {
            server,
            logging,
            api,
            caching,
            jsonp,
            errors,
        } = raw;

        Ok(Self {
            server: build_server_settings(server)?,
            logging: build_logging_settings(logging)?,
            api: build_api_settings(api)?,
            caching: build_caching_settings(caching)?,
            jsonp: build_jsonp_settings(jsonp)?,
            errors: build_error_settings(errors)?,
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

    let addr =
        parse_socket_addr(&host, port).map_err(|reason| LoadError::invalid("server.addr", reason))?;

    let graceful_secs = server
        .graceful_shutdown_seconds
        .unwrap_or(DEFAULT_GRACEFUL_SHUTDOWN_SECS);
    if graceful_secs == 0 {
        return Err(LoadError::invalid(
            "server.graceful_shutdown_seconds",
            "must be greater than zero",
        ));
    }

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

fn build_api_settings(api: RawApiSettings) -> Result<ApiSettings, LoadError> {
    let minimum = api.version_minimum.unwrap_or(DEFAULT_VERSION_MINIMUM);
    let maximum = api.version_maximum.unwrap_or(DEFAULT_VERSION_MAXIMUM);
    if minimum > maximum {
        return Err(LoadError::invalid(
            "api.version_maximum",
            format!("must be at least version_minimum ({minimum})"),
        ));
    }

    let mut version = VersionSpec::new(minimum..=maximum);
    if let Some(text) = api.version_prefix {
        let text = text.trim().to_string();
        if text.is_empty() {
            return Err(LoadError::invalid(
                "api.version_prefix",
                "prefix must not be empty",
            ));
        }
        if text.bytes().any(|byte| byte.is_ascii_digit()) {
            return Err(LoadError::invalid(
                "api.version_prefix",
                "prefix must not contain digits",
            ));
        }
        version = version.with_prefix(VersionPrefix {
            text,
            required: api.version_prefix_required.unwrap_or(false),
        });
    }

    Ok(ApiSettings {
        version,
        serializers_enabled: api.serializers_enabled.unwrap_or(true),
    })
}

fn build_caching_settings(caching: RawCachingSettings) -> Result<CachingSettings, LoadError> {
    let max_age_secs = caching.max_age_secs.unwrap_or(DEFAULT_CACHE_MAX_AGE_SECS);

    let store_limit = caching.store_limit.unwrap_or(DEFAULT_CACHE_STORE_LIMIT);
    let store_limit = NonZeroUsize::new(store_limit)
        .ok_or_else(|| LoadError::invalid("caching.store_limit", "must be greater than zero"))?;

    Ok(CachingSettings {
        enabled: caching.enabled.unwrap_or(false),
        max_age: Duration::from_secs(max_age_secs),
        store_limit,
    })
}

fn build_jsonp_settings(jsonp: RawJsonpSettings) -> Result<JsonpSettings, LoadError> {
    let parameter = jsonp
        .parameter
        .map(|value| value.trim().to_string())
        .unwrap_or_else(|| DEFAULT_JSONP_PARAMETER.to_string());
    if parameter.is_empty() {
        return Err(LoadError::invalid(
            "jsonp.parameter",
            "parameter name must not be empty",
        ));
    }

    Ok(JsonpSettings {
        enabled: jsonp.enabled.unwrap_or(false),
        parameter,
    })
}

fn build_error_settings(errors: RawErrorSettings) -> Result<ErrorSettings, LoadError> {
    let environment = errors
        .environment
        .map(|value| value.trim().to_ascii_lowercase())
        .filter(|value| !value.is_empty())
        .unwrap_or_else(|| DEFAULT_ENVIRONMENT.to_string());

    let mut settings = ErrorSettings {
        environment,
        show_exception_message: false,
    };
    settings.show_exception_message = errors
        .show_exception_message
        .unwrap_or_else(|| settings.is_development_like());

    Ok(settings)
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
struct RawApiSettings {
    version_minimum: Option<u32>,
    version_maximum: Option<u32>,
    version_prefix: Option<String>,
    version_prefix_required: Option<bool>,
    serializers_enabled: Option<bool>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawCachingSettings {
    enabled: Option<bool>,
    max_age_secs: Option<u64>,
    store_limit: Option<usize>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawJsonpSettings {
    enabled: Option<bool>,
    parameter: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawErrorSettings {
    environment: Option<String>,
    show_exception_message: Option<bool>,
}

fn parse_socket_addr(host: &str, port: u16) -> Result<SocketAddr, String> {
    let candidate = format!("{host}:{port}");
    candidate
        .parse()
        .map_err(|err| format!("invalid address `{candidate}`: {err}"))
}

#[cfg(test)]
mod tests;
