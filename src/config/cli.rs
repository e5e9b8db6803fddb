use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, builder::BoolishValueParser};

/// Command-line arguments for the satchel binary.
#[derive(Debug, Parser)]
#[command(name = "satchel", version, about = "Satchel demo API server")]
pub struct CliArgs {
    /// Optional path to a configuration file.
    #[arg(long = "config-file", env = "SATCHEL_CONFIG_FILE", value_name = "PATH")]
    pub config_file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Subcommand, Clone)]
pub enum Command {
    /// Run the demo HTTP API.
    Serve(Box<ServeArgs>),
}

#[derive(Debug, Args, Default, Clone)]
pub struct ServeArgs {
    #[command(flatten)]
    pub overrides: ServeOverrides,
}

#[derive(Debug, Args, Default, Clone)]
pub struct ServeOverrides {
    /// Override the listener host.
    #[arg(long = "server-host", value_name = "HOST")]
    pub server_host: Option<String>,

    /// Override the listener port.
    #[arg(long = "server-port", value_name = "PORT")]
    pub server_port: Option<u16>,

    /// Override the graceful shutdown timeout.
    #[arg(long = "server-graceful-shutdown-seconds", value_name = "SECONDS")]
    pub server_graceful_shutdown_seconds: Option<u64>,

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

    /// Toggle ETag / Cache-Control headers for cached actions.
    #[arg(
        long = "caching-enabled",
        value_name = "BOOL",
        value_parser = BoolishValueParser::new()
    )]
    pub caching_enabled: Option<bool>,

    /// Override the max-age for cached collection responses.
    #[arg(long = "caching-max-age-seconds", value_name = "SECONDS")]
    pub caching_max_age_seconds: Option<u64>,

    /// Toggle JSONP wrapping for the root controller.
    #[arg(
        long = "jsonp-enabled",
        value_name = "BOOL",
        value_parser = BoolishValueParser::new()
    )]
    pub jsonp_enabled: Option<bool>,

    /// Override the deployment environment name (development|test|production|...).
    #[arg(long = "environment", value_name = "NAME")]
    pub environment: Option<String>,
}
