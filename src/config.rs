//! Configuration module for the speedtest server.
//!
//! Supports command-line arguments, environment variables, and a TOML
//! configuration file. CLI arguments (and their environment fallbacks) take
//! precedence over config file values.

use clap::Parser;
use serde::Deserialize;
use std::path::PathBuf;
use thiserror::Error;

/// Environment variable holding the listen port.
pub const PORT_ENV: &str = "FUNCTIONS_CUSTOMHANDLER_PORT";

/// Build type baked in at compile time (`BUILD_TYPE=release cargo build`).
const BUILD_TYPE: Option<&str> = option_env!("BUILD_TYPE");

/// Build version baked in at compile time, if any.
const BUILD_VERSION: Option<&str> = option_env!("BUILD_VERSION");

/// Command-line arguments for the speedtest server
#[derive(Parser, Debug)]
#[command(name = "mb-speedtest")]
#[command(author = "mb-speedtest authors")]
#[command(version)]
#[command(about = "An HTTP bandwidth-test server", long_about = None)]
pub struct CliArgs {
    /// Path to TOML configuration file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Address to bind to (e.g., 0.0.0.0)
    #[arg(long)]
    pub host: Option<String>,

    /// Port to listen on
    #[arg(short, long, env = PORT_ENV)]
    pub port: Option<u16>,

    /// Number of runtime worker threads (defaults to number of CPU cores)
    #[arg(short = 'w', long)]
    pub workers: Option<usize>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long)]
    pub log_level: Option<String>,
}

/// TOML configuration file structure
#[derive(Debug, Deserialize, Default)]
pub struct TomlConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Server-related configuration
#[derive(Debug, Deserialize)]
pub struct ServerConfig {
    /// Address to bind to
    #[serde(default = "default_host")]
    pub host: String,
    /// Port to listen on
    #[serde(default = "default_port")]
    pub port: u16,
    /// Number of worker threads
    pub workers: Option<usize>,
    /// Listen backlog
    #[serde(default = "default_backlog")]
    pub backlog: i32,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            workers: None,
            backlog: default_backlog(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Deserialize, Default)]
pub struct LoggingConfig {
    /// Log level; falls back to the build mode default
    pub level: Option<String>,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_backlog() -> i32 {
    1024
}

/// Compile-time build flavor. Only affects logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildMode {
    Release,
    Default,
}

impl BuildMode {
    /// Mode selected by the `BUILD_TYPE` compile-time variable.
    pub fn current() -> Self {
        Self::from_build_type(BUILD_TYPE)
    }

    fn from_build_type(build_type: Option<&str>) -> Self {
        match build_type {
            Some("release") => BuildMode::Release,
            _ => BuildMode::Default,
        }
    }

    /// Log level used when none is configured.
    pub fn default_log_level(self) -> &'static str {
        match self {
            BuildMode::Release => "info",
            BuildMode::Default => "debug",
        }
    }
}

/// Version string reported at startup.
pub fn build_version() -> &'static str {
    BUILD_VERSION.unwrap_or(env!("CARGO_PKG_VERSION"))
}

/// Final resolved configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub workers: usize,
    pub backlog: i32,
    pub log_level: String,
    pub build_mode: BuildMode,
}

impl Config {
    /// Load configuration from CLI args, environment, and optional TOML file.
    pub fn load() -> Result<Self, ConfigError> {
        let cli = CliArgs::parse();

        let toml_config = if let Some(ref config_path) = cli.config {
            let contents = std::fs::read_to_string(config_path)
                .map_err(|e| ConfigError::FileRead(config_path.clone(), e))?;
            toml::from_str(&contents)
                .map_err(|e| ConfigError::TomlParse(config_path.clone(), e))?
        } else {
            TomlConfig::default()
        };

        Ok(Self::merge(cli, toml_config, BuildMode::current()))
    }

    /// Merge CLI args over TOML values (CLI takes precedence).
    fn merge(cli: CliArgs, toml_config: TomlConfig, build_mode: BuildMode) -> Self {
        Config {
            host: cli.host.unwrap_or(toml_config.server.host),
            port: cli.port.unwrap_or(toml_config.server.port),
            workers: cli
                .workers
                .or(toml_config.server.workers)
                .filter(|&n| n > 0)
                .unwrap_or_else(num_cpus),
            backlog: toml_config.server.backlog,
            log_level: cli
                .log_level
                .or(toml_config.logging.level)
                .unwrap_or_else(|| build_mode.default_log_level().to_string()),
            build_mode,
        }
    }

    /// `host:port` string for binding.
    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn num_cpus() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
}

/// Configuration loading errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file '{}': {}", .0.display(), .1)]
    FileRead(PathBuf, #[source] std::io::Error),
    #[error("Failed to parse config file '{}': {}", .0.display(), .1)]
    TomlParse(PathBuf, #[source] toml::de::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    fn no_cli() -> CliArgs {
        CliArgs {
            config: None,
            host: None,
            port: None,
            workers: None,
            log_level: None,
        }
    }

    #[test]
    fn test_default_config() {
        let config = Config::merge(no_cli(), TomlConfig::default(), BuildMode::Default);
        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.port, 8080);
        assert_eq!(config.backlog, 1024);
        assert!(config.workers >= 1);
        assert_eq!(config.log_level, "debug");
        assert_eq!(config.listen_addr(), "0.0.0.0:8080");
    }

    #[test]
    fn test_release_mode_log_level() {
        let config = Config::merge(no_cli(), TomlConfig::default(), BuildMode::Release);
        assert_eq!(config.log_level, "info");
    }

    #[test]
    fn test_build_mode_selection() {
        assert_eq!(BuildMode::from_build_type(Some("release")), BuildMode::Release);
        assert_eq!(BuildMode::from_build_type(Some("debug")), BuildMode::Default);
        assert_eq!(BuildMode::from_build_type(None), BuildMode::Default);
    }

    #[test]
    fn test_toml_parsing() {
        let toml_str = r#"
            [server]
            host = "127.0.0.1"
            port = 9000
            workers = 4
            backlog = 256

            [logging]
            level = "warn"
        "#;

        let config: TomlConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.server.workers, Some(4));
        assert_eq!(config.server.backlog, 256);
        assert_eq!(config.logging.level.as_deref(), Some("warn"));
    }

    #[test]
    fn test_cli_overrides_toml() {
        let toml_config: TomlConfig = toml::from_str(
            r#"
            [server]
            port = 9000
            workers = 4
            "#,
        )
        .unwrap();

        let cli = CliArgs::parse_from(["mb-speedtest", "--port", "7070", "--log-level", "trace"]);
        let config = Config::merge(cli, toml_config, BuildMode::Release);
        assert_eq!(config.port, 7070);
        assert_eq!(config.workers, 4);
        assert_eq!(config.log_level, "trace");
    }

    #[test]
    fn test_config_error_messages() {
        let err = ConfigError::FileRead(
            PathBuf::from("/etc/speedtest.toml"),
            std::io::Error::new(std::io::ErrorKind::NotFound, "missing"),
        );
        assert_eq!(
            err.to_string(),
            "Failed to read config file '/etc/speedtest.toml': missing"
        );
        assert!(std::error::Error::source(&err).is_some());

        let parse_err = toml::from_str::<TomlConfig>("[server]\nport = \"x\"").unwrap_err();
        let expected = format!("Failed to parse config file 'bad.toml': {parse_err}");
        let err = ConfigError::TomlParse(PathBuf::from("bad.toml"), parse_err);
        assert_eq!(err.to_string(), expected);
    }

    #[test]
    fn test_zero_workers_means_auto() {
        let cli = CliArgs::parse_from(["mb-speedtest", "-w", "0"]);
        let config = Config::merge(cli, TomlConfig::default(), BuildMode::Default);
        assert!(config.workers >= 1);
    }
}
