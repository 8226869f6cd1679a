//! Logging
//!
//! `tracing` subscriber setup for the driver and CLI. Settings come from
//! [`LoggingConfig`]; `SHARDFS_LOG*` environment variables take precedence.

use crate::error::DriverError;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use tracing_subscriber::fmt::time::ChronoUtc;
use tracing_subscriber::fmt::writer::{BoxMakeWriter, MakeWriterExt};
use tracing_subscriber::{fmt as layer_fmt, layer::SubscriberExt, util::SubscriberInitExt};
use tracing_subscriber::{EnvFilter, Registry};

const ENV_FILTER: &str = "SHARDFS_LOG";
const ENV_FORMAT: &str = "SHARDFS_LOG_FORMAT";
const ENV_OUTPUT: &str = "SHARDFS_LOG_OUTPUT";
const ENV_FILE: &str = "SHARDFS_LOG_FILE";
const ENV_MODULES: &str = "SHARDFS_LOG_MODULES";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

impl FromStr for LogFormat {
    type Err = DriverError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "text" => Ok(LogFormat::Text),
            "json" => Ok(LogFormat::Json),
            other => Err(DriverError::Config(format!(
                "invalid log format '{}' (expected text or json)",
                other
            ))),
        }
    }
}

/// Where log lines go.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum LogOutput {
    #[serde(rename = "stdout")]
    Stdout,
    #[default]
    #[serde(rename = "stderr")]
    Stderr,
    #[serde(rename = "file")]
    File,
    #[serde(rename = "file+stderr")]
    FileAndStderr,
    /// stdout and stderr
    #[serde(rename = "both")]
    Both,
}

impl LogOutput {
    fn writes_file(self) -> bool {
        matches!(self, LogOutput::File | LogOutput::FileAndStderr)
    }
}

impl FromStr for LogOutput {
    type Err = DriverError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "stdout" => Ok(LogOutput::Stdout),
            "stderr" => Ok(LogOutput::Stderr),
            "file" => Ok(LogOutput::File),
            "file+stderr" => Ok(LogOutput::FileAndStderr),
            "both" => Ok(LogOutput::Both),
            other => Err(DriverError::Config(format!(
                "invalid log output '{}' (expected stdout, stderr, file, file+stderr or both)",
                other
            ))),
        }
    }
}

impl fmt::Display for LogOutput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            LogOutput::Stdout => "stdout",
            LogOutput::Stderr => "stderr",
            LogOutput::File => "file",
            LogOutput::FileAndStderr => "file+stderr",
            LogOutput::Both => "both",
        };
        f.write_str(name)
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub enabled: bool,

    /// trace, debug, info, warn, error or off
    pub level: String,

    pub format: LogFormat,

    pub output: LogOutput,

    /// Log file when `output` includes a file
    pub file: Option<PathBuf>,

    /// ANSI colors for text output on terminals
    pub color: bool,

    /// Per-target levels, e.g. `shardfs::walk = "debug"`
    pub modules: HashMap<String, String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            level: "info".to_string(),
            format: LogFormat::Text,
            output: LogOutput::Stderr,
            file: None,
            color: true,
            modules: HashMap::new(),
        }
    }
}

/// Log file location: explicit path, then `SHARDFS_LOG_FILE`, then the
/// configured file, then `shardfs.log` in the platform state directory.
pub fn resolve_log_file_path(
    explicit: Option<PathBuf>,
    configured: Option<PathBuf>,
) -> Result<PathBuf, DriverError> {
    let from_env = std::env::var(ENV_FILE).ok().map(PathBuf::from);
    let chosen = [explicit, from_env, configured]
        .into_iter()
        .flatten()
        .find(|p| !p.as_os_str().is_empty());
    match chosen {
        Some(path) => Ok(path),
        None => default_log_file_path(),
    }
}

fn default_log_file_path() -> Result<PathBuf, DriverError> {
    let dirs = directories::ProjectDirs::from("", "shardfs", "shardfs").ok_or_else(|| {
        DriverError::Config("could not determine a state directory for the log file".to_string())
    })?;
    let base = dirs.state_dir().unwrap_or_else(|| dirs.cache_dir());
    Ok(base.join("shardfs.log"))
}

/// Install the global subscriber.
///
/// Environment variables override the configuration, which overrides the
/// defaults. Fails if the configuration is invalid or the log file cannot be
/// opened.
pub fn init_logging(config: Option<&LoggingConfig>) -> Result<(), DriverError> {
    let defaults = LoggingConfig::default();
    let config = config.unwrap_or(&defaults);

    if !config.enabled {
        Registry::default()
            .with(EnvFilter::new("off"))
            .with(layer_fmt::layer().with_writer(std::io::sink))
            .init();
        return Ok(());
    }

    let filter = build_env_filter(config)?;
    let format = env_override(ENV_FORMAT)?.unwrap_or(config.format);
    let output = env_override(ENV_OUTPUT)?.unwrap_or(config.output);
    let writer = build_writer(output, config.file.clone())?;

    let subscriber = Registry::default().with(filter);
    match format {
        LogFormat::Json => subscriber
            .with(
                layer_fmt::layer()
                    .json()
                    .with_target(true)
                    .with_timer(ChronoUtc::rfc_3339())
                    .with_writer(writer),
            )
            .init(),
        LogFormat::Text => subscriber
            .with(
                layer_fmt::layer()
                    .with_target(true)
                    .with_timer(ChronoUtc::rfc_3339())
                    .with_ansi(config.color && !output.writes_file())
                    .with_writer(writer),
            )
            .init(),
    }
    Ok(())
}

fn env_override<T: FromStr<Err = DriverError>>(var: &str) -> Result<Option<T>, DriverError> {
    match std::env::var(var) {
        Ok(value) if !value.is_empty() => value.parse().map(Some),
        _ => Ok(None),
    }
}

fn build_writer(output: LogOutput, configured: Option<PathBuf>) -> Result<BoxMakeWriter, DriverError> {
    let writer = match output {
        LogOutput::Stdout => BoxMakeWriter::new(std::io::stdout),
        LogOutput::Stderr => BoxMakeWriter::new(std::io::stderr),
        LogOutput::Both => BoxMakeWriter::new(std::io::stdout.and(std::io::stderr)),
        LogOutput::File => BoxMakeWriter::new(open_log_file(configured)?),
        LogOutput::FileAndStderr => {
            BoxMakeWriter::new(open_log_file(configured)?.and(std::io::stderr))
        }
    };
    Ok(writer)
}

fn open_log_file(configured: Option<PathBuf>) -> Result<std::fs::File, DriverError> {
    let path = resolve_log_file_path(None, configured)?;
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| {
            DriverError::Config(format!("failed to create log directory {}: {}", parent.display(), e))
        })?;
    }
    std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .map_err(|e| DriverError::Config(format!("failed to open log file {}: {}", path.display(), e)))
}

fn build_env_filter(config: &LoggingConfig) -> Result<EnvFilter, DriverError> {
    if let Ok(filter) = EnvFilter::try_from_env(ENV_FILTER) {
        return Ok(filter);
    }
    if config.level == "off" {
        return Ok(EnvFilter::new("off"));
    }

    let mut directives: Vec<String> = config
        .modules
        .iter()
        .map(|(target, level)| format!("{}={}", target, level))
        .collect();
    if let Ok(spec) = std::env::var(ENV_MODULES) {
        directives.extend(
            spec.split(',')
                .filter_map(|part| part.split_once('='))
                .map(|(target, level)| format!("{}={}", target.trim(), level.trim())),
        );
    }

    let mut filter = EnvFilter::new(&config.level);
    for directive in directives {
        let parsed = directive.parse().map_err(|e| {
            DriverError::Config(format!("invalid log directive '{}': {}", directive, e))
        })?;
        filter = filter.add_directive(parsed);
    }
    Ok(filter)
}
