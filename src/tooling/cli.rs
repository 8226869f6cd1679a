//! CLI Tooling
//!
//! Read-only inspection of a registry layout served from a local directory.
//! Every command goes through the same driver a registry would use.

use crate::config::{ConfigLoader, DriverConfig};
use crate::driver::{DriverFactory, ShardDriver, StorageDriver};
use crate::error::DriverError;
use crate::store::LocalStore;
use crate::types::FileInfo;
use crate::walk::{WalkControl, WalkOptions};
use chrono::Utc;
use clap::{Parser, Subcommand};
use comfy_table::Table;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;

/// shardfs - read-only registry storage over sharded object keys
#[derive(Parser)]
#[command(name = "shardfs")]
#[command(about = "Inspect a sharded registry layout through the storage driver")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Directory served as the object store
    #[arg(long, default_value = ".")]
    pub root: PathBuf,

    /// Configuration file path (overrides default config loading)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error, off)
    #[arg(long)]
    pub log_level: Option<String>,

    /// Log format (json, text)
    #[arg(long)]
    pub log_format: Option<String>,

    /// Log output (stdout, stderr, file, file+stderr, both)
    #[arg(long)]
    pub log_output: Option<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Walk everything beneath a path in pre-order
    Walk {
        #[arg(default_value = "/")]
        path: String,
        /// Resume after this path
        #[arg(long)]
        start_after: Option<String>,
        /// Directories whose contents are not descended into
        #[arg(long)]
        skip: Vec<String>,
        /// Stop after this many entries
        #[arg(long)]
        limit: Option<u64>,
        /// Output format (text or json)
        #[arg(long, default_value = "text")]
        format: String,
    },
    /// List the direct children of a directory
    List {
        #[arg(default_value = "/")]
        path: String,
        #[arg(long, default_value = "text")]
        format: String,
    },
    /// Show file or directory details
    Stat {
        path: String,
        #[arg(long, default_value = "text")]
        format: String,
    },
    /// Print content from an offset
    Cat {
        path: String,
        #[arg(long, default_value = "0")]
        offset: u64,
    },
    /// Presign a URL for a path
    Url {
        path: String,
        /// GET or HEAD
        #[arg(long)]
        method: Option<String>,
        /// Lifetime in seconds (defaults to the configured expiry)
        #[arg(long)]
        expires_in: Option<i64>,
    },
}

impl Cli {
    /// Resolve configuration and apply command-line logging overrides.
    pub fn load_config(&self) -> Result<DriverConfig, DriverError> {
        let mut config = match &self.config {
            Some(path) => ConfigLoader::load_from_file(path)?,
            None => ConfigLoader::load()?,
        };
        if let Some(level) = &self.log_level {
            config.logging.level = level.clone();
        }
        if let Some(format) = &self.log_format {
            config.logging.format = format.parse()?;
        }
        if let Some(output) = &self.log_output {
            config.logging.output = output.parse()?;
        }
        Ok(config)
    }
}

/// CLI execution context
pub struct CliContext {
    driver: ShardDriver,
}

impl CliContext {
    pub async fn new(root: &Path, config: DriverConfig) -> Result<Self, DriverError> {
        let store = Arc::new(LocalStore::new(root.to_path_buf()));
        let driver = DriverFactory::create(config, store).await?;
        info!(root = %root.display(), "serving local store");
        Ok(Self { driver })
    }

    pub fn driver(&self) -> &ShardDriver {
        &self.driver
    }

    /// Execute a CLI command
    pub async fn execute(&self, command: &Commands) -> Result<String, DriverError> {
        match command {
            Commands::Walk {
                path,
                start_after,
                skip,
                limit,
                format,
            } => {
                let mut entries = Vec::new();
                let mut visitor = |info: &FileInfo| {
                    entries.push(info.clone());
                    if limit.is_some_and(|n| entries.len() as u64 >= n) {
                        WalkControl::Stop
                    } else if info.is_dir && skip.iter().any(|s| *s == info.path) {
                        WalkControl::SkipSubtree
                    } else {
                        WalkControl::Continue
                    }
                };
                let options = WalkOptions {
                    start_after_hint: start_after.clone(),
                };
                let summary = self.driver.walk(path, options, &mut visitor).await?;
                if format == "json" {
                    return to_json(&entries);
                }
                let mut output = format_entries(&entries);
                output.push_str(&format!(
                    "\n{} entries{}",
                    summary.objects_visited,
                    if summary.stopped { " (stopped)" } else { "" }
                ));
                Ok(output)
            }
            Commands::List { path, format } => {
                let children = self.driver.list(path).await?;
                if format == "json" {
                    return to_json(&children);
                }
                Ok(children.join("\n"))
            }
            Commands::Stat { path, format } => {
                let info = self.driver.stat(path).await?;
                if format == "json" {
                    return to_json(&info);
                }
                Ok(format_entries(std::slice::from_ref(&info)))
            }
            Commands::Cat { path, offset } => {
                let bytes = if *offset == 0 {
                    self.driver.get_content(path).await?
                } else {
                    self.driver.reader(path, *offset).await?
                };
                Ok(String::from_utf8_lossy(&bytes).into_owned())
            }
            Commands::Url {
                path,
                method,
                expires_in,
            } => {
                let expiry = expires_in
                    .map(|secs| {
                        chrono::Duration::try_seconds(secs)
                            .and_then(|lifetime| Utc::now().checked_add_signed(lifetime))
                            .ok_or_else(|| {
                                DriverError::Config(format!("expiry of {}s is out of range", secs))
                            })
                    })
                    .transpose()?;
                self.driver.url_for(path, method.as_deref(), expiry).await
            }
        }
    }
}

fn to_json<T: serde::Serialize + ?Sized>(value: &T) -> Result<String, DriverError> {
    serde_json::to_string_pretty(value)
        .map_err(|e| DriverError::Config(format!("failed to render output: {}", e)))
}

fn format_entries(entries: &[FileInfo]) -> String {
    let mut table = Table::new();
    table.load_preset(comfy_table::presets::UTF8_FULL);
    table.set_header(vec!["Path", "Type", "Size", "Modified"]);
    for entry in entries {
        let (kind, size, modified) = if entry.is_dir {
            ("dir", "-".to_string(), "-".to_string())
        } else {
            (
                "file",
                entry.size.to_string(),
                entry
                    .mod_time
                    .map(|t| t.to_rfc3339())
                    .unwrap_or_else(|| "-".to_string()),
            )
        };
        table.add_row(vec![entry.path.clone(), kind.to_string(), size, modified]);
    }
    table.to_string()
}
