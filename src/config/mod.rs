//! Driver Configuration
//!
//! Layered configuration for the storage driver: built-in defaults, an
//! optional config file, then `SHARDFS__*` environment variables.

pub mod facade;
pub mod merge;
pub mod sources;

pub use facade::ConfigLoader;

use crate::error::DriverError;
use crate::logging::LoggingConfig;
use crate::store::LIST_MAX;
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub(crate) fn default_list_page_size() -> usize {
    LIST_MAX
}

/// Longest presigned URL lifetime accepted, seven days.
pub const MAX_PRESIGN_EXPIRY_SECS: u64 = 7 * 24 * 60 * 60;

pub(crate) fn default_presign_expiry_secs() -> u64 {
    20 * 60
}

/// Storage driver configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DriverConfig {
    /// Bucket holding the object key space
    #[serde(default)]
    pub bucket: String,

    /// Prefix prepended to every physical key
    #[serde(default)]
    pub root_directory: String,

    /// Path of the metadata bootstrap object, relative to the root directory
    #[serde(default)]
    pub metadata_path: String,

    /// Keys requested per list call (1..=1000)
    #[serde(default = "default_list_page_size")]
    pub list_page_size: usize,

    /// Lifetime of presigned URLs when the caller gives no expiry
    #[serde(default = "default_presign_expiry_secs")]
    pub presign_expiry_secs: u64,

    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            bucket: String::new(),
            root_directory: String::new(),
            metadata_path: String::new(),
            list_page_size: default_list_page_size(),
            presign_expiry_secs: default_presign_expiry_secs(),
            logging: LoggingConfig::default(),
        }
    }
}

impl DriverConfig {
    pub fn presign_expiry(&self) -> Duration {
        Duration::from_secs(self.presign_expiry_secs)
    }

    /// Full path of the metadata object as handed to the store.
    pub fn metadata_location(&self) -> String {
        format!(
            "{}/{}",
            self.root_directory.trim_end_matches('/'),
            self.metadata_path.trim_start_matches('/')
        )
    }

    /// Validate configuration. Any failure keeps the driver from being built.
    pub fn validate(&self) -> Result<(), DriverError> {
        if self.bucket.trim().is_empty() {
            return Err(DriverError::Config("no bucket parameter provided".to_string()));
        }
        if self.metadata_path.trim().is_empty() {
            return Err(DriverError::Config(
                "no metadata path parameter provided".to_string(),
            ));
        }
        if self.root_directory.is_empty() && self.metadata_path.starts_with("../") {
            return Err(DriverError::Config(
                "metadata path cannot be relative when root directory is not set".to_string(),
            ));
        }
        if self.list_page_size == 0 || self.list_page_size > LIST_MAX {
            return Err(DriverError::Config(format!(
                "list page size {} must be between 1 and {} (inclusive)",
                self.list_page_size, LIST_MAX
            )));
        }
        if self.presign_expiry_secs == 0 || self.presign_expiry_secs > MAX_PRESIGN_EXPIRY_SECS {
            return Err(DriverError::Config(format!(
                "presign expiry {}s must be between 1 and {} seconds",
                self.presign_expiry_secs, MAX_PRESIGN_EXPIRY_SECS
            )));
        }
        Ok(())
    }
}
