//! Built-in defaults, the lowest-precedence layer.

use crate::config::{default_list_page_size, default_presign_expiry_secs};
use config::builder::DefaultState;
use config::{Config, ConfigBuilder, ConfigError};

pub fn builder_with_defaults() -> Result<ConfigBuilder<DefaultState>, ConfigError> {
    Config::builder()
        .set_default("bucket", "")?
        .set_default("root_directory", "")?
        .set_default("metadata_path", "")?
        .set_default("list_page_size", default_list_page_size() as i64)?
        .set_default("presign_expiry_secs", default_presign_expiry_secs() as i64)
}
