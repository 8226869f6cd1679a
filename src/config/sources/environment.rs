//! Environment variable source: SHARDFS prefix with __ separator

use config::builder::DefaultState;
use config::ConfigBuilder;
use config::ConfigError;
use config::Environment;

/// Environment source. `SHARDFS__LOGGING__LEVEL=debug` sets `logging.level`.
pub fn source() -> Environment {
    Environment::with_prefix("SHARDFS")
        .separator("__")
        .try_parsing(true)
}

/// Add environment variable overlay to builder.
pub fn add_to_builder(
    builder: ConfigBuilder<DefaultState>,
) -> Result<ConfigBuilder<DefaultState>, ConfigError> {
    Ok(builder.add_source(source()))
}
