//! Environment variable source: MERCATOR__* prefix with __ separator

use config::builder::DefaultState;
use config::ConfigBuilder;
use config::ConfigError;
use config::Environment;

/// Add environment variable overlay to builder.
/// `MERCATOR__SCAN__MAX_FILE_SIZE=2048` sets `scan.max_file_size`.
pub fn add_to_builder(
    builder: ConfigBuilder<DefaultState>,
) -> Result<ConfigBuilder<DefaultState>, ConfigError> {
    let builder = builder.add_source(
        Environment::with_prefix("MERCATOR")
            .separator("__")
            .try_parsing(true),
    );
    Ok(builder)
}
