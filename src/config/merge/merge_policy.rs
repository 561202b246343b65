//! Merge rules: defaults, override order, conflict handling.

use config::Config;
use config::ConfigBuilder;
use config::ConfigError;

/// Create a Config builder with merge policy defaults applied.
pub fn builder_with_defaults() -> Result<ConfigBuilder<config::builder::DefaultState>, ConfigError>
{
    Config::builder()
        .set_default("scan.max_file_size", crate::config::DEFAULT_MAX_FILE_SIZE)?
        .set_default("scan.binary_sniff_bytes", crate::config::DEFAULT_SNIFF_BYTES as u64)?
        .set_default("scan.use_default_ignores", true)?
        .set_default("manifest.path", crate::config::DEFAULT_MANIFEST_PATH)
}
