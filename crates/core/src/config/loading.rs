//! Configuration loading from files and environment variables

use crate::error::{Error, Result};
use config::{Config as ConfigLib, ConfigBuilder as LibConfigBuilder, Environment, File};
use std::path::Path;

use super::defaults::*;
use super::{global_config_path, ExtractorConfig};

/// Helper to set a config default with consistent error mapping
fn set_config_default<T: Into<config::Value>>(
    builder: LibConfigBuilder<config::builder::DefaultState>,
    key: &str,
    value: T,
) -> Result<LibConfigBuilder<config::builder::DefaultState>> {
    builder
        .set_default(key, value)
        .map_err(|e| Error::config(format!("Failed to set {key} default: {e}")))
}

impl ExtractorConfig {
    /// Loads configuration from a TOML file with environment variable overrides
    ///
    /// Environment variables are prefixed with `RBDOC_`. For example:
    /// - `RBDOC_MARKUP=markdown`
    /// - `RBDOC_RENAME_INITIALIZE=false`
    pub fn from_file(path: &Path) -> Result<Self> {
        let builder = ConfigLib::builder();

        let builder = set_config_default(builder, "markup", default_markup().to_string())?;
        let builder =
            set_config_default(builder, "visibility", default_visibility().to_string())?;
        let builder =
            set_config_default(builder, "rename_initialize", default_rename_initialize())?;
        let builder = set_config_default(
            builder,
            "meta_method_comments",
            default_meta_method_comments(),
        )?;
        let mut builder =
            set_config_default(builder, "record_requires", default_record_requires())?;

        // Add the config file if it exists
        if path.exists() {
            builder = builder.add_source(File::from(path));
        }

        builder = builder.add_source(
            Environment::with_prefix("RBDOC")
                .separator("__")
                .try_parsing(true),
        );

        let config = builder
            .build()
            .map_err(|e| Error::config(format!("Failed to build config: {e}")))?;

        config
            .try_deserialize()
            .map_err(|e| Error::config(format!("Failed to deserialize config: {e}")))
    }

    /// Creates a config from a TOML string (useful for testing)
    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| Error::config(format!("Failed to parse TOML: {e}")))
    }

    /// Load configuration
    ///
    /// Precedence (lowest to highest):
    /// 1. Hardcoded defaults
    /// 2. Config file (~/.rbdoc/config.toml or a custom path)
    /// 3. Environment variables (RBDOC_*)
    pub fn load(config_path: Option<&Path>) -> Result<Self> {
        let path = match config_path {
            Some(p) => p.to_path_buf(),
            None => global_config_path()?,
        };
        Self::from_file(&path)
    }
}
