//! Configuration of the extraction engine
//!
//! Configuration can be loaded from a TOML file and/or environment variables
//! prefixed with `RBDOC_`.

mod defaults;
mod loading;


use crate::entities::{Markup, Visibility};
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use defaults::*;

/// Returns the path to the global configuration file
///
/// The global config is stored at `~/.rbdoc/config.toml`.
pub fn global_config_path() -> Result<PathBuf> {
    let home_dir = dirs::home_dir()
        .ok_or_else(|| Error::config("Unable to determine home directory".to_string()))?;
    Ok(home_dir.join(".rbdoc").join("config.toml"))
}

/// Settings that change how source files are turned into the model
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractorConfig {
    /// Markup format of comments unless a file's first comment says otherwise
    #[serde(default = "default_markup")]
    pub markup: Markup,

    /// Minimum visibility reported by renderers
    #[serde(default = "default_visibility")]
    pub visibility: Visibility,

    /// Record `initialize` as the public class method `new`
    #[serde(default = "default_rename_initialize")]
    pub rename_initialize: bool,

    /// Turn free-floating `##` comments into synthetic methods
    #[serde(default = "default_meta_method_comments")]
    pub meta_method_comments: bool,

    /// Record `require` calls on the namespace that performs them
    #[serde(default = "default_record_requires")]
    pub record_requires: bool,
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            markup: default_markup(),
            visibility: default_visibility(),
            rename_initialize: default_rename_initialize(),
            meta_method_comments: default_meta_method_comments(),
            record_requires: default_record_requires(),
        }
    }
}

impl ExtractorConfig {
    /// Builder-style setter for the default markup
    pub fn with_markup(mut self, markup: Markup) -> Self {
        self.markup = markup;
        self
    }

    /// Builder-style setter for the minimum visibility
    pub fn with_visibility(mut self, visibility: Visibility) -> Self {
        self.visibility = visibility;
        self
    }

    /// Builder-style setter for `initialize` renaming
    pub fn with_rename_initialize(mut self, rename: bool) -> Self {
        self.rename_initialize = rename;
        self
    }

    /// Save configuration to a TOML file
    pub fn save(&self, path: &std::path::Path) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| Error::config(format!("Failed to serialize config: {e}")))?;
        std::fs::write(path, content)?;
        Ok(())
    }
}
