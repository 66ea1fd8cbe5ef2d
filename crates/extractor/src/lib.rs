//! Documentation extraction engine
//!
//! Walks the syntax tree of each source file and builds the documentation
//! model in a shared [`Store`]. Files are scanned one at a time; namespaces
//! reopened by later files are merged into the existing entities.
//!
//! ```ignore
//! let mut store = Store::new();
//! let extractor = RubyExtractor::new(ExtractorConfig::default());
//! for path in paths {
//!     let report = extractor.scan_path(&mut store, &path)?;
//!     warnings.extend(report.warnings);
//! }
//! ```

#![cfg_attr(not(test), deny(clippy::unwrap_used))]
#![cfg_attr(not(test), deny(clippy::expect_used))]

mod comments;
mod directives;
mod nesting;
mod resolver;
mod ruby;
mod walker;

pub mod syntax;

use std::collections::HashSet;
use std::path::Path;

use rbdoc_core::{ExtractorConfig, FileId, Result, ResultExt, Store, Warning};

pub use ruby::{parse_ruby, RubyExtractor};
pub use syntax::SyntaxTree;

/// Outcome of scanning one file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanReport {
    pub file: FileId,
    /// Non-fatal problems, in source order
    pub warnings: Vec<Warning>,
    /// Qualified names hidden with `:nodoc: all` in this file
    pub locally_hidden: HashSet<String>,
}

/// Turns source files into documentation model entries
pub trait Extractor: Send + Sync {
    fn config(&self) -> &ExtractorConfig;

    /// Parse source text into the walker's syntax tree
    fn parse(&self, source: &str, file_path: &Path) -> Result<SyntaxTree>;

    /// Parse and scan one file into `store`
    fn scan(&self, store: &mut Store, source: &str, file_path: &Path) -> Result<ScanReport> {
        let tree = self.parse(source, file_path)?;
        Ok(scan_tree(store, self.config(), file_path, source, &tree))
    }

    /// Read, parse and scan the file at `path`
    fn scan_path(&self, store: &mut Store, path: &Path) -> Result<ScanReport> {
        let source = std::fs::read_to_string(path)
            .context(format!("Failed to read {}", path.display()))?;
        self.scan(store, &source, path)
    }
}

/// Scan an already parsed file into `store`
pub fn scan_tree(
    store: &mut Store,
    config: &ExtractorConfig,
    file_path: &Path,
    source: &str,
    tree: &SyntaxTree,
) -> ScanReport {
    let span = tracing::debug_span!("scan", path = %file_path.display());
    let _guard = span.enter();

    let file = store.add_file(file_path, config.markup);
    let report = walker::Walker::new(store, config, file, tree, source).run(&tree.nodes);
    tracing::debug!(
        warnings = report.warnings.len(),
        hidden = report.locally_hidden.len(),
        "scanned file"
    );
    report
}

/// Language descriptor for automatic registration
pub struct LanguageDescriptor {
    pub name: &'static str,
    pub extensions: &'static [&'static str],
    pub factory: fn(&ExtractorConfig) -> Result<Box<dyn Extractor>>,
}

inventory::collect!(LanguageDescriptor);

/// Create an appropriate extractor for a file based on its extension
///
/// Returns Ok(None) if the file type is not supported, Err if extractor creation fails
pub fn create_extractor(
    file_path: &Path,
    config: &ExtractorConfig,
) -> Result<Option<Box<dyn Extractor>>> {
    let Some(extension) = file_path.extension().and_then(|e| e.to_str()) else {
        return Ok(None);
    };

    let ext_lower = extension.to_lowercase();
    for descriptor in inventory::iter::<LanguageDescriptor> {
        if descriptor.extensions.contains(&ext_lower.as_str()) {
            return Ok(Some((descriptor.factory)(config)?));
        }
    }

    Ok(None)
}

/// Get the language identifier from a file path
pub fn detect_language(file_path: &Path) -> Option<&'static str> {
    let extension = file_path.extension()?.to_str()?;
    let ext_lower = extension.to_lowercase();

    inventory::iter::<LanguageDescriptor>
        .into_iter()
        .find(|descriptor| descriptor.extensions.contains(&ext_lower.as_str()))
        .map(|descriptor| descriptor.name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_detect_language() {
        assert_eq!(detect_language(&PathBuf::from("lib/foo.rb")), Some("ruby"));
        assert_eq!(detect_language(&PathBuf::from("Rakefile.RAKE")), Some("ruby"));
        assert_eq!(detect_language(&PathBuf::from("README.md")), None);
        assert_eq!(detect_language(&PathBuf::from("Gemfile")), None);
    }

    #[test]
    fn test_create_extractor_for_unknown_extension() {
        let config = ExtractorConfig::default();
        assert!(create_extractor(&PathBuf::from("notes.txt"), &config)
            .unwrap()
            .is_none());
        assert!(create_extractor(&PathBuf::from("lib/foo.rb"), &config)
            .unwrap()
            .is_some());
    }
}
