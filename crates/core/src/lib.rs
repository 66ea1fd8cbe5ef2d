//! Core types for the rbdoc documentation extractor
//!
//! This crate holds the documentation model that the extraction engine builds
//! and that renderers read afterwards:
//!
//! - **Store**: namespaces keyed by qualified name, plus scanned files
//! - **Members**: methods, attributes, constants, aliases, mixins and requires
//! - **Resolution**: deferred lookup of mixin targets
//! - **Configuration**: extraction settings
//! - **Error handling**: unified error types
//!

pub mod config;
pub mod entities;
pub mod error;
pub mod members;
pub mod qualified_name;
pub mod resolution;
pub mod store;

// Re-export main types for convenience
pub use config::ExtractorConfig;
pub use entities::{
    AttrMode, Comment, DocumentSelf, FileId, Markup, MixinKind, NamespaceId, NamespaceKind,
    SourceFile, SourceLocation, Visibility, Warning, WarningKind,
};
pub use error::{Error, Result, ResultExt};
pub use members::{Alias, Attribute, Constant, Method, MethodBuilder, Mixin, Require};
pub use qualified_name::ConstantPath;
pub use resolution::MixinTarget;
pub use store::{MemberGroup, Namespace, Store, Superclass};

/// Version of the core library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::config::ExtractorConfig;
    pub use crate::entities::{NamespaceId, Visibility};
    pub use crate::error::{Result, ResultExt};
    pub use crate::store::Store;
}
