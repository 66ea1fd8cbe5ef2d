use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use strum_macros::{Display, EnumString};

use crate::members::Require;

/// Index of a namespace inside a [`Store`](crate::store::Store)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct NamespaceId(pub(crate) usize);

impl NamespaceId {
    /// The file-independent top-level namespace every store starts with
    pub const ROOT: NamespaceId = NamespaceId(0);

    pub fn index(self) -> usize {
        self.0
    }
}

/// Index of a scanned source file inside a [`Store`](crate::store::Store)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct FileId(pub(crate) usize);

impl FileId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// Kind of namespace
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Display, EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum NamespaceKind {
    /// The top-level scope shared by all files
    Root,
    Class,
    Module,
    /// An object opened with `class << (NAME = expr)`
    Singleton,
}

/// Visibility modifiers for methods, attributes and constants
///
/// Ordered from least to most exposed so `visibility >= minimum` filters work.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    Display,
    EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum Visibility {
    Private,
    Protected,
    Public,
}

/// Tri-state documentation flag of an entity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum DocumentSelf {
    /// Forced on with `:doc:`
    Show,
    /// Turned off with `:nodoc:`
    Hide,
    #[default]
    Unset,
}

/// Read/write mode of an attribute
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Display, EnumString)]
pub enum AttrMode {
    #[strum(serialize = "R")]
    Read,
    #[strum(serialize = "W")]
    Write,
    #[strum(serialize = "RW")]
    ReadWrite,
}

impl AttrMode {
    /// Mode covering both `self` and `other`
    pub fn union(self, other: AttrMode) -> AttrMode {
        if self == other {
            self
        } else {
            AttrMode::ReadWrite
        }
    }
}

/// Include or extend relationship
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Display, EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum MixinKind {
    Include,
    Extend,
}

/// Markup format a comment is written in
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum Markup {
    #[default]
    Rdoc,
    Markdown,
    Rd,
    Tomdoc,
}

/// Source location of an entity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SourceLocation {
    pub file: FileId,
    pub line: usize,
}

impl SourceLocation {
    pub fn new(file: FileId, line: usize) -> Self {
        Self { file, line }
    }
}

/// Directive-stripped documentation prose attached to an entity
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Comment {
    pub text: String,
    pub format: Markup,
    pub location: SourceLocation,
}

impl Comment {
    pub fn new(text: impl Into<String>, format: Markup, location: SourceLocation) -> Self {
        Self {
            text: text.into(),
            format,
            location,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.text.trim().is_empty()
    }
}

/// A scanned source file
#[derive(Debug, Clone, Serialize)]
pub struct SourceFile {
    pub id: FileId,
    pub path: PathBuf,
    /// Leading comment of the file that no declaration consumed
    pub comment: Option<Comment>,
    /// Markup format set by the file's first comment block
    pub markup: Markup,
    /// `require` calls made at the top level of the file
    pub requires: Vec<Require>,
}

/// Category of a non-fatal problem found while scanning
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Display, EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum WarningKind {
    /// A state transition that changed nothing
    RedundantDirective,
    /// A directive that has no effect in its position
    IgnoredDirective,
    /// Directive text with more than one reading
    AmbiguousDirective,
    /// A `:markup:` value that names no known format
    UnknownMarkup,
    /// A name that resolved to a placeholder
    UnresolvedName,
}

/// Non-fatal problem accumulated during a scan for later reporting
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Warning {
    pub file: FileId,
    pub line: usize,
    pub kind: WarningKind,
    pub message: String,
}
