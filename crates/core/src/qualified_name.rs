//! Structured constant paths (`A::B::C`, `::Top`).
//!
//! Namespaces are keyed by their qualified name; every producer and consumer of
//! those keys goes through this type so the separator handling lives in one
//! place.

use serde::{Serialize, Serializer};
use std::fmt::{self, Display};

use crate::error::{Error, Result};

/// Namespace separator of the modeled language
pub const SEPARATOR: &str = "::";

/// A possibly-qualified constant path
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ConstantPath {
    /// Leading `::` anchors the lookup at the top level
    pub absolute: bool,
    /// Path segments (e.g., `["A", "B"]` for `A::B`)
    pub segments: Vec<String>,
}

impl ConstantPath {
    /// Parse a constant path string.
    ///
    /// # Errors
    ///
    /// Returns an error if the string is empty or contains an empty segment.
    pub fn parse(s: &str) -> Result<Self> {
        let (absolute, rest) = match s.strip_prefix(SEPARATOR) {
            Some(rest) => (true, rest),
            None => (false, s),
        };

        if rest.is_empty() {
            return Err(Error::invalid_input(format!(
                "constant path cannot be empty: {s:?}"
            )));
        }

        let segments: Vec<String> = rest.split(SEPARATOR).map(String::from).collect();
        if segments.iter().any(|seg| seg.is_empty()) {
            return Err(Error::invalid_input(format!(
                "constant path contains empty segment: {s}"
            )));
        }

        Ok(Self { absolute, segments })
    }

    /// Relative single-segment path
    pub fn simple(name: impl Into<String>) -> Self {
        Self {
            absolute: false,
            segments: vec![name.into()],
        }
    }

    /// Last segment of the path
    pub fn name(&self) -> &str {
        self.segments.last().map(String::as_str).unwrap_or_default()
    }

    /// Everything but the last segment, `None` for single-segment paths
    pub fn owner(&self) -> Option<ConstantPath> {
        if self.segments.len() < 2 {
            return None;
        }
        Some(Self {
            absolute: self.absolute,
            segments: self.segments[..self.segments.len() - 1].to_vec(),
        })
    }

    pub fn is_simple(&self) -> bool {
        !self.absolute && self.segments.len() == 1
    }
}

impl Display for ConstantPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.absolute {
            f.write_str(SEPARATOR)?;
        }
        f.write_str(&self.segments.join(SEPARATOR))
    }
}

impl Serialize for ConstantPath {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Qualified name of `name` nested inside the namespace called `parent`
///
/// The top-level namespace has the empty qualified name.
pub fn child_name(parent: &str, name: &str) -> String {
    if parent.is_empty() {
        name.to_string()
    } else {
        format!("{parent}{SEPARATOR}{name}")
    }
}

/// Split a qualified name into its segments; the top level has none
pub fn segments(qualified: &str) -> Vec<String> {
    qualified
        .trim_start_matches(SEPARATOR)
        .split(SEPARATOR)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}
