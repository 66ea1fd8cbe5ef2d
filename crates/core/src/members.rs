//! Members recorded on a namespace: methods, attributes, constants, aliases,
//! mixins and requires.

use derive_builder::Builder;
use serde::Serialize;
use std::ops::Range;
use std::sync::OnceLock;

use crate::entities::{AttrMode, Comment, MixinKind, NamespaceId, SourceLocation, Visibility};

/// A method defined with `def`, declared through a `##` comment, or created
/// by aliasing
#[derive(Debug, Clone, Serialize, Builder)]
#[builder(setter(into))]
pub struct Method {
    pub name: String,

    /// Parameter list as written, including parentheses
    #[builder(default = "String::from(\"()\")")]
    pub params: String,

    /// Class-level (`def self.x`) rather than instance-level
    #[builder(default)]
    pub singleton: bool,

    #[builder(default = "Visibility::Public")]
    pub visibility: Visibility,

    /// Explicit call signature from `:call-seq:`
    #[builder(default)]
    pub call_seq: Option<String>,

    /// Explicit yielded values from `:yields:`
    #[builder(default)]
    pub block_params: Option<String>,

    /// Name of the method this entry aliases
    #[builder(default)]
    pub is_alias_for: Option<String>,

    /// Declared by a free-floating comment rather than by code
    #[builder(default)]
    pub synthetic: bool,

    #[builder(default)]
    pub comment: Option<Comment>,

    pub location: SourceLocation,

    /// Byte range of the defining source, opaque to the model
    #[builder(default)]
    pub token_range: Option<Range<usize>>,
}

impl Method {
    pub fn builder() -> MethodBuilder {
        MethodBuilder::default()
    }

    /// Merge a later definition of the same method into this one.
    ///
    /// The later definition wins, except that an existing comment or override
    /// is kept when the new definition has none.
    pub(crate) fn merge_from(&mut self, newer: Method) {
        let Method {
            params,
            visibility,
            call_seq,
            block_params,
            is_alias_for,
            synthetic,
            comment,
            location,
            token_range,
            ..
        } = newer;

        self.params = params;
        self.visibility = visibility;
        self.is_alias_for = is_alias_for;
        self.synthetic = self.synthetic && synthetic;
        self.location = location;
        if call_seq.is_some() {
            self.call_seq = call_seq;
        }
        if block_params.is_some() {
            self.block_params = block_params;
        }
        if comment.as_ref().is_some_and(|c| !c.is_empty()) {
            self.comment = comment;
        }
        if token_range.is_some() {
            self.token_range = token_range;
        }
    }
}

/// An attribute declared with `attr_*`
#[derive(Debug, Clone, Serialize)]
pub struct Attribute {
    pub name: String,
    pub mode: AttrMode,
    pub singleton: bool,
    pub visibility: Visibility,
    pub comment: Option<Comment>,
    pub location: SourceLocation,
}

/// A constant assignment
#[derive(Debug, Clone, Serialize)]
pub struct Constant {
    pub name: String,
    /// Initializer source text
    pub value: String,
    /// Namespace the initializer refers to, when it is a namespace reference
    pub is_alias_for: Option<NamespaceId>,
    pub visibility: Visibility,
    pub comment: Option<Comment>,
    pub location: SourceLocation,
}

/// `alias new old` or `alias_method :new, :old`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Alias {
    pub old_name: String,
    pub new_name: String,
    pub singleton: bool,
    pub comment: Option<Comment>,
    pub location: SourceLocation,
}

/// `require "feature"`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Require {
    pub name: String,
    pub location: SourceLocation,
}

/// An include or extend relationship, resolved lazily
#[derive(Debug, Clone, Serialize)]
pub struct Mixin {
    pub kind: MixinKind,
    /// Name as written at the inclusion site
    pub name: String,
    /// Namespace that performed the inclusion
    pub owner: NamespaceId,
    /// Position among the owner's mixins
    pub position: usize,
    /// Qualified-name segments of the owner when the mixin was recorded
    pub scope: im::Vector<String>,
    pub comment: Option<Comment>,
    pub location: SourceLocation,
    #[serde(skip)]
    pub(crate) resolved: OnceLock<NamespaceId>,
}

impl Mixin {
    pub(crate) fn new(
        kind: MixinKind,
        name: impl Into<String>,
        owner: NamespaceId,
        position: usize,
        scope: im::Vector<String>,
        comment: Option<Comment>,
        location: SourceLocation,
    ) -> Self {
        Self {
            kind,
            name: name.into(),
            owner,
            position,
            scope,
            comment,
            location,
            resolved: OnceLock::new(),
        }
    }
}
