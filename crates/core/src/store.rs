//! The documentation model: a registry of namespaces keyed by qualified name.
//!
//! Every `create` here is really find-or-create. Reopening a namespace from
//! another file (or later in the same file) returns the existing entity and
//! new members are merged into it.

use serde::Serialize;
use std::collections::HashMap;
use std::path::PathBuf;

use crate::entities::{
    Comment, DocumentSelf, FileId, Markup, MixinKind, NamespaceId, NamespaceKind,
    SourceFile, SourceLocation, Visibility,
};
use crate::members::{Alias, Attribute, Constant, Method, Mixin, Require};
use crate::qualified_name::{child_name, segments};

/// Superclass of a class, resolved when the scan could find it
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Superclass {
    Name(String),
    Namespace(NamespaceId),
}

/// A class or module in the model
#[derive(Debug, Clone, Serialize)]
pub struct Namespace {
    pub id: NamespaceId,
    pub name: String,
    pub full_name: String,
    pub kind: NamespaceKind,
    pub parent: Option<NamespaceId>,
    pub superclass: Option<Superclass>,
    /// Provisionally created, not yet proven documentable
    pub ignored: bool,
    pub document_self: DocumentSelf,
    /// Cleared by `:nodoc: all`
    pub document_children: bool,
    /// Placeholder that is not reachable from the registry
    pub detached: bool,
    pub comments: Vec<Comment>,
    pub locations: Vec<SourceLocation>,
    pub children: Vec<NamespaceId>,
    pub methods: Vec<Method>,
    pub attributes: Vec<Attribute>,
    pub constants: Vec<Constant>,
    pub mixins: Vec<Mixin>,
    pub aliases: Vec<Alias>,
    pub requires: Vec<Require>,
}

/// Methods and attributes sharing a singleton flag and visibility
#[derive(Debug)]
pub struct MemberGroup<'a> {
    pub singleton: bool,
    pub visibility: Visibility,
    pub methods: Vec<&'a Method>,
    pub attributes: Vec<&'a Attribute>,
}

impl Namespace {
    fn new(
        id: NamespaceId,
        name: &str,
        full_name: String,
        kind: NamespaceKind,
        parent: Option<NamespaceId>,
    ) -> Self {
        Self {
            id,
            name: name.to_string(),
            full_name,
            kind,
            parent,
            superclass: None,
            ignored: true,
            document_self: DocumentSelf::Unset,
            document_children: true,
            detached: false,
            comments: Vec::new(),
            locations: Vec::new(),
            children: Vec::new(),
            methods: Vec::new(),
            attributes: Vec::new(),
            constants: Vec::new(),
            mixins: Vec::new(),
            aliases: Vec::new(),
            requires: Vec::new(),
        }
    }

    pub fn is_class(&self) -> bool {
        self.kind == NamespaceKind::Class
    }

    pub fn is_module(&self) -> bool {
        self.kind == NamespaceKind::Module
    }

    /// Should renderers show this namespace
    pub fn is_documented(&self) -> bool {
        !self.ignored && !self.detached && self.document_self != DocumentSelf::Hide
    }

    /// All comments joined in scan order
    pub fn comment_text(&self) -> String {
        self.comments
            .iter()
            .map(|c| c.text.as_str())
            .collect::<Vec<_>>()
            .join("\n\n")
    }

    pub fn find_method(&self, name: &str, singleton: bool) -> Option<&Method> {
        self.methods
            .iter()
            .find(|m| m.name == name && m.singleton == singleton)
    }

    pub fn find_method_mut(&mut self, name: &str, singleton: bool) -> Option<&mut Method> {
        self.methods
            .iter_mut()
            .find(|m| m.name == name && m.singleton == singleton)
    }

    pub fn find_attribute(&self, name: &str, singleton: bool) -> Option<&Attribute> {
        self.attributes
            .iter()
            .find(|a| a.name == name && a.singleton == singleton)
    }

    pub fn find_constant(&self, name: &str) -> Option<&Constant> {
        self.constants.iter().find(|c| c.name == name)
    }

    pub fn includes(&self) -> impl Iterator<Item = &Mixin> {
        self.mixins.iter().filter(|m| m.kind == MixinKind::Include)
    }

    pub fn extends(&self) -> impl Iterator<Item = &Mixin> {
        self.mixins.iter().filter(|m| m.kind == MixinKind::Extend)
    }

    /// Methods and attributes grouped class-level first, then by visibility
    /// from public to private, dropping groups below `minimum`.
    pub fn member_groups(&self, minimum: Visibility) -> Vec<MemberGroup<'_>> {
        let mut groups = Vec::new();
        for singleton in [true, false] {
            for visibility in [Visibility::Public, Visibility::Protected, Visibility::Private] {
                if visibility < minimum {
                    continue;
                }
                let methods: Vec<&Method> = self
                    .methods
                    .iter()
                    .filter(|m| m.singleton == singleton && m.visibility == visibility)
                    .collect();
                let attributes: Vec<&Attribute> = self
                    .attributes
                    .iter()
                    .filter(|a| a.singleton == singleton && a.visibility == visibility)
                    .collect();
                if methods.is_empty() && attributes.is_empty() {
                    continue;
                }
                groups.push(MemberGroup {
                    singleton,
                    visibility,
                    methods,
                    attributes,
                });
            }
        }
        groups
    }

    /// Methods at or above `minimum` visibility
    pub fn documented_methods(&self, minimum: Visibility) -> impl Iterator<Item = &Method> {
        self.methods.iter().filter(move |m| m.visibility >= minimum)
    }
}

/// Registry of everything the scans of all files produced
#[derive(Debug, Serialize)]
pub struct Store {
    namespaces: Vec<Namespace>,
    #[serde(skip)]
    by_name: HashMap<String, NamespaceId>,
    files: Vec<SourceFile>,
}

impl Default for Store {
    fn default() -> Self {
        Self::new()
    }
}

impl Store {
    pub fn new() -> Self {
        let mut root = Namespace::new(
            NamespaceId::ROOT,
            "",
            String::new(),
            NamespaceKind::Root,
            None,
        );
        root.ignored = false;
        Self {
            namespaces: vec![root],
            by_name: HashMap::new(),
            files: Vec::new(),
        }
    }

    pub fn root(&self) -> NamespaceId {
        NamespaceId::ROOT
    }

    // -- Files ----------------------------------------------------------------

    pub fn add_file(&mut self, path: impl Into<PathBuf>, markup: Markup) -> FileId {
        let id = FileId(self.files.len());
        self.files.push(SourceFile {
            id,
            path: path.into(),
            comment: None,
            markup,
            requires: Vec::new(),
        });
        id
    }

    pub fn file(&self, id: FileId) -> &SourceFile {
        &self.files[id.0]
    }

    pub fn file_mut(&mut self, id: FileId) -> &mut SourceFile {
        &mut self.files[id.0]
    }

    pub fn files(&self) -> impl Iterator<Item = &SourceFile> {
        self.files.iter()
    }

    // -- Namespace lookup -----------------------------------------------------

    pub fn namespace(&self, id: NamespaceId) -> &Namespace {
        &self.namespaces[id.0]
    }

    pub fn namespace_mut(&mut self, id: NamespaceId) -> &mut Namespace {
        &mut self.namespaces[id.0]
    }

    /// Registered namespaces in creation order, excluding the root and
    /// detached placeholders
    pub fn namespaces(&self) -> impl Iterator<Item = &Namespace> {
        self.namespaces
            .iter()
            .filter(|ns| ns.kind != NamespaceKind::Root && !ns.detached)
    }

    /// Look up a namespace by qualified name; a leading `::` is ignored
    pub fn find_namespace(&self, full_name: &str) -> Option<NamespaceId> {
        let key = full_name.trim_start_matches("::");
        if key.is_empty() {
            return Some(NamespaceId::ROOT);
        }
        self.by_name.get(key).copied()
    }

    /// Direct child namespace of `parent` named `name`
    pub fn find_child(&self, parent: NamespaceId, name: &str) -> Option<NamespaceId> {
        let parent_ns = self.namespace(parent);
        if parent_ns.detached {
            return parent_ns
                .children
                .iter()
                .copied()
                .find(|id| self.namespace(*id).name == name);
        }
        self.find_namespace(&child_name(&parent_ns.full_name, name))
    }

    /// Qualified-name segments of a namespace
    pub fn scope_of(&self, id: NamespaceId) -> im::Vector<String> {
        segments(&self.namespace(id).full_name).into_iter().collect()
    }

    // -- Namespace creation ---------------------------------------------------

    /// Find the child `name` of `parent`, creating it with `kind` if missing.
    ///
    /// New namespaces start `ignored`; callers promote them once something
    /// documentable attaches.
    pub fn find_or_create_namespace(
        &mut self,
        parent: NamespaceId,
        name: &str,
        kind: NamespaceKind,
    ) -> NamespaceId {
        if let Some(existing) = self.find_child(parent, name) {
            return existing;
        }

        let parent_ns = self.namespace(parent);
        let detached = parent_ns.detached;
        let full_name = child_name(&parent_ns.full_name, name);
        let id = NamespaceId(self.namespaces.len());
        let mut ns = Namespace::new(id, name, full_name.clone(), kind, Some(parent));
        ns.detached = detached;
        self.namespaces.push(ns);
        self.namespace_mut(parent).children.push(id);
        if !detached {
            tracing::trace!(namespace = %full_name, kind = %kind, "created namespace");
            self.by_name.insert(full_name, id);
        }
        id
    }

    /// Anonymous namespace that is not reachable from the registry.
    ///
    /// Used when a name resolves to something that is not a namespace, so
    /// documentation is not attributed to an unrelated entity.
    pub fn add_detached(&mut self, name: &str) -> NamespaceId {
        let id = NamespaceId(self.namespaces.len());
        let mut ns = Namespace::new(id, name, name.to_string(), NamespaceKind::Module, None);
        ns.detached = true;
        self.namespaces.push(ns);
        tracing::debug!(name, "created detached placeholder namespace");
        id
    }

    /// Clear `ignored` on `id` and its ancestors, stopping at the first
    /// ancestor already promoted
    pub fn promote(&mut self, id: NamespaceId) {
        let mut current = Some(id);
        while let Some(id) = current {
            let ns = self.namespace_mut(id);
            if !ns.ignored {
                break;
            }
            ns.ignored = false;
            current = ns.parent;
        }
    }

    /// Attach a comment to a namespace, replacing an earlier comment from the
    /// same file
    pub fn add_namespace_comment(&mut self, id: NamespaceId, comment: Comment) {
        if comment.is_empty() {
            return;
        }
        let ns = self.namespace_mut(id);
        match ns
            .comments
            .iter_mut()
            .find(|c| c.location.file == comment.location.file)
        {
            Some(existing) => *existing = comment,
            None => ns.comments.push(comment),
        }
        self.promote(id);
    }

    pub fn record_location(&mut self, id: NamespaceId, location: SourceLocation) {
        let ns = self.namespace_mut(id);
        if !ns.locations.contains(&location) {
            ns.locations.push(location);
        }
    }

    // -- Members ----------------------------------------------------------------

    /// Add or merge a method; pending aliases of it materialize afterwards
    pub fn add_method(&mut self, owner: NamespaceId, method: Method) {
        let name = method.name.clone();
        let singleton = method.singleton;
        let ns = self.namespace_mut(owner);
        match ns.find_method_mut(&name, singleton) {
            Some(existing) => existing.merge_from(method),
            None => ns.methods.push(method),
        }
        self.materialize_aliases_of(owner, &name, singleton);
        self.promote(owner);
    }

    /// Add or merge an attribute; a reader and a writer of the same name
    /// combine into an accessor
    pub fn add_attribute(&mut self, owner: NamespaceId, attribute: Attribute) {
        let ns = self.namespace_mut(owner);
        match ns
            .attributes
            .iter_mut()
            .find(|a| a.name == attribute.name && a.singleton == attribute.singleton)
        {
            Some(existing) => {
                existing.mode = existing.mode.union(attribute.mode);
                existing.visibility = attribute.visibility;
                existing.location = attribute.location;
                if attribute.comment.as_ref().is_some_and(|c| !c.is_empty()) {
                    existing.comment = attribute.comment;
                }
            }
            None => ns.attributes.push(attribute),
        }
        self.promote(owner);
    }

    pub fn add_constant(&mut self, owner: NamespaceId, constant: Constant) {
        let ns = self.namespace_mut(owner);
        match ns.constants.iter_mut().find(|c| c.name == constant.name) {
            Some(existing) => {
                existing.value = constant.value;
                existing.is_alias_for = constant.is_alias_for;
                existing.location = constant.location;
                if constant.comment.as_ref().is_some_and(|c| !c.is_empty()) {
                    existing.comment = constant.comment;
                }
            }
            None => ns.constants.push(constant),
        }
        self.promote(owner);
    }

    /// Record an alias and, if the aliased method is known, an alias method
    pub fn add_alias(&mut self, owner: NamespaceId, alias: Alias) {
        let ns = self.namespace_mut(owner);
        if !ns.aliases.iter().any(|a| {
            a.old_name == alias.old_name
                && a.new_name == alias.new_name
                && a.singleton == alias.singleton
        }) {
            ns.aliases.push(alias.clone());
        }
        self.materialize_alias(owner, &alias);
        self.promote(owner);
    }

    fn materialize_aliases_of(&mut self, owner: NamespaceId, old_name: &str, singleton: bool) {
        let pending: Vec<Alias> = self
            .namespace(owner)
            .aliases
            .iter()
            .filter(|a| a.old_name == old_name && a.singleton == singleton)
            .cloned()
            .collect();
        for alias in pending {
            self.materialize_alias(owner, &alias);
        }
    }

    fn materialize_alias(&mut self, owner: NamespaceId, alias: &Alias) {
        let ns = self.namespace_mut(owner);
        if ns.find_method(&alias.new_name, alias.singleton).is_some() {
            return;
        }
        let Some(original) = ns.find_method(&alias.old_name, alias.singleton) else {
            return;
        };
        let mut aliased = original.clone();
        aliased.name = alias.new_name.clone();
        aliased.is_alias_for = Some(alias.old_name.clone());
        aliased.comment = alias.comment.clone();
        aliased.location = alias.location;
        ns.methods.push(aliased);
    }

    /// Record an include or extend. Re-recording the same name merges.
    pub fn add_mixin(
        &mut self,
        owner: NamespaceId,
        kind: MixinKind,
        name: &str,
        comment: Option<Comment>,
        location: SourceLocation,
    ) {
        let scope = self.scope_of(owner);
        let ns = self.namespace_mut(owner);
        if let Some(existing) = ns
            .mixins
            .iter_mut()
            .find(|m| m.kind == kind && m.name == name)
        {
            if comment.as_ref().is_some_and(|c| !c.is_empty()) {
                existing.comment = comment;
            }
            return;
        }
        let position = ns.mixins.len();
        ns.mixins.push(Mixin::new(
            kind, name, owner, position, scope, comment, location,
        ));
        self.promote(owner);
    }

    /// Record a top-level `require` on the file that performs it
    pub fn add_file_require(&mut self, file: FileId, require: Require) {
        let source = self.file_mut(file);
        if !source.requires.iter().any(|r| r.name == require.name) {
            source.requires.push(require);
        }
    }

    pub fn add_require(&mut self, owner: NamespaceId, require: Require) {
        let ns = self.namespace_mut(owner);
        if !ns.requires.iter().any(|r| r.name == require.name) {
            ns.requires.push(require);
        }
    }

    /// Change the visibility of the named methods and attributes
    pub fn set_method_visibility(
        &mut self,
        owner: NamespaceId,
        names: &[String],
        singleton: bool,
        visibility: Visibility,
    ) {
        let ns = self.namespace_mut(owner);
        for method in ns
            .methods
            .iter_mut()
            .filter(|m| m.singleton == singleton && names.contains(&m.name))
        {
            method.visibility = visibility;
        }
        for attribute in ns
            .attributes
            .iter_mut()
            .filter(|a| a.singleton == singleton && names.contains(&a.name))
        {
            attribute.visibility = visibility;
        }
    }

    pub fn set_constant_visibility(
        &mut self,
        owner: NamespaceId,
        names: &[String],
        visibility: Visibility,
    ) {
        for constant in self
            .namespace_mut(owner)
            .constants
            .iter_mut()
            .filter(|c| names.contains(&c.name))
        {
            constant.visibility = visibility;
        }
    }

    /// `module_function`: public singleton copies, private instance methods
    pub fn make_module_functions(&mut self, owner: NamespaceId, names: &[String]) {
        let copies: Vec<Method> = self
            .namespace(owner)
            .methods
            .iter()
            .filter(|m| !m.singleton && names.contains(&m.name))
            .cloned()
            .map(|mut m| {
                m.singleton = true;
                m.visibility = Visibility::Public;
                m
            })
            .collect();
        self.set_method_visibility(owner, names, false, Visibility::Private);
        for copy in copies {
            self.add_method(owner, copy);
        }
    }
}
