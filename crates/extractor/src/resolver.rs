//! Namespace path resolution during the walk.
//!
//! Lookups walk the lexical scopes innermost to outermost, skipping
//! singleton frames. A missing first segment is created under the outermost
//! scope; every following segment becomes a direct child of the previous
//! one.

use rbdoc_core::{ConstantPath, NamespaceId, NamespaceKind, Store};

use crate::nesting::NestingStack;

/// Result of resolving a namespace path
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolved {
    Namespace(NamespaceId),
    /// The path names a plain constant; documentation goes to a detached
    /// placeholder instead of an unrelated entity
    Placeholder(NamespaceId),
}

impl Resolved {
    pub fn id(self) -> NamespaceId {
        match self {
            Resolved::Namespace(id) | Resolved::Placeholder(id) => id,
        }
    }

    pub fn is_placeholder(self) -> bool {
        matches!(self, Resolved::Placeholder(_))
    }
}

enum FirstSegment {
    Namespace(NamespaceId),
    Value,
    Missing,
}

fn find_first_segment(store: &Store, stack: &NestingStack, name: &str) -> FirstSegment {
    for scope in stack.lexical_scopes() {
        if let Some(child) = store.find_child(scope, name) {
            return FirstSegment::Namespace(child);
        }
        if let Some(constant) = store.namespace(scope).find_constant(name) {
            return match constant.is_alias_for {
                Some(target) => FirstSegment::Namespace(target),
                None => FirstSegment::Value,
            };
        }
    }
    FirstSegment::Missing
}

/// Resolve `path`, creating missing namespaces. The final segment is created
/// as `last_kind`, intermediate segments as modules.
pub fn resolve_namespace_path(
    store: &mut Store,
    stack: &NestingStack,
    path: &ConstantPath,
    last_kind: NamespaceKind,
) -> Resolved {
    let count = path.segments.len();
    let kind_at = |index: usize| {
        if index + 1 == count {
            last_kind
        } else {
            NamespaceKind::Module
        }
    };
    let Some((first, rest)) = path.segments.split_first() else {
        return Resolved::Namespace(store.root());
    };

    let mut current = if path.absolute {
        store.find_or_create_namespace(store.root(), first, kind_at(0))
    } else {
        match find_first_segment(store, stack, first) {
            FirstSegment::Namespace(id) => id,
            FirstSegment::Value => {
                tracing::debug!(path = %path, "path names a plain constant");
                return Resolved::Placeholder(store.add_detached(&path.to_string()));
            }
            FirstSegment::Missing => {
                store.find_or_create_namespace(stack.outermost_scope(), first, kind_at(0))
            }
        }
    };

    for (offset, segment) in rest.iter().enumerate() {
        current = store.find_or_create_namespace(current, segment, kind_at(offset + 1));
    }
    Resolved::Namespace(current)
}

/// Look `path` up without creating anything
pub fn lookup_namespace_path(
    store: &Store,
    stack: &NestingStack,
    path: &ConstantPath,
) -> Option<NamespaceId> {
    let (first, rest) = path.segments.split_first()?;
    let mut current = if path.absolute {
        store.find_child(store.root(), first)?
    } else {
        match find_first_segment(store, stack, first) {
            FirstSegment::Namespace(id) => id,
            FirstSegment::Value | FirstSegment::Missing => return None,
        }
    };
    for segment in rest {
        current = store.find_child(current, segment)?;
    }
    Some(current)
}

/// Namespace that owns a constant declared as `path`, and the constant's
/// own name.
///
/// A simple name belongs to the current container, except inside
/// `class << x` where constants are not tracked and `None` is returned.
pub fn constant_owner<'p>(
    store: &mut Store,
    stack: &NestingStack,
    path: &'p ConstantPath,
) -> Option<(NamespaceId, &'p str)> {
    let name = path.name();
    match path.owner() {
        None if path.absolute => Some((store.root(), name)),
        None if stack.current().singleton => None,
        None => Some((stack.current().container, name)),
        Some(owner) => {
            let resolved = resolve_namespace_path(store, stack, &owner, NamespaceKind::Module);
            Some((resolved.id(), name))
        }
    }
}
