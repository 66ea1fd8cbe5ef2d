//! Deferred mixin resolution
//!
//! An `include Foo` can name a module defined in a file scanned later, so the
//! target of a mixin is only looked up when a consumer first asks for it. The
//! lookup mirrors the language's constant search order:
//!
//! 1. a child of the including namespace,
//! 2. a child of a module included earlier by the same namespace, latest first,
//! 3. the enclosing namespaces, stripping one trailing segment at a time.
//!
//! Successful lookups are memoized on the mixin. Failed lookups are not, so a
//! mixin read before every file was scanned can still resolve later.
//!
//! Each failed lookup re-walks the whole chain, including recursive resolution
//! of the earlier mixins. With many mixins naming modules that never appear the
//! cost grows combinatorially; real programs do not hit this and the search
//! order is kept exactly as is.

use serde::Serialize;

use crate::entities::{MixinKind, NamespaceId};
use crate::members::Mixin;
use crate::qualified_name::{child_name, SEPARATOR};
use crate::store::Store;

/// Outcome of resolving a mixin
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MixinTarget<'a> {
    Namespace(NamespaceId),
    /// No namespace matched; renderers show the name as written
    Unresolved(&'a str),
}

impl<'a> MixinTarget<'a> {
    pub fn namespace(self) -> Option<NamespaceId> {
        match self {
            MixinTarget::Namespace(id) => Some(id),
            MixinTarget::Unresolved(_) => None,
        }
    }
}

impl Mixin {
    /// The namespace this mixin refers to, or its raw name.
    ///
    /// Only guaranteed correct once every source file has been scanned.
    pub fn resolved_namespace_or_raw_name(&self, store: &Store) -> MixinTarget<'_> {
        if let Some(id) = self.resolved.get() {
            return MixinTarget::Namespace(*id);
        }

        match store.lookup_mixin(self) {
            Some(id) => {
                tracing::trace!(mixin = %self.name, target = %store.namespace(id).full_name, "resolved mixin");
                let _ = self.resolved.set(id);
                MixinTarget::Namespace(id)
            }
            None => {
                tracing::trace!(mixin = %self.name, "mixin unresolved");
                MixinTarget::Unresolved(&self.name)
            }
        }
    }

    /// Whether a previous call already found the target
    pub fn is_resolved(&self) -> bool {
        self.resolved.get().is_some()
    }
}

impl Store {
    fn lookup_mixin(&self, mixin: &Mixin) -> Option<NamespaceId> {
        if let Some(absolute) = mixin.name.strip_prefix(SEPARATOR) {
            return self.find_namespace(absolute);
        }

        let scope = mixin.scope.iter().cloned().collect::<Vec<_>>().join(SEPARATOR);
        if let Some(found) = self.find_namespace(&child_name(&scope, &mixin.name)) {
            return Some(found);
        }

        let owner = self.namespace(mixin.owner);
        let earlier = owner
            .mixins
            .iter()
            .take(mixin.position)
            .filter(|m| m.kind == MixinKind::Include)
            .rev();
        for included in earlier {
            let Some(target) = included.resolved_namespace_or_raw_name(self).namespace() else {
                continue;
            };
            let candidate = child_name(&self.namespace(target).full_name, &mixin.name);
            if let Some(found) = self.find_namespace(&candidate) {
                return Some(found);
            }
        }

        let mut outer = mixin.scope.clone();
        while outer.pop_back().is_some() {
            let prefix = outer.iter().cloned().collect::<Vec<_>>().join(SEPARATOR);
            if let Some(found) = self.find_namespace(&child_name(&prefix, &mixin.name)) {
                return Some(found);
            }
        }

        None
    }
}
