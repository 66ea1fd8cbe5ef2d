//! Namespaces, singleton classes, method definitions, constants and aliases.

use rbdoc_core::{
    Alias, Constant, ConstantPath, DocumentSelf, Method, NamespaceId, NamespaceKind, Superclass,
    Visibility, WarningKind,
};

use super::Walker;
use crate::directives::Nodoc;
use crate::resolver;
use crate::syntax::{
    ConstantAssign, DeclKind, MethodDef, NamespaceDecl, Node, NodeKind, SingletonClassDecl,
};

impl Walker<'_> {
    pub(super) fn visit_namespace(&mut self, node: &Node, decl: &NamespaceDecl) {
        let span = node.span;
        self.process_comments_until(span.start_line.saturating_sub(1));

        let Some(path) = &decl.path else {
            tracing::debug!(line = span.start_line, "namespace name is not a constant path");
            self.comments.skip_until(span.end_line);
            return;
        };

        let declared = self.declaration_comment(span.start_line);
        let flags = self.doc_flags(declared.as_ref().map(|(_, p)| p), &[span.start_line]);
        let kind = match decl.kind {
            DeclKind::Class => NamespaceKind::Class,
            DeclKind::Module => NamespaceKind::Module,
        };

        let id = match resolver::constant_owner(self.store, &self.stack, path) {
            Some((owner, name)) => self.store.find_or_create_namespace(owner, name, kind),
            None => self.store.add_detached(&path.to_string()),
        };

        if let (DeclKind::Class, Some(superclass), Some(text)) =
            (decl.kind, &decl.superclass, &decl.superclass_text)
        {
            let resolved = superclass
                .constant_path()
                .and_then(|p| resolver::lookup_namespace_path(self.store, &self.stack, p))
                .map(Superclass::Namespace)
                .unwrap_or_else(|| Superclass::Name(text.clone()));
            self.store.namespace_mut(id).superclass = Some(resolved);
        }

        let location = self.location(span.start_line);
        self.store.record_location(id, location);

        let documented = self.should_document(&flags);
        {
            let ns = self.store.namespace_mut(id);
            match flags.nodoc {
                Some(Nodoc::All) => {
                    ns.document_self = DocumentSelf::Hide;
                    ns.document_children = false;
                }
                Some(Nodoc::Itself) => ns.document_self = DocumentSelf::Hide,
                None if flags.force => ns.document_self = DocumentSelf::Show,
                None => {}
            }
        }
        if documented {
            self.store.promote(id);
            if let Some((block, parsed)) = &declared {
                if let Some(comment) = self.comment_from(block, parsed) {
                    self.store.add_namespace_comment(id, comment);
                }
            }
        }

        let full_name = self.store.namespace(id).full_name.clone();
        tracing::trace!(
            namespace = %full_name,
            documented,
            depth = self.stack.depth(),
            "entering namespace"
        );
        self.stack.push(id, &full_name, false);
        if flags.nodoc == Some(Nodoc::All) {
            self.stack.hide_all(&full_name);
        }
        self.visit_all(&decl.body);
        self.process_comments_until(span.end_line);
        self.stack.pop();
    }

    pub(super) fn visit_singleton_class(&mut self, node: &Node, decl: &SingletonClassDecl) {
        let span = node.span;
        self.process_comments_until(span.start_line.saturating_sub(1));

        let flags = self.doc_flags(None, &[span.start_line]);
        if flags.nodoc.is_some() {
            self.comments.skip_until(span.end_line);
            return;
        }

        let container = match &decl.target.kind {
            NodeKind::SelfRef => {
                let current = self.stack.current().container;
                (current != self.store.root()).then_some(current)
            }
            NodeKind::Constant(path) => Some(self.resolve_receiver(path, span.start_line)),
            NodeKind::ConstantAssign(assign) => {
                resolver::constant_owner(self.store, &self.stack, &assign.target).map(
                    |(owner, name)| {
                        self.store
                            .find_or_create_namespace(owner, name, NamespaceKind::Singleton)
                    },
                )
            }
            _ => None,
        };

        let Some(container) = container else {
            tracing::debug!(line = span.start_line, "singleton class of an unsupported target");
            self.comments.skip_until(span.end_line);
            return;
        };

        let full_name = self.store.namespace(container).full_name.clone();
        self.stack.push(container, &full_name, true);
        self.visit_all(&decl.body);
        self.process_comments_until(span.end_line);
        self.stack.pop();
    }

    /// Namespace receiving a definition and whether it is class-level
    fn method_owner(&mut self, def: &MethodDef, def_line: usize) -> Option<(NamespaceId, bool)> {
        let frame = self.stack.current();
        let (container, in_singleton) = (frame.container, frame.singleton);

        let Some(receiver) = def.receiver.as_deref() else {
            return Some((self.member_owner(container), in_singleton));
        };
        match &receiver.kind {
            // `def self.x` inside `class << self` defines on the metaclass
            NodeKind::SelfRef if in_singleton => None,
            NodeKind::SelfRef => Some((self.member_owner(container), true)),
            NodeKind::Nil => Some((self.builtin_class("NilClass"), false)),
            NodeKind::True => Some((self.builtin_class("TrueClass"), false)),
            NodeKind::False => Some((self.builtin_class("FalseClass"), false)),
            NodeKind::Constant(path) => Some((self.resolve_receiver(path, def_line), true)),
            _ => {
                self.warn(
                    def_line,
                    WarningKind::UnresolvedName,
                    format!("cannot document {} on a computed receiver", def.name),
                );
                None
            }
        }
    }

    /// Namespace named by an explicit receiver, warning when it is a
    /// placeholder
    fn resolve_receiver(&mut self, path: &ConstantPath, line: usize) -> NamespaceId {
        let resolved =
            resolver::resolve_namespace_path(self.store, &self.stack, path, NamespaceKind::Module);
        if resolved.is_placeholder() {
            self.warn(
                line,
                WarningKind::UnresolvedName,
                format!("{path} is not a class or module"),
            );
        }
        resolved.id()
    }

    pub(super) fn visit_method_def(&mut self, node: &Node, def: &MethodDef) {
        let span = node.span;
        self.process_comments_until(span.start_line.saturating_sub(1));

        let declared = self.declaration_comment(span.start_line);
        let parsed = declared.as_ref().map(|(_, p)| p);
        let flags = self.doc_flags(parsed, &[span.start_line, def.params_end_line]);

        if !self.stack.in_block() && self.should_document(&flags) {
            if let Some((owner, singleton)) = self.method_owner(def, span.start_line) {
                let mut name = def.name.clone();
                let mut singleton = singleton;
                let mut visibility = if def.receiver.is_some() {
                    Visibility::Public
                } else {
                    self.stack.current_visibility()
                };

                if self.config.rename_initialize && name == "initialize" && !singleton {
                    if parsed.is_some_and(|p| p.not_new()) {
                        visibility = Visibility::Protected;
                    } else {
                        name = "new".to_string();
                        singleton = true;
                        visibility = Visibility::Public;
                    }
                }

                let comment = match &declared {
                    Some((block, parsed)) => self.comment_from(block, parsed),
                    None => None,
                };
                let method = Method::builder()
                    .name(name.clone())
                    .params(def.params.clone())
                    .singleton(singleton)
                    .visibility(visibility)
                    .call_seq(parsed.and_then(|p| p.call_seq()).map(String::from))
                    .block_params(parsed.and_then(|p| p.yields()).map(String::from))
                    .comment(comment)
                    .location(self.location(span.start_line))
                    .token_range(Some(span.byte_range()))
                    .build();

                match method {
                    Ok(method) => {
                        self.store.add_method(owner, method);
                        let frame = self.stack.current();
                        if frame.module_function && !frame.singleton && def.receiver.is_none() {
                            self.store.make_module_functions(owner, &[name]);
                        }
                    }
                    Err(err) => {
                        tracing::warn!(error = %err, line = span.start_line, "could not build method")
                    }
                }
            }
        }

        self.comments.skip_until(span.end_line);
    }

    pub(super) fn visit_constant_assign(&mut self, node: &Node, assign: &ConstantAssign) {
        let span = node.span;
        self.process_comments_until(span.start_line.saturating_sub(1));

        let declared = self.declaration_comment(span.start_line);
        let flags = self.doc_flags(declared.as_ref().map(|(_, p)| p), &[span.start_line]);

        if self.should_document(&flags) {
            if let Some((owner, name)) =
                resolver::constant_owner(self.store, &self.stack, &assign.target)
            {
                let is_alias_for = assign
                    .value
                    .constant_path()
                    .and_then(|p| resolver::lookup_namespace_path(self.store, &self.stack, p));
                let comment = match &declared {
                    Some((block, parsed)) => self.comment_from(block, parsed),
                    None => None,
                };
                let constant = Constant {
                    name: name.to_string(),
                    value: assign.value_text.clone(),
                    is_alias_for,
                    visibility: Visibility::Public,
                    comment,
                    location: self.location(span.start_line),
                };
                self.store.add_constant(owner, constant);
            }
        }

        self.comments.skip_until(span.end_line);
    }

    /// `alias new old` and `alias_method :new, :old`
    pub(super) fn add_alias(&mut self, old_name: &str, new_name: &str, line: usize) {
        let declared = self.declaration_comment(line);
        let flags = self.doc_flags(declared.as_ref().map(|(_, p)| p), &[line]);
        if self.stack.in_block() || !self.should_document(&flags) {
            return;
        }

        let frame = self.stack.current();
        let (container, singleton) = (frame.container, frame.singleton);
        let owner = self.member_owner(container);
        let comment = match &declared {
            Some((block, parsed)) => self.comment_from(block, parsed),
            None => None,
        };
        self.store.add_alias(
            owner,
            Alias {
                old_name: old_name.to_string(),
                new_name: new_name.to_string(),
                singleton,
                comment,
                location: self.location(line),
            },
        );
    }
}
