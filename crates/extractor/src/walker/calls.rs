//! Calls that declare things: attributes, mixins, visibility changes,
//! aliases and requires.

use rbdoc_core::{AttrMode, Attribute, MixinKind, Require, Visibility};

use super::Walker;
use crate::syntax::{Call, Node, NodeKind, Span};

/// Names a visibility call applies to: literal arguments, or the single
/// method definition it wraps
fn visibility_targets(call: &Call, class_method: bool) -> Vec<String> {
    if let Some(names) = call.literal_names() {
        return names;
    }
    match call.args() {
        [Node {
            kind: NodeKind::MethodDef(def),
            ..
        }] => {
            let on_self = matches!(
                def.receiver.as_deref().map(|r| &r.kind),
                Some(NodeKind::SelfRef)
            );
            if on_self == class_method && (on_self || def.receiver.is_none()) {
                vec![def.name.clone()]
            } else {
                Vec::new()
            }
        }
        _ => Vec::new(),
    }
}

/// Attribute names of an `attr*` call; `attr :name, true` is the old
/// spelling of an accessor
fn attribute_names(call: &Call, mode: AttrMode) -> Option<(Vec<String>, AttrMode)> {
    if call.method == "attr" {
        if let [name, flag] = call.args() {
            if let (Some(name), NodeKind::True | NodeKind::False) =
                (name.literal_name(), &flag.kind)
            {
                let mode = if flag.kind == NodeKind::True {
                    AttrMode::ReadWrite
                } else {
                    AttrMode::Read
                };
                return Some((vec![name.to_string()], mode));
            }
        }
    }
    call.literal_names()
        .filter(|names| !names.is_empty())
        .map(|names| (names, mode))
}

impl Walker<'_> {
    pub(super) fn visit_call(&mut self, node: &Node, call: &Call) {
        let span = node.span;
        self.process_comments_until(span.start_line.saturating_sub(1));

        if call.receiver.is_none() {
            match call.method.as_str() {
                "attr" | "attr_reader" => {
                    return self.visit_attribute_call(span, call, AttrMode::Read)
                }
                "attr_writer" => return self.visit_attribute_call(span, call, AttrMode::Write),
                "attr_accessor" => {
                    return self.visit_attribute_call(span, call, AttrMode::ReadWrite)
                }
                "include" => return self.visit_mixin_call(span, call, MixinKind::Include),
                "extend" => return self.visit_mixin_call(span, call, MixinKind::Extend),
                "public" => return self.visit_visibility_call(call, Visibility::Public),
                "protected" => return self.visit_visibility_call(call, Visibility::Protected),
                "private" => return self.visit_visibility_call(call, Visibility::Private),
                "module_function" => return self.visit_module_function(call),
                "public_class_method" => {
                    return self.visit_class_method_visibility(call, Visibility::Public)
                }
                "private_class_method" => {
                    return self.visit_class_method_visibility(call, Visibility::Private)
                }
                "public_constant" => {
                    return self.visit_constant_visibility(call, Visibility::Public)
                }
                "private_constant" => {
                    return self.visit_constant_visibility(call, Visibility::Private)
                }
                "alias_method" => {
                    if let Some([new_name, old_name]) = call.literal_names().as_deref() {
                        return self.add_alias(old_name, new_name, span.start_line);
                    }
                }
                "require" | "require_relative" => return self.visit_require(span, call),
                _ => {}
            }
        }

        // Comments targeting the call line describe the call, not its block body
        if call.block.is_some() {
            self.process_comments_until(span.start_line);
        }
        self.visit_call_children(call);
    }

    fn visit_call_children(&mut self, call: &Call) {
        if let Some(receiver) = &call.receiver {
            self.visit(receiver);
        }
        self.visit_all(call.args());
        if let Some(block) = &call.block {
            self.visit(block);
        }
    }

    fn visit_attribute_call(&mut self, span: Span, call: &Call, mode: AttrMode) {
        let Some((names, mode)) = attribute_names(call, mode) else {
            self.visit_call_children(call);
            return;
        };

        let declared = self.declaration_comment(span.start_line);
        let flags = self.doc_flags(declared.as_ref().map(|(_, p)| p), &[span.start_line]);
        if self.stack.in_block() || !self.should_document(&flags) {
            return;
        }

        let frame = self.stack.current().clone();
        let owner = self.member_owner(frame.container);
        let comment = match &declared {
            Some((block, parsed)) => self.comment_from(block, parsed),
            None => None,
        };
        for name in names {
            self.store.add_attribute(
                owner,
                Attribute {
                    name,
                    mode,
                    singleton: frame.singleton,
                    visibility: frame.visibility,
                    comment: comment.clone(),
                    location: self.location(span.start_line),
                },
            );
        }
    }

    fn visit_mixin_call(&mut self, span: Span, call: &Call, kind: MixinKind) {
        let names: Vec<String> = match call.constant_paths() {
            Some(paths) if !paths.is_empty() => paths.iter().map(|p| p.to_string()).collect(),
            _ => {
                self.visit_call_children(call);
                return;
            }
        };

        let declared = self.declaration_comment(span.start_line);
        let flags = self.doc_flags(declared.as_ref().map(|(_, p)| p), &[span.start_line]);
        if self.stack.in_block() || !self.should_document(&flags) {
            return;
        }

        let frame = self.stack.current();
        let (container, singleton) = (frame.container, frame.singleton);
        // Inside `class << self`, include extends the outer namespace and
        // extend targets the metaclass, which is not tracked
        let kind = match (kind, singleton) {
            (MixinKind::Include, true) => MixinKind::Extend,
            (MixinKind::Extend, true) => return,
            (kind, false) => kind,
        };

        let owner = self.member_owner(container);
        let comment = match &declared {
            Some((block, parsed)) => self.comment_from(block, parsed),
            None => None,
        };
        let location = self.location(span.start_line);
        for name in names {
            self.store
                .add_mixin(owner, kind, &name, comment.clone(), location);
        }
    }

    fn visit_visibility_call(&mut self, call: &Call, visibility: Visibility) {
        let Some(args) = &call.arguments else {
            if !self.stack.in_block() {
                self.stack.set_visibility(visibility);
            }
            return;
        };

        // `private def foo` defines `foo` before changing it
        self.visit_all(args);
        if self.stack.in_block() {
            return;
        }
        let names = visibility_targets(call, false);
        if names.is_empty() {
            return;
        }
        let frame = self.stack.current();
        let (container, singleton) = (frame.container, frame.singleton);
        let owner = self.member_owner(container);
        self.store
            .set_method_visibility(owner, &names, singleton, visibility);
    }

    fn visit_module_function(&mut self, call: &Call) {
        let in_singleton = self.stack.current().singleton;
        let Some(args) = &call.arguments else {
            if !self.stack.in_block() && !in_singleton {
                self.stack.set_module_function();
            }
            return;
        };

        self.visit_all(args);
        if self.stack.in_block() || in_singleton {
            return;
        }
        let names = visibility_targets(call, false);
        let owner = self.member_owner(self.stack.current().container);
        self.store.make_module_functions(owner, &names);
    }

    fn visit_class_method_visibility(&mut self, call: &Call, visibility: Visibility) {
        self.visit_all(call.args());
        if self.stack.in_block() || self.stack.current().singleton {
            return;
        }
        let names = visibility_targets(call, true);
        let owner = self.member_owner(self.stack.current().container);
        self.store
            .set_method_visibility(owner, &names, true, visibility);
    }

    fn visit_constant_visibility(&mut self, call: &Call, visibility: Visibility) {
        if self.stack.in_block() || self.stack.current().singleton {
            return;
        }
        let Some(names) = call.literal_names() else {
            return;
        };
        let container = self.stack.current().container;
        self.store
            .set_constant_visibility(container, &names, visibility);
    }

    fn visit_require(&mut self, span: Span, call: &Call) {
        let name = match call.args() {
            [Node {
                kind: NodeKind::Str(name),
                ..
            }] => name.clone(),
            _ => {
                self.visit_call_children(call);
                return;
            }
        };
        if !self.config.record_requires {
            return;
        }

        let require = Require {
            name,
            location: self.location(span.start_line),
        };
        let container = self.stack.current().container;
        if container == self.store.root() {
            self.store.add_file_require(self.file, require);
        } else {
            self.store.add_require(container, require);
        }
    }
}
