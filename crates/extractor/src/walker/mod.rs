//! Syntax tree walk that builds the documentation model.
//!
//! The walker visits declarations in source order. Before each one it
//! flushes the comment blocks that ended before it, then pulls the block
//! targeting its first line. Namespace bodies push a frame on the nesting
//! stack; comments left inside a body are flushed before the frame is
//! popped.

mod calls;
mod declarations;

#[cfg(test)]
mod tests;

use std::collections::HashMap;
use std::ops::Range;
use std::str::FromStr;

use rbdoc_core::{
    Attribute, Comment, Error, ExtractorConfig, FileId, Markup, Method, NamespaceId,
    NamespaceKind, SourceLocation, Store, Visibility, Warning, WarningKind,
};

use crate::comments::{CommentAggregator, CommentBlock};
use crate::directives::{self, Directive, Nodoc, ParsedComment};
use crate::nesting::NestingStack;
use crate::syntax::{Node, NodeKind, SyntaxTree};
use crate::ScanReport;

/// Call or method definition starting on a line, for free-floating `##`
/// comments that name their target implicitly
#[derive(Debug, Clone)]
struct LineNode {
    start_line: usize,
    /// Method name for a definition, first literal argument for a call
    name: Option<String>,
    arg_names: Vec<String>,
    range: Range<usize>,
}

/// Documentation switches of one declaration
#[derive(Debug, Default, Clone, Copy)]
struct DocFlags {
    nodoc: Option<Nodoc>,
    force: bool,
}

pub(crate) struct Walker<'a> {
    store: &'a mut Store,
    config: &'a ExtractorConfig,
    file: FileId,
    markup: Markup,
    comments: CommentAggregator,
    stack: NestingStack,
    line_nodes: HashMap<usize, LineNode>,
    warnings: Vec<Warning>,
}

impl<'a> Walker<'a> {
    pub(crate) fn new(
        store: &'a mut Store,
        config: &'a ExtractorConfig,
        file: FileId,
        tree: &SyntaxTree,
        source: &str,
    ) -> Self {
        let lines: Vec<&str> = source.lines().collect();
        let comments = CommentAggregator::new(&tree.comments, &lines);
        let mut line_nodes = HashMap::new();
        index_lines(&tree.nodes, &mut line_nodes);

        let stack = NestingStack::new(store.root());
        let mut walker = Self {
            store,
            config,
            file,
            markup: config.markup,
            comments,
            stack,
            line_nodes,
            warnings: Vec::new(),
        };

        if let Some(directive) = walker.comments.header_markup().cloned() {
            if let Some(markup) = walker.markup_value(&directive) {
                walker.markup = markup;
            }
        }
        walker.store.file_mut(file).markup = walker.markup;
        walker
    }

    pub(crate) fn run(mut self, nodes: &[Node]) -> ScanReport {
        self.visit_all(nodes);
        tracing::trace!(pending = self.comments.remaining(), "flushing trailing comments");
        self.process_comments_until(usize::MAX);
        ScanReport {
            file: self.file,
            warnings: self.warnings,
            locally_hidden: self.stack.into_locally_hidden(),
        }
    }

    // -- Dispatch ---------------------------------------------------------------

    fn visit_all(&mut self, nodes: &[Node]) {
        for node in nodes {
            self.visit(node);
        }
    }

    fn visit(&mut self, node: &Node) {
        match &node.kind {
            NodeKind::Namespace(decl) => self.visit_namespace(node, decl),
            NodeKind::SingletonClass(decl) => self.visit_singleton_class(node, decl),
            NodeKind::MethodDef(def) => self.visit_method_def(node, def),
            NodeKind::ConstantAssign(assign) => self.visit_constant_assign(node, assign),
            NodeKind::Call(call) => self.visit_call(node, call),
            NodeKind::Alias(alias) => {
                self.process_comments_until(node.span.start_line.saturating_sub(1));
                self.add_alias(&alias.old_name, &alias.new_name, node.span.start_line);
            }
            NodeKind::Block(body) => NestingStack::with_block(self, |walker| walker.visit_all(body)),
            NodeKind::Other(children) => self.visit_all(children),
            NodeKind::Constant(_)
            | NodeKind::Symbol(_)
            | NodeKind::Str(_)
            | NodeKind::SelfRef
            | NodeKind::Nil
            | NodeKind::True
            | NodeKind::False
            | NodeKind::Identifier(_) => {}
        }
    }

    // -- Comments ---------------------------------------------------------------

    /// Handle every block whose target line is at or before `line` as a
    /// free-floating comment of the current frame
    fn process_comments_until(&mut self, line: usize) {
        for block in self.comments.process_until(line) {
            self.handle_free_comment(block);
        }
    }

    /// The block documenting a declaration that starts on `line`, with its
    /// state directives applied to the current frame.
    ///
    /// A block separated from the declaration by blank lines is handled as
    /// free-floating instead.
    fn declaration_comment(&mut self, line: usize) -> Option<(CommentBlock, ParsedComment)> {
        let block = self.comments.take_at(line)?;
        if !block.is_adjacent() {
            self.handle_free_comment(block);
            return None;
        }
        let parsed = self.parse_block(&block);
        self.apply_transitions(&parsed);
        Some((block, parsed))
    }

    fn handle_free_comment(&mut self, block: CommentBlock) {
        let parsed = self.parse_block(&block);
        self.apply_transitions(&parsed);

        let header = self.comments.is_header(&block);
        if !header && self.config.meta_method_comments && is_meta_comment(&block, &parsed) {
            self.add_meta_member(&block, &parsed);
            return;
        }

        if header {
            if let Some(comment) = self.comment_from(&block, &parsed) {
                let file = self.store.file_mut(self.file);
                if file.comment.is_none() {
                    file.comment = Some(comment);
                }
            }
        }
    }

    fn parse_block(&mut self, block: &CommentBlock) -> ParsedComment {
        let mut parsed = directives::parse(&block.text, block.text_start_line);
        for err in std::mem::take(&mut parsed.errors) {
            let line = match &err {
                Error::AmbiguousDirective { line, .. } => *line,
                _ => block.start_line,
            };
            self.warn(line, WarningKind::AmbiguousDirective, err.to_string());
        }
        parsed
    }

    fn apply_transitions(&mut self, parsed: &ParsedComment) {
        for &(directive, line) in parsed.transitions() {
            if let Some((kind, message)) = self.stack.apply(directive) {
                self.warn(line, kind, message);
            }
        }
    }

    /// Prose of a parsed block as a model comment, `None` when empty
    fn comment_from(&mut self, block: &CommentBlock, parsed: &ParsedComment) -> Option<Comment> {
        if parsed.text.trim().is_empty() {
            return None;
        }
        let format = match parsed.markup() {
            Some(directive) if !self.comments.is_header(block) => {
                self.markup_value(directive).unwrap_or(self.markup)
            }
            _ => self.markup,
        };
        Some(Comment::new(
            parsed.text.clone(),
            format,
            SourceLocation::new(self.file, block.start_line),
        ))
    }

    fn markup_value(&mut self, directive: &Directive) -> Option<Markup> {
        match Markup::from_str(directive.value.trim()) {
            Ok(markup) => Some(markup),
            Err(_) => {
                self.warn(
                    directive.line,
                    WarningKind::UnknownMarkup,
                    format!("unknown markup {:?}", directive.value),
                );
                None
            }
        }
    }

    /// Directives of the declaration comment combined with trailing
    /// comments on `lines`
    fn doc_flags(&self, parsed: Option<&ParsedComment>, lines: &[usize]) -> DocFlags {
        let mut flags = DocFlags::default();
        if let Some(parsed) = parsed {
            flags.nodoc = parsed.nodoc();
            flags.force = parsed.forces_doc();
        }

        let mut seen: Vec<usize> = Vec::with_capacity(lines.len());
        for &line in lines {
            if seen.contains(&line) {
                continue;
            }
            seen.push(line);
            let Some(text) = self.comments.modifier(line) else {
                continue;
            };
            let modifier = directives::parse(text, line);
            flags.nodoc = flags.nodoc.or(modifier.nodoc());
            flags.force |= modifier.forces_doc();
        }
        flags
    }

    fn should_document(&self, flags: &DocFlags) -> bool {
        if flags.nodoc.is_some() {
            return false;
        }
        self.stack.is_documenting() || (flags.force && self.stack.can_force())
    }

    // -- Free-floating `##` comments ----------------------------------------------

    fn add_meta_member(&mut self, block: &CommentBlock, parsed: &ParsedComment) {
        if self.stack.in_block() {
            return;
        }
        let flags = self.doc_flags(Some(parsed), &[]);
        if !self.should_document(&flags) {
            return;
        }

        let node = self.line_nodes.get(&block.target_line).cloned();
        let frame = self.stack.current().clone();
        let owner = self.member_owner(frame.container);
        let comment = self.comment_from(block, parsed);

        if let Some(attr) = parsed.meta_attribute() {
            let names = if attr.names.is_empty() {
                node.map(|n| n.arg_names).unwrap_or_default()
            } else {
                attr.names
            };
            for name in names {
                self.store.add_attribute(
                    owner,
                    Attribute {
                        name,
                        mode: attr.mode,
                        singleton: frame.singleton,
                        visibility: frame.visibility,
                        comment: comment.clone(),
                        location: SourceLocation::new(self.file, attr.line),
                    },
                );
            }
            return;
        }

        let meta = parsed.meta_method();
        let name = meta
            .as_ref()
            .and_then(|m| m.name.clone())
            .or_else(|| node.as_ref().and_then(|n| n.name.clone()))
            .or_else(|| parsed.call_seq().and_then(name_from_call_seq))
            .unwrap_or_else(|| "unknown".to_string());
        let forced_singleton = meta.as_ref().is_some_and(|m| m.singleton);
        let singleton = frame.singleton || forced_singleton;
        let visibility = if forced_singleton {
            Visibility::Public
        } else {
            frame.visibility
        };
        let line = node
            .as_ref()
            .map(|n| n.start_line)
            .or(meta.as_ref().map(|m| m.line))
            .unwrap_or(block.start_line);

        let method = Method::builder()
            .name(name)
            .singleton(singleton)
            .visibility(visibility)
            .call_seq(parsed.call_seq().map(String::from))
            .block_params(parsed.yields().map(String::from))
            .synthetic(true)
            .comment(comment)
            .location(SourceLocation::new(self.file, line))
            .token_range(node.map(|n| n.range))
            .build();
        match method {
            Ok(method) => {
                tracing::trace!(method = %method.name, line, "synthetic method from comment");
                self.store.add_method(owner, method);
            }
            Err(err) => tracing::warn!(error = %err, line, "could not build synthetic method"),
        }
    }

    // -- Helpers -----------------------------------------------------------------

    /// Members declared at the top level belong to `Object`
    fn member_owner(&mut self, container: NamespaceId) -> NamespaceId {
        if container == self.store.root() {
            self.builtin_class("Object")
        } else {
            container
        }
    }

    fn builtin_class(&mut self, name: &str) -> NamespaceId {
        let root = self.store.root();
        self.store
            .find_or_create_namespace(root, name, NamespaceKind::Class)
    }

    fn location(&self, line: usize) -> SourceLocation {
        SourceLocation::new(self.file, line)
    }

    fn warn(&mut self, line: usize, kind: WarningKind, message: impl Into<String>) {
        let message = message.into();
        tracing::debug!(line, kind = %kind, %message, "scan warning");
        self.warnings.push(Warning {
            file: self.file,
            line,
            kind,
            message,
        });
    }
}

impl AsMut<NestingStack> for Walker<'_> {
    fn as_mut(&mut self) -> &mut NestingStack {
        &mut self.stack
    }
}

fn is_meta_comment(block: &CommentBlock, parsed: &ParsedComment) -> bool {
    if parsed.section().is_some() {
        return false;
    }
    block.meta || parsed.meta_method().is_some() || parsed.meta_attribute().is_some()
}

/// `obj.name(args) -> result` gives `name`
fn name_from_call_seq(call_seq: &str) -> Option<String> {
    let first = call_seq.lines().next()?.trim();
    let head = first
        .split(|c: char| c == '(' || c == '{' || c.is_whitespace())
        .next()?;
    let name = head.rsplit('.').next()?;
    (!name.is_empty()).then(|| name.to_string())
}

fn index_lines(nodes: &[Node], index: &mut HashMap<usize, LineNode>) {
    for node in nodes {
        let line = node.span.start_line;
        match &node.kind {
            NodeKind::Namespace(decl) => index_lines(&decl.body, index),
            NodeKind::SingletonClass(decl) => index_lines(&decl.body, index),
            NodeKind::MethodDef(def) => {
                index.entry(line).or_insert_with(|| LineNode {
                    start_line: line,
                    name: Some(def.name.clone()),
                    arg_names: Vec::new(),
                    range: node.span.byte_range(),
                });
            }
            NodeKind::Call(call) => {
                index.entry(line).or_insert_with(|| LineNode {
                    start_line: line,
                    name: call.first_literal_name().map(String::from),
                    arg_names: call.literal_names().unwrap_or_default(),
                    range: node.span.byte_range(),
                });
                index_lines(call.args(), index);
                if let Some(block) = &call.block {
                    index_lines(std::slice::from_ref(block.as_ref()), index);
                }
            }
            NodeKind::Block(body) | NodeKind::Other(body) => index_lines(body, index),
            NodeKind::ConstantAssign(_)
            | NodeKind::Alias(_)
            | NodeKind::Constant(_)
            | NodeKind::Symbol(_)
            | NodeKind::Str(_)
            | NodeKind::SelfRef
            | NodeKind::Nil
            | NodeKind::True
            | NodeKind::False
            | NodeKind::Identifier(_) => {}
        }
    }
}
