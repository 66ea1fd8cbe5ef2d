//! Ruby source adapter built on tree-sitter-ruby.
//!
//! Lowers the concrete syntax tree into [`crate::syntax`] nodes and collects
//! every comment with its line span.

use std::path::Path;

use rbdoc_core::{ConstantPath, Error, ExtractorConfig, Result};
use tree_sitter::{Node as TsNode, Parser};

use crate::syntax::{
    AliasDecl, Call, CommentKind, ConstantAssign, DeclKind, MethodDef, NamespaceDecl, Node,
    NodeKind, RawComment, SingletonClassDecl, Span, SyntaxTree,
};
use crate::{Extractor, LanguageDescriptor};

/// Identifiers that are calls even without arguments
const BARE_CALLS: &[&str] = &["public", "private", "protected", "module_function"];

inventory::submit! {
    LanguageDescriptor {
        name: "ruby",
        extensions: &["rb", "rake", "gemspec", "ru"],
        factory: create_ruby_extractor,
    }
}

fn create_ruby_extractor(config: &ExtractorConfig) -> Result<Box<dyn Extractor>> {
    Ok(Box::new(RubyExtractor::new(config.clone())))
}

/// Extractor for Ruby source files
pub struct RubyExtractor {
    config: ExtractorConfig,
}

impl RubyExtractor {
    pub fn new(config: ExtractorConfig) -> Self {
        Self { config }
    }
}

impl Extractor for RubyExtractor {
    fn config(&self) -> &ExtractorConfig {
        &self.config
    }

    fn parse(&self, source: &str, file_path: &Path) -> Result<SyntaxTree> {
        parse_ruby(source)
            .map_err(|e| Error::parse(file_path.display().to_string(), e.to_string()))
    }
}

/// Parse Ruby source into the walker's syntax tree
pub fn parse_ruby(source: &str) -> Result<SyntaxTree> {
    let mut parser = Parser::new();
    parser
        .set_language(&tree_sitter_ruby::LANGUAGE.into())
        .map_err(|e| anyhow::anyhow!("Failed to set Ruby language: {e}"))?;

    let tree = parser
        .parse(source, None)
        .ok_or_else(|| anyhow::anyhow!("Failed to parse source code"))?;
    let root = tree.root_node();
    if root.has_error() {
        tracing::debug!("syntax errors present, lowering what parsed");
    }

    let lowering = Lowering { source };
    let mut comments = Vec::new();
    lowering.collect_comments(root, &mut comments);
    comments.sort_by_key(|c| (c.start_line, c.end_line));

    Ok(SyntaxTree {
        nodes: lowering.statements(root, &[]),
        comments,
    })
}

struct Lowering<'a> {
    source: &'a str,
}

impl<'a> Lowering<'a> {
    fn text(&self, node: TsNode) -> &'a str {
        node.utf8_text(self.source.as_bytes()).unwrap_or_default()
    }

    /// 1-based line span; a node ending at column 0 ends on the line before
    fn span(node: TsNode) -> Span {
        let start = node.start_position();
        let end = node.end_position();
        let end_row = if end.column == 0 && end.row > start.row {
            end.row - 1
        } else {
            end.row
        };
        Span::new(start.row + 1, end_row + 1, node.start_byte(), node.end_byte())
    }

    fn collect_comments(&self, node: TsNode, out: &mut Vec<RawComment>) {
        if node.kind() == "comment" {
            let text = self.text(node).trim_end();
            let span = Self::span(node);
            out.push(RawComment {
                text: text.to_string(),
                start_line: span.start_line,
                end_line: span.end_line,
                kind: if text.starts_with("=begin") {
                    CommentKind::Block
                } else {
                    CommentKind::Line
                },
            });
            return;
        }
        let mut cursor = node.walk();
        for child in node.children(&mut cursor) {
            self.collect_comments(child, out);
        }
    }

    /// Lower the named children of `node` except those in `skip`, flattening
    /// statement bodies
    fn statements(&self, node: TsNode, skip: &[usize]) -> Vec<Node> {
        let mut cursor = node.walk();
        let mut lowered = Vec::new();
        for child in node.named_children(&mut cursor) {
            if skip.contains(&child.id()) {
                continue;
            }
            match child.kind() {
                "body_statement" | "block_body" => lowered.extend(self.statements(child, &[])),
                "block_parameters" | "comment" => {}
                _ => lowered.extend(self.lower(child)),
            }
        }
        lowered
    }

    fn lower(&self, node: TsNode) -> Option<Node> {
        let kind = match node.kind() {
            "comment" | "uninterpreted" => return None,
            "class" => self.namespace(node, DeclKind::Class),
            "module" => self.namespace(node, DeclKind::Module),
            "singleton_class" => self.singleton_class(node)?,
            "method" | "singleton_method" => self.method(node)?,
            "assignment" => self.assignment(node),
            "call" => self.call(node),
            "alias" => self.alias(node)?,
            "identifier" => {
                let name = self.text(node);
                if BARE_CALLS.contains(&name) {
                    NodeKind::Call(Call {
                        receiver: None,
                        method: name.to_string(),
                        arguments: None,
                        block: None,
                    })
                } else {
                    NodeKind::Identifier(name.to_string())
                }
            }
            "block" | "do_block" => NodeKind::Block(self.statements(node, &[])),
            "constant" | "scope_resolution" => match self.constant_path(node) {
                Some(path) => NodeKind::Constant(path),
                None => NodeKind::Other(self.statements(node, &[])),
            },
            "simple_symbol" => NodeKind::Symbol(self.text(node).trim_start_matches(':').to_string()),
            "delimited_symbol" => match self.plain_string(node) {
                Some(name) => NodeKind::Symbol(name),
                None => NodeKind::Other(self.statements(node, &[])),
            },
            "string" => match self.plain_string(node) {
                Some(value) => NodeKind::Str(value),
                None => NodeKind::Other(self.statements(node, &[])),
            },
            "self" => NodeKind::SelfRef,
            "nil" => NodeKind::Nil,
            "true" => NodeKind::True,
            "false" => NodeKind::False,
            "parenthesized_statements" if node.named_child_count() == 1 => {
                return node.named_child(0).and_then(|inner| self.lower(inner));
            }
            _ => NodeKind::Other(self.statements(node, &[])),
        };
        Some(Node::new(Self::span(node), kind))
    }

    fn constant_path(&self, node: TsNode) -> Option<ConstantPath> {
        match node.kind() {
            "constant" => Some(ConstantPath::simple(self.text(node))),
            "scope_resolution" => {
                let name = node.child_by_field_name("name")?;
                if name.kind() != "constant" {
                    return None;
                }
                match node.child_by_field_name("scope") {
                    None => Some(ConstantPath {
                        absolute: true,
                        segments: vec![self.text(name).to_string()],
                    }),
                    Some(scope) => {
                        let mut path = self.constant_path(scope)?;
                        path.segments.push(self.text(name).to_string());
                        Some(path)
                    }
                }
            }
            _ => None,
        }
    }

    /// Contents of a string or symbol without interpolation
    fn plain_string(&self, node: TsNode) -> Option<String> {
        let mut cursor = node.walk();
        let mut value = String::new();
        for child in node.named_children(&mut cursor) {
            if child.kind() != "string_content" {
                return None;
            }
            value.push_str(self.text(child));
        }
        Some(value)
    }

    fn namespace(&self, node: TsNode, kind: DeclKind) -> NodeKind {
        let name = node.child_by_field_name("name");
        let superclass = node.child_by_field_name("superclass");
        let superclass_expr = superclass.and_then(|s| s.named_child(0));
        let skip: Vec<usize> = [name, superclass].iter().flatten().map(|n| n.id()).collect();

        NodeKind::Namespace(NamespaceDecl {
            kind,
            path: name.and_then(|n| self.constant_path(n)),
            superclass: superclass_expr
                .and_then(|expr| self.lower(expr))
                .map(Box::new),
            superclass_text: superclass_expr.map(|expr| self.text(expr).to_string()),
            body: self.statements(node, &skip),
        })
    }

    fn singleton_class(&self, node: TsNode) -> Option<NodeKind> {
        let value = node.child_by_field_name("value")?;
        Some(NodeKind::SingletonClass(SingletonClassDecl {
            target: Box::new(self.lower(value)?),
            body: self.statements(node, &[value.id()]),
        }))
    }

    fn method(&self, node: TsNode) -> Option<NodeKind> {
        let name = node.child_by_field_name("name")?;
        let parameters = node.child_by_field_name("parameters");
        let object = node.child_by_field_name("object");
        let skip: Vec<usize> = [Some(name), parameters, object]
            .iter()
            .flatten()
            .map(|n| n.id())
            .collect();

        let params = match parameters {
            Some(p) => {
                let text = self.text(p).trim();
                if text.starts_with('(') {
                    text.to_string()
                } else {
                    format!("({text})")
                }
            }
            None => "()".to_string(),
        };
        let params_end_line = parameters
            .map(|p| Self::span(p).end_line)
            .unwrap_or_else(|| Self::span(node).start_line);

        Some(NodeKind::MethodDef(MethodDef {
            receiver: object.and_then(|o| self.receiver(o)).map(Box::new),
            name: self.text(name).to_string(),
            params,
            params_end_line,
            body: self.statements(node, &skip),
        }))
    }

    /// The grammar reports `nil`, `true` and `false` in receiver position as
    /// plain identifiers
    fn receiver(&self, node: TsNode) -> Option<Node> {
        if node.kind() != "identifier" {
            return self.lower(node);
        }
        let kind = match self.text(node) {
            "nil" => NodeKind::Nil,
            "true" => NodeKind::True,
            "false" => NodeKind::False,
            _ => return self.lower(node),
        };
        Some(Node::new(Self::span(node), kind))
    }

    fn assignment(&self, node: TsNode) -> NodeKind {
        let target = node
            .child_by_field_name("left")
            .and_then(|left| self.constant_path(left));
        let right = node.child_by_field_name("right");

        match (target, right) {
            (Some(target), Some(right)) => match self.lower(right) {
                Some(value) => NodeKind::ConstantAssign(ConstantAssign {
                    target,
                    value: Box::new(value),
                    value_text: self.text(right).to_string(),
                }),
                None => NodeKind::Other(Vec::new()),
            },
            _ => NodeKind::Other(self.statements(node, &[])),
        }
    }

    fn call(&self, node: TsNode) -> NodeKind {
        NodeKind::Call(Call {
            receiver: node
                .child_by_field_name("receiver")
                .and_then(|r| self.lower(r))
                .map(Box::new),
            method: node
                .child_by_field_name("method")
                .map(|m| self.text(m).to_string())
                .unwrap_or_default(),
            arguments: node
                .child_by_field_name("arguments")
                .map(|args| self.statements(args, &[])),
            block: node
                .child_by_field_name("block")
                .and_then(|b| self.lower(b))
                .map(Box::new),
        })
    }

    fn alias(&self, node: TsNode) -> Option<NodeKind> {
        let new_name = node.child_by_field_name("name")?;
        let old_name = node.child_by_field_name("alias")?;
        Some(NodeKind::Alias(AliasDecl {
            new_name: self.text(new_name).trim_start_matches(':').to_string(),
            old_name: self.text(old_name).trim_start_matches(':').to_string(),
        }))
    }
}

#[cfg(test)]
mod tests;
