//! Language-neutral syntax tree consumed by the walker.
//!
//! The parser adapter lowers whatever its grammar produces into these node
//! kinds. Anything the walker has no rule for becomes [`NodeKind::Other`]
//! and is only descended into.

use rbdoc_core::ConstantPath;
use std::ops::Range;

/// Line and byte extent of a node. Lines are 1-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Span {
    pub start_line: usize,
    pub end_line: usize,
    pub start_byte: usize,
    pub end_byte: usize,
}

impl Span {
    pub fn new(start_line: usize, end_line: usize, start_byte: usize, end_byte: usize) -> Self {
        Self {
            start_line,
            end_line,
            start_byte,
            end_byte,
        }
    }

    /// Span covering only line numbers, for hand-built trees
    pub fn lines(start_line: usize, end_line: usize) -> Self {
        Self::new(start_line, end_line, 0, 0)
    }

    pub fn byte_range(&self) -> Range<usize> {
        self.start_byte..self.end_byte
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub span: Span,
    pub kind: NodeKind,
}

impl Node {
    pub fn new(span: Span, kind: NodeKind) -> Self {
        Self { span, kind }
    }

    /// Constant path if this node is a constant reference
    pub fn constant_path(&self) -> Option<&ConstantPath> {
        match &self.kind {
            NodeKind::Constant(path) => Some(path),
            _ => None,
        }
    }

    /// Value of a symbol or plain string literal
    pub fn literal_name(&self) -> Option<&str> {
        match &self.kind {
            NodeKind::Symbol(name) | NodeKind::Str(name) => Some(name),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeclKind {
    Class,
    Module,
}

/// `class Name < Super ... end` or `module Name ... end`
#[derive(Debug, Clone, PartialEq)]
pub struct NamespaceDecl {
    pub kind: DeclKind,
    /// `None` when the name is not a constant path (e.g. `class foo::Bar`)
    pub path: Option<ConstantPath>,
    pub superclass: Option<Box<Node>>,
    /// Source text of the superclass expression
    pub superclass_text: Option<String>,
    pub body: Vec<Node>,
}

/// `class << target ... end`
#[derive(Debug, Clone, PartialEq)]
pub struct SingletonClassDecl {
    pub target: Box<Node>,
    pub body: Vec<Node>,
}

/// `def name(params) ... end`, `def receiver.name ... end`
#[derive(Debug, Clone, PartialEq)]
pub struct MethodDef {
    pub receiver: Option<Box<Node>>,
    pub name: String,
    /// Parameter list as written, always parenthesized
    pub params: String,
    /// Last line of the signature; a modifier comment may sit there
    pub params_end_line: usize,
    pub body: Vec<Node>,
}

/// `NAME = value` or `Owner::NAME = value`
#[derive(Debug, Clone, PartialEq)]
pub struct ConstantAssign {
    pub target: ConstantPath,
    pub value: Box<Node>,
    pub value_text: String,
}

/// A method call. `arguments` is `None` when the call has no argument list
/// at all, which distinguishes bare `private` from `private()`.
#[derive(Debug, Clone, PartialEq)]
pub struct Call {
    pub receiver: Option<Box<Node>>,
    pub method: String,
    pub arguments: Option<Vec<Node>>,
    /// Attached `do ... end` or `{ ... }`, lowered to [`NodeKind::Block`]
    pub block: Option<Box<Node>>,
}

impl Call {
    pub fn args(&self) -> &[Node] {
        self.arguments.as_deref().unwrap_or_default()
    }

    /// Names of all arguments if every one is a symbol or string literal
    pub fn literal_names(&self) -> Option<Vec<String>> {
        self.args()
            .iter()
            .map(|arg| arg.literal_name().map(String::from))
            .collect()
    }

    /// Paths of all arguments if every one is a constant reference
    pub fn constant_paths(&self) -> Option<Vec<&ConstantPath>> {
        self.args().iter().map(Node::constant_path).collect()
    }

    pub fn first_literal_name(&self) -> Option<&str> {
        self.args().first().and_then(Node::literal_name)
    }
}

/// `alias new old`
#[derive(Debug, Clone, PartialEq)]
pub struct AliasDecl {
    pub new_name: String,
    pub old_name: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    Namespace(NamespaceDecl),
    SingletonClass(SingletonClassDecl),
    MethodDef(MethodDef),
    ConstantAssign(ConstantAssign),
    Call(Call),
    Alias(AliasDecl),
    /// Body of a closure attached to a call
    Block(Vec<Node>),
    /// Constant reference
    Constant(ConstantPath),
    Symbol(String),
    Str(String),
    SelfRef,
    Nil,
    True,
    False,
    /// Bare identifier that is not a recognised call
    Identifier(String),
    /// Any other construct; only its children matter
    Other(Vec<Node>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommentKind {
    /// `# ...`
    Line,
    /// `=begin ... =end`
    Block,
}

/// A comment as the parser reports it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawComment {
    pub text: String,
    pub start_line: usize,
    pub end_line: usize,
    pub kind: CommentKind,
}

impl RawComment {
    pub fn line(text: impl Into<String>, line: usize) -> Self {
        Self {
            text: text.into(),
            start_line: line,
            end_line: line,
            kind: CommentKind::Line,
        }
    }
}

/// Everything the walker needs from a parsed file
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SyntaxTree {
    pub nodes: Vec<Node>,
    /// Ordered by position
    pub comments: Vec<RawComment>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sym(name: &str) -> Node {
        Node::new(Span::lines(1, 1), NodeKind::Symbol(name.into()))
    }

    #[test]
    fn test_literal_names_require_every_argument() {
        let call = Call {
            receiver: None,
            method: "attr_reader".into(),
            arguments: Some(vec![sym("a"), sym("b")]),
            block: None,
        };
        assert_eq!(call.literal_names(), Some(vec!["a".into(), "b".into()]));

        let mixed = Call {
            arguments: Some(vec![sym("a"), Node::new(Span::lines(1, 1), NodeKind::Nil)]),
            ..call
        };
        assert_eq!(mixed.literal_names(), None);
        assert_eq!(mixed.first_literal_name(), Some("a"));
    }

    #[test]
    fn test_bare_call_has_no_arguments() {
        let call = Call {
            receiver: None,
            method: "private".into(),
            arguments: None,
            block: None,
        };
        assert!(call.args().is_empty());
        assert_eq!(call.literal_names(), Some(vec![]));
    }
}
