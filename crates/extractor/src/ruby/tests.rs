use super::*;
use pretty_assertions::assert_eq;

fn parse(source: &str) -> SyntaxTree {
    parse_ruby(source).unwrap()
}

#[test]
fn test_class_with_superclass_and_method() {
    let tree = parse("class Foo < Bar\n  def baz(a, b = 1)\n    a + b\n  end\nend\n");
    assert_eq!(tree.nodes.len(), 1);

    let NodeKind::Namespace(decl) = &tree.nodes[0].kind else {
        panic!("expected a namespace, got {:?}", tree.nodes[0].kind);
    };
    assert_eq!(decl.kind, DeclKind::Class);
    assert_eq!(decl.path, Some(ConstantPath::simple("Foo")));
    assert_eq!(decl.superclass_text.as_deref(), Some("Bar"));
    assert_eq!(tree.nodes[0].span.start_line, 1);
    assert_eq!(tree.nodes[0].span.end_line, 5);

    assert_eq!(decl.body.len(), 1);
    let NodeKind::MethodDef(def) = &decl.body[0].kind else {
        panic!("expected a method, got {:?}", decl.body[0].kind);
    };
    assert_eq!(def.name, "baz");
    assert_eq!(def.params, "(a, b = 1)");
    assert_eq!(def.params_end_line, 2);
    assert!(def.receiver.is_none());
    assert_eq!(decl.body[0].span.start_line, 2);
    assert_eq!(decl.body[0].span.end_line, 4);
}

#[test]
fn test_qualified_module_name() {
    let tree = parse("module A::B\nend\nmodule ::Top\nend\n");
    let paths: Vec<String> = tree
        .nodes
        .iter()
        .filter_map(|node| match &node.kind {
            NodeKind::Namespace(decl) => decl.path.as_ref().map(|p| p.to_string()),
            _ => None,
        })
        .collect();
    assert_eq!(paths, vec!["A::B", "::Top"]);
}

#[test]
fn test_comments_are_collected_with_lines() {
    let tree = parse("# Docs.\nclass Foo # trailing\n  # inner\n  def x; end\nend\n");
    let lines: Vec<(usize, &str)> = tree
        .comments
        .iter()
        .map(|c| (c.start_line, c.text.as_str()))
        .collect();
    assert_eq!(
        lines,
        vec![(1, "# Docs."), (2, "# trailing"), (3, "# inner")]
    );
    assert!(tree.comments.iter().all(|c| c.kind == CommentKind::Line));
}

#[test]
fn test_block_comment_kind() {
    let tree = parse("=begin\nDocs.\n=end\ndef x; end\n");
    let block = tree
        .comments
        .iter()
        .find(|c| c.kind == CommentKind::Block)
        .unwrap();
    assert_eq!(block.start_line, 1);
    assert!(block.text.starts_with("=begin"));
}

#[test]
fn test_declaring_calls() {
    let tree = parse("attr_reader :a, \"b\"\nprivate\ninclude Foo::Bar\nprivate :x\n");
    let calls: Vec<&Call> = tree
        .nodes
        .iter()
        .filter_map(|node| match &node.kind {
            NodeKind::Call(call) => Some(call),
            _ => None,
        })
        .collect();
    assert_eq!(calls.len(), 4);

    assert_eq!(calls[0].method, "attr_reader");
    assert_eq!(
        calls[0].literal_names(),
        Some(vec!["a".to_string(), "b".to_string()])
    );

    assert_eq!(calls[1].method, "private");
    assert!(calls[1].arguments.is_none());

    assert_eq!(calls[2].method, "include");
    let paths = calls[2].constant_paths().unwrap();
    assert_eq!(paths[0].to_string(), "Foo::Bar");

    assert_eq!(calls[3].literal_names(), Some(vec!["x".to_string()]));
}

#[test]
fn test_singleton_forms() {
    let tree = parse("class Foo\n  def self.build\n  end\n  class << self\n    def make; end\n  end\nend\n");
    let NodeKind::Namespace(decl) = &tree.nodes[0].kind else {
        panic!("expected a namespace");
    };

    let NodeKind::MethodDef(build) = &decl.body[0].kind else {
        panic!("expected a method");
    };
    assert_eq!(build.name, "build");
    assert_eq!(
        build.receiver.as_deref().map(|r| &r.kind),
        Some(&NodeKind::SelfRef)
    );
    assert_eq!(build.params, "()");

    let NodeKind::SingletonClass(singleton) = &decl.body[1].kind else {
        panic!("expected a singleton class");
    };
    assert_eq!(singleton.target.kind, NodeKind::SelfRef);
    assert_eq!(singleton.body.len(), 1);
}

#[test]
fn test_literal_receivers() {
    let tree = parse("def nil.a; end\ndef true.b; end\ndef false.c; end\ndef obj.d; end\n");
    let receivers: Vec<NodeKind> = tree
        .nodes
        .iter()
        .map(|node| match &node.kind {
            NodeKind::MethodDef(def) => def.receiver.as_deref().unwrap().kind.clone(),
            other => panic!("expected a method, got {other:?}"),
        })
        .collect();
    assert_eq!(
        receivers,
        vec![
            NodeKind::Nil,
            NodeKind::True,
            NodeKind::False,
            NodeKind::Identifier("obj".into()),
        ]
    );
}

#[test]
fn test_constant_assignment_and_alias() {
    let tree = parse("VERSION = \"1.0\"\nalias new_name old_name\nalias :x :y\n");
    let NodeKind::ConstantAssign(assign) = &tree.nodes[0].kind else {
        panic!("expected a constant assignment");
    };
    assert_eq!(assign.target, ConstantPath::simple("VERSION"));
    assert_eq!(assign.value_text, "\"1.0\"");
    assert_eq!(assign.value.kind, NodeKind::Str("1.0".into()));

    let NodeKind::Alias(alias) = &tree.nodes[1].kind else {
        panic!("expected an alias");
    };
    assert_eq!(alias.new_name, "new_name");
    assert_eq!(alias.old_name, "old_name");

    let NodeKind::Alias(symbols) = &tree.nodes[2].kind else {
        panic!("expected an alias");
    };
    assert_eq!((symbols.new_name.as_str(), symbols.old_name.as_str()), ("x", "y"));
}

#[test]
fn test_call_with_block() {
    let tree = parse("included do\n  def helper; end\nend\n");
    let NodeKind::Call(call) = &tree.nodes[0].kind else {
        panic!("expected a call");
    };
    assert_eq!(call.method, "included");
    let block = call.block.as_deref().unwrap();
    let NodeKind::Block(body) = &block.kind else {
        panic!("expected a block");
    };
    assert!(matches!(body[0].kind, NodeKind::MethodDef(_)));
}

#[test]
fn test_extractor_registration() {
    let extractor = crate::create_extractor(Path::new("lib/foo.rb"), &ExtractorConfig::default())
        .unwrap()
        .unwrap();
    let tree = extractor.parse("module M; end", Path::new("lib/foo.rb")).unwrap();
    assert_eq!(tree.nodes.len(), 1);
}
