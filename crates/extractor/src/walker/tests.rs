use std::path::Path;

use pretty_assertions::assert_eq;
use rbdoc_core::{
    AttrMode, ExtractorConfig, Markup, Namespace, Store, Visibility, WarningKind,
};

use crate::{parse_ruby, scan_tree, ScanReport};

fn scan_with(config: &ExtractorConfig, store: &mut Store, source: &str) -> ScanReport {
    let tree = parse_ruby(source).unwrap();
    scan_tree(store, config, Path::new("lib/test.rb"), source, &tree)
}

fn scan(source: &str) -> (Store, ScanReport) {
    let mut store = Store::new();
    let report = scan_with(&ExtractorConfig::default(), &mut store, source);
    (store, report)
}

fn namespace<'s>(store: &'s Store, name: &str) -> &'s Namespace {
    store.namespace(store.find_namespace(name).unwrap())
}

fn method_names(ns: &Namespace) -> Vec<(&str, bool)> {
    ns.methods
        .iter()
        .map(|m| (m.name.as_str(), m.singleton))
        .collect()
}

#[test]
fn test_ambiguous_directive_becomes_warning() {
    let source = "\
class Foo
  # Bar.
  # :markup: markdown
  # :markup: rd
  def bar; end
end
";
    let (store, report) = scan(source);

    assert_eq!(report.warnings.len(), 1);
    assert_eq!(report.warnings[0].kind, WarningKind::AmbiguousDirective);
    assert_eq!(report.warnings[0].line, 4);

    let bar = namespace(&store, "Foo").find_method("bar", false).unwrap();
    let comment = bar.comment.as_ref().unwrap();
    assert_eq!(comment.text, "Bar.");
    assert_eq!(comment.format, Markup::Markdown);
}

#[test]
fn test_stopdoc_doc_and_startdoc() {
    let source = "\
class Foo
  # :stopdoc:
  def hidden; end

  # :doc:
  def forced; end

  # :startdoc:
  def shown; end
end
";
    let (store, report) = scan(source);
    assert!(report.warnings.is_empty());
    assert_eq!(
        method_names(namespace(&store, "Foo")),
        vec![("forced", false), ("shown", false)]
    );
}

#[test]
fn test_redundant_startdoc_warns() {
    let (_, report) = scan("class Foo\n  # :startdoc:\nend\n");
    assert_eq!(report.warnings.len(), 1);
    assert_eq!(report.warnings[0].kind, WarningKind::RedundantDirective);
    assert_eq!(report.warnings[0].line, 2);
}

#[test]
fn test_enddoc_cannot_be_undone() {
    let source = "\
class Foo
  def before; end
  # :enddoc:

  # :startdoc:
  def after; end
end
";
    let (store, report) = scan(source);
    assert_eq!(method_names(namespace(&store, "Foo")), vec![("before", false)]);
    assert_eq!(report.warnings.len(), 1);
    assert_eq!(report.warnings[0].kind, WarningKind::IgnoredDirective);
}

#[test]
fn test_meta_comments_create_synthetic_methods() {
    let source = "\
class Foo
  ##
  # :method: run
  # Runs the job.

  ##
  # :singleton-method: build
  # Builds one.
end
";
    let (store, _) = scan(source);
    let foo = namespace(&store, "Foo");

    let run = foo.find_method("run", false).unwrap();
    assert!(run.synthetic);
    assert_eq!(run.comment.as_ref().unwrap().text, "Runs the job.");
    assert_eq!(run.location.line, 3);

    let build = foo.find_method("build", true).unwrap();
    assert_eq!(build.visibility, Visibility::Public);
    assert_eq!(build.comment.as_ref().unwrap().text, "Builds one.");
}

#[test]
fn test_meta_comment_takes_name_from_call() {
    let source = "\
class Foo
  ##
  # Defines a reader.
  define_reader :size
end
";
    let (store, _) = scan(source);
    let size = namespace(&store, "Foo").find_method("size", false).unwrap();
    assert!(size.synthetic);
    assert_eq!(size.location.line, 4);
    assert_eq!(size.comment.as_ref().unwrap().text, "Defines a reader.");
}

#[test]
fn test_meta_attribute() {
    let source = "\
class Foo
  ##
  # :attr_accessor: name, size
  # Settings.
end
";
    let (store, _) = scan(source);
    let foo = namespace(&store, "Foo");
    let names: Vec<(&str, AttrMode)> = foo
        .attributes
        .iter()
        .map(|a| (a.name.as_str(), a.mode))
        .collect();
    assert_eq!(
        names,
        vec![("name", AttrMode::ReadWrite), ("size", AttrMode::ReadWrite)]
    );
}

#[test]
fn test_meta_comments_can_be_disabled() {
    let config = ExtractorConfig {
        meta_method_comments: false,
        ..Default::default()
    };
    let mut store = Store::new();
    scan_with(
        &config,
        &mut store,
        "class Foo\n  def a; end\n  ##\n  # :method: run\nend\n",
    );
    assert_eq!(method_names(namespace(&store, "Foo")), vec![("a", false)]);
}

#[test]
fn test_definitions_inside_blocks_are_skipped() {
    let source = "\
class Foo
  [1].each do |i|
    def inside; end
    attr_reader :hidden
  end
  def outside; end
end
";
    let (store, _) = scan(source);
    let foo = namespace(&store, "Foo");
    assert_eq!(method_names(foo), vec![("outside", false)]);
    assert!(foo.attributes.is_empty());
}

#[test]
fn test_visibility_is_per_frame() {
    let source = "\
class Foo
  def a; end
  private
  def b; end
  class Inner
    def c; end
  end
  def d; end
  public def e; end
end
";
    let (store, _) = scan(source);
    let foo = namespace(&store, "Foo");
    let visibility = |name: &str| foo.find_method(name, false).unwrap().visibility;
    assert_eq!(visibility("a"), Visibility::Public);
    assert_eq!(visibility("b"), Visibility::Private);
    assert_eq!(visibility("d"), Visibility::Private);
    assert_eq!(visibility("e"), Visibility::Public);

    let inner = namespace(&store, "Foo::Inner");
    assert_eq!(
        inner.find_method("c", false).unwrap().visibility,
        Visibility::Public
    );
}

#[test]
fn test_private_with_symbols() {
    let source = "\
class Foo
  def a; end
  def b; end
  attr_reader :c
  private :a, :c
end
";
    let (store, _) = scan(source);
    let foo = namespace(&store, "Foo");
    assert_eq!(foo.find_method("a", false).unwrap().visibility, Visibility::Private);
    assert_eq!(foo.find_method("b", false).unwrap().visibility, Visibility::Public);
    assert_eq!(foo.find_attribute("c", false).unwrap().visibility, Visibility::Private);
}

#[test]
fn test_initialize_becomes_new() {
    let source = "\
class Foo
  # Makes one.
  def initialize(x); end
end
class Bar
  # :notnew:
  def initialize; end
end
";
    let (store, _) = scan(source);

    let foo = namespace(&store, "Foo");
    assert_eq!(method_names(foo), vec![("new", true)]);
    let new = foo.find_method("new", true).unwrap();
    assert_eq!(new.params, "(x)");
    assert_eq!(new.visibility, Visibility::Public);
    assert_eq!(new.comment.as_ref().unwrap().text, "Makes one.");

    let bar = namespace(&store, "Bar");
    let initialize = bar.find_method("initialize", false).unwrap();
    assert_eq!(initialize.visibility, Visibility::Protected);
}

#[test]
fn test_module_function() {
    let source = "\
module Util
  module_function
  def helper; end
end
module Other
  def tool; end
  module_function :tool
end
";
    let (store, _) = scan(source);
    for (module, name) in [("Util", "helper"), ("Other", "tool")] {
        let ns = namespace(&store, module);
        assert_eq!(
            ns.find_method(name, false).unwrap().visibility,
            Visibility::Private
        );
        assert_eq!(
            ns.find_method(name, true).unwrap().visibility,
            Visibility::Public
        );
    }
}

#[test]
fn test_singleton_class_body() {
    let source = "\
class Foo
  class << self
    def build; end
    def self.skipped; end
    attr_accessor :registry
    private
    def helper; end
  end
  def instance; end
end
";
    let (store, _) = scan(source);
    let foo = namespace(&store, "Foo");
    assert_eq!(
        method_names(foo),
        vec![("build", true), ("helper", true), ("instance", false)]
    );
    assert_eq!(
        foo.find_method("helper", true).unwrap().visibility,
        Visibility::Private
    );
    assert_eq!(
        foo.find_method("instance", false).unwrap().visibility,
        Visibility::Public
    );
    assert!(foo.find_attribute("registry", true).is_some());
}

#[test]
fn test_top_level_members_go_to_object() {
    let source = "\
require 'set'

# Greets.
def greet; end
GREETING = 'hi'
";
    let (store, report) = scan(source);

    let object = namespace(&store, "Object");
    let greet = object.find_method("greet", false).unwrap();
    assert_eq!(greet.comment.as_ref().unwrap().text, "Greets.");

    let root = store.namespace(store.root());
    assert!(root.find_constant("GREETING").is_some());

    let requires: Vec<&str> = store
        .file(report.file)
        .requires
        .iter()
        .map(|r| r.name.as_str())
        .collect();
    assert_eq!(requires, vec!["set"]);
}

#[test]
fn test_constant_receiver_defines_class_method() {
    let (store, _) = scan("class Foo; end\n\ndef Foo.build; end\n");
    assert_eq!(method_names(namespace(&store, "Foo")), vec![("build", true)]);
    assert!(store.find_namespace("Object").is_none());
}

#[test]
fn test_literal_receivers_document_on_builtin_classes() {
    let source = "\
class Foo
  def nil.q; end
  def true.r; end
end
def false.s; end
";
    let (store, report) = scan(source);
    assert!(report.warnings.is_empty());
    assert_eq!(method_names(namespace(&store, "NilClass")), vec![("q", false)]);
    assert_eq!(method_names(namespace(&store, "TrueClass")), vec![("r", false)]);
    assert_eq!(method_names(namespace(&store, "FalseClass")), vec![("s", false)]);
    assert!(namespace(&store, "Foo").methods.is_empty());
}

#[test]
fn test_computed_receiver_warns() {
    let (store, report) = scan("class Foo\n  def obj.x; end\nend\n");
    assert_eq!(report.warnings.len(), 1);
    assert_eq!(report.warnings[0].kind, WarningKind::UnresolvedName);
    assert_eq!(report.warnings[0].line, 2);
    assert!(namespace(&store, "Foo").methods.is_empty());
}

#[test]
fn test_alias_forms() {
    let source = "\
class Foo
  def size; end
  # Same as size.
  alias length size
  alias_method :count, :size
end
";
    let (store, _) = scan(source);
    let foo = namespace(&store, "Foo");
    let length = foo.find_method("length", false).unwrap();
    assert_eq!(length.is_alias_for.as_deref(), Some("size"));
    assert_eq!(length.comment.as_ref().unwrap().text, "Same as size.");
    assert!(foo.find_method("count", false).is_some());
    assert_eq!(foo.aliases.len(), 2);
}

#[test]
fn test_header_comment_becomes_file_comment() {
    let source = "# This file does things.\n\nclass Foo; end\n";
    let (store, report) = scan(source);

    assert!(namespace(&store, "Foo").comments.is_empty());
    assert_eq!(
        store.file(report.file).comment.as_ref().unwrap().text,
        "This file does things."
    );
}

#[test]
fn test_header_markup_applies_to_file() {
    let source = "# :markup: markdown\n\n# Docs.\nclass Foo; end\n";
    let (store, report) = scan(source);
    assert_eq!(store.file(report.file).markup, Markup::Markdown);
    let comment = &namespace(&store, "Foo").comments[0];
    assert_eq!(comment.format, Markup::Markdown);
}

#[test]
fn test_method_body_comments_are_discarded() {
    let source = "\
class Foo
  def a
    # :stopdoc:
    1
  end
  def b; end
end
";
    let (store, report) = scan(source);
    assert_eq!(
        method_names(namespace(&store, "Foo")),
        vec![("a", false), ("b", false)]
    );
    assert!(report.warnings.is_empty());
}

#[test]
fn test_nodoc_modifier_on_method() {
    let source = "\
class Foo
  def hidden # :nodoc:
  end
  def shown; end
end
";
    let (store, _) = scan(source);
    assert_eq!(method_names(namespace(&store, "Foo")), vec![("shown", false)]);
}

#[test]
fn test_receiver_naming_a_plain_constant_warns() {
    let (store, report) = scan("LIMIT = 10\ndef LIMIT.check; end\n");
    assert_eq!(report.warnings.len(), 1);
    assert_eq!(report.warnings[0].kind, WarningKind::UnresolvedName);
    assert_eq!(report.warnings[0].line, 2);
    assert!(store.find_namespace("LIMIT").is_none());
}
