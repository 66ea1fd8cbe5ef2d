//! End-to-end scans of Ruby sources into a shared store.

use std::io::Write;
use std::path::Path;

use pretty_assertions::assert_eq;
use rbdoc_core::{
    DocumentSelf, ExtractorConfig, MixinTarget, Namespace, Store, Superclass, Visibility,
};
use rbdoc_extractor::{create_extractor, Extractor, RubyExtractor, ScanReport};

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn scan_files(files: &[(&str, &str)]) -> (Store, Vec<ScanReport>) {
    init_tracing();
    let extractor = RubyExtractor::new(ExtractorConfig::default());
    let mut store = Store::new();
    let reports = files
        .iter()
        .map(|(path, source)| {
            extractor
                .scan(&mut store, source, Path::new(path))
                .unwrap()
        })
        .collect();
    (store, reports)
}

fn namespace<'s>(store: &'s Store, name: &str) -> &'s Namespace {
    store.namespace(store.find_namespace(name).unwrap())
}

fn method_names(ns: &Namespace) -> Vec<&str> {
    ns.methods.iter().map(|m| m.name.as_str()).collect()
}

#[test]
fn test_reopening_merges_members() {
    let (store, _) = scan_files(&[
        ("lib/foo.rb", "class Foo\n  def a; end\nend\n"),
        ("lib/foo/more.rb", "class Foo\n  def b; end\n  def a; end\nend\n"),
    ]);

    let foos: Vec<&Namespace> = store.namespaces().filter(|ns| ns.name == "Foo").collect();
    assert_eq!(foos.len(), 1);
    assert_eq!(method_names(foos[0]), vec!["a", "b"]);
    assert_eq!(foos[0].locations.len(), 2);
}

#[test]
fn test_nested_namespace_reopened_by_qualified_name() {
    let (store, _) = scan_files(&[
        ("lib/a.rb", "module A; module B; end; end"),
        ("lib/a/b.rb", "module A::B; CONST = 1; end"),
    ]);

    let bs: Vec<&Namespace> = store.namespaces().filter(|ns| ns.name == "B").collect();
    assert_eq!(bs.len(), 1);
    assert_eq!(bs[0].full_name, "A::B");
    assert_eq!(bs[0].constants.len(), 1);
    assert_eq!(bs[0].constants[0].name, "CONST");
    assert_eq!(bs[0].constants[0].value, "1");
}

#[test]
fn test_comment_adjacency() {
    let (store, _) = scan_files(&[
        ("lib/foo.rb", "# comment\n\nclass Foo; end\n"),
        ("lib/bar.rb", "# Attached.\nclass Bar; end\n"),
    ]);

    assert!(namespace(&store, "Foo").comments.is_empty());
    assert_eq!(namespace(&store, "Bar").comment_text(), "Attached.");
}

#[test]
fn test_nodoc_all_hides_members() {
    let source = "\
class Outer # :nodoc: all
  class Inner
    def x; end
  end
  def y; end
end

class Outer
  def z; end
end
";
    let (store, reports) = scan_files(&[("lib/outer.rb", source)]);

    let outer = namespace(&store, "Outer");
    assert!(outer.methods.is_empty());
    assert_eq!(outer.document_self, DocumentSelf::Hide);
    assert!(!outer.document_children);
    assert!(!outer.is_documented());

    let inner = namespace(&store, "Outer::Inner");
    assert!(inner.methods.is_empty());
    assert!(inner.ignored);

    assert!(reports[0].locally_hidden.contains("Outer"));
}

#[test]
fn test_local_hide_does_not_cross_files() {
    let (store, reports) = scan_files(&[
        ("lib/outer.rb", "class Outer # :nodoc: all\n  def x; end\nend\n"),
        ("lib/outer/more.rb", "class Outer\n  def y; end\nend\n"),
    ]);

    assert_eq!(method_names(namespace(&store, "Outer")), vec!["y"]);
    assert!(reports[1].locally_hidden.is_empty());
}

#[test]
fn test_visibility_comes_from_innermost_frame() {
    let source = "\
module Outer
  private

  class Inner
    def visible; end
  end

  def hidden; end
end
";
    let (store, _) = scan_files(&[("lib/outer.rb", source)]);

    let inner = namespace(&store, "Outer::Inner");
    assert_eq!(
        inner.find_method("visible", false).unwrap().visibility,
        Visibility::Public
    );
    let outer = namespace(&store, "Outer");
    assert_eq!(
        outer.find_method("hidden", false).unwrap().visibility,
        Visibility::Private
    );
}

#[test]
fn test_mixin_resolves_after_all_files() {
    init_tracing();
    let extractor = RubyExtractor::new(ExtractorConfig::default());
    let mut store = Store::new();

    extractor
        .scan(&mut store, "class Foo; include Bar; end", Path::new("lib/foo.rb"))
        .unwrap();
    {
        let foo = namespace(&store, "Foo");
        let mixin = foo.includes().next().unwrap();
        assert_eq!(
            mixin.resolved_namespace_or_raw_name(&store),
            MixinTarget::Unresolved("Bar")
        );
        assert!(!mixin.is_resolved());
    }

    extractor
        .scan(&mut store, "module Bar; end", Path::new("lib/bar.rb"))
        .unwrap();
    let bar = store.find_namespace("Bar").unwrap();
    let foo = namespace(&store, "Foo");
    let mixin = foo.includes().next().unwrap();
    assert_eq!(
        mixin.resolved_namespace_or_raw_name(&store),
        MixinTarget::Namespace(bar)
    );
    assert!(mixin.is_resolved());
}

#[test]
fn test_include_in_singleton_class_is_extend() {
    let source = "\
class Foo
  class << self
    include Helpers
  end
end
";
    let (store, _) = scan_files(&[("lib/foo.rb", source)]);
    let foo = namespace(&store, "Foo");
    assert_eq!(foo.includes().count(), 0);
    let names: Vec<&str> = foo.extends().map(|m| m.name.as_str()).collect();
    assert_eq!(names, vec!["Helpers"]);
}

#[test]
fn test_superclass_resolution() {
    let (store, _) = scan_files(&[(
        "lib/shapes.rb",
        "class Shape; end\nclass Circle < Shape; end\nclass Error < StandardError; end\n",
    )]);

    let shape = store.find_namespace("Shape").unwrap();
    assert_eq!(
        namespace(&store, "Circle").superclass,
        Some(Superclass::Namespace(shape))
    );
    assert_eq!(
        namespace(&store, "Error").superclass,
        Some(Superclass::Name("StandardError".to_string()))
    );
}

#[test]
fn test_plain_constant_gets_placeholder() {
    let (store, _) = scan_files(&[("lib/x.rb", "X = 1\nclass X::Y\n  def y; end\nend\n")]);

    assert!(store.find_namespace("X").is_none());
    assert!(store.find_namespace("X::Y").is_none());
    assert!(store.namespaces().all(|ns| ns.name != "Y"));
}

#[test]
fn test_constant_alias_is_followed() {
    let source = "\
module Impl; end
Short = Impl
class Short::Thing; end
";
    let (store, _) = scan_files(&[("lib/impl.rb", source)]);

    let impl_id = store.find_namespace("Impl").unwrap();
    let root = store.namespace(store.root());
    assert_eq!(
        root.find_constant("Short").unwrap().is_alias_for,
        Some(impl_id)
    );
    assert!(store.find_namespace("Impl::Thing").is_some());
}

#[test]
fn test_attributes_and_requires_in_namespace() {
    let source = "\
module Config
  require 'json'

  # Where to look.
  attr_accessor :path
  attr_reader :size
  attr_writer :size
end
";
    let (store, _) = scan_files(&[("lib/config.rb", source)]);
    let config = namespace(&store, "Config");

    let path = config.find_attribute("path", false).unwrap();
    assert_eq!(path.mode.to_string(), "RW");
    assert_eq!(path.comment.as_ref().unwrap().text, "Where to look.");
    assert_eq!(config.find_attribute("size", false).unwrap().mode.to_string(), "RW");

    let requires: Vec<&str> = config.requires.iter().map(|r| r.name.as_str()).collect();
    assert_eq!(requires, vec!["json"]);
}

#[test]
fn test_member_groups_order() {
    let source = "\
class Foo
  def self.build; end
  def run; end
  protected
  def compare; end
  private
  def helper; end
end
";
    let (store, _) = scan_files(&[("lib/foo.rb", source)]);
    let foo = namespace(&store, "Foo");

    let groups: Vec<(bool, Visibility, Vec<&str>)> = foo
        .member_groups(Visibility::Protected)
        .iter()
        .map(|g| {
            (
                g.singleton,
                g.visibility,
                g.methods.iter().map(|m| m.name.as_str()).collect(),
            )
        })
        .collect();
    assert_eq!(
        groups,
        vec![
            (true, Visibility::Public, vec!["build"]),
            (false, Visibility::Public, vec!["run"]),
            (false, Visibility::Protected, vec!["compare"]),
        ]
    );
}

#[test]
fn test_scan_path_reads_file() {
    let mut file = tempfile::Builder::new().suffix(".rb").tempfile().unwrap();
    file.write_all(b"# Greeter.\nclass Greeter\n  def hello; end\nend\n")
        .unwrap();
    file.flush().unwrap();

    let config = ExtractorConfig::default();
    let extractor = create_extractor(file.path(), &config).unwrap().unwrap();
    let mut store = Store::new();
    let report = extractor.scan_path(&mut store, file.path()).unwrap();

    assert_eq!(store.file(report.file).path, file.path());
    assert_eq!(namespace(&store, "Greeter").comment_text(), "Greeter.");
}

#[test]
fn test_scan_path_missing_file() {
    let extractor = RubyExtractor::new(ExtractorConfig::default());
    let mut store = Store::new();
    let err = extractor
        .scan_path(&mut store, Path::new("/nonexistent/lib/missing.rb"))
        .unwrap_err();
    assert!(err.to_string().contains("Failed to read"));
}

#[test]
fn test_store_serializes() {
    let (store, _) = scan_files(&[("lib/foo.rb", "# Foo.\nclass Foo\n  def bar; end\nend\n")]);
    let json = serde_json::to_value(&store).unwrap();

    let namespaces = json["namespaces"].as_array().unwrap();
    let foo = namespaces
        .iter()
        .find(|ns| ns["full_name"] == "Foo")
        .unwrap();
    assert_eq!(foo["kind"], "class");
    assert_eq!(foo["methods"][0]["name"], "bar");
    assert_eq!(json["files"][0]["path"], "lib/foo.rb");
}
