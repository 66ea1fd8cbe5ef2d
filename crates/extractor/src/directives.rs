//! Directive processing for comment blocks.
//!
//! A directive line is `:name:` optionally followed by a value. Known
//! directives are removed from the prose and recorded by canonical name, as
//! are `@tag value` lines. Text between `#--` and `#++` is private and
//! dropped. Everything else is prose.

use regex::Regex;
use std::collections::HashMap;
use std::sync::LazyLock;

use rbdoc_core::{AttrMode, Error};

use crate::nesting::DocDirective;

#[allow(clippy::unwrap_used)]
static COMMENT_MARKER: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\s*#+ ?").unwrap());
#[allow(clippy::unwrap_used)]
static DIRECTIVE_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*:([\w-]+):(?:\s*(.*?))?\s*$").unwrap());
#[allow(clippy::unwrap_used)]
static TAG_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*@(\w+)(?:\s+(.*?))?\s*$").unwrap());

/// Canonical name of a known directive
fn canonical(name: &str) -> Option<&'static str> {
    let canonical = match name.to_ascii_lowercase().as_str() {
        "nodoc" => "nodoc",
        "doc" => "doc",
        "stopdoc" => "stopdoc",
        "startdoc" => "startdoc",
        "enddoc" => "enddoc",
        "call-seq" => "call-seq",
        "yields" | "yield" => "yields",
        "method" => "method",
        "singleton-method" => "singleton-method",
        "attr" => "attr",
        "attr_reader" => "attr_reader",
        "attr_writer" => "attr_writer",
        "attr_accessor" => "attr_accessor",
        "notnew" | "not_new" | "not-new" => "notnew",
        "markup" => "markup",
        "section" => "section",
        "category" => "category",
        "title" => "title",
        "main" => "main",
        "args" | "arg" => "args",
        _ => return None,
    };
    Some(canonical)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Directive {
    pub value: String,
    pub line: usize,
}

/// Scope of a `:nodoc:`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Nodoc {
    /// The declaration only
    Itself,
    /// The declaration and everything beneath it
    All,
}

/// Name directive turning a free-floating comment into a method
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetaMethod {
    pub name: Option<String>,
    pub singleton: bool,
    pub line: usize,
}

/// Name directive turning a free-floating comment into attributes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetaAttribute {
    pub names: Vec<String>,
    pub mode: AttrMode,
    pub line: usize,
}

/// A comment block after directive processing
#[derive(Debug, Default)]
pub struct ParsedComment {
    /// Prose with markers, directives and private text removed
    pub text: String,
    directives: HashMap<String, Directive>,
    transitions: Vec<(DocDirective, usize)>,
    /// Directives dropped because they were ambiguous
    pub errors: Vec<Error>,
}

impl ParsedComment {
    pub fn get(&self, name: &str) -> Option<&Directive> {
        self.directives.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.directives.contains_key(name)
    }

    /// `:startdoc:` / `:stopdoc:` / `:enddoc:` in order of appearance
    pub fn transitions(&self) -> &[(DocDirective, usize)] {
        &self.transitions
    }

    pub fn nodoc(&self) -> Option<Nodoc> {
        self.get("nodoc").map(|d| {
            if d.value.eq_ignore_ascii_case("all") {
                Nodoc::All
            } else {
                Nodoc::Itself
            }
        })
    }

    /// `:doc:` forces documentation
    pub fn forces_doc(&self) -> bool {
        self.contains("doc")
    }

    pub fn not_new(&self) -> bool {
        self.contains("notnew")
    }

    pub fn call_seq(&self) -> Option<&str> {
        self.non_empty("call-seq")
    }

    pub fn yields(&self) -> Option<&str> {
        self.non_empty("yields")
    }

    pub fn markup(&self) -> Option<&Directive> {
        self.get("markup")
    }

    pub fn section(&self) -> Option<&str> {
        self.non_empty("section")
    }

    pub fn meta_method(&self) -> Option<MetaMethod> {
        let (directive, singleton) = match self.get("method") {
            Some(d) => (d, false),
            None => (self.get("singleton-method")?, true),
        };
        Some(MetaMethod {
            name: directive
                .value
                .split_whitespace()
                .next()
                .map(String::from),
            singleton,
            line: directive.line,
        })
    }

    pub fn meta_attribute(&self) -> Option<MetaAttribute> {
        let modes = [
            ("attr", AttrMode::Read),
            ("attr_reader", AttrMode::Read),
            ("attr_writer", AttrMode::Write),
            ("attr_accessor", AttrMode::ReadWrite),
        ];
        modes.iter().find_map(|(name, mode)| {
            let directive = self.get(name)?;
            Some(MetaAttribute {
                names: directive
                    .value
                    .split(|c: char| c == ',' || c.is_whitespace())
                    .filter(|s| !s.is_empty())
                    .map(String::from)
                    .collect(),
                mode: *mode,
                line: directive.line,
            })
        })
    }

    fn non_empty(&self, name: &str) -> Option<&str> {
        self.get(name)
            .map(|d| d.value.as_str())
            .filter(|v| !v.is_empty())
    }

    fn insert(&mut self, name: &str, directive: Directive) -> Result<(), Error> {
        match self.directives.get(name) {
            Some(existing) if existing.value != directive.value => {
                Err(Error::ambiguous_directive(
                    directive.line,
                    format!(
                        "`:{name}:` given as {:?} on line {} and {:?}",
                        existing.value, existing.line, directive.value
                    ),
                ))
            }
            Some(_) => Ok(()),
            None => {
                self.directives.insert(name.to_string(), directive);
                Ok(())
            }
        }
    }
}

fn strip_marker(line: &str) -> &str {
    match COMMENT_MARKER.find(line) {
        Some(m) => &line[m.end()..],
        None => line,
    }
}

/// Parse comment text whose first line is `first_line`.
///
/// Ambiguous directives do not abort parsing; the first value wins and the
/// conflict is recorded in [`ParsedComment::errors`].
pub fn parse(text: &str, first_line: usize) -> ParsedComment {
    let mut parsed = ParsedComment::default();
    let mut prose: Vec<&str> = Vec::new();
    let mut private = false;

    let mut lines = text.lines().enumerate().peekable();
    while let Some((offset, raw)) = lines.next() {
        let line_no = first_line + offset;
        let content = strip_marker(raw);

        match content.trim() {
            "--" => {
                private = true;
                continue;
            }
            "++" => {
                private = false;
                continue;
            }
            _ if private => continue,
            _ => {}
        }

        if let Some(caps) = DIRECTIVE_LINE.captures(content) {
            if let Some(name) = canonical(&caps[1]) {
                let mut value = caps
                    .get(2)
                    .map(|m| m.as_str().to_string())
                    .unwrap_or_default();

                if name == "call-seq" {
                    let mut signature: Vec<String> = Vec::new();
                    if !value.is_empty() {
                        signature.push(value);
                    }
                    while let Some((_, next)) = lines.peek() {
                        let next = strip_marker(next);
                        if next.trim().is_empty() {
                            break;
                        }
                        signature.push(next.trim().to_string());
                        lines.next();
                    }
                    value = signature.join("\n");
                }

                match name {
                    "stopdoc" => parsed.transitions.push((DocDirective::Hide, line_no)),
                    "startdoc" => parsed.transitions.push((DocDirective::Show, line_no)),
                    "enddoc" => parsed.transitions.push((DocDirective::Terminate, line_no)),
                    _ => {}
                }

                let directive = Directive {
                    value,
                    line: line_no,
                };
                if let Err(err) = parsed.insert(name, directive) {
                    tracing::debug!(error = %err, "dropping ambiguous directive");
                    parsed.errors.push(err);
                }
                continue;
            }
        }

        if let Some(caps) = TAG_LINE.captures(content) {
            let key = format!("@{}", &caps[1]);
            let directive = Directive {
                value: caps
                    .get(2)
                    .map(|m| m.as_str().to_string())
                    .unwrap_or_default(),
                line: line_no,
            };
            if let Err(err) = parsed.insert(&key, directive) {
                parsed.errors.push(err);
            }
            continue;
        }

        prose.push(content);
    }

    while prose.first().is_some_and(|l| l.trim().is_empty()) {
        prose.remove(0);
    }
    while prose.last().is_some_and(|l| l.trim().is_empty()) {
        prose.pop();
    }
    parsed.text = prose.join("\n");
    parsed
}
