//! Grouping of raw comments into comment blocks.
//!
//! Line comments on consecutive lines form one block. A `=begin`/`=end`
//! comment is always a block of its own. Each block knows its target line,
//! the first non-blank line after it, which is where a declaration must
//! start for the block to be considered for it.

use regex::Regex;
use std::collections::{HashMap, VecDeque};
use std::sync::LazyLock;

use crate::directives::{self, Directive};
use crate::syntax::{CommentKind, RawComment};

#[allow(clippy::unwrap_used)]
static MAGIC_COMMENT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^#!|^#\s*(?:-\*-|(?:frozen_string_literal|encoding|coding|warn_indent|shareable_constant_value)\s*:)")
        .unwrap()
});

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommentBlock {
    /// Comment text with markers, one source line per text line
    pub text: String,
    /// Line of the first comment in the block
    pub start_line: usize,
    /// Source line of the first line of `text`
    pub text_start_line: usize,
    pub end_line: usize,
    /// First non-blank line after the block
    pub target_line: usize,
    /// First line is exactly `##`
    pub meta: bool,
    /// Position of the block in the file
    pub index: usize,
}

impl CommentBlock {
    /// No blank line separates the block from its target line
    pub fn is_adjacent(&self) -> bool {
        self.target_line == self.end_line + 1
    }
}

fn is_blank(line: &str) -> bool {
    line.trim().is_empty()
}

/// Comment blocks of one file, consumed in source order as the walk
/// advances
#[derive(Debug, Default)]
pub struct CommentAggregator {
    pending: VecDeque<CommentBlock>,
    /// Trailing comments by line
    modifiers: HashMap<usize, String>,
    /// `:markup:` of the file's first block, when only blank lines precede it
    header_markup: Option<Directive>,
    has_header: bool,
}

impl CommentAggregator {
    pub fn new(comments: &[RawComment], lines: &[&str]) -> Self {
        let mut aggregator = Self::default();
        let mut groups: Vec<Vec<&RawComment>> = Vec::new();
        let mut current: Vec<&RawComment> = Vec::new();
        let mut magic_lines: Vec<usize> = Vec::new();

        for comment in comments {
            if Self::is_modifier(comment, lines) {
                aggregator
                    .modifiers
                    .entry(comment.start_line)
                    .and_modify(|text| {
                        text.push('\n');
                        text.push_str(&comment.text);
                    })
                    .or_insert_with(|| comment.text.clone());
                continue;
            }
            if comment.kind == CommentKind::Line && MAGIC_COMMENT.is_match(&comment.text) {
                magic_lines.push(comment.start_line);
                continue;
            }
            if comment.kind == CommentKind::Block {
                if !current.is_empty() {
                    groups.push(std::mem::take(&mut current));
                }
                groups.push(vec![comment]);
                continue;
            }
            if let Some(last) = current.last() {
                if comment.start_line != last.end_line + 1 {
                    groups.push(std::mem::take(&mut current));
                }
            }
            current.push(comment);
        }
        if !current.is_empty() {
            groups.push(current);
        }

        for (index, group) in groups.iter().enumerate() {
            if let Some(block) = Self::build_block(group, lines, index) {
                aggregator.pending.push_back(block);
            }
        }

        if let Some(first) = aggregator.pending.front() {
            let preceded_by_code = (1..first.start_line).any(|line| {
                !magic_lines.contains(&line) && lines.get(line - 1).is_some_and(|l| !is_blank(l))
            });
            if first.index == 0 && !preceded_by_code {
                aggregator.has_header = true;
                aggregator.header_markup = directives::parse(&first.text, first.text_start_line)
                    .markup()
                    .cloned();
            }
        }

        tracing::trace!(
            blocks = aggregator.pending.len(),
            modifiers = aggregator.modifiers.len(),
            "grouped comments"
        );
        aggregator
    }

    /// A comment with code before it on its first line
    fn is_modifier(comment: &RawComment, lines: &[&str]) -> bool {
        comment.kind == CommentKind::Line
            && lines
                .get(comment.start_line.wrapping_sub(1))
                .is_some_and(|line| !line.trim_start().starts_with('#'))
    }

    fn build_block(group: &[&RawComment], lines: &[&str], index: usize) -> Option<CommentBlock> {
        let first = group.first()?;
        let last = group.last()?;

        let (text, text_start_line) = if first.kind == CommentKind::Block {
            let inner: Vec<&str> = first.text.lines().collect();
            let body = if inner.len() > 2 {
                inner[1..inner.len() - 1].join("\n")
            } else {
                String::new()
            };
            (body, first.start_line + 1)
        } else {
            let joined = group
                .iter()
                .map(|c| c.text.as_str())
                .collect::<Vec<_>>()
                .join("\n");
            (joined, first.start_line)
        };

        let mut target_line = last.end_line + 1;
        while lines.get(target_line - 1).is_some_and(|l| is_blank(l)) {
            target_line += 1;
        }

        Some(CommentBlock {
            text,
            start_line: first.start_line,
            text_start_line,
            end_line: last.end_line,
            target_line,
            meta: first.kind == CommentKind::Line && first.text.trim() == "##",
            index,
        })
    }

    /// Remove and return every block whose target line is at or before `line`
    pub fn process_until(&mut self, line: usize) -> Vec<CommentBlock> {
        let mut taken = Vec::new();
        while self.pending.front().is_some_and(|b| b.target_line <= line) {
            taken.extend(self.pending.pop_front());
        }
        taken
    }

    /// Remove and return the block targeting exactly `line`
    pub fn take_at(&mut self, line: usize) -> Option<CommentBlock> {
        if self.pending.front()?.target_line == line {
            self.pending.pop_front()
        } else {
            None
        }
    }

    /// Discard blocks up to `line`, used for method and assignment bodies
    pub fn skip_until(&mut self, line: usize) {
        let skipped = self.process_until(line);
        if !skipped.is_empty() {
            tracing::trace!(count = skipped.len(), line, "discarded body comments");
        }
    }

    /// Trailing comment text on `line`
    pub fn modifier(&self, line: usize) -> Option<&str> {
        self.modifiers.get(&line).map(String::as_str)
    }

    /// The first block of the file with only blank lines before it
    pub fn is_header(&self, block: &CommentBlock) -> bool {
        self.has_header && block.index == 0
    }

    pub fn header_markup(&self) -> Option<&Directive> {
        self.header_markup.as_ref()
    }

    pub fn remaining(&self) -> usize {
        self.pending.len()
    }
}
