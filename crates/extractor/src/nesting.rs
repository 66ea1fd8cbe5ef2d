//! Lexical nesting of the walk: one frame per open namespace body.

use std::collections::HashSet;

use rbdoc_core::{NamespaceId, Visibility, WarningKind};

/// Documentation state of a frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocState {
    Show,
    /// `:stopdoc:` until a `:startdoc:`
    Hidden,
    /// `:enddoc:` or `:nodoc: all`; nothing brings it back
    Terminated,
}

/// A state-changing directive
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocDirective {
    /// `:startdoc:`
    Show,
    /// `:stopdoc:`
    Hide,
    /// `:enddoc:`
    Terminate,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub container: NamespaceId,
    /// Opened with `class << x`
    pub singleton: bool,
    /// Visibility applied to members declared next
    pub visibility: Visibility,
    /// Everything beneath is hidden by `:nodoc: all`
    pub nodoc: bool,
    pub state: DocState,
    /// A bare `module_function` is in effect
    pub module_function: bool,
    block_depth: usize,
}

impl Frame {
    fn new(container: NamespaceId, singleton: bool, state: DocState) -> Self {
        Self {
            container,
            singleton,
            visibility: Visibility::Public,
            nodoc: false,
            state,
            module_function: false,
            block_depth: 0,
        }
    }
}

/// Stack of frames for one file's scan. The bottom frame is the top level
/// and is never popped.
#[derive(Debug)]
pub struct NestingStack {
    frames: Vec<Frame>,
    locally_hidden: HashSet<String>,
}

impl AsMut<NestingStack> for NestingStack {
    fn as_mut(&mut self) -> &mut NestingStack {
        self
    }
}

impl NestingStack {
    pub fn new(root: NamespaceId) -> Self {
        Self {
            frames: vec![Frame::new(root, false, DocState::Show)],
            locally_hidden: HashSet::new(),
        }
    }

    pub fn current(&self) -> &Frame {
        // The root frame is never popped
        &self.frames[self.frames.len() - 1]
    }

    fn current_mut(&mut self) -> &mut Frame {
        let last = self.frames.len() - 1;
        &mut self.frames[last]
    }

    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    /// Open a namespace body. Documentation state is inherited from the
    /// enclosing frame; a name hidden earlier in this file stays hidden.
    pub fn push(&mut self, container: NamespaceId, qualified_name: &str, singleton: bool) {
        let inherited = self.current().state;
        let mut frame = Frame::new(container, singleton, inherited);
        if self.locally_hidden.contains(qualified_name) {
            tracing::trace!(namespace = qualified_name, "re-applying local hide on reopen");
            frame.nodoc = true;
            frame.state = DocState::Terminated;
        }
        self.frames.push(frame);
    }

    pub fn pop(&mut self) -> Option<Frame> {
        if self.frames.len() == 1 {
            return None;
        }
        self.frames.pop()
    }

    pub fn current_visibility(&self) -> Visibility {
        self.current().visibility
    }

    pub fn set_visibility(&mut self, visibility: Visibility) {
        let frame = self.current_mut();
        frame.visibility = visibility;
        frame.module_function = false;
    }

    pub fn set_module_function(&mut self) {
        self.current_mut().module_function = true;
    }

    pub fn in_block(&self) -> bool {
        self.current().block_depth > 0
    }

    pub fn enter_block(&mut self) {
        self.current_mut().block_depth += 1;
    }

    pub fn leave_block(&mut self) {
        let frame = self.current_mut();
        frame.block_depth = frame.block_depth.saturating_sub(1);
    }

    /// Run `f` with the current frame of `owner`'s stack inside a block
    pub fn with_block<W, R>(owner: &mut W, f: impl FnOnce(&mut W) -> R) -> R
    where
        W: AsMut<NestingStack>,
    {
        owner.as_mut().enter_block();
        let result = f(owner);
        owner.as_mut().leave_block();
        result
    }

    /// Apply a state directive to the current frame, returning a warning if
    /// the transition was redundant or ignored
    pub fn apply(&mut self, directive: DocDirective) -> Option<(WarningKind, String)> {
        let frame = self.current_mut();
        let (next, warning) = match (frame.state, directive) {
            (DocState::Show, DocDirective::Show) => (
                DocState::Show,
                Some((WarningKind::RedundantDirective, ":startdoc: while documenting")),
            ),
            (DocState::Hidden, DocDirective::Show) => (DocState::Show, None),
            (DocState::Show, DocDirective::Hide) => (DocState::Hidden, None),
            (DocState::Hidden, DocDirective::Hide) => (
                DocState::Hidden,
                Some((WarningKind::RedundantDirective, ":stopdoc: while already stopped")),
            ),
            (DocState::Show | DocState::Hidden, DocDirective::Terminate) => {
                (DocState::Terminated, None)
            }
            (DocState::Terminated, DocDirective::Show) => (
                DocState::Terminated,
                Some((WarningKind::IgnoredDirective, ":startdoc: after documentation ended")),
            ),
            (DocState::Terminated, DocDirective::Hide) => (
                DocState::Terminated,
                Some((WarningKind::IgnoredDirective, ":stopdoc: after documentation ended")),
            ),
            (DocState::Terminated, DocDirective::Terminate) => (
                DocState::Terminated,
                Some((WarningKind::RedundantDirective, ":enddoc: after documentation ended")),
            ),
        };
        frame.state = next;
        warning.map(|(kind, message)| (kind, message.to_string()))
    }

    /// `:nodoc: all` on the namespace whose frame is current
    pub fn hide_all(&mut self, qualified_name: &str) {
        let frame = self.current_mut();
        frame.nodoc = true;
        frame.state = DocState::Terminated;
        self.locally_hidden.insert(qualified_name.to_string());
    }

    /// Members declared now are documented
    pub fn is_documenting(&self) -> bool {
        let frame = self.current();
        frame.state == DocState::Show && !frame.nodoc
    }

    /// Members declared now may be documented when forced with `:doc:`
    pub fn can_force(&self) -> bool {
        let frame = self.current();
        frame.state == DocState::Hidden && !frame.nodoc
    }

    /// Containers of the lexical scopes, innermost first, skipping
    /// singleton frames
    pub fn lexical_scopes(&self) -> impl Iterator<Item = NamespaceId> + '_ {
        self.frames
            .iter()
            .rev()
            .filter(|f| !f.singleton)
            .map(|f| f.container)
    }

    /// Container of the outermost non-singleton frame
    pub fn outermost_scope(&self) -> NamespaceId {
        self.frames[0].container
    }

    pub fn into_locally_hidden(self) -> HashSet<String> {
        self.locally_hidden
    }
}
