//! Lifecycle hook slots and the handle hooks receive.

use std::fmt;
use std::ops::Range;
use std::sync::Arc;

use tessel_core::{Position, SourceMap, Span};

use super::NodeId;
use super::token::{Confirm, TokenMatch};
use crate::error::ParseErrorKind;
use crate::tree::{ContentList, ContextId, CustomData, NodeRef, ParseTree};

pub type Hook = Arc<dyn Fn(&mut HookContext<'_>) -> Result<(), HookError> + Send + Sync>;
pub type MatchHook =
    Arc<dyn Fn(&mut HookContext<'_>, &TokenMatch) -> Result<(), HookError> + Send + Sync>;
pub type ChildHook =
    Arc<dyn Fn(&mut HookContext<'_>, ContextId) -> Result<(), HookError> + Send + Sync>;
pub type AppendHook = Arc<
    dyn Fn(&mut HookContext<'_>, String) -> Result<Option<String>, HookError> + Send + Sync,
>;
pub type ConfirmHook =
    Arc<dyn Fn(&mut HookContext<'_>, &TokenMatch) -> Result<Confirm, HookError> + Send + Sync>;
pub type DataFactory = Arc<dyn Fn() -> CustomData + Send + Sync>;

#[derive(Clone, Default)]
pub(crate) struct Hooks {
    pub(crate) on_match_start: Option<MatchHook>,
    pub(crate) on_match_end: Option<MatchHook>,
    pub(crate) on_append_content: Option<AppendHook>,
    pub(crate) on_before_child_parse: Option<ChildHook>,
    pub(crate) on_after_child_parse: Option<ChildHook>,
    pub(crate) on_pop: Option<Hook>,
    pub(crate) init_data: Option<DataFactory>,
}

impl fmt::Debug for Hooks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut set = f.debug_set();
        let slots = [
            ("on_match_start", self.on_match_start.is_some()),
            ("on_match_end", self.on_match_end.is_some()),
            ("on_append_content", self.on_append_content.is_some()),
            ("on_before_child_parse", self.on_before_child_parse.is_some()),
            ("on_after_child_parse", self.on_after_child_parse.is_some()),
            ("on_pop", self.on_pop.is_some()),
            ("init_data", self.init_data.is_some()),
        ];
        for (name, present) in slots {
            if present {
                set.entry(&name);
            }
        }
        set.finish()
    }
}

/// Error raised by a client hook.
///
/// Without an explicit span the engine positions it at the cursor.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct HookError {
    pub(crate) kind: ParseErrorKind,
    pub(crate) message: String,
    pub(crate) span: Option<Span>,
    pub(crate) block: bool,
    pub(crate) related: Vec<(Span, String)>,
}

impl HookError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            kind: ParseErrorKind::Hook,
            message: message.into(),
            span: None,
            block: false,
            related: Vec::new(),
        }
    }

    pub fn with_kind(mut self, kind: ParseErrorKind) -> Self {
        self.kind = kind;
        self
    }

    pub fn at(mut self, span: Span) -> Self {
        self.span = Some(span);
        self
    }

    pub fn with_related(mut self, span: Span, message: impl Into<String>) -> Self {
        self.related.push((span, message.into()));
        self
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Handle passed to every hook: the live context plus the engine state a
/// hook may read or steer.
pub struct HookContext<'a> {
    tree: &'a mut ParseTree,
    map: &'a SourceMap<'a>,
    cursor: &'a mut usize,
    id: ContextId,
}

impl<'a> HookContext<'a> {
    pub(crate) fn new(
        tree: &'a mut ParseTree,
        map: &'a SourceMap<'a>,
        cursor: &'a mut usize,
        id: ContextId,
    ) -> Self {
        Self {
            tree,
            map,
            cursor,
            id,
        }
    }

    pub fn id(&self) -> ContextId {
        self.id
    }

    pub fn node_id(&self) -> NodeId {
        self.tree.context(self.id).node_id()
    }

    pub fn label(&self) -> &str {
        self.tree.context(self.id).label()
    }

    pub fn level(&self) -> u32 {
        self.tree.context(self.id).level()
    }

    pub fn index(&self) -> usize {
        self.id.index()
    }

    pub fn start(&self) -> Position {
        self.tree.context(self.id).start()
    }

    /// Position of the cursor.
    pub fn position(&self) -> Position {
        self.map.position(*self.cursor)
    }

    pub fn offset(&self) -> usize {
        *self.cursor
    }

    pub fn position_at(&self, offset: usize) -> Position {
        self.map.position(offset)
    }

    pub fn span(&self, range: Range<usize>) -> Span {
        self.map.span(range.start, range.end)
    }

    pub fn data(&self) -> &CustomData {
        self.tree.context(self.id).data()
    }

    pub fn data_mut(&mut self) -> &mut CustomData {
        &mut self.tree.context_mut(self.id).data
    }

    pub fn content(&self) -> &ContentList {
        self.tree.context(self.id).content()
    }

    pub fn content_mut(&mut self) -> &mut ContentList {
        &mut self.tree.context_mut(self.id).content
    }

    pub fn tree(&self) -> &ParseTree {
        self.tree
    }

    /// View of any context created so far, e.g. a child passed to
    /// `on_after_child_parse`.
    pub fn node(&self, id: ContextId) -> Option<NodeRef<'_>> {
        self.tree.get(id)
    }

    pub fn parent_node_id(&self) -> Option<NodeId> {
        let parent = self.tree.context(self.id).parent()?;
        Some(self.tree.context(parent).node_id())
    }

    pub fn source(&self) -> &str {
        self.map.source()
    }

    /// Source text from the cursor to the end.
    pub fn rest(&self) -> &str {
        let source = self.map.source();
        source.get(*self.cursor..).unwrap_or_default()
    }

    /// Move the cursor forward by `n` bytes, stopping at the end of input and
    /// rounding up to a char boundary.
    pub fn advance(&mut self, n: usize) {
        let source = self.map.source();
        let mut next = (*self.cursor + n).min(source.len());
        while !source.is_char_boundary(next) {
            next += 1;
        }
        *self.cursor = next;
    }

    /// Stop this context from starting children of type `id`.
    pub fn disable_child(&mut self, id: NodeId) {
        let ctx = self.tree.context_mut(self.id);
        if !ctx.disabled.contains(&id) {
            ctx.disabled.push(id);
        }
    }

    /// Stop this context from starting any children.
    pub fn clear_recognizes(&mut self) {
        self.tree.context_mut(self.id).recognize_none = true;
    }

    pub fn set_icon(&mut self, icon: impl Into<String>) {
        self.tree.context_mut(self.id).icon = Some(icon.into());
    }

    /// Error pointing at the cursor.
    pub fn error(&self, message: impl Into<String>) -> HookError {
        HookError::new(message).at(Span::point(self.position()))
    }

    /// Error spanning from this context's start to the cursor.
    pub fn error_block(&self, message: impl Into<String>) -> HookError {
        let mut err = HookError::new(message).at(Span::new(self.start(), self.position()));
        err.block = true;
        err
    }
}
