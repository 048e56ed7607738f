use std::sync::Arc;

use tessel_core::{Position, Span};

use super::{ContentList, ContextId, CustomData};
use crate::definition::{NodeDefinition, NodeId};

/// One runtime instance of a [`NodeDefinition`].
///
/// Created on push and finalized exactly once on pop. After that the engine
/// no longer mutates it, except to detach it from its parent when a hoist or
/// absorb rule consumes it.
#[derive(Clone, Debug)]
pub struct NodeContext {
    pub(crate) def: Arc<NodeDefinition>,
    pub(crate) id: ContextId,
    pub(crate) level: u32,
    pub(crate) content: ContentList,
    pub(crate) data: CustomData,
    pub(crate) start: Position,
    pub(crate) end: Position,
    pub(crate) parent: Option<ContextId>,
    pub(crate) icon: Option<String>,
    pub(crate) disabled: Vec<NodeId>,
    pub(crate) recognize_none: bool,
    pub(crate) finalized: bool,
}

impl NodeContext {
    pub(crate) fn new(
        def: Arc<NodeDefinition>,
        id: ContextId,
        level: u32,
        start: Position,
        parent: Option<ContextId>,
    ) -> Self {
        let data = def.initial_data();
        Self {
            def,
            id,
            level,
            content: ContentList::new(),
            data,
            start,
            end: start,
            parent,
            icon: None,
            disabled: Vec::new(),
            recognize_none: false,
            finalized: false,
        }
    }

    pub fn id(&self) -> ContextId {
        self.id
    }

    pub fn definition(&self) -> &NodeDefinition {
        &self.def
    }

    pub fn node_id(&self) -> NodeId {
        self.def.id()
    }

    pub fn label(&self) -> &str {
        self.def.label_str()
    }

    pub fn icon(&self) -> &str {
        self.icon.as_deref().unwrap_or_else(|| self.def.icon_str())
    }

    /// Stack depth at creation; the root is level 0.
    pub fn level(&self) -> u32 {
        self.level
    }

    pub fn content(&self) -> &ContentList {
        &self.content
    }

    pub fn data(&self) -> &CustomData {
        &self.data
    }

    pub fn start(&self) -> Position {
        self.start
    }

    pub fn end(&self) -> Position {
        self.end
    }

    pub fn span(&self) -> Span {
        Span::new(self.start, self.end)
    }

    pub fn parent(&self) -> Option<ContextId> {
        self.parent
    }

    pub fn is_finalized(&self) -> bool {
        self.finalized
    }

    /// Whether this context may start a child of type `id`.
    pub(crate) fn accepts_child(&self, id: NodeId) -> bool {
        !self.recognize_none && !self.disabled.contains(&id)
    }
}
