//! The parse tree: an arena of contexts addressed by [`ContextId`].
//!
//! Contexts are stored in creation order, so a context's id doubles as its
//! creation index. Absorbed or hoisted-away contexts stay in the arena but
//! are no longer reachable from the root's content.

mod content;
mod context;
mod value;

#[cfg(test)]
mod content_tests;

use std::fmt;

use serde::ser::{SerializeMap, SerializeSeq};
use serde::{Serialize, Serializer};
use tessel_core::{Position, Span};

pub use content::{Content, ContentList};
pub use context::NodeContext;
pub use value::{CustomData, Value};

use crate::definition::NodeId;
use crate::printer::TreePrinter;

/// Index of a context in its [`ParseTree`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct ContextId(u32);

impl ContextId {
    pub const ROOT: Self = Self(0);

    pub(crate) fn new(index: usize) -> Self {
        Self(index as u32)
    }

    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for ContextId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Every context created during one parse, plus the source it came from.
#[derive(Clone, Debug)]
pub struct ParseTree {
    source: String,
    contexts: Vec<NodeContext>,
}

impl ParseTree {
    pub(crate) fn new(source: &str) -> Self {
        Self {
            source: source.to_string(),
            contexts: Vec::new(),
        }
    }

    pub(crate) fn alloc(&mut self, make: impl FnOnce(ContextId) -> NodeContext) -> ContextId {
        let id = ContextId::new(self.contexts.len());
        self.contexts.push(make(id));
        id
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    /// Number of contexts created, including detached ones.
    pub fn len(&self) -> usize {
        self.contexts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.contexts.is_empty()
    }

    pub fn root(&self) -> NodeRef<'_> {
        NodeRef {
            tree: self,
            id: ContextId::ROOT,
        }
    }

    pub fn get(&self, id: ContextId) -> Option<NodeRef<'_>> {
        (id.index() < self.contexts.len()).then_some(NodeRef { tree: self, id })
    }

    pub fn context(&self, id: ContextId) -> &NodeContext {
        &self.contexts[id.index()]
    }

    pub(crate) fn context_mut(&mut self, id: ContextId) -> &mut NodeContext {
        &mut self.contexts[id.index()]
    }

    /// Concatenated text of a context, descending into child references.
    pub fn text_of(&self, id: ContextId) -> String {
        let mut out = String::new();
        self.collect_text(self.context(id).content(), &mut out);
        out
    }

    /// Concatenated text of an arbitrary content list.
    pub fn content_text(&self, content: &ContentList) -> String {
        let mut out = String::new();
        self.collect_text(content, &mut out);
        out
    }

    fn collect_text(&self, content: &ContentList, out: &mut String) {
        for entry in content {
            match entry {
                Content::Text(s) => out.push_str(s),
                Content::Node(child) => self.collect_text(self.context(*child).content(), out),
            }
        }
    }

    /// Serialize the tree reachable from the root.
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(JsonNode {
            tree: self,
            id: ContextId::ROOT,
        })
        .unwrap_or(serde_json::Value::Null)
    }
}

/// Read-only view of one context inside its tree.
#[derive(Clone, Copy)]
pub struct NodeRef<'t> {
    tree: &'t ParseTree,
    id: ContextId,
}

impl<'t> NodeRef<'t> {
    fn ctx(&self) -> &'t NodeContext {
        self.tree.context(self.id)
    }

    pub fn tree(&self) -> &'t ParseTree {
        self.tree
    }

    pub fn id(&self) -> ContextId {
        self.id
    }

    pub fn node_id(&self) -> NodeId {
        self.ctx().node_id()
    }

    pub fn label(&self) -> &'t str {
        self.ctx().label()
    }

    pub fn icon(&self) -> &'t str {
        self.ctx().icon()
    }

    /// Creation index; the root is 0.
    pub fn index(&self) -> usize {
        self.id.index()
    }

    pub fn level(&self) -> u32 {
        self.ctx().level()
    }

    pub fn start(&self) -> Position {
        self.ctx().start()
    }

    pub fn end(&self) -> Position {
        self.ctx().end()
    }

    pub fn span(&self) -> Span {
        self.ctx().span()
    }

    pub fn content(&self) -> &'t ContentList {
        self.ctx().content()
    }

    pub fn children(&self) -> impl Iterator<Item = NodeRef<'t>> + use<'t> {
        let tree = self.tree;
        self.ctx()
            .content()
            .nodes()
            .map(move |id| NodeRef { tree, id })
    }

    pub fn data(&self) -> &'t CustomData {
        self.ctx().data()
    }

    /// Follow a `Value::Node` field.
    pub fn field_node(&self, name: &str) -> Option<NodeRef<'t>> {
        self.data()
            .node(name)
            .and_then(|id| self.tree.get(id))
    }

    pub fn text(&self) -> String {
        self.tree.text_of(self.id)
    }

    pub fn parent(&self) -> Option<NodeRef<'t>> {
        self.ctx().parent().map(|id| NodeRef {
            tree: self.tree,
            id,
        })
    }

    pub fn printer(&self) -> TreePrinter<'t> {
        TreePrinter::new(*self)
    }

    pub fn to_tree(&self) -> String {
        self.printer().dump()
    }
}

impl fmt::Debug for NodeRef<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.ctx().definition(), self.id)
    }
}

struct JsonNode<'t> {
    tree: &'t ParseTree,
    id: ContextId,
}

impl Serialize for JsonNode<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let ctx = self.tree.context(self.id);
        let mut map = serializer.serialize_map(Some(6))?;
        map.serialize_entry("label", ctx.label())?;
        map.serialize_entry("icon", ctx.icon())?;
        map.serialize_entry("start", &ctx.start())?;
        map.serialize_entry("end", &ctx.end())?;
        map.serialize_entry(
            "data",
            &JsonData {
                tree: self.tree,
                data: ctx.data(),
            },
        )?;
        map.serialize_entry(
            "content",
            &JsonContent {
                tree: self.tree,
                content: ctx.content(),
            },
        )?;
        map.end()
    }
}

struct JsonContent<'t> {
    tree: &'t ParseTree,
    content: &'t ContentList,
}

impl Serialize for JsonContent<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut seq = serializer.serialize_seq(Some(self.content.len()))?;
        for entry in self.content {
            match entry {
                Content::Text(s) => seq.serialize_element(s)?,
                Content::Node(id) => seq.serialize_element(&JsonNode {
                    tree: self.tree,
                    id: *id,
                })?,
            }
        }
        seq.end()
    }
}

struct JsonData<'t> {
    tree: &'t ParseTree,
    data: &'t CustomData,
}

impl Serialize for JsonData<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.data.len()))?;
        for (key, value) in self.data.iter() {
            map.serialize_entry(
                key,
                &JsonValue {
                    tree: self.tree,
                    value,
                },
            )?;
        }
        map.end()
    }
}

struct JsonValue<'t> {
    tree: &'t ParseTree,
    value: &'t Value,
}

impl Serialize for JsonValue<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self.value {
            Value::Node(id) => JsonNode {
                tree: self.tree,
                id: *id,
            }
            .serialize(serializer),
            Value::Array(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for value in items {
                    seq.serialize_element(&JsonValue {
                        tree: self.tree,
                        value,
                    })?;
                }
                seq.end()
            }
            other => other.serialize(serializer),
        }
    }
}
