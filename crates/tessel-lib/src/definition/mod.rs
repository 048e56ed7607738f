//! Node definitions: the immutable templates a parser is assembled from.
//!
//! A definition is built once with the chainable setters below, handed to
//! [`Parser::register`](crate::Parser::register), and from then on only read.
//! Definitions reference each other exclusively through [`NodeId`].

mod hooks;
mod rules;
mod token;


use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;
use serde::Serialize;

pub use hooks::{
    AppendHook, ChildHook, ConfirmHook, DataFactory, Hook, HookContext, HookError, MatchHook,
};
pub use rules::{
    AbsorbRule, ConflictPolicy, ContentMap, ContentMapFn, HoistDepth, HoistMap, HoistRule,
};
pub use token::{Confirm, DynamicPattern, Pattern, TokenDescriptor, TokenMatch, TokenMode};

pub(crate) use hooks::Hooks;

use crate::tree::{ContextId, CustomData};

/// Caller-chosen key of a definition, unique within one parser.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct NodeId(u32);

impl NodeId {
    pub const fn new(id: u32) -> Self {
        Self(id)
    }

    pub const fn get(self) -> u32 {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

const DEFAULT_ICON: &str = "◦";

#[derive(Clone)]
pub struct NodeDefinition {
    pub(crate) id: NodeId,
    pub(crate) label: String,
    pub(crate) icon: String,
    pub(crate) start: Option<TokenDescriptor>,
    pub(crate) end: Option<TokenDescriptor>,
    pub(crate) skip: Option<Pattern>,
    pub(crate) bad: Option<Pattern>,
    pub(crate) good: Option<Pattern>,
    pub(crate) recognizes: Vec<NodeId>,
    pub(crate) pops_after: Vec<NodeId>,
    pub(crate) absorbs: IndexMap<NodeId, AbsorbRule>,
    pub(crate) hoists: Vec<HoistRule>,
    pub(crate) mappings: Vec<(String, ContentMap)>,
    pub(crate) closes_at_eof: bool,
    pub(crate) hooks: Hooks,
}

impl NodeDefinition {
    pub fn new(id: NodeId) -> Self {
        Self {
            id,
            label: String::new(),
            icon: DEFAULT_ICON.to_string(),
            start: None,
            end: None,
            skip: None,
            bad: None,
            good: None,
            recognizes: Vec::new(),
            pops_after: Vec::new(),
            absorbs: IndexMap::new(),
            hoists: Vec::new(),
            mappings: Vec::new(),
            closes_at_eof: false,
            hooks: Hooks::default(),
        }
    }

    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    pub fn icon(mut self, icon: impl Into<String>) -> Self {
        self.icon = icon.into();
        self
    }

    pub fn starts_with(mut self, token: impl Into<TokenDescriptor>) -> Self {
        self.start = Some(token.into());
        self
    }

    pub fn ends_with(mut self, token: impl Into<TokenDescriptor>) -> Self {
        self.end = Some(token.into());
        self
    }

    /// Text stripped from flushed content before any other guard runs.
    pub fn skip(mut self, pattern: impl Into<Pattern>) -> Self {
        self.skip = Some(pattern.into());
        self
    }

    /// Text that must never appear in flushed content.
    pub fn bad(mut self, pattern: impl Into<Pattern>) -> Self {
        self.bad = Some(pattern.into());
        self
    }

    /// Text that every flushed fragment must contain.
    pub fn good(mut self, pattern: impl Into<Pattern>) -> Self {
        self.good = Some(pattern.into());
        self
    }

    /// Append child types, keeping declaration order and skipping repeats.
    pub fn recognizes(mut self, ids: impl IntoIterator<Item = NodeId>) -> Self {
        for id in ids {
            self.add_recognized(id);
        }
        self
    }

    /// Fold finished children of type `id` into this context. Also
    /// recognizes `id`.
    pub fn absorbs(mut self, id: NodeId, rule: AbsorbRule) -> Self {
        self.absorbs.insert(id, rule);
        self.add_recognized(id);
        self
    }

    /// Close this context as soon as a child of type `id` closes. Also
    /// recognizes `id`.
    pub fn pops_after(mut self, id: NodeId) -> Self {
        if !self.pops_after.contains(&id) {
            self.pops_after.push(id);
        }
        self.add_recognized(id);
        self
    }

    pub fn hoist(mut self, rule: HoistRule) -> Self {
        self.hoists.push(rule);
        self
    }

    /// Compute `field` from the final content when the context closes.
    pub fn map_content(mut self, field: impl Into<String>, map: ContentMap) -> Self {
        self.mappings.push((field.into(), map));
        self
    }

    pub fn closes_at_eof(mut self, value: bool) -> Self {
        self.closes_at_eof = value;
        self
    }

    pub fn on_match_start(
        mut self,
        f: impl Fn(&mut HookContext<'_>, &TokenMatch) -> Result<(), HookError>
        + Send
        + Sync
        + 'static,
    ) -> Self {
        self.hooks.on_match_start = Some(Arc::new(f));
        self
    }

    /// Runs after the end token is accepted and before the context closes.
    pub fn on_match_end(
        mut self,
        f: impl Fn(&mut HookContext<'_>, &TokenMatch) -> Result<(), HookError>
        + Send
        + Sync
        + 'static,
    ) -> Self {
        self.hooks.on_match_end = Some(Arc::new(f));
        self
    }

    /// Rewrite (`Some`) or drop (`None`) flushed text before it is stored.
    pub fn on_append_content(
        mut self,
        f: impl Fn(&mut HookContext<'_>, String) -> Result<Option<String>, HookError>
        + Send
        + Sync
        + 'static,
    ) -> Self {
        self.hooks.on_append_content = Some(Arc::new(f));
        self
    }

    pub fn on_before_child_parse(
        mut self,
        f: impl Fn(&mut HookContext<'_>, ContextId) -> Result<(), HookError> + Send + Sync + 'static,
    ) -> Self {
        self.hooks.on_before_child_parse = Some(Arc::new(f));
        self
    }

    pub fn on_after_child_parse(
        mut self,
        f: impl Fn(&mut HookContext<'_>, ContextId) -> Result<(), HookError> + Send + Sync + 'static,
    ) -> Self {
        self.hooks.on_after_child_parse = Some(Arc::new(f));
        self
    }

    pub fn on_pop(
        mut self,
        f: impl Fn(&mut HookContext<'_>) -> Result<(), HookError> + Send + Sync + 'static,
    ) -> Self {
        self.hooks.on_pop = Some(Arc::new(f));
        self
    }

    pub fn init_data(mut self, f: impl Fn() -> CustomData + Send + Sync + 'static) -> Self {
        self.hooks.init_data = Some(Arc::new(f));
        self
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn label_str(&self) -> &str {
        &self.label
    }

    pub fn icon_str(&self) -> &str {
        &self.icon
    }

    pub fn start_token(&self) -> Option<&TokenDescriptor> {
        self.start.as_ref()
    }

    pub fn end_token(&self) -> Option<&TokenDescriptor> {
        self.end.as_ref()
    }

    pub fn recognized(&self) -> &[NodeId] {
        &self.recognizes
    }

    pub fn hoist_rules(&self) -> &[HoistRule] {
        &self.hoists
    }

    pub fn absorb_rule(&self, child: NodeId) -> Option<&AbsorbRule> {
        self.absorbs.get(&child)
    }

    pub fn pops_after_child(&self, child: NodeId) -> bool {
        self.pops_after.contains(&child)
    }

    pub fn is_closed_at_eof(&self) -> bool {
        self.closes_at_eof
    }

    pub(crate) fn initial_data(&self) -> CustomData {
        self.hooks
            .init_data
            .as_ref()
            .map(|f| f())
            .unwrap_or_default()
    }

    fn add_recognized(&mut self, id: NodeId) {
        if !self.recognizes.contains(&id) {
            self.recognizes.push(id);
        }
    }
}

/// `Label[id]`, as used in error messages.
impl fmt::Display for NodeDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}[{}]", self.label, self.id)
    }
}

impl fmt::Debug for NodeDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NodeDefinition")
            .field("id", &self.id)
            .field("label", &self.label)
            .field("start", &self.start)
            .field("end", &self.end)
            .field("recognizes", &self.recognizes)
            .field("pops_after", &self.pops_after)
            .field("absorbs", &self.absorbs)
            .field("hoists", &self.hoists)
            .field("mappings", &self.mappings)
            .field("closes_at_eof", &self.closes_at_eof)
            .field("hooks", &self.hooks)
            .finish()
    }
}
