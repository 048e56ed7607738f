//! Registration: the id → definition table and the precompiled patterns.

use std::collections::HashMap;
use std::sync::Arc;

use indexmap::IndexMap;

use crate::definition::{NodeDefinition, NodeId, Pattern, TokenDescriptor};
use crate::engine::{Engine, FuelLimits, NoopTracer, Tracer};
use crate::pattern::{CompiledPattern, PatternTable};
use crate::tree::ParseTree;
use crate::{Error, Result};

/// Which pattern of a definition a compiled entry belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub(crate) enum Slot {
    Start,
    End,
    Skip,
    Bad,
    Good,
}

/// A registered set of node definitions, ready to parse.
///
/// Immutable after [`register`](Self::register); every call to
/// [`parse`](Self::parse) runs an isolated engine, so one parser can be
/// shared across threads.
#[derive(Debug)]
pub struct Parser {
    nodes: IndexMap<NodeId, Arc<NodeDefinition>>,
    root: NodeId,
    compiled: HashMap<(NodeId, Slot), Arc<CompiledPattern>>,
    limits: FuelLimits,
}

impl Parser {
    /// Build the id table and compile every static pattern.
    ///
    /// Fails on a duplicate id, a root id that is not among `definitions`,
    /// or a pattern that does not compile.
    pub fn register(
        definitions: impl IntoIterator<Item = NodeDefinition>,
        root: NodeId,
    ) -> Result<Self> {
        let mut nodes: IndexMap<NodeId, Arc<NodeDefinition>> = IndexMap::new();
        for def in definitions {
            if let Some(existing) = nodes.get(&def.id) {
                return Err(Error::DuplicateNode {
                    id: def.id,
                    first: existing.label.clone(),
                    second: def.label.clone(),
                });
            }
            nodes.insert(def.id, Arc::new(def));
        }

        if !nodes.contains_key(&root) {
            return Err(Error::MissingRoot(root));
        }

        let mut table = PatternTable::new();
        let mut compiled = HashMap::new();
        for def in nodes.values() {
            let tokens: [(Slot, Option<&TokenDescriptor>); 2] =
                [(Slot::Start, def.start.as_ref()), (Slot::End, def.end.as_ref())];
            for (slot, token) in tokens {
                if let Some(token) = token
                    && !token.pattern.is_dynamic()
                {
                    let pattern = table.intern(&token.pattern, token.escape_aware)?;
                    compiled.insert((def.id, slot), pattern);
                }
            }

            let guards: [(Slot, Option<&Pattern>); 3] = [
                (Slot::Skip, def.skip.as_ref()),
                (Slot::Bad, def.bad.as_ref()),
                (Slot::Good, def.good.as_ref()),
            ];
            for (slot, guard) in guards {
                if let Some(guard) = guard {
                    compiled.insert((def.id, slot), table.intern(guard, false)?);
                }
            }
        }

        Ok(Self {
            nodes,
            root,
            compiled,
            limits: FuelLimits::default(),
        })
    }

    pub fn limits(mut self, limits: FuelLimits) -> Self {
        self.limits = limits;
        self
    }

    pub fn get_limits(&self) -> FuelLimits {
        self.limits
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn get(&self, id: NodeId) -> Option<&NodeDefinition> {
        self.nodes.get(&id).map(|def| &**def)
    }

    /// Registered definitions in registration order.
    pub fn definitions(&self) -> impl Iterator<Item = &NodeDefinition> {
        self.nodes.values().map(|def| &**def)
    }

    pub(crate) fn definition(&self, id: NodeId) -> Option<&Arc<NodeDefinition>> {
        self.nodes.get(&id)
    }

    pub(crate) fn compiled(&self, id: NodeId, slot: Slot) -> Option<&Arc<CompiledPattern>> {
        self.compiled.get(&(id, slot))
    }

    pub fn parse(&self, source: &str) -> Result<ParseTree> {
        self.parse_traced(source, &mut NoopTracer)
    }

    pub fn parse_traced<T: Tracer>(&self, source: &str, tracer: &mut T) -> Result<ParseTree> {
        let root = self
            .definition(self.root)
            .cloned()
            .ok_or(Error::MissingRoot(self.root))?;
        Engine::new(self, root, source, tracer).run()
    }
}
