//! Registry of live hoist rules.
//!
//! A context's hoist rules are registered when it is pushed and removed when
//! it is popped, so the lifting window of a rule is exactly the stack
//! lifetime of the context that owns it. Registrations are indexed by the
//! target node type; a finishing context only looks at the registrations for
//! its own type.

use std::collections::HashMap;

use tessel_core::Span;

use crate::definition::{ConflictPolicy, HoistMap, HoistRule, NodeId};
use crate::error::{ParseError, ParseErrorKind};
use crate::tree::{ContextId, NodeContext, ParseTree, Value};

#[derive(Debug, Clone)]
struct Registration {
    owner: ContextId,
    level: u32,
    rule: HoistRule,
}

/// A value delivered by [`HoistRegistry::lift`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Lifted {
    pub(crate) owner: ContextId,
    pub(crate) field: String,
}

#[derive(Debug, Default)]
pub(crate) struct HoistRegistry {
    by_target: HashMap<NodeId, Vec<Registration>>,
}

impl HoistRegistry {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn register(&mut self, owner: &NodeContext) {
        for rule in owner.definition().hoist_rules() {
            self.by_target
                .entry(rule.target())
                .or_default()
                .push(Registration {
                    owner: owner.id(),
                    level: owner.level(),
                    rule: rule.clone(),
                });
        }
    }

    pub(crate) fn deregister(&mut self, owner: &NodeContext) {
        for rule in owner.definition().hoist_rules() {
            if let Some(regs) = self.by_target.get_mut(&rule.target()) {
                regs.retain(|r| r.owner != owner.id());
            }
        }
    }

    /// Deliver `finished` to every live registration for its type whose
    /// depth limit it satisfies, outermost registration first.
    pub(crate) fn lift(
        &self,
        tree: &mut ParseTree,
        finished: ContextId,
    ) -> Result<Vec<Lifted>, ParseError> {
        let (target, level) = {
            let ctx = tree.context(finished);
            (ctx.node_id(), ctx.level())
        };
        let Some(regs) = self.by_target.get(&target) else {
            return Ok(Vec::new());
        };

        let mut lifted = Vec::new();
        for reg in regs {
            let rule = &reg.rule;
            if !rule.depth.allows(level.saturating_sub(reg.level)) {
                continue;
            }

            let value = match &rule.map {
                HoistMap::Context => Value::Node(finished),
                HoistMap::Text => Value::String(tree.text_of(finished)),
                HoistMap::Field(name) => tree
                    .context(finished)
                    .data()
                    .get(name)
                    .cloned()
                    .unwrap_or_default(),
            };

            let occupied = tree.context(reg.owner).data().is_set(&rule.field);
            let data = &mut tree.context_mut(reg.owner).data;
            if rule.array {
                data.push(&rule.field, value);
            } else if !occupied {
                data.set(rule.field.as_str(), value);
            } else {
                match rule.conflict {
                    ConflictPolicy::Error => return Err(conflict(tree, finished, reg)),
                    ConflictPolicy::Overwrite => {
                        data.set(rule.field.as_str(), value);
                    }
                    ConflictPolicy::Ignore => continue,
                }
            }

            if rule.remove_from_content
                && let Some(parent) = tree.context(finished).parent()
            {
                tree.context_mut(parent).content.remove_node(finished);
            }

            lifted.push(Lifted {
                owner: reg.owner,
                field: rule.field.clone(),
            });
        }
        Ok(lifted)
    }
}

fn conflict(tree: &ParseTree, finished: ContextId, reg: &Registration) -> ParseError {
    let child = tree.context(finished);
    let owner = tree.context(reg.owner);
    ParseError::new(
        ParseErrorKind::HoistConflict,
        format!(
            "cannot hoist another \"{}\" into \"{}\" as \"{}\": the field is already set",
            child.definition(),
            owner.definition(),
            reg.rule.field
        ),
        child.span(),
    )
    .with_related(Span::point(owner.start()), "hoisting context starts here")
}
