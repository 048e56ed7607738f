//! Tessel: a declarative scanning parser built from node templates.
//!
//! A grammar is a set of [`NodeDefinition`]s. Each one says which token opens
//! it, which token closes it, which other node types may start inside it, and
//! how finished children fold into their ancestors (hoisting, absorbing,
//! content mapping). [`Parser`] registers the definitions once and turns any
//! number of inputs into [`ParseTree`]s.
//!
//! # Example
//!
//! ```
//! use tessel_lib::{NodeDefinition, NodeId, Parser, TokenDescriptor};
//!
//! const ROOT: NodeId = NodeId::new(0);
//! const GROUP: NodeId = NodeId::new(1);
//!
//! let parser = Parser::register(
//!     [
//!         NodeDefinition::new(ROOT).label("Root").recognizes([GROUP]),
//!         NodeDefinition::new(GROUP)
//!             .label("Group")
//!             .starts_with(TokenDescriptor::new("(").omit())
//!             .ends_with(TokenDescriptor::new(")").omit()),
//!     ],
//!     ROOT,
//! )
//! .expect("valid grammar");
//!
//! let tree = parser.parse("a(b)c").expect("balanced input");
//! assert_eq!(tree.root().children().count(), 1);
//! ```

#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

pub mod definition;
pub mod diagnostics;
pub mod engine;
pub mod error;
mod hoist;
mod parser;
mod pattern;
mod printer;
pub mod tree;

#[cfg(test)]
mod test_utils;

pub use definition::{
    AbsorbRule, Confirm, ConflictPolicy, ContentMap, HoistDepth, HoistMap, HoistRule,
    HookContext, HookError, NodeDefinition, NodeId, Pattern, TokenDescriptor, TokenMatch,
    TokenMode,
};
pub use diagnostics::DiagnosticsPrinter;
pub use engine::{FuelLimits, NoopTracer, PrintTracer, Tracer, Verbosity};
pub use error::{Error, ParseError, ParseErrorKind, Result};
pub use parser::Parser;
pub use printer::TreePrinter;
pub use tree::{Content, ContentList, ContextId, CustomData, NodeContext, NodeRef, ParseTree, Value};

pub use tessel_core::{Colors, Position, Span};
