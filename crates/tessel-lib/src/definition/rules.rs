//! Structural rules: absorbing finished children, hoisting values from
//! descendants, and mapping final content into named fields.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use super::NodeId;
use crate::Error;
use crate::tree::{ContentList, Value};

/// How a parent folds a finished child of a given type into itself.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AbsorbRule {
    /// Splice the child's content entries in place of the child.
    Append,
    /// Replace the child with its concatenated text.
    Join,
    /// Store the child's content entries in a field; drop the child.
    CopyTo(String),
    /// Store the child's concatenated text in a field; drop the child.
    JoinTo(String),
}

/// How far below the registering context a hoist may reach.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HoistDepth {
    Any,
    /// Maximum level distance; `1` means direct children only.
    Levels(u32),
}

impl HoistDepth {
    pub fn allows(self, distance: u32) -> bool {
        match self {
            Self::Any => true,
            Self::Levels(max) => distance <= max,
        }
    }
}

/// What to do when a single-value hoist field is already set.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ConflictPolicy {
    #[default]
    Error,
    Overwrite,
    Ignore,
}

impl FromStr for ConflictPolicy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "error" => Ok(Self::Error),
            "overwrite" => Ok(Self::Overwrite),
            "ignore" => Ok(Self::Ignore),
            other => Err(Error::UnsupportedConflictPolicy(other.to_string())),
        }
    }
}

/// Value lifted from the finishing context.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum HoistMap {
    /// Reference to the context itself.
    Context,
    /// Its concatenated text.
    Text,
    /// One of its custom-data fields (`Null` when unset).
    Field(String),
}

/// Lift values from descendants of type `target` into `field` on the
/// registering context.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HoistRule {
    pub(crate) target: NodeId,
    pub(crate) field: String,
    pub(crate) array: bool,
    pub(crate) depth: HoistDepth,
    pub(crate) conflict: ConflictPolicy,
    pub(crate) map: HoistMap,
    pub(crate) remove_from_content: bool,
}

impl HoistRule {
    pub fn new(target: NodeId, field: impl Into<String>) -> Self {
        Self {
            target,
            field: field.into(),
            array: false,
            depth: HoistDepth::Any,
            conflict: ConflictPolicy::Error,
            map: HoistMap::Context,
            remove_from_content: false,
        }
    }

    /// Accumulate every hit into an ordered list.
    pub fn array(mut self) -> Self {
        self.array = true;
        self
    }

    pub fn depth(mut self, depth: HoistDepth) -> Self {
        self.depth = depth;
        self
    }

    pub fn levels(self, max: u32) -> Self {
        self.depth(HoistDepth::Levels(max))
    }

    pub fn conflict(mut self, policy: ConflictPolicy) -> Self {
        self.conflict = policy;
        self
    }

    pub fn map(mut self, map: HoistMap) -> Self {
        self.map = map;
        self
    }

    pub fn text(self) -> Self {
        self.map(HoistMap::Text)
    }

    pub fn remove_from_content(mut self) -> Self {
        self.remove_from_content = true;
        self
    }

    pub fn target(&self) -> NodeId {
        self.target
    }

    pub fn field(&self) -> &str {
        &self.field
    }
}

pub type ContentMapFn = Arc<dyn Fn(&mut ContentList) -> Option<Value> + Send + Sync>;

/// Post-pop transform computing a field from the final content.
#[derive(Clone)]
pub enum ContentMap {
    First,
    Last,
    /// Remove and return the first entry.
    Shift,
    /// Remove and return the last entry.
    Pop,
    /// Concatenated text of all entries.
    Join,
    /// Concatenated text, then clear the content.
    JoinClear,
    Custom(ContentMapFn),
}

impl ContentMap {
    pub fn custom(f: impl Fn(&mut ContentList) -> Option<Value> + Send + Sync + 'static) -> Self {
        Self::Custom(Arc::new(f))
    }
}

impl fmt::Debug for ContentMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::First => f.write_str("First"),
            Self::Last => f.write_str("Last"),
            Self::Shift => f.write_str("Shift"),
            Self::Pop => f.write_str("Pop"),
            Self::Join => f.write_str("Join"),
            Self::JoinClear => f.write_str("JoinClear"),
            Self::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}
