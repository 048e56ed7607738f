//! Token descriptors: what a delimiter looks like and what happens to it.

use std::fmt;
use std::ops::Range;
use std::sync::Arc;

use indexmap::IndexMap;

use super::hooks::{ConfirmHook, HookContext, HookError};
use crate::tree::CustomData;

/// Pattern producer evaluated against the live context's custom data.
pub type DynamicPattern = Arc<dyn Fn(&CustomData) -> Pattern + Send + Sync>;

/// Delimiter pattern.
///
/// Static variants are compiled once at registration. `Dynamic` is evaluated
/// on every scan step with a read-only view of the live context's data and
/// must produce one of the static variants.
#[derive(Clone)]
pub enum Pattern {
    Literal(String),
    /// Literal alternatives, tried in declaration order.
    OneOf(Vec<String>),
    Regex(String),
    Dynamic(DynamicPattern),
}

impl Pattern {
    pub fn literal(s: impl Into<String>) -> Self {
        Self::Literal(s.into())
    }

    pub fn one_of<I, S>(items: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::OneOf(items.into_iter().map(Into::into).collect())
    }

    pub fn regex(s: impl Into<String>) -> Self {
        Self::Regex(s.into())
    }

    pub fn dynamic(f: impl Fn(&CustomData) -> Pattern + Send + Sync + 'static) -> Self {
        Self::Dynamic(Arc::new(f))
    }

    pub fn is_dynamic(&self) -> bool {
        matches!(self, Self::Dynamic(_))
    }

    /// Regex source for a static pattern. `None` for `Dynamic`.
    pub fn regex_source(&self) -> Option<String> {
        match self {
            Self::Literal(s) => Some(regex_syntax::escape(s)),
            Self::OneOf(items) => {
                let alts: Vec<String> = items.iter().map(|s| regex_syntax::escape(s)).collect();
                Some(format!("(?:{})", alts.join("|")))
            }
            Self::Regex(s) => Some(s.clone()),
            Self::Dynamic(_) => None,
        }
    }
}

impl fmt::Debug for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Literal(s) => f.debug_tuple("Literal").field(s).finish(),
            Self::OneOf(items) => f.debug_tuple("OneOf").field(items).finish(),
            Self::Regex(s) => f.debug_tuple("Regex").field(s).finish(),
            Self::Dynamic(_) => f.write_str("Dynamic(..)"),
        }
    }
}

impl From<&str> for Pattern {
    fn from(s: &str) -> Self {
        Self::Literal(s.to_string())
    }
}

impl From<String> for Pattern {
    fn from(s: String) -> Self {
        Self::Literal(s)
    }
}

/// What happens to the matched delimiter text.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum TokenMode {
    /// Append the text as literal content, then consume it.
    #[default]
    Default,
    /// Consume the text and drop it.
    Omit,
    /// End token: leave the text unconsumed for the enclosing context.
    /// Start token: hand the text to the parent's content and start the
    /// child right after it.
    Eject,
}

/// Verdict of a match-confirm hook.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Confirm {
    /// Not a real match; keep scanning.
    Reject,
    Accept,
    /// Accept, overriding the descriptor's mode for this occurrence.
    AcceptAs(TokenMode),
}

/// A delimiter occurrence found in the source.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TokenMatch {
    pub text: String,
    /// Byte range in the source.
    pub range: Range<usize>,
    /// Named capture groups that participated in the match.
    pub captures: IndexMap<String, String>,
}

impl TokenMatch {
    pub fn capture(&self, name: &str) -> Option<&str> {
        self.captures.get(name).map(String::as_str)
    }
}

/// Pattern plus consumption mode, escape awareness and confirm hook.
#[derive(Clone)]
pub struct TokenDescriptor {
    pub(crate) pattern: Pattern,
    pub(crate) mode: TokenMode,
    pub(crate) escape_aware: bool,
    pub(crate) confirm: Option<ConfirmHook>,
}

impl TokenDescriptor {
    pub fn new(pattern: impl Into<Pattern>) -> Self {
        Self {
            pattern: pattern.into(),
            mode: TokenMode::Default,
            escape_aware: false,
            confirm: None,
        }
    }

    pub fn omit(mut self) -> Self {
        self.mode = TokenMode::Omit;
        self
    }

    pub fn eject(mut self) -> Self {
        self.mode = TokenMode::Eject;
        self
    }

    pub fn mode(mut self, mode: TokenMode) -> Self {
        self.mode = mode;
        self
    }

    /// Ignore occurrences preceded by an odd number of backslashes.
    pub fn escape_aware(mut self) -> Self {
        self.escape_aware = true;
        self
    }

    pub fn confirm(
        mut self,
        f: impl Fn(&mut HookContext<'_>, &TokenMatch) -> Result<Confirm, HookError>
        + Send
        + Sync
        + 'static,
    ) -> Self {
        self.confirm = Some(Arc::new(f));
        self
    }

    pub fn pattern(&self) -> &Pattern {
        &self.pattern
    }

    pub fn token_mode(&self) -> TokenMode {
        self.mode
    }

    pub fn is_escape_aware(&self) -> bool {
        self.escape_aware
    }
}

impl fmt::Debug for TokenDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenDescriptor")
            .field("pattern", &self.pattern)
            .field("mode", &self.mode)
            .field("escape_aware", &self.escape_aware)
            .field("confirm", &self.confirm.is_some())
            .finish()
    }
}

impl From<Pattern> for TokenDescriptor {
    fn from(pattern: Pattern) -> Self {
        Self::new(pattern)
    }
}

impl From<&str> for TokenDescriptor {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}
