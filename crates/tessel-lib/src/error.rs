//! Setup-time and parse-time errors.

use std::fmt;

use serde::Serialize;
use tessel_core::Span;

use crate::definition::{HookError, NodeId};

/// Errors returned by [`Parser::register`](crate::Parser::register) and
/// [`Parser::parse`](crate::Parser::parse).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    #[error("node id {id} is used by both \"{first}\" and \"{second}\"")]
    DuplicateNode {
        id: NodeId,
        first: String,
        second: String,
    },

    #[error("root node {0} is not registered")]
    MissingRoot(NodeId),

    #[error("unsupported hoist conflict policy \"{0}\" (expected error, overwrite or ignore)")]
    UnsupportedConflictPolicy(String),

    #[error("invalid pattern `{pattern}`: {message}")]
    Pattern { pattern: String, message: String },

    #[error(transparent)]
    Parse(#[from] ParseError),

    /// Too many scan steps; usually a grammar looping on zero-width tokens.
    #[error("parse step limit of {0} exceeded")]
    ExecFuelExhausted(u32),

    #[error("nesting limit of {0} exceeded")]
    RecursionLimitExceeded(u32),
}

impl Error {
    /// The positioned parse error, if this is one.
    pub fn as_parse(&self) -> Option<&ParseError> {
        match self {
            Self::Parse(err) => Some(err),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ParseErrorKind {
    UnexpectedEof,
    BadToken,
    GoodTokenMissing,
    Mismatch,
    HoistConflict,
    UnknownNode,
    Hook,
}

impl fmt::Display for ParseErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::UnexpectedEof => "unexpected end of input",
            Self::BadToken => "forbidden token",
            Self::GoodTokenMissing => "required token missing",
            Self::Mismatch => "mismatched delimiters",
            Self::HoistConflict => "hoist conflict",
            Self::UnknownNode => "unknown node",
            Self::Hook => "hook error",
        };
        f.write_str(s)
    }
}

/// A fatal, positioned parse failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParseError {
    pub kind: ParseErrorKind,
    pub message: String,
    pub span: Span,
    /// Whether `span` covers a whole block (start of a node to the failure
    /// point) rather than a single point.
    pub block: bool,
    pub related: Vec<(Span, String)>,
}

impl ParseError {
    pub fn new(kind: ParseErrorKind, message: impl Into<String>, span: Span) -> Self {
        Self {
            kind,
            message: message.into(),
            span,
            block: false,
            related: Vec::new(),
        }
    }

    pub fn block(mut self) -> Self {
        self.block = true;
        self
    }

    pub fn with_related(mut self, span: Span, message: impl Into<String>) -> Self {
        self.related.push((span, message.into()));
        self
    }

    /// Convert a hook error, positioning it at `fallback` when it has no
    /// span of its own.
    pub fn from_hook(err: HookError, fallback: Span) -> Self {
        Self {
            kind: err.kind,
            message: err.message,
            span: err.span.unwrap_or(fallback),
            block: err.block,
            related: err.related,
        }
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "error at {}: {}", self.span.start, self.message)
    }
}

impl std::error::Error for ParseError {}

pub type Result<T> = std::result::Result<T, Error>;
