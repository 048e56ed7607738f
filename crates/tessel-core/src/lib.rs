#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

//! Core data structures shared by the Tessel crates.
//!
//! Nothing in here knows about node definitions or the scanning engine:
//! - [`Position`], [`Span`]: row/column/offset coordinates handed to clients
//! - [`SourceMap`]: byte offset → position conversion, built once per parse
//! - [`Colors`]: ANSI palette for printers and tracers

mod colors;
mod position;


pub use colors::Colors;
pub use position::{Position, SourceMap, Span};
