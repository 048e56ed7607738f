//! Scanning engine: one forward pass over the source driven by the stack of
//! open contexts.
//!
//! At each step the active context searches for its own end token and the
//! start tokens of the types it recognizes, takes the earliest hit, stores the
//! text before it, and pushes or pops accordingly.

mod cache;
mod limits;
mod scan;
mod trace;

#[cfg(test)]
mod engine_tests;

pub use limits::FuelLimits;
pub use trace::{NoopTracer, PrintTracer, Tracer, Verbosity};

pub(crate) use scan::Engine;
