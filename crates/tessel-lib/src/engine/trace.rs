//! Tracing hooks for debugging a grammar.
//!
//! `NoopTracer` is what [`Parser::parse`](crate::Parser::parse) uses: every
//! method is an `#[inline(always)]` empty body, so tracing costs nothing when
//! off. `PrintTracer` keeps formatted lines for [`Parser::parse_traced`](crate::Parser::parse_traced).

use tessel_core::{Colors, Position};

use crate::definition::{NodeDefinition, TokenMatch};
use crate::tree::NodeContext;

/// Verbosity level for trace output.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Verbosity {
    /// Push, pop, text, declined matches, hoists and EOF closes.
    #[default]
    Default,
    /// Also every scan step and every candidate searched.
    Verbose,
}

/// Engine instrumentation.
///
/// Methods receive the engine's own data; formatting is up to the
/// implementation.
pub trait Tracer {
    /// Called at the start of each scan step.
    fn trace_step(&mut self, at: Position, active: &NodeContext);

    /// Called for each candidate searched. `owner` is `None` for the active
    /// context's end token.
    fn trace_candidate(
        &mut self,
        active: &NodeContext,
        pattern: &str,
        owner: Option<&NodeDefinition>,
        found: Option<&TokenMatch>,
    );

    /// Called when literal text is stored in a context.
    fn trace_text(&mut self, ctx: &NodeContext, text: &str);

    /// Called after a child context is pushed.
    fn trace_push(&mut self, ctx: &NodeContext);

    /// Called after a context is finalized and popped.
    fn trace_pop(&mut self, ctx: &NodeContext);

    /// Called when a confirm hook rejects a match.
    fn trace_decline(&mut self, active: &NodeContext, pattern: &str, m: &TokenMatch);

    /// Called when a finished context's value is lifted into an ancestor.
    fn trace_hoist(&mut self, from: &NodeContext, to: &NodeContext, field: &str);

    /// Called when a context is closed by reaching end of input.
    fn trace_eof(&mut self, ctx: &NodeContext);
}

/// No-op tracer that gets optimized away completely.
pub struct NoopTracer;

impl Tracer for NoopTracer {
    #[inline(always)]
    fn trace_step(&mut self, _at: Position, _active: &NodeContext) {}

    #[inline(always)]
    fn trace_candidate(
        &mut self,
        _active: &NodeContext,
        _pattern: &str,
        _owner: Option<&NodeDefinition>,
        _found: Option<&TokenMatch>,
    ) {
    }

    #[inline(always)]
    fn trace_text(&mut self, _ctx: &NodeContext, _text: &str) {}

    #[inline(always)]
    fn trace_push(&mut self, _ctx: &NodeContext) {}

    #[inline(always)]
    fn trace_pop(&mut self, _ctx: &NodeContext) {}

    #[inline(always)]
    fn trace_decline(&mut self, _active: &NodeContext, _pattern: &str, _m: &TokenMatch) {}

    #[inline(always)]
    fn trace_hoist(&mut self, _from: &NodeContext, _to: &NodeContext, _field: &str) {}

    #[inline(always)]
    fn trace_eof(&mut self, _ctx: &NodeContext) {}
}

/// Tracer that collects one line per event.
///
/// Structural events are indented by the depth of the context they concern;
/// text and candidate lines sit one level deeper than their context.
pub struct PrintTracer {
    verbosity: Verbosity,
    colors: Colors,
    lines: Vec<String>,
}

impl PrintTracer {
    pub fn new(verbosity: Verbosity, colors: Colors) -> Self {
        Self {
            verbosity,
            colors,
            lines: Vec::new(),
        }
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    pub fn dump(&self) -> String {
        self.lines.join("\n")
    }

    /// Print all trace lines.
    pub fn print(&self) {
        for line in &self.lines {
            println!("{}", line);
        }
    }

    fn verbose(&self) -> bool {
        self.verbosity == Verbosity::Verbose
    }

    fn name(&self, ctx: &NodeContext) -> String {
        let name = format!("{}{}", ctx.label(), ctx.id());
        self.colors.paint(self.colors.label, &name)
    }

    fn outer(ctx: &NodeContext) -> String {
        "  ".repeat(ctx.level().saturating_sub(1) as usize)
    }

    fn inner(ctx: &NodeContext) -> String {
        "  ".repeat(ctx.level() as usize)
    }
}

impl Tracer for PrintTracer {
    fn trace_step(&mut self, at: Position, active: &NodeContext) {
        if !self.verbose() {
            return;
        }
        let c = self.colors;
        let line = format!("{}{}@ {}{}", Self::inner(active), c.meta, at, c.reset);
        self.lines.push(line);
    }

    fn trace_candidate(
        &mut self,
        active: &NodeContext,
        pattern: &str,
        owner: Option<&NodeDefinition>,
        found: Option<&TokenMatch>,
    ) {
        if !self.verbose() {
            return;
        }
        let c = self.colors;
        let owner = owner.map_or_else(|| "end".to_string(), |d| d.to_string());
        let found = found.map_or_else(|| "none".to_string(), |m| m.range.start.to_string());
        let line = format!(
            "{}? {} {}/{}/{} -> {}",
            Self::inner(active),
            owner,
            c.meta,
            pattern,
            c.reset,
            found
        );
        self.lines.push(line);
    }

    fn trace_text(&mut self, ctx: &NodeContext, text: &str) {
        let c = self.colors;
        let line = format!("{}{}{:?}{}", Self::inner(ctx), c.text, text, c.reset);
        self.lines.push(line);
    }

    fn trace_push(&mut self, ctx: &NodeContext) {
        let c = self.colors;
        let line = format!(
            "{}+ {} {}@{}{}",
            Self::outer(ctx),
            self.name(ctx),
            c.meta,
            ctx.start(),
            c.reset
        );
        self.lines.push(line);
    }

    fn trace_pop(&mut self, ctx: &NodeContext) {
        let line = format!("{}- {}", Self::outer(ctx), self.name(ctx));
        self.lines.push(line);
    }

    fn trace_decline(&mut self, active: &NodeContext, pattern: &str, m: &TokenMatch) {
        let c = self.colors;
        let line = format!(
            "{}! {}/{}/{} at {}",
            Self::inner(active),
            c.meta,
            pattern,
            c.reset,
            m.range.start
        );
        self.lines.push(line);
    }

    fn trace_hoist(&mut self, from: &NodeContext, to: &NodeContext, field: &str) {
        let line = format!(
            "{}^ {} -> {}.{}",
            Self::outer(from),
            self.name(from),
            self.name(to),
            field
        );
        self.lines.push(line);
    }

    fn trace_eof(&mut self, ctx: &NodeContext) {
        let line = format!("{}$ {}", Self::outer(ctx), self.name(ctx));
        self.lines.push(line);
    }
}
