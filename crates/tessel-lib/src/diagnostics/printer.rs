//! Builder-pattern printer for rendering a [`ParseError`] against its source.

use std::fmt::Write;

use annotate_snippets::{AnnotationKind, Level, Renderer, Snippet};
use tessel_core::Span;

use crate::error::ParseError;

pub struct DiagnosticsPrinter<'e, 's> {
    error: &'e ParseError,
    source: Option<&'s str>,
    path: Option<&'s str>,
    colored: bool,
}

impl<'e, 's> DiagnosticsPrinter<'e, 's> {
    pub fn new(error: &'e ParseError) -> Self {
        Self {
            error,
            source: None,
            path: None,
            colored: false,
        }
    }

    pub fn source(mut self, source: &'s str) -> Self {
        self.source = Some(source);
        self
    }

    pub fn path(mut self, path: &'s str) -> Self {
        self.path = Some(path);
        self
    }

    pub fn colored(mut self, value: bool) -> Self {
        self.colored = value;
        self
    }

    pub fn render(&self) -> String {
        let mut out = String::new();
        self.format(&mut out).expect("String write never fails");
        out
    }

    pub fn format(&self, w: &mut impl Write) -> std::fmt::Result {
        let Some(source) = self.source else {
            return write!(w, "{}", self.error);
        };

        let renderer = if self.colored {
            Renderer::styled()
        } else {
            Renderer::plain()
        };

        let err = self.error;
        let mut snippet = Snippet::source(source)
            .line_start(1)
            .annotation(AnnotationKind::Primary.span(adjust_range(err.span, source)));

        if let Some(p) = self.path {
            snippet = snippet.path(p);
        }

        for (span, message) in &err.related {
            snippet = snippet.annotation(
                AnnotationKind::Context
                    .span(adjust_range(*span, source))
                    .label(message),
            );
        }

        let report = vec![Level::ERROR.primary_title(&err.message).element(snippet)];
        write!(w, "{}", renderer.render(&report))
    }
}

/// Clamp to the source, snap to char boundaries, and widen empty spans to
/// one character so the caret stays visible.
fn adjust_range(span: Span, source: &str) -> std::ops::Range<usize> {
    let start = floor_boundary(source, span.start.offset);
    let end = floor_boundary(source, span.end.offset).max(start);

    if start == end {
        let width = source[start..].chars().next().map_or(0, char::len_utf8);
        return start..start + width;
    }

    start..end
}

fn floor_boundary(source: &str, offset: usize) -> usize {
    let mut at = offset.min(source.len());
    while !source.is_char_boundary(at) {
        at -= 1;
    }
    at
}

impl ParseError {
    pub fn printer(&self) -> DiagnosticsPrinter<'_, '_> {
        DiagnosticsPrinter::new(self)
    }
}
