//! Source-annotated rendering of parse errors.

mod printer;


pub use printer::DiagnosticsPrinter;
