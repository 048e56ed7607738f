//! Indented text dump of a parse tree.

use std::fmt::Write;

use tessel_core::Colors;

use crate::tree::{Content, NodeRef, Value};

pub struct TreePrinter<'t> {
    node: NodeRef<'t>,
    spans: bool,
    data: bool,
    colors: Colors,
}

impl<'t> TreePrinter<'t> {
    pub fn new(node: NodeRef<'t>) -> Self {
        Self {
            node,
            spans: false,
            data: true,
            colors: Colors::OFF,
        }
    }

    pub fn with_spans(mut self, value: bool) -> Self {
        self.spans = value;
        self
    }

    pub fn with_data(mut self, value: bool) -> Self {
        self.data = value;
        self
    }

    pub fn colored(mut self, value: bool) -> Self {
        self.colors = Colors::new(value);
        self
    }

    pub fn dump(&self) -> String {
        let mut out = String::new();
        self.format(&mut out).expect("String write never fails");
        out
    }

    pub fn format(&self, w: &mut impl Write) -> std::fmt::Result {
        self.format_node(self.node, 0, w)
    }

    fn format_node(&self, node: NodeRef<'t>, indent: usize, w: &mut impl Write) -> std::fmt::Result {
        let prefix = "  ".repeat(indent);
        let c = &self.colors;
        write!(
            w,
            "{prefix}{}{} {}{}",
            c.label,
            node.icon(),
            node.label(),
            c.reset
        )?;

        if self.spans {
            write!(w, " {}[{}..{}]{}", c.meta, node.start(), node.end(), c.reset)?;
        }

        if self.data {
            for (key, value) in node.data().iter() {
                write!(w, " {}{key}={}", c.meta, c.reset)?;
                self.format_value(node, value, w)?;
            }
        }
        writeln!(w)?;

        let tree = node.tree();
        for entry in node.content() {
            match entry {
                Content::Text(text) => {
                    writeln!(w, "{prefix}  {}{text:?}{}", c.text, c.reset)?;
                }
                Content::Node(id) => {
                    if let Some(child) = tree.get(*id) {
                        self.format_node(child, indent + 1, w)?;
                    }
                }
            }
        }
        Ok(())
    }

    fn format_value(&self, node: NodeRef<'t>, value: &Value, w: &mut impl Write) -> std::fmt::Result {
        match value {
            Value::Null => w.write_str("null"),
            Value::Bool(b) => write!(w, "{b}"),
            Value::Int(n) => write!(w, "{n}"),
            Value::String(s) => write!(w, "{s:?}"),
            Value::Node(id) => match node.tree().get(*id) {
                Some(target) => write!(w, "<{}{}>", target.label(), id),
                None => write!(w, "<{id}>"),
            },
            Value::Array(items) => {
                w.write_char('[')?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        w.write_str(", ")?;
                    }
                    self.format_value(node, item, w)?;
                }
                w.write_char(']')
            }
        }
    }
}
