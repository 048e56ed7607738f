//! Terminal palette shared by the tree printer and the parse tracer.
//!
//! Slots are named by what they paint, not by hue:
//! - `label`: node labels and icons (blue)
//! - `text`: literal content fragments (green)
//! - `meta`: data keys, spans, cursor offsets (dim)

/// Escape sequences for each slot; every slot is empty when colors are off.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Colors {
    pub label: &'static str,
    pub text: &'static str,
    pub meta: &'static str,
    pub reset: &'static str,
}

impl Colors {
    pub const ON: Self = Self {
        label: "\x1b[34m",
        text: "\x1b[32m",
        meta: "\x1b[2m",
        reset: "\x1b[0m",
    };

    pub const OFF: Self = Self {
        label: "",
        text: "",
        meta: "",
        reset: "",
    };

    pub fn new(enabled: bool) -> Self {
        if enabled { Self::ON } else { Self::OFF }
    }

    /// `text` wrapped in `slot`, followed by a reset when colors are on.
    pub fn paint(&self, slot: &'static str, text: &str) -> String {
        if slot.is_empty() {
            return text.to_string();
        }
        format!("{slot}{text}{}", self.reset)
    }
}
