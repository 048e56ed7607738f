//! Amortized candidate search.
//!
//! Each pattern remembers the first occurrence at or after the cursor it was
//! last searched from. The cursor only moves forward, so a hit stays valid
//! until the cursor passes its start, and "nothing ahead" stays valid for the
//! rest of the parse.

use std::collections::HashMap;

use crate::definition::TokenMatch;
use crate::pattern::{CompiledPattern, PatternKey};

#[derive(Debug)]
enum Slot {
    Hit(TokenMatch),
    Exhausted,
}

#[derive(Debug, Default)]
pub(crate) struct MatchCache {
    entries: HashMap<PatternKey, Slot>,
}

impl MatchCache {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Next occurrence of `pattern` at or after `cursor`.
    pub(crate) fn next_match(
        &mut self,
        pattern: &CompiledPattern,
        haystack: &str,
        cursor: usize,
    ) -> Option<TokenMatch> {
        let key = pattern.key();
        match self.entries.get(key) {
            Some(Slot::Exhausted) => return None,
            Some(Slot::Hit(m)) if m.range.start >= cursor => return Some(m.clone()),
            _ => {}
        }

        match pattern.find_at(haystack, cursor) {
            Some(m) => {
                self.entries.insert(key.clone(), Slot::Hit(m.clone()));
                Some(m)
            }
            None => {
                self.entries.insert(key.clone(), Slot::Exhausted);
                None
            }
        }
    }
}
