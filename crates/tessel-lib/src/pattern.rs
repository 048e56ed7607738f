//! Compiled token patterns and the table that deduplicates them.
//!
//! Every static pattern is compiled once at registration. Dynamic patterns are
//! compiled on first use during a parse and cached by source, so a closing
//! delimiter that depends on custom data costs one compilation per distinct
//! value.

use std::collections::HashMap;
use std::ops::Range;
use std::sync::Arc;

use indexmap::IndexMap;
use regex_automata::meta::Regex;
use regex_automata::{Input, PatternID};

use crate::definition::{Pattern, TokenMatch};
use crate::{Error, Result};

/// Identity of a compiled pattern: its regex source and escape awareness.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub(crate) struct PatternKey {
    source: Arc<str>,
    escape_aware: bool,
}

impl PatternKey {
    pub(crate) fn source(&self) -> &str {
        &self.source
    }
}

#[derive(Debug)]
pub(crate) struct CompiledPattern {
    key: PatternKey,
    regex: Regex,
    /// Capture group index and name, for named groups only.
    names: Vec<(usize, Arc<str>)>,
}

impl CompiledPattern {
    pub(crate) fn compile(pattern: &Pattern, escape_aware: bool) -> Result<Self> {
        let Some(source) = pattern.regex_source() else {
            return Err(Error::Pattern {
                pattern: format!("{pattern:?}"),
                message: "dynamic patterns must produce a literal, alternatives or regex".into(),
            });
        };

        let regex = Regex::new(&source).map_err(|e| Error::Pattern {
            pattern: source.clone(),
            message: e.to_string(),
        })?;

        let names = regex
            .group_info()
            .pattern_names(PatternID::ZERO)
            .enumerate()
            .filter_map(|(i, name)| name.map(|n| (i, Arc::from(n))))
            .collect();

        Ok(Self {
            key: PatternKey {
                source: source.into(),
                escape_aware,
            },
            regex,
            names,
        })
    }

    pub(crate) fn key(&self) -> &PatternKey {
        &self.key
    }

    /// First occurrence starting at or after `from`, skipping occurrences
    /// escaped by an odd run of backslashes when escape-aware.
    pub(crate) fn find_at(&self, haystack: &str, from: usize) -> Option<TokenMatch> {
        let mut caps = self.regex.create_captures();
        let mut from = from;
        while from <= haystack.len() {
            self.regex
                .search_captures(&Input::new(haystack).range(from..), &mut caps);
            let m = caps.get_match()?;
            if self.key.escape_aware && is_escaped(haystack, m.start()) {
                from = next_boundary(haystack, m.start());
                continue;
            }
            return Some(self.token_match(haystack, m.range(), &caps));
        }
        None
    }

    pub(crate) fn is_match(&self, text: &str) -> bool {
        self.regex.is_match(text)
    }

    pub(crate) fn find(&self, text: &str) -> Option<Range<usize>> {
        self.regex.find(text).map(|m| m.range())
    }

    /// Byte ranges of `text` left after removing every match.
    pub(crate) fn kept_ranges(&self, text: &str) -> Vec<Range<usize>> {
        let mut kept = Vec::new();
        let mut last = 0;
        for m in self.regex.find_iter(text) {
            if m.start() > last {
                kept.push(last..m.start());
            }
            last = last.max(m.end());
        }
        if last < text.len() {
            kept.push(last..text.len());
        }
        kept
    }

    fn token_match(
        &self,
        haystack: &str,
        range: Range<usize>,
        caps: &regex_automata::util::captures::Captures,
    ) -> TokenMatch {
        let mut captures = IndexMap::new();
        for (index, name) in &self.names {
            if let Some(span) = caps.get_group(*index) {
                captures.insert(name.to_string(), haystack[span.range()].to_string());
            }
        }
        TokenMatch {
            text: haystack[range.clone()].to_string(),
            range,
            captures,
        }
    }
}

fn is_escaped(haystack: &str, at: usize) -> bool {
    let run = haystack.as_bytes()[..at]
        .iter()
        .rev()
        .take_while(|&&b| b == b'\\')
        .count();
    run % 2 == 1
}

/// Smallest char boundary strictly after `at`, or `len + 1` past the end.
pub(crate) fn next_boundary(haystack: &str, at: usize) -> usize {
    let mut next = at + 1;
    while next < haystack.len() && !haystack.is_char_boundary(next) {
        next += 1;
    }
    next
}

/// Compiled patterns deduplicated by regex source and escape flag.
#[derive(Debug, Default)]
pub(crate) struct PatternTable {
    lookup: HashMap<(String, bool), Arc<CompiledPattern>>,
}

impl PatternTable {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Compile a static pattern, reusing an earlier compilation of the same
    /// source.
    pub(crate) fn intern(&mut self, pattern: &Pattern, escape_aware: bool) -> Result<Arc<CompiledPattern>> {
        let Some(source) = pattern.regex_source() else {
            return CompiledPattern::compile(pattern, escape_aware).map(Arc::new);
        };
        let key = (source, escape_aware);
        if let Some(found) = self.lookup.get(&key) {
            return Ok(Arc::clone(found));
        }
        let compiled = Arc::new(CompiledPattern::compile(pattern, escape_aware)?);
        self.lookup.insert(key, Arc::clone(&compiled));
        Ok(compiled)
    }

    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.lookup.len()
    }
}
