//! Ordered content of a context: text fragments and child references.

use serde::Serialize;

use super::ContextId;

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Content {
    Text(String),
    Node(ContextId),
}

impl Content {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            Self::Node(_) => None,
        }
    }

    pub fn as_node(&self) -> Option<ContextId> {
        match self {
            Self::Text(_) => None,
            Self::Node(id) => Some(*id),
        }
    }
}

impl From<&str> for Content {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

impl From<ContextId> for Content {
    fn from(id: ContextId) -> Self {
        Self::Node(id)
    }
}

/// Content entries with two invariants kept by every mutator:
/// no empty text entry, and no two adjacent text entries.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ContentList {
    items: Vec<Content>,
}

impl ContentList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Content> {
        self.items.get(index)
    }

    pub fn first(&self) -> Option<&Content> {
        self.items.first()
    }

    pub fn last(&self) -> Option<&Content> {
        self.items.last()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Content> {
        self.items.iter()
    }

    pub fn as_slice(&self) -> &[Content] {
        &self.items
    }

    /// Child references in order.
    pub fn nodes(&self) -> impl Iterator<Item = ContextId> + '_ {
        self.items.iter().filter_map(Content::as_node)
    }

    /// Text entries only, ignoring child references.
    pub fn texts(&self) -> impl Iterator<Item = &str> + '_ {
        self.items.iter().filter_map(Content::as_text)
    }

    pub fn push(&mut self, entry: Content) {
        match entry {
            Content::Text(s) => self.push_text(&s),
            Content::Node(id) => self.items.push(Content::Node(id)),
        }
    }

    pub fn push_text(&mut self, text: &str) {
        if text.is_empty() {
            return;
        }
        if let Some(Content::Text(last)) = self.items.last_mut() {
            last.push_str(text);
        } else {
            self.items.push(Content::Text(text.to_string()));
        }
    }

    pub fn push_node(&mut self, id: ContextId) {
        self.items.push(Content::Node(id));
    }

    pub fn position_of(&self, id: ContextId) -> Option<usize> {
        self.items.iter().position(|c| *c == Content::Node(id))
    }

    pub fn contains_node(&self, id: ContextId) -> bool {
        self.position_of(id).is_some()
    }

    /// Remove one entry, merging the text on either side of it.
    pub fn remove(&mut self, index: usize) -> Option<Content> {
        if index >= self.items.len() {
            return None;
        }
        let removed = self.items.remove(index);
        self.merge_at(index);
        Some(removed)
    }

    /// Remove a child reference. Returns whether it was present.
    pub fn remove_node(&mut self, id: ContextId) -> bool {
        match self.position_of(id) {
            Some(index) => {
                self.remove(index);
                true
            }
            None => false,
        }
    }

    /// Replace the entry at `index` with `entries`, coalescing text at both
    /// seams.
    pub fn splice(&mut self, index: usize, entries: impl IntoIterator<Item = Content>) {
        if index >= self.items.len() {
            for entry in entries {
                self.push(entry);
            }
            return;
        }

        let tail = self.items.split_off(index + 1);
        self.items.pop();
        for entry in entries {
            self.push(entry);
        }
        for entry in tail {
            self.push(entry);
        }
    }

    /// Remove and return the first entry.
    pub fn shift(&mut self) -> Option<Content> {
        if self.items.is_empty() {
            return None;
        }
        Some(self.items.remove(0))
    }

    /// Remove and return the last entry.
    pub fn pop(&mut self) -> Option<Content> {
        self.items.pop()
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }

    fn merge_at(&mut self, index: usize) {
        if index == 0 || index >= self.items.len() {
            return;
        }
        if !matches!(self.items[index - 1], Content::Text(_)) {
            return;
        }
        if let Content::Text(next) = &self.items[index] {
            let next = next.clone();
            self.items.remove(index);
            if let Content::Text(prev) = &mut self.items[index - 1] {
                prev.push_str(&next);
            }
        }
    }
}

impl<'a> IntoIterator for &'a ContentList {
    type Item = &'a Content;
    type IntoIter = std::slice::Iter<'a, Content>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

impl FromIterator<Content> for ContentList {
    fn from_iter<I: IntoIterator<Item = Content>>(iter: I) -> Self {
        let mut list = Self::new();
        for entry in iter {
            list.push(entry);
        }
        list
    }
}
