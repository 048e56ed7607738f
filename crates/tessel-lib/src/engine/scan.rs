//! The scanning loop.
//!
//! One `Engine` drives one parse: it owns the tree being built, the stack of
//! open contexts, the match cache, and the hoist registry. The definitions it
//! reads are shared with the [`Parser`] and never mutated.

use std::collections::HashSet;
use std::sync::Arc;

use tessel_core::{SourceMap, Span};

use super::cache::MatchCache;
use super::trace::Tracer;
use crate::definition::{
    AbsorbRule, Confirm, ContentMap, HookContext, HookError, NodeDefinition, NodeId, Pattern,
    TokenDescriptor, TokenMatch, TokenMode,
};
use crate::error::{ParseError, ParseErrorKind};
use crate::hoist::HoistRegistry;
use crate::parser::{Parser, Slot};
use crate::pattern::{CompiledPattern, PatternTable, next_boundary};
use crate::tree::{Content, ContextId, NodeContext, ParseTree, Value};
use crate::{Error, Result};

/// A token the active context is searching for.
struct Candidate {
    /// Owner of the token: the child type for a start token, the active
    /// context's own type for its end token.
    def: Arc<NodeDefinition>,
    is_end: bool,
    pattern: Arc<CompiledPattern>,
}

impl Candidate {
    fn identity(&self, start: usize) -> (NodeId, bool, usize) {
        (self.def.id, self.is_end, start)
    }

    fn descriptor(&self) -> Option<&TokenDescriptor> {
        if self.is_end {
            self.def.end.as_ref()
        } else {
            self.def.start.as_ref()
        }
    }
}

pub(crate) struct Engine<'p, 's, 't, T: Tracer> {
    parser: &'p Parser,
    source: &'s str,
    map: SourceMap<'s>,
    tree: ParseTree,
    stack: Vec<ContextId>,
    cursor: usize,
    cache: MatchCache,
    dynamic: PatternTable,
    hoists: HoistRegistry,
    /// Remaining steps, when a limit is set.
    fuel: Option<u32>,
    /// Bumped on every push and pop.
    generation: u64,
    /// Candidates a confirm hook rejected, by owner type, end flag and start.
    /// Valid only while the cursor and the stack stay where they were.
    declined: HashSet<(NodeId, bool, usize)>,
    declined_at: (usize, u64),
    tracer: &'t mut T,
}

impl<'p, 's, 't, T: Tracer> Engine<'p, 's, 't, T> {
    pub(crate) fn new(
        parser: &'p Parser,
        root: Arc<NodeDefinition>,
        source: &'s str,
        tracer: &'t mut T,
    ) -> Self {
        let map = SourceMap::new(source);
        let mut tree = ParseTree::new(source);
        let start = map.position(0);
        tree.alloc(|id| NodeContext::new(root, id, 0, start, None));

        Self {
            parser,
            source,
            map,
            tree,
            stack: Vec::new(),
            cursor: 0,
            cache: MatchCache::new(),
            dynamic: PatternTable::new(),
            hoists: HoistRegistry::new(),
            fuel: parser.get_limits().get_exec_fuel(),
            generation: 0,
            declined: HashSet::new(),
            declined_at: (0, 0),
            tracer,
        }
    }

    pub(crate) fn run(mut self) -> Result<ParseTree> {
        self.stack.push(ContextId::ROOT);
        self.hoists.register(self.tree.context(ContextId::ROOT));

        while self.cursor < self.source.len() {
            self.burn_fuel()?;
            self.step()?;
        }

        self.close_at_eof()?;
        self.finalize(ContextId::ROOT)?;
        Ok(self.tree)
    }

    fn active(&self) -> ContextId {
        self.stack.last().copied().unwrap_or(ContextId::ROOT)
    }

    fn burn_fuel(&mut self) -> Result<()> {
        let Some(fuel) = self.fuel.as_mut() else {
            return Ok(());
        };
        if *fuel == 0 {
            let limit = self.parser.get_limits().get_exec_fuel().unwrap_or(0);
            return Err(Error::ExecFuelExhausted(limit));
        }
        *fuel -= 1;
        Ok(())
    }

    /// Forget rejections once the cursor or the stack has changed.
    fn sync_declined(&mut self) {
        let at = (self.cursor, self.generation);
        if self.declined_at != at {
            self.declined_at = at;
            self.declined.clear();
        }
    }

    /// Next occurrence of a candidate's token, skipping occurrences this
    /// candidate already rejected. Other candidates sharing the pattern still
    /// see them.
    fn next_match(&mut self, cand: &Candidate) -> Option<TokenMatch> {
        let mut found = self
            .cache
            .next_match(&cand.pattern, self.source, self.cursor);
        loop {
            let m = found?;
            if !self.declined.contains(&cand.identity(m.range.start)) {
                return Some(m);
            }
            let from = next_boundary(self.source, m.range.start);
            found = cand.pattern.find_at(self.source, from);
        }
    }

    fn step(&mut self) -> Result<()> {
        let active = self.active();
        self.sync_declined();
        self.tracer
            .trace_step(self.map.position(self.cursor), self.tree.context(active));

        let candidates = self.candidates(active)?;

        // Earliest start wins; on a tie the earlier candidate keeps its place.
        let mut best: Option<(usize, TokenMatch)> = None;
        for (i, cand) in candidates.iter().enumerate() {
            let found = self.next_match(cand);
            self.tracer.trace_candidate(
                self.tree.context(active),
                cand.pattern.key().source(),
                (!cand.is_end).then_some(&*cand.def),
                found.as_ref(),
            );
            let Some(m) = found else {
                continue;
            };
            if best
                .as_ref()
                .is_some_and(|(_, b)| b.range.start <= m.range.start)
            {
                continue;
            }
            let at_cursor = m.range.start == self.cursor;
            best = Some((i, m));
            if at_cursor {
                break;
            }
        }

        let Some((i, m)) = best else {
            return self.flush(active, self.source.len());
        };

        if m.range.start > self.cursor {
            self.flush(active, m.range.start)?;
            // An append hook moved the cursor; the match may be stale.
            if self.cursor != m.range.start {
                return Ok(());
            }
        }

        let cand = &candidates[i];
        if cand.is_end {
            self.close(active, cand, m)?;
        } else {
            self.open(active, cand, m)?;
        }
        Ok(())
    }

    /// End token of the active context (never for the root), then the start
    /// token of every recognized child type in declaration order.
    fn candidates(&mut self, active: ContextId) -> Result<Vec<Candidate>> {
        let def = Arc::clone(&self.tree.context(active).def);
        let mut out = Vec::with_capacity(def.recognizes.len() + 1);

        if active != ContextId::ROOT
            && let Some(end) = &def.end
        {
            let pattern = self.resolve(&def, Slot::End, end, active)?;
            out.push(Candidate {
                def: Arc::clone(&def),
                is_end: true,
                pattern,
            });
        }

        for &child in &def.recognizes {
            if !self.tree.context(active).accepts_child(child) {
                continue;
            }
            let Some(child_def) = self.parser.definition(child) else {
                return Err(self.error_here(
                    ParseErrorKind::UnknownNode,
                    format!("\"{def}\" recognizes node id {child}, which is not registered"),
                ));
            };
            let child_def = Arc::clone(child_def);
            let Some(start) = &child_def.start else {
                continue;
            };
            let pattern = self.resolve(&child_def, Slot::Start, start, active)?;
            out.push(Candidate {
                def: Arc::clone(&child_def),
                is_end: false,
                pattern,
            });
        }

        Ok(out)
    }

    /// Compiled pattern for a token; dynamic patterns are evaluated against
    /// the live context's data.
    fn resolve(
        &mut self,
        def: &NodeDefinition,
        slot: Slot,
        token: &TokenDescriptor,
        live: ContextId,
    ) -> Result<Arc<CompiledPattern>> {
        if let Pattern::Dynamic(produce) = &token.pattern {
            let produced = produce(self.tree.context(live).data());
            return self.dynamic.intern(&produced, token.escape_aware);
        }
        match self.parser.compiled(def.id, slot) {
            Some(pattern) => Ok(Arc::clone(pattern)),
            None => self.dynamic.intern(&token.pattern, token.escape_aware),
        }
    }

    fn open(&mut self, parent: ContextId, cand: &Candidate, m: TokenMatch) -> Result<bool> {
        let Some(desc) = cand.descriptor() else {
            return Ok(false);
        };
        let Some(mode) = self.confirm(parent, desc, &m)? else {
            self.decline(parent, cand, &m);
            return Ok(false);
        };

        let mut start = self.map.position(m.range.start);
        let mut initial = None;
        match mode {
            TokenMode::Omit => {}
            TokenMode::Default => initial = Some(m.text.clone()),
            TokenMode::Eject => {
                // The token stays in the parent; the child starts after it.
                self.store_text(parent, &m.text);
                start = self.map.position(m.range.end);
            }
        }
        // A confirm hook may already have advanced past the token.
        self.cursor = self.cursor.max(m.range.end);

        if let Some(limit) = self.parser.get_limits().get_recursion_limit()
            && self.stack.len() >= limit as usize
        {
            return Err(Error::RecursionLimitExceeded(limit));
        }

        let def = Arc::clone(&cand.def);
        let level = self.stack.len() as u32;
        let id = self
            .tree
            .alloc(|id| NodeContext::new(Arc::clone(&def), id, level, start, Some(parent)));
        {
            let end = self.map.position(self.cursor);
            let ctx = self.tree.context_mut(id);
            if let Some(text) = initial {
                ctx.content.push_text(&text);
            }
            for (name, value) in &m.captures {
                ctx.data.set(name.as_str(), value.as_str());
            }
            ctx.end = end;
        }

        let parent_def = Arc::clone(&self.tree.context(parent).def);
        if let Some(hook) = parent_def.hooks.on_before_child_parse.clone() {
            self.run_hook(parent, |cx| hook(cx, id))?;
        }

        self.tree.context_mut(parent).content.push_node(id);
        self.stack.push(id);
        self.generation += 1;
        self.hoists.register(self.tree.context(id));
        self.tracer.trace_push(self.tree.context(id));

        if let Some(hook) = def.hooks.on_match_start.clone() {
            self.run_hook(id, |cx| hook(cx, &m))?;
        }
        Ok(true)
    }

    fn close(&mut self, active: ContextId, cand: &Candidate, m: TokenMatch) -> Result<bool> {
        let Some(desc) = cand.descriptor() else {
            return Ok(false);
        };
        let Some(mode) = self.confirm(active, desc, &m)? else {
            self.decline(active, cand, &m);
            return Ok(false);
        };

        match mode {
            TokenMode::Default => {
                self.store_text(active, &m.text);
                self.cursor = self.cursor.max(m.range.end);
            }
            TokenMode::Omit => self.cursor = self.cursor.max(m.range.end),
            TokenMode::Eject => {}
        }

        {
            let ctx = self.tree.context_mut(active);
            for (name, value) in &m.captures {
                ctx.data.set(name.as_str(), value.as_str());
            }
        }

        if let Some(hook) = cand.def.hooks.on_match_end.clone() {
            self.run_hook(active, |cx| hook(cx, &m))?;
        }

        self.pop()?;
        Ok(true)
    }

    fn confirm(
        &mut self,
        active: ContextId,
        desc: &TokenDescriptor,
        m: &TokenMatch,
    ) -> Result<Option<TokenMode>> {
        let Some(hook) = desc.confirm.clone() else {
            return Ok(Some(desc.mode));
        };
        let verdict = self.run_hook(active, |cx| hook(cx, m))?;
        Ok(match verdict {
            Confirm::Reject => None,
            Confirm::Accept => Some(desc.mode),
            Confirm::AcceptAs(mode) => Some(mode),
        })
    }

    fn decline(&mut self, active: ContextId, cand: &Candidate, m: &TokenMatch) {
        self.sync_declined();
        self.declined.insert(cand.identity(m.range.start));
        self.tracer
            .trace_decline(self.tree.context(active), cand.pattern.key().source(), m);
    }

    /// Close the active context, then every ancestor that pops after the
    /// type that just closed. The root is never popped here.
    fn pop(&mut self) -> Result<()> {
        loop {
            if self.stack.len() <= 1 {
                return Ok(());
            }
            let Some(child) = self.stack.pop() else {
                return Ok(());
            };
            let parent = self.active();
            self.generation += 1;

            self.finalize(child)?;
            self.tracer.trace_pop(self.tree.context(child));

            let parent_def = Arc::clone(&self.tree.context(parent).def);
            if let Some(hook) = parent_def.hooks.on_after_child_parse.clone() {
                self.run_hook(parent, |cx| hook(cx, child))?;
            }
            self.absorb(parent, child);

            let closed = self.tree.context(child).node_id();
            if self.stack.len() <= 1 || !parent_def.pops_after_child(closed) {
                return Ok(());
            }
        }
    }

    /// Deregister hoists, deliver this context to live hoists for its type,
    /// apply content mappings, run `on_pop`.
    fn finalize(&mut self, id: ContextId) -> Result<()> {
        let def = Arc::clone(&self.tree.context(id).def);
        self.hoists.deregister(self.tree.context(id));
        self.touch(id);

        let lifted = self.hoists.lift(&mut self.tree, id)?;
        for l in &lifted {
            self.tracer.trace_hoist(
                self.tree.context(id),
                self.tree.context(l.owner),
                &l.field,
            );
        }

        self.map_content(id, &def);

        if let Some(hook) = def.hooks.on_pop.clone() {
            self.run_hook(id, |cx| hook(cx))?;
        }
        self.tree.context_mut(id).finalized = true;
        Ok(())
    }

    fn map_content(&mut self, id: ContextId, def: &NodeDefinition) {
        for (field, map) in &def.mappings {
            let value = match map {
                ContentMap::First => self.tree.context(id).content.first().cloned().map(Value::from),
                ContentMap::Last => self.tree.context(id).content.last().cloned().map(Value::from),
                ContentMap::Shift => self.tree.context_mut(id).content.shift().map(Value::from),
                ContentMap::Pop => self.tree.context_mut(id).content.pop().map(Value::from),
                ContentMap::Join => Some(Value::String(self.tree.text_of(id))),
                ContentMap::JoinClear => {
                    let text = self.tree.text_of(id);
                    self.tree.context_mut(id).content.clear();
                    Some(Value::String(text))
                }
                ContentMap::Custom(f) => {
                    let mut content = std::mem::take(&mut self.tree.context_mut(id).content);
                    let value = f(&mut content);
                    self.tree.context_mut(id).content = content;
                    value
                }
            };
            if let Some(value) = value {
                self.tree.context_mut(id).data.set(field.as_str(), value);
            }
        }
    }

    /// Fold a finished child into its parent if the parent has a rule for
    /// the child's type and still holds the child.
    fn absorb(&mut self, parent: ContextId, child: ContextId) {
        let closed = self.tree.context(child).node_id();
        let Some(rule) = self.tree.context(parent).def.absorb_rule(closed).cloned() else {
            return;
        };
        let Some(index) = self.tree.context(parent).content.position_of(child) else {
            return;
        };

        match rule {
            AbsorbRule::Append => {
                let entries: Vec<Content> =
                    self.tree.context(child).content.iter().cloned().collect();
                for grandchild in entries.iter().filter_map(Content::as_node) {
                    self.tree.context_mut(grandchild).parent = Some(parent);
                }
                self.tree.context_mut(parent).content.splice(index, entries);
            }
            AbsorbRule::Join => {
                let text = self.tree.text_of(child);
                self.tree
                    .context_mut(parent)
                    .content
                    .splice(index, [Content::Text(text)]);
            }
            AbsorbRule::CopyTo(field) => {
                let entries: Vec<Value> = self
                    .tree
                    .context(child)
                    .content
                    .iter()
                    .cloned()
                    .map(Value::from)
                    .collect();
                let ctx = self.tree.context_mut(parent);
                ctx.content.remove(index);
                ctx.data.set(field, Value::Array(entries));
            }
            AbsorbRule::JoinTo(field) => {
                let text = self.tree.text_of(child);
                let ctx = self.tree.context_mut(parent);
                ctx.content.remove(index);
                ctx.data.set(field, text);
            }
        }
    }

    fn close_at_eof(&mut self) -> Result<()> {
        while self.stack.len() > 1 {
            self.burn_fuel()?;
            self.sync_declined();
            let active = self.active();
            let def = Arc::clone(&self.tree.context(active).def);

            // A zero-width end token such as `$` closes normally.
            if let Some(end) = &def.end {
                let pattern = self.resolve(&def, Slot::End, end, active)?;
                let cand = Candidate {
                    def: Arc::clone(&def),
                    is_end: true,
                    pattern,
                };
                if let Some(m) = self.next_match(&cand)
                    && m.range.is_empty()
                    && m.range.start == self.cursor
                    && self.close(active, &cand, m)?
                {
                    continue;
                }
            }

            if def.closes_at_eof {
                self.tracer.trace_eof(self.tree.context(active));
                self.pop()?;
                continue;
            }

            let ctx = self.tree.context(active);
            let span = Span::new(ctx.start(), self.map.position(self.cursor));
            let err = ParseError::new(
                ParseErrorKind::UnexpectedEof,
                format!(
                    "unexpected end of input while parsing \"{}\" ({})",
                    ctx.definition(),
                    ctx.id()
                ),
                span,
            )
            .block();
            return Err(err.into());
        }
        Ok(())
    }

    /// Move the cursor to `end`, storing the skipped source text in `id`.
    fn flush(&mut self, id: ContextId, end: usize) -> Result<()> {
        let source = self.source;
        let start = self.cursor;
        self.cursor = end;
        self.append_text(id, &source[start..end], start)
    }

    /// Guarded append of flushed source text: strip `skip` matches, reject
    /// `bad`, require `good`, then let `on_append_content` rewrite or drop.
    fn append_text(&mut self, id: ContextId, text: &str, origin: usize) -> Result<()> {
        let def = Arc::clone(&self.tree.context(id).def);

        let kept = match self.parser.compiled(def.id, Slot::Skip) {
            Some(skip) => skip.kept_ranges(text),
            None => vec![0..text.len()],
        };
        let stripped: String = kept.iter().map(|r| &text[r.clone()]).collect();
        if stripped.is_empty() {
            self.touch(id);
            return Ok(());
        }

        if let Some(bad) = self.parser.compiled(def.id, Slot::Bad)
            && let Some(hit) = bad.find(&stripped)
        {
            let start = origin + source_offset(&kept, hit.start);
            let end = origin + source_offset(&kept, hit.end);
            return Err(ParseError::new(
                ParseErrorKind::BadToken,
                format!(
                    "the token {:?} is not allowed in \"{}\"",
                    &stripped[hit],
                    def
                ),
                self.map.span(start, end),
            )
            .into());
        }

        if let Some(good) = self.parser.compiled(def.id, Slot::Good)
            && !good.is_match(&stripped)
        {
            return Err(ParseError::new(
                ParseErrorKind::GoodTokenMissing,
                format!(
                    "the text {:?} contains no token allowed in \"{}\"",
                    stripped, def
                ),
                self.map.span(origin, origin + text.len()),
            )
            .into());
        }

        let stored = match def.hooks.on_append_content.clone() {
            Some(hook) => self.run_hook(id, |cx| hook(cx, stripped))?,
            None => Some(stripped),
        };
        if let Some(text) = stored {
            self.store_text(id, &text);
        }
        self.touch(id);
        Ok(())
    }

    /// Unguarded append, used for delimiter text.
    fn store_text(&mut self, id: ContextId, text: &str) {
        if text.is_empty() {
            return;
        }
        self.tree.context_mut(id).content.push_text(text);
        self.tracer.trace_text(self.tree.context(id), text);
    }

    fn touch(&mut self, id: ContextId) {
        let end = self.map.position(self.cursor);
        self.tree.context_mut(id).end = end;
    }

    fn run_hook<R>(
        &mut self,
        id: ContextId,
        f: impl FnOnce(&mut HookContext<'_>) -> std::result::Result<R, HookError>,
    ) -> Result<R> {
        let result = {
            let mut cx = HookContext::new(&mut self.tree, &self.map, &mut self.cursor, id);
            f(&mut cx)
        };
        result.map_err(|err| {
            let at = Span::point(self.map.position(self.cursor));
            Error::Parse(ParseError::from_hook(err, at))
        })
    }

    fn error_here(&self, kind: ParseErrorKind, message: String) -> Error {
        let at = Span::point(self.map.position(self.cursor));
        Error::Parse(ParseError::new(kind, message, at))
    }
}

/// Map an offset in skip-stripped text back to an offset in the original.
fn source_offset(kept: &[std::ops::Range<usize>], offset: usize) -> usize {
    let mut seen = 0;
    for range in kept {
        if offset < seen + range.len() {
            return range.start + (offset - seen);
        }
        seen += range.len();
    }
    kept.last().map_or(0, |r| r.end)
}
