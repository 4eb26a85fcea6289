/// The resolution engine: rolls on tables and blocks and recursively
/// expands whatever the rolled entries refer to.
///
/// Every soft failure (unknown name, cycle, depth ceiling, reroll
/// exhaustion) degrades to less output and a debug event, never an error.
/// The only error a resolution returns is an unknown start name.

use thiserror::Error;
use tracing::{debug, trace};

use crate::core::config::GeneratorConfig;
use crate::core::context::{Frame, ResolutionContext};
use crate::core::dice::{roll_spec, Roller};
use crate::core::entry::{call_name, inline_calls, Entry};
use crate::core::library::{StartPoint, TableLibrary};
use crate::core::tables::table_key;
use crate::schema::block::NamedBlock;
use crate::schema::dice::DiceSpec;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolveError {
    #[error("[Table '{name}' not found. Available: {}]", available.join(", "))]
    NotFound { name: String, available: Vec<String> },
}

/// Resolves start names against a compiled library.
///
/// Holds only shared references; each call builds its own
/// [`ResolutionContext`], so one resolver can serve many resolutions.
#[derive(Debug, Clone, Copy)]
pub struct Resolver<'a> {
    library: &'a TableLibrary,
    config: &'a GeneratorConfig,
}

fn push_nonempty(out: &mut Vec<String>, text: String) {
    if !text.is_empty() {
        out.push(text);
    }
}

impl<'a> Resolver<'a> {
    pub fn new(library: &'a TableLibrary, config: &'a GeneratorConfig) -> Self {
        Self { library, config }
    }

    pub fn library(&self) -> &'a TableLibrary {
        self.library
    }

    /// Resolve a start table or block into text.
    pub fn resolve<R: Roller + ?Sized>(&self, start: &str, rng: &mut R) -> Result<String, ResolveError> {
        let mut ctx = ResolutionContext::new();
        self.resolve_with(start, &mut ctx, rng)
    }

    /// Like [`Resolver::resolve`], leaving the diagnostics in `ctx`.
    pub fn resolve_with<R: Roller + ?Sized>(
        &self,
        start: &str,
        ctx: &mut ResolutionContext,
        rng: &mut R,
    ) -> Result<String, ResolveError> {
        match self.library.find_start(start) {
            Some(StartPoint::Table(name)) => {
                debug!(table = name, "resolving start table");
                Ok(self.resolve_table(name, ctx, Frame::root(), rng))
            }
            Some(StartPoint::Block(name)) => {
                debug!(block = name, "resolving start block");
                Ok(self.expand_reference(name, ctx, Frame::root(), rng))
            }
            None => {
                let mut available: Vec<String> = self
                    .library
                    .table_names()
                    .into_iter()
                    .map(str::to_string)
                    .collect();
                available.extend(self.library.block_names().into_iter().map(str::to_string));
                Err(ResolveError::NotFound {
                    name: start.to_string(),
                    available,
                })
            }
        }
    }

    /// Dice rolled against a table: its registry notation or the default.
    pub fn table_notation(&self, name: &str) -> DiceSpec {
        self.library
            .dice()
            .notation_for(&table_key(name), self.config.default_dice)
    }

    /// Dice rolled against a block's outer level: the level's own notation,
    /// then the block's configured rule, then the registry, then the default.
    pub fn block_notation(&self, block: &NamedBlock) -> DiceSpec {
        block
            .outer()
            .and_then(|level| level.dice)
            .or_else(|| self.config.block_rule(&block.name).and_then(|r| r.default_dice))
            .or_else(|| self.library.dice().get(&block.name))
            .unwrap_or(self.config.default_dice)
    }

    /// Roll on a table and expand the selected entry.
    pub fn resolve_table<R: Roller + ?Sized>(
        &self,
        name: &str,
        ctx: &mut ResolutionContext,
        frame: Frame<'_>,
        rng: &mut R,
    ) -> String {
        let key = table_key(name);
        if frame.depth > self.config.max_depth {
            debug!(table = %key, depth = frame.depth, "maximum recursion depth reached");
            ctx.record_depth_cutoff();
            return String::new();
        }
        ctx.reached(frame.depth);

        let Some(table) = self.library.table(&key) else {
            debug!(table = %key, "table not found");
            ctx.record_missing(&key);
            return String::new();
        };

        let spec = self.table_notation(&key);
        let roll = roll_spec(spec, rng);
        let Some(entry) = table.lookup(roll.total) else {
            debug!(table = %key, dice = %spec, roll = roll.total, "no entry for roll");
            return String::new();
        };
        debug!(
            table = %key,
            dice = %spec,
            roll = roll.total,
            rolls = ?roll.rolls,
            entry,
            depth = frame.depth,
            "rolled on table"
        );

        match Entry::parse(entry) {
            Entry::Literal(text) => text,
            Entry::NestedRefs(refs) => {
                let mut out = Vec::new();
                for table_ref in &refs {
                    push_nonempty(&mut out, self.resolve_table(table_ref, ctx, frame.deeper(), rng));
                }
                out.join("\n")
            }
            _ => self.process_and_resolve_text(entry, ctx, frame.with_current(&key), rng),
        }
    }

    /// Roll a block's outer level and return the raw selected text.
    ///
    /// The result is not expanded further; [`Resolver::process_and_resolve_text`]
    /// does that with the block as the current name.
    pub fn resolve_named_block<R: Roller + ?Sized>(
        &self,
        block: &NamedBlock,
        ctx: &mut ResolutionContext,
        rng: &mut R,
    ) -> String {
        let Some(outer) = block.outer() else {
            return String::new();
        };
        let name = block.name.as_str();
        let rule = self.config.block_rule(name);
        let spec = self.block_notation(block);

        // Any `&` counts, quoted or bracketed entries included.
        let composite_capable = outer.table.entries().iter().any(|e| e.content.contains('&'));

        // A composite-capable block that rolls its own bare name rerolls.
        let limit = self.config.reroll_limit.max(1);
        let mut attempts = 0;
        let mut chosen = None;
        while attempts < limit {
            let roll = roll_spec(spec, rng);
            chosen = outer.table.lookup(roll.total);
            trace!(block = name, dice = %spec, roll = roll.total, rolls = ?roll.rolls, entry = ?chosen, "rolled on block");
            match chosen {
                Some(entry) if composite_capable && entry.trim().to_lowercase() == name => {
                    attempts += 1;
                }
                _ => break,
            }
        }
        if attempts == limit {
            debug!(block = name, attempts, "block kept rolling its own name");
            ctx.record_exhausted(name);
        }

        let text = match chosen {
            None => String::new(),
            Some(entry) => match Entry::parse(entry) {
                Entry::Composite(parts) => self.compose(block, &parts, rng),
                _ => entry.to_string(),
            },
        };

        match rule.and_then(|r| r.wrap_marker.as_deref()) {
            Some(marker) => format!("[{marker}]\n{text}\n[/{marker}]"),
            None => text,
        }
    }

    /// Emit the parts of a composite entry, one per line. The block's own
    /// name is dropped; a part opening with `(` is replaced by a roll on the
    /// block's nested level when it has one.
    fn compose<R: Roller + ?Sized>(&self, block: &NamedBlock, parts: &[String], rng: &mut R) -> String {
        let mut out = Vec::new();
        for part in parts {
            if part.to_lowercase() == block.name {
                continue;
            }
            match block.nested() {
                Some(nested) if part.starts_with('(') => {
                    let spec = nested.dice.unwrap_or(self.config.default_dice);
                    let roll = roll_spec(spec, rng);
                    match nested.table.lookup(roll.total) {
                        Some(sub) => {
                            trace!(block = %block.name, roll = roll.total, entry = sub, "nested roll");
                            out.push(sub.to_string());
                        }
                        None => debug!(block = %block.name, roll = roll.total, "no nested entry for roll"),
                    }
                }
                _ => out.push(part.clone()),
            }
        }
        out.join("\n")
    }

    /// Expand text line by line, following calls and block names.
    pub fn process_and_resolve_text<R: Roller + ?Sized>(
        &self,
        text: &str,
        ctx: &mut ResolutionContext,
        frame: Frame<'_>,
        rng: &mut R,
    ) -> String {
        let mut out: Vec<String> = Vec::new();

        for line in text.lines() {
            if frame.depth > self.config.max_depth {
                debug!(depth = frame.depth, "maximum recursion depth reached");
                ctx.record_depth_cutoff();
                break;
            }
            ctx.reached(frame.depth);

            let line = line.trim();
            if line.is_empty() {
                continue;
            }

            if let Some(name) = call_name(line) {
                let key = table_key(name);
                if self.library.block(&key).is_some() {
                    debug!(block = %key, depth = frame.depth, "resolving call");
                    push_nonempty(&mut out, self.expand_block(&key, ctx, frame, rng));
                    continue;
                }
            }

            let lower = line.to_lowercase();
            if self.library.block(&lower).is_some() {
                if frame.current_named == Some(lower.as_str()) {
                    out.push(line.to_string());
                } else if ctx.is_active(&lower) {
                    debug!(block = %lower, depth = frame.depth, "cycle detected");
                    ctx.record_cycle(&lower);
                } else {
                    push_nonempty(&mut out, self.expand_reference(&lower, ctx, frame, rng));
                }
                continue;
            }

            match Entry::parse(line) {
                Entry::Literal(text) => push_nonempty(&mut out, text),
                _ => out.push(line.to_string()),
            }

            for call in inline_calls(line) {
                let key = table_key(call);
                if frame.current_named == Some(key.as_str()) || ctx.is_active(&key) {
                    continue;
                }
                ctx.push(&key);
                let expanded = if self.library.block(&key).is_some() {
                    self.expand_block(&key, ctx, frame, rng)
                } else {
                    self.resolve_table(&key, ctx, frame.deeper(), rng)
                };
                ctx.pop(&key);
                push_nonempty(&mut out, expanded);
            }
        }

        out.join("\n")
    }

    /// Roll a block and expand its text one level deeper.
    fn expand_block<R: Roller + ?Sized>(
        &self,
        key: &str,
        ctx: &mut ResolutionContext,
        frame: Frame<'_>,
        rng: &mut R,
    ) -> String {
        let Some(block) = self.library.block(key) else {
            ctx.record_missing(key);
            return String::new();
        };
        let raw = self.resolve_named_block(block, ctx, rng);
        self.process_and_resolve_text(&raw, ctx, frame.enter(&block.name), rng)
    }

    /// [`Resolver::expand_block`] with `key` marked active for the duration.
    fn expand_reference<R: Roller + ?Sized>(
        &self,
        key: &str,
        ctx: &mut ResolutionContext,
        frame: Frame<'_>,
        rng: &mut R,
    ) -> String {
        ctx.push(key);
        let out = self.expand_block(key, ctx, frame, rng);
        ctx.pop(key);
        out
    }
}
