/// Resolution context: cycle tracking and diagnostics for one top-level call.

use rustc_hash::FxHashSet;

/// Where a recursive call sits: its depth and the block being expanded.
///
/// Passed by value down the call chain.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Frame<'a> {
    pub depth: usize,
    /// The block whose text is being expanded, lowercased. A line naming
    /// it is printed instead of expanded again.
    pub current_named: Option<&'a str>,
}

impl<'a> Frame<'a> {
    pub fn root() -> Self {
        Self::default()
    }

    /// One level deeper, expanding `name`.
    pub fn enter(self, name: &'a str) -> Self {
        Self {
            depth: self.depth + 1,
            current_named: Some(name),
        }
    }

    /// One level deeper, keeping the current block.
    pub fn deeper(self) -> Self {
        Self {
            depth: self.depth + 1,
            ..self
        }
    }

    pub fn with_current(self, name: &'a str) -> Self {
        Self {
            current_named: Some(name),
            ..self
        }
    }
}

/// Names currently being expanded, plus a record of every soft failure
/// met during one top-level resolution.
#[derive(Debug, Clone, Default)]
pub struct ResolutionContext {
    active: FxHashSet<String>,
    deepest: usize,
    cycles: Vec<String>,
    missing: Vec<String>,
    depth_cutoffs: usize,
    exhausted_rerolls: Vec<String>,
}

impl ResolutionContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_active(&self, name: &str) -> bool {
        self.active.contains(name)
    }

    /// Mark `name` as being expanded. Returns false if it already was.
    pub fn push(&mut self, name: &str) -> bool {
        self.active.insert(name.to_string())
    }

    pub fn pop(&mut self, name: &str) {
        self.active.remove(name);
    }

    pub(crate) fn reached(&mut self, depth: usize) {
        self.deepest = self.deepest.max(depth);
    }

    pub(crate) fn record_cycle(&mut self, name: &str) {
        self.cycles.push(name.to_string());
    }

    pub(crate) fn record_missing(&mut self, name: &str) {
        self.missing.push(name.to_string());
    }

    pub(crate) fn record_depth_cutoff(&mut self) {
        self.depth_cutoffs += 1;
    }

    pub(crate) fn record_exhausted(&mut self, block: &str) {
        self.exhausted_rerolls.push(block.to_string());
    }

    /// Greatest depth any call reached.
    pub fn deepest(&self) -> usize {
        self.deepest
    }

    /// Names skipped because they were already being expanded.
    pub fn cycles(&self) -> &[String] {
        &self.cycles
    }

    /// Table or block names that were referenced but not defined.
    pub fn missing(&self) -> &[String] {
        &self.missing
    }

    /// Branches abandoned at the depth ceiling.
    pub fn depth_cutoffs(&self) -> usize {
        self.depth_cutoffs
    }

    /// Blocks that kept rolling themselves until the reroll limit.
    pub fn exhausted_rerolls(&self) -> &[String] {
        &self.exhausted_rerolls
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn push_pop_tracks_active_names() {
        let mut ctx = ResolutionContext::new();
        assert!(ctx.push("room"));
        assert!(!ctx.push("room"));
        assert!(ctx.is_active("room"));
        ctx.pop("room");
        assert!(!ctx.is_active("room"));
    }

    #[test]
    fn frames_descend_by_value() {
        let root = Frame::root();
        let child = root.enter("treasure");
        assert_eq!(root.depth, 0);
        assert_eq!(child.depth, 1);
        assert_eq!(child.current_named, Some("treasure"));
        assert_eq!(child.deeper().depth, 2);
        assert_eq!(child.deeper().current_named, Some("treasure"));
        assert_eq!(root.with_current("room").depth, 0);
    }

    #[test]
    fn deepest_is_a_high_water_mark() {
        let mut ctx = ResolutionContext::new();
        ctx.reached(3);
        ctx.reached(1);
        assert_eq!(ctx.deepest(), 3);
    }
}
