/// Dice registry: the notation each table or block name rolls with.

use rustc_hash::FxHashMap;

use crate::core::tables::table_key;
use crate::schema::dice::DiceSpec;

/// Bare tokens recognised on a block's opening line, in priority order.
const SEEDED_NOTATIONS: [&str; 3] = ["2D12", "1D12", "1D6"];

/// Maps table and block names to their declared dice.
///
/// Filled while blocks compile and only read while resolving.
#[derive(Debug, Clone, Default)]
pub struct DiceRegistry {
    notations: FxHashMap<String, DiceSpec>,
}

impl DiceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, name: &str, spec: DiceSpec) {
        self.notations.insert(table_key(name), spec);
    }

    pub fn get(&self, name: &str) -> Option<DiceSpec> {
        self.notations.get(&table_key(name)).copied()
    }

    /// Declared dice for `name`, or `fallback`.
    pub fn notation_for(&self, name: &str, fallback: DiceSpec) -> DiceSpec {
        self.get(name).unwrap_or(fallback)
    }

    /// Record the first of `2D12`, `1D12`, `1D6` that appears as a whole
    /// token of `line` (any case) as the notation for `name`. Returns the
    /// recorded notation.
    pub fn seed_from_line(&mut self, name: &str, line: &str) -> Option<DiceSpec> {
        let tokens: Vec<&str> = line
            .split(|c: char| c.is_whitespace() || c == '(' || c == ')')
            .filter(|t| !t.is_empty())
            .collect();
        let notation = SEEDED_NOTATIONS
            .iter()
            .find(|n| tokens.iter().any(|t| t.eq_ignore_ascii_case(n)))?;
        let spec: DiceSpec = notation.parse().ok()?;
        self.set(name, spec);
        Some(spec)
    }

    pub fn len(&self) -> usize {
        self.notations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.notations.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_is_case_insensitive() {
        let mut registry = DiceRegistry::new();
        registry.set("Spell", DiceSpec::new(2, 12));
        assert_eq!(registry.get("SPELL"), Some(DiceSpec::new(2, 12)));
        assert_eq!(registry.get("room"), None);
    }

    #[test]
    fn fallback_when_absent() {
        let registry = DiceRegistry::new();
        assert_eq!(registry.notation_for("room", DiceSpec::DEFAULT), DiceSpec::DEFAULT);
    }

    #[test]
    fn seeding_prefers_2d12_then_1d12_then_1d6() {
        let mut registry = DiceRegistry::new();
        assert_eq!(
            registry.seed_from_line("a", "( 1D6 then 2D12"),
            Some(DiceSpec::new(2, 12))
        );
        assert_eq!(registry.seed_from_line("b", "(1D12"), Some(DiceSpec::new(1, 12)));
        assert_eq!(registry.seed_from_line("c", "(  1D6"), Some(DiceSpec::new(1, 6)));
        assert_eq!(registry.seed_from_line("d", "( 3D8"), None);
        assert_eq!(registry.len(), 3);
    }

    #[test]
    fn seeding_matches_whole_tokens_in_any_case() {
        let mut registry = DiceRegistry::new();
        assert_eq!(registry.seed_from_line("a", "( 11D60"), None);
        assert_eq!(registry.seed_from_line("b", "( 1D6x"), None);
        assert_eq!(registry.seed_from_line("c", "(2d12"), Some(DiceSpec::new(2, 12)));
        assert_eq!(registry.seed_from_line("d", "( 1d6 1-3 Rats"), Some(DiceSpec::new(1, 6)));
        assert_eq!(registry.get("a"), None);
        assert_eq!(registry.len(), 2);
    }
}
