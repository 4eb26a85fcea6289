use serde::{Deserialize, Serialize};

/// One declared range of a table and the text it selects.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableEntry {
    pub start: u32,
    pub end: u32,
    pub content: String,
}

impl TableEntry {
    pub fn contains(&self, roll: u32) -> bool {
        (self.start..=self.end).contains(&roll)
    }
}

/// An ordered roll → content mapping.
///
/// Ranges are kept as declared, in declaration order; a roll selects the
/// first range containing it, so where ranges overlap the earlier one wins.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RangeTable {
    entries: Vec<TableEntry>,
}

impl RangeTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append the range `start..=end`. An inverted range adds nothing.
    pub fn push_range(&mut self, start: u32, end: u32, content: &str) {
        if start > end {
            return;
        }
        self.entries.push(TableEntry {
            start,
            end,
            content: content.to_string(),
        });
    }

    /// First-declared content for `roll`.
    pub fn lookup(&self, roll: u32) -> Option<&str> {
        self.entries
            .iter()
            .find(|e| e.contains(roll))
            .map(|e| e.content.as_str())
    }

    pub fn entries(&self) -> &[TableEntry] {
        &self.entries
    }

    /// Number of declared ranges.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Distinct contents in first-seen order.
    pub fn contents(&self) -> Vec<&str> {
        let mut seen: Vec<&str> = Vec::new();
        for entry in &self.entries {
            if !seen.contains(&entry.content.as_str()) {
                seen.push(&entry.content);
            }
        }
        seen
    }

    /// Inclusive spans of rolls claimed by more than one range, ascending.
    /// Every range after the first for such a roll can never be selected.
    pub fn shadowed_rolls(&self) -> Vec<(u32, u32)> {
        let mut spans = Vec::new();
        for (i, later) in self.entries.iter().enumerate() {
            for earlier in &self.entries[..i] {
                let lo = later.start.max(earlier.start);
                let hi = later.end.min(earlier.end);
                if lo <= hi {
                    spans.push((lo, hi));
                }
            }
        }
        merge_spans(spans)
    }

    /// Inclusive spans of rolls in `min..=max` that select nothing.
    pub fn uncovered_rolls(&self, min: u32, max: u32) -> Vec<(u32, u32)> {
        if min > max {
            return Vec::new();
        }
        let covered = merge_spans(
            self.entries
                .iter()
                .map(|e| (e.start.max(min), e.end.min(max)))
                .filter(|(lo, hi)| lo <= hi)
                .collect(),
        );

        let mut gaps = Vec::new();
        let mut next = u64::from(min);
        for (lo, hi) in covered {
            if u64::from(lo) > next {
                gaps.push((next as u32, lo - 1));
            }
            next = next.max(u64::from(hi) + 1);
        }
        if next <= u64::from(max) {
            gaps.push((next as u32, max));
        }
        gaps
    }
}

/// Sort spans and join the ones that overlap or touch.
fn merge_spans(mut spans: Vec<(u32, u32)>) -> Vec<(u32, u32)> {
    spans.sort_unstable();
    let mut merged: Vec<(u32, u32)> = Vec::with_capacity(spans.len());
    for (lo, hi) in spans {
        match merged.last_mut() {
            Some(last) if u64::from(lo) <= u64::from(last.1) + 1 => last.1 = last.1.max(hi),
            _ => merged.push((lo, hi)),
        }
    }
    merged
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn push_range_is_inclusive() {
        let mut table = RangeTable::new();
        table.push_range(2, 4, "Bats");
        assert_eq!(table.len(), 1);
        assert_eq!(table.lookup(1), None);
        assert_eq!(table.lookup(2), Some("Bats"));
        assert_eq!(table.lookup(4), Some("Bats"));
        assert_eq!(table.lookup(5), None);
    }

    #[test]
    fn inverted_range_is_empty() {
        let mut table = RangeTable::new();
        table.push_range(6, 2, "Nothing");
        assert!(table.is_empty());
    }

    #[test]
    fn huge_range_is_one_entry() {
        let mut table = RangeTable::new();
        table.push_range(1, 4_000_000_000, "Endless corridor");
        assert_eq!(table.len(), 1);
        assert_eq!(table.lookup(3_999_999_999), Some("Endless corridor"));
        assert!(table.uncovered_rolls(1, 12).is_empty());
    }

    #[test]
    fn earliest_declaration_wins() {
        let mut table = RangeTable::new();
        table.push_range(1, 5, "A");
        table.push_range(3, 8, "B");
        assert_eq!(table.lookup(4), Some("A"));
        assert_eq!(table.lookup(6), Some("B"));
        assert_eq!(table.shadowed_rolls(), vec![(3, 5)]);
    }

    #[test]
    fn shadowed_spans_merge() {
        let mut table = RangeTable::new();
        table.push_range(1, 4, "A");
        table.push_range(3, 6, "B");
        table.push_range(5, 9, "C");
        table.push_range(12, 12, "D");
        table.push_range(12, 12, "E");
        assert_eq!(table.shadowed_rolls(), vec![(3, 6), (12, 12)]);
    }

    #[test]
    fn contents_are_distinct() {
        let mut table = RangeTable::new();
        table.push_range(1, 3, "Goblin camp");
        table.push_range(4, 4, "Empty cave");
        table.push_range(5, 6, "Goblin camp");
        assert_eq!(table.contents(), vec!["Goblin camp", "Empty cave"]);
    }

    #[test]
    fn uncovered_rolls_against_dice_range() {
        let mut table = RangeTable::new();
        table.push_range(1, 10, "Corridor");
        assert_eq!(table.uncovered_rolls(1, 12), vec![(11, 12)]);

        let mut table = RangeTable::new();
        table.push_range(3, 4, "Door");
        table.push_range(7, 8, "Stair");
        assert_eq!(table.uncovered_rolls(2, 12), vec![(2, 2), (5, 6), (9, 12)]);
        assert_eq!(table.uncovered_rolls(u32::MAX, u32::MAX), vec![(u32::MAX, u32::MAX)]);
    }
}
