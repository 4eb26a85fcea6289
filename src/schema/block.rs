use serde::{Deserialize, Serialize};

use crate::schema::dice::DiceSpec;
use crate::schema::table::RangeTable;

/// One parenthesized level of a named block.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelTable {
    /// Notation declared as the first token of the level, if any.
    pub dice: Option<DiceSpec>,
    pub table: RangeTable,
}

/// A compiled named block.
///
/// `levels` are stored in the order their closing parenthesis was read,
/// so an inner sub-table closes (and is stored) before the table that
/// encloses it. Resolution rolls on `levels[0]` and takes composite
/// sub-rolls from `levels[1]`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NamedBlock {
    pub name: String,
    pub levels: Vec<LevelTable>,
}

impl NamedBlock {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            levels: Vec::new(),
        }
    }

    pub fn outer(&self) -> Option<&LevelTable> {
        self.levels.first()
    }

    pub fn nested(&self) -> Option<&LevelTable> {
        self.levels.get(1)
    }
}
