use serde::{Deserialize, Serialize};

/// Column headings of a bestiary row, in file order.
pub const STAT_COLUMNS: [&str; 12] = [
    "Monster",
    "WS",
    "BS",
    "S",
    "T",
    "Sp",
    "Br",
    "Int",
    "W",
    "DD",
    "PV",
    "Equipment",
];

/// A bestiary row. The first field is the monster's name; the rest are
/// stats as written in the source file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonsterRecord {
    pub fields: Vec<String>,
}

impl MonsterRecord {
    pub fn new(fields: Vec<String>) -> Self {
        Self { fields }
    }

    pub fn name(&self) -> &str {
        self.fields.first().map(|s| s.trim()).unwrap_or("")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn name_is_trimmed_first_field() {
        let record = MonsterRecord::new(vec![" Clanrat ".to_string(), "3".to_string()]);
        assert_eq!(record.name(), "Clanrat");
        assert_eq!(MonsterRecord::new(Vec::new()).name(), "");
    }
}
