use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid dice notation '{0}': expected <count>D<sides>")]
pub struct InvalidNotation(pub String);

/// A parsed `NdM` dice notation: `count` dice with `sides` faces each.
///
/// Serialized as its notation string (`"2D12"`), so config files can
/// write dice the same way table sources do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct DiceSpec {
    pub count: u32,
    pub sides: u32,
}

impl DiceSpec {
    /// The die rolled when no notation is declared or the notation is malformed.
    pub const DEFAULT: DiceSpec = DiceSpec {
        count: 1,
        sides: 12,
    };

    pub const fn new(count: u32, sides: u32) -> Self {
        Self { count, sides }
    }

    /// Parse `notation`, falling back to [`DiceSpec::DEFAULT`].
    pub fn parse_or_default(notation: &str) -> DiceSpec {
        notation.parse().unwrap_or(Self::DEFAULT)
    }

    /// Whether `token` is exactly a dice notation (`^\d+[dD]\d+$`).
    pub fn is_notation(token: &str) -> bool {
        split_notation(token).is_some()
    }

    /// Smallest possible total.
    pub fn min_total(&self) -> u32 {
        self.count
    }

    /// Largest possible total.
    pub fn max_total(&self) -> u32 {
        self.count.saturating_mul(self.sides)
    }
}

impl Default for DiceSpec {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Split `<digits>[dD]<digits>` into its two digit runs.
fn split_notation(token: &str) -> Option<(&str, &str)> {
    let d = token.find(['d', 'D'])?;
    let (count, sides) = (&token[..d], &token[d + 1..]);
    let all_digits = |s: &str| !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit());
    if all_digits(count) && all_digits(sides) {
        Some((count, sides))
    } else {
        None
    }
}

impl FromStr for DiceSpec {
    type Err = InvalidNotation;

    /// Zero dice or zero-sided dice cannot be rolled and are rejected,
    /// as are counts that overflow `u32`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || InvalidNotation(s.to_string());
        let (count, sides) = split_notation(s).ok_or_else(invalid)?;
        let count: u32 = count.parse().map_err(|_| invalid())?;
        let sides: u32 = sides.parse().map_err(|_| invalid())?;
        if count == 0 || sides == 0 {
            return Err(invalid());
        }
        Ok(DiceSpec { count, sides })
    }
}

impl TryFrom<String> for DiceSpec {
    type Error = InvalidNotation;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<DiceSpec> for String {
    fn from(spec: DiceSpec) -> Self {
        spec.to_string()
    }
}

impl fmt::Display for DiceSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}D{}", self.count, self.sides)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_upper_and_lower_case() {
        assert_eq!("2D12".parse::<DiceSpec>().unwrap(), DiceSpec::new(2, 12));
        assert_eq!("3d6".parse::<DiceSpec>().unwrap(), DiceSpec::new(3, 6));
    }

    #[test]
    fn rejects_malformed_notation() {
        for bad in ["", "D6", "2D", "2x6", " 1D6", "1D6 ", "1D6+1", "d", "0D6", "2D0"] {
            assert!(bad.parse::<DiceSpec>().is_err(), "accepted {bad:?}");
        }
    }

    #[test]
    fn malformed_falls_back_to_default() {
        assert_eq!(DiceSpec::parse_or_default("lots"), DiceSpec::DEFAULT);
        assert_eq!(DiceSpec::DEFAULT.to_string(), "1D12");
    }

    #[test]
    fn overflowing_count_is_invalid() {
        assert!("99999999999D6".parse::<DiceSpec>().is_err());
    }

    #[test]
    fn totals() {
        let spec = DiceSpec::new(2, 12);
        assert_eq!(spec.min_total(), 2);
        assert_eq!(spec.max_total(), 24);
    }

    #[test]
    fn is_notation_ignores_value_range() {
        assert!(DiceSpec::is_notation("0D6"));
        assert!(!DiceSpec::is_notation("1-6"));
    }

    #[test]
    fn ron_uses_notation_string() {
        let text = ron::to_string(&DiceSpec::new(1, 6)).unwrap();
        assert_eq!(text, "\"1D6\"");
        let back: DiceSpec = ron::from_str("\"2d12\"").unwrap();
        assert_eq!(back, DiceSpec::new(2, 12));
        assert!(ron::from_str::<DiceSpec>("\"twelve\"").is_err());
    }
}
