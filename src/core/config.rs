/// Generator configuration: resolution limits and per-block rules.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use thiserror::Error;

use crate::core::tables::table_key;
use crate::schema::dice::DiceSpec;

/// Deepest recursion the resolver will follow.
pub const MAX_DEPTH: usize = 50;
/// Rolls a composite-capable block may spend escaping its own name.
pub const REROLL_LIMIT: u32 = 10;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("RON deserialization error: {0}")]
    Ron(#[from] ron::error::SpannedError),
}

/// Behaviour attached to one block by name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockRule {
    /// Dice used when the block's outer level declares none. Takes
    /// precedence over notation seeded from the opening line.
    #[serde(default)]
    pub default_dice: Option<DiceSpec>,
    /// Wraps the block's text in `[marker]` / `[/marker]` lines.
    #[serde(default)]
    pub wrap_marker: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    pub max_depth: usize,
    pub default_dice: DiceSpec,
    pub reroll_limit: u32,
    /// Keyed by lowercased block name. A configured map replaces the
    /// built-in rules entirely.
    pub blocks: HashMap<String, BlockRule>,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        let blocks = HashMap::from([
            (
                "spell".to_string(),
                BlockRule {
                    default_dice: Some(DiceSpec::new(2, 12)),
                    wrap_marker: None,
                },
            ),
            (
                "hidden-treasure".to_string(),
                BlockRule {
                    default_dice: None,
                    wrap_marker: Some("Hidden-Treasure".to_string()),
                },
            ),
        ]);
        Self {
            max_depth: MAX_DEPTH,
            default_dice: DiceSpec::DEFAULT,
            reroll_limit: REROLL_LIMIT,
            blocks,
        }
    }
}

impl GeneratorConfig {
    pub fn load_from_ron(path: &Path) -> Result<GeneratorConfig, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse_ron(&contents)
    }

    pub fn parse_ron(input: &str) -> Result<GeneratorConfig, ConfigError> {
        let mut config: GeneratorConfig = ron::from_str(input)?;
        config.blocks = config
            .blocks
            .into_iter()
            .map(|(name, rule)| (table_key(&name), rule))
            .collect();
        Ok(config)
    }

    pub fn block_rule(&self, name: &str) -> Option<&BlockRule> {
        self.blocks.get(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_keep_legacy_rules() {
        let config = GeneratorConfig::default();
        assert_eq!(config.max_depth, 50);
        assert_eq!(config.reroll_limit, 10);
        assert_eq!(config.default_dice.to_string(), "1D12");
        assert_eq!(
            config.block_rule("spell").and_then(|r| r.default_dice),
            Some(DiceSpec::new(2, 12))
        );
        assert_eq!(
            config
                .block_rule("hidden-treasure")
                .and_then(|r| r.wrap_marker.as_deref()),
            Some("Hidden-Treasure")
        );
    }

    #[test]
    fn partial_ron_fills_defaults() {
        let config = GeneratorConfig::parse_ron("(max_depth: 12)").unwrap();
        assert_eq!(config.max_depth, 12);
        assert_eq!(config.reroll_limit, 10);
        assert!(config.block_rule("spell").is_some());
    }

    #[test]
    fn configured_blocks_replace_builtins() {
        let config = GeneratorConfig::parse_ron(
            r#"(
                default_dice: "1D20",
                blocks: {
                    "Vault": (wrap_marker: Some("Vault")),
                    "omen": (default_dice: Some("1d6")),
                },
            )"#,
        )
        .unwrap();
        assert_eq!(config.default_dice, DiceSpec::new(1, 20));
        assert!(config.block_rule("spell").is_none());
        assert_eq!(
            config.block_rule("vault").and_then(|r| r.wrap_marker.as_deref()),
            Some("Vault")
        );
        assert_eq!(
            config.block_rule("omen").and_then(|r| r.default_dice),
            Some(DiceSpec::new(1, 6))
        );
    }

    #[test]
    fn bad_dice_in_config_is_an_error() {
        assert!(GeneratorConfig::parse_ron("(default_dice: \"lots\")").is_err());
    }
}
