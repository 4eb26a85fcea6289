/// Named-block compilation: balanced-parenthesis block sources into
/// multi-level [`NamedBlock`]s.
///
/// A block source looks like:
///
/// ```text
/// Treasure
/// (
/// 1D6
/// 1-4 gold & (gems)
/// 5-6 "A rusted key"
/// )
/// ```

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, trace, warn};

use crate::core::registry::DiceRegistry;
use crate::core::tables::{is_blank_or_comment, parse_inline_table, table_key};
use crate::schema::block::{LevelTable, NamedBlock};
use crate::schema::dice::DiceSpec;

#[derive(Debug, Error)]
pub enum BlockError {
    #[error("cannot read block source '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Whether a trimmed line can name a block (`^[A-Za-z_][A-Za-z0-9_-]*$`).
pub fn is_block_name(line: &str) -> bool {
    let mut chars = line.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
}

fn paren_balance(line: &str) -> i64 {
    line.chars().fold(0, |acc, c| match c {
        '(' => acc + 1,
        ')' => acc - 1,
        _ => acc,
    })
}

/// Collect raw block definitions from source texts, keyed by lowercased
/// name. A block found in a later source replaces an earlier one.
///
/// Each raw block holds its name line, its opening line, and every line up
/// to the one that brings the parenthesis balance back to zero.
pub fn extract_named_blocks<'a, I>(sources: I) -> HashMap<String, Vec<String>>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut blocks = HashMap::new();
    for source in sources {
        let lines: Vec<&str> = source
            .lines()
            .map(str::trim)
            .filter(|l| !is_blank_or_comment(l))
            .collect();

        let mut i = 0;
        while i < lines.len() {
            let line = lines[i];
            let opens = lines.get(i + 1).is_some_and(|next| next.starts_with('('));
            if !(is_block_name(line) && opens) {
                i += 1;
                continue;
            }

            let mut raw = vec![line.to_string(), lines[i + 1].to_string()];
            let mut depth = paren_balance(lines[i + 1]);
            i += 2;
            while i < lines.len() && depth > 0 {
                raw.push(lines[i].to_string());
                depth += paren_balance(lines[i]);
                i += 1;
            }
            trace!(block = %line, lines = raw.len(), "extracted block");
            blocks.insert(table_key(line), raw);
        }
    }
    blocks
}

/// Compile one raw block. Returns `None` for an empty line list.
///
/// Dice notation seen on the opening line (`2D12`, `1D12` or `1D6`) is
/// recorded in `registry` under the block's name.
pub fn parse_named_block<S: AsRef<str>>(
    lines: &[S],
    registry: &mut DiceRegistry,
) -> Option<NamedBlock> {
    let (first, body) = lines.split_first()?;
    let mut block = NamedBlock::new(table_key(first.as_ref()));

    let mut stack: Vec<Vec<String>> = Vec::new();
    let mut current: Vec<String> = Vec::new();

    for (i, line) in body.iter().enumerate() {
        let line = line.as_ref();
        let trimmed = line.trim();
        if i == 0 {
            registry.seed_from_line(&block.name, trimmed);
        }

        if trimmed.starts_with('(') {
            stack.push(std::mem::take(&mut current));
        } else if trimmed.starts_with(')') {
            if !current.is_empty() {
                block.levels.push(close_level(current));
            }
            current = stack.pop().unwrap_or_default();
        } else {
            current.push(line.to_string());
        }
    }

    debug!(block = %block.name, levels = block.levels.len(), "compiled block");
    Some(block)
}

/// Turn a closed buffer into a level, consuming a leading notation token.
fn close_level(mut buffer: Vec<String>) -> LevelTable {
    let mut dice = None;
    let tokens: Vec<String> = buffer[0].split_whitespace().map(str::to_string).collect();
    if let Some(token) = tokens.first().filter(|t| DiceSpec::is_notation(t)) {
        dice = token.parse::<DiceSpec>().ok();
        if tokens.len() > 1 {
            buffer[0] = tokens[1..].join(" ");
        } else {
            buffer.remove(0);
        }
    }
    LevelTable {
        dice,
        table: parse_inline_table(&buffer),
    }
}

/// Compile every block found in `sources`.
pub fn compile_block_sources<'a, I>(
    sources: I,
    registry: &mut DiceRegistry,
) -> HashMap<String, NamedBlock>
where
    I: IntoIterator<Item = &'a str>,
{
    extract_named_blocks(sources)
        .into_values()
        .filter_map(|raw| parse_named_block(&raw, registry))
        .map(|block| (block.name.clone(), block))
        .collect()
}

pub fn read_block_source(path: &Path) -> Result<String, BlockError> {
    std::fs::read_to_string(path).map_err(|source| BlockError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// Compile every block found in `files`, read in order. With
/// `skip_unreadable`, files that cannot be read are logged and left out;
/// otherwise the first failure is returned.
pub fn compile_blocks(
    files: &[PathBuf],
    registry: &mut DiceRegistry,
    skip_unreadable: bool,
) -> Result<HashMap<String, NamedBlock>, BlockError> {
    let mut texts = Vec::with_capacity(files.len());
    for path in files {
        match read_block_source(path) {
            Ok(text) => texts.push(text),
            Err(e) if skip_unreadable => warn!(%e, "skipping block source"),
            Err(e) => return Err(e),
        }
    }
    Ok(compile_block_sources(texts.iter().map(String::as_str), registry))
}

#[cfg(test)]
mod tests {
    use super::*;

    const TREASURE: &str = "\
# treasure tables
Treasure
(
1D6
1-4 gold & (gems)
(
1D4
1-2 ruby
3-4 pearl
)
5-6 \"A rusted key\"
)
";

    #[test]
    fn block_names() {
        assert!(is_block_name("Room-Furnish"));
        assert!(is_block_name("_hidden_treasure"));
        assert!(!is_block_name("1-6 gold"));
        assert!(!is_block_name("Two words"));
        assert!(!is_block_name("-dash"));
        assert!(!is_block_name(""));
    }

    #[test]
    fn extracts_balanced_block() {
        let blocks = extract_named_blocks([TREASURE]);
        let raw = &blocks["treasure"];
        assert_eq!(raw.first().map(String::as_str), Some("Treasure"));
        assert_eq!(raw.last().map(String::as_str), Some(")"));
        assert_eq!(raw.len(), 11);
    }

    #[test]
    fn name_without_opening_line_is_not_a_block() {
        let blocks = extract_named_blocks(["Title\nRoom\n(\n1-12 Dust\n)\n"]);
        assert_eq!(blocks.len(), 1);
        assert!(blocks.contains_key("room"));
    }

    #[test]
    fn later_source_overrides() {
        let base = "Room\n(\n1-12 Dust\n)\n";
        let over = "ROOM\n(\n1-12 Cobwebs\n)\n";
        let blocks = extract_named_blocks([base, over]);
        assert_eq!(blocks.len(), 1);
        assert!(blocks["room"].contains(&"1-12 Cobwebs".to_string()));
    }

    #[test]
    fn levels_close_innermost_first() {
        let mut registry = DiceRegistry::new();
        let raw = &extract_named_blocks([TREASURE])["treasure"];
        let block = parse_named_block(raw, &mut registry).unwrap();
        assert_eq!(block.name, "treasure");
        assert_eq!(block.levels.len(), 2);

        let inner = &block.levels[0];
        assert_eq!(inner.dice, Some(DiceSpec::new(1, 4)));
        assert_eq!(inner.table.lookup(3), Some("pearl"));

        let outer = &block.levels[1];
        assert_eq!(outer.dice, Some(DiceSpec::new(1, 6)));
        assert_eq!(outer.table.lookup(2), Some("gold & (gems)"));
        assert_eq!(outer.table.lookup(6), Some("\"A rusted key\""));
    }

    #[test]
    fn notation_token_sharing_a_line_with_entries() {
        let mut registry = DiceRegistry::new();
        let raw = ["Spell", "(", "2D12 2-12 Light", "13-24 Darkness", ")"];
        let block = parse_named_block(&raw, &mut registry).unwrap();
        let level = &block.levels[0];
        assert_eq!(level.dice, Some(DiceSpec::new(2, 12)));
        assert_eq!(level.table.lookup(2), Some("Light"));
        assert_eq!(level.table.lookup(24), Some("Darkness"));
    }

    #[test]
    fn opening_line_seeds_registry() {
        let mut registry = DiceRegistry::new();
        let raw = ["Wandering", "(   1D6 1-3 \"Lost\"", "1-6 Rats", ")"];
        let block = parse_named_block(&raw, &mut registry).unwrap();
        assert_eq!(registry.get("wandering"), Some(DiceSpec::new(1, 6)));
        // The opening line's own text is not table content.
        assert_eq!(block.levels[0].table.lookup(2), Some("Rats"));
        assert_eq!(block.levels[0].dice, None);
    }

    #[test]
    fn empty_levels_are_not_recorded() {
        let mut registry = DiceRegistry::new();
        let block = parse_named_block(&["Nothing", "(", ")"], &mut registry).unwrap();
        assert!(block.levels.is_empty());
        assert!(parse_named_block::<&str>(&[], &mut registry).is_none());
    }

    #[test]
    fn compile_block_sources_keys_by_name() {
        let mut registry = DiceRegistry::new();
        let blocks = compile_block_sources([TREASURE, "Hidden-Treasure\n(\n1-12 A loose flagstone\n)"], &mut registry);
        assert_eq!(blocks.len(), 2);
        assert!(blocks.contains_key("hidden-treasure"));
        assert_eq!(blocks["treasure"].levels.len(), 2);
    }

    #[test]
    fn missing_file_is_io_error() {
        let mut registry = DiceRegistry::new();
        let files = [
            PathBuf::from("tests/fixtures/nope.txt"),
            PathBuf::from("tests/fixtures/dungeon/blocks.txt"),
        ];
        let err = compile_blocks(&files, &mut registry, false).unwrap_err();
        assert!(matches!(err, BlockError::Io { .. }));

        let blocks = compile_blocks(&files, &mut registry, true).unwrap();
        assert!(blocks.contains_key("wandering-monster"));
        assert_eq!(registry.get("wandering-monster"), Some(DiceSpec::new(1, 6)));
    }
}
