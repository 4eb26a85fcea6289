/// Table compilation: `start[-end] content` sources into range tables.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, warn};

use crate::schema::table::RangeTable;

#[derive(Debug, Error)]
pub enum TableError {
    #[error("cannot read table source '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Registry key for a table or block name.
pub fn table_key(name: &str) -> String {
    name.trim().to_lowercase()
}

/// Separator-insensitive form used to match user-supplied start names:
/// lowercased with `-` and `_` removed.
pub fn loose_key(name: &str) -> String {
    name.trim()
        .chars()
        .filter(|c| *c != '-' && *c != '_')
        .flat_map(char::to_lowercase)
        .collect()
}

/// Table name for a source file: its lowercased stem.
pub fn table_name(path: &Path) -> Option<String> {
    path.file_stem()
        .and_then(|s| s.to_str())
        .map(|s| s.to_lowercase())
}

/// Whether a trimmed source line carries no content.
pub(crate) fn is_blank_or_comment(trimmed: &str) -> bool {
    trimmed.is_empty() || trimmed.starts_with('#')
}

/// Match `^(\d+)(?:-(\d+))?\s+(.+)$` against a trimmed line, returning
/// `(start, end, content)`. A missing end equals the start.
pub fn parse_range_line(line: &str) -> Option<(u32, u32, &str)> {
    let (start, rest) = leading_number(line)?;
    let (end, rest) = match rest.strip_prefix('-') {
        Some(after_dash) => leading_number(after_dash)?,
        None => (start, rest),
    };

    let content = rest.trim_start();
    if content.len() == rest.len() || content.is_empty() {
        return None;
    }
    Some((start, end, content.trim_end()))
}

fn leading_number(s: &str) -> Option<(u32, &str)> {
    let digits = s.bytes().take_while(u8::is_ascii_digit).count();
    if digits == 0 {
        return None;
    }
    let value = s[..digits].parse().ok()?;
    Some((value, &s[digits..]))
}

/// Build a table from lines, one entry per declared range.
/// Blank lines, `#` comments, and lines that are not range lines are skipped.
pub fn parse_inline_table<I, S>(lines: I) -> RangeTable
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut table = RangeTable::new();
    for line in lines {
        let line = line.as_ref().trim();
        if is_blank_or_comment(line) {
            continue;
        }
        if let Some((start, end, content)) = parse_range_line(line) {
            table.push_range(start, end, content);
        }
    }
    table
}

/// Parse the full text of a `.tab` source.
pub fn parse_table_source(text: &str) -> RangeTable {
    parse_inline_table(text.lines())
}

pub fn parse_table_file(path: &Path) -> Result<RangeTable, TableError> {
    let text = std::fs::read_to_string(path).map_err(|source| TableError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(parse_table_source(&text))
}

/// Compile table files keyed by [`table_name`]. Later files replace earlier
/// files with the same name. With `skip_unreadable`, files that cannot be
/// read are logged and left out; otherwise the first failure is returned.
pub fn compile_tables(
    files: &[PathBuf],
    skip_unreadable: bool,
) -> Result<HashMap<String, RangeTable>, TableError> {
    let mut tables = HashMap::new();
    for path in files {
        let Some(name) = table_name(path) else {
            continue;
        };
        match parse_table_file(path) {
            Ok(table) => {
                debug!(table = %name, path = %path.display(), ranges = table.len(), "loaded table");
                tables.insert(name, table);
            }
            Err(e) if skip_unreadable => warn!(%e, "skipping table source"),
            Err(e) => return Err(e),
        }
    }
    Ok(tables)
}
