/// Bestiary lookup: match monster names mentioned in generated text against
/// a CSV stat file and render the matching rows.

use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

use crate::schema::monster::{MonsterRecord, STAT_COLUMNS};

#[derive(Debug, Error)]
pub enum BestiaryError {
    #[error("cannot read bestiary '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Bestiary {
    records: Vec<MonsterRecord>,
}

impl Bestiary {
    pub fn load(path: &Path) -> Result<Bestiary, BestiaryError> {
        let text = std::fs::read_to_string(path).map_err(|source| BestiaryError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let bestiary = Self::parse(&text);
        debug!(path = %path.display(), monsters = bestiary.len(), "loaded bestiary");
        Ok(bestiary)
    }

    /// Parse CSV text. Fields may be double-quoted, with `""` for a quote
    /// and line breaks allowed inside quotes. Blank lines are skipped.
    pub fn parse(text: &str) -> Bestiary {
        let records = parse_csv(text).into_iter().map(MonsterRecord::new).collect();
        Bestiary { records }
    }

    pub fn records(&self) -> &[MonsterRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Records whose name is mentioned in `text`, in order of first mention.
    ///
    /// A mention is a count followed by a name (`3 Clanrats`). Names match
    /// case-insensitively, and a plural mention also matches its singular
    /// row: `Clanrats` finds `Clanrat`, `Warpmen` finds `Warpman`.
    pub fn find_matches(&self, text: &str) -> Vec<&MonsterRecord> {
        let mut matched: Vec<usize> = Vec::new();
        for name in candidate_names(text) {
            let singular = singular_form(&name);
            for (i, record) in self.records.iter().enumerate() {
                let row_name = record.name();
                let hit = row_name.eq_ignore_ascii_case(&name)
                    || singular.as_deref().is_some_and(|s| row_name.eq_ignore_ascii_case(s));
                if hit && !matched.contains(&i) {
                    debug!(mention = %name, monster = row_name, "bestiary match");
                    matched.push(i);
                }
            }
        }
        matched.into_iter().map(|i| &self.records[i]).collect()
    }

    /// The stat table for every monster mentioned in `text`, or `None` if
    /// nothing matched.
    pub fn stats_for(&self, text: &str) -> Option<String> {
        let matches = self.find_matches(text);
        if matches.is_empty() {
            None
        } else {
            Some(render_stat_table(&matches))
        }
    }
}

/// Names introduced by a count in `text`: a run of digits, whitespace, then
/// the longest run of ASCII letters and spaces, trimmed.
pub fn candidate_names(text: &str) -> Vec<String> {
    let chars: Vec<char> = text.chars().collect();
    let mut names: Vec<String> = Vec::new();
    let mut i = 0;

    while i < chars.len() {
        if !chars[i].is_ascii_digit() {
            i += 1;
            continue;
        }
        while i < chars.len() && chars[i].is_ascii_digit() {
            i += 1;
        }
        let gap = i;
        while i < chars.len() && chars[i].is_whitespace() {
            i += 1;
        }
        if i == gap {
            continue;
        }
        let start = i;
        while i < chars.len() && (chars[i].is_ascii_alphabetic() || chars[i] == ' ') {
            i += 1;
        }
        let name: String = chars[start..i].iter().collect();
        let name = name.trim();
        if !name.is_empty() && !names.iter().any(|n| n == name) {
            names.push(name.to_string());
        }
    }
    names
}

fn singular_form(name: &str) -> Option<String> {
    match name.strip_suffix('s') {
        Some(stem) => Some(stem.to_string()),
        None => name.strip_suffix("men").map(|stem| format!("{stem}man")),
    }
}

/// Render records as an aligned plain-text table under the stat headings.
pub fn render_stat_table(records: &[&MonsterRecord]) -> String {
    let columns = records
        .iter()
        .map(|r| r.fields.len())
        .max()
        .unwrap_or(0)
        .max(STAT_COLUMNS.len());

    let mut rows: Vec<Vec<&str>> = Vec::with_capacity(records.len() + 1);
    rows.push((0..columns).map(|i| STAT_COLUMNS.get(i).copied().unwrap_or("")).collect());
    for record in records {
        rows.push(
            (0..columns)
                .map(|i| record.fields.get(i).map(|f| f.trim()).unwrap_or(""))
                .collect(),
        );
    }

    let widths: Vec<usize> = (0..columns)
        .map(|i| rows.iter().map(|row| row[i].chars().count()).max().unwrap_or(0))
        .collect();

    let format_row = |row: &[&str]| -> String {
        row.iter()
            .zip(&widths)
            .map(|(cell, width)| format!("{cell:<width$}", width = *width))
            .collect::<Vec<_>>()
            .join(" | ")
            .trim_end()
            .to_string()
    };

    let mut lines = Vec::with_capacity(rows.len() + 1);
    lines.push(format_row(rows[0].as_slice()));
    lines.push(
        widths
            .iter()
            .map(|w| "-".repeat(*w))
            .collect::<Vec<_>>()
            .join("-+-"),
    );
    for row in &rows[1..] {
        lines.push(format_row(row.as_slice()));
    }
    lines.join("\n")
}

fn parse_csv(text: &str) -> Vec<Vec<String>> {
    let mut rows = Vec::new();
    let mut row = Vec::new();
    let mut field = String::new();
    let mut in_quotes = false;
    let mut chars = text.chars().peekable();

    while let Some(c) = chars.next() {
        if in_quotes {
            match c {
                '"' if chars.peek() == Some(&'"') => {
                    chars.next();
                    field.push('"');
                }
                '"' => in_quotes = false,
                _ => field.push(c),
            }
            continue;
        }
        match c {
            '"' => in_quotes = true,
            ',' => row.push(std::mem::take(&mut field)),
            '\r' => {}
            '\n' => finish_row(&mut rows, &mut row, &mut field),
            _ => field.push(c),
        }
    }
    finish_row(&mut rows, &mut row, &mut field);
    rows
}

fn finish_row(rows: &mut Vec<Vec<String>>, row: &mut Vec<String>, field: &mut String) {
    row.push(std::mem::take(field));
    let blank = row.len() == 1 && row[0].trim().is_empty();
    let done = std::mem::take(row);
    if !blank {
        rows.push(done);
    }
}
