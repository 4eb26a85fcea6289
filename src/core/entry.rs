/// Entry grammar: the shapes a rolled table entry or text line can take.

/// A classified piece of entry text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Entry {
    /// `"text"`: emitted verbatim without the quotes.
    Literal(String),
    /// `[[a & b]]`: further table rolls. Names are lowercased with
    /// parentheses removed.
    NestedRefs(Vec<String>),
    /// `a & b`: independently emitted parts, trimmed.
    Composite(Vec<String>),
    /// `Name()`: an explicit call, name as written.
    Call(String),
    /// Anything else, trimmed.
    PlainText(String),
}

impl Entry {
    /// Classify entry text.
    ///
    /// Checked in order: quoted literal, `[[...]]` reference list, a whole
    /// `Name()` call, `&` composite, plain text. A quoted or bracketed entry
    /// is never treated as a composite even when it contains `&`.
    pub fn parse(text: &str) -> Entry {
        let text = text.trim();

        if text.len() >= 2 && text.starts_with('"') && text.ends_with('"') {
            return Entry::Literal(text[1..text.len() - 1].to_string());
        }

        if text.len() >= 4 && text.starts_with("[[") && text.ends_with("]]") {
            let refs = text[2..text.len() - 2]
                .split('&')
                .map(normalize_ref)
                .filter(|name| !name.is_empty())
                .collect();
            return Entry::NestedRefs(refs);
        }

        if let Some(name) = call_name(text) {
            return Entry::Call(name.to_string());
        }

        if text.contains('&') {
            let parts = text
                .split('&')
                .map(str::trim)
                .filter(|p| !p.is_empty())
                .map(str::to_string)
                .collect();
            return Entry::Composite(parts);
        }

        Entry::PlainText(text.to_string())
    }
}

fn normalize_ref(part: &str) -> String {
    part.chars()
        .filter(|c| *c != '(' && *c != ')')
        .collect::<String>()
        .trim()
        .to_lowercase()
}

fn is_name_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == '-'
}

/// The name in a line that is exactly `Name()`.
pub fn call_name(line: &str) -> Option<&str> {
    let name = line.strip_suffix("()")?;
    if !name.is_empty() && name.chars().all(is_name_char) {
        Some(name)
    } else {
        None
    }
}

/// Every `Name()` occurring inside `text`, left to right.
pub fn inline_calls(text: &str) -> Vec<&str> {
    let mut calls = Vec::new();
    let mut search_from = 0;
    while let Some(offset) = text[search_from..].find("()") {
        let paren = search_from + offset;
        let start = text[..paren]
            .char_indices()
            .rev()
            .take_while(|(_, c)| is_name_char(*c))
            .last()
            .map(|(i, _)| i);
        if let Some(start) = start {
            calls.push(&text[start..paren]);
        }
        search_from = paren + 2;
    }
    calls
}
