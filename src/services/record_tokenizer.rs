//! Brace-aware splitting of `name;score` lines.
//!
//! Names frequently carry LaTeX (`\text{a;b}`), so the separator that counts
//! is the rightmost one at brace depth zero. Scanning runs from the end of
//! the line: `}` opens a level, `{` closes one.

use regex::Regex;
use std::sync::LazyLock;

pub const SEPARATOR: char = ';';

static SEPARATOR_WHITESPACE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s;|;\s").expect("separator whitespace pattern is valid"));

/// Byte index of the last `separator` outside any `{...}` group.
pub fn last_separator_outside_braces(line: &str, separator: char) -> Option<usize> {
    let mut depth: i64 = 0;
    for (index, ch) in line.char_indices().rev() {
        match ch {
            '}' => depth += 1,
            '{' => depth -= 1,
            c if c == separator && depth == 0 => return Some(index),
            _ => {}
        }
    }
    None
}

/// Split at the last depth-zero `;` into `(name, score_text)`.
pub fn split_record(line: &str) -> Option<(&str, &str)> {
    last_separator_outside_braces(line, SEPARATOR)
        .map(|index| (&line[..index], &line[index + SEPARATOR.len_utf8()..]))
}

/// Whether any `;` in the line touches whitespace.
pub fn has_separator_whitespace(line: &str) -> bool {
    SEPARATOR_WHITESPACE.is_match(line)
}

/// The part of a list line before its `;metadata`, or the whole line.
pub fn strip_metadata(line: &str) -> &str {
    split_record(line).map_or(line, |(name, _)| name)
}

/// Parse a bare base-10 integer: optional sign followed by ASCII digits only.
pub fn parse_bare_integer(text: &str) -> Option<i64> {
    let digits = text.strip_prefix(['-', '+']).unwrap_or(text);
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    text.parse().ok()
}
