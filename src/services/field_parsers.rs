//! One parser per field shape.
//!
//! Every parser takes the previous value, the raw reply and an [`ErrorLog`],
//! and returns the new value. Rejected elements are recorded and skipped.
//! When nothing usable survives, the previous value comes back unchanged.

use regex::Regex;
use std::collections::HashSet;
use std::sync::LazyLock;
use tracing::debug;

use crate::domain::models::{
    AnswerOptions, ErrorLog, LabelPair, ListRules, OptionsRules, ParseIssue, Record,
    RecordRules, ScoreRange, TextRules,
};
use crate::services::delimiter_extractor::{block_lines, extract_into};
use crate::services::latex_guard;
use crate::services::record_tokenizer::{
    has_separator_whitespace, parse_bare_integer, split_record, strip_metadata,
};

static ANSWER_MARKER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:[A-Da-d]|[1-4]|(?i:iv|i{1,3}))([\).:\-])(\s*)")
        .expect("answer marker pattern is valid")
});

static NUMERAL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d{1,3}$").expect("numeral pattern is valid"));

/// Drop exact duplicates, keeping first occurrences. Each dropped line is
/// logged as a soft diagnostic.
pub fn dedup_lines<'a>(lines: Vec<&'a str>, log: &mut ErrorLog) -> Vec<&'a str> {
    let mut seen = HashSet::new();
    let mut unique = Vec::with_capacity(lines.len());
    for line in lines {
        if seen.insert(line) {
            unique.push(line);
        } else {
            log.record(ParseIssue::DuplicateRemoved {
                entry: line.to_string(),
            });
        }
    }
    unique
}

/// Validate one `name;score` line.
pub fn parse_record_line(line: &str, rules: &RecordRules) -> Result<Record, ParseIssue> {
    if has_separator_whitespace(line) {
        return Err(ParseIssue::SeparatorWhitespace {
            line: line.to_string(),
        });
    }
    let (name, score_text) = split_record(line).ok_or_else(|| ParseIssue::MissingSeparator {
        line: line.to_string(),
    })?;

    if name.trim() != name {
        return Err(ParseIssue::NameWhitespace {
            name: name.to_string(),
        });
    }
    latex_guard::check(name)?;

    if score_text.contains('%') {
        return Err(ParseIssue::PercentInScore {
            meaning: rules.meaning,
            score: score_text.to_string(),
            line: line.to_string(),
        });
    }
    if score_text.is_empty() {
        return Err(ParseIssue::EmptyScore {
            meaning: rules.meaning,
            line: line.to_string(),
        });
    }
    let score = parse_bare_integer(score_text).ok_or_else(|| ParseIssue::ScoreNotInteger {
        meaning: rules.meaning,
        score: score_text.to_string(),
        line: line.to_string(),
    })?;

    if let Some(range) = rules.range {
        if !range.contains(score) {
            return Err(ParseIssue::ScoreOutOfRange {
                meaning: rules.meaning,
                score,
                min: range.min,
                max: range.max,
                line: line.to_string(),
            });
        }
    }
    Ok(Record::new(name, score))
}

/// Scored-record list (`name;score` per line).
pub fn parse_records(
    field: &str,
    previous: &[Record],
    reply: &str,
    labels: &LabelPair,
    rules: &RecordRules,
    log: &mut ErrorLog,
) -> Vec<Record> {
    let Some(block) = extract_into(reply, labels, log) else {
        return previous.to_vec();
    };
    let lines = dedup_lines(block_lines(&block), log);

    let mut records = Vec::with_capacity(lines.len());
    let mut rejected = 0usize;
    for line in lines {
        match parse_record_line(line, rules) {
            Ok(record) => records.push(record),
            Err(issue) => {
                rejected += 1;
                log.record(issue);
            }
        }
    }

    if records.is_empty() && rejected > 0 {
        log.record(ParseIssue::AllEntriesRejected {
            field: field.to_string(),
        });
        return previous.to_vec();
    }
    debug!(field, accepted = records.len(), rejected, "records parsed");
    records
}

/// Plain string list, one entry per line.
pub fn parse_string_list(
    field: &str,
    previous: &[String],
    reply: &str,
    labels: &LabelPair,
    rules: &ListRules,
    log: &mut ErrorLog,
) -> Vec<String> {
    let Some(block) = extract_into(reply, labels, log) else {
        return previous.to_vec();
    };
    let mut lines = block_lines(&block);
    if rules.strip_metadata {
        lines = lines.into_iter().map(strip_metadata).collect();
    }
    let lines = dedup_lines(lines, log);

    let mut items = Vec::with_capacity(lines.len());
    let mut rejected = 0usize;
    for line in lines {
        if line.trim() != line || line.is_empty() {
            rejected += 1;
            log.record(ParseIssue::NameWhitespace {
                name: line.to_string(),
            });
            continue;
        }
        if rules.latex_guard && !latex_guard::is_safe(line, log) {
            rejected += 1;
            continue;
        }
        items.push(line.to_string());
    }

    if items.is_empty() && rejected > 0 {
        log.record(ParseIssue::AllEntriesRejected {
            field: field.to_string(),
        });
        return previous.to_vec();
    }

    if let Some(limit) = rules.limit {
        if items.len() > limit {
            log.record(ParseIssue::ListTruncated {
                field: field.to_string(),
                limit,
                dropped: items.len() - limit,
            });
            items.truncate(limit);
        }
    }
    items
}

/// Remove one leading answer-choice marker such as `A)` or `iv.`.
///
/// `.` and `-` need a following space. `)` and `:` may touch the text unless
/// a digit follows, so `1.5` and `3:4` stay intact.
pub fn strip_answer_marker(text: &str) -> Option<(String, String)> {
    let caps = ANSWER_MARKER.captures(text)?;
    let found = caps.get(0)?;
    let rest = &text[found.end()..];
    let spaced = caps.get(2).is_some_and(|m| !m.is_empty());
    let tight = matches!(caps.get(1).map(|m| m.as_str()), Some(")" | ":"))
        && !rest.starts_with(|c: char| c.is_ascii_digit());
    if !spaced && !tight {
        return None;
    }
    let marker = found.as_str().trim_end().to_string();
    Some((marker, rest.to_string()))
}

/// Single free-text field.
pub fn parse_text(
    field: &str,
    previous: &str,
    reply: &str,
    labels: &LabelPair,
    rules: &TextRules,
    log: &mut ErrorLog,
) -> String {
    let Some(mut text) = extract_into(reply, labels, log) else {
        return previous.to_string();
    };

    if rules.single_paragraph && text.contains('\n') {
        log.record(ParseIssue::LineBreakInText {
            field: field.to_string(),
        });
        return previous.to_string();
    }
    if rules.latex_guard && !latex_guard::is_safe(&text, log) {
        return previous.to_string();
    }
    if rules.strip_answer_markers {
        if let Some((marker, rest)) = strip_answer_marker(&text) {
            if !rest.trim().is_empty() {
                log.record(ParseIssue::AnswerMarkerStripped {
                    field: field.to_string(),
                    marker,
                });
                text = rest.trim().to_string();
            }
        }
    }
    text
}

/// 1-3 digit integer within `range`.
pub fn parse_bounded_integer(
    field: &str,
    previous: Option<i64>,
    reply: &str,
    labels: &LabelPair,
    range: &ScoreRange,
    log: &mut ErrorLog,
) -> Option<i64> {
    let Some(block) = extract_into(reply, labels, log) else {
        return previous;
    };
    let parsed = if NUMERAL.is_match(&block) {
        block.parse::<i64>().ok()
    } else {
        None
    };
    let Some(value) = parsed else {
        log.record(ParseIssue::NotANumeral {
            field: field.to_string(),
            content: block,
        });
        return previous;
    };
    if !range.contains(value) {
        log.record(ParseIssue::IntegerOutOfRange {
            field: field.to_string(),
            value,
            min: range.min,
            max: range.max,
        });
        return previous;
    }
    Some(value)
}

/// Answer options: option lines followed by the zero-based correct index.
///
/// New options are only accepted together with a valid index; otherwise the
/// previous value comes back whole.
pub fn parse_answer_options(
    field: &str,
    previous: &AnswerOptions,
    reply: &str,
    labels: &LabelPair,
    rules: &OptionsRules,
    log: &mut ErrorLog,
) -> AnswerOptions {
    let Some(block) = extract_into(reply, labels, log) else {
        return previous.clone();
    };

    // A trailing integer is the index slot and never counts as a duplicate,
    // so numeric options such as `0..3` keep their index line.
    let mut lines = block_lines(&block);
    let index_slot = if lines.last().is_some_and(|last| parse_bare_integer(last).is_some()) {
        lines.pop()
    } else {
        None
    };
    let mut lines = dedup_lines(lines, log);
    lines.extend(index_slot);

    let Some((index_line, option_lines)) =
        lines.split_last().filter(|(_, rest)| !rest.is_empty())
    else {
        log.record(ParseIssue::TooFewLines {
            field: field.to_string(),
            found: lines.len(),
            required: 2,
        });
        return previous.clone();
    };

    let options: Vec<String> = option_lines
        .iter()
        .filter(|line| latex_guard::is_safe(line, log))
        .map(|line| (*line).to_string())
        .collect();

    if options.is_empty() {
        log.record(ParseIssue::AllEntriesRejected {
            field: field.to_string(),
        });
        return previous.clone();
    }
    if options.len() != rules.expected_count {
        log.record(ParseIssue::OptionCountMismatch {
            found: options.len(),
            expected: rules.expected_count,
        });
    }

    let correct_index = match parse_bare_integer(index_line) {
        Some(index) => match usize::try_from(index) {
            Ok(index) if index < options.len() => index,
            _ => {
                log.record(ParseIssue::CorrectIndexOutOfRange {
                    line: (*index_line).to_string(),
                    max: options.len() - 1,
                });
                return previous.clone();
            }
        },
        None => {
            log.record(ParseIssue::CorrectIndexNotInteger {
                line: (*index_line).to_string(),
            });
            return previous.clone();
        }
    };

    AnswerOptions {
        options,
        correct_index: Some(correct_index),
    }
}
