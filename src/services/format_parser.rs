//! Format-driven replies: `@@`-separated parts filling `{placeholder}` slots.
//!
//! The last prompt line carrying `{name}` placeholders is the format line.
//! A slot named `name_output` stores its part under `name`; a part holding
//! `|` becomes a list. Only output slots take part in change detection,
//! and lists are compared as sets.

use regex::Regex;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::LazyLock;
use tracing::{debug, info};

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{ChangeFlag, FormatState, FormatValue};

/// Suffix marking a slot the model is expected to fill.
pub const OUTPUT_SUFFIX: &str = "_output";

/// Separator between the parts of a reply.
pub const PART_SEPARATOR: &str = "@@";

static PLACEHOLDER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{(\w+)\}").expect("placeholder pattern is valid"));

static PIPE_SPACING: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s*\|\s*").expect("pipe spacing pattern is valid"));

static PIPE_RUN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\|{2,}").expect("pipe run pattern is valid"));

static PART_SPACING: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s*@@\s*").expect("part spacing pattern is valid"));

/// One `{placeholder}` of the format line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FormatSlot {
    pub placeholder: String,
    /// Key the part is stored under
    pub key: String,
    pub output: bool,
}

impl FormatSlot {
    fn new(placeholder: &str) -> Self {
        let (key, output) = placeholder
            .strip_suffix(OUTPUT_SUFFIX)
            .map_or((placeholder, false), |key| (key, true));
        Self {
            placeholder: placeholder.to_string(),
            key: key.to_string(),
            output,
        }
    }
}

/// Parsed format line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OutputFormat {
    line: String,
    slots: Vec<FormatSlot>,
}

impl OutputFormat {
    /// Parse one format line; `None` when it has no placeholders.
    pub fn parse(line: &str) -> Option<Self> {
        let slots: Vec<FormatSlot> = PLACEHOLDER
            .captures_iter(line)
            .map(|caps| FormatSlot::new(&caps[1]))
            .collect();
        if slots.is_empty() {
            return None;
        }
        Some(Self {
            line: line.trim().to_string(),
            slots,
        })
    }

    /// Use the last non-empty prompt line that carries a placeholder.
    pub fn from_prompt(prompt: &str) -> DomainResult<Self> {
        prompt
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .rev()
            .find_map(Self::parse)
            .ok_or(DomainError::FormatLineMissing)
    }

    pub fn line(&self) -> &str {
        &self.line
    }

    pub fn slots(&self) -> &[FormatSlot] {
        &self.slots
    }

    pub fn output_keys(&self) -> impl Iterator<Item = &str> {
        self.slots
            .iter()
            .filter(|slot| slot.output)
            .map(|slot| slot.key.as_str())
    }

    /// Store each `@@` part of a cleaned reply under its slot's key.
    ///
    /// Nothing is written unless the part count matches the slot count.
    pub fn parse_output(
        &self,
        output: &str,
        values: &mut BTreeMap<String, FormatValue>,
    ) -> DomainResult<()> {
        let parts: Vec<&str> = output.split(PART_SEPARATOR).collect();
        if parts.len() != self.slots.len() {
            return Err(DomainError::FormatPartCount {
                found: parts.len(),
                expected: self.slots.len(),
            });
        }
        for (slot, part) in self.slots.iter().zip(parts) {
            values.insert(slot.key.clone(), part_value(part));
        }
        Ok(())
    }

    /// Whether any output key differs between two value maps.
    pub fn detect_changes(
        &self,
        old: &BTreeMap<String, FormatValue>,
        new: &BTreeMap<String, FormatValue>,
    ) -> bool {
        self.output_keys()
            .any(|key| Normalized::of(old.get(key)) != Normalized::of(new.get(key)))
    }
}

fn part_value(part: &str) -> FormatValue {
    if part.contains('|') {
        FormatValue::List(
            part.split('|')
                .filter(|item| !item.is_empty())
                .map(str::to_string)
                .collect(),
        )
    } else {
        FormatValue::Text(part.to_string())
    }
}

#[derive(PartialEq, Eq)]
enum Normalized<'a> {
    Missing,
    Text(&'a str),
    Set(BTreeSet<&'a str>),
}

impl<'a> Normalized<'a> {
    fn of(value: Option<&'a FormatValue>) -> Self {
        match value {
            None => Self::Missing,
            Some(FormatValue::Text(text)) => Self::Text(text),
            Some(FormatValue::List(items)) => Self::Set(items.iter().map(String::as_str).collect()),
        }
    }
}

/// Tighten separator spacing and collapse repeated `|`.
pub fn clean_output(output: &str) -> String {
    let output = PIPE_SPACING.replace_all(output, "|");
    let output = PIPE_RUN.replace_all(&output, "|");
    let output = PART_SPACING.replace_all(&output, PART_SEPARATOR);
    output.trim().to_string()
}

/// Fold one reply into `previous`.
///
/// The attempt counter always advances. The state converges when no output
/// key changed.
pub fn apply(
    format: &OutputFormat,
    previous: &FormatState,
    reply: &str,
) -> DomainResult<FormatState> {
    let cleaned = clean_output(reply);
    let mut next = previous.clone();
    format.parse_output(&cleaned, &mut next.values)?;

    next.attempt = previous.attempt.saturating_add(1);
    next.errors = Vec::new();
    next.changed = if format.detect_changes(&previous.values, &next.values) {
        ChangeFlag::Pending
    } else {
        ChangeFlag::Converged
    };

    debug!(parts = format.slots().len(), "format reply parsed");
    info!(
        session_id = %next.session_id,
        attempt = next.attempt,
        changed = %next.changed,
        "format attempt applied"
    );
    Ok(next)
}

#[cfg(test)]
mod tests {
    use super::*;

    const PROMPT: &str = "List the subtopics of fractions.\n\
                          Answer in this exact format:\n\
                          {subtopics_output}@@{summary_output}@@{level}\n";

    fn format() -> OutputFormat {
        OutputFormat::from_prompt(PROMPT).unwrap()
    }

    fn list(items: &[&str]) -> FormatValue {
        FormatValue::List(items.iter().map(|s| (*s).to_string()).collect())
    }

    #[test]
    fn test_format_line_is_last_placeholder_line() {
        let format = format();
        assert_eq!(format.line(), "{subtopics_output}@@{summary_output}@@{level}");
        let keys: Vec<&str> = format.slots().iter().map(|s| s.key.as_str()).collect();
        assert_eq!(keys, vec!["subtopics", "summary", "level"]);
        assert_eq!(format.output_keys().collect::<Vec<_>>(), vec!["subtopics", "summary"]);
    }

    #[test]
    fn test_prompt_without_placeholders() {
        assert!(matches!(
            OutputFormat::from_prompt("no slots here\n\n"),
            Err(DomainError::FormatLineMissing)
        ));
    }

    #[test]
    fn test_clean_output() {
        assert_eq!(
            clean_output("  Adding |  Subtracting|| |Comparing  @@ Basics @@ 2 \n"),
            "Adding|Subtracting|Comparing@@Basics@@2"
        );
    }

    #[test]
    fn test_parse_output_lists_and_text() {
        let mut values = BTreeMap::new();
        format()
            .parse_output("Adding|Subtracting@@Basics@@2", &mut values)
            .unwrap();

        assert_eq!(values["subtopics"], list(&["Adding", "Subtracting"]));
        assert_eq!(values["summary"], FormatValue::Text("Basics".into()));
        assert_eq!(values["level"], FormatValue::Text("2".into()));
    }

    #[test]
    fn test_part_count_mismatch_writes_nothing() {
        let mut values = BTreeMap::new();
        let err = format().parse_output("Adding|Subtracting@@Basics", &mut values).unwrap_err();

        assert!(matches!(err, DomainError::FormatPartCount { found: 2, expected: 3 }));
        assert!(values.is_empty());
    }

    #[test]
    fn test_changes_ignore_list_order_and_input_slots() {
        let format = format();
        let old = BTreeMap::from([
            ("subtopics".to_string(), list(&["Adding", "Subtracting"])),
            ("summary".to_string(), FormatValue::Text("Basics".into())),
            ("level".to_string(), FormatValue::Text("1".into())),
        ]);
        let mut new = old.clone();
        new.insert("subtopics".into(), list(&["Subtracting", "Adding", "Adding"]));
        new.insert("level".into(), FormatValue::Text("2".into()));
        assert!(!format.detect_changes(&old, &new));

        new.insert("summary".into(), FormatValue::Text("Other".into()));
        assert!(format.detect_changes(&old, &new));
    }

    #[test]
    fn test_apply_converges_on_repeat() {
        let format = format();
        let reply = "Adding | Subtracting @@ Basics @@ 2";

        let first = apply(&format, &FormatState::new(), reply).unwrap();
        assert_eq!(first.attempt, 1);
        assert_eq!(first.changed, ChangeFlag::Pending);

        let second = apply(&format, &first, "Subtracting|Adding@@Basics@@2").unwrap();
        assert_eq!(second.attempt, 2);
        assert_eq!(second.changed, ChangeFlag::Converged);
        assert_eq!(second.session_id, first.session_id);
    }
}
