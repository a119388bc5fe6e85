//! Caller-owned generation state threaded through repeated attempts.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use uuid::Uuid;

use super::diagnostic::Diagnostic;
use super::field::FieldSpec;

/// A `(name, score)` pair parsed from one line. Serialized as `["name", 42]`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(from = "(String, i64)", into = "(String, i64)")]
pub struct Record {
    pub name: String,
    pub score: i64,
}

impl Record {
    pub fn new(name: impl Into<String>, score: i64) -> Self {
        Self {
            name: name.into(),
            score,
        }
    }
}

impl From<(String, i64)> for Record {
    fn from((name, score): (String, i64)) -> Self {
        Self { name, score }
    }
}

impl From<Record> for (String, i64) {
    fn from(record: Record) -> Self {
        (record.name, record.score)
    }
}

/// Multiple-choice options plus the zero-based index of the correct one.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnswerOptions {
    pub options: Vec<String>,
    pub correct_index: Option<usize>,
}

impl AnswerOptions {
    pub fn correct_option(&self) -> Option<&str> {
        self.correct_index
            .and_then(|i| self.options.get(i))
            .map(String::as_str)
    }
}

/// Value of one generated field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldValue {
    Text(String),
    Integer(Option<i64>),
    StringList(Vec<String>),
    Records(Vec<Record>),
    Options(AnswerOptions),
}

impl FieldValue {
    pub fn shape_name(&self) -> &'static str {
        match self {
            Self::Text(_) => "text",
            Self::Integer(_) => "bounded integer",
            Self::StringList(_) => "string list",
            Self::Records(_) => "scored records",
            Self::Options(_) => "answer options",
        }
    }

    /// Names usable as a canonical vocabulary (record names or list items).
    pub fn names(&self) -> Vec<String> {
        match self {
            Self::StringList(items) => items.clone(),
            Self::Records(records) => records.iter().map(|r| r.name.clone()).collect(),
            Self::Options(options) => options.options.clone(),
            Self::Text(_) | Self::Integer(_) => Vec::new(),
        }
    }
}

/// Whether the caller should keep asking for new attempts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeFlag {
    /// The last attempt changed something; another attempt is warranted.
    #[default]
    Pending,
    /// Nothing changed; further attempts are pointless.
    Converged,
    /// The attempt ceiling was hit.
    Exhausted,
}

impl ChangeFlag {
    pub fn is_pending(&self) -> bool {
        matches!(self, Self::Pending)
    }

    pub fn is_stopped(&self) -> bool {
        !self.is_pending()
    }
}

impl fmt::Display for ChangeFlag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pending => write!(f, "pending"),
            Self::Converged => write!(f, "converged"),
            Self::Exhausted => write!(f, "exhausted"),
        }
    }
}

/// Diagnostics of one attempt, kept in the append-only history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttemptDiagnostics {
    pub attempt: u32,
    pub recorded_at: DateTime<Utc>,
    pub diagnostics: Vec<Diagnostic>,
}

/// Snapshot of a generation session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationState {
    #[serde(default = "Uuid::new_v4")]
    pub session_id: Uuid,
    #[serde(default)]
    pub changed: ChangeFlag,
    #[serde(default)]
    pub attempt: u32,
    /// Diagnostics of the most recent attempt
    #[serde(default)]
    pub errors: Vec<Diagnostic>,
    #[serde(default)]
    pub history: Vec<AttemptDiagnostics>,
    #[serde(default)]
    pub fields: BTreeMap<String, FieldValue>,
}

impl Default for GenerationState {
    fn default() -> Self {
        Self::new()
    }
}

impl GenerationState {
    pub fn new() -> Self {
        Self {
            session_id: Uuid::new_v4(),
            changed: ChangeFlag::Pending,
            attempt: 0,
            errors: Vec::new(),
            history: Vec::new(),
            fields: BTreeMap::new(),
        }
    }

    /// Fresh state with an empty value for every field.
    pub fn for_fields(specs: &[FieldSpec]) -> Self {
        let mut state = Self::new();
        for spec in specs {
            state
                .fields
                .insert(spec.name.clone(), spec.shape.empty_value());
        }
        state
    }

    pub fn with_field(mut self, name: impl Into<String>, value: FieldValue) -> Self {
        self.fields.insert(name.into(), value);
        self
    }

    pub fn field(&self, name: &str) -> Option<&FieldValue> {
        self.fields.get(name)
    }

    /// Replace the latest-attempt diagnostics and append them to the history.
    pub fn record_attempt(&mut self, attempt: u32, diagnostics: Vec<Diagnostic>) {
        self.history.push(AttemptDiagnostics {
            attempt,
            recorded_at: Utc::now(),
            diagnostics: diagnostics.clone(),
        });
        self.errors = diagnostics;
    }
}
