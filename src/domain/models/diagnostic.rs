//! Diagnostics produced while parsing model replies.
//!
//! Every structural violation found in a reply becomes a [`ParseIssue`]. Issues
//! are recorded into an [`ErrorLog`] as serializable [`Diagnostic`]s so that
//! the next prompt can show the model exactly what it got wrong. Recording
//! never aborts a parse.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;
use tracing::debug;

use super::field::ScoreMeaning;

/// Coarse classification of a diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiagnosticKind {
    MissingStartLabel,
    MissingEndLabel,
    InvertedLabels,
    EmptyBlock,
    MalformedRecord,
    ForbiddenLatexEnvironment,
    UnknownVocabularyEntry,
    /// Informational only; the entry was dropped, not rejected.
    DuplicateRemoved,
    UnexpectedParseFailure,
}

impl fmt::Display for DiagnosticKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::MissingStartLabel => "missing_start_label",
            Self::MissingEndLabel => "missing_end_label",
            Self::InvertedLabels => "inverted_labels",
            Self::EmptyBlock => "empty_block",
            Self::MalformedRecord => "malformed_record",
            Self::ForbiddenLatexEnvironment => "forbidden_latex_environment",
            Self::UnknownVocabularyEntry => "unknown_vocabulary_entry",
            Self::DuplicateRemoved => "duplicate_removed",
            Self::UnexpectedParseFailure => "unexpected_parse_failure",
        };
        write!(f, "{s}")
    }
}

/// Where a forbidden LaTeX construct was found.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LatexLocation {
    InsideFormula,
    OutsideFormula,
}

impl fmt::Display for LatexLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InsideFormula => write!(f, "inside formula"),
            Self::OutsideFormula => write!(f, "outside any formula"),
        }
    }
}

/// A single structural violation found in a reply.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseIssue {
    #[error("Parse error: missing '{label}' label")]
    MissingStartLabel { label: String },

    #[error("Parse error: missing '{label}' label")]
    MissingEndLabel { label: String },

    #[error("Parse error: '{end}' label appears before '{start}'")]
    InvertedLabels { start: String, end: String },

    #[error("Parse error: nothing between '{start}' and '{end}'")]
    EmptyBlock { start: String, end: String },

    #[error("Malformed entry (whitespace around ';' is not allowed): '{line}'")]
    SeparatorWhitespace { line: String },

    #[error("Malformed entry (missing ';' separator): '{line}'")]
    MissingSeparator { line: String },

    #[error("Entry name has leading or trailing whitespace: '{name}'")]
    NameWhitespace { name: String },

    #[error("{meaning} must not contain '%': '{score}' in entry '{line}'")]
    PercentInScore {
        meaning: ScoreMeaning,
        score: String,
        line: String,
    },

    #[error("{meaning} is empty in entry '{line}'")]
    EmptyScore { meaning: ScoreMeaning, line: String },

    #[error("{meaning} is not an integer: '{score}' in entry '{line}'")]
    ScoreNotInteger {
        meaning: ScoreMeaning,
        score: String,
        line: String,
    },

    #[error("{meaning} out of range {min}-{max}: '{score}' in entry '{line}'")]
    ScoreOutOfRange {
        meaning: ScoreMeaning,
        score: i64,
        min: i64,
        max: i64,
        line: String,
    },

    #[error("All entries of '{field}' were rejected because of formatting errors")]
    AllEntriesRejected { field: String },

    #[error("Forbidden LaTeX environment '{env}' {location}: {matched}")]
    ForbiddenLatexEnvironment {
        env: String,
        location: LatexLocation,
        matched: String,
    },

    #[error("Entry '{name}' is not in the allowed vocabulary")]
    UnknownVocabularyEntry { name: String },

    #[error("Removed duplicate entry: '{entry}'")]
    DuplicateRemoved { entry: String },

    #[error("Field '{field}' must be a single paragraph without line breaks")]
    LineBreakInText { field: String },

    #[error("Field '{field}' is limited to {limit} entries; dropped {dropped}")]
    ListTruncated {
        field: String,
        limit: usize,
        dropped: usize,
    },

    #[error("Removed leading answer-choice marker '{marker}' from '{field}'")]
    AnswerMarkerStripped { field: String, marker: String },

    #[error("Field '{field}' must be a 1-3 digit number, got '{content}'")]
    NotANumeral { field: String, content: String },

    #[error("Field '{field}' out of range {min}-{max}: {value}")]
    IntegerOutOfRange {
        field: String,
        value: i64,
        min: i64,
        max: i64,
    },

    #[error("Too few lines in '{field}': {found}, at least {required} required")]
    TooFewLines {
        field: String,
        found: usize,
        required: usize,
    },

    #[error("Wrong number of answer options ({found}), expected {expected}")]
    OptionCountMismatch { found: usize, expected: usize },

    #[error("Correct option index is not an integer: '{line}'")]
    CorrectIndexNotInteger { line: String },

    #[error("Correct option index out of range 0-{max}: '{line}'")]
    CorrectIndexOutOfRange { line: String, max: usize },

    #[error("Unexpected parse failure: {0}")]
    Unexpected(String),
}

impl ParseIssue {
    /// Taxonomy bucket for this issue.
    pub fn kind(&self) -> DiagnosticKind {
        match self {
            Self::MissingStartLabel { .. } => DiagnosticKind::MissingStartLabel,
            Self::MissingEndLabel { .. } => DiagnosticKind::MissingEndLabel,
            Self::InvertedLabels { .. } => DiagnosticKind::InvertedLabels,
            Self::EmptyBlock { .. } => DiagnosticKind::EmptyBlock,
            Self::ForbiddenLatexEnvironment { .. } => DiagnosticKind::ForbiddenLatexEnvironment,
            Self::UnknownVocabularyEntry { .. } => DiagnosticKind::UnknownVocabularyEntry,
            Self::DuplicateRemoved { .. } => DiagnosticKind::DuplicateRemoved,
            Self::Unexpected(_) => DiagnosticKind::UnexpectedParseFailure,
            Self::SeparatorWhitespace { .. }
            | Self::MissingSeparator { .. }
            | Self::NameWhitespace { .. }
            | Self::PercentInScore { .. }
            | Self::EmptyScore { .. }
            | Self::ScoreNotInteger { .. }
            | Self::ScoreOutOfRange { .. }
            | Self::AllEntriesRejected { .. }
            | Self::LineBreakInText { .. }
            | Self::ListTruncated { .. }
            | Self::AnswerMarkerStripped { .. }
            | Self::NotANumeral { .. }
            | Self::IntegerOutOfRange { .. }
            | Self::TooFewLines { .. }
            | Self::OptionCountMismatch { .. }
            | Self::CorrectIndexNotInteger { .. }
            | Self::CorrectIndexOutOfRange { .. } => DiagnosticKind::MalformedRecord,
        }
    }
}

/// Serializable form of a recorded [`ParseIssue`].
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    pub message: String,
}

impl From<&ParseIssue> for Diagnostic {
    fn from(issue: &ParseIssue) -> Self {
        Self {
            kind: issue.kind(),
            message: issue.to_string(),
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

/// Ordered, append-only diagnostics for one attempt.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ErrorLog {
    entries: Vec<Diagnostic>,
}

impl ErrorLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one issue. Recording never fails and never drops earlier entries.
    pub fn record(&mut self, issue: ParseIssue) {
        debug!(kind = %issue.kind(), message = %issue, "diagnostic recorded");
        self.entries.push(Diagnostic::from(&issue));
    }

    pub fn entries(&self) -> &[Diagnostic] {
        &self.entries
    }

    pub fn into_entries(self) -> Vec<Diagnostic> {
        self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of entries of the given kind.
    pub fn count_kind(&self, kind: DiagnosticKind) -> usize {
        self.entries.iter().filter(|d| d.kind == kind).count()
    }

    /// Messages in sorted order, for order-insensitive comparison.
    pub fn sorted_messages(&self) -> Vec<&str> {
        sorted_messages(&self.entries)
    }
}

impl From<Vec<Diagnostic>> for ErrorLog {
    fn from(entries: Vec<Diagnostic>) -> Self {
        Self { entries }
    }
}

/// Sorted message view of a diagnostic slice.
pub fn sorted_messages(entries: &[Diagnostic]) -> Vec<&str> {
    let mut messages: Vec<&str> = entries.iter().map(|d| d.message.as_str()).collect();
    messages.sort_unstable();
    messages
}
