//! Field descriptors: which block a field is read from, what shape its value
//! has, and which rules apply while parsing it.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::generation::FieldValue;

/// Start/end label pair delimiting a block, without the trailing colon.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabelPair {
    pub start: String,
    pub end: String,
}

impl LabelPair {
    pub fn new(start: impl Into<String>, end: impl Into<String>) -> Self {
        Self {
            start: start.into(),
            end: end.into(),
        }
    }

    /// `Start:` / `End:`
    pub fn plain() -> Self {
        Self::new("Start", "End")
    }

    /// `{prefix}Start:` / `{prefix}End:`, e.g. `subtopicsStart:`.
    pub fn prefixed(prefix: &str) -> Self {
        Self::new(format!("{prefix}Start"), format!("{prefix}End"))
    }

    pub fn start_label(&self) -> String {
        format!("{}:", self.start)
    }

    pub fn end_label(&self) -> String {
        format!("{}:", self.end)
    }
}

impl fmt::Display for LabelPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:/{}:", self.start, self.end)
    }
}

/// What a record's integer score stands for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoreMeaning {
    /// Relative weight of a subtopic within its topic
    Importance,
    /// Share of the subtopic the learner has mastered
    Mastery,
    /// Share of the learner's answers that were wrong
    ErrorRate,
}

impl fmt::Display for ScoreMeaning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Importance => write!(f, "Importance"),
            Self::Mastery => write!(f, "Mastery"),
            Self::ErrorRate => write!(f, "Error rate"),
        }
    }
}

/// Inclusive integer bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreRange {
    pub min: i64,
    pub max: i64,
}

impl ScoreRange {
    pub const PERCENT: ScoreRange = ScoreRange { min: 0, max: 100 };

    pub fn contains(&self, value: i64) -> bool {
        (self.min..=self.max).contains(&value)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextRules {
    /// Reject content containing line breaks
    pub single_paragraph: bool,
    pub latex_guard: bool,
    /// Strip a leading `A)` / `1.` / `iv:` marker
    pub strip_answer_markers: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListRules {
    /// Keep at most this many entries
    pub limit: Option<usize>,
    /// Drop `;metadata` after the last depth-zero separator
    pub strip_metadata: bool,
    pub latex_guard: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordRules {
    pub meaning: ScoreMeaning,
    pub range: Option<ScoreRange>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OptionsRules {
    pub expected_count: usize,
}

/// Shape of a field's value together with its parse rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "shape", rename_all = "snake_case")]
pub enum FieldShape {
    Text(TextRules),
    BoundedInteger(ScoreRange),
    StringList(ListRules),
    ScoredRecords(RecordRules),
    AnswerOptions(OptionsRules),
}

impl FieldShape {
    pub fn describe(&self) -> &'static str {
        match self {
            Self::Text(_) => "text",
            Self::BoundedInteger(_) => "bounded integer",
            Self::StringList(_) => "string list",
            Self::ScoredRecords(_) => "scored records",
            Self::AnswerOptions(_) => "answer options",
        }
    }

    /// Initial value for a fresh state.
    pub fn empty_value(&self) -> FieldValue {
        match self {
            Self::Text(_) => FieldValue::Text(String::new()),
            Self::BoundedInteger(_) => FieldValue::Integer(None),
            Self::StringList(_) => FieldValue::StringList(Vec::new()),
            Self::ScoredRecords(_) => FieldValue::Records(Vec::new()),
            Self::AnswerOptions(_) => FieldValue::Options(Default::default()),
        }
    }
}

/// One field a generator fills from a reply.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldSpec {
    /// Key of the field in the generation state
    pub name: String,
    pub labels: LabelPair,
    pub shape: FieldShape,
    /// Keep only names present in the canonical vocabulary
    #[serde(default)]
    pub whitelist: bool,
    /// Compare the list as a set when detecting convergence
    #[serde(default)]
    pub compare_as_set: bool,
}

impl FieldSpec {
    pub fn new(name: impl Into<String>, labels: LabelPair, shape: FieldShape) -> Self {
        Self {
            name: name.into(),
            labels,
            shape,
            whitelist: false,
            compare_as_set: false,
        }
    }

    pub fn whitelisted(mut self) -> Self {
        self.whitelist = true;
        self
    }

    pub fn compared_as_set(mut self) -> Self {
        self.compare_as_set = true;
        self
    }

    pub fn score_meaning(&self) -> Option<ScoreMeaning> {
        match self.shape {
            FieldShape::ScoredRecords(rules) => Some(rules.meaning),
            _ => None,
        }
    }
}
