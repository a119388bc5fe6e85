//! State of a format-driven generation.
//!
//! The prompt ends with a format line such as
//! `{subtopics_output}@@{summary_output}`; the reply fills each placeholder
//! with a part separated by `@@`, and a part holding `|` is a list.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

use super::diagnostic::Diagnostic;
use super::generation::ChangeFlag;

/// Value of one format key. Serialized as a bare string or array.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FormatValue {
    List(Vec<String>),
    Text(String),
}

impl FormatValue {
    pub fn render(&self) -> String {
        match self {
            Self::List(items) => items.join(" | "),
            Self::Text(text) => text.clone(),
        }
    }
}

/// Snapshot of a format-driven session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormatState {
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
    pub values: BTreeMap<String, FormatValue>,
}

impl Default for FormatState {
    fn default() -> Self {
        Self::new()
    }
}

impl FormatState {
    pub fn new() -> Self {
        Self {
            session_id: Uuid::new_v4(),
            changed: ChangeFlag::Pending,
            attempt: 0,
            errors: Vec::new(),
            values: BTreeMap::new(),
        }
    }

    pub fn with_value(mut self, key: impl Into<String>, value: FormatValue) -> Self {
        self.values.insert(key.into(), value);
        self
    }

    pub fn value(&self, key: &str) -> Option<&FormatValue> {
        self.values.get(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_values_deserialize_untagged() {
        let state: FormatState =
            serde_json::from_str(r#"{"attempt":2,"values":{"topics":["a","b"],"note":"x"}}"#)
                .unwrap();
        assert_eq!(state.attempt, 2);
        assert!(state.changed.is_pending());
        assert_eq!(
            state.value("topics"),
            Some(&FormatValue::List(vec!["a".into(), "b".into()]))
        );
        assert_eq!(state.value("note"), Some(&FormatValue::Text("x".into())));
    }

    #[test]
    fn test_render() {
        assert_eq!(FormatValue::List(vec!["a".into(), "b".into()]).render(), "a | b");
        assert_eq!(FormatValue::Text("x".into()).render(), "x");
    }
}
