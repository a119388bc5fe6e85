//! CLI command implementations and the file handling they share.

pub mod config;
pub mod format;
pub mod parse;
pub mod plan;
pub mod profiles;
pub mod run;

use anyhow::{Context, Result};
use clap::Args;
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::cli::output::{single_line, truncate, CommandOutput};
use crate::cli::table::list_table;
use crate::domain::models::{CanonicalVocabulary, FieldValue, GenerationState};
use crate::services::generation_engine::vocabulary_from_state;
use crate::services::GeneratorProfile;

/// Read a text input, where `-` means standard input.
pub fn read_input(path: &Path) -> Result<String> {
    if path.as_os_str() == "-" {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .context("Failed to read from stdin")?;
        return Ok(buf);
    }
    std::fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))
}

/// Load a saved state, or start a fresh one for `profile` when `path` is
/// absent or does not exist yet.
pub fn load_state(path: Option<&Path>, profile: &GeneratorProfile) -> Result<GenerationState> {
    match path {
        Some(path) if path.exists() => {
            let raw = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read state {}", path.display()))?;
            let state: GenerationState = serde_json::from_str(&raw)
                .with_context(|| format!("Invalid state file {}", path.display()))?;
            debug!(path = %path.display(), attempt = state.attempt, "state loaded");
            Ok(state)
        }
        _ => {
            let state = GenerationState::for_fields(&profile.fields);
            info!(session_id = %state.session_id, profile = profile.name, "starting a new session");
            Ok(state)
        }
    }
}

pub fn save_state<S: serde::Serialize>(path: &Path, state: &S) -> Result<()> {
    let body = serde_json::to_string_pretty(state).context("Failed to serialize state")?;
    std::fs::write(path, body)
        .with_context(|| format!("Failed to write state {}", path.display()))?;
    debug!(path = %path.display(), "state saved");
    Ok(())
}

/// Where the canonical subtopic names come from.
#[derive(Args, Debug, Default)]
pub struct VocabularyArgs {
    /// File of canonical names: a JSON array of strings or one name per line
    #[arg(long, conflicts_with = "vocabulary_state")]
    pub vocabulary: Option<PathBuf>,

    /// Saved state whose field supplies the canonical names
    #[arg(long)]
    pub vocabulary_state: Option<PathBuf>,

    /// Field of the vocabulary state to read names from
    #[arg(long, default_value = "subtopics")]
    pub vocabulary_field: String,
}

impl VocabularyArgs {
    pub fn load(&self) -> Result<CanonicalVocabulary> {
        if let Some(path) = &self.vocabulary {
            let raw = read_input(path)?;
            return Ok(parse_vocabulary(&raw));
        }
        if let Some(path) = &self.vocabulary_state {
            let raw = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read state {}", path.display()))?;
            let state: GenerationState = serde_json::from_str(&raw)
                .with_context(|| format!("Invalid state file {}", path.display()))?;
            return vocabulary_from_state(&state, &self.vocabulary_field)
                .context("Failed to take vocabulary from state");
        }
        Ok(CanonicalVocabulary::default())
    }
}

/// Accept either a JSON array of names or plain lines.
pub fn parse_vocabulary(raw: &str) -> CanonicalVocabulary {
    if let Ok(names) = serde_json::from_str::<Vec<String>>(raw) {
        return CanonicalVocabulary::new(names);
    }
    CanonicalVocabulary::new(raw.lines().map(str::trim).filter(|l| !l.is_empty()))
}

/// A state as printed by `parse` and `run`.
#[derive(Debug, serde::Serialize)]
pub struct StateOutput {
    pub profile: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub outcome: Option<&'static str>,
    pub state: GenerationState,
}

fn render_value(value: &FieldValue) -> String {
    match value {
        FieldValue::Text(text) => single_line(text),
        FieldValue::Integer(Some(n)) => n.to_string(),
        FieldValue::Integer(None) => "-".to_string(),
        FieldValue::StringList(items) => items.join(", "),
        FieldValue::Records(records) => records
            .iter()
            .map(|r| format!("{} ({})", r.name, r.score))
            .collect::<Vec<_>>()
            .join(", "),
        FieldValue::Options(opts) => {
            let correct = opts
                .correct_index
                .map_or_else(|| "?".to_string(), |i| i.to_string());
            format!("{} [correct: {correct}]", opts.options.join(" | "))
        }
    }
}

impl CommandOutput for StateOutput {
    fn to_human(&self) -> String {
        let state = &self.state;
        let mut lines = vec![format!(
            "Session {} ({}): attempt {}, {}",
            state.session_id, self.profile, state.attempt, state.changed
        )];
        if let Some(outcome) = self.outcome {
            lines.push(format!("Outcome: {outcome}"));
        }

        let mut table = list_table(&["field", "shape", "value"]);
        for (name, value) in &state.fields {
            table.add_row(vec![
                name.clone(),
                value.shape_name().to_string(),
                truncate(&render_value(value), 100),
            ]);
        }
        lines.push(String::new());
        lines.push(table.to_string());

        if state.errors.is_empty() {
            lines.push("\nNo diagnostics.".to_string());
        } else {
            lines.push(format!("\n{} diagnostic(s):", state.errors.len()));
            for diagnostic in &state.errors {
                lines.push(format!("  [{}] {}", diagnostic.kind, diagnostic.message));
            }
        }
        lines.join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::Record;
    use crate::services::ProfileCatalog;
    use std::io::Write;
    use tempfile::{NamedTempFile, TempDir};

    #[test]
    fn test_parse_vocabulary_json_and_lines() {
        let json = parse_vocabulary(r#"["Linear", "Quadratic"]"#);
        assert_eq!(json.names(), ["Linear", "Quadratic"]);

        let lines = parse_vocabulary("Linear\n\n  Quadratic \n");
        assert_eq!(lines.names(), ["Linear", "Quadratic"]);
    }

    #[test]
    fn test_load_state_missing_file_starts_fresh() {
        let dir = TempDir::new().unwrap();
        let catalog = ProfileCatalog::default();
        let profile = catalog.get("subtopics").unwrap();

        let path = dir.path().join("state.json");
        let state = load_state(Some(path.as_path()), profile).unwrap();
        assert_eq!(state.attempt, 0);
        assert!(state.fields.contains_key("subtopics"));
    }

    #[test]
    fn test_save_then_load_state() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("state.json");
        let catalog = ProfileCatalog::default();
        let profile = catalog.get("subtopics").unwrap();

        let mut state = GenerationState::for_fields(&profile.fields);
        state.attempt = 3;
        save_state(&path, &state).unwrap();

        let loaded = load_state(Some(path.as_path()), profile).unwrap();
        assert_eq!(loaded.attempt, 3);
        assert_eq!(loaded.session_id, state.session_id);
    }

    #[test]
    fn test_load_state_rejects_garbage() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "not json").unwrap();
        let catalog = ProfileCatalog::default();
        let profile = catalog.get("subtopics").unwrap();

        assert!(load_state(Some(file.path()), profile).is_err());
    }

    #[test]
    fn test_vocabulary_from_saved_state() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("subtopics.json");
        let state = GenerationState::new().with_field(
            "subtopics",
            FieldValue::Records(vec![Record::new("Linear", 40), Record::new("Quadratic", 60)]),
        );
        save_state(&path, &state).unwrap();

        let args = VocabularyArgs {
            vocabulary: None,
            vocabulary_state: Some(path),
            vocabulary_field: "subtopics".to_string(),
        };
        let vocabulary = args.load().unwrap();
        assert!(vocabulary.contains("Quadratic"));
        assert_eq!(vocabulary.len(), 2);
    }

    #[test]
    fn test_state_output_human() {
        let state = GenerationState::new()
            .with_field("subtopics", FieldValue::Records(vec![Record::new("A", 30)]));
        let out = StateOutput {
            profile: "subtopics".to_string(),
            outcome: None,
            state,
        };
        let human = out.to_human();
        assert!(human.contains("A (30)"));
        assert!(human.contains("No diagnostics."));
    }
}
