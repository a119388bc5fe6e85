//! `edugen format`: fold an `@@`-separated reply into a format-driven state.

use anyhow::{Context, Result};
use clap::Args;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::adapters::substrates::ScriptedSource;
use crate::application::GenerationOrchestrator;
use crate::cli::commands::{read_input, save_state};
use crate::cli::output::{output, truncate, CommandOutput};
use crate::cli::table::list_table;
use crate::domain::models::{Config, FormatState};
use crate::services::OutputFormat;

#[derive(Args, Debug)]
pub struct FormatArgs {
    /// Prompt file; its last line with `{placeholder}` slots is the format line
    #[arg(short, long)]
    pub prompt: PathBuf,

    /// Reply text file, or `-` for stdin
    #[arg(short, long)]
    pub reply: PathBuf,

    /// State from the previous attempt; a fresh state is used if missing
    #[arg(short, long)]
    pub state: Option<PathBuf>,

    /// Write the new state here
    #[arg(short, long)]
    pub out: Option<PathBuf>,
}

fn load_format_state(path: Option<&Path>) -> Result<FormatState> {
    match path {
        Some(path) if path.exists() => {
            let raw = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read state {}", path.display()))?;
            let state: FormatState = serde_json::from_str(&raw)
                .with_context(|| format!("Invalid state file {}", path.display()))?;
            debug!(path = %path.display(), attempt = state.attempt, "format state loaded");
            Ok(state)
        }
        _ => {
            let state = FormatState::new();
            info!(session_id = %state.session_id, "starting a new format session");
            Ok(state)
        }
    }
}

#[derive(Debug, Serialize)]
pub struct FormatOutput {
    pub format: String,
    pub outcome: &'static str,
    pub state: FormatState,
}

impl CommandOutput for FormatOutput {
    fn to_human(&self) -> String {
        let state = &self.state;
        let mut lines = vec![
            format!(
                "Session {}: attempt {}, {}",
                state.session_id, state.attempt, state.changed
            ),
            format!("Outcome: {}", self.outcome),
            format!("Format: {}", self.format),
        ];

        let mut table = list_table(&["key", "value"]);
        for (key, value) in &state.values {
            table.add_row(vec![key.clone(), truncate(&value.render(), 100)]);
        }
        lines.push(String::new());
        lines.push(table.to_string());

        for diagnostic in &state.errors {
            lines.push(format!("  [{}] {}", diagnostic.kind, diagnostic.message));
        }
        lines.join("\n")
    }
}

pub async fn execute(args: FormatArgs, config: &Config, json_mode: bool) -> Result<()> {
    let prompt = read_input(&args.prompt)?;
    let format = OutputFormat::from_prompt(&prompt)?;
    let previous = load_format_state(args.state.as_deref())?;

    let reply = read_input(&args.reply)?;
    let source = ScriptedSource::from_replies([reply]);
    let orchestrator = GenerationOrchestrator::new(Arc::new(source), &config.engine);
    let outcome = orchestrator
        .advance_format(&format, previous, &prompt, &CancellationToken::new())
        .await;

    let label = outcome.label();
    let state = outcome.into_state();
    if let Some(path) = &args.out {
        save_state(path, &state)?;
    }

    output(
        &FormatOutput {
            format: format.line().to_string(),
            outcome: label,
            state,
        },
        json_mode,
    );
    Ok(())
}
