//! `edugen run`: request replies from the configured model endpoint.

use anyhow::{Context, Result};
use clap::Args;
use std::path::PathBuf;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::adapters::substrates::OpenAiCompatSource;
use crate::application::GenerationOrchestrator;
use crate::cli::commands::{load_state, read_input, save_state, StateOutput, VocabularyArgs};
use crate::cli::output::output;
use crate::domain::models::{Config, GenerationState};
use crate::services::ProfileCatalog;

#[derive(Args, Debug)]
pub struct RunArgs {
    /// Generator profile (see `edugen profiles`)
    #[arg(long)]
    pub profile: String,

    /// Prompt text file, or `-` for stdin
    #[arg(short, long)]
    pub prompt: PathBuf,

    /// State from the previous attempt; a fresh state is used if missing
    #[arg(short, long)]
    pub state: Option<PathBuf>,

    /// Write the resulting state here
    #[arg(short, long)]
    pub out: Option<PathBuf>,

    /// Keep requesting replies until the state converges or the attempt ceiling is hit
    #[arg(long)]
    pub until_stable: bool,

    /// Do not append the previous attempt's diagnostics to the prompt
    #[arg(long)]
    pub no_feedback: bool,

    #[command(flatten)]
    pub vocabulary: VocabularyArgs,
}

/// The prompt for the next attempt, with the last attempt's diagnostics
/// appended so the model can correct them.
pub fn render_prompt(base: &str, state: &GenerationState, feedback: bool) -> String {
    if !feedback || state.errors.is_empty() {
        return base.to_string();
    }
    let mut prompt = base.trim_end().to_string();
    prompt.push_str("\n\nYour previous answer had these problems, fix them:\n");
    for diagnostic in &state.errors {
        prompt.push_str("- ");
        prompt.push_str(&diagnostic.message);
        prompt.push('\n');
    }
    prompt
}

pub async fn execute(args: RunArgs, config: &Config, json_mode: bool) -> Result<()> {
    let catalog = ProfileCatalog::new(&config.engine);
    let profile = catalog.get(&args.profile)?;
    let previous = load_state(args.state.as_deref(), profile)?;
    let vocabulary = args.vocabulary.load()?;
    let base_prompt = read_input(&args.prompt)?;

    let source = OpenAiCompatSource::new(config.substrate.clone())
        .context("Failed to configure the model endpoint")?;
    let orchestrator = GenerationOrchestrator::new(Arc::new(source), &config.engine);

    let cancel = CancellationToken::new();
    let signal_token = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("interrupt received, cancelling pending request");
            signal_token.cancel();
        }
    });

    let feedback = !args.no_feedback;
    let outcome = if args.until_stable {
        orchestrator
            .run_until_stable(
                profile,
                previous,
                |state| render_prompt(&base_prompt, state, feedback),
                &vocabulary,
                &cancel,
            )
            .await
    } else {
        let prompt = render_prompt(&base_prompt, &previous, feedback);
        orchestrator
            .advance(profile, previous, &prompt, &vocabulary, &cancel)
            .await
    };
    info!(outcome = outcome.label(), attempt = outcome.state().attempt, "run finished");

    let label = outcome.label();
    let state = outcome.into_state();
    if let Some(path) = &args.out {
        save_state(path, &state)?;
    }

    output(
        &StateOutput {
            profile: profile.name.to_string(),
            outcome: Some(label),
            state,
        },
        json_mode,
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::{Diagnostic, DiagnosticKind};
    use std::io::Write;
    use tempfile::{NamedTempFile, TempDir};

    #[test]
    fn test_render_prompt_without_errors_is_unchanged() {
        let state = GenerationState::new();
        assert_eq!(render_prompt("List subtopics.", &state, true), "List subtopics.");
    }

    #[test]
    fn test_render_prompt_appends_diagnostics() {
        let mut state = GenerationState::new();
        state.errors = vec![Diagnostic {
            kind: DiagnosticKind::MissingStartLabel,
            message: "Missing label 'Start:'".to_string(),
        }];

        let prompt = render_prompt("List subtopics.\n", &state, true);
        assert!(prompt.starts_with("List subtopics.\n\n"));
        assert!(prompt.contains("- Missing label 'Start:'"));

        assert_eq!(render_prompt("List subtopics.", &state, false), "List subtopics.");
    }

    #[tokio::test]
    async fn test_run_against_mock_endpoint_until_stable() {
        let mut server = mockito::Server::new_async().await;
        let body = serde_json::json!({
            "choices": [{"message": {"role": "assistant", "content": "Start:\nA;30\nB;50\nEnd:"}}]
        });
        let mock = server
            .mock("POST", "/chat/completions")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(body.to_string())
            .expect(2)
            .create_async()
            .await;

        let mut prompt = NamedTempFile::new().unwrap();
        write!(prompt, "List subtopics of algebra.").unwrap();
        let dir = TempDir::new().unwrap();
        let out = dir.path().join("state.json");

        let mut config = Config::default();
        config.substrate.base_url = server.url();
        config.substrate.api_key = Some("test-key".to_string());

        let args = RunArgs {
            profile: "subtopics".to_string(),
            prompt: prompt.path().to_path_buf(),
            state: None,
            out: Some(out.clone()),
            until_stable: true,
            no_feedback: false,
            vocabulary: VocabularyArgs::default(),
        };
        execute(args, &config, true).await.unwrap();
        mock.assert_async().await;

        let state: GenerationState =
            serde_json::from_str(&std::fs::read_to_string(&out).unwrap()).unwrap();
        assert_eq!(state.attempt, 2);
        assert!(state.changed.is_stopped());
    }
}
