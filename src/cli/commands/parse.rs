//! `edugen parse`: replay a stored reply through one attempt, offline.

use anyhow::Result;
use clap::Args;
use std::path::PathBuf;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::warn;

use crate::adapters::substrates::ScriptedSource;
use crate::application::GenerationOrchestrator;
use crate::cli::commands::{load_state, read_input, save_state, StateOutput, VocabularyArgs};
use crate::cli::output::output;
use crate::domain::models::Config;
use crate::services::ProfileCatalog;

#[derive(Args, Debug)]
pub struct ParseArgs {
    /// Generator profile (see `edugen profiles`)
    #[arg(long)]
    pub profile: String,

    /// Reply text file, or `-` for stdin
    #[arg(short, long)]
    pub reply: PathBuf,

    /// State from the previous attempt; a fresh state is used if missing
    #[arg(short, long)]
    pub state: Option<PathBuf>,

    /// Write the new state here
    #[arg(short, long)]
    pub out: Option<PathBuf>,

    #[command(flatten)]
    pub vocabulary: VocabularyArgs,
}

pub async fn execute(args: ParseArgs, config: &Config, json_mode: bool) -> Result<()> {
    let catalog = ProfileCatalog::new(&config.engine);
    let profile = catalog.get(&args.profile)?;
    let previous = load_state(args.state.as_deref(), profile)?;
    let vocabulary = args.vocabulary.load()?;
    if profile.needs_vocabulary() && vocabulary.is_empty() {
        warn!(
            profile = profile.name,
            "no canonical vocabulary given, whitelisted fields keep their previous values"
        );
    }

    let reply = read_input(&args.reply)?;
    let source = ScriptedSource::from_replies([reply]);
    let orchestrator = GenerationOrchestrator::new(Arc::new(source), &config.engine);
    let outcome = orchestrator
        .advance(profile, previous, "", &vocabulary, &CancellationToken::new())
        .await;

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
    use crate::domain::errors::DomainError;
    use crate::domain::models::{ChangeFlag, DiagnosticKind, GenerationState};
    use std::io::Write;
    use tempfile::{NamedTempFile, TempDir};

    fn args(reply: PathBuf, state: Option<PathBuf>, out: Option<PathBuf>) -> ParseArgs {
        ParseArgs {
            profile: "subtopics".to_string(),
            reply,
            state,
            out,
            vocabulary: VocabularyArgs::default(),
        }
    }

    fn read_state(path: &std::path::Path) -> GenerationState {
        serde_json::from_str(&std::fs::read_to_string(path).unwrap()).unwrap()
    }

    #[tokio::test]
    async fn test_parse_threads_state_through_files() {
        let dir = TempDir::new().unwrap();
        let state_path = dir.path().join("state.json");
        let mut reply = NamedTempFile::new().unwrap();
        write!(reply, "Start:\nA;30\nB;50\nEnd:").unwrap();

        let config = Config::default();
        for _ in 0..2 {
            execute(
                args(
                    reply.path().to_path_buf(),
                    Some(state_path.clone()),
                    Some(state_path.clone()),
                ),
                &config,
                true,
            )
            .await
            .unwrap();
        }

        let state = read_state(&state_path);
        assert_eq!(state.attempt, 2);
        assert_eq!(state.changed, ChangeFlag::Converged);

        // A converged state is left alone.
        execute(
            args(
                reply.path().to_path_buf(),
                Some(state_path.clone()),
                Some(state_path.clone()),
            ),
            &config,
            true,
        )
        .await
        .unwrap();
        assert_eq!(read_state(&state_path).attempt, 2);
    }

    #[tokio::test]
    async fn test_parse_blank_reply_becomes_diagnostic() {
        let dir = TempDir::new().unwrap();
        let out = dir.path().join("state.json");
        let mut reply = NamedTempFile::new().unwrap();
        write!(reply, "   \n").unwrap();

        execute(args(reply.path().to_path_buf(), None, Some(out.clone())), &Config::default(), true)
            .await
            .unwrap();

        let state = read_state(&out);
        assert_eq!(state.attempt, 1);
        assert_eq!(state.changed, ChangeFlag::Pending);
        assert_eq!(state.errors.len(), 1);
        assert_eq!(state.errors[0].kind, DiagnosticKind::UnexpectedParseFailure);
    }

    #[tokio::test]
    async fn test_parse_unknown_profile() {
        let reply = NamedTempFile::new().unwrap();
        let mut parse_args = args(reply.path().to_path_buf(), None, None);
        parse_args.profile = "nope".to_string();

        let err = execute(parse_args, &Config::default(), true).await.unwrap_err();
        assert!(matches!(
            err.downcast_ref::<DomainError>(),
            Some(DomainError::UnknownProfile(_))
        ));
    }
}
