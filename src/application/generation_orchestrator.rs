//! GenerationOrchestrator - one attempt of a generation session
//!
//! Wraps the synchronous engines with the async concerns around them:
//! - Attempt ceiling enforced before any model call
//! - Model call raced against a cancellation token
//! - Structural failures folded into the diagnostic log

use std::sync::Arc;
use tokio::select;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use uuid::Uuid;

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{
    CanonicalVocabulary, ChangeFlag, Diagnostic, EngineConfig, FormatState, GenerationState,
    ParseIssue,
};
use crate::domain::ports::{non_blank, ReplySource};
use crate::services::format_parser::{self, OutputFormat};
use crate::services::generation_engine;
use crate::services::generator_profiles::GeneratorProfile;

/// Attempt bookkeeping shared by every session state the orchestrator drives.
pub trait AttemptState {
    fn session_id(&self) -> Uuid;
    fn attempt(&self) -> u32;
    fn changed(&self) -> ChangeFlag;
    fn set_changed(&mut self, changed: ChangeFlag);
    /// Spend an attempt that produced nothing but `diagnostic`.
    fn fail_attempt(&mut self, diagnostic: Diagnostic);
}

impl AttemptState for GenerationState {
    fn session_id(&self) -> Uuid {
        self.session_id
    }

    fn attempt(&self) -> u32 {
        self.attempt
    }

    fn changed(&self) -> ChangeFlag {
        self.changed
    }

    fn set_changed(&mut self, changed: ChangeFlag) {
        self.changed = changed;
    }

    fn fail_attempt(&mut self, diagnostic: Diagnostic) {
        self.attempt = self.attempt.saturating_add(1);
        self.changed = ChangeFlag::Pending;
        self.record_attempt(self.attempt, vec![diagnostic]);
    }
}

impl AttemptState for FormatState {
    fn session_id(&self) -> Uuid {
        self.session_id
    }

    fn attempt(&self) -> u32 {
        self.attempt
    }

    fn changed(&self) -> ChangeFlag {
        self.changed
    }

    fn set_changed(&mut self, changed: ChangeFlag) {
        self.changed = changed;
    }

    fn fail_attempt(&mut self, diagnostic: Diagnostic) {
        self.attempt = self.attempt.saturating_add(1);
        self.changed = ChangeFlag::Pending;
        self.errors = vec![diagnostic];
    }
}

/// Result of one attempt.
#[derive(Debug, Clone, PartialEq)]
pub enum AttemptOutcome<S = GenerationState> {
    /// The state was already stopped; nothing was done.
    Skipped(S),
    /// The attempt ceiling was exceeded; no model call was made.
    Exhausted(S),
    /// The caller cancelled while waiting for the model; nothing was committed.
    Cancelled(S),
    /// A reply (or a failure) was processed into a new state.
    Completed(S),
}

impl<S> AttemptOutcome<S> {
    pub fn state(&self) -> &S {
        match self {
            Self::Skipped(s) | Self::Exhausted(s) | Self::Cancelled(s) | Self::Completed(s) => s,
        }
    }

    pub fn into_state(self) -> S {
        match self {
            Self::Skipped(s) | Self::Exhausted(s) | Self::Cancelled(s) | Self::Completed(s) => s,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Skipped(_) => "skipped",
            Self::Exhausted(_) => "exhausted",
            Self::Cancelled(_) => "cancelled",
            Self::Completed(_) => "completed",
        }
    }
}

/// Drives attempts of a session against an injected reply source.
pub struct GenerationOrchestrator {
    source: Arc<dyn ReplySource>,
    max_attempts: u32,
}

impl GenerationOrchestrator {
    pub fn new(source: Arc<dyn ReplySource>, config: &EngineConfig) -> Self {
        Self {
            source,
            max_attempts: config.max_attempts,
        }
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Perform at most one model call and fold the reply into `previous`.
    pub async fn advance(
        &self,
        profile: &GeneratorProfile,
        previous: GenerationState,
        prompt: &str,
        vocabulary: &CanonicalVocabulary,
        cancel: &CancellationToken,
    ) -> AttemptOutcome {
        self.run_attempt(previous, prompt, cancel, |state, reply| {
            generation_engine::apply(profile, state, reply, vocabulary)
        })
        .await
    }

    /// Format-driven variant of [`Self::advance`]: the reply fills the
    /// `@@` slots of `format`.
    pub async fn advance_format(
        &self,
        format: &OutputFormat,
        previous: FormatState,
        prompt: &str,
        cancel: &CancellationToken,
    ) -> AttemptOutcome<FormatState> {
        self.run_attempt(previous, prompt, cancel, |state, reply| {
            format_parser::apply(format, state, reply)
        })
        .await
    }

    /// Keep calling [`Self::advance`] while the state is pending.
    ///
    /// `render_prompt` sees the latest state, so diagnostics of the previous
    /// attempt can be fed back to the model.
    pub async fn run_until_stable<F>(
        &self,
        profile: &GeneratorProfile,
        initial: GenerationState,
        render_prompt: F,
        vocabulary: &CanonicalVocabulary,
        cancel: &CancellationToken,
    ) -> AttemptOutcome
    where
        F: Fn(&GenerationState) -> String,
    {
        let mut state = initial;
        loop {
            let prompt = render_prompt(&state);
            match self.advance(profile, state, &prompt, vocabulary, cancel).await {
                AttemptOutcome::Completed(next) if next.changed.is_pending() => {
                    state = next;
                }
                outcome => {
                    info!(
                        outcome = outcome.label(),
                        attempt = outcome.state().attempt,
                        changed = %outcome.state().changed,
                        "generation loop finished"
                    );
                    return outcome;
                }
            }
        }
    }

    async fn run_attempt<S, F>(
        &self,
        previous: S,
        prompt: &str,
        cancel: &CancellationToken,
        fold: F,
    ) -> AttemptOutcome<S>
    where
        S: AttemptState,
        F: FnOnce(&S, &str) -> DomainResult<S>,
    {
        if previous.changed().is_stopped() {
            return AttemptOutcome::Skipped(previous);
        }

        if previous.attempt() > self.max_attempts {
            warn!(
                session_id = %previous.session_id(),
                attempt = previous.attempt(),
                max_attempts = self.max_attempts,
                "attempt ceiling exceeded, stopping"
            );
            let mut stopped = previous;
            stopped.set_changed(ChangeFlag::Exhausted);
            return AttemptOutcome::Exhausted(stopped);
        }

        let reply = select! {
            biased;
            _ = cancel.cancelled() => {
                warn!(
                    session_id = %previous.session_id(),
                    source = self.source.name(),
                    "cancelled while awaiting reply"
                );
                return AttemptOutcome::Cancelled(previous);
            }
            reply = self.source.request_reply(prompt) => reply,
        };

        let result = reply
            .map_err(DomainError::from)
            .and_then(|text| non_blank(text).ok_or(DomainError::EmptyReply))
            .and_then(|text| fold(&previous, text.as_str()));

        match result {
            Ok(next) => AttemptOutcome::Completed(next),
            Err(err) => {
                warn!(
                    session_id = %previous.session_id(),
                    attempt = previous.attempt(),
                    error = %err,
                    "attempt failed, keeping previous values"
                );
                let mut next = previous;
                next.fail_attempt(Diagnostic::from(&ParseIssue::Unexpected(err.to_string())));
                AttemptOutcome::Completed(next)
            }
        }
    }
}
