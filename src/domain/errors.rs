//! Domain errors for the edugen generation engine.
//!
//! Expected validation failures are never surfaced through these types; they
//! become [`crate::domain::models::ParseIssue`] diagnostics. `DomainError` is
//! reserved for structural failures that the orchestrator catches at its
//! boundary and converts into an `UnexpectedParseFailure` diagnostic.

use thiserror::Error;

use crate::domain::ports::SubstrateError;

/// Structural failures that can occur while advancing a generation state.
#[derive(Debug, Error)]
pub enum DomainError {
    #[error("Field '{field}' is missing from the generation state")]
    MissingField { field: String },

    #[error("Field '{field}' holds a {found} value but the profile expects {expected}")]
    FieldShapeMismatch {
        field: String,
        expected: &'static str,
        found: &'static str,
    },

    #[error("Unknown generator profile: {0}")]
    UnknownProfile(String),

    #[error("Prompt has no format line with {{placeholder}} slots")]
    FormatLineMissing,

    #[error("Reply has {found} '@@' parts but the format line has {expected} slots")]
    FormatPartCount { found: usize, expected: usize },

    #[error("Reply source returned no content")]
    EmptyReply,

    #[error("Reply source failed: {0}")]
    ReplySource(#[from] SubstrateError),

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

pub type DomainResult<T> = Result<T, DomainError>;

impl From<serde_json::Error> for DomainError {
    fn from(err: serde_json::Error) -> Self {
        DomainError::SerializationError(err.to_string())
    }
}
