//! Port trait definitions (Hexagonal Architecture)
//!
//! - ReplySource: the model-invocation collaborator that turns a rendered
//!   prompt into raw reply text
//!
//! The engine never talks to a model directly; adapters implement this port
//! and are injected into the orchestrator per request.

pub mod reply_source;

pub use reply_source::{non_blank, ReplySource, SubstrateError};
