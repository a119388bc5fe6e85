//! Reply source adapter implementations.

pub mod openai_compat;
pub mod scripted;

pub use openai_compat::OpenAiCompatSource;
pub use scripted::{ScriptedReply, ScriptedSource};
