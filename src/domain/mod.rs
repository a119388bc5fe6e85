//! Domain layer for the edugen generation engine
//!
//! This module contains the generation-state model, field descriptors,
//! diagnostics and the reply-source port.

pub mod errors;
pub mod models;
pub mod ports;

// Re-export error types for convenient access
pub use errors::{DomainError, DomainResult};
