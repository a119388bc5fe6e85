//! edugen - structured educational content from free-form model replies
//!
//! A generator asks a language model for content (subtopics with weights,
//! task statements, answer options, reading texts) and receives loosely
//! formatted text. edugen extracts the labelled blocks, validates each field,
//! filters names against a canonical vocabulary and decides when repeated
//! attempts have converged.
//!
//! # Architecture
//!
//! - **Domain Layer** (`domain`): generation state, field descriptors,
//!   diagnostics and the reply-source port
//! - **Service Layer** (`services`): extraction, validation, whitelisting,
//!   convergence and the stateless engine
//! - **Application Layer** (`application`): the attempt loop around a reply source
//! - **Adapters** (`adapters`): HTTP and scripted reply sources
//! - **Infrastructure Layer** (`infrastructure`): configuration and logging
//! - **CLI Layer** (`cli`): command-line interface
//!
//! # Example
//!
//! ```
//! use edugen::services::generation_engine;
//! use edugen::{CanonicalVocabulary, GenerationState, ProfileCatalog};
//!
//! let catalog = ProfileCatalog::default();
//! let profile = catalog.get("subtopics").unwrap();
//! let state = GenerationState::for_fields(&profile.fields);
//!
//! let reply = "Start:\nFractions;40\nDecimals;60\nEnd:";
//! let next = generation_engine::apply(profile, &state, reply, &CanonicalVocabulary::default())
//!     .unwrap();
//! assert_eq!(next.attempt, 1);
//! assert!(next.errors.is_empty());
//! ```

pub mod adapters;
pub mod application;
pub mod cli;
pub mod domain;
pub mod infrastructure;
pub mod services;

// Re-export commonly used types for convenience
pub use application::{AttemptOutcome, AttemptState, GenerationOrchestrator};
pub use domain::models::{
    CanonicalVocabulary, ChangeFlag, Config, Diagnostic, DiagnosticKind, EngineConfig, FieldSpec,
    FieldValue, FormatState, FormatValue, GenerationState, LoggingConfig, Record, SubstrateConfig,
};
pub use domain::ports::{ReplySource, SubstrateError};
pub use domain::{DomainError, DomainResult};
pub use infrastructure::config::{ConfigError, ConfigLoader};
pub use services::{GeneratorProfile, OutputFormat, ProfileCatalog};
