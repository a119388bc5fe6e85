//! Common test utilities for integration tests
//!
//! Shared builders for profiles, states and scripted orchestrators.

#![allow(dead_code)]

use std::sync::Arc;

use edugen::adapters::substrates::ScriptedSource;
use edugen::{
    CanonicalVocabulary, EngineConfig, FieldValue, GenerationOrchestrator, GenerationState,
    ProfileCatalog, Record,
};

/// Reply used by the end-to-end scenarios: one duplicate line, two records.
pub const DUPLICATE_REPLY: &str = "Start:\nA;30\nA;30\nB;50\nEnd:";

/// Setup test logging
///
/// Initializes a tracing subscriber that writes through the test harness.
pub fn setup_test_logging() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::DEBUG)
        .try_init();
}

pub fn catalog() -> ProfileCatalog {
    ProfileCatalog::default()
}

pub fn records(pairs: &[(&str, i64)]) -> Vec<Record> {
    pairs.iter().map(|(n, s)| Record::new(*n, *s)).collect()
}

/// A state holding only a `subtopics` record list.
pub fn subtopics_state(pairs: &[(&str, i64)], attempt: u32) -> GenerationState {
    let mut state =
        GenerationState::new().with_field("subtopics", FieldValue::Records(records(pairs)));
    state.attempt = attempt;
    state
}

pub fn vocabulary(names: &[&str]) -> CanonicalVocabulary {
    CanonicalVocabulary::new(names.iter().copied())
}

/// Orchestrator over a scripted source; the source is returned for call counting.
pub fn scripted_orchestrator(
    source: ScriptedSource,
    max_attempts: u32,
) -> (GenerationOrchestrator, ScriptedSource) {
    let config = EngineConfig {
        max_attempts,
        ..EngineConfig::default()
    };
    (
        GenerationOrchestrator::new(Arc::new(source.clone()), &config),
        source,
    )
}
