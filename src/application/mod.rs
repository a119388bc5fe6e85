pub mod generation_orchestrator;

pub use generation_orchestrator::{AttemptOutcome, AttemptState, GenerationOrchestrator};
