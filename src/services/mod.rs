pub mod convergence_detector;
pub mod delimiter_extractor;
pub mod field_parsers;
pub mod format_parser;
pub mod generation_engine;
pub mod generator_profiles;
pub mod latex_guard;
pub mod plan_outline;
pub mod record_tokenizer;
pub mod whitelist_filter;

pub use format_parser::{FormatSlot, OutputFormat};
pub use generator_profiles::{GeneratorProfile, ProfileCatalog};
pub use plan_outline::{parse_plan, PlanSection};
