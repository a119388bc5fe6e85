pub mod config;
pub mod diagnostic;
pub mod field;
pub mod format;
pub mod generation;
pub mod vocabulary;

pub use config::{Config, EngineConfig, LoggingConfig, SubstrateConfig};
pub use diagnostic::{Diagnostic, DiagnosticKind, ErrorLog, LatexLocation, ParseIssue};
pub use field::{
    FieldShape, FieldSpec, LabelPair, ListRules, OptionsRules, RecordRules, ScoreMeaning,
    ScoreRange, TextRules,
};
pub use format::{FormatState, FormatValue};
pub use generation::{
    AnswerOptions, AttemptDiagnostics, ChangeFlag, FieldValue, GenerationState, Record,
};
pub use vocabulary::CanonicalVocabulary;
