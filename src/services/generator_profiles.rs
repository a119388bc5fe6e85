//! Named bundles of field specs, one per kind of generated content.

use serde::Serialize;

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{
    EngineConfig, FieldShape, FieldSpec, LabelPair, ListRules, OptionsRules, RecordRules,
    ScoreMeaning, ScoreRange, TextRules,
};

/// A generator: which fields one reply fills.
#[derive(Debug, Clone, Serialize)]
pub struct GeneratorProfile {
    pub name: &'static str,
    pub description: &'static str,
    pub fields: Vec<FieldSpec>,
}

impl GeneratorProfile {
    /// Whether any field is filtered against a canonical vocabulary.
    pub fn needs_vocabulary(&self) -> bool {
        self.fields.iter().any(|f| f.whitelist)
    }

    pub fn field(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|f| f.name == name)
    }
}

const PARAGRAPH: TextRules = TextRules {
    single_paragraph: true,
    latex_guard: true,
    strip_answer_markers: false,
};

const FREE_TEXT: TextRules = TextRules {
    single_paragraph: false,
    latex_guard: false,
    strip_answer_markers: false,
};

fn scored(meaning: ScoreMeaning) -> FieldShape {
    FieldShape::ScoredRecords(RecordRules {
        meaning,
        range: Some(ScoreRange::PERCENT),
    })
}

fn subtopic_references() -> FieldSpec {
    FieldSpec::new(
        "outputSubtopics",
        LabelPair::prefixed("subtopics"),
        FieldShape::StringList(ListRules {
            limit: None,
            strip_metadata: true,
            latex_guard: true,
        }),
    )
    .whitelisted()
    .compared_as_set()
}

/// All built-in profiles, parametrized by engine limits.
#[derive(Debug, Clone, Serialize)]
#[serde(transparent)]
pub struct ProfileCatalog {
    profiles: Vec<GeneratorProfile>,
}

impl ProfileCatalog {
    pub fn new(config: &EngineConfig) -> Self {
        let profiles = vec![
            GeneratorProfile {
                name: "subtopics",
                description: "Subtopics of a topic with their importance",
                fields: vec![FieldSpec::new(
                    "subtopics",
                    LabelPair::plain(),
                    scored(ScoreMeaning::Importance),
                )],
            },
            GeneratorProfile {
                name: "task",
                description: "Task statement plus the subtopics it exercises",
                fields: vec![
                    FieldSpec::new(
                        "text",
                        LabelPair::plain(),
                        FieldShape::Text(TextRules {
                            strip_answer_markers: true,
                            ..PARAGRAPH
                        }),
                    ),
                    subtopic_references(),
                ],
            },
            GeneratorProfile {
                name: "solution",
                description: "Worked solution of a task",
                fields: vec![FieldSpec::new(
                    "solution",
                    LabelPair::plain(),
                    FieldShape::Text(PARAGRAPH),
                )],
            },
            GeneratorProfile {
                name: "options",
                description: "Multiple-choice options and the correct index",
                fields: vec![FieldSpec::new(
                    "options",
                    LabelPair::plain(),
                    FieldShape::AnswerOptions(OptionsRules {
                        expected_count: config.expected_option_count,
                    }),
                )],
            },
            GeneratorProfile {
                name: "closed-subtopics",
                description: "Subtopics the learner got wrong, with their error rate",
                fields: vec![FieldSpec::new(
                    "outputSubtopics",
                    LabelPair::plain(),
                    scored(ScoreMeaning::ErrorRate),
                )
                .whitelisted()],
            },
            GeneratorProfile {
                name: "story",
                description: "Reading text with its translation",
                fields: vec![
                    FieldSpec::new("text", LabelPair::plain(), FieldShape::Text(FREE_TEXT)),
                    FieldSpec::new(
                        "translate",
                        LabelPair::prefixed("translate"),
                        FieldShape::Text(FREE_TEXT),
                    ),
                ],
            },
            GeneratorProfile {
                name: "questions",
                description: "Comprehension questions about a text",
                fields: vec![FieldSpec::new(
                    "questions",
                    LabelPair::plain(),
                    FieldShape::StringList(ListRules {
                        limit: Some(config.question_limit),
                        strip_metadata: false,
                        latex_guard: false,
                    }),
                )],
            },
            GeneratorProfile {
                name: "word-bank",
                description: "Vocabulary words with a usage note and frequency",
                fields: vec![
                    FieldSpec::new(
                        "words",
                        LabelPair::prefixed("words"),
                        FieldShape::StringList(ListRules {
                            limit: None,
                            strip_metadata: false,
                            latex_guard: false,
                        }),
                    )
                    .compared_as_set(),
                    FieldSpec::new(
                        "note",
                        LabelPair::prefixed("note"),
                        FieldShape::Text(PARAGRAPH),
                    ),
                    FieldSpec::new(
                        "frequency",
                        LabelPair::prefixed("frequency"),
                        FieldShape::BoundedInteger(ScoreRange::PERCENT),
                    ),
                ],
            },
        ];
        Self { profiles }
    }

    pub fn get(&self, name: &str) -> DomainResult<&GeneratorProfile> {
        self.profiles
            .iter()
            .find(|p| p.name == name)
            .ok_or_else(|| DomainError::UnknownProfile(name.to_string()))
    }

    pub fn iter(&self) -> impl Iterator<Item = &GeneratorProfile> {
        self.profiles.iter()
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.profiles.iter().map(|p| p.name).collect()
    }
}

impl Default for ProfileCatalog {
    fn default() -> Self {
        Self::new(&EngineConfig::default())
    }
}
