//! End-to-end tests for the generation engine across profiles.

mod common;

use edugen::domain::models::{AnswerOptions, DiagnosticKind, ErrorLog};
use edugen::services::generation_engine;
use edugen::{CanonicalVocabulary, ChangeFlag, FieldValue, GenerationState};

use common::{catalog, records, subtopics_state, vocabulary, DUPLICATE_REPLY};

fn count(state: &GenerationState, kind: DiagnosticKind) -> usize {
    ErrorLog::from(state.errors.clone()).count_kind(kind)
}

#[test]
fn test_first_attempt_drops_duplicate_and_stays_pending() {
    common::setup_test_logging();
    let catalog = catalog();
    let profile = catalog.get("subtopics").unwrap();
    let previous = subtopics_state(&[], 0);

    let no_vocabulary = CanonicalVocabulary::default();
    let next =
        generation_engine::apply(profile, &previous, DUPLICATE_REPLY, &no_vocabulary).unwrap();

    assert_eq!(
        next.field("subtopics"),
        Some(&FieldValue::Records(records(&[("A", 30), ("B", 50)])))
    );
    assert_eq!(next.errors.len(), 1);
    assert_eq!(count(&next, DiagnosticKind::DuplicateRemoved), 1);
    assert_eq!(next.changed, ChangeFlag::Pending);
    assert_eq!(next.attempt, 1);
}

#[test]
fn test_resubmitted_reply_converges() {
    let catalog = catalog();
    let profile = catalog.get("subtopics").unwrap();
    let empty = CanonicalVocabulary::default();

    let first = generation_engine::apply(profile, &subtopics_state(&[], 0), DUPLICATE_REPLY, &empty)
        .unwrap();
    let second = generation_engine::apply(profile, &first, DUPLICATE_REPLY, &empty).unwrap();

    assert_eq!(second.field("subtopics"), first.field("subtopics"));
    assert_eq!(second.changed, ChangeFlag::Converged);
    assert_eq!(second.attempt, 2);
    assert_eq!(second.history.len(), 2);
    assert_eq!(second.session_id, first.session_id);
}

#[test]
fn test_reordered_records_still_converge() {
    let catalog = catalog();
    let profile = catalog.get("subtopics").unwrap();
    let empty = CanonicalVocabulary::default();

    let fresh = subtopics_state(&[], 0);
    let first =
        generation_engine::apply(profile, &fresh, "Start:\nA;30\nB;50\nEnd:", &empty).unwrap();
    let second =
        generation_engine::apply(profile, &first, "Start:\nB;50\nA;30\nEnd:", &empty).unwrap();

    assert_eq!(second.changed, ChangeFlag::Converged);
}

#[test]
fn test_missing_label_keeps_previous_records() {
    let catalog = catalog();
    let profile = catalog.get("subtopics").unwrap();
    let previous = subtopics_state(&[("Fractions", 60)], 3);

    let next = generation_engine::apply(
        profile,
        &previous,
        "Here are the subtopics:\nDecimals;40\nEnd:",
        &CanonicalVocabulary::default(),
    )
    .unwrap();

    assert_eq!(
        next.field("subtopics"),
        Some(&FieldValue::Records(records(&[("Fractions", 60)])))
    );
    assert_eq!(count(&next, DiagnosticKind::MissingStartLabel), 1);
    assert_eq!(next.attempt, 4);
    assert!(next.changed.is_pending());
}

#[test]
fn test_every_line_rejected_never_regresses() {
    let catalog = catalog();
    let profile = catalog.get("subtopics").unwrap();
    let previous = subtopics_state(&[("Fractions", 60)], 1);

    let next = generation_engine::apply(
        profile,
        &previous,
        "Start:\nDecimals; 40\nPercent;40%\nNegative;-5\nEnd:",
        &CanonicalVocabulary::default(),
    )
    .unwrap();

    assert_eq!(
        next.field("subtopics"),
        Some(&FieldValue::Records(records(&[("Fractions", 60)])))
    );
    assert!(count(&next, DiagnosticKind::MalformedRecord) >= 3);
}

#[test]
fn test_latex_braces_survive_record_split() {
    let catalog = catalog();
    let profile = catalog.get("subtopics").unwrap();

    let next = generation_engine::apply(
        profile,
        &subtopics_state(&[], 0),
        "Start:\nSolving $\\frac{a;b}{c}$ equations;70\nEnd:",
        &CanonicalVocabulary::default(),
    )
    .unwrap();

    assert_eq!(
        next.field("subtopics"),
        Some(&FieldValue::Records(records(&[("Solving $\\frac{a;b}{c}$ equations", 70)])))
    );
    assert!(next.errors.is_empty());
}

#[test]
fn test_task_profile_whitelists_references() {
    let catalog = catalog();
    let profile = catalog.get("task").unwrap();
    let previous = GenerationState::for_fields(&profile.fields);
    let reply = "Start:\nA) Solve $x^2 = 4$ for real $x$.\nEnd:\n\
                 subtopicsStart:\nQuadratic equations;60\nTrigonometry;40\nsubtopicsEnd:";

    let next = generation_engine::apply(
        profile,
        &previous,
        reply,
        &vocabulary(&["Linear equations", "Quadratic equations"]),
    )
    .unwrap();

    assert_eq!(
        next.field("text"),
        Some(&FieldValue::Text("Solve $x^2 = 4$ for real $x$.".to_string()))
    );
    assert_eq!(
        next.field("outputSubtopics"),
        Some(&FieldValue::StringList(vec!["Quadratic equations".to_string()]))
    );
    assert_eq!(count(&next, DiagnosticKind::UnknownVocabularyEntry), 1);
}

#[test]
fn test_task_profile_rejects_forbidden_environment() {
    let catalog = catalog();
    let profile = catalog.get("task").unwrap();
    let previous = GenerationState::for_fields(&profile.fields)
        .with_field("text", FieldValue::Text("Old statement.".to_string()));
    let reply = "Start:\nCompute $\\begin{align} x &= 1 \\end{align}$.\nEnd:";

    let no_vocabulary = CanonicalVocabulary::default();
    let next = generation_engine::apply(profile, &previous, reply, &no_vocabulary).unwrap();

    assert_eq!(
        next.field("text"),
        Some(&FieldValue::Text("Old statement.".to_string()))
    );
    assert_eq!(count(&next, DiagnosticKind::ForbiddenLatexEnvironment), 1);
}

#[test]
fn test_closed_subtopics_filters_unknown_names() {
    let catalog = catalog();
    let profile = catalog.get("closed-subtopics").unwrap();
    let previous = GenerationState::for_fields(&profile.fields);

    let next = generation_engine::apply(
        profile,
        &previous,
        "Start:\nFractions;20\nAstrology;80\nEnd:",
        &vocabulary(&["Fractions", "Decimals"]),
    )
    .unwrap();

    assert_eq!(
        next.field("outputSubtopics"),
        Some(&FieldValue::Records(records(&[("Fractions", 20)])))
    );
    assert_eq!(count(&next, DiagnosticKind::UnknownVocabularyEntry), 1);
}

#[test]
fn test_options_profile() {
    let catalog = catalog();
    let profile = catalog.get("options").unwrap();
    let previous = GenerationState::for_fields(&profile.fields);

    let next = generation_engine::apply(
        profile,
        &previous,
        "Start:\n$x = 1$\n$x = 2$\n$x = 3$\n$x = 4$\n1\nEnd:",
        &CanonicalVocabulary::default(),
    )
    .unwrap();

    match next.field("options") {
        Some(FieldValue::Options(AnswerOptions {
            options,
            correct_index,
        })) => {
            assert_eq!(options.len(), 4);
            assert_eq!(*correct_index, Some(1));
        }
        other => panic!("expected options, got {other:?}"),
    }
    assert!(next.errors.is_empty());
}

#[test]
fn test_word_bank_profile_fills_all_fields() {
    let catalog = catalog();
    let profile = catalog.get("word-bank").unwrap();
    let previous = GenerationState::for_fields(&profile.fields);
    let reply = "wordsStart:\napple\npear\nwordsEnd:\n\
                 noteStart:\nCommon fruit nouns.\nnoteEnd:\n\
                 frequencyStart:\n85\nfrequencyEnd:";

    let no_vocabulary = CanonicalVocabulary::default();
    let next = generation_engine::apply(profile, &previous, reply, &no_vocabulary).unwrap();

    assert_eq!(
        next.field("words"),
        Some(&FieldValue::StringList(vec!["apple".to_string(), "pear".to_string()]))
    );
    assert_eq!(
        next.field("note"),
        Some(&FieldValue::Text("Common fruit nouns.".to_string()))
    );
    assert_eq!(next.field("frequency"), Some(&FieldValue::Integer(Some(85))));
    assert!(next.errors.is_empty());
}

#[test]
fn test_shape_mismatch_is_structural_error() {
    let catalog = catalog();
    let profile = catalog.get("subtopics").unwrap();
    let previous =
        GenerationState::new().with_field("subtopics", FieldValue::Text("oops".to_string()));

    let err = generation_engine::apply(
        profile,
        &previous,
        DUPLICATE_REPLY,
        &CanonicalVocabulary::default(),
    )
    .unwrap_err();
    assert!(err.to_string().contains("subtopics"));
}
