//! The synchronous core: one reply in, one new state out.
//!
//! Within an attempt every field runs extraction, validation and then
//! whitelist filtering, in that order. The engine holds no state and can be
//! called concurrently for independent sessions.

use std::collections::BTreeMap;
use tracing::{debug, info};

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{
    CanonicalVocabulary, ErrorLog, FieldShape, FieldSpec, FieldValue, GenerationState,
};
use crate::services::convergence_detector;
use crate::services::field_parsers;
use crate::services::generator_profiles::GeneratorProfile;
use crate::services::whitelist_filter;

/// Parse one field of a reply against its previous value.
pub fn parse_field(
    spec: &FieldSpec,
    previous: &FieldValue,
    reply: &str,
    vocabulary: &CanonicalVocabulary,
    log: &mut ErrorLog,
) -> DomainResult<FieldValue> {
    let field = spec.name.as_str();
    let value = match (&spec.shape, previous) {
        (FieldShape::ScoredRecords(rules), FieldValue::Records(prev)) => {
            let parsed = field_parsers::parse_records(field, prev, reply, &spec.labels, rules, log);
            let parsed = if spec.whitelist {
                whitelist_filter::filter(prev, parsed, vocabulary, log)
            } else {
                parsed
            };
            FieldValue::Records(parsed)
        }
        (FieldShape::StringList(rules), FieldValue::StringList(prev)) => {
            let parsed =
                field_parsers::parse_string_list(field, prev, reply, &spec.labels, rules, log);
            let parsed = if spec.whitelist {
                whitelist_filter::filter(prev, parsed, vocabulary, log)
            } else {
                parsed
            };
            FieldValue::StringList(parsed)
        }
        (FieldShape::Text(rules), FieldValue::Text(prev)) => FieldValue::Text(
            field_parsers::parse_text(field, prev, reply, &spec.labels, rules, log),
        ),
        (FieldShape::BoundedInteger(range), FieldValue::Integer(prev)) => FieldValue::Integer(
            field_parsers::parse_bounded_integer(field, *prev, reply, &spec.labels, range, log),
        ),
        (FieldShape::AnswerOptions(rules), FieldValue::Options(prev)) => FieldValue::Options(
            field_parsers::parse_answer_options(field, prev, reply, &spec.labels, rules, log),
        ),
        (shape, found) => {
            return Err(DomainError::FieldShapeMismatch {
                field: spec.name.clone(),
                expected: shape.describe(),
                found: found.shape_name(),
            });
        }
    };
    Ok(value)
}

/// Run every field of `profile` over `reply` and decide convergence.
///
/// Fields absent from `previous` start from their shape's empty value. The
/// attempt counter is always incremented; `changed` becomes `Converged` only
/// when fields and diagnostics match the previous attempt.
pub fn apply(
    profile: &GeneratorProfile,
    previous: &GenerationState,
    reply: &str,
    vocabulary: &CanonicalVocabulary,
) -> DomainResult<GenerationState> {
    let mut log = ErrorLog::new();
    let mut fields: BTreeMap<String, FieldValue> = previous.fields.clone();

    for spec in &profile.fields {
        let prev = previous
            .fields
            .get(&spec.name)
            .cloned()
            .unwrap_or_else(|| spec.shape.empty_value());
        let value = parse_field(spec, &prev, reply, vocabulary, &mut log)?;
        debug!(field = %spec.name, shape = spec.shape.describe(), "field parsed");
        fields.insert(spec.name.clone(), value);
    }

    let errors = log.into_entries();
    let changed = convergence_detector::detect(
        &profile.fields,
        &previous.fields,
        &previous.errors,
        &fields,
        &errors,
    );

    let mut next = previous.clone();
    next.fields = fields;
    next.attempt = previous.attempt.saturating_add(1);
    next.changed = changed;
    next.record_attempt(next.attempt, errors);

    info!(
        session_id = %next.session_id,
        profile = profile.name,
        attempt = next.attempt,
        diagnostics = next.errors.len(),
        changed = %next.changed,
        "attempt applied"
    );
    Ok(next)
}

/// Canonical vocabulary taken from the names of a state field.
pub fn vocabulary_from_state(
    state: &GenerationState,
    field: &str,
) -> DomainResult<CanonicalVocabulary> {
    let value = state.field(field).ok_or_else(|| DomainError::MissingField {
        field: field.to_string(),
    })?;
    match value {
        FieldValue::Records(_) | FieldValue::StringList(_) => {
            Ok(CanonicalVocabulary::new(value.names()))
        }
        other => Err(DomainError::FieldShapeMismatch {
            field: field.to_string(),
            expected: "scored records",
            found: other.shape_name(),
        }),
    }
}
