//! Decides whether another attempt can still change anything.
//!
//! List order carries no meaning, so lists are sorted (and collapsed to sets
//! for set-compared fields) before comparison. Diagnostics are compared as
//! sorted message lists.

use std::collections::BTreeMap;

use crate::domain::models::diagnostic::sorted_messages;
use crate::domain::models::{ChangeFlag, Diagnostic, FieldSpec, FieldValue, Record};

/// Order-insensitive view of a field value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Normalized {
    Text(String),
    Integer(Option<i64>),
    Items(Vec<String>),
    Records(Vec<Record>),
    /// Sorted options plus the text of the correct one
    Options(Vec<String>, Option<String>),
}

fn sorted<T: Ord + Clone>(items: &[T], as_set: bool) -> Vec<T> {
    let mut items = items.to_vec();
    items.sort();
    if as_set {
        items.dedup();
    }
    items
}

pub fn normalize(value: &FieldValue, as_set: bool) -> Normalized {
    match value {
        FieldValue::Text(text) => Normalized::Text(text.clone()),
        FieldValue::Integer(value) => Normalized::Integer(*value),
        FieldValue::StringList(items) => Normalized::Items(sorted(items, as_set)),
        FieldValue::Records(records) => Normalized::Records(sorted(records, as_set)),
        FieldValue::Options(options) => Normalized::Options(
            sorted(&options.options, as_set),
            options.correct_option().map(str::to_string),
        ),
    }
}

/// Whether every described field is equal after normalization.
pub fn fields_unchanged(
    specs: &[FieldSpec],
    previous: &BTreeMap<String, FieldValue>,
    next: &BTreeMap<String, FieldValue>,
) -> bool {
    specs.iter().all(|spec| {
        match (previous.get(&spec.name), next.get(&spec.name)) {
            (Some(a), Some(b)) => {
                normalize(a, spec.compare_as_set) == normalize(b, spec.compare_as_set)
            }
            (None, None) => true,
            _ => false,
        }
    })
}

pub fn errors_unchanged(previous: &[Diagnostic], next: &[Diagnostic]) -> bool {
    sorted_messages(previous) == sorted_messages(next)
}

/// `Converged` when fields and diagnostics match the previous attempt,
/// `Pending` otherwise.
pub fn detect(
    specs: &[FieldSpec],
    previous_fields: &BTreeMap<String, FieldValue>,
    previous_errors: &[Diagnostic],
    next_fields: &BTreeMap<String, FieldValue>,
    next_errors: &[Diagnostic],
) -> ChangeFlag {
    if fields_unchanged(specs, previous_fields, next_fields)
        && errors_unchanged(previous_errors, next_errors)
    {
        ChangeFlag::Converged
    } else {
        ChangeFlag::Pending
    }
}
