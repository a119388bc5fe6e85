//! Canonical-vocabulary filtering.

use crate::domain::models::{CanonicalVocabulary, ErrorLog, ParseIssue, Record};

/// Anything that is looked up in a vocabulary by name.
pub trait Named {
    fn name(&self) -> &str;
}

impl Named for Record {
    fn name(&self) -> &str {
        &self.name
    }
}

impl Named for String {
    fn name(&self) -> &str {
        self
    }
}

/// Keep only candidates whose name is in the vocabulary, logging one
/// diagnostic per rejected entry. An empty result yields `previous` instead.
pub fn filter<T: Named + Clone>(
    previous: &[T],
    candidates: Vec<T>,
    vocabulary: &CanonicalVocabulary,
    log: &mut ErrorLog,
) -> Vec<T> {
    let mut kept = Vec::with_capacity(candidates.len());
    for candidate in candidates {
        if vocabulary.contains(candidate.name()) {
            kept.push(candidate);
        } else {
            log.record(ParseIssue::UnknownVocabularyEntry {
                name: candidate.name().to_string(),
            });
        }
    }
    if kept.is_empty() {
        return previous.to_vec();
    }
    kept
}
