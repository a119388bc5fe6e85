use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Ordered, read-only set of names a generator may reference.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<String>", into = "Vec<String>")]
pub struct CanonicalVocabulary {
    names: Vec<String>,
    #[serde(skip)]
    index: HashSet<String>,
}

impl CanonicalVocabulary {
    /// Build from names, keeping the first occurrence of each.
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut vocabulary = Self::default();
        for name in names {
            let name = name.into();
            if vocabulary.index.insert(name.clone()) {
                vocabulary.names.push(name);
            }
        }
        vocabulary
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains(name)
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

impl From<Vec<String>> for CanonicalVocabulary {
    fn from(names: Vec<String>) -> Self {
        Self::new(names)
    }
}

impl From<CanonicalVocabulary> for Vec<String> {
    fn from(vocabulary: CanonicalVocabulary) -> Self {
        vocabulary.names
    }
}
