use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Canonical display name for every speaker id seen in the corpus
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IdentityMap {
    names: BTreeMap<String, String>,
}

impl IdentityMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, speaker_id: impl Into<String>, name: impl Into<String>) {
        self.names.insert(speaker_id.into(), name.into());
    }

    /// Canonical name for a speaker id, if it was ever observed
    pub fn get(&self, speaker_id: &str) -> Option<&str> {
        self.names.get(speaker_id).map(String::as_str)
    }

    pub fn contains(&self, speaker_id: &str) -> bool {
        self.names.contains_key(speaker_id)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.names.iter().map(|(id, name)| (id.as_str(), name.as_str()))
    }
}

impl FromIterator<(String, String)> for IdentityMap {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        Self {
            names: iter.into_iter().collect(),
        }
    }
}

/// A speaker id that appeared under more than one display name
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AliasedIdentity {
    pub speaker_id: String,
    /// Every observed name with its count, in first-seen order
    pub name_counts: Vec<(String, usize)>,
    /// The name chosen for this id
    pub canonical: String,
}
