//! Case-insensitive header sets.
//!
//! Header keys must be unique ignoring ASCII case within any single map.
//! The set keeps original key spelling and insertion order for output, and
//! compares case-insensitively everywhere else -- one abstraction instead of
//! lowercase-then-compare logic scattered per call site.

use crate::error::SpecError;

/// An insertion-ordered header map with case-insensitive keys.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HeaderSet {
    entries: Vec<(String, String)>,
}

impl HeaderSet {
    pub fn new() -> Self {
        HeaderSet::default()
    }

    /// Build a set from key/value pairs, rejecting case-insensitive
    /// duplicates.
    pub fn from_pairs<I>(pairs: I) -> Result<Self, SpecError>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let mut set = HeaderSet::new();
        for (name, value) in pairs {
            if set.get(&name).is_some() {
                return Err(SpecError::DuplicateHeader { name });
            }
            set.entries.push((name, value));
        }
        Ok(set)
    }

    /// Case-insensitive lookup.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Insert or replace, matching existing keys case-insensitively.
    /// A replaced entry keeps its position but takes the new spelling.
    pub fn set(&mut self, name: &str, value: &str) {
        for entry in &mut self.entries {
            if entry.0.eq_ignore_ascii_case(name) {
                entry.0 = name.to_string();
                entry.1 = value.to_string();
                return;
            }
        }
        self.entries.push((name.to_string(), value.to_string()));
    }

    /// Overlay `other` on top of this set; overlay entries win.
    pub fn merge(&self, other: &HeaderSet) -> HeaderSet {
        let mut merged = self.clone();
        for (name, value) in &other.entries {
            merged.set(name, value);
        }
        merged
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

// ──────────────────────────────────────────────
// Tests
// ──────────────────────────────────────────────
