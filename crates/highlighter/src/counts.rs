//! Per-pattern tallies
//!
//! Each `count`/`highlight` call returns a plain number; the caller folds
//! it in here. Nothing accumulates behind the caller's back.

use ahash::AHashMap;
use serde::{Deserialize, Serialize};

/// One pattern's tally
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatternCount {
    pub pattern: String,
    pub count: usize,
}

/// Ordered mapping pattern source → count
///
/// Iteration follows first-insertion order. Recording the same source twice
/// adds to the existing entry.
#[derive(Debug, Clone, Default)]
pub struct MatchCounts {
    entries: Vec<PatternCount>,
    index: AHashMap<String, usize>,
}

impl MatchCounts {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one result into the tally
    pub fn record(&mut self, pattern: &str, count: usize) {
        match self.index.get(pattern) {
            Some(&slot) => self.entries[slot].count += count,
            None => {
                self.index.insert(pattern.to_string(), self.entries.len());
                self.entries.push(PatternCount {
                    pattern: pattern.to_string(),
                    count,
                });
            }
        }
    }

    pub fn get(&self, pattern: &str) -> Option<usize> {
        self.index.get(pattern).map(|&slot| self.entries[slot].count)
    }

    pub fn iter(&self) -> impl Iterator<Item = &PatternCount> {
        self.entries.iter()
    }

    /// Entries with at least one match
    pub fn nonzero(&self) -> impl Iterator<Item = &PatternCount> {
        self.entries.iter().filter(|entry| entry.count > 0)
    }

    pub fn total(&self) -> usize {
        self.entries.iter().map(|entry| entry.count).sum()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Merge another tally into this one
    pub fn merge(&mut self, other: &MatchCounts) {
        for entry in other.iter() {
            self.record(&entry.pattern, entry.count);
        }
    }

    /// `"<pattern>": <n> time(s)` for every nonzero entry, in order
    pub fn log_lines(&self) -> Vec<String> {
        self.nonzero()
            .map(|entry| format!("\"{}\": {} time(s)", entry.pattern, entry.count))
            .collect()
    }
}

impl PartialEq for MatchCounts {
    fn eq(&self, other: &Self) -> bool {
        self.entries == other.entries
    }
}

impl Eq for MatchCounts {}

impl Serialize for MatchCounts {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.entries.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for MatchCounts {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let entries = Vec::<PatternCount>::deserialize(deserializer)?;
        Ok(entries
            .into_iter()
            .map(|entry| (entry.pattern, entry.count))
            .collect())
    }
}

impl<S: Into<String>> FromIterator<(S, usize)> for MatchCounts {
    fn from_iter<I: IntoIterator<Item = (S, usize)>>(iter: I) -> Self {
        let mut counts = MatchCounts::new();
        for (pattern, count) in iter {
            counts.record(&pattern.into(), count);
        }
        counts
    }
}
