//! Case-insensitive keyword patterns
//!
//! A `Pattern` keeps its source string next to the compiled regex so counts
//! and log lines can be keyed by exactly what the user wrote.

use regex::{Regex, RegexBuilder};
use std::fmt;

use crate::error::{HighlightError, Result};

/// Compiled case-insensitive pattern
#[derive(Debug, Clone)]
pub struct Pattern {
    source: String,
    regex: Regex,
}

impl Pattern {
    /// Compile a pattern source; invalid syntax is a `HighlightError::Pattern`
    pub fn new(source: &str) -> Result<Self> {
        let regex = RegexBuilder::new(source)
            .case_insensitive(true)
            .build()
            .map_err(|e| HighlightError::Pattern {
                pattern: source.to_string(),
                source: e,
            })?;

        Ok(Self {
            source: source.to_string(),
            regex,
        })
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    /// Byte ranges of every non-overlapping, non-empty match, left to right
    ///
    /// Zero-length matches (`\b`, `x*` on "abc") are not occurrences.
    pub fn match_ranges(&self, text: &str) -> Vec<(usize, usize)> {
        self.regex
            .find_iter(text)
            .filter(|m| !m.is_empty())
            .map(|m| (m.start(), m.end()))
            .collect()
    }

    /// Number of non-overlapping, non-empty matches
    pub fn count_in(&self, text: &str) -> usize {
        self.regex.find_iter(text).filter(|m| !m.is_empty()).count()
    }
}

impl fmt::Display for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}
