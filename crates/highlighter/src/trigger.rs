//! Trigger - which documents a run applies to
//!
//! Responsibilities:
//! - Hold the URL glob list a document must match before it is processed
//! - Turn local file paths into `file://` URLs so both kinds match the same way
//! - Support `*` wildcards anywhere in a pattern

use serde::{Deserialize, Serialize};
use std::path::Path;
use url::Url;

use crate::error::{HighlightError, Result};

/// Local filings saved under a `10K` directory
pub const LOCAL_FILINGS_PATTERN: &str = "file:///*/10K/*";

/// Filings served from the SEC EDGAR archive
pub const EDGAR_ARCHIVE_PATTERN: &str = "https://www.sec.gov/Archives/edgar/data/*";

/// URL glob list
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TriggerSet {
    patterns: Vec<String>,
}

impl Default for TriggerSet {
    fn default() -> Self {
        Self::new(vec![
            LOCAL_FILINGS_PATTERN.to_string(),
            EDGAR_ARCHIVE_PATTERN.to_string(),
        ])
    }
}

impl TriggerSet {
    pub fn new(patterns: Vec<String>) -> Self {
        Self { patterns }
    }

    pub fn patterns(&self) -> &[String] {
        &self.patterns
    }

    /// Check if a URL is covered by any pattern
    ///
    /// Unparsable URLs never match.
    pub fn matches(&self, url: &str) -> bool {
        let parsed = match Url::parse(url) {
            Ok(p) => p,
            Err(_) => return false,
        };

        self.patterns
            .iter()
            .any(|pattern| Self::matches_pattern(parsed.as_str(), pattern))
    }

    /// Check if a local file is covered
    pub fn matches_path(&self, path: &Path) -> bool {
        match file_url(path) {
            Ok(url) => self.matches(url.as_str()),
            Err(_) => false,
        }
    }

    /// Glob match where `*` spans any run of characters, `/` included
    fn matches_pattern(url: &str, pattern: &str) -> bool {
        if !pattern.contains('*') {
            return url == pattern;
        }

        let parts: Vec<&str> = pattern.split('*').collect();
        let (first, rest) = match parts.split_first() {
            Some(split) => split,
            None => return false,
        };
        let (last, middle) = match rest.split_last() {
            Some(split) => split,
            None => return url == *first,
        };

        if !url.starts_with(first) || url.len() < first.len() + last.len() {
            return false;
        }

        // Leftmost placement for each middle piece leaves the most room for the rest
        let end = url.len() - last.len();
        let mut cursor = first.len();
        for piece in middle {
            match url[cursor..end].find(piece) {
                Some(offset) => cursor += offset + piece.len(),
                None => return false,
            }
        }

        url.ends_with(last)
    }
}

/// `file://` URL for a path; relative paths resolve against the working directory
pub fn file_url(path: &Path) -> Result<Url> {
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()?.join(path)
    };

    Url::from_file_path(&absolute).map_err(|_| {
        HighlightError::Config(format!("cannot express {} as a file URL", absolute.display()))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_triggers() {
        let triggers = TriggerSet::default();

        assert!(triggers.matches("file:///home/analyst/10K/AAPL/2024-11-01.html"));
        assert!(triggers.matches(
            "https://www.sec.gov/Archives/edgar/data/0000320193/000032019324000123/aapl-20240928.htm"
        ));
        assert!(!triggers.matches("file:///home/analyst/10Q/AAPL/2024.html"));
        assert!(!triggers.matches("https://www.sec.gov/cgi-bin/browse-edgar"));
        assert!(!triggers.matches("not a url"));
    }

    #[test]
    fn test_pattern_shapes() {
        assert!(TriggerSet::matches_pattern("https://a.test/x", "https://a.test/x"));
        assert!(!TriggerSet::matches_pattern("https://a.test/y", "https://a.test/x"));
        assert!(TriggerSet::matches_pattern("https://a.test/x/y.htm", "*.htm"));
        assert!(TriggerSet::matches_pattern("https://a.test/x/y.htm", "https://*/x/*.htm"));
        assert!(!TriggerSet::matches_pattern("https://a.test/x/y.html", "https://*/x/*.htm"));
        // Prefix and suffix must not overlap
        assert!(!TriggerSet::matches_pattern("ab", "ab*b"));
    }

    #[test]
    fn test_local_paths() {
        let triggers = TriggerSet::default();
        assert!(triggers.matches_path(Path::new("/data/10K/MSFT/2023-07-27.html")));
        assert!(!triggers.matches_path(Path::new("/data/reports/MSFT.html")));
    }

    #[test]
    fn test_custom_set_serializes_as_list() {
        let triggers = TriggerSet::new(vec!["file:///*".to_string()]);
        let json = serde_json::to_string(&triggers).unwrap();
        assert_eq!(json, "[\"file:///*\"]");
        assert!(triggers.matches("file:///anything.html"));
    }
}
