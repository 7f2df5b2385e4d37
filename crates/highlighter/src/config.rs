//! Run configuration
//!
//! Everything a run needs beyond the document: mode, the ordered pattern
//! list, marker markup, style and trigger URLs. Loaded from JSON; any field
//! left out falls back to the built-in default.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{HighlightError, Result};
use crate::highlight::{HighlightOptions, RunMode};
use crate::keywords::default_patterns;
use crate::trigger::TriggerSet;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StyleConfig {
    pub background_color: String,
    pub bold: bool,
}

impl Default for StyleConfig {
    fn default() -> Self {
        Self {
            background_color: "yellow".to_string(),
            bold: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HighlighterConfig {
    pub mode: RunMode,
    /// Application order
    pub patterns: Vec<String>,
    pub marker_tag: String,
    pub marker_class: String,
    pub container_tag: String,
    pub excluded_tags: Vec<String>,
    pub style: StyleConfig,
    pub triggers: TriggerSet,
}

impl Default for HighlighterConfig {
    fn default() -> Self {
        let options = HighlightOptions::default();
        Self {
            mode: RunMode::default(),
            patterns: default_patterns(),
            marker_tag: options.marker_tag,
            marker_class: options.marker_class,
            container_tag: options.container_tag,
            excluded_tags: options.excluded_tags,
            style: StyleConfig::default(),
            triggers: TriggerSet::default(),
        }
    }
}

impl HighlighterConfig {
    /// Parse and validate a JSON document
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Read a JSON config file
    pub fn load(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    /// Reject values that would produce broken markup or CSS
    pub fn validate(&self) -> Result<()> {
        if !is_css_identifier(&self.marker_class) {
            return Err(HighlightError::Config(format!(
                "marker_class {:?} is not a CSS class name",
                self.marker_class
            )));
        }

        for tag in [&self.marker_tag, &self.container_tag]
            .into_iter()
            .chain(self.excluded_tags.iter())
        {
            if !is_tag_name(tag) {
                return Err(HighlightError::Config(format!(
                    "{:?} is not a tag name",
                    tag
                )));
            }
        }

        let color = &self.style.background_color;
        if color.trim().is_empty() || color.contains(|c: char| matches!(c, ';' | '{' | '}')) {
            return Err(HighlightError::Config(format!(
                "background_color {:?} is not a CSS color",
                color
            )));
        }

        Ok(())
    }

    pub fn highlight_options(&self) -> HighlightOptions {
        HighlightOptions {
            marker_tag: self.marker_tag.clone(),
            marker_class: self.marker_class.clone(),
            container_tag: self.container_tag.clone(),
            excluded_tags: self.excluded_tags.clone(),
            background_color: self.style.background_color.clone(),
            bold: self.style.bold,
        }
    }
}

/// Read a pattern list: a JSON array of regex sources
pub fn load_patterns(path: &Path) -> Result<Vec<String>> {
    let json = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&json)?)
}

fn is_css_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) if first.is_ascii_alphabetic() || first == '_' || first == '-' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
}

fn is_tag_name(name: &str) -> bool {
    name.chars()
        .next()
        .map(|c| c.is_ascii_alphabetic())
        .unwrap_or(false)
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == ':')
}
