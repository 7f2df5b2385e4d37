//! Highlighter - the text-node walk
//!
//! One operation, applied once per pattern in list order:
//!
//! ```text
//! <body> ─ pre-order walk ─┬─ text node    → highlight: wrap matches / count: tally
//!                          ├─ element      → descend into a snapshot of its children
//!                          │  (script/style excluded)
//!                          └─ anything else → ignored
//! ```
//!
//! Highlight mode replaces a matching text node with a container holding the
//! un-matched segments as text and each match inside a marker element. Later
//! patterns walk into containers and markers made by earlier ones, so a
//! substring can end up wrapped more than once. That is kept as-is.

use dom::utils::cap_text_length;
use dom::{Attribute, DomArena, DomError, DomNode, DomService, NodeId, NodeType};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, trace, warn};

use crate::counts::MatchCounts;
use crate::error::Result;
use crate::pattern::Pattern;
use crate::style::{install_style, StyleRule};

/// What a run does with matches
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunMode {
    /// Rewrite the tree and install the style rule
    #[default]
    Highlight,
    /// Tally matches, never touch the tree
    Count,
}

/// Markup knobs for the rewrite
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HighlightOptions {
    pub marker_tag: String,
    pub marker_class: String,
    pub container_tag: String,
    /// Elements whose subtrees are never scanned
    pub excluded_tags: Vec<String>,
    pub background_color: String,
    pub bold: bool,
}

impl Default for HighlightOptions {
    fn default() -> Self {
        Self {
            marker_tag: "span".to_string(),
            marker_class: "highlight".to_string(),
            container_tag: "span".to_string(),
            excluded_tags: vec!["script".to_string(), "style".to_string()],
            background_color: "yellow".to_string(),
            bold: true,
        }
    }
}

impl HighlightOptions {
    pub fn style_rule(&self) -> StyleRule {
        StyleRule {
            class_name: self.marker_class.clone(),
            background_color: self.background_color.clone(),
            bold: self.bold,
        }
    }
}

/// Result of one highlight pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct HighlightOutcome {
    /// Text nodes replaced by a container
    pub nodes_rewritten: usize,
    /// Marker elements created
    pub markers: usize,
    /// Nodes the walk could not read or rewrite
    pub skipped_nodes: usize,
}

/// A pattern a run could not apply
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedPattern {
    pub pattern: String,
    pub reason: String,
}

/// Everything a run produced
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub mode: RunMode,
    /// Count mode: matches per pattern. Highlight mode: markers per pattern.
    pub counts: MatchCounts,
    pub skipped_patterns: Vec<SkippedPattern>,
    pub skipped_nodes: usize,
    pub style_installed: bool,
}

impl RunReport {
    fn new(mode: RunMode) -> Self {
        Self {
            mode,
            counts: MatchCounts::new(),
            skipped_patterns: Vec::new(),
            skipped_nodes: 0,
            style_installed: false,
        }
    }

    /// Emit the per-pattern lines and the completion line
    pub fn log_summary(&self) {
        match self.mode {
            RunMode::Count => {
                for line in self.counts.log_lines() {
                    info!("{}", line);
                }
            }
            RunMode::Highlight => {
                info!(
                    markers = self.counts.total(),
                    patterns = self.counts.len(),
                    "Highlighted matches"
                );
            }
        }
        info!("Highlighter script executed.");
    }
}

/// The highlighter
#[derive(Debug, Clone, Default)]
pub struct Highlighter {
    options: HighlightOptions,
}

impl Highlighter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(options: HighlightOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &HighlightOptions {
        &self.options
    }

    /// Compile `source` and wrap every match in the document
    pub fn highlight(&self, doc: &mut DomService, source: &str) -> Result<HighlightOutcome> {
        let pattern = Pattern::new(source)?;
        Ok(self.highlight_pattern(doc, &pattern))
    }

    /// Compile `source` and count its matches in the document
    pub fn count(&self, doc: &DomService, source: &str) -> Result<usize> {
        let pattern = Pattern::new(source)?;
        Ok(self.count_pattern(doc, &pattern))
    }

    pub fn highlight_pattern(&self, doc: &mut DomService, pattern: &Pattern) -> HighlightOutcome {
        let mut outcome = HighlightOutcome::default();
        if let Some(start) = scan_root(doc) {
            self.highlight_tree(doc.arena_mut(), start, pattern, &mut outcome);
        }

        debug!(
            pattern = pattern.source(),
            nodes = outcome.nodes_rewritten,
            markers = outcome.markers,
            "Highlight pass done"
        );
        outcome
    }

    pub fn count_pattern(&self, doc: &DomService, pattern: &Pattern) -> usize {
        let count = match scan_root(doc) {
            Some(start) => self.count_tree(doc.arena(), start, pattern),
            None => 0,
        };

        debug!(pattern = pattern.source(), count, "Count pass done");
        count
    }

    /// Install the marker style rule (idempotent)
    pub fn install_style(&self, doc: &mut DomService) -> Result<NodeId> {
        Ok(install_style(doc, &self.options.style_rule())?)
    }

    /// Apply every pattern in order
    ///
    /// A pattern that does not compile is reported and skipped; the rest of
    /// the list still runs. Highlight mode installs the style once at the end.
    pub fn run<S: AsRef<str>>(&self, doc: &mut DomService, sources: &[S], mode: RunMode) -> RunReport {
        let mut report = RunReport::new(mode);

        for source in sources {
            let source = source.as_ref();
            let pattern = match Pattern::new(source) {
                Ok(pattern) => pattern,
                Err(e) => {
                    warn!("Skipping pattern: {}", e);
                    report.skipped_patterns.push(SkippedPattern {
                        pattern: source.to_string(),
                        reason: e.to_string(),
                    });
                    continue;
                }
            };

            match mode {
                RunMode::Highlight => {
                    let outcome = self.highlight_pattern(doc, &pattern);
                    report.counts.record(source, outcome.markers);
                    report.skipped_nodes += outcome.skipped_nodes;
                }
                RunMode::Count => {
                    let count = self.count_pattern(doc, &pattern);
                    report.counts.record(source, count);
                }
            }
        }

        if mode == RunMode::Highlight {
            match self.install_style(doc) {
                Ok(_) => report.style_installed = true,
                Err(e) => warn!("Failed to install highlight style: {}", e),
            }
        }

        report
    }

    /// Pre-order walk on an explicit stack; filings can nest deeper than
    /// the call stack allows
    fn highlight_tree(
        &self,
        arena: &mut DomArena,
        start: NodeId,
        pattern: &Pattern,
        outcome: &mut HighlightOutcome,
    ) {
        let mut pending = vec![start];

        while let Some(node_id) = pending.pop() {
            let node = match arena.get(node_id) {
                Ok(node) => node,
                Err(e) => {
                    skip_node(node_id, &e, outcome);
                    continue;
                }
            };

            match node.node_type {
                NodeType::Text => {
                    let ranges = pattern.match_ranges(&node.node_value);
                    if ranges.is_empty() {
                        continue;
                    }
                    let text = node.node_value.clone();
                    trace!(node_id, text = %cap_text_length(&text, 80), "Rewriting text node");

                    match self.rewrite_text(arena, node_id, &text, &ranges) {
                        Ok(markers) => {
                            outcome.nodes_rewritten += 1;
                            outcome.markers += markers;
                        }
                        Err(e) => skip_node(node_id, &e, outcome),
                    }
                }
                NodeType::Element | NodeType::Document => {
                    if self.is_excluded(node) {
                        continue;
                    }
                    // The pushed ids are the snapshot: rewriting a text child
                    // edits the live list. Reversed so children pop in order.
                    pending.extend(node.children_ids.iter().rev().copied());
                }
                _ => {}
            }
        }
    }

    /// Replace `text_id` with container[segments + markers]
    fn rewrite_text(
        &self,
        arena: &mut DomArena,
        text_id: NodeId,
        text: &str,
        ranges: &[(usize, usize)],
    ) -> dom::Result<usize> {
        let container = arena.create_element(&self.options.container_tag, Vec::new());
        let mut cursor = 0;

        for &(start, end) in ranges {
            if start > cursor {
                let segment = arena.create_text(&text[cursor..start]);
                arena.append_child(container, segment)?;
            }

            let marker = arena.create_element(
                &self.options.marker_tag,
                vec![Attribute::new("class", self.options.marker_class.as_str())],
            );
            let matched = arena.create_text(&text[start..end]);
            arena.append_child(marker, matched)?;
            arena.append_child(container, marker)?;
            cursor = end;
        }

        if cursor < text.len() {
            let tail = arena.create_text(&text[cursor..]);
            arena.append_child(container, tail)?;
        }

        arena.insert_before(container, text_id)?;
        arena.remove(text_id)?;
        Ok(ranges.len())
    }

    fn count_tree(&self, arena: &DomArena, start: NodeId, pattern: &Pattern) -> usize {
        let mut pending = vec![start];
        let mut count = 0;

        while let Some(node_id) = pending.pop() {
            let node = match arena.get(node_id) {
                Ok(node) => node,
                Err(e) => {
                    warn!(node_id, error = %e, "Skipping node");
                    continue;
                }
            };

            match node.node_type {
                NodeType::Text => count += pattern.count_in(&node.node_value),
                NodeType::Element | NodeType::Document if !self.is_excluded(node) => {
                    pending.extend(node.children_ids.iter().copied());
                }
                _ => {}
            }
        }

        count
    }

    fn is_excluded(&self, node: &DomNode) -> bool {
        node.tag_name()
            .map(|tag| {
                self.options
                    .excluded_tags
                    .iter()
                    .any(|excluded| excluded.eq_ignore_ascii_case(tag))
            })
            .unwrap_or(false)
    }
}

/// Walk starts at `<body>`, or the document root when there is none
fn scan_root(doc: &DomService) -> Option<NodeId> {
    doc.body_id().or_else(|| doc.arena().root_id())
}

fn skip_node(node_id: NodeId, error: &DomError, outcome: &mut HighlightOutcome) {
    warn!(node_id, error = %error, "Skipping node");
    outcome.skipped_nodes += 1;
}
