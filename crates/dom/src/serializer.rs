//! DOM Serializer - write the arena back out as HTML
//!
//! This module handles:
//! - Escaping decoded text and attribute values
//! - Raw text elements (`<script>`, `<style>`) written verbatim
//! - Void elements written without an end tag
//! - Comments, doctypes and processing instructions round-tripped as-is

use crate::arena::DomArena;
use crate::error::Result;
use crate::types::*;
use crate::utils::{escape_attr, escape_text};

/// Serializer configuration
#[derive(Debug, Clone)]
pub struct SerializerConfig {
    pub include_comments: bool,
}

impl Default for SerializerConfig {
    fn default() -> Self {
        Self {
            include_comments: true,
        }
    }
}

/// HTML serializer
pub struct DomSerializer {
    config: SerializerConfig,
}

impl DomSerializer {
    pub fn new() -> Self {
        Self::with_config(SerializerConfig::default())
    }

    pub fn with_config(config: SerializerConfig) -> Self {
        Self { config }
    }

    /// Serialize the whole document
    pub fn serialize(&self, arena: &DomArena) -> Result<String> {
        let mut output = String::with_capacity(arena.len() * 16);

        if let Some(root_id) = arena.root_id() {
            self.serialize_node(arena, root_id, false, &mut output)?;
        }

        Ok(output)
    }

    /// Serialize one node and its subtree (outerHTML)
    pub fn outer_html(&self, arena: &DomArena, node_id: NodeId) -> Result<String> {
        let mut output = String::new();
        self.serialize_node(arena, node_id, false, &mut output)?;
        Ok(output)
    }

    /// Serialize a node's children only (innerHTML)
    pub fn inner_html(&self, arena: &DomArena, node_id: NodeId) -> Result<String> {
        let node = arena.get(node_id)?;
        let raw = node.tag_name().map(is_raw_text_tag).unwrap_or(false);

        let mut output = String::new();
        for &child_id in &node.children_ids {
            self.serialize_node(arena, child_id, raw, &mut output)?;
        }
        Ok(output)
    }

    /// Serialize a node and its subtree
    ///
    /// Uses an explicit work stack; filings can nest deeper than the call
    /// stack allows.
    fn serialize_node(
        &self,
        arena: &DomArena,
        node_id: NodeId,
        raw_text: bool,
        output: &mut String,
    ) -> Result<()> {
        let mut steps = vec![Step::Visit {
            node_id,
            raw_text,
        }];

        while let Some(step) = steps.pop() {
            let (node_id, raw_text) = match step {
                Step::Visit { node_id, raw_text } => (node_id, raw_text),
                Step::Close(node_id) => {
                    output.push_str("</");
                    output.push_str(&arena.get(node_id)?.node_name);
                    output.push('>');
                    continue;
                }
            };
            let node = arena.get(node_id)?;

            match node.node_type {
                NodeType::Element => {
                    output.push('<');
                    output.push_str(&node.node_name);

                    for attr in &node.attributes {
                        output.push(' ');
                        output.push_str(&attr.name);
                        output.push_str("=\"");
                        output.push_str(&escape_attr(&attr.value));
                        output.push('"');
                    }
                    output.push('>');

                    if is_void_tag(&node.node_name) {
                        continue;
                    }

                    let raw = is_raw_text_tag(&node.node_name);
                    steps.push(Step::Close(node_id));
                    push_children(&mut steps, node, raw);
                }
                NodeType::Text => {
                    if raw_text {
                        output.push_str(&node.node_value);
                    } else {
                        output.push_str(&escape_text(&node.node_value));
                    }
                }
                NodeType::Comment => {
                    if self.config.include_comments {
                        output.push_str("<!--");
                        output.push_str(&node.node_value);
                        output.push_str("-->");
                    }
                }
                NodeType::CdataSection => {
                    output.push_str("<![CDATA[");
                    output.push_str(&node.node_value);
                    output.push_str("]]>");
                }
                NodeType::DocumentType => {
                    output.push_str("<!");
                    output.push_str(&node.node_value);
                    output.push('>');
                }
                NodeType::ProcessingInstruction => {
                    output.push_str("<?");
                    output.push_str(&node.node_value);
                    output.push('>');
                }
                // For document nodes, just serialize children
                NodeType::Document => push_children(&mut steps, node, false),
            }
        }

        Ok(())
    }
}

enum Step {
    Visit { node_id: NodeId, raw_text: bool },
    Close(NodeId),
}

/// Reverse order so children pop left-to-right
fn push_children(steps: &mut Vec<Step>, node: &DomNode, raw_text: bool) {
    steps.extend(node.children_ids.iter().rev().map(|&node_id| Step::Visit {
        node_id,
        raw_text,
    }));
}

impl Default for DomSerializer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_html;

    #[test]
    fn test_serialize_roundtrip_keeps_markup() {
        let html = "<!DOCTYPE html><?xml version=\"1.0\"?><html><head>\
                    <style>.a > .b { color: red; }</style></head>\
                    <body><!-- note --><p id=\"x\">Gain &amp; loss<br>next</p></body></html>";
        let arena = parse_html(html).unwrap();

        let output = DomSerializer::new().serialize(&arena).unwrap();
        assert_eq!(output, html);
    }

    #[test]
    fn test_serialize_escapes_text_and_attributes() {
        let arena =
            parse_html("<body><p title='say \"hi\"'>a &lt; b&nbsp;c</p></body>").unwrap();

        let output = DomSerializer::new().serialize(&arena).unwrap();
        assert_eq!(
            output,
            "<body><p title=\"say &quot;hi&quot;\">a &lt; b&nbsp;c</p></body>"
        );
    }

    #[test]
    fn test_deeply_nested_document() {
        let depth = 50_000;
        let html = format!("{}gain{}", "<div>".repeat(depth), "</div>".repeat(depth));
        let arena = parse_html(&html).unwrap();

        let output = DomSerializer::new().serialize(&arena).unwrap();
        assert_eq!(output, html);
    }

    #[test]
    fn test_inner_html_and_comment_filtering() {
        let arena = parse_html("<div><!-- x --><span>y</span></div>").unwrap();
        let div = arena.find_by_tag("div")[0];

        let serializer = DomSerializer::with_config(SerializerConfig {
            include_comments: false,
        });
        assert_eq!(serializer.inner_html(&arena, div).unwrap(), "<span>y</span>");
        assert_eq!(
            serializer.outer_html(&arena, div).unwrap(),
            "<div><span>y</span></div>"
        );
    }
}
