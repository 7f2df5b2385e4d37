//! Core type definitions for the document tree
//!
//! Key design principles:
//! 1. Use u32 for indices (4 bytes vs 8 bytes pointer)
//! 2. Use SmallVec for small arrays (avoid heap allocation)
//! 3. Keep attributes ordered so documents serialize back the way they came in

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

/// Node identifier (index into arena)
/// u32 allows 4 billion nodes, enough for any filing
pub type NodeId = u32;

/// Node type matching DOM specification numbering
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum NodeType {
    Element = 1,
    Text = 3,
    CdataSection = 4,
    ProcessingInstruction = 7,
    Comment = 8,
    Document = 9,
    DocumentType = 10,
}

impl NodeType {
    pub fn as_str(&self) -> &'static str {
        match self {
            NodeType::Element => "element",
            NodeType::Text => "text",
            NodeType::CdataSection => "cdata",
            NodeType::ProcessingInstruction => "processing-instruction",
            NodeType::Comment => "comment",
            NodeType::Document => "document",
            NodeType::DocumentType => "doctype",
        }
    }
}

/// Element attribute, kept in source order
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attribute {
    pub name: String,
    pub value: String,
}

impl Attribute {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// The main document tree node structure
///
/// - Small fixed-size fields first (better packing)
/// - Use indices instead of pointers
/// - `node_name` is the tag for elements, `#text`/`#comment`/... otherwise
/// - `node_value` holds decoded text for text nodes and raw markup for
///   comments, doctypes and processing instructions
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DomNode {
    pub node_id: NodeId,
    pub node_type: NodeType,

    // Navigation indices
    pub parent_id: Option<NodeId>,
    pub children_ids: SmallVec<[NodeId; 4]>, // Most nodes have <4 children

    pub node_name: String,
    pub node_value: String,
    pub attributes: Vec<Attribute>,
}

impl DomNode {
    /// Create a new detached node with required fields
    pub fn new(node_id: NodeId, node_type: NodeType, node_name: String) -> Self {
        Self {
            node_id,
            node_type,
            parent_id: None,
            children_ids: SmallVec::new(),
            node_name,
            node_value: String::new(),
            attributes: Vec::new(),
        }
    }

    /// Get tag name for element nodes
    pub fn tag_name(&self) -> Option<&str> {
        if self.node_type == NodeType::Element {
            Some(&self.node_name)
        } else {
            None
        }
    }

    /// Case-insensitive tag comparison, false for non-elements
    pub fn has_tag(&self, tag: &str) -> bool {
        self.tag_name()
            .map(|name| name.eq_ignore_ascii_case(tag))
            .unwrap_or(false)
    }

    /// Check if node is an element
    pub fn is_element(&self) -> bool {
        self.node_type == NodeType::Element
    }

    /// Check if node is text
    pub fn is_text(&self) -> bool {
        self.node_type == NodeType::Text
    }

    /// Get attribute value (names compare case-insensitively)
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|attr| attr.name.eq_ignore_ascii_case(name))
            .map(|attr| attr.value.as_str())
    }

    /// Set attribute, replacing an existing one with the same name
    pub fn set_attr(&mut self, name: &str, value: impl Into<String>) {
        let value = value.into();
        match self
            .attributes
            .iter_mut()
            .find(|attr| attr.name.eq_ignore_ascii_case(name))
        {
            Some(attr) => attr.value = value,
            None => self.attributes.push(Attribute::new(name, value)),
        }
    }
}

/// Elements whose content is raw text (never entity-decoded or re-escaped)
pub const RAW_TEXT_TAGS: &[&str] = &["script", "style"];

/// Elements whose content is text only, but with entities decoded
pub const ESCAPABLE_RAW_TEXT_TAGS: &[&str] = &["title", "textarea"];

/// Elements that never have children or an end tag
pub const VOID_TAGS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "param", "source",
    "track", "wbr",
];

pub fn is_raw_text_tag(tag: &str) -> bool {
    RAW_TEXT_TAGS.iter().any(|t| t.eq_ignore_ascii_case(tag))
}

pub fn is_escapable_raw_text_tag(tag: &str) -> bool {
    ESCAPABLE_RAW_TEXT_TAGS
        .iter()
        .any(|t| t.eq_ignore_ascii_case(tag))
}

pub fn is_void_tag(tag: &str) -> bool {
    VOID_TAGS.iter().any(|t| t.eq_ignore_ascii_case(tag))
}
