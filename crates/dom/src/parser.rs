//! HTML → arena parser
//!
//! A forgiving single-pass tree builder tuned for EDGAR filings (HTML 4,
//! XHTML and inline XBRL). It does not implement the full HTML5 insertion
//! mode machinery:
//! - no implied `<html>`/`<head>`/`<body>` elements
//! - implied end tags only for `<p>`, list items, table rows/cells, options
//! - stray end tags are ignored, unclosed elements are closed at EOF
//! - `<script>`/`<style>` bodies are kept as one raw text node
//!
//! Text nodes hold decoded text; the serializer escapes it back.

use crate::arena::DomArena;
use crate::error::{DomError, Result};
use crate::types::*;
use crate::utils::decode_entities;

/// Parse a full HTML document into a fresh arena
pub fn parse_html(html: &str) -> Result<DomArena> {
    let mut arena = DomArena::with_capacity(html.len() / 32 + 16);
    let root = arena.add_node(DomNode::new(
        0,
        NodeType::Document,
        "#document".to_string(),
    ));
    arena.set_root(root)?;

    HtmlParser {
        html,
        bytes: html.as_bytes(),
        pos: 0,
        stack: vec![root],
        arena: &mut arena,
    }
    .run()?;

    Ok(arena)
}

struct HtmlParser<'a> {
    html: &'a str,
    bytes: &'a [u8],
    pos: usize,
    stack: Vec<NodeId>,
    arena: &'a mut DomArena,
}

impl<'a> HtmlParser<'a> {
    fn run(mut self) -> Result<()> {
        let html = self.html;
        while self.pos < self.bytes.len() {
            if self.starts_with(b"<!--") {
                let end = self
                    .find(self.pos + 4, b"-->")
                    .ok_or_else(|| self.error("unclosed HTML comment"))?;
                let body = &html[self.pos + 4..end];
                self.push_markup(NodeType::Comment, "#comment", body)?;
                self.pos = end + 3;
            } else if self.starts_with(b"<![CDATA[") {
                let end = self
                    .find(self.pos + 9, b"]]>")
                    .ok_or_else(|| self.error("unclosed CDATA section"))?;
                let body = &html[self.pos + 9..end];
                self.push_markup(NodeType::CdataSection, "#cdata-section", body)?;
                self.pos = end + 3;
            } else if self.starts_with(b"<!") {
                let end = self
                    .find(self.pos + 2, b">")
                    .ok_or_else(|| self.error("unclosed declaration"))?;
                let body = &html[self.pos + 2..end];
                self.push_markup(NodeType::DocumentType, "#doctype", body)?;
                self.pos = end + 1;
            } else if self.starts_with(b"<?") {
                let end = self
                    .find(self.pos + 2, b">")
                    .ok_or_else(|| self.error("unclosed processing instruction"))?;
                let body = &html[self.pos + 2..end];
                self.push_markup(NodeType::ProcessingInstruction, "#pi", body)?;
                self.pos = end + 1;
            } else if self.starts_with(b"</") && self.is_tag_start(self.pos + 2) {
                self.end_tag()?;
            } else if self.starts_with(b"<") && self.is_tag_start(self.pos + 1) {
                self.start_tag()?;
            } else {
                self.text();
            }
        }
        Ok(())
    }

    fn start_tag(&mut self) -> Result<()> {
        let (tag, attributes, self_closing) = self.parse_start_tag()?;
        self.apply_implied_end_tags(&tag.to_ascii_lowercase());
        let parent = self.current();
        let node = self.arena.create_element(&tag, attributes);
        self.arena.append_child(parent, node)?;

        let raw = is_raw_text_tag(&tag);
        if raw || is_escapable_raw_text_tag(&tag) {
            if self_closing {
                return Ok(());
            }
            let close = self
                .find_end_tag(self.pos, &tag)
                .unwrap_or(self.bytes.len());
            let body = &self.html[self.pos..close];
            if !body.is_empty() {
                let value = if raw {
                    body.to_string()
                } else {
                    decode_entities(body)
                };
                let text = self.arena.create_text(value);
                self.arena.append_child(node, text)?;
            }
            self.pos = close;
            if self.pos < self.bytes.len() {
                self.skip_past(b'>');
            }
            return Ok(());
        }

        if !self_closing && !is_void_tag(&tag) {
            self.stack.push(node);
        }
        Ok(())
    }

    /// Close what a new `tag` implicitly ends: an open `<p>` before a block,
    /// the previous `<li>`, `<dt>`/`<dd>`, table row or cell, `<option>`
    fn apply_implied_end_tags(&mut self, tag: &str) {
        if closes_paragraph(tag) {
            self.close_open(&["p"], BUTTON_SCOPE);
        }

        match tag {
            "li" => self.close_open(&["li"], LIST_SCOPE),
            "dt" | "dd" => self.close_open(&["dt", "dd"], &["dl", "table", "td", "th"]),
            "td" | "th" => self.close_open(&["td", "th"], &["tr", "table"]),
            "tr" => self.close_open(&["tr"], &["table"]),
            "thead" | "tbody" | "tfoot" => {
                self.close_open(&["thead", "tbody", "tfoot"], &["table"])
            }
            "option" => self.close_open(&["option"], &["select", "datalist"]),
            "optgroup" => {
                self.close_open(&["option"], &["select", "datalist"]);
                self.close_open(&["optgroup"], &["select"]);
            }
            _ => {}
        }
    }

    /// Pop up to and including the innermost open element named in `targets`,
    /// unless a `boundaries` element is met first
    fn close_open(&mut self, targets: &[&str], boundaries: &[&str]) {
        for index in (1..self.stack.len()).rev() {
            let Some(name) = self
                .arena
                .get(self.stack[index])
                .ok()
                .and_then(|node| node.tag_name())
            else {
                continue;
            };

            if targets.iter().any(|t| t.eq_ignore_ascii_case(name)) {
                self.stack.truncate(index);
                return;
            }
            if boundaries.iter().any(|b| b.eq_ignore_ascii_case(name)) {
                return;
            }
        }
    }

    fn end_tag(&mut self) -> Result<()> {
        let name_start = self.pos + 2;
        let mut i = name_start;
        while i < self.bytes.len() && is_tag_char(self.bytes[i]) {
            i += 1;
        }
        let tag = &self.html[name_start..i];
        self.pos = i;
        self.skip_past(b'>');

        // Only close when the element is actually open; stray end tags are dropped
        let open = self.stack.iter().skip(1).rposition(|&id| {
            self.arena
                .get(id)
                .map(|node| node.has_tag(tag))
                .unwrap_or(false)
        });
        if let Some(index) = open {
            self.stack.truncate(index + 1);
        }
        Ok(())
    }

    fn text(&mut self) {
        let start = self.pos;
        // A lone '<' that does not open markup is plain text
        let mut i = start + 1;
        while i < self.bytes.len() && self.bytes[i] != b'<' {
            i += 1;
        }
        self.pos = i;

        let value = decode_entities(&self.html[start..i]);
        let parent = self.current();

        // Merge with a preceding text sibling so one run of text is one node
        let last_child = self
            .arena
            .get(parent)
            .ok()
            .and_then(|node| node.children_ids.last().copied());
        if let Some(last) = last_child {
            if let Ok(node) = self.arena.get_mut(last) {
                if node.is_text() {
                    node.node_value.push_str(&value);
                    return;
                }
            }
        }

        let text = self.arena.create_text(value);
        // Parent is always an open element or the document
        let _ = self.arena.append_child(parent, text);
    }

    fn parse_start_tag(&mut self) -> Result<(String, Vec<Attribute>, bool)> {
        let mut i = self.pos + 1;
        let tag_start = i;
        while i < self.bytes.len() && is_tag_char(self.bytes[i]) {
            i += 1;
        }
        let tag = self.html[tag_start..i].to_string();

        let mut attributes: Vec<Attribute> = Vec::new();
        let mut self_closing = false;

        loop {
            skip_ws(self.bytes, &mut i);
            if i >= self.bytes.len() {
                self.pos = tag_start - 1;
                return Err(self.error("unclosed start tag"));
            }

            match self.bytes[i] {
                b'>' => {
                    i += 1;
                    break;
                }
                b'/' if self.bytes.get(i + 1) == Some(&b'>') => {
                    self_closing = true;
                    i += 2;
                    break;
                }
                b'/' => {
                    i += 1;
                    continue;
                }
                _ => {}
            }

            let name_start = i;
            while i < self.bytes.len() && is_attr_name_char(self.bytes[i]) {
                i += 1;
            }
            if i == name_start {
                // Junk like a stray quote; skip it
                i += 1;
                continue;
            }
            let name = self.html[name_start..i].to_string();

            skip_ws(self.bytes, &mut i);
            let value = if self.bytes.get(i) == Some(&b'=') {
                i += 1;
                skip_ws(self.bytes, &mut i);
                self.parse_attr_value(&mut i)?
            } else {
                String::new()
            };

            if !attributes
                .iter()
                .any(|attr| attr.name.eq_ignore_ascii_case(&name))
            {
                attributes.push(Attribute { name, value });
            }
        }

        self.pos = i;
        Ok((tag, attributes, self_closing))
    }

    fn parse_attr_value(&self, i: &mut usize) -> Result<String> {
        match self.bytes.get(*i) {
            Some(&quote) if quote == b'"' || quote == b'\'' => {
                let start = *i + 1;
                let end = self
                    .find(start, &[quote])
                    .ok_or_else(|| self.error("unclosed attribute value"))?;
                *i = end + 1;
                Ok(decode_entities(&self.html[start..end]))
            }
            _ => {
                let start = *i;
                while *i < self.bytes.len()
                    && !self.bytes[*i].is_ascii_whitespace()
                    && self.bytes[*i] != b'>'
                {
                    *i += 1;
                }
                Ok(decode_entities(&self.html[start..*i]))
            }
        }
    }

    fn push_markup(&mut self, node_type: NodeType, name: &str, body: &str) -> Result<()> {
        let mut node = DomNode::new(0, node_type, name.to_string());
        node.node_value = body.to_string();
        let id = self.arena.add_node(node);
        let parent = self.current();
        self.arena.append_child(parent, id)
    }

    fn current(&self) -> NodeId {
        // stack[0] is the document and is never popped
        self.stack.last().copied().unwrap_or(0)
    }

    fn starts_with(&self, needle: &[u8]) -> bool {
        self.bytes[self.pos..].starts_with(needle)
    }

    fn is_tag_start(&self, at: usize) -> bool {
        self.bytes
            .get(at)
            .map(|b| b.is_ascii_alphabetic())
            .unwrap_or(false)
    }

    fn find(&self, from: usize, needle: &[u8]) -> Option<usize> {
        if from > self.bytes.len() {
            return None;
        }
        self.bytes[from..]
            .windows(needle.len())
            .position(|window| window == needle)
            .map(|offset| from + offset)
    }

    /// Find `</tag` (case-insensitive) followed by a tag delimiter
    fn find_end_tag(&self, from: usize, tag: &str) -> Option<usize> {
        let tag = tag.as_bytes();
        let mut at = from;
        while let Some(candidate) = self.find(at, b"</") {
            let name_start = candidate + 2;
            let name_end = name_start + tag.len();
            if name_end <= self.bytes.len()
                && self.bytes[name_start..name_end].eq_ignore_ascii_case(tag)
                && self
                    .bytes
                    .get(name_end)
                    .map(|b| b.is_ascii_whitespace() || *b == b'>' || *b == b'/')
                    .unwrap_or(true)
            {
                return Some(candidate);
            }
            at = candidate + 2;
        }
        None
    }

    fn skip_past(&mut self, byte: u8) {
        while self.pos < self.bytes.len() && self.bytes[self.pos] != byte {
            self.pos += 1;
        }
        if self.pos < self.bytes.len() {
            self.pos += 1;
        }
    }

    fn error(&self, message: &str) -> DomError {
        DomError::HtmlParse {
            offset: self.pos,
            message: message.to_string(),
        }
    }
}

const BUTTON_SCOPE: &[&str] = &[
    "applet", "button", "caption", "html", "marquee", "object", "table", "td", "th",
];

const LIST_SCOPE: &[&str] = &["ol", "ul", "menu", "table", "td", "th"];

/// Start tags that end an open `<p>`
fn closes_paragraph(tag: &str) -> bool {
    matches!(
        tag,
        "address"
            | "article"
            | "aside"
            | "blockquote"
            | "center"
            | "details"
            | "dialog"
            | "dir"
            | "div"
            | "dl"
            | "dd"
            | "dt"
            | "fieldset"
            | "figcaption"
            | "figure"
            | "footer"
            | "form"
            | "h1"
            | "h2"
            | "h3"
            | "h4"
            | "h5"
            | "h6"
            | "header"
            | "hgroup"
            | "hr"
            | "li"
            | "main"
            | "menu"
            | "nav"
            | "ol"
            | "p"
            | "pre"
            | "section"
            | "summary"
            | "table"
            | "ul"
    )
}

fn skip_ws(bytes: &[u8], i: &mut usize) {
    while *i < bytes.len() && bytes[*i].is_ascii_whitespace() {
        *i += 1;
    }
}

fn is_tag_char(b: u8) -> bool {
    b.is_ascii_alphanumeric() || matches!(b, b'-' | b':' | b'_' | b'.')
}

fn is_attr_name_char(b: u8) -> bool {
    !b.is_ascii_whitespace() && !matches!(b, b'/' | b'>' | b'=' | b'"' | b'\'' | b'<')
}
