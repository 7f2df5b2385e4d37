//! DOM Service - Main entry point for document operations
//!
//! This handles:
//! - Loading HTML from text or disk into the arena
//! - Locating the document landmarks (`<html>`, `<head>`, `<body>`)
//! - Creating `<head>` when a document has none
//! - Serializing the (possibly rewritten) tree back to HTML

use crate::arena::DomArena;
use crate::error::{DomError, Result};
use crate::parser::parse_html;
use crate::serializer::{DomSerializer, SerializerConfig};
use crate::types::*;
use crate::utils::decode_document;
use std::path::Path;

/// Configuration for DOM service
#[derive(Debug, Clone, Default)]
pub struct DomServiceConfig {
    pub serializer: SerializerConfig,
}

/// Main DOM service
pub struct DomService {
    config: DomServiceConfig,
    arena: DomArena,
}

impl DomService {
    /// Create new DOM service with default config
    pub fn new() -> Self {
        Self::with_config(DomServiceConfig::default())
    }

    /// Create DOM service with custom config
    pub fn with_config(config: DomServiceConfig) -> Self {
        Self {
            config,
            arena: DomArena::new(),
        }
    }

    /// Parse an HTML string, replacing the current document
    pub fn from_html(html: &str) -> Result<Self> {
        let mut service = Self::new();
        service.load_html(html)?;
        Ok(service)
    }

    /// Get reference to internal arena
    pub fn arena(&self) -> &DomArena {
        &self.arena
    }

    /// Get mutable reference to internal arena
    pub fn arena_mut(&mut self) -> &mut DomArena {
        &mut self.arena
    }

    /// Parse HTML and build the arena, returns the document root
    pub fn load_html(&mut self, html: &str) -> Result<NodeId> {
        self.arena = parse_html(html)?;
        self.arena.root_id().ok_or(DomError::InvalidNodeType {
            expected: "document root".to_string(),
            actual: "none".to_string(),
        })
    }

    /// Read and parse an HTML file in whatever encoding it was saved in
    pub fn load_file(&mut self, path: &Path) -> Result<NodeId> {
        let bytes = std::fs::read(path)?;
        self.load_html(&decode_document(&bytes))
    }

    /// First `<body>` element, if the document has one
    pub fn body_id(&self) -> Option<NodeId> {
        self.arena.find_by_tag("body").first().copied()
    }

    /// First `<head>` element, if the document has one
    pub fn head_id(&self) -> Option<NodeId> {
        self.arena.find_by_tag("head").first().copied()
    }

    /// Return `<head>`, creating it when missing
    ///
    /// A new head goes first under `<html>` when present, otherwise first
    /// under the document element list (after any doctype).
    pub fn ensure_head(&mut self) -> Result<NodeId> {
        if let Some(head) = self.head_id() {
            return Ok(head);
        }

        let parent = match self.arena.find_by_tag("html").first() {
            Some(&html) => html,
            None => self.arena.root()?.node_id,
        };

        let head = self.arena.create_element("head", Vec::new());
        let first_content = self
            .arena
            .children(parent)?
            .iter()
            .copied()
            .find(|&id| {
                self.arena
                    .get(id)
                    .map(|node| {
                        !matches!(
                            node.node_type,
                            NodeType::DocumentType | NodeType::ProcessingInstruction
                        )
                    })
                    .unwrap_or(false)
            });

        match first_content {
            Some(reference) => self.arena.insert_before(head, reference)?,
            None => self.arena.append_child(parent, head)?,
        }
        Ok(head)
    }

    /// Serialize the current document to HTML
    pub fn to_html(&self) -> Result<String> {
        DomSerializer::with_config(self.config.serializer.clone()).serialize(&self.arena)
    }
}

impl Default for DomService {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_landmarks() {
        let service =
            DomService::from_html("<html><head></head><body><p>x</p></body></html>").unwrap();

        let body = service.body_id().unwrap();
        assert!(service.arena().get(body).unwrap().has_tag("body"));
        assert!(service.head_id().is_some());
    }

    #[test]
    fn test_ensure_head_creates_under_html() {
        let mut service =
            DomService::from_html("<!DOCTYPE html><html><body>x</body></html>").unwrap();

        let head = service.ensure_head().unwrap();
        assert_eq!(service.ensure_head().unwrap(), head);
        assert_eq!(
            service.to_html().unwrap(),
            "<!DOCTYPE html><html><head></head><body>x</body></html>"
        );
    }

    #[test]
    fn test_ensure_head_on_fragment() {
        let mut service = DomService::from_html("<!DOCTYPE html><p>loose</p>").unwrap();

        service.ensure_head().unwrap();
        assert_eq!(
            service.to_html().unwrap(),
            "<!DOCTYPE html><head></head><p>loose</p>"
        );
    }

    #[test]
    fn test_load_missing_file() {
        let mut service = DomService::new();
        let err = service
            .load_file(Path::new("/definitely/not/here.html"))
            .unwrap_err();
        assert!(matches!(err, DomError::IoError(_)));
    }

    #[test]
    fn test_load_windows_1252_file() {
        let path = std::env::temp_dir().join(format!("dom-cp1252-{}.html", std::process::id()));
        std::fs::write(&path, b"<body>Company\x92s hedge</body>").unwrap();

        let mut service = DomService::new();
        let loaded = service.load_file(&path);
        std::fs::remove_file(&path).unwrap();
        loaded.unwrap();

        let body = service.body_id().unwrap();
        assert_eq!(
            crate::utils::get_text_content(service.arena(), body).unwrap(),
            "Company\u{2019}s hedge"
        );
    }
}
