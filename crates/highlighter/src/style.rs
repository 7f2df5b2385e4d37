//! The one style rule that makes markers visible

use dom::{Attribute, DomService, NodeId};

/// Attribute that tags the style element this crate owns
pub const STYLE_MARKER_ATTR: &str = "data-highlighter";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StyleRule {
    pub class_name: String,
    pub background_color: String,
    pub bold: bool,
}

impl Default for StyleRule {
    fn default() -> Self {
        Self {
            class_name: "highlight".to_string(),
            background_color: "yellow".to_string(),
            bold: true,
        }
    }
}

impl StyleRule {
    pub fn css(&self) -> String {
        if self.bold {
            format!(
                ".{} {{ background-color: {}; font-weight: bold; }}",
                self.class_name, self.background_color
            )
        } else {
            format!(
                ".{} {{ background-color: {}; }}",
                self.class_name, self.background_color
            )
        }
    }
}

/// Install the rule in `<head>`, reusing our style element if present
///
/// Calling this any number of times leaves exactly one owned style element
/// holding the latest rule.
pub fn install_style(doc: &mut DomService, rule: &StyleRule) -> dom::Result<NodeId> {
    let existing = doc
        .arena()
        .find_one(|node| node.has_tag("style") && node.attr(STYLE_MARKER_ATTR).is_some());

    let style_id = match existing {
        Some(id) => {
            let stale = doc.arena().children_snapshot(id)?;
            let arena = doc.arena_mut();
            for child in stale {
                arena.remove(child)?;
            }
            id
        }
        None => {
            let head = doc.ensure_head()?;
            let arena = doc.arena_mut();
            let id = arena.create_element("style", vec![Attribute::new(STYLE_MARKER_ATTR, "")]);
            arena.append_child(head, id)?;
            id
        }
    };

    let arena = doc.arena_mut();
    let css = arena.create_text(rule.css());
    arena.append_child(style_id, css)?;

    tracing::debug!(style_id, "Installed highlight style");
    Ok(style_id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_css() {
        assert_eq!(
            StyleRule::default().css(),
            ".highlight { background-color: yellow; font-weight: bold; }"
        );

        let plain = StyleRule {
            bold: false,
            ..StyleRule::default()
        };
        assert_eq!(plain.css(), ".highlight { background-color: yellow; }");
    }

    #[test]
    fn test_install_is_idempotent() {
        let mut doc =
            DomService::from_html("<html><head><title>t</title></head><body></body></html>")
                .unwrap();

        let first = install_style(&mut doc, &StyleRule::default()).unwrap();
        let second = install_style(&mut doc, &StyleRule::default()).unwrap();

        assert_eq!(first, second);
        assert_eq!(
            doc.to_html().unwrap(),
            "<html><head><title>t</title><style data-highlighter=\"\">\
             .highlight { background-color: yellow; font-weight: bold; }</style>\
             </head><body></body></html>"
        );
    }

    #[test]
    fn test_install_leaves_page_styles_alone() {
        let mut doc =
            DomService::from_html("<html><head><style>p { margin: 0; }</style></head></html>")
                .unwrap();

        install_style(&mut doc, &StyleRule::default()).unwrap();
        assert_eq!(doc.arena().find_by_tag("style").len(), 2);
    }
}
