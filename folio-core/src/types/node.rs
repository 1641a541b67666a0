//! Normalized block-level content nodes

use serde::{Deserialize, Serialize};

/// Position of a node in its chapter's normalized sequence
pub type NodeId = usize;

/// A block-level node of a chapter body.
///
/// Every variant keeps its serialized markup so it can be re-emitted on its
/// own, plus the plain text used for height estimation and word splitting.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentNode {
    /// Heading (h1-h6)
    Heading {
        id: NodeId,
        level: u8,
        text: String,
        markup: String,
    },

    /// Paragraph; the only splittable node
    Paragraph {
        id: NodeId,
        text: String,
        word_count: usize,
        /// Attributes of the `<p>` element, re-applied to fragments
        attributes: Vec<(String, String)>,
        markup: String,
    },

    /// Image with an optional height/width ratio taken from its attributes
    Image {
        id: NodeId,
        src: String,
        aspect_hint: Option<f32>,
        markup: String,
    },

    /// Table, kept whole
    Table {
        id: NodeId,
        text: String,
        markup: String,
    },

    /// Any other element, preserved verbatim as an opaque block
    Other {
        id: NodeId,
        tag: String,
        text: String,
        markup: String,
    },
}

impl ContentNode {
    /// Create a heading node; the level is clamped to 1-6
    pub fn heading(id: NodeId, level: u8, text: impl Into<String>, markup: impl Into<String>) -> Self {
        ContentNode::Heading {
            id,
            level: level.clamp(1, 6),
            text: text.into(),
            markup: markup.into(),
        }
    }

    /// Create a paragraph node without attributes
    pub fn paragraph(id: NodeId, text: impl Into<String>) -> Self {
        let text = text.into();
        let markup = format!("<p>{}</p>", super::escape_html(&text));
        Self::paragraph_with(id, text, Vec::new(), markup)
    }

    /// Create a paragraph node with its original attributes and markup
    pub fn paragraph_with(
        id: NodeId,
        text: impl Into<String>,
        attributes: Vec<(String, String)>,
        markup: impl Into<String>,
    ) -> Self {
        let text = text.into();
        let word_count = text.split_whitespace().count();
        ContentNode::Paragraph {
            id,
            text,
            word_count,
            attributes,
            markup: markup.into(),
        }
    }

    pub fn image(id: NodeId, src: impl Into<String>, aspect_hint: Option<f32>, markup: impl Into<String>) -> Self {
        ContentNode::Image {
            id,
            src: src.into(),
            aspect_hint,
            markup: markup.into(),
        }
    }

    pub fn table(id: NodeId, text: impl Into<String>, markup: impl Into<String>) -> Self {
        ContentNode::Table {
            id,
            text: text.into(),
            markup: markup.into(),
        }
    }

    pub fn other(id: NodeId, tag: impl Into<String>, text: impl Into<String>, markup: impl Into<String>) -> Self {
        ContentNode::Other {
            id,
            tag: tag.into(),
            text: text.into(),
            markup: markup.into(),
        }
    }

    pub fn id(&self) -> NodeId {
        match self {
            ContentNode::Heading { id, .. }
            | ContentNode::Paragraph { id, .. }
            | ContentNode::Image { id, .. }
            | ContentNode::Table { id, .. }
            | ContentNode::Other { id, .. } => *id,
        }
    }

    /// Serialized markup of the node
    pub fn markup(&self) -> &str {
        match self {
            ContentNode::Heading { markup, .. }
            | ContentNode::Paragraph { markup, .. }
            | ContentNode::Image { markup, .. }
            | ContentNode::Table { markup, .. }
            | ContentNode::Other { markup, .. } => markup,
        }
    }

    /// Plain text content; empty for images
    pub fn text(&self) -> &str {
        match self {
            ContentNode::Heading { text, .. }
            | ContentNode::Paragraph { text, .. }
            | ContentNode::Table { text, .. }
            | ContentNode::Other { text, .. } => text,
            ContentNode::Image { .. } => "",
        }
    }

    /// Short tag-like name, used in logs and page summaries
    pub fn kind(&self) -> &str {
        match self {
            ContentNode::Heading { level, .. } => match level {
                1 => "h1",
                2 => "h2",
                3 => "h3",
                4 => "h4",
                5 => "h5",
                _ => "h6",
            },
            ContentNode::Paragraph { .. } => "p",
            ContentNode::Image { .. } => "img",
            ContentNode::Table { .. } => "table",
            ContentNode::Other { tag, .. } => tag,
        }
    }

    /// Headings of level 1-3 always start a page once it has content
    pub fn is_major_heading(&self) -> bool {
        matches!(self, ContentNode::Heading { level, .. } if *level <= 3)
    }

    pub fn is_paragraph(&self) -> bool {
        matches!(self, ContentNode::Paragraph { .. })
    }

    /// Text blocks without a single word carry no content worth a page slot
    pub fn is_empty(&self) -> bool {
        match self {
            ContentNode::Heading { text, .. } | ContentNode::Paragraph { text, .. } => {
                text.split_whitespace().next().is_none()
            }
            _ => false,
        }
    }

    /// Whitespace-delimited words of the node's text
    pub fn words(&self) -> Vec<&str> {
        self.text().split_whitespace().collect()
    }
}
