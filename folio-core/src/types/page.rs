//! Pages produced by the pagination engine

use super::{escape_html, ContentNode, NodeId, ParagraphFragment};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Size of the reading surface
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Viewport {
    pub width: f32,
    pub height: f32,
}

impl Viewport {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }
}

/// One slot on a page
#[derive(Debug, Clone, PartialEq)]
pub enum PageItem {
    /// A whole node
    Node(Arc<ContentNode>),

    /// A word-range slice of a paragraph
    Fragment(ParagraphFragment),
}

impl PageItem {
    pub fn markup(&self) -> &str {
        match self {
            PageItem::Node(node) => node.markup(),
            PageItem::Fragment(fragment) => fragment.markup(),
        }
    }

    /// Id of the node this item came from
    pub fn source_id(&self) -> NodeId {
        match self {
            PageItem::Node(node) => node.id(),
            PageItem::Fragment(fragment) => fragment.source_paragraph_id,
        }
    }

    pub fn as_node(&self) -> Option<&ContentNode> {
        match self {
            PageItem::Node(node) => Some(node),
            PageItem::Fragment(_) => None,
        }
    }

    pub fn as_fragment(&self) -> Option<&ParagraphFragment> {
        match self {
            PageItem::Fragment(fragment) => Some(fragment),
            PageItem::Node(_) => None,
        }
    }

    /// Compact label such as `h1#0` or `p#2[0..150]`
    pub fn label(&self) -> String {
        match self {
            PageItem::Node(node) => format!("{}#{}", node.kind(), node.id()),
            PageItem::Fragment(f) => format!(
                "p#{}[{}..{}]",
                f.source_paragraph_id, f.start_word_index, f.end_word_index
            ),
        }
    }
}

/// An ordered slice of a chapter sized to fit one viewport.
///
/// Pages are never modified once the engine hands them out.
#[derive(Debug, Clone, PartialEq)]
pub struct Page {
    items: Vec<PageItem>,
    height: f32,
}

impl Page {
    pub(crate) fn new(items: Vec<PageItem>, height: f32) -> Self {
        Self { items, height }
    }

    pub fn items(&self) -> &[PageItem] {
        &self.items
    }

    /// Accumulated estimated height of the page's items
    pub fn height(&self) -> f32 {
        self.height
    }

    /// Number of nodes and fragments placed on the page
    pub fn significant_count(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Space-separated labels of the page's items
    pub fn summary(&self) -> String {
        self.items
            .iter()
            .map(PageItem::label)
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Self-contained markup for the rendering surface
    pub fn to_markup(&self, stylesheet: &str) -> String {
        let mut markup = String::from("<div class=\"folio-page\">");
        if !stylesheet.trim().is_empty() {
            markup.push_str("<style type=\"text/css\">");
            markup.push_str(stylesheet);
            markup.push_str("</style>");
        }
        for item in &self.items {
            markup.push_str(item.markup());
        }
        markup.push_str("</div>");
        markup
    }
}

/// All pages of one chapter at one viewport size
#[derive(Debug, Clone, PartialEq)]
pub struct PaginationResult {
    pub chapter_index: usize,
    pub viewport: Viewport,
    pages: Vec<Page>,
    stylesheet: Arc<str>,
    error: Option<String>,
}

impl PaginationResult {
    pub fn new(chapter_index: usize, viewport: Viewport, pages: Vec<Page>, stylesheet: Arc<str>) -> Self {
        Self {
            chapter_index,
            viewport,
            pages,
            stylesheet,
            error: None,
        }
    }

    /// A single unpaginated page carrying an error notice
    pub fn error_notice(chapter_index: usize, viewport: Viewport, message: &str) -> Self {
        let markup = format!("<h1>Error</h1><p>{}</p>", escape_html(message));
        let node = ContentNode::other(0, "div", message, markup);
        Self {
            chapter_index,
            viewport,
            pages: vec![Page::new(vec![PageItem::Node(Arc::new(node))], 0.0)],
            stylesheet: Arc::from(""),
            error: Some(message.to_string()),
        }
    }

    pub fn pages(&self) -> &[Page] {
        &self.pages
    }

    pub fn page(&self, index: usize) -> Option<&Page> {
        self.pages.get(index)
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    pub fn stylesheet(&self) -> &str {
        &self.stylesheet
    }

    /// The error message when this result is an error notice
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Render one page for the rendering surface
    pub fn render(&self, page_index: usize) -> Option<RenderedPage> {
        let page = self.pages.get(page_index)?;
        Some(RenderedPage {
            chapter_index: self.chapter_index,
            page_index,
            page_count: self.pages.len(),
            markup: page.to_markup(&self.stylesheet),
        })
    }
}

/// What the rendering surface receives for one page
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RenderedPage {
    pub chapter_index: usize,
    pub page_index: usize,
    pub page_count: usize,
    pub markup: String,
}
