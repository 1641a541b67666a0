//! Content normalization: turns a chapter body into an ordered sequence of
//! block-level [`ContentNode`]s.

use crate::types::ContentNode;
use ego_tree::NodeRef;
use scraper::{ElementRef, Html, Node, Selector};
use std::sync::{Arc, LazyLock};

static BODY: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("body").expect("valid body selector"));
static STYLE: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("style").expect("valid style selector"));
static MEDIA: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("img, image").expect("valid media selector"));

/// Containers that are unwrapped when they hold block-level children
const TRANSPARENT_CONTAINERS: &[&str] = &[
    "div", "section", "article", "main", "header", "footer", "aside", "nav", "body",
];

/// Elements treated as block-level when deciding whether to unwrap a container
const BLOCK_TAGS: &[&str] = &[
    "p", "h1", "h2", "h3", "h4", "h5", "h6", "div", "section", "article", "main", "header",
    "footer", "aside", "nav", "table", "ul", "ol", "dl", "blockquote", "pre", "hr", "figure",
    "img", "svg",
];

/// Tags the normalizer knows how to place; anything else falls back to
/// `Other` with a debug event
const KNOWN_OPAQUE_TAGS: &[&str] = &[
    "ul", "ol", "dl", "blockquote", "pre", "hr", "figure", "svg", "div", "section", "article",
    "main", "header", "footer", "aside", "nav", "span", "a", "br", "em", "strong", "i", "b",
];

/// A chapter body ready for pagination
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedChapter {
    /// Concatenated text of every `<style>` block, emitted on each page
    pub stylesheet: Arc<str>,

    /// Block nodes in document order; a node's id is its index
    pub nodes: Vec<Arc<ContentNode>>,
}

impl NormalizedChapter {
    /// Parse a full chapter document
    pub fn parse(markup: &str) -> Self {
        let document = Html::parse_document(markup);
        let stylesheet = document
            .select(&STYLE)
            .map(|style| style.text().collect::<String>())
            .filter(|css| !css.trim().is_empty())
            .collect::<Vec<_>>()
            .join("\n");

        let nodes = body_nodes(&document).into_iter().map(Arc::new).collect();
        Self {
            stylesheet: Arc::from(stylesheet),
            nodes,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.iter().all(|node| node.is_empty())
    }
}

/// Normalize a chapter's body into block nodes
pub fn normalize(markup: &str) -> Vec<ContentNode> {
    body_nodes(&Html::parse_document(markup))
}

fn body_nodes(document: &Html) -> Vec<ContentNode> {
    let body = document
        .select(&BODY)
        .next()
        .unwrap_or_else(|| document.root_element());

    let mut nodes = Vec::new();
    collect_blocks(*body, &mut nodes);
    tracing::debug!(nodes = nodes.len(), "Normalized chapter body");
    nodes
}

/// Walk the children of `parent` in document order
fn collect_blocks(parent: NodeRef<Node>, out: &mut Vec<ContentNode>) {
    for child in parent.children() {
        match child.value() {
            Node::Text(text) => {
                if !text.trim().is_empty() {
                    out.push(ContentNode::paragraph(out.len(), text.trim()));
                }
            }
            Node::Element(_) => {
                if let Some(element) = ElementRef::wrap(child) {
                    classify(element, out);
                }
            }
            // Comments, doctypes and processing instructions
            _ => {}
        }
    }
}

fn classify(element: ElementRef, out: &mut Vec<ContentNode>) {
    let tag = element.value().name().to_ascii_lowercase();
    let id = out.len();

    match tag.as_str() {
        "style" | "script" | "link" | "meta" | "title" => {}
        "h1" | "h2" | "h3" | "h4" | "h5" | "h6" => {
            let level = tag[1..].parse::<u8>().unwrap_or(1);
            let text = plain_text(element);
            if text.is_empty() {
                if let Some(media) = media_node(id, &tag, element) {
                    out.push(media);
                    return;
                }
            }
            out.push(ContentNode::heading(id, level, text, element.html()));
        }
        "p" => {
            let text = plain_text(element);
            if text.is_empty() {
                if let Some(media) = media_node(id, &tag, element) {
                    out.push(media);
                    return;
                }
            }
            let attributes = element
                .value()
                .attrs()
                .map(|(name, value)| (name.to_string(), value.to_string()))
                .collect();
            out.push(ContentNode::paragraph_with(id, text, attributes, element.html()));
        }
        "table" => out.push(ContentNode::table(id, plain_text(element), element.html())),
        "img" | "image" => {
            if let Some(image) = image_node(id, element, element.html()) {
                out.push(image);
            }
        }
        _ if TRANSPARENT_CONTAINERS.contains(&tag.as_str()) && has_block_children(element) => {
            collect_blocks(*element, out);
        }
        _ => {
            let text = plain_text(element);
            if text.is_empty() {
                if let Some(media) = media_node(id, &tag, element) {
                    out.push(media);
                    return;
                }
            }
            if !KNOWN_OPAQUE_TAGS.contains(&tag.as_str()) {
                tracing::debug!(tag = %tag, "Unclassified element kept as opaque block");
            }
            out.push(ContentNode::other(id, tag, text, element.html()));
        }
    }
}

fn has_block_children(element: ElementRef) -> bool {
    element.children().any(|child| {
        child
            .value()
            .as_element()
            .map(|el| BLOCK_TAGS.contains(&el.name().to_ascii_lowercase().as_str()))
            .unwrap_or(false)
    })
}

/// A text-less element wrapping media keeps the wrapper's markup: one image
/// becomes an Image node, several become a single opaque block
fn media_node(id: usize, tag: &str, element: ElementRef) -> Option<ContentNode> {
    let mut media = element.select(&MEDIA);
    let image = media.next()?;
    if media.next().is_some() {
        tracing::trace!(id, tag, "Image group kept as opaque block");
        return Some(ContentNode::other(id, tag, "", element.html()));
    }
    image_node(id, image, element.html())
}

fn image_node(id: usize, image: ElementRef, markup: String) -> Option<ContentNode> {
    let el = image.value();
    let src = el
        .attr("src")
        .or_else(|| el.attr("xlink:href"))
        .or_else(|| el.attr("href"))
        .unwrap_or_default();
    let aspect_hint = match (dimension(el.attr("width")), dimension(el.attr("height"))) {
        (Some(width), Some(height)) if width > 0.0 => Some(height / width),
        _ => None,
    };
    Some(ContentNode::image(id, src, aspect_hint, markup))
}

/// Parse a pixel dimension attribute such as `"300"` or `"300px"`
fn dimension(value: Option<&str>) -> Option<f32> {
    value?.trim().trim_end_matches("px").trim().parse::<f32>().ok()
}

/// Text content with runs of whitespace collapsed to single spaces
fn plain_text(element: ElementRef) -> String {
    element
        .text()
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}
