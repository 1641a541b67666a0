//! Word-range slices of paragraphs

use super::{escape_html, ContentNode, NodeId};
use ego_tree::NodeRef;
use scraper::{Html, Node};

/// Elements serialized without content or a closing tag
const VOID_TAGS: &[&str] = &["img", "image", "br", "wbr", "hr", "input", "source"];

/// A contiguous word range `[start_word_index, end_word_index)` of a paragraph
#[derive(Debug, Clone, PartialEq)]
pub struct ParagraphFragment {
    pub source_paragraph_id: NodeId,
    pub start_word_index: usize,
    pub end_word_index: usize,
    text: String,
    markup: String,
}

impl ParagraphFragment {
    /// Build the fragment covering words `start..end` of a paragraph.
    /// Returns `None` for anything other than a non-empty range of a paragraph.
    pub fn new(paragraph: &ContentNode, start: usize, end: usize) -> Option<Self> {
        ParagraphSlicer::new(paragraph)?.fragment(start, end)
    }

    /// The fragment's words joined by single spaces
    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn markup(&self) -> &str {
        &self.markup
    }

    pub fn word_count(&self) -> usize {
        self.end_word_index - self.start_word_index
    }
}

/// Cuts a paragraph's markup into word ranges.
///
/// Inline elements around the words of a range are reopened in every slice
/// they span, so emphasis, links and spans survive a split. Void elements
/// such as inline images belong to the slice holding the word before them
/// (the first slice when no word precedes them), so each one lands in
/// exactly one slice.
pub struct ParagraphSlicer<'a> {
    id: NodeId,
    attributes: &'a [(String, String)],
    words: Vec<&'a str>,
    tree: Option<Html>,
}

impl<'a> ParagraphSlicer<'a> {
    /// `None` unless `paragraph` is a Paragraph node
    pub fn new(paragraph: &'a ContentNode) -> Option<Self> {
        let ContentNode::Paragraph {
            id,
            text,
            attributes,
            markup,
            ..
        } = paragraph
        else {
            return None;
        };
        let words: Vec<&str> = text.split_whitespace().collect();

        // Markup whose text disagrees with the node's words falls back to
        // plain slices
        let tree = Some(Html::parse_fragment(markup)).filter(|tree| {
            block(tree).is_some_and(|root| {
                let mut counter = SliceWriter::new(0, 0);
                counter.children(root);
                counter.seen == words.len()
            })
        });
        if tree.is_none() {
            tracing::trace!(id = *id, "Slicing paragraph as plain text");
        }

        Some(Self {
            id: *id,
            attributes,
            words,
            tree,
        })
    }

    pub fn word_count(&self) -> usize {
        self.words.len()
    }

    /// Markup of words `start..end`; the range must be non-empty and in bounds
    pub fn markup(&self, start: usize, end: usize) -> String {
        match self.tree.as_ref().and_then(block) {
            Some(root) => {
                let mut writer = SliceWriter::new(start, end);
                writer.element(root, true);
                writer.out
            }
            None => plain_markup(self.attributes, &self.words[start..end].join(" ")),
        }
    }

    pub fn fragment(&self, start: usize, end: usize) -> Option<ParagraphFragment> {
        if start >= end || end > self.words.len() {
            return None;
        }
        Some(ParagraphFragment {
            source_paragraph_id: self.id,
            start_word_index: start,
            end_word_index: end,
            text: self.words[start..end].join(" "),
            markup: self.markup(start, end),
        })
    }
}

/// The paragraph element of a parsed fragment
fn block(tree: &Html) -> Option<NodeRef<'_, Node>> {
    tree.root_element()
        .children()
        .find(|child| child.value().is_element())
}

/// Serialize a paragraph with its original attributes around plain text
fn plain_markup(attributes: &[(String, String)], text: &str) -> String {
    let mut markup = String::from("<p");
    push_attributes(&mut markup, attributes.iter().map(|(n, v)| (n.as_str(), v.as_str())));
    markup.push('>');
    markup.push_str(&escape_html(text));
    markup.push_str("</p>");
    markup
}

fn push_attributes<'v>(out: &mut String, attributes: impl Iterator<Item = (&'v str, &'v str)>) {
    for (name, value) in attributes {
        out.push(' ');
        out.push_str(name);
        out.push_str("=\"");
        out.push_str(&escape_html(value));
        out.push('"');
    }
}

/// Walks a paragraph tree in document order, counting words the way the
/// normalizer does (across text nodes) and keeping what falls in range
struct SliceWriter {
    start: usize,
    end: usize,
    /// Words begun so far
    seen: usize,
    in_word: bool,
    out: String,
}

impl SliceWriter {
    fn new(start: usize, end: usize) -> Self {
        Self {
            start,
            end,
            seen: 0,
            in_word: false,
            out: String::new(),
        }
    }

    fn in_range(&self, word: usize) -> bool {
        (self.start..self.end).contains(&word)
    }

    fn children(&mut self, node: NodeRef<'_, Node>) {
        for child in node.children() {
            match child.value() {
                Node::Text(text) => self.text(text),
                Node::Element(_) => self.element(child, false),
                _ => {}
            }
        }
    }

    fn text(&mut self, text: &str) {
        let mut buf = [0u8; 4];
        for c in text.chars() {
            if c.is_whitespace() {
                self.in_word = false;
                // Between two words of the range
                if self.seen > self.start && self.seen < self.end {
                    self.out.push(c);
                }
                continue;
            }
            if !self.in_word {
                self.in_word = true;
                self.seen += 1;
            }
            if self.in_range(self.seen - 1) {
                self.out.push_str(&escape_html(c.encode_utf8(&mut buf)));
            }
        }
    }

    /// Write `node` when it holds something in range; `root` is always written
    fn element(&mut self, node: NodeRef<'_, Node>, root: bool) {
        let Some(el) = node.value().as_element() else {
            return;
        };
        let name = el.name();

        if VOID_TAGS.contains(&name) {
            if self.in_range(self.seen.saturating_sub(1)) {
                self.out.push('<');
                self.out.push_str(name);
                push_attributes(&mut self.out, el.attrs());
                self.out.push_str("/>");
            }
            return;
        }

        let mark = self.out.len();
        self.children(node);
        if self.out.len() == mark && !root {
            return;
        }

        let mut open = String::from("<");
        open.push_str(name);
        push_attributes(&mut open, el.attrs());
        open.push('>');
        self.out.insert_str(mark, &open);
        self.out.push_str("</");
        self.out.push_str(name);
        self.out.push('>');
    }
}
