//! Core types shared by the reader pipeline

mod book;
mod chapter;
mod fragment;
mod node;
mod page;
mod resource;
mod toc;

pub use book::{Book, BookFormat};
pub use chapter::ChapterResource;
pub use fragment::{ParagraphFragment, ParagraphSlicer};
pub use node::{ContentNode, NodeId};
pub use page::{Page, PageItem, PaginationResult, RenderedPage, Viewport};
pub use resource::ResourceTree;
pub use toc::TocEntry;

/// Escape text for inclusion in HTML content or attribute values
pub(crate) fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}
