//! Placeholder sources for formats without a reader yet

use super::BookSource;
use crate::types::{BookFormat, ChapterResource, ResourceTree, TocEntry};

/// A single synthetic chapter announcing that the format is not readable yet.
///
/// The chapter goes through the normal pipeline, so the reader shows one
/// ordinary page for PDF, MOBI and audio files.
#[derive(Debug, Clone)]
pub struct StubSource {
    format: BookFormat,
    chapters: Vec<ChapterResource>,
    resources: ResourceTree,
}

impl StubSource {
    pub fn new(format: BookFormat) -> Self {
        let name = format.display_name();
        let content = format!(
            "<html><body><h1>{name} Reading</h1>\
             <p>{name} reading capabilities coming soon!</p></body></html>"
        );
        let path = format!("{}-content", format.extension());
        Self {
            format,
            chapters: vec![ChapterResource::new(path, content)],
            resources: ResourceTree::new(),
        }
    }
}

impl BookSource for StubSource {
    fn format(&self) -> BookFormat {
        self.format
    }

    fn chapters(&self) -> &[ChapterResource] {
        &self.chapters
    }

    fn table_of_contents(&self) -> &[TocEntry] {
        &[]
    }

    fn resources(&self) -> &ResourceTree {
        &self.resources
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_synthetic_chapter() {
        let stub = StubSource::new(BookFormat::Pdf);
        assert_eq!(stub.chapter_count(), 1);
        assert!(stub.table_of_contents().is_empty());
        let chapter = stub.chapter_content(0).unwrap();
        assert_eq!(chapter.path, "pdf-content");
        assert!(chapter.content.contains("<h1>PDF Reading</h1>"));
        assert!(stub.chapter_content(1).is_err());
    }
}
