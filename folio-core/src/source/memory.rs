//! In-memory book source

use super::BookSource;
use crate::types::{BookFormat, ChapterResource, ResourceTree, TocEntry};

/// A book assembled in memory, for embedding callers and tests
#[derive(Debug, Clone)]
pub struct MemorySource {
    format: BookFormat,
    title: Option<String>,
    author: Option<String>,
    chapters: Vec<ChapterResource>,
    toc: Vec<TocEntry>,
    resources: ResourceTree,
}

impl Default for MemorySource {
    fn default() -> Self {
        Self {
            format: BookFormat::Epub,
            title: None,
            author: None,
            chapters: Vec::new(),
            toc: Vec::new(),
            resources: ResourceTree::new(),
        }
    }
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_format(mut self, format: BookFormat) -> Self {
        self.format = format;
        self
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_author(mut self, author: impl Into<String>) -> Self {
        self.author = Some(author.into());
        self
    }

    /// Append a chapter to the reading order
    pub fn with_chapter(mut self, path: impl Into<String>, content: impl Into<String>) -> Self {
        self.chapters.push(ChapterResource::new(path, content));
        self
    }

    pub fn with_toc_entry(mut self, entry: TocEntry) -> Self {
        self.toc.push(entry);
        self
    }

    pub fn with_resource(mut self, path: impl Into<String>, data: impl Into<Vec<u8>>) -> Self {
        self.resources.insert(path, data);
        self
    }
}

impl BookSource for MemorySource {
    fn format(&self) -> BookFormat {
        self.format
    }

    fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    fn author(&self) -> Option<&str> {
        self.author.as_deref()
    }

    fn chapters(&self) -> &[ChapterResource] {
        &self.chapters
    }

    fn table_of_contents(&self) -> &[TocEntry] {
        &self.toc
    }

    fn resources(&self) -> &ResourceTree {
        &self.resources
    }
}
