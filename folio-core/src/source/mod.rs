//! Book sources: the library/file layer that supplies a book's reading order,
//! table of contents and named sub-resources.
//!
//! Each format is a variant behind the [`BookSource`] trait. Only EPUB does
//! real work; PDF, MOBI and audio are stubs with one synthetic chapter.

mod epub;
mod memory;
mod stub;

pub use self::epub::EpubSource;
pub use memory::MemorySource;
pub use stub::StubSource;

use crate::assets::resolve_path;
use crate::error::SourceError;
use crate::types::{BookFormat, ChapterResource, ResourceTree, TocEntry};
use std::path::Path;
use std::sync::Arc;

/// Read access to one opened book.
///
/// Everything a source returns must stay stable for as long as a reader
/// session holds it.
pub trait BookSource: Send + Sync {
    fn format(&self) -> BookFormat;

    /// Title from the book's own metadata, if it has any
    fn title(&self) -> Option<&str> {
        None
    }

    /// Author from the book's own metadata, if it has any
    fn author(&self) -> Option<&str> {
        None
    }

    /// Chapters in reading order
    fn chapters(&self) -> &[ChapterResource];

    /// Table of contents in navigation order
    fn table_of_contents(&self) -> &[TocEntry];

    /// Stylesheets, images and other sub-resources
    fn resources(&self) -> &ResourceTree;

    fn chapter_count(&self) -> usize {
        self.chapters().len()
    }

    /// The chapter at `index` in reading order
    fn chapter_content(&self, index: usize) -> Result<&ChapterResource, SourceError> {
        self.chapters().get(index).ok_or_else(|| {
            SourceError::ResourceNotFound(format!(
                "chapter {index} (book has {})",
                self.chapter_count()
            ))
        })
    }

    /// Raw bytes of a named sub-resource
    fn resource(&self, path: &str) -> Result<&[u8], SourceError> {
        self.resources()
            .get(path)
            .ok_or_else(|| SourceError::ResourceNotFound(path.to_string()))
    }

    /// Reading-order index of the chapter a resource path points at.
    /// Any `#fragment` is ignored.
    fn chapter_index(&self, path: &str) -> Option<usize> {
        let target = resolve_path(path, "");
        if target.is_empty() {
            return None;
        }
        let chapters = self.chapters();
        chapters
            .iter()
            .position(|chapter| resolve_path(&chapter.path, "") == target)
            .or_else(|| {
                // TOC targets are sometimes relative to the package directory
                let suffix = format!("/{target}");
                chapters
                    .iter()
                    .position(|chapter| resolve_path(&chapter.path, "").ends_with(&suffix))
            })
    }
}

/// Open the file at `path` with the source matching its extension
pub fn open_source(path: &Path) -> Result<Arc<dyn BookSource>, SourceError> {
    let format = BookFormat::from_path(path).ok_or_else(|| {
        SourceError::UnsupportedFormat(
            path.extension()
                .map(|e| e.to_string_lossy().into_owned())
                .unwrap_or_else(|| path.display().to_string()),
        )
    })?;

    tracing::debug!(path = %path.display(), format = format.display_name(), "Opening book source");
    match format {
        BookFormat::Epub => Ok(Arc::new(EpubSource::open(path)?)),
        other => Ok(Arc::new(StubSource::new(other))),
    }
}
