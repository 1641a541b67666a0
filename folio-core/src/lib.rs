//! Folio Core Library
//!
//! Content normalization and pagination for an e-book reader. A chapter's
//! markup is made self-contained by the asset resolver, flattened into block
//! nodes by the normalizer, and packed into viewport-sized pages by the
//! pagination engine. A [`ReaderSession`] ties these together for one open
//! book and keeps the current position as the viewport changes.

pub mod assets;
pub mod config;
pub mod error;
pub mod library;
pub mod normalize;
pub mod paginate;
pub mod session;
pub mod source;
pub mod storage;
pub mod types;

pub use config::{LayoutConfig, ReaderConfig};
pub use error::{
    AssetError, ConfigError, FolioError, MeasureError, PaginationError, ReaderError, Result,
    SourceError, StorageError,
};
pub use library::{BookMetadata, Library, ShelfCollection, ALL_BOOKS};
pub use normalize::{normalize, NormalizedChapter};
pub use paginate::{paginate, Measure, PaginationConfig, Paginator, TextMetrics};
pub use session::{ReaderSession, ResizeDebouncer, ResizeSender, SessionState};
pub use source::{open_source, BookSource, EpubSource, MemorySource, StubSource};
pub use types::{
    Book, BookFormat, ChapterResource, ContentNode, NodeId, Page, PageItem, PaginationResult,
    ParagraphFragment, ParagraphSlicer, RenderedPage, ResourceTree, TocEntry, Viewport,
};

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_stub_book_renders_one_page() {
        let source = open_source(std::path::Path::new("talk.mp3")).unwrap();
        let mut session = ReaderSession::new(
            source,
            Arc::new(TextMetrics::default()),
            ReaderConfig::default(),
            Viewport::new(1024.0, 768.0),
        );
        session.open_chapter(0).await.unwrap();
        let page = session.current_page().unwrap();
        assert_eq!(page.page_count, 1);
        assert!(page.markup.contains("Audiobook Reading"));
    }
}
