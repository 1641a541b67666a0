//! The reader session: one open book, its current chapter and page, and the
//! pagination of that chapter for the current viewport.
//!
//! Chapter loads and re-paginations run off the async executor as a single
//! cancellable unit. Starting a new one supersedes whatever is in flight, and
//! only the most recent request can change what the reader sees. Every
//! [`PaginationResult`] handed out is immutable; re-pagination replaces it.

mod debounce;
mod load;

pub use debounce::{ResizeDebouncer, ResizeSender};

use crate::config::ReaderConfig;
use crate::error::ReaderError;
use crate::normalize::NormalizedChapter;
use crate::paginate::Measure;
use crate::source::BookSource;
use crate::types::{PaginationResult, RenderedPage, TocEntry, Viewport};
use load::{LoadJob, LoadRequest, PendingLoad};
use serde::Serialize;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

/// Lifecycle of a reader session
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum SessionState {
    Closed,
    Loading,
    Ready,
    Error { message: String },
}

pub struct ReaderSession {
    source: Arc<dyn BookSource>,
    measure: Arc<dyn Measure>,
    config: ReaderConfig,
    viewport: Viewport,
    state: SessionState,

    chapter_index: Option<usize>,
    chapter: Option<Arc<NormalizedChapter>>,
    pagination: Option<Arc<PaginationResult>>,
    page_index: usize,

    generation: u64,
    pending: Option<PendingLoad>,
    last_request: Option<LoadRequest>,
}

impl ReaderSession {
    /// A closed session over `source`. Nothing is loaded until a chapter is
    /// opened.
    pub fn new(
        source: Arc<dyn BookSource>,
        measure: Arc<dyn Measure>,
        config: ReaderConfig,
        viewport: Viewport,
    ) -> Self {
        Self {
            source,
            measure,
            config,
            viewport,
            state: SessionState::Closed,
            chapter_index: None,
            chapter: None,
            pagination: None,
            page_index: 0,
            generation: 0,
            pending: None,
            last_request: None,
        }
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn source(&self) -> &Arc<dyn BookSource> {
        &self.source
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn chapter_count(&self) -> usize {
        self.source.chapter_count()
    }

    pub fn table_of_contents(&self) -> &[TocEntry] {
        self.source.table_of_contents()
    }

    pub fn chapter_index(&self) -> Option<usize> {
        self.chapter_index
    }

    pub fn page_index(&self) -> usize {
        self.page_index
    }

    /// The current pagination snapshot. Holding it keeps it valid after the
    /// session moves on.
    pub fn pagination(&self) -> Option<Arc<PaginationResult>> {
        self.pagination.clone()
    }

    /// The page the reader is on, ready for the rendering surface
    pub fn current_page(&self) -> Option<RenderedPage> {
        self.pagination.as_ref()?.render(self.page_index)
    }

    /// Open chapter `index` at its first page
    pub async fn open_chapter(&mut self, index: usize) -> Result<(), ReaderError> {
        self.begin_open_chapter(index)?;
        self.settle().await
    }

    /// Start loading chapter `index` without waiting for it. Any load in
    /// flight is superseded.
    pub fn begin_open_chapter(&mut self, index: usize) -> Result<(), ReaderError> {
        let count = self.chapter_count();
        if index >= count {
            return Err(ReaderError::ChapterLoad {
                index,
                reason: format!("chapter index out of range (book has {count})"),
            });
        }
        self.start(LoadRequest::Open { index });
        Ok(())
    }

    /// Open the chapter a TOC entry points at
    pub async fn navigate_to_toc_entry(&mut self, entry: &TocEntry) -> Result<(), ReaderError> {
        let index = self
            .source
            .chapter_index(&entry.path)
            .ok_or_else(|| ReaderError::NavigationTargetNotFound(entry.path.clone()))?;
        tracing::debug!(title = %entry.title, index, "Navigating to TOC entry");
        self.open_chapter(index).await
    }

    /// Open the chapter of the first TOC entry titled `title`
    pub async fn navigate_to_toc_title(&mut self, title: &str) -> Result<(), ReaderError> {
        let entry = self
            .source
            .table_of_contents()
            .iter()
            .find(|entry| entry.title == title)
            .cloned()
            .ok_or_else(|| ReaderError::NavigationTargetNotFound(title.to_string()))?;
        self.navigate_to_toc_entry(&entry).await
    }

    /// Move to the next page; `false` on the last page
    pub fn next_page(&mut self) -> bool {
        match &self.pagination {
            Some(result) if self.page_index + 1 < result.page_count() => {
                self.page_index += 1;
                true
            }
            _ => false,
        }
    }

    /// Move to the previous page; `false` on the first page
    pub fn prev_page(&mut self) -> bool {
        if self.pagination.is_some() && self.page_index > 0 {
            self.page_index -= 1;
            true
        } else {
            false
        }
    }

    /// Jump to `page` in the current chapter, clamped to the last page.
    /// Returns the page index actually selected.
    pub fn go_to_page(&mut self, page: usize) -> Result<usize, ReaderError> {
        let result = self.pagination.as_ref().ok_or(ReaderError::NotReady)?;
        self.page_index = page.min(result.page_count().saturating_sub(1));
        Ok(self.page_index)
    }

    pub fn has_next_chapter(&self) -> bool {
        self.chapter_index.unwrap_or(0) + 1 < self.chapter_count()
    }

    pub fn has_previous_chapter(&self) -> bool {
        self.chapter_index.unwrap_or(0) > 0
    }

    /// Open the following chapter; `Ok(false)` at the end of the book
    pub async fn next_chapter(&mut self) -> Result<bool, ReaderError> {
        if !self.has_next_chapter() {
            return Ok(false);
        }
        let next = self.chapter_index.map_or(0, |index| index + 1);
        self.open_chapter(next).await.map(|()| true)
    }

    /// Open the preceding chapter; `Ok(false)` at the start of the book
    pub async fn previous_chapter(&mut self) -> Result<bool, ReaderError> {
        match self.chapter_index {
            Some(index) if index > 0 => self.open_chapter(index - 1).await.map(|()| true),
            _ => Ok(false),
        }
    }

    /// Re-paginate the current chapter for a new viewport size. The page
    /// index is clamped to the new page count.
    pub async fn on_viewport_resized(&mut self, width: f32, height: f32) -> Result<(), ReaderError> {
        if self.begin_resize(width, height) {
            self.settle().await
        } else {
            Ok(())
        }
    }

    /// Record a new viewport and start re-pagination if there is anything to
    /// lay out. Returns whether work was started.
    pub fn begin_resize(&mut self, width: f32, height: f32) -> bool {
        self.viewport = Viewport::new(width, height);

        // A chapter still loading is restarted at the new size
        let loading = match self.pending.as_ref().map(|p| &p.request) {
            Some(LoadRequest::Open { index }) => Some(*index),
            _ => None,
        };
        if let Some(index) = loading {
            self.start(LoadRequest::Open { index });
            return true;
        }

        match self.chapter_index.zip(self.chapter.clone()) {
            Some((index, chapter)) => {
                self.start(LoadRequest::Repaginate { index, chapter });
                true
            }
            None => false,
        }
    }

    /// Apply settled viewports from `debouncer` until its senders are gone.
    /// Returns how many re-paginations ran.
    pub async fn follow_resizes(&mut self, debouncer: &mut ResizeDebouncer) -> Result<usize, ReaderError> {
        let mut runs = 0;
        while let Some(viewport) = debouncer.next().await {
            if viewport == self.viewport {
                continue;
            }
            if self.begin_resize(viewport.width, viewport.height) {
                self.settle().await?;
                runs += 1;
            }
        }
        Ok(runs)
    }

    /// Re-issue the request that put the session into the error state
    pub async fn retry(&mut self) -> Result<(), ReaderError> {
        let request = match (&self.state, &self.last_request) {
            (SessionState::Error { .. }, Some(request)) => request.clone(),
            _ => return Err(ReaderError::NothingToRetry),
        };
        tracing::info!(chapter = request.chapter_index(), "Retrying chapter load");
        self.start(request);
        self.settle().await
    }

    /// Tear the session down, abandoning any work in flight
    pub fn close(&mut self) {
        if let Some(pending) = self.pending.take() {
            pending.cancel();
        }
        self.state = SessionState::Closed;
        self.chapter_index = None;
        self.chapter = None;
        self.pagination = None;
        self.page_index = 0;
        self.last_request = None;
    }

    /// Wait for the in-flight load, if any, and apply its outcome
    pub async fn settle(&mut self) -> Result<(), ReaderError> {
        let Some(pending) = self.pending.take() else {
            return Ok(());
        };
        let generation = pending.generation;
        let request = pending.request;

        let outcome = match pending.handle.await {
            Ok(outcome) => outcome,
            Err(e) => {
                let err = ReaderError::TaskFailed(e.to_string());
                self.state = SessionState::Error {
                    message: err.to_string(),
                };
                return Err(err);
            }
        };

        if generation != self.generation {
            tracing::debug!(generation, current = self.generation, "Discarding stale load");
            return Err(ReaderError::Cancelled);
        }

        match outcome {
            Ok(output) => {
                let page_count = output.result.page_count();
                match request {
                    LoadRequest::Open { index } => {
                        self.chapter_index = Some(index);
                        self.page_index = 0;
                    }
                    LoadRequest::Repaginate { .. } => {
                        self.page_index = self.page_index.min(page_count.saturating_sub(1));
                    }
                }
                self.chapter = Some(output.chapter);
                self.pagination = Some(Arc::new(output.result));
                self.state = SessionState::Ready;
                tracing::debug!(
                    chapter = ?self.chapter_index,
                    page = self.page_index,
                    pages = page_count,
                    "Session ready"
                );
                Ok(())
            }
            Err(ReaderError::Cancelled) => {
                self.state = self.resting_state();
                Err(ReaderError::Cancelled)
            }
            Err(e) => {
                tracing::warn!(error = %e, "Chapter load failed");
                self.state = SessionState::Error {
                    message: e.to_string(),
                };
                Err(e)
            }
        }
    }

    fn start(&mut self, request: LoadRequest) {
        if let Some(previous) = self.pending.take() {
            previous.cancel();
        }
        self.generation += 1;
        tracing::debug!(
            generation = self.generation,
            chapter = request.chapter_index(),
            "Starting load"
        );

        let job = LoadJob {
            generation: self.generation,
            request: request.clone(),
            viewport: self.viewport,
            source: Arc::clone(&self.source),
            measure: Arc::clone(&self.measure),
            pagination: self.config.pagination.clone(),
            layout: self.config.layout.clone(),
            cancel: Arc::new(AtomicBool::new(false)),
        };
        self.pending = Some(PendingLoad::spawn(job));
        self.last_request = Some(request);
        self.state = SessionState::Loading;
    }

    fn resting_state(&self) -> SessionState {
        if self.pagination.is_some() {
            SessionState::Ready
        } else {
            SessionState::Closed
        }
    }
}

impl Drop for ReaderSession {
    fn drop(&mut self) {
        if let Some(pending) = self.pending.take() {
            pending.cancel();
        }
    }
}
