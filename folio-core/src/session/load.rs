//! One cancellable unit of chapter work: resolve assets, normalize, paginate

use crate::assets;
use crate::config::LayoutConfig;
use crate::error::{PaginationError, ReaderError};
use crate::normalize::NormalizedChapter;
use crate::paginate::{Measure, PaginationConfig, Paginator};
use crate::source::BookSource;
use crate::types::{PaginationResult, Viewport};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::task::JoinHandle;

/// What a load has to produce
#[derive(Debug, Clone)]
pub(crate) enum LoadRequest {
    /// Read the chapter from the book and paginate it
    Open { index: usize },

    /// Paginate an already normalized chapter again
    Repaginate {
        index: usize,
        chapter: Arc<NormalizedChapter>,
    },
}

impl LoadRequest {
    pub(crate) fn chapter_index(&self) -> usize {
        match self {
            Self::Open { index } | Self::Repaginate { index, .. } => *index,
        }
    }
}

/// Everything the blocking worker needs, owned so it can leave the session
pub(crate) struct LoadJob {
    pub generation: u64,
    pub request: LoadRequest,
    pub viewport: Viewport,
    pub source: Arc<dyn BookSource>,
    pub measure: Arc<dyn Measure>,
    pub pagination: PaginationConfig,
    pub layout: LayoutConfig,
    pub cancel: Arc<AtomicBool>,
}

pub(crate) struct LoadOutput {
    pub chapter: Arc<NormalizedChapter>,
    pub result: PaginationResult,
}

/// An in-flight load owned by the session
pub(crate) struct PendingLoad {
    pub generation: u64,
    pub request: LoadRequest,
    pub cancel: Arc<AtomicBool>,
    pub handle: JoinHandle<Result<LoadOutput, ReaderError>>,
}

impl PendingLoad {
    /// Start `job` on the blocking pool
    pub(crate) fn spawn(job: LoadJob) -> Self {
        let generation = job.generation;
        let request = job.request.clone();
        let cancel = Arc::clone(&job.cancel);
        let handle = tokio::task::spawn_blocking(move || run(&job));
        Self {
            generation,
            request,
            cancel,
            handle,
        }
    }

    /// Ask the worker to stop at its next checkpoint. Its result is dropped
    /// with the handle.
    pub(crate) fn cancel(self) {
        self.cancel.store(true, Ordering::Relaxed);
        tracing::debug!(generation = self.generation, "Superseded pending load");
    }
}

#[tracing::instrument(
    skip_all,
    fields(chapter = job.request.chapter_index(), generation = job.generation)
)]
pub(crate) fn run(job: &LoadJob) -> Result<LoadOutput, ReaderError> {
    let index = job.request.chapter_index();
    let chapter = match &job.request {
        LoadRequest::Open { index } => {
            let resource = job
                .source
                .chapter_content(*index)
                .map_err(|e| ReaderError::ChapterLoad {
                    index: *index,
                    reason: e.to_string(),
                })?;
            let resolved = assets::resolve(
                &resource.content,
                &resource.base_directory(),
                job.source.resources(),
            );
            if job.cancel.load(Ordering::Relaxed) {
                return Err(ReaderError::Cancelled);
            }
            Arc::new(NormalizedChapter::parse(&resolved))
        }
        LoadRequest::Repaginate { chapter, .. } => Arc::clone(chapter),
    };

    let (width, height) = job.layout.page_box(job.viewport);
    let paginator = Paginator::new(job.measure.as_ref(), &job.pagination, height, width)
        .with_cancel_flag(&job.cancel);

    let result = match paginator.paginate(&chapter.nodes) {
        Ok(pages) => {
            tracing::info!(pages = pages.len(), width, height, "Paginated chapter");
            PaginationResult::new(index, job.viewport, pages, Arc::clone(&chapter.stylesheet))
        }
        Err(PaginationError::Measure(e)) => {
            tracing::warn!(error = %e, "Pagination failed, showing error page");
            PaginationResult::error_notice(index, job.viewport, &e.to_string())
        }
        Err(PaginationError::Cancelled) => return Err(ReaderError::Cancelled),
    };

    Ok(LoadOutput { chapter, result })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::MeasureError;
    use crate::paginate::TextMetrics;
    use crate::source::MemorySource;

    fn job(request: LoadRequest, measure: Arc<dyn Measure>) -> LoadJob {
        let source = MemorySource::new()
            .with_chapter(
                "OEBPS/ch1.xhtml",
                r#"<html><head><link rel="stylesheet" href="style.css"/></head>
                   <body><h1>One</h1><p>Some words here.</p></body></html>"#,
            )
            .with_resource("OEBPS/style.css", "h1 { color: red; }");
        LoadJob {
            generation: 1,
            request,
            viewport: Viewport::new(800.0, 600.0),
            source: Arc::new(source),
            measure,
            pagination: PaginationConfig::default(),
            layout: LayoutConfig::default(),
            cancel: Arc::new(AtomicBool::new(false)),
        }
    }

    #[test]
    fn test_open_resolves_and_paginates() {
        let output = run(&job(LoadRequest::Open { index: 0 }, Arc::new(TextMetrics::default()))).unwrap();
        assert_eq!(output.chapter.nodes.len(), 2);
        assert_eq!(output.result.page_count(), 1);
        assert_eq!(output.result.stylesheet(), "h1 { color: red; }");
        assert!(output.result.error().is_none());
    }

    #[test]
    fn test_missing_chapter_is_a_load_error() {
        let err = run(&job(LoadRequest::Open { index: 3 }, Arc::new(TextMetrics::default())))
            .err()
            .unwrap();
        assert!(matches!(err, ReaderError::ChapterLoad { index: 3, .. }));
    }

    #[test]
    fn test_measure_failure_becomes_error_page() {
        let failing = |_: &str, _: f32| -> Result<f32, MeasureError> { Err(MeasureError::new("layout engine failed")) };
        let output = run(&job(LoadRequest::Open { index: 0 }, Arc::new(failing))).unwrap();
        assert_eq!(output.result.page_count(), 1);
        assert!(output.result.error().unwrap().contains("layout engine failed"));
    }

    #[test]
    fn test_cancelled_job() {
        let job = job(LoadRequest::Open { index: 0 }, Arc::new(TextMetrics::default()));
        job.cancel.store(true, Ordering::Relaxed);
        assert!(matches!(run(&job), Err(ReaderError::Cancelled)));
    }
}
