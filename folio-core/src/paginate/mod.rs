//! The pagination engine.
//!
//! Greedily packs a chapter's normalized nodes into pages under a height
//! budget. Headings of level 1-3 lead a page once it holds content, sparse
//! pages may overflow by a tolerance factor, and paragraphs that do not fit
//! are split at word boundaries instead of being pushed whole to the next
//! page. An unsplittable node taller than the budget is placed alone on a
//! page rather than stalling.
//!
//! For fixed nodes, measure backend and dimensions the output is
//! deterministic.

mod measure;
mod splitter;

pub use measure::{Measure, TextMetrics};

use crate::error::PaginationError;
use crate::types::{ContentNode, Page, PageItem};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Tunable packing constants
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PaginationConfig {
    /// Below this many items a page may accept a modest overflow
    pub min_significant_elements_per_page: usize,

    /// Multiplier on the page height allowed for sparse pages
    pub overflow_tolerance_factor: f32,

    /// Horizontal padding of a page, subtracted from the available width
    pub horizontal_inset: f32,
}

impl Default for PaginationConfig {
    fn default() -> Self {
        Self {
            min_significant_elements_per_page: 2,
            overflow_tolerance_factor: 1.10,
            horizontal_inset: 20.0,
        }
    }
}

/// Paginate `nodes` with the default configuration
pub fn paginate(
    nodes: &[Arc<ContentNode>],
    measure: &dyn Measure,
    max_page_height: f32,
    available_width: f32,
) -> Result<Vec<Page>, PaginationError> {
    let config = PaginationConfig::default();
    Paginator::new(measure, &config, max_page_height, available_width).paginate(nodes)
}

/// One pagination run over fixed dimensions
pub struct Paginator<'a> {
    measure: &'a dyn Measure,
    config: &'a PaginationConfig,
    max_page_height: f32,
    content_width: f32,
    cancelled: Option<&'a AtomicBool>,
}

impl<'a> Paginator<'a> {
    pub fn new(
        measure: &'a dyn Measure,
        config: &'a PaginationConfig,
        max_page_height: f32,
        available_width: f32,
    ) -> Self {
        Self {
            measure,
            config,
            max_page_height,
            content_width: (available_width - config.horizontal_inset).max(1.0),
            cancelled: None,
        }
    }

    /// Stop early with [`PaginationError::Cancelled`] once `flag` is set
    pub fn with_cancel_flag(mut self, flag: &'a AtomicBool) -> Self {
        self.cancelled = Some(flag);
        self
    }

    pub fn paginate(&self, nodes: &[Arc<ContentNode>]) -> Result<Vec<Page>, PaginationError> {
        let mut builder = PageBuilder::default();

        for node in nodes {
            self.check_cancelled()?;

            if node.is_empty() {
                tracing::trace!(id = node.id(), "Skipping empty node");
                continue;
            }

            if node.is_major_heading() && builder.significant_count() > 0 {
                builder.close_page();
            }

            if node.is_paragraph() {
                splitter::place_paragraph(self, &mut builder, node)?;
                continue;
            }

            let height = self.measure(node.markup())?;
            if self.accepts(&builder, height) {
                builder.place(PageItem::Node(Arc::clone(node)), height);
                continue;
            }

            if builder.significant_count() == 0 {
                tracing::debug!(
                    id = node.id(),
                    height,
                    budget = self.max_page_height,
                    "Node exceeds page height, placing it alone"
                );
                builder.place(PageItem::Node(Arc::clone(node)), height);
                continue;
            }

            builder.close_page();
            builder.place(PageItem::Node(Arc::clone(node)), height);
        }

        let pages = builder.finish();
        tracing::debug!(pages = pages.len(), nodes = nodes.len(), "Pagination finished");
        Ok(pages)
    }

    /// Whether an item of `height` may join the current page whole: it fits,
    /// or the page holds too few items and the overflow stays within tolerance
    fn accepts(&self, builder: &PageBuilder, height: f32) -> bool {
        let projected = builder.height() + height;
        if projected <= self.max_page_height {
            return true;
        }
        let sparse = builder.significant_count() < self.config.min_significant_elements_per_page;
        if sparse && projected <= self.max_page_height * self.config.overflow_tolerance_factor {
            tracing::trace!(projected, "Accepting overflow on sparse page");
            return true;
        }
        false
    }

    fn measure(&self, markup: &str) -> Result<f32, PaginationError> {
        Ok(self.measure.measure(markup, self.content_width)?)
    }

    fn check_cancelled(&self) -> Result<(), PaginationError> {
        match self.cancelled {
            Some(flag) if flag.load(Ordering::Relaxed) => Err(PaginationError::Cancelled),
            _ => Ok(()),
        }
    }
}

/// Accumulates items for the page being filled
#[derive(Default)]
struct PageBuilder {
    pages: Vec<Page>,
    items: Vec<PageItem>,
    height: f32,
}

impl PageBuilder {
    fn significant_count(&self) -> usize {
        self.items.len()
    }

    fn height(&self) -> f32 {
        self.height
    }

    fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    fn place(&mut self, item: PageItem, height: f32) {
        self.items.push(item);
        self.height += height;
    }

    /// Seal the current page; an empty page is never emitted
    fn close_page(&mut self) {
        if self.items.is_empty() {
            return;
        }
        let items = std::mem::take(&mut self.items);
        self.pages.push(Page::new(items, self.height));
        self.height = 0.0;
    }

    fn finish(mut self) -> Vec<Page> {
        self.close_page();
        self.pages
    }
}
