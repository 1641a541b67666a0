//! Word-boundary paragraph splitting

use super::{PageBuilder, Paginator};
use crate::error::PaginationError;
use crate::types::{ContentNode, PageItem, ParagraphSlicer};
use std::sync::Arc;

/// Place `paragraph`, splitting it at word boundaries where it overflows.
///
/// The unplaced part of the paragraph, the whole of it at first and the
/// remaining words after each split, goes through the same overflow policy as
/// any other node: placed whole when it fits or the page is sparse enough to
/// tolerate it, otherwise cut to the longest word prefix that fits what is
/// left of the page. A page that cannot take a single further word is closed
/// and the remainder is considered again on the fresh page. The first word on
/// an empty page is always accepted so an oversized token cannot stall
/// pagination.
pub(super) fn place_paragraph(
    paginator: &Paginator<'_>,
    builder: &mut PageBuilder,
    paragraph: &Arc<ContentNode>,
) -> Result<(), PaginationError> {
    let Some(slicer) = ParagraphSlicer::new(paragraph) else {
        return Ok(());
    };
    let total = slicer.word_count();

    let mut start = 0;
    while start < total {
        paginator.check_cancelled()?;

        let height = if start == 0 {
            paginator.measure(paragraph.markup())?
        } else {
            paginator.measure(&slicer.markup(start, total))?
        };
        if paginator.accepts(builder, height) {
            place(builder, paragraph, &slicer, start, total, height);
            return Ok(());
        }

        let remaining = paginator.max_page_height - builder.height();
        let (mut end, mut fragment_height) =
            longest_prefix(paginator, &slicer, start, total, remaining)?;
        if end == start {
            if !builder.is_empty() {
                // Not a single word fits beside what the page already holds
                builder.close_page();
                continue;
            }
            end = start + 1;
            fragment_height = paginator.measure(&slicer.markup(start, end))?;
        }

        place(builder, paragraph, &slicer, start, end, fragment_height);
        start = end;
        if start < total {
            builder.close_page();
        }
    }

    Ok(())
}

/// Largest `end` in `start..total` whose slice `start..end` fits in
/// `remaining`, with its height; `start` itself when no word fits.
///
/// The whole remainder `start..total` is known not to fit. Slice heights grow
/// with the number of words, so the boundary is found by bisection.
fn longest_prefix(
    paginator: &Paginator<'_>,
    slicer: &ParagraphSlicer<'_>,
    start: usize,
    total: usize,
    remaining: f32,
) -> Result<(usize, f32), PaginationError> {
    let (mut fits, mut fits_height) = (start, 0.0);
    let mut too_long = total;
    while too_long - fits > 1 {
        let mid = fits + (too_long - fits) / 2;
        let height = paginator.measure(&slicer.markup(start, mid))?;
        if height <= remaining {
            fits = mid;
            fits_height = height;
        } else {
            too_long = mid;
        }
    }
    Ok((fits, fits_height))
}

fn place(
    builder: &mut PageBuilder,
    paragraph: &Arc<ContentNode>,
    slicer: &ParagraphSlicer<'_>,
    start: usize,
    end: usize,
    height: f32,
) {
    if start == 0 && end == slicer.word_count() {
        builder.place(PageItem::Node(Arc::clone(paragraph)), height);
        return;
    }
    if let Some(fragment) = slicer.fragment(start, end) {
        tracing::trace!(
            id = fragment.source_paragraph_id,
            start,
            end,
            height,
            "Placed paragraph fragment"
        );
        builder.place(PageItem::Fragment(fragment), height);
    }
}
