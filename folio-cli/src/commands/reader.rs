//! Reading commands: table of contents, pagination and page rendering

use anyhow::{bail, Context, Result};
use folio_core::{
    assets, open_source, BookSource, Library, NormalizedChapter, Paginator, ReaderConfig,
    ReaderSession, Viewport,
};
use indicatif::{ProgressBar, ProgressStyle};
use rayon::prelude::*;
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Serialize)]
struct ChapterLayout {
    chapter: usize,
    path: String,
    pages: Vec<String>,
}

#[derive(Serialize)]
struct BookLayout {
    viewport: Viewport,
    page_width: f32,
    page_height: f32,
    chapters: Vec<ChapterLayout>,
}

/// Print the table of contents with the chapter each entry opens
pub fn toc(library: &Library, file: &str) -> Result<()> {
    let source = open(library, file)?;
    let entries = source.table_of_contents();
    if entries.is_empty() {
        println!("No table of contents");
        return Ok(());
    }

    for entry in entries {
        let indent = "  ".repeat(entry.level as usize);
        let chapter = source
            .chapter_index(&entry.path)
            .map(|c| c.to_string())
            .unwrap_or_else(|| "?".to_string());
        match &entry.anchor {
            Some(anchor) => println!("{indent}{} [chapter {chapter}, #{anchor}]", entry.title),
            None => println!("{indent}{} [chapter {chapter}]", entry.title),
        }
    }
    Ok(())
}

/// Paginate one chapter through a reader session and print its page layout
pub async fn paginate_chapter(
    library: &Library,
    config: &ReaderConfig,
    file: &str,
    chapter: usize,
    viewport: Viewport,
    json: bool,
) -> Result<()> {
    let session = open_session(library, config, file, chapter, viewport).await?;
    let result = session
        .pagination()
        .context("Chapter produced no pagination")?;
    if let Some(message) = result.error() {
        bail!("Pagination failed: {}", message);
    }

    let pages: Vec<String> = result.pages().iter().map(|page| page.summary()).collect();
    let path = session
        .source()
        .chapters()
        .get(chapter)
        .map(|c| c.path.clone())
        .unwrap_or_default();
    print_layout(
        config,
        viewport,
        vec![ChapterLayout {
            chapter,
            path,
            pages,
        }],
        json,
    )
}

/// Paginate every chapter in parallel and print each chapter's layout
pub fn paginate_book(
    library: &Library,
    config: &ReaderConfig,
    file: &str,
    viewport: Viewport,
    json: bool,
) -> Result<()> {
    let source = open(library, file)?;
    let (width, height) = config.layout.page_box(viewport);
    let count = source.chapter_count();

    let pb = ProgressBar::new(count as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("[{elapsed_precise}] {bar:40.cyan/blue} {pos:>5}/{len:5} {msg}")?
            .progress_chars("##-"),
    );
    pb.set_message("chapters");

    let chapters: Vec<ChapterLayout> = (0..count)
        .into_par_iter()
        .map(|index| {
            let layout = layout_chapter(source.as_ref(), config, index, width, height);
            pb.inc(1);
            layout
        })
        .collect::<Result<_>>()?;
    pb.finish_and_clear();

    print_layout(config, viewport, chapters, json)
}

/// Print one page's self-contained markup
pub async fn render(
    library: &Library,
    config: &ReaderConfig,
    file: &str,
    chapter: usize,
    page: usize,
    viewport: Viewport,
    json: bool,
) -> Result<()> {
    let mut session = open_session(library, config, file, chapter, viewport).await?;
    let page_count = session.pagination().map_or(0, |p| p.page_count());
    if page >= page_count {
        bail!(
            "Page {} out of range: chapter {} has {} pages at {}x{}",
            page,
            chapter,
            page_count,
            viewport.width,
            viewport.height
        );
    }
    session.go_to_page(page)?;
    let rendered = session
        .current_page()
        .context("Page could not be rendered")?;

    if json {
        println!("{}", serde_json::to_string_pretty(&rendered)?);
    } else {
        println!("{}", rendered.markup);
    }
    Ok(())
}

fn layout_chapter(
    source: &dyn BookSource,
    config: &ReaderConfig,
    index: usize,
    width: f32,
    height: f32,
) -> Result<ChapterLayout> {
    let resource = source.chapter_content(index)?;
    let resolved = assets::resolve(
        &resource.content,
        &resource.base_directory(),
        source.resources(),
    );
    let chapter = NormalizedChapter::parse(&resolved);
    let pages = Paginator::new(&config.metrics, &config.pagination, height, width)
        .paginate(&chapter.nodes)
        .with_context(|| format!("Failed to paginate chapter {} ({})", index, resource.path))?;
    tracing::debug!(chapter = index, pages = pages.len(), "Laid out chapter");

    Ok(ChapterLayout {
        chapter: index,
        path: resource.path.clone(),
        pages: pages.iter().map(|page| page.summary()).collect(),
    })
}

fn print_layout(
    config: &ReaderConfig,
    viewport: Viewport,
    chapters: Vec<ChapterLayout>,
    json: bool,
) -> Result<()> {
    let (page_width, page_height) = config.layout.page_box(viewport);
    if json {
        let layout = BookLayout {
            viewport,
            page_width,
            page_height,
            chapters,
        };
        println!("{}", serde_json::to_string_pretty(&layout)?);
        return Ok(());
    }

    println!(
        "Viewport {}x{} (page {}x{})",
        viewport.width, viewport.height, page_width, page_height
    );
    for chapter in &chapters {
        println!(
            "Chapter {} ({}): {} pages",
            chapter.chapter,
            chapter.path,
            chapter.pages.len()
        );
        for (index, summary) in chapter.pages.iter().enumerate() {
            println!("  {:>4}  {}", index, summary);
        }
    }
    Ok(())
}

async fn open_session(
    library: &Library,
    config: &ReaderConfig,
    file: &str,
    chapter: usize,
    viewport: Viewport,
) -> Result<ReaderSession> {
    let source = open_book(library, file).await?;
    let mut session = ReaderSession::new(
        source,
        Arc::new(config.metrics.clone()),
        config.clone(),
        viewport,
    );
    session
        .open_chapter(chapter)
        .await
        .with_context(|| format!("Failed to open chapter {} of {}", chapter, file))?;
    Ok(session)
}

/// A path as given, or a file name inside the library
fn locate(library: &Library, file: &str) -> Result<PathBuf> {
    let direct = PathBuf::from(file);
    if direct.is_file() {
        return Ok(direct);
    }
    let in_library = library.root().join(file);
    if in_library.is_file() {
        return Ok(in_library);
    }
    bail!("No such book: {}", file)
}

fn open(library: &Library, file: &str) -> Result<Arc<dyn BookSource>> {
    let path = locate(library, file)?;
    open_source(&path).with_context(|| format!("Failed to open {}", path.display()))
}

/// [`open`] with the archive parsed on the blocking pool
async fn open_book(library: &Library, file: &str) -> Result<Arc<dyn BookSource>> {
    let path = locate(library, file)?;
    let shown = path.display().to_string();
    tokio::task::spawn_blocking(move || open_source(&path))
        .await
        .context("Book parsing task failed")?
        .with_context(|| format!("Failed to open {shown}"))
}
