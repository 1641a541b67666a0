//! Folio CLI - library management and a text-mode reading surface

mod commands;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use folio_core::{Library, ReaderConfig};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Parse a viewport dimension (must be positive)
fn parse_dimension(s: &str) -> Result<f32, String> {
    let n: f32 = s.parse().map_err(|_| format!("'{}' is not a valid number", s))?;
    if n.is_finite() && n > 0.0 {
        Ok(n)
    } else {
        Err("dimensions must be positive".to_string())
    }
}

#[derive(Parser)]
#[command(name = "folio")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Library directory
    #[arg(long, global = true, env = "FOLIO_LIBRARY", default_value = "library")]
    library: PathBuf,

    /// Reader configuration file (JSON)
    #[arg(long, global = true, env = "FOLIO_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Import a book file into the library
    Import {
        /// Book file path
        file: PathBuf,
    },

    /// List books in the library
    List {
        /// Only books on this shelf ("All Books" lists everything)
        #[arg(short, long)]
        shelf: Option<String>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Put a book on a shelf ("None" takes it off)
    Shelf {
        /// Book file name in the library
        file: String,

        /// Shelf name
        shelf: String,
    },

    /// Show or edit the shelf collection
    Shelves {
        /// Add a shelf
        #[arg(long)]
        add: Option<String>,

        /// Remove a shelf and take its books off it
        #[arg(long, conflicts_with = "add")]
        remove: Option<String>,
    },

    /// Delete a book and its metadata from the library
    Delete {
        /// Book file name in the library
        file: String,
    },

    /// Print a book's table of contents
    Toc {
        /// Book file (a path, or a file name in the library)
        file: String,
    },

    /// Paginate a chapter, or every chapter, for a viewport size
    Paginate {
        /// Book file (a path, or a file name in the library)
        file: String,

        /// Chapter index; all chapters when omitted
        #[arg(short, long)]
        chapter: Option<usize>,

        /// Viewport width
        #[arg(long, default_value = "1024", value_parser = parse_dimension)]
        width: f32,

        /// Viewport height
        #[arg(long, default_value = "768", value_parser = parse_dimension)]
        height: f32,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print the markup of one page
    Render {
        /// Book file (a path, or a file name in the library)
        file: String,

        /// Chapter index
        #[arg(short, long)]
        chapter: usize,

        /// Page index within the chapter
        #[arg(short, long, default_value = "0")]
        page: usize,

        /// Viewport width
        #[arg(long, default_value = "1024", value_parser = parse_dimension)]
        width: f32,

        /// Viewport height
        #[arg(long, default_value = "768", value_parser = parse_dimension)]
        height: f32,

        /// Output the rendered page as JSON
        #[arg(long)]
        json: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing
    let filter = if cli.verbose {
        "folio_cli=debug,folio_core=debug"
    } else {
        "folio_cli=info,folio_core=warn"
    };

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(filter))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let library = Library::open(&cli.library);
    let config = load_config(cli.config.as_ref()).await?;

    match cli.command {
        Commands::Import { file } => commands::import(&library, &file).await,

        Commands::List { shelf, json } => commands::list(&library, shelf.as_deref(), json).await,

        Commands::Shelf { file, shelf } => commands::shelf(&library, &file, &shelf).await,

        Commands::Shelves { add, remove } => {
            commands::shelves(&library, add.as_deref(), remove.as_deref()).await
        }

        Commands::Delete { file } => commands::delete(&library, &file).await,

        Commands::Toc { file } => commands::toc(&library, &file),

        Commands::Paginate {
            file,
            chapter,
            width,
            height,
            json,
        } => {
            let viewport = folio_core::Viewport::new(width, height);
            match chapter {
                Some(index) => {
                    commands::paginate_chapter(&library, &config, &file, index, viewport, json).await
                }
                None => commands::paginate_book(&library, &config, &file, viewport, json),
            }
        }

        Commands::Render {
            file,
            chapter,
            page,
            width,
            height,
            json,
        } => {
            let viewport = folio_core::Viewport::new(width, height);
            commands::render(&library, &config, &file, chapter, page, viewport, json).await
        }
    }
}

async fn load_config(path: Option<&PathBuf>) -> Result<ReaderConfig> {
    let Some(path) = path else {
        return Ok(ReaderConfig::default());
    };
    let config = ReaderConfig::load(path)
        .await
        .with_context(|| format!("Failed to load config {}", path.display()))?;
    tracing::debug!(path = %path.display(), "Loaded reader config");
    Ok(config)
}
