//! CLI command implementations

mod library;
mod reader;

pub use library::{delete, import, list, shelf, shelves};
pub use reader::{paginate_book, paginate_chapter, render, toc};
