//! The Book type - one file in the library

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Document format, derived from the file extension
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum BookFormat {
    Epub,
    Pdf,
    Mobi,
    Audio,
}

impl BookFormat {
    /// Map a file extension (with or without the leading dot) to a format
    pub fn from_extension(ext: &str) -> Option<Self> {
        let ext = ext.trim_start_matches('.').to_lowercase();
        match ext.as_str() {
            "epub" => Some(Self::Epub),
            "pdf" => Some(Self::Pdf),
            "mobi" => Some(Self::Mobi),
            "mp3" => Some(Self::Audio),
            _ => None,
        }
    }

    /// Detect the format of a file path
    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|e| e.to_str())
            .and_then(Self::from_extension)
    }

    /// Canonical file extension, without the dot
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Epub => "epub",
            Self::Pdf => "pdf",
            Self::Mobi => "mobi",
            Self::Audio => "mp3",
        }
    }

    pub fn is_audiobook(&self) -> bool {
        matches!(self, Self::Audio)
    }

    /// Human-readable name
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Epub => "EPUB",
            Self::Pdf => "PDF",
            Self::Mobi => "MOBI",
            Self::Audio => "Audiobook",
        }
    }
}

/// A book in the library, identified by its file path
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Book {
    /// Path to the book file; this is the book's identity
    pub path: PathBuf,

    pub format: BookFormat,

    /// Best-effort title
    pub title: String,

    /// Best-effort author
    pub author: String,

    /// Shelf assignment, `None` when the book is on no shelf
    pub shelf: Option<String>,

    pub date_added: DateTime<Utc>,

    /// File size in bytes
    pub file_size: u64,
}

impl Book {
    /// Create a book record with a title derived from the file name
    pub fn new(path: impl Into<PathBuf>, format: BookFormat) -> Self {
        let path = path.into();
        let title = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "Untitled".to_string());
        Self {
            path,
            format,
            title,
            author: "Unknown".to_string(),
            shelf: None,
            date_added: Utc::now(),
            file_size: 0,
        }
    }

    /// Set title and author
    pub fn with_details(mut self, title: impl Into<String>, author: impl Into<String>) -> Self {
        self.title = title.into();
        self.author = author.into();
        self
    }

    /// Set the shelf
    pub fn with_shelf(mut self, shelf: Option<String>) -> Self {
        self.shelf = shelf;
        self
    }

    /// File name component of the path
    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    /// Whether the book sits on the given shelf. `"All Books"` matches everything.
    pub fn is_on_shelf(&self, shelf: &str) -> bool {
        shelf == crate::library::ALL_BOOKS || self.shelf.as_deref() == Some(shelf)
    }
}
