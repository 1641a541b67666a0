//! Per-book sidecar metadata

use crate::storage::{StorageProvider, StorageResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Shelf value meaning "not on any shelf"
pub const NO_SHELF: &str = "None";

/// Metadata kept beside each book as `<file name>.metadata.json`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct BookMetadata {
    pub shelf: String,

    /// Title read from the book when it was imported
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub date_added: Option<DateTime<Utc>>,
}

impl Default for BookMetadata {
    fn default() -> Self {
        Self {
            shelf: NO_SHELF.to_string(),
            title: None,
            author: None,
            date_added: None,
        }
    }
}

impl BookMetadata {
    /// Storage path of the sidecar for a book file
    pub fn sidecar_path(book_file_name: &str) -> String {
        format!("{book_file_name}.metadata.json")
    }

    /// The assigned shelf, `None` when the book is on no shelf
    pub fn shelf(&self) -> Option<&str> {
        let shelf = self.shelf.trim();
        (!shelf.is_empty() && shelf != NO_SHELF).then_some(shelf)
    }

    pub fn set_shelf(&mut self, shelf: Option<&str>) {
        self.shelf = shelf
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .unwrap_or(NO_SHELF)
            .to_string();
    }

    /// Load the sidecar of `book_file_name`. A missing or unreadable sidecar
    /// yields the default metadata.
    pub async fn load(storage: &dyn StorageProvider, book_file_name: &str) -> Self {
        let path = Self::sidecar_path(book_file_name);
        let data = match storage.read(&path).await {
            Ok(data) => data,
            Err(crate::error::StorageError::NotFound(_)) => return Self::default(),
            Err(e) => {
                tracing::warn!(path = %path, error = %e, "Could not read book metadata");
                return Self::default();
            }
        };
        serde_json::from_slice(&data).unwrap_or_else(|e| {
            tracing::warn!(path = %path, error = %e, "Corrupt book metadata, using defaults");
            Self::default()
        })
    }

    pub async fn save(&self, storage: &dyn StorageProvider, book_file_name: &str) -> StorageResult<()> {
        let data = serde_json::to_vec(self)?;
        storage.write(&Self::sidecar_path(book_file_name), data).await
    }
}
