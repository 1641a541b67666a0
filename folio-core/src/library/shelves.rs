//! The user's shelf list and view preference

use super::metadata::NO_SHELF;
use crate::storage::{StorageProvider, StorageResult};
use crate::types::Book;
use serde::{Deserialize, Serialize};

/// App data file holding shelves and preferences
pub const DATA_FILE: &str = "data.json";

/// Older file that only held the shelf list
pub const LEGACY_SHELVES_FILE: &str = "shelves.json";

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ShelfCollection {
    pub shelves: Vec<String>,
    pub is_grid_view: bool,
}

#[derive(Deserialize)]
struct LegacyShelves {
    #[serde(default, alias = "Shelves")]
    shelves: Vec<String>,
}

impl ShelfCollection {
    /// Load from `data.json`, migrating a legacy `shelves.json` when only that
    /// exists. Unreadable data yields an empty collection.
    pub async fn load(storage: &dyn StorageProvider) -> Self {
        match storage.read(DATA_FILE).await {
            Ok(data) => {
                return serde_json::from_slice(&data).unwrap_or_else(|e| {
                    tracing::warn!(error = %e, "Corrupt app data, starting with no shelves");
                    Self::default()
                });
            }
            Err(crate::error::StorageError::NotFound(_)) => {}
            Err(e) => {
                tracing::warn!(error = %e, "Could not read app data");
                return Self::default();
            }
        }

        let Ok(data) = storage.read(LEGACY_SHELVES_FILE).await else {
            return Self::default();
        };
        let legacy: LegacyShelves = match serde_json::from_slice(&data) {
            Ok(legacy) => legacy,
            Err(e) => {
                tracing::warn!(error = %e, "Corrupt legacy shelves file, ignoring it");
                return Self::default();
            }
        };

        let migrated = Self {
            shelves: legacy.shelves,
            is_grid_view: false,
        };
        match migrated.save(storage).await {
            Ok(()) => tracing::info!(shelves = migrated.shelves.len(), "Migrated legacy shelves"),
            Err(e) => tracing::warn!(error = %e, "Could not save migrated shelves"),
        }
        migrated
    }

    pub async fn save(&self, storage: &dyn StorageProvider) -> StorageResult<()> {
        storage.write(DATA_FILE, serde_json::to_vec(self)?).await
    }

    /// Add a shelf. Blank names and duplicates are rejected.
    pub fn add_shelf(&mut self, name: &str) -> bool {
        let name = name.trim();
        if name.is_empty() || self.contains(name) {
            return false;
        }
        self.shelves.push(name.to_string());
        true
    }

    pub fn remove_shelf(&mut self, name: &str) -> bool {
        let before = self.shelves.len();
        self.shelves.retain(|shelf| shelf != name);
        self.shelves.len() != before
    }

    pub fn contains(&self, name: &str) -> bool {
        self.shelves.iter().any(|shelf| shelf == name)
    }

    /// Shelves books are on that the collection does not list yet are added.
    /// Returns whether anything changed.
    pub fn adopt_book_shelves(&mut self, books: &[Book]) -> bool {
        let mut changed = false;
        for shelf in books.iter().filter_map(|book| book.shelf.as_deref()) {
            changed |= self.add_shelf(shelf);
        }
        changed
    }

    /// Choices for assigning a book: "None" first, then shelves alphabetically
    pub fn choices(&self) -> Vec<String> {
        let mut shelves = self.shelves.clone();
        shelves.sort();
        shelves.insert(0, NO_SHELF.to_string());
        shelves
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStorage;
    use crate::types::BookFormat;

    #[test]
    fn test_add_and_remove() {
        let mut shelves = ShelfCollection::default();
        assert!(shelves.add_shelf("  Fiction "));
        assert!(!shelves.add_shelf("Fiction"));
        assert!(!shelves.add_shelf("   "));
        assert!(shelves.add_shelf("Biography"));
        assert_eq!(shelves.shelves, vec!["Fiction", "Biography"]);
        assert_eq!(shelves.choices(), vec!["None", "Biography", "Fiction"]);

        assert!(shelves.remove_shelf("Fiction"));
        assert!(!shelves.remove_shelf("Fiction"));
    }

    #[test]
    fn test_adopt_book_shelves() {
        let mut shelves = ShelfCollection::default();
        shelves.add_shelf("Fiction");
        let books = vec![
            Book::new("a.epub", BookFormat::Epub).with_shelf(Some("Fiction".into())),
            Book::new("b.epub", BookFormat::Epub).with_shelf(Some("History".into())),
            Book::new("c.epub", BookFormat::Epub),
        ];
        assert!(shelves.adopt_book_shelves(&books));
        assert_eq!(shelves.shelves, vec!["Fiction", "History"]);
        assert!(!shelves.adopt_book_shelves(&books));
    }

    #[tokio::test]
    async fn test_round_trip() {
        let storage = MemoryStorage::new();
        let mut shelves = ShelfCollection::default();
        shelves.add_shelf("Fiction");
        shelves.is_grid_view = true;
        shelves.save(&storage).await.unwrap();
        assert_eq!(ShelfCollection::load(&storage).await, shelves);
    }

    #[tokio::test]
    async fn test_migrates_legacy_file() {
        let storage = MemoryStorage::new();
        storage
            .write(LEGACY_SHELVES_FILE, br#"{"shelves":["Old","Older"]}"#.to_vec())
            .await
            .unwrap();

        let shelves = ShelfCollection::load(&storage).await;
        assert_eq!(shelves.shelves, vec!["Old", "Older"]);
        assert!(!shelves.is_grid_view);
        assert!(storage.exists(DATA_FILE).await.unwrap());
    }

    #[tokio::test]
    async fn test_missing_files_give_empty_collection() {
        let storage = MemoryStorage::new();
        assert_eq!(ShelfCollection::load(&storage).await, ShelfCollection::default());
    }
}
