//! The book library: imported files, their sidecar metadata and the shelf
//! collection, all kept in one flat directory.

mod metadata;
mod shelves;

pub use metadata::{BookMetadata, NO_SHELF};
pub use shelves::{ShelfCollection, DATA_FILE, LEGACY_SHELVES_FILE};

use crate::error::{ReaderError, Result, SourceError, StorageError};
use crate::source::open_source;
use crate::storage::{LocalStorage, StorageProvider};
use crate::types::{Book, BookFormat};
use chrono::Utc;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::task::JoinHandle;

/// Shelf filter that matches every book
pub const ALL_BOOKS: &str = "All Books";

/// A directory of books
#[derive(Clone)]
pub struct Library {
    root: PathBuf,
    storage: Arc<dyn StorageProvider>,
}

impl Library {
    /// Library stored on the local filesystem under `root`
    pub fn open(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        let storage = Arc::new(LocalStorage::new(root.clone()));
        Self { root, storage }
    }

    /// Library on a custom storage backend; `root` is only used to build
    /// book paths
    pub fn with_storage(root: impl Into<PathBuf>, storage: Arc<dyn StorageProvider>) -> Self {
        Self {
            root: root.into(),
            storage,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn storage(&self) -> &Arc<dyn StorageProvider> {
        &self.storage
    }

    /// Copy a book file into the library and write its initial metadata
    #[tracing::instrument(skip_all, fields(source = %source.display()))]
    pub async fn import(&self, source: &Path) -> Result<Book> {
        let format = BookFormat::from_path(source).ok_or_else(|| {
            SourceError::UnsupportedFormat(source.display().to_string())
        })?;
        let file_name = source
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .ok_or_else(|| SourceError::ResourceNotFound(source.display().to_string()))?;

        // Validates the file and reads its own title and author
        let path = source.to_path_buf();
        let details = tokio::task::spawn_blocking(move || {
            open_source(&path).map(|book| {
                (
                    book.title().map(str::to_string),
                    book.author().map(str::to_string),
                )
            })
        })
        .await
        .map_err(|e| ReaderError::TaskFailed(e.to_string()))??;

        let data = tokio::fs::read(source).await?;
        let file_size = data.len() as u64;
        self.storage.write(&file_name, data).await?;

        let metadata = BookMetadata {
            title: details.0,
            author: details.1,
            date_added: Some(Utc::now()),
            ..BookMetadata::default()
        };
        metadata.save(self.storage.as_ref(), &file_name).await?;

        tracing::info!(file = %file_name, format = format.display_name(), "Imported book");
        Ok(self.book_from(&file_name, format, &metadata, file_size))
    }

    /// All supported books in the library, ordered by file name
    pub async fn list(&self) -> Result<Vec<Book>> {
        let entries = match self.storage.list("").await {
            Ok(entries) => entries,
            Err(StorageError::NotFound(_)) => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut books = Vec::new();
        for name in entries {
            let Some(format) = BookFormat::from_path(Path::new(&name)) else {
                continue;
            };
            let metadata = BookMetadata::load(self.storage.as_ref(), &name).await;
            let file_size = self.storage.size(&name).await.unwrap_or(0);
            books.push(self.book_from(&name, format, &metadata, file_size));
        }
        tracing::debug!(books = books.len(), "Listed library");
        Ok(books)
    }

    /// Books on `shelf`; [`ALL_BOOKS`] returns everything
    pub async fn books_on_shelf(&self, shelf: &str) -> Result<Vec<Book>> {
        Ok(self
            .list()
            .await?
            .into_iter()
            .filter(|book| book.is_on_shelf(shelf))
            .collect())
    }

    /// Look a book up by its file name
    pub async fn get(&self, file_name: &str) -> Result<Book> {
        let format = BookFormat::from_path(Path::new(file_name))
            .ok_or_else(|| SourceError::UnsupportedFormat(file_name.to_string()))?;
        if !self.storage.exists(file_name).await? {
            return Err(StorageError::NotFound(file_name.to_string()).into());
        }
        let metadata = BookMetadata::load(self.storage.as_ref(), file_name).await;
        let file_size = self.storage.size(file_name).await.unwrap_or(0);
        Ok(self.book_from(file_name, format, &metadata, file_size))
    }

    /// Remove a book file together with its sidecar
    pub async fn delete(&self, book: &Book) -> Result<()> {
        let file_name = book.file_name();
        self.storage.delete(&file_name).await?;
        match self.storage.delete(&BookMetadata::sidecar_path(&file_name)).await {
            Ok(()) | Err(StorageError::NotFound(_)) => {}
            Err(e) => return Err(e.into()),
        }
        tracing::info!(file = %file_name, "Deleted book");
        Ok(())
    }

    /// Record a shelf assignment in the background.
    ///
    /// The write never blocks the caller; failures are logged. The returned
    /// handle may be awaited or dropped.
    pub fn set_shelf(&self, book: &Book, shelf: Option<String>) -> JoinHandle<()> {
        let storage = Arc::clone(&self.storage);
        let file_name = book.file_name();
        tokio::spawn(async move {
            let mut metadata = BookMetadata::load(storage.as_ref(), &file_name).await;
            metadata.set_shelf(shelf.as_deref());
            match metadata.save(storage.as_ref(), &file_name).await {
                Ok(()) => tracing::debug!(file = %file_name, shelf = %metadata.shelf, "Saved shelf"),
                Err(e) => tracing::error!(file = %file_name, error = %e, "Failed to save shelf"),
            }
        })
    }

    /// Take every book off `shelf`, returning how many were moved
    pub async fn clear_shelf(&self, shelf: &str) -> Result<usize> {
        let books = self.books_on_shelf(shelf).await?;
        for book in &books {
            let mut metadata = BookMetadata::load(self.storage.as_ref(), &book.file_name()).await;
            metadata.set_shelf(None);
            metadata.save(self.storage.as_ref(), &book.file_name()).await?;
        }
        Ok(books.len())
    }

    /// The shelf collection, extended with any shelf a book is on
    pub async fn shelves(&self) -> Result<ShelfCollection> {
        let mut shelves = ShelfCollection::load(self.storage.as_ref()).await;
        let books = self.list().await?;
        if shelves.adopt_book_shelves(&books) {
            shelves.save(self.storage.as_ref()).await?;
        }
        Ok(shelves)
    }

    pub async fn save_shelves(&self, shelves: &ShelfCollection) -> Result<()> {
        Ok(shelves.save(self.storage.as_ref()).await?)
    }

    fn book_from(
        &self,
        file_name: &str,
        format: BookFormat,
        metadata: &BookMetadata,
        file_size: u64,
    ) -> Book {
        let mut book = Book::new(self.root.join(file_name), format)
            .with_shelf(metadata.shelf().map(str::to_string));
        if let Some(title) = &metadata.title {
            book.title = title.clone();
        }
        if let Some(author) = &metadata.author {
            book.author = author.clone();
        }
        if let Some(date_added) = metadata.date_added {
            book.date_added = date_added;
        }
        book.file_size = file_size;
        book
    }
}
