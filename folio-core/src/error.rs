//! Error types for Folio Core

use thiserror::Error;

/// Result type alias using FolioError
pub type Result<T> = std::result::Result<T, FolioError>;

/// Top-level error type for all Folio operations
#[derive(Debug, Error)]
pub enum FolioError {
    #[error("Source error: {0}")]
    Source(#[from] SourceError),

    #[error("Reader error: {0}")]
    Reader(#[from] ReaderError),

    #[error("Pagination error: {0}")]
    Pagination(#[from] PaginationError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors raised while resolving a chapter's stylesheets and images.
///
/// These never escape the asset resolver: they are logged and the original
/// reference is left in place.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum AssetError {
    #[error("Resource not found in book: {0}")]
    MissingResource(String),

    #[error("Stylesheet is not valid UTF-8: {0}")]
    UnreadableStylesheet(String),
}

/// Error returned by a measurement backend
#[derive(Debug, Error, Clone, PartialEq)]
#[error("Measurement failed: {0}")]
pub struct MeasureError(pub String);

impl MeasureError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

/// Errors that stop the pagination engine from producing pages
#[derive(Debug, Error, Clone, PartialEq)]
pub enum PaginationError {
    #[error(transparent)]
    Measure(#[from] MeasureError),

    #[error("Pagination was cancelled")]
    Cancelled,
}

/// Errors from the library/file layer that supplies chapters and resources
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    #[error("Invalid EPUB: {0}")]
    InvalidEpub(String),

    #[error("Resource not found: {0}")]
    ResourceNotFound(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors surfaced by reader session operations
#[derive(Debug, Error)]
pub enum ReaderError {
    #[error("Could not load chapter {index}: {reason}")]
    ChapterLoad { index: usize, reason: String },

    #[error("Navigation target not found: {0}")]
    NavigationTargetNotFound(String),

    #[error(transparent)]
    Source(#[from] SourceError),

    #[error("No chapter is loaded")]
    NotReady,

    #[error("Request was superseded by a newer one")]
    Cancelled,

    #[error("Nothing to retry")]
    NothingToRetry,

    #[error("Load task failed: {0}")]
    TaskFailed(String),
}

/// Errors that occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    #[error("Backend error: {0}")]
    BackendError(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Errors in reader configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid configuration value for {field}: {reason}")]
    Invalid { field: &'static str, reason: String },

    #[error("Could not parse configuration: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Could not read configuration: {0}")]
    Io(#[from] std::io::Error),
}
