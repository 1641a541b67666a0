//! Chapter resources in reading order

use serde::{Deserialize, Serialize};

/// One entry of the reading order: a unique resource path and its raw markup
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChapterResource {
    /// Path of the chapter inside the book's resource tree
    pub path: String,

    /// Raw chapter markup
    pub content: String,
}

impl ChapterResource {
    pub fn new(path: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            content: content.into(),
        }
    }

    /// Directory containing the chapter, used to resolve relative references.
    /// Backslash separators are normalized to `/`.
    pub fn base_directory(&self) -> String {
        let normalized = self.path.replace('\\', "/");
        match normalized.rfind('/') {
            Some(idx) => normalized[..idx].to_string(),
            None => String::new(),
        }
    }
}
