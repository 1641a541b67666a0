//! The book's internal resource tree (stylesheets, images, fonts)

use std::collections::HashMap;

/// Named sub-resources of a book, keyed by their path inside the book.
///
/// Read-only once loaded; lookups normalize `\` separators to `/`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResourceTree {
    resources: HashMap<String, Vec<u8>>,
}

impl ResourceTree {
    /// Create an empty resource tree
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a resource at the given path
    pub fn insert(&mut self, path: impl Into<String>, data: impl Into<Vec<u8>>) {
        let path = path.into().replace('\\', "/");
        self.resources.insert(path, data.into());
    }

    /// Builder-style insert
    pub fn with(mut self, path: impl Into<String>, data: impl Into<Vec<u8>>) -> Self {
        self.insert(path, data);
        self
    }

    /// Get the raw bytes of a resource
    pub fn get(&self, path: &str) -> Option<&[u8]> {
        self.resources
            .get(&path.replace('\\', "/"))
            .map(|data| data.as_slice())
    }

    /// Get a resource as UTF-8 text
    pub fn get_text(&self, path: &str) -> Option<&str> {
        self.get(path).and_then(|data| std::str::from_utf8(data).ok())
    }

    pub fn contains(&self, path: &str) -> bool {
        self.get(path).is_some()
    }

    /// Iterate over all resource paths
    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.resources.keys().map(|k| k.as_str())
    }

    /// Number of resources in the tree
    pub fn len(&self) -> usize {
        self.resources.len()
    }

    /// Check if the tree is empty
    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }
}
