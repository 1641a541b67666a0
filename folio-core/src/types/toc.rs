//! Table of contents types

use serde::{Deserialize, Serialize};

/// A single entry in the table of contents.
///
/// TOC order is navigation order and need not match reading order.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TocEntry {
    /// Display title
    pub title: String,

    /// Path of the target chapter resource
    pub path: String,

    /// Optional in-chapter anchor (the URL fragment)
    pub anchor: Option<String>,

    /// Nesting level (0 = top level)
    pub level: u32,
}

impl TocEntry {
    /// Create a new TOC entry. A `#fragment` in `href` becomes the anchor.
    pub fn new(title: impl Into<String>, href: impl AsRef<str>) -> Self {
        let href = href.as_ref();
        let (path, anchor) = match href.split_once('#') {
            Some((path, anchor)) if !anchor.is_empty() => (path, Some(anchor.to_string())),
            Some((path, _)) => (path, None),
            None => (href, None),
        };
        Self {
            title: title.into(),
            path: path.to_string(),
            anchor,
            level: 0,
        }
    }

    /// Set the nesting level
    pub fn with_level(mut self, level: u32) -> Self {
        self.level = level;
        self
    }
}
