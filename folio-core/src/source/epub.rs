//! EPUB source backed by the `epub` crate

use super::BookSource;
use crate::error::SourceError;
use crate::types::{BookFormat, ChapterResource, ResourceTree, TocEntry};
use epub::doc::{EpubDoc, NavPoint};
use std::collections::HashSet;
use std::io::{Read, Seek};
use std::path::Path;

const NCX_MIME: &str = "application/x-dtbncx+xml";

/// An EPUB 2/3 book, fully loaded into memory when opened
#[derive(Debug, Clone)]
pub struct EpubSource {
    title: Option<String>,
    author: Option<String>,
    chapters: Vec<ChapterResource>,
    toc: Vec<TocEntry>,
    resources: ResourceTree,
}

impl EpubSource {
    /// Open an EPUB file
    pub fn open(path: &Path) -> Result<Self, SourceError> {
        let doc = EpubDoc::new(path).map_err(|e| SourceError::InvalidEpub(e.to_string()))?;
        Self::from_doc(doc)
    }

    /// Read an EPUB from an in-memory archive
    pub fn from_bytes(data: Vec<u8>) -> Result<Self, SourceError> {
        let doc = EpubDoc::from_reader(std::io::Cursor::new(data))
            .map_err(|e| SourceError::InvalidEpub(e.to_string()))?;
        Self::from_doc(doc)
    }

    fn from_doc<R: Read + Seek>(mut doc: EpubDoc<R>) -> Result<Self, SourceError> {
        let title = doc.mdata("title").map(|item| item.value.clone());
        let author = doc.mdata("creator").map(|item| item.value.clone());

        // Reading order, minus the NCX and the EPUB 3 navigation document
        let spine_ids: Vec<String> = doc
            .spine
            .iter()
            .map(|item| item.idref.clone())
            .filter(|id| {
                doc.resources.get(id).is_some_and(|resource| {
                    resource.mime != NCX_MIME
                        && !resource
                            .properties
                            .as_deref()
                            .is_some_and(|p| p.split_whitespace().any(|p| p == "nav"))
                })
            })
            .collect();

        let mut chapters = Vec::with_capacity(spine_ids.len());
        for id in &spine_ids {
            let Some(path) = doc.resources.get(id).map(|r| archive_path(&r.path)) else {
                continue;
            };
            let Some((data, _mime)) = doc.get_resource(id) else {
                tracing::warn!(id = %id, path = %path, "Spine item missing from archive, skipping");
                continue;
            };
            let content = match String::from_utf8(data) {
                Ok(content) => content,
                Err(e) => {
                    tracing::warn!(path = %path, "Chapter is not valid UTF-8, decoding lossily");
                    String::from_utf8_lossy(e.as_bytes()).into_owned()
                }
            };
            chapters.push(ChapterResource::new(path, content));
        }

        let chapter_ids: HashSet<&String> = spine_ids.iter().collect();
        let resource_ids: Vec<String> = doc
            .resources
            .keys()
            .filter(|id| !chapter_ids.contains(id))
            .cloned()
            .collect();

        let mut resources = ResourceTree::new();
        for id in resource_ids {
            let Some(path) = doc.resources.get(&id).map(|r| archive_path(&r.path)) else {
                continue;
            };
            match doc.get_resource(&id) {
                Some((data, _mime)) => resources.insert(path, data),
                None => tracing::warn!(id = %id, path = %path, "Manifest item missing from archive"),
            }
        }

        let mut toc = Vec::new();
        flatten_toc(&doc.toc, 0, &mut toc);

        if chapters.is_empty() {
            return Err(SourceError::InvalidEpub("spine has no readable chapters".to_string()));
        }

        tracing::info!(
            title = title.as_deref().unwrap_or("<untitled>"),
            chapters = chapters.len(),
            toc_entries = toc.len(),
            resources = resources.len(),
            "Opened EPUB"
        );

        Ok(Self {
            title,
            author,
            chapters,
            toc,
            resources,
        })
    }
}

fn archive_path(path: &Path) -> String {
    path.to_string_lossy().replace('\\', "/")
}

fn flatten_toc(points: &[NavPoint], level: u32, out: &mut Vec<TocEntry>) {
    for point in points {
        let href = archive_path(&point.content);
        out.push(TocEntry::new(point.label.trim(), href).with_level(level));
        flatten_toc(&point.children, level + 1, out);
    }
}

impl BookSource for EpubSource {
    fn format(&self) -> BookFormat {
        BookFormat::Epub
    }

    fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    fn author(&self) -> Option<&str> {
        self.author.as_deref()
    }

    fn chapters(&self) -> &[ChapterResource] {
        &self.chapters
    }

    fn table_of_contents(&self) -> &[TocEntry] {
        &self.toc
    }

    fn resources(&self) -> &ResourceTree {
        &self.resources
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_non_archive() {
        let err = EpubSource::from_bytes(b"definitely not a zip".to_vec()).unwrap_err();
        assert!(matches!(err, SourceError::InvalidEpub(_)));
    }
}
