//! Asset resolution: makes a chapter self-contained by inlining its
//! stylesheets and images from the book's resource tree.

use crate::error::AssetError;
use crate::types::ResourceTree;
use base64::{engine::general_purpose::STANDARD, Engine};
use regex::{Captures, Regex};
use std::collections::HashMap;
use std::sync::LazyLock;

static LINK_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<link\b[^>]*>").expect("valid link regex"));
static IMG_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<img\b[^>]*>").expect("valid img regex"));
static SVG_IMAGE_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<image\b[^>]*>").expect("valid svg image regex"));
static CSS_URL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)url\(\s*(?:"([^"]*)"|'([^']*)'|([^)'"\s]*))\s*\)"#).expect("valid url regex")
});
static SRC_ATTR: LazyLock<Regex> = LazyLock::new(|| attribute_pattern("src"));
static HREF_ATTR: LazyLock<Regex> = LazyLock::new(|| attribute_pattern("href"));
static XLINK_HREF_ATTR: LazyLock<Regex> = LazyLock::new(|| attribute_pattern("xlink:href"));
static REL_ATTR: LazyLock<Regex> = LazyLock::new(|| attribute_pattern("rel"));

/// `name="value"` or `name='value'` inside a tag
fn attribute_pattern(name: &str) -> Regex {
    let pattern = format!(
        r#"(?is)\s{}\s*=\s*(?:"([^"]*)"|'([^']*)')"#,
        regex::escape(name)
    );
    Regex::new(&pattern).expect("valid attribute regex")
}

/// Resolve `markup` against `resources`, relative to `base_directory`.
///
/// Missing resources leave the original reference untouched.
pub fn resolve(markup: &str, base_directory: &str, resources: &ResourceTree) -> String {
    AssetResolver::new(resources).resolve(markup, base_directory)
}

/// Inlines stylesheet links and image references, caching encoded images
/// so a resource referenced several times is only encoded once.
pub struct AssetResolver<'a> {
    resources: &'a ResourceTree,
    data_uris: HashMap<String, String>,
}

impl<'a> AssetResolver<'a> {
    pub fn new(resources: &'a ResourceTree) -> Self {
        Self {
            resources,
            data_uris: HashMap::new(),
        }
    }

    pub fn resolve(&mut self, markup: &str, base_directory: &str) -> String {
        let with_styles = self.inline_stylesheets(markup, base_directory);
        let with_images = self.inline_attribute(&with_styles, &IMG_TAG, &[&*SRC_ATTR], base_directory);
        self.inline_attribute(
            &with_images,
            &SVG_IMAGE_TAG,
            &[&*XLINK_HREF_ATTR, &*HREF_ATTR],
            base_directory,
        )
    }

    /// Replace `<link rel="stylesheet" href="...">` with an embedded style block
    fn inline_stylesheets(&mut self, markup: &str, base_directory: &str) -> String {
        LINK_TAG
            .replace_all(markup, |caps: &Captures| {
                let tag = &caps[0];
                let is_stylesheet = find_attribute(tag, &REL_ATTR)
                    .map(|(_, rel)| {
                        rel.split_whitespace()
                            .any(|token| token.eq_ignore_ascii_case("stylesheet"))
                    })
                    .unwrap_or(false);
                let Some((_, href)) = find_attribute(tag, &HREF_ATTR) else {
                    return tag.to_string();
                };
                if !is_stylesheet || is_external(href) {
                    return tag.to_string();
                }

                let path = resolve_path(href, base_directory);
                match self.stylesheet(&path) {
                    Ok(css) => format!("<style type=\"text/css\">{css}</style>"),
                    Err(err) => {
                        tracing::warn!(error = %err, href, "Leaving stylesheet link unresolved");
                        tag.to_string()
                    }
                }
            })
            .into_owned()
    }

    /// Stylesheet text with its own `url(...)` references inlined
    fn stylesheet(&mut self, path: &str) -> Result<String, AssetError> {
        let bytes = self
            .resources
            .get(path)
            .ok_or_else(|| AssetError::MissingResource(path.to_string()))?;
        let css = std::str::from_utf8(bytes)
            .map_err(|_| AssetError::UnreadableStylesheet(path.to_string()))?
            .to_string();
        let css_directory = parent_directory(path);

        Ok(CSS_URL
            .replace_all(&css, |caps: &Captures| {
                let reference = caps
                    .get(1)
                    .or_else(|| caps.get(2))
                    .or_else(|| caps.get(3))
                    .map(|m| m.as_str())
                    .unwrap_or_default();
                if reference.is_empty() || is_external(reference) {
                    return caps[0].to_string();
                }
                let target = resolve_path(reference, &css_directory);
                match self.data_uri(&target) {
                    Ok(uri) => format!("url(\"{uri}\")"),
                    Err(err) => {
                        tracing::debug!(error = %err, reference, "Leaving stylesheet url unresolved");
                        caps[0].to_string()
                    }
                }
            })
            .into_owned())
    }

    /// Rewrite the first matching attribute of each tag to a data URI
    fn inline_attribute(
        &mut self,
        markup: &str,
        tag_pattern: &Regex,
        attributes: &[&Regex],
        base_directory: &str,
    ) -> String {
        tag_pattern
            .replace_all(markup, |caps: &Captures| {
                let tag = &caps[0];
                let Some((range, reference)) = attributes
                    .iter()
                    .find_map(|pattern| find_attribute(tag, pattern))
                else {
                    return tag.to_string();
                };
                if is_external(reference) {
                    return tag.to_string();
                }

                let path = resolve_path(reference, base_directory);
                match self.data_uri(&path) {
                    Ok(uri) => format!("{}{}{}", &tag[..range.start], uri, &tag[range.end..]),
                    Err(err) => {
                        tracing::warn!(error = %err, reference, "Leaving image reference unresolved");
                        tag.to_string()
                    }
                }
            })
            .into_owned()
    }

    fn data_uri(&mut self, path: &str) -> Result<String, AssetError> {
        if let Some(uri) = self.data_uris.get(path) {
            return Ok(uri.clone());
        }
        let bytes = self
            .resources
            .get(path)
            .ok_or_else(|| AssetError::MissingResource(path.to_string()))?;
        let uri = format!("data:{};base64,{}", mime_type_for(path), STANDARD.encode(bytes));
        self.data_uris.insert(path.to_string(), uri.clone());
        Ok(uri)
    }
}

/// Locate an attribute matched by `pattern` inside a tag, returning the byte
/// range of the value and the value itself
fn find_attribute<'t>(tag: &'t str, pattern: &Regex) -> Option<(std::ops::Range<usize>, &'t str)> {
    let caps = pattern.captures(tag)?;
    let value = caps.get(1).or_else(|| caps.get(2))?;
    Some((value.range(), value.as_str()))
}

/// References the resource tree can never satisfy
fn is_external(reference: &str) -> bool {
    let lower = reference.trim_start().to_ascii_lowercase();
    lower.starts_with("data:")
        || lower.starts_with("http:")
        || lower.starts_with("https:")
        || lower.starts_with("//")
}

/// Resolve a reference to a resource-tree path.
///
/// URL fragments are dropped, a leading `/` makes the path tree-absolute,
/// anything else is joined onto `base_directory`. `.` and `..` segments are
/// collapsed and `\` separators become `/`.
pub fn resolve_path(reference: &str, base_directory: &str) -> String {
    let reference = reference.split('#').next().unwrap_or_default().replace('\\', "/");
    let joined = if let Some(absolute) = reference.strip_prefix('/') {
        absolute.trim_start_matches('/').to_string()
    } else if base_directory.is_empty() {
        reference
    } else {
        format!("{}/{}", base_directory.replace('\\', "/").trim_end_matches('/'), reference)
    };

    let mut segments: Vec<&str> = Vec::new();
    for segment in joined.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            other => segments.push(other),
        }
    }
    segments.join("/")
}

fn parent_directory(path: &str) -> String {
    match path.rfind('/') {
        Some(idx) => path[..idx].to_string(),
        None => String::new(),
    }
}

/// MIME type from a file extension
pub fn mime_type_for(path: &str) -> &'static str {
    let ext = path
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "gif" => "image/gif",
        "svg" => "image/svg+xml",
        "webp" => "image/webp",
        _ => "application/octet-stream",
    }
}
