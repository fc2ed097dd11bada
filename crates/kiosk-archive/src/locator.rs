//! Public addressing of published assets.

use std::fmt;

/// Template used when none is configured.
pub const DEFAULT_BLOB_TEMPLATE: &str = "/blob/{app_id}/{hash}/{file_name}";

/// The triple that addresses one published asset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlobLocator<'a> {
    /// Application the archive was uploaded for.
    pub app_id: &'a str,
    /// Content hash of the uploaded archive.
    pub content_hash: &'a str,
    /// Path of the asset inside the expanded tree, `/`-separated.
    pub file_name: &'a str,
}

impl<'a> BlobLocator<'a> {
    /// Creates a new locator.
    pub fn new(app_id: &'a str, content_hash: &'a str, file_name: &'a str) -> Self {
        Self {
            app_id,
            content_hash,
            file_name,
        }
    }

    /// Returns the object-store key for this asset: `app_id/hash/file_name`.
    pub fn storage_key(&self) -> String {
        format!("{}/{}/{}", self.app_id, self.content_hash, self.file_name)
    }

    /// Returns a locator for another file of the same upload.
    pub fn with_file_name(&self, file_name: &'a str) -> Self {
        Self { file_name, ..*self }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    AppId,
    Hash,
    FileName,
}

/// URL template with `{app_id}`, `{hash}` and `{file_name}` placeholders.
///
/// Placeholders are resolved in a single pass, so substituted values are never
/// re-scanned. Unknown `{...}` groups are kept literally.
#[derive(Clone, PartialEq, Eq)]
pub struct BlobTemplate {
    source: String,
    segments: Vec<Segment>,
}

impl BlobTemplate {
    /// Parses a template string.
    pub fn new(source: impl Into<String>) -> Self {
        let source = source.into();
        let segments = parse_segments(&source);
        Self { source, segments }
    }

    /// Formats `locator` through the template.
    pub fn render(&self, locator: &BlobLocator<'_>) -> String {
        let mut url = String::with_capacity(self.source.len() + locator.file_name.len() + 64);
        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => url.push_str(text),
                Segment::AppId => url.push_str(locator.app_id),
                Segment::Hash => url.push_str(locator.content_hash),
                Segment::FileName => url.push_str(locator.file_name),
            }
        }
        url
    }

    /// Returns the template as configured.
    pub fn as_str(&self) -> &str {
        &self.source
    }
}

impl Default for BlobTemplate {
    fn default() -> Self {
        Self::new(DEFAULT_BLOB_TEMPLATE)
    }
}

impl fmt::Debug for BlobTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("BlobTemplate").field(&self.source).finish()
    }
}

impl fmt::Display for BlobTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

fn parse_segments(source: &str) -> Vec<Segment> {
    let mut segments = Vec::new();
    let mut literal = String::new();
    let mut rest = source;

    while let Some(open) = rest.find('{') {
        literal.push_str(&rest[..open]);
        let after = &rest[open..];

        let Some(close) = after.find('}') else {
            literal.push_str(after);
            rest = "";
            break;
        };

        let placeholder = match &after[1..close] {
            "app_id" => Some(Segment::AppId),
            "hash" => Some(Segment::Hash),
            "file_name" => Some(Segment::FileName),
            _ => None,
        };

        match placeholder {
            Some(segment) => {
                if !literal.is_empty() {
                    segments.push(Segment::Literal(std::mem::take(&mut literal)));
                }
                segments.push(segment);
            }
            None => literal.push_str(&after[..=close]),
        }

        rest = &after[close + 1..];
    }

    literal.push_str(rest);

    if !literal.is_empty() {
        segments.push(Segment::Literal(literal));
    }

    segments
}

/// Returns the extension of the last path segment, without the dot.
pub fn file_extension(path: &str) -> Option<&str> {
    let name = path.rsplit('/').next().unwrap_or(path);
    let (_, extension) = name.rsplit_once('.')?;
    (!extension.is_empty()).then_some(extension)
}

/// Returns the storage key of the raw archive for an entry document.
///
/// The archive is stored next to the entry document, under the same stem with
/// the archive's own extension: `app/hash/site/index.html` uploaded as
/// `bundle.zip` is stored at `app/hash/site/index.zip`.
pub fn archive_storage_path(index: &BlobLocator<'_>, archive_file_name: &str) -> String {
    let key = index.storage_key();

    let (Some(index_extension), Some(archive_extension)) = (
        file_extension(index.file_name),
        file_extension(archive_file_name),
    ) else {
        return key;
    };

    match key.strip_suffix(index_extension) {
        Some(stem) => format!("{stem}{}", archive_extension.to_ascii_lowercase()),
        None => key,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_default_template() {
        let template = BlobTemplate::default();
        let locator = BlobLocator::new("app", "abc123", "site/index.html");
        assert_eq!(template.render(&locator), "/blob/app/abc123/site/index.html");
    }

    #[test]
    fn renders_absolute_template() {
        let template = BlobTemplate::new("https://cdn.example.com/sites/{hash}/{file_name}?app={app_id}");
        let locator = BlobLocator::new("a1", "h", "img/logo.png");
        assert_eq!(
            template.render(&locator),
            "https://cdn.example.com/sites/h/img/logo.png?app=a1"
        );
    }

    #[test]
    fn substituted_values_are_not_rescanned() {
        let template = BlobTemplate::default();
        let locator = BlobLocator::new("{hash}", "h", "{app_id}.css");
        assert_eq!(template.render(&locator), "/blob/{hash}/h/{app_id}.css");
    }

    #[test]
    fn unknown_and_unclosed_braces_stay_literal() {
        let template = BlobTemplate::new("/x/{other}/{hash}/{file_name");
        let locator = BlobLocator::new("a", "h", "f");
        assert_eq!(template.render(&locator), "/x/{other}/h/{file_name");
    }

    #[test]
    fn extracts_extensions() {
        assert_eq!(file_extension("site/index.html"), Some("html"));
        assert_eq!(file_extension("bundle.tar.zip"), Some("zip"));
        assert_eq!(file_extension("dir.d/README"), None);
        assert_eq!(file_extension("trailing."), None);
    }

    #[test]
    fn archive_path_swaps_extension() {
        let index = BlobLocator::new("app", "h", "site/index.html");
        assert_eq!(archive_storage_path(&index, "Bundle.ZIP"), "app/h/site/index.zip");

        let root = BlobLocator::new("app", "h", "index.htm");
        assert_eq!(archive_storage_path(&root, "bundle.zip"), "app/h/index.zip");
    }

    #[test]
    fn storage_key_joins_the_triple() {
        let locator = BlobLocator::new("app", "h", "a/b.css");
        assert_eq!(locator.storage_key(), "app/h/a/b.css");
        assert_eq!(locator.with_file_name("c.js").storage_key(), "app/h/c.js");
    }
}
