//! Rewrites local `href`/`src` references in markup documents into public
//! blob URLs, leaving the rest of the document byte-for-byte intact.

use std::cell::Cell;

use lol_html::html_content::Element;
use lol_html::{HtmlRewriter, Settings, element};

use crate::locator::{BlobLocator, BlobTemplate, file_extension};
use crate::{ArchiveError, ArchiveResult, TRACING_TARGET_REWRITE};

type HandlerResult = Result<(), Box<dyn std::error::Error + Send + Sync>>;

/// Rewrites documents belonging to one upload.
#[derive(Debug, Clone, Copy)]
pub struct LinkRewriter<'a> {
    template: &'a BlobTemplate,
    app_id: &'a str,
    content_hash: &'a str,
}

impl<'a> LinkRewriter<'a> {
    /// Creates a rewriter for the upload identified by `app_id` and `content_hash`.
    pub fn new(template: &'a BlobTemplate, app_id: &'a str, content_hash: &'a str) -> Self {
        Self {
            template,
            app_id,
            content_hash,
        }
    }

    /// Returns `html` with every local reference replaced by its public URL.
    ///
    /// `document_path` is the document's `/`-separated path relative to the
    /// extraction root; references are resolved against its directory.
    pub fn rewrite(&self, document_path: &str, html: &[u8]) -> ArchiveResult<Vec<u8>> {
        let document_dir = parent_dir(document_path);
        let rewritten = Cell::new(0usize);
        let mut output = Vec::with_capacity(html.len() + html.len() / 8);

        let mut rewriter = HtmlRewriter::new(
            Settings {
                element_content_handlers: vec![
                    element!("[href]", |el| {
                        self.rewrite_attribute(el, "href", document_dir, &rewritten)
                    }),
                    element!("[src]", |el| {
                        self.rewrite_attribute(el, "src", document_dir, &rewritten)
                    }),
                ],
                ..Settings::new()
            },
            |chunk: &[u8]| output.extend_from_slice(chunk),
        );

        rewriter
            .write(html)
            .map_err(|e| ArchiveError::Rewrite(e.to_string()))?;
        rewriter
            .end()
            .map_err(|e| ArchiveError::Rewrite(e.to_string()))?;

        tracing::trace!(
            target: TRACING_TARGET_REWRITE,
            document = %document_path,
            rewritten = rewritten.get(),
            "Document rewritten"
        );

        Ok(output)
    }

    /// Returns the public URL for `reference` found in a document located in
    /// `document_dir`, or `None` when the reference is not local.
    pub fn rewrite_reference(&self, document_dir: &str, reference: &str) -> Option<String> {
        if !is_local_reference(reference) {
            return None;
        }

        let file_name = resolve_reference(document_dir, reference);
        let locator = BlobLocator::new(self.app_id, self.content_hash, &file_name);
        Some(self.template.render(&locator))
    }

    fn rewrite_attribute(
        &self,
        element: &mut Element<'_, '_>,
        attribute: &str,
        document_dir: &str,
        rewritten: &Cell<usize>,
    ) -> HandlerResult {
        let Some(value) = element.get_attribute(attribute) else {
            return Ok(());
        };

        if let Some(url) = self.rewrite_reference(document_dir, &value) {
            element.set_attribute(attribute, &url)?;
            rewritten.set(rewritten.get() + 1);
        }

        Ok(())
    }
}

/// Returns `true` for references that point at a file inside the archive.
///
/// Empty values, fragments, protocol-relative URLs and anything carrying a
/// URI scheme (`http:`, `https:`, `javascript:`, `data:`, ...) are external.
pub fn is_local_reference(value: &str) -> bool {
    !(value.is_empty() || value.starts_with('#') || value.starts_with("//") || has_scheme(value))
}

/// Resolves `reference` against `document_dir`.
///
/// `.` and empty segments are ignored, `..` drops the last component
/// (never climbing above the root) and any other segment is appended.
pub fn resolve_reference(document_dir: &str, reference: &str) -> String {
    let mut components: Vec<&str> = document_dir
        .split('/')
        .filter(|component| !component.is_empty())
        .collect();

    for segment in reference.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                components.pop();
            }
            other => components.push(other),
        }
    }

    components.join("/")
}

/// Returns `true` if `path` names an HTML document.
pub fn is_html_document(path: &str) -> bool {
    file_extension(path)
        .is_some_and(|ext| ext.eq_ignore_ascii_case("html") || ext.eq_ignore_ascii_case("htm"))
}

fn has_scheme(value: &str) -> bool {
    let Some((scheme, _)) = value.split_once(':') else {
        return false;
    };

    let mut chars = scheme.chars();
    chars.next().is_some_and(|c| c.is_ascii_alphabetic())
        && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
}

fn parent_dir(path: &str) -> &str {
    path.rsplit_once('/').map_or("", |(dir, _)| dir)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rewrite(document: &str, html: &str) -> String {
        let template = BlobTemplate::default();
        let rewriter = LinkRewriter::new(&template, "app", "h");
        let output = rewriter.rewrite(document, html.as_bytes()).unwrap();
        String::from_utf8(output).unwrap()
    }

    #[test]
    fn external_references_are_untouched() {
        for value in [
            "http://example.com/a.js",
            "https://cdn.example/x.js",
            "javascript:void(0)",
            "#top",
            "",
        ] {
            assert!(!is_local_reference(value), "{value} should be external");
        }
    }

    #[test]
    fn relative_references_are_local() {
        for value in ["style.css", "./img/a.png", "../up.js", "/rooted.css", "1a:b.png"] {
            assert!(is_local_reference(value), "{value} should be local");
        }
        assert!(!is_local_reference("data:image/png;base64,AAAA"));
        assert!(!is_local_reference("//cdn.example/x.js"));
    }

    #[test]
    fn parent_segments_pop_directories() {
        assert_eq!(resolve_reference("dir", "../img/a.png"), "img/a.png");
        assert_eq!(resolve_reference("a/b/c", "../../x/y.css"), "a/x/y.css");
        assert_eq!(resolve_reference("a", "../../../z.js"), "z.js");
    }

    #[test]
    fn dot_segments_are_no_ops() {
        assert_eq!(resolve_reference("dir", "./img/./a.png"), "dir/img/a.png");
        assert_eq!(resolve_reference("", "style.css"), "style.css");
        assert_eq!(resolve_reference("site", "css//main.css"), "site/css/main.css");
    }

    #[test]
    fn rewrites_local_links_only() {
        let html = r##"<html><head><link rel="stylesheet" href="style.css"><script src="https://cdn.example/x.js"></script></head><body><a href="#top">top</a><img src="../img/a.png"></body></html>"##;

        let output = rewrite("site/index.html", html);

        assert!(output.contains(r#"href="/blob/app/h/site/style.css""#));
        assert!(output.contains(r#"src="https://cdn.example/x.js""#));
        assert!(output.contains(r##"href="#top""##));
        assert!(output.contains(r#"src="/blob/app/h/img/a.png""#));
    }

    #[test]
    fn rewrites_both_attributes_of_one_element() {
        let output = rewrite("index.html", r#"<embed href="a.css" src="b.js">"#);

        assert_eq!(
            output,
            r#"<embed href="/blob/app/h/a.css" src="/blob/app/h/b.js">"#
        );
    }

    #[test]
    fn preserves_untouched_markup() {
        let html = "<!DOCTYPE html>\n<p class=\"x\">Hello <b>world</b></p>\n";
        assert_eq!(rewrite("index.html", html), html);
    }

    #[test]
    fn resolves_against_the_document_directory() {
        let template = BlobTemplate::default();
        let rewriter = LinkRewriter::new(&template, "app", "h");

        assert_eq!(
            rewriter.rewrite_reference("sub/dir", "../img/a.png").as_deref(),
            Some("/blob/app/h/sub/img/a.png")
        );
        assert_eq!(rewriter.rewrite_reference("sub", "https://x.y/z"), None);
    }

    #[test]
    fn detects_html_documents() {
        assert!(is_html_document("site/index.html"));
        assert!(is_html_document("PAGE.HTM"));
        assert!(!is_html_document("style.css"));
        assert!(!is_html_document("html"));
    }
}
