//! Page routes and relative link resolution.
//!
//! A document with slug `guide/setup` is served at `/docs/guide/setup/`.
//! Links between Markdown files are rewritten to those routes so they keep
//! working in the generated site.

use percent_encoding::{AsciiSet, CONTROLS, utf8_percent_encode};

/// Characters escaped inside a single path segment.
const SEGMENT: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'/')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'`')
    .add(b'{')
    .add(b'}');

/// URL prefix for document pages.
pub const DOCS_PREFIX: &str = "docs";

/// Percent-encode each `/`-separated segment of a slug.
#[must_use]
pub fn encode_slug(slug: &str) -> String {
    slug.split('/')
        .map(|segment| utf8_percent_encode(segment, SEGMENT).to_string())
        .collect::<Vec<_>>()
        .join("/")
}

/// Absolute page URL for a slug.
#[must_use]
pub fn page_url(slug: &str) -> String {
    format!("/{DOCS_PREFIX}/{}/", encode_slug(slug))
}

/// Rewrite a relative `.md` link into a page route.
///
/// `base_dir` is the slug directory of the document containing the link.
/// Links to other schemes, fragments and non-markdown files are returned
/// unchanged.
///
/// - `other.md` in `guide` → `/docs/guide/other/`
/// - `../intro.md#setup` in `guide/deep` → `/docs/guide/intro/#setup`
/// - `/api/index.md` anywhere → `/docs/api/index/`
#[allow(clippy::case_sensitive_file_extension_comparisons)]
pub(crate) fn resolve_link(url: &str, base_dir: &str) -> String {
    let is_external = url.contains("://")
        || url.starts_with("//")
        || url.starts_with("mailto:")
        || url.starts_with('#');
    let (path, fragment) = match url.find('#') {
        Some(pos) => url.split_at(pos),
        None => (url, ""),
    };
    let Some(path) = path.strip_suffix(".md").filter(|_| !is_external) else {
        return url.to_owned();
    };

    let mut segments: Vec<&str> = if path.starts_with('/') {
        Vec::new()
    } else {
        base_dir.split('/').filter(|s| !s.is_empty()).collect()
    };
    for component in path.split('/') {
        match component {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            other => segments.push(other),
        }
    }

    if segments.is_empty() {
        return url.to_owned();
    }
    format!("{}{fragment}", page_url(&segments.join("/")))
}
