//! Page URLs and output locations for document slugs.

use std::path::PathBuf;

use mdwiki_renderer::DOCS_PREFIX;
use percent_encoding::percent_decode_str;

/// Decode a requested path into a slug, dropping leading and trailing `/`.
pub fn decode_slug(path: &str) -> String {
    let trimmed = path.trim_matches('/');
    let trimmed = trimmed
        .strip_prefix(DOCS_PREFIX)
        .and_then(|rest| rest.strip_prefix('/'))
        .unwrap_or(trimmed);
    trimmed
        .split('/')
        .map(|segment| percent_decode_str(segment).decode_utf8_lossy().into_owned())
        .collect::<Vec<_>>()
        .join("/")
}

/// Output file for a slug, relative to the output directory.
pub fn output_path(slug: &str) -> PathBuf {
    let mut path = PathBuf::from(DOCS_PREFIX);
    path.extend(slug.split('/'));
    path.push("index.html");
    path
}
