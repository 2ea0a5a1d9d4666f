//! HTML markup for diagram containers, rendered figures and error blocks.

use std::fmt::Write;

use mdwiki_renderer::{escape_html, unescape_html};

/// Class marking diagram containers picked up at display time.
pub const CONTAINER_CLASS: &str = "mermaid";

/// Container for display-time rendering.
///
/// The body holds the normalized text used for the first attempt;
/// `data-recovery` the recovered text for the retry and `data-source` the
/// raw text shown if both fail.
#[must_use]
pub fn client_container(index: usize, normalized: &str, recovered: &str, raw: &str) -> String {
    let mut html = String::with_capacity(normalized.len() + recovered.len() + raw.len() + 96);
    let _ = write!(
        html,
        r#"<div class="{CONTAINER_CLASS}" data-diagram="{index}" data-recovery="{}" data-source="{}">{}</div>"#,
        escape_html(recovered),
        escape_html(raw),
        escape_html(normalized),
    );
    html
}

/// Figure wrapping a graphic rendered at build time.
#[must_use]
pub fn figure(svg: &str, script: Option<&str>) -> String {
    let mut html = String::with_capacity(svg.len() + 64);
    html.push_str(r#"<figure class="diagram diagram-mermaid">"#);
    html.push_str(svg);
    if let Some(script) = script {
        let _ = write!(html, "<script>{script}</script>");
    }
    html.push_str("</figure>");
    html
}

/// Visible error block for a diagram neither attempt could render.
#[must_use]
pub fn error_block(message: &str, raw: &str) -> String {
    format!(
        "<pre class=\"diagram-error\">Error rendering chart: {}\n\nChart content:\n{}</pre>",
        escape_html(message),
        escape_html(raw)
    )
}

/// Read an attribute value from an opening tag, unescaped.
#[must_use]
pub fn attribute(open_tag: &str, name: &str) -> Option<String> {
    let mut rest = open_tag;
    while let Some(pos) = rest.find(name) {
        let preceded_by_space = rest[..pos].ends_with(char::is_whitespace);
        let after = rest[pos + name.len()..].trim_start();
        rest = &rest[pos + name.len()..];

        let Some(value) = after.strip_prefix('=') else {
            continue;
        };
        if !preceded_by_space {
            continue;
        }
        let value = value.trim_start();
        let quote = value.chars().next().filter(|c| *c == '"' || *c == '\'')?;
        let end = value[1..].find(quote)?;
        return Some(unescape_html(&value[1..=end]));
    }
    None
}
