//! HTML markup for elements whose output is not a plain tag pair.

use std::fmt::Write;

use crate::callout::CalloutKind;
use crate::state::escape_html;

pub(crate) fn code_block(lang: Option<&str>, content: &str, out: &mut String) {
    match lang {
        Some(lang) => {
            let _ = write!(
                out,
                r#"<pre><code class="language-{}">{}</code></pre>"#,
                escape_html(lang),
                escape_html(content)
            );
        }
        None => {
            let _ = write!(out, "<pre><code>{}</code></pre>", escape_html(content));
        }
    }
}

pub(crate) fn callout_start(kind: CalloutKind, out: &mut String) {
    let _ = write!(
        out,
        r#"<div class="callout callout-{class}"><div class="callout-icon-wrap">{icon}</div><div class="callout-body"><h4 class="callout-title">{heading}</h4><div class="callout-content">"#,
        class = kind.class(),
        icon = kind.icon(),
        heading = kind.heading(),
    );
}

pub(crate) fn callout_end(out: &mut String) {
    out.push_str("</div></div></div>");
}

pub(crate) fn image(src: &str, alt: &str, title: &str, out: &mut String) {
    let _ = write!(out, r#"<img src="{}""#, escape_html(src));
    if !title.is_empty() {
        let _ = write!(out, r#" title="{}""#, escape_html(title));
    }
    let _ = write!(out, r#" alt="{}">"#, escape_html(alt));
}
