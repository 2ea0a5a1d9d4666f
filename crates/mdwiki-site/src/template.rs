//! HTML templates for generated pages.

use std::fmt::Write;

use mdwiki_renderer::escape_html as escape;

/// Navigation entry. Sections carry children and an empty path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavItemData {
    pub title: String,
    pub path: String,
    pub children: Vec<NavItemData>,
    pub is_active: bool,
}

/// Table of contents entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TocData {
    pub level: u8,
    pub title: String,
    pub id: String,
}

/// Everything needed to render a document page.
pub struct PageData {
    pub site_title: String,
    pub title: String,
    pub html_content: String,
    pub toc: Vec<TocData>,
    pub navigation: Vec<NavItemData>,
    /// Mermaid loader URL. Set in client mode only.
    pub mermaid_url: Option<String>,
}

/// One document in the index listing.
pub struct IndexEntry {
    pub title: String,
    pub url: String,
    pub excerpt: String,
}

const STYLE: &str = "\
body{margin:0;font-family:system-ui,sans-serif;color:#1f2937}
.layout{display:flex;min-height:100vh}
aside{width:280px;border-right:1px solid #e5e7eb;padding:1.5rem 1rem}
aside ul{list-style:none;padding-left:0.75rem;margin:0}
aside a{display:block;padding:0.25rem 0;color:#374151;text-decoration:none}
aside a.active{color:#1d4ed8;font-weight:600}
main{flex:1;max-width:56rem;padding:1.5rem 2rem}
.toc{width:220px;padding:1.5rem 1rem;font-size:0.875rem}
.toc .toc-h3{padding-left:0.75rem}
.callout{display:flex;gap:0.5rem;border-left:4px solid;padding:0.75rem;margin:1rem 0}
.callout-note{border-color:#2563eb}.callout-tip{border-color:#16a34a}.callout-warning{border-color:#d97706}
.callout-title{margin:0 0 0.25rem}
.diagram-error{background:#fef2f2;color:#991b1b;border:1px solid #fecaca;padding:0.75rem;white-space:pre-wrap}
";

/// Display-time renderer for client containers.
///
/// Attempt 1 renders the container body, attempt 2 the `data-recovery`
/// text, and a second failure replaces the container with the error block.
const DIAGRAM_SCRIPT: &str = r#"(function () {
  mermaid.initialize({ startOnLoad: false });
  var counter = 0;
  function escapeHtml(s) {
    return String(s).replace(/&/g, "&amp;").replace(/</g, "&lt;").replace(/>/g, "&gt;")
      .replace(/"/g, "&quot;").replace(/'/g, "&#x27;");
  }
  function uniqueId(prefix) {
    counter += 1;
    return prefix + "-" + Date.now().toString(36) + "-" + counter;
  }
  async function attempt(el, prefix, text) {
    var result = await mermaid.render(uniqueId(prefix), text);
    el.innerHTML = result.svg;
    if (result.bindFunctions) { result.bindFunctions(el); }
  }
  async function renderContainer(el) {
    var stored = el.textContent;
    var raw = el.hasAttribute("data-source") ? el.getAttribute("data-source") : stored;
    var recovered = el.hasAttribute("data-recovery") ? el.getAttribute("data-recovery") : stored;
    try {
      await attempt(el, "mermaid", stored);
    } catch (first) {
      try {
        await attempt(el, "mermaid-recovery", recovered);
      } catch (second) {
        var message = first && first.message ? first.message : first;
        el.outerHTML = '<pre class="diagram-error">Error rendering chart: ' + escapeHtml(message) +
          "\n\nChart content:\n" + escapeHtml(raw) + "</pre>";
      }
    }
  }
  document.querySelectorAll("div.mermaid[data-diagram]").forEach(function (el) {
    renderContainer(el);
  });
})();"#;

fn render_head(html: &mut String, title: &str) {
    html.push_str("<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n");
    html.push_str("<meta charset=\"utf-8\">\n");
    html.push_str("<meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">\n");
    let _ = writeln!(html, "<title>{}</title>", escape(title));
    html.push_str("<style>\n");
    html.push_str(STYLE);
    html.push_str("</style>\n</head>\n<body>\n");
}

fn page_title(title: &str, site_title: &str) -> String {
    if title.is_empty() || title == site_title {
        site_title.to_owned()
    } else {
        format!("{title} | {site_title}")
    }
}

/// Render a document page.
pub fn render_page(page: &PageData) -> String {
    let mut html = String::with_capacity(page.html_content.len() + 8192);

    render_head(&mut html, &page_title(&page.title, &page.site_title));
    html.push_str("<div class=\"layout\">\n");
    render_sidebar(&mut html, &page.site_title, &page.navigation);

    html.push_str("<main>\n<article class=\"prose\">\n");
    html.push_str(&page.html_content);
    html.push_str("\n</article>\n</main>\n");

    render_toc(&mut html, &page.toc);
    html.push_str("</div>\n");

    if let Some(url) = &page.mermaid_url {
        let _ = writeln!(html, "<script src=\"{}\"></script>", escape(url));
        html.push_str("<script>\n");
        html.push_str(DIAGRAM_SCRIPT);
        html.push_str("\n</script>\n");
    }

    html.push_str("</body>\n</html>\n");
    html
}

fn render_sidebar(html: &mut String, site_title: &str, items: &[NavItemData]) {
    html.push_str("<aside>\n");
    let _ = writeln!(html, "<a href=\"/\" class=\"site-title\"><strong>{}</strong></a>", escape(site_title));
    html.push_str("<nav>\n<ul>\n");
    render_nav_items(html, items);
    html.push_str("</ul>\n</nav>\n</aside>\n");
}

fn render_nav_items(html: &mut String, items: &[NavItemData]) {
    for item in items {
        html.push_str("<li>");
        if item.path.is_empty() {
            let _ = write!(html, "<span class=\"nav-section\">{}</span>", escape(&item.title));
        } else {
            let class = if item.is_active { " class=\"active\" aria-current=\"page\"" } else { "" };
            let _ = write!(
                html,
                "<a href=\"{}\"{class}>{}</a>",
                escape(&item.path),
                escape(&item.title),
            );
        }
        if !item.children.is_empty() {
            html.push_str("\n<ul>\n");
            render_nav_items(html, &item.children);
            html.push_str("</ul>\n");
        }
        html.push_str("</li>\n");
    }
}

/// Table of contents from `h2` and `h3` entries.
fn render_toc(html: &mut String, toc: &[TocData]) {
    let entries: Vec<_> = toc.iter().filter(|e| matches!(e.level, 2 | 3)).collect();
    if entries.is_empty() {
        return;
    }

    html.push_str("<nav class=\"toc\">\n<p><strong>On this page</strong></p>\n<ul>\n");
    for entry in entries {
        let _ = writeln!(
            html,
            "<li class=\"toc-h{}\"><a href=\"#{}\">{}</a></li>",
            entry.level,
            escape(&entry.id),
            escape(&entry.title),
        );
    }
    html.push_str("</ul>\n</nav>\n");
}

/// Render the index page listing every document.
pub fn render_index(site_title: &str, entries: &[IndexEntry]) -> String {
    let mut html = String::with_capacity(4096 + entries.len() * 256);

    render_head(&mut html, site_title);
    html.push_str("<main>\n");
    let _ = writeln!(html, "<h1>{}</h1>", escape(site_title));

    if entries.is_empty() {
        html.push_str("<p>No documents yet.</p>\n");
    } else {
        html.push_str("<ul class=\"doc-list\">\n");
        for entry in entries {
            let _ = writeln!(
                html,
                "<li><a href=\"{}\">{}</a><p>{}</p></li>",
                escape(&entry.url),
                escape(&entry.title),
                escape(&entry.excerpt),
            );
        }
        html.push_str("</ul>\n");
    }

    html.push_str("</main>\n</body>\n</html>\n");
    html
}

/// Render the catch-all page for unknown routes.
pub fn render_not_found(site_title: &str) -> String {
    let mut html = String::with_capacity(2048);
    render_head(&mut html, &page_title("Page not found", site_title));
    html.push_str("<main>\n<h1>404</h1>\n");
    html.push_str("<p>The page you are looking for does not exist.</p>\n");
    html.push_str("<p><a href=\"/\">Back to the index</a></p>\n");
    html.push_str("</main>\n</body>\n</html>\n");
    html
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn page(mermaid_url: Option<&str>) -> PageData {
        PageData {
            site_title: "Docs".to_owned(),
            title: "Guide <1>".to_owned(),
            html_content: "<p>Body</p>".to_owned(),
            toc: vec![
                TocData {
                    level: 2,
                    title: "Setup".to_owned(),
                    id: "setup".to_owned(),
                },
                TocData {
                    level: 4,
                    title: "Deep".to_owned(),
                    id: "deep".to_owned(),
                },
            ],
            navigation: vec![
                NavItemData {
                    title: "Guide".to_owned(),
                    path: "/docs/guide/".to_owned(),
                    children: Vec::new(),
                    is_active: true,
                },
                NavItemData {
                    title: "core".to_owned(),
                    path: String::new(),
                    children: vec![NavItemData {
                        title: "Loop".to_owned(),
                        path: "/docs/core/loop/".to_owned(),
                        children: Vec::new(),
                        is_active: false,
                    }],
                    is_active: false,
                },
            ],
            mermaid_url: mermaid_url.map(str::to_owned),
        }
    }

    #[test]
    fn test_render_page() {
        let html = render_page(&page(None));

        assert!(html.contains("<title>Guide &lt;1&gt; | Docs</title>"));
        assert!(html.contains("<a href=\"/docs/guide/\" class=\"active\" aria-current=\"page\">Guide</a>"));
        assert!(html.contains("<span class=\"nav-section\">core</span>"));
        assert!(html.contains("<a href=\"/docs/core/loop/\">Loop</a>"));
        assert!(html.contains("<article class=\"prose\">\n<p>Body</p>\n</article>"));
        assert!(html.contains("<a href=\"#setup\">Setup</a>"));
        assert!(!html.contains("#deep"));
        assert!(!html.contains("<script"));
    }

    #[test]
    fn test_client_mode_scripts() {
        let html = render_page(&page(Some("https://cdn.example/mermaid.js")));
        assert!(html.contains("<script src=\"https://cdn.example/mermaid.js\"></script>"));
        assert!(html.contains("\"mermaid-recovery\""));
        assert!(html.contains("Error rendering chart: "));
        assert_eq!(html.matches("<script").count(), 2);
    }

    #[test]
    fn test_render_index() {
        let entries = vec![IndexEntry {
            title: "A & B".to_owned(),
            url: "/docs/a%20b/".to_owned(),
            excerpt: "First...".to_owned(),
        }];
        let html = render_index("Docs", &entries);
        assert!(html.contains("<title>Docs</title>"));
        assert!(html.contains("<li><a href=\"/docs/a%20b/\">A &amp; B</a><p>First...</p></li>"));
    }

    #[test]
    fn test_render_empty_index() {
        assert!(render_index("Docs", &[]).contains("No documents yet."));
    }

    #[test]
    fn test_render_not_found() {
        let html = render_not_found("Docs");
        assert!(html.contains("<title>Page not found | Docs</title>"));
        assert!(html.contains("<h1>404</h1>"));
    }
}
