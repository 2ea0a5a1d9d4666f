//! Document rendering pipeline.
//!
//! [`render_document`] turns one Markdown source into HTML plus its parsed
//! front matter. Diagram regions are rewritten to fenced blocks first, so
//! every delimiter style reaches the diagram processor.

use mdwiki_diagrams::{DiagramMode, DiagramProcessor, canonicalize_fences};
use mdwiki_renderer::{MarkdownRenderer, TocEntry};

use crate::document::{Metadata, excerpt, resolve_title, split_front_matter};
use crate::route::decode_slug;
use crate::storage::{Storage, StorageError};

/// Result of rendering a Markdown document.
#[derive(Debug, Clone)]
pub struct RenderedDocument {
    /// Article HTML.
    pub html: String,
    /// Flattened front matter.
    pub metadata: Metadata,
    /// First H1 of the body, if any.
    pub heading: Option<String>,
    /// `h2` and deeper headings.
    pub toc: Vec<TocEntry>,
    /// Diagram failures and other non-fatal problems.
    pub warnings: Vec<String>,
}

/// A rendered document together with its listing fields.
#[derive(Debug, Clone)]
pub struct Page {
    pub slug: String,
    pub title: String,
    pub excerpt: String,
    pub document: RenderedDocument,
}

/// Error returned when a page cannot be produced.
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    /// No document exists for the slug.
    #[error("Document not found: {0}")]
    NotFound(String),
    /// The source exists but could not be turned into HTML.
    #[error("Failed to convert {slug}: {message}")]
    Conversion { slug: String, message: String },
}

/// Render raw Markdown, front matter included.
///
/// Relative `.md` links are left as written.
pub fn render_document(raw: &str, mode: &DiagramMode) -> RenderedDocument {
    render(MarkdownRenderer::new(), raw, mode)
}

/// Render raw Markdown located in slug directory `base_dir`.
///
/// Relative `.md` links are rewritten to page routes from that directory.
pub fn render_document_in(raw: &str, base_dir: &str, mode: &DiagramMode) -> RenderedDocument {
    render(MarkdownRenderer::new().with_base_dir(base_dir), raw, mode)
}

fn render(renderer: MarkdownRenderer, raw: &str, mode: &DiagramMode) -> RenderedDocument {
    let (metadata, body) = split_front_matter(raw);
    let body = canonicalize_fences(body);

    let result = renderer
        .with_title_extraction()
        .with_processor(DiagramProcessor::new(mode.clone()))
        .render_markdown(&body);

    RenderedDocument {
        html: result.html,
        metadata,
        heading: result.title,
        toc: result.toc,
        warnings: result.warnings,
    }
}

/// Read and render the document addressed by `slug`.
///
/// The whole page fails when the source is missing or unreadable.
pub fn load_page(
    storage: &dyn Storage,
    slug: &str,
    mode: &DiagramMode,
) -> Result<Page, RenderError> {
    let raw = storage.read(slug).map_err(|e| match e {
        StorageError::NotFound(_) => RenderError::NotFound(slug.to_owned()),
        other => RenderError::Conversion {
            slug: slug.to_owned(),
            message: other.to_string(),
        },
    })?;

    let base_dir = slug.rsplit_once('/').map_or("", |(dir, _)| dir);
    let document = render_document_in(&raw, base_dir, mode);
    let (_, body) = split_front_matter(&raw);

    for warning in &document.warnings {
        tracing::warn!(slug, warning = %warning, "Rendering warning");
    }

    Ok(Page {
        slug: slug.to_owned(),
        title: resolve_title(&document.metadata, body, slug),
        excerpt: excerpt(body),
        document,
    })
}

/// Load the page for a requested URL path such as `/docs/my%20notes/`.
pub fn load_route(
    storage: &dyn Storage,
    request_path: &str,
    mode: &DiagramMode,
) -> Result<Page, RenderError> {
    load_page(storage, &decode_slug(request_path), mode)
}
