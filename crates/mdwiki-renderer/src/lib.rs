//! Markdown to HTML rendering for mdwiki.
//!
//! [`MarkdownRenderer`] walks `pulldown-cmark` events and writes HTML,
//! turning GFM block-quote callouts into styled callout markup and handing
//! special fenced code blocks to registered [`CodeBlockProcessor`]s.
//!
//! # Example
//!
//! ```
//! use mdwiki_renderer::MarkdownRenderer;
//!
//! let result = MarkdownRenderer::new()
//!     .with_title_extraction()
//!     .render_markdown("# Hello\n\n> [!tip] Read the guide");
//! assert_eq!(result.title.as_deref(), Some("Hello"));
//! assert!(result.html.contains("callout-tip"));
//! ```

mod callout;
mod code_block;
mod fence;
mod html;
mod link;
mod renderer;
mod state;

pub use callout::{CalloutKind, CalloutPreprocessor};
pub use code_block::{CodeBlockProcessor, ProcessResult};
pub use fence::FenceTracker;
pub use link::{DOCS_PREFIX, encode_slug, page_url};
pub use renderer::{MarkdownRenderer, RenderResult};
pub use state::{TocEntry, escape_html, slugify, unescape_html};
