//! Documents, page rendering and static site generation for mdwiki.
//!
//! [`render_document`] is the per-document pipeline: front matter, Markdown
//! conversion with callouts, and diagram containers. [`SiteBuilder`] runs it
//! over a whole [`Storage`] and writes the static site.
//!
//! # Example
//!
//! ```
//! use mdwiki_diagrams::DiagramMode;
//! use mdwiki_site::render_document;
//!
//! let document = render_document("---\ntitle: Intro\n---\n> [!TIP]\n> Start here", &DiagramMode::Client);
//! assert_eq!(document.metadata["title"], "Intro");
//! assert!(document.html.contains("callout-tip"));
//! ```

mod builder;
mod check;
mod document;
mod pipeline;
mod route;
mod storage;
mod template;

pub use builder::{BuildError, BuildFailure, BuildOptions, BuildReport, SiteBuilder, build_navigation};
pub use check::{CheckReport, Finding, check_corpus, check_document};
pub use document::{DEFAULT_EXCERPT, Metadata, excerpt, parse_metadata, resolve_title, split_front_matter};
pub use pipeline::{
    Page, RenderError, RenderedDocument, load_page, load_route, render_document, render_document_in,
};
pub use mdwiki_renderer::{DOCS_PREFIX, encode_slug, page_url};
pub use route::{decode_slug, output_path};
pub use storage::{DocumentEntry, FsStorage, MockStorage, Storage, StorageError};
pub use template::{IndexEntry, NavItemData, PageData, TocData, render_index, render_not_found, render_page};
