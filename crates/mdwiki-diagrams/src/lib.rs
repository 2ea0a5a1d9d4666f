//! Mermaid diagram pipeline for mdwiki.
//!
//! - [`extract`] finds diagram regions in Markdown or rendered HTML
//! - [`normalize`] rewrites raw diagram text into canonical form at build time
//! - [`recover`] applies more aggressive rewrites after the engine rejected
//!   the normalized text
//! - [`DiagramRenderer`] runs the two-attempt render against a
//!   [`DiagramEngine`] and produces figures or visible error blocks
//! - [`DiagramProcessor`] plugs the pipeline into
//!   [`mdwiki_renderer::MarkdownRenderer`]
//!
//! # Example
//!
//! ```
//! use mdwiki_diagrams::{normalize, recover};
//!
//! assert_eq!(normalize("A -> B"), "flowchart TD\nA --> B");
//! assert_eq!(
//!     recover("graph TD A[Start] --> B[End]"),
//!     "graph TD\nA[Start]\nA --> B[End]"
//! );
//! ```

mod cache;
mod container;
mod engine;
mod extract;
mod kind;
mod kroki;
mod lint;
mod normalize;
mod processor;
mod recover;
mod render;
mod rewrite;

pub use cache::{CachedEngine, DiagramKey, SvgCache};
pub use container::{CONTAINER_CLASS, attribute, client_container, error_block, figure};
pub use engine::{DiagramEngine, EngineError, Graphic};
pub use extract::{DiagramBlock, Delimiter, Segment, canonicalize_fences, diagrams, extract};
pub use kind::DiagramKind;
pub use kroki::{KROKI_ENDPOINT, KrokiEngine, create_agent};
pub use lint::{LintIssue, Severity, lint};
pub use normalize::{NormalizedDiagram, normalize};
pub use processor::{DiagramMode, DiagramProcessor, ExtractedDiagram};
pub use recover::recover;
pub use render::{DiagramOutcome, DiagramRenderer, RenderState};
pub use rewrite::collapse_whitespace;
