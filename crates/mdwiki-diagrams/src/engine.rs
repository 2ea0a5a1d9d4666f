//! The external diagram engine seam.

use std::sync::Arc;

/// A rendered diagram.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Graphic {
    /// SVG markup.
    pub svg: String,
    /// Script binding interactive hooks, appended after the SVG.
    pub script: Option<String>,
}

impl Graphic {
    #[must_use]
    pub fn svg(svg: impl Into<String>) -> Self {
        Self {
            svg: svg.into(),
            script: None,
        }
    }
}

/// Reasons an engine can reject a diagram.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EngineError {
    /// Transport failure before a response arrived.
    #[error("HTTP error: {0}")]
    Http(String),
    /// The engine answered with a non-success status.
    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },
    #[error("I/O error: {0}")]
    Io(String),
    /// The engine could not parse the diagram.
    #[error("{0}")]
    Rejected(String),
}

/// Turns canonical diagram text into a graphic.
///
/// `id` is unique per invocation, so engines that keep an internal registry
/// of rendered diagrams never see collisions.
pub trait DiagramEngine: Send + Sync {
    /// Render one diagram.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError`] when the engine rejects the text or cannot be
    /// reached.
    fn render(&self, id: &str, source: &str) -> Result<Graphic, EngineError>;
}

impl<T: DiagramEngine + ?Sized> DiagramEngine for Arc<T> {
    fn render(&self, id: &str, source: &str) -> Result<Graphic, EngineError> {
        (**self).render(id, source)
    }
}

impl<T: DiagramEngine + ?Sized> DiagramEngine for &T {
    fn render(&self, id: &str, source: &str) -> Result<Graphic, EngineError> {
        (**self).render(id, source)
    }
}
