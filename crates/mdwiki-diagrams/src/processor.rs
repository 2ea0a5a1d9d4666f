//! Code block processor for Mermaid diagrams.
//!
//! [`DiagramProcessor`] replaces every `mermaid` code block with a
//! placeholder while the document is walked, then swaps the placeholders for
//! final markup in one batch: client containers, or build-time renders when
//! an engine is configured.

use std::collections::HashMap;
use std::sync::Arc;

use mdwiki_renderer::{CodeBlockProcessor, ProcessResult};
use uuid::Uuid;

use crate::container::client_container;
use crate::engine::DiagramEngine;
use crate::normalize::normalize;
use crate::recover::recover;
use crate::render::{DiagramOutcome, DiagramRenderer};

/// Fence languages handled as diagrams.
const LANGUAGES: [&str; 2] = ["mermaid", "kroki-mermaid"];

/// Where diagrams are turned into graphics.
#[derive(Clone, Default)]
pub enum DiagramMode {
    /// In the browser, by the page's display-time script.
    #[default]
    Client,
    /// At build time, through an engine.
    Server(Arc<dyn DiagramEngine>),
}

impl std::fmt::Debug for DiagramMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Client => f.write_str("Client"),
            Self::Server(_) => f.write_str("Server"),
        }
    }
}

/// A diagram code block captured during rendering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedDiagram {
    /// Code block index, used in the placeholder.
    pub index: usize,
    /// Text as written in the document.
    pub raw: String,
    /// Build-time normalized text.
    pub normalized: String,
}

/// Extracts diagram code blocks and replaces them after rendering.
#[derive(Debug)]
pub struct DiagramProcessor {
    mode: DiagramMode,
    /// Per-processor token that keeps placeholders distinct from document text.
    token: Uuid,
    extracted: Vec<ExtractedDiagram>,
    warnings: Vec<String>,
}

impl Default for DiagramProcessor {
    fn default() -> Self {
        Self::new(DiagramMode::Client)
    }
}

impl DiagramProcessor {
    #[must_use]
    pub fn new(mode: DiagramMode) -> Self {
        Self {
            mode,
            token: Uuid::new_v4(),
            extracted: Vec::new(),
            warnings: Vec::new(),
        }
    }

    fn placeholder(&self, index: usize) -> String {
        format!("<!--diagram-{}-{index}-->", self.token.simple())
    }

    /// Diagrams captured so far, in document order.
    #[must_use]
    pub fn extracted(&self) -> &[ExtractedDiagram] {
        &self.extracted
    }

    fn client_markup(&self) -> Vec<String> {
        self.extracted
            .iter()
            .enumerate()
            .map(|(n, diagram)| {
                client_container(n, &diagram.normalized, &recover(&diagram.raw), &diagram.raw)
            })
            .collect()
    }

    fn server_markup(&mut self, engine: &Arc<dyn DiagramEngine>) -> Vec<String> {
        let renderer = DiagramRenderer::new(Arc::clone(engine));
        let raws: Vec<&str> = self.extracted.iter().map(|d| d.raw.as_str()).collect();
        let outcomes = renderer.render_all(&raws);

        for (n, outcome) in outcomes.iter().enumerate() {
            if let DiagramOutcome::Failed { message, .. } = outcome {
                self.warnings.push(format!("diagram {n}: {message}"));
            }
        }
        outcomes.iter().map(DiagramOutcome::to_html).collect()
    }
}

impl CodeBlockProcessor for DiagramProcessor {
    fn process(
        &mut self,
        language: &str,
        _attrs: &HashMap<String, String>,
        source: &str,
        index: usize,
    ) -> ProcessResult {
        if !LANGUAGES.contains(&language) {
            return ProcessResult::PassThrough;
        }

        let raw = source.trim_end_matches('\n').to_owned();
        self.extracted.push(ExtractedDiagram {
            index,
            normalized: normalize(&raw),
            raw,
        });
        ProcessResult::Placeholder(self.placeholder(index))
    }

    fn post_process(&mut self, html: &mut String) {
        if self.extracted.is_empty() {
            return;
        }

        let markup = match self.mode.clone() {
            DiagramMode::Client => self.client_markup(),
            DiagramMode::Server(engine) => self.server_markup(&engine),
        };

        for (diagram, replacement) in self.extracted.iter().zip(markup) {
            *html = html.replace(&self.placeholder(diagram.index), &replacement);
        }
    }

    fn warnings(&self) -> &[String] {
        &self.warnings
    }
}
