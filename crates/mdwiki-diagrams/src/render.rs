//! Two-attempt diagram rendering.
//!
//! Each diagram moves through
//! `Pending -> Attempt1 -> {Rendered | Attempt2} -> {Rendered | Failed}`.
//! Attempt 1 submits the normalized text, attempt 2 the recovered raw text.
//! There is no third attempt, and diagrams never affect one another.

use rayon::prelude::*;
use uuid::Uuid;

use crate::container::{self, attribute};
use crate::engine::{DiagramEngine, EngineError, Graphic};
use crate::extract::{Delimiter, Segment, extract};
use crate::normalize::normalize;
use crate::recover::recover;

/// Per-diagram render state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RenderState {
    /// Not yet submitted (client containers stay here until display time).
    #[default]
    Pending,
    Attempt1,
    Attempt2,
    Rendered,
    Failed,
}

impl RenderState {
    /// State after the current attempt finished.
    #[must_use]
    pub fn after(self, succeeded: bool) -> Self {
        match (self, succeeded) {
            (Self::Pending, _) => Self::Attempt1,
            (Self::Attempt1 | Self::Attempt2, true) => Self::Rendered,
            (Self::Attempt1, false) => Self::Attempt2,
            (Self::Attempt2, false) => Self::Failed,
            (terminal, _) => terminal,
        }
    }

    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Rendered | Self::Failed)
    }

    fn id_prefix(self) -> &'static str {
        match self {
            Self::Attempt2 => "mermaid-recovery",
            _ => "mermaid",
        }
    }
}

/// Terminal result of rendering one diagram.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiagramOutcome {
    Rendered {
        graphic: Graphic,
        /// Whether the recovery attempt produced the graphic.
        recovered: bool,
    },
    Failed {
        /// Error of the first attempt.
        message: String,
        /// Original diagram text, before any normalization.
        raw: String,
    },
}

impl DiagramOutcome {
    #[must_use]
    pub fn state(&self) -> RenderState {
        match self {
            Self::Rendered { .. } => RenderState::Rendered,
            Self::Failed { .. } => RenderState::Failed,
        }
    }

    /// Figure markup, or the error block when both attempts failed.
    #[must_use]
    pub fn to_html(&self) -> String {
        match self {
            Self::Rendered { graphic, .. } => {
                container::figure(&graphic.svg, graphic.script.as_deref())
            }
            Self::Failed { message, raw } => container::error_block(message, raw),
        }
    }
}

/// Renders diagrams through a [`DiagramEngine`] with one recovery retry.
pub struct DiagramRenderer<E> {
    engine: E,
}

impl<E: DiagramEngine> DiagramRenderer<E> {
    pub fn new(engine: E) -> Self {
        Self { engine }
    }

    /// Render raw diagram text.
    #[must_use]
    pub fn render(&self, raw: &str) -> DiagramOutcome {
        self.render_stored(raw, raw)
    }

    /// Render a diagram whose stored text may already be normalized.
    ///
    /// `stored` feeds attempt 1 (normalized again, which is a no-op on
    /// normalized text); `raw` feeds the recovery attempt and the error block.
    #[must_use]
    pub fn render_stored(&self, stored: &str, raw: &str) -> DiagramOutcome {
        let state = RenderState::Attempt1;
        let first_error = match self.attempt(state, &normalize(stored)) {
            Ok(graphic) => {
                return DiagramOutcome::Rendered {
                    graphic,
                    recovered: false,
                };
            }
            Err(e) => e,
        };
        tracing::debug!(error = %first_error, "First render attempt failed, retrying with recovery");

        let state = state.after(false);
        match self.attempt(state, &recover(raw)) {
            Ok(graphic) => DiagramOutcome::Rendered {
                graphic,
                recovered: true,
            },
            Err(second_error) => {
                tracing::warn!(
                    error = %first_error,
                    retry_error = %second_error,
                    "Diagram could not be rendered"
                );
                DiagramOutcome::Failed {
                    message: first_error.to_string(),
                    raw: raw.to_owned(),
                }
            }
        }
    }

    fn attempt(&self, state: RenderState, text: &str) -> Result<Graphic, EngineError> {
        let id = format!("{}-{}", state.id_prefix(), Uuid::new_v4());
        tracing::trace!(id = %id, state = ?state, "Submitting diagram");
        self.engine.render(&id, text)
    }

    /// Render many diagrams in parallel. Outcomes keep the input order.
    #[must_use]
    pub fn render_all(&self, raws: &[&str]) -> Vec<DiagramOutcome> {
        raws.par_iter().map(|raw| self.render(raw)).collect()
    }

    /// Replace every diagram container in rendered HTML with its outcome.
    ///
    /// The container body is the stored text; a `data-source` attribute, when
    /// present, supplies the raw text. Other markup passes through verbatim.
    #[must_use]
    pub fn render_html(&self, html: &str) -> String {
        let segments = extract(html);
        let rendered: Vec<Option<String>> = segments
            .par_iter()
            .map(|segment| match segment {
                Segment::Diagram(block)
                    if matches!(block.delimiter, Delimiter::Container | Delimiter::CodeElement) =>
                {
                    let open_tag = block
                        .source
                        .find('>')
                        .map_or(block.source, |end| &block.source[..=end]);
                    let raw = attribute(open_tag, "data-source")
                        .unwrap_or_else(|| block.raw_text.clone());
                    Some(self.render_stored(&block.raw_text, &raw).to_html())
                }
                _ => None,
            })
            .collect();

        let mut out = String::with_capacity(html.len());
        for (segment, replacement) in segments.iter().zip(rendered) {
            match replacement {
                Some(markup) => out.push_str(&markup),
                None => out.push_str(segment.content()),
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use mdwiki_renderer::escape_html;
    use pretty_assertions::assert_eq;

    use super::*;

    struct AlwaysFail;

    impl DiagramEngine for AlwaysFail {
        fn render(&self, _id: &str, _source: &str) -> Result<Graphic, EngineError> {
            Err(EngineError::Rejected("Parse error on line 1".to_owned()))
        }
    }

    /// Succeeds with the escaped source, recording every call.
    #[derive(Default)]
    struct Echo {
        calls: Mutex<Vec<(String, String)>>,
    }

    impl DiagramEngine for Echo {
        fn render(&self, id: &str, source: &str) -> Result<Graphic, EngineError> {
            self.calls
                .lock()
                .unwrap()
                .push((id.to_owned(), source.to_owned()));
            Ok(Graphic::svg(format!("<svg>{}</svg>", escape_html(source))))
        }
    }

    /// Rejects any diagram whose header line carries statements.
    struct HeaderOnlyFirstLine;

    impl DiagramEngine for HeaderOnlyFirstLine {
        fn render(&self, _id: &str, source: &str) -> Result<Graphic, EngineError> {
            let first = source.lines().next().unwrap_or_default();
            if first.split_whitespace().count() > 2 {
                Err(EngineError::Rejected(format!("Unexpected token in '{first}'")))
            } else {
                Ok(Graphic::svg("<svg>ok</svg>"))
            }
        }
    }

    /// Fails only attempt 1.
    struct FailFirst;

    impl DiagramEngine for FailFirst {
        fn render(&self, id: &str, _source: &str) -> Result<Graphic, EngineError> {
            if id.starts_with("mermaid-recovery-") {
                Ok(Graphic {
                    svg: "<svg>recovered</svg>".to_owned(),
                    script: Some("bindFunctions()".to_owned()),
                })
            } else {
                Err(EngineError::Rejected("Lexical error".to_owned()))
            }
        }
    }

    #[test]
    fn test_state_transitions() {
        assert_eq!(RenderState::Pending.after(false), RenderState::Attempt1);
        assert_eq!(RenderState::Attempt1.after(true), RenderState::Rendered);
        assert_eq!(RenderState::Attempt1.after(false), RenderState::Attempt2);
        assert_eq!(RenderState::Attempt2.after(true), RenderState::Rendered);
        assert_eq!(RenderState::Attempt2.after(false), RenderState::Failed);
        assert_eq!(RenderState::Failed.after(true), RenderState::Failed);
        assert!(RenderState::Rendered.is_terminal());
        assert!(!RenderState::Attempt2.is_terminal());
    }

    #[test]
    fn test_first_attempt_uses_normalized_text() {
        let renderer = DiagramRenderer::new(Echo::default());
        let outcome = renderer.render("A -> B");

        assert_eq!(outcome.state(), RenderState::Rendered);
        let calls = renderer.engine.calls.lock().unwrap();
        assert_eq!(calls.len(), 1);
        assert!(calls[0].0.starts_with("mermaid-"));
        assert_eq!(calls[0].1, "flowchart TD\nA --> B");
    }

    #[test]
    fn test_recovery_escalation() {
        let renderer = DiagramRenderer::new(HeaderOnlyFirstLine);
        let outcome = renderer.render("graph TD A[Start] --> B[End]");
        assert_eq!(
            outcome,
            DiagramOutcome::Rendered {
                graphic: Graphic::svg("<svg>ok</svg>"),
                recovered: true,
            }
        );
    }

    #[test]
    fn test_recovery_binds_script() {
        let outcome = DiagramRenderer::new(FailFirst).render("graph TD\nA --> B");
        assert_eq!(
            outcome.to_html(),
            "<figure class=\"diagram diagram-mermaid\"><svg>recovered</svg>\
             <script>bindFunctions()</script></figure>"
        );
    }

    #[test]
    fn test_dual_failure_single_error_block() {
        let raw = "graph TD\nA[<b>] -> B & C";
        let outcome = DiagramRenderer::new(AlwaysFail).render(raw);
        assert_eq!(outcome.state(), RenderState::Failed);

        let html = outcome.to_html();
        assert_eq!(html.matches("class=\"diagram-error\"").count(), 1);
        assert!(html.contains("Error rendering chart: Parse error on line 1"));
        assert!(html.contains(&escape_html(raw)));
        assert!(!html.contains("<b>"));
        assert!(!html.contains("<svg"));
    }

    #[test]
    fn test_attempt_ids_are_unique() {
        let renderer = DiagramRenderer::new(Echo::default());
        let _ = renderer.render("pie");
        let _ = renderer.render("pie");
        let calls = renderer.engine.calls.lock().unwrap();
        assert_ne!(calls[0].0, calls[1].0);
    }

    #[test]
    fn test_render_all_independent() {
        let renderer = DiagramRenderer::new(HeaderOnlyFirstLine);
        let outcomes = renderer.render_all(&["graph TD\nA --> B", "pie title A B C", "gantt"]);

        let states: Vec<_> = outcomes.iter().map(DiagramOutcome::state).collect();
        assert_eq!(
            states,
            vec![RenderState::Rendered, RenderState::Failed, RenderState::Rendered]
        );
    }

    #[test]
    fn test_render_html_replaces_containers_only() {
        let html = concat!(
            "<p>Intro</p>\n",
            "<div class=\"mermaid\" data-diagram=\"0\" data-recovery=\"graph TD\" ",
            "data-source=\"A -&gt; &lt;oops\">graph TD\nA --&gt; B</div>\n",
            "<p>Outro</p>"
        );
        let out = DiagramRenderer::new(AlwaysFail).render_html(html);

        assert!(out.starts_with("<p>Intro</p>\n<pre class=\"diagram-error\">"));
        assert!(out.contains("Chart content:\nA -&gt; &lt;oops</pre>"));
        assert!(out.ends_with("</pre>\n<p>Outro</p>"));
    }

    #[test]
    fn test_render_html_without_containers_unchanged() {
        let html = "<p>No diagrams, just `mermaid` words.</p>";
        assert_eq!(DiagramRenderer::new(AlwaysFail).render_html(html), html);
    }
}
