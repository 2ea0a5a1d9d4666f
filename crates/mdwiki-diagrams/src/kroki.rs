//! Server-side rendering through a Kroki instance.

use std::time::Duration;

use ureq::Agent;

use crate::engine::{DiagramEngine, EngineError, Graphic};

/// Kroki diagram type used for every request.
pub const KROKI_ENDPOINT: &str = "mermaid";

/// Create HTTP agent with the specified timeout.
///
/// Non-success statuses are returned as responses so their bodies can be
/// reported.
#[must_use]
pub fn create_agent(timeout: Duration) -> Agent {
    Agent::config_builder()
        .timeout_global(Some(timeout))
        .http_status_as_error(false)
        .build()
        .into()
}

/// [`DiagramEngine`] posting diagrams to `{url}/mermaid/svg`.
pub struct KrokiEngine {
    agent: Agent,
    url: String,
}

impl KrokiEngine {
    #[must_use]
    pub fn new(url: &str, timeout: Duration) -> Self {
        Self {
            agent: create_agent(timeout),
            url: url.trim_end_matches('/').to_owned(),
        }
    }

    /// Base URL without a trailing slash.
    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }

    fn endpoint_url(&self) -> String {
        format!("{}/{KROKI_ENDPOINT}/svg", self.url)
    }
}

impl DiagramEngine for KrokiEngine {
    fn render(&self, id: &str, source: &str) -> Result<Graphic, EngineError> {
        let url = self.endpoint_url();
        tracing::debug!(id, url = %url, "Rendering diagram via Kroki");

        let response = self
            .agent
            .post(&url)
            .header("Content-Type", "text/plain")
            .send(source.as_bytes())
            .map_err(|e| EngineError::Http(e.to_string()))?;

        let status = response.status().as_u16();
        let mut body = response.into_body();

        if status >= 400 {
            let error_body = body
                .read_to_string()
                .unwrap_or_else(|_| String::from("(unable to read error body)"));
            return Err(EngineError::Status {
                status,
                body: error_body.trim().to_owned(),
            });
        }

        let svg = body
            .read_to_string()
            .map_err(|e| EngineError::Io(e.to_string()))?;
        Ok(Graphic::svg(strip_xml_declaration(&svg)))
    }
}

/// Drop a leading `<?xml ...?>` declaration so the SVG can be inlined.
fn strip_xml_declaration(svg: &str) -> &str {
    let trimmed = svg.trim_start();
    if trimmed.starts_with("<?xml")
        && let Some(end) = trimmed.find("?>")
    {
        return trimmed[end + 2..].trim_start();
    }
    trimmed
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_endpoint_url() {
        let engine = KrokiEngine::new("https://kroki.io/", Duration::from_secs(5));
        assert_eq!(engine.url(), "https://kroki.io");
        assert_eq!(engine.endpoint_url(), "https://kroki.io/mermaid/svg");
    }

    #[test]
    fn test_strip_xml_declaration() {
        assert_eq!(
            strip_xml_declaration("<?xml version=\"1.0\"?>\n<svg></svg>"),
            "<svg></svg>"
        );
        assert_eq!(strip_xml_declaration("<svg></svg>"), "<svg></svg>");
    }

    #[test]
    fn test_unreachable_server_is_http_error() {
        let engine = KrokiEngine::new("http://127.0.0.1:1", Duration::from_secs(2));
        let result = engine.render("mermaid-test", "graph TD\nA --> B");
        assert!(matches!(result, Err(EngineError::Http(_))));
    }
}
