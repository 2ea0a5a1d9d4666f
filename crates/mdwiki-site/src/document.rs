//! Front matter, titles and excerpts.
//!
//! A document may start with a YAML block between two `---` lines. The block
//! is flattened into a string map: scalars are stringified, sequences and
//! mappings are kept as compact JSON. Anything that is not a YAML mapping
//! yields an empty map, and the body is still rendered.

use std::collections::BTreeMap;

use serde_yaml::Value;

/// Flattened front matter.
pub type Metadata = BTreeMap<String, String>;

/// Excerpt used when a document has no prose line.
pub const DEFAULT_EXCERPT: &str = "Documentation file";

const EXCERPT_CHARS: usize = 150;
const DELIMITER: &str = "---";

/// Split the leading front matter block off `raw`.
///
/// Without an opening `---` line, or without a closing one, the whole input
/// is the body.
pub fn split_front_matter(raw: &str) -> (Metadata, &str) {
    let Some(rest) = raw
        .split_once('\n')
        .filter(|(first, _)| first.trim_end_matches('\r') == DELIMITER)
        .map(|(_, rest)| rest)
    else {
        return (Metadata::new(), raw);
    };

    let mut offset = 0;
    for line in rest.split_inclusive('\n') {
        if line.trim_end_matches(['\r', '\n']) == DELIMITER {
            let yaml = &rest[..offset];
            let body = &rest[offset + line.len()..];
            return (parse_metadata(yaml), body);
        }
        offset += line.len();
    }

    (Metadata::new(), raw)
}

/// Parse a YAML block into flattened metadata.
pub fn parse_metadata(yaml: &str) -> Metadata {
    let value = match serde_yaml::from_str::<Value>(yaml) {
        Ok(value) => value,
        Err(e) => {
            tracing::debug!(error = %e, "Malformed front matter ignored");
            return Metadata::new();
        }
    };

    let Value::Mapping(mapping) = value else {
        return Metadata::new();
    };

    mapping
        .iter()
        .filter_map(|(key, value)| Some((scalar_to_string(key)?, value_to_string(value)?)))
        .collect()
}

fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Number(n) => Some(n.to_string()),
        Value::Null => Some(String::new()),
        Value::Tagged(tagged) => scalar_to_string(&tagged.value),
        Value::Sequence(_) | Value::Mapping(_) => None,
    }
}

fn value_to_string(value: &Value) -> Option<String> {
    match value {
        Value::Sequence(_) | Value::Mapping(_) => serde_json::to_string(value).ok(),
        _ => scalar_to_string(value),
    }
}

/// Resolve a document title.
///
/// Front matter `title` wins, then the first `# ` heading of the body, then
/// the slug with `-` read as spaces and `/` as ` > `.
pub fn resolve_title(metadata: &Metadata, body: &str, slug: &str) -> String {
    metadata
        .get("title")
        .map(|title| title.trim())
        .filter(|title| !title.is_empty())
        .map(str::to_owned)
        .or_else(|| first_heading(body))
        .unwrap_or_else(|| slug_title(slug))
}

/// First level-one ATX heading outside fenced code.
fn first_heading(body: &str) -> Option<String> {
    let mut in_fence = false;
    for line in body.lines() {
        let trimmed = line.trim_start();
        if trimmed.starts_with("```") || trimmed.starts_with("~~~") {
            in_fence = !in_fence;
            continue;
        }
        if in_fence {
            continue;
        }
        if let Some(text) = line.strip_prefix("# ") {
            let text = text.trim().trim_end_matches('#').trim_end();
            if !text.is_empty() {
                return Some(text.to_owned());
            }
        }
    }
    None
}

fn slug_title(slug: &str) -> String {
    slug.replace('-', " ").replace('/', " > ")
}

/// Index-page excerpt: the first non-blank line that is neither a heading nor
/// a quote, cut to 150 characters and followed by `...`.
pub fn excerpt(body: &str) -> String {
    let Some(line) = body
        .lines()
        .filter(|line| !line.trim().is_empty())
        .find(|line| !line.starts_with('#') && !line.starts_with('>'))
    else {
        return DEFAULT_EXCERPT.to_owned();
    };

    let cut: String = line.trim_end().chars().take(EXCERPT_CHARS).collect();
    format!("{cut}...")
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_split_front_matter() {
        let (metadata, body) = split_front_matter("---\ntitle: Guide\norder: 2\n---\n# Body\n");
        assert_eq!(metadata.get("title").map(String::as_str), Some("Guide"));
        assert_eq!(metadata.get("order").map(String::as_str), Some("2"));
        assert_eq!(body, "# Body\n");
    }

    #[test]
    fn test_split_front_matter_crlf() {
        let (metadata, body) = split_front_matter("---\r\ndraft: true\r\n---\r\nText");
        assert_eq!(metadata.get("draft").map(String::as_str), Some("true"));
        assert_eq!(body, "Text");
    }

    #[test]
    fn test_no_front_matter() {
        let (metadata, body) = split_front_matter("# Title\n\n---\n");
        assert!(metadata.is_empty());
        assert_eq!(body, "# Title\n\n---\n");
    }

    #[test]
    fn test_unclosed_front_matter_is_body() {
        let raw = "---\ntitle: Open\n\nText";
        let (metadata, body) = split_front_matter(raw);
        assert!(metadata.is_empty());
        assert_eq!(body, raw);
    }

    #[test]
    fn test_malformed_front_matter_degrades_to_empty() {
        let (metadata, body) = split_front_matter("---\ntitle: [unclosed\n---\nText");
        assert!(metadata.is_empty());
        assert_eq!(body, "Text");
    }

    #[test]
    fn test_non_mapping_front_matter() {
        let (metadata, body) = split_front_matter("---\n- a\n- b\n---\nText");
        assert!(metadata.is_empty());
        assert_eq!(body, "Text");
    }

    #[test]
    fn test_nested_values_become_json() {
        let metadata = parse_metadata("tags:\n  - rust\n  - docs\nauthor:\n  name: Ann\n");
        assert_eq!(metadata["tags"], r#"["rust","docs"]"#);
        assert_eq!(metadata["author"], r#"{"name":"Ann"}"#);
    }

    #[test]
    fn test_title_precedence() {
        let mut metadata = Metadata::new();
        assert_eq!(resolve_title(&metadata, "# Heading\n", "a/b"), "Heading");
        assert_eq!(resolve_title(&metadata, "No heading", "core-concepts/agi-loop"), "core concepts > agi loop");

        metadata.insert("title".to_owned(), "From Meta".to_owned());
        assert_eq!(resolve_title(&metadata, "# Heading\n", "a"), "From Meta");
    }

    #[test]
    fn test_heading_inside_fence_ignored() {
        let body = "```bash\n# install\n```\n\n# Real Title\n";
        assert_eq!(resolve_title(&Metadata::new(), body, "x"), "Real Title");
    }

    #[test]
    fn test_excerpt() {
        assert_eq!(excerpt("# Title\n\n> quote\n\nFirst line.\nSecond."), "First line....");
        assert_eq!(excerpt("# Only heading\n"), DEFAULT_EXCERPT);
        assert_eq!(excerpt(""), DEFAULT_EXCERPT);
    }

    #[test]
    fn test_excerpt_truncated() {
        let long = "x".repeat(200);
        let result = excerpt(&long);
        assert_eq!(result.len(), 153);
        assert!(result.ends_with("..."));
    }
}
