//! Build-time normalization of diagram text.
//!
//! [`normalize`] runs a fixed sequence of named rewrites that turn the many
//! ways diagrams get written into the canonical form the engine accepts:
//! a type header, `-->` arrows and one statement per line. It is total and a
//! fixpoint on its own output, so display-time code may apply it again.

use crate::kind::DiagramKind;
use crate::rewrite;

/// One named rewrite in a pipeline.
#[derive(Clone, Copy)]
pub(crate) struct Step {
    pub(crate) name: &'static str,
    pub(crate) apply: fn(&str) -> String,
}

/// Rewrites that clean up statements, before the header check.
const BODY_STEPS: &[Step] = &[
    Step {
        name: "truncate_metadata",
        apply: rewrite::truncate_metadata,
    },
    Step {
        name: "strip_style",
        apply: rewrite::strip_style,
    },
    Step {
        name: "quote_stadium_labels",
        apply: rewrite::quote_stadium_labels,
    },
    Step {
        name: "split_node_arrows",
        apply: rewrite::split_node_arrows,
    },
    // Splitting can leave a style statement at the start of a new line.
    Step {
        name: "strip_style",
        apply: rewrite::strip_style,
    },
    Step {
        name: "standardize_arrows",
        apply: rewrite::standardize_arrows,
    },
    Step {
        name: "split_adjacent_nodes",
        apply: rewrite::split_adjacent_nodes,
    },
    Step {
        name: "tighten_edge_labels",
        apply: rewrite::tighten_edge_labels,
    },
];

const FINISH_STEPS: &[Step] = &[
    Step {
        name: "ensure_header",
        apply: rewrite::ensure_header,
    },
    Step {
        name: "collapse_whitespace",
        apply: rewrite::collapse_whitespace,
    },
];

/// Passes after which normalization stops even if a rewrite still applies.
const MAX_PASSES: usize = 8;

/// Apply `steps` in order, tracing the ones that changed the text.
pub(crate) fn run(pipeline: &'static str, steps: &[Step], text: String) -> String {
    steps.iter().fold(text, |text, step| {
        let next = (step.apply)(&text);
        if next != text {
            tracing::trace!(pipeline, step = step.name, "Rewrite applied");
        }
        next
    })
}

/// Normalized diagram text and whether the author declared a type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedDiagram {
    /// `false` when a default header had to be injected.
    pub diagram_type_declared: bool,
    /// Canonical diagram text.
    pub body: String,
}

impl NormalizedDiagram {
    #[must_use]
    pub fn from_raw(raw: &str) -> Self {
        let cleaned = run("normalize", BODY_STEPS, raw.to_owned());
        let diagram_type_declared = DiagramKind::detect(&cleaned).is_some();
        let mut body = run("normalize", FINISH_STEPS, cleaned);

        // A rewrite can complete a pattern an earlier step handles, such as
        // collapsed spaces forming a metadata marker. Repeat until settled.
        for _ in 1..MAX_PASSES {
            let next = run("normalize", FINISH_STEPS, run("normalize", BODY_STEPS, body.clone()));
            if next == body {
                break;
            }
            body = next;
        }

        Self {
            diagram_type_declared,
            body,
        }
    }
}

/// Normalize raw diagram text into canonical form. Never fails.
#[must_use]
pub fn normalize(raw: &str) -> String {
    NormalizedDiagram::from_raw(raw).body
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use proptest::prelude::*;

    use super::*;
    use crate::rewrite::collapse_whitespace;

    #[test]
    fn test_canonical_input_unchanged() {
        let canonical = "flowchart TD\nA[Start]\nA --> B\nB -->|yes| C\nC --> D";
        assert_eq!(normalize(canonical), canonical);
    }

    #[test]
    fn test_canonical_input_only_whitespace_collapsed() {
        let canonical = "graph LR\n    A --> B\n\n\n\n    B --> C   ";
        assert_eq!(normalize(canonical), collapse_whitespace(canonical));
    }

    #[test]
    fn test_other_diagram_types_unchanged() {
        let sequence = "sequenceDiagram\nAlice->>Bob: Hello\nBob-->>Alice: Hi";
        assert_eq!(normalize(sequence), sequence);

        let pie = "pie title Pets\n\"Dogs\" : 386\n\"Cats\" : 85";
        assert_eq!(normalize(pie), pie);
    }

    #[test]
    fn test_fallback_header_with_arrows() {
        assert_eq!(normalize("A --> B"), "flowchart TD\nA --> B");
    }

    #[test]
    fn test_fallback_header_without_arrows() {
        assert_eq!(normalize("A[Lonely]"), "graph TD\nA[Lonely]");
    }

    #[test]
    fn test_arrow_standardization() {
        let result = normalize("A -> B");
        assert!(result.contains("A --> B"));
        assert!(!result.replace("-->", "").contains("->"));
    }

    #[test]
    fn test_metadata_truncation() {
        let result = normalize("flowchart TD\nA-->B\n**Diagram sources**\nfile.py:12");
        assert_eq!(result, "flowchart TD\nA-->B");
    }

    #[test]
    fn test_style_trailer_removed() {
        let result = normalize("graph TD\nA --> B\nstyle A fill:#f9f,stroke:#333");
        assert_eq!(result, "graph TD\nA --> B");
    }

    #[test]
    fn test_node_definition_split_from_arrow() {
        let result = normalize("graph TD\nA[Start] -> B[End]");
        assert_eq!(result, "graph TD\nA[Start]\nA --> B[End]");
    }

    #[test]
    fn test_adjacent_nodes_split() {
        let result = normalize("graph TD\nA[One] B[Two]");
        assert_eq!(result, "graph TD\nA[One]\nB[Two]");
    }

    #[test]
    fn test_stadium_and_edge_label() {
        let result = normalize("flowchart LR\nA([Begin])\nA --> |go| B");
        assert_eq!(result, "flowchart LR\nA([\"Begin\"])\nA -->|go| B");
    }

    #[test]
    fn test_type_declared_flag() {
        assert!(NormalizedDiagram::from_raw("graph TD\nA --> B").diagram_type_declared);
        assert!(!NormalizedDiagram::from_raw("A --> B").diagram_type_declared);
    }

    #[test]
    fn test_total_on_odd_input() {
        assert_eq!(normalize(""), "graph TD");
        assert!(normalize("\u{0}\u{1}\u{ff}").starts_with("graph TD"));
        assert!(normalize("<div class=\"x\">html</div>").starts_with("graph TD"));
        assert!(normalize("]]]]->->->[[[").starts_with("flowchart TD"));
    }

    #[test]
    fn test_comment_only_diagram_gets_header_line() {
        assert_eq!(normalize("%% TODO draw this"), "%% TODO draw this\ngraph TD");
        assert_eq!(normalize("%% TODO draw this\ngraph TD"), "%% TODO draw this\ngraph TD");
    }

    #[test]
    fn test_style_after_split_arrow_removed_in_one_pass() {
        assert_eq!(normalize("B[x]->style A fill:#f"), "flowchart TD\nB[x]\nB -->");
    }

    #[test]
    fn test_collapsed_metadata_marker_truncated() {
        assert_eq!(normalize("graph TD\nA --> B\n**Diagram  sources**\nx.py"), "graph TD\nA --> B");
    }

    const FRAGMENTS: &[&str] = &[
        "graph TD",
        "flowchart LR",
        "sequenceDiagram",
        "pie",
        "%% note",
        "%%{init: {}}%%",
        "---",
        "title: x",
        "A",
        "B[label]",
        "C([stadium])",
        "D{Ok?}",
        "E[\"quoted: style\"]",
        "-->",
        "->",
        "->>",
        "-.->",
        "|yes|",
        "style A fill:#f9f",
        "**Diagram sources**",
        "**Section",
        " sources**",
        ";",
        ":",
        "[",
        "]",
        " ",
        "  ",
        "\t",
        "\n",
        "\n\n\n",
        "\r\n",
    ];

    fn diagram_text() -> impl Strategy<Value = String> {
        prop::collection::vec(prop::sample::select(FRAGMENTS), 0..24).prop_map(|parts| parts.concat())
    }

    proptest! {
        #[test]
        fn test_normalize_is_fixpoint(text in diagram_text()) {
            let once = normalize(&text);
            prop_assert_eq!(normalize(&once), once);
        }

        #[test]
        fn test_normalize_is_fixpoint_on_any_text(text in "\\PC{0,60}") {
            let once = normalize(&text);
            prop_assert_eq!(normalize(&once), once);
        }

        #[test]
        fn test_normalize_declares_type(text in diagram_text()) {
            prop_assert!(DiagramKind::detect(&normalize(&text)).is_some());
        }
    }
}
