//! Aggressive second-chance normalization.
//!
//! Used only after the engine rejected the normally-normalized text. The
//! rewrites here are broader and may alter meaning, so the result is never
//! used as a first attempt.

use crate::normalize::{Step, run};
use crate::rewrite;

const RECOVERY_STEPS: &[Step] = &[
    Step {
        name: "truncate_metadata",
        apply: rewrite::truncate_metadata,
    },
    Step {
        name: "strip_style",
        apply: rewrite::strip_style,
    },
    Step {
        name: "strip_control_chars",
        apply: rewrite::strip_control_chars,
    },
    Step {
        name: "break_inline_header",
        apply: rewrite::break_inline_header,
    },
    Step {
        name: "split_node_arrows",
        apply: rewrite::split_node_arrows,
    },
    Step {
        name: "standardize_arrows",
        apply: rewrite::standardize_arrows,
    },
    Step {
        name: "split_arrow_into_decision",
        apply: rewrite::split_arrow_into_decision,
    },
    Step {
        name: "unwrap_quoted_stadium",
        apply: rewrite::unwrap_quoted_stadium,
    },
    Step {
        name: "quote_stadium_labels",
        apply: rewrite::quote_stadium_labels,
    },
    Step {
        name: "tighten_edge_labels",
        apply: rewrite::tighten_edge_labels,
    },
    Step {
        name: "split_adjacent_nodes",
        apply: rewrite::split_adjacent_nodes,
    },
    Step {
        name: "space_arrows",
        apply: rewrite::space_arrows,
    },
    Step {
        name: "ensure_header",
        apply: rewrite::ensure_header,
    },
    Step {
        name: "collapse_whitespace",
        apply: rewrite::collapse_whitespace,
    },
];

/// Rewrite raw diagram text with the recovery rules. Never fails.
#[must_use]
pub fn recover(raw: &str) -> String {
    run("recover", RECOVERY_STEPS, raw.to_owned())
}
