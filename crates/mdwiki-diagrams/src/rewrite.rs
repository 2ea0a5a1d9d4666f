//! Individual text rewrites applied by the normalization pipelines.
//!
//! Every rewrite is a pure `&str -> String` function and leaves its input
//! unchanged when its trigger pattern is absent.

use std::ops::Range;
use std::sync::LazyLock;

use regex::Regex;

use crate::kind::{DiagramKind, split_preamble};

/// Markers that start stray source listings appended to generated diagrams.
const METADATA_MARKERS: [&str; 2] = ["**Diagram sources**", "**Section sources**"];

static STYLE_STATEMENT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)(^|[ \t;])style[ \t]+[A-Za-z0-9_-]+[ \t]+[^\n:]*:[^\n]*").unwrap()
});
static STADIUM_NODE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"([A-Za-z0-9_-]+)\(\[([^\]"][^\]]*)\]\)"#).unwrap()
});
static QUOTED_STADIUM_NODE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"([A-Za-z0-9_-]+)\(\[\("([^"]*)"\)\]\)"#).unwrap()
});
static NODE_THEN_ARROW: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"([A-Za-z0-9_-]+)\[([^\]\n]+)\][ \t]*(-->|->)[ \t]*([A-Za-z0-9_-]+)").unwrap()
});
static ADJACENT_NODES: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\][ \t]+([A-Za-z0-9_-]+\[)").unwrap());
static EDGE_LABEL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"([A-Za-z0-9_-]+)[ \t]+-->[ \t]+\|([^|\n]+)\|[ \t]+([A-Za-z0-9_-]+)").unwrap()
});
static INLINE_HEADER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^\s*(?:graph|flowchart)[ \t]+(?:TD|TB|BT|LR|RL)[ \t]+[A-Za-z0-9_-]+\[[^\]\n]+\][ \t]*-?->[ \t]*[A-Za-z0-9_-]+",
    )
    .unwrap()
});
static HEADER_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\s*(?:graph|flowchart)[ \t]+(?:TD|TB|BT|LR|RL))[ \t]+").unwrap()
});
static ARROW_INTO_DECISION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"([A-Za-z0-9_-]+)[ \t]+-->[ \t]+([A-Za-z0-9_-]+)\{").unwrap()
});
static UNSPACED_ARROW: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"([A-Za-z0-9_]+)[ \t]*-->[ \t]*([A-Za-z0-9_-]+)").unwrap()
});
static CONTROL_CHARS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[\x00-\x08\x0B\x0C\x0E-\x1F\x7F]").unwrap());
static SPACE_RUN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[ \t]{2,}").unwrap());
static NEWLINE_RUN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\n{3,}").unwrap());

/// Drop everything from the earliest metadata marker onward.
pub(crate) fn truncate_metadata(text: &str) -> String {
    METADATA_MARKERS
        .iter()
        .filter_map(|marker| text.find(marker))
        .min()
        .map_or_else(|| text.to_owned(), |pos| text[..pos].trim().to_owned())
}

/// Remove `style <id> <props>` statements.
///
/// When real content precedes the first style statement, the style block is
/// assumed to be a trailer and everything from it onward is dropped.
/// Otherwise each statement is removed on its own. The word `style` inside a
/// node label or a quoted string is not a statement.
pub(crate) fn strip_style(text: &str) -> String {
    let statements: Vec<Range<usize>> = STYLE_STATEMENT
        .captures_iter(text)
        .filter_map(|caps| {
            let whole = caps.get(0)?;
            let start = whole.start() + caps.get(1).map_or(0, |m| m.len());
            (!inside_label(text, start)).then_some(start..whole.end())
        })
        .collect();
    let Some(first) = statements.first() else {
        return text.to_owned();
    };

    let prefix = &text[..first.start];
    if !prefix.trim().is_empty() {
        return prefix.trim().to_owned();
    }

    let mut out = String::with_capacity(text.len());
    let mut last = 0;
    for statement in &statements {
        out.push_str(&text[last..statement.start]);
        last = statement.end;
    }
    out.push_str(&text[last..]);
    out
}

/// Whether `pos` falls inside brackets or quotes opened earlier on its line.
fn inside_label(text: &str, pos: usize) -> bool {
    let line_start = text[..pos].rfind('\n').map_or(0, |p| p + 1);
    let mut depth = 0usize;
    let mut quoted = false;
    for c in text[line_start..pos].chars() {
        match c {
            '"' => quoted = !quoted,
            '[' | '(' | '{' if !quoted => depth += 1,
            ']' | ')' | '}' if !quoted => depth = depth.saturating_sub(1),
            _ => {}
        }
    }
    quoted || depth > 0
}

/// `id([label])` becomes `id(["label"])`.
pub(crate) fn quote_stadium_labels(text: &str) -> String {
    STADIUM_NODE.replace_all(text, r#"$1(["$2"])"#).into_owned()
}

/// `id([("label")])` becomes `id("label")`.
pub(crate) fn unwrap_quoted_stadium(text: &str) -> String {
    QUOTED_STADIUM_NODE
        .replace_all(text, r#"$1("$2")"#)
        .into_owned()
}

/// `A[label] --> B` becomes `A[label]` and `A --> B` on separate lines.
pub(crate) fn split_node_arrows(text: &str) -> String {
    NODE_THEN_ARROW
        .replace_all(text, "$1[$2]\n$1 $3 $4")
        .into_owned()
}

/// Rewrite `->` to `-->`.
///
/// Arrows that are already long (`-->`, `--->`), dotted (`-.->`), thick
/// (`==>`) or sequence messages (`->>`) are left alone.
pub(crate) fn standardize_arrows(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 8);
    let mut last = 0;

    for (pos, _) in text.match_indices("->") {
        let prev = text[..pos].chars().next_back();
        let next = text[pos + 2..].chars().next();
        if matches!(prev, Some('-' | '.' | '=')) || next == Some('>') {
            continue;
        }
        out.push_str(&text[last..pos]);
        out.push_str("-->");
        last = pos + 2;
    }

    out.push_str(&text[last..]);
    out
}

/// `A[x] B[y]` on one line becomes two lines.
pub(crate) fn split_adjacent_nodes(text: &str) -> String {
    ADJACENT_NODES.replace_all(text, "]\n$1").into_owned()
}

/// `A --> |label| B` becomes `A -->|label| B`.
pub(crate) fn tighten_edge_labels(text: &str) -> String {
    EDGE_LABEL.replace_all(text, "$1 -->|$2| $3").into_owned()
}

/// Prepend a default diagram type when none is declared.
///
/// The header goes after any `%%` directives or `---` front matter.
pub(crate) fn ensure_header(text: &str) -> String {
    if DiagramKind::detect(text).is_some() {
        return text.to_owned();
    }

    let (preamble, body) = split_preamble(text);
    let header = DiagramKind::default_header(body);
    // A final `%%` line without a line break still ends the preamble.
    let separator = if preamble.is_empty() || preamble.ends_with('\n') {
        ""
    } else {
        "\n"
    };
    format!("{preamble}{separator}{header}\n{}", body.trim_start())
}

/// Collapse space/tab runs to one space and 3+ newlines to two, then trim.
///
/// Line breaks are never joined. CRLF line endings become LF.
#[must_use]
pub fn collapse_whitespace(text: &str) -> String {
    let text = text.replace("\r\n", "\n");
    let text = SPACE_RUN.replace_all(&text, " ");
    let text = NEWLINE_RUN.replace_all(&text, "\n\n");
    text.trim().to_owned()
}

/// Remove control characters other than tab, LF and CR.
pub(crate) fn strip_control_chars(text: &str) -> String {
    CONTROL_CHARS.replace_all(text, "").into_owned()
}

/// `graph TD A[Start] --> B` on one line: move the first node below the header.
pub(crate) fn break_inline_header(text: &str) -> String {
    if !INLINE_HEADER.is_match(text) {
        return text.to_owned();
    }
    HEADER_LINE.replace(text, "$1\n").into_owned()
}

/// `A --> B{Decision}` becomes `A --> B` followed by `B{Decision}`.
pub(crate) fn split_arrow_into_decision(text: &str) -> String {
    ARROW_INTO_DECISION
        .replace_all(text, "$1 --> $2\n$2{")
        .into_owned()
}

/// `A-->B` becomes `A --> B`.
pub(crate) fn space_arrows(text: &str) -> String {
    UNSPACED_ARROW.replace_all(text, "$1 --> $2").into_owned()
}
