//! Static checks for diagram text that commonly fails to render.

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;

use crate::kind::DiagramKind;

static STYLE_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^style\s+[A-Za-z0-9_-]+\s+[^}]+$").unwrap());
static ROUND_BRACKET_NODE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[A-Za-z0-9_-]+\(\[[^\]]+\]\)").unwrap());
static MISSING_LINE_BREAK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[A-Za-z0-9_-]+\[[^\]\n]+\][ \t]*[A-Za-z0-9_-]+\[").unwrap()
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Info,
    Warning,
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Info => "info",
            Self::Warning => "warning",
            Self::Error => "error",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LintIssue {
    pub severity: Severity,
    pub message: String,
}

impl LintIssue {
    fn new(severity: Severity, message: impl Into<String>) -> Self {
        Self {
            severity,
            message: message.into(),
        }
    }
}

/// Check raw diagram text. An empty diagram yields only the emptiness error.
#[must_use]
pub fn lint(raw: &str) -> Vec<LintIssue> {
    let text = raw.trim();
    if text.is_empty() {
        return vec![LintIssue::new(Severity::Error, "Diagram is empty")];
    }

    let mut issues = Vec::new();
    let kind = DiagramKind::detect(text);

    if kind.is_none() {
        issues.push(LintIssue::new(
            Severity::Warning,
            "Diagram type not declared (e.g. graph TD, flowchart LR)",
        ));
    }

    if text.contains("**Diagram sources**") || text.contains("**Section sources**") {
        issues.push(LintIssue::new(
            Severity::Warning,
            "Diagram contains a metadata section (**Diagram sources** or **Section sources**)",
        ));
    }

    for line in text.lines().map(str::trim).filter(|l| l.starts_with("style ")) {
        if !STYLE_LINE.is_match(line) {
            issues.push(LintIssue::new(
                Severity::Warning,
                format!("Style directive may be malformed: \"{line}\""),
            ));
        }
    }

    if ROUND_BRACKET_NODE.is_match(text) {
        issues.push(LintIssue::new(
            Severity::Info,
            "Round bracket node syntax ([text]) is rewritten to ([\"text\"])",
        ));
    }

    if text.contains("->") && !text.contains("-->") {
        issues.push(LintIssue::new(
            Severity::Warning,
            "Diagram uses -> arrows instead of -->",
        ));
    }

    if MISSING_LINE_BREAK.is_match(text) {
        issues.push(LintIssue::new(
            Severity::Warning,
            "Missing line break between node definitions",
        ));
    }

    if text.matches('"').count() % 2 != 0 {
        issues.push(LintIssue::new(Severity::Error, "Unbalanced double quotes"));
    }
    if text.matches('\'').count() % 2 != 0 {
        issues.push(LintIssue::new(Severity::Error, "Unbalanced single quotes"));
    }

    if kind == Some(DiagramKind::Class) && (text.contains("<|--") || text.contains("--|>")) {
        issues.push(LintIssue::new(
            Severity::Info,
            "Class diagram uses inheritance arrows (<|-- or --|>), which some engine versions reject",
        ));
    }

    issues
}
