//! Block-quote callouts (`> [!NOTE]`, `> [!WARNING]`, `> [!TIP]`).
//!
//! The markdown parser only recognizes an uppercase marker standing alone on
//! the first quoted line. [`CalloutPreprocessor`] rewrites the looser forms
//! authors actually write (`> [!note] Remember this`) into that shape before
//! parsing, and [`CalloutKind`] carries the fixed heading and icon for each
//! kind at render time.

use std::sync::LazyLock;

use pulldown_cmark::BlockQuoteKind;
use regex::Regex;

use crate::fence::FenceTracker;

static CALLOUT_MARKER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(?P<lead> {0,3}>[ \t]?)\[!(?P<kind>note|warning|tip)\][ \t]*(?P<rest>[^\r\n]*)")
        .unwrap()
});

const ICON_NOTE: &str = r#"<svg class="callout-icon" fill="none" stroke="currentColor" viewBox="0 0 24 24" aria-hidden="true"><path stroke-linecap="round" stroke-linejoin="round" stroke-width="2" d="M13 16h-1v-4h-1m1-4h.01M21 12a9 9 0 11-18 0 9 9 0 0118 0z"></path></svg>"#;
const ICON_WARNING: &str = r#"<svg class="callout-icon" fill="none" stroke="currentColor" viewBox="0 0 24 24" aria-hidden="true"><path stroke-linecap="round" stroke-linejoin="round" stroke-width="2" d="M12 9v2m0 4h.01m-6.938 4h13.856c1.54 0 2.502-1.667 1.732-3L13.732 4c-.77-1.333-2.694-1.333-3.464 0L3.34 16c-.77 1.333.192 3 1.732 3z"></path></svg>"#;
const ICON_TIP: &str = r#"<svg class="callout-icon" fill="none" stroke="currentColor" viewBox="0 0 24 24" aria-hidden="true"><path stroke-linecap="round" stroke-linejoin="round" stroke-width="2" d="M9.663 17h4.673M12 3v1m6.364 1.636l-.707.707M21 12h-1M4 12H3m3.343-5.657l-.707-.707m2.828 9.9a5 5 0 117.072 0l-.548.547A3.374 3.374 0 0014 18.469V19a2 2 0 11-4 0v-.531c0-.895-.356-1.754-.988-2.386l-.548-.547z"></path></svg>"#;

/// Supported callout kinds.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CalloutKind {
    Note,
    Warning,
    Tip,
}

impl CalloutKind {
    /// Map a parsed block-quote marker to a callout kind.
    ///
    /// `[!IMPORTANT]` and `[!CAUTION]` are not callouts here and render as
    /// plain block quotes.
    #[must_use]
    pub fn from_blockquote(kind: BlockQuoteKind) -> Option<Self> {
        match kind {
            BlockQuoteKind::Note => Some(Self::Note),
            BlockQuoteKind::Warning => Some(Self::Warning),
            BlockQuoteKind::Tip => Some(Self::Tip),
            BlockQuoteKind::Important | BlockQuoteKind::Caution => None,
        }
    }

    fn from_marker(marker: &str) -> Option<Self> {
        match marker.to_ascii_lowercase().as_str() {
            "note" => Some(Self::Note),
            "warning" => Some(Self::Warning),
            "tip" => Some(Self::Tip),
            _ => None,
        }
    }

    /// Lowercase name used in CSS classes.
    #[must_use]
    pub fn class(self) -> &'static str {
        match self {
            Self::Note => "note",
            Self::Warning => "warning",
            Self::Tip => "tip",
        }
    }

    /// Heading text shown above the callout body.
    #[must_use]
    pub fn heading(self) -> &'static str {
        match self {
            Self::Note => "Note",
            Self::Warning => "Warning",
            Self::Tip => "Tip",
        }
    }

    pub(crate) fn icon(self) -> &'static str {
        match self {
            Self::Note => ICON_NOTE,
            Self::Warning => ICON_WARNING,
            Self::Tip => ICON_TIP,
        }
    }

    fn marker(self) -> &'static str {
        match self {
            Self::Note => "[!NOTE]",
            Self::Warning => "[!WARNING]",
            Self::Tip => "[!TIP]",
        }
    }
}

/// Rewrites callout markers into the form the parser recognizes.
///
/// Only the first line of a block quote is considered, and lines inside
/// fenced code blocks are left alone.
#[derive(Debug, Default)]
pub struct CalloutPreprocessor;

impl CalloutPreprocessor {
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    #[must_use]
    pub fn process(&self, markdown: &str) -> String {
        let mut fences = FenceTracker::new();
        let mut output = String::with_capacity(markdown.len() + 32);
        let mut previous_quoted = false;

        for line in markdown.split_inclusive('\n') {
            if fences.update(line) || fences.in_fence() {
                previous_quoted = false;
                output.push_str(line);
                continue;
            }

            let quoted = line.trim_start().starts_with('>');
            if quoted && !previous_quoted {
                rewrite_marker(line, &mut output);
            } else {
                output.push_str(line);
            }
            previous_quoted = quoted;
        }

        output
    }
}

fn rewrite_marker(line: &str, output: &mut String) {
    let Some(caps) = CALLOUT_MARKER.captures(line) else {
        output.push_str(line);
        return;
    };
    let Some(kind) = CalloutKind::from_marker(&caps["kind"]) else {
        output.push_str(line);
        return;
    };

    let lead = &caps["lead"];
    let rest = caps["rest"].trim_end();
    let ending = &line[line.trim_end_matches(['\r', '\n']).len()..];

    output.push_str(lead.trim_end());
    output.push(' ');
    output.push_str(kind.marker());
    if !rest.is_empty() {
        output.push('\n');
        output.push_str(lead.trim_end());
        output.push(' ');
        output.push_str(rest);
    }
    output.push_str(if ending.is_empty() { "" } else { "\n" });
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn process(markdown: &str) -> String {
        CalloutPreprocessor::new().process(markdown)
    }

    #[test]
    fn test_uppercase_marker_unchanged() {
        assert_eq!(process("> [!NOTE]\n> Body\n"), "> [!NOTE]\n> Body\n");
    }

    #[test]
    fn test_lowercase_marker_uppercased() {
        assert_eq!(process("> [!warning]\n> Careful\n"), "> [!WARNING]\n> Careful\n");
    }

    #[test]
    fn test_same_line_body_split() {
        assert_eq!(
            process("> [!Tip] Use the cache\n> More text\n"),
            "> [!TIP]\n> Use the cache\n> More text\n"
        );
    }

    #[test]
    fn test_missing_space_after_quote_marker() {
        assert_eq!(process(">[!note] Hi"), "> [!NOTE]\n> Hi");
    }

    #[test]
    fn test_marker_not_on_first_quoted_line() {
        let input = "> Intro\n> [!note] not a callout\n";
        assert_eq!(process(input), input);
    }

    #[test]
    fn test_unsupported_kind_untouched() {
        let input = "> [!important] Read me\n";
        assert_eq!(process(input), input);
    }

    #[test]
    fn test_inside_code_fence_untouched() {
        let input = "```markdown\n> [!note] example\n```\n";
        assert_eq!(process(input), input);
    }

    #[test]
    fn test_headings_and_classes() {
        assert_eq!(CalloutKind::Warning.heading(), "Warning");
        assert_eq!(CalloutKind::Tip.class(), "tip");
        assert_eq!(
            CalloutKind::from_blockquote(BlockQuoteKind::Note),
            Some(CalloutKind::Note)
        );
        assert_eq!(CalloutKind::from_blockquote(BlockQuoteKind::Caution), None);
    }
}
