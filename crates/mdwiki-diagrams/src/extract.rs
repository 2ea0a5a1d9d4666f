//! Diagram block extraction.
//!
//! A single left-to-right scan recognizes every delimiter convention in use:
//!
//! - fenced blocks tagged `mermaid`, on the fence line or the line after it
//! - fences opened directly with a diagram keyword (```` ```graph TD ````)
//! - one- to three-backtick inline delimiters some authoring tools emit
//! - previously rendered containers (`<div class="mermaid">`) and
//!   `<pre><code class="language-mermaid">` elements
//!
//! Fences are followed line by line, so the body of an ordinary code block is
//! never searched and a closing fence never opens a diagram. Inline and HTML
//! conventions are only matched in the text between fences. Inside block
//! quotes and list items the container prefix (`> `, indentation) is removed
//! from diagram lines.
//!
//! Text outside matched spans is returned verbatim, so the segments always
//! concatenate back to the input.

use std::borrow::Cow;
use std::ops::Range;
use std::sync::LazyLock;

use mdwiki_renderer::{FenceTracker, unescape_html};
use regex::{Captures, Regex};

use crate::kind::DiagramKind;

static INLINE_REGION: LazyLock<Regex> = LazyLock::new(|| {
    let keywords = DiagramKind::ALL.map(DiagramKind::keyword).join("|");
    let pattern = [
        r"`{1,3}mermaid[ \t\r\n]+(?P<short>[^`]+)`{1,3}".to_owned(),
        format!(r"`{{2,3}}[ \t]*(?:\r?\n[ \t]*)?(?P<bare>(?:{keywords})\b[^`]*)`{{2,3}}"),
        r#"<div(?:\s[^>]*?)?\sclass\s*=\s*["'](?:[^"']*\s)?mermaid(?:\s[^"']*)?["'][^>]*>(?P<container>.*?)</div>"#
            .to_owned(),
        r#"<pre[^>]*>\s*<code(?:\s[^>]*?)?\sclass\s*=\s*["'](?:[^"']*\s)?language-mermaid(?:\s[^"']*)?["'][^>]*>(?P<code>.*?)</code>\s*</pre>"#
            .to_owned(),
    ]
    .join("|");
    Regex::new(&format!("(?s){pattern}")).unwrap()
});

/// Delimiter convention a diagram block was written with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delimiter {
    /// ```` ```mermaid ```` fence.
    Fence,
    /// Fence opened directly with a diagram keyword.
    TypedFence,
    /// `` `mermaid ...` `` or ``` ``mermaid ...`` ```.
    Short,
    /// ``` ``graph TD ...`` ``` without the `mermaid` tag.
    Bare,
    /// Rendered `<div class="mermaid">` container.
    Container,
    /// `<pre><code class="language-mermaid">` element.
    CodeElement,
}

impl Delimiter {
    /// HTML delimiters carry escaped bodies.
    fn is_html(self) -> bool {
        matches!(self, Self::Container | Self::CodeElement)
    }
}

/// One diagram region of a document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiagramBlock<'a> {
    /// Byte range of the whole delimited region in the scanned text.
    pub span: Range<usize>,
    /// Text of the region including delimiters.
    pub source: &'a str,
    /// Diagram text without delimiters or container prefixes, trimmed and
    /// unescaped.
    pub raw_text: String,
    /// Zero-based position among the document's diagrams.
    pub sequence_index: usize,
    pub delimiter: Delimiter,
}

/// A piece of scanned text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment<'a> {
    Prose(&'a str),
    Diagram(DiagramBlock<'a>),
}

impl<'a> Segment<'a> {
    /// Original text covered by this segment.
    #[must_use]
    pub fn content(&self) -> &'a str {
        match self {
            Self::Prose(text) => text,
            Self::Diagram(block) => block.source,
        }
    }

    #[must_use]
    pub fn is_diagram(&self) -> bool {
        matches!(self, Self::Diagram(_))
    }
}

/// Split `text` into prose and diagram segments, in order.
///
/// Without any diagram the result is a single prose segment equal to the
/// whole input (also for empty input).
#[must_use]
pub fn extract(text: &str) -> Vec<Segment<'_>> {
    let mut segments = Vec::new();
    let mut last = 0;

    for block in diagrams(text) {
        if block.span.start > last {
            segments.push(Segment::Prose(&text[last..block.span.start]));
        }
        last = block.span.end;
        segments.push(Segment::Diagram(block));
    }

    if last < text.len() || segments.is_empty() {
        segments.push(Segment::Prose(&text[last..]));
    }
    segments
}

/// A fenced block collected by the line scan.
struct OpenFence<'a> {
    /// Offset of the opening fence run.
    start: usize,
    /// Container prefix of the opening line.
    prefix: &'a str,
    /// Opening fence line without prefix and line ending.
    opener: &'a str,
    /// Body lines without prefix and line ending.
    lines: Vec<&'a str>,
}

impl<'a> OpenFence<'a> {
    /// The diagram held by the closed fence, `None` for ordinary code.
    fn into_block(self, text: &'a str, end: usize) -> Option<DiagramBlock<'a>> {
        let info = self.opener.trim_start_matches(['`', '~']).trim();
        let (delimiter, head, body) = if info.is_empty() {
            let (first, rest) = self.lines.split_first()?;
            let (delimiter, head) = classify(first.trim())?;
            (delimiter, head, rest)
        } else {
            let (delimiter, head) = classify(info)?;
            (delimiter, head, self.lines.as_slice())
        };

        let mut raw = head.to_owned();
        for line in body {
            raw.push('\n');
            raw.push_str(line);
        }

        Some(DiagramBlock {
            span: self.start..end,
            source: &text[self.start..end],
            raw_text: raw.trim().to_owned(),
            sequence_index: 0,
            delimiter,
        })
    }
}

/// Classify the info string of a fence, or its first line when the info
/// string is empty. Returns the text that belongs to the diagram.
fn classify(line: &str) -> Option<(Delimiter, &str)> {
    let end = line
        .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
        .unwrap_or(line.len());
    let word = &line[..end];

    if word == "mermaid" {
        // Attributes such as `{theme=dark}` are not diagram text.
        let rest = line[end..].trim();
        let head = if DiagramKind::detect(rest).is_some() { rest } else { "" };
        return Some((Delimiter::Fence, head));
    }
    DiagramKind::from_keyword(word).map(|_| (Delimiter::TypedFence, line))
}

/// Diagram blocks of `text`, without the prose between them.
#[must_use]
pub fn diagrams(text: &str) -> Vec<DiagramBlock<'_>> {
    let mut blocks = Vec::new();
    let mut fences = FenceTracker::new();
    let mut open: Option<OpenFence<'_>> = None;
    let mut prose_start = 0;
    let mut offset = 0;

    for line in text.split_inclusive('\n') {
        let line_start = offset;
        offset += line.len();

        if let Some(mut fence) = open.take() {
            let content = strip_container(line, fence.prefix);
            if fences.update(content) && !fences.in_fence() {
                let end = line_start + line.trim_end().len();
                blocks.extend(fence.into_block(text, end));
                prose_start = end;
            } else {
                fence.lines.push(content.trim_end_matches(['\n', '\r']));
                open = Some(fence);
            }
            continue;
        }

        let prefix_len = container_prefix_len(line);
        let content = &line[prefix_len..];
        if fences.update(content) {
            scan_inline(text, prose_start..line_start, &mut blocks);
            open = Some(OpenFence {
                start: line_start + prefix_len,
                prefix: &line[..prefix_len],
                opener: content.trim_end(),
                lines: Vec::new(),
            });
        }
    }

    // An unterminated fence runs to the end of the document.
    if open.is_none() {
        scan_inline(text, prose_start..text.len(), &mut blocks);
    }

    for (sequence_index, block) in blocks.iter_mut().enumerate() {
        block.sequence_index = sequence_index;
    }
    blocks
}

fn scan_inline<'a>(text: &'a str, range: Range<usize>, blocks: &mut Vec<DiagramBlock<'a>>) {
    let base = range.start;
    for caps in INLINE_REGION.captures_iter(&text[range]) {
        blocks.extend(inline_block(text, base, &caps));
    }
}

fn inline_block<'a>(text: &'a str, base: usize, caps: &Captures<'a>) -> Option<DiagramBlock<'a>> {
    let whole = caps.get(0)?;
    let (delimiter, body) = [
        ("short", Delimiter::Short),
        ("bare", Delimiter::Bare),
        ("container", Delimiter::Container),
        ("code", Delimiter::CodeElement),
    ]
    .into_iter()
    .find_map(|(name, delimiter)| caps.name(name).map(|m| (delimiter, m.as_str())))?;

    let span = base + whole.start()..base + whole.end();
    let line_start = text[..span.start].rfind('\n').map_or(0, |pos| pos + 1);
    let prefix = &text[line_start..line_start + container_prefix_len(&text[line_start..])];

    let body = dedent(body, prefix);
    let body = body.trim();
    let raw_text = if delimiter.is_html() {
        unescape_html(body)
    } else {
        body.to_owned()
    };

    Some(DiagramBlock {
        source: &text[span.clone()],
        span,
        raw_text,
        sequence_index: 0,
        delimiter,
    })
}

/// Length of the block-quote markers and indentation that open `line`.
fn container_prefix_len(line: &str) -> usize {
    line.len() - line.trim_start_matches([' ', '\t', '>']).len()
}

/// Remove the container prefix of the opening line from a continuation line.
fn strip_container<'a>(line: &'a str, prefix: &str) -> &'a str {
    line.strip_prefix(prefix)
        .or_else(|| line.strip_prefix(prefix.trim_end()))
        .unwrap_or(line)
}

/// Strip `prefix` from every line after the first.
fn dedent(body: &str, prefix: &str) -> String {
    if prefix.is_empty() {
        return body.to_owned();
    }
    body.split('\n')
        .enumerate()
        .map(|(n, line)| if n == 0 { line } else { strip_container(line, prefix) })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Rewrite every diagram region of a Markdown document as a standard
/// ```` ```mermaid ```` fence on its own lines.
///
/// The fence is long enough to contain any backtick run in the diagram. The
/// container prefix of the line the region starts on (indentation, `> `) is
/// repeated on every fence line, so diagrams inside list items and block
/// quotes stay inside them.
#[must_use]
pub fn canonicalize_fences(markdown: &str) -> Cow<'_, str> {
    let segments = extract(markdown);
    if !segments.iter().any(Segment::is_diagram) {
        return Cow::Borrowed(markdown);
    }

    let mut out = String::with_capacity(markdown.len() + 32);
    let mut next_prose = segments.iter().skip(1).map(Segment::content);

    for segment in &segments {
        let following = next_prose.next();
        let block = match segment {
            Segment::Prose(text) => {
                out.push_str(text);
                continue;
            }
            Segment::Diagram(block) => block,
        };

        let line_start = out.rfind('\n').map_or(0, |pos| pos + 1);
        let lead = &out[line_start..];
        let prefix_len = container_prefix_len(lead);
        let mid_line = prefix_len < lead.len();
        let indent = lead[..prefix_len].to_owned();
        if mid_line {
            out.push('\n');
            out.push_str(&indent);
        }

        let fence = "`".repeat(longest_backtick_run(&block.raw_text).max(2) + 1);
        out.push_str(&fence);
        out.push_str("mermaid\n");
        for line in block.raw_text.lines() {
            out.push_str(&indent);
            out.push_str(line);
            out.push('\n');
        }
        out.push_str(&indent);
        out.push_str(&fence);

        let ends_line =
            following.is_some_and(|text| text.starts_with('\n') || text.starts_with("\r\n"));
        if !ends_line {
            out.push('\n');
            out.push_str(&indent);
        }
    }

    Cow::Owned(out)
}

fn longest_backtick_run(text: &str) -> usize {
    text.split(|c| c != '`').map(str::len).max().unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn raw_texts(text: &str) -> Vec<String> {
        diagrams(text).into_iter().map(|b| b.raw_text).collect()
    }

    #[test]
    fn test_no_diagrams_single_prose() {
        let text = "# Title\n\nSome `code` and ```python\nx = 1\n```\n";
        assert_eq!(extract(text), vec![Segment::Prose(text)]);
        assert_eq!(extract(""), vec![Segment::Prose("")]);
    }

    #[test]
    fn test_standard_fence() {
        let text = "Intro\n\n```mermaid\ngraph TD\nA-->B\n```\n\nOutro";
        let segments = extract(text);
        assert_eq!(segments.len(), 3);
        assert_eq!(segments[0], Segment::Prose("Intro\n\n"));
        let Segment::Diagram(block) = &segments[1] else {
            panic!("expected diagram");
        };
        assert_eq!(block.raw_text, "graph TD\nA-->B");
        assert_eq!(block.delimiter, Delimiter::Fence);
        assert_eq!(block.source, "```mermaid\ngraph TD\nA-->B\n```");
        assert_eq!(segments[2], Segment::Prose("\n\nOutro"));
    }

    #[test]
    fn test_keyword_on_fence_line() {
        assert_eq!(
            raw_texts("```mermaid graph TD\nA-->B\n```"),
            vec!["graph TD\nA-->B"]
        );
        assert_eq!(raw_texts("```\nmermaid\npie\n```"), vec!["pie"]);
    }

    #[test]
    fn test_typed_fence() {
        let blocks = diagrams("```graph TD\nA-->B\n```");
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].raw_text, "graph TD\nA-->B");
        assert_eq!(blocks[0].delimiter, Delimiter::TypedFence);
    }

    #[test]
    fn test_short_delimiters() {
        assert_eq!(raw_texts("See `mermaid graph TD A-->B` here"), vec!["graph TD A-->B"]);
        assert_eq!(raw_texts("``mermaid\npie\n\"a\": 1``"), vec!["pie\n\"a\": 1"]);
    }

    #[test]
    fn test_bare_double_backticks() {
        let blocks = diagrams("``graph TD A[Start] --> B[End]``");
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].raw_text, "graph TD A[Start] --> B[End]");
        assert_eq!(blocks[0].delimiter, Delimiter::Bare);
    }

    #[test]
    fn test_inline_code_mentioning_mermaid_ignored() {
        let text = "Use a `mermaid` block or ``graphic`` words.";
        assert_eq!(extract(text), vec![Segment::Prose(text)]);
    }

    #[test]
    fn test_container_attribute_variants() {
        let variants = [
            r#"<div class="mermaid">A --&gt; B</div>"#,
            r#"<div id="d1" class='mermaid' data-x="1">A --&gt; B</div>"#,
            r#"<div  class = "mermaid">A --&gt; B</div>"#,
            r#"<div class="diagram mermaid" data-diagram="0">A --&gt; B</div>"#,
        ];
        for variant in variants {
            let blocks = diagrams(variant);
            assert_eq!(blocks.len(), 1, "variant: {variant}");
            assert_eq!(blocks[0].raw_text, "A --> B");
            assert_eq!(blocks[0].delimiter, Delimiter::Container);
        }
    }

    #[test]
    fn test_container_lookalikes_ignored() {
        let text = r#"<div data-class="mermaid">x</div><div class="mermaidx">y</div>"#;
        assert!(diagrams(text).is_empty());
    }

    #[test]
    fn test_code_element() {
        let text = "<pre><code class=\"language-mermaid\">graph TD\nA --&gt; B\n</code></pre>";
        let blocks = diagrams(text);
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].raw_text, "graph TD\nA --> B");
        assert_eq!(blocks[0].delimiter, Delimiter::CodeElement);
    }

    #[test]
    fn test_sequence_and_spans() {
        let text = "a\n```mermaid\npie\n```\nb `mermaid graph TD X` c\n<div class=\"mermaid\">gantt</div>";
        let blocks = diagrams(text);
        let indices: Vec<_> = blocks.iter().map(|b| b.sequence_index).collect();
        assert_eq!(indices, vec![0, 1, 2]);
        for block in &blocks {
            assert_eq!(&text[block.span.clone()], block.source);
        }
    }

    #[test]
    fn test_segments_reconstruct_input() {
        let docs = [
            "",
            "plain",
            "```mermaid\nA\n```",
            "x ``graph TD A-->B`` y ``pie`` z",
            "<div class=\"mermaid\">A</div>\n\n```mermaid\nB\n```\ntrailing",
            "```mermaid\nunterminated",
        ];
        for doc in docs {
            let joined: String = extract(doc).iter().map(Segment::content).collect();
            assert_eq!(joined, doc);
        }
    }

    #[test]
    fn test_closing_fence_does_not_open_diagram() {
        let text = "```\nlet x = 1;\n```\ngraph theory is neat.\n\nMore prose.\n\n```rust\nfn main() {}\n```\n";
        assert_eq!(extract(text), vec![Segment::Prose(text)]);
        assert!(matches!(canonicalize_fences(text), Cow::Borrowed(_)));
    }

    #[test]
    fn test_plain_fence_with_keyword_first_line() {
        let blocks = diagrams("```\ngraph TD\nA-->B\n```\n");
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].raw_text, "graph TD\nA-->B");
        assert_eq!(blocks[0].delimiter, Delimiter::TypedFence);
    }

    #[test]
    fn test_diagram_inside_ordinary_fence_ignored() {
        let text = "````markdown\n```mermaid\ngraph TD\n```\n`mermaid pie`\n````\n";
        assert!(diagrams(text).is_empty());
    }

    #[test]
    fn test_long_fence() {
        let text = "````mermaid\ngraph TD\nA-->B\n```\nC-->D\n````\n";
        let blocks = diagrams(text);
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].raw_text, "graph TD\nA-->B\n```\nC-->D");
        assert_eq!(blocks[0].source, &text[..text.len() - 1]);
    }

    #[test]
    fn test_fence_attributes_are_not_diagram_text() {
        assert_eq!(raw_texts("```mermaid {theme=dark}\nA-->B\n```"), vec!["A-->B"]);
    }

    #[test]
    fn test_tilde_fence() {
        assert_eq!(raw_texts("~~~mermaid\npie\n~~~\n"), vec!["pie"]);
    }

    #[test]
    fn test_single_line_triple_backticks() {
        let blocks = diagrams("See ```mermaid pie``` here");
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].raw_text, "pie");
        assert_eq!(blocks[0].source, "```mermaid pie```");
    }

    #[test]
    fn test_block_quote_prefix_removed() {
        let blocks = diagrams("> ```mermaid\n> graph TD\n> A-->B\n>\n> B-->C\n> ```\n");
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].raw_text, "graph TD\nA-->B\n\nB-->C");
        assert_eq!(blocks[0].span.start, 2);
    }

    #[test]
    fn test_block_quote_container_prefix_removed() {
        let blocks = diagrams("> <div class=\"mermaid\">graph TD\n> A --&gt; B</div>\n");
        assert_eq!(blocks[0].raw_text, "graph TD\nA --> B");
    }

    #[test]
    fn test_unterminated_fence_hides_rest() {
        let text = "`mermaid pie`\n```text\n`mermaid gantt`\n";
        assert_eq!(raw_texts(text), vec!["pie"]);
    }

    #[test]
    fn test_canonicalize_borrowed_without_diagrams() {
        assert!(matches!(canonicalize_fences("no diagrams"), Cow::Borrowed(_)));
    }

    #[test]
    fn test_canonicalize_inline_delimiters() {
        assert_eq!(
            canonicalize_fences("Intro ``graph TD A-->B`` end"),
            "Intro \n```mermaid\ngraph TD A-->B\n```\n end"
        );
    }

    #[test]
    fn test_canonicalize_standard_fence_unchanged() {
        let text = "Intro\n\n```mermaid\ngraph TD\nA-->B\n```\n\nOutro";
        assert_eq!(canonicalize_fences(text), text);
    }

    #[test]
    fn test_canonicalize_container_unescaped() {
        assert_eq!(
            canonicalize_fences("<div class=\"mermaid\">A --&gt; B</div>"),
            "```mermaid\nA --> B\n```\n"
        );
    }

    #[test]
    fn test_canonicalize_keeps_list_indent() {
        assert_eq!(
            canonicalize_fences("- item\n\n  `mermaid pie`\n"),
            "- item\n\n  ```mermaid\n  pie\n  ```\n"
        );
    }

    #[test]
    fn test_canonicalize_block_quote_stays_quoted() {
        let text = "> [!NOTE]\n> ```mermaid\n> graph TD\n> A-->B\n> ```\n";
        assert_eq!(canonicalize_fences(text), text);

        assert_eq!(
            canonicalize_fences("> See ``graph TD A-->B`` now\n"),
            "> See \n> ```mermaid\n> graph TD A-->B\n> ```\n>  now\n"
        );
    }

    #[test]
    fn test_canonicalize_long_fence() {
        assert_eq!(
            canonicalize_fences("````mermaid\ngraph TD\nA-->B\n````\n"),
            "```mermaid\ngraph TD\nA-->B\n```\n"
        );
    }

    #[test]
    fn test_canonicalize_long_fence_for_backticks() {
        assert_eq!(
            canonicalize_fences("<div class=\"mermaid\">A[\"```\"]</div>"),
            "````mermaid\nA[\"```\"]\n````\n"
        );
    }
}
