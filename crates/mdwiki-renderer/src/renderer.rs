//! Event-driven markdown renderer.

use std::collections::HashMap;
use std::fmt::Write;

use pulldown_cmark::{CodeBlockKind, Event, Options, Parser, Tag, TagEnd};

use crate::callout::{CalloutKind, CalloutPreprocessor};
use crate::code_block::{CodeBlockProcessor, ProcessResult, parse_fence_info};
use crate::html;
use crate::link;
use crate::state::{CodeBlockState, HeadingState, ImageState, TableState, TocEntry, escape_html};

/// Result of rendering markdown.
#[derive(Clone, Debug)]
pub struct RenderResult {
    /// Rendered HTML.
    pub html: String,
    /// Text of the first H1, when title extraction is enabled.
    pub title: Option<String>,
    /// Headings other than the title, in document order.
    pub toc: Vec<TocEntry>,
    /// Warnings reported by code block processors.
    pub warnings: Vec<String>,
}

/// Open block quote: either a callout or a plain quote.
#[derive(Clone, Copy)]
enum Quote {
    Plain,
    Callout(CalloutKind),
}

/// Markdown to HTML renderer.
///
/// Tables, strikethrough, task lists and GFM block-quote callouts are enabled
/// by default. Special code blocks are delegated to processors registered
/// with [`with_processor`](Self::with_processor).
pub struct MarkdownRenderer {
    output: String,
    code: CodeBlockState,
    table: TableState,
    image: ImageState,
    heading: HeadingState,
    quotes: Vec<Quote>,
    base_dir: Option<String>,
    processors: Vec<Box<dyn CodeBlockProcessor>>,
    code_block_index: usize,
    pending_attrs: HashMap<String, String>,
}

impl MarkdownRenderer {
    #[must_use]
    pub fn new() -> Self {
        Self {
            output: String::with_capacity(4096),
            code: CodeBlockState::default(),
            table: TableState::default(),
            image: ImageState::default(),
            heading: HeadingState::new(false),
            quotes: Vec::new(),
            base_dir: None,
            processors: Vec::new(),
            code_block_index: 0,
            pending_attrs: HashMap::new(),
        }
    }

    /// Report the first H1 as the title (it is still rendered).
    #[must_use]
    pub fn with_title_extraction(mut self) -> Self {
        self.heading = HeadingState::new(true);
        self
    }

    /// Resolve relative `.md` links against this directory.
    #[must_use]
    pub fn with_base_dir(mut self, dir: impl Into<String>) -> Self {
        self.base_dir = Some(dir.into());
        self
    }

    /// Register a code block processor.
    #[must_use]
    pub fn with_processor<P: CodeBlockProcessor + 'static>(mut self, processor: P) -> Self {
        self.processors.push(Box::new(processor));
        self
    }

    /// Parser extensions: tables, strikethrough, task lists and GFM
    /// block-quote kinds.
    #[must_use]
    pub fn parser_options() -> Options {
        Options::ENABLE_TABLES
            | Options::ENABLE_STRIKETHROUGH
            | Options::ENABLE_TASKLISTS
            | Options::ENABLE_GFM
    }

    /// Render markdown text, normalizing callout markers first.
    pub fn render_markdown(&mut self, markdown: &str) -> RenderResult {
        let prepared = CalloutPreprocessor::new().process(markdown);
        self.render(Parser::new_ext(&prepared, Self::parser_options()))
    }

    /// Render parser events. Processors' `post_process` runs on the result.
    pub fn render<'a, I>(&mut self, events: I) -> RenderResult
    where
        I: Iterator<Item = Event<'a>>,
    {
        for event in events {
            self.process_event(event);
        }

        let mut html = std::mem::take(&mut self.output);
        for processor in &mut self.processors {
            processor.post_process(&mut html);
        }

        RenderResult {
            html,
            title: self.heading.take_title(),
            toc: self.heading.take_toc(),
            warnings: self
                .processors
                .iter()
                .flat_map(|p| p.warnings())
                .cloned()
                .collect(),
        }
    }

    fn process_event(&mut self, event: Event<'_>) {
        match event {
            Event::Start(tag) => self.start_tag(tag),
            Event::End(tag) => self.end_tag(tag),
            Event::Text(text) => self.text(&text),
            Event::Code(code) => self.inline_code(&code),
            Event::Html(raw) | Event::InlineHtml(raw) => self.output.push_str(&raw),
            Event::SoftBreak => {
                if self.code.is_active() {
                    self.code.push_str("\n");
                } else {
                    self.push_inline("\n");
                }
            }
            Event::HardBreak => self.push_inline("<br>"),
            Event::Rule => self.output.push_str("<hr>"),
            Event::TaskListMarker(checked) => self.output.push_str(if checked {
                r#"<input type="checkbox" checked disabled> "#
            } else {
                r#"<input type="checkbox" disabled> "#
            }),
            Event::FootnoteReference(_) | Event::InlineMath(_) | Event::DisplayMath(_) => {}
        }
    }

    fn push_inline(&mut self, content: &str) {
        if self.heading.is_active() {
            self.heading.push_html(content);
        } else {
            self.output.push_str(content);
        }
    }

    fn start_tag(&mut self, tag: Tag<'_>) {
        match tag {
            Tag::Paragraph => self.output.push_str("<p>"),
            Tag::Heading { level, .. } => self.heading.start(level),
            Tag::BlockQuote(kind) => {
                match kind.and_then(CalloutKind::from_blockquote) {
                    Some(callout) => {
                        html::callout_start(callout, &mut self.output);
                        self.quotes.push(Quote::Callout(callout));
                    }
                    None => {
                        self.output.push_str("<blockquote>");
                        self.quotes.push(Quote::Plain);
                    }
                }
            }
            Tag::CodeBlock(kind) => {
                let (lang, attrs) = match kind {
                    CodeBlockKind::Fenced(info) => parse_fence_info(&info),
                    CodeBlockKind::Indented => (None, HashMap::new()),
                };
                self.pending_attrs = attrs;
                self.code.start(lang);
            }
            Tag::List(Some(1)) => self.output.push_str("<ol>"),
            Tag::List(Some(start)) => {
                let _ = write!(self.output, r#"<ol start="{start}">"#);
            }
            Tag::List(None) => self.output.push_str("<ul>"),
            Tag::Item => self.output.push_str("<li>"),
            Tag::DefinitionList => self.output.push_str("<dl>"),
            Tag::DefinitionListTitle => self.output.push_str("<dt>"),
            Tag::DefinitionListDefinition => self.output.push_str("<dd>"),
            Tag::Table(alignments) => {
                self.table.start(alignments);
                self.output.push_str("<table>");
            }
            Tag::TableHead => {
                self.table.set_head(true);
                self.output.push_str("<thead><tr>");
            }
            Tag::TableRow => {
                self.table.start_row();
                self.output.push_str("<tr>");
            }
            Tag::TableCell => {
                let _ = write!(
                    self.output,
                    "<{}{}>",
                    self.table.cell_tag(),
                    self.table.alignment_attr()
                );
            }
            Tag::Emphasis => self.push_inline("<em>"),
            Tag::Strong => self.push_inline("<strong>"),
            Tag::Strikethrough => self.push_inline("<s>"),
            Tag::Superscript => self.push_inline("<sup>"),
            Tag::Subscript => self.push_inline("<sub>"),
            Tag::Link { dest_url, .. } => {
                let href = match &self.base_dir {
                    Some(base) => link::resolve_link(&dest_url, base),
                    None => dest_url.to_string(),
                };
                let open = format!(r#"<a href="{}">"#, escape_html(&href));
                self.push_inline(&open);
            }
            Tag::Image {
                dest_url, title, ..
            } => self.image.start(dest_url.to_string(), title.to_string()),
            Tag::FootnoteDefinition(_) | Tag::HtmlBlock | Tag::MetadataBlock(_) => {}
        }
    }

    fn end_tag(&mut self, tag: TagEnd) {
        match tag {
            TagEnd::Paragraph => self.output.push_str("</p>"),
            TagEnd::Heading(_) => {
                if let Some((level, id, inner)) = self.heading.complete() {
                    let _ = write!(
                        self.output,
                        r#"<h{level} id="{id}">{}</h{level}>"#,
                        inner.trim()
                    );
                }
            }
            TagEnd::BlockQuote(_) => match self.quotes.pop() {
                Some(Quote::Callout(_)) => html::callout_end(&mut self.output),
                Some(Quote::Plain) | None => self.output.push_str("</blockquote>"),
            },
            TagEnd::CodeBlock => self.finish_code_block(),
            TagEnd::List(ordered) => self.output.push_str(if ordered { "</ol>" } else { "</ul>" }),
            TagEnd::Item => self.output.push_str("</li>"),
            TagEnd::DefinitionList => self.output.push_str("</dl>"),
            TagEnd::DefinitionListTitle => self.output.push_str("</dt>"),
            TagEnd::DefinitionListDefinition => self.output.push_str("</dd>"),
            TagEnd::Table => self.output.push_str("</tbody></table>"),
            TagEnd::TableHead => {
                self.output.push_str("</tr></thead><tbody>");
                self.table.set_head(false);
            }
            TagEnd::TableRow => self.output.push_str("</tr>"),
            TagEnd::TableCell => {
                let _ = write!(self.output, "</{}>", self.table.cell_tag());
                self.table.next_cell();
            }
            TagEnd::Emphasis => self.push_inline("</em>"),
            TagEnd::Strong => self.push_inline("</strong>"),
            TagEnd::Strikethrough => self.push_inline("</s>"),
            TagEnd::Superscript => self.push_inline("</sup>"),
            TagEnd::Subscript => self.push_inline("</sub>"),
            TagEnd::Link => self.push_inline("</a>"),
            TagEnd::Image => {
                if let Some((src, title, alt)) = self.image.end() {
                    let mut markup = String::new();
                    html::image(&src, &alt, &title, &mut markup);
                    self.push_inline(&markup);
                }
            }
            TagEnd::FootnoteDefinition | TagEnd::HtmlBlock | TagEnd::MetadataBlock(_) => {}
        }
    }

    fn finish_code_block(&mut self) {
        let (lang, content) = self.code.end();
        let attrs = std::mem::take(&mut self.pending_attrs);
        let index = self.code_block_index;
        self.code_block_index += 1;

        if let Some(lang) = lang.as_deref() {
            for processor in &mut self.processors {
                match processor.process(lang, &attrs, &content, index) {
                    ProcessResult::Placeholder(markup) | ProcessResult::Inline(markup) => {
                        self.output.push_str(&markup);
                        return;
                    }
                    ProcessResult::PassThrough => {}
                }
            }
        }

        html::code_block(lang.as_deref(), &content, &mut self.output);
    }

    fn text(&mut self, text: &str) {
        if self.code.is_active() {
            self.code.push_str(text);
        } else if self.image.is_active() {
            self.image.push_str(text);
        } else if self.heading.is_active() {
            self.heading.push_text(text);
            self.heading.push_html(&escape_html(text));
        } else {
            self.output.push_str(&escape_html(text));
        }
    }

    fn inline_code(&mut self, code: &str) {
        let markup = format!("<code>{}</code>", escape_html(code));
        if self.heading.is_active() {
            self.heading.push_text(code);
            self.heading.push_html(&markup);
        } else if self.image.is_active() {
            self.image.push_str(code);
        } else {
            self.output.push_str(&markup);
        }
    }
}

impl Default for MarkdownRenderer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn render(markdown: &str) -> RenderResult {
        MarkdownRenderer::new().render_markdown(markdown)
    }

    #[test]
    fn test_basic_paragraph() {
        assert_eq!(render("Hello, world!").html, "<p>Hello, world!</p>");
    }

    #[test]
    fn test_heading_with_id() {
        let result = render("## Section Title");
        assert_eq!(result.html, r#"<h2 id="section-title">Section Title</h2>"#);
        assert_eq!(result.toc.len(), 1);
        assert_eq!(result.toc[0].id, "section-title");
    }

    #[test]
    fn test_title_extraction() {
        let mut renderer = MarkdownRenderer::new().with_title_extraction();
        let result = renderer.render_markdown("# My Title\n\nText\n\n## Section");
        assert_eq!(result.title.as_deref(), Some("My Title"));
        assert!(result.html.contains(r#"<h1 id="my-title">My Title</h1>"#));
        assert_eq!(result.toc.len(), 1);
        assert_eq!(result.toc[0].level, 2);
    }

    #[test]
    fn test_heading_with_inline_code() {
        let result = render("## Install `npm`");
        assert!(result.html.contains("<code>npm</code>"));
        assert_eq!(result.toc[0].title, "Install npm");
    }

    #[test]
    fn test_table_and_strikethrough() {
        let result = render("| A | B |\n|---|---|\n| 1 | ~~2~~ |");
        assert!(result.html.contains("<table><thead><tr><th>A</th>"));
        assert!(result.html.contains("<td><s>2</s></td>"));
    }

    #[test]
    fn test_plain_blockquote() {
        let result = render("> Just a quote");
        assert_eq!(result.html, "<blockquote><p>Just a quote</p></blockquote>");
    }

    #[test]
    fn test_warning_callout() {
        let result = render("> [!WARNING]\n> Be careful!");
        assert!(result.html.contains("callout-warning"));
        assert!(result.html.contains(r#"<h4 class="callout-title">Warning</h4>"#));
        assert!(result.html.contains("<p>Be careful!</p>"));
        assert!(!result.html.contains("<blockquote>"));
    }

    #[test]
    fn test_lowercase_callout_with_inline_body() {
        let result = render("> [!note] Remember **this**");
        assert!(result.html.contains(r#"<h4 class="callout-title">Note</h4>"#));
        assert!(result.html.contains("<strong>this</strong>"));
    }

    #[test]
    fn test_tip_callout_with_list() {
        let result = render("> [!TIP]\n> Options:\n> - one\n> - two");
        assert!(result.html.contains("callout-tip"));
        assert!(result.html.contains("<ul><li>one</li>"));
    }

    #[test]
    fn test_link_resolution() {
        let mut renderer = MarkdownRenderer::new().with_base_dir("guide");
        let result = renderer.render_markdown("[Next](next.md)");
        assert!(result.html.contains(r#"<a href="/docs/guide/next/">Next</a>"#));
    }

    #[test]
    fn test_image() {
        let result = render("![Alt text](image.png)");
        assert!(result.html.contains(r#"<img src="image.png" alt="Alt text">"#));
    }

    #[test]
    fn test_task_list() {
        let result = render("- [ ] todo\n- [x] done");
        assert!(result.html.contains(r#"<input type="checkbox" disabled>"#));
        assert!(result.html.contains(r#"<input type="checkbox" checked disabled>"#));
    }

    struct Placeholders(Vec<String>);

    impl CodeBlockProcessor for Placeholders {
        fn process(
            &mut self,
            language: &str,
            _attrs: &HashMap<String, String>,
            source: &str,
            index: usize,
        ) -> ProcessResult {
            if language == "diagram" {
                self.0.push(source.to_owned());
                ProcessResult::Placeholder(format!("{{{{DIAGRAM_{index}}}}}"))
            } else {
                ProcessResult::PassThrough
            }
        }

        fn post_process(&mut self, html: &mut String) {
            for (i, source) in self.0.iter().enumerate() {
                *html = html.replace(&format!("{{{{DIAGRAM_{i}}}}}"), &format!("[{}]", source.trim()));
            }
        }

        fn warnings(&self) -> &[String] {
            &self.0
        }
    }

    #[test]
    fn test_processor_placeholder_and_post_process() {
        let mut renderer = MarkdownRenderer::new().with_processor(Placeholders(Vec::new()));
        let result = renderer.render_markdown("```diagram\nA -> B\n```\n\n```rust\nfn main() {}\n```");
        assert!(result.html.starts_with("[A -> B]"));
        assert!(result.html.contains(r#"<code class="language-rust">"#));
        assert_eq!(result.warnings, vec!["A -> B\n".to_owned()]);
    }

    #[test]
    fn test_code_block_without_language_skips_processors() {
        let mut renderer = MarkdownRenderer::new().with_processor(Placeholders(Vec::new()));
        let result = renderer.render_markdown("```\ndiagram\n```");
        assert_eq!(result.html, "<pre><code>diagram\n</code></pre>");
    }
}
