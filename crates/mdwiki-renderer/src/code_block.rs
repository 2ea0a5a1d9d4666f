//! Code block processor seam.
//!
//! Processors are registered on the renderer and consulted in order for every
//! fenced code block with a language. The first processor that does not
//! return [`ProcessResult::PassThrough`] wins.

use std::collections::HashMap;

/// Outcome of offering a code block to a processor.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ProcessResult {
    /// Emit a placeholder now and replace it in [`CodeBlockProcessor::post_process`].
    ///
    /// Use when the replacement needs work that is better batched after the
    /// whole document has been walked (network calls, parallel rendering).
    Placeholder(String),

    /// Emit this HTML in place of the code block.
    Inline(String),

    /// Not handled; render as a regular code block.
    PassThrough,
}

/// Handles special code blocks (diagrams, embeds) during rendering.
pub trait CodeBlockProcessor {
    /// Offer a code block to this processor.
    ///
    /// `attrs` holds `key=value` pairs from the fence info string after the
    /// language, and `index` counts code blocks in document order.
    fn process(
        &mut self,
        language: &str,
        attrs: &HashMap<String, String>,
        source: &str,
        index: usize,
    ) -> ProcessResult;

    /// Replace placeholders once rendering completes.
    fn post_process(&mut self, _html: &mut String) {}

    /// Warnings collected while processing.
    fn warnings(&self) -> &[String] {
        &[]
    }
}

/// Split a fence info string (`language [key=value ...]`) into its parts.
pub(crate) fn parse_fence_info(info: &str) -> (Option<String>, HashMap<String, String>) {
    let mut parts = info.split_whitespace();
    let language = parts.next().map(str::to_owned);

    let attrs = parts
        .filter_map(|part| part.split_once('='))
        .map(|(key, value)| {
            let value = value.trim_matches('"').trim_matches('\'');
            (key.to_owned(), value.to_owned())
        })
        .collect();

    (language, attrs)
}
