//! Fenced code block tracking for line-based preprocessors.

/// Tracks whether a line-by-line scan is inside a fenced code block.
///
/// A fence opens with three or more backticks or tildes and closes with a
/// line of the same character that is at least as long and carries no info
/// string.
#[derive(Debug, Default)]
pub struct FenceTracker {
    open: Option<(char, usize)>,
}

impl FenceTracker {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn in_fence(&self) -> bool {
        self.open.is_some()
    }

    /// Feed the next line. Returns `true` when the line opened or closed a fence.
    pub fn update(&mut self, line: &str) -> bool {
        let trimmed = line.trim_start();
        let Some((ch, len)) = fence_run(trimmed) else {
            return false;
        };

        match self.open {
            Some((open_ch, open_len)) => {
                let closes =
                    ch == open_ch && len >= open_len && trimmed[len..].trim().is_empty();
                if closes {
                    self.open = None;
                }
                closes
            }
            // A backtick fence's info string cannot contain backticks.
            None if ch == '`' && trimmed[len..].contains('`') => false,
            None => {
                self.open = Some((ch, len));
                true
            }
        }
    }
}

/// Leading run of fence characters, if long enough to be a fence.
fn fence_run(trimmed: &str) -> Option<(char, usize)> {
    let first = trimmed.chars().next().filter(|c| matches!(c, '`' | '~'))?;
    let len = trimmed.chars().take_while(|&c| c == first).count();
    (len >= 3).then_some((first, len))
}
