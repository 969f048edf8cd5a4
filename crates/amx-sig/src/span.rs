use serde::{Deserialize, Serialize};
use std::fmt;

/// Byte range inside a mangled name.
///
/// Offsets are 0-based and index the full mangled string, base name included.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    /// Create a new span.
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    /// Create a zero-width span at a single offset.
    pub fn point(offset: usize) -> Self {
        Self::new(offset, offset)
    }

    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Build a caret line pointing at this span, for display under `subject`.
    ///
    /// Zero-width spans still get a single caret. Spans reaching past the end
    /// of `subject` are clamped so the caret sits just after the last byte.
    pub fn underline(&self, subject: &str) -> String {
        let start = self.start.min(subject.len());
        let width = self.len().max(1);
        format!("{}{}", " ".repeat(start), "^".repeat(width))
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            write!(f, "offset {}", self.start)
        } else {
            write!(f, "offsets {}..{}", self.start, self.end)
        }
    }
}
