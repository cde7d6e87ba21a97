//! Line, word and character statistics for text content.
//!
//! Pure functions over fully-received content; no I/O and no awareness of
//! the wire protocol. The [`AnalysisReport`] summary block is the shared
//! textual format used in server replies and the result log.

mod report;

pub use report::{AnalysisReport, ParseReportError};

/// Statistics computed over one piece of text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextStats {
    /// Line terminators in the content, plus one if the content is
    /// non-empty (a non-terminated final line still counts).
    pub line_count: u64,
    /// Maximal runs of non-whitespace characters (whitespace = space,
    /// tab, CR, LF).
    pub word_count: u64,
    /// Total `char` count of the decoded text.
    pub char_count: u64,
}

/// Computes statistics over `content`.
pub fn analyze(content: &str) -> TextStats {
    let line_count = if content.is_empty() {
        0
    } else {
        content.matches('\n').count() as u64 + 1
    };

    let word_count = content
        .split(|c: char| matches!(c, ' ' | '\t' | '\r' | '\n'))
        .filter(|token| !token.is_empty())
        .count() as u64;

    let char_count = content.chars().count() as u64;

    TextStats {
        line_count,
        word_count,
        char_count,
    }
}
