//! The analysis report and its textual summary format.

use crate::{TextStats, analyze};

/// Statistics for one analyzed file, paired with its logical name.
///
/// Immutable once created. The summary block rendered by
/// [`summary`](AnalysisReport::summary) is the format sent over the wire
/// and appended to the result log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalysisReport {
    pub file_name: String,
    pub line_count: u64,
    pub word_count: u64,
    pub char_count: u64,
}

/// Error returned when a summary block cannot be parsed back.
#[derive(Debug, thiserror::Error)]
#[error("invalid summary block: {0}")]
pub struct ParseReportError(String);

impl AnalysisReport {
    /// Analyzes `content` and labels the result with `file_name`.
    pub fn from_content(file_name: &str, content: &str) -> Self {
        let TextStats {
            line_count,
            word_count,
            char_count,
        } = analyze(content);
        Self {
            file_name: file_name.to_string(),
            line_count,
            word_count,
            char_count,
        }
    }

    /// Renders the four-line summary block (no trailing newline):
    ///
    /// ```text
    /// File: notes.txt
    /// Lines: 2
    /// Words: 3
    /// Chars: 15
    /// ```
    pub fn summary(&self) -> String {
        format!(
            "File: {}\nLines: {}\nWords: {}\nChars: {}",
            self.file_name, self.line_count, self.word_count, self.char_count
        )
    }

    /// Parses a summary block produced by [`summary`](Self::summary).
    pub fn parse(text: &str) -> Result<Self, ParseReportError> {
        let mut file_name = None;
        let mut line_count = None;
        let mut word_count = None;
        let mut char_count = None;

        for line in text.lines() {
            if let Some(rest) = line.strip_prefix("File: ") {
                file_name = Some(rest.to_string());
            } else if let Some(rest) = line.strip_prefix("Lines: ") {
                line_count = Some(parse_count(rest)?);
            } else if let Some(rest) = line.strip_prefix("Words: ") {
                word_count = Some(parse_count(rest)?);
            } else if let Some(rest) = line.strip_prefix("Chars: ") {
                char_count = Some(parse_count(rest)?);
            }
        }

        match (file_name, line_count, word_count, char_count) {
            (Some(file_name), Some(line_count), Some(word_count), Some(char_count)) => Ok(Self {
                file_name,
                line_count,
                word_count,
                char_count,
            }),
            _ => Err(ParseReportError(format!("missing fields in {text:?}"))),
        }
    }
}

fn parse_count(text: &str) -> Result<u64, ParseReportError> {
    text.trim()
        .parse()
        .map_err(|_| ParseReportError(format!("not a count: {text:?}")))
}
