//! Candidate lines as produced by a candidate source.

use std::sync::Arc;

/// One selectable line of text.
///
/// The text is shared so match results can point back at it without copying
/// on every keystroke. `index` is the position in the list the source
/// produced and is the tie breaker for ranking.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    index: usize,
    text: Arc<str>,
}

impl Candidate {
    /// Creates a candidate at the given source position.
    pub fn new(index: usize, text: impl Into<Arc<str>>) -> Self {
        Self {
            index,
            text: text.into(),
        }
    }

    /// Position in the source list.
    pub fn index(&self) -> usize {
        self.index
    }

    /// The candidate text.
    pub fn text(&self) -> &str {
        &self.text
    }

    pub(crate) fn shared_text(&self) -> Arc<str> {
        Arc::clone(&self.text)
    }
}

/// Builds candidates from lines, numbering them in order.
pub fn candidates_from_lines<I, S>(lines: I) -> Vec<Candidate>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    lines
        .into_iter()
        .enumerate()
        .map(|(index, line)| Candidate::new(index, line.as_ref()))
        .collect()
}

/// What a candidate source hands to a session: an optional title line and the
/// selectable lines below it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CandidateList {
    /// Non-selectable header, e.g. the column line of `ps aux`.
    pub header: Option<String>,
    /// Selectable lines in source order.
    pub lines: Vec<String>,
}

impl CandidateList {
    /// Creates a list without a header.
    pub fn new(lines: Vec<String>) -> Self {
        Self {
            header: None,
            lines,
        }
    }

    /// Splits the first line off as the header.
    pub fn with_header_line(mut lines: Vec<String>) -> Self {
        if lines.is_empty() {
            return Self::default();
        }
        let header = lines.remove(0);
        Self {
            header: Some(header),
            lines,
        }
    }

    /// Splits raw command output into lines, dropping the trailing newline.
    pub fn from_output(output: &str, has_header: bool) -> Self {
        let trimmed = output.strip_suffix('\n').unwrap_or(output);
        let lines: Vec<String> = if trimmed.is_empty() {
            Vec::new()
        } else {
            trimmed.split('\n').map(str::to_string).collect()
        };
        if has_header {
            Self::with_header_line(lines)
        } else {
            Self::new(lines)
        }
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }
}
