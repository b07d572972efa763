//! Fuzzy ranking of candidates against a query, using nucleo-matcher.
//!
//! A candidate matches when the query's characters appear in it, in order,
//! with case respected. nucleo scores contiguous runs and word-boundary
//! starts; on top of that an earliness term favours matches that begin
//! closer to the start of the line.
//!
//! Non-ASCII text is handed to nucleo one `char` per slot rather than one
//! grapheme cluster per slot, so combining marks stay matchable on their own
//! and every reported position is a char index into the candidate.

use std::sync::Arc;

use nucleo_matcher::{Config, Matcher, Utf32Str};

use crate::candidate::Candidate;

/// Weight of the raw nucleo score relative to the earliness term.
const SCORE_SCALE: i64 = 8;

/// First-match positions beyond this stop lowering the score.
const EARLINESS_WINDOW: usize = 64;

/// A candidate that matched the current query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchResult {
    /// Index of the candidate in the source list.
    pub index: usize,
    /// Candidate text.
    pub text: Arc<str>,
    /// Higher is better. Zero for the unfiltered view.
    pub score: i64,
    /// Char indices of the matched characters, strictly increasing.
    pub positions: Vec<usize>,
}

impl MatchResult {
    fn unscored(candidate: &Candidate) -> Self {
        Self {
            index: candidate.index(),
            text: candidate.shared_text(),
            score: 0,
            positions: Vec::new(),
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }
}

/// Reusable ranking engine.
///
/// Keeps the nucleo matcher and its scratch buffers between calls so the
/// per-keystroke path does not reallocate them.
#[derive(Debug)]
pub struct MatchEngine {
    matcher: Matcher,
    needle_buf: Vec<char>,
    haystack_buf: Vec<char>,
    indices: Vec<u32>,
}

impl Default for MatchEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl MatchEngine {
    pub fn new() -> Self {
        let mut config = Config::DEFAULT;
        config.ignore_case = false;
        config.normalize = false;
        Self {
            matcher: Matcher::new(config),
            needle_buf: Vec::new(),
            haystack_buf: Vec::new(),
            indices: Vec::new(),
        }
    }

    /// Ranks `candidates` against `query`.
    ///
    /// An empty query returns every candidate unscored in source order. With
    /// `sort_enabled` results are ordered by score descending, ties by source
    /// index; otherwise they keep source order.
    pub fn rank(
        &mut self,
        query: &str,
        candidates: &[Candidate],
        sort_enabled: bool,
    ) -> Vec<MatchResult> {
        if query.is_empty() {
            return candidates.iter().map(MatchResult::unscored).collect();
        }

        // Matched as one literal needle: whitespace does not split it.
        let needle = char_slots(query, &mut self.needle_buf);

        let mut results = Vec::new();
        for candidate in candidates {
            self.indices.clear();
            let haystack = char_slots(candidate.text(), &mut self.haystack_buf);
            let Some(raw) = self
                .matcher
                .fuzzy_indices(haystack, needle, &mut self.indices)
            else {
                continue;
            };

            self.indices.sort_unstable();
            self.indices.dedup();
            let positions: Vec<usize> = self.indices.iter().map(|&i| i as usize).collect();
            let first = positions.first().copied().unwrap_or(0);

            results.push(MatchResult {
                index: candidate.index(),
                text: candidate.shared_text(),
                score: i64::from(raw) * SCORE_SCALE - first.min(EARLINESS_WINDOW) as i64,
                positions,
            });
        }

        if sort_enabled {
            results.sort_by(|a, b| b.score.cmp(&a.score).then(a.index.cmp(&b.index)));
        }
        results
    }
}

/// Views `text` as one slot per `char`.
fn char_slots<'a>(text: &'a str, buf: &'a mut Vec<char>) -> Utf32Str<'a> {
    if text.is_ascii() {
        return Utf32Str::Ascii(text.as_bytes());
    }
    buf.clear();
    buf.extend(text.chars());
    Utf32Str::Unicode(buf)
}

/// One-shot ranking with a fresh engine.
pub fn rank(query: &str, candidates: &[Candidate], sort_enabled: bool) -> Vec<MatchResult> {
    MatchEngine::new().rank(query, candidates, sort_enabled)
}

/// Substring filter used to seed a view from a previous query.
///
/// Keeps source order; positions cover the first occurrence.
pub fn exact_matches(query: &str, candidates: &[Candidate]) -> Vec<MatchResult> {
    if query.is_empty() {
        return candidates.iter().map(MatchResult::unscored).collect();
    }

    let query_len = query.chars().count();
    candidates
        .iter()
        .filter_map(|candidate| {
            let byte_pos = candidate.text().find(query)?;
            let start = candidate.text()[..byte_pos].chars().count();
            Some(MatchResult {
                index: candidate.index(),
                text: candidate.shared_text(),
                score: 0,
                positions: (start..start + query_len).collect(),
            })
        })
        .collect()
}
