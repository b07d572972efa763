//! Selection state management.
//!
//! Holds the query, the ranked matches, the cursor and the selected set, and
//! applies [`PickEvent`]s to them. Every transition is a plain method call:
//! nothing here blocks, performs I/O, or fails.
//!
//! Selected entries are keyed by candidate *text*. Two candidates with the
//! same text are one entry: selecting either marks both, and the committed
//! result contains the text once. Selections also survive query changes, so
//! an entry can stay selected while it is filtered out of view.

use indexmap::IndexSet;
use serde::Deserialize;

use crate::candidate::{Candidate, candidates_from_lines};
use crate::event::PickEvent;
use crate::matcher::{MatchEngine, MatchResult, exact_matches};

/// How the cursor behaves at either end of the match list.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CursorPolicy {
    /// Stop at the first and last match.
    #[default]
    Clamp,
    /// Jump from the last match to the first and back.
    Wrap,
}

/// Knobs that shape a selection session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectionOptions {
    /// Maximum number of selected entries; 0 means unlimited.
    pub limit: usize,
    /// Order matches by score instead of source order.
    pub sort_enabled: bool,
    /// Refuse to commit free text that matched nothing.
    pub strict: bool,
    pub cursor_policy: CursorPolicy,
}

impl Default for SelectionOptions {
    fn default() -> Self {
        Self {
            limit: 1,
            sort_enabled: true,
            strict: true,
            cursor_policy: CursorPolicy::Clamp,
        }
    }
}

impl SelectionOptions {
    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }

    pub fn with_sort(mut self, sort_enabled: bool) -> Self {
        self.sort_enabled = sort_enabled;
        self
    }

    pub fn with_strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    pub fn with_cursor_policy(mut self, cursor_policy: CursorPolicy) -> Self {
        self.cursor_policy = cursor_policy;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Status {
    Active,
    Committed,
    Aborted,
}

/// State of one selection session.
#[derive(Debug)]
pub struct SelectionState {
    query: String,
    header: Option<String>,
    candidates: Vec<Candidate>,
    matches: Vec<MatchResult>,
    cursor: usize,
    selected: IndexSet<String>,
    options: SelectionOptions,
    status: Status,
    result: Vec<String>,
    engine: MatchEngine,
}

impl SelectionState {
    /// Creates a state showing every candidate with an empty query.
    pub fn new<I, S>(lines: I, options: SelectionOptions) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut state = Self {
            query: String::new(),
            header: None,
            candidates: candidates_from_lines(lines),
            matches: Vec::new(),
            cursor: 0,
            selected: IndexSet::new(),
            options,
            status: Status::Active,
            result: Vec::new(),
            engine: MatchEngine::new(),
        };
        state.refilter();
        state
    }

    /// Starts with `query` already typed.
    pub fn with_query(mut self, query: impl Into<String>) -> Self {
        self.query = query.into();
        self.refilter();
        self
    }

    /// Starts with `query` already typed, but shows only the candidates
    /// containing it verbatim until the query next changes.
    pub fn with_seeded_query(mut self, query: impl Into<String>) -> Self {
        self.query = query.into();
        self.matches = exact_matches(&self.query, &self.candidates);
        if self.cursor >= self.matches.len() {
            self.cursor = 0;
        }
        self
    }

    /// Places the cursor, clamped to the match list.
    pub fn with_cursor(mut self, cursor: usize) -> Self {
        self.cursor = cursor.min(self.matches.len().saturating_sub(1));
        self
    }

    pub fn with_header(mut self, header: Option<String>) -> Self {
        self.header = header;
        self
    }

    // ------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn header(&self) -> Option<&str> {
        self.header.as_deref()
    }

    pub fn matches(&self) -> &[MatchResult] {
        &self.matches
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// The match under the cursor.
    pub fn current(&self) -> Option<&MatchResult> {
        self.matches.get(self.cursor)
    }

    /// Selected texts in selection order.
    pub fn selected(&self) -> impl Iterator<Item = &str> {
        self.selected.iter().map(String::as_str)
    }

    pub fn selected_count(&self) -> usize {
        self.selected.len()
    }

    pub fn is_selected(&self, text: &str) -> bool {
        self.selected.contains(text)
    }

    pub fn limit(&self) -> usize {
        self.options.limit
    }

    pub fn options(&self) -> &SelectionOptions {
        &self.options
    }

    pub fn is_committed(&self) -> bool {
        self.status == Status::Committed
    }

    pub fn is_aborted(&self) -> bool {
        self.status == Status::Aborted
    }

    /// Whether a terminal transition has happened.
    pub fn is_finished(&self) -> bool {
        self.status != Status::Active
    }

    /// The committed result; empty unless committed.
    pub fn result(&self) -> &[String] {
        &self.result
    }

    pub fn take_result(&mut self) -> Vec<String> {
        std::mem::take(&mut self.result)
    }

    /// What a confirm would commit right now, if anything.
    ///
    /// Selected entries win, then the match under the cursor, then the raw
    /// query when free text is allowed.
    pub fn pending_result(&self) -> Option<Vec<String>> {
        if !self.selected.is_empty() {
            return Some(self.selected.iter().cloned().collect());
        }
        if let Some(current) = self.current() {
            return Some(vec![current.text().to_string()]);
        }
        if !self.options.strict && !self.query.is_empty() {
            return Some(vec![self.query.clone()]);
        }
        None
    }

    // ------------------------------------------------------------------
    // Transitions
    // ------------------------------------------------------------------

    /// Applies one event. Ignored once the state is finished.
    pub fn apply(&mut self, event: PickEvent) {
        if self.is_finished() {
            tracing::trace!("Ignoring {:?} after terminal transition", event);
            return;
        }

        match event {
            PickEvent::QueryChanged(query) => self.set_query(query),
            PickEvent::InsertChar(c) => {
                let mut query = self.query.clone();
                query.push(c);
                self.set_query(query);
            }
            PickEvent::Backspace => {
                if !self.query.is_empty() {
                    let mut query = self.query.clone();
                    query.pop();
                    self.set_query(query);
                }
            }
            PickEvent::ClearQuery => self.set_query(String::new()),
            PickEvent::CursorUp => self.select_prev(),
            PickEvent::CursorDown => self.select_next(),
            PickEvent::Home => self.cursor = 0,
            PickEvent::End => self.cursor = self.matches.len().saturating_sub(1),
            PickEvent::ToggleSelect => self.toggle_current(),
            PickEvent::SelectAll => self.select_all(),
            PickEvent::Confirm => self.confirm(),
            PickEvent::Abort => {
                self.status = Status::Aborted;
                self.result.clear();
            }
        }
    }

    fn set_query(&mut self, query: String) {
        if query == self.query {
            return;
        }
        self.query = query;
        self.refilter();
    }

    /// Re-ranks against the current query.
    fn refilter(&mut self) {
        self.matches = self
            .engine
            .rank(&self.query, &self.candidates, self.options.sort_enabled);
        if self.cursor >= self.matches.len() {
            self.cursor = 0;
        }
    }

    fn select_prev(&mut self) {
        let total = self.matches.len();
        if total == 0 {
            return;
        }
        if self.cursor > 0 {
            self.cursor -= 1;
        } else if self.options.cursor_policy == CursorPolicy::Wrap {
            self.cursor = total - 1;
        }
    }

    fn select_next(&mut self) {
        let total = self.matches.len();
        if total == 0 {
            return;
        }
        if self.cursor + 1 < total {
            self.cursor += 1;
        } else if self.options.cursor_policy == CursorPolicy::Wrap {
            self.cursor = 0;
        }
    }

    fn has_room(&self) -> bool {
        self.options.limit == 0 || self.selected.len() < self.options.limit
    }

    fn toggle_current(&mut self) {
        let Some(text) = self.current().map(|m| m.text().to_string()) else {
            return;
        };
        if self.selected.shift_remove(&text) {
            return;
        }
        if self.has_room() {
            self.selected.insert(text);
        } else {
            tracing::debug!("Selection limit {} reached", self.options.limit);
        }
    }

    fn select_all(&mut self) {
        let texts: Vec<String> = self.matches.iter().map(|m| m.text().to_string()).collect();
        for text in texts {
            if !self.has_room() {
                break;
            }
            self.selected.insert(text);
        }
    }

    fn confirm(&mut self) {
        if let Some(result) = self.pending_result() {
            self.result = result;
            self.status = Status::Committed;
        }
    }
}
