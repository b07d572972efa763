//! The session loop.
//!
//! A session fetches its candidates, then alternates between waiting for
//! the next thing to happen and applying it to the [`SelectionState`],
//! rendering after every transition, until exactly one [`SessionOutcome`]
//! is reached. The outcome is returned from a single exit point, so a
//! session can never report twice.

use tokio_util::sync::CancellationToken;

use crate::candidate::CandidateList;
use crate::error::PickError;
use crate::event::EventSource;
use crate::outcome::SessionOutcome;
use crate::render::RenderSink;
use crate::source::CandidateSource;
use crate::state::{SelectionOptions, SelectionState};
use crate::timeout::{OnTimeout, TimeoutController, TimeoutPolicy, Wake};

/// Everything a session needs besides its collaborators.
#[derive(Debug, Clone)]
pub struct SessionOptions {
    pub selection: SelectionOptions,
    pub timeout: TimeoutPolicy,
    /// Query typed before the first frame.
    pub initial_query: String,
    /// Cursor position before the first frame, clamped to the matches.
    pub initial_cursor: usize,
    /// Whether the user can type a query. Without it, an empty candidate
    /// list leaves nothing to do.
    pub query_input: bool,
    /// Show only verbatim matches of the initial query in the first frame.
    pub exact_seed: bool,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self::new(SelectionOptions::default())
    }
}

impl SessionOptions {
    pub fn new(selection: SelectionOptions) -> Self {
        Self {
            selection,
            timeout: TimeoutPolicy::disabled(),
            initial_query: String::new(),
            initial_cursor: 0,
            query_input: true,
            exact_seed: false,
        }
    }

    pub fn with_timeout(mut self, timeout: TimeoutPolicy) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_initial_query(mut self, query: impl Into<String>) -> Self {
        self.initial_query = query.into();
        self
    }

    pub fn with_initial_cursor(mut self, cursor: usize) -> Self {
        self.initial_cursor = cursor;
        self
    }

    pub fn with_query_input(mut self, query_input: bool) -> Self {
        self.query_input = query_input;
        self
    }

    pub fn with_exact_seed(mut self, exact_seed: bool) -> Self {
        self.exact_seed = exact_seed;
        self
    }
}

/// The outcome together with the query the user left behind.
#[derive(Debug)]
pub struct SessionReport {
    pub outcome: SessionOutcome,
    pub final_query: String,
}

/// One interactive selection.
#[derive(Debug, Clone)]
pub struct Session {
    options: SessionOptions,
    cancel: CancellationToken,
}

impl Session {
    pub fn new(options: SessionOptions, cancel: CancellationToken) -> Self {
        Self { options, cancel }
    }

    pub fn options(&self) -> &SessionOptions {
        &self.options
    }

    /// Fetches candidates from `source` and runs the session on them.
    pub async fn run(
        &self,
        source: &dyn CandidateSource,
        events: &mut dyn EventSource,
        sink: &mut dyn RenderSink,
    ) -> SessionOutcome {
        let list = match source.fetch().await {
            Ok(list) => list,
            Err(e) => {
                tracing::warn!("Candidate source '{}' failed: {}", source.name(), e);
                return SessionOutcome::Error(e);
            }
        };
        self.run_with(list, events, sink).await.outcome
    }

    /// Runs the session on an already fetched candidate list.
    pub async fn run_with(
        &self,
        list: CandidateList,
        events: &mut dyn EventSource,
        sink: &mut dyn RenderSink,
    ) -> SessionReport {
        if list.is_empty() && (!self.options.query_input || self.options.selection.strict) {
            return SessionReport {
                outcome: SessionOutcome::Error(PickError::NoCandidates),
                final_query: self.options.initial_query.clone(),
            };
        }

        let state = SelectionState::new(list.lines, self.options.selection.clone());
        let state = if self.options.exact_seed {
            state.with_seeded_query(self.options.initial_query.clone())
        } else {
            state.with_query(self.options.initial_query.clone())
        };
        let mut state = state
            .with_cursor(self.options.initial_cursor)
            .with_header(list.header);

        let mut timer = TimeoutController::start(&self.options.timeout, self.cancel.clone());
        tracing::debug!(
            "Session started with {} matches, timeout {:?}",
            state.matches().len(),
            timer.remaining()
        );

        let outcome = match sink.render(&state) {
            Err(e) => SessionOutcome::Error(e),
            Ok(()) => self.drive(&mut state, &timer, events, sink).await,
        };
        timer.disarm();

        tracing::debug!("Session ended: {}", outcome.label());
        SessionReport {
            outcome,
            final_query: state.query().to_string(),
        }
    }

    async fn drive(
        &self,
        state: &mut SelectionState,
        timer: &TimeoutController,
        events: &mut dyn EventSource,
        sink: &mut dyn RenderSink,
    ) -> SessionOutcome {
        loop {
            let event = match timer.wait(&mut *events).await {
                Wake::Event(event) => event,
                Wake::Cancelled => {
                    tracing::debug!("Session cancelled");
                    return SessionOutcome::Aborted;
                }
                Wake::Closed => {
                    tracing::debug!("Event source closed");
                    return SessionOutcome::Aborted;
                }
                Wake::Expired => {
                    let result = match self.options.timeout.on_timeout() {
                        OnTimeout::CommitCurrent => state.pending_result().unwrap_or_default(),
                        OnTimeout::Discard => Vec::new(),
                    };
                    return SessionOutcome::TimedOut(result);
                }
            };

            tracing::trace!("Applying {:?}", event);
            state.apply(event);

            if let Err(e) = sink.render(state) {
                return SessionOutcome::Error(e);
            }

            if state.is_committed() {
                return SessionOutcome::Committed(state.take_result());
            }
            if state.is_aborted() {
                return SessionOutcome::Aborted;
            }
        }
    }
}
