//! Re-entrant runner.
//!
//! Wraps the session loop for choosers that act on a selection and then
//! come back for more, like the process chooser: pick processes, signal
//! them, look at the refreshed table, repeat.
//!
//! Iterations are strictly sequential. Each one re-fetches the candidates,
//! drops the excluded identifier (the chooser's own process), and starts a
//! new session with the query the previous one ended with.

use std::sync::Arc;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::candidate::CandidateList;
use crate::error::PickResult;
use crate::event::EventSource;
use crate::outcome::SessionOutcome;
use crate::render::RenderSink;
use crate::session::{Session, SessionOptions};
use crate::source::CandidateSource;

/// What the runner does after an action completed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionOutcome {
    /// Refresh candidates and start another session.
    Continue,
    /// End the runner without error.
    Stop,
    /// The user backed out of the action; end the runner as aborted.
    Abort,
}

/// Runs against each committed selection.
#[async_trait]
pub trait ActionHandler: Send + Sync {
    /// `identifiers` holds one entry per selected line that had one.
    async fn handle(
        &self,
        selected: &[String],
        identifiers: &[String],
    ) -> PickResult<ActionOutcome>;
}

/// Maps a candidate line to the identifier the action works with.
pub trait IdentifierExtractor: Send + Sync {
    fn extract(&self, line: &str) -> Option<String>;
}

/// Takes the n-th whitespace-separated field (zero-based).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldExtractor {
    field: usize,
}

impl FieldExtractor {
    pub fn new(field: usize) -> Self {
        Self { field }
    }
}

impl IdentifierExtractor for FieldExtractor {
    fn extract(&self, line: &str) -> Option<String> {
        line.split_whitespace().nth(self.field).map(str::to_string)
    }
}

/// Final outcome of a runner and how many sessions it took.
#[derive(Debug)]
pub struct RunnerReport {
    pub outcome: SessionOutcome,
    pub iterations: usize,
}

/// Loops the session loop until an abort, a timeout, an error, or a stop.
pub struct ReentrantRunner {
    source: Arc<dyn CandidateSource>,
    action: Arc<dyn ActionHandler>,
    extractor: Arc<dyn IdentifierExtractor>,
    options: SessionOptions,
    cancel: CancellationToken,
    excluded: Option<String>,
    max_iterations: Option<usize>,
}

impl ReentrantRunner {
    pub fn new(
        source: Arc<dyn CandidateSource>,
        action: Arc<dyn ActionHandler>,
        extractor: Arc<dyn IdentifierExtractor>,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            source,
            action,
            extractor,
            options: SessionOptions::default(),
            cancel,
            excluded: None,
            max_iterations: None,
        }
    }

    pub fn with_options(mut self, options: SessionOptions) -> Self {
        self.options = options;
        self
    }

    /// Never offer the line carrying this identifier.
    pub fn with_excluded_identifier(mut self, identifier: impl Into<String>) -> Self {
        self.excluded = Some(identifier.into());
        self
    }

    pub fn with_max_iterations(mut self, max_iterations: Option<usize>) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    pub async fn run(
        &self,
        events: &mut dyn EventSource,
        sink: &mut dyn RenderSink,
    ) -> RunnerReport {
        let mut query = self.options.initial_query.clone();
        let mut iterations = 0;

        loop {
            if self.cancel.is_cancelled() {
                return RunnerReport {
                    outcome: SessionOutcome::Aborted,
                    iterations,
                };
            }

            let list = match self.source.fetch().await {
                Ok(list) => self.exclude(list),
                Err(e) => {
                    tracing::warn!("Candidate source '{}' failed: {}", self.source.name(), e);
                    return RunnerReport {
                        outcome: SessionOutcome::Error(e),
                        iterations,
                    };
                }
            };

            iterations += 1;
            let mut options = self.options.clone().with_initial_query(query.clone());
            if iterations > 1 {
                options = options.with_exact_seed(true);
            }
            let session = Session::new(options, self.cancel.clone());
            let report = session.run_with(list, &mut *events, &mut *sink).await;
            query = report.final_query;

            let selected = match report.outcome {
                SessionOutcome::Committed(selected) => selected,
                outcome => {
                    tracing::info!(
                        "Runner finished after {} sessions: {}",
                        iterations,
                        outcome.label()
                    );
                    return RunnerReport {
                        outcome,
                        iterations,
                    };
                }
            };

            let identifiers: Vec<String> = selected
                .iter()
                .filter_map(|line| self.extractor.extract(line))
                .collect();

            match self.action.handle(&selected, &identifiers).await {
                Ok(ActionOutcome::Continue) => {}
                Ok(ActionOutcome::Stop) => {
                    tracing::info!("Action stopped the runner after {} sessions", iterations);
                    return RunnerReport {
                        outcome: SessionOutcome::Committed(selected),
                        iterations,
                    };
                }
                Ok(ActionOutcome::Abort) => {
                    tracing::info!("Action aborted the runner after {} sessions", iterations);
                    return RunnerReport {
                        outcome: SessionOutcome::Aborted,
                        iterations,
                    };
                }
                Err(e) => {
                    tracing::warn!("Action failed: {}", e);
                    return RunnerReport {
                        outcome: SessionOutcome::Error(e),
                        iterations,
                    };
                }
            }

            if let Some(max) = self.max_iterations
                && iterations >= max
            {
                tracing::info!("Runner reached its limit of {} sessions", max);
                return RunnerReport {
                    outcome: SessionOutcome::Committed(selected),
                    iterations,
                };
            }
        }
    }

    fn exclude(&self, mut list: CandidateList) -> CandidateList {
        if let Some(excluded) = &self.excluded {
            list.lines
                .retain(|line| self.extractor.extract(line).as_ref() != Some(excluded));
        }
        list
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PickError;
    use crate::event::{PickEvent, ScriptedEvents};
    use crate::outcome::ExitCodes;
    use crate::render::{NullSink, RecordingSink};
    use crate::source::StaticSource;
    use crate::timeout::TimeoutPolicy;
    use parking_lot::Mutex;
    use std::time::Duration;
    use pretty_assertions::assert_eq;

    #[derive(Default)]
    struct RecordingAction {
        calls: Mutex<Vec<Vec<String>>>,
        stop_after: Option<usize>,
        abort: bool,
        fail: bool,
    }

    #[async_trait]
    impl ActionHandler for RecordingAction {
        async fn handle(
            &self,
            _selected: &[String],
            identifiers: &[String],
        ) -> PickResult<ActionOutcome> {
            if self.fail {
                return Err(PickError::action_handler("kill", "operation not permitted"));
            }
            let mut calls = self.calls.lock();
            calls.push(identifiers.to_vec());
            if self.abort {
                return Ok(ActionOutcome::Abort);
            }
            match self.stop_after {
                Some(n) if calls.len() >= n => Ok(ActionOutcome::Stop),
                _ => Ok(ActionOutcome::Continue),
            }
        }
    }

    fn processes() -> Arc<StaticSource> {
        Arc::new(StaticSource::new([
            "root 1 init",
            "me 4242 cortex-pick ps",
            "me 777 vim notes",
        ]))
    }

    fn runner(action: Arc<RecordingAction>) -> ReentrantRunner {
        ReentrantRunner::new(
            processes(),
            action,
            Arc::new(FieldExtractor::new(1)),
            CancellationToken::new(),
        )
    }

    #[test]
    fn test_field_extractor() {
        let extractor = FieldExtractor::new(1);
        assert_eq!(extractor.extract("root   42  0.0"), Some("42".to_string()));
        assert_eq!(extractor.extract("root"), None);
    }

    #[tokio::test]
    async fn test_loops_until_abort() {
        let action = Arc::new(RecordingAction::default());
        let mut events = ScriptedEvents::new([
            PickEvent::Confirm,
            PickEvent::CursorDown,
            PickEvent::Confirm,
            PickEvent::Abort,
        ]);

        let report = runner(action.clone())
            .run(&mut events, &mut NullSink)
            .await;

        assert!(report.outcome.is_aborted());
        assert_eq!(report.iterations, 3);
        assert_eq!(
            *action.calls.lock(),
            vec![vec!["1".to_string()], vec!["4242".to_string()]]
        );
    }

    #[tokio::test]
    async fn test_own_identifier_is_never_offered() {
        let action = Arc::new(RecordingAction::default());
        let mut events = ScriptedEvents::new([PickEvent::Abort]);
        let mut sink = RecordingSink::new();

        runner(action)
            .with_excluded_identifier("4242")
            .run(&mut events, &mut sink)
            .await;

        let first = &sink.frames()[0];
        assert_eq!(first.matches, vec!["root 1 init", "me 777 vim notes"]);
    }

    #[tokio::test]
    async fn test_query_is_carried_over() {
        let action = Arc::new(RecordingAction::default());
        let mut events = ScriptedEvents::new(
            ScriptedEvents::typed("vim").chain([PickEvent::Confirm, PickEvent::Abort]),
        );
        let mut sink = RecordingSink::new();

        runner(action).run(&mut events, &mut sink).await;

        // The last frame comes from the second session, which starts on "vim".
        let frames = sink.frames();
        let last = frames.last().unwrap();
        assert_eq!(last.query, "vim");
        assert_eq!(last.matches, vec!["me 777 vim notes"]);
    }

    #[tokio::test]
    async fn test_stop_ends_with_selection() {
        let action = Arc::new(RecordingAction {
            stop_after: Some(1),
            ..RecordingAction::default()
        });
        let mut events = ScriptedEvents::new([PickEvent::Confirm]);

        let report = runner(action).run(&mut events, &mut NullSink).await;

        assert_eq!(report.iterations, 1);
        assert_eq!(
            report.outcome.result(),
            Some(&["root 1 init".to_string()][..])
        );
    }

    #[tokio::test]
    async fn test_abandoned_action_aborts_runner() {
        let action = Arc::new(RecordingAction {
            abort: true,
            ..RecordingAction::default()
        });
        let mut events = ScriptedEvents::new([PickEvent::Confirm, PickEvent::Confirm]);

        let report = runner(action.clone()).run(&mut events, &mut NullSink).await;

        assert!(report.outcome.is_aborted());
        assert_eq!(report.iterations, 1);
        assert_eq!(action.calls.lock().len(), 1);
        assert_eq!(ExitCodes::default().code_for(&report.outcome), 130);
    }

    #[tokio::test]
    async fn test_action_failure_ends_with_error() {
        let action = Arc::new(RecordingAction {
            fail: true,
            ..RecordingAction::default()
        });
        let mut events = ScriptedEvents::new([PickEvent::Confirm]);

        let report = runner(action).run(&mut events, &mut NullSink).await;

        assert!(matches!(
            report.outcome,
            SessionOutcome::Error(PickError::ActionHandler { .. })
        ));
    }

    #[tokio::test]
    async fn test_max_iterations() {
        let action = Arc::new(RecordingAction::default());
        let mut events = ScriptedEvents::new([PickEvent::Confirm, PickEvent::Confirm]);

        let report = runner(action)
            .with_max_iterations(Some(2))
            .run(&mut events, &mut NullSink)
            .await;

        assert_eq!(report.iterations, 2);
        assert!(report.outcome.is_committed());
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_is_terminal() {
        let action = Arc::new(RecordingAction::default());
        let options =
            SessionOptions::default().with_timeout(TimeoutPolicy::new(Duration::from_secs(1)));
        let mut events = ScriptedEvents::silent();

        let report = runner(action.clone())
            .with_options(options)
            .run(&mut events, &mut NullSink)
            .await;

        assert!(report.outcome.is_timed_out());
        assert_eq!(report.iterations, 1);
        assert!(action.calls.lock().is_empty());
    }
}
