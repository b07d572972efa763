//! End-to-end tests for sessions, timeouts and the process chooser.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use cortex_pick::{
    ChannelEvents, KillAction, NullSink, PickEvent, ProcessContext, RecordingSink, ScriptedEvents,
    SelectionOptions, Session, SessionOptions, SessionOutcome, ShellExecutor, ShellOutput,
    StaticSource, TimeoutPolicy, process::SignalChooser, process_chooser,
};
use pretty_assertions::assert_eq;
use tokio_util::sync::CancellationToken;

fn fruit() -> StaticSource {
    StaticSource::new(["apple", "banana", "grape"])
}

// ============================================================================
// SELECTION SCENARIOS
// ============================================================================

mod scenarios {
    use super::*;
    use pretty_assertions::assert_eq;

    #[tokio::test]
    async fn test_query_ranks_apple_first() {
        let mut events =
            ScriptedEvents::new(ScriptedEvents::typed("ap").chain([PickEvent::Abort]));
        let mut sink = RecordingSink::new();
        Session::new(SessionOptions::default(), CancellationToken::new())
            .run(&fruit(), &mut events, &mut sink)
            .await;

        let frames = sink.frames();
        let last = frames.last().unwrap();
        assert_eq!(last.query, "ap");
        assert_eq!(last.matches.first().map(String::as_str), Some("apple"));
        assert!(!last.matches.iter().any(|m| m == "banana"));
    }

    #[tokio::test]
    async fn test_limit_rejects_second_toggle() {
        let mut events = ScriptedEvents::new([
            PickEvent::ToggleSelect,
            PickEvent::CursorDown,
            PickEvent::ToggleSelect,
            PickEvent::Confirm,
        ]);
        let outcome = Session::new(SessionOptions::default(), CancellationToken::new())
            .run(&fruit(), &mut events, &mut NullSink)
            .await;
        assert_eq!(outcome.result(), Some(&["apple".to_string()][..]));
    }

    #[tokio::test]
    async fn test_multi_select_keeps_selection_order() {
        let options = SessionOptions::new(SelectionOptions::default().with_limit(0));
        let mut events = ScriptedEvents::new([
            PickEvent::End,
            PickEvent::ToggleSelect,
            PickEvent::Home,
            PickEvent::ToggleSelect,
            PickEvent::Confirm,
        ]);
        let outcome = Session::new(options, CancellationToken::new())
            .run(&fruit(), &mut events, &mut NullSink)
            .await;
        assert_eq!(
            outcome.result(),
            Some(&["grape".to_string(), "apple".to_string()][..])
        );
    }

    #[tokio::test]
    async fn test_identical_lines_collapse_into_one_selection() {
        let options = SessionOptions::new(SelectionOptions::default().with_limit(0));
        let source = StaticSource::new(["dup", "dup", "other"]);
        let mut events = ScriptedEvents::new([
            PickEvent::ToggleSelect,
            PickEvent::CursorDown,
            PickEvent::ToggleSelect,
            PickEvent::Confirm,
        ]);
        let outcome = Session::new(options, CancellationToken::new())
            .run(&source, &mut events, &mut NullSink)
            .await;
        // The second toggle hits the same text and deselects it; confirm
        // then falls back to the cursor line.
        assert_eq!(outcome.result(), Some(&["dup".to_string()][..]));
    }
}

// ============================================================================
// TIMEOUT TESTS
// ============================================================================

mod timeouts {
    use super::*;
    use pretty_assertions::assert_eq;

    #[tokio::test(start_paused = true)]
    async fn test_two_second_timeout_returns_cursor_candidate() {
        let options =
            SessionOptions::default().with_timeout(TimeoutPolicy::new(Duration::from_secs(2)));
        let mut events = ScriptedEvents::silent();

        let started = tokio::time::Instant::now();
        let outcome = Session::new(options, CancellationToken::new())
            .run(&fruit(), &mut events, &mut NullSink)
            .await;
        let elapsed = started.elapsed();

        assert!(outcome.is_timed_out());
        assert_eq!(outcome.result(), Some(&["apple".to_string()][..]));
        assert!(elapsed >= Duration::from_secs(2));
        assert!(elapsed < Duration::from_millis(2100));
    }

    #[tokio::test(start_paused = true)]
    async fn test_commit_racing_timeout_yields_one_outcome() {
        const DEADLINE_MS: u64 = 100;

        for run in 0..50u64 {
            let confirm_at = DEADLINE_MS - 2 + run % 5;
            let (tx, mut events) = ChannelEvents::channel();
            let sender = tokio::spawn(async move {
                tokio::time::sleep(Duration::from_millis(confirm_at)).await;
                let _ = tx.send(PickEvent::Confirm);
                // Hold the sender so the session never sees a closed source.
                std::future::pending::<()>().await;
            });

            let sink = RecordingSink::new();
            let options = SessionOptions::default()
                .with_timeout(TimeoutPolicy::new(Duration::from_millis(DEADLINE_MS)));
            let outcome = Session::new(options, CancellationToken::new())
                .run(&fruit(), &mut events, &mut sink.clone())
                .await;

            match &outcome {
                SessionOutcome::Committed(result) => {
                    assert!(confirm_at <= DEADLINE_MS, "run {run}: late commit");
                    assert_eq!(result, &vec!["apple".to_string()]);
                    assert_eq!(sink.len(), 2);
                }
                SessionOutcome::TimedOut(result) => {
                    assert!(confirm_at >= DEADLINE_MS, "run {run}: early timeout");
                    assert_eq!(result, &vec!["apple".to_string()]);
                    assert_eq!(sink.len(), 1);
                }
                other => panic!("run {run}: unexpected outcome {other:?}"),
            }

            // Nothing reaches the sink once the session has returned.
            let frames_at_return = sink.len();
            tokio::time::sleep(Duration::from_millis(DEADLINE_MS * 2)).await;
            assert_eq!(sink.len(), frames_at_return);
            sender.abort();
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_abort_wins_over_pending_timer() {
        let cancel = CancellationToken::new();
        let options =
            SessionOptions::default().with_timeout(TimeoutPolicy::new(Duration::from_secs(5)));
        let session = Session::new(options, cancel.clone());

        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(1)).await;
            trigger.cancel();
        });

        let mut events = ScriptedEvents::silent();
        let outcome = session.run(&fruit(), &mut events, &mut NullSink).await;
        assert!(outcome.is_aborted());
    }
}

// ============================================================================
// PROCESS CHOOSER TESTS
// ============================================================================

mod process_table {
    use super::*;
    use pretty_assertions::assert_eq;
    use parking_lot::Mutex;

    const PS_OUTPUT: &str = "\
USER       PID %CPU %MEM    VSZ   RSS TTY      STAT START   TIME COMMAND
root         1  0.0  0.1 167744 11520 ?        Ss   Oct01   0:09 /sbin/init
me        4242  0.0  0.0  12000  3400 pts/0    S+   10:00   0:00 cortex-pick ps
me         777  1.2  0.3 912000 52000 pts/1    S    09:00   0:41 vim notes.md
";

    #[derive(Default)]
    struct CannedShell {
        responses: HashMap<String, String>,
        ran: Mutex<Vec<String>>,
    }

    impl CannedShell {
        fn with(mut self, command: &str, stdout: &str) -> Self {
            self.responses.insert(command.to_string(), stdout.to_string());
            self
        }
    }

    #[async_trait]
    impl ShellExecutor for CannedShell {
        async fn run(&self, command: &str) -> std::io::Result<ShellOutput> {
            self.ran.lock().push(command.to_string());
            let stdout = self.responses.get(command).cloned();
            Ok(ShellOutput {
                exit_code: Some(if stdout.is_some() { 0 } else { 1 }),
                stdout: stdout.unwrap_or_default(),
                stderr: String::new(),
            })
        }
    }

    struct AlwaysIgnore;

    #[async_trait]
    impl SignalChooser for AlwaysIgnore {
        async fn choose(&self) -> cortex_pick::PickResult<Option<String>> {
            Ok(Some("ignore".to_string()))
        }
    }

    #[tokio::test]
    async fn test_own_process_never_appears() {
        let shell = Arc::new(CannedShell::default().with("ps aux", PS_OUTPUT));
        let runner = process_chooser(
            &ProcessContext::new(4242),
            shell.clone(),
            KillAction::new(shell, Arc::new(AlwaysIgnore)),
            CancellationToken::new(),
        );

        // Searching for the chooser's own command line finds nothing.
        let mut events = ScriptedEvents::new(
            ScriptedEvents::typed("cortex-pick").chain([PickEvent::Abort]),
        );
        let mut sink = RecordingSink::new();
        let report = runner.run(&mut events, &mut sink).await;

        assert!(report.outcome.is_aborted());
        let frames = sink.frames();
        assert_eq!(frames[0].matches.len(), 2);
        assert!(frames.iter().all(|f| f.matches.iter().all(|m| !m.contains(" 4242 "))));
        assert!(frames.last().unwrap().matches.is_empty());
    }

    #[tokio::test]
    async fn test_ignore_stops_without_signalling() {
        let shell = Arc::new(CannedShell::default().with("ps aux", PS_OUTPUT));
        let runner = process_chooser(
            &ProcessContext::new(4242),
            shell.clone(),
            KillAction::new(shell.clone(), Arc::new(AlwaysIgnore)),
            CancellationToken::new(),
        );

        let mut events = ScriptedEvents::new([PickEvent::Confirm]);
        let report = runner.run(&mut events, &mut NullSink).await;

        assert!(report.outcome.is_committed());
        assert_eq!(report.iterations, 1);
        assert_eq!(*shell.ran.lock(), vec!["ps aux".to_string()]);
    }

    #[tokio::test]
    async fn test_listing_failure_is_an_error() {
        let shell = Arc::new(CannedShell::default());
        let runner = process_chooser(
            &ProcessContext::current(),
            shell.clone(),
            KillAction::new(shell, Arc::new(AlwaysIgnore)),
            CancellationToken::new(),
        );

        let mut events = ScriptedEvents::silent();
        let report = runner.run(&mut events, &mut NullSink).await;
        assert!(matches!(report.outcome, SessionOutcome::Error(_)));
        assert_eq!(report.iterations, 0);
    }
}
