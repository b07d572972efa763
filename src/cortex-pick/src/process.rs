//! Process chooser.
//!
//! Lists processes with `ps aux`, lets the user pick some, asks which
//! signal to send through a nested prompt, sends it, and starts over on a
//! fresh process table. The chooser's own process is never offered.
//!
//! Memory columns (VSZ and RSS) are rewritten into short human units while
//! keeping their column width, so the table stays aligned.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio_util::sync::CancellationToken;

use crate::candidate::CandidateList;
use crate::error::{PickError, PickResult};
use crate::event::SharedEvents;
use crate::outcome::SessionOutcome;
use crate::render::SharedSink;
use crate::runner::{ActionHandler, ActionOutcome, FieldExtractor, ReentrantRunner};
use crate::session::{Session, SessionOptions};
use crate::shell::ShellExecutor;
use crate::source::{CandidateSource, CommandSource, StaticSource};
use crate::state::SelectionOptions;

/// Command used to list processes.
pub const PS_COMMAND: &str = "ps aux";

/// Whitespace field holding the PID in `ps aux` output.
pub const PID_FIELD: usize = 1;

const VSZ_FIELD: usize = 4;
const RSS_FIELD: usize = 5;

/// Choices offered once processes were picked.
pub const KILL_ACTIONS: [&str; 7] = [
    "kill",
    "kill -9",
    "kill -INT",
    "kill -HUP",
    "kill -USR1",
    "kill -USR2",
    "ignore",
];

/// The choice that ends the chooser without sending anything.
pub const IGNORE_ACTION: &str = "ignore";

/// Facts about the running chooser, passed in rather than looked up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessContext {
    pid: String,
}

impl ProcessContext {
    pub fn new(pid: impl ToString) -> Self {
        Self {
            pid: pid.to_string(),
        }
    }

    pub fn current() -> Self {
        Self::new(std::process::id())
    }

    pub fn pid(&self) -> &str {
        &self.pid
    }
}

/// Extracts PIDs from `ps aux` lines.
pub fn pid_extractor() -> FieldExtractor {
    FieldExtractor::new(PID_FIELD)
}

/// Formats a byte count with decimal units, e.g. `82 kB` or `1.2 MB`.
fn format_bytes(size: u64) -> String {
    const UNITS: [&str; 7] = ["B", "kB", "MB", "GB", "TB", "PB", "EB"];
    if size < 10 {
        return format!("{size} B");
    }

    let exp = ((size as f64).log10() / 3.0).floor() as usize;
    let exp = exp.min(UNITS.len() - 1);
    let value = (size as f64 / 1000f64.powi(exp as i32) * 10.0 + 0.5).floor() / 10.0;
    if value < 10.0 {
        format!("{value:.1} {}", UNITS[exp])
    } else {
        format!("{value:.0} {}", UNITS[exp])
    }
}

/// Shortens a numeric column value without making it wider.
///
/// Non-numeric values, and values whose short form would not fit, come
/// back unchanged.
pub fn humanize_bytes(value: &str) -> String {
    let Ok(size) = value.parse::<u64>() else {
        return value.to_string();
    };
    let short = format_bytes(size).replace(' ', "");
    if short.len() > value.len() {
        return value.to_string();
    }
    format!("{short:>width$}", width = value.len())
}

/// Humanizes the VSZ and RSS columns of one `ps aux` line in place.
pub fn humanize_line(line: &str) -> String {
    let mut out = String::with_capacity(line.len());
    let mut field = 0;
    let mut rest = line;

    while !rest.is_empty() {
        let start = rest.len() - rest.trim_start().len();
        out.push_str(&rest[..start]);
        rest = &rest[start..];
        if rest.is_empty() {
            break;
        }

        let end = rest.find(char::is_whitespace).unwrap_or(rest.len());
        let token = &rest[..end];
        if field == VSZ_FIELD || field == RSS_FIELD {
            out.push_str(&humanize_bytes(token));
        } else {
            out.push_str(token);
        }
        rest = &rest[end..];
        field += 1;
    }

    out
}

/// The process table as a candidate source.
#[derive(Clone)]
pub struct ProcessTableSource {
    inner: CommandSource,
}

impl Default for ProcessTableSource {
    fn default() -> Self {
        Self {
            inner: CommandSource::new(PS_COMMAND).with_header(true),
        }
    }
}

impl ProcessTableSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_executor(mut self, executor: Arc<dyn ShellExecutor>) -> Self {
        self.inner = self.inner.with_executor(executor);
        self
    }
}

#[async_trait]
impl CandidateSource for ProcessTableSource {
    fn name(&self) -> &str {
        self.inner.command()
    }

    async fn fetch(&self) -> PickResult<CandidateList> {
        let mut list = self.inner.fetch().await?;
        list.lines = list.lines.iter().map(|line| humanize_line(line)).collect();
        Ok(list)
    }
}

/// The shell command for a signal choice and a PID, if the choice sends one.
pub fn kill_command(choice: &str, pid: &str) -> Option<String> {
    if choice.contains("kill -9") {
        Some(format!("kill -9 {pid}"))
    } else if choice.contains("kill") {
        Some(format!("{} {pid}", choice.trim()))
    } else {
        None
    }
}

/// Asks which signal to send.
#[async_trait]
pub trait SignalChooser: Send + Sync {
    /// `None` when the user backed out, which aborts the whole chooser.
    async fn choose(&self) -> PickResult<Option<String>>;
}

/// Asks with a nested single-choice session over [`KILL_ACTIONS`], on the
/// same terminal as the outer chooser.
#[derive(Clone)]
pub struct PromptSignalChooser {
    events: SharedEvents,
    sink: SharedSink,
    cancel: CancellationToken,
}

impl PromptSignalChooser {
    pub fn new(events: SharedEvents, sink: SharedSink, cancel: CancellationToken) -> Self {
        Self {
            events,
            sink,
            cancel,
        }
    }
}

#[async_trait]
impl SignalChooser for PromptSignalChooser {
    async fn choose(&self) -> PickResult<Option<String>> {
        let session = Session::new(
            SessionOptions::new(SelectionOptions::default().with_sort(false)),
            self.cancel.clone(),
        );
        let source = StaticSource::new(KILL_ACTIONS);
        let mut events = self.events.clone();
        let mut sink = self.sink.clone();

        match session.run(&source, &mut events, &mut sink).await {
            SessionOutcome::Committed(mut choice) => Ok(choice.pop()),
            SessionOutcome::Error(e) => Err(e),
            SessionOutcome::Aborted | SessionOutcome::TimedOut(_) => Ok(None),
        }
    }
}

/// Something a kill command printed, or the command itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Echo {
    Stdout(String),
    Stderr(String),
}

/// Collects [`Echo`]s while the prompt owns the terminal, for printing once
/// it is restored.
pub fn echo_channel() -> (UnboundedSender<Echo>, UnboundedReceiver<Echo>) {
    mpsc::unbounded_channel()
}

/// Signals every selected process.
pub struct KillAction {
    executor: Arc<dyn ShellExecutor>,
    chooser: Arc<dyn SignalChooser>,
    echo: Option<UnboundedSender<Echo>>,
}

impl KillAction {
    pub fn new(executor: Arc<dyn ShellExecutor>, chooser: Arc<dyn SignalChooser>) -> Self {
        Self {
            executor,
            chooser,
            echo: None,
        }
    }

    /// Reports each command as `shell: "<command>"` followed by its output.
    pub fn with_echo(mut self, echo: UnboundedSender<Echo>) -> Self {
        self.echo = Some(echo);
        self
    }

    fn echo(&self, line: Echo) {
        if let Some(echo) = &self.echo {
            // Nobody listening is fine.
            let _ = echo.send(line);
        }
    }
}

#[async_trait]
impl ActionHandler for KillAction {
    async fn handle(
        &self,
        _selected: &[String],
        identifiers: &[String],
    ) -> PickResult<ActionOutcome> {
        let Some(choice) = self.chooser.choose().await? else {
            return Ok(ActionOutcome::Abort);
        };
        if choice == IGNORE_ACTION {
            return Ok(ActionOutcome::Stop);
        }

        for pid in identifiers {
            let Some(command) = kill_command(&choice, pid) else {
                continue;
            };
            tracing::info!("Running: {}", command);
            self.echo(Echo::Stdout(format!("shell: {:?}", command)));

            let output = self
                .executor
                .run(&command)
                .await
                .map_err(|e| PickError::action_handler(&command, e))?;
            if !output.success() {
                return Err(PickError::action_handler(&command, output.failure_reason()));
            }
            if !output.stdout.is_empty() {
                tracing::info!("{}", output.stdout.trim_end());
                self.echo(Echo::Stdout(output.stdout));
            }
            if !output.stderr.is_empty() {
                tracing::info!("{}", output.stderr.trim_end());
                self.echo(Echo::Stderr(output.stderr));
            }
        }

        Ok(ActionOutcome::Continue)
    }
}

/// Builds the process chooser: a re-entrant runner over the process table
/// that signals the picked processes and never offers its own.
pub fn process_chooser(
    context: &ProcessContext,
    executor: Arc<dyn ShellExecutor>,
    action: KillAction,
    cancel: CancellationToken,
) -> ReentrantRunner {
    let source = ProcessTableSource::new().with_executor(executor);
    ReentrantRunner::new(
        Arc::new(source),
        Arc::new(action),
        Arc::new(pid_extractor()),
        cancel,
    )
    .with_excluded_identifier(context.pid())
}
