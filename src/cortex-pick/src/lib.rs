#![allow(clippy::missing_errors_doc, clippy::uninlined_format_args)]
//! Cortex Pick - Interactive selection over lines of text.
//!
//! This crate holds the controller behind the `cortex-pick` commands: a
//! fuzzy match engine, the selection state machine, a timeout and
//! cancellation controller, and the session loop that drives them to
//! exactly one outcome. Terminal I/O stays outside; sessions talk to
//! candidate sources, event sources and render sinks through traits.
//!
//! # Features
//!
//! - Subsequence fuzzy ranking with nucleo-matcher
//! - Multi-select with a limit, clamped or wrapping cursor
//! - Session timeouts that commit the best default
//! - Cooperative abort through a `CancellationToken`
//! - A re-entrant runner that acts on each selection and starts over,
//!   used by the process chooser
//!
//! # Example
//!
//! ```no_run
//! use cortex_pick::{
//!     NullSink, ScriptedEvents, Session, SessionOptions, StaticSource,
//! };
//! use tokio_util::sync::CancellationToken;
//!
//! #[tokio::main]
//! async fn main() {
//!     let session = Session::new(SessionOptions::default(), CancellationToken::new());
//!     let source = StaticSource::new(["apple", "banana", "grape"]);
//!     let mut events = ScriptedEvents::new(ScriptedEvents::typed("ban").chain([
//!         cortex_pick::PickEvent::Confirm,
//!     ]));
//!
//!     let outcome = session.run(&source, &mut events, &mut NullSink).await;
//!     println!("{:?}", outcome.result());
//! }
//! ```

pub mod candidate;
pub mod config;
pub mod confirm;
pub mod error;
pub mod event;
pub mod matcher;
pub mod outcome;
pub mod process;
pub mod render;
pub mod runner;
pub mod session;
pub mod shell;
pub mod source;
pub mod state;
pub mod timeout;

pub use candidate::{Candidate, CandidateList};
pub use config::PickConfig;
pub use confirm::ConfirmPrompt;
pub use error::{PickError, PickResult};
pub use event::{ChannelEvents, EventSource, PickEvent, ScriptedEvents, SharedEvents};
pub use matcher::{MatchEngine, MatchResult, exact_matches, rank};
pub use outcome::{ExitCodes, SessionOutcome};
pub use process::{
    Echo, KillAction, ProcessContext, ProcessTableSource, PromptSignalChooser, echo_channel,
    process_chooser,
};
pub use render::{Frame, NullSink, RecordingSink, RenderSink, SharedSink};
pub use runner::{
    ActionHandler, ActionOutcome, FieldExtractor, IdentifierExtractor, ReentrantRunner,
    RunnerReport,
};
pub use session::{Session, SessionOptions, SessionReport};
pub use shell::{ShellExecutor, ShellOutput, SystemShell};
pub use source::{CandidateSource, CommandSource, StaticSource};
pub use state::{CursorPolicy, SelectionOptions, SelectionState};
pub use timeout::{OnTimeout, TimeoutController, TimeoutPolicy};
