//! Yes/no prompts.
//!
//! A confirmation is a two-candidate session with no query input, the
//! cursor starting on the default answer. A timeout therefore answers with
//! the default.

use tokio_util::sync::CancellationToken;

use crate::candidate::CandidateList;
use crate::event::EventSource;
use crate::outcome::SessionOutcome;
use crate::render::RenderSink;
use crate::session::{Session, SessionOptions};
use crate::state::SelectionOptions;
use crate::timeout::TimeoutPolicy;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfirmPrompt {
    affirmative: String,
    negative: String,
    default_yes: bool,
    prompt: Option<String>,
}

impl Default for ConfirmPrompt {
    fn default() -> Self {
        Self {
            affirmative: "Yes".to_string(),
            negative: "No".to_string(),
            default_yes: true,
            prompt: None,
        }
    }
}

impl ConfirmPrompt {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_affirmative(mut self, affirmative: impl Into<String>) -> Self {
        self.affirmative = affirmative.into();
        self
    }

    pub fn with_negative(mut self, negative: impl Into<String>) -> Self {
        self.negative = negative.into();
        self
    }

    pub fn with_default(mut self, default_yes: bool) -> Self {
        self.default_yes = default_yes;
        self
    }

    /// Question shown above the answers.
    pub fn with_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.prompt = Some(prompt.into());
        self
    }

    pub fn candidates(&self) -> CandidateList {
        CandidateList {
            header: self.prompt.clone(),
            lines: vec![self.affirmative.clone(), self.negative.clone()],
        }
    }

    fn initial_cursor(&self) -> usize {
        if self.default_yes { 0 } else { 1 }
    }

    pub fn session_options(&self, timeout: TimeoutPolicy) -> SessionOptions {
        SessionOptions::new(SelectionOptions::default().with_sort(false))
            .with_timeout(timeout)
            .with_initial_cursor(self.initial_cursor())
            .with_query_input(false)
    }

    /// Whether `outcome` carries the affirmative answer.
    pub fn is_affirmative(&self, outcome: &SessionOutcome) -> bool {
        outcome
            .result()
            .and_then(<[String]>::first)
            .is_some_and(|answer| *answer == self.affirmative)
    }

    pub async fn run(
        &self,
        timeout: TimeoutPolicy,
        cancel: CancellationToken,
        events: &mut dyn EventSource,
        sink: &mut dyn RenderSink,
    ) -> SessionOutcome {
        let session = Session::new(self.session_options(timeout), cancel);
        session.run_with(self.candidates(), events, sink).await.outcome
    }
}
