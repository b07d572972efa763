//! Session outcomes and their mapping to process exit status.

use serde::Deserialize;

use crate::error::PickError;

/// How a session ended. Each session produces exactly one.
#[derive(Debug)]
pub enum SessionOutcome {
    /// The user confirmed; selected texts in selection order, or the single
    /// cursor candidate, or the free-text query.
    Committed(Vec<String>),
    /// The user or the host cancelled. Not an error.
    Aborted,
    /// Nobody answered in time; carries the best-effort default.
    TimedOut(Vec<String>),
    Error(PickError),
}

impl SessionOutcome {
    pub fn is_committed(&self) -> bool {
        matches!(self, Self::Committed(_))
    }

    pub fn is_aborted(&self) -> bool {
        matches!(self, Self::Aborted)
    }

    pub fn is_timed_out(&self) -> bool {
        matches!(self, Self::TimedOut(_))
    }

    /// The result lines, for outcomes that carry one.
    pub fn result(&self) -> Option<&[String]> {
        match self {
            Self::Committed(result) | Self::TimedOut(result) => Some(result),
            Self::Aborted | Self::Error(_) => None,
        }
    }

    /// Short name used in logs.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Committed(_) => "committed",
            Self::Aborted => "aborted",
            Self::TimedOut(_) => "timed_out",
            Self::Error(_) => "error",
        }
    }
}

/// Exit status for each outcome when the controller runs as a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ExitCodes {
    pub committed: i32,
    /// Used by binary prompts when the negative answer was chosen.
    pub negative: i32,
    pub aborted: i32,
    pub timed_out: i32,
    pub error: i32,
    /// Report a timeout with the status of the default it returned.
    pub timeout_uses_default_status: bool,
}

impl Default for ExitCodes {
    fn default() -> Self {
        Self {
            committed: 0,
            negative: 1,
            aborted: 130,
            timed_out: 124,
            error: 1,
            timeout_uses_default_status: false,
        }
    }
}

impl ExitCodes {
    /// Status for a choice-style command.
    pub fn code_for(&self, outcome: &SessionOutcome) -> i32 {
        match outcome {
            SessionOutcome::Committed(_) => self.committed,
            SessionOutcome::Aborted => self.aborted,
            SessionOutcome::TimedOut(_) if self.timeout_uses_default_status => self.committed,
            SessionOutcome::TimedOut(_) => self.timed_out,
            SessionOutcome::Error(_) => self.error,
        }
    }

    /// Status for a yes/no prompt; `affirmative` says whether the result was
    /// the affirmative answer.
    pub fn confirm_code_for(&self, outcome: &SessionOutcome, affirmative: bool) -> i32 {
        let answer = if affirmative {
            self.committed
        } else {
            self.negative
        };
        match outcome {
            SessionOutcome::Committed(_) => answer,
            SessionOutcome::TimedOut(_) if self.timeout_uses_default_status => answer,
            other => self.code_for(other),
        }
    }
}
