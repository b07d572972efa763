//! Error types for selection sessions.

use std::path::PathBuf;

/// Result type alias for selection operations.
pub type PickResult<T> = std::result::Result<T, PickError>;

/// Errors that can end a selection session.
///
/// The match engine and the selection state never produce these; they come
/// from the collaborators a session talks to (candidate sources, render
/// sinks, action handlers) or from loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum PickError {
    /// The candidate source produced nothing and no free-text input is possible.
    #[error("No candidates to choose from")]
    NoCandidates,

    /// The candidate source failed.
    #[error("Candidate source '{source_name}' failed: {reason}")]
    InputSource { source_name: String, reason: String },

    /// The render sink failed, e.g. the terminal went away.
    #[error("Failed to render selection: {reason}")]
    Render { reason: String },

    /// The action run on a committed selection failed.
    #[error("Action '{action}' failed: {reason}")]
    ActionHandler { action: String, reason: String },

    /// Configuration could not be loaded.
    #[error("Invalid configuration '{path}': {reason}")]
    Config { path: PathBuf, reason: String },

    /// I/O error while talking to a collaborator.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl PickError {
    /// Creates a new `InputSource` error.
    pub fn input_source(source_name: impl Into<String>, reason: impl ToString) -> Self {
        Self::InputSource {
            source_name: source_name.into(),
            reason: reason.to_string(),
        }
    }

    /// Creates a new `Render` error.
    pub fn render(reason: impl ToString) -> Self {
        Self::Render {
            reason: reason.to_string(),
        }
    }

    /// Creates a new `ActionHandler` error.
    pub fn action_handler(action: impl Into<String>, reason: impl ToString) -> Self {
        Self::ActionHandler {
            action: action.into(),
            reason: reason.to_string(),
        }
    }

    /// Creates a new `Config` error.
    pub fn config(path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        Self::Config {
            path: path.into(),
            reason: reason.to_string(),
        }
    }
}
