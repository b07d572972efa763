//! Shell command execution.
//!
//! Candidate listing (`ps aux`) and post-selection actions (`kill`) go
//! through a [`ShellExecutor`] so tests can substitute canned output.

use async_trait::async_trait;
use tokio::process::Command;

/// Default shell used to run command strings.
pub const DEFAULT_SHELL: &str = "bash";

/// Output streams from a finished command, kept separate.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ShellOutput {
    pub stdout: String,
    pub stderr: String,
    /// Exit code, `None` when killed by a signal.
    pub exit_code: Option<i32>,
}

impl ShellOutput {
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }

    /// A short description of a failure, preferring stderr.
    pub fn failure_reason(&self) -> String {
        let stderr = self.stderr.trim();
        match (stderr.is_empty(), self.exit_code) {
            (false, _) => stderr.to_string(),
            (true, Some(code)) => format!("exit status {code}"),
            (true, None) => "terminated by signal".to_string(),
        }
    }
}

/// Runs a command string through a shell.
#[async_trait]
pub trait ShellExecutor: Send + Sync {
    async fn run(&self, command: &str) -> std::io::Result<ShellOutput>;
}

/// Runs commands with `<shell> -c <command>`.
#[derive(Debug, Clone)]
pub struct SystemShell {
    shell: String,
}

impl Default for SystemShell {
    fn default() -> Self {
        Self::new(DEFAULT_SHELL)
    }
}

impl SystemShell {
    pub fn new(shell: impl Into<String>) -> Self {
        Self {
            shell: shell.into(),
        }
    }

    pub fn shell(&self) -> &str {
        &self.shell
    }
}

#[async_trait]
impl ShellExecutor for SystemShell {
    async fn run(&self, command: &str) -> std::io::Result<ShellOutput> {
        tracing::debug!("Running `{}` via {}", command, self.shell);
        let output = Command::new(&self.shell)
            .arg("-c")
            .arg(command)
            .kill_on_drop(true)
            .output()
            .await?;

        Ok(ShellOutput {
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
            exit_code: output.status.code(),
        })
    }
}
