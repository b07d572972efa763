//! Candidate sources.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};

use crate::candidate::CandidateList;
use crate::error::{PickError, PickResult};
use crate::shell::{ShellExecutor, SystemShell};

/// Produces the lines a session chooses from.
///
/// Called once per session. The re-entrant runner calls it again after
/// every committed action, so implementations should return fresh data.
#[async_trait]
pub trait CandidateSource: Send + Sync {
    /// Name used in errors and logs.
    fn name(&self) -> &str;

    async fn fetch(&self) -> PickResult<CandidateList>;
}

/// A fixed list of lines.
#[derive(Debug, Clone, Default)]
pub struct StaticSource {
    list: CandidateList,
}

impl StaticSource {
    pub fn new<I, S>(lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            list: CandidateList::new(lines.into_iter().map(Into::into).collect()),
        }
    }

    pub fn with_header(mut self, header: impl Into<String>) -> Self {
        self.list.header = Some(header.into());
        self
    }

    /// Reads every line from `reader`, e.g. piped stdin.
    ///
    /// A trailing empty line is dropped.
    pub async fn read_from<R>(reader: R) -> PickResult<Self>
    where
        R: AsyncRead + Unpin,
    {
        let mut lines = BufReader::new(reader).lines();
        let mut collected = Vec::new();
        while let Some(line) = lines
            .next_line()
            .await
            .map_err(|e| PickError::input_source("stdin", e))?
        {
            collected.push(line);
        }
        if collected.last().is_some_and(String::is_empty) {
            collected.pop();
        }
        Ok(Self::new(collected))
    }
}

#[async_trait]
impl CandidateSource for StaticSource {
    fn name(&self) -> &str {
        "static"
    }

    async fn fetch(&self) -> PickResult<CandidateList> {
        Ok(self.list.clone())
    }
}

/// Lines printed by a shell command.
#[derive(Clone)]
pub struct CommandSource {
    command: String,
    has_header: bool,
    executor: Arc<dyn ShellExecutor>,
}

impl CommandSource {
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            has_header: false,
            executor: Arc::new(SystemShell::default()),
        }
    }

    /// Treat the first output line as a header.
    pub fn with_header(mut self, has_header: bool) -> Self {
        self.has_header = has_header;
        self
    }

    pub fn with_executor(mut self, executor: Arc<dyn ShellExecutor>) -> Self {
        self.executor = executor;
        self
    }

    pub fn command(&self) -> &str {
        &self.command
    }
}

#[async_trait]
impl CandidateSource for CommandSource {
    fn name(&self) -> &str {
        &self.command
    }

    async fn fetch(&self) -> PickResult<CandidateList> {
        let output = self
            .executor
            .run(&self.command)
            .await
            .map_err(|e| PickError::input_source(&self.command, e))?;

        if !output.success() {
            return Err(PickError::input_source(
                &self.command,
                output.failure_reason(),
            ));
        }

        Ok(CandidateList::from_output(&output.stdout, self.has_header))
    }
}


#[cfg(test)]
mod tests {
    use super::test_support::FakeShell;
    use super::*;
    use pretty_assertions::assert_eq;

    #[tokio::test]
    async fn test_static_source() {
        let source = StaticSource::new(["a", "b"]).with_header("title");
        let list = source.fetch().await.unwrap();
        assert_eq!(list.header.as_deref(), Some("title"));
        assert_eq!(list.lines, vec!["a".to_string(), "b".to_string()]);
    }

    #[tokio::test]
    async fn test_read_from_reader() {
        let input: &[u8] = b"one\ntwo\n\n";
        let source = StaticSource::read_from(input).await.unwrap();
        let list = source.fetch().await.unwrap();
        assert_eq!(list.lines, vec!["one".to_string(), "two".to_string()]);
    }

    #[tokio::test]
    async fn test_command_source_splits_header() {
        let shell = FakeShell::default().respond("ps aux", "USER PID\nroot 1\n");
        let source = CommandSource::new("ps aux")
            .with_header(true)
            .with_executor(Arc::new(shell));

        let list = source.fetch().await.unwrap();
        assert_eq!(list.header.as_deref(), Some("USER PID"));
        assert_eq!(list.lines, vec!["root 1".to_string()]);
    }

    #[tokio::test]
    async fn test_command_source_failure() {
        let shell = FakeShell::default().fail("ps aux", "ps: not found");
        let source = CommandSource::new("ps aux").with_executor(Arc::new(shell));

        let err = source.fetch().await.unwrap_err();
        assert!(matches!(err, PickError::InputSource { .. }));
        assert!(err.to_string().contains("ps: not found"));
    }
}
