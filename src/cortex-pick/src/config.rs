//! TOML configuration.
//!
//! Every field has a built-in default, so an empty file (or no file at all)
//! gives the stock behavior. Command-line flags are applied on top with the
//! `with_*` builders.
//!
//! ```toml
//! timeout_secs = 10
//! on_timeout = "commit_current"
//! limit = 0
//! cursor_policy = "wrap"
//!
//! [exit_codes]
//! aborted = 1
//! ```

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::error::{PickError, PickResult};
use crate::outcome::ExitCodes;
use crate::session::SessionOptions;
use crate::shell::DEFAULT_SHELL;
use crate::state::{CursorPolicy, SelectionOptions};
use crate::timeout::{OnTimeout, TimeoutPolicy};

/// Environment variable naming a config file.
pub const CONFIG_ENV_VAR: &str = "CORTEX_PICK_CONFIG";

/// Settings shared by every command.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PickConfig {
    /// Seconds before a session times out; 0 disables the timer.
    pub timeout_secs: u64,
    pub on_timeout: OnTimeout,
    /// Maximum selected entries; 0 means unlimited.
    pub limit: usize,
    pub sort: bool,
    pub strict: bool,
    pub cursor_policy: CursorPolicy,
    /// Shell used for `-c` command strings.
    pub shell: String,
    pub exit_codes: ExitCodes,
    /// Cap on re-entrant sessions; unset means loop until aborted.
    pub max_iterations: Option<usize>,
    /// Written between result lines.
    pub output_delimiter: String,
    /// Set from the command line; wins over `timeout_secs`.
    #[serde(skip)]
    timeout_override: Option<Duration>,
}

impl Default for PickConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 0,
            on_timeout: OnTimeout::default(),
            limit: 1,
            sort: true,
            strict: true,
            cursor_policy: CursorPolicy::default(),
            shell: DEFAULT_SHELL.to_string(),
            exit_codes: ExitCodes::default(),
            max_iterations: None,
            output_delimiter: "\n".to_string(),
            timeout_override: None,
        }
    }
}

impl PickConfig {
    /// Parses a config file.
    pub fn load(path: impl AsRef<Path>) -> PickResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| PickError::config(path, e))?;
        Self::parse(path, &content)
    }

    /// Loads `explicit` if given, else the file named by
    /// [`CONFIG_ENV_VAR`], else the defaults.
    pub fn discover(explicit: Option<&Path>) -> PickResult<Self> {
        Self::discover_with(explicit, std::env::var_os(CONFIG_ENV_VAR))
    }

    fn discover_with(explicit: Option<&Path>, from_env: Option<OsString>) -> PickResult<Self> {
        let path = explicit
            .map(Path::to_path_buf)
            .or_else(|| from_env.filter(|v| !v.is_empty()).map(PathBuf::from));

        match path {
            Some(path) => {
                tracing::debug!("Loading config from {}", path.display());
                Self::load(path)
            }
            None => Ok(Self::default()),
        }
    }

    fn parse(path: &Path, content: &str) -> PickResult<Self> {
        toml::from_str(content).map_err(|e| PickError::config(path, e))
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout_override = Some(timeout);
        self
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }

    pub fn with_sort(mut self, sort: bool) -> Self {
        self.sort = sort;
        self
    }

    pub fn with_strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    pub fn with_cursor_policy(mut self, cursor_policy: CursorPolicy) -> Self {
        self.cursor_policy = cursor_policy;
        self
    }

    pub fn with_max_iterations(mut self, max_iterations: Option<usize>) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    pub fn with_output_delimiter(mut self, delimiter: impl Into<String>) -> Self {
        self.output_delimiter = delimiter.into();
        self
    }

    pub fn selection_options(&self) -> SelectionOptions {
        SelectionOptions::default()
            .with_limit(self.limit)
            .with_sort(self.sort)
            .with_strict(self.strict)
            .with_cursor_policy(self.cursor_policy)
    }

    pub fn timeout(&self) -> Duration {
        self.timeout_override.unwrap_or(Duration::from_secs(self.timeout_secs))
    }

    pub fn timeout_policy(&self) -> TimeoutPolicy {
        TimeoutPolicy::new(self.timeout()).with_on_timeout(self.on_timeout)
    }

    pub fn session_options(&self) -> SessionOptions {
        SessionOptions::new(self.selection_options()).with_timeout(self.timeout_policy())
    }

    /// Joins result lines with the configured delimiter.
    pub fn format_result(&self, result: &[String]) -> String {
        result.join(&self.output_delimiter)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::io::Write;

    #[test]
    fn test_empty_file_gives_defaults() {
        let config = PickConfig::parse(Path::new("empty.toml"), "").unwrap();
        assert_eq!(config, PickConfig::default());
        assert!(!config.timeout_policy().is_enabled());
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
timeout_secs = 5
on_timeout = "discard"
limit = 0
cursor_policy = "wrap"
max_iterations = 3

[exit_codes]
aborted = 1
"#
        )
        .unwrap();

        let config = PickConfig::load(file.path()).unwrap();
        assert_eq!(config.timeout_secs, 5);
        assert_eq!(config.on_timeout, OnTimeout::Discard);
        assert_eq!(config.cursor_policy, CursorPolicy::Wrap);
        assert_eq!(config.max_iterations, Some(3));
        assert_eq!(config.exit_codes.aborted, 1);
        assert_eq!(config.exit_codes.timed_out, 124);
        assert_eq!(config.selection_options().limit, 0);
        assert_eq!(config.timeout_policy().duration(), Duration::from_secs(5));
    }

    #[test]
    fn test_invalid_file() {
        let err = PickConfig::parse(Path::new("bad.toml"), "limit = \"many\"").unwrap_err();
        assert!(matches!(err, PickError::Config { .. }));
        assert!(err.to_string().contains("bad.toml"));

        let err = PickConfig::parse(Path::new("typo.toml"), "limt = 2").unwrap_err();
        assert!(matches!(err, PickError::Config { .. }));
    }

    #[test]
    fn test_discover_prefers_explicit_path() {
        let mut explicit = tempfile::NamedTempFile::new().unwrap();
        writeln!(explicit, "limit = 4").unwrap();
        let mut from_env = tempfile::NamedTempFile::new().unwrap();
        writeln!(from_env, "limit = 9").unwrap();

        let config = PickConfig::discover_with(
            Some(explicit.path()),
            Some(from_env.path().as_os_str().to_owned()),
        )
        .unwrap();
        assert_eq!(config.limit, 4);

        let config =
            PickConfig::discover_with(None, Some(from_env.path().as_os_str().to_owned())).unwrap();
        assert_eq!(config.limit, 9);

        let config = PickConfig::discover_with(None, None).unwrap();
        assert_eq!(config.limit, 1);
    }

    #[test]
    fn test_missing_file() {
        let err = PickConfig::load("/nonexistent/cortex-pick.toml").unwrap_err();
        assert!(matches!(err, PickError::Config { .. }));
    }

    #[test]
    fn test_flags_override_and_format() {
        let config = PickConfig::default()
            .with_limit(0)
            .with_timeout(Duration::from_millis(1500))
            .with_output_delimiter(",");
        assert_eq!(config.timeout(), Duration::from_millis(1500));
        assert_eq!(config.session_options().selection.limit, 0);
        assert!(config.session_options().timeout.is_enabled());
        assert_eq!(
            config.format_result(&["a".to_string(), "b".to_string()]),
            "a,b"
        );
    }
}
