//! CLI argument structures and parsing.
//!
//! Defines all command-line argument structures using clap.

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use std::time::Duration;

use cortex_pick::{CursorPolicy, PickConfig};

use super::styles::{AFTER_HELP, get_styles};

/// Log verbosity level for CLI output.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum LogLevel {
    /// Only show errors
    Error,
    /// Show warnings and errors (default)
    #[default]
    Warn,
    /// Show informational messages, warnings, and errors
    Info,
    /// Show debug messages and above
    Debug,
    /// Show all messages including trace-level details
    Trace,
}

impl LogLevel {
    /// Convert to tracing filter string.
    pub fn as_filter_str(&self) -> &'static str {
        match self {
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        }
    }

    /// Parse from string (case-insensitive).
    pub fn from_str_loose(s: &str) -> Option<LogLevel> {
        match s.to_lowercase().as_str() {
            "error" => Some(LogLevel::Error),
            "warn" | "warning" => Some(LogLevel::Warn),
            "info" => Some(LogLevel::Info),
            "debug" => Some(LogLevel::Debug),
            "trace" => Some(LogLevel::Trace),
            _ => None,
        }
    }
}

/// Parse a timeout such as `500ms`, `30s`, `2m` or a bare number of seconds.
///
/// `0`, `none` and `never` disable the timeout.
pub fn parse_duration(s: &str) -> Result<Duration, String> {
    let s = s.trim().to_lowercase();

    if s == "never" || s == "none" || s.is_empty() {
        return Ok(Duration::ZERO);
    }

    let (num_str, unit) = if let Some(num) = s.strip_suffix("ms") {
        (num, "ms")
    } else if let Some(num) = s.strip_suffix('s') {
        (num, "s")
    } else if let Some(num) = s.strip_suffix('m') {
        (num, "m")
    } else {
        // Default to seconds if no unit specified
        (s.as_str(), "s")
    };

    let num: u64 = num_str
        .trim()
        .parse()
        .map_err(|_| format!("Invalid duration: {}", s))?;

    Ok(match unit {
        "ms" => Duration::from_millis(num),
        "m" => Duration::from_secs(num * 60),
        _ => Duration::from_secs(num),
    })
}

/// Cortex Pick - interactive prompts for shell scripts.
///
/// Results go to stdout, the prompt is drawn on stderr.
#[derive(Parser)]
#[command(name = "cortex-pick")]
#[command(author, version)]
#[command(about = "Cortex Pick - interactive prompts for shell scripts", long_about = None)]
#[command(styles = get_styles(), after_help = AFTER_HELP)]
pub struct Cli {
    /// Config file (defaults to $CORTEX_PICK_CONFIG)
    #[arg(long = "config", short = 'c', global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Log verbosity for stderr output
    #[arg(long = "log-level", global = true, value_enum)]
    pub log_level: Option<LogLevel>,

    /// Write trace-level logs to a file in the cache directory
    #[arg(long = "debug", global = true)]
    pub debug: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Choose from a list of options
    Choose(ChooseArgs),

    /// Fuzzy filter lines from stdin, or files below the current directory
    Filter(FilterArgs),

    /// Pick processes and send them a signal, repeatedly
    Ps(PsArgs),

    /// Ask a yes/no question; exits 0 for yes and 1 for no
    Confirm(ConfirmArgs),
}

/// Options shared by the list prompts.
#[derive(Args, Debug, Clone, Default)]
pub struct SelectArgs {
    /// Maximum number of options to pick
    #[arg(long = "limit")]
    pub limit: Option<usize>,

    /// Pick unlimited number of options
    #[arg(long = "no-limit", conflicts_with = "limit")]
    pub no_limit: bool,

    /// Header shown above the options
    #[arg(long = "header")]
    pub header: Option<String>,

    /// Timeout such as 30s or 500ms; the current option is chosen when it expires
    #[arg(long = "timeout", value_parser = parse_duration)]
    pub timeout: Option<Duration>,

    /// Separator written between picked options
    #[arg(long = "output-delimiter")]
    pub output_delimiter: Option<String>,

    /// Wrap the cursor around at either end of the list
    #[arg(long = "wrap")]
    pub wrap: bool,
}

impl SelectArgs {
    /// Applies these flags over the loaded config.
    pub fn apply(&self, mut config: PickConfig) -> PickConfig {
        if self.no_limit {
            config = config.with_limit(0);
        } else if let Some(limit) = self.limit {
            config = config.with_limit(limit);
        }
        if let Some(timeout) = self.timeout {
            config = config.with_timeout(timeout);
        }
        if let Some(delimiter) = &self.output_delimiter {
            config = config.with_output_delimiter(delimiter.clone());
        }
        if self.wrap {
            config = config.with_cursor_policy(CursorPolicy::Wrap);
        }
        config
    }
}

#[derive(Args, Debug, Clone)]
pub struct ChooseArgs {
    /// Options to choose from; read from stdin when empty
    pub options: Vec<String>,

    #[clap(flatten)]
    pub select: SelectArgs,
}

#[derive(Args, Debug, Clone)]
pub struct FilterArgs {
    /// Initial filter query
    #[arg(long = "value", default_value = "")]
    pub value: String,

    /// Prompt shown before the query
    #[arg(long = "prompt", default_value = "> ")]
    pub prompt: String,

    /// Keep source order instead of ranking by score
    #[arg(long = "no-sort")]
    pub no_sort: bool,

    /// Print the typed query when nothing matches
    #[arg(long = "no-strict")]
    pub no_strict: bool,

    #[clap(flatten)]
    pub select: SelectArgs,
}

#[derive(Args, Debug, Clone)]
pub struct PsArgs {
    /// Initial filter query
    #[arg(long = "value", default_value = "")]
    pub value: String,

    /// Prompt shown before the query
    #[arg(long = "prompt", default_value = "> ")]
    pub prompt: String,

    /// Stop after this many rounds
    #[arg(long = "max-iterations")]
    pub max_iterations: Option<usize>,

    #[clap(flatten)]
    pub select: SelectArgs,
}

#[derive(Args, Debug, Clone)]
pub struct ConfirmArgs {
    /// Question to ask
    #[arg(default_value = "Are you sure?")]
    pub prompt: String,

    /// Label of the affirmative answer
    #[arg(long = "affirmative", default_value = "Yes")]
    pub affirmative: String,

    /// Label of the negative answer
    #[arg(long = "negative", default_value = "No")]
    pub negative: String,

    /// Default answer
    #[arg(long = "default", default_value_t = true, action = clap::ArgAction::Set)]
    pub default: bool,

    /// Timeout such as 30s or 500ms; the default answer is used when it expires
    #[arg(long = "timeout", value_parser = parse_duration)]
    pub timeout: Option<Duration>,
}
