//! Cortex Pick - Main entry point.
//!
//! Interactive prompts for shell scripts:
//! - `choose` - pick from a list of options
//! - `filter` - fuzzy filter lines or files
//! - `ps` - pick processes and signal them, repeatedly
//! - `confirm` - yes/no question answered through the exit status

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use cortex_pick_cli::cli::{Cli, LogLevel, dispatch_command};

/// Environment variable holding the default log level.
const LOG_ENV_VAR: &str = "CORTEX_PICK_LOG";

/// Guard that ensures debug log file is properly flushed when dropped.
struct DebugLogGuard {
    _guard: tracing_appender::non_blocking::WorkerGuard,
}

/// Set up debug file logging that writes ALL trace-level logs to the cache directory.
///
/// The terminal belongs to the prompt, so nothing is written to stderr.
fn setup_debug_file_logging() -> Result<DebugLogGuard> {
    use tracing_subscriber::layer::SubscriberExt;
    use tracing_subscriber::util::SubscriberInitExt;

    let dir = dirs::cache_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join("cortex-pick");
    std::fs::create_dir_all(&dir)?;
    let debug_file_path = dir.join("debug.log");

    let file = std::fs::File::create(&debug_file_path).map_err(|e| {
        anyhow::anyhow!(
            "Failed to create {}: {}. Check write permissions.",
            debug_file_path.display(),
            e
        )
    })?;

    let (non_blocking, guard) = tracing_appender::non_blocking(file);

    let file_layer = tracing_subscriber::fmt::layer()
        .with_writer(non_blocking)
        .with_ansi(false)
        .with_target(true)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true);

    tracing_subscriber::registry()
        .with(EnvFilter::new("trace"))
        .with(file_layer)
        .init();

    eprintln!(
        "Debug mode enabled: logging to {}",
        debug_file_path.display()
    );

    Ok(DebugLogGuard { _guard: guard })
}

/// Logging to stderr for normal runs.
///
/// `--log-level` wins, then `CORTEX_PICK_LOG`, then `RUST_LOG`.
fn setup_stderr_logging(cli_level: Option<LogLevel>) {
    let level = cli_level.or_else(|| {
        std::env::var(LOG_ENV_VAR)
            .ok()
            .and_then(|v| LogLevel::from_str_loose(&v))
    });

    let filter = match level {
        Some(level) => EnvFilter::new(level.as_filter_str()),
        None => EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(LogLevel::default().as_filter_str())),
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    // Restore the terminal on panic; release builds abort without unwinding.
    cortex_pick_cli::install_panic_hook();

    let cli = Cli::parse();

    let debug_guard = if cli.debug {
        Some(setup_debug_file_logging()?)
    } else {
        setup_stderr_logging(cli.log_level);
        None
    };

    let code = dispatch_command(cli).await?;

    // Flush the debug log before exiting.
    drop(debug_guard);
    std::process::exit(code);
}
