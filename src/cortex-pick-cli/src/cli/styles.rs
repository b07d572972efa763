//! ANSI styling for CLI help output.

use clap::builder::Styles;
use clap::builder::styling::{AnsiColor, Effects};

/// Get the ANSI color styles for CLI help output.
pub fn get_styles() -> Styles {
    Styles::styled()
        // Headers (USAGE, COMMANDS, OPTIONS) - Bold cyan
        .header(AnsiColor::Cyan.on_default() | Effects::BOLD)
        .usage(AnsiColor::Green.on_default() | Effects::BOLD)
        // Literals (command names, flag names) - Bold green
        .literal(AnsiColor::Green.on_default() | Effects::BOLD)
        .placeholder(AnsiColor::Yellow.on_default())
        .error(AnsiColor::Red.on_default() | Effects::BOLD)
        .valid(AnsiColor::Cyan.on_default())
        .invalid(AnsiColor::Yellow.on_default())
}

/// After-help section with examples, keys and environment variables.
pub const AFTER_HELP: &str = color_print::cstr!(
    r#"<cyan,bold>EXAMPLES</>
    <green,bold>cortex-pick choose</> <dim>red green blue</>       Pick one of three words
    <green,bold>ls | cortex-pick filter --no-limit</>     Pick any number of lines
    <green,bold>cortex-pick filter</>                     Pick a file below the current directory
    <green,bold>cortex-pick ps</> <dim>--value vim</>             Send signals to processes, repeatedly
    <green,bold>cortex-pick confirm</> <dim>"Deploy?"</> && deploy   Ask before doing something

<cyan,bold>KEYS</>
    <yellow>Enter</>                Confirm
    <yellow>Esc, Ctrl+C</>          Abort
    <yellow>Up/Down, Ctrl+P/N</>    Move the cursor
    <yellow>Tab</>                  Toggle the current line (multi-select)
    <yellow>Ctrl+A</>               Select every visible line
    <yellow>Ctrl+U</>               Clear the query

<cyan,bold>EXIT STATUS</>
    <yellow>0</>    Confirmed (confirm: yes)
    <yellow>1</>    Error (confirm: no)
    <yellow>124</>  Timed out
    <yellow>130</>  Aborted (Esc, Ctrl+C, SIGINT or SIGTERM)

<cyan,bold>ENVIRONMENT VARIABLES</>
    <yellow>CORTEX_PICK_CONFIG</>   Config file (alternative to --config)
    <yellow>CORTEX_PICK_LOG</>      Log level (alternative to --log-level)
    <yellow>RUST_LOG</>             Fine-grained tracing filter"#
);
