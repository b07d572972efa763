#![allow(clippy::missing_errors_doc, clippy::uninlined_format_args)]
//! Cortex Pick CLI library module.
//!
//! - `cli/` - CLI argument parsing and command dispatch
//! - `terminal` - Raw-mode terminal, key reader and renderer
//! - `keys` - Key bindings
//! - `files` - File listing for `filter`

use std::panic;
use std::sync::atomic::{AtomicBool, Ordering};

pub mod cli;
pub mod files;
pub mod keys;
pub mod terminal;

/// Global flag to track if the panic hook has been installed.
static PANIC_HOOK_INSTALLED: AtomicBool = AtomicBool::new(false);

/// Install a panic hook that restores the terminal before the panic message
/// is printed, so it lands on the normal screen. Installs only once.
pub fn install_panic_hook() {
    if PANIC_HOOK_INSTALLED.swap(true, Ordering::SeqCst) {
        return;
    }

    let original_hook = panic::take_hook();
    panic::set_hook(Box::new(move |panic_info| {
        terminal::restore_terminal();
        original_hook(panic_info);
    }));
}
