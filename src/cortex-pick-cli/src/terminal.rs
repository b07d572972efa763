//! Terminal front end for selection sessions.
//!
//! The prompt is drawn on stderr in the alternate screen so stdout stays
//! free for the result. Keys are read on a background task and fed to the
//! session through a [`ChannelEvents`] source.

use std::collections::HashSet;
use std::io::{IsTerminal, Stderr, Write, stderr};
use std::ops::Range;
use std::sync::atomic::{AtomicBool, Ordering};

use anyhow::{Result, bail};
use crossterm::cursor::{self, MoveTo};
use crossterm::event::{DisableBracketedPaste, EnableBracketedPaste, Event, EventStream};
use crossterm::style::{Print, Stylize};
use crossterm::terminal::{
    Clear, ClearType, EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode,
    enable_raw_mode,
};
use crossterm::{execute, queue};
use futures::StreamExt;
use tokio::sync::mpsc::UnboundedSender;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use unicode_width::UnicodeWidthChar;

use cortex_pick::{ChannelEvents, PickError, PickEvent, PickResult, RenderSink, SelectionState};

use crate::keys::{KeyMode, map_key, map_paste};

const CURSOR_MARK: &str = "> ";
const SELECTED_MARK: &str = "* ";
const PLAIN_MARK: &str = "  ";
const ELLIPSIS: char = '…';

/// Set while raw mode and the alternate screen are active.
static TERMINAL_ACTIVE: AtomicBool = AtomicBool::new(false);

/// Leaves the alternate screen and raw mode if a prompt took them over.
///
/// Returns whether anything had to be restored. Safe to call from the panic
/// hook and from [`TerminalGuard`] alike; only the first call does the work.
pub fn restore_terminal() -> bool {
    if !TERMINAL_ACTIVE.swap(false, Ordering::SeqCst) {
        return false;
    }
    let mut err = stderr();
    let _ = execute!(
        err,
        cursor::Show,
        DisableBracketedPaste,
        LeaveAlternateScreen
    );
    let _ = disable_raw_mode();
    true
}

/// RAII guard that restores the terminal on drop. Release builds abort on
/// panic without unwinding, so the panic hook restores it there instead.
pub struct TerminalGuard {
    _private: (),
}

impl TerminalGuard {
    /// Enters raw mode and the alternate screen on stderr.
    pub fn enter() -> Result<Self> {
        if !stderr().is_terminal() {
            bail!("cortex-pick needs a terminal on stderr to draw the prompt");
        }

        enable_raw_mode()?;
        TERMINAL_ACTIVE.store(true, Ordering::SeqCst);
        let guard = Self { _private: () };
        let mut err = stderr();
        execute!(err, EnterAlternateScreen, EnableBracketedPaste, cursor::Hide)?;
        Ok(guard)
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        restore_terminal();
    }
}

/// Reads terminal events until the receiver goes away.
pub fn spawn_key_reader(mode: KeyMode, tx: UnboundedSender<PickEvent>) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut stream = EventStream::new();
        while let Some(event) = stream.next().await {
            let decoded = match event {
                Ok(Event::Key(key)) => map_key(key, mode).into_iter().collect(),
                Ok(Event::Paste(text)) => map_paste(&text, mode),
                Ok(_) => Vec::new(),
                Err(e) => {
                    tracing::warn!("Failed to read terminal event: {}", e);
                    break;
                }
            };
            for pick_event in decoded {
                if tx.send(pick_event).is_err() {
                    return;
                }
            }
        }
        tracing::debug!("Key reader finished");
    })
}

/// Cancels a token when the process is asked to stop.
///
/// SIGINT only arrives while the terminal is not in raw mode (inside raw
/// mode Ctrl+C is a key), SIGTERM at any time. Both end the prompt as an
/// abort so the terminal is restored on the way out. Dropping the watch
/// stops it.
pub struct SignalWatch {
    task: JoinHandle<()>,
}

impl SignalWatch {
    /// Registers the handlers before returning, so a signal sent right after
    /// this call is already seen.
    #[cfg(unix)]
    pub fn start(cancel: CancellationToken) -> Result<Self> {
        use tokio::signal::unix::{SignalKind, signal};

        let mut interrupt = signal(SignalKind::interrupt())?;
        let mut terminate = signal(SignalKind::terminate())?;
        let task = tokio::spawn(async move {
            tokio::select! {
                _ = cancel.cancelled() => {}
                _ = interrupt.recv() => {
                    tracing::debug!("Interrupted");
                    cancel.cancel();
                }
                _ = terminate.recv() => {
                    tracing::debug!("Terminated");
                    cancel.cancel();
                }
            }
        });
        Ok(Self { task })
    }

    #[cfg(not(unix))]
    pub fn start(cancel: CancellationToken) -> Result<Self> {
        let task = tokio::spawn(async move {
            tokio::select! {
                _ = cancel.cancelled() => {}
                result = tokio::signal::ctrl_c() => {
                    if result.is_ok() {
                        tracing::debug!("Interrupted");
                        cancel.cancel();
                    }
                }
            }
        });
        Ok(Self { task })
    }

    /// Whether the watch stopped, either through a signal or its token.
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

impl Drop for SignalWatch {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// An interactive terminal: restored screen plus key reader.
pub struct TerminalHandle {
    reader: JoinHandle<()>,
    _guard: TerminalGuard,
}

impl TerminalHandle {
    /// Takes over the terminal and returns the event source fed by it.
    pub fn start(mode: KeyMode) -> Result<(Self, ChannelEvents)> {
        let guard = TerminalGuard::enter()?;
        let (tx, events) = ChannelEvents::channel();
        let reader = spawn_key_reader(mode, tx);
        Ok((
            Self {
                reader,
                _guard: guard,
            },
            events,
        ))
    }
}

impl Drop for TerminalHandle {
    fn drop(&mut self) {
        self.reader.abort();
    }
}

/// One visible list row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Row {
    pub text: String,
    /// Char indices into `text` to highlight.
    pub highlights: Vec<usize>,
    pub current: bool,
    pub selected: bool,
}

/// The rows that fit in `height` lines, scrolled so the cursor is visible.
pub fn window(cursor: usize, len: usize, height: usize) -> Range<usize> {
    if height == 0 || len == 0 {
        return 0..0;
    }
    let start = cursor.saturating_sub(height - 1).min(len.saturating_sub(height));
    start..(start + height).min(len)
}

/// Cuts `text` to at most `width` columns, ending with an ellipsis when
/// something was dropped.
pub fn truncate_to_width(text: &str, width: usize) -> String {
    let total: usize = text.chars().map(|c| c.width().unwrap_or(0)).sum();
    if total <= width {
        return text.to_string();
    }
    if width == 0 {
        return String::new();
    }

    let mut out = String::new();
    let mut used = 0;
    for c in text.chars() {
        let w = c.width().unwrap_or(0);
        if used + w > width - 1 {
            break;
        }
        used += w;
        out.push(c);
    }
    out.push(ELLIPSIS);
    out
}

/// Lays out the match list for a `height` x `width` area.
pub fn layout_rows(state: &SelectionState, height: usize, width: usize) -> Vec<Row> {
    let text_width = width.saturating_sub(CURSOR_MARK.len());
    let matches = state.matches();

    window(state.cursor(), matches.len(), height)
        .map(|i| {
            let m = &matches[i];
            let text = truncate_to_width(m.text(), text_width);
            let mut visible = text.chars().count();
            if text.len() != m.text().len() {
                // The ellipsis is not part of the candidate.
                visible -= 1;
            }
            Row {
                highlights: m.positions.iter().copied().filter(|&p| p < visible).collect(),
                current: i == state.cursor(),
                selected: state.is_selected(m.text()),
                text,
            }
        })
        .collect()
}

/// Draws sessions on stderr.
pub struct TerminalSink {
    prompt: Option<String>,
    out: Stderr,
}

impl TerminalSink {
    /// `prompt` is shown before the query; `None` hides the query line.
    pub fn new(prompt: Option<String>) -> Self {
        Self {
            prompt,
            out: stderr(),
        }
    }

    fn draw(&mut self, state: &SelectionState) -> std::io::Result<()> {
        let (cols, lines) = crossterm::terminal::size()?;
        let (width, height) = (cols as usize, lines as usize);
        let mut row: u16 = 0;

        queue!(self.out, Clear(ClearType::All))?;

        if let Some(header) = state.header() {
            queue!(
                self.out,
                MoveTo(0, row),
                Print(truncate_to_width(header, width).dim())
            )?;
            row += 1;
        }

        if let Some(prompt) = &self.prompt {
            let line = truncate_to_width(&format!("{}{}", prompt, state.query()), width);
            queue!(self.out, MoveTo(0, row), Print(line.cyan()))?;
            if state.limit() != 1 {
                let count = match state.limit() {
                    0 => format!("  {}", state.selected_count()),
                    limit => format!("  {}/{}", state.selected_count(), limit),
                };
                queue!(self.out, Print(count.dark_grey()))?;
            }
            row += 1;
        }

        let available = height.saturating_sub(row as usize);
        for r in layout_rows(state, available, width) {
            queue!(self.out, MoveTo(0, row))?;
            let mark = if r.current {
                CURSOR_MARK
            } else if r.selected {
                SELECTED_MARK
            } else {
                PLAIN_MARK
            };
            queue!(self.out, Print(mark.magenta()))?;

            let highlights: HashSet<usize> = r.highlights.into_iter().collect();
            for (i, c) in r.text.chars().enumerate() {
                let styled = if highlights.contains(&i) {
                    c.to_string().green().bold()
                } else if r.selected {
                    c.to_string().yellow()
                } else if r.current {
                    c.to_string().bold()
                } else {
                    c.to_string().stylize()
                };
                queue!(self.out, Print(styled))?;
            }
            row += 1;
        }

        self.out.flush()
    }
}

impl RenderSink for TerminalSink {
    fn render(&mut self, state: &SelectionState) -> PickResult<()> {
        self.draw(state).map_err(PickError::render)
    }
}
