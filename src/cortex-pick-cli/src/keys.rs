//! Key decoding.
//!
//! Turns crossterm key events into [`PickEvent`]s. Everything here is pure
//! so the bindings can be tested without a terminal.

use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

use cortex_pick::PickEvent;

/// What the current prompt accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyMode {
    /// Printable keys edit the query.
    pub query_input: bool,
    /// Tab toggles the current line instead of moving down.
    pub multi: bool,
}

impl KeyMode {
    pub fn new(query_input: bool, multi: bool) -> Self {
        Self { query_input, multi }
    }
}

/// Maps one key event to a pick event, or `None` if the key is unbound.
pub fn map_key(key: KeyEvent, mode: KeyMode) -> Option<PickEvent> {
    if key.kind == KeyEventKind::Release {
        return None;
    }

    if key.modifiers.contains(KeyModifiers::CONTROL) {
        return match key.code {
            KeyCode::Char('c') => Some(PickEvent::Abort),
            KeyCode::Char('p' | 'k') => Some(PickEvent::CursorUp),
            KeyCode::Char('n' | 'j') => Some(PickEvent::CursorDown),
            KeyCode::Char('a') if mode.multi => Some(PickEvent::SelectAll),
            KeyCode::Char('u') if mode.query_input => Some(PickEvent::ClearQuery),
            _ => None,
        };
    }

    match key.code {
        KeyCode::Esc => Some(PickEvent::Abort),
        KeyCode::Enter => Some(PickEvent::Confirm),
        KeyCode::Up => Some(PickEvent::CursorUp),
        KeyCode::Down => Some(PickEvent::CursorDown),
        KeyCode::Home => Some(PickEvent::Home),
        KeyCode::End => Some(PickEvent::End),
        KeyCode::Tab if mode.multi => Some(PickEvent::ToggleSelect),
        KeyCode::Tab => Some(PickEvent::CursorDown),
        KeyCode::BackTab => Some(PickEvent::CursorUp),
        KeyCode::Backspace if mode.query_input => Some(PickEvent::Backspace),
        KeyCode::Char(c) if mode.query_input => Some(PickEvent::InsertChar(c)),
        // Without a query line, letters navigate.
        KeyCode::Left | KeyCode::Char('k' | 'h') => Some(PickEvent::CursorUp),
        KeyCode::Right | KeyCode::Char('j' | 'l') => Some(PickEvent::CursorDown),
        KeyCode::Char('g') => Some(PickEvent::Home),
        KeyCode::Char('G') => Some(PickEvent::End),
        KeyCode::Char(' ' | 'x') if mode.multi => Some(PickEvent::ToggleSelect),
        KeyCode::Char('q') => Some(PickEvent::Abort),
        _ => None,
    }
}

/// Turns pasted text into typed characters, dropping line breaks.
pub fn map_paste(text: &str, mode: KeyMode) -> Vec<PickEvent> {
    if !mode.query_input {
        return Vec::new();
    }
    text.chars()
        .filter(|c| !c.is_control())
        .map(PickEvent::InsertChar)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::KeyEventState;
    use pretty_assertions::assert_eq;

    const FILTER: KeyMode = KeyMode {
        query_input: true,
        multi: false,
    };
    const CHOOSE_MANY: KeyMode = KeyMode {
        query_input: false,
        multi: true,
    };

    fn press(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn ctrl(c: char) -> KeyEvent {
        KeyEvent::new(KeyCode::Char(c), KeyModifiers::CONTROL)
    }

    #[test]
    fn test_common_bindings() {
        for mode in [FILTER, CHOOSE_MANY] {
            assert_eq!(map_key(ctrl('c'), mode), Some(PickEvent::Abort));
            assert_eq!(map_key(press(KeyCode::Esc), mode), Some(PickEvent::Abort));
            assert_eq!(map_key(press(KeyCode::Enter), mode), Some(PickEvent::Confirm));
            assert_eq!(map_key(press(KeyCode::Up), mode), Some(PickEvent::CursorUp));
            assert_eq!(map_key(ctrl('n'), mode), Some(PickEvent::CursorDown));
            assert_eq!(map_key(press(KeyCode::End), mode), Some(PickEvent::End));
        }
    }

    #[test]
    fn test_typing_edits_query() {
        assert_eq!(
            map_key(press(KeyCode::Char('k')), FILTER),
            Some(PickEvent::InsertChar('k'))
        );
        assert_eq!(
            map_key(press(KeyCode::Backspace), FILTER),
            Some(PickEvent::Backspace)
        );
        assert_eq!(map_key(ctrl('u'), FILTER), Some(PickEvent::ClearQuery));
        assert_eq!(map_key(press(KeyCode::Tab), FILTER), Some(PickEvent::CursorDown));
    }

    #[test]
    fn test_letters_navigate_without_query() {
        assert_eq!(
            map_key(press(KeyCode::Char('k')), CHOOSE_MANY),
            Some(PickEvent::CursorUp)
        );
        assert_eq!(
            map_key(press(KeyCode::Char('q')), CHOOSE_MANY),
            Some(PickEvent::Abort)
        );
        assert_eq!(
            map_key(press(KeyCode::Tab), CHOOSE_MANY),
            Some(PickEvent::ToggleSelect)
        );
        assert_eq!(map_key(ctrl('a'), CHOOSE_MANY), Some(PickEvent::SelectAll));
        assert_eq!(map_key(press(KeyCode::Backspace), CHOOSE_MANY), None);
    }

    #[test]
    fn test_release_is_ignored() {
        let release = KeyEvent {
            code: KeyCode::Enter,
            modifiers: KeyModifiers::NONE,
            kind: KeyEventKind::Release,
            state: KeyEventState::NONE,
        };
        assert_eq!(map_key(release, FILTER), None);
    }

    #[test]
    fn test_paste_types_characters() {
        assert_eq!(
            map_paste("ab\n", FILTER),
            vec![PickEvent::InsertChar('a'), PickEvent::InsertChar('b')]
        );
        assert!(map_paste("ab", CHOOSE_MANY).is_empty());
    }
}
