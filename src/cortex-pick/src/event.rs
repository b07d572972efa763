//! Input events and the sources that deliver them to a session.

use std::collections::VecDeque;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::{Mutex, mpsc};

/// A decoded user intent.
///
/// Key decoding and line editing happen outside the controller; a
/// collaborator turns keystrokes into these.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PickEvent {
    /// The whole query was replaced.
    QueryChanged(String),
    /// A character was typed at the end of the query.
    InsertChar(char),
    /// The last character of the query was removed.
    Backspace,
    /// The query was cleared.
    ClearQuery,
    CursorUp,
    CursorDown,
    /// Jump to the first match.
    Home,
    /// Jump to the last match.
    End,
    /// Toggle the candidate under the cursor in the selected set.
    ToggleSelect,
    /// Select every visible match, up to the limit.
    SelectAll,
    Confirm,
    Abort,
}

/// Something a session can block on for the next event.
///
/// `next_event` must be cancel safe: a session drops the pending future
/// when a timer or abort wins the race, and no event may be lost.
#[async_trait]
pub trait EventSource: Send {
    /// Returns `None` once the source is exhausted.
    async fn next_event(&mut self) -> Option<PickEvent>;
}

/// Replays a fixed list of events.
#[derive(Debug, Default)]
pub struct ScriptedEvents {
    events: VecDeque<PickEvent>,
    hang_when_empty: bool,
}

impl ScriptedEvents {
    /// Delivers `events` in order, then reports exhaustion.
    pub fn new(events: impl IntoIterator<Item = PickEvent>) -> Self {
        Self {
            events: events.into_iter().collect(),
            hang_when_empty: false,
        }
    }

    /// A source that never produces anything, like an idle user.
    pub fn silent() -> Self {
        Self::new([]).then_hang()
    }

    /// Blocks forever after the scripted events instead of ending.
    pub fn then_hang(mut self) -> Self {
        self.hang_when_empty = true;
        self
    }

    /// Types `text` one character at a time.
    pub fn typed(text: &str) -> impl Iterator<Item = PickEvent> + '_ {
        text.chars().map(PickEvent::InsertChar)
    }
}

#[async_trait]
impl EventSource for ScriptedEvents {
    async fn next_event(&mut self) -> Option<PickEvent> {
        match self.events.pop_front() {
            Some(event) => Some(event),
            None if self.hang_when_empty => std::future::pending().await,
            None => None,
        }
    }
}

/// Events pushed through a tokio channel, e.g. by a key reader task.
#[derive(Debug)]
pub struct ChannelEvents {
    rx: mpsc::UnboundedReceiver<PickEvent>,
}

impl ChannelEvents {
    pub fn new(rx: mpsc::UnboundedReceiver<PickEvent>) -> Self {
        Self { rx }
    }

    /// Creates a connected sender/source pair.
    pub fn channel() -> (mpsc::UnboundedSender<PickEvent>, Self) {
        let (tx, rx) = mpsc::unbounded_channel();
        (tx, Self::new(rx))
    }
}

#[async_trait]
impl EventSource for ChannelEvents {
    async fn next_event(&mut self) -> Option<PickEvent> {
        self.rx.recv().await
    }
}

/// A cloneable handle over one event source.
///
/// The process chooser runs a nested prompt between sessions; both read
/// from the same terminal through clones of this handle. Sessions are
/// strictly sequential, so the lock is never contended.
#[derive(Clone)]
pub struct SharedEvents {
    inner: Arc<Mutex<Box<dyn EventSource>>>,
}

impl SharedEvents {
    pub fn new(source: impl EventSource + 'static) -> Self {
        Self {
            inner: Arc::new(Mutex::new(Box::new(source))),
        }
    }
}

#[async_trait]
impl EventSource for SharedEvents {
    async fn next_event(&mut self) -> Option<PickEvent> {
        self.inner.lock().await.next_event().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_scripted_events_in_order() {
        let mut events = ScriptedEvents::new([PickEvent::CursorDown, PickEvent::Confirm]);
        assert_eq!(events.next_event().await, Some(PickEvent::CursorDown));
        assert_eq!(events.next_event().await, Some(PickEvent::Confirm));
        assert_eq!(events.next_event().await, None);
    }

    #[tokio::test]
    async fn test_silent_source_hangs() {
        let mut events = ScriptedEvents::silent();
        let waited = tokio::time::timeout(Duration::from_millis(20), events.next_event()).await;
        assert!(waited.is_err());
    }

    #[tokio::test]
    async fn test_shared_events_share_one_queue() {
        let (tx, source) = ChannelEvents::channel();
        let mut first = SharedEvents::new(source);
        let mut second = first.clone();

        tx.send(PickEvent::CursorUp).unwrap();
        tx.send(PickEvent::Abort).unwrap();

        assert_eq!(first.next_event().await, Some(PickEvent::CursorUp));
        assert_eq!(second.next_event().await, Some(PickEvent::Abort));
    }
}
