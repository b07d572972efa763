//! Render sinks.
//!
//! Drawing is someone else's job. A session hands its state to a sink after
//! every transition and never looks at what the sink did with it.

use std::sync::Arc;

use parking_lot::Mutex;

use crate::error::PickResult;
use crate::state::SelectionState;

/// Receives a state snapshot after every transition.
pub trait RenderSink: Send {
    fn render(&mut self, state: &SelectionState) -> PickResult<()>;
}

/// Discards every frame.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl RenderSink for NullSink {
    fn render(&mut self, _state: &SelectionState) -> PickResult<()> {
        Ok(())
    }
}

/// What a [`RecordingSink`] keeps of each rendered state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub query: String,
    pub cursor: usize,
    pub matches: Vec<String>,
    pub selected: Vec<String>,
}

impl Frame {
    pub fn capture(state: &SelectionState) -> Self {
        Self {
            query: state.query().to_string(),
            cursor: state.cursor(),
            matches: state.matches().iter().map(|m| m.text().to_string()).collect(),
            selected: state.selected().map(str::to_string).collect(),
        }
    }
}

/// Records a [`Frame`] per render. Clones share the same recording.
#[derive(Debug, Default, Clone)]
pub struct RecordingSink {
    frames: Arc<Mutex<Vec<Frame>>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn frames(&self) -> Vec<Frame> {
        self.frames.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.frames.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.lock().is_empty()
    }
}

impl RenderSink for RecordingSink {
    fn render(&mut self, state: &SelectionState) -> PickResult<()> {
        self.frames.lock().push(Frame::capture(state));
        Ok(())
    }
}

/// A cloneable handle over one sink, for prompts that take turns drawing
/// to the same terminal.
#[derive(Clone)]
pub struct SharedSink {
    inner: Arc<Mutex<Box<dyn RenderSink>>>,
}

impl SharedSink {
    pub fn new(sink: impl RenderSink + 'static) -> Self {
        Self {
            inner: Arc::new(Mutex::new(Box::new(sink))),
        }
    }
}

impl RenderSink for SharedSink {
    fn render(&mut self, state: &SelectionState) -> PickResult<()> {
        self.inner.lock().render(state)
    }
}
