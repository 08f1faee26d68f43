//! Listener capture for hosts that merge output themselves

use std::sync::Arc;
use taskrec_core::Result;

use crate::recorder::PersistentSink;

/// Receives merged output chunks from a host
pub trait OutputListener: Send {
    /// Handle one chunk. A chunk need not be a whole line.
    fn on_output(&mut self, chunk: &str) -> Result<()>;
}

/// Appends every chunk to the recorder's log. Never echoes; the host
/// owns console output in this mode.
pub struct ListenerCapture {
    sink: Arc<PersistentSink>,
}

impl ListenerCapture {
    pub(crate) fn new(sink: Arc<PersistentSink>) -> Self {
        Self { sink }
    }
}

impl OutputListener for ListenerCapture {
    fn on_output(&mut self, chunk: &str) -> Result<()> {
        self.sink.append_text(chunk)
    }
}
