//! Duplex-Stream capture sinks

use std::io::{self, Write};
use std::sync::Arc;
use taskrec_core::StreamKind;
use tracing::warn;

use crate::recorder::PersistentSink;

/// Byte sink handed to a task in place of stdout or stderr.
///
/// Each write is echoed (if echo is enabled at that moment) and then
/// written to the recorder's log file. Only file-side errors are returned;
/// an echo failure is logged and echo stays off for this sink. Once the
/// recorder is closed every write fails with `BrokenPipe`.
pub struct CaptureSink {
    kind: StreamKind,
    sink: Arc<PersistentSink>,
    echo: Box<dyn Write + Send>,
    echo_failed: bool,
}

impl CaptureSink {
    pub(crate) fn new(kind: StreamKind, sink: Arc<PersistentSink>, echo: Box<dyn Write + Send>) -> Self {
        Self {
            kind,
            sink,
            echo,
            echo_failed: false,
        }
    }

    /// Which stream this sink stands in for
    pub fn kind(&self) -> StreamKind {
        self.kind
    }

    fn ensure_open(&self) -> io::Result<()> {
        if self.sink.is_closed() {
            return Err(self.sink.closed_error().into());
        }
        Ok(())
    }

    fn echo_active(&self) -> bool {
        !self.echo_failed && self.sink.echo_enabled()
    }

    fn disable_echo(&mut self, err: io::Error) {
        warn!("Echo of {} failed, continuing without echo: {}", self.kind, err);
        self.echo_failed = true;
    }
}

impl Write for CaptureSink {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.ensure_open()?;
        if self.echo_active() {
            if let Err(e) = self.echo.write_all(buf) {
                self.disable_echo(e);
            }
        }
        self.sink.write_raw(buf)?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.ensure_open()?;
        if self.echo_active() {
            if let Err(e) = self.echo.flush() {
                self.disable_echo(e);
            }
        }
        self.sink.flush()?;
        Ok(())
    }
}

impl std::fmt::Debug for CaptureSink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CaptureSink")
            .field("kind", &self.kind)
            .field("path", &self.sink.path())
            .finish()
    }
}
