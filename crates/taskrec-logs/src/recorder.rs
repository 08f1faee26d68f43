//! Recorder construction, shared persistent sink, and lifecycle

use parking_lot::Mutex;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use taskrec_core::{constants, Error, Result, StreamKind};
use tracing::{debug, error};

use crate::listener::ListenerCapture;
use crate::sink::CaptureSink;

/// The log file shared by every handle a recorder gives out.
///
/// `writer` is the buffered text path; its inner `File` is the raw byte
/// path. `None` once closed.
pub(crate) struct PersistentSink {
    path: PathBuf,
    writer: Mutex<Option<BufWriter<File>>>,
    echo: AtomicBool,
    bytes_written: AtomicU64,
}

impl PersistentSink {
    fn open(path: PathBuf, echo_enabled: bool) -> Result<Self> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|source| Error::LogCreateFailed {
                path: path.clone(),
                source,
            })?;
        }

        // Truncates: every run starts a fresh log
        let file = File::create(&path).map_err(|source| Error::LogCreateFailed {
            path: path.clone(),
            source,
        })?;

        Ok(Self {
            path,
            writer: Mutex::new(Some(BufWriter::new(file))),
            echo: AtomicBool::new(echo_enabled),
            bytes_written: AtomicU64::new(0),
        })
    }

    pub(crate) fn path(&self) -> &Path {
        &self.path
    }

    pub(crate) fn closed_error(&self) -> Error {
        Error::RecorderClosed(self.path.clone())
    }

    /// Append text through the buffered writer
    pub(crate) fn append_text(&self, text: &str) -> Result<()> {
        let mut guard = self.writer.lock();
        let writer = guard.as_mut().ok_or_else(|| self.closed_error())?;
        writer.write_all(text.as_bytes())?;
        self.bytes_written
            .fetch_add(text.len() as u64, Ordering::Relaxed);
        Ok(())
    }

    /// Write raw bytes straight to the file, after draining any buffered
    /// text so the file keeps call order.
    pub(crate) fn write_raw(&self, bytes: &[u8]) -> Result<()> {
        let mut guard = self.writer.lock();
        let writer = guard.as_mut().ok_or_else(|| self.closed_error())?;
        writer.flush()?;
        writer.get_mut().write_all(bytes)?;
        self.bytes_written
            .fetch_add(bytes.len() as u64, Ordering::Relaxed);
        Ok(())
    }

    pub(crate) fn flush(&self) -> Result<()> {
        let mut guard = self.writer.lock();
        let writer = guard.as_mut().ok_or_else(|| self.closed_error())?;
        writer.flush()?;
        writer.get_mut().flush()?;
        Ok(())
    }

    pub(crate) fn is_closed(&self) -> bool {
        self.writer.lock().is_none()
    }

    pub(crate) fn echo_enabled(&self) -> bool {
        self.echo.load(Ordering::Relaxed)
    }

    fn set_echo_enabled(&self, enabled: bool) {
        self.echo.store(enabled, Ordering::Relaxed);
    }

    /// Release the file. Returns false if it was already released.
    fn close(&self) -> bool {
        let Some(mut writer) = self.writer.lock().take() else {
            return false;
        };

        if let Err(e) = writer.flush() {
            error!("Failed to flush log {}: {}", self.path.display(), e);
        } else if let Err(e) = writer.get_ref().sync_data() {
            error!("Failed to sync log {}: {}", self.path.display(), e);
        }
        true
    }
}

/// Owns a task's log file from task start to task end.
///
/// Dropping the recorder closes the file, so sinks and listeners that
/// outlive it start failing instead of writing.
pub struct TaskRecorder {
    task_id: String,
    sink: Arc<PersistentSink>,
}

impl TaskRecorder {
    /// Create `<base_dir>/<task_id>.log`, creating missing parent
    /// directories and truncating any previous log.
    ///
    /// `task_id` is used verbatim as the file stem.
    pub fn create(task_id: &str, base_dir: &Path, echo_enabled: bool) -> Result<Self> {
        let path = constants::log_path(base_dir, task_id);
        let sink = PersistentSink::open(path, echo_enabled)?;
        debug!("Opened log for task {}: {}", task_id, sink.path.display());

        Ok(Self {
            task_id: task_id.to_string(),
            sink: Arc::new(sink),
        })
    }

    pub fn task_id(&self) -> &str {
        &self.task_id
    }

    /// Get the log file path
    pub fn path(&self) -> &Path {
        &self.sink.path
    }

    pub fn echo_enabled(&self) -> bool {
        self.sink.echo_enabled()
    }

    /// Toggle console echo; applies to sinks already handed out
    pub fn set_echo_enabled(&self, enabled: bool) {
        self.sink.set_echo_enabled(enabled);
    }

    pub fn is_closed(&self) -> bool {
        self.sink.is_closed()
    }

    /// Total bytes captured so far, across all handles
    pub fn bytes_written(&self) -> u64 {
        self.sink.bytes_written.load(Ordering::Relaxed)
    }

    /// Append a chunk of text to the log
    pub fn append(&self, text: &str) -> Result<()> {
        self.sink.append_text(text)
    }

    /// Flush buffered text to the file
    pub fn flush(&self) -> Result<()> {
        self.sink.flush()
    }

    /// Sink standing in for stdout, echoing to the process's stdout
    pub fn standard_output(&self) -> CaptureSink {
        self.capture_sink(StreamKind::Stdout, std::io::stdout())
    }

    /// Sink standing in for stderr, echoing to the process's stderr
    pub fn error_output(&self) -> CaptureSink {
        self.capture_sink(StreamKind::Stderr, std::io::stderr())
    }

    /// Sink with a caller-supplied echo target
    pub fn capture_sink<W>(&self, kind: StreamKind, echo: W) -> CaptureSink
    where
        W: Write + Send + 'static,
    {
        CaptureSink::new(kind, Arc::clone(&self.sink), Box::new(echo))
    }

    /// Listener pushing merged text chunks into the log
    pub fn listener(&self) -> ListenerCapture {
        ListenerCapture::new(Arc::clone(&self.sink))
    }

    /// Flush and release the log file.
    ///
    /// Safe to call more than once. Failures are logged, not returned.
    pub fn close(&self) {
        if self.sink.close() {
            debug!(
                "Closed log for task {} ({} bytes)",
                self.task_id,
                self.bytes_written()
            );
        }
    }
}

impl Drop for TaskRecorder {
    fn drop(&mut self) {
        self.close();
    }
}

impl std::fmt::Debug for TaskRecorder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TaskRecorder")
            .field("task_id", &self.task_id)
            .field("path", &self.sink.path)
            .field("echo_enabled", &self.echo_enabled())
            .field("closed", &self.is_closed())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;

    #[test]
    fn test_create_makes_parent_dirs() {
        let dir = TempDir::new().unwrap();
        let base = dir.path().join("build").join("nested");

        let recorder = TaskRecorder::create("compile", &base, false).unwrap();
        assert_eq!(recorder.path(), base.join("compile.log"));
        assert!(recorder.path().exists());
        assert_eq!(fs::read_dir(&base).unwrap().count(), 1);
    }

    #[test]
    fn test_create_truncates_previous_log() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("compile.log");
        fs::write(&path, "stale output from last run\n").unwrap();

        let recorder = TaskRecorder::create("compile", dir.path(), false).unwrap();
        recorder.close();

        assert_eq!(fs::read_to_string(&path).unwrap(), "");
    }

    #[test]
    fn test_create_fails_when_base_is_a_file() {
        let dir = TempDir::new().unwrap();
        let blocker = dir.path().join("build");
        fs::write(&blocker, "not a directory").unwrap();

        let result = TaskRecorder::create("compile", &blocker, false);
        match result {
            Err(Error::LogCreateFailed { path, .. }) => {
                assert_eq!(path, blocker.join("compile.log"));
            }
            other => panic!("expected LogCreateFailed, got {:?}", other),
        }
    }

    #[test]
    fn test_create_fails_when_log_path_is_a_directory() {
        let dir = TempDir::new().unwrap();
        fs::create_dir(dir.path().join("compile.log")).unwrap();

        let result = TaskRecorder::create("compile", dir.path(), false);
        assert!(matches!(result, Err(Error::LogCreateFailed { .. })));
    }

    #[test]
    fn test_append_is_utf8() {
        let dir = TempDir::new().unwrap();
        let recorder = TaskRecorder::create("i18n", dir.path(), false).unwrap();

        recorder.append("Übersetzung fertig ✓\n").unwrap();
        recorder.close();

        let bytes = fs::read(recorder.path()).unwrap();
        assert_eq!(bytes, "Übersetzung fertig ✓\n".as_bytes());
    }

    #[test]
    fn test_interleaved_text_and_bytes_keep_order() {
        let dir = TempDir::new().unwrap();
        let recorder = TaskRecorder::create("build", dir.path(), false).unwrap();
        let mut out = recorder.capture_sink(StreamKind::Stdout, std::io::sink());

        recorder.append("> Task :build\n").unwrap();
        out.write_all(b"compiling 3 files\n").unwrap();
        recorder.append("> Task :build done\n").unwrap();
        recorder.close();

        let content = fs::read_to_string(recorder.path()).unwrap();
        assert_eq!(
            content,
            "> Task :build\ncompiling 3 files\n> Task :build done\n"
        );
    }

    #[test]
    fn test_close_is_idempotent() {
        let dir = TempDir::new().unwrap();
        let recorder = TaskRecorder::create("compile", dir.path(), false).unwrap();
        recorder.append("done\n").unwrap();

        recorder.close();
        recorder.close();

        assert!(recorder.is_closed());
        assert_eq!(fs::read_to_string(recorder.path()).unwrap(), "done\n");
    }

    #[test]
    fn test_append_after_close_fails() {
        let dir = TempDir::new().unwrap();
        let recorder = TaskRecorder::create("compile", dir.path(), false).unwrap();
        recorder.close();

        let result = recorder.append("late\n");
        assert!(matches!(result, Err(Error::RecorderClosed(_))));
        assert!(matches!(recorder.flush(), Err(Error::RecorderClosed(_))));
    }

    #[test]
    fn test_drop_closes_outstanding_sinks() {
        let dir = TempDir::new().unwrap();
        let recorder = TaskRecorder::create("compile", dir.path(), false).unwrap();
        let path = recorder.path().to_path_buf();
        let mut err = recorder.capture_sink(StreamKind::Stderr, std::io::sink());
        recorder.append("before drop\n").unwrap();

        drop(recorder);

        assert!(err.write_all(b"after drop\n").is_err());
        assert_eq!(fs::read_to_string(path).unwrap(), "before drop\n");
    }

    #[test]
    fn test_bytes_written_counts_all_paths() {
        let dir = TempDir::new().unwrap();
        let recorder = TaskRecorder::create("count", dir.path(), false).unwrap();
        let mut out = recorder.capture_sink(StreamKind::Stdout, std::io::sink());

        recorder.append("abc").unwrap();
        out.write_all(b"defgh").unwrap();

        assert_eq!(recorder.bytes_written(), 8);
    }

    #[test]
    fn test_set_echo_enabled() {
        let dir = TempDir::new().unwrap();
        let recorder = TaskRecorder::create("compile", dir.path(), false).unwrap();
        assert!(!recorder.echo_enabled());

        recorder.set_echo_enabled(true);
        assert!(recorder.echo_enabled());
    }
}
