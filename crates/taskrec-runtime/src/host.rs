//! Task host: runs one task with its output captured by a recorder
//!
//! The host decides the capture mode. In Duplex mode each child stream is
//! copied into its matching [`CaptureSink`], which also echoes to the
//! console when verbose. In Listener mode the host merges both streams,
//! echoes them itself, and pushes text chunks into the recorder.

use std::io::{self, Write};
use std::path::PathBuf;
use std::process::ExitStatus;
use std::time::{Duration, Instant};
use taskrec_core::{
    constants, validate_task_name, CaptureMode, Error, Result, StreamKind, TaskSpec,
};
use taskrec_logs::{CaptureSink, OutputListener, TaskRecorder};
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncReadExt, BufReader};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::get_runner;
use crate::traits::RunningTask;

/// Capacity of the merge channel in Listener mode
const MERGE_CHANNEL_CAPACITY: usize = 256;

/// What happened when a task ran
#[derive(Debug, Clone)]
pub struct TaskOutcome {
    pub task: String,
    pub mode: CaptureMode,
    /// `None` when the process was terminated by a signal
    pub exit_code: Option<i32>,
    pub success: bool,
    pub log_path: PathBuf,
    pub bytes_captured: u64,
    pub duration: Duration,
}

/// Runs tasks, giving each its own recorder under `base_dir`
#[derive(Debug, Clone)]
pub struct TaskHost {
    base_dir: PathBuf,
    verbose: bool,
}

impl TaskHost {
    pub fn new(base_dir: PathBuf, verbose: bool) -> Self {
        Self { base_dir, verbose }
    }

    /// Run `spec` to completion with its output recorded.
    ///
    /// The recorder is closed on every exit path. A non-zero exit is a
    /// normal outcome, not an error.
    pub async fn run(&self, spec: &TaskSpec, mode: CaptureMode) -> Result<TaskOutcome> {
        if !validate_task_name(&spec.name) {
            return Err(Error::InvalidTaskName(spec.name.clone()));
        }

        let started = Instant::now();
        let recorder = TaskRecorder::create(&spec.name, &self.base_dir, self.verbose)?;
        info!(
            "Running task {} ({} mode), log: {}",
            spec.name,
            mode,
            recorder.path().display()
        );

        let result = self.drive(&recorder, spec, mode).await;
        recorder.close();
        let status = result?;

        let outcome = TaskOutcome {
            task: spec.name.clone(),
            mode,
            exit_code: status.code(),
            success: status.success(),
            log_path: recorder.path().to_path_buf(),
            bytes_captured: recorder.bytes_written(),
            duration: started.elapsed(),
        };
        info!(
            "Task {} finished with {:?} in {:?}",
            outcome.task, outcome.exit_code, outcome.duration
        );
        Ok(outcome)
    }

    async fn drive(
        &self,
        recorder: &TaskRecorder,
        spec: &TaskSpec,
        mode: CaptureMode,
    ) -> Result<ExitStatus> {
        let runner = get_runner(spec);
        let prepared = runner.prepare(spec).await?;
        if !prepared.success {
            recorder.append(&format!("{}\n", prepared.output))?;
            return Err(Error::process_start(prepared.output));
        }
        debug!("{}", prepared.output);

        let task = match runner.start(spec).await {
            Ok(task) => task,
            Err(e) => {
                recorder.append(&format!("{}\n", e))?;
                return Err(e);
            }
        };

        match mode {
            CaptureMode::Duplex => self.capture_duplex(recorder, task).await,
            CaptureMode::Listener => self.capture_merged(recorder, task).await,
        }
    }

    async fn capture_duplex(
        &self,
        recorder: &TaskRecorder,
        task: RunningTask,
    ) -> Result<ExitStatus> {
        let RunningTask { pid, mut child } = task;
        let stdout = child.stdout.take();
        let stderr = child.stderr.take();

        let out_pump = stdout.map(|out| tokio::spawn(pump_bytes(out, recorder.standard_output())));
        let err_pump = stderr.map(|err| tokio::spawn(pump_bytes(err, recorder.error_output())));

        let status = child.wait().await;
        if status.is_err() {
            let _ = child.start_kill();
        }
        let status = settle(status, Ok(()), [out_pump, err_pump]).await?;
        debug!("Process {} exited: {}", pid, status);
        Ok(status)
    }

    async fn capture_merged(
        &self,
        recorder: &TaskRecorder,
        task: RunningTask,
    ) -> Result<ExitStatus> {
        let RunningTask { pid, mut child } = task;
        let (tx, mut rx) = mpsc::channel::<(StreamKind, String)>(MERGE_CHANNEL_CAPACITY);

        let out_pump = child
            .stdout
            .take()
            .map(|out| tokio::spawn(pump_chunks(out, StreamKind::Stdout, tx.clone())));
        let err_pump = child
            .stderr
            .take()
            .map(|err| tokio::spawn(pump_chunks(err, StreamKind::Stderr, tx.clone())));
        drop(tx);

        let mut listener = recorder.listener();
        let verbose = self.verbose;
        let consume = async move {
            while let Some((kind, chunk)) = rx.recv().await {
                if verbose {
                    echo_chunk(kind, &chunk);
                }
                listener.on_output(&chunk)?;
            }
            Ok::<_, Error>(())
        };

        // A failed append drops the receiver, which stops both pumps
        let (status, consumed) = tokio::join!(child.wait(), consume);
        if status.is_err() {
            let _ = child.start_kill();
        }
        let status = settle(status, consumed, [out_pump, err_pump]).await?;
        debug!("Process {} exited: {}", pid, status);
        Ok(status)
    }
}

/// Copy raw bytes from a child stream into a capture sink
async fn pump_bytes<R>(mut reader: R, mut sink: CaptureSink) -> Result<()>
where
    R: AsyncRead + Unpin,
{
    let mut buf = vec![0u8; constants::PUMP_BUFFER_SIZE];
    loop {
        let n = reader.read(&mut buf).await?;
        if n == 0 {
            break;
        }
        sink.write_all(&buf[..n])?;
    }
    sink.flush()?;
    Ok(())
}

/// Read a child stream line by line and forward each line as a chunk.
/// Splitting on newlines keeps multi-byte characters intact.
async fn pump_chunks<R>(
    reader: R,
    kind: StreamKind,
    tx: mpsc::Sender<(StreamKind, String)>,
) -> Result<()>
where
    R: AsyncRead + Unpin,
{
    let mut reader = BufReader::new(reader);
    let mut buf = Vec::new();
    loop {
        buf.clear();
        if reader.read_until(b'\n', &mut buf).await? == 0 {
            break;
        }
        let chunk = String::from_utf8_lossy(&buf).into_owned();
        if tx.send((kind, chunk)).await.is_err() {
            debug!("Merge channel closed, stopping {} pump", kind);
            break;
        }
    }
    Ok(())
}

type PumpHandle = Option<JoinHandle<Result<()>>>;

/// Wait for every pump before reporting, so no sink outlives the run.
/// The first error wins: wait, then consumer, then pumps in order.
async fn settle(
    status: io::Result<ExitStatus>,
    consumed: Result<()>,
    pumps: [PumpHandle; 2],
) -> Result<ExitStatus> {
    let mut pumped = Ok(());
    for pump in pumps {
        let joined = join_pump(pump).await;
        if pumped.is_ok() {
            pumped = joined;
        }
    }

    let status = status?;
    consumed?;
    pumped?;
    Ok(status)
}

async fn join_pump(handle: PumpHandle) -> Result<()> {
    match handle {
        Some(handle) => handle
            .await
            .map_err(|e| Error::IoError(io::Error::new(io::ErrorKind::Other, e)))?,
        None => Ok(()),
    }
}

/// Host-side console echo for Listener mode
fn echo_chunk(kind: StreamKind, chunk: &str) {
    let result = match kind {
        StreamKind::Stdout => {
            let mut out = io::stdout().lock();
            out.write_all(chunk.as_bytes()).and_then(|_| out.flush())
        }
        StreamKind::Stderr => {
            let mut err = io::stderr().lock();
            err.write_all(chunk.as_bytes()).and_then(|_| err.flush())
        }
    };
    if let Err(e) = result {
        warn!("Failed to echo {} output: {}", kind, e);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::path::Path;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;
    use tempfile::TempDir;

    fn shell_task(name: &str, script: &str, cwd: &Path) -> TaskSpec {
        TaskSpec::new(name.to_string(), script.to_string(), cwd.to_path_buf()).with_shell(true)
    }

    #[tokio::test]
    async fn test_duplex_captures_both_streams() {
        let dir = TempDir::new().unwrap();
        let host = TaskHost::new(dir.path().join("logs"), false);
        let spec = shell_task("compile", "echo building; echo 'warning: w' >&2", dir.path());

        let outcome = host.run(&spec, CaptureMode::Duplex).await.unwrap();

        assert!(outcome.success);
        assert_eq!(outcome.exit_code, Some(0));
        assert_eq!(outcome.log_path, dir.path().join("logs").join("compile.log"));
        let content = fs::read_to_string(&outcome.log_path).unwrap();
        assert!(content.contains("building\n"));
        assert!(content.contains("warning: w\n"));
        assert_eq!(outcome.bytes_captured, content.len() as u64);
    }

    #[tokio::test]
    async fn test_listener_mode_exact_content() {
        let dir = TempDir::new().unwrap();
        let host = TaskHost::new(dir.path().to_path_buf(), false);
        let spec = shell_task("assemble", "printf 'Building...\\nDone\\n'", dir.path());

        let outcome = host.run(&spec, CaptureMode::Listener).await.unwrap();

        assert_eq!(outcome.mode, CaptureMode::Listener);
        assert_eq!(
            fs::read_to_string(&outcome.log_path).unwrap(),
            "Building...\nDone\n"
        );
    }

    #[tokio::test]
    async fn test_listener_mode_keeps_partial_last_line() {
        let dir = TempDir::new().unwrap();
        let host = TaskHost::new(dir.path().to_path_buf(), false);
        let spec = shell_task("partial", "printf 'one\\ntwo'", dir.path());

        let outcome = host.run(&spec, CaptureMode::Listener).await.unwrap();
        assert_eq!(fs::read_to_string(&outcome.log_path).unwrap(), "one\ntwo");
    }

    #[tokio::test]
    async fn test_failing_task_is_an_outcome() {
        let dir = TempDir::new().unwrap();
        let host = TaskHost::new(dir.path().to_path_buf(), false);
        let spec = shell_task("test", "echo 'error: x' >&2; exit 3", dir.path());

        let outcome = host.run(&spec, CaptureMode::Duplex).await.unwrap();

        assert!(!outcome.success);
        assert_eq!(outcome.exit_code, Some(3));
        assert_eq!(fs::read_to_string(&outcome.log_path).unwrap(), "error: x\n");
    }

    #[tokio::test]
    async fn test_missing_command_is_logged() {
        let dir = TempDir::new().unwrap();
        let host = TaskHost::new(dir.path().to_path_buf(), false);
        let spec = TaskSpec::new(
            "broken".to_string(),
            "nonexistent_command_12345".to_string(),
            dir.path().to_path_buf(),
        );

        let result = host.run(&spec, CaptureMode::Duplex).await;

        assert!(matches!(result, Err(Error::ProcessStartFailed(_))));
        let content = fs::read_to_string(dir.path().join("broken.log")).unwrap();
        assert!(content.contains("Command not found: nonexistent_command_12345"));
    }

    #[tokio::test]
    async fn test_invalid_task_name_creates_no_file() {
        let dir = TempDir::new().unwrap();
        let host = TaskHost::new(dir.path().join("logs"), false);
        let spec = shell_task("../escape", "true", dir.path());

        let result = host.run(&spec, CaptureMode::Duplex).await;

        assert!(matches!(result, Err(Error::InvalidTaskName(_))));
        assert!(!dir.path().join("logs").exists());
        assert!(!dir.path().join("escape.log").exists());
    }

    #[tokio::test]
    async fn test_rerun_truncates_log() {
        let dir = TempDir::new().unwrap();
        let host = TaskHost::new(dir.path().to_path_buf(), false);

        host.run(&shell_task("gen", "echo first", dir.path()), CaptureMode::Duplex)
            .await
            .unwrap();
        let outcome = host
            .run(&shell_task("gen", "echo second", dir.path()), CaptureMode::Duplex)
            .await
            .unwrap();

        assert_eq!(fs::read_to_string(&outcome.log_path).unwrap(), "second\n");
    }

    #[tokio::test]
    async fn test_direct_command_with_args() {
        let dir = TempDir::new().unwrap();
        let host = TaskHost::new(dir.path().to_path_buf(), false);
        let spec = TaskSpec::new("hello".to_string(), "echo".to_string(), dir.path().to_path_buf())
            .with_args(vec!["hello".to_string(), "world".to_string()]);

        let outcome = host.run(&spec, CaptureMode::Listener).await.unwrap();
        assert_eq!(fs::read_to_string(&outcome.log_path).unwrap(), "hello world\n");
    }

    #[tokio::test]
    async fn test_settle_joins_pumps_when_wait_fails() {
        let finished = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&finished);
        let slow_pump: PumpHandle = Some(tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(50)).await;
            flag.store(true, Ordering::SeqCst);
            Ok(())
        }));
        let wait_failed = Err(io::Error::new(io::ErrorKind::Other, "wait failed"));

        let result = settle(wait_failed, Ok(()), [slow_pump, None]).await;

        assert!(matches!(result, Err(Error::IoError(_))));
        assert!(finished.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn test_settle_reports_pump_error() {
        let failing: PumpHandle = Some(tokio::spawn(async {
            Err(Error::RecorderClosed(PathBuf::from("/tmp/build/compile.log")))
        }));
        let status = std::process::Command::new("true").status().unwrap();

        let result = settle(Ok(status), Ok(()), [None, failing]).await;
        assert!(matches!(result, Err(Error::RecorderClosed(_))));
    }
}
