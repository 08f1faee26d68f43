//! Runner trait and common types

use async_trait::async_trait;
use std::process::Stdio;
use taskrec_core::{Error, Result, TaskSpec};
use tokio::process::{Child, Command};

/// Result of the prepare phase (validate before spawning)
#[derive(Debug)]
pub struct PrepareResult {
    pub success: bool,
    pub output: String,
}

impl PrepareResult {
    pub fn success<S: Into<String>>(output: S) -> Self {
        Self {
            success: true,
            output: output.into(),
        }
    }

    pub fn failure<S: Into<String>>(output: S) -> Self {
        Self {
            success: false,
            output: output.into(),
        }
    }
}

/// A spawned task process with piped stdout/stderr
pub struct RunningTask {
    pub pid: u32,
    pub child: Child,
}

impl RunningTask {
    pub fn new(pid: u32, child: Child) -> Self {
        Self { pid, child }
    }
}

/// Trait for task runners (direct exec, shell)
#[async_trait]
pub trait Runner: Send + Sync {
    /// Check the task can be started
    async fn prepare(&self, spec: &TaskSpec) -> Result<PrepareResult>;

    /// Start the process with stdout and stderr piped
    async fn start(&self, spec: &TaskSpec) -> Result<RunningTask>;

    /// Get the command that will be executed (for display)
    fn command_string(&self, spec: &TaskSpec) -> String;

    /// Get the runner name
    fn name(&self) -> &'static str;
}

/// Spawn `cmd` configured for capture: piped output, no stdin
pub(crate) fn spawn_captured(mut cmd: Command, spec: &TaskSpec) -> Result<RunningTask> {
    cmd.current_dir(&spec.cwd)
        .envs(&spec.env)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    let child = cmd.spawn().map_err(|e| {
        Error::process_start(format!("Failed to start '{}': {}", spec.command, e))
    })?;

    let pid = child
        .id()
        .ok_or_else(|| Error::process_start("Process started but no PID available"))?;

    Ok(RunningTask::new(pid, child))
}
