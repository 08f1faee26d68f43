//! Shell runner (`sh -c`)

use async_trait::async_trait;
use taskrec_core::{Result, TaskSpec};
use tokio::process::Command;
use tracing::info;

use crate::traits::{spawn_captured, PrepareResult, Runner, RunningTask};

/// Runs the task's command line through a shell
pub struct ShellRunner {
    shell: String,
}

impl Default for ShellRunner {
    fn default() -> Self {
        Self::new("sh")
    }
}

impl ShellRunner {
    pub fn new<S: Into<String>>(shell: S) -> Self {
        Self {
            shell: shell.into(),
        }
    }
}

#[async_trait]
impl Runner for ShellRunner {
    async fn prepare(&self, spec: &TaskSpec) -> Result<PrepareResult> {
        if spec.command.trim().is_empty() {
            return Ok(PrepareResult::failure("Empty command"));
        }

        match which::which(&self.shell) {
            Ok(path) => Ok(PrepareResult::success(format!(
                "Using shell {}",
                path.display()
            ))),
            Err(_) => Ok(PrepareResult::failure(format!(
                "Shell not found: {}",
                self.shell
            ))),
        }
    }

    async fn start(&self, spec: &TaskSpec) -> Result<RunningTask> {
        info!("Starting task {} via {}: {}", spec.name, self.shell, spec.command_line());

        let mut cmd = Command::new(&self.shell);
        cmd.arg("-c").arg(spec.command_line());
        let task = spawn_captured(cmd, spec)?;

        info!("Started task {} with PID {}", spec.name, task.pid);
        Ok(task)
    }

    fn command_string(&self, spec: &TaskSpec) -> String {
        format!("{} -c '{}'", self.shell, spec.command_line())
    }

    fn name(&self) -> &'static str {
        "shell"
    }
}
