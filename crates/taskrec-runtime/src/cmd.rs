//! Direct command runner

use async_trait::async_trait;
use taskrec_core::{Result, TaskSpec};
use tokio::process::Command;
use tracing::info;

use crate::traits::{spawn_captured, PrepareResult, Runner, RunningTask};

/// Executes `command` with `args`, no shell involved
pub struct CmdRunner;

#[async_trait]
impl Runner for CmdRunner {
    async fn prepare(&self, spec: &TaskSpec) -> Result<PrepareResult> {
        let program = spec.command.as_str();
        if program.trim().is_empty() {
            return Ok(PrepareResult::failure("Empty command"));
        }

        match which::which(program) {
            Ok(path) => Ok(PrepareResult::success(format!(
                "Found {} at {}",
                program,
                path.display()
            ))),
            Err(_) => {
                // Relative paths are looked up from the task's cwd
                if spec.cwd.join(program).is_file() {
                    Ok(PrepareResult::success(format!("Using {}", program)))
                } else {
                    Ok(PrepareResult::failure(format!(
                        "Command not found: {}",
                        program
                    )))
                }
            }
        }
    }

    async fn start(&self, spec: &TaskSpec) -> Result<RunningTask> {
        info!("Starting task {}: {}", spec.name, self.command_string(spec));

        let mut cmd = Command::new(&spec.command);
        cmd.args(&spec.args);
        let task = spawn_captured(cmd, spec)?;

        info!("Started task {} with PID {}", spec.name, task.pid);
        Ok(task)
    }

    fn command_string(&self, spec: &TaskSpec) -> String {
        spec.command_line()
    }

    fn name(&self) -> &'static str {
        "cmd"
    }
}
