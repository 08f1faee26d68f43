//! taskrec Runtime - Runs a task's command with its output recorded

pub mod cmd;
pub mod host;
pub mod shell;
pub mod traits;

pub use cmd::CmdRunner;
pub use host::{TaskHost, TaskOutcome};
pub use shell::ShellRunner;
pub use traits::{PrepareResult, Runner, RunningTask};

use taskrec_core::TaskSpec;

/// Get the appropriate runner for a task
pub fn get_runner(spec: &TaskSpec) -> Box<dyn Runner> {
    if spec.shell {
        Box::new(ShellRunner::default())
    } else {
        Box::new(CmdRunner)
    }
}
