//! Exec command implementation - runs an ad-hoc command as a task

use anyhow::{Context, Result};
use taskrec_core::TaskSpec;

use super::{run_task, Settings};
use crate::cli::{ExecArgs, GlobalArgs};

pub async fn execute(global: &GlobalArgs, args: ExecArgs) -> Result<i32> {
    let settings = Settings::load(global)?;
    let cwd = std::env::current_dir().context("Failed to read current directory")?;

    let spec = build_spec(args, cwd);
    run_task(&settings, &spec).await
}

fn build_spec(args: ExecArgs, cwd: std::path::PathBuf) -> TaskSpec {
    let mut command = args.command.into_iter();
    let program = command.next().unwrap_or_default();

    if args.shell {
        // The whole command line goes to `sh -c`
        let line = std::iter::once(program).chain(command).collect::<Vec<_>>().join(" ");
        TaskSpec::new(args.task, line, cwd).with_shell(true)
    } else {
        TaskSpec::new(args.task, program, cwd).with_args(command.collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn exec_args(shell: bool, command: &[&str]) -> ExecArgs {
        ExecArgs {
            task: "compile".to_string(),
            shell,
            command: command.iter().map(|s| s.to_string()).collect(),
        }
    }

    #[test]
    fn test_build_direct_spec() {
        let spec = build_spec(exec_args(false, &["cc", "-c", "main.c"]), PathBuf::from("/src"));
        assert_eq!(spec.command, "cc");
        assert_eq!(spec.args, vec!["-c", "main.c"]);
        assert!(!spec.shell);
    }

    #[test]
    fn test_build_shell_spec() {
        let spec = build_spec(exec_args(true, &["make", "all", "&&", "make", "check"]), PathBuf::from("/src"));
        assert_eq!(spec.command, "make all && make check");
        assert!(spec.args.is_empty());
        assert!(spec.shell);
    }
}
