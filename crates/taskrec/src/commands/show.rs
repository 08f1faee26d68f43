//! Show command implementation - prints the tail of a task's log

use anyhow::{bail, Result};
use taskrec_core::validate_task_name;
use taskrec_logs::LogReader;

use super::Settings;
use crate::cli::{GlobalArgs, ShowArgs};
use crate::output::print_logs;

pub fn execute(global: &GlobalArgs, args: ShowArgs) -> Result<()> {
    if !validate_task_name(&args.task) {
        bail!("Invalid task name: {}", args.task);
    }

    let settings = Settings::load(global)?;
    let reader = LogReader::for_task(&settings.base_dir, &args.task);
    if !reader.exists() {
        bail!("No log for task {} at {}", args.task, reader.path().display());
    }

    let lines = reader.tail(args.lines)?;
    print_logs(&lines);
    Ok(())
}
