//! Run command implementation - runs a configured task

use anyhow::{bail, Result};

use super::{run_task, Settings};
use crate::cli::GlobalArgs;

pub async fn execute(global: &GlobalArgs, task: &str) -> Result<i32> {
    let settings = Settings::load(global)?;
    let Some(loaded) = &settings.config else {
        bail!("No config file found; use `taskrec exec` for ad-hoc commands");
    };

    let spec = loaded.file.task_spec(task, &loaded.dir)?;
    run_task(&settings, &spec).await
}
