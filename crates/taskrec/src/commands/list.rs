//! List command implementation

use anyhow::{bail, Result};

use super::Settings;
use crate::cli::GlobalArgs;
use crate::output::print_task_table;

pub fn execute(global: &GlobalArgs) -> Result<()> {
    let settings = Settings::load(global)?;
    let Some(loaded) = settings.config else {
        bail!("No config file found");
    };

    let specs = loaded.file.into_specs(&loaded.dir)?;
    print_task_table(&specs);
    Ok(())
}
