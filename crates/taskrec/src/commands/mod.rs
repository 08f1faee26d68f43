//! Command implementations

pub mod exec;
pub mod list;
pub mod run;
pub mod show;

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use taskrec_core::{constants, CaptureMode, ConfigFile, Error, TaskSpec};
use taskrec_runtime::TaskHost;
use tracing::debug;

use crate::cli::GlobalArgs;
use crate::output::print_outcome;

/// Settings resolved from flags, environment, and config file.
/// Flags win over the config file, which wins over defaults.
pub struct Settings {
    pub base_dir: PathBuf,
    pub verbose: bool,
    pub mode: Option<CaptureMode>,
    pub config: Option<LoadedConfig>,
}

pub struct LoadedConfig {
    pub file: ConfigFile,
    pub dir: PathBuf,
}

impl Settings {
    pub fn load(global: &GlobalArgs) -> Result<Self> {
        let cwd = std::env::current_dir().context("Failed to read current directory")?;
        let config = load_config(global.config.as_deref(), &cwd)?;

        let base_dir = match (&global.dir, &config) {
            (Some(dir), _) => absolutize(&cwd, dir),
            (None, Some(loaded)) => loaded.file.base_dir(&loaded.dir),
            (None, None) => cwd.join(constants::DEFAULT_BASE_DIR),
        };

        let config_verbose = config.as_ref().map_or(false, |c| c.file.recorder.verbose);

        Ok(Self {
            base_dir,
            verbose: global.verbose > 0 || config_verbose,
            mode: global.mode.map(CaptureMode::from),
            config,
        })
    }

    /// Capture mode for a task: flag, then task, then config default
    pub fn mode_for(&self, spec: &TaskSpec) -> Result<CaptureMode> {
        if let Some(mode) = self.mode.or(spec.mode) {
            return Ok(mode);
        }
        match &self.config {
            Some(loaded) => Ok(loaded.file.default_mode()?),
            None => Ok(CaptureMode::default()),
        }
    }

    pub fn host(&self) -> TaskHost {
        TaskHost::new(self.base_dir.clone(), self.verbose)
    }
}

fn load_config(explicit: Option<&Path>, cwd: &Path) -> Result<Option<LoadedConfig>> {
    if let Some(path) = explicit {
        let path = absolutize(cwd, path);
        let file = ConfigFile::load(&path)?;
        let dir = path.parent().map(Path::to_path_buf).unwrap_or_else(|| cwd.to_path_buf());
        return Ok(Some(LoadedConfig { file, dir }));
    }

    match ConfigFile::find_and_load(cwd) {
        Ok((file, path)) => {
            debug!("Using config {}", path.display());
            Ok(Some(LoadedConfig {
                file,
                dir: cwd.to_path_buf(),
            }))
        }
        Err(Error::ConfigError(_)) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

fn absolutize(cwd: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        cwd.join(path)
    }
}

/// Run one task and report it; returns the process exit code to use
pub async fn run_task(settings: &Settings, spec: &TaskSpec) -> Result<i32> {
    let mode = settings.mode_for(spec)?;
    let outcome = settings.host().run(spec, mode).await?;
    print_outcome(&outcome);

    Ok(match outcome.exit_code {
        Some(code) => code,
        None if outcome.success => 0,
        None => 1,
    })
}
