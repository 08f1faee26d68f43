//! Configuration file parsing for taskrec
//!
//! Supports multiple configuration file formats:
//! - TOML (.toml)
//! - YAML (.yaml, .yml)
//! - JSON (.json)

use serde::Deserialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::constants::*;
use crate::error::{Error, Result};
use crate::types::{validate_task_name, CaptureMode, TaskSpec};

/// Supported configuration file formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    Toml,
    Yaml,
    Json,
}

impl ConfigFormat {
    /// Detect format from file extension
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "toml" => Some(ConfigFormat::Toml),
            "yaml" | "yml" => Some(ConfigFormat::Yaml),
            "json" => Some(ConfigFormat::Json),
            _ => None,
        }
    }

    /// Detect format from file path
    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|e| e.to_str())
            .and_then(Self::from_extension)
    }
}

/// Recorder-wide settings
#[derive(Debug, Deserialize, Default)]
pub struct RecorderSection {
    /// Directory holding `<task>.log` files
    pub base_dir: Option<String>,
    /// Echo captured output to the console
    #[serde(default)]
    pub verbose: bool,
    /// Default capture mode for tasks that don't set one
    pub mode: Option<String>,
}

/// Configuration file structure (taskrec.toml/yaml/json)
#[derive(Debug, Deserialize, Default)]
pub struct ConfigFile {
    #[serde(default)]
    pub recorder: RecorderSection,
    #[serde(default)]
    pub tasks: Vec<TaskConfig>,
}

/// Single task configuration from config file
#[derive(Debug, Clone, Deserialize)]
pub struct TaskConfig {
    pub name: String,
    pub command: String,
    #[serde(default)]
    pub args: Vec<String>,
    pub cwd: Option<String>,
    #[serde(default)]
    pub env: HashMap<String, String>,
    #[serde(default)]
    pub shell: bool,
    pub mode: Option<String>,
}

impl ConfigFile {
    /// Load config from file, automatically detecting format from extension
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(Error::ConfigNotFound(path.to_path_buf()));
        }

        let format = ConfigFormat::from_path(path).ok_or_else(|| {
            Error::config(format!(
                "Unsupported config file extension: {}. Expected .toml, .yaml, .yml, or .json",
                path.display()
            ))
        })?;

        let content = std::fs::read_to_string(path)?;
        Self::parse(&content, format)
    }

    /// Parse config content with specified format
    pub fn parse(content: &str, format: ConfigFormat) -> Result<Self> {
        let config = match format {
            ConfigFormat::Toml => toml::from_str(content)?,
            ConfigFormat::Yaml => serde_yaml::from_str(content)?,
            ConfigFormat::Json => serde_json::from_str(content)?,
        };
        Ok(config)
    }

    /// Find and load config file from a directory
    pub fn find_and_load(dir: &Path) -> Result<(Self, PathBuf)> {
        for name in CONFIG_FILES {
            let path = dir.join(name);
            if path.exists() {
                let config = Self::load(&path)?;
                return Ok((config, path));
            }
        }
        Err(Error::config(format!(
            "No config file found in {}. Expected one of: {:?}",
            dir.display(),
            CONFIG_FILES
        )))
    }

    /// Resolve the log base directory relative to the config file's directory
    pub fn base_dir(&self, config_dir: &Path) -> PathBuf {
        let dir = self.recorder.base_dir.as_deref().unwrap_or(DEFAULT_BASE_DIR);
        resolve(config_dir, dir)
    }

    /// Capture mode for tasks without their own
    pub fn default_mode(&self) -> Result<CaptureMode> {
        match &self.recorder.mode {
            Some(mode) => mode.parse(),
            None => Ok(CaptureMode::default()),
        }
    }

    /// Look up a task by name
    pub fn task(&self, name: &str) -> Option<&TaskConfig> {
        self.tasks.iter().find(|t| t.name == name)
    }

    /// Resolve a single named task
    pub fn task_spec(&self, name: &str, base_dir: &Path) -> Result<TaskSpec> {
        self.task(name)
            .cloned()
            .ok_or_else(|| Error::TaskNotFound(name.to_string()))?
            .into_spec(base_dir)
    }

    /// Convert to TaskSpec list
    pub fn into_specs(self, base_dir: &Path) -> Result<Vec<TaskSpec>> {
        self.tasks
            .into_iter()
            .map(|task| task.into_spec(base_dir))
            .collect()
    }
}

impl TaskConfig {
    /// Convert to TaskSpec, resolving `cwd` against `base_dir`
    pub fn into_spec(self, base_dir: &Path) -> Result<TaskSpec> {
        if !validate_task_name(&self.name) {
            return Err(Error::InvalidTaskName(self.name));
        }

        let mode = self.mode.as_deref().map(str::parse::<CaptureMode>).transpose()?;
        let cwd = match &self.cwd {
            Some(dir) => resolve(base_dir, dir),
            None => base_dir.to_path_buf(),
        };

        let mut spec = TaskSpec::new(self.name, self.command, cwd)
            .with_args(self.args)
            .with_env(self.env)
            .with_shell(self.shell);
        spec.mode = mode;
        Ok(spec)
    }
}

fn resolve(base: &Path, dir: &str) -> PathBuf {
    let path = Path::new(dir);
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base.join(path)
    }
}
