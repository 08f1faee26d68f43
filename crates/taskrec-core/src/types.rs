//! Core types for taskrec

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;
use std::str::FromStr;

use crate::error::{Error, Result};
use once_cell::sync::Lazy;
use regex::Regex;

/// Regex pattern for task names usable as a log file stem
static TASK_NAME_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[a-zA-Z0-9_.:-]+$").expect("Invalid task name regex")
});

/// Validate a task name before it is used as a file name stem.
/// Rejects path separators and the `.`/`..` directory entries.
pub fn validate_task_name(name: &str) -> bool {
    name != "." && name != ".." && TASK_NAME_REGEX.is_match(name)
}

/// How a recorder receives a task's output
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum CaptureMode {
    /// Separate stdout/stderr byte sinks with optional console echo
    #[default]
    Duplex,
    /// Host merges both streams and pushes text chunks
    Listener,
}

impl CaptureMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            CaptureMode::Duplex => "duplex",
            CaptureMode::Listener => "listener",
        }
    }
}

impl FromStr for CaptureMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "duplex" => Ok(CaptureMode::Duplex),
            "listener" => Ok(CaptureMode::Listener),
            _ => Err(Error::InvalidMode(s.to_string())),
        }
    }
}

impl std::fmt::Display for CaptureMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Which console stream a capture sink stands in for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamKind {
    Stdout,
    Stderr,
}

impl StreamKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            StreamKind::Stdout => "stdout",
            StreamKind::Stderr => "stderr",
        }
    }
}

impl std::fmt::Display for StreamKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Task specification - what to run and where its output goes
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskSpec {
    pub name: String,
    pub command: String,
    #[serde(default)]
    pub args: Vec<String>,
    pub cwd: PathBuf,
    #[serde(default)]
    pub env: HashMap<String, String>,
    /// Run through `sh -c` instead of executing `command` directly
    #[serde(default)]
    pub shell: bool,
    #[serde(default)]
    pub mode: Option<CaptureMode>,
}

impl TaskSpec {
    pub fn new(name: String, command: String, cwd: PathBuf) -> Self {
        Self {
            name,
            command,
            args: vec![],
            cwd,
            env: HashMap::new(),
            shell: false,
            mode: None,
        }
    }

    pub fn with_args(mut self, args: Vec<String>) -> Self {
        self.args = args;
        self
    }

    pub fn with_env(mut self, env: HashMap<String, String>) -> Self {
        self.env = env;
        self
    }

    pub fn with_shell(mut self, shell: bool) -> Self {
        self.shell = shell;
        self
    }

    pub fn with_mode(mut self, mode: CaptureMode) -> Self {
        self.mode = Some(mode);
        self
    }

    /// Command line for display
    pub fn command_line(&self) -> String {
        if self.args.is_empty() {
            self.command.clone()
        } else {
            format!("{} {}", self.command, self.args.join(" "))
        }
    }
}
