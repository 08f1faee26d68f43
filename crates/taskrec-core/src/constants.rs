//! Constants and default values for taskrec

use std::path::{Path, PathBuf};

/// File suffix for per-task log files
pub const LOG_SUFFIX: &str = "log";

/// Default base directory for task logs, relative to the working directory
pub const DEFAULT_BASE_DIR: &str = "build/task-logs";

/// Config file names to search for (in priority order)
pub const CONFIG_FILES: &[&str] = &["taskrec.toml", "taskrec.yaml", "taskrec.yml", "taskrec.json"];

/// Environment variable overriding the base directory
pub const ENV_BASE_DIR: &str = "TASKREC_DIR";

/// Environment variable holding the tracing filter
pub const ENV_LOG: &str = "TASKREC_LOG";

/// Read buffer size used when pumping child output
pub const PUMP_BUFFER_SIZE: usize = 8192;

/// Get the log file path for a task: `<base_dir>/<task_id>.log`
pub fn log_path(base_dir: &Path, task_id: &str) -> PathBuf {
    base_dir.join(format!("{}.{}", task_id, LOG_SUFFIX))
}
