//! Error types for taskrec

use std::io;
use std::path::PathBuf;

/// taskrec error type
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Task not found: {0}")]
    TaskNotFound(String),

    #[error("Invalid task name: {0}")]
    InvalidTaskName(String),

    #[error("Invalid capture mode: {0}")]
    InvalidMode(String),

    #[error("Recorder already closed: {0}")]
    RecorderClosed(PathBuf),

    #[error("Failed to create log file {path}: {source}")]
    LogCreateFailed {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Process failed to start: {0}")]
    ProcessStartFailed(String),

    #[error("Config error: {0}")]
    ConfigError(String),

    #[error("Config file not found: {0}")]
    ConfigNotFound(PathBuf),

    #[error("IO error: {0}")]
    IoError(#[from] io::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("YAML parse error: {0}")]
    YamlError(#[from] serde_yaml::Error),
}

/// Result type alias for taskrec
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub fn config<S: Into<String>>(msg: S) -> Self {
        Error::ConfigError(msg.into())
    }

    pub fn process_start<S: Into<String>>(msg: S) -> Self {
        Error::ProcessStartFailed(msg.into())
    }
}

impl From<Error> for io::Error {
    fn from(err: Error) -> Self {
        match err {
            Error::IoError(e) => e,
            Error::LogCreateFailed { source, .. } => source,
            closed @ Error::RecorderClosed(_) => io::Error::new(io::ErrorKind::BrokenPipe, closed),
            other => io::Error::new(io::ErrorKind::Other, other),
        }
    }
}
