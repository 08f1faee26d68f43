//! Reading back a task's recorded log

use std::collections::VecDeque;
use std::fs::{self, File};
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use taskrec_core::{constants, Result};

/// Read-only view of a finished (or running) task's log file
pub struct LogReader {
    path: PathBuf,
}

impl LogReader {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    /// Reader for `<base_dir>/<task_id>.log`
    pub fn for_task(base_dir: &Path, task_id: &str) -> Self {
        Self::new(constants::log_path(base_dir, task_id))
    }

    /// Read the last N lines. Invalid UTF-8 is replaced, not rejected.
    pub fn tail(&self, n: usize) -> Result<Vec<String>> {
        if !self.path.exists() || n == 0 {
            return Ok(vec![]);
        }

        let mut reader = BufReader::new(File::open(&self.path)?);
        let mut lines: VecDeque<String> = VecDeque::with_capacity(n + 1);
        let mut buf = Vec::new();

        loop {
            buf.clear();
            if reader.read_until(b'\n', &mut buf)? == 0 {
                break;
            }
            let line = String::from_utf8_lossy(&buf);
            lines.push_back(line.trim_end_matches(['\n', '\r']).to_string());
            if lines.len() > n {
                lines.pop_front();
            }
        }

        Ok(lines.into_iter().collect())
    }

    /// Read the whole log as raw bytes
    pub fn read_all(&self) -> Result<Vec<u8>> {
        if !self.path.exists() {
            return Ok(vec![]);
        }
        Ok(fs::read(&self.path)?)
    }

    /// Check if the log file exists
    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    /// Get the file path
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Get file size
    pub fn size(&self) -> Result<u64> {
        if !self.path.exists() {
            return Ok(0);
        }
        Ok(fs::metadata(&self.path)?.len())
    }
}
