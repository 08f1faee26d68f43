//! Console output formatting

use colored::Colorize;
use serde::Serialize;
use std::fmt::Display;
use std::io::{self, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tabled::{settings::Style, Table, Tabled};
use taskrec_core::TaskSpec;
use taskrec_runtime::TaskOutcome;
use tracing::warn;

/// Global flag for JSON output mode
static JSON_MODE: AtomicBool = AtomicBool::new(false);

/// Enable or disable JSON output mode
pub fn set_json_mode(enabled: bool) {
    JSON_MODE.store(enabled, Ordering::SeqCst);
}

/// Check if JSON output mode is enabled
pub fn is_json_mode() -> bool {
    JSON_MODE.load(Ordering::SeqCst)
}

/// Write one line, treating a closed reader (e.g. `| head`) as success
fn write_line<W: Write>(out: &mut W, line: impl Display) -> io::Result<()> {
    match writeln!(out, "{}", line).and_then(|_| out.flush()) {
        Err(e) if e.kind() == io::ErrorKind::BrokenPipe => Ok(()),
        other => other,
    }
}

/// Print a line to stdout without panicking when stdout is gone
pub fn out_line(line: impl Display) {
    if let Err(e) = write_line(&mut io::stdout().lock(), line) {
        warn!("Failed to write to stdout: {}", e);
    }
}

/// Print a line to stderr without panicking when stderr is gone
pub fn err_line(line: impl Display) {
    let _ = write_line(&mut io::stderr().lock(), line);
}

fn print_json<T: Serialize>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(json) => out_line(json),
        Err(e) => err_line(format!("Error serializing to JSON: {}", e)),
    }
}

/// JSON-friendly task outcome
#[derive(Serialize)]
pub struct OutcomeJson {
    pub task: String,
    pub mode: String,
    pub success: bool,
    pub exit_code: Option<i32>,
    pub log_path: String,
    pub bytes_captured: u64,
    pub duration_ms: u128,
}

impl From<&TaskOutcome> for OutcomeJson {
    fn from(outcome: &TaskOutcome) -> Self {
        OutcomeJson {
            task: outcome.task.clone(),
            mode: outcome.mode.to_string(),
            success: outcome.success,
            exit_code: outcome.exit_code,
            log_path: outcome.log_path.display().to_string(),
            bytes_captured: outcome.bytes_captured,
            duration_ms: outcome.duration.as_millis(),
        }
    }
}

pub fn print_outcome(outcome: &TaskOutcome) {
    if is_json_mode() {
        print_json(&OutcomeJson::from(outcome));
        return;
    }

    let summary = format!(
        "Task {} {} in {} ({}, log: {})",
        outcome.task,
        if outcome.success { "succeeded" } else { "failed" },
        format_duration(outcome.duration),
        format_bytes(outcome.bytes_captured),
        outcome.log_path.display()
    );

    if outcome.success {
        print_success(&summary);
    } else {
        let code = outcome
            .exit_code
            .map(|c| format!("exit code {}", c))
            .unwrap_or_else(|| "killed by signal".to_string());
        print_error(&format!("{} [{}]", summary, code));
    }
}

#[derive(Tabled, Serialize)]
pub struct TaskRow {
    #[tabled(rename = "name")]
    pub name: String,
    #[tabled(rename = "command")]
    pub command: String,
    #[tabled(rename = "mode")]
    pub mode: String,
    #[tabled(rename = "cwd")]
    pub cwd: String,
}

impl From<&TaskSpec> for TaskRow {
    fn from(spec: &TaskSpec) -> Self {
        TaskRow {
            name: spec.name.clone(),
            command: spec.command_line(),
            mode: spec
                .mode
                .map(|m| m.to_string())
                .unwrap_or_else(|| "-".to_string()),
            cwd: spec.cwd.display().to_string(),
        }
    }
}

pub fn print_task_table(specs: &[TaskSpec]) {
    let rows: Vec<TaskRow> = specs.iter().map(TaskRow::from).collect();

    if is_json_mode() {
        print_json(&rows);
        return;
    }

    if rows.is_empty() {
        out_line("No tasks defined");
        return;
    }

    out_line(Table::new(rows).with(Style::rounded()));
}

pub fn format_bytes(bytes: u64) -> String {
    if bytes >= 1_073_741_824 {
        format!("{:.1}G", bytes as f64 / 1_073_741_824.0)
    } else if bytes >= 1_048_576 {
        format!("{:.1}M", bytes as f64 / 1_048_576.0)
    } else if bytes >= 1024 {
        format!("{:.0}K", bytes as f64 / 1024.0)
    } else {
        format!("{}B", bytes)
    }
}

pub fn format_duration(duration: Duration) -> String {
    let secs = duration.as_secs();
    if secs >= 3600 {
        format!("{}h {}m", secs / 3600, (secs % 3600) / 60)
    } else if secs >= 60 {
        format!("{}m {}s", secs / 60, secs % 60)
    } else if secs >= 1 {
        format!("{:.1}s", duration.as_secs_f64())
    } else {
        format!("{}ms", duration.as_millis())
    }
}

pub fn print_success(message: &str) {
    out_line(format!("{} {}", "✓".green(), message));
}

pub fn print_error(message: &str) {
    err_line(format!("{} {}", "✗".red(), message));
}

/// Print log lines, as a JSON array if enabled
pub fn print_logs(lines: &[String]) {
    if is_json_mode() {
        print_json(&lines);
        return;
    }

    for line in lines {
        out_line(line);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use taskrec_core::CaptureMode;

    fn outcome() -> TaskOutcome {
        TaskOutcome {
            task: "compile".to_string(),
            mode: CaptureMode::Listener,
            exit_code: Some(2),
            success: false,
            log_path: PathBuf::from("/tmp/build/compile.log"),
            bytes_captured: 2048,
            duration: Duration::from_millis(1500),
        }
    }

    #[test]
    fn test_outcome_json() {
        let json = OutcomeJson::from(&outcome());
        assert_eq!(json.task, "compile");
        assert_eq!(json.mode, "listener");
        assert_eq!(json.exit_code, Some(2));
        assert_eq!(json.log_path, "/tmp/build/compile.log");
        assert_eq!(json.duration_ms, 1500);
    }

    #[test]
    fn test_task_row_from_spec() {
        let spec = TaskSpec::new("lint".into(), "cargo".into(), PathBuf::from("/proj"))
            .with_args(vec!["clippy".into()]);
        let row = TaskRow::from(&spec);
        assert_eq!(row.command, "cargo clippy");
        assert_eq!(row.mode, "-");
        assert_eq!(row.cwd, "/proj");
    }

    struct ClosedPipe;

    impl Write for ClosedPipe {
        fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::BrokenPipe, "reader gone"))
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    struct FullDisk;

    impl Write for FullDisk {
        fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::Other, "no space"))
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_write_line_ignores_closed_pipe() {
        assert!(write_line(&mut ClosedPipe, "summary").is_ok());
        assert!(write_line(&mut FullDisk, "summary").is_err());

        let mut buf = Vec::new();
        write_line(&mut buf, format!("{} {}", "Task", 1)).unwrap();
        assert_eq!(buf, b"Task 1\n");
    }

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(Duration::from_millis(250)), "250ms");
        assert_eq!(format_duration(Duration::from_millis(1500)), "1.5s");
        assert_eq!(format_duration(Duration::from_secs(61)), "1m 1s");
        assert_eq!(format_duration(Duration::from_secs(3661)), "1h 1m");
    }

    #[test]
    fn test_format_bytes() {
        assert_eq!(format_bytes(0), "0B");
        assert_eq!(format_bytes(512), "512B");
        assert_eq!(format_bytes(2048), "2K");
        assert_eq!(format_bytes(1024 * 1024), "1.0M");
    }
}
