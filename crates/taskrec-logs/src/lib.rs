//! taskrec Logs - Per-task output recording
//!
//! A [`TaskRecorder`] owns one `<base_dir>/<task>.log` file for the lifetime
//! of a task. Output reaches it in one of two ways:
//!
//! - Duplex-Stream mode: [`TaskRecorder::standard_output`] and
//!   [`TaskRecorder::error_output`] hand out [`CaptureSink`]s that mirror
//!   bytes to the console (when echo is enabled) and to the file.
//! - Listener mode: the host merges output itself and pushes text chunks
//!   through an [`OutputListener`] obtained from [`TaskRecorder::listener`].

mod listener;
mod reader;
mod recorder;
mod sink;

pub use listener::{ListenerCapture, OutputListener};
pub use reader::LogReader;
pub use recorder::TaskRecorder;
pub use sink::CaptureSink;
