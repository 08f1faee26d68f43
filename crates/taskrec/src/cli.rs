//! CLI argument definitions

use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use taskrec_core::CaptureMode;

#[derive(Parser)]
#[command(name = "taskrec")]
#[command(version, about = "Run build tasks with their output recorded to per-task log files")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[command(flatten)]
    pub global: GlobalArgs,
}

#[derive(Args, Clone)]
pub struct GlobalArgs {
    /// Increase verbosity (-v echoes task output, -vv adds debug logs)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Directory for task log files
    #[arg(long, global = true, env = "TASKREC_DIR")]
    pub dir: Option<PathBuf>,

    /// How task output is captured
    #[arg(long, value_enum, global = true)]
    pub mode: Option<ModeArg>,

    /// Config file (default: taskrec.toml/yaml/json in the current directory)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Output in JSON format instead of text
    #[arg(long, global = true)]
    pub json: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run a task defined in the config file
    Run {
        /// Task name
        task: String,
    },

    /// Run an ad-hoc command as a named task
    Exec(ExecArgs),

    /// Show the tail of a task's log
    Show(ShowArgs),

    /// List tasks defined in the config file
    List,
}

#[derive(Args)]
pub struct ExecArgs {
    /// Task name (log file stem)
    #[arg(short, long)]
    pub task: String,

    /// Run the command line through `sh -c`
    #[arg(long)]
    pub shell: bool,

    /// Command and arguments
    #[arg(trailing_var_arg = true, allow_hyphen_values = true, required = true, num_args = 1..)]
    pub command: Vec<String>,
}

#[derive(Args)]
pub struct ShowArgs {
    /// Task name
    pub task: String,

    /// Number of lines to show
    #[arg(short = 'n', long, default_value = "20")]
    pub lines: usize,
}

#[derive(Clone, Copy, ValueEnum)]
pub enum ModeArg {
    Duplex,
    Listener,
}

impl From<ModeArg> for CaptureMode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::Duplex => CaptureMode::Duplex,
            ModeArg::Listener => CaptureMode::Listener,
        }
    }
}
