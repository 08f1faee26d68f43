//! taskrec CLI - run build tasks with per-task output logs

use anyhow::Result;
use clap::Parser;
use taskrec_core::constants;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod cli;
mod commands;
mod output;

use cli::{Cli, Commands};
use commands::*;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    output::set_json_mode(cli.global.json);

    let log_level = match cli.global.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    // Diagnostics go to stderr so they never mix with echoed task stdout
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_env(constants::ENV_LOG).unwrap_or_else(|_| {
                format!(
                    "taskrec={0},taskrec_runtime={0},taskrec_logs={0}",
                    log_level
                )
                .into()
            }),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .without_time()
                .with_writer(std::io::stderr),
        )
        .init();

    let result = match cli.command {
        Commands::Run { task } => run::execute(&cli.global, &task).await,
        Commands::Exec(args) => exec::execute(&cli.global, args).await,
        Commands::Show(args) => show::execute(&cli.global, args).map(|_| 0),
        Commands::List => list::execute(&cli.global).map(|_| 0),
    };

    match result {
        Ok(code) => std::process::exit(code),
        Err(e) => {
            output::err_line(format!("Error: {}", e));
            std::process::exit(1);
        }
    }
}
