// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! omx - a local multi-worker agent team orchestrator

mod commands;
mod exit_error;
mod output;

use anyhow::Result;
use clap::{Parser, Subcommand};
use output::OutputFormat;
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "omx",
    version,
    about = "omx - run a team of agent-CLI workers against a shared task list"
)]
struct Cli {
    /// Change to <dir> before doing anything
    #[arg(short = 'C', global = true, value_name = "DIR")]
    directory: Option<PathBuf>,

    /// Output format
    #[arg(
        short = 'o',
        long = "output",
        value_enum,
        default_value_t,
        global = true
    )]
    output: OutputFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Team lifecycle and scaling
    #[command(subcommand)]
    Team(commands::team::TeamCommand),
}

#[tokio::main]
async fn main() {
    let _log_guard = init_tracing();
    if let Err(e) = run().await {
        let code = e
            .downcast_ref::<exit_error::ExitError>()
            .map_or(1, |c| c.code);
        let msg = e.to_string();
        if !msg.is_empty() {
            eprintln!("Error: {}", msg);
        }
        std::process::exit(code);
    }
}

async fn run() -> Result<()> {
    let cli = Cli::parse();
    if let Some(dir) = &cli.directory {
        std::env::set_current_dir(dir)?;
    }
    let project_root = std::env::current_dir()?;

    match cli.command {
        Commands::Team(command) => commands::team::run(command, &project_root, cli.output).await,
    }
}

/// Log to stderr so stdout stays machine-parseable. `OMX_LOG_FILE` adds
/// a non-blocking file sink for long-running monitor sessions; the
/// returned guard must live for the whole process.
fn init_tracing() -> Option<tracing_appender::non_blocking::WorkerGuard> {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let stderr_layer = fmt::layer().with_writer(std::io::stderr);

    let file_layer = std::env::var("OMX_LOG_FILE").ok().and_then(|path| {
        let path = PathBuf::from(path);
        let dir = path.parent().unwrap_or(std::path::Path::new("."));
        let name = path.file_name()?.to_string_lossy().into_owned();
        std::fs::create_dir_all(dir).ok()?;
        let appender = tracing_appender::rolling::never(dir, name);
        let (writer, guard) = tracing_appender::non_blocking(appender);
        Some((fmt::layer().with_writer(writer).with_ansi(false), guard))
    });

    match file_layer {
        Some((layer, guard)) => {
            tracing_subscriber::registry()
                .with(filter)
                .with(stderr_layer)
                .with(layer)
                .init();
            Some(guard)
        }
        None => {
            tracing_subscriber::registry()
                .with(filter)
                .with(stderr_layer)
                .init();
            None
        }
    }
}
