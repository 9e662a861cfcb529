mod analyzer;
mod cli;
mod config;
mod error;
mod output;
mod pipeline;
mod project;
mod report;

use anyhow::{Context, Result};
use clap::Parser;
use cli::Cli;
use env_logger::{Env, Target, WriteStyle};
use log::{error, info};
use output::Status;
use std::fs::File;
use std::path::Path;
use std::process::ExitCode;

fn init_logging(debug_log: Option<&Path>) -> Result<()> {
    let default_level = if debug_log.is_some() { "debug" } else { "warn" };
    let mut builder = env_logger::Builder::from_env(Env::default().default_filter_or(default_level));

    if let Some(path) = debug_log {
        let file = File::create(path)
            .with_context(|| format!("Failed to create debug log: {}", path.display()))?;
        builder
            .target(Target::Pipe(Box::new(file)))
            .write_style(WriteStyle::Never);
    }

    builder.try_init().context("Failed to initialise logging")?;
    Ok(())
}

fn run(cli: &Cli) -> Result<Status> {
    init_logging(cli.debug_log())?;

    output::print_banner();
    info!("Starting jenkinsfix {}", env!("CARGO_PKG_VERSION"));
    cli.execute()
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let status = match run(&cli) {
        Ok(status) => status,
        Err(err) => {
            error!("{err:?}");
            if output::stderr_is_terminal() {
                eprintln!("{}", output::render_error(&format!("{err:#}")));
            }
            Status::error(&err)
        }
    };

    output::print_status(&status);
    if status.is_success() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}
