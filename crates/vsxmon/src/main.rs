mod cli;
mod commands;
mod config;
mod error;
mod output;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use vsxmon_core::State;

use crate::cli::{Cli, Command};
use crate::error::CliError;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    init_tracing(cli.global.verbose);

    let is_check = matches!(cli.command, Command::Check(_));
    match run(cli).await {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            // A failed check is a check that could not determine a state.
            let code = if is_check {
                State::Unknown.exit_code()
            } else {
                err.exit_code()
            };
            eprintln!("{:?}", miette::Report::new(err));
            std::process::exit(code);
        }
    }
}

fn init_tracing(verbosity: u8) {
    let filter = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

/// Dispatch a command, returning the process exit code.
async fn run(cli: Cli) -> Result<i32, CliError> {
    let global = &cli.global;
    tracing::debug!(command = ?cli.command, "dispatching command");
    match cli.command {
        Command::Config(args) => commands::config_cmd::handle(args, global).map(|()| 0),
        Command::Check(args) => commands::check::handle(args, global)
            .await
            .map(State::exit_code),
        Command::Discover => commands::discover::handle(global).await.map(|()| 0),
        Command::Dump(args) => commands::dump::handle(args, global).await.map(|()| 0),
    }
}
