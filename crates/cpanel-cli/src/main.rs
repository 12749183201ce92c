mod cli;
mod commands;
mod config;
mod error;
mod output;

use std::process::ExitCode;

use clap::{CommandFactory, Parser};
use tracing_subscriber::EnvFilter;

use crate::cli::{Cli, Command};
use crate::error::CliError;

#[tokio::main]
async fn main() -> ExitCode {
    let Cli { global, command } = Cli::parse();
    init_tracing(global.verbose);

    let result = match command {
        // No config file or server needed for these two.
        Command::Config(args) => commands::config_cmd::handle(args, &global),
        Command::Completions(args) => {
            clap_complete::generate(
                args.shell,
                &mut Cli::command(),
                "cpapi",
                &mut std::io::stdout(),
            );
            Ok(())
        }
        command => commands::dispatch(command, &global).await,
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => report_failure(err),
    }
}

fn report_failure(err: CliError) -> ExitCode {
    let code = err.exit_code();
    tracing::debug!(code, "command failed");
    eprintln!("{:?}", miette::Report::new(err));
    ExitCode::from(code)
}

/// `-v` raises the level one step per flag. `RUST_LOG` wins when set.
fn init_tracing(verbose: u8) {
    let level = ["warn", "info", "debug"]
        .get(usize::from(verbose))
        .copied()
        .unwrap_or("trace");
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}
