use std::process::ExitCode;

use clap::Parser;
use colored::Colorize;
use tracing::Level;

use sprig_repo::RepoError;

mod cli;
mod commands;

fn main() -> ExitCode {
    let cli = cli::Cli::parse();
    let level = if cli.verbose { Level::DEBUG } else { Level::WARN };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();

    match commands::run_command(cli) {
        Ok(()) => ExitCode::SUCCESS,
        // precondition failures are ordinary output
        Err(e) => match e.downcast_ref::<RepoError>() {
            Some(repo_err) if repo_err.is_precondition() => {
                println!("{repo_err}");
                ExitCode::SUCCESS
            }
            _ => {
                eprintln!("{} {e:#}", "error:".red().bold());
                ExitCode::FAILURE
            }
        },
    }
}
