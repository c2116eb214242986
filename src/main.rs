use clap::Parser;
use colored::*;
use pageprobe::cli::Cli;
use pageprobe::config::Config;
use pageprobe::{logging, run_with_config};
use std::process::ExitCode;

#[tokio::main]
async fn main() -> ExitCode {
    let args = Cli::parse();

    // Config goes first so its `verbose` can raise the log level
    let config = match Config::load(args.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{} {:#}", "Error:".bright_red().bold(), e);
            return ExitCode::FAILURE;
        }
    };

    if let Err(e) = logging::init(config.verbose_logging(args.verbose)) {
        eprintln!("{} {:#}", "Error:".bright_red().bold(), e);
        return ExitCode::FAILURE;
    }
    tracing::debug!(?args, "parsed cli");

    if let Err(e) = run_with_config(args, config).await {
        eprintln!("{} {:#}", "Error:".bright_red().bold(), e);
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}
