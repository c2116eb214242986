pub mod analyzer;
pub mod cli;
pub mod config;
pub mod doctype;
pub mod http_client;
pub mod link_checker;
pub mod logging;
pub mod login_form;
pub mod models;
pub mod page_analyzer;
pub mod reporter;
pub mod server;

use analyzer::Analyzer;
use anyhow::Result;
use cli::{AnalyzeArgs, Cli, Command, ServeArgs};
use colored::*;
use config::Config;
use reporter::Reporter;
use std::sync::Arc;

pub async fn run(args: Cli) -> Result<()> {
    let config = Config::load(args.config.as_deref())?;
    run_with_config(args, config).await
}

/// Same as [`run`] with an already loaded configuration.
pub async fn run_with_config(args: Cli, config: Config) -> Result<()> {
    match &args.command {
        Command::Serve(serve_args) => run_serve(&config, serve_args, args.verbose).await,
        Command::Analyze(analyze_args) => run_analyze(&config, analyze_args, args.verbose).await,
    }
}

async fn run_serve(config: &Config, args: &ServeArgs, verbose: bool) -> Result<()> {
    let merged = config.merge_with_cli(&args.probe, verbose);
    let settings = merged.settings();
    tracing::debug!(?settings, "resolved settings");

    let analyzer = Arc::new(Analyzer::new(settings)?);
    let bind = merged.bind_addr(args.bind.as_deref());

    server::serve(analyzer, &bind).await
}

async fn run_analyze(config: &Config, args: &AnalyzeArgs, verbose: bool) -> Result<()> {
    let merged = config.merge_with_cli(&args.probe, verbose);
    let settings = merged.settings();

    // Validate URL before building any client
    analyzer::parse_target(&args.url)?;

    if merged.verbose.unwrap_or(false) && args.output != "json" {
        println!("{} {}", "Analyzing:".bright_white().bold(), args.url);
    }

    let analyzer = Analyzer::new(settings)?;
    let result = analyzer.analyze(&args.url).await?;
    let report = Reporter::generate_report(&args.url, &result);

    match args.output.as_str() {
        "json" => {
            let json = serde_json::to_string_pretty(&report.result)?;
            println!("{}", json);
        }
        _ => {
            Reporter::print_text_report(&report);
        }
    }

    if let Some(filename) = &args.save {
        Reporter::save_json_report(&report, filename)?;
    }

    Ok(())
}
