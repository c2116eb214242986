use clap::{Args, Parser, Subcommand};

#[derive(Parser, Debug, Clone)]
#[command(name = "pageprobe")]
#[command(about = "Analyze the structure and link health of a single web page", long_about = None)]
pub struct Cli {
    /// Verbose output (debug logging)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to configuration file (JSON, TOML, or YAML)
    #[arg(long, global = true)]
    pub config: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Serve the analysis endpoint over HTTP
    Serve(ServeArgs),
    /// Analyze one page and print a report
    Analyze(AnalyzeArgs),
}

#[derive(Args, Debug, Clone, Default)]
pub struct ServeArgs {
    /// Address to listen on (default: 0.0.0.0:8080)
    #[arg(short, long)]
    pub bind: Option<String>,

    #[command(flatten)]
    pub probe: ProbeArgs,
}

#[derive(Args, Debug, Clone)]
pub struct AnalyzeArgs {
    /// The page to analyze
    #[arg(value_name = "URL")]
    pub url: String,

    /// Output format: text or json
    #[arg(short, long, default_value = "text")]
    pub output: String,

    /// Save JSON report to file
    #[arg(short, long)]
    pub save: Option<String>,

    #[command(flatten)]
    pub probe: ProbeArgs,
}

/// Analysis knobs shared by both subcommands
#[derive(Args, Debug, Clone, Default)]
pub struct ProbeArgs {
    /// Seconds allowed for each link liveness probe (default: 10)
    #[arg(long)]
    pub link_timeout: Option<u64>,

    /// Seconds allowed for fetching the analyzed page (default: 30)
    #[arg(long)]
    pub page_timeout: Option<u64>,

    /// Maximum number of simultaneous link probes (default: unlimited)
    #[arg(short = 'c', long)]
    pub concurrency: Option<usize>,

    /// Count links answering with HTTP 4xx/5xx as inaccessible
    #[arg(long)]
    pub count_http_errors: bool,

    /// Skip login form detection (the page body is then never buffered)
    #[arg(long)]
    pub no_login_form: bool,
}
