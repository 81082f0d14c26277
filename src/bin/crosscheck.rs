//! crosscheck CLI: fact-check text against several AI backends.
//!
//! Usage:
//!   crosscheck check [TEXT] [--context-file path] [--url url] [--format text|json]
//!   crosscheck parse <report-file> [--format text|json]
//!   crosscheck backends

use clap::{Parser, Subcommand, ValueEnum};
use crosscheck::check::{CheckRequest, FactCheckOrchestrator};
use crosscheck::config::{default_config_path, CheckConfig, Credentials};
use crosscheck::report::{self, CitationLinker, FactCheckReport};
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing::Level;

#[derive(Parser)]
#[command(
    name = "crosscheck",
    version,
    about = "Multi-backend fact-check aggregation"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
    /// Path to YAML config file
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Log backend activity to stderr
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Fact-check a piece of text
    Check {
        /// Text to check (read from stdin when omitted)
        text: Option<String>,
        /// File holding surrounding page text
        #[arg(long)]
        context_file: Option<PathBuf>,
        /// URL of the page the text came from
        #[arg(long, default_value = "")]
        url: String,
        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },
    /// Parse a raw backend report and print the structured result
    Parse {
        /// Report file ("-" for stdin)
        path: PathBuf,
        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },
    /// List configured backends and whether their credentials are present
    Backends,
}

#[derive(Clone, Copy, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

fn init_tracing(verbose: bool) {
    let level = if verbose { Level::DEBUG } else { Level::WARN };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn read_input(path: Option<&Path>) -> Result<String, String> {
    match path {
        Some(path) if path != Path::new("-") => std::fs::read_to_string(path)
            .map_err(|e| format!("cannot read '{}': {}", path.display(), e)),
        _ => {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .map_err(|e| format!("cannot read stdin: {}", e))?;
            Ok(buf)
        }
    }
}

fn print_report(report: &FactCheckReport, format: OutputFormat) -> i32 {
    match format {
        OutputFormat::Text => {
            println!("{}", report.to_plain_text());
            0
        }
        OutputFormat::Json => match serde_json::to_string_pretty(report) {
            Ok(json) => {
                println!("{}", json);
                0
            }
            Err(e) => {
                eprintln!("Error: {}", e);
                1
            }
        },
    }
}

async fn cmd_check(
    config: &CheckConfig,
    text: Option<String>,
    context_file: Option<PathBuf>,
    url: String,
    format: OutputFormat,
) -> i32 {
    let selection = match text {
        Some(text) => text,
        None => match read_input(None) {
            Ok(text) => text,
            Err(e) => {
                eprintln!("Error: {}", e);
                return 1;
            }
        },
    };
    if selection.trim().is_empty() {
        eprintln!("Error: nothing to check");
        return 1;
    }

    let page_context = match context_file {
        Some(path) => match read_input(Some(&path)) {
            Ok(text) => text,
            Err(e) => {
                eprintln!("Error: {}", e);
                return 1;
            }
        },
        None => String::new(),
    };

    let orchestrator = match FactCheckOrchestrator::from_config(config) {
        Ok(o) => o,
        Err(e) => {
            eprintln!("Error: {}", e);
            return 1;
        }
    };
    let credentials = config.resolve_credentials(&Credentials::from_env());
    let request = CheckRequest::new(selection)
        .with_context(page_context)
        .with_url(url);

    match orchestrator.run_fact_check(&request, &credentials).await {
        Ok(report) => print_report(&report, format),
        Err(e) => {
            eprintln!("Error: {}", e);
            1
        }
    }
}

fn cmd_parse(config: &CheckConfig, path: &Path, format: OutputFormat) -> i32 {
    let raw = match read_input(Some(path)) {
        Ok(raw) => raw,
        Err(e) => {
            eprintln!("Error: {}", e);
            return 1;
        }
    };

    let parsed = report::parse(&raw);
    let linker = CitationLinker::new(config.citation_style);
    let linked = FactCheckReport {
        fact_check: linker.linkify(&parsed.fact_check, &parsed.sources),
        context: linker.linkify(&parsed.context, &parsed.sources),
        ..parsed
    };
    print_report(&linked, format)
}

fn cmd_backends(config: &CheckConfig) -> i32 {
    let orchestrator = match FactCheckOrchestrator::from_config(config) {
        Ok(o) => o,
        Err(e) => {
            eprintln!("Error: {}", e);
            return 1;
        }
    };
    let credentials = config.resolve_credentials(&Credentials::from_env());
    let status = orchestrator.backend_status(&credentials);

    if status.is_empty() {
        println!("No backends configured.");
        return 0;
    }
    println!("{:<24}  {:<10}", "BACKEND", "READY");
    println!("{}", "-".repeat(36));
    for (name, ready) in status {
        println!("{:<24}  {:<10}", name, if ready { "yes" } else { "no" });
    }
    0
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = match CheckConfig::load_or_default(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {}", e);
            if cli.config.is_none() {
                if let Some(path) = default_config_path() {
                    eprintln!("(config loaded from {})", path.display());
                }
            }
            std::process::exit(1);
        }
    };

    let code = match cli.command {
        Commands::Check {
            text,
            context_file,
            url,
            format,
        } => cmd_check(&config, text, context_file, url, format).await,
        Commands::Parse { path, format } => cmd_parse(&config, &path, format),
        Commands::Backends => cmd_backends(&config),
    };
    std::process::exit(code);
}
