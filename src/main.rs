// src/main.rs
use std::path::PathBuf;
use std::time::Instant;

use clap::{Parser, Subcommand};
use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::{filter::EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use ssrgate::config::Config;
use ssrgate::logging::{bridge::RecordFormat, Logger, PrettyFormatter, Severity};
use ssrgate::server::{self, AppState};

#[derive(Parser)]
#[command(name = "ssrgate", version, about = "SSR front server with request-scoped logging")]
struct Cli {
    /// Configuration file (defaults to config/default.toml when present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Clone, Copy, PartialEq, Eq)]
enum Command {
    /// Run the HTTP server
    Serve,
    /// Pretty-print JSON log lines read from stdin
    Pretty,
}

/// tracing has no fatal level
fn filter_directive(level: Severity) -> &'static str {
    match level {
        Severity::Fatal => "error",
        other => other.as_str(),
    }
}

/// Main entry point
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let started = Instant::now();
    dotenv::dotenv().ok();

    let cli = Cli::parse();
    let command = cli.command.unwrap_or(Command::Serve);
    let cfg = Config::from_env(cli.config.as_deref())?;

    // diagnostics stay off stdout while it carries pretty-printed output
    let writer = match command {
        Command::Pretty => BoxMakeWriter::new(std::io::stderr),
        Command::Serve => BoxMakeWriter::new(std::io::stdout),
    };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(filter_directive(cfg.logging.level)));
    let logger = Logger::root(&cfg.logging, cfg.environment);

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .event_format(RecordFormat::for_logger(&logger))
                .with_writer(writer),
        )
        .init();

    tracing::debug!(?cfg, "loaded configuration");
    logger.report_rejected_patterns();

    match command {
        Command::Serve => server::serve(AppState::new(cfg, logger), started).await,
        Command::Pretty => {
            let formatter = match logger.pretty_formatter() {
                Some(formatter) => formatter.clone(),
                None => {
                    let formatter = PrettyFormatter::from_config(&cfg.logging, cfg.environment);
                    formatter.report_rejected_patterns();
                    formatter
                }
            };
            let stdin = std::io::stdin();
            ssrgate::pretty::run(&formatter, stdin.lock(), std::io::stdout().lock())?;
            Ok(())
        }
    }
}
