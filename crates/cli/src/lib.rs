pub mod commands;

use std::process::ExitCode;

use agentquote_core::config::{AppConfig, LoadOptions, LogFormat};
use clap::{Parser, Subcommand};
use tracing::Level;

use crate::commands::catalog::CatalogArgs;
use crate::commands::quote::QuoteArgs;

#[derive(Debug, Parser)]
#[command(
    name = "agentquote",
    about = "Agent solution configurator and quoting CLI",
    long_about = "Browse the agent catalog, build a selection, and price it against a requested delivery timeline.",
    after_help = "Examples:\n  agentquote catalog --search fraud\n  agentquote quote --agent customer-support --weeks 6\n  agentquote doctor --json"
)]
pub struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(about = "List agents and deliverable layers, optionally filtered by a search query")]
    Catalog {
        #[arg(long, help = "Case-insensitive search over names, descriptions and tasks")]
        search: Option<String>,
        #[arg(long, help = "Restrict to an agent category (horizontal|industry)")]
        category: Option<String>,
        #[arg(long, help = "Emit machine-readable JSON output")]
        json: bool,
    },
    #[command(about = "Price a selection of agents, services, dependencies and deliverables")]
    Quote {
        #[arg(
            long = "agent",
            value_name = "AGENT",
            help = "Select an agent with all of its services"
        )]
        agents: Vec<String>,
        #[arg(long = "service", value_name = "AGENT:SERVICE", help = "Select a single service")]
        services: Vec<String>,
        #[arg(
            long = "dependency",
            value_name = "AGENT:DEPENDENCY",
            help = "Add an optional dependency"
        )]
        dependencies: Vec<String>,
        #[arg(long = "deliverable", value_name = "ID", help = "Select a deliverable")]
        deliverables: Vec<String>,
        #[arg(long, help = "Requested delivery in weeks (defaults to the standard duration)")]
        weeks: Option<u32>,
        #[arg(long, help = "Emit machine-readable JSON output")]
        json: bool,
    },
    #[command(about = "Show the delivery window offered for a standard duration")]
    Bounds {
        #[arg(long, help = "Standard duration in weeks")]
        weeks: u32,
    },
    #[command(about = "Inspect effective configuration values with source attribution")]
    Config,
    #[command(about = "Validate configuration and catalog readiness")]
    Doctor {
        #[arg(long, help = "Emit machine-readable JSON output")]
        json: bool,
    },
}

pub fn run() -> ExitCode {
    let cli = Cli::parse();

    if let Ok(config) = AppConfig::load(LoadOptions::default()) {
        init_logging(&config);
    }

    let result = match cli.command {
        Command::Catalog { search, category, json } => {
            commands::catalog::run(CatalogArgs { search, category, json })
        }
        Command::Quote { agents, services, dependencies, deliverables, weeks, json } => {
            commands::quote::run(QuoteArgs {
                agents,
                services,
                dependencies,
                deliverables,
                weeks,
                json,
            })
        }
        Command::Bounds { weeks } => commands::bounds::run(weeks),
        Command::Config => {
            commands::CommandResult { exit_code: 0, output: commands::config::run() }
        }
        Command::Doctor { json } => {
            commands::CommandResult { exit_code: 0, output: commands::doctor::run(json) }
        }
    };

    println!("{}", result.output);
    ExitCode::from(result.exit_code)
}

/// Logs go to stderr so command output on stdout stays machine-readable.
pub fn init_logging(config: &AppConfig) {
    let log_level = config.logging.level.parse::<Level>().unwrap_or(Level::INFO);
    let builder = tracing_subscriber::fmt()
        .with_target(false)
        .with_max_level(log_level)
        .with_writer(std::io::stderr);

    let _ = match config.logging.format {
        LogFormat::Compact => builder.compact().try_init(),
        LogFormat::Pretty => builder.pretty().try_init(),
        LogFormat::Json => builder.json().try_init(),
    };
}
