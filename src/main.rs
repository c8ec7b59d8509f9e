//! dc-replicator CLI
//!
//! Replicates ticket field dynamic content across helpdesk tenants.
//!
//! # Usage
//!
//! ```bash
//! dc-replicator --roster instances.xml export
//! dc-replicator --roster instances.xml replicate --fields custom_ticket_fields.csv
//! dc-replicator --roster instances.xml replicate --dry-run
//! dc-replicator --roster instances.xml --format json sweep
//! ```

use clap::{Parser, Subcommand};
use colored::Colorize;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;
mod output;

/// Exit code for `--strict` runs in which some item or tenant failed
const EXIT_PARTIAL_FAILURE: i32 = 2;

#[derive(Parser)]
#[command(name = "dc-replicator")]
#[command(version)]
#[command(about = "Replicate ticket field dynamic content across helpdesk tenants", long_about = None)]
struct Cli {
    /// Configuration file (TOML)
    #[arg(long, short, env = "DC_CONFIG")]
    config: Option<PathBuf>,

    /// Tenant credential roster (XML)
    #[arg(long, short, env = "DC_ROSTER", default_value = "instances.xml")]
    roster: PathBuf,

    /// Output format
    #[arg(long, short, default_value = "table")]
    format: output::OutputFormat,

    /// Debug logging (overridden by RUST_LOG)
    #[arg(long, short)]
    verbose: bool,

    /// Exit with status 2 if any item or tenant failed
    #[arg(long)]
    strict: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create dynamic content for every field and option on every tenant
    Replicate {
        #[command(flatten)]
        extracts: ExtractPaths,
        /// Rehearse against an in-memory store without calling the API.
        /// Keys repeated in the extracts still count as duplicates.
        #[arg(long)]
        dry_run: bool,
    },
    /// Delete all dynamic content on every tenant
    Sweep {
        /// List what would be deleted without deleting
        #[arg(long)]
        dry_run: bool,
    },
    /// Write field and option extracts from the tenants' ticket fields
    Export {
        #[command(flatten)]
        extracts: ExtractPaths,
    },
}

#[derive(clap::Args)]
struct ExtractPaths {
    /// Field extract (CSV)
    #[arg(long, env = "DC_FIELDS", default_value = "custom_ticket_fields.csv")]
    fields: PathBuf,

    /// Option extract (CSV)
    #[arg(long, env = "DC_OPTIONS", default_value = "custom_dropdown_options.csv")]
    options: PathBuf,
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| default.into()),
        ))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result = match cli.command {
        Commands::Replicate { extracts, dry_run } => {
            commands::replicate::handle(
                cli.config.as_deref(),
                &cli.roster,
                &extracts.fields,
                &extracts.options,
                dry_run,
                cli.format,
            )
            .await
        }
        Commands::Sweep { dry_run } => {
            commands::sweep::handle(cli.config.as_deref(), &cli.roster, dry_run, cli.format).await
        }
        Commands::Export { extracts } => {
            commands::export::handle(
                cli.config.as_deref(),
                &cli.roster,
                &extracts.fields,
                &extracts.options,
                cli.format,
            )
            .await
        }
    };

    match result {
        Ok(outcome) if cli.strict && outcome.has_failures => {
            eprintln!("{}", "Finished with failures".yellow());
            std::process::exit(EXIT_PARTIAL_FAILURE);
        }
        Ok(_) => {}
        Err(e) => {
            eprintln!("{} {}", "Error:".red().bold(), e);
            std::process::exit(1);
        }
    }
}
