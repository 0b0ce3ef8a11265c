use anyhow::Result;
use clap::{Parser, ValueEnum};
use colored::Colorize;
use geofacet_core::{load_engine, Orchestrator};
use std::path::PathBuf;
use std::process;
use std::time::Instant;
use tracing::debug;
use tracing_subscriber::EnvFilter;

mod errors;
mod operations;
mod ui;

use errors::map_load_error;
use operations::{commands_from_cli, load_command_script};
use ui::Renderer;

/// Faceted search over geolocated records
///
/// Examples:
///   # Everything, in the configured default order
///   geofacet --config config.json --data items.json
///
///   # Free-text search restricted to a bounding box
///   geofacet -c config.json -d items.json --query "fresco" --bbox 47,45,10,6
///
///   # Terms filter (OR within a facet) combined with a date range
///   geofacet -c config.json -d items.json --facet mainSpace=Wall --facet mainSpace=Cave \
///     --range year=1950..1970
///
///   # Replay a recorded sequence of commands and emit JSON
///   geofacet -c config.json -d items.json --commands session.json --format json
#[derive(Parser, Debug)]
#[command(name = "geofacet")]
#[command(author, version, about, long_about = None)]
#[command(after_help = "Filtering Logic:\n  \
    - Multiple values for the SAME facet are combined with OR\n  \
    - Different facets are combined with AND\n  \
    - A taxonomy path also matches every value below it\n  \
    - Facet counts ignore the facet's own selection\n\n\
Command scripts:\n  \
    - A JSON array of commands, e.g. [{\"command\": \"setSort\", \"key\": \"year_desc\"}]\n  \
    - Script commands run after the command-line selections")]
pub struct Cli {
    /// Path to the JSON configuration object
    #[arg(short, long, value_name = "FILE")]
    pub config: PathBuf,

    /// Path to the JSON dataset (an array of flat records)
    #[arg(short, long, value_name = "FILE")]
    pub data: PathBuf,

    /// Free-text query
    #[arg(short, long, value_name = "TEXT")]
    pub query: Option<String>,

    /// Terms filter (format: field=value, can be specified multiple times)
    #[arg(short, long = "facet", value_name = "FIELD=VALUE")]
    pub facets: Vec<String>,

    /// Chronology filter (format: field=START..END)
    #[arg(short, long = "range", value_name = "FIELD=START..END")]
    pub ranges: Vec<String>,

    /// Taxonomy filter (format: field=A > B, can be specified multiple times)
    #[arg(short, long = "taxonomy", value_name = "FIELD=PATH")]
    pub taxonomies: Vec<String>,

    /// Sort key (a configured sorting or <field>_asc / <field>_desc)
    #[arg(short, long, value_name = "KEY")]
    pub sort: Option<String>,

    /// Viewport scope as north,south,east,west
    #[arg(long, value_name = "N,S,E,W", allow_hyphen_values = true)]
    pub bbox: Option<String>,

    /// JSON file with a list of commands to apply in order
    #[arg(long, value_name = "FILE")]
    pub commands: Option<PathBuf>,

    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Markdown)]
    pub format: OutputFormat,

    /// Maximum number of items to print
    #[arg(short, long, value_name = "N")]
    pub limit: Option<usize>,

    /// Enable debug logging (overridden by RUST_LOG)
    #[arg(short, long)]
    pub verbose: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Markdown,
    Json,
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if let Err(err) = run(&cli) {
        report(&err, &cli);
        process::exit(1);
    }
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn run(cli: &Cli) -> Result<()> {
    let engine = load_engine(&cli.config, &cli.data)?;

    let mut commands = commands_from_cli(cli)?;
    if let Some(script) = &cli.commands {
        commands.extend(load_command_script(script)?);
    }
    debug!(commands = commands.len(), "dispatching");

    let renderer = Renderer::new(cli.format, cli.limit, engine.config().aggregations.clone());
    let mut orchestrator = Orchestrator::new(engine, renderer);
    let now = Instant::now();
    for command in commands {
        orchestrator.dispatch(command, now);
    }
    orchestrator.flush();
    if orchestrator.recomputes() == 0 {
        orchestrator.refresh();
    }

    let output = orchestrator.into_publisher().into_output()?;
    print!("{}", output);
    Ok(())
}

fn report(err: &anyhow::Error, cli: &Cli) {
    match err.downcast_ref::<geofacet_core::Error>() {
        Some(core) => {
            let (title, message, details) = map_load_error(core, &cli.config, &cli.data);
            eprintln!("{}", title.red().bold());
            eprintln!("{}\n", message);
            eprintln!("{}", details);
        }
        None => eprintln!("{} {:#}", "Error:".red().bold(), err),
    }
}
