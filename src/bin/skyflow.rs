//! SkyFlow CLI - Command-line interface for the SkyFlow Mobility map and report.

use clap::{Parser, Subcommand, ValueEnum};
use skyflow::map::render::{self, DEFAULT_TITLE};
use skyflow::map::LayerKind;
use skyflow::{
    load_tables, Config, Dashboard, DirectorySource, MapOptions, Report, Selection, SkyTable,
    SkyflowError, Supabase, Table, TableSource,
};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "skyflow")]
#[command(author, version, about = "SkyFlow Mobility urban air map and report", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum Format {
    Parquet,
    Csv,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the map for a selection
    Map {
        /// Aircraft id (defaults to the first aircraft by model name)
        #[arg(short, long)]
        aircraft: Option<i64>,

        /// Flight id to highlight (defaults to the aircraft's first flight)
        #[arg(short, long)]
        flight: Option<i64>,

        /// Read table snapshots from a directory instead of Supabase
        #[arg(long)]
        offline: Option<PathBuf>,

        /// Output file
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Write the map as JSON instead of HTML
        #[arg(long)]
        json: bool,
    },

    /// List the aircraft and flight choices
    Options {
        /// Aircraft whose flights are listed (defaults to the first aircraft)
        #[arg(short, long)]
        aircraft: Option<i64>,

        /// Read table snapshots from a directory instead of Supabase
        #[arg(long)]
        offline: Option<PathBuf>,
    },

    /// Snapshot every table to a directory
    Export {
        /// Target directory
        #[arg(short, long)]
        dir: PathBuf,

        /// File format
        #[arg(short, long, value_enum, default_value = "parquet")]
        format: Format,
    },

    /// Write the statistics report (Markdown)
    Report {
        /// Read table snapshots from a directory instead of Supabase
        #[arg(long)]
        offline: Option<PathBuf>,

        /// Output file
        #[arg(short, long, default_value = "skyflow_report.md")]
        output: PathBuf,
    },

    /// Configure the Supabase connection
    Config {
        /// Supabase project URL
        #[arg(short, long)]
        url: Option<String>,

        /// Supabase API key
        #[arg(short = 'k', long)]
        api_key: Option<String>,

        /// Show current configuration
        #[arg(long)]
        show: bool,
    },
}

/// Supabase or an offline snapshot, chosen at runtime.
enum Source {
    Remote(Supabase),
    Offline(DirectorySource),
}

impl Source {
    fn open(config: &Config, offline: Option<PathBuf>) -> skyflow::Result<Self> {
        match offline {
            Some(dir) => Ok(Source::Offline(DirectorySource::new(dir))),
            None => {
                println!("Connecting to Supabase...");
                Ok(Source::Remote(Supabase::with_config(config)?))
            }
        }
    }
}

impl TableSource for Source {
    async fn fetch_table(&self, table: SkyTable) -> skyflow::Result<Table> {
        match self {
            Source::Remote(s) => s.fetch_table(table).await,
            Source::Offline(s) => s.fetch_table(table).await,
        }
    }
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    if let Err(e) = run(cli.command).await {
        match e {
            SkyflowError::MandatoryTable(table) => {
                eprintln!("Error: {} is empty or unavailable; the map cannot be built.", table);
            }
            other => eprintln!("Error: {}", other),
        }
        std::process::exit(1);
    }
}

async fn run(command: Commands) -> skyflow::Result<()> {
    match command {
        Commands::Map {
            aircraft,
            flight,
            offline,
            output,
            json,
        } => {
            let config = Config::load()?;
            let source = Source::open(&config, offline)?;
            let dashboard = Dashboard::load(&source).await?;

            let (selection, map) =
                dashboard.render(Selection::new(aircraft, flight), &MapOptions::from(&config));

            println!(
                "Aircraft: {}  Flight: {}",
                selection.aircraft_id.map_or("-".to_string(), |id| id.to_string()),
                selection.flight_id.map_or("-".to_string(), |id| id.to_string())
            );
            println!("Center: {:.4}, {:.4}", map.center.lat, map.center.lon);
            for kind in [LayerKind::Zones, LayerKind::Weather, LayerKind::Flights] {
                println!("  {:<16} {}", kind.title(), map.overlay_len(kind));
            }
            if !map.skipped.is_empty() {
                println!("Skipped {} rows (see RUST_LOG=debug)", map.skipped.len());
            }

            let path = output.unwrap_or_else(|| {
                PathBuf::from(if json { "skyflow_map.json" } else { "skyflow_map.html" })
            });
            if json {
                std::fs::write(&path, render::to_json(&map)?)?;
            } else {
                render::write_html(&map, DEFAULT_TITLE, &path)?;
            }
            println!("Saved to {}", path.display());
        }

        Commands::Options { aircraft, offline } => {
            let config = Config::load()?;
            let source = Source::open(&config, offline)?;
            let dashboard = Dashboard::load(&source).await?;

            let options = dashboard.aircraft_options();
            println!("Aircraft:");
            for option in &options {
                println!("  {}", option.label);
            }

            let aircraft = aircraft.or_else(|| options.first().map(|o| o.id));
            let flights = dashboard.flight_options(aircraft);
            println!(
                "Flights{}:",
                aircraft.map_or(String::new(), |id| format!(" of aircraft {}", id))
            );
            if flights.is_empty() {
                println!("  (none)");
            }
            for option in &flights {
                println!("  {}", option.label);
            }
        }

        Commands::Export { dir, format } => {
            let config = Config::load()?;
            let source = Source::open(&config, None)?;
            let tables = load_tables(&source).await;
            std::fs::create_dir_all(&dir)?;

            for (table, data) in tables.iter() {
                if tables.warnings().iter().any(|w| w.table == table) {
                    println!("  {:<26} skipped", table.table_name());
                    continue;
                }

                let path = match format {
                    Format::Parquet => dir.join(format!("{}.parquet", table.table_name())),
                    Format::Csv => dir.join(format!("{}.csv", table.table_name())),
                };
                match format {
                    Format::Parquet => data.to_parquet(&path)?,
                    Format::Csv => data.to_csv(&path)?,
                }
                println!("  {:<26} {} rows", table.table_name(), data.len());
            }
            println!("Saved to {}", dir.display());
        }

        Commands::Report { offline, output } => {
            let config = Config::load()?;
            let source = Source::open(&config, offline)?;
            let tables = load_tables(&source).await;

            let report = Report::compute(&tables)?;
            report.write(&output)?;
            println!("Saved to {}", output.display());
        }

        Commands::Config { url, api_key, show } => {
            if show {
                let config = Config::load()?;
                println!("SkyFlow Configuration:");
                println!("  File:    {}", Config::config_path()?.display());
                println!("  URL:     {}", config.url.as_deref().unwrap_or("(not set)"));
                println!(
                    "  API key: {}",
                    if config.api_key.is_some() {
                        "********"
                    } else {
                        "(not set)"
                    }
                );
                println!("  Zoom:    {}", config.zoom);
                return Ok(());
            }

            if url.is_none() && api_key.is_none() {
                println!("Use --url and --api-key to set the connection, or --show to view.");
                return Ok(());
            }

            // The file as written; env overrides must not be saved into it
            let mut config = Config::load_file()?;

            if let Some(u) = url {
                config.url = Some(u);
            }
            if let Some(k) = api_key {
                config.api_key = Some(k);
            }

            let path = config.save()?;
            println!("Configuration saved to {}", path.display());
        }
    }

    Ok(())
}
