use anyhow::{Context, Result};
use chrono::Datelike;
use clap::{Parser, Subcommand};
use std::fs;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

mod error;
mod merge;
mod resolve;
mod scrape;
mod store;
mod types;
mod utils;

use store::{StadiumStore, DEFAULT_DATABASE};

#[derive(Parser)]
#[command(name = "stadiums")]
#[command(about = "European football stadium scraper and lookup")]
struct Cli {
    /// SQLite database file
    #[arg(long, global = true, default_value = DEFAULT_DATABASE)]
    database: PathBuf,

    /// Directory holding the scraped and merged JSON/CSV files
    #[arg(long, global = true, default_value = ".")]
    data_dir: PathBuf,

    /// Quiet mode - suppress progress output
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Scrape present and past stadiums from stadiumguide.com into JSON files
    Scrape {
        /// Comma separated countries (e.g. "England,Spain")
        #[arg(long, value_delimiter = ',', conflicts_with = "all_countries")]
        countries: Option<Vec<String>>,
        /// Scrape every supported country
        #[arg(long)]
        all_countries: bool,
    },
    /// Merge the scraped files into JSON/CSV exports and load the database
    Load,
    /// Look up the stadium a club played at in a given season
    Resolve {
        /// Club name as listed on stadiumguide.com (e.g. "Arsenal")
        club: String,
        /// Season year, defaults to the current year
        year: Option<u16>,
    },
    /// List stadium rows stored in the database
    List {
        /// List past stadiums instead of present ones
        #[arg(long)]
        past: bool,
    },
    /// List tables in the database
    Tables,
    /// Remove the database and all generated files
    Clean,
}

fn current_year() -> Result<u16> {
    let year = chrono::Local::now().year();
    u16::try_from(year).with_context(|| format!("Year {} out of range", year))
}

fn run_resolve(database: &Path, club: &str, year: Option<u16>) -> Result<()> {
    let year = match year {
        Some(y) => y,
        None => current_year()?,
    };
    let store = StadiumStore::open(database)?;
    match resolve::resolve_stadium_name(&store, club, year)? {
        Some(name) => println!("{}", name),
        None => println!("No stadium found for {} in {}", club, year),
    }
    Ok(())
}

fn run_list(database: &Path, past: bool) -> Result<()> {
    let store = StadiumStore::open(database)?;
    if past {
        for s in store.all_past()? {
            println!("{:>4}  {:<30} {:<40} {}", s.id, s.club, s.past_stadium_name, s.year_closed);
        }
    } else {
        for s in store.all_present()? {
            println!(
                "{:>4}  {:<30} {:<40} {:>7}  {} ({})",
                s.id, s.club, s.stadium_name, s.capacity, s.city, s.country
            );
        }
    }
    Ok(())
}

fn run_tables(database: &Path) -> Result<()> {
    let store = StadiumStore::open(database)?;
    for name in store.table_names()? {
        println!("{}", name);
    }
    Ok(())
}

fn run_clean(database: &Path, data_dir: &Path, quiet: bool) -> Result<()> {
    if !quiet {
        println!("Cleaning generated files...");
    }

    let generated = [
        scrape::PRESENT_FILE,
        scrape::PAST_FILE,
        merge::MERGED_JSON_FILE,
        merge::MERGED_CSV_FILE,
    ];
    let paths = std::iter::once(database.to_path_buf())
        .chain(generated.iter().map(|f| data_dir.join(f)));

    for path in paths {
        if path.exists() {
            fs::remove_file(&path)
                .with_context(|| format!("Failed to remove {}", path.display()))?;
            if !quiet {
                println!("  Removed {}", path.display());
            }
        }
    }

    if !quiet {
        println!("Clean complete!");
    }
    Ok(())
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Scrape {
            countries,
            all_countries,
        } => scrape::run_scrape(&cli.data_dir, countries, all_countries, cli.quiet),
        Commands::Load => merge::run_load(&cli.data_dir, &cli.database, cli.quiet),
        Commands::Resolve { club, year } => run_resolve(&cli.database, &club, year),
        Commands::List { past } => run_list(&cli.database, past),
        Commands::Tables => run_tables(&cli.database),
        Commands::Clean => run_clean(&cli.database, &cli.data_dir, cli.quiet),
    }
}
