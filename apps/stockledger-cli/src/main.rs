mod journal;
mod report;
mod session;
mod shell;

use std::io::{self, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use stockledger_kernel::{
    DEFAULT_EXPENSIVE_FLOOR, DEFAULT_LOW_STOCK_THRESHOLD, ObserverSet, Record,
    RecordId, TracingObserver,
};
use stockledger_persist::{DEFAULT_LEDGER_FILE, LedgerFile, export_csv, import_csv};
use tracing_subscriber::EnvFilter;

use crate::journal::JournalObserver;
use crate::session::OpenedLedger;

#[derive(Parser)]
#[command(name = "stockledger", about = "Single-user inventory ledger with undo/redo")]
struct Cli {
    /// Binary ledger file
    #[arg(short, long, env = "STOCKLEDGER_FILE", default_value = DEFAULT_LEDGER_FILE)]
    file: PathBuf,

    /// Append a timestamped line per operation to this journal file
    #[arg(short, long)]
    journal: Option<PathBuf>,

    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Apply changes in memory only; never write the ledger file
    #[arg(long, global = true)]
    dry_run: bool,

    /// Print query results as JSON instead of a table
    #[arg(long, global = true)]
    json: bool,

    /// Save even when the existing ledger file failed to load
    #[arg(long, global = true)]
    force: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show every record
    List {
        /// Show only this page (1-based)
        #[arg(long)]
        page: Option<usize>,
        #[arg(long, default_value_t = report::DEFAULT_PAGE_SIZE)]
        page_size: usize,
    },
    /// Records with quantity at or below a threshold
    LowStock {
        #[arg(short, long, default_value_t = DEFAULT_LOW_STOCK_THRESHOLD)]
        threshold: i32,
    },
    /// Records with zero quantity
    OutOfStock,
    /// Records priced above a floor
    Expensive {
        #[arg(short, long, default_value_t = DEFAULT_EXPENSIVE_FLOOR)]
        floor: f64,
    },
    /// Case-insensitive name search
    Search { query: String },
    /// Sorted view of the records
    Sort {
        #[arg(value_enum)]
        by: SortField,
        /// Sort descending
        #[arg(short, long)]
        desc: bool,
    },
    /// Total stock value
    Total,
    /// Add a record and save
    Add {
        id: RecordId,
        name: String,
        #[arg(allow_negative_numbers = true)]
        quantity: i32,
        #[arg(allow_negative_numbers = true)]
        price: f64,
    },
    /// Remove a record and save
    Remove { id: RecordId },
    /// Set a record's quantity and save
    SetQty {
        id: RecordId,
        #[arg(allow_negative_numbers = true)]
        quantity: i32,
    },
    /// Bulk import a CSV file and save
    ImportCsv {
        path: PathBuf,
        /// Replace existing records instead of appending
        #[arg(long)]
        replace: bool,
    },
    /// Export all records to CSV
    ExportCsv { path: PathBuf },
    /// Export all records as a text table
    ExportTxt { path: PathBuf },
    /// Interactive session with undo/redo
    Shell,
}

#[derive(Clone, Copy, ValueEnum)]
enum SortField {
    Price,
    Quantity,
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn print_records(records: &[Record], json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(records)?);
    } else {
        print!("{}", report::render_listing(records));
    }
    Ok(())
}

/// How one-shot mutations write back to the ledger file.
#[derive(Clone, Copy)]
struct SaveMode {
    dry_run: bool,
    force: bool,
}

fn persist(file: &LedgerFile, ledger: &OpenedLedger, mode: SaveMode) -> Result<()> {
    if mode.dry_run {
        println!("Dry run: {} not written.", file.path().display());
        return Ok(());
    }
    ledger.check_writable(file, mode.force)?;
    file.save(&ledger.inventory)
        .with_context(|| format!("saving {}", file.path().display()))
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let mut observers = ObserverSet::new().with(TracingObserver);
    let journal = cli.journal.as_ref().map(|path| JournalObserver::new(path));
    if let Some(journal) = &journal {
        if let Err(e) = journal.note("session start") {
            tracing::warn!(path = %journal.path().display(), error = %e, "journal not writable");
        }
        observers = observers.with(journal.clone());
    }

    let file = LedgerFile::new(&cli.file);
    let mut ledger = session::open_inventory(&file, observers)?;
    let mode = SaveMode {
        dry_run: cli.dry_run,
        force: cli.force,
    };
    let json = cli.json;

    match cli.command {
        Commands::List { page: None, .. } => print_records(ledger.inventory.records(), json)?,
        Commands::List {
            page: Some(page),
            page_size,
        } => {
            let records = ledger.inventory.records();
            if json {
                print_records(report::page_of(records, page, page_size).rows, true)?;
            } else {
                print!("{}", report::render_page(records, page, page_size));
            }
        }
        Commands::LowStock { threshold } => {
            print_records(&ledger.inventory.low_stock(threshold), json)?;
        }
        Commands::OutOfStock => print_records(&ledger.inventory.out_of_stock(), json)?,
        Commands::Expensive { floor } => print_records(&ledger.inventory.expensive(floor), json)?,
        Commands::Search { query } => print_records(&ledger.inventory.search(&query), json)?,
        Commands::Sort { by, desc } => {
            let sorted = match by {
                SortField::Price => ledger.inventory.sort_by_price(!desc),
                SortField::Quantity => ledger.inventory.sort_by_quantity(!desc),
            };
            print_records(&sorted, json)?;
        }
        Commands::Total => println!("Total value: {:.2}", ledger.inventory.total_value()),
        Commands::Add {
            id,
            name,
            quantity,
            price,
        } => {
            ledger.inventory.add(Record::new(id, name, quantity, price))?;
            persist(&file, &ledger, mode)?;
            println!("Record {id} added.");
        }
        Commands::Remove { id } => {
            ledger.inventory.remove(id)?;
            persist(&file, &ledger, mode)?;
            println!("Record {id} removed.");
        }
        Commands::SetQty { id, quantity } => {
            ledger.inventory.update_quantity(id, quantity)?;
            persist(&file, &ledger, mode)?;
            println!("Record {id} quantity set to {quantity}.");
        }
        Commands::ImportCsv { path, replace } => {
            let count = import_csv(&path, &mut ledger.inventory, replace)?;
            persist(&file, &ledger, mode)?;
            println!("Imported {count} records from {}.", path.display());
        }
        Commands::ExportCsv { path } => {
            export_csv(&path, &ledger.inventory)?;
            println!("CSV written to {}.", path.display());
        }
        Commands::ExportTxt { path } => {
            report::export_txt(&path, &ledger.inventory)?;
            println!("TXT written to {}.", path.display());
        }
        Commands::Shell => {
            let stdin = io::stdin();
            let mut stdout = io::stdout();
            writeln!(
                stdout,
                "stockledger shell, {} records. Type 'help'.",
                ledger.inventory.len()
            )?;
            if ledger.load_failed {
                writeln!(
                    stdout,
                    "Warning: {} failed to load; 'save' and 'quit' will overwrite it.",
                    file.path().display()
                )?;
            }
            let exit = shell::run(&mut ledger.inventory, &file, stdin.lock(), &mut stdout)?;
            tracing::debug!(?exit, "shell finished");
        }
    }

    if let Some(journal) = &journal {
        if let Err(e) = journal.note("session stop") {
            tracing::warn!(path = %journal.path().display(), error = %e, "journal not writable");
        }
    }
    Ok(())
}
