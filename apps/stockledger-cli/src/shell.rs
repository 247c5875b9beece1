//! Interactive line-oriented session over one inventory.
//!
//! Changes stay in memory until `save` or `quit`; `exit` (or end of input)
//! leaves without saving.

use std::io::{BufRead, Write};
use std::path::PathBuf;

use anyhow::{Context, Result, anyhow, bail};
use stockledger_kernel::{
    DEFAULT_EXPENSIVE_FLOOR, DEFAULT_LOW_STOCK_THRESHOLD, Inventory, Record, RecordId,
};
use stockledger_persist::{LedgerFile, export_csv, import_csv};

use crate::report;

const HELP: &str = "\
Commands:
  list                         show all records
  page [N]                     show page N of all records, 10 per page
  low [N]                      quantity <= N (default 5)
  out                          quantity == 0
  expensive [P]                price > P (default 10000)
  search TEXT                  case-insensitive name search
  sort price|qty asc|desc      sorted view
  total                        total stock value
  add ID QTY PRICE NAME...     add a record
  qty ID N                     set quantity
  rm ID                        remove a record
  import FILE [replace]        bulk import CSV
  export-csv FILE              export CSV
  export-txt FILE              export text table
  undo | redo                  step through history
  save                         write the ledger file
  quit                         save and leave
  exit                         leave without saving
";

/// One parsed shell line.
#[derive(Debug, Clone, PartialEq)]
pub enum ShellCommand {
    List,
    Page(usize),
    LowStock(i32),
    OutOfStock,
    Expensive(f64),
    Search(String),
    SortPrice { ascending: bool },
    SortQuantity { ascending: bool },
    Total,
    Add(Record),
    SetQuantity { id: RecordId, quantity: i32 },
    Remove(RecordId),
    Import { path: PathBuf, replace: bool },
    ExportCsv(PathBuf),
    ExportTxt(PathBuf),
    Undo,
    Redo,
    Save,
    Quit,
    Exit,
    Help,
    Empty,
}

/// How the session ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShellExit {
    Saved,
    Discarded,
}

impl ShellCommand {
    pub fn parse(line: &str) -> Result<Self> {
        let line = line.trim();
        let (word, rest) = line
            .split_once(char::is_whitespace)
            .map_or((line, ""), |(w, r)| (w, r.trim()));
        let args: Vec<&str> = rest.split_whitespace().collect();

        let cmd = match word {
            "" => Self::Empty,
            "list" | "ls" => Self::List,
            "page" => Self::Page(opt_arg(&args, 0, 1)?),
            "low" => Self::LowStock(opt_arg(&args, 0, DEFAULT_LOW_STOCK_THRESHOLD)?),
            "out" => Self::OutOfStock,
            "expensive" => Self::Expensive(opt_arg(&args, 0, DEFAULT_EXPENSIVE_FLOOR)?),
            "search" => Self::Search(rest.to_string()),
            "sort" => {
                let ascending = match args.get(1).copied().unwrap_or("asc") {
                    "asc" => true,
                    "desc" => false,
                    other => bail!("unknown sort direction '{other}'"),
                };
                match args.first().copied() {
                    Some("price") => Self::SortPrice { ascending },
                    Some("qty" | "quantity") => Self::SortQuantity { ascending },
                    _ => bail!("usage: sort price|qty asc|desc"),
                }
            }
            "total" => Self::Total,
            "add" => {
                if args.len() < 4 {
                    bail!("usage: add ID QTY PRICE NAME...");
                }
                let name = args[3..].join(" ");
                Self::Add(Record::new(
                    req_arg(&args, 0)?,
                    name,
                    req_arg(&args, 1)?,
                    req_arg(&args, 2)?,
                ))
            }
            "qty" => Self::SetQuantity {
                id: req_arg(&args, 0)?,
                quantity: req_arg(&args, 1)?,
            },
            "rm" | "remove" => Self::Remove(req_arg(&args, 0)?),
            "import" => Self::Import {
                path: PathBuf::from(req_word(&args, 0)?),
                replace: matches!(args.get(1).copied(), Some("replace")),
            },
            "export-csv" => Self::ExportCsv(PathBuf::from(req_word(&args, 0)?)),
            "export-txt" => Self::ExportTxt(PathBuf::from(req_word(&args, 0)?)),
            "undo" => Self::Undo,
            "redo" => Self::Redo,
            "save" => Self::Save,
            "quit" => Self::Quit,
            "exit" => Self::Exit,
            "help" | "?" => Self::Help,
            other => bail!("unknown command '{other}' (try 'help')"),
        };
        Ok(cmd)
    }
}

fn req_word<'a>(args: &[&'a str], index: usize) -> Result<&'a str> {
    args.get(index)
        .copied()
        .ok_or_else(|| anyhow!("missing argument {}", index + 1))
}

fn req_arg<T>(args: &[&str], index: usize) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    let raw = req_word(args, index)?;
    raw.parse()
        .with_context(|| format!("invalid value '{raw}' for argument {}", index + 1))
}

fn opt_arg<T>(args: &[&str], index: usize, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match args.get(index) {
        Some(_) => req_arg(args, index),
        None => Ok(default),
    }
}

/// Run the read-eval loop until `quit`, `exit` or end of input.
///
/// Errors from individual commands are printed and the loop continues. Only
/// failures writing to `out` abort the session.
pub fn run<R, W>(
    inventory: &mut Inventory,
    file: &LedgerFile,
    input: R,
    out: &mut W,
) -> Result<ShellExit>
where
    R: BufRead,
    W: Write,
{
    write!(out, "> ")?;
    out.flush()?;
    for line in input.lines() {
        let line = line.context("reading shell input")?;
        match ShellCommand::parse(&line) {
            Ok(ShellCommand::Quit) => match file.save(inventory) {
                Ok(()) => {
                    writeln!(out, "Saved to {}.", file.path().display())?;
                    return Ok(ShellExit::Saved);
                }
                Err(e) => writeln!(out, "Error: {e}")?,
            },
            Ok(ShellCommand::Exit) => {
                writeln!(out, "Leaving without saving.")?;
                return Ok(ShellExit::Discarded);
            }
            Ok(cmd) => {
                if let Err(e) = execute(inventory, file, cmd, out) {
                    writeln!(out, "Error: {e:#}")?;
                }
            }
            Err(e) => writeln!(out, "Error: {e:#}")?,
        }
        write!(out, "> ")?;
        out.flush()?;
    }
    writeln!(out)?;
    Ok(ShellExit::Discarded)
}

fn execute<W: Write>(
    inventory: &mut Inventory,
    file: &LedgerFile,
    cmd: ShellCommand,
    out: &mut W,
) -> Result<()> {
    match cmd {
        ShellCommand::List => write!(out, "{}", report::render_listing(inventory.records()))?,
        ShellCommand::Page(n) => write!(
            out,
            "{}",
            report::render_page(inventory.records(), n, report::DEFAULT_PAGE_SIZE)
        )?,
        ShellCommand::LowStock(n) => write!(out, "{}", report::render_listing(&inventory.low_stock(n)))?,
        ShellCommand::OutOfStock => write!(out, "{}", report::render_listing(&inventory.out_of_stock()))?,
        ShellCommand::Expensive(p) => write!(out, "{}", report::render_listing(&inventory.expensive(p)))?,
        ShellCommand::Search(q) => write!(out, "{}", report::render_listing(&inventory.search(&q)))?,
        ShellCommand::SortPrice { ascending } => {
            write!(out, "{}", report::render_listing(&inventory.sort_by_price(ascending)))?;
        }
        ShellCommand::SortQuantity { ascending } => {
            write!(out, "{}", report::render_listing(&inventory.sort_by_quantity(ascending)))?;
        }
        ShellCommand::Total => writeln!(out, "Total value: {:.2}", inventory.total_value())?,
        ShellCommand::Add(record) => {
            inventory.add(record)?;
            writeln!(out, "Record added.")?;
        }
        ShellCommand::SetQuantity { id, quantity } => {
            inventory.update_quantity(id, quantity)?;
            writeln!(out, "Quantity updated.")?;
        }
        ShellCommand::Remove(id) => {
            inventory.remove(id)?;
            writeln!(out, "Record removed.")?;
        }
        ShellCommand::Import { path, replace } => {
            let n = import_csv(&path, inventory, replace)?;
            writeln!(out, "Imported {n} records from {}.", path.display())?;
        }
        ShellCommand::ExportCsv(path) => {
            export_csv(&path, inventory)?;
            writeln!(out, "CSV written to {}.", path.display())?;
        }
        ShellCommand::ExportTxt(path) => {
            report::export_txt(&path, inventory)?;
            writeln!(out, "TXT written to {}.", path.display())?;
        }
        ShellCommand::Undo => {
            let msg = if inventory.undo() { "Undone." } else { "Nothing to undo." };
            writeln!(out, "{msg}")?;
        }
        ShellCommand::Redo => {
            let msg = if inventory.redo() { "Redone." } else { "Nothing to redo." };
            writeln!(out, "{msg}")?;
        }
        ShellCommand::Save => {
            file.save(inventory)?;
            writeln!(out, "Saved to {}.", file.path().display())?;
        }
        ShellCommand::Help => write!(out, "{HELP}")?,
        // quit/exit end the loop in `run`
        ShellCommand::Empty | ShellCommand::Quit | ShellCommand::Exit => {}
    }
    Ok(())
}
