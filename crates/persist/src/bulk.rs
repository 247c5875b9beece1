//! CSV bulk import/export.
//!
//! Export writes `ID,Denumire,Cantitate,Pret,Valoare`. Import skips the header
//! line, whatever it says, and reads the first four columns by position as id,
//! name, quantity and price. Any further columns (such as `Valoare`) are
//! ignored. Fields containing commas
//! or quotes are quoted on export and unquoted on import, so any name
//! round-trips.

use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;

use serde::{Deserialize, Serialize};
use stockledger_kernel::{Inventory, LedgerEvent, Record, RecordId};

use crate::error::PersistError;

/// Number of leading columns an import row is read from.
const IMPORT_COLUMNS: usize = 4;

/// id, name, quantity, unit price
#[derive(Debug, Deserialize)]
struct ImportRow(RecordId, String, i32, f64);

#[derive(Debug, Serialize)]
struct ExportRow<'a> {
    #[serde(rename = "ID")]
    id: RecordId,
    #[serde(rename = "Denumire")]
    name: &'a str,
    #[serde(rename = "Cantitate")]
    quantity: i32,
    #[serde(rename = "Pret")]
    unit_price: f64,
    #[serde(rename = "Valoare")]
    value: f64,
}

impl<'a> From<&'a Record> for ExportRow<'a> {
    fn from(r: &'a Record) -> Self {
        Self {
            id: r.id(),
            name: r.name(),
            quantity: r.quantity(),
            unit_price: r.unit_price(),
            value: r.value(),
        }
    }
}

/// Parse records from CSV text with a header line. Blank lines are skipped and
/// surrounding whitespace is trimmed from every field.
pub fn read_records<R: Read>(reader: R) -> Result<Vec<Record>, csv::Error> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let mut records = Vec::new();
    for row in reader.records() {
        let row = row?;
        let head: csv::StringRecord = row.iter().take(IMPORT_COLUMNS).collect();
        let ImportRow(id, name, quantity, unit_price) = head.deserialize::<ImportRow>(None)?;
        records.push(Record::new(id, name, quantity, unit_price));
    }
    Ok(records)
}

/// Write records as CSV, header first, including the derived value column.
pub fn write_records<'a, W, I>(writer: W, records: I) -> Result<(), csv::Error>
where
    W: Write,
    I: IntoIterator<Item = &'a Record>,
{
    let mut writer = csv::Writer::from_writer(writer);
    for record in records {
        writer.serialize(ExportRow::from(record))?;
    }
    writer.flush()?;
    Ok(())
}

/// Bulk-load a CSV file into the inventory.
///
/// The batch is all-or-nothing: a parse error or any rejected row leaves the
/// inventory as it was. Returns the number of records imported.
pub fn import_csv(
    path: impl AsRef<Path>,
    inventory: &mut Inventory,
    replace_existing: bool,
) -> Result<usize, PersistError> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|e| PersistError::io(path, e))?;
    let records = read_records(file).map_err(|e| PersistError::csv(path, e))?;
    let count = inventory.import_bulk(records, replace_existing)?;
    tracing::info!(path = %path.display(), count, replace_existing, "CSV imported");
    Ok(count)
}

/// Write the whole inventory to a CSV file.
pub fn export_csv(path: impl AsRef<Path>, inventory: &Inventory) -> Result<(), PersistError> {
    let path = path.as_ref();
    let file = File::create(path).map_err(|e| PersistError::io(path, e))?;
    write_records(file, inventory.records()).map_err(|e| PersistError::csv(path, e))?;
    tracing::info!(path = %path.display(), count = inventory.len(), "CSV exported");
    inventory.record_event(&LedgerEvent::Exported {
        target: path.display().to_string(),
        format: "CSV".into(),
    });
    Ok(())
}
