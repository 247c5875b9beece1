//! Binary record codec.
//!
//! Each record is laid out back to back with no header, padding or count,
//! all integers little-endian:
//! ```text
//! id          i32   4 bytes
//! name_len    u32   4 bytes   UTF-8 byte length of name
//! name        [u8]  name_len bytes, no terminator
//! quantity    i32   4 bytes
//! unit_price  f64   8 bytes   IEEE-754
//! ```
//! A stream ends cleanly only at a record boundary.

use std::io::{self, ErrorKind, Read, Write};

use stockledger_common::Record;

/// Errors from decoding a record stream.
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("record {record} truncated while reading {field}")]
    Truncated { record: usize, field: &'static str },
    #[error("record {record} has a name that is not valid UTF-8")]
    InvalidName { record: usize },
}

/// Write one record to `sink`. Any write failure is returned as-is.
pub fn encode_record<W: Write>(sink: &mut W, record: &Record) -> io::Result<()> {
    let name = record.name().as_bytes();
    let len = u32::try_from(name.len()).map_err(|_| {
        io::Error::new(
            ErrorKind::InvalidInput,
            format!("name of record {} is too long to encode", record.id()),
        )
    })?;
    sink.write_all(&record.id().to_le_bytes())?;
    sink.write_all(&len.to_le_bytes())?;
    sink.write_all(name)?;
    sink.write_all(&record.quantity().to_le_bytes())?;
    sink.write_all(&record.unit_price().to_le_bytes())?;
    Ok(())
}

/// Write every record in order.
pub fn encode_records<'a, W, I>(sink: &mut W, records: I) -> io::Result<()>
where
    W: Write,
    I: IntoIterator<Item = &'a Record>,
{
    for record in records {
        encode_record(sink, record)?;
    }
    Ok(())
}

/// Encode records into a fresh buffer.
pub fn encode_to_vec(records: &[Record]) -> io::Result<Vec<u8>> {
    let mut buf = Vec::new();
    encode_records(&mut buf, records)?;
    Ok(buf)
}

/// Read one record. Returns `Ok(None)` on a clean end of stream.
pub fn decode_record<R: Read>(source: &mut R, index: usize) -> Result<Option<Record>, CodecError> {
    let mut id_buf = [0u8; 4];
    if !read_or_eof(source, &mut id_buf, index, "id")? {
        return Ok(None);
    }
    let id = i32::from_le_bytes(id_buf);

    let mut len_buf = [0u8; 4];
    read_field(source, &mut len_buf, index, "name length")?;
    let len = u32::from_le_bytes(len_buf);

    // bounded read so a corrupt length cannot force a huge allocation
    let mut name_bytes = Vec::new();
    source
        .by_ref()
        .take(u64::from(len))
        .read_to_end(&mut name_bytes)?;
    if name_bytes.len() != len as usize {
        return Err(CodecError::Truncated {
            record: index,
            field: "name",
        });
    }
    let name = String::from_utf8(name_bytes).map_err(|_| CodecError::InvalidName { record: index })?;

    let mut qty_buf = [0u8; 4];
    read_field(source, &mut qty_buf, index, "quantity")?;
    let mut price_buf = [0u8; 8];
    read_field(source, &mut price_buf, index, "unit price")?;

    Ok(Some(Record::new(
        id,
        name,
        i32::from_le_bytes(qty_buf),
        f64::from_le_bytes(price_buf),
    )))
}

/// Read records until a clean end of stream. Any malformed record fails the
/// whole decode.
pub fn decode_records<R: Read>(source: &mut R) -> Result<Vec<Record>, CodecError> {
    let mut records = Vec::new();
    while let Some(record) = decode_record(source, records.len())? {
        records.push(record);
    }
    Ok(records)
}

fn read_field<R: Read>(
    source: &mut R,
    buf: &mut [u8],
    record: usize,
    field: &'static str,
) -> Result<(), CodecError> {
    source.read_exact(buf).map_err(|e| match e.kind() {
        ErrorKind::UnexpectedEof => CodecError::Truncated { record, field },
        _ => CodecError::Io(e),
    })
}

/// Fill `buf` completely, or report `false` if the stream was already at EOF.
/// A partial fill is a truncation.
fn read_or_eof<R: Read>(
    source: &mut R,
    buf: &mut [u8],
    record: usize,
    field: &'static str,
) -> Result<bool, CodecError> {
    let mut filled = 0;
    while filled < buf.len() {
        match source.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(CodecError::Io(e)),
        }
    }
    match filled {
        0 => Ok(false),
        n if n == buf.len() => Ok(true),
        _ => Err(CodecError::Truncated { record, field }),
    }
}
