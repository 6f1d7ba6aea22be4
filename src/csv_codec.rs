//! Quote-aware CSV reading and writing shared by the ingestor, the partition
//! store and every aggregator.
//!
//! Reading goes through the `csv` crate in flexible mode so that partitions
//! written by older runs (different column counts) still decode. Rows are
//! mapped onto the header by position: missing trailing cells become empty
//! strings and extra cells are dropped.

use crate::error::Result;
use csv::{ReaderBuilder, StringRecord};
use std::collections::BTreeMap;

/// One decoded data line keyed by header column.
pub type Row = BTreeMap<String, String>;

fn reader(text: &str) -> csv::Reader<&[u8]> {
    ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(text.as_bytes())
}

// A whitespace-only line comes back as a single blank cell.
fn is_blank(record: &StringRecord) -> bool {
    record.len() <= 1 && record.iter().all(|cell| cell.trim().is_empty())
}

fn to_row(header: &[String], record: &StringRecord) -> Row {
    header
        .iter()
        .enumerate()
        .map(|(i, name)| (name.clone(), record.get(i).unwrap_or("").to_string()))
        .collect()
}

/// Decodes a whole CSV document. The first non-blank line is the header.
pub fn decode(text: &str) -> Result<(Vec<String>, Vec<Row>)> {
    let mut records = reader(text).into_records();

    let header: Vec<String> = loop {
        match records.next() {
            None => return Ok((Vec::new(), Vec::new())),
            Some(record) => {
                let record = record?;
                if !is_blank(&record) {
                    break record.iter().map(str::to_string).collect();
                }
            }
        }
    };

    let mut rows = Vec::new();
    for record in records {
        let record = record?;
        if is_blank(&record) {
            continue;
        }
        rows.push(to_row(&header, &record));
    }

    Ok((header, rows))
}

/// Splits one logical line into its cells. `""` inside a quoted cell is an
/// escaped quote, and quoted cells may span line breaks.
pub fn decode_line(line: &str) -> Result<Vec<String>> {
    match reader(line).records().next() {
        Some(record) => Ok(record?.iter().map(str::to_string).collect()),
        None => Ok(vec![String::new()]),
    }
}

/// Quotes a cell only when it holds a comma, a quote or a line break.
pub fn encode_cell(value: &str) -> String {
    if value.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

/// Encodes cells into one CSV line, without the trailing newline.
pub fn encode_row<I, S>(cells: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    cells
        .into_iter()
        .map(|cell| encode_cell(cell.as_ref()))
        .collect::<Vec<_>>()
        .join(",")
}
