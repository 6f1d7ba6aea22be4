//! Date-partitioned flip storage and the identity index.
//!
//! Each closing date owns one append-only CSV at
//! `<root>/<YYYY>/<MM>/<DD>/<MM-DD-YYYY>.csv`. The identity index maps every
//! flip hash ever accepted to its partition key and only grows.

use chrono::NaiveDate;
use log::{debug, info};
use std::collections::BTreeMap;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::convert::DATE_KEY_FORMAT;
use crate::csv_codec::{self, decode_line, encode_row, Row};
use crate::error::{Error, Result};
use crate::loader::{ensure_dir, list_files, read_optional, write_json, write_text};
use crate::model::{TradeRecord, PARTITION_HEADER};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct IdentityIndex {
    entries: BTreeMap<String, String>,
}

impl IdentityIndex {
    /// Loads the index; an absent file is an empty index.
    pub fn load(path: &Path) -> Result<Self> {
        let Some(text) = read_optional(path)? else {
            info!("No existing flip index at {}, starting a new one", path.display());
            return Ok(IdentityIndex::default());
        };
        let entries = serde_json::from_str(&text).map_err(|err| Error::json(path, err))?;
        Ok(IdentityIndex { entries })
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        write_json(path, &self.entries)
    }

    pub fn insert(&mut self, flip_hash: String, date_key: String) {
        self.entries.insert(flip_hash, date_key);
    }

    pub fn get(&self, flip_hash: &str) -> Option<&str> {
        self.entries.get(flip_hash).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }
}

/// One partition file as read back for aggregation, decoded with its own header.
#[derive(Debug)]
pub struct Partition {
    pub path: PathBuf,
    pub header: Vec<String>,
    pub rows: Vec<Row>,
}

impl Partition {
    pub fn has_column(&self, name: &str) -> bool {
        self.header.iter().any(|column| column == name)
    }
}

pub struct PartitionStore {
    root: PathBuf,
}

impl PartitionStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        PartitionStore { root: root.into() }
    }

    pub fn partition_path(&self, date_key: &str) -> PathBuf {
        let file = format!("{}.csv", date_key);
        match date_key.split('-').collect::<Vec<_>>().as_slice() {
            [mm, dd, yyyy] => self.root.join(yyyy).join(mm).join(dd).join(file),
            _ => self.root.join(file),
        }
    }

    /// Header line of an existing partition, if it has one.
    fn existing_header(path: &Path) -> Result<Option<Vec<String>>> {
        let Some(text) = read_optional(path)? else {
            return Ok(None);
        };
        text.lines()
            .find(|line| !line.trim().is_empty())
            .map(decode_line)
            .transpose()
    }

    /// Appends records to a date's partition, writing the header first when
    /// the partition is new. Rows follow the partition's own header, so files
    /// written with an older column layout stay consistent. Existing rows are
    /// never rewritten.
    pub fn append(&self, date_key: &str, records: &[TradeRecord]) -> Result<PathBuf> {
        let path = self.partition_path(date_key);
        if let Some(dir) = path.parent() {
            ensure_dir(dir)?;
        }

        let mut output = String::new();
        let columns = match Self::existing_header(&path)? {
            Some(header) => header,
            None => {
                output.push_str(&encode_row(PARTITION_HEADER));
                output.push('\n');
                PARTITION_HEADER.iter().map(|column| column.to_string()).collect()
            }
        };
        for record in records {
            output.push_str(&encode_row(columns.iter().map(|column| record.value(column))));
            output.push('\n');
        }

        debug!("Writing {} records to {}", records.len(), path.display());
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(|err| Error::io(&path, err))?;
        file.write_all(output.as_bytes()).map_err(|err| Error::io(&path, err))?;

        Ok(path)
    }

    /// Every partition under the root, depth-first in path order.
    pub fn partitions(&self) -> Result<Vec<Partition>> {
        let mut partitions = Vec::new();
        for path in list_files(&self.root, "csv")? {
            let Some(text) = read_optional(&path)? else {
                continue;
            };
            let (header, rows) = csv_codec::decode(&text)?;
            if header.is_empty() {
                continue;
            }
            partitions.push(Partition { path, header, rows });
        }
        Ok(partitions)
    }
}

/// Copies the raw export to `<dir>/<MM>/<DD>/copilot-export-<MM-DD-YYYY>.csv`.
pub fn archive_export(dir: &Path, text: &str, run_date: NaiveDate) -> Result<PathBuf> {
    let path = dir
        .join(run_date.format("%m").to_string())
        .join(run_date.format("%d").to_string())
        .join(format!("copilot-export-{}.csv", run_date.format(DATE_KEY_FORMAT)));
    write_text(&path, text)?;
    info!("Archived original export to {}", path.display());
    Ok(path)
}
