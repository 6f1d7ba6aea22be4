use chrono::{DateTime, SecondsFormat, Utc};
use std::fs;
use std::io::ErrorKind;
use std::path::Path;

use crate::convert::{parse_date_key, parse_number};
use crate::error::{Error, Result};
use crate::loader::write_json;
use crate::model::MetaSummary;
use crate::store::Partition;

/// Global totals over every stored flip. Files without a `profit` column
/// are left out entirely.
pub fn build_meta(partitions: &[Partition], starting_cash: f64, now: DateTime<Utc>) -> MetaSummary {
    let mut total_flip_count = 0;
    let mut total_profit = 0.0;

    for partition in partitions.iter().filter(|p| p.has_column("profit")) {
        for row in &partition.rows {
            total_profit += parse_number(row.get("profit").map(String::as_str));
            total_flip_count += 1;
        }
    }

    MetaSummary {
        last_updated: now.to_rfc3339_opts(SecondsFormat::Millis, true),
        total_flip_count,
        total_profit,
        net_worth: total_profit + starting_cash,
    }
}

pub fn write_meta(path: &Path, meta: &MetaSummary) -> Result<()> {
    write_json(path, meta)
}

/// Date keys of the day summaries present in `dir`, oldest first.
pub fn list_summary_dates(dir: &Path) -> Result<Vec<String>> {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(err) if err.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
        Err(err) => return Err(Error::io(dir, err)),
    };

    let mut dates = Vec::new();
    for entry in entries {
        let path = entry.map_err(|err| Error::io(dir, err))?.path();
        if !path.is_file() {
            continue;
        }
        let is_json = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
        if let (true, Some(stem)) = (is_json, path.file_stem().and_then(|s| s.to_str())) {
            dates.push(stem.to_string());
        }
    }

    // unparseable names sort after every real date
    dates.sort_by_key(|key| (parse_date_key(key).is_none(), parse_date_key(key), key.clone()));
    Ok(dates)
}

pub fn write_summary_index(summary_dir: &Path, index_path: &Path) -> Result<Vec<String>> {
    let dates = list_summary_dates(summary_dir)?;
    write_json(index_path, &dates)?;
    Ok(dates)
}
