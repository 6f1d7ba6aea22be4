//! Turns a raw flip export into new, deduplicated, date-grouped trade records.

use chrono::{DateTime, FixedOffset};
use chrono_tz::Tz;
use log::{debug, info};
use std::collections::BTreeMap;
use std::path::Path;

use crate::convert::{date_key, parse_number, parse_timestamp};
use crate::csv_codec::{self, Row};
use crate::error::{Error, Result};
use crate::identity::{compute_flip_hash, FlipIdentity};
use crate::model::{IngestReport, TradeRecord};
use crate::store::{IdentityIndex, PartitionStore};

const DEFAULT_ACCOUNT: &str = "default";

#[derive(Debug, Clone)]
pub struct IngestSettings {
    pub challenge_start: DateTime<FixedOffset>,
    pub time_zone: Tz,
}

#[derive(Debug)]
pub struct IngestOutcome {
    /// New records grouped by `MM-DD-YYYY` closing date
    pub batches: BTreeMap<String, Vec<TradeRecord>>,
    /// Index including every hash accepted by this pass
    pub index: IdentityIndex,
    pub report: IngestReport,
    /// The export had no header line at all
    pub export_empty: bool,
}

fn cell<'a>(row: &'a Row, column: &str) -> &'a str {
    row.get(column).map(String::as_str).unwrap_or("")
}

fn number(row: &Row, column: &str) -> f64 {
    parse_number(row.get(column).map(String::as_str))
}

fn render(row: &Row) -> String {
    serde_json::to_string(row).unwrap_or_else(|_| format!("{:?}", row))
}

/// Filters, validates and deduplicates export rows against `index`.
///
/// Nothing is written here; a malformed row fails the whole pass before any
/// partition or index change can happen.
pub fn ingest(text: &str, index: &IdentityIndex, settings: &IngestSettings) -> Result<IngestOutcome> {
    let (header, rows) = csv_codec::decode(text)?;
    let mut index = index.clone();
    let mut batches: BTreeMap<String, Vec<TradeRecord>> = BTreeMap::new();
    let mut report = IngestReport::default();

    if header.is_empty() {
        return Ok(IngestOutcome {
            batches,
            index,
            report,
            export_empty: true,
        });
    }
    debug!("Parsed {} export rows, columns: {}", rows.len(), header.join(", "));

    for row in &rows {
        if cell(row, "deleted").trim().eq_ignore_ascii_case("true") {
            debug!("Skipping deleted flip: {}", cell(row, "Item"));
            report.skipped_deleted += 1;
            continue;
        }

        let account_id = match cell(row, "Account") {
            "" => DEFAULT_ACCOUNT,
            account => account,
        };
        let item_name = cell(row, "Item").trim();
        let status = cell(row, "Status");
        let opened_quantity = number(row, "Bought");
        let closed_quantity = number(row, "Sold");
        let avg_buy_price = number(row, "Avg. buy price");
        let avg_sell_price = number(row, "Avg. sell price");
        let tax_paid = number(row, "Tax");
        let profit = number(row, "Profit");
        let opened_time = cell(row, "First buy time");
        let closed_time = cell(row, "Last sell time");

        let closed_at = parse_timestamp(closed_time, settings.time_zone);
        if closed_at.is_some_and(|ts| ts < settings.challenge_start) {
            debug!("Skipping flip before challenge start: {}", item_name);
            report.skipped_before_cutoff += 1;
            continue;
        }

        if item_name.is_empty() || (opened_time.trim().is_empty() && closed_time.trim().is_empty()) {
            return Err(Error::MalformedRow { row: render(row) });
        }
        let Some(closed_at) = closed_at else {
            debug!("Skipping unclosed flip: {}", item_name);
            report.skipped_unclosed += 1;
            continue;
        };

        let spent = opened_quantity * avg_buy_price;
        let received_post_tax = closed_quantity * avg_sell_price - tax_paid;

        let flip_hash = compute_flip_hash(&FlipIdentity {
            account_id,
            item_name,
            status,
            closed_quantity,
            received_post_tax,
            tax_paid,
            profit,
            closed_time,
        });

        if let Some(recorded) = index.get(&flip_hash) {
            debug!("Skipping flip already recorded on {}: {}", recorded, item_name);
            report.duplicates += 1;
            continue;
        }

        let closed_date = date_key(&closed_at, settings.time_zone);
        batches.entry(closed_date.clone()).or_default().push(TradeRecord {
            account_id: account_id.to_string(),
            item_name: item_name.to_string(),
            status: status.to_string(),
            opened_quantity,
            spent,
            closed_quantity,
            received_post_tax,
            tax_paid,
            profit,
            opened_time: opened_time.to_string(),
            closed_time: closed_time.to_string(),
            updated_time: closed_time.to_string(),
            flip_hash: flip_hash.clone(),
        });
        index.insert(flip_hash, closed_date);
        report.accepted += 1;
    }

    report.dates_touched = batches.len();
    info!(
        "Processed {} new flips, skipped {} existing, {} dates with new flips",
        report.accepted, report.duplicates, report.dates_touched
    );

    Ok(IngestOutcome {
        batches,
        index,
        report,
        export_empty: false,
    })
}

/// Appends every batch to its partition, then persists the index. The index
/// is written last so it never names a flip missing from the partitions.
pub fn commit(outcome: &IngestOutcome, store: &PartitionStore, index_path: &Path) -> Result<()> {
    for (date, records) in &outcome.batches {
        store.append(date, records)?;
    }
    outcome.index.save(index_path)?;
    info!("Updated flip index with {} total flips", outcome.index.len());
    Ok(())
}
