use chrono_tz::Tz;
use std::collections::HashMap;
use std::path::Path;

use crate::convert::{date_key, format_number, parse_number, parse_timestamp};
use crate::csv_codec::encode_row;
use crate::error::Result;
use crate::loader::write_text;
use crate::model::ItemStats;
use crate::store::Partition;

pub const ITEM_STATS_HEADER: [&str; 7] = [
    "item_name",
    "flips",
    "total_profit",
    "total_spent",
    "roi_percent",
    "avg_profit_per_flip",
    "last_flipped",
];

/// Folds every stored flip into lifetime totals per item, most profitable first.
pub fn build_item_stats(partitions: &[Partition], tz: Tz) -> Vec<ItemStats> {
    let mut positions: HashMap<String, usize> = HashMap::new();
    let mut results: Vec<ItemStats> = Vec::new();

    for partition in partitions {
        for row in &partition.rows {
            let item_name = row.get("item_name").map(|name| name.trim()).unwrap_or("");
            if item_name.is_empty() {
                continue;
            }

            let idx = *positions.entry(item_name.to_string()).or_insert_with(|| {
                results.push(ItemStats::new(item_name));
                results.len() - 1
            });
            let stats = &mut results[idx];

            stats.flips += 1;
            stats.total_profit += parse_number(row.get("profit").map(String::as_str));
            stats.total_spent += parse_number(row.get("spent").map(String::as_str));

            // ties keep the first one seen
            let closed = row
                .get("closed_time")
                .and_then(|raw| parse_timestamp(raw, tz));
            if let Some(closed) = closed {
                if stats.last_flipped.map_or(true, |last| closed > last) {
                    stats.last_flipped = Some(closed);
                }
            }
        }
    }

    results.sort_by(|a, b| b.total_profit.total_cmp(&a.total_profit));
    results
}

pub fn render_item_stats(stats: &[ItemStats], tz: Tz) -> String {
    let mut output = encode_row(ITEM_STATS_HEADER);
    output.push('\n');

    for stat in stats {
        let last_flipped = stat
            .last_flipped
            .map(|ts| date_key(&ts, tz))
            .unwrap_or_default();
        output.push_str(&encode_row([
            stat.item_name.clone(),
            stat.flips.to_string(),
            format_number(stat.total_profit),
            format_number(stat.total_spent),
            format_number(stat.roi_percent()),
            format_number(stat.avg_profit_per_flip()),
            last_flipped,
        ]));
        output.push('\n');
    }

    output
}

pub fn write_item_stats(path: &Path, stats: &[ItemStats], tz: Tz) -> Result<()> {
    write_text(path, &render_item_stats(stats, tz))
}
