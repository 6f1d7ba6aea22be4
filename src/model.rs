use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};

use crate::convert::format_number;

/// Column order of every partition file.
pub const PARTITION_HEADER: [&str; 13] = [
    "account_id",
    "item_name",
    "status",
    "opened_quantity",
    "spent",
    "closed_quantity",
    "received_post_tax",
    "tax_paid",
    "profit",
    "opened_time",
    "closed_time",
    "updated_time",
    "flip_hash",
];

/// One completed flip as stored in a partition.
#[derive(Debug, Clone, PartialEq)]
pub struct TradeRecord {
    pub account_id: String,
    pub item_name: String,
    pub status: String,

    pub opened_quantity: f64,
    pub spent: f64,
    pub closed_quantity: f64,
    pub received_post_tax: f64,
    pub tax_paid: f64,
    pub profit: f64,

    pub opened_time: String,
    pub closed_time: String,
    pub updated_time: String,

    pub flip_hash: String,
}

impl TradeRecord {
    /// Cell for a partition column; columns this record doesn't carry are empty.
    pub fn value(&self, column: &str) -> String {
        match column {
            "account_id" => self.account_id.clone(),
            "item_name" => self.item_name.clone(),
            "status" => self.status.clone(),
            "opened_quantity" => format_number(self.opened_quantity),
            "spent" => format_number(self.spent),
            "closed_quantity" => format_number(self.closed_quantity),
            "received_post_tax" => format_number(self.received_post_tax),
            "tax_paid" => format_number(self.tax_paid),
            "profit" => format_number(self.profit),
            "opened_time" => self.opened_time.clone(),
            "closed_time" => self.closed_time.clone(),
            "updated_time" => self.updated_time.clone(),
            "flip_hash" => self.flip_hash.clone(),
            _ => String::new(),
        }
    }
}

/// Lifetime totals for one item name.
#[derive(Debug, Clone)]
pub struct ItemStats {
    pub item_name: String,
    pub flips: u64,
    pub total_profit: f64,
    pub total_spent: f64,
    pub last_flipped: Option<DateTime<FixedOffset>>,
}

impl ItemStats {
    pub fn new(item_name: &str) -> Self {
        ItemStats {
            item_name: item_name.to_string(),
            flips: 0,
            total_profit: 0.0,
            total_spent: 0.0,
            last_flipped: None,
        }
    }

    pub fn roi_percent(&self) -> f64 {
        if self.total_spent == 0.0 {
            0.0
        } else {
            (self.total_profit / self.total_spent) * 100.0
        }
    }

    pub fn avg_profit_per_flip(&self) -> f64 {
        if self.flips == 0 {
            0.0
        } else {
            self.total_profit / self.flips as f64
        }
    }
}

/// One day of the net-worth series, as written to `daily-summary/<date>.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DaySummary {
    pub date: String,
    #[serde(rename = "day")]
    pub day_offset: i64,
    #[serde(rename = "flips")]
    pub flip_count: u64,
    #[serde(rename = "items_flipped")]
    pub distinct_item_count: usize,
    pub profit: f64,
    pub gp_per_day: f64,
    pub roi_percent: f64,
    #[serde(rename = "net_worth")]
    pub running_net_worth: f64,
    pub percent_to_goal: f64,
    pub percent_change: f64,
}

/// Global totals written to `meta.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetaSummary {
    pub last_updated: String,
    #[serde(rename = "total_flips")]
    pub total_flip_count: u64,
    pub total_profit: f64,
    pub net_worth: f64,
}

/// What one ingest pass did with the export rows.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IngestReport {
    pub accepted: usize,
    pub duplicates: usize,
    pub skipped_deleted: usize,
    pub skipped_before_cutoff: usize,
    /// Rows with no readable closing time (still open)
    pub skipped_unclosed: usize,
    pub dates_touched: usize,
}
