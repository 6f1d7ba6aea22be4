//! Runtime configuration from environment variables.

use chrono::{DateTime, FixedOffset, NaiveDate};
use chrono_tz::Tz;
use std::env;
use std::path::{Path, PathBuf};

use crate::convert::parse_date_key;
use crate::error::{Error, Result};

#[derive(Debug, Clone)]
pub struct Config {
    /// Flip export to ingest
    pub source_path: PathBuf,

    /// Root of processed partitions, index and outputs
    pub data_dir: PathBuf,

    /// Flips closed strictly before this instant are ignored
    pub challenge_start: DateTime<FixedOffset>,

    /// Day 0 of the net-worth series
    pub baseline_date: NaiveDate,

    pub net_worth_goal: f64,
    pub starting_cash: f64,

    /// IANA zone of the trader's calendar day
    pub time_zone: Tz,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            source_path: PathBuf::from("flips.csv"),
            data_dir: PathBuf::from("data"),
            challenge_start: DateTime::parse_from_rfc3339("2025-07-28T05:00:00Z")
                .expect("Invalid default challenge start"),
            baseline_date: NaiveDate::from_ymd_opt(2025, 7, 27).expect("Invalid default baseline date"),
            net_worth_goal: 2_147_000_000.0,
            starting_cash: 1_000.0,
            time_zone: chrono_tz::America::Chicago,
        }
    }
}

fn var(name: &str) -> Option<String> {
    env::var(name).ok().filter(|value| !value.trim().is_empty())
}

fn invalid(name: &str, value: &str) -> Error {
    Error::InvalidConfig(format!("{}={}", name, value))
}

impl Config {
    /// Load configuration from environment variables
    ///
    /// Environment variables:
    /// - `FLIPS_CSV_PATH` (default: flips.csv)
    /// - `FLIP_DATA_DIR` (default: data)
    /// - `CHALLENGE_START` RFC 3339 (default: 2025-07-28T05:00:00Z)
    /// - `BASELINE_DATE` MM-DD-YYYY (default: 07-27-2025)
    /// - `NET_WORTH_GOAL` (default: 2147000000)
    /// - `STARTING_CASH` (default: 1000)
    /// - `FLIP_TIME_ZONE` IANA name (default: America/Chicago)
    pub fn from_env() -> Result<Self> {
        let mut config = Config::default();

        if let Some(path) = var("FLIPS_CSV_PATH") {
            config.source_path = PathBuf::from(path);
        }
        if let Some(dir) = var("FLIP_DATA_DIR") {
            config.data_dir = PathBuf::from(dir);
        }
        if let Some(raw) = var("CHALLENGE_START") {
            config.challenge_start =
                DateTime::parse_from_rfc3339(raw.trim()).map_err(|_| invalid("CHALLENGE_START", &raw))?;
        }
        if let Some(raw) = var("BASELINE_DATE") {
            config.baseline_date = parse_date_key(raw.trim()).ok_or_else(|| invalid("BASELINE_DATE", &raw))?;
        }
        if let Some(raw) = var("NET_WORTH_GOAL") {
            config.net_worth_goal = raw
                .trim()
                .parse::<f64>()
                .ok()
                .filter(|goal| *goal > 0.0)
                .ok_or_else(|| invalid("NET_WORTH_GOAL", &raw))?;
        }
        if let Some(raw) = var("STARTING_CASH") {
            config.starting_cash = raw.trim().parse().map_err(|_| invalid("STARTING_CASH", &raw))?;
        }
        if let Some(raw) = var("FLIP_TIME_ZONE") {
            config.time_zone = raw.trim().parse::<Tz>().map_err(|_| invalid("FLIP_TIME_ZONE", &raw))?;
        }

        Ok(config)
    }

    pub fn layout(&self) -> DataLayout {
        DataLayout::new(&self.data_dir)
    }
}

/// Where everything lives under the data root.
#[derive(Debug, Clone)]
pub struct DataLayout {
    root: PathBuf,
}

impl DataLayout {
    pub fn new(root: impl AsRef<Path>) -> Self {
        DataLayout {
            root: root.as_ref().to_path_buf(),
        }
    }

    pub fn partitions_dir(&self) -> PathBuf {
        self.root.join("processed-flips")
    }

    pub fn flip_index(&self) -> PathBuf {
        self.root.join("flip-index.json")
    }

    pub fn raw_input_dir(&self) -> PathBuf {
        self.root.join("raw-input")
    }

    pub fn item_stats(&self) -> PathBuf {
        self.root.join("item-stats.csv")
    }

    pub fn daily_summary_dir(&self) -> PathBuf {
        self.root.join("daily-summary")
    }

    pub fn meta(&self) -> PathBuf {
        self.root.join("meta.json")
    }

    pub fn summary_index(&self) -> PathBuf {
        self.root.join("summary-index.json")
    }
}
