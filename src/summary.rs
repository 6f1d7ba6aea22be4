//! Per-day rollups and the running net-worth series.
//!
//! The whole series is refolded from the partitions on every run, starting
//! from an all-zero baseline day, so each day's `net_worth` is the sum of all
//! profit up to and including it.

use chrono::NaiveDate;
use chrono_tz::Tz;
use log::{info, warn};
use std::collections::{HashMap, HashSet};
use std::path::Path;

use crate::convert::{date_key, parse_date_key, parse_number, parse_timestamp, DATE_KEY_FORMAT};
use crate::error::Result;
use crate::loader::{list_files, remove_file, write_json};
use crate::model::DaySummary;
use crate::store::Partition;

#[derive(Debug, Clone)]
pub struct SeriesSettings {
    pub baseline_date: NaiveDate,
    pub net_worth_goal: f64,
    pub time_zone: Tz,
}

#[derive(Default)]
struct DayTotals {
    flips: u64,
    total_profit: f64,
    total_spent: f64,
    items: HashSet<String>,
}

pub fn build_day_summaries(partitions: &[Partition], settings: &SeriesSettings) -> Vec<DaySummary> {
    let mut by_date: HashMap<String, DayTotals> = HashMap::new();
    by_date.insert(
        settings.baseline_date.format(DATE_KEY_FORMAT).to_string(),
        DayTotals::default(),
    );

    for partition in partitions {
        for row in &partition.rows {
            let closed_time = row.get("closed_time").map(String::as_str).unwrap_or("");
            let Some(closed) = parse_timestamp(closed_time, settings.time_zone) else {
                warn!(
                    "Skipping flip with unreadable closing time '{}' in {}",
                    closed_time,
                    partition.path.display()
                );
                continue;
            };

            let day = by_date
                .entry(date_key(&closed, settings.time_zone))
                .or_default();
            day.flips += 1;
            day.total_profit += parse_number(row.get("profit").map(String::as_str));
            day.total_spent += parse_number(row.get("spent").map(String::as_str));

            let item_name = row.get("item_name").map(|name| name.trim()).unwrap_or("");
            if !item_name.is_empty() {
                day.items.insert(item_name.to_string());
            }
        }
    }

    let mut days: Vec<(NaiveDate, String, DayTotals)> = by_date
        .into_iter()
        .filter_map(|(key, totals)| parse_date_key(&key).map(|date| (date, key, totals)))
        .collect();
    days.sort_by_key(|(date, _, _)| *date);

    let mut summaries = Vec::with_capacity(days.len());
    let mut running_net_worth = 0.0;
    let mut previous_net_worth = 0.0;

    for (date, key, totals) in days {
        running_net_worth += totals.total_profit;

        let roi_percent = if totals.total_spent == 0.0 {
            0.0
        } else {
            (totals.total_profit / totals.total_spent) * 100.0
        };
        let percent_change = if previous_net_worth == 0.0 {
            0.0
        } else {
            ((running_net_worth - previous_net_worth) / previous_net_worth) * 100.0
        };

        summaries.push(DaySummary {
            date: key,
            day_offset: (date - settings.baseline_date).num_days(),
            flip_count: totals.flips,
            distinct_item_count: totals.items.len(),
            profit: totals.total_profit,
            gp_per_day: totals.total_profit,
            roi_percent,
            running_net_worth,
            percent_to_goal: (running_net_worth / settings.net_worth_goal) * 100.0,
            percent_change,
        });

        previous_net_worth = running_net_worth;
    }

    summaries
}

/// Writes one `<MM-DD-YYYY>.json` per day so a failed write leaves the
/// other days intact, then removes summaries of days no longer in the series.
pub fn write_day_summaries(dir: &Path, summaries: &[DaySummary]) -> Result<usize> {
    let mut current = HashSet::new();
    for summary in summaries {
        let file_name = format!("{}.json", summary.date);
        write_json(&dir.join(&file_name), summary)?;
        current.insert(file_name);
    }

    for path in list_files(dir, "json")? {
        let stale = path.parent() == Some(dir)
            && path
                .file_name()
                .and_then(|name| name.to_str())
                .is_some_and(|name| !current.contains(name));
        if stale {
            info!("Removing stale daily summary {}", path.display());
            remove_file(&path)?;
        }
    }

    Ok(summaries.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::csv_codec::decode;
    use std::path::PathBuf;
    use tempfile::tempdir;

    fn settings() -> SeriesSettings {
        SeriesSettings {
            baseline_date: NaiveDate::from_ymd_opt(2025, 7, 27).unwrap(),
            net_worth_goal: 2_147_000_000.0,
            time_zone: chrono_tz::America::Chicago,
        }
    }

    fn partition(text: &str) -> Partition {
        let (header, rows) = decode(text).unwrap();
        Partition {
            path: PathBuf::from("test.csv"),
            header,
            rows,
        }
    }

    #[test]
    fn baseline_day_is_always_present() {
        let summaries = build_day_summaries(&[], &settings());

        assert_eq!(summaries.len(), 1);
        let baseline = &summaries[0];
        assert_eq!(baseline.date, "07-27-2025");
        assert_eq!(baseline.day_offset, 0);
        assert_eq!(baseline.flip_count, 0);
        assert_eq!(baseline.running_net_worth, 0.0);
        assert_eq!(baseline.percent_change, 0.0);
    }

    #[test]
    fn first_real_day_after_zero_baseline() {
        let partitions = [partition(
            "item_name,spent,profit,closed_time\nRune Scimitar,10000,500,2025-08-01T12:00:00Z\n",
        )];
        let summaries = build_day_summaries(&partitions, &settings());

        assert_eq!(summaries.len(), 2);
        let day = &summaries[1];
        assert_eq!(day.date, "08-01-2025");
        assert_eq!(day.day_offset, 5);
        assert_eq!(day.flip_count, 1);
        assert_eq!(day.distinct_item_count, 1);
        assert_eq!(day.profit, 500.0);
        assert_eq!(day.gp_per_day, 500.0);
        assert_eq!(day.roi_percent, 5.0);
        assert_eq!(day.running_net_worth, 500.0);
        assert_eq!(day.percent_change, 0.0);
        assert_eq!(day.percent_to_goal, 500.0 / 2_147_000_000.0 * 100.0);
    }

    #[test]
    fn series_runs_in_calendar_order() {
        let partitions = [
            partition("item_name,spent,profit,closed_time\nCoal,0,250,2026-01-01T12:00:00Z\n"),
            partition(
                "item_name,spent,profit,closed_time\n\
                 Feather,0,300,2025-12-31T12:00:00Z\n\
                 Feather,0,100,2025-12-31T13:00:00Z\n\
                 ,0,100,2025-12-31T14:00:00Z\n",
            ),
        ];
        let summaries = build_day_summaries(&partitions, &settings());

        let dates: Vec<_> = summaries.iter().map(|s| s.date.as_str()).collect();
        assert_eq!(dates, vec!["07-27-2025", "12-31-2025", "01-01-2026"]);

        let eve = &summaries[1];
        assert_eq!(eve.flip_count, 3);
        assert_eq!(eve.distinct_item_count, 1);
        assert_eq!(eve.running_net_worth, 500.0);
        assert_eq!(eve.percent_change, 0.0);

        let new_year = &summaries[2];
        assert_eq!(new_year.day_offset, 158);
        assert_eq!(new_year.running_net_worth, 750.0);
        assert_eq!(new_year.percent_change, 50.0);
    }

    #[test]
    fn flips_on_the_baseline_date_fold_into_it() {
        let partitions = [partition(
            "item_name,spent,profit,closed_time\nCoal,0,40,2025-07-27T18:00:00Z\n",
        )];
        let summaries = build_day_summaries(&partitions, &settings());

        assert_eq!(summaries.len(), 1);
        assert_eq!(summaries[0].flip_count, 1);
        assert_eq!(summaries[0].running_net_worth, 40.0);
    }

    #[test]
    fn writes_one_file_per_day_with_dashboard_keys() {
        let dir = tempdir().unwrap();
        let partitions = [partition(
            "item_name,spent,profit,closed_time\nRune Scimitar,10000,500,2025-08-01T12:00:00Z\n",
        )];
        let summaries = build_day_summaries(&partitions, &settings());

        assert_eq!(write_day_summaries(dir.path(), &summaries).unwrap(), 2);

        let text = std::fs::read_to_string(dir.path().join("08-01-2025.json")).unwrap();
        let value: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(value["day"], 5);
        assert_eq!(value["flips"], 1);
        assert_eq!(value["items_flipped"], 1);
        assert_eq!(value["net_worth"], 500.0);
        assert!(dir.path().join("07-27-2025.json").exists());
    }

    #[test]
    fn days_that_left_the_series_are_removed() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("08-09-2025.json"), "{}").unwrap();
        std::fs::write(dir.path().join("notes.txt"), "keep").unwrap();

        let summaries = build_day_summaries(&[], &settings());
        assert_eq!(write_day_summaries(dir.path(), &summaries).unwrap(), 1);

        assert!(!dir.path().join("08-09-2025.json").exists());
        assert!(dir.path().join("07-27-2025.json").exists());
        assert!(dir.path().join("notes.txt").exists());
    }
}
