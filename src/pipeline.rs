use chrono::{DateTime, Utc};
use log::{info, warn};
use std::time::{Duration, Instant};

use crate::config::Config;
use crate::error::Result;
use crate::ingest::{self, IngestSettings};
use crate::loader::load_export;
use crate::meta::{build_meta, write_meta, write_summary_index};
use crate::model::{IngestReport, MetaSummary};
use crate::stats::{build_item_stats, write_item_stats};
use crate::store::{archive_export, IdentityIndex, PartitionStore};
use crate::summary::{build_day_summaries, write_day_summaries, SeriesSettings};

#[derive(Debug)]
pub struct PipelineReport {
    pub ingest: IngestReport,
    pub item_count: usize,
    pub day_count: usize,
    pub indexed_dates: usize,
    pub meta: MetaSummary,
}

fn seconds(duration: Duration) -> String {
    format!("{:.2}s", duration.as_secs_f64())
}

/// Ingests the export, then rebuilds item stats, day summaries, meta and the
/// summary index from the full partition store. Any error aborts the run.
pub fn run_all(config: &Config, now: DateTime<Utc>) -> Result<PipelineReport> {
    let layout = config.layout();
    let store = PartitionStore::new(layout.partitions_dir());

    let start = Instant::now();
    info!("Reading flip export from {}", config.source_path.display());
    let text = load_export(&config.source_path)?;
    let index = IdentityIndex::load(&layout.flip_index())?;
    let settings = IngestSettings {
        challenge_start: config.challenge_start,
        time_zone: config.time_zone,
    };
    let outcome = ingest::ingest(&text, &index, &settings)?;
    if outcome.export_empty {
        warn!("No data found in flip export");
    } else {
        ingest::commit(&outcome, &store, &layout.flip_index())?;
        let run_date = now.with_timezone(&config.time_zone).date_naive();
        archive_export(&layout.raw_input_dir(), &text, run_date)?;
    }
    info!("Parsed flips in {}", seconds(start.elapsed()));

    let start = Instant::now();
    let item_stats = build_item_stats(&store.partitions()?, config.time_zone);
    write_item_stats(&layout.item_stats(), &item_stats, config.time_zone)?;
    info!("Built item stats ({} items) in {}", item_stats.len(), seconds(start.elapsed()));

    let start = Instant::now();
    let series = SeriesSettings {
        baseline_date: config.baseline_date,
        net_worth_goal: config.net_worth_goal,
        time_zone: config.time_zone,
    };
    let days = build_day_summaries(&store.partitions()?, &series);
    let day_count = write_day_summaries(&layout.daily_summary_dir(), &days)?;
    info!("Rebuilt daily summaries ({} days) in {}", day_count, seconds(start.elapsed()));

    let start = Instant::now();
    let meta = build_meta(&store.partitions()?, config.starting_cash, now);
    write_meta(&layout.meta(), &meta)?;
    let dates = write_summary_index(&layout.daily_summary_dir(), &layout.summary_index())?;
    info!("Wrote meta + summary index in {}", seconds(start.elapsed()));

    Ok(PipelineReport {
        ingest: outcome.report,
        item_count: item_stats.len(),
        day_count,
        indexed_dates: dates.len(),
        meta,
    })
}
