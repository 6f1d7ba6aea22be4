mod config;
mod convert;
mod csv_codec;
mod error;
mod identity;
mod ingest;
mod loader;
mod meta;
mod model;
mod pipeline;
mod stats;
mod store;
mod summary;

use chrono::Utc;
use config::Config;
use dotenv::dotenv;
use log::{error, info};

fn main() {
    dotenv().ok();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    info!("Starting flip tracker pipeline");

    let result = Config::from_env().and_then(|config| pipeline::run_all(&config, Utc::now()));
    let report = match result {
        Ok(report) => report,
        Err(err) => {
            error!("{}", err);
            std::process::exit(1);
        }
    };

    info!("Pipeline complete:");
    info!("  New flips: {} ({} already recorded)", report.ingest.accepted, report.ingest.duplicates);
    info!(
        "  Skipped: {} deleted, {} before challenge start, {} not yet closed",
        report.ingest.skipped_deleted, report.ingest.skipped_before_cutoff, report.ingest.skipped_unclosed
    );
    info!("  Dates with new flips: {}", report.ingest.dates_touched);
    info!("  Total flips processed: {}", report.meta.total_flip_count);
    info!("  Total profit: {} GP", report.meta.total_profit);
    info!("  Current net worth: {} GP", report.meta.net_worth);
    info!("  Item stats count: {}", report.item_count);
    info!("  Daily summaries written: {} ({} indexed)", report.day_count, report.indexed_dates);
    info!("  Last updated: {}", report.meta.last_updated);
}
