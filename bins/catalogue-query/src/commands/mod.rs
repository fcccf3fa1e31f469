//! CLI command implementations

pub mod interactive;
pub mod search;
pub mod summary;

use crate::load::load_catalogue;
use anyhow::{bail, Result};
use catalogue_cli::output::{format_count, format_duration};
use catalogue_cli::progress;
use catalogue_search::{BuildSummary, SearchConfig, SearchWorker, WorkerResponse};
use catalogue_telemetry::{metrics, names, Timer};
use std::path::Path;

/// Load the catalogue, start a worker and wait until its index is ready.
pub async fn start_worker(
    data: &Path,
    config: SearchConfig,
    quiet: bool,
) -> Result<(SearchWorker, BuildSummary)> {
    let records = load_catalogue(data, quiet)?;
    let mut worker = SearchWorker::spawn(config)?;

    let pb = if quiet {
        progress::hidden()
    } else {
        progress::spinner("Building search index...")
    };
    let timer = Timer::start(names::BUILD_LATENCY);
    worker.client().build(records)?;

    let summary = loop {
        match worker.recv().await {
            Some(WorkerResponse::Ready(summary)) => break summary,
            Some(WorkerResponse::Results(_)) => continue,
            None => {
                progress::finish_error(&pb, "Search worker stopped");
                bail!("Search worker stopped before the index was built");
            }
        }
    };
    let elapsed = timer.stop();

    metrics().gauge(names::PROVIDERS, summary.providers as u64);
    metrics().gauge(names::SERVICES, summary.services as u64);
    progress::finish_success(
        &pb,
        &format!(
            "Indexed {} and {} in {}",
            format_count(summary.providers, "provider", "providers"),
            format_count(summary.services, "service", "services"),
            format_duration(elapsed)
        ),
    );

    Ok((worker, summary))
}
