//! Search command - run one query against a catalogue

use anyhow::{Context, Result};
use catalogue_cli::output::{format_duration, print_response, Status};
use catalogue_search::SearchConfig;
use catalogue_telemetry::{metrics, names, Timer};
use std::path::Path;
use tracing::debug;

/// Run search command
pub async fn run(query: &str, data: &Path, config: Option<&str>, json: bool) -> Result<()> {
    let config = SearchConfig::load(config).context("Failed to load search configuration")?;
    let min_chars = config.session.min_query_chars;
    let (mut worker, _) = super::start_worker(data, config, json).await?;
    let client = worker.client();

    let timer = Timer::start(names::QUERY_LATENCY);
    let (response, gated) = match client.search(query)? {
        Some(response) => {
            metrics().increment(names::GATED);
            (response, true)
        }
        None => {
            metrics().increment(names::SEARCHES);
            let response = worker
                .next_results()
                .await
                .context("Search worker stopped before answering")?;
            (response, false)
        }
    };
    let elapsed = timer.stop();
    worker.terminate();

    debug!(q = %response.q, elapsed_us = elapsed.as_micros() as u64, "Search answered");

    if json {
        println!("{}", serde_json::to_string_pretty(&response)?);
        return Ok(());
    }

    if gated {
        Status::warning(&format!("Queries need at least {min_chars} characters"));
        return Ok(());
    }

    print_response(&response);
    println!();
    Status::info(&format!("Answered in {}", format_duration(elapsed)));
    Ok(())
}
