//! Interactive command - answer queries read from stdin
//!
//! Lines are issued as soon as they arrive. A response is printed only if it
//! still answers the latest line; anything older is dropped as stale.

use anyhow::{Context, Result};
use catalogue_cli::output::{print_response, Status};
use catalogue_search::{SearchConfig, WorkerResponse};
use catalogue_telemetry::{metrics, names};
use std::io::{BufRead, IsTerminal};
use std::path::Path;
use tokio::sync::mpsc;
use tracing::debug;

/// Run interactive command
pub async fn run(data: &Path, config: Option<&str>, json: bool) -> Result<()> {
    let config = SearchConfig::load(config).context("Failed to load search configuration")?;
    let min_chars = config.session.min_query_chars;
    let (mut worker, _) = super::start_worker(data, config, json).await?;
    let client = worker.client();

    let interactive = std::io::stdin().is_terminal();
    if interactive && !json {
        Status::info("Type a query and press enter. Ctrl-D quits.");
    }

    let mut lines = spawn_stdin_reader();
    let mut input_done = false;
    // The latest query is waiting on the worker
    let mut pending = false;

    loop {
        tokio::select! {
            line = lines.recv(), if !input_done => match line {
                Some(line) if line.trim().is_empty() => {}
                Some(line) => match client.search(&line)? {
                    Some(_) => {
                        metrics().increment(names::GATED);
                        pending = false;
                        if !json {
                            Status::warning(&format!("Queries need at least {min_chars} characters"));
                        }
                    }
                    None => {
                        metrics().increment(names::SEARCHES);
                        pending = true;
                    }
                },
                None => input_done = true,
            },
            response = worker.recv(), if pending => match response {
                Some(WorkerResponse::Results(response)) => match client.accept(response) {
                    Some(response) => {
                        pending = false;
                        if json {
                            println!("{}", serde_json::to_string(&response)?);
                        } else {
                            print_response(&response);
                            println!();
                        }
                    }
                    None => metrics().increment(names::STALE),
                },
                Some(WorkerResponse::Ready(_)) => {}
                None => break,
            },
            else => break,
        }
    }

    debug!(
        searches = metrics().counter_value(names::SEARCHES),
        stale = metrics().counter_value(names::STALE),
        "Interactive session finished"
    );
    worker.terminate();
    Ok(())
}

/// Forward stdin lines to the async loop from a plain thread.
fn spawn_stdin_reader() -> mpsc::UnboundedReceiver<String> {
    let (tx, rx) = mpsc::unbounded_channel();
    std::thread::spawn(move || {
        let stdin = std::io::stdin();
        for line in stdin.lock().lines().map_while(|line| line.ok()) {
            if tx.send(line).is_err() {
                break;
            }
        }
    });
    rx
}
