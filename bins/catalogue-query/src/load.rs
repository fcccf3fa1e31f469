//! Catalogue loading with progress output

use anyhow::{bail, Context, Result};
use catalogue_cli::output::{format_count, Status};
use catalogue_cli::progress;
use catalogue_search::{load_record, CatalogueSource, ProviderRecord};
use catalogue_telemetry::Event;
use std::path::Path;
use tracing::warn;

/// Load every readable record in `dir`.
///
/// Unreadable or malformed files are skipped with a warning. A directory
/// with no record files at all is an error.
pub fn load_catalogue(dir: &Path, quiet: bool) -> Result<Vec<ProviderRecord>> {
    let source = CatalogueSource::open(dir)
        .with_context(|| format!("Failed to open catalogue at {}", dir.display()))?;
    if source.is_empty() {
        bail!("No provider files found in {}", dir.display());
    }

    let pb = if quiet {
        progress::hidden()
    } else {
        progress::file_progress(source.len() as u64)
    };

    let mut records = Vec::with_capacity(source.len());
    let mut skipped = 0;
    for path in source.files() {
        if let Some(name) = path.file_name() {
            pb.set_message(name.to_string_lossy().into_owned());
        }
        match load_record(path) {
            Ok(record) => records.push(record),
            Err(err) => {
                warn!(error = %err, code = err.code() as u32, "Skipping catalogue file");
                skipped += 1;
            }
        }
        pb.inc(1);
    }

    progress::finish_success(
        &pb,
        &format!("Loaded {}", format_count(records.len(), "provider", "providers")),
    );
    if skipped > 0 && !quiet {
        Status::warning(&format!(
            "Skipped {}",
            format_count(skipped, "unreadable file", "unreadable files")
        ));
    }

    Event::new(
        "catalogue_loaded",
        serde_json::json!({
            "root": source.root().display().to_string(),
            "manifest": source.has_manifest(),
            "providers": records.len(),
            "skipped": skipped,
        }),
    )
    .log();

    Ok(records)
}
