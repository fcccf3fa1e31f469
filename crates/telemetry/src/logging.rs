//! Subscriber setup and structured events

use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};
use uuid::Uuid;

/// Identifies one process run in logs and metric snapshots.
static SESSION_ID: Lazy<String> = Lazy::new(|| Uuid::new_v4().to_string());

/// Logging setup for a tool run
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TelemetryConfig {
    /// Filter directive used when `RUST_LOG` is unset
    pub log_level: String,
    /// Emit one JSON object per log line
    pub json: bool,
    pub show_target: bool,
    /// The search worker thread is named, so this tells it apart from the caller
    pub show_thread_names: bool,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            log_level: "warn".to_string(),
            json: false,
            show_target: false,
            show_thread_names: false,
        }
    }
}

impl TelemetryConfig {
    /// Config for a CLI verbosity count (`-v`, `-vv`, ...)
    pub fn for_verbosity(verbose: u8) -> Self {
        let log_level = match verbose {
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace",
        };
        Self {
            log_level: log_level.to_string(),
            show_thread_names: verbose >= 2,
            ..Self::default()
        }
    }
}

/// Install the global subscriber. Logs go to stderr so stdout stays clean
/// for results.
///
/// `RUST_LOG` takes precedence over `log_level` when set. Fails if a
/// subscriber is already installed.
pub fn init_with_config(config: TelemetryConfig) -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.log_level));
    let registry = tracing_subscriber::registry().with(filter);

    let installed = if config.json {
        let layer = fmt::layer()
            .json()
            .with_writer(std::io::stderr)
            .with_target(config.show_target)
            .with_thread_names(config.show_thread_names);
        registry.with(layer).try_init()
    } else {
        let layer = fmt::layer()
            .compact()
            .with_writer(std::io::stderr)
            .with_target(config.show_target)
            .with_thread_names(config.show_thread_names);
        registry.with(layer).try_init()
    };
    installed.map_err(|e| anyhow::anyhow!("Failed to install tracing subscriber: {e}"))?;

    tracing::debug!(
        session_id = %session_id(),
        version = env!("CARGO_PKG_VERSION"),
        json = config.json,
        "Telemetry initialized"
    );
    Ok(())
}

/// The current process's session ID
pub fn session_id() -> &'static str {
    &SESSION_ID
}

/// A one-off structured event, such as a catalogue finishing loading
#[derive(Debug, Serialize)]
pub struct Event {
    pub at: DateTime<Utc>,
    pub session_id: &'static str,
    pub kind: &'static str,
    pub fields: serde_json::Value,
}

impl Event {
    pub fn new(kind: &'static str, fields: serde_json::Value) -> Self {
        Self { at: Utc::now(), session_id: session_id(), kind, fields }
    }

    /// Emit the event at info level
    pub fn log(&self) {
        tracing::info!(
            event = self.kind,
            at = %self.at.to_rfc3339(),
            fields = %self.fields,
            "Event"
        );
    }
}
