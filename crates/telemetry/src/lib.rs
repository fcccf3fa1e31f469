//! Logging and metrics for the catalogue search tools
//!
//! - Structured logging with tracing, compact or JSON lines
//! - In-process counters, gauges and latency windows
//! - Timers for index builds and queries

mod logging;
mod metrics;

pub use logging::{init_with_config, session_id, Event, TelemetryConfig};
pub use metrics::{
    metrics, LatencyStats, MetricsRegistry, MetricsSnapshot, Timer, LATENCY_WINDOW,
};

/// Metric names recorded by the search tools.
pub mod names {
    /// Index build latency
    pub const BUILD_LATENCY: &str = "search.build";
    /// Query round-trip latency
    pub const QUERY_LATENCY: &str = "search.query";
    /// Queries sent to the worker
    pub const SEARCHES: &str = "search.queries";
    /// Queries answered locally by the length gate
    pub const GATED: &str = "search.gated";
    /// Responses dropped as stale
    pub const STALE: &str = "search.stale_responses";
    /// Providers in the current index
    pub const PROVIDERS: &str = "index.providers";
    /// Services in the current index
    pub const SERVICES: &str = "index.services";
}
