//! In-process metrics
//!
//! Counters and gauges are lock-free after first use. Latencies keep a
//! sliding window of the most recent samples so long interactive sessions
//! stay bounded; the total count covers every sample ever recorded.

use crate::logging::session_id;
use once_cell::sync::Lazy;
use serde::Serialize;
use std::collections::{BTreeMap, VecDeque};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::{Duration, Instant};

/// Samples retained per latency metric
pub const LATENCY_WINDOW: usize = 4096;

static METRICS: Lazy<MetricsRegistry> = Lazy::new(MetricsRegistry::new);

/// The process-wide registry
pub fn metrics() -> &'static MetricsRegistry {
    &METRICS
}

#[derive(Debug, Default)]
struct LatencyWindow {
    recent_us: VecDeque<u64>,
    total: u64,
}

impl LatencyWindow {
    fn push(&mut self, micros: u64) {
        if self.recent_us.len() == LATENCY_WINDOW {
            self.recent_us.pop_front();
        }
        self.recent_us.push_back(micros);
        self.total += 1;
    }
}

/// Named counters, gauges and latency windows
#[derive(Debug)]
pub struct MetricsRegistry {
    counters: RwLock<BTreeMap<&'static str, AtomicU64>>,
    gauges: RwLock<BTreeMap<&'static str, AtomicU64>>,
    latencies: Mutex<BTreeMap<&'static str, LatencyWindow>>,
    started: Instant,
}

impl MetricsRegistry {
    pub fn new() -> Self {
        Self {
            counters: RwLock::new(BTreeMap::new()),
            gauges: RwLock::new(BTreeMap::new()),
            latencies: Mutex::new(BTreeMap::new()),
            started: Instant::now(),
        }
    }

    pub fn increment(&self, name: &'static str) {
        self.increment_by(name, 1);
    }

    pub fn increment_by(&self, name: &'static str, value: u64) {
        if let Some(counter) = read(&self.counters).get(name) {
            counter.fetch_add(value, Ordering::Relaxed);
            return;
        }
        write(&self.counters)
            .entry(name)
            .or_default()
            .fetch_add(value, Ordering::Relaxed);
    }

    /// Set a gauge, replacing its previous value
    pub fn gauge(&self, name: &'static str, value: u64) {
        if let Some(gauge) = read(&self.gauges).get(name) {
            gauge.store(value, Ordering::Relaxed);
            return;
        }
        write(&self.gauges).entry(name).or_default().store(value, Ordering::Relaxed);
    }

    /// Record one latency sample
    pub fn record_latency(&self, name: &'static str, elapsed: Duration) {
        let micros = u64::try_from(elapsed.as_micros()).unwrap_or(u64::MAX);
        lock(&self.latencies).entry(name).or_default().push(micros);
    }

    /// Zero if the counter was never incremented
    pub fn counter_value(&self, name: &str) -> u64 {
        read(&self.counters)
            .get(name)
            .map_or(0, |c| c.load(Ordering::Relaxed))
    }

    pub fn gauge_value(&self, name: &str) -> Option<u64> {
        read(&self.gauges).get(name).map(|g| g.load(Ordering::Relaxed))
    }

    pub fn latency(&self, name: &str) -> Option<LatencyStats> {
        lock(&self.latencies).get(name).map(LatencyStats::from_window)
    }

    /// Point-in-time copy of every metric
    pub fn snapshot(&self) -> MetricsSnapshot {
        let load = |map: &BTreeMap<&'static str, AtomicU64>| -> BTreeMap<String, u64> {
            map.iter()
                .map(|(name, value)| (name.to_string(), value.load(Ordering::Relaxed)))
                .collect()
        };

        MetricsSnapshot {
            session_id: session_id().to_string(),
            uptime_ms: u64::try_from(self.started.elapsed().as_millis()).unwrap_or(u64::MAX),
            counters: load(&read(&self.counters)),
            gauges: load(&read(&self.gauges)),
            latencies: lock(&self.latencies)
                .iter()
                .map(|(name, window)| (name.to_string(), LatencyStats::from_window(window)))
                .collect(),
        }
    }
}

impl Default for MetricsRegistry {
    fn default() -> Self {
        Self::new()
    }
}

// Metric maps hold plain numbers, so a poisoned lock is still consistent.
fn read<T>(lock: &RwLock<T>) -> RwLockReadGuard<'_, T> {
    lock.read().unwrap_or_else(|e| e.into_inner())
}

fn write<T>(lock: &RwLock<T>) -> RwLockWriteGuard<'_, T> {
    lock.write().unwrap_or_else(|e| e.into_inner())
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|e| e.into_inner())
}

/// Everything the registry holds, ready to serialize
#[derive(Debug, Clone, Serialize)]
pub struct MetricsSnapshot {
    pub session_id: String,
    pub uptime_ms: u64,
    pub counters: BTreeMap<String, u64>,
    pub gauges: BTreeMap<String, u64>,
    pub latencies: BTreeMap<String, LatencyStats>,
}

/// Summary of one latency window, in microseconds
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct LatencyStats {
    /// Samples ever recorded, including ones that left the window
    pub count: u64,
    pub min_us: u64,
    pub max_us: u64,
    pub mean_us: f64,
    pub p50_us: u64,
    pub p95_us: u64,
}

impl LatencyStats {
    fn from_window(window: &LatencyWindow) -> Self {
        let mut sorted: Vec<u64> = window.recent_us.iter().copied().collect();
        if sorted.is_empty() {
            return Self { count: window.total, ..Self::default() };
        }
        sorted.sort_unstable();

        let rank = |p: f64| {
            let idx = (p * (sorted.len() - 1) as f64).round() as usize;
            sorted[idx.min(sorted.len() - 1)]
        };
        let sum: u64 = sorted.iter().sum();

        Self {
            count: window.total,
            min_us: sorted[0],
            max_us: sorted[sorted.len() - 1],
            mean_us: sum as f64 / sorted.len() as f64,
            p50_us: rank(0.50),
            p95_us: rank(0.95),
        }
    }
}

/// Measures one operation into a latency metric
///
/// Records once, on [`stop`](Timer::stop) or on drop, whichever comes first.
#[derive(Debug)]
pub struct Timer {
    name: &'static str,
    started: Instant,
    recorded: bool,
}

impl Timer {
    pub fn start(name: &'static str) -> Self {
        Self { name, started: Instant::now(), recorded: false }
    }

    /// Record and return the elapsed time
    pub fn stop(mut self) -> Duration {
        self.record()
    }

    fn record(&mut self) -> Duration {
        let elapsed = self.started.elapsed();
        if !self.recorded {
            self.recorded = true;
            metrics().record_latency(self.name, elapsed);
            tracing::trace!(metric = self.name, elapsed_us = elapsed.as_micros() as u64, "Timer");
        }
        elapsed
    }
}

impl Drop for Timer {
    fn drop(&mut self) {
        self.record();
    }
}
