//! Query session: owns both indexes and answers searches.

use crate::config::SearchConfig;
use crate::index::MatchIndex;
use crate::normalize::{normalize, FlatProviderEntry, FlatServiceEntry};
use crate::ranking::{merge, SearchResults};
use crate::record::ProviderRecord;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Elapsed time for log fields.
///
/// `std::time::Instant` panics on wasm32-unknown-unknown, so browser builds
/// report zero instead.
#[derive(Debug, Clone, Copy)]
struct Stopwatch {
    #[cfg(not(target_arch = "wasm32"))]
    started: std::time::Instant,
}

impl Stopwatch {
    fn start() -> Self {
        Self {
            #[cfg(not(target_arch = "wasm32"))]
            started: std::time::Instant::now(),
        }
    }

    #[cfg(not(target_arch = "wasm32"))]
    fn elapsed_us(&self) -> u64 {
        self.started.elapsed().as_micros() as u64
    }

    #[cfg(target_arch = "wasm32")]
    fn elapsed_us(&self) -> u64 {
        0
    }
}

/// Lifecycle of a session's indexes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionState {
    /// Nothing built yet; every search is empty
    Empty,
    /// Indexes built and ready for queries
    Ready,
}

/// Sizes of the indexes produced by one build.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct BuildSummary {
    pub providers: usize,
    pub services: usize,
}

/// Results for one query, tagged with the query they answer.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResponse {
    #[serde(flatten)]
    pub results: SearchResults,
    /// The trimmed query that produced these results
    pub q: String,
}

impl SearchResponse {
    /// An empty answer for `query`.
    pub fn empty(query: impl Into<String>) -> Self {
        Self { results: SearchResults::default(), q: query.into() }
    }
}

/// Owns the provider and service indexes for one catalogue.
///
/// A build replaces both indexes wholesale. Searches borrow the session
/// immutably and keep no state between calls, so any number of them can run
/// back to back without a debounce.
#[derive(Debug)]
pub struct QuerySession {
    config: SearchConfig,
    providers: MatchIndex<FlatProviderEntry>,
    services: MatchIndex<FlatServiceEntry>,
}

impl QuerySession {
    pub fn new(config: SearchConfig) -> Self {
        let index = &config.index;
        let providers = MatchIndex::new(
            FlatProviderEntry::fields(&index.provider_weights),
            index.threshold,
            index.provider_hit_limit,
        );
        let services = MatchIndex::new(
            FlatServiceEntry::fields(&index.service_weights),
            index.threshold,
            index.service_hit_limit,
        );

        Self { config, providers, services }
    }

    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    pub fn state(&self) -> SessionState {
        if self.providers.is_built() {
            SessionState::Ready
        } else {
            SessionState::Empty
        }
    }

    /// Sizes of the current indexes.
    pub fn summary(&self) -> BuildSummary {
        BuildSummary { providers: self.providers.len(), services: self.services.len() }
    }

    /// Rebuild both indexes from a catalogue, discarding the previous ones.
    pub fn build<I>(&mut self, records: I) -> BuildSummary
    where
        I: IntoIterator<Item = ProviderRecord>,
    {
        let started = Stopwatch::start();
        let flat = normalize(records);

        self.providers.build(flat.providers);
        self.services.build(flat.services);

        let summary = self.summary();
        info!(
            providers = summary.providers,
            services = summary.services,
            elapsed_us = started.elapsed_us(),
            "Search indexes built"
        );
        summary
    }

    /// Whether a query is long enough to reach the indexes.
    pub fn accepts(&self, query: &str) -> bool {
        query.trim().chars().count() >= self.config.session.min_query_chars
    }

    /// Run one query against both indexes.
    ///
    /// Queries shorter than the minimum length, and any query before the
    /// first build, answer with empty lists.
    pub fn search(&self, query: &str) -> SearchResponse {
        let q = query.trim();
        if !self.accepts(q) || self.state() == SessionState::Empty {
            return SearchResponse::empty(q);
        }

        let started = Stopwatch::start();
        let provider_hits = self.providers.query(q);
        let service_hits = self.services.query(q);
        let results = merge(&provider_hits, &service_hits, &self.config.ranking);

        debug!(
            query = q,
            provider_hits = provider_hits.len(),
            service_hits = service_hits.len(),
            providers = results.provider_results.len(),
            services = results.service_results.len(),
            elapsed_us = started.elapsed_us(),
            "Search completed"
        );

        SearchResponse { results, q: q.to_string() }
    }
}

impl Default for QuerySession {
    fn default() -> Self {
        Self::new(SearchConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalogue() -> Vec<ProviderRecord> {
        vec![
            ProviderRecord::new("Contoso", "CSP")
                .with_service("Blob Storage", ["Medium"])
                .with_service("Queue", ["HVA"]),
            ProviderRecord::new("Fabrikam", "SaaS").with_service("Payroll", ["Medium"]),
        ]
    }

    #[test]
    fn test_empty_before_build() {
        let session = QuerySession::default();
        assert_eq!(session.state(), SessionState::Empty);
        let response = session.search("contoso");
        assert!(response.results.is_empty());
        assert_eq!(response.q, "contoso");
    }

    #[test]
    fn test_build_transitions_to_ready() {
        let mut session = QuerySession::default();
        let summary = session.build(catalogue());
        assert_eq!(session.state(), SessionState::Ready);
        assert_eq!(summary, BuildSummary { providers: 2, services: 3 });
    }

    #[test]
    fn test_short_query_gated() {
        let mut session = QuerySession::default();
        session.build(catalogue());
        for q in ["", " ", "c", "  q  "] {
            let response = session.search(q);
            assert!(response.results.is_empty(), "query {q:?} should be gated");
            assert_eq!(response.q, q.trim());
        }
    }

    #[test]
    fn test_query_echo_is_trimmed() {
        let mut session = QuerySession::default();
        session.build(catalogue());
        let response = session.search("  payroll ");
        assert_eq!(response.q, "payroll");
        assert_eq!(response.results.service_results.len(), 1);
    }

    #[test]
    fn test_rebuild_discards_previous_catalogue() {
        let mut session = QuerySession::default();
        session.build(catalogue());
        session.build(vec![ProviderRecord::new("Northwind", "CSP")]);

        assert!(session.search("contoso").results.is_empty());
        assert_eq!(session.search("northwind").results.provider_results.len(), 1);
        assert_eq!(session.summary(), BuildSummary { providers: 1, services: 0 });
    }

    #[test]
    fn test_response_serialized_shape() {
        let mut session = QuerySession::default();
        session.build(catalogue());
        let json = serde_json::to_value(session.search("queue")).unwrap();
        assert_eq!(json["q"], "queue");
        assert!(json["providerResults"].is_array());
        assert!(json["serviceResults"].is_array());
    }
}
