//! Fuzzy search over cloud provider catalogues.
//!
//! This crate provides:
//! - Loading catalogues of provider records from a data directory
//! - Flattening of provider records into provider and service entries
//! - Weighted, typo-tolerant approximate-match indexes
//! - Ranking with provider promotion through matching services
//! - A background worker with a stale-response-safe client
//!
//! # Example
//!
//! ```
//! use catalogue_search::{ProviderRecord, QuerySession, SearchConfig};
//!
//! let mut session = QuerySession::new(SearchConfig::default());
//! session.build(vec![
//!     ProviderRecord::new("Contoso", "CSP")
//!         .with_service("Blob Storage", ["Medium"])
//!         .with_service("Queue", ["HVA"]),
//! ]);
//!
//! let response = session.search("stor");
//! let promoted = response.results.provider_results[0].as_provider().unwrap();
//! assert_eq!(promoted.title, "Contoso");
//! assert_eq!(promoted.matched_service_count, 1);
//! ```

pub mod catalogue;
pub mod config;
mod error;
pub mod fuzzy;
pub mod index;
pub mod normalize;
pub mod protocol;
pub mod ranking;
pub mod record;
mod session;

#[cfg(feature = "worker")]
mod worker;

#[cfg(feature = "wasm")]
mod wasm;

pub use catalogue::{load_record, CatalogueSource};
pub use config::SearchConfig;
pub use error::{Result, SearchError, SearchErrorCode};
pub use index::{MatchIndex, SearchHit, WeightedField};
pub use normalize::{normalize, FlatProviderEntry, FlatServiceEntry, Normalized};
pub use protocol::{WorkerRequest, WorkerResponse};
pub use ranking::{merge, MatchReason, ProviderMatch, RankedResult, SearchResults, ServiceMatch};
pub use record::{ProviderRecord, ProviderType, References};
pub use session::{BuildSummary, QuerySession, SearchResponse, SessionState};

#[cfg(feature = "worker")]
pub use worker::{SearchClient, SearchWorker};

#[cfg(feature = "wasm")]
pub use wasm::CatalogueSearch;
