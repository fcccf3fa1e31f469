//! Messages exchanged with the search worker.
//!
//! On the wire every message is a JSON object with a `type` tag:
//!
//! | Request | Payload | Response | Payload |
//! |---|---|---|---|
//! | `build` | `providers` | `ready` | index sizes |
//! | `search` | `query` | `results` | `providerResults`, `serviceResults`, `q` |
//! | `terminate` | none | none | |

use crate::error::Result;
use crate::record::ProviderRecord;
use crate::session::{BuildSummary, SearchResponse};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;

/// A request to the worker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum WorkerRequest {
    /// Replace the indexes with a new catalogue
    Build { providers: Vec<ProviderRecord> },
    /// Answer one query
    Search { query: String },
    /// Stop the worker
    Terminate,
}

/// A response from the worker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum WorkerResponse {
    /// A build finished
    Ready(BuildSummary),
    /// A search finished
    Results(SearchResponse),
}

impl WorkerRequest {
    /// Decode a request leniently.
    ///
    /// Returns `Ok(None)` for objects with a missing or unknown `type`.
    /// Provider records that fail to decode are dropped with a warning rather
    /// than failing the whole build; a missing `providers` field builds an
    /// empty catalogue and a missing `query` searches for nothing.
    pub fn from_json(text: &str) -> Result<Option<Self>> {
        let value: Value = serde_json::from_str(text)?;
        Ok(Self::from_value(value))
    }

    /// Decode a request from an already-parsed JSON value.
    pub fn from_value(mut value: Value) -> Option<Self> {
        let kind = value.get("type").and_then(Value::as_str)?.to_owned();

        match kind.as_str() {
            "build" => {
                let providers = match value.get_mut("providers").map(Value::take) {
                    Some(Value::Array(items)) => decode_providers(items),
                    _ => Vec::new(),
                };
                Some(WorkerRequest::Build { providers })
            }
            "search" => {
                let query = value
                    .get("query")
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .to_string();
                Some(WorkerRequest::Search { query })
            }
            "terminate" => Some(WorkerRequest::Terminate),
            _ => None,
        }
    }
}

impl WorkerResponse {
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}

fn decode_providers(items: Vec<Value>) -> Vec<ProviderRecord> {
    items
        .into_iter()
        .enumerate()
        .filter_map(|(position, item)| match serde_json::from_value(item) {
            Ok(record) => Some(record),
            Err(err) => {
                warn!(position, error = %err, "Dropping malformed provider record");
                None
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SearchErrorCode;

    #[test]
    fn test_decode_build() {
        let request = WorkerRequest::from_json(
            r#"{"type":"build","providers":[{"name":"Contoso","type":"CSP"},{"name":"Fabrikam"}]}"#,
        )
        .unwrap()
        .unwrap();

        match request {
            WorkerRequest::Build { providers } => {
                assert_eq!(providers.len(), 2);
                assert_eq!(providers[0].name, "Contoso");
            }
            other => panic!("unexpected request {other:?}"),
        }
    }

    #[test]
    fn test_decode_build_drops_bad_records() {
        let request = WorkerRequest::from_json(
            r#"{"type":"build","providers":[{"name":"Good"},{"name":42},"junk"]}"#,
        )
        .unwrap()
        .unwrap();

        assert_eq!(
            request,
            WorkerRequest::Build { providers: vec![ProviderRecord::new("Good", "")] }
        );
    }

    #[test]
    fn test_decode_build_keeps_records_with_stray_tags() {
        let request = WorkerRequest::from_json(
            r#"{"type":"build","providers":[{"name":"Contoso","underlyingCSP":["Azure",null]}]}"#,
        )
        .unwrap()
        .unwrap();

        assert_eq!(
            request,
            WorkerRequest::Build {
                providers: vec![ProviderRecord::new("Contoso", "").with_underlying("Azure")]
            }
        );
    }

    #[test]
    fn test_decode_build_without_providers() {
        let request = WorkerRequest::from_json(r#"{"type":"build"}"#).unwrap();
        assert_eq!(request, Some(WorkerRequest::Build { providers: Vec::new() }));
    }

    #[test]
    fn test_decode_search() {
        let request = WorkerRequest::from_json(r#"{"type":"search","query":"stor"}"#).unwrap();
        assert_eq!(request, Some(WorkerRequest::Search { query: "stor".into() }));

        let request = WorkerRequest::from_json(r#"{"type":"search"}"#).unwrap();
        assert_eq!(request, Some(WorkerRequest::Search { query: String::new() }));
    }

    #[test]
    fn test_unknown_type_ignored() {
        assert_eq!(WorkerRequest::from_json(r#"{"type":"reindex"}"#).unwrap(), None);
        assert_eq!(WorkerRequest::from_json(r#"{"query":"x"}"#).unwrap(), None);
        assert_eq!(WorkerRequest::from_json("[1,2,3]").unwrap(), None);
    }

    #[test]
    fn test_invalid_json_is_error() {
        let err = WorkerRequest::from_json("{not json").unwrap_err();
        assert_eq!(err.code(), SearchErrorCode::InvalidMessage);
    }

    #[test]
    fn test_response_json_shape() {
        let ready = WorkerResponse::Ready(BuildSummary { providers: 2, services: 5 });
        assert_eq!(ready.to_json().unwrap(), r#"{"type":"ready","providers":2,"services":5}"#);

        let results = WorkerResponse::Results(SearchResponse::empty("ac"));
        let value: Value = serde_json::from_str(&results.to_json().unwrap()).unwrap();
        assert_eq!(value["type"], "results");
        assert_eq!(value["q"], "ac");
        assert_eq!(value["providerResults"], serde_json::json!([]));
    }
}
