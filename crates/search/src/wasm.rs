//! WASM bindings for the catalogue search.
//!
//! Mirrors the worker protocol for use inside a browser web worker: the
//! page posts JSON messages, the worker script hands them to
//! [`CatalogueSearch::handle_message`] and posts back whatever comes out.

use crate::protocol::{WorkerRequest, WorkerResponse};
use crate::session::{QuerySession, SearchResponse};
use crate::SearchConfig;
use wasm_bindgen::prelude::*;

/// A search session owned by JavaScript.
#[wasm_bindgen]
pub struct CatalogueSearch {
    session: QuerySession,
}

#[wasm_bindgen]
impl CatalogueSearch {
    /// Creates a session with default settings.
    #[wasm_bindgen(constructor)]
    pub fn new() -> CatalogueSearch {
        CatalogueSearch { session: QuerySession::new(SearchConfig::default()) }
    }

    /// Creates a session from a TOML configuration string.
    ///
    /// Falls back to defaults if the configuration is invalid.
    #[wasm_bindgen(js_name = withConfig)]
    pub fn with_config(config_toml: &str) -> CatalogueSearch {
        let config = SearchConfig::from_toml(config_toml).unwrap_or_default();
        CatalogueSearch { session: QuerySession::new(config) }
    }

    /// Rebuilds the indexes from a JSON array of provider records.
    ///
    /// # Returns
    /// Number of providers indexed (records without a name are skipped)
    pub fn build(&mut self, providers_json: &str) -> usize {
        let providers = serde_json::from_str(providers_json).unwrap_or(serde_json::Value::Null);
        match WorkerRequest::from_value(serde_json::json!({ "type": "build", "providers": providers })) {
            Some(WorkerRequest::Build { providers }) => self.session.build(providers).providers,
            _ => self.session.build(Vec::new()).providers,
        }
    }

    /// Runs a query and returns the `results` message as JSON.
    pub fn search(&self, query: &str) -> String {
        let response = self.session.search(query);
        WorkerResponse::Results(response)
            .to_json()
            .unwrap_or_else(|_| empty_results_json(query))
    }

    /// Handles one protocol message.
    ///
    /// # Returns
    /// The JSON response, or an empty string for messages that have none
    #[wasm_bindgen(js_name = handleMessage)]
    pub fn handle_message(&mut self, message_json: &str) -> String {
        let response = match WorkerRequest::from_json(message_json) {
            Ok(Some(WorkerRequest::Build { providers })) => {
                WorkerResponse::Ready(self.session.build(providers))
            }
            Ok(Some(WorkerRequest::Search { query })) => {
                WorkerResponse::Results(self.session.search(&query))
            }
            Ok(Some(WorkerRequest::Terminate)) | Ok(None) | Err(_) => return String::new(),
        };
        response.to_json().unwrap_or_default()
    }
}

impl Default for CatalogueSearch {
    fn default() -> Self {
        Self::new()
    }
}

fn empty_results_json(query: &str) -> String {
    WorkerResponse::Results(SearchResponse::empty(query.trim()))
        .to_json()
        .unwrap_or_else(|_| r#"{"type":"results","providerResults":[],"serviceResults":[],"q":""}"#.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    const CATALOGUE: &str = r#"[
        {"name": "Acme Cloud", "type": "CSP", "servicesInScope": {"Object Storage": ["Medium"]}},
        {"name": "Contoso", "type": "CSP", "servicesInScope": {"Queue": ["HVA"]}}
    ]"#;

    #[test]
    fn test_handle_message_build_then_search() {
        let mut search = CatalogueSearch::new();
        let build = format!(r#"{{"type": "build", "providers": {CATALOGUE}}}"#);

        let ready: serde_json::Value =
            serde_json::from_str(&search.handle_message(&build)).unwrap();
        assert_eq!(ready["type"], "ready");
        assert_eq!(ready["providers"], 2);

        let results: serde_json::Value =
            serde_json::from_str(&search.handle_message(r#"{"type": "search", "query": " acme "}"#))
                .unwrap();
        assert_eq!(results["type"], "results");
        assert_eq!(results["q"], "acme");
        assert_eq!(results["providerResults"][0]["title"], "Acme Cloud");
    }

    #[test]
    fn test_handle_message_without_reply() {
        let mut search = CatalogueSearch::new();
        assert!(search.handle_message(r#"{"type": "terminate"}"#).is_empty());
        assert!(search.handle_message(r#"{"type": "bogus"}"#).is_empty());
        assert!(search.handle_message("not json").is_empty());
    }

    #[test]
    fn test_build_and_search_direct() {
        let mut search = CatalogueSearch::new();
        assert_eq!(search.build(CATALOGUE), 2);
        assert_eq!(search.build("garbage"), 0);

        let results: serde_json::Value = serde_json::from_str(&search.search("a")).unwrap();
        assert_eq!(results["providerResults"].as_array().map(Vec::len), Some(0));
    }
}
