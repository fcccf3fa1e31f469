//! Search configuration.
//!
//! Every tunable of the index, ranker and session lives here with defaults
//! matching the catalogue browser's behaviour. A TOML file can override any
//! subset of them:
//!
//! ```toml
//! [index]
//! threshold = 0.2
//!
//! [index.provider_weights]
//! name = 1.0
//!
//! [ranking]
//! promotion_score = 0.5
//! ```

use crate::error::{Result, SearchError};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Maximum provider hits taken from the provider index per query.
pub const PROVIDER_HIT_LIMIT: usize = 8;
/// Maximum service hits taken from the service index per query.
pub const SERVICE_HIT_LIMIT: usize = 24;
/// Maximum provider results returned to the caller.
pub const PROVIDER_RESULT_LIMIT: usize = 8;
/// Maximum service results returned to the caller.
pub const SERVICE_RESULT_LIMIT: usize = 16;
/// Score given to providers surfaced only through matching services.
pub const PROMOTION_SCORE: f64 = 0.6;
/// Largest tolerated ratio of edit errors to query length.
pub const MATCH_THRESHOLD: f64 = 0.15;
/// Queries shorter than this (after trimming) never reach the index.
pub const MIN_QUERY_CHARS: usize = 2;
/// Caller-side quiet period before a keystroke turns into a search.
pub const DEBOUNCE_MS: u64 = 80;

/// Root search configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct SearchConfig {
    #[serde(default)]
    pub index: IndexConfig,

    #[serde(default)]
    pub ranking: RankingConfig,

    #[serde(default)]
    pub session: SessionConfig,
}

/// Approximate-match index configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexConfig {
    /// Largest tolerated `errors / query length` for a field to match
    #[serde(default = "default_threshold")]
    pub threshold: f64,

    /// Hits kept from the provider index
    #[serde(default = "default_provider_hit_limit")]
    pub provider_hit_limit: usize,

    /// Hits kept from the service index
    #[serde(default = "default_service_hit_limit")]
    pub service_hit_limit: usize,

    #[serde(default)]
    pub provider_weights: ProviderWeights,

    #[serde(default)]
    pub service_weights: ServiceWeights,
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            threshold: default_threshold(),
            provider_hit_limit: default_provider_hit_limit(),
            service_hit_limit: default_service_hit_limit(),
            provider_weights: ProviderWeights::default(),
            service_weights: ServiceWeights::default(),
        }
    }
}

/// Field weights for the provider index
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ProviderWeights {
    #[serde(default = "default_name_weight")]
    pub name: f64,

    #[serde(default = "default_minor_weight", rename = "type")]
    pub provider_type: f64,

    #[serde(default = "default_minor_weight")]
    pub underlying_csp: f64,
}

impl Default for ProviderWeights {
    fn default() -> Self {
        Self {
            name: default_name_weight(),
            provider_type: default_minor_weight(),
            underlying_csp: default_minor_weight(),
        }
    }
}

/// Field weights for the service index
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ServiceWeights {
    #[serde(default = "default_name_weight")]
    pub title: f64,

    #[serde(default = "default_provider_name_weight")]
    pub provider_name: f64,
}

impl Default for ServiceWeights {
    fn default() -> Self {
        Self {
            title: default_name_weight(),
            provider_name: default_provider_name_weight(),
        }
    }
}

/// Result merger configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankingConfig {
    #[serde(default = "default_promotion_score")]
    pub promotion_score: f64,

    #[serde(default = "default_provider_result_limit")]
    pub provider_result_limit: usize,

    #[serde(default = "default_service_result_limit")]
    pub service_result_limit: usize,
}

impl Default for RankingConfig {
    fn default() -> Self {
        Self {
            promotion_score: default_promotion_score(),
            provider_result_limit: default_provider_result_limit(),
            service_result_limit: default_service_result_limit(),
        }
    }
}

/// Query session configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionConfig {
    #[serde(default = "default_min_query_chars")]
    pub min_query_chars: usize,

    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            min_query_chars: default_min_query_chars(),
            debounce_ms: default_debounce_ms(),
        }
    }
}

impl SessionConfig {
    /// Debounce interval as a duration
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }
}

fn default_threshold() -> f64 {
    MATCH_THRESHOLD
}

fn default_provider_hit_limit() -> usize {
    PROVIDER_HIT_LIMIT
}

fn default_service_hit_limit() -> usize {
    SERVICE_HIT_LIMIT
}

fn default_name_weight() -> f64 {
    0.9
}

fn default_minor_weight() -> f64 {
    0.2
}

fn default_provider_name_weight() -> f64 {
    0.3
}

fn default_promotion_score() -> f64 {
    PROMOTION_SCORE
}

fn default_provider_result_limit() -> usize {
    PROVIDER_RESULT_LIMIT
}

fn default_service_result_limit() -> usize {
    SERVICE_RESULT_LIMIT
}

fn default_min_query_chars() -> usize {
    MIN_QUERY_CHARS
}

fn default_debounce_ms() -> u64 {
    DEBOUNCE_MS
}

impl SearchConfig {
    /// Load configuration from a file path, a standard location, or defaults
    pub fn load(path: Option<&str>) -> Result<Self> {
        let config_path = path.map(String::from).or_else(find_config_file);

        let config = match config_path {
            Some(ref p) => load_config_file(p)?,
            None => Self::default(),
        };

        config.validate()?;
        Ok(config)
    }

    /// Parse configuration from TOML text
    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content).map_err(|source| SearchError::ConfigParse {
            path: "<inline>".to_string(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values the index and ranker cannot work with
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.index.threshold) {
            return Err(SearchError::InvalidConfig(format!(
                "index.threshold must be within 0..=1, got {}",
                self.index.threshold
            )));
        }

        let p = &self.index.provider_weights;
        check_weights("index.provider_weights", &[p.name, p.provider_type, p.underlying_csp])?;
        let s = &self.index.service_weights;
        check_weights("index.service_weights", &[s.title, s.provider_name])?;

        if !self.ranking.promotion_score.is_finite() || self.ranking.promotion_score < 0.0 {
            return Err(SearchError::InvalidConfig(format!(
                "ranking.promotion_score must be a non-negative number, got {}",
                self.ranking.promotion_score
            )));
        }

        Ok(())
    }
}

fn check_weights(section: &str, weights: &[f64]) -> Result<()> {
    if weights.iter().any(|w| !w.is_finite() || *w < 0.0) {
        return Err(SearchError::InvalidConfig(format!(
            "{section} must be non-negative numbers"
        )));
    }
    if weights.iter().sum::<f64>() <= 0.0 {
        return Err(SearchError::InvalidConfig(format!(
            "{section} must contain at least one positive weight"
        )));
    }
    Ok(())
}

/// Find configuration file in standard locations
fn find_config_file() -> Option<String> {
    let candidates = [
        ".catalogue-search.toml",
        "catalogue-search.toml",
        ".config/catalogue-search.toml",
    ];

    candidates
        .into_iter()
        .find(|candidate| Path::new(candidate).exists())
        .map(String::from)
}

/// Load and parse a TOML configuration file
fn load_config_file(path: &str) -> Result<SearchConfig> {
    let content = std::fs::read_to_string(path).map_err(|source| SearchError::ConfigRead {
        path: path.to_string(),
        source,
    })?;

    toml::from_str(&content).map_err(|source| SearchError::ConfigParse {
        path: path.to_string(),
        source,
    })
}
