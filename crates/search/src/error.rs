//! Error types for the search crate.

use thiserror::Error;

/// Result type alias for search operations.
pub type Result<T> = std::result::Result<T, SearchError>;

/// Errors that can occur around the search subsystem.
///
/// Querying itself never fails: an unbuilt index, an empty query or a query
/// with no matches all produce empty result lists. These variants cover the
/// edges: decoding protocol messages, loading configuration or catalogue
/// files, and talking to the worker.
#[derive(Debug, Error)]
pub enum SearchError {
    /// A protocol message could not be decoded
    #[error("Invalid message: {0}")]
    InvalidMessage(#[from] serde_json::Error),

    /// Configuration file could not be read
    #[error("Failed to read config file {path}: {source}")]
    ConfigRead {
        /// Path that was attempted
        path: String,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// Configuration file could not be parsed
    #[error("Failed to parse config file {path}: {source}")]
    ConfigParse {
        /// Path that was attempted
        path: String,
        /// Underlying TOML error
        #[source]
        source: toml::de::Error,
    },

    /// Configuration values are out of range
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// The worker thread could not be started
    #[error("Failed to spawn search worker: {0}")]
    WorkerSpawn(#[source] std::io::Error),

    /// The worker has terminated and no longer accepts requests
    #[error("Search worker is closed")]
    WorkerClosed,

    /// A catalogue file or directory could not be read
    #[error("Failed to read catalogue {path}: {source}")]
    CatalogueRead {
        /// Path that was attempted
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// A catalogue file is not valid JSON of the expected shape
    #[error("Failed to parse catalogue file {path}: {source}")]
    CatalogueParse {
        /// Path that was attempted
        path: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Error code for integration with the tooling's error reporting.
/// Range: 11xxx for search errors.
#[repr(u32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchErrorCode {
    /// Protocol message decoding failed
    InvalidMessage = 11001,
    /// Config file unreadable
    ConfigRead = 11002,
    /// Config file malformed
    ConfigParse = 11003,
    /// Config values rejected
    InvalidConfig = 11004,
    /// Worker gone
    WorkerClosed = 11005,
    /// Worker thread failed to start
    WorkerSpawn = 11006,
    /// Catalogue unreadable
    CatalogueRead = 11007,
    /// Catalogue malformed
    CatalogueParse = 11008,
}

impl SearchError {
    /// Returns the error code for this error.
    pub fn code(&self) -> SearchErrorCode {
        match self {
            SearchError::InvalidMessage(_) => SearchErrorCode::InvalidMessage,
            SearchError::ConfigRead { .. } => SearchErrorCode::ConfigRead,
            SearchError::ConfigParse { .. } => SearchErrorCode::ConfigParse,
            SearchError::InvalidConfig(_) => SearchErrorCode::InvalidConfig,
            SearchError::WorkerSpawn(_) => SearchErrorCode::WorkerSpawn,
            SearchError::WorkerClosed => SearchErrorCode::WorkerClosed,
            SearchError::CatalogueRead { .. } => SearchErrorCode::CatalogueRead,
            SearchError::CatalogueParse { .. } => SearchErrorCode::CatalogueParse,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        let err = SearchError::InvalidConfig("threshold".into());
        assert_eq!(err.code(), SearchErrorCode::InvalidConfig);
        assert_eq!(err.code() as u32, 11004);
        assert_eq!(SearchError::WorkerClosed.code() as u32, 11005);
    }

    #[test]
    fn test_json_error_converts() {
        let json_err = serde_json::from_str::<u32>("nope").unwrap_err();
        let err: SearchError = json_err.into();
        assert_eq!(err.code(), SearchErrorCode::InvalidMessage);
        assert!(err.to_string().starts_with("Invalid message"));
    }

    #[test]
    fn test_catalogue_errors_name_the_path() {
        let err = SearchError::CatalogueRead {
            path: "data/acme.json".into(),
            source: std::io::Error::from(std::io::ErrorKind::NotFound),
        };
        assert_eq!(err.code() as u32, 11007);
        assert!(err.to_string().contains("data/acme.json"));

        let parse = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err = SearchError::CatalogueParse { path: "bad.json".into(), source: parse };
        assert_eq!(err.code(), SearchErrorCode::CatalogueParse);
        assert!(std::error::Error::source(&err).is_some());
    }
}
