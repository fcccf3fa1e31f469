//! Terminal helpers for the catalogue search tools
//!
//! Provides shared CLI functionality:
//! - Status messages
//! - Result list rendering
//! - Progress indicators

#![warn(missing_docs)]

pub mod output;
pub mod progress;
