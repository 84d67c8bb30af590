//! Common types and utilities shared across podharvest crates.
//!
//! This crate defines the shared error type, output format selection and the
//! observability helpers used throughout the workspace. It is intentionally
//! lightweight so that every crate can depend on it without pulling in the
//! browser or configuration stacks.
//!
//! # Overview
//!
//! - [`observability`]: Centralised tracing/logging initialisation
//! - [`HarvestError`] and [`Result`]: Shared error handling
//! - [`OutputFormat`]: How emitted episode lists are encoded
//!
//! # Examples
//!
//! ```rust
//! use podharvest_common::OutputFormat;
//!
//! let format: OutputFormat = "jsonl".parse().unwrap();
//! assert_eq!(format, OutputFormat::JsonLines);
//! assert_eq!(OutputFormat::default(), OutputFormat::Json);
//! ```
use serde::{Deserialize, Serialize};
use std::str::FromStr;

pub mod observability;

/// Encoding used when emitting the final episode list.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// A single pretty-printed JSON array.
    #[default]
    Json,
    /// One JSON object per line.
    #[serde(rename = "jsonl", alias = "jsonlines")]
    JsonLines,
}

impl FromStr for OutputFormat {
    type Err = HarvestError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "jsonl" | "jsonlines" | "ndjson" => Ok(Self::JsonLines),
            other => Err(HarvestError::Config(format!("unknown output format: {other}"))),
        }
    }
}

/// Error types used across the podharvest system.
#[derive(thiserror::Error, Debug)]
pub enum HarvestError {
    /// The browser driver (WebDriver session, page, element) reported an error.
    #[error("Driver error: {0}")]
    Driver(#[from] anyhow::Error),

    /// Configuration was incomplete or invalid.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Writing records or diagnostics failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Records could not be encoded.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Convenient alias for results that use [`HarvestError`].
pub type Result<T> = std::result::Result<T, HarvestError>;
