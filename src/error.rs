//! Error handling for health export extraction.
//!
//! Provides error types with context for source loading, XML parsing,
//! record decoding, table materialisation and per-session generation.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum HealthError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Polars error: {0}")]
    Polars(#[from] polars::error::PolarsError),

    #[error("Export file not found at path: {path}")]
    NotFound { path: PathBuf },

    #[error("Malformed XML in file: {path} - {reason}")]
    Parse { path: PathBuf, reason: String },

    #[error("Malformed {record_type} record: {reason}")]
    MalformedRecord { record_type: String, reason: String },

    #[error("No {category} records found")]
    EmptyCategory { category: String },

    #[error("Non-numeric value '{value}' in {category} cannot be summed")]
    NonNumericValue { category: String, value: String },

    #[error("Invalid date range: {reason}")]
    InvalidDateRange { reason: String },

    #[error("Configuration error: {message}")]
    Configuration { message: String },

    #[error("A generation run is already in progress for this session")]
    GenerationInProgress,

    #[error("No export file has been staged for this session")]
    NoSourceStaged,

    #[error("Processing interrupted: {reason}")]
    Interrupted { reason: String },

    #[error("Background task failed: {reason}")]
    TaskFailed { reason: String },
}

impl HealthError {
    /// Create a malformed record error for the given record type
    pub fn malformed(record_type: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::MalformedRecord {
            record_type: record_type.into(),
            reason: reason.into(),
        }
    }

    /// Whether the error aborts the whole run rather than a single category
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::NotFound { .. } | Self::Parse { .. } | Self::Io(_) | Self::Interrupted { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, HealthError>;
