//! Configuration management and validation.
//!
//! Provides the extraction configuration: which element name carries
//! records, how timestamp offsets are treated, what happens to malformed
//! records, and where CSV output is written.

use crate::constants::{CSV_DATETIME_FORMAT, DEFAULT_OUTPUT_DIR, DEFAULT_RECORD_TAG};
use crate::error::{HealthError, Result};
use chrono::FixedOffset;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::LazyLock;
use tracing::debug;

static OFFSET_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([+-])(\d{2})(\d{2})$").expect("valid offset pattern"));

/// Treatment of the `±HHMM` suffix on record timestamps
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum OffsetPolicy {
    /// Accept any offset and drop it from the decoded value
    Discard,
    /// Only accept this exact offset (e.g. "-0600"); anything else is malformed
    Require(String),
}

impl OffsetPolicy {
    /// Resolve the required offset, if any
    pub fn required_offset(&self) -> Result<Option<FixedOffset>> {
        match self {
            OffsetPolicy::Discard => Ok(None),
            OffsetPolicy::Require(offset) => parse_offset(offset).map(Some),
        }
    }
}

/// Treatment of records whose timestamps cannot be decoded
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MalformedPolicy {
    /// Fail the whole category extraction
    Strict,
    /// Drop the record and log a warning
    Skip,
}

/// Global configuration for extraction and export
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractionConfig {
    /// Element name of biometric records
    pub record_tag: String,

    /// Offset handling for record timestamps
    pub offset_policy: OffsetPolicy,

    /// Malformed record handling
    pub malformed_policy: MalformedPolicy,

    /// Directory receiving one CSV per category
    pub output_dir: PathBuf,

    /// chrono format used for timestamps in CSV output
    pub csv_datetime_format: String,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            record_tag: DEFAULT_RECORD_TAG.to_string(),
            offset_policy: OffsetPolicy::Discard,
            malformed_policy: MalformedPolicy::Strict,
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
            csv_datetime_format: CSV_DATETIME_FORMAT.to_string(),
        }
    }
}

impl ExtractionConfig {
    /// Use a different record element name
    pub fn with_record_tag(mut self, tag: impl Into<String>) -> Self {
        self.record_tag = tag.into();
        self
    }

    /// Only accept timestamps carrying this offset
    pub fn with_required_offset(mut self, offset: impl Into<String>) -> Self {
        self.offset_policy = OffsetPolicy::Require(offset.into());
        self
    }

    /// Skip malformed records instead of failing the category
    pub fn with_lenient_records(mut self) -> Self {
        self.malformed_policy = MalformedPolicy::Skip;
        self
    }

    /// Write CSV output to this directory
    pub fn with_output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = dir.into();
        self
    }

    /// Check the configuration for values that would fail at extraction time
    pub fn validate(&self) -> Result<()> {
        if self.record_tag.trim().is_empty() {
            return Err(HealthError::Configuration {
                message: "record tag must not be empty".to_string(),
            });
        }

        if self.csv_datetime_format.trim().is_empty() {
            return Err(HealthError::Configuration {
                message: "CSV datetime format must not be empty".to_string(),
            });
        }

        let required = self.offset_policy.required_offset()?;
        debug!(
            "Validated configuration: tag={}, offset={:?}, malformed={:?}",
            self.record_tag, required, self.malformed_policy
        );

        Ok(())
    }
}

/// Parse a `±HHMM` offset string
fn parse_offset(offset: &str) -> Result<FixedOffset> {
    let invalid = || HealthError::Configuration {
        message: format!("invalid UTC offset '{}', expected ±HHMM", offset),
    };

    let captures = OFFSET_PATTERN.captures(offset.trim()).ok_or_else(invalid)?;
    let hours: i32 = captures[2].parse().map_err(|_| invalid())?;
    let minutes: i32 = captures[3].parse().map_err(|_| invalid())?;
    if minutes >= 60 {
        return Err(invalid());
    }

    let seconds = hours * 3600 + minutes * 60;
    let seconds = if &captures[1] == "-" { -seconds } else { seconds };
    FixedOffset::east_opt(seconds).ok_or_else(invalid)
}
