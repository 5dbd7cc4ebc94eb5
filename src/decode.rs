//! Attribute decoding for raw export records.
//!
//! Turns the attribute strings of a [`RawRecord`] into typed values:
//! offset-suffixed timestamps, best-effort numeric values, nested beat
//! metadata and HealthKit identifiers with their prefixes removed.

use crate::constants::{HEALTHKIT_MARKER, RECORD_TIMESTAMP_FORMAT, attributes};
use crate::error::{HealthError, Result};
use crate::models::{BeatMetadata, DecodedRow, RawRecord, RecordValue};
use chrono::{DateTime, FixedOffset, NaiveDateTime};
use regex::Regex;
use std::sync::LazyLock;
use tracing::debug;

static TIMESTAMP_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\d{4}-\d{2}-\d{2} \d{2}:\d{2}:\d{2} [+-]\d{4}$").expect("valid timestamp pattern")
});

/// Decode a record's start, end and value
///
/// Timestamps must look like `2021-03-04 07:15:00 -0600`. The offset is
/// dropped, not applied: the result is the wall-clock time as written. When
/// `required_offset` is set, any other offset makes the record malformed.
pub fn decode_record(
    record: &RawRecord,
    required_offset: Option<FixedOffset>,
) -> Result<DecodedRow> {
    let record_type = record.record_type().unwrap_or("untyped");

    let start_timestamp = decode_timestamp_attr(record, attributes::START_DATE, required_offset)?;
    let end_timestamp = decode_timestamp_attr(record, attributes::END_DATE, required_offset)?;

    let raw_value = record
        .value()
        .ok_or_else(|| HealthError::malformed(record_type, "missing value attribute"))?;

    Ok(DecodedRow {
        start_timestamp,
        end_timestamp,
        value: RecordValue::parse(raw_value),
    })
}

fn decode_timestamp_attr(
    record: &RawRecord,
    name: &str,
    required_offset: Option<FixedOffset>,
) -> Result<NaiveDateTime> {
    let record_type = record.record_type().unwrap_or("untyped");
    let raw = record
        .attr(name)
        .ok_or_else(|| HealthError::malformed(record_type, format!("missing {} attribute", name)))?;

    decode_timestamp(raw, required_offset)
        .map_err(|reason| HealthError::malformed(record_type, format!("{}: {}", name, reason)))
}

/// Parse a `YYYY-MM-DD HH:MM:SS ±HHMM` timestamp into a naive local datetime
pub fn decode_timestamp(
    raw: &str,
    required_offset: Option<FixedOffset>,
) -> std::result::Result<NaiveDateTime, String> {
    if !TIMESTAMP_PATTERN.is_match(raw) {
        return Err(format!(
            "'{}' does not match YYYY-MM-DD HH:MM:SS ±HHMM",
            raw
        ));
    }

    let parsed: DateTime<FixedOffset> = DateTime::parse_from_str(raw, RECORD_TIMESTAMP_FORMAT)
        .map_err(|e| format!("'{}' is not a valid timestamp: {}", raw, e))?;

    if let Some(expected) = required_offset {
        if parsed.offset() != &expected {
            return Err(format!(
                "'{}' has offset {}, expected {}",
                raw,
                parsed.offset(),
                expected
            ));
        }
    }

    Ok(parsed.naive_local())
}

/// Collect the nested beat samples of a variability record
///
/// Samples missing either `bpm` or `time` (or carrying an empty one) are
/// skipped, so both sequences always have the same length.
pub fn decode_variability_metadata(record: &RawRecord) -> BeatMetadata {
    let mut metadata = BeatMetadata::default();

    for beat in &record.beats {
        match (beat.bpm.as_deref(), beat.time.as_deref()) {
            (Some(bpm), Some(time)) if !bpm.is_empty() && !time.is_empty() => {
                metadata.bpm.push(bpm.to_string());
                metadata.time.push(time.to_string());
            }
            _ => {}
        }
    }

    metadata
}

/// Remove the first matching prefix from a HealthKit identifier
///
/// Values without a known prefix come back unchanged. An unknown `HK`
/// identifier is kept verbatim so no information is lost.
pub fn strip_known_prefix(value: &str, prefixes: &[&str]) -> String {
    for prefix in prefixes {
        if let Some(stripped) = value.strip_prefix(prefix) {
            return stripped.to_string();
        }
    }

    if value.starts_with(HEALTHKIT_MARKER) && value.len() > HEALTHKIT_MARKER.len() {
        debug!("No known prefix for HealthKit identifier '{}', keeping it", value);
    }

    value.to_string()
}
