//! Core data structures and types for health export extraction.
//!
//! Defines the raw record nodes held by the store, the decoded row shape,
//! the tagged record value and the measurement categories with their
//! per-category table policy.

use crate::constants::{attributes, columns, identifiers};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Untyped record node as found in the export document
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawRecord {
    /// Attributes in document order
    pub attributes: Vec<(String, String)>,
    /// Nested beat sub-records in document order
    pub beats: Vec<BeatSample>,
}

impl RawRecord {
    /// Look up an attribute by name
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    pub fn record_type(&self) -> Option<&str> {
        self.attr(attributes::TYPE)
    }

    pub fn value(&self) -> Option<&str> {
        self.attr(attributes::VALUE)
    }
}

/// One `InstantaneousBeatsPerMinute` sub-record; either attribute may be absent
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BeatSample {
    pub bpm: Option<String>,
    pub time: Option<String>,
}

/// The `Me` node's attributes in document order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MeNode {
    pub attributes: Vec<(String, String)>,
}

/// Record value after best-effort numeric coercion
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum RecordValue {
    Numeric(f64),
    Raw(String),
}

impl RecordValue {
    /// Coerce a raw attribute string, keeping it verbatim when it is not a number
    pub fn parse(raw: &str) -> Self {
        match raw.trim().parse::<f64>() {
            Ok(number) => RecordValue::Numeric(number),
            Err(_) => RecordValue::Raw(raw.to_string()),
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            RecordValue::Numeric(number) => Some(*number),
            RecordValue::Raw(_) => None,
        }
    }

    pub fn as_raw(&self) -> Option<&str> {
        match self {
            RecordValue::Numeric(_) => None,
            RecordValue::Raw(raw) => Some(raw),
        }
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self, RecordValue::Numeric(_))
    }
}

impl fmt::Display for RecordValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            // Whole numbers keep a trailing ".0" so mixed columns stay unambiguous
            RecordValue::Numeric(number) if number.is_finite() && number.fract() == 0.0 => {
                write!(f, "{:.1}", number)
            }
            RecordValue::Numeric(number) => write!(f, "{}", number),
            RecordValue::Raw(raw) => f.write_str(raw),
        }
    }
}

/// One normalised observation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecodedRow {
    pub start_timestamp: NaiveDateTime,
    pub end_timestamp: NaiveDateTime,
    pub value: RecordValue,
}

/// Beat timing attached to a heart rate variability row
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BeatMetadata {
    pub bpm: Vec<String>,
    pub time: Vec<String>,
}

impl BeatMetadata {
    pub fn len(&self) -> usize {
        self.bpm.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bpm.is_empty()
    }
}

/// How a category's value column is typed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    /// Numeric measurement, kept as text only where coercion failed
    Quantity,
    /// Categorical label
    Label,
}

/// Columns derived from `start_timestamp`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DerivedColumn {
    Date,
    Time,
    Hour,
    InstantaneousBpm,
}

impl DerivedColumn {
    pub fn name(&self) -> &'static str {
        match self {
            DerivedColumn::Date => columns::DATE,
            DerivedColumn::Time => columns::TIME,
            DerivedColumn::Hour => columns::HOUR,
            DerivedColumn::InstantaneousBpm => columns::INSTANTANEOUS_BPM,
        }
    }
}

/// Measurement categories extracted from an export
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Category {
    HeartRate,
    HeartRateVariability,
    RestingHeartRate,
    WalkingHeartRate,
    Distance,
    BasalEnergy,
    StandHour,
    StepCount,
}

impl Category {
    /// All categories in export order
    pub const ALL: [Category; 8] = [
        Category::HeartRate,
        Category::HeartRateVariability,
        Category::RestingHeartRate,
        Category::WalkingHeartRate,
        Category::Distance,
        Category::BasalEnergy,
        Category::StandHour,
        Category::StepCount,
    ];

    /// The `type` attribute selecting this category's records
    pub fn identifier(&self) -> &'static str {
        match self {
            Category::HeartRate => identifiers::HEART_RATE,
            Category::HeartRateVariability => identifiers::HEART_RATE_VARIABILITY,
            Category::RestingHeartRate => identifiers::RESTING_HEART_RATE,
            Category::WalkingHeartRate => identifiers::WALKING_HEART_RATE,
            Category::Distance => identifiers::DISTANCE,
            Category::BasalEnergy => identifiers::BASAL_ENERGY,
            Category::StandHour => identifiers::STAND_HOUR,
            Category::StepCount => identifiers::STEP_COUNT,
        }
    }

    /// Name of the value column in tables and CSV output
    pub fn value_column(&self) -> &'static str {
        match self {
            Category::HeartRate => "heart_rate",
            Category::HeartRateVariability => "heart_rate_variability",
            Category::RestingHeartRate => "resting_heart_rate",
            Category::WalkingHeartRate => "walking_heart_rate",
            Category::Distance => "distance_walk_run",
            Category::BasalEnergy => "energy_burned",
            Category::StandHour => "stand_hour",
            Category::StepCount => "steps",
        }
    }

    pub fn derived_columns(&self) -> &'static [DerivedColumn] {
        use DerivedColumn::*;
        match self {
            Category::HeartRate => &[Date, Time],
            Category::HeartRateVariability => &[Date, Time, InstantaneousBpm],
            Category::RestingHeartRate | Category::WalkingHeartRate => &[Date],
            Category::Distance
            | Category::BasalEnergy
            | Category::StandHour
            | Category::StepCount => &[Date, Hour],
        }
    }

    /// Whether the table is ordered by `start_timestamp` instead of document order
    pub fn is_sorted(&self) -> bool {
        matches!(
            self,
            Category::HeartRate | Category::RestingHeartRate | Category::WalkingHeartRate
        )
    }

    pub fn value_kind(&self) -> ValueKind {
        match self {
            Category::StandHour => ValueKind::Label,
            _ => ValueKind::Quantity,
        }
    }

    /// Whether rows carry beat metadata
    pub fn has_beat_metadata(&self) -> bool {
        matches!(self, Category::HeartRateVariability)
    }

    /// Whether the category is summed into hour-by-date buckets
    pub fn is_hourly(&self) -> bool {
        self.derived_columns().contains(&DerivedColumn::Hour)
    }

    /// Name of the summed column in the hourly aggregate
    pub fn aggregate_column(&self) -> &'static str {
        match self {
            Category::Distance => "distance",
            other => other.value_column(),
        }
    }

    /// CSV file written for this category
    pub fn csv_file_name(&self) -> &'static str {
        match self {
            Category::HeartRate => "heart_rate.csv",
            Category::HeartRateVariability => "heart_rate_variability.csv",
            Category::RestingHeartRate => "resting_heart_rate.csv",
            Category::WalkingHeartRate => "walking_heart_rate.csv",
            Category::Distance => "distance_walked_ran.csv",
            Category::BasalEnergy => "basal_energy.csv",
            Category::StandHour => "stand_hour.csv",
            Category::StepCount => "step_counts.csv",
        }
    }

    /// Look a category up by its `type` identifier
    pub fn from_identifier(identifier: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|category| category.identifier() == identifier)
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Category::HeartRate => "heart rate",
            Category::HeartRateVariability => "heart rate variability",
            Category::RestingHeartRate => "resting heart rate",
            Category::WalkingHeartRate => "walking heart rate",
            Category::Distance => "distance walked",
            Category::BasalEnergy => "basal energy",
            Category::StandHour => "stand hour",
            Category::StepCount => "step count",
        };
        f.write_str(name)
    }
}
