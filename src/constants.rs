//! Application constants for health export extraction
//!
//! Category identifiers, attribute names, prefix tables, timestamp formats
//! and output file names used throughout the crate.

// =============================================================================
// Document Structure
// =============================================================================

/// Default element name of a biometric record
pub const DEFAULT_RECORD_TAG: &str = "Record";

/// Element holding the personal characteristics, a direct child of the root
pub const ME_TAG: &str = "Me";

/// Nested beat sub-record of a heart rate variability record
pub const INSTANTANEOUS_BPM_TAG: &str = "InstantaneousBeatsPerMinute";

/// Record attribute names
pub mod attributes {
    pub const TYPE: &str = "type";
    pub const SOURCE_NAME: &str = "sourceName";
    pub const UNIT: &str = "unit";
    pub const CREATION_DATE: &str = "creationDate";
    pub const START_DATE: &str = "startDate";
    pub const END_DATE: &str = "endDate";
    pub const VALUE: &str = "value";
    pub const BPM: &str = "bpm";
    pub const TIME: &str = "time";
}

// =============================================================================
// Category Identifiers
// =============================================================================

pub mod identifiers {
    pub const HEART_RATE: &str = "HKQuantityTypeIdentifierHeartRate";
    pub const HEART_RATE_VARIABILITY: &str = "HKQuantityTypeIdentifierHeartRateVariabilitySDNN";
    pub const RESTING_HEART_RATE: &str = "HKQuantityTypeIdentifierRestingHeartRate";
    pub const WALKING_HEART_RATE: &str = "HKQuantityTypeIdentifierWalkingHeartRateAverage";
    pub const DISTANCE: &str = "HKQuantityTypeIdentifierDistanceWalkingRunning";
    pub const BASAL_ENERGY: &str = "HKQuantityTypeIdentifierBasalEnergyBurned";
    pub const STAND_HOUR: &str = "HKCategoryTypeIdentifierAppleStandHour";
    pub const STEP_COUNT: &str = "HKQuantityTypeIdentifierStepCount";
    pub const HEIGHT: &str = "HKQuantityTypeIdentifierHeight";
    pub const BODY_MASS: &str = "HKQuantityTypeIdentifierBodyMass";
}

/// Raw stand hour category values and their labels
pub mod stand_hour {
    pub const IDLE_VALUE: &str = "HKCategoryValueAppleStandHourIdle";
    pub const STOOD_VALUE: &str = "HKCategoryValueAppleStandHourStood";
    pub const IDLE_LABEL: &str = "Idle";
    pub const STOOD_LABEL: &str = "Stood";
}

// =============================================================================
// Identifier Prefixes
// =============================================================================

/// Prefixes stripped from `Me` attribute names
pub const CHARACTERISTIC_KEY_PREFIXES: &[&str] = &["HKCharacteristicTypeIdentifier"];

/// Prefixes stripped from `Me` attribute values
pub const CHARACTERISTIC_VALUE_PREFIXES: &[&str] =
    &["HKBiologicalSex", "HKBloodType", "HKFitzpatrickSkinType"];

/// Prefixes stripped from quantity record types
pub const QUANTITY_TYPE_PREFIXES: &[&str] = &["HKQuantityTypeIdentifier"];

/// Marker shared by every HealthKit identifier
pub const HEALTHKIT_MARKER: &str = "HK";

// =============================================================================
// Formats
// =============================================================================

/// Timestamp format of `startDate`/`endDate`/`creationDate`
pub const RECORD_TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S %z";

/// Derived `date` column format
pub const DATE_COLUMN_FORMAT: &str = "%m/%d/%y";

/// Derived `time` column format
pub const TIME_COLUMN_FORMAT: &str = "%H:%M:%S";

/// Timestamp format written to CSV
pub const CSV_DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Accepted date range bound formats, tried in order
pub const RANGE_DATETIME_FORMATS: &[&str] = &["%Y-%m-%d %H:%M", "%m/%d/%y %H:%M"];
pub const RANGE_DATE_FORMATS: &[&str] = &["%Y-%m-%d"];

// =============================================================================
// Output
// =============================================================================

/// Default CSV output directory
pub const DEFAULT_OUTPUT_DIR: &str = "download";

/// Sentinel for profile fields with no source data
pub const NOT_AVAILABLE: &str = "N/A";

/// Table column names
pub mod columns {
    pub const START_TIMESTAMP: &str = "start_timestamp";
    pub const END_TIMESTAMP: &str = "end_timestamp";
    pub const DATE: &str = "date";
    pub const TIME: &str = "time";
    pub const HOUR: &str = "hour";
    pub const INSTANTANEOUS_BPM: &str = "instantaneous_bpm";
    pub const DATE_KEY: &str = "datetime";
}
