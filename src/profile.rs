//! Personal profile extraction.
//!
//! Builds the profile card from the root's `Me` node and the first height
//! and body mass records in document order. Anything missing degrades to
//! the `N/A` sentinel instead of failing.

use crate::constants::{
    CHARACTERISTIC_KEY_PREFIXES, CHARACTERISTIC_VALUE_PREFIXES, NOT_AVAILABLE,
    QUANTITY_TYPE_PREFIXES, attributes, identifiers,
};
use crate::decode::strip_known_prefix;
use crate::models::RawRecord;
use crate::store::RecordStore;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{debug, warn};

/// Characteristic names as they appear after prefix stripping
pub mod characteristics {
    pub const DATE_OF_BIRTH: &str = "DateOfBirth";
    pub const BIOLOGICAL_SEX: &str = "BiologicalSex";
    pub const BLOOD_TYPE: &str = "BloodType";
    pub const SKIN_TYPE: &str = "FitzpatrickSkinType";
    pub const MEDICATIONS_USE: &str = "CardioFitnessMedicationsUse";
}

/// Point-in-time body measurement copied from a quantity record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BodyMeasurement {
    /// Record type without its `HKQuantityTypeIdentifier` prefix
    pub record_type: String,
    pub unit: String,
    pub value: String,
    pub start_date: String,
    pub end_date: String,
    /// Empty when the record has no creation date
    pub creation_date: String,
}

impl BodyMeasurement {
    fn from_record(record: &RawRecord) -> Self {
        let field = |name: &str| record.attr(name).unwrap_or(NOT_AVAILABLE).to_string();

        Self {
            record_type: strip_known_prefix(
                record.record_type().unwrap_or(NOT_AVAILABLE),
                QUANTITY_TYPE_PREFIXES,
            ),
            unit: field(attributes::UNIT),
            value: field(attributes::VALUE),
            start_date: field(attributes::START_DATE),
            end_date: field(attributes::END_DATE),
            creation_date: record
                .attr(attributes::CREATION_DATE)
                .unwrap_or_default()
                .to_string(),
        }
    }
}

/// A body measurement slot, explicitly marked when the export has none
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum BodySnapshot {
    Recorded(BodyMeasurement),
    NotAvailable,
}

impl BodySnapshot {
    pub fn measurement(&self) -> Option<&BodyMeasurement> {
        match self {
            BodySnapshot::Recorded(measurement) => Some(measurement),
            BodySnapshot::NotAvailable => None,
        }
    }

    pub fn is_available(&self) -> bool {
        matches!(self, BodySnapshot::Recorded(_))
    }
}

impl fmt::Display for BodySnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BodySnapshot::Recorded(m) => write!(f, "{} {}", m.value, m.unit),
            BodySnapshot::NotAvailable => write!(f, "{} {}", NOT_AVAILABLE, NOT_AVAILABLE),
        }
    }
}

/// Profile card of the exporting user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileRecord {
    /// `Me` attributes in document order, prefixes stripped from keys and values
    pub characteristics: Vec<(String, String)>,
    /// `sourceName` of the first height record
    pub user_name: Option<String>,
    pub height: BodySnapshot,
    pub body_mass: BodySnapshot,
}

impl ProfileRecord {
    /// Read the profile from a store
    ///
    /// Height and body mass come from the first matching record in
    /// document order, which is not necessarily the most recent one.
    pub fn extract(store: &RecordStore) -> Self {
        let characteristics = match store.me() {
            Some(me) => me
                .attributes
                .iter()
                .map(|(key, value)| {
                    (
                        strip_known_prefix(key, CHARACTERISTIC_KEY_PREFIXES),
                        strip_known_prefix(value, CHARACTERISTIC_VALUE_PREFIXES),
                    )
                })
                .collect(),
            None => {
                warn!("Export has no Me node; profile characteristics unavailable");
                Vec::new()
            }
        };

        let heights = store.filter_by_category(identifiers::HEIGHT);
        let first_height = heights.first().copied();
        let user_name = first_height
            .and_then(|record| record.attr(attributes::SOURCE_NAME))
            .map(str::to_string);

        let height = snapshot(first_height);
        let body_mass = snapshot(
            store
                .filter_by_category(identifiers::BODY_MASS)
                .first()
                .copied(),
        );

        debug!(
            "Extracted profile: {} characteristics, height {}, body mass {}",
            characteristics.len(),
            if height.is_available() { "present" } else { "absent" },
            if body_mass.is_available() { "present" } else { "absent" }
        );

        Self {
            characteristics,
            user_name,
            height,
            body_mass,
        }
    }

    /// Characteristic value by stripped name, or `N/A`
    pub fn characteristic(&self, name: &str) -> &str {
        self.characteristics
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
            .unwrap_or(NOT_AVAILABLE)
    }

    pub fn user_name(&self) -> &str {
        self.user_name.as_deref().unwrap_or(NOT_AVAILABLE)
    }

    pub fn date_of_birth(&self) -> &str {
        self.characteristic(characteristics::DATE_OF_BIRTH)
    }

    pub fn biological_sex(&self) -> &str {
        self.characteristic(characteristics::BIOLOGICAL_SEX)
    }

    pub fn blood_type(&self) -> &str {
        self.characteristic(characteristics::BLOOD_TYPE)
    }

    pub fn skin_type(&self) -> &str {
        self.characteristic(characteristics::SKIN_TYPE)
    }

    pub fn medications_use(&self) -> &str {
        self.characteristic(characteristics::MEDICATIONS_USE)
    }
}

fn snapshot(record: Option<&RawRecord>) -> BodySnapshot {
    record
        .map(|record| BodySnapshot::Recorded(BodyMeasurement::from_record(record)))
        .unwrap_or(BodySnapshot::NotAvailable)
}
