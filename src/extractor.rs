//! Category extraction from a record store.
//!
//! Each category pulls its records from the [`RecordStore`], decodes them
//! into rows and applies its table policy: optional ordering by start
//! time, stand hour relabelling and beat metadata for variability rows.

use crate::config::{ExtractionConfig, MalformedPolicy};
use crate::constants::{DATE_COLUMN_FORMAT, TIME_COLUMN_FORMAT, columns, stand_hour};
use crate::decode::{decode_record, decode_variability_metadata};
use crate::error::Result;
use crate::models::{
    BeatMetadata, Category, DecodedRow, DerivedColumn, RecordValue, ValueKind,
};
use crate::range::DateRange;
use crate::store::RecordStore;
use chrono::{NaiveDate, NaiveDateTime, Timelike};
use polars::prelude::*;
use tracing::{debug, warn};

/// A decoded row plus the per-row data some categories attach
#[derive(Debug, Clone, PartialEq)]
pub struct TableRow {
    pub decoded: DecodedRow,
    /// Present on heart rate variability rows only
    pub instantaneous_bpm: Option<BeatMetadata>,
}

impl TableRow {
    pub fn start(&self) -> NaiveDateTime {
        self.decoded.start_timestamp
    }

    pub fn end(&self) -> NaiveDateTime {
        self.decoded.end_timestamp
    }

    pub fn value(&self) -> &RecordValue {
        &self.decoded.value
    }

    /// Derived `date` column: `MM/DD/YY` of the start
    pub fn date(&self) -> String {
        self.start().format(DATE_COLUMN_FORMAT).to_string()
    }

    /// Calendar date of the start
    pub fn calendar_date(&self) -> NaiveDate {
        self.start().date()
    }

    /// Derived `time` column: `HH:MM:SS` of the start
    pub fn time(&self) -> String {
        self.start().format(TIME_COLUMN_FORMAT).to_string()
    }

    /// Derived `hour` column: hour of day of the start
    pub fn hour(&self) -> u32 {
        self.start().hour()
    }
}

/// All rows of one category, in the category's declared order
#[derive(Debug, Clone, PartialEq)]
pub struct CategoryTable {
    category: Category,
    rows: Vec<TableRow>,
}

impl CategoryTable {
    pub fn new(category: Category, rows: Vec<TableRow>) -> Self {
        Self { category, rows }
    }

    pub fn category(&self) -> Category {
        self.category
    }

    pub fn rows(&self) -> &[TableRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, TableRow> {
        self.rows.iter()
    }

    /// Rows whose start lies strictly inside `range`, order preserved
    pub fn filter_range(&self, range: &DateRange) -> Self {
        Self {
            category: self.category,
            rows: self
                .rows
                .iter()
                .filter(|row| range.contains(row.start()))
                .cloned()
                .collect(),
        }
    }

    /// Materialise the table with its derived columns
    ///
    /// Columns: `start_timestamp`, `end_timestamp`, the value column, then
    /// `date`, `time`, `hour` and `instantaneous_bpm` as the category
    /// declares them. `instantaneous_bpm` is a struct of `bpm` and `time`
    /// string lists.
    pub fn to_dataframe(&self) -> Result<DataFrame> {
        let value_column = self.value_column()?;
        self.assemble_frame(value_column)
    }

    /// Assemble a frame around a caller-provided value column
    pub(crate) fn assemble_frame(&self, value_column: Column) -> Result<DataFrame> {
        let mut frame_columns = vec![
            timestamp_column(columns::START_TIMESTAMP, self.rows.iter().map(TableRow::start)),
            timestamp_column(columns::END_TIMESTAMP, self.rows.iter().map(TableRow::end)),
            value_column,
        ];

        for derived in self.category.derived_columns() {
            let name = derived.name().into();
            let column = match derived {
                DerivedColumn::Date => Column::new(
                    name,
                    self.rows.iter().map(TableRow::date).collect::<Vec<_>>(),
                ),
                DerivedColumn::Time => Column::new(
                    name,
                    self.rows.iter().map(TableRow::time).collect::<Vec<_>>(),
                ),
                DerivedColumn::Hour => Column::new(
                    name,
                    self.rows.iter().map(TableRow::hour).collect::<Vec<_>>(),
                ),
                DerivedColumn::InstantaneousBpm => beats_column(name, &self.rows)?,
            };
            frame_columns.push(column);
        }

        Ok(DataFrame::new(frame_columns)?)
    }

    /// The value column: Float64 when every value is numeric, text otherwise
    fn value_column(&self) -> Result<Column> {
        let name = self.category.value_column();
        let all_numeric = self.rows.iter().all(|row| row.value().is_numeric());

        let column = if self.category.value_kind() == ValueKind::Quantity && all_numeric {
            let values: Vec<f64> = self
                .rows
                .iter()
                .filter_map(|row| row.value().as_f64())
                .collect();
            Column::new(name.into(), values)
        } else {
            let values: Vec<String> = self.rows.iter().map(|row| row.value().to_string()).collect();
            Column::new(name.into(), values)
        };

        Ok(column)
    }
}

impl<'a> IntoIterator for &'a CategoryTable {
    type Item = &'a TableRow;
    type IntoIter = std::slice::Iter<'a, TableRow>;

    fn into_iter(self) -> Self::IntoIter {
        self.rows.iter()
    }
}

/// Struct column of per-row `bpm` and `time` lists; null for rows without metadata
fn beats_column(name: PlSmallStr, rows: &[TableRow]) -> Result<Column> {
    let mut bpm = ListStringChunkedBuilder::new("bpm".into(), rows.len(), rows.len() * 4);
    let mut time = ListStringChunkedBuilder::new("time".into(), rows.len(), rows.len() * 4);

    for row in rows {
        match &row.instantaneous_bpm {
            Some(beats) => {
                bpm.append_values_iter(beats.bpm.iter().map(String::as_str));
                time.append_values_iter(beats.time.iter().map(String::as_str));
            }
            None => {
                bpm.append_null();
                time.append_null();
            }
        }
    }

    let fields = [bpm.finish().into_series(), time.finish().into_series()];
    let beats = StructChunked::from_series(name, rows.len(), fields.iter())?;
    Ok(beats.into_series().into())
}

fn timestamp_column(name: &str, values: impl Iterator<Item = NaiveDateTime>) -> Column {
    DatetimeChunked::from_naive_datetime(name.into(), values, TimeUnit::Milliseconds)
        .into_series()
        .into()
}

/// Relabel a stand hour value: Idle and Stood get short labels, others stay verbatim
pub fn stand_hour_label(value: RecordValue) -> RecordValue {
    match value {
        RecordValue::Raw(raw) if raw == stand_hour::IDLE_VALUE => {
            RecordValue::Raw(stand_hour::IDLE_LABEL.to_string())
        }
        RecordValue::Raw(raw) if raw == stand_hour::STOOD_VALUE => {
            RecordValue::Raw(stand_hour::STOOD_LABEL.to_string())
        }
        other => other,
    }
}

/// Numeric form of a stand hour label: 1 for Stood, 0 otherwise
pub fn stand_hour_indicator(value: &RecordValue) -> u8 {
    match value.as_raw() {
        Some(stand_hour::STOOD_LABEL) => 1,
        _ => 0,
    }
}

/// Extracts category tables from a store
#[derive(Debug, Clone, Default)]
pub struct CategoryExtractor {
    config: ExtractionConfig,
}

impl CategoryExtractor {
    pub fn new(config: ExtractionConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ExtractionConfig {
        &self.config
    }

    /// Extract one category's table
    ///
    /// No matching records gives an empty table. A malformed record fails
    /// the whole category unless the configuration skips such records.
    pub fn extract(&self, store: &RecordStore, category: Category) -> Result<CategoryTable> {
        let required_offset = self.config.offset_policy.required_offset()?;
        let records = store.filter_by_category(category.identifier());

        let mut rows = Vec::with_capacity(records.len());
        let mut skipped = 0usize;

        for record in records {
            let decoded = match decode_record(record, required_offset) {
                Ok(decoded) => decoded,
                Err(e) if self.config.malformed_policy == MalformedPolicy::Skip => {
                    warn!("Skipping {} record: {}", category, e);
                    skipped += 1;
                    continue;
                }
                Err(e) => return Err(e),
            };

            let decoded = match category {
                Category::StandHour => DecodedRow {
                    value: stand_hour_label(decoded.value),
                    ..decoded
                },
                _ => decoded,
            };

            let instantaneous_bpm = category
                .has_beat_metadata()
                .then(|| decode_variability_metadata(record));

            rows.push(TableRow {
                decoded,
                instantaneous_bpm,
            });
        }

        if category.is_sorted() {
            rows.sort_by_key(TableRow::start);
        }

        debug!(
            "Extracted {} {} rows ({} skipped)",
            rows.len(),
            category,
            skipped
        );

        Ok(CategoryTable::new(category, rows))
    }

    pub fn heart_rate(&self, store: &RecordStore) -> Result<CategoryTable> {
        self.extract(store, Category::HeartRate)
    }

    pub fn heart_rate_variability(&self, store: &RecordStore) -> Result<CategoryTable> {
        self.extract(store, Category::HeartRateVariability)
    }

    pub fn resting_heart_rate(&self, store: &RecordStore) -> Result<CategoryTable> {
        self.extract(store, Category::RestingHeartRate)
    }

    pub fn walking_heart_rate(&self, store: &RecordStore) -> Result<CategoryTable> {
        self.extract(store, Category::WalkingHeartRate)
    }

    pub fn distance(&self, store: &RecordStore) -> Result<CategoryTable> {
        self.extract(store, Category::Distance)
    }

    pub fn basal_energy(&self, store: &RecordStore) -> Result<CategoryTable> {
        self.extract(store, Category::BasalEnergy)
    }

    pub fn stand_hour(&self, store: &RecordStore) -> Result<CategoryTable> {
        self.extract(store, Category::StandHour)
    }

    pub fn step_count(&self, store: &RecordStore) -> Result<CategoryTable> {
        self.extract(store, Category::StepCount)
    }
}
