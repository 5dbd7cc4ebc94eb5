//! Hour-by-date aggregation for the hourly categories.
//!
//! Sums a table's quantity per `(hour, date)` bucket and orders the buckets
//! by calendar date, then hour. Only buckets that received at least one row
//! appear in the result.

use crate::constants::{DATE_COLUMN_FORMAT, columns};
use crate::error::{HealthError, Result};
use crate::extractor::{CategoryTable, TableRow, stand_hour_indicator};
use crate::models::Category;
use chrono::NaiveDate;
use polars::prelude::*;
use std::collections::BTreeMap;

/// Summed quantity for one hour of one day
#[derive(Debug, Clone, PartialEq)]
pub struct HourlyBucket {
    pub hour: u32,
    /// `MM/DD/YY` label, as in the table's `date` column
    pub date: String,
    /// Sortable key behind `date`
    pub date_key: NaiveDate,
    pub total: f64,
}

/// Buckets of one category, ascending by date then hour
#[derive(Debug, Clone, PartialEq)]
pub struct HourlyAggregate {
    category: Category,
    buckets: Vec<HourlyBucket>,
}

impl HourlyAggregate {
    /// Group a table by `(hour, date)` and sum its quantity
    ///
    /// Stand hour rows count 1 when stood and 0 otherwise. Any other
    /// category must hold numeric values only.
    pub fn from_table(table: &CategoryTable) -> Result<Self> {
        let category = table.category();
        let mut sums: BTreeMap<(NaiveDate, u32), f64> = BTreeMap::new();

        for row in table {
            let quantity = bucket_quantity(category, row)?;
            *sums.entry((row.calendar_date(), row.hour())).or_insert(0.0) += quantity;
        }

        let buckets = sums
            .into_iter()
            .map(|((date_key, hour), total)| HourlyBucket {
                hour,
                date: date_key.format(DATE_COLUMN_FORMAT).to_string(),
                date_key,
                total,
            })
            .collect();

        Ok(Self { category, buckets })
    }

    pub fn category(&self) -> Category {
        self.category
    }

    pub fn buckets(&self) -> &[HourlyBucket] {
        &self.buckets
    }

    pub fn len(&self) -> usize {
        self.buckets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }

    /// Total for one bucket, `None` when no row fell into it
    pub fn total(&self, date: NaiveDate, hour: u32) -> Option<f64> {
        self.buckets
            .iter()
            .find(|bucket| bucket.date_key == date && bucket.hour == hour)
            .map(|bucket| bucket.total)
    }

    /// Distinct date labels in bucket order
    pub fn dates(&self) -> Vec<&str> {
        let mut dates: Vec<&str> = Vec::new();
        for bucket in &self.buckets {
            if dates.last() != Some(&bucket.date.as_str()) {
                dates.push(&bucket.date);
            }
        }
        dates
    }

    /// Columns: `hour`, `date`, the summed column, `datetime`
    pub fn to_dataframe(&self) -> Result<DataFrame> {
        let hours: Vec<u32> = self.buckets.iter().map(|b| b.hour).collect();
        let dates: Vec<&str> = self.buckets.iter().map(|b| b.date.as_str()).collect();
        let totals: Vec<f64> = self.buckets.iter().map(|b| b.total).collect();
        let keys: Vec<String> = self
            .buckets
            .iter()
            .map(|b| b.date_key.format("%Y-%m-%d").to_string())
            .collect();

        Ok(DataFrame::new(vec![
            Column::new(columns::HOUR.into(), hours),
            Column::new(columns::DATE.into(), dates),
            Column::new(self.category.aggregate_column().into(), totals),
            Column::new(columns::DATE_KEY.into(), keys),
        ])?)
    }
}

fn bucket_quantity(category: Category, row: &TableRow) -> Result<f64> {
    if category == Category::StandHour {
        return Ok(f64::from(stand_hour_indicator(row.value())));
    }

    row.value()
        .as_f64()
        .ok_or_else(|| HealthError::NonNumericValue {
            category: category.to_string(),
            value: row.value().to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extractor::CategoryExtractor;
    use crate::store::RecordStore;

    fn table(category: Category, rows: &[(&str, &str)]) -> CategoryTable {
        let records: String = rows
            .iter()
            .map(|(start, value)| {
                format!(
                    r#"<Record type="{}" startDate="{start} -0600" endDate="{start} -0600" value="{value}"/>"#,
                    category.identifier()
                )
            })
            .collect();
        let xml = format!("<HealthData>{}</HealthData>", records);
        let store = RecordStore::from_xml_str(&xml, "Record").unwrap();
        CategoryExtractor::default().extract(&store, category).unwrap()
    }

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_same_bucket_is_summed() {
        let steps = table(
            Category::StepCount,
            &[
                ("2020-01-01 10:05:00", "3"),
                ("2020-01-01 10:40:00", "5"),
                ("2020-01-01 11:00:00", "7"),
            ],
        );

        let aggregate = HourlyAggregate::from_table(&steps).unwrap();
        assert_eq!(aggregate.len(), 2);
        assert_eq!(aggregate.total(day(2020, 1, 1), 10), Some(8.0));
        assert_eq!(aggregate.total(day(2020, 1, 1), 11), Some(7.0));
        // No zero fill
        assert_eq!(aggregate.total(day(2020, 1, 1), 12), None);
    }

    #[test]
    fn test_buckets_sorted_by_date_key_then_hour() {
        let distance = table(
            Category::Distance,
            &[
                ("2020-01-01 09:00:00", "0.5"),
                ("2019-12-31 23:00:00", "0.25"),
                ("2020-01-01 08:00:00", "1.0"),
                ("2019-12-31 07:00:00", "0.75"),
            ],
        );

        let aggregate = HourlyAggregate::from_table(&distance).unwrap();
        let order: Vec<_> = aggregate
            .buckets()
            .iter()
            .map(|b| (b.date.as_str(), b.hour))
            .collect();
        // "12/31/19" sorts after "01/01/20" as text; the date key keeps it first
        assert_eq!(
            order,
            vec![
                ("12/31/19", 7),
                ("12/31/19", 23),
                ("01/01/20", 8),
                ("01/01/20", 9)
            ]
        );
        assert_eq!(aggregate.dates(), vec!["12/31/19", "01/01/20"]);
    }

    #[test]
    fn test_stand_hour_counts_stood_only() {
        let stand = table(
            Category::StandHour,
            &[
                ("2020-01-01 10:00:00", "HKCategoryValueAppleStandHourStood"),
                ("2020-01-01 10:30:00", "HKCategoryValueAppleStandHourStood"),
                ("2020-01-01 11:00:00", "HKCategoryValueAppleStandHourIdle"),
            ],
        );

        let aggregate = HourlyAggregate::from_table(&stand).unwrap();
        assert_eq!(aggregate.total(day(2020, 1, 1), 10), Some(2.0));
        assert_eq!(aggregate.total(day(2020, 1, 1), 11), Some(0.0));
    }

    #[test]
    fn test_non_numeric_value_fails() {
        let energy = table(
            Category::BasalEnergy,
            &[("2020-01-01 10:00:00", "1.2"), ("2020-01-01 10:10:00", "lots")],
        );

        match HourlyAggregate::from_table(&energy).unwrap_err() {
            HealthError::NonNumericValue { category, value } => {
                assert_eq!(category, "basal energy");
                assert_eq!(value, "lots");
            }
            other => panic!("Expected NonNumericValue, got {other:?}"),
        }
    }

    #[test]
    fn test_empty_table_gives_empty_aggregate() {
        let empty = table(Category::StepCount, &[]);
        let aggregate = HourlyAggregate::from_table(&empty).unwrap();
        assert!(aggregate.is_empty());
        assert_eq!(aggregate.to_dataframe().unwrap().height(), 0);
    }

    #[test]
    fn test_aggregate_dataframe() {
        let distance = table(Category::Distance, &[("2020-01-01 10:00:00", "1.5")]);
        let frame = HourlyAggregate::from_table(&distance)
            .unwrap()
            .to_dataframe()
            .unwrap();

        let names: Vec<_> = frame.get_column_names().iter().map(|n| n.to_string()).collect();
        assert_eq!(names, vec!["hour", "date", "distance", "datetime"]);
        assert_eq!(frame.column("distance").unwrap().f64().unwrap().get(0), Some(1.5));
        assert_eq!(frame.column("datetime").unwrap().str().unwrap().get(0), Some("2020-01-01"));
    }
}
