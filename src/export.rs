//! CSV export of category tables.
//!
//! Writes one CSV per category under the configured output directory.
//! Each category runs inside its own fault boundary so a missing or
//! malformed category only fails itself.

use crate::config::ExtractionConfig;
use crate::constants::columns;
use crate::error::{HealthError, Result};
use crate::extractor::{CategoryExtractor, CategoryTable, stand_hour_indicator};
use crate::models::Category;
use crate::report::CollectionReport;
use crate::store::RecordStore;
use polars::prelude::*;
use std::fs::File;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// A CSV file written for one category
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportedFile {
    pub path: PathBuf,
    pub rows: usize,
}

/// Writes category tables as CSV files
#[derive(Debug, Clone)]
pub struct CsvExporter {
    output_dir: PathBuf,
    datetime_format: String,
}

impl CsvExporter {
    pub fn new(config: &ExtractionConfig) -> Self {
        Self {
            output_dir: config.output_dir.clone(),
            datetime_format: config.csv_datetime_format.clone(),
        }
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Target file for a category
    pub fn path_for(&self, category: Category) -> PathBuf {
        self.output_dir.join(category.csv_file_name())
    }

    /// Frame written for a table
    ///
    /// Same layout as [`CategoryTable::to_dataframe`], except stand hour
    /// values are written as 1 (stood) or 0 and the nested beat metadata of
    /// variability rows is left out.
    pub fn export_frame(table: &CategoryTable) -> Result<DataFrame> {
        match table.category() {
            Category::StandHour => {
                let indicators: Vec<u32> = table
                    .iter()
                    .map(|row| u32::from(stand_hour_indicator(row.value())))
                    .collect();
                let column = Column::new(table.category().value_column().into(), indicators);
                table.assemble_frame(column)
            }
            Category::HeartRateVariability => {
                Ok(table.to_dataframe()?.drop(columns::INSTANTANEOUS_BPM)?)
            }
            _ => table.to_dataframe(),
        }
    }

    /// Write one table, replacing any previous file for its category
    pub fn write_table(&self, table: &CategoryTable) -> Result<ExportedFile> {
        std::fs::create_dir_all(&self.output_dir)?;

        let path = self.path_for(table.category());
        let mut frame = Self::export_frame(table)?;

        let mut file = File::create(&path)?;
        CsvWriter::new(&mut file)
            .include_header(true)
            .with_datetime_format(Some(self.datetime_format.clone()))
            .finish(&mut frame)?;

        debug!("Wrote {} rows to {}", table.len(), path.display());

        Ok(ExportedFile {
            path,
            rows: table.len(),
        })
    }

    /// Extract and write every category
    ///
    /// A category with no records is reported as failed and no file is
    /// written for it.
    pub fn export_all(
        &self,
        store: &RecordStore,
        extractor: &CategoryExtractor,
    ) -> Result<CollectionReport<ExportedFile>> {
        self.export_categories(store, extractor, &Category::ALL, |_| {})
    }

    /// Extract and write the given categories, calling `on_done` after each
    pub fn export_categories<F>(
        &self,
        store: &RecordStore,
        extractor: &CategoryExtractor,
        categories: &[Category],
        mut on_done: F,
    ) -> Result<CollectionReport<ExportedFile>>
    where
        F: FnMut(Category),
    {
        info!(
            "Exporting {} categories to {}",
            categories.len(),
            self.output_dir.display()
        );

        CollectionReport::collect(categories, |category| {
            let result = extractor.extract(store, category).and_then(|table| {
                if table.is_empty() {
                    return Err(HealthError::EmptyCategory {
                        category: category.to_string(),
                    });
                }
                self.write_table(&table)
            });
            on_done(category);
            result
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::RecordValue;
    use chrono::NaiveDateTime;
    use tempfile::TempDir;

    const EXPORT: &str = r#"<HealthData>
        <Record type="HKQuantityTypeIdentifierHeartRate" startDate="2020-01-01 10:00:00 -0600" endDate="2020-01-01 10:00:00 -0600" value="72"/>
        <Record type="HKQuantityTypeIdentifierHeartRate" startDate="2020-01-01 09:30:00 -0600" endDate="2020-01-01 09:30:05 -0600" value="65.5"/>
        <Record type="HKCategoryTypeIdentifierAppleStandHour" startDate="2020-01-01 09:00:00 -0600" endDate="2020-01-01 10:00:00 -0600" value="HKCategoryValueAppleStandHourStood"/>
        <Record type="HKCategoryTypeIdentifierAppleStandHour" startDate="2020-01-01 10:00:00 -0600" endDate="2020-01-01 11:00:00 -0600" value="HKCategoryValueAppleStandHourIdle"/>
        <Record type="HKQuantityTypeIdentifierStepCount" startDate="2020-01-01 10:00:00 -0600" endDate="2020-01-01 10:10:00 -0600" value="120"/>
    </HealthData>"#;

    fn read_as_text(path: &Path) -> DataFrame {
        CsvReadOptions::default()
            .with_has_header(true)
            .with_infer_schema_length(Some(0))
            .try_into_reader_with_file_path(Some(path.to_path_buf()))
            .unwrap()
            .finish()
            .unwrap()
    }

    fn text(frame: &DataFrame, column: &str, row: usize) -> String {
        frame
            .column(column)
            .unwrap()
            .str()
            .unwrap()
            .get(row)
            .unwrap()
            .to_string()
    }

    #[test]
    fn test_round_trip_preserves_rows() {
        let temp_dir = TempDir::new().unwrap();
        let config = ExtractionConfig::default().with_output_dir(temp_dir.path());
        let store = RecordStore::from_xml_str(EXPORT, "Record").unwrap();
        let table = CategoryExtractor::new(config.clone())
            .heart_rate(&store)
            .unwrap();

        let exported = CsvExporter::new(&config).write_table(&table).unwrap();
        assert_eq!(exported.path, temp_dir.path().join("heart_rate.csv"));
        assert_eq!(exported.rows, 2);

        let frame = read_as_text(&exported.path);
        assert_eq!(frame.height(), table.len());

        let names: Vec<_> = frame.get_column_names().iter().map(|n| n.to_string()).collect();
        assert_eq!(
            names,
            vec!["start_timestamp", "end_timestamp", "heart_rate", "date", "time"]
        );

        for (index, row) in table.iter().enumerate() {
            let start =
                NaiveDateTime::parse_from_str(&text(&frame, "start_timestamp", index), "%Y-%m-%d %H:%M:%S")
                    .unwrap();
            let end =
                NaiveDateTime::parse_from_str(&text(&frame, "end_timestamp", index), "%Y-%m-%d %H:%M:%S")
                    .unwrap();
            assert_eq!(start, row.start());
            assert_eq!(end, row.end());
            assert_eq!(
                RecordValue::parse(&text(&frame, "heart_rate", index)),
                row.value().clone()
            );
            assert_eq!(text(&frame, "date", index), row.date());
        }
    }

    #[test]
    fn test_round_trip_mixed_value_column() {
        let xml = r#"<HealthData>
            <Record type="HKQuantityTypeIdentifierDistanceWalkingRunning" startDate="2020-01-01 08:00:00 -0600" endDate="2020-01-01 08:05:00 -0600" value="0.4"/>
            <Record type="HKQuantityTypeIdentifierDistanceWalkingRunning" startDate="2020-01-01 08:10:00 -0600" endDate="2020-01-01 08:15:00 -0600" value="2"/>
            <Record type="HKQuantityTypeIdentifierDistanceWalkingRunning" startDate="2020-01-01 08:20:00 -0600" endDate="2020-01-01 08:25:00 -0600" value=""/>
            <Record type="HKQuantityTypeIdentifierDistanceWalkingRunning" startDate="2020-01-01 08:30:00 -0600" endDate="2020-01-01 08:35:00 -0600" value=" x "/>
            <Record type="HKQuantityTypeIdentifierDistanceWalkingRunning" startDate="2020-01-01 08:40:00 -0600" endDate="2020-01-01 08:45:00 -0600" value="a,&quot;b"/>
        </HealthData>"#;
        let temp_dir = TempDir::new().unwrap();
        let config = ExtractionConfig::default().with_output_dir(temp_dir.path());
        let store = RecordStore::from_xml_str(xml, "Record").unwrap();
        let table = CategoryExtractor::new(config.clone()).distance(&store).unwrap();
        assert_eq!(table.rows()[4].value(), &RecordValue::Raw("a,\"b".to_string()));

        let exported = CsvExporter::new(&config).write_table(&table).unwrap();
        let frame = read_as_text(&exported.path);
        assert_eq!(frame.height(), 5);

        for (index, row) in table.iter().enumerate() {
            assert_eq!(
                RecordValue::parse(&text(&frame, "distance_walk_run", index)),
                row.value().clone()
            );
            assert_eq!(text(&frame, "hour", index), "8");
        }
    }

    #[test]
    fn test_variability_export_leaves_out_beats() {
        let xml = r#"<HealthData>
            <Record type="HKQuantityTypeIdentifierHeartRateVariabilitySDNN" startDate="2020-01-01 08:00:00 -0600" endDate="2020-01-01 08:01:00 -0600" value="41.2">
              <HeartRateVariabilityMetadataList>
                <InstantaneousBeatsPerMinute bpm="58" time="8:00:01.00 AM"/>
              </HeartRateVariabilityMetadataList>
            </Record>
            <Record type="HKQuantityTypeIdentifierHeartRateVariabilitySDNN" startDate="2020-01-01 07:00:00 -0600" endDate="2020-01-01 07:01:00 -0600" value="39"/>
        </HealthData>"#;
        let temp_dir = TempDir::new().unwrap();
        let config = ExtractionConfig::default().with_output_dir(temp_dir.path());
        let store = RecordStore::from_xml_str(xml, "Record").unwrap();
        let table = CategoryExtractor::new(config.clone())
            .heart_rate_variability(&store)
            .unwrap();
        assert!(
            table
                .to_dataframe()
                .unwrap()
                .column(columns::INSTANTANEOUS_BPM)
                .is_ok()
        );

        let exported = CsvExporter::new(&config).write_table(&table).unwrap();
        assert_eq!(
            exported.path,
            temp_dir.path().join("heart_rate_variability.csv")
        );

        let frame = read_as_text(&exported.path);
        let names: Vec<_> = frame.get_column_names().iter().map(|n| n.to_string()).collect();
        assert_eq!(
            names,
            vec!["start_timestamp", "end_timestamp", "heart_rate_variability", "date", "time"]
        );
        assert_eq!(frame.height(), 2);

        for (index, row) in table.iter().enumerate() {
            let start = NaiveDateTime::parse_from_str(
                &text(&frame, "start_timestamp", index),
                "%Y-%m-%d %H:%M:%S",
            )
            .unwrap();
            assert_eq!(start, row.start());
            assert_eq!(
                RecordValue::parse(&text(&frame, "heart_rate_variability", index)),
                row.value().clone()
            );
            assert_eq!(text(&frame, "time", index), row.time());
        }
    }

    #[test]
    fn test_stand_hour_written_as_indicator() {
        let temp_dir = TempDir::new().unwrap();
        let config = ExtractionConfig::default().with_output_dir(temp_dir.path());
        let store = RecordStore::from_xml_str(EXPORT, "Record").unwrap();
        let table = CategoryExtractor::new(config.clone())
            .stand_hour(&store)
            .unwrap();

        let exported = CsvExporter::new(&config).write_table(&table).unwrap();
        let frame = read_as_text(&exported.path);
        assert_eq!(text(&frame, "stand_hour", 0), "1");
        assert_eq!(text(&frame, "stand_hour", 1), "0");
        assert_eq!(text(&frame, "hour", 0), "9");
    }

    #[test]
    fn test_export_all_skips_empty_categories() {
        let temp_dir = TempDir::new().unwrap();
        let output_dir = temp_dir.path().join("download");
        let config = ExtractionConfig::default().with_output_dir(&output_dir);
        let store = RecordStore::from_xml_str(EXPORT, "Record").unwrap();
        let exporter = CsvExporter::new(&config);

        let report = exporter
            .export_all(&store, &CategoryExtractor::new(config.clone()))
            .unwrap();

        let written: Vec<_> = report.succeeded().map(|(category, _)| category).collect();
        assert_eq!(
            written,
            vec![Category::HeartRate, Category::StandHour, Category::StepCount]
        );
        assert_eq!(report.failure_count(), 5);
        assert!(
            report
                .failed()
                .all(|(_, e)| matches!(e, HealthError::EmptyCategory { .. }))
        );

        assert!(output_dir.join("heart_rate.csv").exists());
        assert!(output_dir.join("step_counts.csv").exists());
        assert!(!output_dir.join("basal_energy.csv").exists());
    }

    #[test]
    fn test_export_categories_reports_progress() {
        let temp_dir = TempDir::new().unwrap();
        let config = ExtractionConfig::default().with_output_dir(temp_dir.path());
        let store = RecordStore::from_xml_str(EXPORT, "Record").unwrap();

        let mut seen = Vec::new();
        let report = CsvExporter::new(&config)
            .export_categories(
                &store,
                &CategoryExtractor::new(config.clone()),
                &[Category::StepCount, Category::Distance],
                |category| seen.push(category),
            )
            .unwrap();

        assert_eq!(seen, vec![Category::StepCount, Category::Distance]);
        assert_eq!(report.success_count(), 1);
    }
}
