//! Health Export Library
//!
//! A Rust library for extracting per-category time series and a personal
//! profile from Apple Health XML exports.
//!
//! This library provides tools for:
//! - Parsing the export document once into an in-memory record store
//! - Decoding offset-suffixed timestamps and numeric-or-text values
//! - Building per-category tables with derived date, time and hour columns
//! - Summing hourly categories into hour-by-date buckets
//! - Reading the profile card from the `Me` node and body measurements
//! - Writing one CSV per category with per-category failure reporting

pub mod aggregate;
pub mod cli;
pub mod config;
pub mod constants;
pub mod decode;
pub mod error;
pub mod export;
pub mod extractor;
pub mod models;
pub mod profile;
pub mod range;
pub mod report;
pub mod session;
pub mod store;

// Re-export commonly used types
pub use aggregate::{HourlyAggregate, HourlyBucket};
pub use config::{ExtractionConfig, MalformedPolicy, OffsetPolicy};
pub use error::{HealthError, Result};
pub use export::{CsvExporter, ExportedFile};
pub use extractor::{CategoryExtractor, CategoryTable, TableRow};
pub use models::{BeatMetadata, Category, DecodedRow, RawRecord, RecordValue};
pub use profile::{BodyMeasurement, BodySnapshot, ProfileRecord};
pub use range::DateRange;
pub use report::{CategoryOutcome, CollectionReport};
pub use session::{CategoryView, GenerationSession, GenerationState};
pub use store::RecordStore;
