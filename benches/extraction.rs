//! Extraction benchmarks: document parsing, category extraction and
//! hourly aggregation over a synthetic export.

use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};
use health_export::{Category, CategoryExtractor, HourlyAggregate, RecordStore};
use std::fmt::Write;

// =============================================================================
// Helper Functions
// =============================================================================

/// Build an export with `records` step and heart rate records spread over days
fn generate_export(records: usize) -> String {
    let mut xml = String::from("<HealthData>\n<Me HKCharacteristicTypeIdentifierDateOfBirth=\"1990-01-01\"/>\n");
    for i in 0..records {
        let day = 1 + (i / 96) % 28;
        let minute = (i % 96) * 15;
        let (hour, min) = (minute / 60, minute % 60);
        let identifier = if i % 2 == 0 {
            "HKQuantityTypeIdentifierStepCount"
        } else {
            "HKQuantityTypeIdentifierHeartRate"
        };
        let _ = writeln!(
            xml,
            r#"<Record type="{identifier}" startDate="2020-01-{day:02} {hour:02}:{min:02}:00 -0600" endDate="2020-01-{day:02} {hour:02}:{min:02}:30 -0600" value="{}"/>"#,
            60 + i % 40
        );
    }
    xml.push_str("</HealthData>\n");
    xml
}

// =============================================================================
// Benchmarks
// =============================================================================

fn bench_parse_store(c: &mut Criterion) {
    let mut group = c.benchmark_group("parse_store");
    for records in [1_000usize, 10_000] {
        let xml = generate_export(records);
        group.throughput(Throughput::Bytes(xml.len() as u64));
        group.bench_with_input(BenchmarkId::from_parameter(records), &xml, |b, xml| {
            b.iter(|| RecordStore::from_xml_str(black_box(xml), "Record"))
        });
    }
    group.finish();
}

fn bench_extract(c: &mut Criterion) {
    let xml = generate_export(10_000);
    let Ok(store) = RecordStore::from_xml_str(&xml, "Record") else {
        return;
    };
    let extractor = CategoryExtractor::default();

    c.bench_function("extract_heart_rate_sorted", |b| {
        b.iter(|| extractor.extract(black_box(&store), Category::HeartRate))
    });
    c.bench_function("extract_and_aggregate_steps", |b| {
        b.iter(|| {
            extractor
                .extract(black_box(&store), Category::StepCount)
                .and_then(|table| HourlyAggregate::from_table(&table))
        })
    });
}

criterion_group!(benches, bench_parse_store, bench_extract);
criterion_main!(benches);
