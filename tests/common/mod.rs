// Shared fixtures for the integration tests

#![allow(dead_code)]

use crashwh::record::{CrashRecord, Value};
use crashwh::schema::Attribute;
use crashwh::source::RecordSet;
use std::path::PathBuf;

/// Eight records: one excluded (Christmas Period = "Maybe"), two NSW/Monday
/// records sharing every dimension attribute
pub fn sample_csv() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/crashes_sample.csv")
}

pub fn sample_records() -> RecordSet {
    RecordSet::from_path(sample_csv()).expect("fixture loads")
}

/// A record with every attribute present under its default header
///
/// Dimension attributes default to fixed text; callers override what they test.
pub fn base_record(id: i64) -> CrashRecord {
    let mut record = CrashRecord::new();
    for attribute in Attribute::ALL {
        record.insert(attribute.default_source_column(), Value::text("Unspecified"));
    }
    record
        .with("ID", id)
        .with("Crash ID", 20_230_000 + id)
        .with("Year", 2023)
        .with("Month", 1)
        .with("Dayweek", "Monday")
        .with("Speed Limit", 100)
        .with("Age", 30)
        .with("Number Fatalities", 1)
        .with("Christmas Period", "No")
        .with("Easter Period", "No")
}
