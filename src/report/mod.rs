//! Aggregation and reporting over a built warehouse
//!
//! Each report is a measure (fatalities or crash count) grouped by one
//! dimension attribute, joined through the fact table's foreign key.

mod aggregate;
mod ordering;
mod summary;
mod writer;

pub use aggregate::{
    Aggregator, Measure, ReportDefinition, ReportRow, ReportSet, ReportSpec, ReportTable,
};
pub use ordering::{AgeGroup, DayOfWeek, ReportOrder};
pub use summary::{SummaryReport, SummarySection, TOP_N};
pub use writer::{write_reports_csv, write_table_csv, ReportWriter, JSON_FILE, SUMMARY_FILE};
