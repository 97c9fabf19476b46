//! Dataset profile
//!
//! A quick look at the raw records before building: shape, inferred type and
//! missing values per column, count/mean/min/max of the integer columns, value
//! counts for the categorical attributes the reports group on, and crash counts
//! per year and month.

use crate::record::Value;
use crate::schema::{Attribute, SourceSchema};
use crate::source::RecordSet;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use std::fmt::{self, Write};

/// Attributes whose value distribution is profiled
pub const PROFILED_ATTRIBUTES: [Attribute; 10] = [
    Attribute::State,
    Attribute::TimeOfDay,
    Attribute::AgeGroup,
    Attribute::RoadUserType,
    Attribute::Gender,
    Attribute::SpeedLimit,
    Attribute::CrashType,
    Attribute::RemotenessArea,
    Attribute::RoadType,
    Attribute::ArticulatedTruckInvolvement,
];

/// Type of a column inferred from its non-null cells
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnType {
    Integer,
    Text,
    /// Both integer and text cells
    Mixed,
    /// Every cell is null
    Empty,
}

impl ColumnType {
    fn infer<'a>(values: impl Iterator<Item = &'a Value>) -> Self {
        let (mut ints, mut texts) = (false, false);
        for value in values {
            match value {
                Value::Int(_) => ints = true,
                Value::Text(_) => texts = true,
                Value::Null => {}
            }
        }
        match (ints, texts) {
            (true, false) => ColumnType::Integer,
            (false, true) => ColumnType::Text,
            (true, true) => ColumnType::Mixed,
            (false, false) => ColumnType::Empty,
        }
    }
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ColumnType::Integer => "integer",
            ColumnType::Text => "text",
            ColumnType::Mixed => "mixed",
            ColumnType::Empty => "empty",
        };
        f.write_str(name)
    }
}

/// Type and missing-value count of one source column
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ColumnProfile {
    pub name: String,
    pub dtype: ColumnType,
    pub missing: usize,
}

/// Count, mean, min and max of the integer cells of one column
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NumericSummary {
    pub column: String,
    pub count: usize,
    pub mean: f64,
    pub min: i64,
    pub max: i64,
}

impl NumericSummary {
    /// `None` when the column holds no integer cell
    fn from_values<'a>(column: &str, values: impl Iterator<Item = &'a Value>) -> Option<Self> {
        let ints: Vec<i64> = values.filter_map(Value::as_int).collect();
        let min = *ints.iter().min()?;
        let max = *ints.iter().max()?;
        let sum: i128 = ints.iter().map(|&n| i128::from(n)).sum();
        Some(Self {
            column: column.to_string(),
            count: ints.len(),
            mean: sum as f64 / ints.len() as f64,
            min,
            max,
        })
    }
}

/// Value distribution of one attribute, most frequent first
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValueCounts {
    pub attribute: Attribute,
    pub column: String,
    pub counts: Vec<(Value, usize)>,
}

/// Number of records in one year and month
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PeriodCount {
    pub year: Value,
    pub month: Value,
    pub crashes: usize,
}

/// Shape and distributions of a record set
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DatasetProfile {
    pub rows: usize,
    pub columns: Vec<ColumnProfile>,
    /// Columns inferred as integer, in header order
    pub numeric: Vec<NumericSummary>,
    pub distributions: Vec<ValueCounts>,
    /// Ordered by year then month; empty when either column is absent
    pub year_month: Vec<PeriodCount>,
}

/// Cells of one column, skipping records that lack it
fn cells<'a>(records: &'a RecordSet, column: &'a str) -> impl Iterator<Item = &'a Value> + 'a {
    records.records.iter().filter_map(move |r| r.get(column))
}

impl DatasetProfile {
    /// Profile `records`; attributes whose column is absent are skipped
    pub fn from_records(records: &RecordSet, schema: &SourceSchema) -> Self {
        let columns: Vec<ColumnProfile> = records
            .headers
            .iter()
            .map(|name| ColumnProfile {
                name: name.clone(),
                dtype: ColumnType::infer(cells(records, name)),
                missing: records
                    .records
                    .iter()
                    .filter(|r| r.get(name).map_or(true, Value::is_null))
                    .count(),
            })
            .collect();

        let numeric = columns
            .iter()
            .filter(|c| c.dtype == ColumnType::Integer)
            .filter_map(|c| NumericSummary::from_values(&c.name, cells(records, &c.name)))
            .collect();

        let has_column = |attribute: Attribute| {
            records.headers.iter().any(|h| h == schema.column(attribute))
        };

        let distributions = PROFILED_ATTRIBUTES
            .iter()
            .filter(|a| has_column(**a))
            .map(|&attribute| {
                let column = schema.column(attribute);
                let mut tally: HashMap<&Value, usize> = HashMap::new();
                for record in &records.records {
                    if let Some(value) = record.get(column) {
                        *tally.entry(value).or_insert(0) += 1;
                    }
                }
                let mut counts: Vec<(Value, usize)> =
                    tally.into_iter().map(|(v, n)| (v.clone(), n)).collect();
                counts.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
                ValueCounts {
                    attribute,
                    column: column.to_string(),
                    counts,
                }
            })
            .collect();

        let mut year_month = Vec::new();
        if has_column(Attribute::Year) && has_column(Attribute::Month) {
            let year_col = schema.column(Attribute::Year);
            let month_col = schema.column(Attribute::Month);
            let mut tally: BTreeMap<(&Value, &Value), usize> = BTreeMap::new();
            for record in &records.records {
                if let (Some(year), Some(month)) = (record.get(year_col), record.get(month_col)) {
                    *tally.entry((year, month)).or_insert(0) += 1;
                }
            }
            year_month = tally
                .into_iter()
                .map(|((year, month), crashes)| PeriodCount {
                    year: year.clone(),
                    month: month.clone(),
                    crashes,
                })
                .collect();
        }

        Self {
            rows: records.len(),
            columns,
            numeric,
            distributions,
            year_month,
        }
    }

    /// Columns with at least one missing value
    pub fn columns_with_missing(&self) -> impl Iterator<Item = &ColumnProfile> {
        self.columns.iter().filter(|c| c.missing > 0)
    }

    /// Plain-text rendering
    pub fn render(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "Dataset shape: {} rows x {} columns", self.rows, self.columns.len());
        let _ = writeln!(out, "\nColumns:");
        for column in &self.columns {
            let _ = writeln!(out, "  {:<40} {}", column.name, column.dtype);
        }

        let _ = writeln!(out, "\nMissing values:");
        let mut any_missing = false;
        for column in self.columns_with_missing() {
            any_missing = true;
            let _ = writeln!(out, "  {}: {}", column.name, column.missing);
        }
        if !any_missing {
            let _ = writeln!(out, "  none");
        }

        if !self.numeric.is_empty() {
            let _ = writeln!(out, "\nNumeric columns:");
            let _ = writeln!(
                out,
                "  {:<28} {:>8} {:>12} {:>10} {:>10}",
                "column", "count", "mean", "min", "max"
            );
            for n in &self.numeric {
                let _ = writeln!(
                    out,
                    "  {:<28} {:>8} {:>12.2} {:>10} {:>10}",
                    n.column, n.count, n.mean, n.min, n.max
                );
            }
        }

        for dist in &self.distributions {
            let _ = writeln!(out, "\n{} ({}):", dist.attribute, dist.column);
            for (value, count) in &dist.counts {
                let _ = writeln!(out, "  {:<40} {}", value.label(), count);
            }
        }

        if !self.year_month.is_empty() {
            let _ = writeln!(out, "\nCrashes by year and month:");
            for period in &self.year_month {
                let _ = writeln!(
                    out,
                    "  {}-{}: {}",
                    period.year.label(),
                    period.month.label(),
                    period.crashes
                );
            }
        }
        out
    }
}
