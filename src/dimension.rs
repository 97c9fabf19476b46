//! Dimension builder
//!
//! Extracts the distinct natural-key tuples of each family from the record
//! sequence and assigns dense surrogate keys in order of first appearance.
//!
//! # Invariants
//!
//! - Natural keys are unique within a table (nulls are ordinary values)
//! - Surrogate keys are `1..=len`, assigned in source order of first occurrence
//! - Derived columns depend on the natural key only

use crate::error::Result;
use crate::record::{CrashRecord, Value};
use crate::schema::{Family, SourceSchema};
use fnv::FnvHashSet;
use serde::Serialize;
use tracing::info;

/// Tuple of attribute values identifying a dimension member
pub type NaturalKey = Vec<Value>;

/// Synthetic integer key of a dimension row (starts at 1)
pub type SurrogateKey = i64;

const MONTH_NAMES: [&str; 12] = [
    "January",
    "February",
    "March",
    "April",
    "May",
    "June",
    "July",
    "August",
    "September",
    "October",
    "November",
    "December",
];

/// Month name for a 1-based month number
pub fn month_name(month: &Value) -> Option<&'static str> {
    let month = month.as_int()?;
    if (1..=12).contains(&month) {
        Some(MONTH_NAMES[(month - 1) as usize])
    } else {
        None
    }
}

/// Saturday and Sunday are weekend days
pub fn is_weekend(day_of_week: &Value) -> bool {
    matches!(day_of_week.as_text(), Some("Saturday") | Some("Sunday"))
}

/// Family-specific columns computed from the natural key
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum DerivedColumns {
    None,
    Date {
        month_name: Option<&'static str>,
        is_weekend: bool,
        /// Always false: no holiday calendar is consulted
        is_holiday: bool,
    },
}

impl DerivedColumns {
    fn derive(family: Family, natural_key: &[Value]) -> Self {
        match family {
            Family::Date => DerivedColumns::Date {
                month_name: month_name(&natural_key[1]),
                is_weekend: is_weekend(&natural_key[2]),
                is_holiday: false,
            },
            _ => DerivedColumns::None,
        }
    }
}

/// One member of a dimension
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DimensionRow {
    pub key: SurrogateKey,
    pub natural_key: NaturalKey,
    pub derived: DerivedColumns,
}

/// Deduplicated table of one dimension family
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DimensionTable {
    family: Family,
    rows: Vec<DimensionRow>,
}

impl DimensionTable {
    /// Build the table for `family` from the full record sequence
    pub fn build(family: Family, records: &[CrashRecord], schema: &SourceSchema) -> Result<Self> {
        let mut seen: FnvHashSet<NaturalKey> = FnvHashSet::default();
        let mut rows = Vec::new();

        for (row, record) in records.iter().enumerate() {
            let natural_key = schema.natural_key(record, family, row)?;
            if seen.contains(&natural_key) {
                continue;
            }
            seen.insert(natural_key.clone());
            let key = rows.len() as SurrogateKey + 1;
            let derived = DerivedColumns::derive(family, &natural_key);
            rows.push(DimensionRow {
                key,
                natural_key,
                derived,
            });
        }

        info!(family = %family, rows = rows.len(), "built dimension");
        Ok(Self { family, rows })
    }

    pub fn family(&self) -> Family {
        self.family
    }

    pub fn rows(&self) -> &[DimensionRow] {
        &self.rows
    }

    /// Row with surrogate key `key`
    pub fn get(&self, key: SurrogateKey) -> Option<&DimensionRow> {
        let index = usize::try_from(key).ok()?.checked_sub(1)?;
        self.rows.get(index)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// The five dimension tables of one build
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DimensionSet {
    tables: Vec<DimensionTable>,
}

impl DimensionSet {
    /// Build every family, in [`Family::ALL`] order
    ///
    /// The source schema is checked against every record first, so a missing
    /// column fails before any table exists.
    pub fn build(records: &[CrashRecord], schema: &SourceSchema) -> Result<Self> {
        schema.check_records(records)?;
        let tables = Family::ALL
            .into_iter()
            .map(|family| DimensionTable::build(family, records, schema))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { tables })
    }

    pub fn get(&self, family: Family) -> &DimensionTable {
        &self.tables[family.index()]
    }

    pub fn iter(&self) -> impl Iterator<Item = &DimensionTable> {
        self.tables.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::WarehouseError;

    fn road(road_type: Value, speed: Value) -> CrashRecord {
        CrashRecord::new()
            .with("National Road Type", road_type)
            .with("Speed Limit", speed)
    }

    #[test]
    fn test_first_appearance_order() {
        let records = vec![
            road(Value::text("Local Road"), Value::Int(50)),
            road(Value::text("Arterial Road"), Value::Int(80)),
            road(Value::text("Local Road"), Value::Int(50)),
            road(Value::text("Arterial Road"), Value::Int(60)),
        ];
        let table = DimensionTable::build(Family::Road, &records, &SourceSchema::default()).unwrap();

        let keys: Vec<_> = table.rows().iter().map(|r| (r.key, r.natural_key.clone())).collect();
        assert_eq!(
            keys,
            vec![
                (1, vec![Value::text("Local Road"), Value::Int(50)]),
                (2, vec![Value::text("Arterial Road"), Value::Int(80)]),
                (3, vec![Value::text("Arterial Road"), Value::Int(60)]),
            ]
        );
    }

    #[test]
    fn test_nulls_are_distinct_values() {
        let records = vec![
            road(Value::Null, Value::Int(50)),
            road(Value::text(""), Value::Int(50)),
            road(Value::Null, Value::Int(50)),
        ];
        let table = DimensionTable::build(Family::Road, &records, &SourceSchema::default()).unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(table.rows()[0].natural_key[0], Value::Null);
    }

    #[test]
    fn test_get_by_surrogate_key() {
        let records = vec![road(Value::text("A"), Value::Int(1)), road(Value::text("B"), Value::Int(2))];
        let table = DimensionTable::build(Family::Road, &records, &SourceSchema::default()).unwrap();
        assert_eq!(table.get(2).unwrap().natural_key[0], Value::text("B"));
        assert!(table.get(0).is_none());
        assert!(table.get(3).is_none());
        assert!(table.get(-1).is_none());
    }

    #[test]
    fn test_date_derived_columns() {
        let record = CrashRecord::new()
            .with("Year", 2021)
            .with("Month", 12)
            .with("Dayweek", "Sunday")
            .with("Time of day", "Night");
        let table = DimensionTable::build(Family::Date, &[record], &SourceSchema::default()).unwrap();
        assert_eq!(
            table.rows()[0].derived,
            DerivedColumns::Date {
                month_name: Some("December"),
                is_weekend: true,
                is_holiday: false,
            }
        );
    }

    #[test]
    fn test_month_name_and_weekend() {
        assert_eq!(month_name(&Value::Int(1)), Some("January"));
        assert_eq!(month_name(&Value::Int(13)), None);
        assert_eq!(month_name(&Value::Null), None);
        assert!(is_weekend(&Value::text("Saturday")));
        assert!(!is_weekend(&Value::text("Friday")));
        assert!(!is_weekend(&Value::text("sunday")));
    }

    #[test]
    fn test_missing_column_is_fatal() {
        let records = vec![CrashRecord::new().with("National Road Type", "Local Road")];
        let err = DimensionTable::build(Family::Road, &records, &SourceSchema::default()).unwrap_err();
        assert!(matches!(err, WarehouseError::MissingField { column, .. } if column == "Speed Limit"));
    }

    #[test]
    fn test_empty_input_gives_empty_tables() {
        let set = DimensionSet::build(&[], &SourceSchema::default()).unwrap();
        assert!(set.iter().all(DimensionTable::is_empty));
        assert_eq!(set.get(Family::Person).family(), Family::Person);
    }
}
