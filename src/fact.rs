//! Fact builder
//!
//! Turns each record into a [`FactRow`] referencing the five dimensions by
//! surrogate key. Records with bad standalone values (a flag that is not
//! `Yes`/`No`, a non-integer id or fatality count, an id already held by an
//! accepted record) are excluded and reported as [`DataQualityIssue`]s. A
//! natural key that does not resolve is a consistency error and aborts the
//! build.

use crate::dimension::SurrogateKey;
use crate::error::{Result, WarehouseError};
use crate::record::{CrashRecord, Value};
use crate::resolver::ResolverSet;
use crate::schema::{Attribute, Family, SourceSchema};
use fnv::FnvHashSet;
use serde::Serialize;
use tracing::{error, info, warn};

/// One row of `fact_crash`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FactRow {
    /// Source record id, reused as the fact primary key
    pub crash_id: i64,
    /// External crash id, passed through unchanged
    pub original_id: Value,
    pub date_id: SurrogateKey,
    pub location_id: SurrogateKey,
    pub road_id: SurrogateKey,
    pub person_id: SurrogateKey,
    pub vehicle_id: SurrogateKey,
    pub crash_type: Value,
    pub number_fatalities: i64,
    pub christmas_period: bool,
    pub easter_period: bool,
}

impl FactRow {
    /// Foreign key of this row into `family`
    pub fn foreign_key(&self, family: Family) -> SurrogateKey {
        match family {
            Family::Date => self.date_id,
            Family::Location => self.location_id,
            Family::Road => self.road_id,
            Family::Person => self.person_id,
            Family::Vehicle => self.vehicle_id,
        }
    }
}

/// A record excluded from the fact table
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DataQualityIssue {
    /// Zero-based position of the record in source order
    pub row: usize,
    /// Record id, when it could be read
    pub record_id: Option<i64>,
    pub attribute: Attribute,
    pub value: Value,
    pub reason: String,
}

/// Map the two-valued `Yes`/`No` domain onto a boolean
pub fn parse_flag(value: &Value) -> Option<bool> {
    match value.as_text() {
        Some("Yes") => Some(true),
        Some("No") => Some(false),
        _ => None,
    }
}

/// Output of the fact stage
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FactTable {
    pub rows: Vec<FactRow>,
    pub issues: Vec<DataQualityIssue>,
    /// Number of distinct records excluded (a record may have several issues)
    pub excluded_records: usize,
}

/// Resolves records against finished dimensions
pub struct FactBuilder<'a> {
    schema: &'a SourceSchema,
    resolvers: &'a ResolverSet,
}

impl<'a> FactBuilder<'a> {
    pub fn new(schema: &'a SourceSchema, resolvers: &'a ResolverSet) -> Self {
        Self { schema, resolvers }
    }

    /// Build one fact row per valid record, in source order
    pub fn build(&self, records: &[CrashRecord]) -> Result<FactTable> {
        let mut table = FactTable::default();
        let mut seen_ids: FnvHashSet<i64> = FnvHashSet::default();

        for (row, record) in records.iter().enumerate() {
            let mut issues = Vec::new();
            let fact = self.build_row(record, row, &mut seen_ids, &mut issues)?;
            match fact {
                Some(fact) => table.rows.push(fact),
                None => {
                    for issue in &issues {
                        warn!(
                            row = issue.row,
                            attribute = %issue.attribute,
                            value = %issue.value,
                            "excluding record: {}",
                            issue.reason
                        );
                    }
                    table.excluded_records += 1;
                    table.issues.extend(issues);
                }
            }
        }

        info!(
            rows = table.rows.len(),
            excluded = table.excluded_records,
            "built fact table"
        );
        Ok(table)
    }

    /// Returns `Ok(None)` when the record has data-quality issues
    fn build_row(
        &self,
        record: &CrashRecord,
        row: usize,
        seen_ids: &mut FnvHashSet<i64>,
        issues: &mut Vec<DataQualityIssue>,
    ) -> Result<Option<FactRow>> {
        let id_value = self.schema.value(record, Attribute::RecordId, row)?;
        let record_id = id_value.as_int();
        let mut issue = |attribute: Attribute, value: &Value, reason: &str| {
            issues.push(DataQualityIssue {
                row,
                record_id,
                attribute,
                value: value.clone(),
                reason: reason.to_string(),
            });
        };

        match record_id {
            None => issue(Attribute::RecordId, id_value, "record id is not an integer"),
            Some(id) if seen_ids.contains(&id) => {
                issue(Attribute::RecordId, id_value, "duplicate record id")
            }
            Some(_) => {}
        }

        let fatalities_value = self.schema.value(record, Attribute::NumberFatalities, row)?;
        let fatalities = fatalities_value.as_int().filter(|n| *n >= 0);
        if fatalities.is_none() {
            issue(
                Attribute::NumberFatalities,
                fatalities_value,
                "fatality count is not a non-negative integer",
            );
        }

        let mut flag = |attribute: Attribute| -> Result<Option<bool>> {
            let value = self.schema.value(record, attribute, row)?;
            let parsed = parse_flag(value);
            if parsed.is_none() {
                issue(attribute, value, "expected Yes or No");
            }
            Ok(parsed)
        };
        let christmas = flag(Attribute::ChristmasPeriod)?;
        let easter = flag(Attribute::EasterPeriod)?;

        let (Some(crash_id), Some(number_fatalities), Some(christmas_period), Some(easter_period)) =
            (record_id, fatalities, christmas, easter)
        else {
            return Ok(None);
        };
        if !issues.is_empty() {
            // duplicate id: the id parsed but was already taken
            return Ok(None);
        }
        // only accepted records claim their id
        seen_ids.insert(crash_id);

        let mut keys = [0; 5];
        for family in Family::ALL {
            keys[family.index()] = self.resolve(record, family, row)?;
        }

        Ok(Some(FactRow {
            crash_id,
            original_id: self.schema.value(record, Attribute::OriginalId, row)?.clone(),
            date_id: keys[Family::Date.index()],
            location_id: keys[Family::Location.index()],
            road_id: keys[Family::Road.index()],
            person_id: keys[Family::Person.index()],
            vehicle_id: keys[Family::Vehicle.index()],
            crash_type: self.schema.value(record, Attribute::CrashType, row)?.clone(),
            number_fatalities,
            christmas_period,
            easter_period,
        }))
    }

    fn resolve(&self, record: &CrashRecord, family: Family, row: usize) -> Result<SurrogateKey> {
        let natural_key = self.schema.natural_key(record, family, row)?;
        self.resolvers
            .get(family)
            .resolve(&natural_key)
            .ok_or_else(|| {
                let key = format!("{:?}", natural_key);
                error!(family = %family, row, key = %key, "natural key missing from dimension");
                WarehouseError::Consistency { family, row, key }
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_flag() {
        assert_eq!(parse_flag(&Value::text("Yes")), Some(true));
        assert_eq!(parse_flag(&Value::text("No")), Some(false));
        assert_eq!(parse_flag(&Value::text("yes")), None);
        assert_eq!(parse_flag(&Value::text("Maybe")), None);
        assert_eq!(parse_flag(&Value::Null), None);
        assert_eq!(parse_flag(&Value::Int(1)), None);
    }

    #[test]
    fn test_foreign_key_accessor() {
        let row = FactRow {
            crash_id: 1,
            original_id: Value::Int(20231001),
            date_id: 1,
            location_id: 2,
            road_id: 3,
            person_id: 4,
            vehicle_id: 5,
            crash_type: Value::text("Single"),
            number_fatalities: 1,
            christmas_period: false,
            easter_period: false,
        };
        let keys: Vec<_> = Family::ALL.into_iter().map(|f| row.foreign_key(f)).collect();
        assert_eq!(keys, vec![1, 2, 3, 4, 5]);
    }

    fn record(id: impl Into<Value>) -> CrashRecord {
        let mut r = CrashRecord::new();
        for attribute in Attribute::ALL {
            r.insert(attribute.default_source_column(), Value::text("No"));
        }
        r.with("ID", id).with("Number Fatalities", 1)
    }

    fn build(records: &[CrashRecord]) -> FactTable {
        let schema = SourceSchema::default();
        let dims = crate::dimension::DimensionSet::build(records, &schema).unwrap();
        let resolvers = ResolverSet::from_dimensions(&dims);
        FactBuilder::new(&schema, &resolvers).build(records).unwrap()
    }

    #[test]
    fn test_bad_ids_are_excluded() {
        let facts = build(&[record(1), record("A7"), record(1), record(2)]);
        let ids: Vec<_> = facts.rows.iter().map(|f| f.crash_id).collect();
        assert_eq!(ids, vec![1, 2]);
        assert_eq!(facts.excluded_records, 2);
        assert_eq!(facts.issues[0].reason, "record id is not an integer");
        assert_eq!(facts.issues[0].record_id, None);
        assert_eq!(facts.issues[1].reason, "duplicate record id");
        assert_eq!(facts.issues[1].row, 2);
    }

    #[test]
    fn test_excluded_record_does_not_claim_its_id() {
        let facts = build(&[record(1).with("Christmas Period", "Maybe"), record(1)]);
        assert_eq!(facts.rows.len(), 1);
        assert_eq!(facts.rows[0].crash_id, 1);
        assert_eq!(facts.excluded_records, 1);
        assert_eq!(facts.issues.len(), 1);
        assert_eq!(facts.issues[0].attribute, Attribute::ChristmasPeriod);
        assert_eq!(facts.issues[0].row, 0);
    }

    #[test]
    fn test_bad_fatalities_are_excluded() {
        let facts = build(&[
            record(1).with("Number Fatalities", -1),
            record(2).with("Number Fatalities", "two"),
            record(3).with("Number Fatalities", Value::Null),
            record(4).with("Number Fatalities", 0),
        ]);
        assert_eq!(facts.rows.len(), 1);
        assert_eq!(facts.rows[0].number_fatalities, 0);
        assert_eq!(facts.excluded_records, 3);
        assert!(facts
            .issues
            .iter()
            .all(|i| i.attribute == Attribute::NumberFatalities));
    }

    #[test]
    fn test_one_record_with_several_issues_counts_once() {
        let facts = build(&[record(1)
            .with("Christmas Period", "Maybe")
            .with("Easter Period", "")]);
        assert!(facts.rows.is_empty());
        assert_eq!(facts.excluded_records, 1);
        assert_eq!(facts.issues.len(), 2);
    }

    #[test]
    fn test_flags_and_passthrough_columns() {
        let facts = build(&[record(9)
            .with("Christmas Period", "Yes")
            .with("Crash ID", 20231009)
            .with("Crash Type", "Multiple")]);
        let row = &facts.rows[0];
        assert!(row.christmas_period);
        assert!(!row.easter_period);
        assert_eq!(row.original_id, Value::Int(20231009));
        assert_eq!(row.crash_type, Value::text("Multiple"));
    }
}
