// Star schema invariants: deduplication, key totality, determinism, row conservation

mod common;

use common::{base_record, sample_records};
use crashwh::dimension::DimensionSet;
use crashwh::pipeline::WarehouseBuild;
use crashwh::record::Value;
use crashwh::report::{Aggregator, Measure, ReportSpec};
use crashwh::resolver::ResolverSet;
use crashwh::schema::{Attribute, Family, SourceSchema};
use crashwh::warehouse::WarehouseStore;
use crashwh::WarehouseError;
use std::collections::HashSet;

fn build_sample() -> WarehouseBuild {
    let source = sample_records();
    WarehouseBuild::from_records(&source.records, &SourceSchema::default()).unwrap()
}

fn load(build: &WarehouseBuild) -> WarehouseStore {
    let mut store = WarehouseStore::in_memory().unwrap();
    store.load(&build.dimensions, &build.facts.rows).unwrap();
    store
}

// ============================================================================
// Dimension deduplication
// ============================================================================

#[test]
fn test_dimension_rows_match_distinct_natural_keys() {
    let source = sample_records();
    let schema = SourceSchema::default();
    let dims = DimensionSet::build(&source.records, &schema).unwrap();

    for family in Family::ALL {
        let distinct: HashSet<Vec<Value>> = source
            .records
            .iter()
            .enumerate()
            .map(|(row, r)| schema.natural_key(r, family, row).unwrap())
            .collect();
        let table = dims.get(family);
        assert_eq!(table.len(), distinct.len(), "{family}");

        let keys: HashSet<&Vec<Value>> = table.rows().iter().map(|r| &r.natural_key).collect();
        assert_eq!(keys.len(), table.len(), "{family} has a repeated natural key");
    }
}

#[test]
fn test_sample_dimension_sizes() {
    let build = build_sample();
    let sizes: Vec<usize> = Family::ALL
        .into_iter()
        .map(|f| build.dimensions.get(f).len())
        .collect();
    // date, location, road, person, vehicle
    assert_eq!(sizes, vec![6, 5, 6, 7, 3]);
}

#[test]
fn test_surrogate_keys_dense_in_first_appearance_order() {
    let build = build_sample();
    let location = build.dimensions.get(Family::Location);
    let keys: Vec<i64> = location.rows().iter().map(|r| r.key).collect();
    assert_eq!(keys, vec![1, 2, 3, 4, 5]);

    let states: Vec<String> = location
        .rows()
        .iter()
        .map(|r| r.natural_key[0].label())
        .collect();
    assert_eq!(states, vec!["NSW", "VIC", "QLD", "WA", "TAS"]);
}

#[test]
fn test_excluded_records_still_shape_dimensions() {
    let build = build_sample();
    let tas = build
        .dimensions
        .get(Family::Location)
        .rows()
        .iter()
        .find(|r| r.natural_key[0] == Value::text("TAS"));
    assert!(tas.is_some());
    assert!(build.facts.rows.iter().all(|f| f.crash_id != 6));
}

// ============================================================================
// Surrogate key totality
// ============================================================================

#[test]
fn test_every_foreign_key_resolves_in_memory() {
    let build = build_sample();
    for fact in &build.facts.rows {
        for family in Family::ALL {
            let key = fact.foreign_key(family);
            assert!(
                build.dimensions.get(family).get(key).is_some(),
                "fact {} has dangling {} key {}",
                fact.crash_id,
                family,
                key
            );
        }
    }
}

#[test]
fn test_sqlite_foreign_key_check_is_clean() {
    let build = build_sample();
    let store = load(&build);
    assert_eq!(store.foreign_key_violations().unwrap(), 0);
    assert_eq!(store.table_len("fact_crash").unwrap(), 7);
    for family in Family::ALL {
        assert_eq!(
            store.table_len(family.table()).unwrap(),
            build.dimensions.get(family).len()
        );
    }
}

#[test]
fn test_stored_dimension_rows_match_built_rows() {
    let build = build_sample();
    let store = load(&build);
    for family in Family::ALL {
        let stored = store.dimension_rows(family).unwrap();
        let built: Vec<(i64, Vec<Value>)> = build
            .dimensions
            .get(family)
            .rows()
            .iter()
            .map(|r| (r.key, r.natural_key.clone()))
            .collect();
        assert_eq!(stored, built, "{family}");
    }
}

#[test]
fn test_unresolvable_key_is_consistency_error() {
    let schema = SourceSchema::default();
    let dims = DimensionSet::build(&[base_record(1)], &schema).unwrap();
    let resolvers = ResolverSet::from_dimensions(&dims);

    let stranger = base_record(2).with("State", "NT");
    let err = crashwh::fact::FactBuilder::new(&schema, &resolvers)
        .build(&[stranger])
        .unwrap_err();
    match err {
        WarehouseError::Consistency { family, row, .. } => {
            assert_eq!(family, Family::Location);
            assert_eq!(row, 0);
        }
        other => panic!("unexpected error: {other}"),
    }
}

// ============================================================================
// Determinism and row conservation
// ============================================================================

#[test]
fn test_two_builds_are_identical() {
    let a = build_sample();
    let b = build_sample();
    assert_eq!(a, b);
    assert_eq!(a.digest().unwrap(), b.digest().unwrap());
}

#[test]
fn test_fact_rows_plus_excluded_equals_input() {
    let build = build_sample();
    assert_eq!(build.input_rows, 8);
    assert_eq!(build.facts.rows.len() + build.facts.excluded_records, build.input_rows);
    assert_eq!(build.facts.excluded_records, 1);
}

#[test]
fn test_fact_rows_keep_source_order() {
    let build = build_sample();
    let ids: Vec<i64> = build.facts.rows.iter().map(|f| f.crash_id).collect();
    assert_eq!(ids, vec![1, 2, 3, 4, 5, 7, 8]);
}

// ============================================================================
// Scenarios
// ============================================================================

#[test]
fn test_identical_nsw_records_share_keys_and_sum() {
    let records = vec![
        base_record(1).with("State", "NSW").with("Number Fatalities", 1),
        base_record(2).with("State", "NSW").with("Number Fatalities", 2),
    ];
    let build = WarehouseBuild::from_records(&records, &SourceSchema::default()).unwrap();

    for family in Family::ALL {
        assert_eq!(build.dimensions.get(family).len(), 1, "{family}");
    }
    assert_eq!(build.facts.rows.len(), 2);
    let (a, b) = (&build.facts.rows[0], &build.facts.rows[1]);
    for family in Family::ALL {
        assert_eq!(a.foreign_key(family), 1);
        assert_eq!(b.foreign_key(family), 1);
    }

    let store = load(&build);
    let by_state = ReportSpec::builtin()
        .into_iter()
        .find(|s| s.name == "by_state")
        .unwrap();
    let table = Aggregator::new(&store, Measure::Fatalities)
        .run(&by_state)
        .unwrap();
    assert_eq!(table.pairs(), vec![(Value::text("NSW"), 3)]);
}

#[test]
fn test_maybe_christmas_flag_is_flagged_and_excluded() {
    let build = build_sample();
    assert_eq!(build.facts.issues.len(), 1);
    let issue = &build.facts.issues[0];
    assert_eq!(issue.row, 5);
    assert_eq!(issue.record_id, Some(6));
    assert_eq!(issue.attribute, Attribute::ChristmasPeriod);
    assert_eq!(issue.value, Value::text("Maybe"));

    let store = load(&build);
    assert_eq!(store.grand_total(Measure::Fatalities).unwrap(), 11);
    assert_eq!(store.grand_total(Measure::Crashes).unwrap(), 7);
}

#[test]
fn test_null_and_sentinel_values_are_ordinary_members() {
    let records = vec![
        base_record(1).with("Age Group", Value::Null),
        base_record(2).with("Age Group", Value::Null),
        base_record(3).with("Age", -9),
    ];
    let build = WarehouseBuild::from_records(&records, &SourceSchema::default()).unwrap();
    // null/null collapse into one person; -9 age is a distinct member
    assert_eq!(build.dimensions.get(Family::Person).len(), 2);
    assert_eq!(build.facts.rows.len(), 3);
}

#[test]
fn test_missing_column_aborts_before_any_table() {
    let mut broken = base_record(2);
    broken.remove("National Road Type");
    let err = DimensionSet::build(&[base_record(1), broken], &SourceSchema::default()).unwrap_err();
    assert!(err.is_configuration());
    assert!(err.to_string().contains("National Road Type"));
}

#[test]
fn test_renamed_column_via_schema() {
    let mut record = base_record(1);
    let day = record.remove("Dayweek").unwrap();
    record.insert("Day Name", day);
    let schema = SourceSchema::default().with_column(Attribute::DayOfWeek, "Day Name");
    let build = WarehouseBuild::from_records(&[record], &schema).unwrap();
    assert_eq!(
        build.dimensions.get(Family::Date).rows()[0].natural_key[2],
        Value::text("Monday")
    );
}
