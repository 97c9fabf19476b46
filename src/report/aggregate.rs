//! Grouped aggregates over the star schema

use super::ordering::ReportOrder;
use crate::error::{Result, WarehouseError};
use crate::record::Value;
use crate::schema::{Attribute, Family};
use crate::warehouse::WarehouseStore;
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::info;

/// Quantity summed by a report
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Measure {
    /// Sum of `number_fatalities`
    #[default]
    Fatalities,
    /// Number of fact rows
    Crashes,
}

impl Measure {
    pub(crate) fn sql_expr(self) -> &'static str {
        match self {
            Measure::Fatalities => "COALESCE(SUM(f.number_fatalities), 0)",
            Measure::Crashes => "COUNT(*)",
        }
    }

    /// Lowercase noun used in report lines ("3 fatalities")
    pub fn noun(self) -> &'static str {
        match self {
            Measure::Fatalities => "fatalities",
            Measure::Crashes => "crashes",
        }
    }

    /// Capitalised noun used in section titles
    pub fn title(self) -> &'static str {
        match self {
            Measure::Fatalities => "Fatalities",
            Measure::Crashes => "Crashes",
        }
    }
}

impl fmt::Display for Measure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.noun())
    }
}

/// A named "measure grouped by dimension attribute" query
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReportSpec {
    pub name: String,
    pub family: Family,
    pub attribute: Attribute,
    pub order: ReportOrder,
}

impl ReportSpec {
    pub fn new(name: &str, family: Family, attribute: Attribute, order: ReportOrder) -> Self {
        debug_assert_eq!(attribute.family(), Some(family));
        Self {
            name: name.to_string(),
            family,
            attribute,
            order,
        }
    }

    /// The nine standard reports
    pub fn builtin() -> Vec<ReportSpec> {
        use ReportOrder::{AgeGroup, DayOfWeek, TotalDesc};
        vec![
            ReportSpec::new("by_state", Family::Location, Attribute::State, TotalDesc),
            ReportSpec::new("by_road_type", Family::Road, Attribute::RoadType, TotalDesc),
            ReportSpec::new("by_age_group", Family::Person, Attribute::AgeGroup, AgeGroup),
            ReportSpec::new("by_gender", Family::Person, Attribute::Gender, TotalDesc),
            ReportSpec::new("by_time_of_day", Family::Date, Attribute::TimeOfDay, TotalDesc),
            ReportSpec::new("by_day_of_week", Family::Date, Attribute::DayOfWeek, DayOfWeek),
            ReportSpec::new("by_speed_limit", Family::Road, Attribute::SpeedLimit, TotalDesc),
            ReportSpec::new("by_road_user", Family::Person, Attribute::RoadUserType, TotalDesc),
            ReportSpec::new("by_remoteness", Family::Location, Attribute::RemotenessArea, TotalDesc),
        ]
    }
}

/// A report as written in the `[[report]]` tables of the configuration
///
/// # Example TOML
/// ```toml
/// [[report]]
/// name = "by_lga"
/// family = "location"
/// attribute = "lga_name"
/// order = "total_desc"
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportDefinition {
    pub name: String,
    pub family: String,
    pub attribute: String,
    #[serde(default)]
    pub order: ReportOrder,
}

impl ReportDefinition {
    /// Resolve family and attribute names
    pub fn resolve(&self) -> Result<ReportSpec> {
        let family: Family = self.family.parse()?;
        let attribute: Attribute = self.attribute.parse()?;
        if !family.attributes().contains(&attribute) {
            return Err(WarehouseError::Configuration(format!(
                "report '{}': attribute '{}' is not part of the {} dimension",
                self.name, attribute, family
            )));
        }
        Ok(ReportSpec {
            name: self.name.clone(),
            family,
            attribute,
            order: self.order,
        })
    }
}

/// One group of a report
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReportRow {
    pub group: Value,
    pub total: i64,
}

/// Ordered result of one report
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReportTable {
    pub name: String,
    pub attribute: Attribute,
    pub measure: Measure,
    pub rows: Vec<ReportRow>,
}

impl ReportTable {
    /// The `n` largest groups by total (ties by group value)
    pub fn top(&self, n: usize) -> Vec<ReportRow> {
        let mut rows = self.rows.clone();
        ReportOrder::TotalDesc.sort(&mut rows);
        rows.truncate(n);
        rows
    }

    /// Sum of all group totals
    pub fn total(&self) -> i64 {
        self.rows.iter().map(|r| r.total).sum()
    }

    /// Rows as `(group, total)` pairs
    pub fn pairs(&self) -> Vec<(Value, i64)> {
        self.rows.iter().map(|r| (r.group.clone(), r.total)).collect()
    }
}

/// All reports of one run plus the grand total
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReportSet {
    pub measure: Measure,
    pub grand_total: i64,
    pub tables: Vec<ReportTable>,
}

impl ReportSet {
    pub fn get(&self, name: &str) -> Option<&ReportTable> {
        self.tables.iter().find(|t| t.name == name)
    }
}

/// Runs report queries against a warehouse
pub struct Aggregator<'s> {
    store: &'s WarehouseStore,
    measure: Measure,
}

impl<'s> Aggregator<'s> {
    pub fn new(store: &'s WarehouseStore, measure: Measure) -> Self {
        Self { store, measure }
    }

    /// Run one report
    pub fn run(&self, spec: &ReportSpec) -> Result<ReportTable> {
        let mut rows: Vec<ReportRow> = self
            .store
            .grouped_totals(spec.family, spec.attribute, self.measure)?
            .into_iter()
            .map(|(group, total)| ReportRow { group, total })
            .collect();
        spec.order.sort(&mut rows);
        info!(report = %spec.name, groups = rows.len(), "generated report");
        Ok(ReportTable {
            name: spec.name.clone(),
            attribute: spec.attribute,
            measure: self.measure,
            rows,
        })
    }

    /// Run every report and compute the grand total over the fact table
    pub fn run_all(&self, specs: &[ReportSpec]) -> Result<ReportSet> {
        let tables = specs
            .iter()
            .map(|spec| self.run(spec))
            .collect::<Result<Vec<_>>>()?;
        Ok(ReportSet {
            measure: self.measure,
            grand_total: self.store.grand_total(self.measure)?,
            tables,
        })
    }
}
