//! Logical attributes, dimension families, and the source column mapping
//!
//! Every attribute the warehouse reads has a logical name (also its warehouse
//! column name) and a default source header taken from the published crash
//! dataset. The mapping can be overridden per attribute in the `[columns]`
//! table of the pipeline configuration.

use crate::error::{Result, WarehouseError};
use crate::record::{CrashRecord, Value};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// A logical attribute of a crash record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Attribute {
    // date family
    Year,
    Month,
    DayOfWeek,
    TimeOfDay,
    // location family
    State,
    RemotenessArea,
    Sa4Name,
    LgaName,
    // road family
    RoadType,
    SpeedLimit,
    // person family
    RoadUserType,
    Gender,
    Age,
    AgeGroup,
    // vehicle family
    BusInvolvement,
    HeavyRigidTruckInvolvement,
    ArticulatedTruckInvolvement,
    // standalone
    RecordId,
    OriginalId,
    CrashType,
    NumberFatalities,
    ChristmasPeriod,
    EasterPeriod,
}

impl Attribute {
    pub const ALL: [Attribute; 23] = [
        Attribute::Year,
        Attribute::Month,
        Attribute::DayOfWeek,
        Attribute::TimeOfDay,
        Attribute::State,
        Attribute::RemotenessArea,
        Attribute::Sa4Name,
        Attribute::LgaName,
        Attribute::RoadType,
        Attribute::SpeedLimit,
        Attribute::RoadUserType,
        Attribute::Gender,
        Attribute::Age,
        Attribute::AgeGroup,
        Attribute::BusInvolvement,
        Attribute::HeavyRigidTruckInvolvement,
        Attribute::ArticulatedTruckInvolvement,
        Attribute::RecordId,
        Attribute::OriginalId,
        Attribute::CrashType,
        Attribute::NumberFatalities,
        Attribute::ChristmasPeriod,
        Attribute::EasterPeriod,
    ];

    /// Attributes the fact builder reads directly from each record
    pub const STANDALONE: [Attribute; 6] = [
        Attribute::RecordId,
        Attribute::OriginalId,
        Attribute::CrashType,
        Attribute::NumberFatalities,
        Attribute::ChristmasPeriod,
        Attribute::EasterPeriod,
    ];

    /// Logical snake_case name, as used in configuration files
    pub fn name(self) -> &'static str {
        match self {
            Attribute::Year => "year",
            Attribute::Month => "month",
            Attribute::DayOfWeek => "day_of_week",
            Attribute::TimeOfDay => "time_of_day",
            Attribute::State => "state",
            Attribute::RemotenessArea => "remoteness_area",
            Attribute::Sa4Name => "sa4_name",
            Attribute::LgaName => "lga_name",
            Attribute::RoadType => "road_type",
            Attribute::SpeedLimit => "speed_limit",
            Attribute::RoadUserType => "road_user_type",
            Attribute::Gender => "gender",
            Attribute::Age => "age",
            Attribute::AgeGroup => "age_group",
            Attribute::BusInvolvement => "bus_involvement",
            Attribute::HeavyRigidTruckInvolvement => "heavy_rigid_truck_involvement",
            Attribute::ArticulatedTruckInvolvement => "articulated_truck_involvement",
            Attribute::RecordId => "record_id",
            Attribute::OriginalId => "original_id",
            Attribute::CrashType => "crash_type",
            Attribute::NumberFatalities => "number_fatalities",
            Attribute::ChristmasPeriod => "christmas_period",
            Attribute::EasterPeriod => "easter_period",
        }
    }

    /// Column name of this attribute in the warehouse tables
    pub fn warehouse_column(self) -> &'static str {
        match self {
            Attribute::RecordId => "crash_id",
            other => other.name(),
        }
    }

    /// Header of this attribute in the published dataset
    pub fn default_source_column(self) -> &'static str {
        match self {
            Attribute::Year => "Year",
            Attribute::Month => "Month",
            Attribute::DayOfWeek => "Dayweek",
            Attribute::TimeOfDay => "Time of day",
            Attribute::State => "State",
            Attribute::RemotenessArea => "National Remoteness Areas",
            Attribute::Sa4Name => "SA4 Name 2021",
            Attribute::LgaName => "National LGA Name 2024",
            Attribute::RoadType => "National Road Type",
            Attribute::SpeedLimit => "Speed Limit",
            Attribute::RoadUserType => "Road User",
            Attribute::Gender => "Gender",
            Attribute::Age => "Age",
            Attribute::AgeGroup => "Age Group",
            Attribute::BusInvolvement => "Bus Involvement",
            Attribute::HeavyRigidTruckInvolvement => "Heavy Rigid Truck Involvement",
            Attribute::ArticulatedTruckInvolvement => "Articulated Truck Involvement",
            Attribute::RecordId => "ID",
            Attribute::OriginalId => "Crash ID",
            Attribute::CrashType => "Crash Type",
            Attribute::NumberFatalities => "Number Fatalities",
            Attribute::ChristmasPeriod => "Christmas Period",
            Attribute::EasterPeriod => "Easter Period",
        }
    }

    /// Family whose natural key contains this attribute (None for standalone attributes)
    pub fn family(self) -> Option<Family> {
        Family::ALL
            .into_iter()
            .find(|family| family.attributes().contains(&self))
    }
}

impl fmt::Display for Attribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Attribute {
    type Err = WarehouseError;

    fn from_str(s: &str) -> Result<Self> {
        Attribute::ALL
            .into_iter()
            .find(|attr| attr.name() == s)
            .ok_or_else(|| WarehouseError::Configuration(format!("unknown attribute '{}'", s)))
    }
}

/// A dimension family: a fixed, ordered set of attributes forming a natural key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Family {
    Date,
    Location,
    Road,
    Person,
    Vehicle,
}

impl Family {
    /// All families in build order
    pub const ALL: [Family; 5] = [
        Family::Date,
        Family::Location,
        Family::Road,
        Family::Person,
        Family::Vehicle,
    ];

    /// Natural-key attributes, in key-tuple order
    pub fn attributes(self) -> &'static [Attribute] {
        match self {
            Family::Date => &[
                Attribute::Year,
                Attribute::Month,
                Attribute::DayOfWeek,
                Attribute::TimeOfDay,
            ],
            Family::Location => &[
                Attribute::State,
                Attribute::RemotenessArea,
                Attribute::Sa4Name,
                Attribute::LgaName,
            ],
            Family::Road => &[Attribute::RoadType, Attribute::SpeedLimit],
            Family::Person => &[
                Attribute::RoadUserType,
                Attribute::Gender,
                Attribute::Age,
                Attribute::AgeGroup,
            ],
            Family::Vehicle => &[
                Attribute::BusInvolvement,
                Attribute::HeavyRigidTruckInvolvement,
                Attribute::ArticulatedTruckInvolvement,
            ],
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Family::Date => "date",
            Family::Location => "location",
            Family::Road => "road",
            Family::Person => "person",
            Family::Vehicle => "vehicle",
        }
    }

    /// Warehouse table holding this dimension
    pub fn table(self) -> &'static str {
        match self {
            Family::Date => "dim_date",
            Family::Location => "dim_location",
            Family::Road => "dim_road",
            Family::Person => "dim_person",
            Family::Vehicle => "dim_vehicle",
        }
    }

    /// Surrogate key column (primary key of the dimension, foreign key in `fact_crash`)
    pub fn key_column(self) -> &'static str {
        match self {
            Family::Date => "date_id",
            Family::Location => "location_id",
            Family::Road => "road_id",
            Family::Person => "person_id",
            Family::Vehicle => "vehicle_id",
        }
    }

    /// Position of this family in [`Family::ALL`]
    pub fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for Family {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Family {
    type Err = WarehouseError;

    fn from_str(s: &str) -> Result<Self> {
        Family::ALL
            .into_iter()
            .find(|family| family.name() == s)
            .ok_or_else(|| WarehouseError::UnknownFamily(s.to_string()))
    }
}

/// Mapping from logical attribute to source column header
///
/// # Example TOML
/// ```toml
/// [columns]
/// day_of_week = "Day of week"
/// record_id = "Row"
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SourceSchema {
    overrides: BTreeMap<Attribute, String>,
}

impl SourceSchema {
    /// Override the header used for one attribute
    pub fn with_column(mut self, attribute: Attribute, column: impl Into<String>) -> Self {
        self.overrides.insert(attribute, column.into());
        self
    }

    /// Source header carrying `attribute`
    pub fn column(&self, attribute: Attribute) -> &str {
        self.overrides
            .get(&attribute)
            .map(String::as_str)
            .unwrap_or_else(|| attribute.default_source_column())
    }

    /// Verify that every record carries every attribute the pipeline reads
    ///
    /// Runs before any dimension is built so a misconfigured column aborts the
    /// run up front instead of failing halfway through.
    pub fn check_records(&self, records: &[CrashRecord]) -> Result<()> {
        for (row, record) in records.iter().enumerate() {
            for attribute in Attribute::ALL {
                self.value(record, attribute, row)?;
            }
        }
        Ok(())
    }

    /// Verify that a header row names every column the pipeline reads
    pub fn check_headers(&self, headers: &[String]) -> Result<()> {
        for attribute in Attribute::ALL {
            let column = self.column(attribute);
            if !headers.iter().any(|h| h == column) {
                return Err(WarehouseError::MissingField {
                    attribute: attribute.name(),
                    column: column.to_string(),
                    row: 0,
                });
            }
        }
        Ok(())
    }

    /// Read `attribute` from `record`, or fail with a configuration error
    pub fn value<'r>(
        &self,
        record: &'r CrashRecord,
        attribute: Attribute,
        row: usize,
    ) -> Result<&'r Value> {
        let column = self.column(attribute);
        record
            .get(column)
            .ok_or_else(|| WarehouseError::MissingField {
                attribute: attribute.name(),
                column: column.to_string(),
                row,
            })
    }

    /// Extract the natural-key tuple of `family` from `record`
    pub fn natural_key(
        &self,
        record: &CrashRecord,
        family: Family,
        row: usize,
    ) -> Result<Vec<Value>> {
        family
            .attributes()
            .iter()
            .map(|&attribute| self.value(record, attribute, row).cloned())
            .collect()
    }
}
