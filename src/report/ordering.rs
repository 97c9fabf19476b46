//! Report orderings
//!
//! Most reports list groups by descending total. Day-of-week and age-group
//! reports follow a fixed calendar/age order instead, which is modelled with
//! ordered enums rather than string comparison. Values outside the known
//! categories rank as `Unknown`, after every known category.

use super::aggregate::ReportRow;
use crate::record::Value;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Day of week, Monday first
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum DayOfWeek {
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Saturday,
    Sunday,
    Unknown,
}

impl DayOfWeek {
    pub fn from_value(value: &Value) -> Self {
        match value.as_text() {
            Some("Monday") => DayOfWeek::Monday,
            Some("Tuesday") => DayOfWeek::Tuesday,
            Some("Wednesday") => DayOfWeek::Wednesday,
            Some("Thursday") => DayOfWeek::Thursday,
            Some("Friday") => DayOfWeek::Friday,
            Some("Saturday") => DayOfWeek::Saturday,
            Some("Sunday") => DayOfWeek::Sunday,
            _ => DayOfWeek::Unknown,
        }
    }

    /// 1 for Monday through 7 for Sunday, 8 for anything else
    pub fn rank(self) -> u8 {
        self as u8 + 1
    }
}

/// Age bands of the dataset, youngest first
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum AgeGroup {
    UpTo16,
    From17To25,
    From26To39,
    From40To64,
    From65To74,
    From75,
    Unknown,
}

impl AgeGroup {
    pub fn from_value(value: &Value) -> Self {
        match value.as_text() {
            Some("0_to_16") => AgeGroup::UpTo16,
            Some("17_to_25") => AgeGroup::From17To25,
            Some("26_to_39") => AgeGroup::From26To39,
            Some("40_to_64") => AgeGroup::From40To64,
            Some("65_to_74") => AgeGroup::From65To74,
            Some("75_or_older") => AgeGroup::From75,
            _ => AgeGroup::Unknown,
        }
    }

    /// 1 for "0_to_16" through 6 for "75_or_older", 7 for anything else
    pub fn rank(self) -> u8 {
        self as u8 + 1
    }
}

/// How a report orders its groups
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportOrder {
    /// Largest total first
    #[default]
    TotalDesc,
    /// Monday … Sunday, regardless of totals
    DayOfWeek,
    /// Age bands youngest first, regardless of totals
    AgeGroup,
}

impl ReportOrder {
    /// Sort rows in place; ties break on the group value so output is deterministic
    pub fn sort(self, rows: &mut [ReportRow]) {
        rows.sort_by(|a, b| self.compare(a, b).then_with(|| a.group.cmp(&b.group)));
    }

    fn compare(self, a: &ReportRow, b: &ReportRow) -> Ordering {
        match self {
            ReportOrder::TotalDesc => b.total.cmp(&a.total),
            ReportOrder::DayOfWeek => {
                DayOfWeek::from_value(&a.group).cmp(&DayOfWeek::from_value(&b.group))
            }
            ReportOrder::AgeGroup => {
                AgeGroup::from_value(&a.group).cmp(&AgeGroup::from_value(&b.group))
            }
        }
    }
}
