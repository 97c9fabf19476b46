//! Cross-report summary document

use super::aggregate::{ReportRow, ReportSet};
use crate::error::{Result, WarehouseError};
use serde::Serialize;
use std::fmt::Write;

/// How many entries the "top" sections list
pub const TOP_N: usize = 3;

#[derive(Debug, Clone, Copy)]
enum Listing {
    Top,
    Full,
}

/// (report, title, listing, unit suffix appended to the group label)
const SECTIONS: [(&str, &str, Listing, &str); 9] = [
    ("by_state", "Top States by", Listing::Top, ""),
    ("by_road_type", "Top Road Types by", Listing::Top, ""),
    ("by_age_group", "by Age Group", Listing::Full, ""),
    ("by_gender", "by Gender", Listing::Full, ""),
    ("by_time_of_day", "by Time of Day", Listing::Full, ""),
    ("by_day_of_week", "by Day of Week", Listing::Full, ""),
    ("by_speed_limit", "Top Speed Limits by", Listing::Top, " km/h"),
    ("by_road_user", "by Road User Type", Listing::Full, ""),
    ("by_remoteness", "by Remoteness Area", Listing::Full, ""),
];

/// One titled block of the summary
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SummarySection {
    pub title: String,
    pub unit: &'static str,
    pub rows: Vec<ReportRow>,
}

/// Grand total plus the selected breakdowns of the standard reports
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SummaryReport {
    pub measure_noun: &'static str,
    pub grand_total: i64,
    pub sections: Vec<SummarySection>,
}

impl SummaryReport {
    /// Compose from a report set containing the nine standard reports
    pub fn compose(reports: &ReportSet) -> Result<Self> {
        let measure = reports.measure;
        let sections = SECTIONS
            .iter()
            .map(|&(name, title, listing, unit)| {
                let table = reports.get(name).ok_or_else(|| {
                    WarehouseError::Configuration(format!(
                        "summary needs report '{}' which was not generated",
                        name
                    ))
                })?;
                let rows = match listing {
                    Listing::Top => table.top(TOP_N),
                    Listing::Full => table.rows.clone(),
                };
                let title = match listing {
                    Listing::Top => format!("{} {}", title, measure.title()),
                    Listing::Full => format!("{} {}", measure.title(), title),
                };
                Ok(SummarySection { title, unit, rows })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            measure_noun: measure.noun(),
            grand_total: reports.grand_total,
            sections,
        })
    }

    /// Plain-text rendering
    pub fn render(&self) -> String {
        let mut out = String::new();
        out.push_str("=== CRASH DATA WAREHOUSE SUMMARY REPORT ===\n\n");
        let _ = writeln!(out, "Total {}: {}\n", self.measure_noun, self.grand_total);

        for section in &self.sections {
            let _ = writeln!(out, "--- {} ---", section.title);
            for row in &section.rows {
                let _ = writeln!(
                    out,
                    "{}{}: {} {}",
                    row.group.label(),
                    section.unit,
                    row.total,
                    self.measure_noun
                );
            }
            out.push('\n');
        }

        out.push_str("=== END OF REPORT ===\n");
        out
    }
}
