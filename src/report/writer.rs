//! Report output (CSV tables, JSON bundle, summary text)

use super::aggregate::{ReportSet, ReportTable};
use super::summary::SummaryReport;
use crate::error::Result;
use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};
use tracing::info;

/// File name of the JSON bundle holding every report
pub const JSON_FILE: &str = "reports.json";
/// File name of the summary document
pub const SUMMARY_FILE: &str = "summary_report.txt";

/// One report as CSV: `<attribute>,total_<measure>` then one line per group
pub fn write_table_csv<W: io::Write>(table: &ReportTable, out: W) -> Result<()> {
    let mut wtr = csv::Writer::from_writer(out);
    wtr.write_record([table.attribute.to_string(), format!("total_{}", table.measure)])?;
    for row in &table.rows {
        wtr.write_record([row.group.to_string(), row.total.to_string()])?;
    }
    wtr.flush()?;
    Ok(())
}

/// Every report in long form: `report,group,total`
pub fn write_reports_csv<W: io::Write>(reports: &ReportSet, out: W) -> Result<()> {
    let mut wtr = csv::Writer::from_writer(out);
    wtr.write_record(["report", "group", "total"])?;
    for table in &reports.tables {
        for row in &table.rows {
            wtr.write_record([
                table.name.clone(),
                row.group.to_string(),
                row.total.to_string(),
            ])?;
        }
    }
    wtr.flush()?;
    Ok(())
}

/// Writes report files into one directory
#[derive(Debug, Clone)]
pub struct ReportWriter {
    dir: PathBuf,
}

impl ReportWriter {
    pub fn new<P: AsRef<Path>>(dir: P) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Write `<name>.csv` per table, the JSON bundle and the summary
    ///
    /// Returns the written paths in write order.
    pub fn write_all(&self, reports: &ReportSet, summary: &SummaryReport) -> Result<Vec<PathBuf>> {
        fs::create_dir_all(&self.dir)?;
        let mut written = Vec::with_capacity(reports.tables.len() + 2);

        for table in &reports.tables {
            let path = self.dir.join(format!("{}.csv", table.name));
            write_table_csv(table, File::create(&path)?)?;
            written.push(path);
        }

        let json_path = self.dir.join(JSON_FILE);
        fs::write(&json_path, serde_json::to_string_pretty(reports)?)?;
        written.push(json_path);

        let summary_path = self.dir.join(SUMMARY_FILE);
        fs::write(&summary_path, summary.render())?;
        written.push(summary_path);

        info!(dir = %self.dir.display(), files = written.len(), "wrote reports");
        Ok(written)
    }
}
