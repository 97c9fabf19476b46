//! Pipeline stages
//!
//! ```text
//! profile: CSV ──► DatasetProfile
//! build:   CSV ──► DimensionSet ──► ResolverSet ──► FactTable ──► warehouse (atomic)
//! report:  warehouse ──► Aggregator ──► ReportSet + SummaryReport ──► reports dir
//! ```
//!
//! Each stage is a plain function over a [`PipelineConfig`]; the `run` command
//! is `profile`, then `build`, then `report`.

use crate::config::PipelineConfig;
use crate::dimension::DimensionSet;
use crate::error::Result;
use crate::fact::{DataQualityIssue, FactBuilder, FactTable};
use crate::profile::DatasetProfile;
use crate::record::CrashRecord;
use crate::report::{Aggregator, ReportSet, ReportWriter, SummaryReport};
use crate::resolver::ResolverSet;
use crate::schema::{Family, SourceSchema};
use crate::source::RecordSet;
use crate::warehouse::WarehouseStore;
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::path::PathBuf;
use tracing::info;

/// Everything one build produces, before it is persisted
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WarehouseBuild {
    pub dimensions: DimensionSet,
    pub facts: FactTable,
    pub input_rows: usize,
}

impl WarehouseBuild {
    /// Run the dimension, resolver and fact stages over `records`
    ///
    /// Dimensions are built from every record, including ones the fact stage
    /// later excludes for data-quality reasons.
    pub fn from_records(records: &[CrashRecord], schema: &SourceSchema) -> Result<Self> {
        let dimensions = DimensionSet::build(records, schema)?;
        let resolvers = ResolverSet::from_dimensions(&dimensions);
        let facts = FactBuilder::new(schema, &resolvers).build(records)?;
        Ok(Self {
            dimensions,
            facts,
            input_rows: records.len(),
        })
    }

    /// SHA-256 over the canonical JSON of every dimension row and fact row
    pub fn digest(&self) -> Result<String> {
        let mut hasher = Sha256::new();
        for table in self.dimensions.iter() {
            hasher.update(table.family().table().as_bytes());
            hasher.update(serde_json::to_vec(table.rows())?);
        }
        hasher.update(b"fact_crash");
        hasher.update(serde_json::to_vec(&self.facts.rows)?);
        Ok(hex::encode(hasher.finalize()))
    }

    pub fn summary(&self) -> Result<BuildSummary> {
        Ok(BuildSummary {
            input_rows: self.input_rows,
            dimension_rows: Family::ALL
                .into_iter()
                .map(|f| DimensionCount {
                    family: f,
                    rows: self.dimensions.get(f).len(),
                })
                .collect(),
            fact_rows: self.facts.rows.len(),
            excluded_records: self.facts.excluded_records,
            issues: self.facts.issues.clone(),
            digest: self.digest()?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DimensionCount {
    pub family: Family,
    pub rows: usize,
}

/// Counts, issues and digest of a finished build
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BuildSummary {
    pub input_rows: usize,
    pub dimension_rows: Vec<DimensionCount>,
    pub fact_rows: usize,
    pub excluded_records: usize,
    pub issues: Vec<DataQualityIssue>,
    pub digest: String,
}

/// Reports of one run and where they were written
#[derive(Debug, Clone)]
pub struct ReportOutcome {
    pub reports: ReportSet,
    pub summary: SummaryReport,
    pub written: Vec<PathBuf>,
}

/// Load the configured input and profile it
pub fn profile(config: &PipelineConfig) -> Result<DatasetProfile> {
    let records = RecordSet::from_path(&config.input)?;
    Ok(DatasetProfile::from_records(&records, &config.columns))
}

/// Load the input, build the star schema and publish it to the configured database
pub fn build(config: &PipelineConfig) -> Result<BuildSummary> {
    let source = RecordSet::from_path(&config.input)?;
    config.columns.check_headers(&source.headers)?;

    let build = WarehouseBuild::from_records(&source.records, &config.columns)?;
    WarehouseStore::publish(&config.database, &build.dimensions, &build.facts.rows)?;

    let summary = build.summary()?;
    info!(
        facts = summary.fact_rows,
        excluded = summary.excluded_records,
        digest = %summary.digest,
        "build complete"
    );
    Ok(summary)
}

/// Query the configured database and write every report
pub fn report(config: &PipelineConfig) -> Result<ReportOutcome> {
    let specs = config.report_specs()?;
    let store = WarehouseStore::open_existing(&config.database)?;
    let reports = Aggregator::new(&store, config.measure).run_all(&specs)?;
    let summary = SummaryReport::compose(&reports)?;
    let written = ReportWriter::new(&config.reports_dir).write_all(&reports, &summary)?;
    info!(reports = reports.tables.len(), grand_total = reports.grand_total, "reports complete");
    Ok(ReportOutcome {
        reports,
        summary,
        written,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::WarehouseError;
    use crate::record::Value;
    use crate::schema::Attribute;

    fn record(id: i64, state: &str, fatalities: i64, christmas: &str) -> CrashRecord {
        let mut r = CrashRecord::new();
        for attribute in Attribute::ALL {
            r.insert(attribute.default_source_column(), Value::text("x"));
        }
        r.with("ID", id)
            .with("Crash ID", 20230000 + id)
            .with("State", state)
            .with("Number Fatalities", fatalities)
            .with("Christmas Period", christmas)
            .with("Easter Period", "No")
    }

    #[test]
    fn test_digest_is_stable_and_input_sensitive() {
        let schema = SourceSchema::default();
        let records = vec![record(1, "NSW", 1, "No"), record(2, "VIC", 2, "No")];
        let a = WarehouseBuild::from_records(&records, &schema).unwrap();
        let b = WarehouseBuild::from_records(&records, &schema).unwrap();
        assert_eq!(a.digest().unwrap(), b.digest().unwrap());
        assert_eq!(a.digest().unwrap().len(), 64);

        let reversed: Vec<_> = records.into_iter().rev().collect();
        let c = WarehouseBuild::from_records(&reversed, &schema).unwrap();
        assert_ne!(a.digest().unwrap(), c.digest().unwrap());
    }

    #[test]
    fn test_summary_counts_excluded_records() {
        let records = vec![record(1, "NSW", 1, "No"), record(2, "TAS", 1, "Maybe")];
        let build = WarehouseBuild::from_records(&records, &SourceSchema::default()).unwrap();
        let summary = build.summary().unwrap();
        assert_eq!(summary.input_rows, 2);
        assert_eq!(summary.fact_rows, 1);
        assert_eq!(summary.excluded_records, 1);
        assert_eq!(summary.issues[0].attribute, Attribute::ChristmasPeriod);
        // excluded records still contribute dimension rows
        assert_eq!(summary.dimension_rows[1].family, Family::Location);
        assert_eq!(summary.dimension_rows[1].rows, 2);
    }

    #[test]
    fn test_build_with_missing_input() {
        let dir = tempfile::tempdir().unwrap();
        let config = PipelineConfig {
            input: dir.path().join("absent.csv"),
            ..PipelineConfig::default()
        };
        assert!(matches!(build(&config), Err(WarehouseError::InputMissing(_))));
    }

    #[test]
    fn test_report_before_build() {
        let dir = tempfile::tempdir().unwrap();
        let config = PipelineConfig {
            database: dir.path().join("none.db"),
            reports_dir: dir.path().join("reports"),
            ..PipelineConfig::default()
        };
        let err = report(&config).unwrap_err();
        assert!(matches!(err, WarehouseError::WarehouseMissing(_)));
        assert!(!dir.path().join("reports").exists());
    }
}
