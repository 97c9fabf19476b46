//! Pipeline configuration
//!
//! Every field has a default, so an empty file (or no file) runs the pipeline
//! against the standard dataset layout. Command-line flags override values
//! read from the file.

use crate::error::{Result, WarehouseError};
use crate::report::{Measure, ReportDefinition, ReportSpec};
use crate::schema::SourceSchema;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

pub const DEFAULT_INPUT: &str = "Project2_Dataset_Corrected.csv";
pub const DEFAULT_DATABASE: &str = "crash_data_warehouse.db";
pub const DEFAULT_REPORTS_DIR: &str = "reports";

fn default_input() -> PathBuf {
    PathBuf::from(DEFAULT_INPUT)
}

fn default_database() -> PathBuf {
    PathBuf::from(DEFAULT_DATABASE)
}

fn default_reports_dir() -> PathBuf {
    PathBuf::from(DEFAULT_REPORTS_DIR)
}

/// Settings shared by the profile, build and report stages
///
/// # Example TOML
/// ```toml
/// input = "data/crashes.csv"
/// database = "out/warehouse.db"
/// reports_dir = "out/reports"
/// measure = "crashes"
///
/// [columns]
/// day_of_week = "Dayweek"
///
/// [[report]]
/// name = "by_lga"
/// family = "location"
/// attribute = "lga_name"
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PipelineConfig {
    #[serde(default = "default_input")]
    pub input: PathBuf,

    #[serde(default = "default_database")]
    pub database: PathBuf,

    #[serde(default = "default_reports_dir")]
    pub reports_dir: PathBuf,

    /// Quantity the reports aggregate
    #[serde(default)]
    pub measure: Measure,

    /// Source header overrides, keyed by attribute name
    #[serde(default)]
    pub columns: SourceSchema,

    /// Reports generated in addition to the nine standard ones
    #[serde(default, rename = "report")]
    pub reports: Vec<ReportDefinition>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            input: default_input(),
            database: default_database(),
            reports_dir: default_reports_dir(),
            measure: Measure::default(),
            columns: SourceSchema::default(),
            reports: Vec::new(),
        }
    }
}

impl PipelineConfig {
    /// Load and validate a TOML configuration file
    pub fn from_toml<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| {
            WarehouseError::Configuration(format!(
                "failed to read config file {}: {}",
                path.display(),
                e
            ))
        })?;
        Self::from_toml_str(&content)
    }

    /// Parse and validate TOML text
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content)
            .map_err(|e| WarehouseError::Configuration(format!("invalid config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Check report definitions: names non-empty and unique, families and attributes known
    pub fn validate(&self) -> Result<()> {
        let mut names: HashSet<String> =
            ReportSpec::builtin().into_iter().map(|s| s.name).collect();
        for def in &self.reports {
            if def.name.trim().is_empty() {
                return Err(WarehouseError::Configuration(
                    "report name must not be empty".to_string(),
                ));
            }
            if !names.insert(def.name.clone()) {
                return Err(WarehouseError::Configuration(format!(
                    "duplicate report name '{}'",
                    def.name
                )));
            }
            def.resolve()?;
        }
        Ok(())
    }

    /// The standard reports followed by the configured ones
    pub fn report_specs(&self) -> Result<Vec<ReportSpec>> {
        let mut specs = ReportSpec::builtin();
        for def in &self.reports {
            specs.push(def.resolve()?);
        }
        Ok(specs)
    }
}
