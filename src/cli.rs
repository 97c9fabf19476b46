//! CLI argument parsing for crashwh

use crate::config::PipelineConfig;
use crate::report::Measure;
use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Output format for stage results printed to stdout
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text format (default)
    #[default]
    Text,
    /// JSON format for machine parsing
    Json,
    /// CSV format for spreadsheet analysis
    Csv,
}

#[derive(Parser, Debug)]
#[command(name = "crashwh")]
#[command(version)]
#[command(about = "Build a star-schema warehouse from crash records and report on it", long_about = None)]
pub struct Cli {
    /// Pipeline configuration file (TOML)
    #[arg(short, long, value_name = "FILE", global = true)]
    pub config: Option<PathBuf>,

    /// Enable debug tracing output to stderr
    #[arg(long = "debug", global = true)]
    pub debug: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Summarize the input dataset (shape, missing values, value counts)
    Profile {
        #[command(flatten)]
        input: InputArgs,

        /// Output format (text or json)
        #[arg(long = "format", value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Build the star schema and publish the warehouse database
    Build {
        #[command(flatten)]
        input: InputArgs,

        #[command(flatten)]
        database: DatabaseArgs,

        /// Output format for the build summary (text or json)
        #[arg(long = "format", value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Generate reports from an existing warehouse
    Report {
        #[command(flatten)]
        database: DatabaseArgs,

        #[command(flatten)]
        reports: ReportArgs,

        /// Output format for stdout (text summary, json or csv)
        #[arg(long = "format", value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Profile, build, then report
    Run {
        #[command(flatten)]
        input: InputArgs,

        #[command(flatten)]
        database: DatabaseArgs,

        #[command(flatten)]
        reports: ReportArgs,
    },
}

#[derive(Args, Debug, Default)]
pub struct InputArgs {
    /// Input CSV dataset
    #[arg(short, long, value_name = "CSV")]
    pub input: Option<PathBuf>,
}

#[derive(Args, Debug, Default)]
pub struct DatabaseArgs {
    /// Warehouse database file
    #[arg(short, long, value_name = "DB")]
    pub database: Option<PathBuf>,
}

#[derive(Args, Debug, Default)]
pub struct ReportArgs {
    /// Directory for report files
    #[arg(short, long = "reports-dir", value_name = "DIR")]
    pub reports_dir: Option<PathBuf>,

    /// Quantity to aggregate
    #[arg(short, long, value_enum)]
    pub measure: Option<Measure>,
}

impl InputArgs {
    pub fn apply(&self, config: &mut PipelineConfig) {
        if let Some(input) = &self.input {
            config.input = input.clone();
        }
    }
}

impl DatabaseArgs {
    pub fn apply(&self, config: &mut PipelineConfig) {
        if let Some(database) = &self.database {
            config.database = database.clone();
        }
    }
}

impl ReportArgs {
    pub fn apply(&self, config: &mut PipelineConfig) {
        if let Some(dir) = &self.reports_dir {
            config.reports_dir = dir.clone();
        }
        if let Some(measure) = self.measure {
            config.measure = measure;
        }
    }
}

impl Command {
    /// Overlay this command's flags on a loaded configuration
    pub fn apply(&self, config: &mut PipelineConfig) {
        match self {
            Command::Profile { input, .. } => input.apply(config),
            Command::Build {
                input, database, ..
            } => {
                input.apply(config);
                database.apply(config);
            }
            Command::Report {
                database, reports, ..
            } => {
                database.apply(config);
                reports.apply(config);
            }
            Command::Run {
                input,
                database,
                reports,
            } => {
                input.apply(config);
                database.apply(config);
                reports.apply(config);
            }
        }
    }
}
