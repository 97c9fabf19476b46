//! Error taxonomy for the warehouse pipeline
//!
//! Configuration and infrastructure errors abort the current stage.
//! Data-quality problems are not errors: they are collected as
//! [`DataQualityIssue`](crate::fact::DataQualityIssue)s and the build continues.
//! Consistency errors mean the dimension and fact stages disagreed about the
//! record set, which is a defect in the engine.

use crate::schema::Family;
use thiserror::Error;

/// Errors that can occur while building or querying the warehouse
#[derive(Error, Debug)]
pub enum WarehouseError {
    #[error("Configuration error: column '{column}' required by {attribute} is missing from record {row}")]
    MissingField {
        attribute: &'static str,
        column: String,
        row: usize,
    },

    #[error("Configuration error: unknown dimension family '{0}' (expected one of date, location, road, person, vehicle)")]
    UnknownFamily(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Consistency error: record {row} has a {family} natural key with no dimension row: {key}")]
    Consistency {
        family: Family,
        row: usize,
        key: String,
    },

    #[error("Input dataset '{0}' not found")]
    InputMissing(String),

    #[error("Warehouse '{0}' not found. Run the build stage first.")]
    WarehouseMissing(String),

    #[error("Warehouse store error: {0}")]
    Store(#[from] rusqlite::Error),

    #[error("Failed to read records: {0}")]
    Source(#[from] csv::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl WarehouseError {
    /// True for errors that must abort the whole run before anything is written
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            Self::MissingField { .. } | Self::UnknownFamily(_) | Self::Configuration(_)
        )
    }

    /// True for store/IO failures (the caller may retry after fixing the environment)
    pub fn is_infrastructure(&self) -> bool {
        matches!(
            self,
            Self::InputMissing(_)
                | Self::WarehouseMissing(_)
                | Self::Store(_)
                | Self::Io(_)
                | Self::Source(_)
        )
    }
}

/// Result type for warehouse operations
pub type Result<T> = std::result::Result<T, WarehouseError>;
