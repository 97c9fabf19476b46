//! crashwh - star-schema warehouse builder for road crash fatality records
//!
//! This library turns a flat, denormalized crash dataset into a star schema
//! (five dimension tables plus a `fact_crash` table) stored in SQLite, and
//! runs grouped aggregate reports over it.
//!
//! ```no_run
//! use crashwh::config::PipelineConfig;
//! use crashwh::pipeline;
//!
//! let config = PipelineConfig::default();
//! let summary = pipeline::build(&config)?;
//! println!("{} fact rows, digest {}", summary.fact_rows, summary.digest);
//! let outcome = pipeline::report(&config)?;
//! print!("{}", outcome.summary.render());
//! # Ok::<(), crashwh::error::WarehouseError>(())
//! ```

pub mod cli;
pub mod config;
pub mod dimension;
pub mod error;
pub mod fact;
pub mod pipeline;
pub mod profile;
pub mod record;
pub mod report;
pub mod resolver;
pub mod schema;
pub mod source;
pub mod warehouse;

pub use error::{Result, WarehouseError};
