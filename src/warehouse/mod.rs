//! Star-schema persistence

mod ddl;
mod store;

pub use ddl::FACT_TABLE;
pub use store::{staging_path, WarehouseStore};
