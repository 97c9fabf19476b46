//! SQLite warehouse store
//!
//! Only this module talks to the database. The build stage writes a complete
//! warehouse into a staging file next to the target and renames it into place
//! once every table is committed, so a failed build leaves the previous
//! warehouse untouched.
//!
//! ```text
//! build ──► <db>.building ──(commit ok)──► rename ──► <db>
//!                  │
//!                  └──(any error)──► removed, <db> unchanged
//! ```

use super::ddl;
use crate::dimension::{DerivedColumns, DimensionSet, DimensionTable, SurrogateKey};
use crate::error::{Result, WarehouseError};
use crate::fact::FactRow;
use crate::record::Value;
use crate::report::Measure;
use crate::schema::{Attribute, Family};
use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use rusqlite::{params, Connection, OpenFlags, Transaction};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

impl ToSql for Value {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(match self {
            Value::Null => ToSqlOutput::Owned(rusqlite::types::Value::Null),
            Value::Int(n) => ToSqlOutput::Owned(rusqlite::types::Value::Integer(*n)),
            Value::Text(s) => ToSqlOutput::Borrowed(ValueRef::Text(s.as_bytes())),
        })
    }
}

impl FromSql for Value {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        match value {
            ValueRef::Null => Ok(Value::Null),
            ValueRef::Integer(n) => Ok(Value::Int(n)),
            ValueRef::Real(f) => Ok(Value::Text(f.to_string())),
            ValueRef::Text(bytes) => std::str::from_utf8(bytes)
                .map(|s| Value::Text(s.to_string()))
                .map_err(|e| FromSqlError::Other(Box::new(e))),
            ValueRef::Blob(_) => Err(FromSqlError::InvalidType),
        }
    }
}

/// Path of the staging database used while a build is in progress
pub fn staging_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(".building");
    PathBuf::from(name)
}

/// Handle on a warehouse database
pub struct WarehouseStore {
    conn: Connection,
}

impl WarehouseStore {
    /// Fresh in-memory warehouse with the star schema created (used in tests)
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let store = Self { conn };
        store.create_schema()?;
        Ok(store)
    }

    /// Create a new warehouse file with an empty star schema
    ///
    /// Fails if the file already holds tables.
    pub fn create<P: AsRef<Path>>(path: P) -> Result<Self> {
        let conn = Connection::open(path.as_ref())?;
        let store = Self { conn };
        store.create_schema()?;
        Ok(store)
    }

    /// Open a warehouse produced by an earlier build, read-only
    pub fn open_existing<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(WarehouseError::WarehouseMissing(path.display().to_string()));
        }
        let conn = Connection::open_with_flags(path, OpenFlags::SQLITE_OPEN_READ_ONLY)?;
        let has_facts: bool = conn.query_row(
            "SELECT COUNT(*) > 0 FROM sqlite_master WHERE type = 'table' AND name = ?1",
            params![ddl::FACT_TABLE],
            |row| row.get(0),
        )?;
        if !has_facts {
            return Err(WarehouseError::WarehouseMissing(path.display().to_string()));
        }
        info!(path = %path.display(), "opened warehouse");
        Ok(Self { conn })
    }

    /// Build a complete warehouse at `path`, replacing any previous one only on success
    pub fn publish<P: AsRef<Path>>(
        path: P,
        dimensions: &DimensionSet,
        facts: &[FactRow],
    ) -> Result<()> {
        let path = path.as_ref();
        let staging = staging_path(path);
        if staging.exists() {
            fs::remove_file(&staging)?;
        }

        match Self::write_staging(&staging, dimensions, facts) {
            Ok(()) => {
                fs::rename(&staging, path)?;
                info!(path = %path.display(), facts = facts.len(), "published warehouse");
                Ok(())
            }
            Err(e) => {
                let _ = fs::remove_file(&staging);
                Err(e)
            }
        }
    }

    fn write_staging(staging: &Path, dimensions: &DimensionSet, facts: &[FactRow]) -> Result<()> {
        let mut store = Self::create(staging)?;
        store.load(dimensions, facts)?;
        store.conn.close().map_err(|(_, e)| WarehouseError::Store(e))
    }

    fn create_schema(&self) -> Result<()> {
        self.conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        for statement in ddl::ALL {
            self.conn.execute_batch(statement)?;
        }
        debug!("created star schema");
        Ok(())
    }

    /// Append all dimension rows, then all fact rows, in one transaction
    pub fn load(&mut self, dimensions: &DimensionSet, facts: &[FactRow]) -> Result<()> {
        let tx = self.conn.transaction()?;
        for table in dimensions.iter() {
            insert_dimension(&tx, table)?;
        }
        insert_facts(&tx, facts)?;
        tx.commit()?;
        Ok(())
    }

    /// Number of rows in a warehouse table
    pub fn table_len(&self, table: &str) -> Result<usize> {
        let sql = format!("SELECT COUNT(*) FROM {}", table_ident(table)?);
        let count: i64 = self.conn.query_row(&sql, [], |row| row.get(0))?;
        Ok(count as usize)
    }

    /// Number of fact rows whose foreign keys point at missing dimension rows
    pub fn foreign_key_violations(&self) -> Result<usize> {
        let mut stmt = self.conn.prepare("PRAGMA foreign_key_check")?;
        let violations = stmt.query_map([], |_| Ok(()))?.count();
        Ok(violations)
    }

    /// Surrogate keys and natural keys of one dimension, by key
    pub fn dimension_rows(&self, family: Family) -> Result<Vec<(SurrogateKey, Vec<Value>)>> {
        let columns: Vec<&str> = family
            .attributes()
            .iter()
            .map(|a| a.warehouse_column())
            .collect();
        let sql = format!(
            "SELECT {}, {} FROM {} ORDER BY {}",
            family.key_column(),
            columns.join(", "),
            family.table(),
            family.key_column()
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt
            .query_map([], |row| {
                let key: SurrogateKey = row.get(0)?;
                let natural_key = (1..=columns.len())
                    .map(|i| row.get::<_, Value>(i))
                    .collect::<rusqlite::Result<Vec<_>>>()?;
                Ok((key, natural_key))
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }

    /// `measure` across every fact row joined to `family`, grouped by `attribute`
    ///
    /// Rows come back unordered; ordering is the caller's concern. A null
    /// attribute value forms its own group.
    pub fn grouped_totals(
        &self,
        family: Family,
        attribute: Attribute,
        measure: Measure,
    ) -> Result<Vec<(Value, i64)>> {
        if attribute.family() != Some(family) {
            return Err(WarehouseError::Configuration(format!(
                "attribute '{}' is not part of the {} dimension",
                attribute, family
            )));
        }
        let sql = format!(
            "SELECT d.{attr}, {expr} AS total \
             FROM fact_crash f \
             JOIN {table} d ON f.{key} = d.{key} \
             GROUP BY d.{attr}",
            attr = attribute.warehouse_column(),
            expr = measure.sql_expr(),
            table = family.table(),
            key = family.key_column(),
        );
        debug!(sql = %sql, "grouped aggregate");
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt
            .query_map([], |row| Ok((row.get::<_, Value>(0)?, row.get::<_, i64>(1)?)))?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }

    /// `measure` over the whole fact table
    pub fn grand_total(&self, measure: Measure) -> Result<i64> {
        let sql = format!("SELECT {} FROM fact_crash f", measure.sql_expr());
        let total: i64 = self.conn.query_row(&sql, [], |row| row.get(0))?;
        Ok(total)
    }
}

/// Only the star-schema tables may be interpolated into SQL
fn table_ident(table: &str) -> Result<&str> {
    let known = Family::ALL
        .into_iter()
        .map(Family::table)
        .chain(std::iter::once(ddl::FACT_TABLE))
        .any(|t| t == table);
    if known {
        Ok(table)
    } else {
        Err(WarehouseError::Configuration(format!(
            "unknown warehouse table '{}'",
            table
        )))
    }
}

fn insert_dimension(tx: &Transaction<'_>, table: &DimensionTable) -> Result<()> {
    let family = table.family();
    let mut columns = vec![family.key_column()];
    columns.extend(family.attributes().iter().map(|a| a.warehouse_column()));
    if family == Family::Date {
        columns.extend(["month_name", "is_weekend", "is_holiday"]);
    }
    let placeholders: Vec<String> = (1..=columns.len()).map(|i| format!("?{}", i)).collect();
    let sql = format!(
        "INSERT INTO {} ({}) VALUES ({})",
        family.table(),
        columns.join(", "),
        placeholders.join(", ")
    );

    let mut stmt = tx.prepare(&sql)?;
    for row in table.rows() {
        let mut values: Vec<&dyn ToSql> = Vec::with_capacity(columns.len());
        values.push(&row.key);
        for value in &row.natural_key {
            values.push(value);
        }
        if let DerivedColumns::Date {
            month_name,
            is_weekend,
            is_holiday,
        } = &row.derived
        {
            values.push(month_name);
            values.push(is_weekend);
            values.push(is_holiday);
        }
        stmt.execute(values.as_slice())?;
    }
    debug!(table = family.table(), rows = table.len(), "inserted dimension rows");
    Ok(())
}

fn insert_facts(tx: &Transaction<'_>, facts: &[FactRow]) -> Result<()> {
    let mut stmt = tx.prepare(
        "INSERT INTO fact_crash (crash_id, original_id, date_id, location_id, road_id, \
         person_id, vehicle_id, crash_type, number_fatalities, christmas_period, easter_period) \
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
    )?;
    for fact in facts {
        stmt.execute(params![
            fact.crash_id,
            fact.original_id,
            fact.date_id,
            fact.location_id,
            fact.road_id,
            fact.person_id,
            fact.vehicle_id,
            fact.crash_type,
            fact.number_fatalities,
            fact.christmas_period,
            fact.easter_period,
        ])?;
    }
    debug!(rows = facts.len(), "inserted fact rows");
    Ok(())
}
