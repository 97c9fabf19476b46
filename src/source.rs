//! CSV record source
//!
//! Reads the denormalized crash dataset into [`CrashRecord`]s, preserving file
//! order. Rows with a different number of fields than the header are rejected
//! by the reader and abort the load.

use crate::error::{Result, WarehouseError};
use crate::record::{CrashRecord, Value};
use csv::ReaderBuilder;
use std::io::Read;
use std::path::Path;
use tracing::info;

/// Records of one source file, in file order, with the header row
#[derive(Debug, Clone, Default)]
pub struct RecordSet {
    pub headers: Vec<String>,
    pub records: Vec<CrashRecord>,
}

impl RecordSet {
    /// Load a CSV file
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(WarehouseError::InputMissing(path.display().to_string()));
        }
        let file = std::fs::File::open(path)?;
        let set = Self::from_reader(file)?;
        info!(
            path = %path.display(),
            rows = set.records.len(),
            columns = set.headers.len(),
            "loaded crash records"
        );
        Ok(set)
    }

    /// Parse CSV from any reader (the first row is the header)
    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        let mut rdr = ReaderBuilder::new().has_headers(true).from_reader(reader);
        let headers: Vec<String> = rdr.headers()?.iter().map(str::to_string).collect();

        let mut records = Vec::new();
        for result in rdr.records() {
            let row = result?;
            let mut record = CrashRecord::new();
            for (header, cell) in headers.iter().zip(row.iter()) {
                record.insert(header.clone(), Value::parse(cell));
            }
            records.push(record);
        }

        Ok(Self { headers, records })
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reads_rows_in_file_order() {
        let csv = "ID,State,Speed Limit\n3,NSW,100\n1,VIC,\n2,\"Q,LD\",<40\n";
        let set = RecordSet::from_reader(csv.as_bytes()).unwrap();
        assert_eq!(set.headers, vec!["ID", "State", "Speed Limit"]);
        assert_eq!(set.len(), 3);
        assert_eq!(set.records[0].get("ID"), Some(&Value::Int(3)));
        assert_eq!(set.records[1].get("Speed Limit"), Some(&Value::Null));
        assert_eq!(set.records[2].get("State"), Some(&Value::text("Q,LD")));
        assert_eq!(set.records[2].get("Speed Limit"), Some(&Value::text("<40")));
    }

    #[test]
    fn test_ragged_row_is_an_error() {
        let csv = "ID,State\n1,NSW\n2\n";
        let err = RecordSet::from_reader(csv.as_bytes()).unwrap_err();
        assert!(matches!(err, WarehouseError::Source(_)));
    }

    #[test]
    fn test_header_only_file_is_empty() {
        let set = RecordSet::from_reader("ID,State\n".as_bytes()).unwrap();
        assert!(set.is_empty());
        assert_eq!(set.headers.len(), 2);
    }

    #[test]
    fn test_missing_file() {
        let err = RecordSet::from_path("/nonexistent/crashes.csv").unwrap_err();
        assert!(matches!(err, WarehouseError::InputMissing(_)));
    }
}
