use std::collections::BTreeMap;
use std::path::Path;

use serde_json::Value;

use crate::error::ReconError;
use crate::model::RawRecord;

/// Parse CSV text into raw records, one per row. Empty cells become null
/// so the normalizer's missing-field policy applies uniformly.
///
/// Collaborator-side convenience: the pipeline itself performs no I/O.
pub fn load_csv_records(csv_data: &str) -> Result<Vec<RawRecord>, ReconError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_reader(csv_data.as_bytes());

    let headers: Vec<String> = reader
        .headers()
        .map_err(|e| ReconError::Io(e.to_string()))?
        .iter()
        .map(|h| h.to_string())
        .collect();

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|e| ReconError::Io(e.to_string()))?;
        let mut fields = BTreeMap::new();
        for (i, header) in headers.iter().enumerate() {
            let value = match record.get(i) {
                None | Some("") => Value::Null,
                Some(cell) => Value::String(cell.to_string()),
            };
            fields.insert(header.clone(), value);
        }
        rows.push(RawRecord { fields });
    }

    Ok(rows)
}

/// Read and parse a CSV file.
pub fn load_csv_file(path: &Path) -> Result<Vec<RawRecord>, ReconError> {
    let data = std::fs::read_to_string(path)
        .map_err(|e| ReconError::Io(format!("{}: {e}", path.display())))?;
    load_csv_records(&data)
}
