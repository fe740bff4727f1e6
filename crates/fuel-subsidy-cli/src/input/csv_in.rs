use serde::de::DeserializeOwned;
use tracing::debug;

use super::file::resolve_path;

/// Read every row of a headed CSV file into `T`.
///
/// Columns are matched by header name, so extra columns are ignored and
/// column order does not matter.
pub fn read_csv<T: DeserializeOwned>(path: &str) -> Result<Vec<T>, Box<dyn std::error::Error>> {
    let canonical = resolve_path(path)?;
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_path(&canonical)
        .map_err(|e| format!("Failed to open '{}': {}", canonical.display(), e))?;

    let mut rows = Vec::new();
    for (i, record) in reader.deserialize().enumerate() {
        // +2: one-based, plus the header line
        let row: T = record
            .map_err(|e| format!("{} line {}: {}", canonical.display(), i + 2, e))?;
        rows.push(row);
    }
    debug!(path = %canonical.display(), rows = rows.len(), "read csv");
    Ok(rows)
}

/// Read an optional CSV; a missing flag yields no rows.
pub fn read_csv_opt<T: DeserializeOwned>(
    path: Option<&str>,
) -> Result<Vec<T>, Box<dyn std::error::Error>> {
    match path {
        Some(p) => read_csv(p),
        None => Ok(Vec::new()),
    }
}
