//! CSV ingestion.

use crate::error::{InsightError, Result};
use polars::prelude::*;
use std::path::Path;

/// Read a CSV file into a DataFrame with inferred per-column types.
pub fn read_csv(path: impl AsRef<Path>) -> Result<DataFrame> {
    let path = path.as_ref();
    let df = LazyCsvReader::new(path)
        .with_try_parse_dates(true)
        .with_infer_schema_length(Some(1000))
        .finish()
        .map_err(|e| {
            InsightError::Ingest(format!("Failed to read CSV {}: {}", path.display(), e))
        })?
        .collect()
        .map_err(|e| {
            InsightError::Ingest(format!("Failed to load CSV {}: {}", path.display(), e))
        })?;

    if df.width() == 0 {
        return Err(InsightError::Ingest(format!(
            "CSV {} has no columns",
            path.display()
        )));
    }
    Ok(df)
}
