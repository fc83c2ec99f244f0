//! CSV upload preview: suggested schema plus a few sample rows.

use std::io::Read;

use serde::{Deserialize, Serialize};
use tabular_protocol::{CsvUploadOptions, TableLimits};
use tracing::info;

use crate::dialect::{do_full_file_scan, CsvDialect};
use crate::error::Result;
use crate::inference::{InferredColumn, RowTypeInference};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CsvPreview {
    pub suggested_columns: Vec<InferredColumn>,
    /// Blank cells are `None`.
    pub sample_rows: Vec<Vec<Option<String>>>,
    pub rows_scanned: u64,
    /// True when scanning stopped before the end of the file.
    pub partial_scan: bool,
}

/// Scan a CSV source and suggest a column per position.
///
/// Unless a full scan is requested, at most `limits.csv_preview_rows` data
/// rows are inspected. Column names come from the header line when present,
/// otherwise `col1`, `col2`, ...
pub fn preview_csv<R: Read>(
    source: R,
    options: &CsvUploadOptions,
    limits: &TableLimits,
) -> Result<CsvPreview> {
    let dialect = CsvDialect::from_options(options)?;
    let full_scan = do_full_file_scan(Some(options));

    let mut records = dialect.records(source);
    let header: Option<Vec<String>> = if dialect.first_line_header {
        match records.next() {
            Some(record) => Some(record?.iter().map(str::to_string).collect()),
            None => Some(Vec::new()),
        }
    } else {
        None
    };

    let mut inference = RowTypeInference::new(limits);
    let mut sample_rows = Vec::new();
    let mut partial_scan = false;

    for record in records {
        if !full_scan && inference.rows_seen() >= limits.csv_preview_rows as u64 {
            partial_scan = true;
            break;
        }
        let record = record?;
        inference.add_row(record.iter())?;
        if sample_rows.len() < limits.csv_sample_rows_kept {
            sample_rows.push(
                record
                    .iter()
                    .map(|v| (!v.trim().is_empty()).then(|| v.to_string()))
                    .collect(),
            );
        }
    }

    let header_len = header.as_ref().map_or(0, Vec::len);
    let suggested_columns = inference.columns(header_len, |i| {
        header
            .as_ref()
            .and_then(|h| h.get(i))
            .filter(|name| !name.trim().is_empty())
            .map(|name| name.trim().to_string())
            .unwrap_or_else(|| format!("col{}", i + 1))
    });

    info!(
        rows_scanned = inference.rows_seen(),
        columns = suggested_columns.len(),
        partial_scan,
        "CSV preview complete"
    );

    Ok(CsvPreview {
        suggested_columns,
        sample_rows,
        rows_scanned: inference.rows_seen(),
        partial_scan,
    })
}
