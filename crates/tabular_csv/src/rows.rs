//! Conversion of a CSV upload into the row-set wire shape.

use std::io::Read;

use tabular_protocol::defaults::{ROW_ID, ROW_VERSION};
use tabular_protocol::{ColumnModel, CsvUploadOptions, Row, RowSet, SelectColumn};
use tracing::debug;

use crate::dialect::CsvDialect;
use crate::error::{CsvError, Result};

/// Where a CSV position goes in the row set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Slot {
    RowId,
    RowVersion,
    /// Index into the row set's headers.
    Value(usize),
}

/// Read a CSV upload into a [`RowSet`] against the table's current schema.
///
/// With a header line, columns are matched to the schema by name (or id) and
/// `ROW_ID`/`ROW_VERSION` carry row identity. Without one, positions map onto
/// the schema in order.
pub fn csv_to_row_set<R: Read>(
    source: R,
    options: &CsvUploadOptions,
    table_id: &str,
    schema: &[ColumnModel],
) -> Result<RowSet> {
    let dialect = CsvDialect::from_options(options)?;
    let mut records = dialect.records(source);

    let (headers, slots) = if dialect.first_line_header {
        match records.next() {
            Some(record) => {
                let names: Vec<String> = record?.iter().map(|n| n.trim().to_string()).collect();
                slots_from_header(&names, schema)?
            }
            None => (Vec::new(), Vec::new()),
        }
    } else {
        let headers = schema.iter().map(|c| Some(SelectColumn::from(c))).collect();
        let slots = (0..schema.len()).map(Slot::Value).collect();
        (headers, slots)
    };

    let mut rows = Vec::new();
    for record in records {
        let record = record?;
        let line = dialect.lines_to_skip + record.position().map_or(0, |p| p.line());
        let mut row = Row {
            values: Some(vec![None; headers.len()]),
            ..Row::default()
        };
        for (slot, value) in slots.iter().zip(record.iter()) {
            match slot {
                Slot::RowId => row.row_id = parse_identity(value, ROW_ID, line)?,
                Slot::RowVersion => row.version_number = parse_identity(value, ROW_VERSION, line)?,
                Slot::Value(i) => {
                    if let Some(values) = row.values.as_mut() {
                        values[*i] = Some(value.to_string());
                    }
                }
            }
        }
        rows.push(row);
    }

    debug!(table_id, rows = rows.len(), columns = headers.len(), "CSV converted to row set");

    Ok(RowSet {
        table_id: Some(table_id.to_string()),
        etag: None,
        headers,
        rows,
    })
}

fn slots_from_header(
    names: &[String],
    schema: &[ColumnModel],
) -> Result<(Vec<Option<SelectColumn>>, Vec<Slot>)> {
    let mut headers = Vec::new();
    let mut slots = Vec::with_capacity(names.len());
    for name in names {
        let slot = if name.eq_ignore_ascii_case(ROW_ID) {
            Slot::RowId
        } else if name.eq_ignore_ascii_case(ROW_VERSION) {
            Slot::RowVersion
        } else {
            let column = schema
                .iter()
                .find(|c| &c.name == name)
                .or_else(|| schema.iter().find(|c| &c.id == name))
                .ok_or_else(|| CsvError::UnknownHeader {
                    name: name.clone(),
                    header: names.join(","),
                })?;
            headers.push(Some(SelectColumn::from(column)));
            Slot::Value(headers.len() - 1)
        };
        slots.push(slot);
    }
    Ok((headers, slots))
}

fn parse_identity(value: &str, column: &'static str, line: u64) -> Result<Option<i64>> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    trimmed
        .parse::<i64>()
        .map(Some)
        .map_err(|_| CsvError::InvalidRowIdentity {
            column,
            line,
            value: value.to_string(),
        })
}
