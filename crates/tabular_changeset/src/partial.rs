//! Partial row sets to the persisted change-set shape.

use std::collections::{BTreeMap, HashSet};

use tabular_protocol::{
    ColumnModel, PartialRow, PartialRowSet, SparseChangeSetDto, SparseRowDto, TableRowChange,
};
use tracing::debug;

use crate::error::{ChangeSetError, Result};
use crate::sparse::{RowDraft, RowMutation};

/// Numeric ids of the schema's columns. Non-numeric ids can never be named by a partial row.
pub fn schema_column_ids(schema: &[ColumnModel]) -> HashSet<i64> {
    schema.iter().filter_map(|c| c.id.parse().ok()).collect()
}

/// Check that every key of a partial row is a known numeric column id.
pub fn validate_partial_row(row: &PartialRow, column_ids: &HashSet<i64>) -> Result<()> {
    let Some(values) = &row.values else {
        return Ok(());
    };
    for key in values.keys() {
        parse_column_key(key, row.row_id, column_ids)?;
    }
    Ok(())
}

fn parse_column_key(key: &str, row_id: Option<i64>, column_ids: &HashSet<i64>) -> Result<i64> {
    key.trim()
        .parse::<i64>()
        .ok()
        .filter(|id| column_ids.contains(id))
        .ok_or_else(|| ChangeSetError::UnknownPartialRowColumn {
            key: key.to_string(),
            row_id,
        })
}

/// Row drafts for a partial row set, in request order.
///
/// Every draft carries the last change's row version (0 without one).
/// Rows with `values == None` become deletes and need a row id; rows with an
/// empty map carry no change and are left out.
pub fn partial_row_drafts(
    last_change: Option<&TableRowChange>,
    partial_set: &PartialRowSet,
    schema: &[ColumnModel],
) -> Result<Vec<RowDraft>> {
    let column_ids = schema_column_ids(schema);
    let version_number = last_change.map_or(0, |c| c.row_version);

    let mut drafts = Vec::with_capacity(partial_set.rows.len());
    for (row_index, row) in partial_set.rows.iter().enumerate() {
        let mutation = match &row.values {
            None => {
                if row.row_id.is_none() {
                    return Err(ChangeSetError::MissingRowId { row_index });
                }
                RowMutation::Delete
            }
            Some(values) if values.is_empty() => continue,
            Some(values) => {
                let mut cells = Vec::with_capacity(values.len());
                for (key, value) in values {
                    let id = parse_column_key(key, row.row_id, &column_ids)?;
                    cells.push((id.to_string(), value.clone()));
                }
                RowMutation::Set(cells)
            }
        };
        drafts.push(RowDraft {
            row_index,
            row_id: row.row_id,
            version_number: Some(version_number),
            etag: row.etag.clone(),
            mutation,
        });
    }

    debug!(
        rows = drafts.len(),
        skipped = partial_set.rows.len() - drafts.len(),
        version_number,
        "translated partial rows"
    );
    Ok(drafts)
}

/// Translate partial rows against the last change applied to the table.
///
/// The change set carries the last change's etag; rows are produced as by
/// [`partial_row_drafts`].
pub fn create_sparse_change_set_from_partial_rows(
    last_change: Option<&TableRowChange>,
    partial_set: &PartialRowSet,
    schema: &[ColumnModel],
) -> Result<SparseChangeSetDto> {
    let table_id = partial_set
        .table_id
        .clone()
        .ok_or(ChangeSetError::MissingTableId)?;

    let rows = partial_row_drafts(last_change, partial_set, schema)?
        .into_iter()
        .map(|draft| SparseRowDto {
            row_id: draft.row_id,
            version_number: draft.version_number,
            etag: draft.etag,
            values: match draft.mutation {
                RowMutation::Set(cells) => Some(cells.into_iter().collect::<BTreeMap<_, _>>()),
                RowMutation::Delete | RowMutation::Unchanged => None,
            },
        })
        .collect();

    Ok(SparseChangeSetDto {
        table_id,
        etag: last_change.and_then(|c| c.etag.clone()),
        column_ids: schema.iter().map(|c| c.id.clone()).collect(),
        rows,
    })
}
