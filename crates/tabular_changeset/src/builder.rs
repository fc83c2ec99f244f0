//! Full row sets to sparse change sets.

use tabular_protocol::{ColumnModel, Row, RowSet, SelectColumn, TableLimits};
use tracing::debug;

use crate::error::{ChangeSetError, Result};
use crate::sparse::{RowDraft, RowMutation, SparseChangeSet};

/// Build a validated change set from a full row set.
///
/// Values are routed by header to schema column ids; positions whose header
/// is `None` or names a column outside the schema are dropped. A row with no
/// values is a delete and is still counted.
pub fn create_sparse_change_set(
    row_set: &RowSet,
    schema: &[ColumnModel],
    limits: &TableLimits,
) -> Result<SparseChangeSet> {
    let table_id = row_set
        .table_id
        .as_deref()
        .ok_or(ChangeSetError::MissingTableId)?;
    let slots = resolve_header_slots(&row_set.headers, schema);

    let mut change_set =
        SparseChangeSet::new(table_id, schema.to_vec()).with_etag(row_set.etag.clone());
    for (row_index, row) in row_set.rows.iter().enumerate() {
        change_set = change_set.with_row(draft_from_row(row_index, row, &slots), limits)?;
    }

    debug!(
        table_id,
        rows = change_set.row_count(),
        ignored_headers = slots.iter().filter(|s| s.is_none()).count(),
        "built sparse change set"
    );
    Ok(change_set)
}

/// Schema column id for each header position, `None` for positions to skip.
pub fn resolve_header_slots(
    headers: &[Option<SelectColumn>],
    schema: &[ColumnModel],
) -> Vec<Option<String>> {
    headers
        .iter()
        .map(|header| {
            let header = header.as_ref()?;
            let column = match header.id.as_deref() {
                Some(id) => schema.iter().find(|c| c.id == id),
                None => schema.iter().find(|c| c.name == header.name),
            }?;
            Some(column.id.clone())
        })
        .collect()
}

fn draft_from_row(row_index: usize, row: &Row, slots: &[Option<String>]) -> RowDraft {
    let mutation = match row.values.as_deref() {
        None | Some([]) => RowMutation::Delete,
        Some(values) => RowMutation::set(
            slots
                .iter()
                .zip(values)
                .filter_map(|(slot, value)| Some((slot.clone()?, value.clone())))
                .collect(),
        ),
    };
    RowDraft {
        row_index,
        row_id: row.row_id,
        version_number: row.version_number,
        etag: row.etag.clone(),
        mutation,
    }
}

/// Header list for a set of column ids; ids outside the schema map to `None`.
pub fn select_columns_from_column_ids<'a, I>(
    column_ids: I,
    schema: &[ColumnModel],
) -> Vec<Option<SelectColumn>>
where
    I: IntoIterator<Item = &'a str>,
{
    column_ids
        .into_iter()
        .map(|id| schema.iter().find(|c| c.id == id).map(SelectColumn::from))
        .collect()
}
