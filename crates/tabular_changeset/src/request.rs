//! Budget-gated entry points.
//!
//! Both requests are sized against `max_bytes_per_request` before any row is
//! validated, and either produce a complete change set or fail as a whole.

use tabular_protocol::{ColumnModel, PartialRowSet, RowSet, TableLimits, TableRowChange};
use tabular_schema::{
    calculate_max_row_size_for_headers, calculate_max_size_for_column_ids, validate_request_size,
};
use tracing::{debug, info};

use crate::builder::create_sparse_change_set;
use crate::error::{ChangeSetError, Result};
use crate::partial::{
    partial_row_drafts, schema_column_ids, validate_partial_row,
};
use crate::sparse::SparseChangeSet;

/// Worst-case size of a full row set: rows times the widest row its headers allow.
pub fn estimate_row_set_size(row_set: &RowSet, schema: &[ColumnModel], limits: &TableLimits) -> u64 {
    calculate_max_row_size_for_headers(&row_set.headers, schema, limits)
        .saturating_mul(row_set.rows.len() as u64)
}

/// Worst-case size of a partial row set: each row sized by the columns it names.
pub fn estimate_partial_row_set_size(
    partial_set: &PartialRowSet,
    schema: &[ColumnModel],
    limits: &TableLimits,
) -> u64 {
    partial_set
        .rows
        .iter()
        .filter_map(|row| row.values.as_ref())
        .map(|values| {
            calculate_max_size_for_column_ids(values.keys().map(String::as_str), schema, limits)
        })
        .fold(0, u64::saturating_add)
}

pub fn prepare_row_set_change(
    row_set: &RowSet,
    schema: &[ColumnModel],
    limits: &TableLimits,
) -> Result<SparseChangeSet> {
    let table_id = row_set
        .table_id
        .as_deref()
        .ok_or(ChangeSetError::MissingTableId)?;

    let estimated_bytes = estimate_row_set_size(row_set, schema, limits);
    debug!(table_id, estimated_bytes, rows = row_set.rows.len(), "sizing row set");
    validate_request_size(estimated_bytes, limits)?;

    let change_set = create_sparse_change_set(row_set, schema, limits)?;
    info!(table_id, rows = change_set.row_count(), "row set change prepared");
    Ok(change_set)
}

pub fn prepare_partial_row_change(
    partial_set: &PartialRowSet,
    last_change: Option<&TableRowChange>,
    schema: &[ColumnModel],
    limits: &TableLimits,
) -> Result<SparseChangeSet> {
    let table_id = partial_set
        .table_id
        .as_deref()
        .ok_or(ChangeSetError::MissingTableId)?;

    let column_ids = schema_column_ids(schema);
    for row in &partial_set.rows {
        validate_partial_row(row, &column_ids)?;
    }

    let estimated_bytes = estimate_partial_row_set_size(partial_set, schema, limits);
    debug!(table_id, estimated_bytes, rows = partial_set.rows.len(), "sizing partial row set");
    validate_request_size(estimated_bytes, limits)?;

    let mut change_set = SparseChangeSet::new(table_id, schema.to_vec())
        .with_etag(last_change.and_then(|c| c.etag.clone()));
    for draft in partial_row_drafts(last_change, partial_set, schema)? {
        change_set = change_set.with_row(draft, limits)?;
    }
    info!(table_id, rows = change_set.row_count(), "partial row change prepared");
    Ok(change_set)
}
