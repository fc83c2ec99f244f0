//! Worst-case byte accounting for rows and requests.
//!
//! Every estimate is an upper bound on the UTF-8 length of the canonical
//! literal a column can hold. A request is checked against the budget before
//! any cell is validated or written.

use tabular_protocol::{ColumnModel, ColumnType, SelectColumn, TableLimits};
use tracing::warn;

use crate::error::BudgetError;

/// `len("false")`
pub const MAX_BOOLEAN_BYTES: u64 = 5;

/// `len("-9223372036854775808")`, shared by every integral type and DATE.
pub const MAX_INTEGER_BYTES: u64 = 20;

/// Longest canonical double, `len("-2.2250738585072014e-308")`.
pub const MAX_DOUBLE_BYTES: u64 = 24;

/// `len("syn-9223372036854775808.-9223372036854775808")`
pub const MAX_ENTITY_ID_BYTES: u64 = 44;

/// Row id plus row version.
pub const ROW_METADATA_BYTES: u64 = 2 * MAX_INTEGER_BYTES;

/// Worst-case size of one cell of `column_type`.
///
/// Missing string sizes and list lengths fall back to the global maximums.
pub fn max_size_for_type(
    column_type: ColumnType,
    maximum_size: Option<u64>,
    maximum_list_length: Option<u64>,
    limits: &TableLimits,
) -> u64 {
    let list = |element: ColumnType| {
        max_size_for_type(element, maximum_size, None, limits)
            .saturating_mul(maximum_list_length.unwrap_or(limits.max_allowed_list_length))
    };
    match column_type {
        ColumnType::Boolean => MAX_BOOLEAN_BYTES,
        ColumnType::Integer
        | ColumnType::Date
        | ColumnType::FileHandleId
        | ColumnType::UserId
        | ColumnType::SubmissionId
        | ColumnType::EvaluationId => MAX_INTEGER_BYTES,
        ColumnType::Double => MAX_DOUBLE_BYTES,
        ColumnType::EntityId => MAX_ENTITY_ID_BYTES,
        ColumnType::String | ColumnType::Link => maximum_size
            .unwrap_or(limits.max_allowed_string_size)
            .saturating_mul(limits.max_bytes_per_char_utf8),
        ColumnType::LargeText => limits.large_text_size_estimate_bytes,
        ColumnType::StringList => list(ColumnType::String),
        ColumnType::IntegerList => list(ColumnType::Integer),
        ColumnType::BooleanList => list(ColumnType::Boolean),
        ColumnType::DateList => list(ColumnType::Date),
        ColumnType::EntityIdList => list(ColumnType::EntityId),
        ColumnType::UserIdList => list(ColumnType::UserId),
    }
}

pub fn max_size_of_column(column: &ColumnModel, limits: &TableLimits) -> u64 {
    max_size_for_type(
        column.column_type,
        column.maximum_size,
        column.maximum_list_length,
        limits,
    )
}

/// Sum of the worst-case cell sizes of `columns`.
pub fn calculate_max_row_size(columns: &[ColumnModel], limits: &TableLimits) -> u64 {
    columns
        .iter()
        .map(|c| max_size_of_column(c, limits))
        .fold(0, u64::saturating_add)
}

/// Worst-case row size for an inbound header list.
///
/// Headers are matched to the schema by id, or by name when they carry no id.
/// Unmatched headers are sized with the global maximums for their declared
/// type (STRING when untyped). `None` headers are ignored positions.
pub fn calculate_max_row_size_for_headers(
    headers: &[Option<SelectColumn>],
    schema: &[ColumnModel],
    limits: &TableLimits,
) -> u64 {
    headers
        .iter()
        .flatten()
        .map(|header| match find_column(header, schema) {
            Some(column) => max_size_of_column(column, limits),
            None => max_size_for_type(
                header.column_type.unwrap_or(ColumnType::String),
                None,
                None,
                limits,
            ),
        })
        .fold(0, u64::saturating_add)
}

/// Worst-case size of a partial row touching the given column ids.
pub fn calculate_max_size_for_column_ids<'a, I>(
    column_ids: I,
    schema: &[ColumnModel],
    limits: &TableLimits,
) -> u64
where
    I: IntoIterator<Item = &'a str>,
{
    column_ids
        .into_iter()
        .map(|id| match schema.iter().find(|c| c.id == id) {
            Some(column) => max_size_of_column(column, limits),
            None => max_size_for_type(ColumnType::String, None, None, limits),
        })
        .fold(0, u64::saturating_add)
}

fn find_column<'a>(header: &SelectColumn, schema: &'a [ColumnModel]) -> Option<&'a ColumnModel> {
    match header.id.as_deref() {
        Some(id) => schema.iter().find(|c| c.id == id),
        None => schema.iter().find(|c| c.name == header.name),
    }
}

/// Actual size of a row's values: row metadata plus every non-null value.
pub fn calculate_actual_row_size<'a, I>(values: I, limits: &TableLimits) -> u64
where
    I: IntoIterator<Item = Option<&'a str>>,
{
    values
        .into_iter()
        .flatten()
        .map(|v| (v.chars().count() as u64).saturating_mul(limits.max_bytes_per_char_utf8))
        .fold(ROW_METADATA_BYTES, u64::saturating_add)
}

pub fn is_request_within_max_bytes(row_size: u64, row_count: u64, max_bytes: u64) -> bool {
    row_size.saturating_mul(row_count) <= max_bytes
}

/// Reject an estimated request size above the configured budget.
pub fn validate_request_size(estimated_bytes: u64, limits: &TableLimits) -> Result<(), BudgetError> {
    if estimated_bytes > limits.max_bytes_per_request {
        warn!(
            estimated_bytes,
            max_bytes = limits.max_bytes_per_request,
            "request rejected by size budget"
        );
        return Err(BudgetError::RequestTooLarge {
            max_bytes: limits.max_bytes_per_request,
            estimated_bytes,
        });
    }
    Ok(())
}

/// Number of worst-case rows of `schema` that fit in one request, `None` for an empty schema.
pub fn max_rows_per_request(schema: &[ColumnModel], limits: &TableLimits) -> Option<u64> {
    let row_size = calculate_max_row_size(schema, limits);
    if row_size == 0 {
        return None;
    }
    Some(limits.max_bytes_per_request / row_size)
}
