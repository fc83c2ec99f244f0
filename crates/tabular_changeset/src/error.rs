use tabular_schema::{BudgetError, ValidationError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ChangeSetError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Budget(#[from] BudgetError),

    #[error("Table ID is required")]
    MissingTableId,

    #[error("PartialRow.value.key: '{key}' is not a valid column ID for row ID: {}", display_row_id(.row_id))]
    UnknownPartialRowColumn { key: String, row_id: Option<i64> },

    #[error("ColumnModel not found for column ID: {0}")]
    ColumnNotFound(String),

    #[error("Row {row_index} has no value for column ID: {column_id}")]
    CellNotSet { row_index: usize, column_id: String },

    #[error("Row ID is required to delete a row (row {row_index})")]
    MissingRowId { row_index: usize },

    #[error("The row id {0} is included more than once in the rowset")]
    DuplicateRowId(i64),

    #[error("Row version number is required for row ID: {0}")]
    MissingVersionNumber(i64),

    #[error("Passed a non-integer file handle id: {0}")]
    InvalidFileHandleId(String),

    #[error("Allocated id range holds {available} ids but {needed} rows need one")]
    IdRangeTooSmall { needed: usize, available: u64 },
}

fn display_row_id(row_id: &Option<i64>) -> String {
    row_id.map_or_else(|| "null".to_string(), |id| id.to_string())
}

pub type Result<T> = std::result::Result<T, ChangeSetError>;
