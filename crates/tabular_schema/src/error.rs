use tabular_protocol::ColumnType;
use thiserror::Error;

/// A value or column definition that does not satisfy the column type system.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Value at [{row},{column}] was not a valid {column_type}. {reason}")]
    InvalidValue {
        row: usize,
        column: usize,
        column_type: ColumnType,
        reason: String,
    },

    #[error("{0}")]
    InvalidColumn(String),
}

/// A request whose worst-case size does not fit the configured budget.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BudgetError {
    #[error("Request exceeds the maximum number of bytes per request ({max_bytes} bytes); estimated {estimated_bytes} bytes.")]
    RequestTooLarge { max_bytes: u64, estimated_bytes: u64 },
}

pub type Result<T> = std::result::Result<T, ValidationError>;
