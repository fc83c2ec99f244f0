//! Column Type System
//!
//! The rules every cell of a tabular dataset must satisfy before it reaches
//! the store:
//!
//! 1. **Validation**: each column type has a literal grammar and a canonical form
//! 2. **Normalization**: column definitions are completed and checked up front
//! 3. **Sizing**: every column type has a worst-case byte cost, so whole
//!    requests can be rejected against a budget before any work is done
//! 4. **Diffing**: schema changes are reduced to ordered add/remove lists
//!
//! # Modules
//!
//! - [`value`]: Per-cell validation and canonicalization
//! - [`column`]: Column definition normalization
//! - [`sizing`]: Worst-case size estimates and the request budget check
//! - [`diff`]: Column add/remove changes between two schemas

pub mod column;
pub mod diff;
pub mod error;
pub mod sizing;
pub mod value;

pub use column::{normalize_column_model, normalize_list_length};
pub use diff::{create_changes_from_old_schema_to_new, is_temporary_table_needed};
pub use error::{BudgetError, Result, ValidationError};
pub use sizing::{
    calculate_actual_row_size, calculate_max_row_size, calculate_max_row_size_for_headers,
    calculate_max_size_for_column_ids, is_request_within_max_bytes, max_rows_per_request,
    max_size_for_type, max_size_of_column, validate_request_size,
};
pub use value::{
    format_double, parse_boolean, parse_date, parse_double, parse_integer,
    translate_row_value_from_query, validate_row_value, validate_scalar, validate_value, EntityId,
};
