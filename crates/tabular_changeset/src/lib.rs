//! Sparse change sets.
//!
//! Every inbound write, whether a full row set or a partial row set, is
//! reduced to a [`SparseChangeSet`]: rows keyed by column id, validated
//! against the table's current schema, sized against the request budget.
//!
//! # Modules
//!
//! - [`sparse`]: The change set value type and its persisted form
//! - [`builder`]: Full row sets to change sets
//! - [`partial`]: Partial row sets to change sets
//! - [`rows`]: Row id and version bookkeeping
//! - [`request`]: Budget-gated request preparation

pub mod builder;
pub mod error;
pub mod partial;
pub mod request;
pub mod rows;
pub mod sparse;

pub use builder::{create_sparse_change_set, resolve_header_slots, select_columns_from_column_ids};
pub use error::{ChangeSetError, Result};
pub use partial::{
    create_sparse_change_set_from_partial_rows, partial_row_drafts, schema_column_ids,
    validate_partial_row,
};
pub use request::{
    estimate_partial_row_set_size, estimate_row_set_size, prepare_partial_row_change,
    prepare_row_set_change,
};
pub use rows::{
    assign_row_ids_and_versions, convert_to_schema_and_merge, count_empty_or_invalid_row_ids,
    distinct_valid_row_ids, validate_row_versions,
};
pub use sparse::{
    ListColumnChanges, RowDraft, RowMutation, SparseChangeSet, SparseRow, SparseRowGroup,
};
