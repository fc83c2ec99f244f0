//! Canonical default limits shared by validation, sizing and CSV inference.

/// Hard ceiling on `maximumSize` for STRING/LINK columns (characters).
pub const MAX_ALLOWED_STRING_SIZE: u64 = 1000;

/// Hard ceiling on the number of characters in a LARGETEXT cell.
pub const MAX_LARGE_TEXT_CHARACTERS: u64 = 349_525;

/// Hard ceiling on `maximumListLength` for list columns.
pub const MAX_ALLOWED_LIST_LENGTH: u64 = 100;

/// Smallest `maximumListLength` a list column may declare.
pub const MIN_ALLOWED_LIST_LENGTH: u64 = 2;

/// Worst-case number of bytes a single character takes in the store's encoding.
pub const MAX_BYTES_PER_CHAR_UTF_8: u64 = 3;

/// Default request budget (bytes) when no configuration overrides it.
pub const DEFAULT_MAX_BYTES_PER_REQUEST: u64 = 2 * 1024 * 1024;

/// Maximum number of enum values a column may declare.
pub const MAX_ENUM_VALUES: usize = 100;

/// Fixed size estimate used for LARGETEXT cells.
pub const LARGE_TEXT_SIZE_ESTIMATE_BYTES: u64 = 3000;

/// `maximumSize` assigned to STRING columns that do not declare one.
pub const DEFAULT_STRING_SIZE: u64 = 50;

/// Number of CSV rows scanned for a preview when a full scan was not requested.
pub const DEFAULT_CSV_PREVIEW_ROWS: usize = 1000;

/// Number of sample rows kept in a CSV preview.
pub const DEFAULT_CSV_SAMPLE_ROWS_KEPT: usize = 5;

/// Enum lists longer than this are not spelled out in validation messages.
pub const MAX_ENUM_VALUES_IN_MESSAGE: usize = 10;

/// Reserved CSV header naming the row id column.
pub const ROW_ID: &str = "ROW_ID";

/// Reserved CSV header naming the row version column.
pub const ROW_VERSION: &str = "ROW_VERSION";
