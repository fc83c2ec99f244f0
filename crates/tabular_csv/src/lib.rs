//! CSV support for tabular uploads.
//!
//! - [`dialect`]: separator/quote/escape resolution and `csv` reader/writer builders
//! - [`inference`]: per-column type widening over sample values
//! - [`preview`]: suggested schema and sample rows for an upload
//! - [`rows`]: conversion of an upload into a row set

pub mod dialect;
pub mod error;
pub mod inference;
pub mod preview;
pub mod rows;

pub use dialect::{
    do_full_file_scan, guess_content_type, guess_extension, is_first_line_header, CsvDialect,
    LineEnd,
};
pub use error::{CsvError, Result};
pub use inference::{check_type, ColumnGuess, InferredColumn, RowTypeInference};
pub use preview::{preview_csv, CsvPreview};
pub use rows::csv_to_row_set;
