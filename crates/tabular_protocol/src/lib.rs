//! Data model, limits and change-set serialization for tabular datasets.
//!
//! Everything that crosses a crate or process boundary lives here: the column
//! type system's wire names, row-set shapes (full, partial, sparse), the
//! budgets consumed by validation, and the compressed frame format used to
//! persist a sparse change set.

pub mod codec;
pub mod config;
pub mod defaults;
pub mod error;
pub mod types;

pub use codec::{
    decode_change_set, encode_change_set, encode_change_set_with, read_change_set,
    write_change_set, Codec, FrameHeader, FRAME_VERSION, HEADER_SIZE,
};
pub use config::{config_path, load_limits, parse_limits, TableLimits};
pub use error::{ConfigError, ProtocolError, Result};
pub use types::{
    ColumnChange, ColumnModel, ColumnType, CsvTableDescriptor, CsvUploadOptions, IdRange,
    PartialRow, PartialRowSet, Row, RowSet, SelectColumn, SparseChangeSetDto, SparseRowDto,
    TableRowChange,
};
