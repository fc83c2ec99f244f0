//! Budget configuration threaded through every validation call.
//!
//! Limits are read from the `[limits]` table of a TOML file. Every field is
//! optional; anything missing falls back to the values in [`crate::defaults`].
//!
//! ```toml
//! [limits]
//! max_allowed_string_size = 1000
//! max_bytes_per_request = 2097152
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::defaults::{
    DEFAULT_CSV_PREVIEW_ROWS, DEFAULT_CSV_SAMPLE_ROWS_KEPT, DEFAULT_MAX_BYTES_PER_REQUEST,
    LARGE_TEXT_SIZE_ESTIMATE_BYTES, MAX_ALLOWED_LIST_LENGTH, MAX_ALLOWED_STRING_SIZE,
    MAX_BYTES_PER_CHAR_UTF_8, MAX_ENUM_VALUES, MAX_LARGE_TEXT_CHARACTERS,
};
use crate::error::ConfigError;

/// Size and format budgets consumed read-only by validation, sizing and CSV inference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableLimits {
    #[serde(default = "default_max_allowed_string_size")]
    pub max_allowed_string_size: u64,

    #[serde(default = "default_max_large_text_characters")]
    pub max_large_text_characters: u64,

    #[serde(default = "default_max_allowed_list_length")]
    pub max_allowed_list_length: u64,

    #[serde(default = "default_max_bytes_per_char_utf8")]
    pub max_bytes_per_char_utf8: u64,

    #[serde(default = "default_max_bytes_per_request")]
    pub max_bytes_per_request: u64,

    #[serde(default = "default_max_enum_values")]
    pub max_enum_values: usize,

    /// Estimate used for one LARGETEXT cell when sizing a request.
    #[serde(default = "default_large_text_size_estimate_bytes")]
    pub large_text_size_estimate_bytes: u64,

    /// Rows scanned by a CSV preview unless a full scan is requested.
    #[serde(default = "default_csv_preview_rows")]
    pub csv_preview_rows: usize,

    #[serde(default = "default_csv_sample_rows_kept")]
    pub csv_sample_rows_kept: usize,
}

fn default_max_allowed_string_size() -> u64 {
    MAX_ALLOWED_STRING_SIZE
}

fn default_max_large_text_characters() -> u64 {
    MAX_LARGE_TEXT_CHARACTERS
}

fn default_max_allowed_list_length() -> u64 {
    MAX_ALLOWED_LIST_LENGTH
}

fn default_max_bytes_per_char_utf8() -> u64 {
    MAX_BYTES_PER_CHAR_UTF_8
}

fn default_max_bytes_per_request() -> u64 {
    DEFAULT_MAX_BYTES_PER_REQUEST
}

fn default_max_enum_values() -> usize {
    MAX_ENUM_VALUES
}

fn default_large_text_size_estimate_bytes() -> u64 {
    LARGE_TEXT_SIZE_ESTIMATE_BYTES
}

fn default_csv_preview_rows() -> usize {
    DEFAULT_CSV_PREVIEW_ROWS
}

fn default_csv_sample_rows_kept() -> usize {
    DEFAULT_CSV_SAMPLE_ROWS_KEPT
}

impl Default for TableLimits {
    fn default() -> Self {
        Self {
            max_allowed_string_size: default_max_allowed_string_size(),
            max_large_text_characters: default_max_large_text_characters(),
            max_allowed_list_length: default_max_allowed_list_length(),
            max_bytes_per_char_utf8: default_max_bytes_per_char_utf8(),
            max_bytes_per_request: default_max_bytes_per_request(),
            max_enum_values: default_max_enum_values(),
            large_text_size_estimate_bytes: default_large_text_size_estimate_bytes(),
            csv_preview_rows: default_csv_preview_rows(),
            csv_sample_rows_kept: default_csv_sample_rows_kept(),
        }
    }
}

impl TableLimits {
    /// Same limits with a different request budget.
    pub fn with_max_bytes_per_request(mut self, max_bytes: u64) -> Self {
        self.max_bytes_per_request = max_bytes;
        self
    }
}

/// Root of the configuration file.
#[derive(Debug, Default, Deserialize)]
struct ConfigFile {
    #[serde(default)]
    limits: TableLimits,
}

/// Load limits from a TOML file, returning defaults if the file does not exist.
pub fn load_limits(path: &Path) -> Result<TableLimits, ConfigError> {
    if !path.exists() {
        return Ok(TableLimits::default());
    }

    let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    parse_limits(&content).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// Parse limits from TOML text.
pub fn parse_limits(content: &str) -> Result<TableLimits, toml::de::Error> {
    let file: ConfigFile = toml::from_str(content)?;
    Ok(file.limits)
}

/// Config file location under a tabular home directory.
pub fn config_path(home: &Path) -> PathBuf {
    home.join("config.toml")
}
