use thiserror::Error;

#[derive(Debug, Error)]
pub enum CsvError {
    #[error("CsvTableDescriptor.{field} must be exactly one character.")]
    InvalidDialectCharacter { field: &'static str },

    #[error("CsvTableDescriptor.lineEnd must be a single character or \\r\\n, but was {0:?}")]
    InvalidLineEnd(String),

    #[error("One or more cells exceed the maximum number of characters allowed for a table cell ({max}).")]
    CellTooLarge { max: u64 },

    #[error("The first line is expected to be a header but the values do not match the names of the columns of the table ({name} is not a valid column name or id). Header row: {header}")]
    UnknownHeader { name: String, header: String },

    #[error("Invalid {column} on line {line}: '{value}'")]
    InvalidRowIdentity {
        column: &'static str,
        line: u64,
        value: String,
    },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, CsvError>;
