//! Error taxonomy for binding operations.
//!
//! [`BindError`] is what every fallible library call returns. Per-cell
//! conversion failures are described by [`CellError`] and wrapped in
//! [`BindError::Cell`] together with the row and column that produced them.

use std::{
    error::Error as StdError,
    io,
    num::{ParseFloatError, ParseIntError},
    path::PathBuf,
};

use thiserror::Error;

pub type Result<T, E = BindError> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum BindError {
    #[error("I/O error on {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("Workbook error on {path:?}: {message}")]
    Xlsx { path: PathBuf, message: String },
    #[error("CSV error on {path:?}: {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
    #[error("Unsupported tabular format for {path:?} (expected .xlsx, .xlsm, .csv or .tsv)")]
    UnsupportedFormat { path: PathBuf },
    #[error("Invalid template: no header row recognized in {origin}")]
    InvalidTemplate { origin: String },
    #[error("Row {row}, column '{column}' (field '{field}'): {source}")]
    Cell {
        row: usize,
        column: String,
        field: String,
        #[source]
        source: CellError,
    },
    #[error("Failed to decode {path:?} with encoding {encoding}")]
    Encoding { path: PathBuf, encoding: &'static str },
    #[error("Invalid delimiter '{0}' (use a single ASCII character or comma, tab, semicolon, pipe)")]
    InvalidDelimiter(String),
    #[error("Unknown encoding '{0}'")]
    UnknownEncoding(String),
    #[error("Repeat column name: {0}")]
    DuplicateColumn(String),
    #[error("Invalid binding profile {path:?}: {message}")]
    Config { path: PathBuf, message: String },
}

impl BindError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        BindError::Io {
            path: path.into(),
            source,
        }
    }
}

/// Why a single cell could not be converted into its field's type.
#[derive(Debug, Error)]
pub enum CellError {
    #[error("Failed to parse '{text}' as integer: {source}")]
    Integer {
        text: String,
        #[source]
        source: ParseIntError,
    },
    #[error("Failed to parse '{text}' as float: {source}")]
    Float {
        text: String,
        #[source]
        source: ParseFloatError,
    },
    #[error("Failed to parse '{text}' as boolean")]
    Boolean { text: String },
    #[error("Failed to parse '{text}': {source}")]
    Custom {
        text: String,
        #[source]
        source: Box<dyn StdError + Send + Sync>,
    },
}

impl CellError {
    /// Wraps an error raised by a caller-supplied [`FromCell`](crate::cell::FromCell) impl.
    pub fn custom(text: &str, source: impl Into<Box<dyn StdError + Send + Sync>>) -> Self {
        CellError::Custom {
            text: text.to_string(),
            source: source.into(),
        }
    }

    pub fn text(&self) -> &str {
        match self {
            CellError::Integer { text, .. }
            | CellError::Float { text, .. }
            | CellError::Boolean { text }
            | CellError::Custom { text, .. } => text,
        }
    }
}
