//! Error types for the table operators

use std::path::PathBuf;

use tabwright_xlsx::XlsxError;
use thiserror::Error;

/// Result type alias using [`Error`]
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised by the workbook, sheet and table operators
#[derive(Debug, Error)]
pub enum Error {
    /// No sheet with this name in the workbook
    #[error("Sheet not found: {0}")]
    SheetNotFound(String),

    /// No table with this name on the sheet
    #[error("Table not found: {0}")]
    TableNotFound(String),

    /// The table has no column with this header
    #[error("Column '{column}' not found in table {table}")]
    ColumnNotFound { table: String, column: String },

    /// A checked precondition did not hold
    #[error("Precondition violated: {0}")]
    PreconditionViolated(String),

    /// Fewer values were supplied than the table has columns
    #[error("Expected {expected} values, got {actual}")]
    NotEnoughValues { expected: usize, actual: usize },

    /// The workbook file could not be opened
    #[error("Failed to open workbook {}: {source}", path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: XlsxError,
    },

    /// The workbook file could not be written
    #[error("Failed to save workbook {}: {source}", path.display())]
    Save {
        path: PathBuf,
        #[source]
        source: XlsxError,
    },

    /// Error from the workbook model
    #[error(transparent)]
    Core(#[from] tabwright_core::Error),
}

impl Error {
    pub(crate) fn precondition<S: Into<String>>(msg: S) -> Self {
        Error::PreconditionViolated(msg.into())
    }
}
