//! # tabwright-core
//!
//! In-memory workbook model used by tabwright.
//!
//! This crate provides the document types the table operators work against:
//! - [`CellValue`] - Represents cell values (numbers, strings, booleans, errors, formulas)
//! - [`CellAddress`] and [`CellRange`] - Cell addressing and rectangular regions
//! - [`Table`] - Structured tables (header row + named columns)
//! - [`NamedRange`] - Defined names scoped to the workbook or a sheet
//! - [`DataValidation`] - Cell validation rules (dropdown lists etc.)
//! - [`Workbook`], [`Worksheet`] - The main document structures
//!
//! ## Example
//!
//! ```rust
//! use tabwright_core::{CellRange, Workbook};
//!
//! let mut workbook = Workbook::new();
//! let sheet = workbook.worksheet_mut(0).unwrap();
//! sheet.set_cell_value("A2", "Id").unwrap();
//! sheet.set_cell_value("B2", "Name").unwrap();
//!
//! let table = workbook
//!     .create_table(0, CellRange::parse("A2:B5").unwrap())
//!     .unwrap();
//! assert_eq!(table.columns()[1].name, "Name");
//! ```

pub mod cell;
pub mod error;
pub mod named_range;
pub mod table;
pub mod validation;
pub mod workbook;
pub mod worksheet;

// Re-exports for convenience
pub use cell::{CellAddress, CellRange, CellValue};
pub use error::{Error, Result};
pub use named_range::{validate_defined_name, NameScope, NamedRange, NamedRangeCollection};
pub use table::{validate_table_name, Table, TableColumn, TableStyleInfo};
pub use validation::{
    CompareKind, Criteria, DataValidation, ListSource, ValidationErrorStyle, ValidationOperator,
    ValidationType,
};
pub use workbook::{Workbook, WorkbookSettings};
pub use worksheet::Worksheet;

/// Maximum number of rows in a worksheet (Excel limit)
pub const MAX_ROWS: u32 = 1_048_576;

/// Maximum number of columns in a worksheet (Excel limit)
pub const MAX_COLS: u16 = 16_384;

/// Maximum length of a sheet name
pub const MAX_SHEET_NAME_LEN: usize = 31;

/// Maximum length of a table name
pub const MAX_TABLE_NAME_LEN: usize = 255;
