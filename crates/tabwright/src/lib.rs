//! # tabwright
//!
//! Structured tables inside XLSX workbooks: place them without overlap, name
//! them and their columns consistently, and wire column ranges into dropdown
//! validations.
//!
//! The operators form a chain of borrowed views over one owned workbook:
//!
//! - [`WorkbookOperator`] opens and saves the file and hands out sheets
//! - [`SheetOperator`] creates tables on a sheet
//! - [`TableOperator`] fills a table, names its columns and adds validations
//!
//! ## Example
//!
//! ```rust
//! use tabwright::WorkbookOperator;
//!
//! let mut book = WorkbookOperator::create("orders.xlsx");
//!
//! let mut lookups = book.add_sheet("Lookups").unwrap();
//! let status = lookups
//!     .add_named_value_range_table(&["Shipped", "open", "Closed"], "status")
//!     .unwrap()
//!     .add_defined_name_for_column("Status")
//!     .unwrap();
//! assert_eq!(status.name, "RNG_LOOKUPS_STATUS");
//!
//! let mut orders = book.sheet("Sheet1").unwrap();
//! let mut table = orders.add_empty_table(&["Order", "Status"], "orders", 10).unwrap();
//! table.add_drop_down_validation_to_column("Status", &status).unwrap();
//!
//! // book.write_changes().unwrap();
//! ```

pub mod allocator;
pub mod config;
pub mod enum_values;
pub mod error;
pub mod naming;
pub mod sheet_operator;
pub mod table_operator;
pub mod workbook_operator;

pub use config::TableDefaults;
pub use enum_values::EnumValues;
pub use error::{Error, Result};
pub use sheet_operator::SheetOperator;
pub use table_operator::TableOperator;
pub use workbook_operator::WorkbookOperator;

// The document model and file format, for callers that need to go lower
pub use tabwright_core::{
    CellAddress, CellRange, CellValue, DataValidation, ListSource, NameScope, NamedRange, Table,
    TableColumn, TableStyleInfo, ValidationType, Workbook, Worksheet,
};
pub use tabwright_xlsx::{XlsxError, XlsxReader, XlsxWriter};
