//! # tabwright-xlsx
//!
//! XLSX (Office Open XML) reader and writer for tabwright workbooks.
//!
//! Besides cells the reader and writer carry everything the table operators
//! depend on: table parts, defined names (with scope and comment), data
//! validations and the gridline display flag.

pub mod error;
pub mod reader;
pub mod writer;

pub use error::{XlsxError, XlsxResult};
pub use reader::XlsxReader;
pub use writer::XlsxWriter;
