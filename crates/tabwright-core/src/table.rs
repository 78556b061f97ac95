//! Structured tables
//!
//! A table is a named rectangular region of a worksheet whose first row holds
//! the column headers. Table names share one namespace across the whole
//! workbook; uniqueness is enforced by [`crate::Workbook`].

use std::collections::HashSet;

use crate::cell::{CellAddress, CellRange};
use crate::error::{Error, Result};
use crate::MAX_TABLE_NAME_LEN;

/// Validate a table name against Excel's rules
///
/// - non-empty, at most 255 characters
/// - first character is a letter (any script), `_` or `\`
/// - remaining characters are letters, digits, `_`, `.` or `\`
/// - must not read as an A1 or R1C1 cell reference, and must not be one of
///   the reserved tokens `R`, `C`, `TRUE`, `FALSE`
pub fn validate_table_name(name: &str) -> Result<()> {
    let invalid = |reason: &'static str| Error::InvalidTableName {
        name: name.to_string(),
        reason,
    };

    let mut chars = name.chars();
    let first = chars.next().ok_or_else(|| invalid("name cannot be empty"))?;
    if name.chars().count() > MAX_TABLE_NAME_LEN {
        return Err(invalid("name exceeds 255 characters"));
    }
    if !(first.is_alphabetic() || first == '_' || first == '\\') {
        return Err(invalid("name must start with a letter, '_' or '\\'"));
    }
    if chars.any(|c| !(c.is_alphanumeric() || matches!(c, '_' | '.' | '\\'))) {
        return Err(invalid("name may only contain letters, digits, '_' and '.'"));
    }
    if ["R", "C", "TRUE", "FALSE"]
        .iter()
        .any(|reserved| name.eq_ignore_ascii_case(reserved))
    {
        return Err(invalid("name is reserved"));
    }
    if CellAddress::parse(name).is_ok() || looks_like_r1c1(name) {
        return Err(invalid("name conflicts with a cell reference"));
    }
    Ok(())
}

// R<digits>, C<digits> or R<digits>C<digits>, case-insensitive
fn looks_like_r1c1(name: &str) -> bool {
    let upper = name.to_ascii_uppercase();
    let digits_then = |s: &str| -> Option<usize> {
        let n = s.bytes().take_while(u8::is_ascii_digit).count();
        (n > 0).then_some(n)
    };

    if let Some(rest) = upper.strip_prefix('C') {
        return digits_then(rest) == Some(rest.len());
    }
    let Some(rest) = upper.strip_prefix('R') else {
        return false;
    };
    let Some(n) = digits_then(rest) else {
        return false;
    };
    let tail = &rest[n..];
    if tail.is_empty() {
        return true;
    }
    match tail.strip_prefix('C') {
        Some(cols) => digits_then(cols) == Some(cols.len()),
        None => false,
    }
}

/// Visual style descriptor of a table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableStyleInfo {
    pub name: String,
    pub show_first_column: bool,
    pub show_last_column: bool,
    pub show_row_stripes: bool,
    pub show_column_stripes: bool,
}

impl TableStyleInfo {
    /// A named style with every highlight flag off
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            show_first_column: false,
            show_last_column: false,
            show_row_stripes: false,
            show_column_stripes: false,
        }
    }
}

/// One column of a table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableColumn {
    /// 1-based id, unique within the table
    pub id: u32,
    /// Header text
    pub name: String,
}

/// A structured table on one worksheet
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    /// Workbook-unique positive id
    pub id: u32,
    /// Workbook-unique name used in structured references
    pub name: String,
    /// Name shown in the UI, defaults to `name`
    pub display_name: String,
    /// Occupied region, header row included
    pub region: CellRange,
    /// Columns, one per region column, left to right
    pub columns: Vec<TableColumn>,
    pub style: Option<TableStyleInfo>,
}

impl Table {
    /// Build a table over `region` with columns named from `headers`
    ///
    /// Missing or blank headers become `Column{n}` (1-based), and repeated
    /// names get a numeric suffix so column names stay unique.
    pub fn new(id: u32, name: impl Into<String>, region: CellRange, headers: &[String]) -> Self {
        let name = name.into();
        let width = region.col_count() as usize;
        let mut seen = HashSet::new();
        let columns = (0..width)
            .map(|i| {
                let base = headers
                    .get(i)
                    .map(|h| h.trim())
                    .filter(|h| !h.is_empty())
                    .map(str::to_string)
                    .unwrap_or_else(|| format!("Column{}", i + 1));
                let mut candidate = base.clone();
                let mut suffix = 2;
                while !seen.insert(candidate.to_lowercase()) {
                    candidate = format!("{}{}", base, suffix);
                    suffix += 1;
                }
                TableColumn {
                    id: i as u32 + 1,
                    name: candidate,
                }
            })
            .collect();

        Self {
            id,
            display_name: name.clone(),
            name,
            region,
            columns,
            style: None,
        }
    }

    /// The table's columns, left to right
    pub fn columns(&self) -> &[TableColumn] {
        &self.columns
    }

    /// Index of the column called `name` (case-insensitive)
    pub fn column_index(&self, name: &str) -> Option<usize> {
        let needle = name.to_lowercase();
        self.columns
            .iter()
            .position(|c| c.name.to_lowercase() == needle)
    }

    /// Header row index
    pub fn header_row(&self) -> u32 {
        self.region.start.row
    }

    /// Sheet column of the table column at `index`
    pub fn sheet_column(&self, index: usize) -> u16 {
        self.region.start.col + index as u16
    }

    /// Region without the header row, `None` for a header-only table
    pub fn data_range(&self) -> Option<CellRange> {
        if self.region.row_count() < 2 {
            return None;
        }
        Some(CellRange::from_indices(
            self.region.start.row + 1,
            self.region.start.col,
            self.region.end.row,
            self.region.end.col,
        ))
    }

    /// Data cells of the named column
    pub fn column_range(&self, name: &str) -> Option<CellRange> {
        let index = self.column_index(name)?;
        self.data_range()?.column(self.sheet_column(index))
    }

    /// Structured reference to the named column, e.g. `TBL_X[Color]`
    pub fn column_reference(&self, column: &str) -> String {
        format!("{}[{}]", self.name, column)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn headers(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_valid_table_names() {
        for name in ["TBL_PEOPLE", "_t", "Sales.2024", "Table1", "Umsätze", "\\raw", "表格1"] {
            assert!(validate_table_name(name).is_ok(), "{name} should be valid");
        }
    }

    #[test]
    fn test_invalid_table_names() {
        for name in ["", "1abc", "has space", "A1", "xfd10", "R", "c", "R1C1", "R12", "C3", "true"] {
            assert!(validate_table_name(name).is_err(), "{name} should be invalid");
        }
        assert!(validate_table_name(&"a".repeat(256)).is_err());
    }

    #[test]
    fn test_default_column_names() {
        let table = Table::new(
            1,
            "T",
            CellRange::parse("B2:E4").unwrap(),
            &headers(&["Id", "", "Id"]),
        );
        let names: Vec<_> = table.columns().iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["Id", "Column2", "Id2", "Column4"]);
        assert_eq!(table.columns()[3].id, 4);
        assert_eq!(table.display_name, "T");
    }

    #[test]
    fn test_geometry_helpers() {
        let table = Table::new(
            1,
            "TBL_PEOPLE",
            CellRange::parse("C2:D7").unwrap(),
            &headers(&["Id", "Name"]),
        );
        assert_eq!(table.column_index("name"), Some(1));
        assert_eq!(table.column_index("missing"), None);
        assert_eq!(table.data_range().unwrap().to_string(), "C3:D7");
        assert_eq!(table.column_range("NAME").unwrap().to_string(), "D3:D7");
        assert_eq!(table.column_reference("Name"), "TBL_PEOPLE[Name]");
    }

    #[test]
    fn test_header_only_table_has_no_data_range() {
        let table = Table::new(1, "T", CellRange::parse("A2:B2").unwrap(), &[]);
        assert!(table.data_range().is_none());
        assert!(table.column_range("Column1").is_none());
    }
}
