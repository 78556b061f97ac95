//! Worksheet type

use crate::cell::{CellAddress, CellRange, CellStorage, CellValue};
use crate::error::{Error, Result};
use crate::table::Table;
use crate::validation::DataValidation;
use crate::MAX_ROWS;

/// A worksheet (single sheet in a workbook)
#[derive(Debug, Clone)]
pub struct Worksheet {
    /// Sheet name
    name: String,
    /// Cell storage
    cells: CellStorage,
    /// Tables anchored on this sheet, in creation order
    tables: Vec<Table>,
    /// Data validations
    data_validations: Vec<DataValidation>,
    /// Whether gridlines are drawn
    show_gridlines: bool,
}

impl Worksheet {
    /// Create a new worksheet with the given name
    pub fn new<S: Into<String>>(name: S) -> Self {
        Self {
            name: name.into(),
            cells: CellStorage::new(),
            tables: Vec::new(),
            data_validations: Vec::new(),
            show_gridlines: true,
        }
    }

    /// Get the sheet name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Set the sheet name (use `Workbook::rename_worksheet` for validation)
    pub(crate) fn set_name<S: Into<String>>(&mut self, name: S) {
        self.name = name.into();
    }

    // === Cell Access ===

    /// Get a cell value by address string
    pub fn get_value(&self, address: &str) -> Result<CellValue> {
        let addr = CellAddress::parse(address)?;
        Ok(self.get_value_at(addr.row, addr.col))
    }

    /// Get a cell value by row and column indices
    pub fn get_value_at(&self, row: u32, col: u16) -> CellValue {
        self.cells.get(row, col).cloned().unwrap_or_default()
    }

    /// Display text of a cell, empty for blank cells
    pub fn cell_text_at(&self, row: u32, col: u16) -> String {
        self.cells
            .get(row, col)
            .map(ToString::to_string)
            .unwrap_or_default()
    }

    // === Cell Modification ===

    /// Set a cell value by address string
    pub fn set_cell_value<V: Into<CellValue>>(&mut self, address: &str, value: V) -> Result<()> {
        let addr = CellAddress::parse(address)?;
        self.set_cell_value_at(addr.row, addr.col, value)
    }

    /// Set a cell value by row and column indices, creating the row if needed
    pub fn set_cell_value_at<V: Into<CellValue>>(
        &mut self,
        row: u32,
        col: u16,
        value: V,
    ) -> Result<()> {
        self.validate_cell_position(row, col)?;
        self.cells.set(row, col, value.into());
        Ok(())
    }

    /// Write a formula (leading `=` optional)
    pub fn set_cell_formula_at(&mut self, row: u32, col: u16, formula: &str) -> Result<()> {
        self.set_cell_value_at(row, col, CellValue::formula(formula))
    }

    /// Make sure a row exists without writing any cell
    pub fn ensure_row(&mut self, row: u32) -> Result<()> {
        if row >= MAX_ROWS {
            return Err(Error::RowOutOfBounds(row, MAX_ROWS - 1));
        }
        self.cells.ensure_row(row);
        Ok(())
    }

    /// Whether the row has been created
    pub fn has_row(&self, row: u32) -> bool {
        self.cells.has_row(row)
    }

    /// Greatest existing row index
    pub fn last_row(&self) -> Option<u32> {
        self.cells.last_row()
    }

    /// Greatest written column index in `row`
    pub fn last_col_in_row(&self, row: u32) -> Option<u16> {
        self.cells.last_col_in_row(row)
    }

    /// Get the used range (bounds of all non-empty cells)
    pub fn used_range(&self) -> Option<CellRange> {
        self.cells.used_range()
    }

    /// Display texts of `count` cells starting at (`row`, `col`)
    pub fn row_texts(&self, row: u32, col: u16, count: u16) -> Vec<String> {
        (0..count)
            .map(|offset| self.cell_text_at(row, col + offset))
            .collect()
    }

    /// Number of non-empty cells
    pub fn cell_count(&self) -> usize {
        self.cells.cell_count()
    }

    /// Check whether the sheet holds no cells
    pub fn is_empty(&self) -> bool {
        self.cells.cell_count() == 0
    }

    /// Direct access to the cell storage
    pub fn cells(&self) -> &CellStorage {
        &self.cells
    }

    fn validate_cell_position(&self, row: u32, col: u16) -> Result<()> {
        CellAddress::checked(row, col as u32).map(|_| ())
    }

    // === Tables ===

    /// Tables on this sheet, in creation order
    pub fn tables(&self) -> &[Table] {
        &self.tables
    }

    /// Find a table by name (case-insensitive)
    pub fn table(&self, name: &str) -> Option<&Table> {
        self.tables
            .iter()
            .find(|t| t.name.eq_ignore_ascii_case(name))
    }

    /// Find a table by name for mutation (case-insensitive)
    pub fn table_mut(&mut self, name: &str) -> Option<&mut Table> {
        self.tables
            .iter_mut()
            .find(|t| t.name.eq_ignore_ascii_case(name))
    }

    /// Table regions, in sheet order
    pub fn table_regions(&self) -> Vec<CellRange> {
        self.tables.iter().map(|t| t.region).collect()
    }

    /// First table whose region overlaps `range`
    pub fn overlapping_table(&self, range: &CellRange) -> Option<&Table> {
        self.tables.iter().find(|t| t.region.overlaps(range))
    }

    /// Push a table, checked by `Workbook::insert_table`
    pub(crate) fn push_table(&mut self, table: Table) {
        self.tables.push(table);
    }

    /// Add a table without workbook checks; the sheet must then go through
    /// `Workbook::add_existing_worksheet`, which re-validates it
    pub fn add_table_unchecked(&mut self, table: Table) {
        self.tables.push(table);
    }

    pub(crate) fn take_tables(&mut self) -> Vec<Table> {
        std::mem::take(&mut self.tables)
    }

    // === Data Validation ===

    /// Add a data validation rule
    ///
    /// # Example
    ///
    /// ```rust
    /// use tabwright_core::{CellRange, DataValidation, Worksheet};
    ///
    /// let mut ws = Worksheet::new("Orders");
    /// ws.add_data_validation(
    ///     DataValidation::list("=RNG_LOOKUPS_STATUS")
    ///         .with_range(CellRange::parse("B3:B20").unwrap()),
    /// );
    /// assert_eq!(ws.data_validations().len(), 1);
    /// ```
    pub fn add_data_validation(&mut self, validation: DataValidation) {
        self.data_validations.push(validation);
    }

    /// Get all data validations
    pub fn data_validations(&self) -> &[DataValidation] {
        &self.data_validations
    }

    /// Get the first data validation covering a cell
    pub fn data_validation_at(&self, row: u32, col: u16) -> Option<&DataValidation> {
        self.data_validations
            .iter()
            .find(|v| v.applies_to(row, col))
    }

    // === View ===

    /// Whether gridlines are shown
    pub fn show_gridlines(&self) -> bool {
        self.show_gridlines
    }

    /// Show or hide gridlines
    pub fn set_show_gridlines(&mut self, show: bool) {
        self.show_gridlines = show;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::CellRange;

    #[test]
    fn test_set_and_get_values() {
        let mut ws = Worksheet::new("Data");
        ws.set_cell_value("B2", "hello").unwrap();
        ws.set_cell_value_at(2, 1, 42).unwrap();

        assert_eq!(ws.get_value("B2").unwrap(), CellValue::from("hello"));
        assert_eq!(ws.get_value_at(2, 1), CellValue::Number(42.0));
        assert_eq!(ws.get_value_at(9, 9), CellValue::Empty);
        assert_eq!(ws.cell_text_at(2, 1), "42");
    }

    #[test]
    fn test_out_of_bounds_write() {
        let mut ws = Worksheet::new("Data");
        assert!(ws.set_cell_value_at(MAX_ROWS, 0, 1).is_err());
        assert!(ws.ensure_row(MAX_ROWS).is_err());
    }

    #[test]
    fn test_row_tracking() {
        let mut ws = Worksheet::new("Data");
        assert_eq!(ws.last_row(), None);

        ws.set_cell_value("A2", "Id").unwrap();
        ws.set_cell_value("C2", "Name").unwrap();
        ws.ensure_row(6).unwrap();

        assert_eq!(ws.last_row(), Some(6));
        assert_eq!(ws.last_col_in_row(1), Some(2));
        assert_eq!(ws.last_col_in_row(6), None);
        assert_eq!(ws.row_texts(1, 0, 3), vec!["Id", "", "Name"]);
    }

    #[test]
    fn test_gridlines_default_on() {
        let mut ws = Worksheet::new("Data");
        assert!(ws.show_gridlines());
        ws.set_show_gridlines(false);
        assert!(!ws.show_gridlines());
    }

    #[test]
    fn test_validation_lookup() {
        let mut ws = Worksheet::new("Data");
        ws.add_data_validation(
            DataValidation::list("=RNG_X").with_range(CellRange::parse("C3:C5").unwrap()),
        );
        assert!(ws.data_validation_at(3, 2).is_some());
        assert!(ws.data_validation_at(1, 2).is_none());
    }
}
