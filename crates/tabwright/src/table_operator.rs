//! Operations on one table

use ahash::{AHashMap, AHashSet};
use tabwright_core::{
    CellValue, DataValidation, NameScope, NamedRange, Table, TableColumn, TableStyleInfo,
    Workbook, Worksheet, MAX_ROWS,
};

use crate::error::{Error, Result};
use crate::naming::{column_reference_formula, generate_column_named_range_name};

/// Per-table state kept by the owning sheet operator
///
/// The header map is built when the state is first created and is only
/// rebuilt by [`TableOperator::set_column_names_ordered`].
#[derive(Debug, Clone, Default)]
pub(crate) struct TableState {
    columns: AHashMap<String, TableColumn>,
}

impl TableState {
    pub(crate) fn from_table(table: &Table) -> Self {
        let mut state = Self::default();
        state.refresh(table);
        state
    }

    fn refresh(&mut self, table: &Table) {
        self.columns = table
            .columns()
            .iter()
            .map(|c| (c.name.clone(), c.clone()))
            .collect();
    }
}

/// Borrowed view of one table in a workbook
///
/// The table is looked up by name on every call, so the operator never
/// holds on to stale geometry.
pub struct TableOperator<'a> {
    workbook: &'a mut Workbook,
    sheet: usize,
    sheet_name: String,
    table_name: String,
    state: &'a mut TableState,
}

impl<'a> TableOperator<'a> {
    pub(crate) fn new(
        workbook: &'a mut Workbook,
        sheet: usize,
        sheet_name: String,
        table_name: String,
        state: &'a mut TableState,
    ) -> Self {
        Self {
            workbook,
            sheet,
            sheet_name,
            table_name,
            state,
        }
    }

    /// Table name
    pub fn name(&self) -> &str {
        &self.table_name
    }

    /// Name of the sheet the table lives on
    pub fn sheet_name(&self) -> &str {
        &self.sheet_name
    }

    /// The underlying table
    pub fn table(&self) -> Result<&Table> {
        self.worksheet()?
            .table(&self.table_name)
            .ok_or_else(|| Error::TableNotFound(self.table_name.clone()))
    }

    /// Column with exactly this header, as known when the operator state was built
    pub fn table_column(&self, name: &str) -> Option<&TableColumn> {
        self.state.columns.get(name)
    }

    fn worksheet(&self) -> Result<&Worksheet> {
        self.workbook
            .worksheet(self.sheet)
            .ok_or_else(|| Error::SheetNotFound(self.sheet_name.clone()))
    }

    fn worksheet_mut(&mut self) -> Result<&mut Worksheet> {
        self.workbook
            .worksheet_mut(self.sheet)
            .ok_or_else(|| Error::SheetNotFound(self.sheet_name.clone()))
    }

    fn table_mut(&mut self) -> Result<&mut Table> {
        self.workbook
            .table_mut(self.sheet, &self.table_name)
            .ok_or_else(|| Error::TableNotFound(self.table_name.clone()))
    }

    /// Rename the columns left to right and write the names into the header row
    ///
    /// Needs at least one name per column; extra names are ignored. Blank
    /// names and names repeated case-insensitively are rejected before
    /// anything is changed.
    pub fn set_column_names_ordered<S: AsRef<str>>(&mut self, names: &[S]) -> Result<()> {
        let expected = self.table()?.columns.len();
        if names.len() < expected {
            return Err(Error::NotEnoughValues {
                expected,
                actual: names.len(),
            });
        }
        let names = &names[..expected];
        check_column_names(names)?;

        let table = self
            .workbook
            .table_mut(self.sheet, &self.table_name)
            .ok_or_else(|| Error::TableNotFound(self.table_name.clone()))?;
        for (column, name) in table.columns.iter_mut().zip(names) {
            column.name = name.as_ref().to_string();
        }
        self.state.refresh(table);
        self.write_header_row()
    }

    /// Write every column name into its header cell
    pub(crate) fn write_header_row(&mut self) -> Result<()> {
        let table = self.table()?;
        let row = table.header_row();
        let cells: Vec<(u16, String)> = table
            .columns()
            .iter()
            .enumerate()
            .map(|(i, c)| (table.sheet_column(i), c.name.clone()))
            .collect();

        let ws = self.worksheet_mut()?;
        for (col, name) in cells {
            ws.set_cell_value_at(row, col, name)?;
        }
        Ok(())
    }

    /// Index and name of `column`, matched case-insensitively
    fn resolve_column(&self, column: &str) -> Result<(usize, String)> {
        let table = self.table()?;
        table
            .column_index(column)
            .map(|index| (index, table.columns()[index].name.clone()))
            .ok_or_else(|| Error::ColumnNotFound {
                table: table.name.clone(),
                column: column.to_string(),
            })
    }

    /// Write one value per table column into sheet row `row_index`
    pub fn set_cell_value_by_row<S: AsRef<str>>(&mut self, row_index: u32, data: &[S]) -> Result<()> {
        let region = self.table()?.region;
        let width = region.col_count();
        if data.len() < width as usize {
            return Err(Error::NotEnoughValues {
                expected: width as usize,
                actual: data.len(),
            });
        }

        let ws = self.worksheet_mut()?;
        for (offset, value) in (0..width).zip(data) {
            ws.set_cell_value_at(row_index, region.start.col + offset, value.as_ref())?;
        }
        Ok(())
    }

    /// Write the name of `column` as header text followed by `data` downwards
    ///
    /// The header cell always receives the column's own spelling. Rows past
    /// the end of the table are created as needed. With `define_name` the
    /// column's named range is created (or reused) and returned.
    pub fn set_cell_value_by_column<S: AsRef<str>>(
        &mut self,
        column: &str,
        data: &[S],
        define_name: bool,
    ) -> Result<Option<NamedRange>> {
        let (index, column_name) = self.resolve_column(column)?;
        let table = self.table()?;
        let sheet_col = table.sheet_column(index);
        let header_row = table.header_row();

        let last_row = u64::from(header_row) + data.len() as u64;
        if last_row >= u64::from(MAX_ROWS) {
            return Err(tabwright_core::Error::RowOutOfBounds(
                u32::try_from(last_row).unwrap_or(u32::MAX),
                MAX_ROWS - 1,
            )
            .into());
        }

        let ws = self.worksheet_mut()?;
        ws.set_cell_value_at(header_row, sheet_col, column_name.as_str())?;
        for (row, value) in (header_row + 1..).zip(data) {
            ws.set_cell_value_at(row, sheet_col, value.as_ref())?;
        }

        if define_name {
            return self.add_defined_name_for_column(&column_name).map(Some);
        }
        Ok(None)
    }

    /// Workbook-level name covering the data of `column`
    ///
    /// The name and formula use the column's own spelling. Calling it again
    /// returns the existing name. A same-named range that points elsewhere
    /// is an error.
    pub fn add_defined_name_for_column(&mut self, column: &str) -> Result<NamedRange> {
        let (_, column) = self.resolve_column(column)?;
        let table = self.table()?;
        let name = generate_column_named_range_name(&self.sheet_name, &column);
        let formula = column_reference_formula(&table.name, &column);
        let comment = format!(
            "Range of values in column: [{}] of [{}] table",
            column, table.display_name
        );

        if let Some(existing) = self
            .workbook
            .named_ranges()
            .get_exact(&name, &NameScope::Workbook)
            .filter(|n| n.refers_to == formula)
        {
            log::debug!("reusing named range {} for {}", existing.name, formula);
            return Ok(existing.clone());
        }

        let created = self
            .workbook
            .add_named_range(NamedRange::workbook_scope(name, formula).with_comment(comment))?
            .clone();
        log::debug!("defined {} as {}", created.name, created.refers_to);
        Ok(created)
    }

    /// Restrict the data cells of `column` to the values of `named_range`
    ///
    /// Blank cells stay allowed and the in-cell dropdown arrow is hidden.
    pub fn add_drop_down_validation_to_column(
        &mut self,
        column: &str,
        named_range: &NamedRange,
    ) -> Result<()> {
        let table = self.table()?;
        if table.column_index(column).is_none() {
            return Err(Error::precondition(format!(
                "column not found with column name: {}",
                column
            )));
        }
        let region = table.column_range(column).ok_or_else(|| {
            Error::precondition(format!("table {} has no data rows", table.name))
        })?;

        let validation = DataValidation::list(format!("={}", named_range.name))
            .with_range(region)
            .with_allow_blank(true)
            .with_dropdown(false);
        log::debug!(
            "list validation {} on {}!{}",
            named_range.name,
            self.sheet_name,
            region
        );
        self.worksheet_mut()?.add_data_validation(validation);
        Ok(())
    }

    /// Apply a table style with row and column banding turned off
    pub fn set_table_style(&mut self, style_name: &str) -> Result<()> {
        let table = self.table_mut()?;
        let style = table
            .style
            .get_or_insert_with(|| TableStyleInfo::new(style_name));
        style.name = style_name.to_string();
        style.show_row_stripes = false;
        style.show_column_stripes = false;
        Ok(())
    }

    /// Current style descriptor, if any
    pub fn table_style_info(&self) -> Result<Option<&TableStyleInfo>> {
        Ok(self.table()?.style.as_ref())
    }

    /// Value currently in the header cell of `column`
    pub fn header_value(&self, column: &str) -> Result<CellValue> {
        let (index, _) = self.resolve_column(column)?;
        let table = self.table()?;
        Ok(self
            .worksheet()?
            .get_value_at(table.header_row(), table.sheet_column(index)))
    }
}

/// Column names must be non-blank and distinct ignoring case
pub(crate) fn check_column_names<S: AsRef<str>>(names: &[S]) -> Result<()> {
    let mut seen = AHashSet::with_capacity(names.len());
    for name in names {
        let name = name.as_ref();
        if name.trim().is_empty() {
            return Err(Error::precondition("column names must not be blank"));
        }
        if !seen.insert(name.to_lowercase()) {
            return Err(Error::precondition(format!(
                "duplicate column name: {}",
                name
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tabwright_core::{CellRange, ListSource, ValidationType};

    fn workbook_with_table() -> Workbook {
        let mut wb = Workbook::new();
        wb.rename_worksheet(0, "Lookups").unwrap();
        let headers = vec!["Id".to_string(), "Color".to_string()];
        let table = Table::new(1, "TBL_COLORS", CellRange::parse("B2:C5").unwrap(), &headers);
        wb.insert_table(0, table).unwrap();
        wb
    }

    fn operator<'a>(wb: &'a mut Workbook, state: &'a mut TableState) -> TableOperator<'a> {
        TableOperator::new(wb, 0, "Lookups".into(), "TBL_COLORS".into(), state)
    }

    fn state_for(wb: &Workbook) -> TableState {
        TableState::from_table(wb.find_table("TBL_COLORS").unwrap().1)
    }

    #[test]
    fn test_set_column_names_ordered() {
        let mut wb = workbook_with_table();
        let mut state = state_for(&wb);
        let mut op = operator(&mut wb, &mut state);

        op.set_column_names_ordered(&["Key", "Shade", "ignored"]).unwrap();
        assert!(op.table_column("Shade").is_some());
        assert!(op.table_column("Color").is_none());
        let names: Vec<_> = op.table().unwrap().columns().iter().map(|c| c.name.clone()).collect();
        assert_eq!(names, vec!["Key", "Shade"]);
    }

    #[test]
    fn test_too_few_column_names() {
        let mut wb = workbook_with_table();
        let mut state = state_for(&wb);
        let mut op = operator(&mut wb, &mut state);

        let err = op.set_column_names_ordered(&["Only"]).unwrap_err();
        assert!(matches!(err, Error::NotEnoughValues { expected: 2, actual: 1 }));
        assert_eq!(op.table().unwrap().columns()[0].name, "Id");
    }

    #[test]
    fn test_set_cell_value_by_row() {
        let mut wb = workbook_with_table();
        let mut state = state_for(&wb);
        let mut op = operator(&mut wb, &mut state);

        op.set_cell_value_by_row(2, &["7", "Red"]).unwrap();
        assert!(matches!(
            op.set_cell_value_by_row(3, &["8"]),
            Err(Error::NotEnoughValues { expected: 2, actual: 1 })
        ));

        let ws = wb.worksheet(0).unwrap();
        assert_eq!(ws.cell_text_at(2, 1), "7");
        assert_eq!(ws.cell_text_at(2, 2), "Red");
        assert!(!ws.has_row(3));
    }

    #[test]
    fn test_set_cell_value_by_column_writes_header_and_data() {
        let mut wb = workbook_with_table();
        let mut state = state_for(&wb);
        let mut op = operator(&mut wb, &mut state);

        let named = op
            .set_cell_value_by_column("color", &["A", "B", "C", "D", "E"], false)
            .unwrap();
        assert!(named.is_none());

        let ws = wb.worksheet(0).unwrap();
        let column: Vec<_> = (1..7).map(|r| ws.cell_text_at(r, 2)).collect();
        // Header keeps the column's spelling; rows past the table end are created too
        assert_eq!(column, vec!["Color", "A", "B", "C", "D", "E"]);
    }

    #[test]
    fn test_set_column_names_writes_header_cells() {
        let mut wb = workbook_with_table();
        let mut state = state_for(&wb);
        let mut op = operator(&mut wb, &mut state);

        op.set_column_names_ordered(&["Key", "Shade"]).unwrap();
        assert_eq!(op.header_value("shade").unwrap(), CellValue::from("Shade"));

        let ws = wb.worksheet(0).unwrap();
        assert_eq!(ws.row_texts(1, 1, 2), vec!["Key", "Shade"]);
    }

    #[test]
    fn test_duplicate_or_blank_column_names_rejected() {
        let mut wb = workbook_with_table();
        let mut state = state_for(&wb);
        let mut op = operator(&mut wb, &mut state);

        assert!(matches!(
            op.set_column_names_ordered(&["Id", "ID"]),
            Err(Error::PreconditionViolated(_))
        ));
        assert!(matches!(
            op.set_column_names_ordered(&["Id", "  "]),
            Err(Error::PreconditionViolated(_))
        ));
        // A duplicate past the last column is ignored like any extra name
        op.set_column_names_ordered(&["Id", "Shade", "id"]).unwrap();

        let names: Vec<_> = op.table().unwrap().columns().iter().map(|c| c.name.clone()).collect();
        assert_eq!(names, vec!["Id", "Shade"]);
    }

    #[test]
    fn test_rejected_names_change_nothing() {
        let mut wb = workbook_with_table();
        let mut state = state_for(&wb);
        let mut op = operator(&mut wb, &mut state);

        op.set_column_names_ordered(&["Size", "size"]).unwrap_err();
        assert!(op.table_column("Color").is_some());
        assert!(op.table_column("Size").is_none());
        assert_eq!(op.table().unwrap().columns()[0].name, "Id");
        assert!(wb.worksheet(0).unwrap().is_empty());
    }

    #[test]
    fn test_defined_name_uses_column_spelling() {
        let mut wb = workbook_with_table();
        let mut state = state_for(&wb);
        let mut op = operator(&mut wb, &mut state);

        let named = op
            .set_cell_value_by_column("COLOR", &["Red"], true)
            .unwrap()
            .unwrap();
        assert_eq!(named.name, "RNG_LOOKUPS_COLOR");
        assert_eq!(named.refers_to, "TBL_COLORS[Color]");
        assert_eq!(op.add_defined_name_for_column("color").unwrap(), named);
        assert!(matches!(
            op.add_defined_name_for_column("Size"),
            Err(Error::ColumnNotFound { .. })
        ));
    }

    #[test]
    fn test_unknown_column_is_not_found() {
        let mut wb = workbook_with_table();
        let mut state = state_for(&wb);
        let mut op = operator(&mut wb, &mut state);

        let err = op.set_cell_value_by_column("Size", &["S"], true).unwrap_err();
        assert!(matches!(err, Error::ColumnNotFound { .. }));
    }

    #[test]
    fn test_defined_name_is_idempotent() {
        let mut wb = workbook_with_table();
        let mut state = state_for(&wb);
        let mut op = operator(&mut wb, &mut state);

        let first = op.add_defined_name_for_column("Color").unwrap();
        let second = op.add_defined_name_for_column("Color").unwrap();
        assert_eq!(first, second);
        assert_eq!(first.name, "RNG_LOOKUPS_COLOR");
        assert_eq!(first.refers_to, "TBL_COLORS[Color]");
        assert_eq!(
            first.comment.as_deref(),
            Some("Range of values in column: [Color] of [TBL_COLORS] table")
        );
        assert_eq!(wb.named_ranges().len(), 1);
    }

    #[test]
    fn test_conflicting_defined_name() {
        let mut wb = workbook_with_table();
        wb.define_name("RNG_LOOKUPS_COLOR", "Lookups!$C$3:$C$5").unwrap();
        let mut state = state_for(&wb);
        let mut op = operator(&mut wb, &mut state);

        assert!(matches!(
            op.add_defined_name_for_column("Color"),
            Err(Error::Core(tabwright_core::Error::InvalidName(_)))
        ));
    }

    #[test]
    fn test_drop_down_validation() {
        let mut wb = workbook_with_table();
        let mut state = state_for(&wb);
        let mut op = operator(&mut wb, &mut state);

        let source = NamedRange::workbook_scope("RNG_LOOKUPS_COLOR", "TBL_COLORS[Color]");
        op.add_drop_down_validation_to_column("Color", &source).unwrap();

        let ws = wb.worksheet(0).unwrap();
        let validation = &ws.data_validations()[0];
        assert_eq!(validation.sqref(), "C3:C5");
        assert_eq!(
            validation.validation_type,
            ValidationType::List(ListSource::Formula("RNG_LOOKUPS_COLOR".into()))
        );
        assert!(validation.allow_blank);
        assert!(!validation.show_dropdown);
    }

    #[test]
    fn test_drop_down_on_missing_column_adds_nothing() {
        let mut wb = workbook_with_table();
        let mut state = state_for(&wb);
        let mut op = operator(&mut wb, &mut state);

        let source = NamedRange::workbook_scope("RNG_X", "TBL_COLORS[Color]");
        let err = op.add_drop_down_validation_to_column("Missing", &source).unwrap_err();
        assert!(matches!(err, Error::PreconditionViolated(_)));
        assert!(wb.worksheet(0).unwrap().data_validations().is_empty());
    }

    #[test]
    fn test_table_style() {
        let mut wb = workbook_with_table();
        let mut state = state_for(&wb);
        let mut op = operator(&mut wb, &mut state);

        assert!(op.table_style_info().unwrap().is_none());
        op.set_table_style("TableStyleLight9").unwrap();
        op.set_table_style("TableStyleMedium13").unwrap();

        let style = op.table_style_info().unwrap().unwrap();
        assert_eq!(style.name, "TableStyleMedium13");
        assert!(!style.show_row_stripes);
        assert!(!style.show_column_stripes);
        assert!(!style.show_first_column);
    }
}
