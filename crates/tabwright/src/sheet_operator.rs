//! Operations on one worksheet

use ahash::AHashMap;
use tabwright_core::{CellAddress, CellRange, Table, Workbook, Worksheet};

use crate::allocator::{area_for_new_table, estimate_area_for_existing_data};
use crate::config::TableDefaults;
use crate::enum_values::EnumValues;
use crate::error::{Error, Result};
use crate::naming::{format_column_name, generate_table_name};
use crate::table_operator::{check_column_names, TableOperator, TableState};

/// Per-sheet state kept by the workbook operator
#[derive(Debug, Default)]
pub(crate) struct SheetState {
    /// Table states keyed by lowercase table name
    tables: AHashMap<String, TableState>,
}

/// Borrowed view of one worksheet in a workbook
pub struct SheetOperator<'a> {
    workbook: &'a mut Workbook,
    sheet: usize,
    sheet_name: String,
    state: &'a mut SheetState,
    defaults: &'a TableDefaults,
}

impl<'a> SheetOperator<'a> {
    pub(crate) fn new(
        workbook: &'a mut Workbook,
        sheet: usize,
        state: &'a mut SheetState,
        defaults: &'a TableDefaults,
    ) -> Result<Self> {
        let sheet_name = workbook
            .worksheet(sheet)
            .map(|ws| ws.name().to_string())
            .ok_or_else(|| Error::SheetNotFound(format!("#{}", sheet)))?;
        Ok(Self {
            workbook,
            sheet,
            sheet_name,
            state,
            defaults,
        })
    }

    /// Name of the sheet
    pub fn sheet_name(&self) -> &str {
        &self.sheet_name
    }

    /// The underlying worksheet
    pub fn worksheet(&self) -> Result<&Worksheet> {
        self.workbook
            .worksheet(self.sheet)
            .ok_or_else(|| Error::SheetNotFound(self.sheet_name.clone()))
    }

    /// Operator for the table called `name` on this sheet
    ///
    /// The table's state is built on first access and reused afterwards.
    pub fn table(&mut self, name: &str) -> Result<TableOperator<'_>> {
        let ws = self
            .workbook
            .worksheet(self.sheet)
            .ok_or_else(|| Error::SheetNotFound(self.sheet_name.clone()))?;
        let table = ws
            .table(name)
            .ok_or_else(|| Error::TableNotFound(name.to_string()))?;
        let table_name = table.name.clone();

        let state = self
            .state
            .tables
            .entry(table_name.to_lowercase())
            .or_insert_with(|| TableState::from_table(table));

        Ok(TableOperator::new(
            self.workbook,
            self.sheet,
            self.sheet_name.clone(),
            table_name,
            state,
        ))
    }

    /// Names of the tables on this sheet, in sheet order
    pub fn table_names(&self) -> Result<Vec<String>> {
        Ok(self
            .worksheet()?
            .tables()
            .iter()
            .map(|t| t.name.clone())
            .collect())
    }

    /// Create a table over `region` named `name`, columns taken from the
    /// header row's current text
    fn add_new_table(&mut self, region: CellRange, name: &str) -> Result<()> {
        let headers = self.worksheet()?.row_texts(
            region.start.row,
            region.start.col,
            region.col_count(),
        );
        let table = Table::new(self.workbook.next_table_id(), name, region, &headers);
        let created = self.workbook.insert_table(self.sheet, table)?;
        log::debug!(
            "created table {} (id {}) at {}!{}",
            created.name,
            created.id,
            self.sheet_name,
            created.region
        );
        Ok(())
    }

    fn allocate(&self, data_rows: u32, data_cols: usize) -> Result<CellRange> {
        area_for_new_table(&self.worksheet()?.table_regions(), data_rows, data_cols)
    }

    /// Add a table with `headers` and `row_count` blank data rows next to
    /// the existing tables
    pub fn add_empty_table<S: AsRef<str>>(
        &mut self,
        headers: &[S],
        indicative_name: &str,
        row_count: u32,
    ) -> Result<TableOperator<'_>> {
        check_column_names(headers)?;
        let region = self.allocate(row_count, headers.len())?;
        let name = generate_table_name(indicative_name);
        self.add_new_table(region, &name)?;

        let defaults = self.defaults;
        let mut table = self.table(&name)?;
        // Also writes the headers into the header row
        table.set_column_names_ordered(headers)?;
        table.set_table_style(&defaults.style_name)?;
        Ok(table)
    }

    /// Add a one-column lookup table holding `values`, sorted
    /// case-insensitively, and name its data range
    pub fn add_named_value_range_table<S: AsRef<str>>(
        &mut self,
        values: &[S],
        column_header_name: &str,
    ) -> Result<TableOperator<'_>> {
        let mut sorted: Vec<String> = values.iter().map(|v| v.as_ref().to_string()).collect();
        sorted.sort_by_key(|v| v.to_lowercase());

        let column = format_column_name(column_header_name);
        check_column_names(&[column.as_str()])?;

        let data_rows = u32::try_from(sorted.len()).unwrap_or(u32::MAX);
        let region = self.allocate(data_rows, 1)?;
        let name = generate_table_name(column_header_name);
        self.add_new_table(region, &name)?;

        let defaults = self.defaults;
        let mut table = self.table(&name)?;
        table.set_column_names_ordered(&[column.as_str()])?;
        table.set_cell_value_by_column(&column, &sorted, true)?;
        table.set_table_style(&defaults.style_name)?;
        Ok(table)
    }

    /// Lookup table listing every member of `E`, headed by its type name
    pub fn add_enum_value_range_table<E, F>(&mut self, extractor: F) -> Result<TableOperator<'_>>
    where
        E: EnumValues,
        F: Fn(&E) -> String,
    {
        let values: Vec<String> = E::values().iter().map(extractor).collect();
        self.add_named_value_range_table(&values, E::TYPE_NAME)
    }

    /// Turn data already on the sheet into a table anchored at `start_cell_ref`
    ///
    /// The table is named after the sheet. Blank header cells become
    /// `Column{n}` and repeated headers get a numeric suffix; the header row
    /// is rewritten with those names.
    pub fn create_table_on_sheet_with_data(
        &mut self,
        start_cell_ref: &str,
    ) -> Result<TableOperator<'_>> {
        let top_left = CellAddress::parse(start_cell_ref)?;
        let region = estimate_area_for_existing_data(self.worksheet()?, top_left)?;
        let name = generate_table_name(&self.sheet_name);
        self.add_new_table(region, &name)?;

        let defaults = self.defaults;
        let mut table = self.table(&name)?;
        table.write_header_row()?;
        table.set_table_style(&defaults.style_name)?;
        Ok(table)
    }

    /// Hide the sheet's gridlines
    pub fn disable_grid_lines(&mut self) -> Result<()> {
        self.workbook
            .worksheet_mut(self.sheet)
            .ok_or_else(|| Error::SheetNotFound(self.sheet_name.clone()))?
            .set_show_gridlines(false);
        Ok(())
    }

    #[cfg(test)]
    fn cached_tables(&self) -> usize {
        self.state.tables.len()
    }
}
