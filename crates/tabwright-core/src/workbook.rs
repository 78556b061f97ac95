//! Workbook type - the main document structure

use crate::cell::CellRange;
use crate::error::{Error, Result};
use crate::named_range::{NameScope, NamedRange, NamedRangeCollection};
use crate::table::{validate_table_name, Table};
use crate::worksheet::Worksheet;
use crate::MAX_SHEET_NAME_LEN;

/// A workbook (spreadsheet document)
///
/// A workbook owns its worksheets, the tables anchored on them, and the
/// defined names. Table names and ids are unique across the whole workbook.
#[derive(Debug, Clone)]
pub struct Workbook {
    /// Worksheets in the workbook
    worksheets: Vec<Worksheet>,
    /// Workbook settings
    settings: WorkbookSettings,
    /// Named ranges (defined names)
    named_ranges: NamedRangeCollection,
}

impl Workbook {
    /// Create a new workbook with one worksheet named `Sheet1`
    pub fn new() -> Self {
        let mut wb = Self::empty();
        wb.worksheets.push(Worksheet::new("Sheet1"));
        wb
    }

    /// Create an empty workbook with no worksheets
    pub fn empty() -> Self {
        Self {
            worksheets: Vec::new(),
            settings: WorkbookSettings::default(),
            named_ranges: NamedRangeCollection::new(),
        }
    }

    /// Get the number of worksheets
    pub fn sheet_count(&self) -> usize {
        self.worksheets.len()
    }

    /// Get a worksheet by index
    pub fn worksheet(&self, index: usize) -> Option<&Worksheet> {
        self.worksheets.get(index)
    }

    /// Get a mutable worksheet by index
    pub fn worksheet_mut(&mut self, index: usize) -> Option<&mut Worksheet> {
        self.worksheets.get_mut(index)
    }

    /// Get the index of a worksheet by name (case-insensitive)
    pub fn sheet_index(&self, name: &str) -> Option<usize> {
        self.worksheets
            .iter()
            .position(|ws| ws.name().eq_ignore_ascii_case(name))
    }

    /// Iterate over all worksheets
    pub fn worksheets(&self) -> impl Iterator<Item = &Worksheet> {
        self.worksheets.iter()
    }

    /// Add a new worksheet with specified name
    pub fn add_worksheet_with_name(&mut self, name: &str) -> Result<usize> {
        self.validate_sheet_name(name, None)?;
        self.worksheets.push(Worksheet::new(name));
        Ok(self.worksheets.len() - 1)
    }

    /// Add a worksheet built elsewhere (used by readers)
    ///
    /// Tables on the incoming sheet are re-checked against the rest of the
    /// workbook.
    pub fn add_existing_worksheet(&mut self, mut worksheet: Worksheet) -> Result<usize> {
        self.validate_sheet_name(worksheet.name(), None)?;
        let tables = worksheet.take_tables();
        self.worksheets.push(worksheet);
        let index = self.worksheets.len() - 1;
        for table in tables {
            self.insert_table(index, table)?;
        }
        Ok(index)
    }

    /// Remove a worksheet by index, dropping names scoped to it
    pub fn remove_worksheet(&mut self, index: usize) -> Result<Worksheet> {
        if index >= self.worksheets.len() {
            return Err(Error::SheetOutOfBounds(index, self.worksheets.len()));
        }
        self.named_ranges.remove_sheet(index);
        Ok(self.worksheets.remove(index))
    }

    /// Rename a worksheet
    pub fn rename_worksheet(&mut self, index: usize, new_name: &str) -> Result<()> {
        if index >= self.worksheets.len() {
            return Err(Error::SheetOutOfBounds(index, self.worksheets.len()));
        }
        self.validate_sheet_name(new_name, Some(index))?;
        self.worksheets[index].set_name(new_name);
        Ok(())
    }

    /// Get workbook settings
    pub fn settings(&self) -> &WorkbookSettings {
        &self.settings
    }

    /// Get mutable workbook settings
    pub fn settings_mut(&mut self) -> &mut WorkbookSettings {
        &mut self.settings
    }

    // ==================== Tables ====================

    /// Create a table over `region` on the sheet at `sheet`
    ///
    /// The table gets the next free id and a default name `Table{id}`. Its
    /// columns are named from the header row's current text; blank header
    /// cells become `Column{n}`.
    pub fn create_table(&mut self, sheet: usize, region: CellRange) -> Result<&Table> {
        let id = self.next_table_id();
        let mut n = id;
        let name = loop {
            let candidate = format!("Table{}", n);
            if self.find_table(&candidate).is_none() {
                break candidate;
            }
            n += 1;
        };

        let ws = self
            .worksheets
            .get(sheet)
            .ok_or(Error::SheetOutOfBounds(sheet, self.worksheets.len()))?;
        let headers = ws.row_texts(region.start.row, region.start.col, region.col_count());
        let table = Table::new(id, name, region, &headers);
        self.insert_table(sheet, table)
    }

    /// Attach a fully built table to a sheet
    ///
    /// Checks the name, workbook-wide name and id uniqueness, and that the
    /// region does not overlap another table on the same sheet.
    pub fn insert_table(&mut self, sheet: usize, mut table: Table) -> Result<&Table> {
        validate_table_name(&table.name)?;
        if self.find_table(&table.name).is_some() {
            return Err(Error::DuplicateTableName(table.name));
        }
        if table.id == 0 || self.tables().any(|(_, t)| t.id == table.id) {
            table.id = self.next_table_id();
        }

        let count = self.worksheets.len();
        let ws = self
            .worksheets
            .get_mut(sheet)
            .ok_or(Error::SheetOutOfBounds(sheet, count))?;
        if let Some(existing) = ws.overlapping_table(&table.region) {
            return Err(Error::TableOverlap {
                range: table.region.to_a1_string(),
                existing: existing.name.clone(),
            });
        }
        ws.push_table(table);
        ws.tables()
            .last()
            .ok_or_else(|| Error::other("table vanished after insert"))
    }

    /// Next unused table id (ids start at 1)
    pub fn next_table_id(&self) -> u32 {
        self.tables().map(|(_, t)| t.id).max().unwrap_or(0) + 1
    }

    /// All tables with the index of the sheet they live on
    pub fn tables(&self) -> impl Iterator<Item = (usize, &Table)> {
        self.worksheets
            .iter()
            .enumerate()
            .flat_map(|(idx, ws)| ws.tables().iter().map(move |t| (idx, t)))
    }

    /// Find a table anywhere in the workbook (case-insensitive)
    pub fn find_table(&self, name: &str) -> Option<(usize, &Table)> {
        self.tables().find(|(_, t)| t.name.eq_ignore_ascii_case(name))
    }

    /// Mutable access to a table on a known sheet
    pub fn table_mut(&mut self, sheet: usize, name: &str) -> Option<&mut Table> {
        self.worksheets.get_mut(sheet)?.table_mut(name)
    }

    /// Rename a table, keeping the display name in step when they matched
    pub fn rename_table(&mut self, old_name: &str, new_name: &str) -> Result<()> {
        validate_table_name(new_name)?;
        let (sheet, _) = self
            .find_table(old_name)
            .ok_or_else(|| Error::TableNotFound(old_name.to_string()))?;
        if let Some((_, other)) = self.find_table(new_name) {
            if !other.name.eq_ignore_ascii_case(old_name) {
                return Err(Error::DuplicateTableName(new_name.to_string()));
            }
        }

        let table = self.worksheets[sheet]
            .table_mut(old_name)
            .ok_or_else(|| Error::TableNotFound(old_name.to_string()))?;
        if table.display_name == table.name {
            table.display_name = new_name.to_string();
        }
        table.name = new_name.to_string();
        Ok(())
    }

    // ==================== Named Ranges ====================

    /// Define a new workbook-scoped named range
    ///
    /// # Example
    /// ```
    /// use tabwright_core::Workbook;
    ///
    /// let mut wb = Workbook::new();
    /// wb.define_name("TaxRate", "Sheet1!$B$1").unwrap();
    /// ```
    pub fn define_name(&mut self, name: &str, refers_to: &str) -> Result<()> {
        self.add_named_range(NamedRange::workbook_scope(name, refers_to))
            .map(|_| ())
    }

    /// Define a fully described named range
    pub fn add_named_range(&mut self, range: NamedRange) -> Result<&NamedRange> {
        if let NameScope::Sheet(idx) = range.scope {
            if idx >= self.worksheets.len() {
                return Err(Error::SheetOutOfBounds(idx, self.worksheets.len()));
            }
        }
        self.named_ranges.define(range)
    }

    /// Get a named range by name, following Excel's scoping rules
    pub fn get_named_range(&self, name: &str, current_sheet: Option<usize>) -> Option<&NamedRange> {
        self.named_ranges.get(name, current_sheet)
    }

    /// Get the named range collection (read-only)
    pub fn named_ranges(&self) -> &NamedRangeCollection {
        &self.named_ranges
    }

    /// Validate a sheet name, optionally excluding a sheet from the duplicate check
    fn validate_sheet_name(&self, name: &str, exclude_index: Option<usize>) -> Result<()> {
        if name.is_empty() {
            return Err(Error::InvalidSheetName("Sheet name cannot be empty".into()));
        }
        if name.chars().count() > MAX_SHEET_NAME_LEN {
            return Err(Error::InvalidSheetName(format!(
                "Sheet name too long (max {} characters)",
                MAX_SHEET_NAME_LEN
            )));
        }

        const INVALID_CHARS: &[char] = &[':', '\\', '/', '?', '*', '[', ']'];
        if let Some(c) = name.chars().find(|c| INVALID_CHARS.contains(c)) {
            return Err(Error::InvalidSheetName(format!(
                "Sheet name cannot contain '{}'",
                c
            )));
        }

        let taken = self
            .worksheets
            .iter()
            .enumerate()
            .any(|(i, ws)| Some(i) != exclude_index && ws.name().eq_ignore_ascii_case(name));
        if taken {
            return Err(Error::DuplicateSheetName(name.into()));
        }
        Ok(())
    }
}

impl Default for Workbook {
    fn default() -> Self {
        Self::new()
    }
}

/// Workbook-level settings
#[derive(Debug, Clone, Default)]
pub struct WorkbookSettings {
    /// Date system: false = 1900 (Windows), true = 1904 (Mac)
    pub date_1904: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{NameScope, TableStyleInfo};
    use pretty_assertions::assert_eq;

    fn range(s: &str) -> CellRange {
        CellRange::parse(s).unwrap()
    }

    #[test]
    fn test_new_workbook() {
        let wb = Workbook::new();
        assert_eq!(wb.sheet_count(), 1);
        assert_eq!(wb.worksheet(0).unwrap().name(), "Sheet1");
        assert!(!wb.settings().date_1904);
    }

    #[test]
    fn test_sheet_names_validated() {
        let mut wb = Workbook::new();
        assert!(matches!(
            wb.add_worksheet_with_name("sheet1"),
            Err(Error::DuplicateSheetName(_))
        ));
        assert!(wb.add_worksheet_with_name("").is_err());
        assert!(wb.add_worksheet_with_name("a/b").is_err());
        assert!(wb.add_worksheet_with_name(&"x".repeat(32)).is_err());
        assert_eq!(wb.add_worksheet_with_name("Lookups").unwrap(), 1);
        assert_eq!(wb.sheet_index("LOOKUPS"), Some(1));
    }

    #[test]
    fn test_create_table_reads_headers() {
        let mut wb = Workbook::new();
        let ws = wb.worksheet_mut(0).unwrap();
        ws.set_cell_value("A2", "Id").unwrap();
        ws.set_cell_value("C2", "Email").unwrap();

        let table = wb.create_table(0, range("A2:C6")).unwrap();
        assert_eq!(table.id, 1);
        assert_eq!(table.name, "Table1");
        let names: Vec<_> = table.columns().iter().map(|c| c.name.clone()).collect();
        assert_eq!(names, vec!["Id", "Column2", "Email"]);

        let second = wb.create_table(0, range("E2:E3")).unwrap();
        assert_eq!((second.id, second.name.as_str()), (2, "Table2"));
    }

    #[test]
    fn test_create_table_rejects_overlap() {
        let mut wb = Workbook::new();
        wb.create_table(0, range("A2:B7")).unwrap();
        let err = wb.create_table(0, range("B4:C5")).unwrap_err();
        assert!(matches!(err, Error::TableOverlap { .. }));
        assert_eq!(wb.worksheet(0).unwrap().tables().len(), 1);
    }

    #[test]
    fn test_table_ids_are_workbook_wide() {
        let mut wb = Workbook::new();
        wb.add_worksheet_with_name("Other").unwrap();
        wb.create_table(0, range("A2:A3")).unwrap();
        let t = wb.create_table(1, range("A2:A3")).unwrap();
        assert_eq!(t.id, 2);
        assert_eq!(wb.find_table("table2").unwrap().0, 1);
    }

    #[test]
    fn test_rename_table() {
        let mut wb = Workbook::new();
        wb.create_table(0, range("A2:A3")).unwrap();
        wb.create_table(0, range("C2:C3")).unwrap();

        wb.rename_table("Table1", "TBL_PEOPLE").unwrap();
        let (_, t) = wb.find_table("TBL_PEOPLE").unwrap();
        assert_eq!(t.display_name, "TBL_PEOPLE");

        assert!(matches!(
            wb.rename_table("Table2", "tbl_people"),
            Err(Error::DuplicateTableName(_))
        ));
        assert!(wb.rename_table("Table2", "A1").is_err());
        assert!(matches!(
            wb.rename_table("Nope", "X_1"),
            Err(Error::TableNotFound(_))
        ));
    }

    #[test]
    fn test_insert_table_keeps_style() {
        let mut wb = Workbook::new();
        let mut table = Table::new(7, "TBL_A", range("B2:C4"), &[]);
        table.style = Some(TableStyleInfo::new("TableStyleMedium13"));
        wb.insert_table(0, table).unwrap();

        let (_, t) = wb.find_table("TBL_A").unwrap();
        assert_eq!(t.id, 7);
        assert_eq!(t.style.as_ref().unwrap().name, "TableStyleMedium13");
        assert_eq!(wb.next_table_id(), 8);
    }

    #[test]
    fn test_named_ranges() {
        let mut wb = Workbook::new();
        wb.define_name("RNG_SHEET1_ID", "=TBL_A[Id]").unwrap();
        assert!(wb.define_name("rng_sheet1_id", "X").is_err());
        assert!(wb
            .add_named_range(NamedRange::sheet_scope("Local", "A1", 4))
            .is_err());

        let found = wb.get_named_range("RNG_SHEET1_ID", None).unwrap();
        assert_eq!(found.refers_to, "TBL_A[Id]");
        assert_eq!(found.scope, NameScope::Workbook);
    }

    #[test]
    fn test_remove_worksheet_drops_local_names() {
        let mut wb = Workbook::new();
        wb.add_worksheet_with_name("Two").unwrap();
        wb.add_named_range(NamedRange::sheet_scope("L", "A1", 0))
            .unwrap();
        wb.remove_worksheet(0).unwrap();
        assert!(wb.named_ranges().is_empty());
        assert_eq!(wb.worksheet(0).unwrap().name(), "Two");
    }
}
