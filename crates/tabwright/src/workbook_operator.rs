//! Entry point: one workbook file and its sheet operators

use std::path::{Path, PathBuf};

use ahash::AHashMap;
use tabwright_core::{NameScope, NamedRange, Workbook};
use tabwright_xlsx::{XlsxReader, XlsxWriter};

use crate::config::TableDefaults;
use crate::error::{Error, Result};
use crate::sheet_operator::{SheetOperator, SheetState};

/// Owns a workbook loaded from (and saved back to) one path
///
/// # Example
///
/// ```no_run
/// use tabwright::WorkbookOperator;
///
/// let mut book = WorkbookOperator::open("inventory.xlsx")?;
/// let mut lookups = book.add_sheet("Lookups")?;
/// lookups.add_named_value_range_table(&["Open", "Closed"], "status")?;
/// book.write_changes()?;
/// # Ok::<(), tabwright::Error>(())
/// ```
#[derive(Debug)]
pub struct WorkbookOperator {
    path: PathBuf,
    workbook: Workbook,
    defaults: TableDefaults,
    /// Sheet states keyed by lowercase sheet name
    sheets: AHashMap<String, SheetState>,
}

impl WorkbookOperator {
    /// Load the workbook at `path`
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        log::debug!("opening {}", path.display());
        let workbook = XlsxReader::read_file(&path).map_err(|source| Error::Open {
            path: path.clone(),
            source,
        })?;
        Ok(Self::from_workbook(path, workbook))
    }

    /// Start a new workbook with a single `Sheet1`, to be written to `path`
    pub fn create<P: AsRef<Path>>(path: P) -> Self {
        Self::from_workbook(path.as_ref().to_path_buf(), Workbook::new())
    }

    /// Wrap an in-memory workbook that will be written to `path`
    pub fn from_workbook(path: PathBuf, workbook: Workbook) -> Self {
        Self {
            path,
            workbook,
            defaults: TableDefaults::default(),
            sheets: AHashMap::new(),
        }
    }

    /// Replace the table defaults
    pub fn with_defaults(mut self, defaults: TableDefaults) -> Self {
        self.defaults = defaults;
        self
    }

    /// Table defaults in use
    pub fn defaults(&self) -> &TableDefaults {
        &self.defaults
    }

    /// Path the workbook is written back to
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The workbook
    pub fn workbook(&self) -> &Workbook {
        &self.workbook
    }

    /// Mutable access to the workbook
    pub fn workbook_mut(&mut self) -> &mut Workbook {
        &mut self.workbook
    }

    /// Operator for the sheet called `name`
    pub fn sheet(&mut self, name: &str) -> Result<SheetOperator<'_>> {
        let index = self
            .workbook
            .sheet_index(name)
            .ok_or_else(|| Error::SheetNotFound(name.to_string()))?;
        let state = self.sheets.entry(name.to_lowercase()).or_default();
        SheetOperator::new(&mut self.workbook, index, state, &self.defaults)
    }

    /// All sheet names, in workbook order
    pub fn sheet_names(&self) -> Vec<String> {
        self.workbook
            .worksheets()
            .map(|ws| ws.name().to_string())
            .collect()
    }

    /// Sheet names minus those in `exclude`
    ///
    /// Names are compared exactly, so `"sheet1"` does not exclude `Sheet1`.
    pub fn sheets_except<S: AsRef<str>>(&self, exclude: &[S]) -> Vec<String> {
        self.workbook
            .worksheets()
            .map(|ws| ws.name())
            .filter(|name| !exclude.iter().any(|e| e.as_ref() == *name))
            .map(str::to_string)
            .collect()
    }

    /// Add a sheet and return its operator
    pub fn add_sheet(&mut self, name: &str) -> Result<SheetOperator<'_>> {
        self.workbook.add_worksheet_with_name(name)?;
        log::debug!("added sheet {}", name);
        self.sheet(name)
    }

    /// Add a sheet holding one empty table named after it
    pub fn add_sheet_and_empty_table<S: AsRef<str>>(
        &mut self,
        name: &str,
        headers: &[S],
    ) -> Result<SheetOperator<'_>> {
        let rows = self.defaults.empty_table_rows;
        let mut sheet = self.add_sheet(name)?;
        sheet.add_empty_table(headers, name, rows)?;
        Ok(sheet)
    }

    /// Workbook-level named range called `name`
    pub fn find_name(&self, name: &str) -> Option<&NamedRange> {
        self.workbook
            .named_ranges()
            .get_exact(name, &NameScope::Workbook)
    }

    /// Write the workbook back to its path
    ///
    /// The file is replaced in one step; on failure the previous file stays.
    pub fn write_changes(self) -> Result<()> {
        log::debug!("saving {}", self.path.display());
        XlsxWriter::write_file(&self.workbook, &self.path).map_err(|source| Error::Save {
            path: self.path.clone(),
            source,
        })
    }

    #[cfg(test)]
    fn cached_sheets(&self) -> usize {
        self.sheets.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_sheet_lookup() {
        let mut book = WorkbookOperator::create("unused.xlsx");
        assert_eq!(book.sheet("sheet1").unwrap().sheet_name(), "Sheet1");
        assert!(matches!(book.sheet("Nope"), Err(Error::SheetNotFound(_))));
    }

    #[test]
    fn test_sheets_except() {
        let mut book = WorkbookOperator::create("unused.xlsx");
        book.add_sheet("Lookups").unwrap();
        book.add_sheet("Orders").unwrap();
        assert_eq!(book.sheet_names(), vec!["Sheet1", "Lookups", "Orders"]);
        assert_eq!(book.sheets_except(&["Lookups"]), vec!["Sheet1", "Orders"]);
        assert_eq!(
            book.sheets_except(&["lookups", "Orders"]),
            vec!["Sheet1", "Lookups"]
        );
    }

    #[test]
    fn test_sheet_state_is_memoized() {
        let mut book = WorkbookOperator::create("unused.xlsx");
        book.sheet("Sheet1")
            .unwrap()
            .add_empty_table(&["Id"], "Items", 2)
            .unwrap();
        book.sheet("SHEET1").unwrap();
        assert_eq!(book.cached_sheets(), 1);

        assert!(book.sheet("Nope").is_err());
        assert_eq!(book.cached_sheets(), 1);

        // The table state built by the first operator is still the one in use
        book.workbook_mut().table_mut(0, "TBL_ITEMS").unwrap().columns[0].name = "Key".into();
        let mut sheet = book.sheet("sheet1").unwrap();
        let table = sheet.table("TBL_ITEMS").unwrap();
        assert!(table.table_column("Id").is_some());
        assert!(table.table_column("Key").is_none());
    }

    #[test]
    fn test_add_sheet_and_empty_table_uses_defaults() {
        let defaults = TableDefaults {
            style_name: "TableStyleLight1".into(),
            empty_table_rows: 3,
        };
        let mut book = WorkbookOperator::create("unused.xlsx").with_defaults(defaults);
        book.add_sheet_and_empty_table("Staff", &["Id", "Name"]).unwrap();

        let (sheet, table) = book.workbook().find_table("TBL_STAFF").unwrap();
        assert_eq!(sheet, 1);
        assert_eq!(table.region.to_string(), "A2:B5");
        assert_eq!(table.style.as_ref().unwrap().name, "TableStyleLight1");
    }

    #[test]
    fn test_duplicate_sheet() {
        let mut book = WorkbookOperator::create("unused.xlsx");
        assert!(matches!(book.add_sheet("SHEET1"), Err(Error::Core(_))));
    }

    #[test]
    fn test_open_missing_file_names_the_path() {
        let err = WorkbookOperator::open("/definitely/not/here.xlsx").unwrap_err();
        assert!(matches!(err, Error::Open { .. }));
        assert!(err.to_string().contains("/definitely/not/here.xlsx"));
    }
}
