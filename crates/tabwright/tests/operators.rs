//! End-to-end tests: build tables through the operators, save, reopen and verify

use pretty_assertions::assert_eq;
use tabwright::{
    CellValue, Error, ListSource, NameScope, TableDefaults, ValidationType, WorkbookOperator,
    XlsxWriter,
};
use tempfile::TempDir;

fn blank_file(dir: &TempDir, name: &str) -> std::path::PathBuf {
    let path = dir.path().join(name);
    XlsxWriter::write_file(&tabwright::Workbook::new(), &path).unwrap();
    path
}

/// Lookup table, order table and a dropdown between them survive a save
#[test]
fn test_lookup_and_dropdown_round_trip() {
    let dir = TempDir::new().unwrap();
    let path = blank_file(&dir, "orders.xlsx");

    let mut book = WorkbookOperator::open(&path).unwrap();
    let status = {
        let mut lookups = book.add_sheet("Lookups").unwrap();
        let mut table = lookups
            .add_named_value_range_table(&["shipped", "Open", "closed"], "orderStatus")
            .unwrap();
        let name = table.add_defined_name_for_column("Order Status").unwrap();
        name
    };
    {
        let mut orders = book.sheet("Sheet1").unwrap();
        orders.disable_grid_lines().unwrap();
        let mut table = orders
            .add_empty_table(&["Order", "Order Status"], "orders", 4)
            .unwrap();
        table
            .add_drop_down_validation_to_column("Order Status", &status)
            .unwrap();
    }
    book.write_changes().unwrap();

    let book = WorkbookOperator::open(&path).unwrap();
    let wb = book.workbook();

    let (sheet, lookup) = wb.find_table("TBL_ORDERSTATUS").unwrap();
    assert_eq!(sheet, 1);
    assert_eq!(lookup.region.to_string(), "A2:A5");
    assert_eq!(lookup.columns()[0].name, "Order Status");

    let lookups = wb.worksheet(1).unwrap();
    let values: Vec<_> = (1..5).map(|r| lookups.cell_text_at(r, 0)).collect();
    assert_eq!(values, vec!["Order Status", "closed", "Open", "shipped"]);

    let name = book.find_name("RNG_LOOKUPS_ORDER_STATUS").unwrap();
    assert_eq!(name.refers_to, "TBL_ORDERSTATUS[Order Status]");
    assert_eq!(name.scope, NameScope::Workbook);
    assert_eq!(
        name.comment.as_deref(),
        Some("Range of values in column: [Order Status] of [TBL_ORDERSTATUS] table")
    );
    assert_eq!(wb.named_ranges().len(), 1);

    let orders = wb.worksheet(0).unwrap();
    assert!(!orders.show_gridlines());
    let (_, table) = wb.find_table("TBL_ORDERS").unwrap();
    assert_eq!(table.region.to_string(), "A2:B6");
    assert_eq!(
        table.style.as_ref().map(|s| s.name.as_str()),
        Some("TableStyleMedium13")
    );

    let validation = &orders.data_validations()[0];
    assert_eq!(validation.sqref(), "B3:B6");
    assert_eq!(
        validation.validation_type,
        ValidationType::List(ListSource::Formula("RNG_LOOKUPS_ORDER_STATUS".into()))
    );
    assert!(!validation.show_dropdown);
    assert!(validation.allow_blank);
}

/// Wrapping data that was already on a sheet
#[test]
fn test_wrap_existing_data_after_reopen() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("people.xlsx");

    let mut book = WorkbookOperator::create(&path);
    {
        let ws = book.workbook_mut().worksheet_mut(0).unwrap();
        ws.set_cell_value("A1", "Id").unwrap();
        ws.set_cell_value("B1", "Name").unwrap();
        ws.set_cell_value("A2", 1).unwrap();
        ws.set_cell_value("B2", "Ada").unwrap();
        ws.set_cell_value("A3", 2).unwrap();
    }
    book.write_changes().unwrap();

    let mut book = WorkbookOperator::open(&path).unwrap();
    {
        let mut sheet = book.sheet("Sheet1").unwrap();
        let table = sheet.create_table_on_sheet_with_data("A1").unwrap();
        assert_eq!(table.name(), "TBL_SHEET1");
        assert!(table.table_column("Name").is_some());
    }
    book.write_changes().unwrap();

    let book = WorkbookOperator::open(&path).unwrap();
    let (_, table) = book.workbook().find_table("TBL_SHEET1").unwrap();
    assert_eq!(table.region.to_string(), "A1:B3");
    assert_eq!(
        book.workbook().worksheet(0).unwrap().get_value("A3").unwrap(),
        CellValue::Number(2.0)
    );
}

/// A sheet created with its empty table honours the configured defaults
#[test]
fn test_add_sheet_and_empty_table_with_defaults() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("staff.xlsx");

    let mut book = WorkbookOperator::create(&path).with_defaults(TableDefaults {
        empty_table_rows: 2,
        ..TableDefaults::default()
    });
    book.add_sheet_and_empty_table("Staff Members", &["Id", "Full Name"])
        .unwrap();
    assert_eq!(
        book.sheets_except(&["Sheet1"]),
        vec!["Staff Members".to_string()]
    );
    book.write_changes().unwrap();

    let book = WorkbookOperator::open(&path).unwrap();
    let (sheet, table) = book.workbook().find_table("TBL_STAFF_MEMBERS").unwrap();
    assert_eq!(sheet, 1);
    assert_eq!(table.region.to_string(), "A2:B4");
    let names: Vec<_> = table.columns().iter().map(|c| c.name.as_str()).collect();
    assert_eq!(names, vec!["Id", "Full Name"]);
}

/// Failures carry the offending path or name
#[test]
fn test_errors() {
    let dir = TempDir::new().unwrap();
    let path = blank_file(&dir, "errors.xlsx");

    let mut book = WorkbookOperator::open(&path).unwrap();
    assert!(matches!(book.sheet("Missing"), Err(Error::SheetNotFound(n)) if n == "Missing"));

    let mut sheet = book.sheet("Sheet1").unwrap();
    assert!(matches!(sheet.table("TBL_NONE"), Err(Error::TableNotFound(_))));

    let mut table = sheet.add_empty_table(&["A"], "only", 1).unwrap();
    assert!(matches!(
        table.set_cell_value_by_row(2, &Vec::<String>::new()),
        Err(Error::NotEnoughValues { expected: 1, actual: 0 })
    ));

    let unwritable = WorkbookOperator::create(dir.path().join("no/such/dir/out.xlsx"));
    let err = unwritable.write_changes().unwrap_err();
    assert!(matches!(err, Error::Save { .. }));
    assert!(err.to_string().contains("out.xlsx"));
}

/// A save that fails leaves the previous file readable
#[test]
fn test_failed_save_keeps_previous_file() {
    let dir = TempDir::new().unwrap();
    let path = blank_file(&dir, "keep.xlsx");

    let mut book = WorkbookOperator::open(&path).unwrap();
    book.add_sheet_and_empty_table("Staff", &["Id"]).unwrap();
    book.write_changes().unwrap();

    let mut book = WorkbookOperator::open(&path).unwrap();
    book.workbook_mut().remove_worksheet(1).unwrap();
    book.workbook_mut().remove_worksheet(0).unwrap();
    assert!(matches!(book.write_changes(), Err(Error::Save { .. })));

    let book = WorkbookOperator::open(&path).unwrap();
    assert_eq!(book.sheet_names(), vec!["Sheet1", "Staff"]);
    assert!(book.workbook().find_table("TBL_STAFF").is_some());
}

/// Wrapped headers that were blank or repeated are rewritten to the column names
#[test]
fn test_wrapped_header_row_matches_columns_after_reopen() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("wrapped.xlsx");

    let mut book = WorkbookOperator::create(&path);
    {
        let ws = book.workbook_mut().worksheet_mut(0).unwrap();
        ws.set_cell_value("A1", "Id").unwrap();
        ws.set_cell_value("C1", "Id").unwrap();
        ws.set_cell_value("A2", 1).unwrap();
    }
    book.sheet("Sheet1")
        .unwrap()
        .create_table_on_sheet_with_data("A1")
        .unwrap();
    book.write_changes().unwrap();

    let book = WorkbookOperator::open(&path).unwrap();
    let (_, table) = book.workbook().find_table("TBL_SHEET1").unwrap();
    let names: Vec<_> = table.columns().iter().map(|c| c.name.clone()).collect();
    assert_eq!(names, vec!["Id", "Column2", "Id2"]);
    assert_eq!(book.workbook().worksheet(0).unwrap().row_texts(0, 0, 3), names);
}
