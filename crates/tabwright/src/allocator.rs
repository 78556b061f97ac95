//! Placement of new tables on a sheet
//!
//! Tables are laid out left to right in a single band starting at `A2`, with
//! one blank column between neighbours.

use tabwright_core::{CellAddress, CellRange, Worksheet};

use crate::error::{Error, Result};

/// First row used for a table header when the sheet has no tables yet
const FIRST_TABLE_ROW: u32 = 1;

/// Blank columns left between two tables, plus one
const COLUMN_GAP: u32 = 2;

/// Region for a new table with `data_rows` rows under a header and
/// `data_cols` columns
///
/// Existing regions are scanned in sheet order. Each region whose end column
/// reaches the current candidate column pushes the candidate to its right and
/// moves it to that region's start row.
pub fn area_for_new_table(
    existing: &[CellRange],
    data_rows: u32,
    data_cols: usize,
) -> Result<CellRange> {
    if data_cols == 0 {
        return Err(Error::precondition("a table needs at least one column"));
    }

    let mut start_col: u32 = 0;
    let mut start_row = FIRST_TABLE_ROW;
    for region in existing {
        if u32::from(region.end.col) >= start_col {
            start_col = u32::from(region.end.col) + COLUMN_GAP;
            start_row = region.start.row;
        }
    }

    let end_col = u64::from(start_col) + data_cols as u64 - 1;
    let end_row = u64::from(start_row) + u64::from(data_rows);
    let top_left = CellAddress::checked(start_row, start_col)?;
    let bottom_right = CellAddress::checked(
        u32::try_from(end_row).unwrap_or(u32::MAX),
        u32::try_from(end_col).unwrap_or(u32::MAX),
    )?;

    let area = CellRange::new(top_left, bottom_right);
    log::debug!(
        "allocated {} for {} rows x {} columns after {} tables",
        area,
        data_rows,
        data_cols,
        existing.len()
    );
    Ok(area)
}

/// Region of data already on the sheet, anchored at its header cell
///
/// The region runs down to the sheet's last row and across to the last
/// written cell of the header row.
pub fn estimate_area_for_existing_data(
    sheet: &Worksheet,
    top_left: CellAddress,
) -> Result<CellRange> {
    let last_col = sheet
        .last_col_in_row(top_left.row)
        .filter(|&col| col >= top_left.col)
        .ok_or_else(|| {
            Error::precondition(format!(
                "no header cells at or right of {} on sheet {}",
                top_left,
                sheet.name()
            ))
        })?;
    // The header row exists, so there is a last row at or below it
    let last_row = sheet.last_row().unwrap_or(top_left.row).max(top_left.row);

    Ok(CellRange::new(top_left, CellAddress::new(last_row, last_col)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn range(s: &str) -> CellRange {
        CellRange::parse(s).unwrap()
    }

    #[test]
    fn test_first_table_starts_at_a2() {
        assert_eq!(area_for_new_table(&[], 5, 2).unwrap(), range("A2:B7"));
        assert_eq!(area_for_new_table(&[], 0, 1).unwrap(), range("A2:A2"));
    }

    #[test]
    fn test_next_table_leaves_one_blank_column() {
        let existing = [range("A2:B7")];
        assert_eq!(area_for_new_table(&existing, 3, 3).unwrap(), range("D2:F5"));
    }

    #[test]
    fn test_scan_order_overwrites_row() {
        // Every region reaching the candidate column moves it, row included
        let existing = [range("A5:B6"), range("D3:E9")];
        assert_eq!(area_for_new_table(&existing, 1, 1).unwrap(), range("G3:G4"));

        // Listed after a wider table, a narrow one is skipped
        let existing = [range("A4:E6"), range("A9:B10")];
        assert_eq!(area_for_new_table(&existing, 1, 1).unwrap(), range("G4:G5"));
    }

    #[test]
    fn test_zero_columns_is_rejected() {
        assert!(matches!(
            area_for_new_table(&[], 3, 0),
            Err(Error::PreconditionViolated(_))
        ));
    }

    #[test]
    fn test_too_wide_hits_sheet_limit() {
        let existing = [range("XFA2:XFB3")];
        assert!(matches!(
            area_for_new_table(&existing, 1, 4),
            Err(Error::Core(_))
        ));
    }

    #[test]
    fn test_estimate_existing_data() {
        let mut ws = Worksheet::new("Data");
        ws.set_cell_value("B3", "Id").unwrap();
        ws.set_cell_value("C3", "Name").unwrap();
        ws.set_cell_value("D3", "Score").unwrap();
        ws.set_cell_value("B4", 1).unwrap();
        ws.set_cell_value("C9", "last").unwrap();

        let area = estimate_area_for_existing_data(&ws, CellAddress::parse("B3").unwrap()).unwrap();
        assert_eq!(area, range("B3:D9"));
    }

    #[test]
    fn test_estimate_without_header_fails() {
        let mut ws = Worksheet::new("Data");
        ws.set_cell_value("A5", "x").unwrap();
        let err = estimate_area_for_existing_data(&ws, CellAddress::parse("A1").unwrap());
        assert!(matches!(err, Err(Error::PreconditionViolated(_))));
    }
}
