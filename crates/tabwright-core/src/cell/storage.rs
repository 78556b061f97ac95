//! Cell storage implementation
//!
//! Sparse row-based storage: only written cells are kept, in a
//! `BTreeMap<row_index, BTreeMap<col_index, CellValue>>`. A row entry is
//! created the first time anything touches it and is never dropped, even
//! when its last cell is cleared, so "row exists" matches what a caller has
//! written so far.

use std::collections::BTreeMap;

use super::{CellAddress, CellRange, CellValue};

/// Sparse row-major storage for worksheet cells
#[derive(Debug, Clone, Default)]
pub struct CellStorage {
    rows: BTreeMap<u32, BTreeMap<u16, CellValue>>,
}

impl CellStorage {
    /// Create empty storage
    pub fn new() -> Self {
        Self::default()
    }

    /// Get a cell value (`None` when nothing was written there)
    pub fn get(&self, row: u32, col: u16) -> Option<&CellValue> {
        self.rows.get(&row).and_then(|cells| cells.get(&col))
    }

    /// Write a cell value. Writing [`CellValue::Empty`] removes the cell
    /// but keeps the row.
    pub fn set(&mut self, row: u32, col: u16, value: CellValue) {
        let cells = self.rows.entry(row).or_default();
        if value.is_empty() {
            cells.remove(&col);
        } else {
            cells.insert(col, value);
        }
    }

    /// Make sure a row exists, creating it empty if needed
    pub fn ensure_row(&mut self, row: u32) {
        self.rows.entry(row).or_default();
    }

    /// Check whether a row has been created
    pub fn has_row(&self, row: u32) -> bool {
        self.rows.contains_key(&row)
    }

    /// Greatest existing row index
    pub fn last_row(&self) -> Option<u32> {
        self.rows.keys().next_back().copied()
    }

    /// Greatest written column index in `row`
    pub fn last_col_in_row(&self, row: u32) -> Option<u16> {
        self.rows
            .get(&row)
            .and_then(|cells| cells.keys().next_back().copied())
    }

    /// Number of non-empty cells
    pub fn cell_count(&self) -> usize {
        self.rows.values().map(BTreeMap::len).sum()
    }

    /// Bounding box of all written cells
    pub fn used_range(&self) -> Option<CellRange> {
        let mut bounds: Option<(u32, u16, u32, u16)> = None;
        for (&row, cells) in &self.rows {
            let (Some(&first), Some(&last)) = (cells.keys().next(), cells.keys().next_back())
            else {
                continue;
            };
            bounds = Some(match bounds {
                None => (row, first, row, last),
                Some((r0, c0, _, c1)) => (r0, c0.min(first), row, c1.max(last)),
            });
        }
        bounds.map(|(r0, c0, r1, c1)| CellRange::from_indices(r0, c0, r1, c1))
    }

    /// Iterate over existing rows and their cells, in row order
    pub fn rows(&self) -> impl Iterator<Item = (u32, &BTreeMap<u16, CellValue>)> {
        self.rows.iter().map(|(&row, cells)| (row, cells))
    }

    /// Iterate over all non-empty cells in row-major order
    pub fn iter(&self) -> impl Iterator<Item = (CellAddress, &CellValue)> {
        self.rows.iter().flat_map(|(&row, cells)| {
            cells
                .iter()
                .map(move |(&col, value)| (CellAddress::new(row, col), value))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_and_get() {
        let mut storage = CellStorage::new();
        storage.set(2, 3, CellValue::from("x"));
        assert_eq!(storage.get(2, 3), Some(&CellValue::from("x")));
        assert_eq!(storage.get(2, 4), None);
        assert_eq!(storage.cell_count(), 1);
    }

    #[test]
    fn test_clearing_keeps_row() {
        let mut storage = CellStorage::new();
        storage.set(4, 0, CellValue::from(1));
        storage.set(4, 0, CellValue::Empty);
        assert!(storage.has_row(4));
        assert_eq!(storage.last_row(), Some(4));
        assert_eq!(storage.last_col_in_row(4), None);
        assert_eq!(storage.used_range(), None);
    }

    #[test]
    fn test_empty_string_is_kept() {
        let mut storage = CellStorage::new();
        storage.set(0, 0, CellValue::from(""));
        assert_eq!(storage.get(0, 0), Some(&CellValue::String(String::new())));
    }

    #[test]
    fn test_bounds() {
        let mut storage = CellStorage::new();
        storage.set(1, 2, CellValue::from(1));
        storage.set(5, 0, CellValue::from(2));
        storage.set(3, 7, CellValue::from(3));
        storage.ensure_row(9);

        assert_eq!(storage.last_row(), Some(9));
        assert_eq!(storage.last_col_in_row(3), Some(7));
        assert_eq!(storage.used_range().unwrap().to_string(), "A2:H6");

        let order: Vec<_> = storage.iter().map(|(a, _)| a.to_a1_string()).collect();
        assert_eq!(order, vec!["C2", "H4", "A6"]);
    }
}
