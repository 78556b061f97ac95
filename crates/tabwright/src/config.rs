//! Defaults applied to tables created by the operators

use crate::naming::DEFAULT_TABLE_STYLE;

/// Settings shared by every operator of one workbook
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableDefaults {
    /// Table style applied to new tables
    pub style_name: String,
    /// Data rows given to tables created alongside a new sheet
    pub empty_table_rows: u32,
}

impl Default for TableDefaults {
    fn default() -> Self {
        Self {
            style_name: DEFAULT_TABLE_STYLE.to_string(),
            empty_table_rows: 10,
        }
    }
}
