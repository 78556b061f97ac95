//! Table part (`xl/tables/tableN.xml`) serialization

use super::{escape_xml, MAIN_NS};
use tabwright_core::Table;

fn flag(value: bool) -> u8 {
    u8::from(value)
}

/// Render one table part
pub(super) fn table_xml(table: &Table) -> String {
    let region = table.region.to_a1_string();
    let mut content = format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<table xmlns="{}" id="{}" name="{}" displayName="{}" ref="{}" totalsRowShown="0">
    <autoFilter ref="{}"/>
    <tableColumns count="{}">"#,
        MAIN_NS,
        table.id,
        escape_xml(&table.name),
        escape_xml(&table.display_name),
        region,
        region,
        table.columns().len()
    );

    for column in table.columns() {
        content.push_str(&format!(
            "\n        <tableColumn id=\"{}\" name=\"{}\"/>",
            column.id,
            escape_xml(&column.name)
        ));
    }
    content.push_str("\n    </tableColumns>");

    if let Some(style) = &table.style {
        content.push_str(&format!(
            "\n    <tableStyleInfo name=\"{}\" showFirstColumn=\"{}\" showLastColumn=\"{}\" showRowStripes=\"{}\" showColumnStripes=\"{}\"/>",
            escape_xml(&style.name),
            flag(style.show_first_column),
            flag(style.show_last_column),
            flag(style.show_row_stripes),
            flag(style.show_column_stripes)
        ));
    }

    content.push_str("\n</table>");
    content
}
