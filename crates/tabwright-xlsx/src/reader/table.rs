//! Table part (`xl/tables/tableN.xml`) parsing

use std::io::{BufReader, Read, Seek};

use quick_xml::events::Event;
use quick_xml::reader::Reader;

use super::parse_bool;
use crate::error::{XlsxError, XlsxResult};
use tabwright_core::{CellRange, Table, TableColumn, TableStyleInfo};

/// Read a table part from the archive
pub(super) fn read_table_part<R: Read + Seek>(
    archive: &mut zip::ZipArchive<R>,
    path: &str,
) -> XlsxResult<Table> {
    let file = archive
        .by_name(path)
        .map_err(|_| XlsxError::MissingPart(path.to_string()))?;
    parse_table(BufReader::new(file))
}

/// Parse the XML of a table part
pub(crate) fn parse_table<R: std::io::BufRead>(reader: R) -> XlsxResult<Table> {
    let mut xml_reader = Reader::from_reader(reader);
    xml_reader.trim_text(true);

    let mut buf = Vec::new();
    let mut id = 0u32;
    let mut name = None;
    let mut display_name = None;
    let mut region = None;
    let mut columns = Vec::new();
    let mut style = None;

    loop {
        match xml_reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) | Ok(Event::Empty(e)) => match e.name().as_ref() {
                b"table" => {
                    for attr in e.attributes().flatten() {
                        let value = attr.unescape_value()?;
                        match attr.key.as_ref() {
                            b"id" => id = value.parse().unwrap_or(0),
                            b"name" => name = Some(value.to_string()),
                            b"displayName" => display_name = Some(value.to_string()),
                            b"ref" => {
                                region = Some(CellRange::parse(&value).map_err(|err| {
                                    XlsxError::Parse(format!("table ref '{}': {}", value, err))
                                })?)
                            }
                            _ => {}
                        }
                    }
                }
                b"tableColumn" => {
                    let mut column = TableColumn {
                        id: columns.len() as u32 + 1,
                        name: String::new(),
                    };
                    for attr in e.attributes().flatten() {
                        let value = attr.unescape_value()?;
                        match attr.key.as_ref() {
                            b"id" => column.id = value.parse().unwrap_or(column.id),
                            b"name" => column.name = value.to_string(),
                            _ => {}
                        }
                    }
                    columns.push(column);
                }
                b"tableStyleInfo" => {
                    let mut info = TableStyleInfo::new("");
                    for attr in e.attributes().flatten() {
                        let value = attr.unescape_value()?;
                        match attr.key.as_ref() {
                            b"name" => info.name = value.to_string(),
                            b"showFirstColumn" => info.show_first_column = parse_bool(&value),
                            b"showLastColumn" => info.show_last_column = parse_bool(&value),
                            b"showRowStripes" => info.show_row_stripes = parse_bool(&value),
                            b"showColumnStripes" => info.show_column_stripes = parse_bool(&value),
                            _ => {}
                        }
                    }
                    style = Some(info);
                }
                _ => {}
            },
            Ok(Event::Eof) => break,
            Err(e) => return Err(XlsxError::Xml(e)),
            _ => {}
        }
        buf.clear();
    }

    let name = name.ok_or_else(|| XlsxError::Parse("table part without a name".into()))?;
    let region =
        region.ok_or_else(|| XlsxError::Parse(format!("table '{}' has no ref", name)))?;
    if columns.len() != region.col_count() as usize {
        return Err(XlsxError::Parse(format!(
            "table '{}' declares {} columns for a {}-column ref",
            name,
            columns.len(),
            region.col_count()
        )));
    }

    Ok(Table {
        id,
        display_name: display_name.unwrap_or_else(|| name.clone()),
        name,
        region,
        columns,
        style,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_parse_table() {
        let xml = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<table xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" id="2" name="TBL_PEOPLE" displayName="People" ref="D2:E7">
  <autoFilter ref="D2:E7"/>
  <tableColumns count="2">
    <tableColumn id="1" name="Id"/>
    <tableColumn id="2" name="Full &amp; Name"/>
  </tableColumns>
  <tableStyleInfo name="TableStyleMedium13" showFirstColumn="1" showLastColumn="0" showRowStripes="0" showColumnStripes="0"/>
</table>"#;

        let table = parse_table(xml.as_bytes()).unwrap();
        assert_eq!(table.id, 2);
        assert_eq!(table.name, "TBL_PEOPLE");
        assert_eq!(table.display_name, "People");
        assert_eq!(table.region.to_string(), "D2:E7");
        assert_eq!(table.columns[1].name, "Full & Name");

        let style = table.style.unwrap();
        assert_eq!(style.name, "TableStyleMedium13");
        assert!(style.show_first_column);
        assert!(!style.show_row_stripes);
    }

    #[test]
    fn test_column_count_mismatch_is_an_error() {
        let xml = r#"<table id="1" name="T" displayName="T" ref="A1:C3"><tableColumns count="1"><tableColumn id="1" name="A"/></tableColumns></table>"#;
        assert!(matches!(parse_table(xml.as_bytes()), Err(XlsxError::Parse(_))));
    }
}
