//! XLSX reader

mod table;
mod worksheet;

#[cfg(test)]
pub(crate) use table::parse_table;

use std::collections::HashMap;
use std::fs::File;
use std::io::{BufReader, Read, Seek};
use std::path::Path;

use quick_xml::events::Event;
use quick_xml::reader::Reader;

use crate::error::{XlsxError, XlsxResult};
use tabwright_core::{NameScope, NamedRange, Workbook, Worksheet};

/// Decode Excel's `_xHHHH_` escape sequences in strings.
///
/// Excel uses this format to encode control characters in XML, e.g.
/// `_x000d_` for CR and `_x005f_` for a literal underscore.
pub(crate) fn decode_excel_escapes(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    let mut rest = s;

    while let Some(pos) = rest.find("_x") {
        result.push_str(&rest[..pos]);
        let candidate = &rest[pos..];
        let hex = candidate.get(2..6);
        let closed = candidate.as_bytes().get(6) == Some(&b'_');
        let decoded = hex
            .filter(|h| closed && h.bytes().all(|b| b.is_ascii_hexdigit()))
            .and_then(|h| u32::from_str_radix(h, 16).ok())
            .and_then(char::from_u32);

        match decoded {
            Some(c) => {
                result.push(c);
                rest = &candidate[7..];
            }
            None => {
                result.push_str("_x");
                rest = &candidate[2..];
            }
        }
    }
    result.push_str(rest);
    result
}

/// Parse a `0`/`1`/`true`/`false` attribute
pub(crate) fn parse_bool(value: &str) -> bool {
    value == "1" || value.eq_ignore_ascii_case("true")
}

/// Resolve a relationship target against the directory of its source part
///
/// `resolve_target("xl/worksheets", "../tables/table1.xml")` gives
/// `xl/tables/table1.xml`; absolute targets are taken from the package root.
pub(crate) fn resolve_target(base_dir: &str, target: &str) -> String {
    if let Some(absolute) = target.strip_prefix('/') {
        return absolute.to_string();
    }
    let mut parts: Vec<&str> = base_dir.split('/').filter(|p| !p.is_empty()).collect();
    for segment in target.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                parts.pop();
            }
            other => parts.push(other),
        }
    }
    parts.join("/")
}

/// A sheet entry of `xl/workbook.xml`
struct SheetEntry {
    name: String,
    r_id: String,
}

/// A `definedName` entry of `xl/workbook.xml`
struct DefinedNameEntry {
    name: String,
    local_sheet_id: Option<usize>,
    comment: Option<String>,
    hidden: bool,
    formula: String,
}

/// Everything read from `xl/workbook.xml`
#[derive(Default)]
struct WorkbookPart {
    sheets: Vec<SheetEntry>,
    defined_names: Vec<DefinedNameEntry>,
    date_1904: bool,
}

/// XLSX file reader
pub struct XlsxReader;

impl XlsxReader {
    /// Read a workbook from a file path
    pub fn read_file<P: AsRef<Path>>(path: P) -> XlsxResult<Workbook> {
        log::debug!("reading workbook from {}", path.as_ref().display());
        let file = File::open(path)?;
        Self::read(file)
    }

    /// Read a workbook from a reader
    pub fn read<R: Read + Seek>(reader: R) -> XlsxResult<Workbook> {
        let mut archive = zip::ZipArchive::new(reader)?;

        if archive.by_name("[Content_Types].xml").is_err() {
            return Err(XlsxError::InvalidFormat(
                "Missing [Content_Types].xml".into(),
            ));
        }

        let shared_strings = Self::read_shared_strings(&mut archive)?;
        let workbook_part = Self::read_workbook_xml(&mut archive)?;
        let sheet_paths = Self::read_rels(&mut archive, "xl/_rels/workbook.xml.rels", "xl")?;

        let mut workbook = Workbook::empty();
        workbook.settings_mut().date_1904 = workbook_part.date_1904;

        // Position in workbook.xml -> index in the built workbook
        let mut sheet_indices: Vec<Option<usize>> = Vec::with_capacity(workbook_part.sheets.len());

        for entry in &workbook_part.sheets {
            let Some((path, _)) = sheet_paths
                .get(&entry.r_id)
                .filter(|(_, kind)| kind.ends_with("/worksheet"))
            else {
                log::warn!(
                    "sheet '{}' has no worksheet relationship '{}', skipping",
                    entry.name,
                    entry.r_id
                );
                sheet_indices.push(None);
                continue;
            };

            let mut sheet = Worksheet::new(entry.name.as_str());
            let table_rids = worksheet::read_worksheet(&mut archive, path, &mut sheet, &shared_strings)?;
            Self::read_sheet_tables(&mut archive, path, &table_rids, &mut sheet)?;

            sheet_indices.push(Some(workbook.add_existing_worksheet(sheet)?));
        }

        if workbook.sheet_count() == 0 {
            workbook.add_worksheet_with_name("Sheet1")?;
        }

        for entry in workbook_part.defined_names {
            let scope = match entry.local_sheet_id {
                None => NameScope::Workbook,
                Some(pos) => match sheet_indices.get(pos).copied().flatten() {
                    Some(idx) => NameScope::Sheet(idx),
                    None => {
                        log::warn!(
                            "defined name '{}' refers to unknown sheet {}, skipping",
                            entry.name,
                            pos
                        );
                        continue;
                    }
                },
            };
            let mut range = NamedRange::new(entry.name, entry.formula, scope);
            range.comment = entry.comment;
            range.hidden = entry.hidden;
            workbook.add_named_range(range)?;
        }

        log::debug!(
            "read workbook: {} sheets, {} tables, {} defined names",
            workbook.sheet_count(),
            workbook.tables().count(),
            workbook.named_ranges().len()
        );
        Ok(workbook)
    }

    /// Load the table parts referenced by a worksheet
    fn read_sheet_tables<R: Read + Seek>(
        archive: &mut zip::ZipArchive<R>,
        sheet_path: &str,
        table_rids: &[String],
        sheet: &mut Worksheet,
    ) -> XlsxResult<()> {
        if table_rids.is_empty() {
            return Ok(());
        }

        let (dir, file_name) = sheet_path.rsplit_once('/').unwrap_or(("", sheet_path));
        let rels_path = format!("{}/_rels/{}.rels", dir, file_name);
        let rels = Self::read_rels(archive, &rels_path, dir)?;

        for r_id in table_rids {
            let Some((table_path, _)) = rels.get(r_id) else {
                log::warn!("{}: unknown table relationship '{}'", sheet_path, r_id);
                continue;
            };
            match table::read_table_part(archive, table_path) {
                Ok(table) => sheet.add_table_unchecked(table),
                Err(e) => log::warn!("skipping unreadable table part {}: {}", table_path, e),
            }
        }
        Ok(())
    }

    /// Read the shared strings table
    fn read_shared_strings<R: Read + Seek>(
        archive: &mut zip::ZipArchive<R>,
    ) -> XlsxResult<Vec<String>> {
        let mut strings = Vec::new();

        let file = match archive.by_name("xl/sharedStrings.xml") {
            Ok(f) => f,
            Err(_) => return Ok(strings),
        };

        let mut xml_reader = Reader::from_reader(BufReader::new(file));
        // Keep whitespace inside <t>; only text within <t> is collected anyway
        xml_reader.trim_text(false);

        let mut buf = Vec::new();
        let mut current = String::new();
        let mut in_si = false;
        let mut in_t = false;

        loop {
            match xml_reader.read_event_into(&mut buf) {
                Ok(Event::Start(e)) => match e.name().as_ref() {
                    b"si" => {
                        in_si = true;
                        current.clear();
                    }
                    b"t" if in_si => in_t = true,
                    _ => {}
                },
                Ok(Event::End(e)) => match e.name().as_ref() {
                    b"si" => {
                        strings.push(decode_excel_escapes(&current));
                        in_si = false;
                    }
                    b"t" => in_t = false,
                    _ => {}
                },
                Ok(Event::Text(e)) if in_t => {
                    current.push_str(&e.unescape()?);
                }
                Ok(Event::Eof) => break,
                Err(e) => return Err(XlsxError::Xml(e)),
                _ => {}
            }
            buf.clear();
        }

        Ok(strings)
    }

    /// Read workbook.xml: sheets, defined names and the date system
    fn read_workbook_xml<R: Read + Seek>(
        archive: &mut zip::ZipArchive<R>,
    ) -> XlsxResult<WorkbookPart> {
        let file = archive
            .by_name("xl/workbook.xml")
            .map_err(|_| XlsxError::MissingPart("xl/workbook.xml".into()))?;

        let mut xml_reader = Reader::from_reader(BufReader::new(file));
        xml_reader.trim_text(true);

        let mut buf = Vec::new();
        let mut part = WorkbookPart::default();
        let mut current_name: Option<DefinedNameEntry> = None;

        loop {
            match xml_reader.read_event_into(&mut buf) {
                Ok(Event::Empty(e)) | Ok(Event::Start(e)) if e.name().as_ref() == b"sheet" => {
                    let mut name = None;
                    let mut r_id = None;
                    for attr in e.attributes().flatten() {
                        match attr.key.as_ref() {
                            b"name" => name = Some(attr.unescape_value()?.to_string()),
                            b"r:id" => r_id = Some(attr.unescape_value()?.to_string()),
                            _ => {}
                        }
                    }
                    if let (Some(name), Some(r_id)) = (name, r_id) {
                        part.sheets.push(SheetEntry { name, r_id });
                    }
                }
                Ok(Event::Empty(e)) | Ok(Event::Start(e))
                    if e.name().as_ref() == b"workbookPr" =>
                {
                    for attr in e.attributes().flatten() {
                        if attr.key.as_ref() == b"date1904" {
                            part.date_1904 = parse_bool(&attr.unescape_value()?);
                        }
                    }
                }
                Ok(Event::Start(e)) if e.name().as_ref() == b"definedName" => {
                    let mut entry = DefinedNameEntry {
                        name: String::new(),
                        local_sheet_id: None,
                        comment: None,
                        hidden: false,
                        formula: String::new(),
                    };
                    for attr in e.attributes().flatten() {
                        let value = attr.unescape_value()?;
                        match attr.key.as_ref() {
                            b"name" => entry.name = value.to_string(),
                            b"localSheetId" => entry.local_sheet_id = value.parse().ok(),
                            b"comment" => entry.comment = Some(value.to_string()),
                            b"hidden" => entry.hidden = parse_bool(&value),
                            _ => {}
                        }
                    }
                    current_name = Some(entry);
                }
                Ok(Event::Text(e)) => {
                    if let Some(entry) = current_name.as_mut() {
                        entry.formula.push_str(&e.unescape()?);
                    }
                }
                Ok(Event::End(e)) if e.name().as_ref() == b"definedName" => {
                    if let Some(entry) = current_name.take() {
                        part.defined_names.push(entry);
                    }
                }
                Ok(Event::Eof) => break,
                Err(e) => return Err(XlsxError::Xml(e)),
                _ => {}
            }
            buf.clear();
        }

        Ok(part)
    }

    /// Read a relationships part into `Id -> (resolved target, Type)`
    ///
    /// A missing part yields an empty map; only the workbook rels are
    /// mandatory and that is checked by the caller through missing sheets.
    fn read_rels<R: Read + Seek>(
        archive: &mut zip::ZipArchive<R>,
        rels_path: &str,
        base_dir: &str,
    ) -> XlsxResult<HashMap<String, (String, String)>> {
        let mut rels = HashMap::new();
        let file = match archive.by_name(rels_path) {
            Ok(f) => f,
            Err(_) if rels_path == "xl/_rels/workbook.xml.rels" => {
                return Err(XlsxError::MissingPart(rels_path.to_string()))
            }
            Err(_) => return Ok(rels),
        };

        let mut xml_reader = Reader::from_reader(BufReader::new(file));
        xml_reader.trim_text(true);
        let mut buf = Vec::new();

        loop {
            match xml_reader.read_event_into(&mut buf) {
                Ok(Event::Empty(e)) | Ok(Event::Start(e))
                    if e.name().as_ref() == b"Relationship" =>
                {
                    let mut id = None;
                    let mut target = None;
                    let mut rel_type = String::new();
                    for attr in e.attributes().flatten() {
                        match attr.key.as_ref() {
                            b"Id" => id = Some(attr.unescape_value()?.to_string()),
                            b"Target" => target = Some(attr.unescape_value()?.to_string()),
                            b"Type" => rel_type = attr.unescape_value()?.to_string(),
                            _ => {}
                        }
                    }
                    if let (Some(id), Some(target)) = (id, target) {
                        rels.insert(id, (resolve_target(base_dir, &target), rel_type));
                    }
                }
                Ok(Event::Eof) => break,
                Err(e) => return Err(XlsxError::Xml(e)),
                _ => {}
            }
            buf.clear();
        }

        Ok(rels)
    }
}
