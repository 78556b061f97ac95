//! Worksheet part parsing

use std::io::{BufReader, Read, Seek};

use quick_xml::events::{BytesStart, Event};
use quick_xml::reader::Reader;

use super::{decode_excel_escapes, parse_bool};
use crate::error::{XlsxError, XlsxResult};
use tabwright_core::{
    CellAddress, CellRange, CellValue, CompareKind, Criteria, DataValidation, ListSource,
    ValidationErrorStyle, ValidationOperator, ValidationType, Worksheet,
};

/// Cell being assembled from `<c>` and its children
#[derive(Default)]
struct PendingCell {
    reference: String,
    cell_type: Option<String>,
    value: Option<String>,
    formula: Option<String>,
}

/// Which text-bearing element we are inside
#[derive(Clone, Copy, PartialEq, Eq)]
enum TextTarget {
    None,
    Value,
    Formula,
    InlineText,
    Formula1,
    Formula2,
}

/// Read one worksheet part into `worksheet`
///
/// Returns the relationship ids of the sheet's `tablePart` entries so the
/// caller can resolve them through the worksheet rels.
pub(super) fn read_worksheet<R: Read + Seek>(
    archive: &mut zip::ZipArchive<R>,
    path: &str,
    worksheet: &mut Worksheet,
    shared_strings: &[String],
) -> XlsxResult<Vec<String>> {
    let file = archive
        .by_name(path)
        .map_err(|_| XlsxError::MissingPart(path.to_string()))?;

    let mut xml_reader = Reader::from_reader(BufReader::new(file));
    xml_reader.trim_text(false);

    let mut buf = Vec::new();
    let mut table_rids = Vec::new();

    let mut cell: Option<PendingCell> = None;
    let mut validation: Option<DataValidation> = None;
    let mut dv_type = String::new();
    let mut dv_operator = ValidationOperator::Between;
    let mut formula1 = String::new();
    let mut formula2: Option<String> = None;
    let mut target = TextTarget::None;

    loop {
        match xml_reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => match e.name().as_ref() {
                b"row" => ensure_row(worksheet, &e)?,
                b"c" => cell = Some(parse_cell_start(&e)?),
                b"v" if cell.is_some() => target = TextTarget::Value,
                b"f" if cell.is_some() => target = TextTarget::Formula,
                b"t" if cell.is_some() => target = TextTarget::InlineText,
                b"sheetView" => read_sheet_view(worksheet, &e)?,
                b"dataValidation" => {
                    let (v, kind, op) = parse_data_validation_attrs(&e)?;
                    validation = Some(v);
                    dv_type = kind;
                    dv_operator = op;
                    formula1.clear();
                    formula2 = None;
                }
                b"formula1" if validation.is_some() => target = TextTarget::Formula1,
                b"formula2" if validation.is_some() => {
                    formula2 = Some(String::new());
                    target = TextTarget::Formula2;
                }
                _ => {}
            },
            Ok(Event::Empty(e)) => match e.name().as_ref() {
                b"row" => ensure_row(worksheet, &e)?,
                b"sheetView" => read_sheet_view(worksheet, &e)?,
                b"dataValidation" => {
                    let (mut v, kind, op) = parse_data_validation_attrs(&e)?;
                    apply_validation_formulas(&mut v, &kind, op, "", None);
                    worksheet.add_data_validation(v);
                }
                b"tablePart" => {
                    for attr in e.attributes().flatten() {
                        if attr.key.as_ref() == b"r:id" {
                            table_rids.push(attr.unescape_value()?.to_string());
                        }
                    }
                }
                _ => {}
            },
            Ok(Event::Text(e)) if target != TextTarget::None => {
                let text = e.unescape()?;
                match target {
                    TextTarget::Value | TextTarget::InlineText => {
                        if let Some(c) = cell.as_mut() {
                            c.value.get_or_insert_with(String::new).push_str(&text);
                        }
                    }
                    TextTarget::Formula => {
                        if let Some(c) = cell.as_mut() {
                            c.formula.get_or_insert_with(String::new).push_str(&text);
                        }
                    }
                    TextTarget::Formula1 => formula1.push_str(&text),
                    TextTarget::Formula2 => {
                        if let Some(f) = formula2.as_mut() {
                            f.push_str(&text);
                        }
                    }
                    TextTarget::None => {}
                }
            }
            Ok(Event::End(e)) => match e.name().as_ref() {
                b"v" | b"f" | b"t" | b"formula1" | b"formula2" => target = TextTarget::None,
                b"c" => {
                    if let Some(c) = cell.take() {
                        process_cell(worksheet, c, shared_strings)?;
                    }
                }
                b"dataValidation" => {
                    if let Some(mut v) = validation.take() {
                        apply_validation_formulas(
                            &mut v,
                            &dv_type,
                            dv_operator,
                            &formula1,
                            formula2.take(),
                        );
                        worksheet.add_data_validation(v);
                    }
                }
                _ => {}
            },
            Ok(Event::Eof) => break,
            Err(e) => return Err(XlsxError::Xml(e)),
            _ => {}
        }
        buf.clear();
    }

    Ok(table_rids)
}

fn ensure_row(worksheet: &mut Worksheet, e: &BytesStart) -> XlsxResult<()> {
    for attr in e.attributes().flatten() {
        if attr.key.as_ref() == b"r" {
            if let Ok(r) = attr.unescape_value()?.parse::<u32>() {
                if r > 0 {
                    worksheet.ensure_row(r - 1)?;
                }
            }
        }
    }
    Ok(())
}

fn read_sheet_view(worksheet: &mut Worksheet, e: &BytesStart) -> XlsxResult<()> {
    for attr in e.attributes().flatten() {
        if attr.key.as_ref() == b"showGridLines" {
            worksheet.set_show_gridlines(parse_bool(&attr.unescape_value()?));
        }
    }
    Ok(())
}

fn parse_cell_start(e: &BytesStart) -> XlsxResult<PendingCell> {
    let mut cell = PendingCell::default();
    for attr in e.attributes().flatten() {
        match attr.key.as_ref() {
            b"r" => cell.reference = attr.unescape_value()?.to_string(),
            b"t" => cell.cell_type = Some(attr.unescape_value()?.to_string()),
            _ => {}
        }
    }
    Ok(cell)
}

/// Turn a raw `<v>` payload into a value according to the cell type
fn typed_value(cell_type: Option<&str>, raw: &str, shared_strings: &[String]) -> XlsxResult<CellValue> {
    Ok(match cell_type {
        Some("s") => {
            let idx: usize = raw.trim().parse().map_err(|_| {
                XlsxError::Parse(format!("Invalid shared string index: {}", raw))
            })?;
            let s = shared_strings.get(idx).ok_or_else(|| {
                XlsxError::Parse(format!("Shared string index {} out of bounds", idx))
            })?;
            CellValue::String(s.clone())
        }
        Some("b") => CellValue::Boolean(parse_bool(raw.trim())),
        Some("e") => CellValue::Error(raw.trim().to_string()),
        Some("inlineStr") | Some("str") => CellValue::String(decode_excel_escapes(raw)),
        None | Some("n") => match raw.trim().parse::<f64>() {
            Ok(n) => CellValue::Number(n),
            Err(_) => CellValue::String(raw.to_string()),
        },
        Some(_) => CellValue::String(raw.to_string()),
    })
}

fn process_cell(
    worksheet: &mut Worksheet,
    cell: PendingCell,
    shared_strings: &[String],
) -> XlsxResult<()> {
    let addr = CellAddress::parse(&cell.reference).map_err(|e| {
        XlsxError::Parse(format!("Invalid cell reference '{}': {}", cell.reference, e))
    })?;
    let cell_type = cell.cell_type.as_deref();

    let value = match (cell.formula, cell.value) {
        (Some(formula), cached) => {
            let cached_value = match cached {
                Some(raw) => Some(Box::new(typed_value(cell_type, &raw, shared_strings)?)),
                None => None,
            };
            let mut value = CellValue::formula(formula);
            if let CellValue::Formula { cached_value: slot, .. } = &mut value {
                *slot = cached_value;
            }
            value
        }
        (None, Some(raw)) => typed_value(cell_type, &raw, shared_strings)?,
        (None, None) => return Ok(()),
    };

    worksheet.set_cell_value_at(addr.row, addr.col, value)?;
    Ok(())
}

/// Parse `<dataValidation>` attributes; the rule type is finished once the
/// formulas have been read
fn parse_data_validation_attrs(
    e: &BytesStart,
) -> XlsxResult<(DataValidation, String, ValidationOperator)> {
    let mut validation = DataValidation::default();
    let mut dv_type = String::from("none");
    let mut operator = ValidationOperator::Between;
    let mut prompt_title = None;
    let mut prompt = None;
    let mut error_title = None;
    let mut error = None;

    for attr in e.attributes().flatten() {
        let value = attr.unescape_value()?;
        match attr.key.as_ref() {
            b"type" => dv_type = value.to_string(),
            b"operator" => {
                operator = ValidationOperator::from_xlsx(&value).unwrap_or_default();
            }
            b"allowBlank" => validation.allow_blank = parse_bool(&value),
            // Excel uses showDropDown="1" to HIDE the dropdown
            b"showDropDown" => validation.show_dropdown = !parse_bool(&value),
            b"errorStyle" => {
                validation.error_style = ValidationErrorStyle::from_xlsx(&value).unwrap_or_default();
            }
            b"errorTitle" => error_title = Some(value.to_string()),
            b"error" => error = Some(value.to_string()),
            b"promptTitle" => prompt_title = Some(value.to_string()),
            b"prompt" => prompt = Some(value.to_string()),
            b"sqref" => validation.ranges = parse_sqref(&value),
            _ => {}
        }
    }

    // allowBlank defaults to false when absent in the file
    if !e.attributes().flatten().any(|a| a.key.as_ref() == b"allowBlank") {
        validation.allow_blank = false;
    }
    if let Some(message) = prompt {
        validation.prompt = Some((prompt_title, message));
    }
    if let Some(message) = error {
        validation.error = Some((error_title, message));
    }

    Ok((validation, dv_type, operator))
}

fn apply_validation_formulas(
    validation: &mut DataValidation,
    dv_type: &str,
    operator: ValidationOperator,
    formula1: &str,
    formula2: Option<String>,
) {
    let formula1 = formula1.trim();
    validation.validation_type = match dv_type {
        "list" => ValidationType::List(
            match formula1.strip_prefix('"').and_then(|s| s.strip_suffix('"')) {
                Some(inline) => ListSource::parse(inline),
                None => ListSource::Formula(formula1.to_string()),
            },
        ),
        "custom" => ValidationType::Custom {
            formula: formula1.to_string(),
        },
        other => match CompareKind::from_xlsx(other) {
            Some(kind) => ValidationType::Compare {
                kind,
                criteria: Criteria {
                    operator,
                    value1: formula1.to_string(),
                    value2: formula2.map(|f| f.trim().to_string()),
                },
            },
            None => ValidationType::None,
        },
    };
}

fn parse_sqref(sqref: &str) -> Vec<CellRange> {
    sqref
        .split_whitespace()
        .filter_map(|part| CellRange::parse(part).ok())
        .collect()
}
