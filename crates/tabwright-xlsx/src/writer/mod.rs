//! XLSX writer

mod table;

use std::fs;
use std::io::{Seek, Write};
use std::path::Path;

use chrono::{DateTime, Utc};
use tempfile::NamedTempFile;

use crate::error::{XlsxError, XlsxResult};
use tabwright_core::{
    CellAddress, CellValue, ListSource, NameScope, ValidationErrorStyle, ValidationType,
    Workbook, Worksheet,
};

const MAIN_NS: &str = "http://schemas.openxmlformats.org/spreadsheetml/2006/main";
const REL_NS: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships";

/// Minimal stylesheet: one font, the two mandatory fills, one border, one xf
const STYLES_XML: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<styleSheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main">
    <fonts count="1"><font><sz val="11"/><name val="Calibri"/><family val="2"/></font></fonts>
    <fills count="2"><fill><patternFill patternType="none"/></fill><fill><patternFill patternType="gray125"/></fill></fills>
    <borders count="1"><border><left/><right/><top/><bottom/><diagonal/></border></borders>
    <cellStyleXfs count="1"><xf numFmtId="0" fontId="0" fillId="0" borderId="0"/></cellStyleXfs>
    <cellXfs count="1"><xf numFmtId="0" fontId="0" fillId="0" borderId="0" xfId="0"/></cellXfs>
    <cellStyles count="1"><cellStyle name="Normal" xfId="0" builtinId="0"/></cellStyles>
    <dxfs count="0"/>
    <tableStyles count="0" defaultTableStyle="TableStyleMedium2" defaultPivotStyle="PivotStyleLight16"/>
</styleSheet>"#;

/// Part numbering shared by content types, rels and the parts themselves
struct PackageLayout {
    /// For each sheet, the 1-based global numbers of its table parts
    table_parts: Vec<Vec<usize>>,
}

impl PackageLayout {
    fn new(workbook: &Workbook) -> Self {
        let mut next = 1;
        let table_parts = workbook
            .worksheets()
            .map(|sheet| {
                sheet
                    .tables()
                    .iter()
                    .map(|_| {
                        next += 1;
                        next - 1
                    })
                    .collect()
            })
            .collect();
        Self { table_parts }
    }

    fn all_tables(&self) -> impl Iterator<Item = usize> + '_ {
        self.table_parts.iter().flatten().copied()
    }
}

/// XLSX file writer
pub struct XlsxWriter;

impl XlsxWriter {
    /// Write a workbook to a file path
    ///
    /// The package is built in a temporary file next to `path` and then
    /// renamed over it, so a failed write leaves any existing file untouched.
    pub fn write_file<P: AsRef<Path>>(workbook: &Workbook, path: P) -> XlsxResult<()> {
        let path = path.as_ref();
        log::debug!("writing workbook to {}", path.display());
        Self::check_writable(workbook)?;

        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        let mut temp = NamedTempFile::new_in(dir)?;
        Self::write(workbook, temp.as_file_mut())?;
        temp.as_file().sync_all()?;
        if let Ok(meta) = fs::metadata(path) {
            temp.as_file().set_permissions(meta.permissions())?;
        }
        temp.persist(path).map_err(|e| XlsxError::Io(e.error))?;
        Ok(())
    }

    fn check_writable(workbook: &Workbook) -> XlsxResult<()> {
        if workbook.sheet_count() == 0 {
            return Err(XlsxError::InvalidFormat(
                "a workbook needs at least one sheet".into(),
            ));
        }
        Ok(())
    }

    /// Write a workbook to a writer, stamping the current time as creation date
    pub fn write<W: Write + Seek>(workbook: &Workbook, writer: W) -> XlsxResult<()> {
        Self::write_at(workbook, writer, Utc::now())
    }

    /// Write a workbook with an explicit creation timestamp
    pub fn write_at<W: Write + Seek>(
        workbook: &Workbook,
        writer: W,
        created: DateTime<Utc>,
    ) -> XlsxResult<()> {
        Self::check_writable(workbook)?;

        let mut zip = zip::ZipWriter::new(writer);
        let layout = PackageLayout::new(workbook);

        Self::write_content_types(&mut zip, workbook, &layout)?;
        Self::write_root_rels(&mut zip)?;
        Self::write_doc_props(&mut zip, workbook, created)?;
        Self::write_workbook_xml(&mut zip, workbook)?;
        Self::write_workbook_rels(&mut zip, workbook)?;

        let options = zip::write::SimpleFileOptions::default();
        zip.start_file("xl/styles.xml", options)?;
        zip.write_all(STYLES_XML.as_bytes())?;

        for (i, sheet) in workbook.worksheets().enumerate() {
            let parts = &layout.table_parts[i];
            Self::write_worksheet(&mut zip, sheet, i, parts.len())?;

            if !parts.is_empty() {
                Self::write_worksheet_rels(&mut zip, i, parts)?;
                for (table, &part) in sheet.tables().iter().zip(parts) {
                    zip.start_file(format!("xl/tables/table{}.xml", part), options)?;
                    zip.write_all(table::table_xml(table).as_bytes())?;
                }
            }
        }

        zip.finish()?;
        log::debug!(
            "wrote {} sheets and {} table parts",
            workbook.sheet_count(),
            layout.all_tables().count()
        );
        Ok(())
    }

    fn write_content_types<W: Write + Seek>(
        zip: &mut zip::ZipWriter<W>,
        workbook: &Workbook,
        layout: &PackageLayout,
    ) -> XlsxResult<()> {
        let options = zip::write::SimpleFileOptions::default();
        zip.start_file("[Content_Types].xml", options)?;

        let mut content = String::from(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">
    <Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/>
    <Default Extension="xml" ContentType="application/xml"/>
    <Override PartName="/xl/workbook.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.sheet.main+xml"/>
    <Override PartName="/xl/styles.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.styles+xml"/>
    <Override PartName="/docProps/core.xml" ContentType="application/vnd.openxmlformats-package.core-properties+xml"/>
    <Override PartName="/docProps/app.xml" ContentType="application/vnd.openxmlformats-officedocument.extended-properties+xml"/>"#,
        );

        for i in 0..workbook.sheet_count() {
            content.push_str(&format!(
                r#"
    <Override PartName="/xl/worksheets/sheet{}.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.worksheet+xml"/>"#,
                i + 1
            ));
        }

        for part in layout.all_tables() {
            content.push_str(&format!(
                r#"
    <Override PartName="/xl/tables/table{}.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.table+xml"/>"#,
                part
            ));
        }

        content.push_str("\n</Types>");
        zip.write_all(content.as_bytes())?;
        Ok(())
    }

    fn write_root_rels<W: Write + Seek>(zip: &mut zip::ZipWriter<W>) -> XlsxResult<()> {
        let options = zip::write::SimpleFileOptions::default();
        zip.start_file("_rels/.rels", options)?;

        let content = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
    <Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="xl/workbook.xml"/>
    <Relationship Id="rId2" Type="http://schemas.openxmlformats.org/package/2006/relationships/metadata/core-properties" Target="docProps/core.xml"/>
    <Relationship Id="rId3" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/extended-properties" Target="docProps/app.xml"/>
</Relationships>"#;

        zip.write_all(content.as_bytes())?;
        Ok(())
    }

    fn write_doc_props<W: Write + Seek>(
        zip: &mut zip::ZipWriter<W>,
        workbook: &Workbook,
        created: DateTime<Utc>,
    ) -> XlsxResult<()> {
        let options = zip::write::SimpleFileOptions::default();
        let stamp = created.format("%Y-%m-%dT%H:%M:%SZ");

        zip.start_file("docProps/core.xml", options)?;
        let core = format!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<cp:coreProperties xmlns:cp="http://schemas.openxmlformats.org/package/2006/metadata/core-properties" xmlns:dc="http://purl.org/dc/elements/1.1/" xmlns:dcterms="http://purl.org/dc/terms/" xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance">
    <dc:creator>tabwright</dc:creator>
    <dcterms:created xsi:type="dcterms:W3CDTF">{stamp}</dcterms:created>
    <dcterms:modified xsi:type="dcterms:W3CDTF">{stamp}</dcterms:modified>
</cp:coreProperties>"#
        );
        zip.write_all(core.as_bytes())?;

        zip.start_file("docProps/app.xml", options)?;
        let mut titles = String::new();
        for sheet in workbook.worksheets() {
            titles.push_str(&format!("<vt:lpstr>{}</vt:lpstr>", escape_xml(sheet.name())));
        }
        let app = format!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Properties xmlns="http://schemas.openxmlformats.org/officeDocument/2006/extended-properties" xmlns:vt="http://schemas.openxmlformats.org/officeDocument/2006/docPropsVTypes">
    <Application>tabwright</Application>
    <TitlesOfParts><vt:vector size="{}" baseType="lpstr">{}</vt:vector></TitlesOfParts>
</Properties>"#,
            workbook.sheet_count(),
            titles
        );
        zip.write_all(app.as_bytes())?;
        Ok(())
    }

    fn write_workbook_xml<W: Write + Seek>(
        zip: &mut zip::ZipWriter<W>,
        workbook: &Workbook,
    ) -> XlsxResult<()> {
        let options = zip::write::SimpleFileOptions::default();
        zip.start_file("xl/workbook.xml", options)?;

        let mut content = format!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<workbook xmlns="{}" xmlns:r="{}">"#,
            MAIN_NS, REL_NS
        );
        if workbook.settings().date_1904 {
            content.push_str("\n    <workbookPr date1904=\"1\"/>");
        }
        content.push_str("\n    <sheets>");

        for (i, sheet) in workbook.worksheets().enumerate() {
            content.push_str(&format!(
                r#"
        <sheet name="{}" sheetId="{}" r:id="rId{}"/>"#,
                escape_xml(sheet.name()),
                i + 1,
                i + 1
            ));
        }
        content.push_str("\n    </sheets>");

        // Names come out sorted, which is the order Excel expects
        let names = workbook.named_ranges();
        if !names.is_empty() {
            content.push_str("\n    <definedNames>");
            for range in names.iter() {
                let mut attrs = format!(" name=\"{}\"", escape_xml(&range.name));
                if let NameScope::Sheet(idx) = range.scope {
                    attrs.push_str(&format!(" localSheetId=\"{}\"", idx));
                }
                if let Some(comment) = &range.comment {
                    attrs.push_str(&format!(" comment=\"{}\"", escape_xml(comment)));
                }
                if range.hidden {
                    attrs.push_str(" hidden=\"1\"");
                }
                content.push_str(&format!(
                    "\n        <definedName{}>{}</definedName>",
                    attrs,
                    escape_xml(&range.refers_to)
                ));
            }
            content.push_str("\n    </definedNames>");
        }

        content.push_str("\n</workbook>");
        zip.write_all(content.as_bytes())?;
        Ok(())
    }

    fn write_workbook_rels<W: Write + Seek>(
        zip: &mut zip::ZipWriter<W>,
        workbook: &Workbook,
    ) -> XlsxResult<()> {
        let options = zip::write::SimpleFileOptions::default();
        zip.start_file("xl/_rels/workbook.xml.rels", options)?;

        let mut content = String::from(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">"#,
        );

        for i in 0..workbook.sheet_count() {
            content.push_str(&format!(
                r#"
    <Relationship Id="rId{}" Type="{}/worksheet" Target="worksheets/sheet{}.xml"/>"#,
                i + 1,
                REL_NS,
                i + 1
            ));
        }
        content.push_str(&format!(
            r#"
    <Relationship Id="rId{}" Type="{}/styles" Target="styles.xml"/>
</Relationships>"#,
            workbook.sheet_count() + 1,
            REL_NS
        ));

        zip.write_all(content.as_bytes())?;
        Ok(())
    }

    fn write_worksheet<W: Write + Seek>(
        zip: &mut zip::ZipWriter<W>,
        sheet: &Worksheet,
        index: usize,
        table_count: usize,
    ) -> XlsxResult<()> {
        let options = zip::write::SimpleFileOptions::default();
        zip.start_file(format!("xl/worksheets/sheet{}.xml", index + 1), options)?;

        let mut content = format!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<worksheet xmlns="{}" xmlns:r="{}">"#,
            MAIN_NS, REL_NS
        );

        if let Some(used) = sheet.used_range() {
            content.push_str(&format!("\n    <dimension ref=\"{}\"/>", used));
        }

        let selected = if index == 0 { " tabSelected=\"1\"" } else { "" };
        let gridlines = if sheet.show_gridlines() {
            ""
        } else {
            " showGridLines=\"0\""
        };
        content.push_str(&format!(
            "\n    <sheetViews>\n        <sheetView{}{} workbookViewId=\"0\"/>\n    </sheetViews>",
            gridlines, selected
        ));

        content.push_str("\n    <sheetData>");
        for (row, cells) in sheet.cells().rows() {
            if cells.is_empty() {
                content.push_str(&format!("\n        <row r=\"{}\"/>", row + 1));
                continue;
            }
            content.push_str(&format!("\n        <row r=\"{}\">", row + 1));
            for (&col, value) in cells {
                Self::write_cell(&mut content, CellAddress::new(row, col), value);
            }
            content.push_str("\n        </row>");
        }
        content.push_str("\n    </sheetData>");

        Self::write_data_validations(&mut content, sheet);

        if table_count > 0 {
            content.push_str(&format!("\n    <tableParts count=\"{}\">", table_count));
            for n in 1..=table_count {
                content.push_str(&format!("\n        <tablePart r:id=\"rId{}\"/>", n));
            }
            content.push_str("\n    </tableParts>");
        }

        content.push_str("\n</worksheet>");
        zip.write_all(content.as_bytes())?;
        Ok(())
    }

    fn write_cell(content: &mut String, addr: CellAddress, value: &CellValue) {
        let cell_ref = addr.to_a1_string();
        match value {
            CellValue::Number(n) => {
                content.push_str(&format!("\n            <c r=\"{}\"><v>{}</v></c>", cell_ref, n));
            }
            CellValue::String(s) => {
                content.push_str(&format!(
                    "\n            <c r=\"{}\" t=\"inlineStr\"><is><t xml:space=\"preserve\">{}</t></is></c>",
                    cell_ref,
                    escape_xml(s)
                ));
            }
            CellValue::Boolean(b) => {
                content.push_str(&format!(
                    "\n            <c r=\"{}\" t=\"b\"><v>{}</v></c>",
                    cell_ref,
                    u8::from(*b)
                ));
            }
            CellValue::Error(code) => {
                content.push_str(&format!(
                    "\n            <c r=\"{}\" t=\"e\"><v>{}</v></c>",
                    cell_ref,
                    escape_xml(code)
                ));
            }
            CellValue::Formula { text, cached_value } => {
                let (type_attr, cached) = match cached_value.as_deref() {
                    Some(CellValue::Number(n)) => ("", format!("<v>{}</v>", n)),
                    Some(CellValue::String(s)) => (" t=\"str\"", format!("<v>{}</v>", escape_xml(s))),
                    Some(CellValue::Boolean(b)) => (" t=\"b\"", format!("<v>{}</v>", u8::from(*b))),
                    Some(CellValue::Error(code)) => (" t=\"e\"", format!("<v>{}</v>", escape_xml(code))),
                    _ => ("", String::new()),
                };
                content.push_str(&format!(
                    "\n            <c r=\"{}\"{}><f>{}</f>{}</c>",
                    cell_ref,
                    type_attr,
                    escape_xml(text),
                    cached
                ));
            }
            CellValue::Empty => {}
        }
    }

    fn write_data_validations(content: &mut String, sheet: &Worksheet) {
        let validations: Vec<_> = sheet
            .data_validations()
            .iter()
            .filter(|v| !v.ranges.is_empty())
            .collect();
        if validations.is_empty() {
            return;
        }

        content.push_str(&format!(
            "\n    <dataValidations count=\"{}\">",
            validations.len()
        ));

        for validation in validations {
            let mut attrs = String::new();
            if !matches!(validation.validation_type, ValidationType::None) {
                attrs.push_str(&format!(" type=\"{}\"", validation.validation_type.xlsx_type()));
            }
            if let ValidationType::Compare { criteria, .. } = &validation.validation_type {
                attrs.push_str(&format!(
                    " operator=\"{}\"",
                    criteria.operator.xlsx_operator()
                ));
            }
            if validation.error_style != ValidationErrorStyle::Stop {
                attrs.push_str(&format!(
                    " errorStyle=\"{}\"",
                    validation.error_style.xlsx_style()
                ));
            }
            if validation.allow_blank {
                attrs.push_str(" allowBlank=\"1\"");
            }
            // Excel's flag is inverted: showDropDown="1" hides the arrow
            if !validation.show_dropdown {
                attrs.push_str(" showDropDown=\"1\"");
            }
            if let Some((title, message)) = &validation.prompt {
                attrs.push_str(" showInputMessage=\"1\"");
                if let Some(title) = title {
                    attrs.push_str(&format!(" promptTitle=\"{}\"", escape_xml(title)));
                }
                attrs.push_str(&format!(" prompt=\"{}\"", escape_xml(message)));
            }
            if let Some((title, message)) = &validation.error {
                attrs.push_str(" showErrorMessage=\"1\"");
                if let Some(title) = title {
                    attrs.push_str(&format!(" errorTitle=\"{}\"", escape_xml(title)));
                }
                attrs.push_str(&format!(" error=\"{}\"", escape_xml(message)));
            }

            content.push_str(&format!(
                "\n        <dataValidation{} sqref=\"{}\">",
                attrs,
                validation.sqref()
            ));

            match &validation.validation_type {
                ValidationType::List(ListSource::Formula(formula)) => {
                    content.push_str(&format!(
                        "\n            <formula1>{}</formula1>",
                        escape_xml(formula)
                    ));
                }
                ValidationType::List(ListSource::Values(values)) => {
                    content.push_str(&format!(
                        "\n            <formula1>\"{}\"</formula1>",
                        escape_xml(&values.join(","))
                    ));
                }
                ValidationType::Compare { criteria, .. } => {
                    content.push_str(&format!(
                        "\n            <formula1>{}</formula1>",
                        escape_xml(&criteria.value1)
                    ));
                    if let Some(v2) = &criteria.value2 {
                        content.push_str(&format!(
                            "\n            <formula2>{}</formula2>",
                            escape_xml(v2)
                        ));
                    }
                }
                ValidationType::Custom { formula } => {
                    let formula = formula.strip_prefix('=').unwrap_or(formula);
                    content.push_str(&format!(
                        "\n            <formula1>{}</formula1>",
                        escape_xml(formula)
                    ));
                }
                ValidationType::None => {}
            }

            content.push_str("\n        </dataValidation>");
        }

        content.push_str("\n    </dataValidations>");
    }

    /// Worksheet rels pointing at the sheet's table parts
    fn write_worksheet_rels<W: Write + Seek>(
        zip: &mut zip::ZipWriter<W>,
        sheet_index: usize,
        table_parts: &[usize],
    ) -> XlsxResult<()> {
        let options = zip::write::SimpleFileOptions::default();
        zip.start_file(
            format!("xl/worksheets/_rels/sheet{}.xml.rels", sheet_index + 1),
            options,
        )?;

        let mut content = String::from(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">"#,
        );
        for (i, part) in table_parts.iter().enumerate() {
            content.push_str(&format!(
                r#"
    <Relationship Id="rId{}" Type="{}/table" Target="../tables/table{}.xml"/>"#,
                i + 1,
                REL_NS,
                part
            ));
        }
        content.push_str("\n</Relationships>");

        zip.write_all(content.as_bytes())?;
        Ok(())
    }
}

pub(crate) fn escape_xml(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}
