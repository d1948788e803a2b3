//! Letterhead placeholder rendering.
//!
//! Turns a [`SyntheticDocument`] into a minimal but valid WordprocessingML
//! package: centered letterhead lines, the underlined title, a right-aligned
//! `Tarih:` line, a two-column key/value table (30% / 70%), and an `İmza`
//! signature block.

use std::io::{Cursor, Write};

use anyhow::{Context, Result};
use campus_assist_core::delivery::SyntheticDocument;
use chrono::NaiveDate;
use quick_xml::escape::escape;
use zip::write::SimpleFileOptions;

const CONTENT_TYPES: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/><Default Extension="xml" ContentType="application/xml"/><Override PartName="/word/document.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml"/></Types>"#;

const PACKAGE_RELS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="word/document.xml"/></Relationships>"#;

const SIGNATURE_LINE: &str = "..................................";

/// Table width in fiftieths of a percent.
const TABLE_PCT: u32 = 5000;
const KEY_COLUMN_PCT: u32 = 1500;
const VALUE_COLUMN_PCT: u32 = 3500;

#[derive(Clone, Copy)]
enum Align {
    Center,
    Right,
    Left,
}

impl Align {
    fn as_str(self) -> &'static str {
        match self {
            Align::Center => "center",
            Align::Right => "right",
            Align::Left => "left",
        }
    }
}

#[derive(Clone, Copy, Default)]
struct RunStyle {
    bold: bool,
    underline: bool,
    /// Half-points.
    size: Option<u32>,
}

fn run(text: &str, style: RunStyle) -> String {
    let mut props = String::new();
    if style.bold {
        props.push_str("<w:b/>");
    }
    if style.underline {
        props.push_str(r#"<w:u w:val="single"/>"#);
    }
    if let Some(size) = style.size {
        props.push_str(&format!(r#"<w:sz w:val="{}"/>"#, size));
    }
    let rpr = if props.is_empty() {
        String::new()
    } else {
        format!("<w:rPr>{}</w:rPr>", props)
    };
    format!(
        r#"<w:r>{}<w:t xml:space="preserve">{}</w:t></w:r>"#,
        rpr,
        escape(text)
    )
}

fn paragraph(text: &str, align: Align, style: RunStyle, before: u32, after: u32) -> String {
    format!(
        r#"<w:p><w:pPr><w:spacing w:before="{}" w:after="{}"/><w:jc w:val="{}"/></w:pPr>{}</w:p>"#,
        before,
        after,
        align.as_str(),
        run(text, style)
    )
}

fn cell(text: &str, pct: u32, bold: bool) -> String {
    format!(
        r#"<w:tc><w:tcPr><w:tcW w:w="{}" w:type="pct"/></w:tcPr><w:p>{}</w:p></w:tc>"#,
        pct,
        run(
            text,
            RunStyle {
                bold,
                ..RunStyle::default()
            }
        )
    )
}

fn table(rows: &[(String, String)]) -> String {
    let border = r#"w:val="single" w:sz="4" w:space="0" w:color="000000""#;
    let mut xml = format!(
        r#"<w:tbl><w:tblPr><w:tblW w:w="{pct}" w:type="pct"/><w:tblBorders><w:top {b}/><w:left {b}/><w:bottom {b}/><w:right {b}/><w:insideH {b}/><w:insideV {b}/></w:tblBorders></w:tblPr><w:tblGrid><w:gridCol/><w:gridCol/></w:tblGrid>"#,
        pct = TABLE_PCT,
        b = border
    );
    for (key, value) in rows {
        xml.push_str("<w:tr>");
        xml.push_str(&cell(key, KEY_COLUMN_PCT, true));
        xml.push_str(&cell(value, VALUE_COLUMN_PCT, false));
        xml.push_str("</w:tr>");
    }
    xml.push_str("</w:tbl>");
    xml
}

/// The `word/document.xml` part for a placeholder.
pub fn document_xml(doc: &SyntheticDocument, letterhead: &[String], date: NaiveDate) -> String {
    let mut body = String::new();

    let last = letterhead.len().saturating_sub(1);
    for (idx, line) in letterhead.iter().enumerate() {
        let style = RunStyle {
            bold: idx < last || letterhead.len() == 1,
            size: Some(if idx == 1 { 28 } else { 24 }),
            ..RunStyle::default()
        };
        let after = if idx == last { 400 } else { 0 };
        body.push_str(&paragraph(line, Align::Center, style, 0, after));
    }

    body.push_str(&paragraph(
        &doc.title,
        Align::Center,
        RunStyle {
            bold: true,
            underline: true,
            size: Some(32),
        },
        200,
        200,
    ));
    body.push_str(&paragraph(
        &format!("Tarih: {}", date.format("%d.%m.%Y")),
        Align::Right,
        RunStyle::default(),
        0,
        400,
    ));

    if !doc.rows.is_empty() {
        body.push_str(&table(&doc.rows));
    }

    body.push_str(&paragraph(
        "İmza",
        Align::Right,
        RunStyle {
            bold: true,
            ..RunStyle::default()
        },
        800,
        0,
    ));
    body.push_str(&paragraph(
        SIGNATURE_LINE,
        Align::Right,
        RunStyle::default(),
        0,
        0,
    ));
    // A4, 2 cm margins
    body.push_str(r#"<w:sectPr><w:pgSz w:w="11906" w:h="16838"/><w:pgMar w:top="1134" w:right="1134" w:bottom="1134" w:left="1134" w:header="709" w:footer="709" w:gutter="0"/></w:sectPr>"#);

    format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"><w:body>{}</w:body></w:document>"#,
        body
    )
}

/// Render a placeholder into DOCX bytes.
pub fn render(doc: &SyntheticDocument, letterhead: &[String], date: NaiveDate) -> Result<Vec<u8>> {
    let mut cursor = Cursor::new(Vec::new());
    {
        let mut writer = zip::ZipWriter::new(&mut cursor);
        let options = SimpleFileOptions::default();
        let parts = [
            ("[Content_Types].xml", CONTENT_TYPES.to_string()),
            ("_rels/.rels", PACKAGE_RELS.to_string()),
            ("word/document.xml", document_xml(doc, letterhead, date)),
        ];
        for (name, body) in parts {
            writer
                .start_file(name, options)
                .with_context(|| format!("Failed to start {}", name))?;
            writer.write_all(body.as_bytes())?;
        }
        writer.finish().context("Failed to finish DOCX package")?;
    }
    Ok(cursor.into_inner())
}
