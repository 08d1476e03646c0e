//! Flow-layout DOCX backend: a minimal WordprocessingML package written with `zip`.

use super::layout::{Bar, Block, DocumentLayout, Orientation, Table};
use super::RenderError;
use std::fmt::Write as _;
use std::io::{Seek, Write};
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipWriter};

const CONTENT_TYPES: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/><Default Extension="xml" ContentType="application/xml"/><Override PartName="/word/document.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml"/><Override PartName="/docProps/core.xml" ContentType="application/vnd.openxmlformats-package.core-properties+xml"/></Types>"#;

const PACKAGE_RELATIONSHIPS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="word/document.xml"/><Relationship Id="rId2" Type="http://schemas.openxmlformats.org/package/2006/relationships/metadata/core-properties" Target="docProps/core.xml"/></Relationships>"#;

/// Page margin in twentieths of a point (40pt).
const MARGIN_TWIPS: u32 = 800;
const HEADER_FILL: &str = "D9D9D9";
const BAR_SLOTS: f32 = 40.0;

pub(crate) fn write_docx<W: Write + Seek>(
    layout: &DocumentLayout,
    target: W,
) -> Result<W, RenderError> {
    let options = FileOptions::default().compression_method(CompressionMethod::Deflated);
    let mut archive = ZipWriter::new(target);

    archive.start_file("[Content_Types].xml", options)?;
    archive.write_all(CONTENT_TYPES.as_bytes())?;
    archive.start_file("_rels/.rels", options)?;
    archive.write_all(PACKAGE_RELATIONSHIPS.as_bytes())?;
    archive.start_file("docProps/core.xml", options)?;
    archive.write_all(core_properties(&layout.title).as_bytes())?;
    archive.start_file("word/document.xml", options)?;
    archive.write_all(document_xml(layout).as_bytes())?;

    Ok(archive.finish()?)
}

fn core_properties(title: &str) -> String {
    format!(
        concat!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#,
            "\n",
            r#"<cp:coreProperties xmlns:cp="http://schemas.openxmlformats.org/package/2006/metadata/core-properties" xmlns:dc="http://purl.org/dc/elements/1.1/">"#,
            "<dc:title>{}</dc:title><dc:creator>report-center</dc:creator></cp:coreProperties>"
        ),
        escape(title)
    )
}

pub(crate) fn document_xml(layout: &DocumentLayout) -> String {
    let mut body = String::new();
    for block in &layout.blocks {
        write_block(&mut body, block);
    }

    let page_size = match layout.orientation {
        Orientation::Portrait => r#"<w:pgSz w:w="11906" w:h="16838"/>"#,
        Orientation::Landscape => r#"<w:pgSz w:w="16838" w:h="11906" w:orient="landscape"/>"#,
    };
    format!(
        concat!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#,
            "\n",
            r#"<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"><w:body>"#,
            "{body}<w:sectPr>{page_size}",
            r#"<w:pgMar w:top="{m}" w:right="{m}" w:bottom="{m}" w:left="{m}" w:header="0" w:footer="0" w:gutter="0"/>"#,
            "</w:sectPr></w:body></w:document>"
        ),
        body = body,
        page_size = page_size,
        m = MARGIN_TWIPS
    )
}

#[derive(Debug, Clone, Copy)]
struct RunStyle {
    /// Half-points, as WordprocessingML counts them.
    size: u32,
    bold: bool,
}

const TITLE: RunStyle = RunStyle { size: 36, bold: true };
const SUBTITLE: RunStyle = RunStyle { size: 26, bold: false };
const HEADING: RunStyle = RunStyle { size: 28, bold: true };
const BODY: RunStyle = RunStyle { size: 20, bold: false };
const LABEL: RunStyle = RunStyle { size: 20, bold: true };
const NOTE: RunStyle = RunStyle { size: 18, bold: false };
const CELL: RunStyle = RunStyle { size: 18, bold: false };
const HEADER_CELL: RunStyle = RunStyle { size: 18, bold: true };

fn write_block(out: &mut String, block: &Block) {
    match block {
        Block::Title(text) => paragraph(out, "", &[(text.as_str(), TITLE)], 160),
        Block::Subtitle(text) => paragraph(out, "", &[(text.as_str(), SUBTITLE)], 120),
        Block::Heading(text) => paragraph(out, "<w:keepNext/>", &[(text.as_str(), HEADING)], 120),
        Block::Paragraph(text) => paragraph(out, "", &[(text.as_str(), BODY)], 80),
        Block::Note(text) => paragraph(out, "", &[(text.as_str(), NOTE)], 40),
        Block::Bullets(items) => {
            for item in items {
                let text = format!("• {item}");
                paragraph(out, r#"<w:ind w:left="360" w:hanging="200"/>"#, &[(text.as_str(), BODY)], 40);
            }
        }
        Block::Facts(facts) => {
            for (label, value) in facts {
                facts_line(out, label, value);
            }
        }
        Block::Table(table) => write_table(out, table),
        Block::BarChart(bars) => {
            for bar in bars {
                bar_line(out, bar);
            }
        }
        Block::PageBreak => out.push_str(r#"<w:p><w:r><w:br w:type="page"/></w:r></w:p>"#),
    }
}

fn run(out: &mut String, text: &str, style: RunStyle) {
    out.push_str("<w:r><w:rPr>");
    if style.bold {
        out.push_str("<w:b/>");
    }
    let _ = write!(
        out,
        r#"<w:sz w:val="{size}"/><w:szCs w:val="{size}"/></w:rPr><w:t xml:space="preserve">{text}</w:t></w:r>"#,
        size = style.size,
        text = escape(text)
    );
}

fn paragraph(out: &mut String, properties: &str, runs: &[(&str, RunStyle)], spacing_after: u32) {
    let _ = write!(
        out,
        r#"<w:p><w:pPr>{properties}<w:spacing w:after="{spacing_after}"/></w:pPr>"#
    );
    for (text, style) in runs {
        run(out, text, *style);
    }
    out.push_str("</w:p>");
}

fn facts_line(out: &mut String, label: &str, value: &str) {
    out.push_str(
        r#"<w:p><w:pPr><w:tabs><w:tab w:val="left" w:pos="4800"/></w:tabs><w:spacing w:after="40"/></w:pPr>"#,
    );
    run(out, label, LABEL);
    out.push_str("<w:r><w:tab/></w:r>");
    run(out, value, BODY);
    out.push_str("</w:p>");
}

fn bar_line(out: &mut String, bar: &Bar) {
    let slots = (bar.fraction.clamp(0.0, 1.0) * BAR_SLOTS).round() as usize;
    let filled = "█".repeat(slots);
    out.push_str(
        r#"<w:p><w:pPr><w:tabs><w:tab w:val="left" w:pos="1400"/></w:tabs><w:spacing w:after="20"/></w:pPr>"#,
    );
    run(out, &bar.label, LABEL);
    out.push_str("<w:r><w:tab/></w:r>");
    run(out, &format!("{filled} {}", bar.value), BODY);
    out.push_str("</w:p>");
}

fn twips(points: f32) -> u32 {
    (points * 20.0).round() as u32
}

fn write_table(out: &mut String, table: &Table) {
    let _ = write!(
        out,
        r#"<w:tbl><w:tblPr><w:tblW w:w="{}" w:type="dxa"/><w:tblBorders>"#,
        twips(table.total_width())
    );
    for edge in ["top", "left", "bottom", "right", "insideH", "insideV"] {
        let _ = write!(
            out,
            r#"<w:{edge} w:val="single" w:sz="4" w:space="0" w:color="808080"/>"#
        );
    }
    out.push_str(r#"</w:tblBorders><w:tblLayout w:type="fixed"/></w:tblPr><w:tblGrid>"#);
    for column in &table.columns {
        let _ = write!(out, r#"<w:gridCol w:w="{}"/>"#, twips(column.width));
    }
    out.push_str("</w:tblGrid>");

    out.push_str("<w:tr><w:trPr><w:tblHeader/></w:trPr>");
    for column in &table.columns {
        cell(out, column.width, &[column.header], HEADER_CELL, Some(HEADER_FILL));
    }
    out.push_str("</w:tr>");

    for row in &table.rows {
        out.push_str("<w:tr><w:trPr><w:cantSplit/></w:trPr>");
        for (column, value) in table.columns.iter().zip(row) {
            cell(out, column.width, &value.lines(), CELL, None);
        }
        out.push_str("</w:tr>");
    }
    out.push_str("</w:tbl>");
    // Word expects a paragraph between a table and whatever follows it.
    out.push_str(r#"<w:p><w:pPr><w:spacing w:after="80"/></w:pPr></w:p>"#);
}

fn cell(out: &mut String, width: f32, lines: &[&str], style: RunStyle, fill: Option<&str>) {
    let _ = write!(
        out,
        r#"<w:tc><w:tcPr><w:tcW w:w="{}" w:type="dxa"/>"#,
        twips(width)
    );
    if let Some(fill) = fill {
        let _ = write!(out, r#"<w:shd w:val="clear" w:color="auto" w:fill="{fill}"/>"#);
    }
    out.push_str("</w:tcPr>");
    for line in lines {
        paragraph(out, "", &[(*line, style)], 0);
    }
    out.push_str("</w:tc>");
}

pub(crate) fn escape(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&apos;"),
            // XML 1.0 has no representation for the remaining C0 controls.
            '\t' | '\n' | '\r' => escaped.push(c),
            c if (c as u32) < 0x20 => {}
            c => escaped.push(c),
        }
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reports::render::layout::{Cell, Column};
    use std::io::{Cursor, Read};
    use zip::ZipArchive;

    fn layout(orientation: Orientation, rows: Vec<Vec<Cell>>) -> DocumentLayout {
        let mut layout = DocumentLayout::new("Rapport des conventions", orientation);
        layout
            .push(Block::Title("Rapport des conventions".to_string()))
            .push(Block::Paragraph("Période : Premier trimestre 2025".to_string()))
            .push(Block::Table(Table {
                columns: vec![Column::new("Intitulé", 200.0), Column::new("Bailleurs", 150.0)],
                rows,
            }));
        layout
    }

    fn read_part(bytes: Vec<u8>, name: &str) -> String {
        let mut archive = ZipArchive::new(Cursor::new(bytes)).expect("valid zip");
        let mut part = archive.by_name(name).expect("part present");
        let mut xml = String::new();
        part.read_to_string(&mut xml).expect("utf-8 part");
        xml
    }

    #[test]
    fn package_holds_the_required_parts() {
        let bytes = write_docx(&layout(Orientation::Portrait, Vec::new()), Cursor::new(Vec::new()))
            .expect("docx written")
            .into_inner();
        let mut archive = ZipArchive::new(Cursor::new(bytes)).expect("valid zip");
        let names: Vec<String> = archive.file_names().map(str::to_string).collect();
        for part in ["[Content_Types].xml", "_rels/.rels", "docProps/core.xml", "word/document.xml"] {
            assert!(names.iter().any(|name| name == part), "{part} missing");
        }
        assert!(archive.by_name("word/document.xml").is_ok());
    }

    #[test]
    fn one_table_row_per_record_plus_repeating_header() {
        let rows = vec![
            vec![Cell::from("Appui FAO"), Cell::from("FAO, BAD")],
            vec![Cell::from("R&D <semences>"), Cell::Lines(vec!["UE".to_string(), "AFD".to_string()])],
        ];
        let bytes = write_docx(&layout(Orientation::Landscape, rows), Cursor::new(Vec::new()))
            .expect("docx written")
            .into_inner();
        let xml = read_part(bytes, "word/document.xml");

        assert_eq!(xml.matches("<w:tr>").count(), 3);
        assert_eq!(xml.matches("<w:tblHeader/>").count(), 1);
        assert!(xml.contains("R&amp;D &lt;semences&gt;"));
        assert!(xml.contains(r#"w:orient="landscape""#));
        assert!(xml.contains(r#"<w:gridCol w:w="4000"/>"#));
    }

    #[test]
    fn page_breaks_and_bars_are_emitted() {
        let mut layout = DocumentLayout::new("Annuel", Orientation::Portrait);
        layout.push(Block::PageBreak).push(Block::BarChart(vec![Bar {
            label: "T1".to_string(),
            value: 4,
            fraction: 0.5,
        }]));
        let xml = document_xml(&layout);
        assert!(xml.contains(r#"<w:br w:type="page"/>"#));
        assert!(xml.contains(&format!("{} 4", "█".repeat(20))));
        assert!(!xml.contains("w:orient"));
    }

    #[test]
    fn forbidden_control_characters_are_dropped() {
        assert_eq!(escape("Essai\u{0}\u{1b} maïs\tA&B\n"), "Essai maïs\tA&amp;B\n");
    }
}
