//! Fixed-layout PDF backend.
//!
//! Blocks are drawn top to bottom with a running cursor measured from the top edge of
//! the page. Tables repeat their header row whenever a row spills onto a new page.

use super::layout::{Bar, Block, Cell, DocumentLayout, Table};
use super::RenderError;
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Dictionary, Document, Object, Stream};
use std::io::Write;
use std::mem;

const MARGIN: f32 = 40.0;
const CELL_PADDING: f32 = 4.0;
const TABLE_SIZE: f32 = 9.0;
const TABLE_LEADING: f32 = 11.0;
const BODY_SIZE: f32 = 10.0;
const BODY_LEADING: f32 = 14.0;
const NOTE_SIZE: f32 = 9.0;
const HEADER_SHADE: f32 = 0.85;
const BAR_SHADE: f32 = 0.35;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Font {
    Regular,
    Bold,
}

impl Font {
    const fn resource(self) -> &'static str {
        match self {
            Self::Regular => "F1",
            Self::Bold => "F2",
        }
    }
}

pub(crate) fn write_pdf<W: Write>(layout: &DocumentLayout, target: &mut W) -> Result<(), RenderError> {
    let (width, height) = layout.orientation.page_size();
    let mut canvas = Canvas::new(width, height);
    for block in &layout.blocks {
        canvas.block(block);
    }
    let mut document = assemble(&layout.title, width, height, canvas.finish())?;
    document.save_to(target)?;
    Ok(())
}

fn assemble(
    title: &str,
    width: f32,
    height: f32,
    pages: Vec<Vec<Operation>>,
) -> Result<Document, RenderError> {
    let mut document = Document::with_version("1.5");
    let pages_id = document.new_object_id();
    let regular_id = document.add_object(font_dictionary("Helvetica"));
    let bold_id = document.add_object(font_dictionary("Helvetica-Bold"));
    let resources_id = document.add_object(dictionary! {
        "Font" => dictionary! {
            "F1" => regular_id,
            "F2" => bold_id,
        },
    });

    let media_box: Vec<Object> = vec![
        0.into(),
        0.into(),
        (width as i64).into(),
        (height as i64).into(),
    ];
    let total = pages.len();
    let mut kids: Vec<Object> = Vec::with_capacity(total);

    for (index, mut operations) in pages.into_iter().enumerate() {
        operations.extend(text_operations(
            width - MARGIN - 60.0,
            18.0,
            Font::Regular,
            8.0,
            &format!("Page {} / {}", index + 1, total),
        ));
        let content = Content { operations };
        let content_id = document.add_object(Stream::new(dictionary! {}, content.encode()?));
        let page_id = document.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
            "MediaBox" => media_box.clone(),
        });
        kids.push(page_id.into());
    }

    document.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => total as i64,
            "Resources" => resources_id,
        }),
    );

    let catalog_id = document.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    let info_id = document.add_object(dictionary! {
        "Title" => Object::string_literal(encode_win_ansi(title)),
        "Producer" => Object::string_literal("report-center"),
    });
    document.trailer.set("Root", catalog_id);
    document.trailer.set("Info", info_id);
    Ok(document)
}

fn font_dictionary(base_font: &str) -> Dictionary {
    dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => base_font,
        "Encoding" => "WinAnsiEncoding",
    }
}

/// `baseline` is measured from the bottom edge, as PDF expects.
fn text_operations(x: f32, baseline: f32, font: Font, size: f32, text: &str) -> [Operation; 5] {
    [
        Operation::new("BT", vec![]),
        Operation::new("Tf", vec![font.resource().into(), size.into()]),
        Operation::new("Td", vec![x.into(), baseline.into()]),
        Operation::new("Tj", vec![Object::string_literal(encode_win_ansi(text))]),
        Operation::new("ET", vec![]),
    ]
}

#[derive(Debug, Clone, Copy)]
enum Paint {
    Fill(f32),
    Stroke,
}

struct Canvas {
    width: f32,
    height: f32,
    cursor: f32,
    current: Vec<Operation>,
    finished: Vec<Vec<Operation>>,
}

impl Canvas {
    fn new(width: f32, height: f32) -> Self {
        Self {
            width,
            height,
            cursor: MARGIN,
            current: Vec::new(),
            finished: Vec::new(),
        }
    }

    fn finish(mut self) -> Vec<Vec<Operation>> {
        self.finished.push(mem::take(&mut self.current));
        self.finished
    }

    fn content_width(&self) -> f32 {
        self.width - 2.0 * MARGIN
    }

    fn limit(&self) -> f32 {
        self.height - MARGIN
    }

    fn page_is_blank(&self) -> bool {
        self.current.is_empty()
    }

    fn new_page(&mut self) {
        self.finished.push(mem::take(&mut self.current));
        self.cursor = MARGIN;
    }

    /// Starts a new page unless `needed` points still fit on this one.
    fn reserve(&mut self, needed: f32) {
        if self.cursor + needed > self.limit() && !self.page_is_blank() {
            self.new_page();
        }
    }

    fn text(&mut self, x: f32, top: f32, font: Font, size: f32, text: &str) {
        let baseline = self.height - top - size * 0.8;
        self.current
            .extend(text_operations(x, baseline, font, size, text));
    }

    fn rect(&mut self, x: f32, top: f32, width: f32, height: f32, paint: Paint) {
        let bottom = self.height - top - height;
        self.current.push(Operation::new("q", vec![]));
        match paint {
            Paint::Fill(gray) => self.current.push(Operation::new("g", vec![gray.into()])),
            Paint::Stroke => self.current.push(Operation::new("w", vec![0.5_f32.into()])),
        }
        self.current.push(Operation::new(
            "re",
            vec![x.into(), bottom.into(), width.into(), height.into()],
        ));
        self.current.push(Operation::new(
            match paint {
                Paint::Fill(_) => "f",
                Paint::Stroke => "S",
            },
            vec![],
        ));
        self.current.push(Operation::new("Q", vec![]));
    }

    fn lines(&mut self, x: f32, lines: &[String], font: Font, size: f32, leading: f32) {
        for line in lines {
            self.reserve(leading);
            let top = self.cursor;
            self.text(x, top, font, size, line);
            self.cursor += leading;
        }
    }

    fn wrapped(&mut self, text: &str, font: Font, size: f32, leading: f32, after: f32) {
        let lines = wrap(text, font, size, self.content_width());
        self.lines(MARGIN, &lines, font, size, leading);
        self.cursor += after;
    }

    fn block(&mut self, block: &Block) {
        match block {
            Block::Title(text) => self.wrapped(text, Font::Bold, 18.0, 24.0, 6.0),
            Block::Subtitle(text) => self.wrapped(text, Font::Regular, 13.0, 18.0, 4.0),
            Block::Heading(text) => {
                self.reserve(48.0);
                self.cursor += 4.0;
                self.wrapped(text, Font::Bold, 14.0, 20.0, 4.0);
            }
            Block::Paragraph(text) => self.wrapped(text, Font::Regular, BODY_SIZE, BODY_LEADING, 4.0),
            Block::Bullets(items) => self.bullets(items),
            Block::Facts(facts) => self.facts(facts),
            Block::Table(table) => self.table(table),
            Block::BarChart(bars) => self.bar_chart(bars),
            Block::Note(text) => self.wrapped(text, Font::Regular, NOTE_SIZE, 13.0, 2.0),
            Block::PageBreak => {
                if !self.page_is_blank() {
                    self.new_page();
                }
            }
        }
    }

    fn bullets(&mut self, items: &[String]) {
        let indent = 14.0;
        for item in items {
            let lines = wrap(item, Font::Regular, BODY_SIZE, self.content_width() - indent);
            self.reserve(BODY_LEADING);
            let top = self.cursor;
            self.text(MARGIN + 2.0, top, Font::Regular, BODY_SIZE, "•");
            self.lines(MARGIN + indent, &lines, Font::Regular, BODY_SIZE, BODY_LEADING);
        }
        self.cursor += 4.0;
    }

    fn facts(&mut self, facts: &[(String, String)]) {
        let value_x = MARGIN + self.content_width() / 2.0;
        for (label, value) in facts {
            self.reserve(15.0);
            let top = self.cursor;
            self.text(MARGIN, top, Font::Bold, BODY_SIZE, label);
            self.text(value_x, top, Font::Regular, BODY_SIZE, value);
            self.cursor += 15.0;
        }
        self.cursor += 6.0;
    }

    fn table(&mut self, table: &Table) {
        let header: Vec<Vec<String>> = table
            .columns
            .iter()
            .map(|column| wrap(column.header, Font::Bold, TABLE_SIZE, column.width - 2.0 * CELL_PADDING))
            .collect();
        let header_height = row_height(&header);

        self.reserve(header_height + TABLE_LEADING + 2.0 * CELL_PADDING);
        self.row(table, &header, header_height, Font::Bold, Some(HEADER_SHADE));

        for row in &table.rows {
            let cells = cell_lines(table, row);
            let height = row_height(&cells);
            if self.cursor + height > self.limit() {
                self.new_page();
                self.row(table, &header, header_height, Font::Bold, Some(HEADER_SHADE));
            }
            self.row(table, &cells, height, Font::Regular, None);
        }
        self.cursor += 8.0;
    }

    fn row(&mut self, table: &Table, cells: &[Vec<String>], height: f32, font: Font, shade: Option<f32>) {
        let top = self.cursor;
        let mut x = MARGIN;
        for (column, lines) in table.columns.iter().zip(cells) {
            if let Some(gray) = shade {
                self.rect(x, top, column.width, height, Paint::Fill(gray));
            }
            self.rect(x, top, column.width, height, Paint::Stroke);
            for (index, line) in lines.iter().enumerate() {
                self.text(
                    x + CELL_PADDING,
                    top + CELL_PADDING + index as f32 * TABLE_LEADING,
                    font,
                    TABLE_SIZE,
                    line,
                );
            }
            x += column.width;
        }
        self.cursor = top + height;
    }

    fn bar_chart(&mut self, bars: &[Bar]) {
        let label_width = 70.0;
        let track = self.content_width() - label_width - 50.0;
        for bar in bars {
            self.reserve(20.0);
            let top = self.cursor;
            self.text(MARGIN, top + 2.0, Font::Regular, BODY_SIZE, &bar.label);
            let length = track * bar.fraction.clamp(0.0, 1.0);
            if length > 0.0 {
                self.rect(MARGIN + label_width, top, length, 14.0, Paint::Fill(BAR_SHADE));
            }
            self.text(
                MARGIN + label_width + length + 6.0,
                top + 2.0,
                Font::Regular,
                BODY_SIZE,
                &bar.value.to_string(),
            );
            self.cursor += 20.0;
        }
        self.cursor += 6.0;
    }
}

fn cell_lines(table: &Table, row: &[Cell]) -> Vec<Vec<String>> {
    table
        .columns
        .iter()
        .zip(row)
        .map(|(column, cell)| {
            cell.lines()
                .into_iter()
                .flat_map(|line| wrap(line, Font::Regular, TABLE_SIZE, column.width - 2.0 * CELL_PADDING))
                .collect()
        })
        .collect()
}

fn row_height(cells: &[Vec<String>]) -> f32 {
    let lines = cells.iter().map(Vec::len).max().unwrap_or(1).max(1);
    lines as f32 * TABLE_LEADING + 2.0 * CELL_PADDING
}

/// Approximate Helvetica advance widths, in thousandths of the font size.
fn glyph_width(c: char) -> f32 {
    match c {
        'i' | 'j' | 'l' | '\'' | '|' => 222.0,
        ' ' | '.' | ',' | ':' | ';' | '!' | 'f' | 't' | 'I' | '/' => 278.0,
        'r' | '(' | ')' | '-' => 333.0,
        'm' | 'M' => 833.0,
        'w' | 'W' => 778.0,
        c if c.is_uppercase() => 667.0,
        _ => 556.0,
    }
}

fn text_width(text: &str, font: Font, size: f32) -> f32 {
    let scale = match font {
        Font::Regular => 1.0,
        Font::Bold => 1.06,
    };
    text.chars().map(glyph_width).sum::<f32>() * size * scale / 1000.0
}

/// Greedy word wrap; words wider than the line are split between characters.
fn wrap(text: &str, font: Font, size: f32, max_width: f32) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();

    for word in text.split_whitespace() {
        let candidate = if current.is_empty() {
            word.to_string()
        } else {
            format!("{current} {word}")
        };
        if text_width(&candidate, font, size) <= max_width {
            current = candidate;
            continue;
        }
        if !current.is_empty() {
            lines.push(mem::take(&mut current));
        }
        for c in word.chars() {
            current.push(c);
            if text_width(&current, font, size) > max_width && current.chars().count() > 1 {
                current.pop();
                lines.push(mem::replace(&mut current, c.to_string()));
            }
        }
    }

    if !current.is_empty() || lines.is_empty() {
        lines.push(current);
    }
    lines
}

/// Maps text to the single-byte WinAnsi encoding used by the standard fonts.
pub(crate) fn encode_win_ansi(text: &str) -> Vec<u8> {
    text.chars()
        .map(|c| match c {
            '€' => 0x80,
            '…' => 0x85,
            '‘' => 0x91,
            '’' => 0x92,
            '“' => 0x93,
            '”' => 0x94,
            '•' => 0x95,
            '–' => 0x96,
            '—' => 0x97,
            'Œ' => 0x8C,
            'œ' => 0x9C,
            '\u{202F}' => 0xA0,
            c if (c as u32) < 0x80 || (0xA0..=0xFF).contains(&(c as u32)) => c as u32 as u8,
            _ => b'?',
        })
        .collect()
}
