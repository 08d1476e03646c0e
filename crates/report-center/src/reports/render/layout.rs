//! Backend-neutral description of a document: what goes on the page, in order.
//!
//! Widths are expressed in PDF points (1/72 inch). The DOCX backend converts them to
//! twentieths of a point.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Orientation {
    Portrait,
    Landscape,
}

impl Orientation {
    /// A4 in points, `(width, height)`.
    pub(crate) const fn page_size(self) -> (f32, f32) {
        match self {
            Self::Portrait => (595.0, 842.0),
            Self::Landscape => (842.0, 595.0),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Column {
    pub(crate) header: &'static str,
    pub(crate) width: f32,
}

impl Column {
    pub(crate) const fn new(header: &'static str, width: f32) -> Self {
        Self { header, width }
    }
}

/// A table cell. `Lines` are stacked one under the other.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Cell {
    Text(String),
    Lines(Vec<String>),
}

impl Cell {
    pub(crate) fn lines(&self) -> Vec<&str> {
        match self {
            Self::Text(text) => vec![text.as_str()],
            Self::Lines(lines) if lines.is_empty() => vec![""],
            Self::Lines(lines) => lines.iter().map(String::as_str).collect(),
        }
    }
}

impl From<String> for Cell {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<&str> for Cell {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Table {
    pub(crate) columns: Vec<Column>,
    pub(crate) rows: Vec<Vec<Cell>>,
}

impl Table {
    pub(crate) fn total_width(&self) -> f32 {
        self.columns.iter().map(|column| column.width).sum()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Bar {
    pub(crate) label: String,
    pub(crate) value: usize,
    /// Share of the full bar width, already guarded against a zero maximum.
    pub(crate) fraction: f32,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Block {
    Title(String),
    Subtitle(String),
    Heading(String),
    Paragraph(String),
    Bullets(Vec<String>),
    /// Label/value pairs laid out in two columns.
    Facts(Vec<(String, String)>),
    Table(Table),
    BarChart(Vec<Bar>),
    /// Small print, e.g. totals and the generation stamp.
    Note(String),
    PageBreak,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct DocumentLayout {
    pub(crate) title: String,
    pub(crate) orientation: Orientation,
    pub(crate) blocks: Vec<Block>,
}

impl DocumentLayout {
    pub(crate) fn new(title: impl Into<String>, orientation: Orientation) -> Self {
        Self {
            title: title.into(),
            orientation,
            blocks: Vec::new(),
        }
    }

    pub(crate) fn push(&mut self, block: Block) -> &mut Self {
        self.blocks.push(block);
        self
    }

    pub(crate) fn tables(&self) -> impl Iterator<Item = &Table> {
        self.blocks.iter().filter_map(|block| match block {
            Block::Table(table) => Some(table),
            _ => None,
        })
    }
}
