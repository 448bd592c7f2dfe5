//! In-memory table model handed from the loader to the extractor.
//!
//! Null markers are resolved here, once: blank cells, NaN floats and the
//! literal `nan` all become `None`. Code reading the table never has to
//! inspect a value to decide whether it is "really" empty.

use std::fmt;

use super::columns::ColumnSlot;

/// A non-empty cell value.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Text(String),
    Int(i64),
    Float(f64),
    Bool(bool),
}

impl CellValue {
    /// Normalize a raw cell, returning `None` for anything that means "no value".
    pub fn decode(raw: CellValue) -> Option<CellValue> {
        match raw {
            CellValue::Text(text) => {
                let trimmed = text.trim();
                if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("nan") {
                    None
                } else if trimmed.len() == text.len() {
                    Some(CellValue::Text(text))
                } else {
                    Some(CellValue::Text(trimmed.to_string()))
                }
            }
            CellValue::Float(value) if !value.is_finite() => None,
            // Spreadsheets store integers as floats; keep task numbers free of a trailing ".0".
            CellValue::Float(value)
                if value.fract() == 0.0 && value.abs() < i64::MAX as f64 =>
            {
                Some(CellValue::Int(value as i64))
            }
            other => Some(other),
        }
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Text(text) => f.write_str(text),
            CellValue::Int(value) => write!(f, "{value}"),
            CellValue::Float(value) => write!(f, "{value}"),
            CellValue::Bool(value) => write!(f, "{value}"),
        }
    }
}

impl From<&str> for CellValue {
    fn from(value: &str) -> Self {
        CellValue::Text(value.to_string())
    }
}

impl From<String> for CellValue {
    fn from(value: String) -> Self {
        CellValue::Text(value)
    }
}

impl From<i64> for CellValue {
    fn from(value: i64) -> Self {
        CellValue::Int(value)
    }
}

impl From<f64> for CellValue {
    fn from(value: f64) -> Self {
        CellValue::Float(value)
    }
}

/// What a row holds for one logical field.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FieldValue<'a> {
    /// The table has no such column.
    Absent,
    /// The column exists but this row's cell is empty.
    Empty,
    Value(&'a CellValue),
}

impl<'a> FieldValue<'a> {
    pub fn value(self) -> Option<&'a CellValue> {
        match self {
            FieldValue::Value(value) => Some(value),
            _ => None,
        }
    }

    /// Cell text, with absent columns and empty cells both rendered as "".
    pub fn to_text(self) -> String {
        self.value().map(ToString::to_string).unwrap_or_default()
    }
}

/// Rectangular table: a header row naming the columns plus data rows.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TableInput {
    headers: Vec<String>,
    rows: Vec<Vec<Option<CellValue>>>,
}

impl TableInput {
    pub fn new(headers: Vec<String>) -> Self {
        Self {
            headers,
            rows: Vec::new(),
        }
    }

    /// Build a table from positional rows. Every cell goes through [`CellValue::decode`].
    pub fn from_rows<H, R>(headers: H, rows: R) -> Self
    where
        H: IntoIterator,
        H::Item: Into<String>,
        R: IntoIterator<Item = Vec<Option<CellValue>>>,
    {
        let mut table = Self::new(headers.into_iter().map(Into::into).collect());
        for row in rows {
            table.push_row(row);
        }
        table
    }

    /// Build a table from rows given as column-name/value pairs.
    ///
    /// Columns appear in the order they are first seen; a row that lacks a
    /// column gets an empty cell there.
    pub fn from_records<R, K, V>(records: R) -> Self
    where
        R: IntoIterator,
        R::Item: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<CellValue>,
    {
        let mut headers: Vec<String> = Vec::new();
        let mut keyed_rows: Vec<Vec<(usize, CellValue)>> = Vec::new();

        for record in records {
            let mut cells = Vec::new();
            for (key, value) in record {
                let key = key.into();
                let position = match headers.iter().position(|h| *h == key) {
                    Some(position) => position,
                    None => {
                        headers.push(key);
                        headers.len() - 1
                    }
                };
                if !cells.iter().any(|(p, _)| *p == position) {
                    cells.push((position, value.into()));
                }
            }
            keyed_rows.push(cells);
        }

        let width = headers.len();
        let mut table = Self::new(headers);
        for cells in keyed_rows {
            let mut row = vec![None; width];
            for (position, value) in cells {
                row[position] = Some(value);
            }
            table.push_row(row);
        }
        table
    }

    /// Append a row, decoding null markers. Short rows are padded with empty cells.
    pub fn push_row<I>(&mut self, cells: I)
    where
        I: IntoIterator<Item = Option<CellValue>>,
    {
        let mut row: Vec<Option<CellValue>> = cells
            .into_iter()
            .map(|cell| cell.and_then(CellValue::decode))
            .collect();
        if row.len() < self.headers.len() {
            row.resize(self.headers.len(), None);
        }
        self.rows.push(row);
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn rows(&self) -> impl Iterator<Item = Row<'_>> + '_ {
        self.rows
            .iter()
            .enumerate()
            .map(|(index, cells)| Row { index, cells })
    }

    /// Non-empty values of one column, top to bottom.
    pub fn column_values(&self, slot: ColumnSlot) -> impl Iterator<Item = &CellValue> + '_ {
        self.rows().filter_map(move |row| row.field(slot).value())
    }
}

/// Borrowed view of one data row.
#[derive(Debug, Clone, Copy)]
pub struct Row<'a> {
    index: usize,
    cells: &'a [Option<CellValue>],
}

impl<'a> Row<'a> {
    /// Zero-based position among the data rows.
    pub fn index(&self) -> usize {
        self.index
    }

    /// Line number as shown in a spreadsheet, counting the header as line 1.
    pub fn line_number(&self) -> usize {
        self.index + 2
    }

    pub fn field(&self, slot: ColumnSlot) -> FieldValue<'a> {
        match slot {
            ColumnSlot::Absent => FieldValue::Absent,
            ColumnSlot::Present(position) => match self.cells.get(position) {
                Some(Some(value)) => FieldValue::Value(value),
                _ => FieldValue::Empty,
            },
        }
    }
}
