//! Picking list table loader.
//!
//! Decodes XLSX, XLS and CSV documents into a [`TableInput`]. The first row
//! of the sheet is the header row.

use calamine::{open_workbook_from_rs, DataType, Range, Reader, Xls, Xlsx};
use chrono::{Duration, NaiveDate};
use std::fmt;
use std::io::{Cursor, Read, Seek};
use std::path::Path;
use tracing::{debug, info};

use super::table::{CellValue, TableInput};
use crate::config::ParserConfig;
use crate::error::ParseError;

/// Supported picking list file formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableFormat {
    Xlsx,
    Xls,
    Csv,
}

impl TableFormat {
    /// Detect format from file extension
    pub fn from_extension(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_lowercase();
        match ext.as_str() {
            "xlsx" => Some(Self::Xlsx),
            "xls" => Some(Self::Xls),
            "csv" => Some(Self::Csv),
            _ => None,
        }
    }

    /// Detect format from content type header
    pub fn from_content_type(content_type: &str) -> Option<Self> {
        match content_type {
            "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet" => Some(Self::Xlsx),
            "application/vnd.ms-excel" => Some(Self::Xls),
            "text/csv" | "application/csv" => Some(Self::Csv),
            _ => None,
        }
    }
}

impl fmt::Display for TableFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Xlsx => "XLSX",
            Self::Xls => "XLS",
            Self::Csv => "CSV",
        };
        f.write_str(name)
    }
}

/// Loads picking list documents into tables.
#[derive(Debug, Clone, Default)]
pub struct TableLoader {
    /// Worksheet to read; the first sheet when `None`.
    sheet_name: Option<String>,
}

impl TableLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_config(config: &ParserConfig) -> Self {
        Self {
            sheet_name: config.sheet_name.clone(),
        }
    }

    pub fn with_sheet_name(mut self, sheet_name: impl Into<String>) -> Self {
        self.sheet_name = Some(sheet_name.into());
        self
    }

    /// Decode a document held in memory.
    ///
    /// `format` overrides detection from the file name's extension.
    pub fn load_bytes(
        &self,
        filename: &str,
        data: &[u8],
        format: Option<TableFormat>,
    ) -> Result<TableInput, ParseError> {
        let format = format
            .or_else(|| TableFormat::from_extension(Path::new(filename)))
            .ok_or_else(|| ParseError::UnsupportedFormat {
                filename: filename.to_string(),
            })?;

        debug!(filename, %format, size_bytes = data.len(), "Decoding picking list");

        let table = match format {
            TableFormat::Xlsx => {
                let workbook: Xlsx<_> = open_workbook_from_rs(Cursor::new(data))
                    .map_err(|e| ParseError::load(format, e))?;
                self.decode_workbook(workbook, format)?
            }
            TableFormat::Xls => {
                let workbook: Xls<_> = open_workbook_from_rs(Cursor::new(data))
                    .map_err(|e| ParseError::load(format, e))?;
                self.decode_workbook(workbook, format)?
            }
            TableFormat::Csv => decode_csv(data)?,
        };

        info!(
            filename,
            %format,
            columns = table.headers().len(),
            rows = table.len(),
            "Picking list table loaded"
        );
        Ok(table)
    }

    /// Read a document from disk. The file is read fully and closed before decoding.
    pub fn load_path(&self, path: &Path) -> Result<TableInput, ParseError> {
        let filename = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        let format = TableFormat::from_extension(path).ok_or_else(|| {
            ParseError::UnsupportedFormat {
                filename: filename.clone(),
            }
        })?;

        let data = std::fs::read(path)?;
        self.load_bytes(&filename, &data, Some(format))
    }

    fn decode_workbook<RS, R>(&self, mut workbook: R, format: TableFormat) -> Result<TableInput, ParseError>
    where
        RS: Read + Seek,
        R: Reader<RS>,
        R::Error: fmt::Display,
    {
        let sheet_name = match &self.sheet_name {
            Some(name) => name.clone(),
            None => workbook
                .sheet_names()
                .first()
                .cloned()
                .ok_or_else(|| ParseError::empty_table("no sheets found in workbook"))?,
        };

        let range = workbook
            .worksheet_range(&sheet_name)
            .ok_or_else(|| ParseError::empty_table(format!("worksheet '{sheet_name}' not found")))?
            .map_err(|e| ParseError::load(format, e))?;

        table_from_range(&range)
    }
}

fn table_from_range(range: &Range<DataType>) -> Result<TableInput, ParseError> {
    let mut rows_iter = range.rows();

    // First row is headers
    let headers: Vec<String> = rows_iter
        .next()
        .ok_or_else(|| ParseError::empty_table("worksheet is empty"))?
        .iter()
        .map(|cell| cell.to_string().trim().to_string())
        .collect();

    let mut table = TableInput::new(headers);
    for row in rows_iter {
        table.push_row(row.iter().map(convert_cell));
    }
    Ok(table)
}

fn convert_cell(cell: &DataType) -> Option<CellValue> {
    match cell {
        DataType::Empty | DataType::Error(_) => None,
        DataType::String(text) => Some(CellValue::Text(text.clone())),
        DataType::Int(value) => Some(CellValue::Int(*value)),
        DataType::Float(value) => Some(CellValue::Float(*value)),
        DataType::Bool(value) => Some(CellValue::Bool(*value)),
        DataType::DateTime(serial) => excel_serial_to_text(*serial).map(CellValue::Text),
        other => Some(CellValue::Text(other.to_string())),
    }
}

/// Render an Excel date serial the way picking lists print dates (`dd.mm.YYYY HH:MM:SS`).
fn excel_serial_to_text(serial: f64) -> Option<String> {
    let epoch = NaiveDate::from_ymd_opt(1899, 12, 30)?.and_hms_opt(0, 0, 0)?;
    let millis = (serial * 86_400_000.0).round() as i64;
    let moment = epoch.checked_add_signed(Duration::milliseconds(millis))?;
    Some(moment.format("%d.%m.%Y %H:%M:%S").to_string())
}

fn decode_csv(data: &[u8]) -> Result<TableInput, ParseError> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_reader(data);

    let headers: Vec<String> = reader
        .byte_headers()
        .map_err(|e| ParseError::load(TableFormat::Csv, e))?
        .iter()
        .map(|h| {
            String::from_utf8_lossy(h)
                .trim_start_matches('\u{feff}')
                .trim()
                .to_string()
        })
        .collect();

    if headers.is_empty() {
        return Err(ParseError::empty_table("CSV has no header row"));
    }

    let mut table = TableInput::new(headers);
    for record in reader.byte_records() {
        let record = record.map_err(|e| ParseError::load(TableFormat::Csv, e))?;
        table.push_row(
            record
                .iter()
                .map(|value| Some(CellValue::Text(String::from_utf8_lossy(value).into_owned()))),
        );
    }
    Ok(table)
}
