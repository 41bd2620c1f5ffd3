//! Boundary with the physical tabular files.
//!
//! Everything that touches a workbook or delimited file lives here:
//!
//! - **Format resolution** by extension (`.xlsx`/`.xlsm` → workbook, `.csv` →
//!   comma, `.tsv` → tab), with an optional delimiter override.
//! - **Reading**: [`read_rows`] materializes every row of the first sheet as
//!   text cells.
//! - **Writing**: a [`SheetWriter`] receives rows by 1-based position and
//!   persists them with [`SheetWriter::save_as`].
//!
//! Handles are owned values, so they are released on every exit path.

use std::{
    borrow::Cow,
    fs::{self, File},
    io::BufReader,
    path::Path,
};

use csv::QuoteStyle;
use encoding_rs::{Encoding, UTF_8};
use log::debug;
use umya_spreadsheet::Spreadsheet;

use crate::{
    cell::{CellData, MAX_EXACT_NUMERIC},
    error::{BindError, Result},
};

pub const DEFAULT_SHEET_NAME: &str = "Sheet1";
pub const DEFAULT_CSV_DELIMITER: u8 = b',';
pub const DEFAULT_TSV_DELIMITER: u8 = b'\t';

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Delimiters that can be named instead of typed literally.
const NAMED_DELIMITERS: &[(&str, u8)] = &[
    ("comma", DEFAULT_CSV_DELIMITER),
    ("tab", DEFAULT_TSV_DELIMITER),
    ("semicolon", b';'),
    ("pipe", b'|'),
];

/// Parses a delimiter given by name (`tab`, `pipe`, ...) or as a single
/// ASCII character. Quotes and line breaks cannot separate fields.
pub fn parse_delimiter(value: &str) -> Result<u8> {
    if let Some(&(_, byte)) = NAMED_DELIMITERS
        .iter()
        .find(|(name, _)| name.eq_ignore_ascii_case(value))
    {
        return Ok(byte);
    }
    match value.as_bytes() {
        [byte] if byte.is_ascii() && !matches!(byte, b'"' | b'\n' | b'\r') => Ok(*byte),
        _ => Err(BindError::InvalidDelimiter(value.to_string())),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SheetFormat {
    Workbook,
    Delimited(u8),
}

impl SheetFormat {
    /// Resolves the format from `path`'s extension. A provided delimiter
    /// forces delimited text for anything that is not a workbook.
    pub fn resolve(path: &Path, delimiter: Option<u8>) -> Result<Self> {
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_ascii_lowercase);
        match (extension.as_deref(), delimiter) {
            (Some("xlsx" | "xlsm"), _) => Ok(SheetFormat::Workbook),
            (_, Some(delim)) => Ok(SheetFormat::Delimited(delim)),
            (Some("csv"), None) => Ok(SheetFormat::Delimited(DEFAULT_CSV_DELIMITER)),
            (Some("tsv"), None) => Ok(SheetFormat::Delimited(DEFAULT_TSV_DELIMITER)),
            _ => Err(BindError::UnsupportedFormat {
                path: path.to_path_buf(),
            }),
        }
    }
}

pub fn resolve_encoding(label: Option<&str>) -> Result<&'static Encoding> {
    match label {
        Some(value) => Encoding::for_label(value.trim().as_bytes())
            .ok_or_else(|| BindError::UnknownEncoding(value.to_string())),
        None => Ok(UTF_8),
    }
}

/// Reads every row of `path`. Workbooks yield their first sheet; delimited
/// files are decoded with `encoding`.
pub fn read_rows(
    path: &Path,
    format: SheetFormat,
    encoding: &'static Encoding,
) -> Result<Vec<Vec<String>>> {
    fs::metadata(path).map_err(|err| BindError::io(path, err))?;
    let rows = match format {
        SheetFormat::Workbook => read_workbook_rows(path)?,
        SheetFormat::Delimited(delimiter) => read_delimited_rows(path, delimiter, encoding)?,
    };
    debug!("Read {} row(s) from {:?}", rows.len(), path);
    Ok(rows)
}

fn workbook_error(path: &Path, message: impl ToString) -> BindError {
    BindError::Xlsx {
        path: path.to_path_buf(),
        message: message.to_string(),
    }
}

fn read_workbook_rows(path: &Path) -> Result<Vec<Vec<String>>> {
    let book = umya_spreadsheet::reader::xlsx::read(path).map_err(|err| workbook_error(path, err))?;
    let sheet = book
        .get_sheet(&0)
        .ok_or_else(|| workbook_error(path, "workbook has no sheets"))?;

    let mut rows: Vec<Vec<String>> = Vec::new();
    for cell in sheet.get_cell_collection() {
        let value = cell.get_value().to_string();
        if value.is_empty() {
            continue;
        }
        let coordinate = cell.get_coordinate();
        let row = *coordinate.get_row_num() as usize;
        let col = *coordinate.get_col_num() as usize;
        if row == 0 || col == 0 {
            continue;
        }
        if rows.len() < row {
            rows.resize_with(row, Vec::new);
        }
        let cells = &mut rows[row - 1];
        if cells.len() < col {
            cells.resize(col, String::new());
        }
        cells[col - 1] = value;
    }
    Ok(rows)
}

fn read_delimited_rows(
    path: &Path,
    delimiter: u8,
    encoding: &'static Encoding,
) -> Result<Vec<Vec<String>>> {
    let file = File::open(path).map_err(|err| BindError::io(path, err))?;
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .delimiter(delimiter)
        .double_quote(true)
        .from_reader(BufReader::new(file));

    let mut rows: Vec<Vec<String>> = Vec::new();
    for record in reader.byte_records() {
        let record = record.map_err(|source| BindError::Csv {
            path: path.to_path_buf(),
            source,
        })?;
        let at_file_start = rows.is_empty();
        let cells = record
            .iter()
            .enumerate()
            .map(|(column, field)| {
                let field = if at_file_start && column == 0 && encoding == UTF_8 {
                    field.strip_prefix(UTF8_BOM).unwrap_or(field)
                } else {
                    field
                };
                decode_field(path, field, encoding)
            })
            .collect::<Result<Vec<_>>>()?;
        rows.push(cells);
    }
    Ok(rows)
}

/// Decodes one field with exactly `encoding`. Byte order marks are only
/// meaningful at the start of the file, so fields are never sniffed.
fn decode_field(path: &Path, bytes: &[u8], encoding: &'static Encoding) -> Result<String> {
    encoding
        .decode_without_bom_handling_and_without_replacement(bytes)
        .map(Cow::into_owned)
        .ok_or_else(|| BindError::Encoding {
            path: path.to_path_buf(),
            encoding: encoding.name(),
        })
}

/// Row sink for one output sheet. Positions are 1-based; row 1 is the header.
pub trait SheetWriter {
    fn set_row(&mut self, position: u32, cells: &[CellData]) -> Result<()>;

    fn flush(&mut self) -> Result<()> {
        Ok(())
    }

    fn save_as(&mut self, path: &Path) -> Result<()>;
}

pub fn new_writer(format: SheetFormat, sheet_name: &str) -> Result<Box<dyn SheetWriter>> {
    match format {
        SheetFormat::Workbook => Ok(Box::new(WorkbookWriter::new(sheet_name)?)),
        SheetFormat::Delimited(delimiter) => Ok(Box::new(DelimitedWriter::new(delimiter))),
    }
}

struct WorkbookWriter {
    book: Spreadsheet,
    sheet: String,
}

impl WorkbookWriter {
    fn new(sheet_name: &str) -> Result<Self> {
        let sheet = if sheet_name.is_empty() {
            DEFAULT_SHEET_NAME.to_string()
        } else {
            sheet_name.to_string()
        };
        let mut book = umya_spreadsheet::new_file();
        if sheet != DEFAULT_SHEET_NAME {
            book.get_sheet_by_name_mut(DEFAULT_SHEET_NAME)
                .ok_or_else(|| workbook_error(Path::new(&sheet), "new workbook has no sheet"))?
                .set_name(sheet.as_str());
        }
        Ok(Self { book, sheet })
    }
}

impl SheetWriter for WorkbookWriter {
    fn set_row(&mut self, position: u32, cells: &[CellData]) -> Result<()> {
        let sheet = self
            .book
            .get_sheet_by_name_mut(&self.sheet)
            .ok_or_else(|| workbook_error(Path::new(&self.sheet), "sheet disappeared"))?;
        for (idx, data) in cells.iter().enumerate() {
            let coordinate = (idx as u32 + 1, position);
            match data {
                CellData::Empty => {}
                CellData::Text(text) => {
                    sheet.get_cell_mut(coordinate).set_value_string(text.as_str());
                }
                CellData::Int(value) if value.unsigned_abs() > MAX_EXACT_NUMERIC => {
                    sheet.get_cell_mut(coordinate).set_value_string(value.to_string());
                }
                CellData::Int(value) => {
                    sheet.get_cell_mut(coordinate).set_value_number(*value as f64);
                }
                CellData::UInt(value) if *value > MAX_EXACT_NUMERIC => {
                    sheet.get_cell_mut(coordinate).set_value_string(value.to_string());
                }
                CellData::UInt(value) => {
                    sheet.get_cell_mut(coordinate).set_value_number(*value as f64);
                }
                CellData::Float(value) => {
                    sheet.get_cell_mut(coordinate).set_value_number(*value);
                }
                CellData::Bool(value) => {
                    sheet.get_cell_mut(coordinate).set_value_bool(*value);
                }
            }
        }
        Ok(())
    }

    fn save_as(&mut self, path: &Path) -> Result<()> {
        umya_spreadsheet::writer::xlsx::write(&self.book, path)
            .map_err(|err| workbook_error(path, err))
    }
}

/// Buffers rows in memory; the file is only created by `save_as`.
struct DelimitedWriter {
    delimiter: u8,
    rows: Vec<Vec<String>>,
}

impl DelimitedWriter {
    fn new(delimiter: u8) -> Self {
        Self {
            delimiter,
            rows: Vec::new(),
        }
    }
}

impl SheetWriter for DelimitedWriter {
    fn set_row(&mut self, position: u32, cells: &[CellData]) -> Result<()> {
        let index = position.max(1) as usize - 1;
        if self.rows.len() <= index {
            self.rows.resize_with(index + 1, Vec::new);
        }
        self.rows[index] = cells.iter().map(CellData::as_text).collect();
        Ok(())
    }

    fn save_as(&mut self, path: &Path) -> Result<()> {
        let csv_error = |source: csv::Error| BindError::Csv {
            path: path.to_path_buf(),
            source,
        };
        let mut writer = csv::WriterBuilder::new()
            .delimiter(self.delimiter)
            .quote_style(QuoteStyle::Always)
            .double_quote(true)
            .flexible(true)
            .from_path(path)
            .map_err(csv_error)?;
        for row in &self.rows {
            writer.write_record(row).map_err(csv_error)?;
        }
        writer.flush().map_err(|err| BindError::io(path, err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn format_follows_extension() {
        assert_eq!(
            SheetFormat::resolve(Path::new("a.XLSX"), None).unwrap(),
            SheetFormat::Workbook
        );
        assert_eq!(
            SheetFormat::resolve(Path::new("a.tsv"), None).unwrap(),
            SheetFormat::Delimited(b'\t')
        );
        assert_eq!(
            SheetFormat::resolve(Path::new("a.txt"), Some(b'|')).unwrap(),
            SheetFormat::Delimited(b'|')
        );
        assert!(matches!(
            SheetFormat::resolve(Path::new("a.ods"), None),
            Err(BindError::UnsupportedFormat { .. })
        ));
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let dir = tempdir().expect("temp dir");
        let err = read_rows(&dir.path().join("absent.csv"), SheetFormat::Delimited(b','), UTF_8)
            .unwrap_err();
        assert!(matches!(err, BindError::Io { .. }));
    }

    #[test]
    fn delimited_reader_keeps_ragged_rows() {
        let dir = tempdir().expect("temp dir");
        let path = dir.path().join("ragged.csv");
        fs::write(&path, "Report\nName,Age\nAda,36,extra\n").unwrap();
        let rows = read_rows(&path, SheetFormat::Delimited(b','), UTF_8).unwrap();
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0], vec!["Report"]);
        assert_eq!(rows[2], vec!["Ada", "36", "extra"]);
    }

    #[test]
    fn delimited_reader_decodes_legacy_encodings() {
        let dir = tempdir().expect("temp dir");
        let path = dir.path().join("latin1.csv");
        fs::write(&path, b"caf\xe9,1\n").unwrap();
        let encoding = resolve_encoding(Some("windows-1252")).unwrap();
        let rows = read_rows(&path, SheetFormat::Delimited(b','), encoding).unwrap();
        assert_eq!(rows[0][0], "café");
        assert!(resolve_encoding(Some("klingon")).is_err());
    }

    #[test]
    fn legacy_cells_that_look_like_byte_order_marks_are_kept() {
        let dir = tempdir().expect("temp dir");
        let path = dir.path().join("legacy.csv");
        fs::write(&path, b"Name,Note\n\xff\xfeab,\xef\xbb\xbfx\n").unwrap();
        let encoding = resolve_encoding(Some("windows-1252")).unwrap();
        let rows = read_rows(&path, SheetFormat::Delimited(b','), encoding).unwrap();
        assert_eq!(rows[1], vec!["\u{ff}\u{fe}ab", "\u{ef}\u{bb}\u{bf}x"]);
    }

    #[test]
    fn utf8_byte_order_mark_is_dropped_only_at_file_start() {
        let dir = tempdir().expect("temp dir");
        let path = dir.path().join("bom.csv");
        fs::write(&path, b"\xef\xbb\xbfName,Note\nAda,\xef\xbb\xbfx\n").unwrap();
        let rows = read_rows(&path, SheetFormat::Delimited(b','), UTF_8).unwrap();
        assert_eq!(rows[0], vec!["Name", "Note"]);
        assert_eq!(rows[1], vec!["Ada", "\u{feff}x"]);
    }

    #[test]
    fn malformed_utf8_is_an_encoding_error() {
        let dir = tempdir().expect("temp dir");
        let path = dir.path().join("bad.csv");
        fs::write(&path, b"Name\nAd\xffa\n").unwrap();
        let err = read_rows(&path, SheetFormat::Delimited(b','), UTF_8).unwrap_err();
        assert!(matches!(err, BindError::Encoding { encoding: "UTF-8", .. }));
    }

    #[test]
    fn delimiters_parse_by_name_or_character() {
        assert_eq!(parse_delimiter("tab").unwrap(), b'\t');
        assert_eq!(parse_delimiter("PIPE").unwrap(), b'|');
        assert_eq!(parse_delimiter("\t").unwrap(), b'\t');
        assert_eq!(parse_delimiter(";").unwrap(), b';');
        for bad in ["", "::", "\"", "é"] {
            assert!(
                matches!(parse_delimiter(bad), Err(BindError::InvalidDelimiter(_))),
                "{bad:?}"
            );
        }
    }

    #[test]
    fn delimited_writer_quotes_every_field() {
        let dir = tempdir().expect("temp dir");
        let path = dir.path().join("out.csv");
        let mut writer = new_writer(SheetFormat::Delimited(b','), "ignored").unwrap();
        writer
            .set_row(1, &[CellData::from("id"), CellData::from("n")])
            .unwrap();
        writer
            .set_row(2, &[CellData::UInt(7), CellData::Empty])
            .unwrap();
        writer.flush().unwrap();
        writer.save_as(&path).unwrap();
        let written = fs::read_to_string(&path).unwrap();
        assert_eq!(written, "\"id\",\"n\"\n\"7\",\"\"\n");
    }

    #[test]
    fn workbook_round_trip_keeps_cell_text() {
        let dir = tempdir().expect("temp dir");
        let path = dir.path().join("out.xlsx");
        let mut writer = new_writer(SheetFormat::Workbook, "People").unwrap();
        writer
            .set_row(1, &[CellData::from("Name"), CellData::from("Age")])
            .unwrap();
        writer
            .set_row(2, &[CellData::from("Ada"), CellData::UInt(36)])
            .unwrap();
        writer
            .set_row(3, &[CellData::Empty, CellData::Int(-4)])
            .unwrap();
        writer.save_as(&path).unwrap();

        let rows = read_rows(&path, SheetFormat::Workbook, UTF_8).unwrap();
        assert_eq!(rows[0], vec!["Name", "Age"]);
        assert_eq!(rows[1], vec!["Ada", "36"]);
        assert_eq!(rows[2], vec!["", "-4"]);
    }
}
