//! The binding engine.
//!
//! A [`Converter`] is built once per schema (column names, annotation key,
//! template mode) and reused for any number of decode and encode calls. It
//! keeps no per-call state, so a shared reference can serve several threads.

use std::path::Path;

use encoding_rs::{Encoding, UTF_8};
use log::{debug, info};

use crate::{
    cell::CellData,
    columns::ColumnIndex,
    decode,
    encode::{self, ColumnValues},
    error::{BindError, Result},
    record::Record,
    sheet::{self, DEFAULT_SHEET_NAME, SheetFormat},
    template::{self, DEFAULT_LOOKAHEAD, TemplateMode},
};

pub const DEFAULT_ANNOTATION_KEY: &str = "excel";

#[derive(Debug, Clone)]
pub struct Options {
    /// Annotation key whose column names the engine reads.
    pub annotation_key: String,
    pub template_mode: TemplateMode,
    /// Number of leading rows searched for the header.
    pub lookahead: usize,
    /// Encoding of delimited input files.
    pub encoding: &'static Encoding,
    /// Overrides the extension-derived delimiter for delimited files.
    pub delimiter: Option<u8>,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            annotation_key: DEFAULT_ANNOTATION_KEY.to_string(),
            template_mode: TemplateMode::default(),
            lookahead: DEFAULT_LOOKAHEAD,
            encoding: UTF_8,
            delimiter: None,
        }
    }
}

/// Converts between tabular rows and records.
///
/// ```
/// use rowbind::Converter;
///
/// #[derive(Debug, Default, PartialEq)]
/// struct Person {
///     name: String,
///     age: u32,
/// }
///
/// rowbind::record!(Person {
///     name => column(excel = "Name"),
///     age => column(excel = "Age"),
/// });
///
/// let converter = Converter::new(["Name", "Age"]);
/// let rows = vec![
///     vec!["Staff list".to_string()],
///     vec!["Name".to_string(), "Age".to_string()],
///     vec!["Ada".to_string(), "36".to_string()],
/// ];
/// let people: Vec<Person> = converter.decode_rows(rows).unwrap();
/// assert_eq!(people, vec![Person { name: "Ada".into(), age: 36 }]);
/// ```
///
/// Destinations hold records directly; a sequence of references is not a
/// valid destination:
///
/// ```compile_fail
/// # use rowbind::Converter;
/// # #[derive(Debug, Default)]
/// # struct Person { name: String }
/// # rowbind::record!(Person { name => column(excel = "Name") });
/// let converter = Converter::new(["Name"]);
/// let mut people: Vec<&Person> = Vec::new();
/// converter.decode_all("people.xlsx", &mut people).unwrap();
/// ```
#[derive(Debug, Clone)]
pub struct Converter {
    columns: ColumnIndex,
    options: Options,
}

impl Converter {
    /// Builds a converter with default options. Panics on a repeated column.
    pub fn new<I, S>(columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::with_options(columns, Options::default())
    }

    /// Panics on a repeated column.
    pub fn with_options<I, S>(columns: I, options: Options) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            columns: ColumnIndex::new(columns),
            options,
        }
    }

    /// Fallible variant for column lists that come from user input.
    pub fn try_with_options<I, S>(columns: I, options: Options) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Ok(Self {
            columns: ColumnIndex::try_new(columns)?,
            options,
        })
    }

    pub fn columns(&self) -> &ColumnIndex {
        &self.columns
    }

    pub fn options(&self) -> &Options {
        &self.options
    }

    /// Index of the header row within `rows`, if one is recognized.
    pub fn locate_header(&self, rows: &[Vec<String>]) -> Option<usize> {
        template::locate_header(
            rows,
            self.columns.names(),
            self.options.template_mode,
            self.options.lookahead,
        )
    }

    /// Decodes one row into a fresh record. `line` is the 1-based row
    /// number reported in conversion errors.
    pub fn decode_record<T: Record>(&self, row: &[String], line: usize) -> Result<T> {
        decode::decode_row(&self.columns, &self.options.annotation_key, row, line)
    }

    /// Encodes one record into its column values.
    pub fn encode_record<T: Record>(&self, record: &T) -> ColumnValues {
        encode::encode_record(&self.columns, &self.options.annotation_key, record)
    }

    /// Locates the header in `rows` and decodes every row after it.
    pub fn decode_rows<T: Record>(&self, rows: Vec<Vec<String>>) -> Result<Vec<T>> {
        self.decode_table(rows, "in-memory rows")
    }

    fn decode_table<T: Record>(&self, rows: Vec<Vec<String>>, origin: &str) -> Result<Vec<T>> {
        let (first_line, data) = self.split_header(rows, origin)?;
        data.iter()
            .enumerate()
            .map(|(idx, row)| self.decode_record(row, first_line + idx))
            .collect()
    }

    /// Returns the 1-based line of the first data row and the data rows.
    fn split_header(
        &self,
        mut rows: Vec<Vec<String>>,
        origin: &str,
    ) -> Result<(usize, Vec<Vec<String>>)> {
        let header = self
            .locate_header(&rows)
            .ok_or_else(|| BindError::InvalidTemplate {
                origin: origin.to_string(),
            })?;
        debug!(
            "Header row {} in {} ({} mode)",
            header, origin, self.options.template_mode
        );
        let skip = (header + 1).min(rows.len());
        let data = rows.split_off(skip);
        Ok((header + 2, data))
    }

    /// Reads `path` and returns the rows that follow its header.
    pub fn read_data_rows(&self, path: impl AsRef<Path>) -> Result<Vec<Vec<String>>> {
        let path = path.as_ref();
        let format = SheetFormat::resolve(path, self.options.delimiter)?;
        let rows = sheet::read_rows(path, format, self.options.encoding)?;
        let (_, data) = self.split_header(rows, &path.display().to_string())?;
        Ok(data)
    }

    /// Replaces `destination` with one record per data row of `path`.
    ///
    /// On any failure `destination` is left untouched.
    pub fn decode_all<T: Record>(
        &self,
        path: impl AsRef<Path>,
        destination: &mut Vec<T>,
    ) -> Result<()> {
        let path = path.as_ref();
        let format = SheetFormat::resolve(path, self.options.delimiter)?;
        let rows = sheet::read_rows(path, format, self.options.encoding)?;
        let records = self.decode_table(rows, &path.display().to_string())?;
        info!("Decoded {} record(s) from {:?}", records.len(), path);
        *destination = records;
        Ok(())
    }

    /// Encodes `records` into data rows laid out in `header` order.
    pub fn encode_rows<T: Record>(&self, header: &[String], records: &[T]) -> Vec<Vec<CellData>> {
        records
            .iter()
            .map(|record| self.encode_record(record).to_row(&self.columns, header))
            .collect()
    }

    /// Writes `header` followed by one row per record to `path`.
    ///
    /// `sheet_name` names the worksheet of workbook outputs and defaults to
    /// `Sheet1`; delimited outputs ignore it.
    pub fn encode_all<T: Record>(
        &self,
        header: &[String],
        path: impl AsRef<Path>,
        sheet_name: Option<&str>,
        records: &[T],
    ) -> Result<()> {
        let path = path.as_ref();
        let format = SheetFormat::resolve(path, self.options.delimiter)?;
        let mut writer = sheet::new_writer(format, sheet_name.unwrap_or(DEFAULT_SHEET_NAME))?;

        let header_row = header
            .iter()
            .map(|name| CellData::Text(name.clone()))
            .collect::<Vec<_>>();
        writer.set_row(1, &header_row)?;
        for (idx, row) in self.encode_rows(header, records).iter().enumerate() {
            writer.set_row(idx as u32 + 2, row)?;
        }
        writer.flush()?;
        writer.save_as(path)?;
        info!("Encoded {} record(s) to {:?}", records.len(), path);
        Ok(())
    }
}
