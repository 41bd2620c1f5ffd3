//! Row to record conversion.

use log::trace;

use crate::{
    cell::{CellValue, Conversion},
    columns::ColumnIndex,
    error::{BindError, Result},
    record::Record,
    walker::{Leaf, LeafWriter, Walker},
};

/// Writes the cells of one row into the leaves of a record.
///
/// Missing and empty cells leave the field at its current value. A cell the
/// field's type cannot parse fails the whole row.
pub(crate) struct RowDecoder<'r> {
    row: &'r [String],
    line: usize,
}

impl<'r> RowDecoder<'r> {
    pub(crate) fn new(row: &'r [String], line: usize) -> Self {
        Self { row, line }
    }
}

impl LeafWriter for RowDecoder<'_> {
    fn write_leaf(&mut self, leaf: Leaf<'_>, value: &mut dyn CellValue) -> Result<()> {
        let text = match self.row.get(leaf.ordinal) {
            Some(text) if !text.is_empty() => text,
            _ => return Ok(()),
        };
        match value.decode_cell(text) {
            Ok(Conversion::Applied) => Ok(()),
            Ok(Conversion::Unsupported) => {
                trace!(
                    "Field '{}' has no text decoding; leaving column '{}' unread",
                    leaf.path(),
                    leaf.column
                );
                Ok(())
            }
            Err(source) => Err(BindError::Cell {
                row: self.line,
                column: leaf.column.to_string(),
                field: leaf.path(),
                source,
            }),
        }
    }
}

/// Decodes `row` into a fresh `T`. `line` is the 1-based row number used in
/// error messages.
pub fn decode_row<T: Record>(
    columns: &ColumnIndex,
    key: &str,
    row: &[String],
    line: usize,
) -> Result<T> {
    let mut record = T::default();
    decode_into(columns, key, row, line, &mut record)?;
    Ok(record)
}

/// Decodes `row` into an existing record, overwriting only the leaves whose
/// cells carry data.
pub fn decode_into<T: Record>(
    columns: &ColumnIndex,
    key: &str,
    row: &[String],
    line: usize,
    record: &mut T,
) -> Result<()> {
    Walker::new(columns, key, RowDecoder::new(row, line)).walk_mut(record)?;
    Ok(())
}
