//! Record to row conversion.
//!
//! Encoding walks a record and collects one [`ColumnEntry`] per column. When
//! fields at different nesting depths claim the same column, the shallower
//! field wins no matter which one is visited first.

use log::trace;

use crate::{
    cell::{CellData, CellValue},
    columns::ColumnIndex,
    record::Fields,
    walker::{Leaf, LeafReader, Walker},
};

#[derive(Debug, Clone, PartialEq)]
pub struct ColumnEntry {
    pub value: CellData,
    pub depth: usize,
}

/// Column values produced by encoding one record, indexed by column ordinal.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnValues {
    entries: Vec<Option<ColumnEntry>>,
}

impl ColumnValues {
    fn with_columns(count: usize) -> Self {
        Self {
            entries: vec![None; count],
        }
    }

    pub fn get(&self, ordinal: usize) -> Option<&ColumnEntry> {
        self.entries.get(ordinal).and_then(Option::as_ref)
    }

    pub fn value(&self, columns: &ColumnIndex, name: &str) -> Option<&CellData> {
        columns
            .ordinal(name)
            .and_then(|ordinal| self.get(ordinal))
            .map(|entry| &entry.value)
    }

    /// Lays the values out in `header` order. Header names that are not in
    /// the index, or that no field produced, become empty cells.
    pub fn to_row(&self, columns: &ColumnIndex, header: &[String]) -> Vec<CellData> {
        header
            .iter()
            .map(|name| self.value(columns, name).cloned().unwrap_or(CellData::Empty))
            .collect()
    }

    fn record(&mut self, leaf: &Leaf<'_>, value: CellData) {
        let Some(slot) = self.entries.get_mut(leaf.ordinal) else {
            return;
        };
        if let Some(existing) = slot {
            if existing.depth < leaf.depth {
                trace!(
                    "Column '{}' already set at depth {}; ignoring '{}' at depth {}",
                    leaf.column,
                    existing.depth,
                    leaf.path(),
                    leaf.depth
                );
                return;
            }
        }
        *slot = Some(ColumnEntry {
            value,
            depth: leaf.depth,
        });
    }
}

impl LeafReader for ColumnValues {
    fn read_leaf(&mut self, leaf: Leaf<'_>, value: &dyn CellValue) {
        let Some(data) = value.encode_cell() else {
            return;
        };
        let data = if value.is_zero() { CellData::Empty } else { data };
        self.record(&leaf, data);
    }
}

pub fn encode_record(columns: &ColumnIndex, key: &str, record: &dyn Fields) -> ColumnValues {
    Walker::new(columns, key, ColumnValues::with_columns(columns.len())).walk(record)
}
