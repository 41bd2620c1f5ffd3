//! Depth-tracked traversal shared by the decoder and the encoder.
//!
//! The walker visits fields in declaration order starting at depth 1. Nested
//! record slots are descended into at `depth + 1`; leaves are resolved to a
//! column through the active annotation key and the [`ColumnIndex`], and
//! leaves whose column is absent from the index are skipped. Resolved leaves
//! are handed to a [`LeafReader`] (encode) or [`LeafWriter`] (decode).

use log::trace;

use crate::{
    cell::CellValue,
    columns::ColumnIndex,
    error::Result,
    record::{Annotation, FieldVisitor, FieldVisitorMut, Fields, Nested},
};

/// A leaf field bound to a column of the active schema.
#[derive(Debug, Clone, Copy)]
pub struct Leaf<'a> {
    pub parents: &'a [&'static str],
    pub field: &'static str,
    pub column: &'static str,
    pub ordinal: usize,
    pub depth: usize,
}

impl Leaf<'_> {
    /// Dotted path from the top-level record, e.g. `address.city`.
    pub fn path(&self) -> String {
        let mut path = self.parents.join(".");
        if !path.is_empty() {
            path.push('.');
        }
        path.push_str(self.field);
        path
    }
}

pub trait LeafReader {
    fn read_leaf(&mut self, leaf: Leaf<'_>, value: &dyn CellValue);
}

pub trait LeafWriter {
    fn write_leaf(&mut self, leaf: Leaf<'_>, value: &mut dyn CellValue) -> Result<()>;
}

pub struct Walker<'a, H> {
    columns: &'a ColumnIndex,
    key: &'a str,
    parents: Vec<&'static str>,
    handler: H,
}

impl<'a, H> Walker<'a, H> {
    pub fn new(columns: &'a ColumnIndex, key: &'a str, handler: H) -> Self {
        Self {
            columns,
            key,
            parents: Vec::new(),
            handler,
        }
    }

    fn depth(&self) -> usize {
        self.parents.len() + 1
    }
}

fn bind<'p>(
    columns: &ColumnIndex,
    key: &str,
    parents: &'p [&'static str],
    field: &'static str,
    annotation: Annotation,
) -> Option<Leaf<'p>> {
    let column = annotation.column(key)?;
    let ordinal = columns.ordinal(column)?;
    Some(Leaf {
        parents,
        field,
        column,
        ordinal,
        depth: parents.len() + 1,
    })
}

impl<H: LeafReader> Walker<'_, H> {
    pub fn walk(mut self, record: &dyn Fields) -> H {
        record.visit_fields(&mut self);
        self.handler
    }
}

impl<H: LeafWriter> Walker<'_, H> {
    pub fn walk_mut(mut self, record: &mut dyn Fields) -> Result<H> {
        record.visit_fields_mut(&mut self)?;
        Ok(self.handler)
    }
}

impl<H: LeafReader> FieldVisitor for Walker<'_, H> {
    fn leaf(&mut self, field: &'static str, annotation: Annotation, value: &dyn CellValue) {
        if let Some(leaf) = bind(self.columns, self.key, &self.parents, field, annotation) {
            self.handler.read_leaf(leaf, value);
        }
    }

    fn nested(&mut self, field: &'static str, record: Option<&dyn Fields>) {
        let Some(record) = record else {
            return;
        };
        self.parents.push(field);
        trace!("Descending into '{field}' at depth {}", self.depth());
        record.visit_fields(self);
        self.parents.pop();
    }
}

impl<H: LeafWriter> FieldVisitorMut for Walker<'_, H> {
    fn leaf(
        &mut self,
        field: &'static str,
        annotation: Annotation,
        value: &mut dyn CellValue,
    ) -> Result<()> {
        match bind(self.columns, self.key, &self.parents, field, annotation) {
            Some(leaf) => self.handler.write_leaf(leaf, value),
            None => Ok(()),
        }
    }

    fn nested(&mut self, field: &'static str, slot: &mut dyn Nested) -> Result<()> {
        let record = slot.get_or_init();
        self.parents.push(field);
        trace!("Descending into '{field}' at depth {}", self.depth());
        let outcome = record.visit_fields_mut(self);
        self.parents.pop();
        outcome
    }
}
