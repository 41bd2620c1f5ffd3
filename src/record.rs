//! Compiled field plans for record types.
//!
//! A record type describes its own fields once, at compile time, through
//! [`Fields`]. Each field is either a leaf carrying an [`Annotation`] (the
//! column it binds to under one or more annotation keys) or a nested record
//! slot the walker descends into. The [`record!`](crate::record!) macro writes
//! these impls from a short field list:
//!
//! ```
//! #[derive(Debug, Default)]
//! struct Address {
//!     city: String,
//! }
//!
//! #[derive(Debug, Default)]
//! struct Person {
//!     name: String,
//!     age: u32,
//!     address: Address,
//!     note: Option<Address>,
//! }
//!
//! rowbind::record!(Address { city => column(excel = "City") });
//! rowbind::record!(Person {
//!     name => column(excel = "Name", csv = "name"),
//!     age => column(excel = "Age"),
//!     address => nested,
//!     note => nested,
//! });
//! ```
//!
//! Fields left out of the list are invisible to the engine.

use crate::{cell::CellValue, error::Result};

/// Column names a leaf binds to, keyed by annotation key.
#[derive(Debug, Clone, Copy)]
pub struct Annotation {
    tags: &'static [(&'static str, &'static str)],
}

impl Annotation {
    pub const fn new(tags: &'static [(&'static str, &'static str)]) -> Self {
        Self { tags }
    }

    /// Column named under `key`; an empty name counts as absent.
    pub fn column(&self, key: &str) -> Option<&'static str> {
        self.tags
            .iter()
            .find(|(tag, _)| *tag == key)
            .map(|(_, column)| *column)
            .filter(|column| !column.is_empty())
    }
}

/// Read-only field traversal, used when encoding.
pub trait FieldVisitor {
    fn leaf(&mut self, field: &'static str, annotation: Annotation, value: &dyn CellValue);

    /// `record` is `None` for an empty optional slot.
    fn nested(&mut self, field: &'static str, record: Option<&dyn Fields>);
}

/// Mutable field traversal, used when decoding.
pub trait FieldVisitorMut {
    fn leaf(
        &mut self,
        field: &'static str,
        annotation: Annotation,
        value: &mut dyn CellValue,
    ) -> Result<()>;

    fn nested(&mut self, field: &'static str, slot: &mut dyn Nested) -> Result<()>;
}

/// Declaration-ordered field access for one record type.
pub trait Fields {
    fn visit_fields(&self, visitor: &mut dyn FieldVisitor);

    fn visit_fields_mut(&mut self, visitor: &mut dyn FieldVisitorMut) -> Result<()>;
}

/// A record the engine can create rows from and write rows into.
pub trait Record: Fields + Default {}

/// A slot holding a nested record.
///
/// Owned records are always present. `Option<T>` slots start empty and are
/// filled with `T::default()` by [`Nested::get_or_init`] right before the
/// decoder descends into them.
pub trait Nested {
    fn get(&self) -> Option<&dyn Fields>;

    fn get_or_init(&mut self) -> &mut dyn Fields;
}

impl<T: Record> Nested for Option<T> {
    fn get(&self) -> Option<&dyn Fields> {
        self.as_ref().map(|record| record as &dyn Fields)
    }

    fn get_or_init(&mut self) -> &mut dyn Fields {
        self.get_or_insert_with(T::default)
    }
}

impl<T: Record> Nested for Box<T> {
    fn get(&self) -> Option<&dyn Fields> {
        Some(&**self)
    }

    fn get_or_init(&mut self) -> &mut dyn Fields {
        &mut **self
    }
}

/// Implements [`Fields`], [`Record`] and [`Nested`] for a struct.
///
/// Each entry is `field => column(key = "Column", ...)` for a leaf or
/// `field => nested` for a nested record slot (`T`, `Box<T>` or `Option<T>`
/// where `T` is itself a record). Leaf field types implement
/// [`CellValue`](crate::cell::CellValue).
#[macro_export]
macro_rules! record {
    (@visit $this:ident, $visitor:ident, $field:ident, column($($key:ident = $column:literal),*)) => {
        $visitor.leaf(
            stringify!($field),
            $crate::record::Annotation::new(&[$((stringify!($key), $column)),*]),
            &$this.$field,
        );
    };
    (@visit $this:ident, $visitor:ident, $field:ident, nested) => {
        $visitor.nested(stringify!($field), $crate::record::Nested::get(&$this.$field));
    };
    (@visit_mut $this:ident, $visitor:ident, $field:ident, column($($key:ident = $column:literal),*)) => {
        $visitor.leaf(
            stringify!($field),
            $crate::record::Annotation::new(&[$((stringify!($key), $column)),*]),
            &mut $this.$field,
        )?;
    };
    (@visit_mut $this:ident, $visitor:ident, $field:ident, nested) => {
        $visitor.nested(stringify!($field), &mut $this.$field)?;
    };
    ($name:ident {
        $($field:ident => $kind:ident $(($($key:ident = $column:literal),* $(,)?))?),* $(,)?
    }) => {
        impl $crate::record::Fields for $name {
            #[allow(unused_variables)]
            fn visit_fields(&self, visitor: &mut dyn $crate::record::FieldVisitor) {
                $($crate::record!(@visit self, visitor, $field, $kind $(($($key = $column),*))?);)*
            }

            #[allow(unused_variables)]
            fn visit_fields_mut(
                &mut self,
                visitor: &mut dyn $crate::record::FieldVisitorMut,
            ) -> $crate::error::Result<()> {
                $($crate::record!(@visit_mut self, visitor, $field, $kind $(($($key = $column),*))?);)*
                Ok(())
            }
        }

        impl $crate::record::Record for $name {}

        impl $crate::record::Nested for $name {
            fn get(&self) -> ::std::option::Option<&dyn $crate::record::Fields> {
                Some(self)
            }

            fn get_or_init(&mut self) -> &mut dyn $crate::record::Fields {
                self
            }
        }
    };
}
