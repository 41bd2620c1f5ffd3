//! Column name to ordinal lookup.
//!
//! A [`ColumnIndex`] is built once from the caller's ordered column names and
//! never changes afterwards. The original order is kept because it is also the
//! canonical header order used by template validation.

use std::collections::HashMap;

use crate::error::{BindError, Result};

#[derive(Debug, Clone)]
pub struct ColumnIndex {
    names: Vec<String>,
    ordinals: HashMap<String, usize>,
}

impl ColumnIndex {
    /// Builds the index, panicking on a repeated name.
    ///
    /// A duplicate column is a programming error in the binding definition,
    /// so it aborts setup. Use [`ColumnIndex::try_new`] for names that come
    /// from user input.
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        match Self::try_new(names) {
            Ok(index) => index,
            Err(err) => panic!("{err}"),
        }
    }

    pub fn try_new<I, S>(names: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let names = names.into_iter().map(Into::into).collect::<Vec<String>>();
        let mut ordinals = HashMap::with_capacity(names.len());
        for (idx, name) in names.iter().enumerate() {
            if ordinals.insert(name.clone(), idx).is_some() {
                return Err(BindError::DuplicateColumn(name.clone()));
            }
        }
        Ok(Self { names, ordinals })
    }

    pub fn ordinal(&self, name: &str) -> Option<usize> {
        self.ordinals.get(name).copied()
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn name(&self, ordinal: usize) -> Option<&str> {
        self.names.get(ordinal).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}
