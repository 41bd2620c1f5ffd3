//! Header row detection.
//!
//! Spreadsheets exported by people often carry a title or merged banner above
//! the real header. [`locate_header`] scans a bounded number of leading rows
//! for the one whose cells line up with the expected column names.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

pub const DEFAULT_LOOKAHEAD: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TemplateMode {
    /// Every expected column must equal the header cell at its position.
    Strict,
    /// Every header cell must contain the expected column name.
    #[default]
    Lenient,
    /// No validation; row 0 is the header.
    Disabled,
}

impl TemplateMode {
    fn accepts(self, cell: &str, expected: &str) -> bool {
        match self {
            TemplateMode::Strict => cell == expected,
            TemplateMode::Lenient => cell.contains(expected),
            TemplateMode::Disabled => true,
        }
    }
}

impl fmt::Display for TemplateMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            TemplateMode::Strict => "strict",
            TemplateMode::Lenient => "lenient",
            TemplateMode::Disabled => "disabled",
        };
        f.write_str(label)
    }
}

impl FromStr for TemplateMode {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "strict" => Ok(TemplateMode::Strict),
            "lenient" => Ok(TemplateMode::Lenient),
            "disabled" | "disable" | "off" => Ok(TemplateMode::Disabled),
            other => Err(format!(
                "Unknown template mode '{other}' (expected strict, lenient or disabled)"
            )),
        }
    }
}

/// Returns the index of the header row, or `None` when no row within
/// `lookahead` matches `expected` under `mode`.
pub fn locate_header<R>(
    rows: &[R],
    expected: &[String],
    mode: TemplateMode,
    lookahead: usize,
) -> Option<usize>
where
    R: AsRef<[String]>,
{
    if mode == TemplateMode::Disabled {
        return Some(0);
    }
    rows.iter()
        .take(lookahead)
        .position(|row| row_matches(row.as_ref(), expected, mode))
}

fn row_matches(row: &[String], expected: &[String], mode: TemplateMode) -> bool {
    if row.len() < expected.len() {
        return false;
    }
    expected
        .iter()
        .zip(row)
        .all(|(name, cell)| mode.accepts(cell, name))
}
