//! Leaf values: what a single field reads from and writes to a cell.
//!
//! The engine converts leaves through [`CellValue`]. Built-in impls cover
//! text, booleans, every integer width and both float widths, plus a few
//! types that show up in real spreadsheets (dates, GUIDs, decimals).
//! Caller types plug in through the two capabilities [`FromCell`] and
//! [`ToCell`] and the [`cell_value!`](crate::cell_value) macro. A type with
//! neither capability is still allowed as a leaf; the engine ignores it.

use std::fmt;

use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime};
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::error::CellError;

/// Largest integer magnitude a spreadsheet can store exactly as a number.
pub const MAX_EXACT_NUMERIC: u64 = 1 << 53;

/// A typed value handed to a sheet writer.
#[derive(Debug, Clone, PartialEq)]
pub enum CellData {
    Empty,
    Text(String),
    Int(i64),
    UInt(u64),
    Float(f64),
    Bool(bool),
}

impl CellData {
    pub fn as_text(&self) -> String {
        match self {
            CellData::Empty => String::new(),
            CellData::Text(s) => s.clone(),
            CellData::Int(i) => i.to_string(),
            CellData::UInt(u) => u.to_string(),
            CellData::Float(f) => f.to_string(),
            CellData::Bool(b) => b.to_string(),
        }
    }
}

impl fmt::Display for CellData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.as_text())
    }
}

impl From<&str> for CellData {
    fn from(value: &str) -> Self {
        CellData::Text(value.to_string())
    }
}

/// Outcome of handing a cell's text to a leaf.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Conversion {
    Applied,
    Unsupported,
}

/// Leaf dispatch used by the decoder and encoder.
///
/// Both methods default to "no capability", so `impl CellValue for T {}`
/// declares an annotated field the engine should leave alone.
pub trait CellValue {
    fn decode_cell(&mut self, text: &str) -> Result<Conversion, CellError> {
        let _ = text;
        Ok(Conversion::Unsupported)
    }

    fn encode_cell(&self) -> Option<CellData> {
        None
    }

    /// Zero values are written as blank cells.
    fn is_zero(&self) -> bool {
        false
    }
}

/// Capability: the type can be built from a cell's text.
pub trait FromCell: Sized {
    fn from_cell(text: &str) -> Result<Self, CellError>;
}

/// Capability: the type can render itself as cell text.
pub trait ToCell {
    fn to_cell(&self) -> String;
}

/// Implements [`CellValue`] for a caller type from its capabilities.
///
/// ```
/// use rowbind::cell::{FromCell, ToCell};
/// use rowbind::error::CellError;
///
/// #[derive(Debug, Default, PartialEq)]
/// struct Sku(String);
///
/// impl FromCell for Sku {
///     fn from_cell(text: &str) -> Result<Self, CellError> {
///         Ok(Sku(text.to_ascii_uppercase()))
///     }
/// }
///
/// impl ToCell for Sku {
///     fn to_cell(&self) -> String {
///         self.0.clone()
///     }
/// }
///
/// rowbind::cell_value!(Sku);
/// ```
///
/// `cell_value!(T => decode)` and `cell_value!(T => encode)` wire a single
/// capability; `cell_value!(T => opaque)` wires none.
#[macro_export]
macro_rules! cell_value {
    ($ty:ty => decode) => {
        impl $crate::cell::CellValue for $ty {
            fn decode_cell(
                &mut self,
                text: &str,
            ) -> ::std::result::Result<$crate::cell::Conversion, $crate::error::CellError> {
                *self = <$ty as $crate::cell::FromCell>::from_cell(text)?;
                Ok($crate::cell::Conversion::Applied)
            }
        }
    };
    ($ty:ty => encode) => {
        impl $crate::cell::CellValue for $ty {
            fn encode_cell(&self) -> ::std::option::Option<$crate::cell::CellData> {
                Some($crate::cell::CellData::Text(
                    <$ty as $crate::cell::ToCell>::to_cell(self),
                ))
            }
        }
    };
    ($ty:ty => opaque) => {
        impl $crate::cell::CellValue for $ty {}
    };
    ($ty:ty) => {
        impl $crate::cell::CellValue for $ty {
            fn decode_cell(
                &mut self,
                text: &str,
            ) -> ::std::result::Result<$crate::cell::Conversion, $crate::error::CellError> {
                *self = <$ty as $crate::cell::FromCell>::from_cell(text)?;
                Ok($crate::cell::Conversion::Applied)
            }

            fn encode_cell(&self) -> ::std::option::Option<$crate::cell::CellData> {
                Some($crate::cell::CellData::Text(
                    <$ty as $crate::cell::ToCell>::to_cell(self),
                ))
            }
        }
    };
}

impl CellValue for String {
    fn decode_cell(&mut self, text: &str) -> Result<Conversion, CellError> {
        text.clone_into(self);
        Ok(Conversion::Applied)
    }

    fn encode_cell(&self) -> Option<CellData> {
        Some(CellData::Text(self.clone()))
    }
}

impl CellValue for bool {
    fn decode_cell(&mut self, text: &str) -> Result<Conversion, CellError> {
        *self = parse_bool(text)?;
        Ok(Conversion::Applied)
    }

    fn encode_cell(&self) -> Option<CellData> {
        Some(CellData::Bool(*self))
    }

    fn is_zero(&self) -> bool {
        !*self
    }
}

pub fn parse_bool(text: &str) -> Result<bool, CellError> {
    match text {
        "1" | "t" | "T" | "TRUE" | "true" | "True" => Ok(true),
        "0" | "f" | "F" | "FALSE" | "false" | "False" => Ok(false),
        _ => Err(CellError::Boolean {
            text: text.to_string(),
        }),
    }
}

macro_rules! integer_cell {
    ($variant:ident as $wide:ty: $($ty:ty),+) => {
        $(
            impl CellValue for $ty {
                fn decode_cell(&mut self, text: &str) -> Result<Conversion, CellError> {
                    *self = text.parse::<$ty>().map_err(|source| CellError::Integer {
                        text: text.to_string(),
                        source,
                    })?;
                    Ok(Conversion::Applied)
                }

                fn encode_cell(&self) -> Option<CellData> {
                    Some(CellData::$variant(*self as $wide))
                }

                fn is_zero(&self) -> bool {
                    *self == 0
                }
            }
        )+
    };
}

integer_cell!(Int as i64: i8, i16, i32, i64, isize);
integer_cell!(UInt as u64: u8, u16, u32, u64, usize);

impl CellValue for f64 {
    fn decode_cell(&mut self, text: &str) -> Result<Conversion, CellError> {
        *self = parse_float(text)?;
        Ok(Conversion::Applied)
    }

    fn encode_cell(&self) -> Option<CellData> {
        Some(CellData::Float(*self))
    }

    fn is_zero(&self) -> bool {
        *self == 0.0
    }
}

impl CellValue for f32 {
    fn decode_cell(&mut self, text: &str) -> Result<Conversion, CellError> {
        *self = text.parse::<f32>().map_err(|source| CellError::Float {
            text: text.to_string(),
            source,
        })?;
        Ok(Conversion::Applied)
    }

    fn encode_cell(&self) -> Option<CellData> {
        // Widen through the shortest decimal form so 0.1f32 is written as 0.1.
        let widened = self.to_string().parse::<f64>().unwrap_or(f64::from(*self));
        Some(CellData::Float(widened))
    }

    fn is_zero(&self) -> bool {
        *self == 0.0
    }
}

fn parse_float(text: &str) -> Result<f64, CellError> {
    text.parse::<f64>().map_err(|source| CellError::Float {
        text: text.to_string(),
        source,
    })
}

/// `None` stays `None` for blank cells and writes a blank cell; `Some(0)` is
/// written as `0`.
impl<T> CellValue for Option<T>
where
    T: CellValue + Default,
{
    fn decode_cell(&mut self, text: &str) -> Result<Conversion, CellError> {
        let mut value = T::default();
        let outcome = value.decode_cell(text)?;
        if outcome == Conversion::Applied {
            *self = Some(value);
        }
        Ok(outcome)
    }

    fn encode_cell(&self) -> Option<CellData> {
        match self {
            Some(value) => value.encode_cell(),
            None => Some(CellData::Empty),
        }
    }
}

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%d/%m/%Y", "%m/%d/%Y", "%Y/%m/%d", "%d-%m-%Y"];

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%d/%m/%Y %H:%M:%S",
    "%m/%d/%Y %H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
];

/// Serial number of 9999-12-31, the last day a spreadsheet can represent.
const MAX_SERIAL: f64 = 2_958_465.0;

/// Day zero of the 1900 date system, adjusted for the phantom 1900-02-29.
fn serial_epoch() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(1899, 12, 30)
        .unwrap_or_default()
        .and_time(NaiveTime::MIN)
}

fn from_serial(text: &str) -> Option<NaiveDateTime> {
    let serial = text.parse::<f64>().ok()?;
    if !(0.0..MAX_SERIAL + 1.0).contains(&serial) {
        return None;
    }
    let millis = (serial * 86_400_000.0).round() as i64;
    serial_epoch().checked_add_signed(Duration::try_milliseconds(millis)?)
}

impl FromCell for NaiveDate {
    fn from_cell(text: &str) -> Result<Self, CellError> {
        DATE_FORMATS
            .iter()
            .find_map(|fmt| NaiveDate::parse_from_str(text, fmt).ok())
            .or_else(|| from_serial(text).map(|dt| dt.date()))
            .ok_or_else(|| CellError::custom(text, "not a recognized date"))
    }
}

impl ToCell for NaiveDate {
    fn to_cell(&self) -> String {
        self.format("%Y-%m-%d").to_string()
    }
}

impl FromCell for NaiveDateTime {
    fn from_cell(text: &str) -> Result<Self, CellError> {
        DATETIME_FORMATS
            .iter()
            .find_map(|fmt| NaiveDateTime::parse_from_str(text, fmt).ok())
            .or_else(|| from_serial(text))
            .ok_or_else(|| CellError::custom(text, "not a recognized datetime"))
    }
}

impl ToCell for NaiveDateTime {
    fn to_cell(&self) -> String {
        self.format("%Y-%m-%d %H:%M:%S").to_string()
    }
}

impl FromCell for Uuid {
    fn from_cell(text: &str) -> Result<Self, CellError> {
        let trimmed = text.trim().trim_matches(|c| matches!(c, '{' | '}'));
        Uuid::parse_str(trimmed).map_err(|err| CellError::custom(text, err))
    }
}

impl ToCell for Uuid {
    fn to_cell(&self) -> String {
        self.hyphenated().to_string()
    }
}

crate::cell_value!(NaiveDate);
crate::cell_value!(NaiveDateTime);
crate::cell_value!(Uuid);

impl CellValue for Decimal {
    fn decode_cell(&mut self, text: &str) -> Result<Conversion, CellError> {
        *self = text
            .trim()
            .parse::<Decimal>()
            .map_err(|err| CellError::custom(text, err))?;
        Ok(Conversion::Applied)
    }

    // Text keeps every digit; a spreadsheet number would round to f64.
    fn encode_cell(&self) -> Option<CellData> {
        Some(CellData::Text(self.normalize().to_string()))
    }

    fn is_zero(&self) -> bool {
        self.is_zero()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn integers_parse_into_their_width() {
        let mut small = 0u8;
        assert_eq!(small.decode_cell("200").unwrap(), Conversion::Applied);
        assert_eq!(small, 200);
        assert!(matches!(
            small.decode_cell("300"),
            Err(CellError::Integer { ref text, .. }) if text == "300"
        ));
        let mut signed = 0i32;
        signed.decode_cell("-42").unwrap();
        assert_eq!(signed, -42);
        assert!(signed.decode_cell(" 7").is_err());
    }

    #[test]
    fn booleans_accept_canonical_spellings_only() {
        for text in ["1", "t", "T", "TRUE", "true", "True"] {
            assert_eq!(parse_bool(text).unwrap(), true, "{text}");
        }
        for text in ["0", "f", "F", "FALSE", "false", "False"] {
            assert_eq!(parse_bool(text).unwrap(), false, "{text}");
        }
        assert!(parse_bool("yes").is_err());
        assert!(parse_bool("tRuE").is_err());
    }

    #[test]
    fn zero_numbers_report_zero() {
        assert!(0u64.is_zero());
        assert!(0.0f64.is_zero());
        assert_eq!(false.encode_cell(), Some(CellData::Bool(false)));
        assert!(false.is_zero());
        assert!(!String::new().is_zero());
    }

    #[test]
    fn f32_is_widened_through_its_shortest_form() {
        assert_eq!(0.1f32.encode_cell(), Some(CellData::Float(0.1)));
    }

    #[test]
    fn option_leaf_keeps_explicit_zero() {
        let mut value: Option<u32> = None;
        assert_eq!(value.encode_cell(), Some(CellData::Empty));
        value.decode_cell("0").unwrap();
        assert_eq!(value, Some(0));
        assert!(!value.is_zero());
        assert_eq!(value.encode_cell(), Some(CellData::UInt(0)));
    }

    #[test]
    fn dates_accept_text_and_serial_numbers() {
        let expected = NaiveDate::from_ymd_opt(2024, 5, 6).unwrap();
        assert_eq!(NaiveDate::from_cell("2024-05-06").unwrap(), expected);
        assert_eq!(NaiveDate::from_cell("2024/05/06").unwrap(), expected);
        assert_eq!(NaiveDate::from_cell("45418").unwrap(), expected);
        assert!(NaiveDate::from_cell("soon").is_err());
        assert_eq!(expected.to_cell(), "2024-05-06");
    }

    #[test]
    fn serials_past_the_last_spreadsheet_day_are_rejected() {
        assert_eq!(
            NaiveDate::from_cell("2958465").unwrap(),
            NaiveDate::from_ymd_opt(9999, 12, 31).unwrap()
        );
        assert!(NaiveDate::from_cell("2958466").is_err());
        assert!(NaiveDate::from_cell("20240506").is_err());
        assert!(NaiveDateTime::from_cell("20240506").is_err());
        assert!(NaiveDate::from_cell("-1").is_err());
        assert!(NaiveDate::from_cell("NaN").is_err());
    }

    #[test]
    fn datetime_serial_keeps_time_of_day() {
        let parsed = NaiveDateTime::from_cell("45418.5").unwrap();
        assert_eq!(parsed.to_string(), "2024-05-06 12:00:00");
    }

    #[test]
    fn guid_accepts_braces() {
        let mut value = Uuid::nil();
        value
            .decode_cell("{550e8400-e29b-41d4-a716-446655440000}")
            .unwrap();
        assert_eq!(
            value.encode_cell(),
            Some(CellData::Text(
                "550e8400-e29b-41d4-a716-446655440000".to_string()
            ))
        );
    }

    #[test]
    fn decimal_round_trips_as_text() {
        let mut value = Decimal::ZERO;
        assert!(CellValue::is_zero(&value));
        value.decode_cell("12.3400").unwrap();
        assert_eq!(value.encode_cell(), Some(CellData::Text("12.34".into())));
    }

    #[test]
    fn opaque_types_are_unsupported() {
        struct Blob;
        impl CellValue for Blob {}
        let mut blob = Blob;
        assert_eq!(blob.decode_cell("x").unwrap(), Conversion::Unsupported);
        assert_eq!(blob.encode_cell(), None);
    }
}
