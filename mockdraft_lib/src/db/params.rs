//! Conversions between Rust values and SQLite storage values.
//!
//! Parameters are stored as owned [`Value`]s so a command can log its bound
//! arguments and bind them at execution time. Dates are stored as ISO-8601
//! text, decimals as text, UUIDs as hyphenated text.

use std::str::FromStr;

use chrono::{NaiveDate, NaiveDateTime};
use rusqlite::types::Value;
use rust_decimal::Decimal;
use uuid::Uuid;

pub(crate) const DATE_FORMAT: &str = "%Y-%m-%d";
pub(crate) const DATE_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.f";

/// A value that can be bound to a named command parameter.
///
/// `Option<T>` binds SQL NULL for `None`, so every supported type has a
/// null-safe variant.
pub trait IntoParam {
    fn into_param(self) -> Value;
}

impl IntoParam for bool {
    fn into_param(self) -> Value {
        Value::Integer(i64::from(self))
    }
}

impl IntoParam for i32 {
    fn into_param(self) -> Value {
        Value::Integer(i64::from(self))
    }
}

impl IntoParam for i64 {
    fn into_param(self) -> Value {
        Value::Integer(self)
    }
}

impl IntoParam for f64 {
    fn into_param(self) -> Value {
        Value::Real(self)
    }
}

impl IntoParam for Decimal {
    fn into_param(self) -> Value {
        Value::Text(self.to_string())
    }
}

impl IntoParam for &str {
    fn into_param(self) -> Value {
        Value::Text(self.to_string())
    }
}

impl IntoParam for String {
    fn into_param(self) -> Value {
        Value::Text(self)
    }
}

impl IntoParam for &String {
    fn into_param(self) -> Value {
        Value::Text(self.clone())
    }
}

impl IntoParam for NaiveDate {
    fn into_param(self) -> Value {
        Value::Text(self.format(DATE_FORMAT).to_string())
    }
}

impl IntoParam for NaiveDateTime {
    fn into_param(self) -> Value {
        Value::Text(self.format(DATE_TIME_FORMAT).to_string())
    }
}

impl IntoParam for Vec<u8> {
    fn into_param(self) -> Value {
        Value::Blob(self)
    }
}

impl IntoParam for &[u8] {
    fn into_param(self) -> Value {
        Value::Blob(self.to_vec())
    }
}

impl IntoParam for Uuid {
    fn into_param(self) -> Value {
        Value::Text(self.hyphenated().to_string())
    }
}

impl IntoParam for Value {
    fn into_param(self) -> Value {
        self
    }
}

impl<T: IntoParam> IntoParam for Option<T> {
    fn into_param(self) -> Value {
        match self {
            Some(v) => v.into_param(),
            None => Value::Null,
        }
    }
}

/// A Rust type a result column can be read as.
///
/// `from_value` is never called with `Value::Null`; nullability is handled by
/// the reader so callers see `Option<T>` rather than a sentinel.
pub trait FromColumn: Sized {
    /// Human-readable type name used in conversion errors.
    const TYPE_NAME: &'static str;

    fn from_value(value: &Value) -> Option<Self>;
}

impl FromColumn for bool {
    const TYPE_NAME: &'static str = "bool";

    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Integer(i) => Some(*i != 0),
            _ => None,
        }
    }
}

impl FromColumn for i32 {
    const TYPE_NAME: &'static str = "i32";

    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Integer(i) => i32::try_from(*i).ok(),
            _ => None,
        }
    }
}

impl FromColumn for i64 {
    const TYPE_NAME: &'static str = "i64";

    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Integer(i) => Some(*i),
            _ => None,
        }
    }
}

impl FromColumn for f64 {
    const TYPE_NAME: &'static str = "f64";

    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Real(f) => Some(*f),
            Value::Integer(i) => Some(*i as f64),
            _ => None,
        }
    }
}

impl FromColumn for Decimal {
    const TYPE_NAME: &'static str = "decimal";

    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Text(s) => Decimal::from_str(s).ok(),
            Value::Integer(i) => Some(Decimal::from(*i)),
            Value::Real(f) => Decimal::try_from(*f).ok(),
            _ => None,
        }
    }
}

impl FromColumn for String {
    const TYPE_NAME: &'static str = "text";

    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Text(s) => Some(s.clone()),
            _ => None,
        }
    }
}

impl FromColumn for NaiveDate {
    const TYPE_NAME: &'static str = "date";

    fn from_value(value: &Value) -> Option<Self> {
        match value {
            // Accept a full timestamp too and keep only the date part.
            Value::Text(s) => s
                .get(..10)
                .and_then(|d| NaiveDate::parse_from_str(d, DATE_FORMAT).ok()),
            _ => None,
        }
    }
}

impl FromColumn for NaiveDateTime {
    const TYPE_NAME: &'static str = "date-time";

    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Text(s) => NaiveDateTime::parse_from_str(s, DATE_TIME_FORMAT)
                .or_else(|_| NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f"))
                .ok()
                .or_else(|| {
                    NaiveDate::parse_from_str(s, DATE_FORMAT)
                        .ok()
                        .and_then(|d| d.and_hms_opt(0, 0, 0))
                }),
            _ => None,
        }
    }
}

impl FromColumn for Vec<u8> {
    const TYPE_NAME: &'static str = "blob";

    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Blob(b) => Some(b.clone()),
            _ => None,
        }
    }
}

impl FromColumn for Uuid {
    const TYPE_NAME: &'static str = "uuid";

    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Text(s) => Uuid::parse_str(s).ok(),
            Value::Blob(b) => Uuid::from_slice(b).ok(),
            _ => None,
        }
    }
}

/// Short rendering of a bound value for command summaries.
pub(crate) fn describe(value: &Value) -> String {
    match value {
        Value::Null => "NULL".to_string(),
        Value::Integer(i) => i.to_string(),
        Value::Real(f) => f.to_string(),
        Value::Text(s) => format!("'{}'", s),
        Value::Blob(b) => format!("<{} bytes>", b.len()),
    }
}
