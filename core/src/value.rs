//! Dynamically typed SQL value used for bound arguments and scanned cells

#[cfg(feature = "rusqlite")]
use rusqlite::types::{FromSql, FromSqlResult, ToSqlOutput, ValueRef};
use serde::Serialize;

use crate::error::{DrmError, Result};

/// A single SQL value (owned)
#[derive(Debug, Clone, PartialEq, PartialOrd, Default)]
pub enum Value {
    /// Integer value (i64)
    Integer(i64),
    /// Real value (f64)
    Real(f64),
    /// Text value
    Text(String),
    /// Blob value
    Blob(Vec<u8>),
    /// NULL value
    #[default]
    Null,
}

impl Value {
    /// Encodes `value` as JSON text, the storage format of JSON columns.
    pub fn json<T: Serialize + ?Sized>(value: &T) -> Result<Self> {
        Ok(Value::Text(serde_json::to_string(value)?))
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Raw bytes of a text or blob cell, as handed to the JSON decoder.
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Value::Text(s) => Some(s.as_bytes()),
            Value::Blob(b) => Some(b),
            _ => None,
        }
    }

    fn kind(&self) -> &'static str {
        match self {
            Value::Integer(_) => "INTEGER",
            Value::Real(_) => "REAL",
            Value::Text(_) => "TEXT",
            Value::Blob(_) => "BLOB",
            Value::Null => "NULL",
        }
    }
}

impl std::fmt::Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::Integer(i) => write!(f, "{i}"),
            Value::Real(r) => write!(f, "{r}"),
            Value::Text(s) => write!(f, "{s}"),
            Value::Blob(b) => write!(f, "{}", String::from_utf8_lossy(b)),
            Value::Null => write!(f, "NULL"),
        }
    }
}

//------------------------------------------------------------------------------
// Conversions into Value
//------------------------------------------------------------------------------

macro_rules! impl_from_integer {
    ($($ty:ty),*) => { $(
        impl From<$ty> for Value {
            fn from(value: $ty) -> Self {
                Value::Integer(i64::from(value))
            }
        }
    )* }
}

impl_from_integer!(i8, i16, i32, i64, u8, u16, u32, bool);

impl From<f32> for Value {
    fn from(value: f32) -> Self {
        Value::Real(f64::from(value))
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Real(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Text(value.to_owned())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::Text(value)
    }
}

impl From<Vec<u8>> for Value {
    fn from(value: Vec<u8>) -> Self {
        Value::Blob(value)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map_or(Value::Null, Into::into)
    }
}

//------------------------------------------------------------------------------
// Conversions out of Value
//------------------------------------------------------------------------------

/// Conversion from a scanned cell into a typed entity field.
pub trait FromValue: Sized {
    fn from_value(value: Value) -> Result<Self>;
}

fn mismatch(expected: &str, value: &Value) -> DrmError {
    DrmError::Mapping(format!("expected {expected}, found {}", value.kind()))
}

impl FromValue for Value {
    fn from_value(value: Value) -> Result<Self> {
        Ok(value)
    }
}

impl FromValue for i64 {
    fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Integer(i) => Ok(i),
            other => Err(mismatch("INTEGER", &other)),
        }
    }
}

macro_rules! impl_from_value_integer {
    ($($ty:ty),*) => { $(
        impl FromValue for $ty {
            fn from_value(value: Value) -> Result<Self> {
                let i = i64::from_value(value)?;
                <$ty>::try_from(i).map_err(|e| DrmError::Mapping(e.to_string()))
            }
        }
    )* }
}

impl_from_value_integer!(i8, i16, i32, u8, u16, u32, u64, usize);

impl FromValue for bool {
    fn from_value(value: Value) -> Result<Self> {
        Ok(i64::from_value(value)? != 0)
    }
}

impl FromValue for f64 {
    fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Real(r) => Ok(r),
            Value::Integer(i) => Ok(i as f64),
            other => Err(mismatch("REAL", &other)),
        }
    }
}

impl FromValue for f32 {
    fn from_value(value: Value) -> Result<Self> {
        Ok(f64::from_value(value)? as f32)
    }
}

impl FromValue for String {
    fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Text(s) => Ok(s),
            Value::Blob(b) => String::from_utf8(b).map_err(|e| DrmError::Mapping(e.to_string())),
            other => Err(mismatch("TEXT", &other)),
        }
    }
}

impl FromValue for Vec<u8> {
    fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Blob(b) => Ok(b),
            Value::Text(s) => Ok(s.into_bytes()),
            other => Err(mismatch("BLOB", &other)),
        }
    }
}

impl<T: FromValue> FromValue for Option<T> {
    fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Null => Ok(None),
            other => T::from_value(other).map(Some),
        }
    }
}

//------------------------------------------------------------------------------
// Database Driver Implementations
//------------------------------------------------------------------------------

#[cfg(feature = "rusqlite")]
impl rusqlite::ToSql for Value {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        let output = match self {
            Value::Null => ToSqlOutput::Owned(rusqlite::types::Value::Null),
            Value::Integer(i) => ToSqlOutput::Owned(rusqlite::types::Value::Integer(*i)),
            Value::Real(f) => ToSqlOutput::Owned(rusqlite::types::Value::Real(*f)),
            Value::Text(s) => ToSqlOutput::Borrowed(ValueRef::Text(s.as_bytes())),
            Value::Blob(b) => ToSqlOutput::Borrowed(ValueRef::Blob(b.as_ref())),
        };
        Ok(output)
    }
}

#[cfg(feature = "rusqlite")]
impl FromSql for Value {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        Ok(Value::from(value))
    }
}

#[cfg(feature = "rusqlite")]
impl From<ValueRef<'_>> for Value {
    fn from(value: ValueRef<'_>) -> Self {
        match value {
            ValueRef::Null => Value::Null,
            ValueRef::Integer(i) => Value::Integer(i),
            ValueRef::Real(r) => Value::Real(r),
            ValueRef::Text(items) => Value::Text(String::from_utf8_lossy(items).into_owned()),
            ValueRef::Blob(items) => Value::Blob(items.to_vec()),
        }
    }
}
