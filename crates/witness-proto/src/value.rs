//! Values stored in a [`DataWrapper`](crate::DataWrapper).

use chrono::{DateTime, Utc};

use crate::wrapper::DataWrapper;

/// A record value: a primitive, a nested wrapper, or an ordered list.
#[derive(Debug, Clone, PartialEq)]
pub enum DataValue {
    /// Boolean value.
    Bool(bool),
    /// 64-bit signed integer.
    Int(i64),
    /// 64-bit floating point.
    Float(f64),
    /// UTF-8 string.
    String(String),
    /// Point in time.
    Timestamp(DateTime<Utc>),
    /// Nested record.
    Wrapper(DataWrapper),
    /// Ordered list of values.
    List(Vec<DataValue>),
}

impl DataValue {
    /// Check if this value is a primitive (not a wrapper or list).
    pub fn is_primitive(&self) -> bool {
        !matches!(self, DataValue::Wrapper(_) | DataValue::List(_))
    }

    /// Check if this value is numeric.
    pub fn is_numeric(&self) -> bool {
        matches!(self, DataValue::Int(_) | DataValue::Float(_))
    }

    /// Name of the variant, for diagnostics.
    pub fn type_name(&self) -> &'static str {
        match self {
            DataValue::Bool(_) => "bool",
            DataValue::Int(_) => "int",
            DataValue::Float(_) => "float",
            DataValue::String(_) => "string",
            DataValue::Timestamp(_) => "timestamp",
            DataValue::Wrapper(_) => "wrapper",
            DataValue::List(_) => "list",
        }
    }

    /// Try to get as bool.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            DataValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Try to get as i64.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            DataValue::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// Try to get as f64, widening integers.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            DataValue::Float(f) => Some(*f),
            DataValue::Int(i) => Some(*i as f64),
            _ => None,
        }
    }

    /// Try to get as string reference.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            DataValue::String(s) => Some(s),
            _ => None,
        }
    }

    /// Try to get as timestamp.
    pub fn as_timestamp(&self) -> Option<DateTime<Utc>> {
        match self {
            DataValue::Timestamp(t) => Some(*t),
            _ => None,
        }
    }

    /// Try to get as nested wrapper.
    pub fn as_wrapper(&self) -> Option<&DataWrapper> {
        match self {
            DataValue::Wrapper(w) => Some(w),
            _ => None,
        }
    }

    /// Try to get as list.
    pub fn as_list(&self) -> Option<&[DataValue]> {
        match self {
            DataValue::List(l) => Some(l),
            _ => None,
        }
    }
}

impl From<bool> for DataValue {
    fn from(v: bool) -> Self {
        DataValue::Bool(v)
    }
}

impl From<i32> for DataValue {
    fn from(v: i32) -> Self {
        DataValue::Int(v as i64)
    }
}

impl From<i64> for DataValue {
    fn from(v: i64) -> Self {
        DataValue::Int(v)
    }
}

impl From<u32> for DataValue {
    fn from(v: u32) -> Self {
        DataValue::Int(v as i64)
    }
}

impl From<f64> for DataValue {
    fn from(v: f64) -> Self {
        DataValue::Float(v)
    }
}

impl From<String> for DataValue {
    fn from(v: String) -> Self {
        DataValue::String(v)
    }
}

impl From<&str> for DataValue {
    fn from(v: &str) -> Self {
        DataValue::String(v.to_string())
    }
}

impl From<DateTime<Utc>> for DataValue {
    fn from(v: DateTime<Utc>) -> Self {
        DataValue::Timestamp(v)
    }
}

impl From<DataWrapper> for DataValue {
    fn from(v: DataWrapper) -> Self {
        DataValue::Wrapper(v)
    }
}

impl From<uuid::Uuid> for DataValue {
    fn from(v: uuid::Uuid) -> Self {
        DataValue::String(v.to_string())
    }
}

impl<T: Into<DataValue>> From<Vec<T>> for DataValue {
    fn from(v: Vec<T>) -> Self {
        DataValue::List(v.into_iter().map(Into::into).collect())
    }
}
