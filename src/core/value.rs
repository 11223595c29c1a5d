// Copyright 2025 Sqlbind Contributors
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Value type for Sqlbind - runtime values with type information
//!
//! Parameter objects handed to statements and row objects materialized from
//! result sets are both represented by the [`Value`] sum type. Property
//! traversal over values lives in [`crate::core::meta`].

use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};

use super::error::{Error, Result};
use super::lazy::LazyObject;

/// Property map backing [`Value::Object`]
///
/// A BTreeMap keeps property iteration deterministic, which row-key
/// digesting over mapped columns relies on.
pub type ObjectMap = BTreeMap<String, Value>;

/// The data type of a [`Value`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DataType {
    Null,
    Boolean,
    Integer,
    Float,
    Text,
    Bytes,
    Timestamp,
    Array,
    Object,
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DataType::Null => "Null",
            DataType::Boolean => "Boolean",
            DataType::Integer => "Integer",
            DataType::Float => "Float",
            DataType::Text => "Text",
            DataType::Bytes => "Bytes",
            DataType::Timestamp => "Timestamp",
            DataType::Array => "Array",
            DataType::Object => "Object",
        };
        f.write_str(name)
    }
}

/// A runtime value with type information
///
/// Each variant carries its data directly. Text and Bytes use `Arc` for
/// cheap cloning during row materialization; both are immutable, so sharing
/// is never observable.
#[derive(Debug, Clone)]
pub enum Value {
    /// NULL value
    Null,

    /// Boolean value
    Boolean(bool),

    /// 64-bit signed integer
    Integer(i64),

    /// 64-bit floating point
    Float(f64),

    /// UTF-8 text string (Arc for cheap cloning)
    Text(Arc<str>),

    /// Raw bytes (Arc for cheap cloning)
    Bytes(Arc<[u8]>),

    /// Timestamp (UTC)
    Timestamp(DateTime<Utc>),

    /// Ordered collection of values
    Array(Vec<Value>),

    /// Keyed property bag - parameter maps and materialized row objects
    Object(ObjectMap),

    /// A materialized object with pending lazy-loaded properties
    Lazy(Arc<LazyObject>),
}

impl Value {
    // =========================================================================
    // Constructors
    // =========================================================================

    /// Create a text value
    pub fn text(value: impl Into<String>) -> Self {
        Value::Text(Arc::from(value.into().as_str()))
    }

    /// Create a bytes value
    pub fn bytes(value: impl Into<Vec<u8>>) -> Self {
        Value::Bytes(Arc::from(value.into().into_boxed_slice()))
    }

    /// Create an object value from a property map
    pub fn object(map: ObjectMap) -> Self {
        Value::Object(map)
    }

    /// Create an empty object value
    pub fn empty_object() -> Self {
        Value::Object(ObjectMap::new())
    }

    /// Create an array value
    pub fn array(items: Vec<Value>) -> Self {
        Value::Array(items)
    }

    // =========================================================================
    // Type accessors
    // =========================================================================

    /// Returns the data type of this value
    pub fn data_type(&self) -> DataType {
        match self {
            Value::Null => DataType::Null,
            Value::Boolean(_) => DataType::Boolean,
            Value::Integer(_) => DataType::Integer,
            Value::Float(_) => DataType::Float,
            Value::Text(_) => DataType::Text,
            Value::Bytes(_) => DataType::Bytes,
            Value::Timestamp(_) => DataType::Timestamp,
            Value::Array(_) => DataType::Array,
            Value::Object(_) | Value::Lazy(_) => DataType::Object,
        }
    }

    /// Returns true if this value is NULL
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Returns true if this value is a simple (non-composite) type
    pub fn is_simple(&self) -> bool {
        !matches!(self, Value::Array(_) | Value::Object(_) | Value::Lazy(_))
    }

    // =========================================================================
    // Value extractors
    // =========================================================================

    /// Extract as i64, with type coercion
    pub fn as_int64(&self) -> Option<i64> {
        match self {
            Value::Integer(v) => Some(*v),
            Value::Float(v) => Some(*v as i64),
            Value::Boolean(b) => Some(i64::from(*b)),
            Value::Text(s) => s.parse::<i64>().ok(),
            Value::Timestamp(t) => Some(t.timestamp_millis()),
            _ => None,
        }
    }

    /// Extract as f64, with type coercion
    pub fn as_float64(&self) -> Option<f64> {
        match self {
            Value::Integer(v) => Some(*v as f64),
            Value::Float(v) => Some(*v),
            Value::Boolean(b) => Some(if *b { 1.0 } else { 0.0 }),
            Value::Text(s) => s.parse::<f64>().ok(),
            _ => None,
        }
    }

    /// Extract as boolean, with type coercion
    pub fn as_boolean(&self) -> Option<bool> {
        match self {
            Value::Boolean(b) => Some(*b),
            Value::Integer(v) => Some(*v != 0),
            Value::Float(v) => Some(*v != 0.0),
            Value::Text(s) => {
                let s_ref: &str = s.as_ref();
                if s_ref.eq_ignore_ascii_case("true") || s_ref == "1" {
                    Some(true)
                } else if s_ref.eq_ignore_ascii_case("false") || s_ref == "0" {
                    Some(false)
                } else {
                    None
                }
            }
            _ => None,
        }
    }

    /// Extract as String, with type coercion
    pub fn as_string(&self) -> Option<String> {
        match self {
            Value::Null => None,
            Value::Boolean(b) => Some(if *b { "true" } else { "false" }.to_string()),
            Value::Integer(v) => Some(v.to_string()),
            Value::Float(v) => Some(v.to_string()),
            Value::Text(s) => Some(s.to_string()),
            Value::Timestamp(t) => Some(t.to_rfc3339()),
            _ => None,
        }
    }

    /// Extract as string reference (avoids clone for Text)
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Extract as array slice
    pub fn as_array(&self) -> Option<&[Value]> {
        match self {
            Value::Array(items) => Some(items),
            _ => None,
        }
    }

    /// Extract as object map
    pub fn as_object(&self) -> Option<&ObjectMap> {
        match self {
            Value::Object(map) => Some(map),
            _ => None,
        }
    }

    /// Number of elements for Array, properties for Object, 0 otherwise
    pub fn len(&self) -> usize {
        match self {
            Value::Array(items) => items.len(),
            Value::Object(map) => map.len(),
            Value::Lazy(lazy) => lazy.field_count(),
            _ => 0,
        }
    }

    /// Returns true for an empty Array or Object, false otherwise
    pub fn is_empty(&self) -> bool {
        matches!(self, Value::Array(_) | Value::Object(_) | Value::Lazy(_)) && self.len() == 0
    }

    /// Compare two values for ordering, coercing numerics
    ///
    /// NULL sorts before everything. Incomparable types return None.
    pub fn partial_cmp_value(&self, other: &Value) -> Option<Ordering> {
        match (self, other) {
            (Value::Null, Value::Null) => Some(Ordering::Equal),
            (Value::Null, _) => Some(Ordering::Less),
            (_, Value::Null) => Some(Ordering::Greater),
            (Value::Integer(a), Value::Integer(b)) => Some(a.cmp(b)),
            (Value::Float(a), Value::Float(b)) => a.partial_cmp(b),
            (Value::Integer(a), Value::Float(b)) => (*a as f64).partial_cmp(b),
            (Value::Float(a), Value::Integer(b)) => a.partial_cmp(&(*b as f64)),
            (Value::Text(a), Value::Text(b)) => Some(a.cmp(b)),
            (Value::Boolean(a), Value::Boolean(b)) => Some(a.cmp(b)),
            (Value::Timestamp(a), Value::Timestamp(b)) => Some(a.cmp(b)),
            _ => None,
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Boolean(a), Value::Boolean(b)) => a == b,
            (Value::Integer(a), Value::Integer(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a == b,
            (Value::Integer(a), Value::Float(b)) | (Value::Float(b), Value::Integer(a)) => {
                (*a as f64) == *b
            }
            (Value::Text(a), Value::Text(b)) => a == b,
            (Value::Bytes(a), Value::Bytes(b)) => a == b,
            (Value::Timestamp(a), Value::Timestamp(b)) => a == b,
            (Value::Array(a), Value::Array(b)) => a == b,
            (Value::Object(a), Value::Object(b)) => a == b,
            (Value::Lazy(a), Value::Lazy(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl fmt::Display for Value {
    /// Renders the value the way `${}` substitution splices it into SQL:
    /// text without quotes, NULL as the empty string.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => Ok(()),
            Value::Boolean(b) => write!(f, "{}", b),
            Value::Integer(v) => write!(f, "{}", v),
            Value::Float(v) => write!(f, "{}", v),
            Value::Text(s) => f.write_str(s),
            Value::Bytes(b) => write!(f, "{:?}", b),
            Value::Timestamp(t) => f.write_str(&t.to_rfc3339()),
            Value::Array(items) => {
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                Ok(())
            }
            Value::Object(_) | Value::Lazy(_) => f.write_str("[object]"),
        }
    }
}

// =============================================================================
// Conversions into Value
// =============================================================================

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Integer(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Integer(v as i64)
    }
}

impl From<u32> for Value {
    fn from(v: u32) -> Self {
        Value::Integer(v as i64)
    }
}

impl From<usize> for Value {
    fn from(v: usize) -> Self {
        Value::Integer(v as i64)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Boolean(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(Arc::from(v))
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Text(Arc::from(v.as_str()))
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(v: DateTime<Utc>) -> Self {
        Value::Timestamp(v)
    }
}

impl From<Vec<Value>> for Value {
    fn from(v: Vec<Value>) -> Self {
        Value::Array(v)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        match v {
            Some(inner) => inner.into(),
            None => Value::Null,
        }
    }
}

// =============================================================================
// Typed extraction out of Value
// =============================================================================

/// Trait for converting a mapped [`Value`] into a declared Rust type
///
/// Used by the session API and mapper-method return coercion to turn mapped
/// row objects or scalar columns into the caller's declared shape.
pub trait FromValue: Sized {
    /// Convert a value into Self
    fn from_value(value: &Value) -> Result<Self>;
}

impl FromValue for Value {
    fn from_value(value: &Value) -> Result<Self> {
        Ok(value.clone())
    }
}

impl FromValue for i64 {
    fn from_value(value: &Value) -> Result<Self> {
        value
            .as_int64()
            .ok_or_else(|| Error::type_conversion(value.data_type().to_string(), "Integer"))
    }
}

impl FromValue for i32 {
    fn from_value(value: &Value) -> Result<Self> {
        let v = i64::from_value(value)?;
        i32::try_from(v).map_err(|_| Error::type_conversion("Integer", "i32"))
    }
}

impl FromValue for f64 {
    fn from_value(value: &Value) -> Result<Self> {
        value
            .as_float64()
            .ok_or_else(|| Error::type_conversion(value.data_type().to_string(), "Float"))
    }
}

impl FromValue for bool {
    fn from_value(value: &Value) -> Result<Self> {
        value
            .as_boolean()
            .ok_or_else(|| Error::type_conversion(value.data_type().to_string(), "Boolean"))
    }
}

impl FromValue for String {
    fn from_value(value: &Value) -> Result<Self> {
        value
            .as_string()
            .ok_or_else(|| Error::type_conversion(value.data_type().to_string(), "Text"))
    }
}

impl FromValue for DateTime<Utc> {
    fn from_value(value: &Value) -> Result<Self> {
        match value {
            Value::Timestamp(t) => Ok(*t),
            Value::Text(s) => s
                .parse::<DateTime<Utc>>()
                .map_err(|_| Error::type_conversion("Text", "Timestamp")),
            other => Err(Error::type_conversion(
                other.data_type().to_string(),
                "Timestamp",
            )),
        }
    }
}

impl<T: FromValue> FromValue for Option<T> {
    fn from_value(value: &Value) -> Result<Self> {
        if value.is_null() {
            Ok(None)
        } else {
            T::from_value(value).map(Some)
        }
    }
}

impl<T: FromValue> FromValue for Vec<T> {
    fn from_value(value: &Value) -> Result<Self> {
        match value {
            Value::Array(items) => items.iter().map(T::from_value).collect(),
            Value::Null => Ok(Vec::new()),
            other => Ok(vec![T::from_value(other)?]),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_value_types() {
        assert_eq!(Value::Null.data_type(), DataType::Null);
        assert_eq!(Value::Integer(1).data_type(), DataType::Integer);
        assert_eq!(Value::text("x").data_type(), DataType::Text);
        assert_eq!(Value::empty_object().data_type(), DataType::Object);
        assert!(Value::Null.is_null());
        assert!(!Value::Integer(0).is_null());
        assert!(Value::Integer(0).is_simple());
        assert!(!Value::array(vec![]).is_simple());
    }

    #[test]
    fn test_coercions() {
        assert_eq!(Value::text("42").as_int64(), Some(42));
        assert_eq!(Value::Integer(1).as_boolean(), Some(true));
        assert_eq!(Value::Float(2.5).as_string().as_deref(), Some("2.5"));
        assert_eq!(Value::text("true").as_boolean(), Some(true));
        assert_eq!(Value::Null.as_int64(), None);
    }

    #[test]
    fn test_numeric_equality_across_variants() {
        assert_eq!(Value::Integer(2), Value::Float(2.0));
        assert_ne!(Value::Integer(2), Value::Float(2.5));
    }

    #[test]
    fn test_display_is_substitution_form() {
        assert_eq!(Value::text("O'Brien").to_string(), "O'Brien");
        assert_eq!(Value::Integer(7).to_string(), "7");
        assert_eq!(Value::Null.to_string(), "");
        assert_eq!(
            Value::array(vec![Value::Integer(1), Value::Integer(2)]).to_string(),
            "1, 2"
        );
    }

    #[test]
    fn test_from_value_round_trips() {
        assert_eq!(i64::from_value(&Value::Integer(9)).unwrap(), 9);
        assert_eq!(String::from_value(&Value::text("hi")).unwrap(), "hi");
        assert_eq!(Option::<i64>::from_value(&Value::Null).unwrap(), None);
        assert_eq!(
            Option::<i64>::from_value(&Value::Integer(3)).unwrap(),
            Some(3)
        );
        assert!(i64::from_value(&Value::empty_object()).is_err());
    }
}
