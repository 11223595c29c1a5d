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

//! Type handlers: driver value <-> host value conversion
//!
//! A handler owns one host data type: it binds parameters of that type onto
//! prepared statements and converts result-set columns back. The `Unknown`
//! handler passes driver values through untouched and is the fallback when
//! nothing more specific is registered.

use chrono::{DateTime, Utc};

use crate::core::{DataType, Error, Result, Value};
use crate::driver::{PreparedStatement, ResultSet};

use super::jdbc::JdbcType;

/// Column reference for result extraction
#[derive(Debug, Clone, Copy)]
pub enum ColumnRef<'a> {
    /// 1-based column index
    Index(usize),
    /// Column label
    Label(&'a str),
}

/// Converts between driver values and one host data type
pub trait TypeHandler: Send + Sync {
    /// The host type this handler produces
    fn data_type(&self) -> DataType;

    /// Bind `value` at the 1-based `index`
    ///
    /// NULL binds through the statement's typed NULL setter using the
    /// mapping's JDBC type hint when present.
    fn set_parameter(
        &self,
        statement: &mut dyn PreparedStatement,
        index: usize,
        value: &Value,
        jdbc_type: Option<JdbcType>,
    ) -> Result<()> {
        if value.is_null() {
            return statement.set_null(index, jdbc_type.unwrap_or(JdbcType::Null));
        }
        statement.set_parameter(index, self.convert(value)?)
    }

    /// Read and convert the referenced column of the current row
    fn get_result(&self, result_set: &dyn ResultSet, column: ColumnRef<'_>) -> Result<Value> {
        let raw = match column {
            ColumnRef::Index(index) => result_set.get_by_index(index)?,
            ColumnRef::Label(label) => result_set.get_by_label(label)?,
        };
        if raw.is_null() {
            return Ok(Value::Null);
        }
        self.convert(&raw)
    }

    /// Coerce a raw value into this handler's host type
    fn convert(&self, value: &Value) -> Result<Value>;
}

fn conversion_error(value: &Value, to: DataType) -> Error {
    Error::type_conversion(value.data_type().to_string(), to.to_string())
}

/// Boolean host type
pub struct BooleanTypeHandler;

impl TypeHandler for BooleanTypeHandler {
    fn data_type(&self) -> DataType {
        DataType::Boolean
    }

    fn convert(&self, value: &Value) -> Result<Value> {
        value
            .as_boolean()
            .map(Value::Boolean)
            .ok_or_else(|| conversion_error(value, DataType::Boolean))
    }
}

/// 64-bit integer host type
pub struct IntegerTypeHandler;

impl TypeHandler for IntegerTypeHandler {
    fn data_type(&self) -> DataType {
        DataType::Integer
    }

    fn convert(&self, value: &Value) -> Result<Value> {
        value
            .as_int64()
            .map(Value::Integer)
            .ok_or_else(|| conversion_error(value, DataType::Integer))
    }
}

/// 64-bit float host type
pub struct FloatTypeHandler;

impl TypeHandler for FloatTypeHandler {
    fn data_type(&self) -> DataType {
        DataType::Float
    }

    fn convert(&self, value: &Value) -> Result<Value> {
        value
            .as_float64()
            .map(Value::Float)
            .ok_or_else(|| conversion_error(value, DataType::Float))
    }
}

/// Text host type
pub struct StringTypeHandler;

impl TypeHandler for StringTypeHandler {
    fn data_type(&self) -> DataType {
        DataType::Text
    }

    fn convert(&self, value: &Value) -> Result<Value> {
        value
            .as_string()
            .map(Value::text)
            .ok_or_else(|| conversion_error(value, DataType::Text))
    }
}

/// Timestamp host type
pub struct TimestampTypeHandler;

impl TypeHandler for TimestampTypeHandler {
    fn data_type(&self) -> DataType {
        DataType::Timestamp
    }

    fn convert(&self, value: &Value) -> Result<Value> {
        match value {
            Value::Timestamp(t) => Ok(Value::Timestamp(*t)),
            Value::Integer(millis) => DateTime::<Utc>::from_timestamp_millis(*millis)
                .map(Value::Timestamp)
                .ok_or_else(|| conversion_error(value, DataType::Timestamp)),
            Value::Text(s) => s
                .parse::<DateTime<Utc>>()
                .map(Value::Timestamp)
                .map_err(|_| conversion_error(value, DataType::Timestamp)),
            other => Err(conversion_error(other, DataType::Timestamp)),
        }
    }
}

/// Raw bytes host type
pub struct BytesTypeHandler;

impl TypeHandler for BytesTypeHandler {
    fn data_type(&self) -> DataType {
        DataType::Bytes
    }

    fn convert(&self, value: &Value) -> Result<Value> {
        match value {
            Value::Bytes(b) => Ok(Value::Bytes(b.clone())),
            Value::Text(s) => Ok(Value::bytes(s.as_bytes().to_vec())),
            other => Err(conversion_error(other, DataType::Bytes)),
        }
    }
}

/// Passthrough handler: the driver value is the host value
pub struct UnknownTypeHandler;

impl TypeHandler for UnknownTypeHandler {
    fn data_type(&self) -> DataType {
        DataType::Object
    }

    fn convert(&self, value: &Value) -> Result<Value> {
        Ok(value.clone())
    }
}
