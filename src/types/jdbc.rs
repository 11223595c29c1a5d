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

//! JDBC type codes
//!
//! The driver-facing type vocabulary used by `#{..., jdbcType=...}` options,
//! NULL parameter binding and result-set column metadata.

use std::fmt;
use std::str::FromStr;

use crate::core::{DataType, Error};

/// JDBC column/parameter type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum JdbcType {
    Bit,
    TinyInt,
    SmallInt,
    Integer,
    BigInt,
    Float,
    Real,
    Double,
    Numeric,
    Decimal,
    Char,
    Varchar,
    LongVarchar,
    Date,
    Time,
    Timestamp,
    Binary,
    VarBinary,
    LongVarBinary,
    Blob,
    Clob,
    Boolean,
    Null,
    Cursor,
    Array,
    Other,
}

impl JdbcType {
    /// The natural host data type for a column of this JDBC type
    pub fn data_type(&self) -> DataType {
        match self {
            JdbcType::Bit | JdbcType::Boolean => DataType::Boolean,
            JdbcType::TinyInt | JdbcType::SmallInt | JdbcType::Integer | JdbcType::BigInt => {
                DataType::Integer
            }
            JdbcType::Float
            | JdbcType::Real
            | JdbcType::Double
            | JdbcType::Numeric
            | JdbcType::Decimal => DataType::Float,
            JdbcType::Char | JdbcType::Varchar | JdbcType::LongVarchar | JdbcType::Clob => {
                DataType::Text
            }
            JdbcType::Date | JdbcType::Time | JdbcType::Timestamp => DataType::Timestamp,
            JdbcType::Binary | JdbcType::VarBinary | JdbcType::LongVarBinary | JdbcType::Blob => {
                DataType::Bytes
            }
            JdbcType::Null => DataType::Null,
            JdbcType::Array => DataType::Array,
            JdbcType::Cursor | JdbcType::Other => DataType::Object,
        }
    }
}

impl fmt::Display for JdbcType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

impl FromStr for JdbcType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "BIT" => Ok(JdbcType::Bit),
            "TINYINT" => Ok(JdbcType::TinyInt),
            "SMALLINT" => Ok(JdbcType::SmallInt),
            "INTEGER" | "INT" => Ok(JdbcType::Integer),
            "BIGINT" => Ok(JdbcType::BigInt),
            "FLOAT" => Ok(JdbcType::Float),
            "REAL" => Ok(JdbcType::Real),
            "DOUBLE" => Ok(JdbcType::Double),
            "NUMERIC" => Ok(JdbcType::Numeric),
            "DECIMAL" => Ok(JdbcType::Decimal),
            "CHAR" => Ok(JdbcType::Char),
            "VARCHAR" => Ok(JdbcType::Varchar),
            "LONGVARCHAR" => Ok(JdbcType::LongVarchar),
            "DATE" => Ok(JdbcType::Date),
            "TIME" => Ok(JdbcType::Time),
            "TIMESTAMP" => Ok(JdbcType::Timestamp),
            "BINARY" => Ok(JdbcType::Binary),
            "VARBINARY" => Ok(JdbcType::VarBinary),
            "LONGVARBINARY" => Ok(JdbcType::LongVarBinary),
            "BLOB" => Ok(JdbcType::Blob),
            "CLOB" => Ok(JdbcType::Clob),
            "BOOLEAN" => Ok(JdbcType::Boolean),
            "NULL" => Ok(JdbcType::Null),
            "CURSOR" => Ok(JdbcType::Cursor),
            "ARRAY" => Ok(JdbcType::Array),
            "OTHER" => Ok(JdbcType::Other),
            other => Err(Error::configuration(format!(
                "unknown jdbcType '{}'",
                other
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_round_trip() {
        assert_eq!("VARCHAR".parse::<JdbcType>().unwrap(), JdbcType::Varchar);
        assert_eq!("integer".parse::<JdbcType>().unwrap(), JdbcType::Integer);
        assert!("NOPE".parse::<JdbcType>().is_err());
    }

    #[test]
    fn test_natural_host_types() {
        assert_eq!(JdbcType::Varchar.data_type(), DataType::Text);
        assert_eq!(JdbcType::BigInt.data_type(), DataType::Integer);
        assert_eq!(JdbcType::Timestamp.data_type(), DataType::Timestamp);
    }
}
