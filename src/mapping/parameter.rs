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

//! Parameter mapping descriptors
//!
//! One [`ParameterMapping`] describes one `#{...}` placeholder: the property
//! path it reads, type hints, the parameter mode and the handler that binds
//! it.

use std::str::FromStr;

use crate::core::{DataType, Error, Result};
use crate::types::JdbcType;

/// Direction of a statement parameter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ParameterMode {
    #[default]
    In,
    Out,
    InOut,
}

impl FromStr for ParameterMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_uppercase().as_str() {
            "IN" => Ok(ParameterMode::In),
            "OUT" => Ok(ParameterMode::Out),
            "INOUT" => Ok(ParameterMode::InOut),
            other => Err(Error::configuration(format!(
                "unknown parameter mode '{}'",
                other
            ))),
        }
    }
}

/// Descriptor of one `#{...}` placeholder
#[derive(Debug, Clone, PartialEq)]
pub struct ParameterMapping {
    /// Property path read from the parameter object
    pub property: String,
    /// Declared host type (`javaType=` option)
    pub data_type: Option<DataType>,
    /// Declared JDBC type (`jdbcType=` option)
    pub jdbc_type: Option<JdbcType>,
    /// Named type handler override (`typeHandler=` option)
    pub type_handler: Option<String>,
    /// Parameter direction (`mode=` option)
    pub mode: ParameterMode,
    /// Numeric scale for OUT decimals (`numericScale=` option)
    pub numeric_scale: Option<u32>,
    /// Result map for OUT cursor parameters (`resultMap=` option)
    pub result_map_id: Option<String>,
    /// Driver type name for OUT struct/array parameters
    pub jdbc_type_name: Option<String>,
}

impl ParameterMapping {
    /// Create an IN mapping for a property with an optional host type
    pub fn new(property: impl Into<String>, data_type: Option<DataType>) -> Self {
        Self {
            property: property.into(),
            data_type,
            jdbc_type: None,
            type_handler: None,
            mode: ParameterMode::In,
            numeric_scale: None,
            result_map_id: None,
            jdbc_type_name: None,
        }
    }

    /// Parse a `#{...}` placeholder body: `property[,option=value]*`
    ///
    /// Recognized options: `javaType`, `jdbcType`, `mode`, `typeHandler`,
    /// `numericScale`, `resultMap`, `jdbcTypeName`. Unknown options are a
    /// placeholder parse error.
    pub fn from_placeholder(content: &str) -> Result<Self> {
        let mut parts = content.split(',');
        let property = parts
            .next()
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .ok_or_else(|| Error::PlaceholderParse(content.to_string()))?;
        let mut mapping = ParameterMapping::new(property, None);

        for option in parts {
            let (name, value) = option
                .split_once('=')
                .map(|(n, v)| (n.trim(), v.trim()))
                .ok_or_else(|| Error::PlaceholderParse(content.to_string()))?;
            match name {
                "javaType" => mapping.data_type = Some(parse_data_type(value)?),
                "jdbcType" => mapping.jdbc_type = Some(value.parse()?),
                "mode" => mapping.mode = value.parse()?,
                "typeHandler" => mapping.type_handler = Some(value.to_string()),
                "numericScale" => {
                    mapping.numeric_scale = Some(
                        value
                            .parse()
                            .map_err(|_| Error::PlaceholderParse(content.to_string()))?,
                    )
                }
                "resultMap" => mapping.result_map_id = Some(value.to_string()),
                "jdbcTypeName" => mapping.jdbc_type_name = Some(value.to_string()),
                _ => return Err(Error::PlaceholderParse(content.to_string())),
            }
        }
        Ok(mapping)
    }

    /// True unless this is an OUT-only parameter
    pub fn is_input(&self) -> bool {
        self.mode != ParameterMode::Out
    }

    /// True for OUT or INOUT parameters
    pub fn is_output(&self) -> bool {
        self.mode != ParameterMode::In
    }
}

/// Parse a `javaType=` option value
pub fn parse_data_type(name: &str) -> Result<DataType> {
    match name.to_ascii_lowercase().as_str() {
        "boolean" | "bool" => Ok(DataType::Boolean),
        "int" | "integer" | "long" | "i64" => Ok(DataType::Integer),
        "float" | "double" | "f64" => Ok(DataType::Float),
        "string" | "str" | "text" => Ok(DataType::Text),
        "bytes" | "byte[]" => Ok(DataType::Bytes),
        "date" | "timestamp" | "datetime" => Ok(DataType::Timestamp),
        "list" | "array" | "collection" => Ok(DataType::Array),
        "map" | "object" | "hashmap" => Ok(DataType::Object),
        other => Err(Error::UnknownTypeAlias(other.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_property() {
        let mapping = ParameterMapping::from_placeholder("author.username").unwrap();
        assert_eq!(mapping.property, "author.username");
        assert_eq!(mapping.mode, ParameterMode::In);
        assert_eq!(mapping.jdbc_type, None);
    }

    #[test]
    fn test_options_parsed() {
        let mapping = ParameterMapping::from_placeholder(
            "balance, javaType=float, jdbcType=NUMERIC, numericScale=2, mode=INOUT",
        )
        .unwrap();
        assert_eq!(mapping.property, "balance");
        assert_eq!(mapping.data_type, Some(DataType::Float));
        assert_eq!(mapping.jdbc_type, Some(JdbcType::Numeric));
        assert_eq!(mapping.numeric_scale, Some(2));
        assert_eq!(mapping.mode, ParameterMode::InOut);
        assert!(mapping.is_input());
        assert!(mapping.is_output());
    }

    #[test]
    fn test_out_cursor() {
        let mapping =
            ParameterMapping::from_placeholder("rows, mode=OUT, jdbcType=CURSOR, resultMap=postMap")
                .unwrap();
        assert!(!mapping.is_input());
        assert_eq!(mapping.result_map_id.as_deref(), Some("postMap"));
    }

    #[test]
    fn test_malformed_placeholder() {
        assert!(ParameterMapping::from_placeholder("").is_err());
        assert!(ParameterMapping::from_placeholder("x, badoption").is_err());
        assert!(ParameterMapping::from_placeholder("x, nope=1").is_err());
    }
}
