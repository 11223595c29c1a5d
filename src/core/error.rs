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

//! Error types for Sqlbind
//!
//! This module defines all error kinds surfaced by the mapping engine:
//! configuration, binding, executor, result-map, driver and transaction
//! failures. Errors are values, never control flow.

use thiserror::Error;

/// Result type alias for Sqlbind operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for Sqlbind operations
///
/// This enum covers all error cases, both sentinel errors and structured
/// errors with context. Driver failures preserve the SQLSTATE when the
/// driver reports one.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    // =========================================================================
    // Configuration errors
    // =========================================================================
    /// A `<settings>` entry used a name the engine does not know
    #[error("unknown setting '{0}'")]
    UnknownSetting(String),

    /// A statement id was registered twice
    #[error("statement '{0}' is already registered")]
    DuplicateStatement(String),

    /// A mapper namespace was registered twice
    #[error("namespace '{0}' is already registered")]
    DuplicateNamespace(String),

    /// A `<cache-ref>` points at a namespace with no cache
    #[error("cache-ref to unknown namespace '{0}'")]
    CacheRefNotFound(String),

    /// A result map references nested result maps that were never loaded
    #[error("result map '{0}' references unresolved nested result maps")]
    UnresolvedResultMap(String),

    /// A result mapping declared both a nested query and a nested result map
    #[error("result mapping for '{property}' declares both a nested select and a nested result map")]
    ConflictingNesting { property: String },

    /// A `#{...}` placeholder body could not be parsed
    #[error("could not parse parameter expression '{0}'")]
    PlaceholderParse(String),

    /// A type alias could not be resolved
    #[error("type alias '{0}' is not registered")]
    UnknownTypeAlias(String),

    /// Malformed mapper or configuration document
    #[error("malformed document: {0}")]
    Malformed(String),

    /// Generic configuration error
    #[error("configuration error: {0}")]
    Configuration(String),

    // =========================================================================
    // Binding errors
    // =========================================================================
    /// No mapped statement registered under the requested id
    #[error("mapped statement '{0}' not found")]
    StatementNotFound(String),

    /// A mapper method could not be resolved to a statement
    #[error("mapper method '{namespace}.{method}' could not be resolved")]
    MethodNotResolved { namespace: String, method: String },

    /// A named parameter was not supplied by the caller
    #[error("parameter '{name}' not found, available parameters are [{available}]")]
    ParameterNotFound { name: String, available: String },

    /// The argument vector could not be coerced to the statement's parameters
    #[error("ambiguous parameter binding: {0}")]
    AmbiguousParameter(String),

    // =========================================================================
    // Executor errors
    // =========================================================================
    /// The executor was closed and cannot run statements
    #[error("executor was closed")]
    ExecutorClosed,

    /// Commit or rollback was requested on a closed executor
    #[error("cannot {operation} on a closed executor")]
    TransactionClosed { operation: &'static str },

    /// Two result sets in a multi-result-set statement share a name
    #[error("duplicate result set name '{0}'")]
    DuplicateResultSet(String),

    /// No declared constructor matched the result columns
    #[error("no constructor of '{type_name}' matches the {columns} result columns")]
    ConstructorMismatch { type_name: String, columns: usize },

    /// Callable OUT parameters cannot be staged into the shared cache
    #[error("caching of callable OUT parameters is not supported")]
    OutParamsNotCacheable,

    /// A single-row statement produced more than one row
    #[error("expected one row, but the statement returned {0}")]
    TooManyRows(usize),

    // =========================================================================
    // Result-map errors
    // =========================================================================
    /// No type handler registered for a column/type pair
    #[error("no type handler for column '{column}' of type {type_name}")]
    MissingTypeHandler { column: String, type_name: String },

    /// Extracting a value from a driver row failed
    #[error("error extracting row value: {0}")]
    RowValue(String),

    // =========================================================================
    // Driver errors
    // =========================================================================
    /// Wrap of a driver-level failure, preserving the SQLSTATE when known
    #[error("driver error: {message}")]
    Driver {
        message: String,
        sqlstate: Option<String>,
    },

    // =========================================================================
    // Expression and conversion errors
    // =========================================================================
    /// Expression evaluation or parse failure
    #[error("expression error: {0}")]
    Expression(String),

    /// Type conversion error
    #[error("cannot convert {from} to {to}")]
    TypeConversion { from: String, to: String },
}

impl Error {
    /// Create a new generic configuration error
    pub fn configuration(message: impl Into<String>) -> Self {
        Error::Configuration(message.into())
    }

    /// Create a new malformed-document error
    pub fn malformed(message: impl Into<String>) -> Self {
        Error::Malformed(message.into())
    }

    /// Create a new ParameterNotFound error
    pub fn parameter_not_found(name: impl Into<String>, available: impl Into<String>) -> Self {
        Error::ParameterNotFound {
            name: name.into(),
            available: available.into(),
        }
    }

    /// Create a new driver error without an SQLSTATE
    pub fn driver(message: impl Into<String>) -> Self {
        Error::Driver {
            message: message.into(),
            sqlstate: None,
        }
    }

    /// Create a new driver error carrying the driver's SQLSTATE
    pub fn driver_state(message: impl Into<String>, sqlstate: impl Into<String>) -> Self {
        Error::Driver {
            message: message.into(),
            sqlstate: Some(sqlstate.into()),
        }
    }

    /// Create a new expression error
    pub fn expression(message: impl Into<String>) -> Self {
        Error::Expression(message.into())
    }

    /// Create a new row-value extraction error
    pub fn row_value(message: impl Into<String>) -> Self {
        Error::RowValue(message.into())
    }

    /// Create a new TypeConversion error
    pub fn type_conversion(from: impl Into<String>, to: impl Into<String>) -> Self {
        Error::TypeConversion {
            from: from.into(),
            to: to.into(),
        }
    }

    /// Create a new MissingTypeHandler error
    pub fn missing_type_handler(column: impl Into<String>, type_name: impl Into<String>) -> Self {
        Error::MissingTypeHandler {
            column: column.into(),
            type_name: type_name.into(),
        }
    }

    /// Check if this is a configuration-time error
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            Error::UnknownSetting(_)
                | Error::DuplicateStatement(_)
                | Error::DuplicateNamespace(_)
                | Error::CacheRefNotFound(_)
                | Error::UnresolvedResultMap(_)
                | Error::ConflictingNesting { .. }
                | Error::PlaceholderParse(_)
                | Error::UnknownTypeAlias(_)
                | Error::Malformed(_)
                | Error::Configuration(_)
        )
    }

    /// Check if this is a binding error
    pub fn is_binding(&self) -> bool {
        matches!(
            self,
            Error::StatementNotFound(_)
                | Error::MethodNotResolved { .. }
                | Error::ParameterNotFound { .. }
                | Error::AmbiguousParameter(_)
        )
    }

    /// Check if this is an executor error
    pub fn is_executor(&self) -> bool {
        matches!(
            self,
            Error::ExecutorClosed
                | Error::DuplicateResultSet(_)
                | Error::ConstructorMismatch { .. }
                | Error::OutParamsNotCacheable
                | Error::TooManyRows(_)
        )
    }

    /// Check if this is a result-mapping error
    pub fn is_result_map(&self) -> bool {
        matches!(self, Error::MissingTypeHandler { .. } | Error::RowValue(_))
    }

    /// Check if this error wraps a driver failure
    pub fn is_driver(&self) -> bool {
        matches!(self, Error::Driver { .. })
    }

    /// Check if this is a transaction-protocol error
    pub fn is_transaction(&self) -> bool {
        matches!(self, Error::TransactionClosed { .. })
    }

    /// The SQLSTATE reported by the driver, if any
    pub fn sqlstate(&self) -> Option<&str> {
        match self {
            Error::Driver { sqlstate, .. } => sqlstate.as_deref(),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        assert_eq!(
            Error::UnknownSetting("cacheSize".to_string()).to_string(),
            "unknown setting 'cacheSize'"
        );
        assert_eq!(
            Error::StatementNotFound("blog.selectPost".to_string()).to_string(),
            "mapped statement 'blog.selectPost' not found"
        );
        assert_eq!(Error::ExecutorClosed.to_string(), "executor was closed");
        assert_eq!(
            Error::TooManyRows(3).to_string(),
            "expected one row, but the statement returned 3"
        );
        assert_eq!(
            Error::type_conversion("Text", "Integer").to_string(),
            "cannot convert Text to Integer"
        );
    }

    #[test]
    fn test_driver_error_preserves_sqlstate() {
        let err = Error::driver_state("unique violation", "23505");
        assert_eq!(err.sqlstate(), Some("23505"));
        assert!(err.is_driver());

        let err = Error::driver("connection reset");
        assert_eq!(err.sqlstate(), None);
    }

    #[test]
    fn test_error_classification() {
        assert!(Error::UnknownSetting("x".to_string()).is_configuration());
        assert!(Error::Malformed("bad".to_string()).is_configuration());
        assert!(Error::StatementNotFound("s".to_string()).is_binding());
        assert!(Error::ExecutorClosed.is_executor());
        assert!(Error::OutParamsNotCacheable.is_executor());
        assert!(Error::row_value("oops").is_result_map());
        assert!(Error::TransactionClosed { operation: "commit" }.is_transaction());
        assert!(!Error::ExecutorClosed.is_driver());
    }

    #[test]
    fn test_error_equality() {
        assert_eq!(
            Error::StatementNotFound("a".to_string()),
            Error::StatementNotFound("a".to_string())
        );
        assert_ne!(
            Error::StatementNotFound("a".to_string()),
            Error::StatementNotFound("b".to_string())
        );
    }
}
