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

//! Mapper-call argument vectors
//!
//! Ergonomic conversion of caller values into the argument vector a mapper
//! method receives: positional or named, mixed freely.
//!
//! # Examples
//!
//! ```ignore
//! use sqlbind::{args, named_args};
//!
//! mapper.call("findByTitle", args!["rust", 10])?;
//! mapper.call("findByRange", named_args! { min: 1, max: 99 })?;
//! ```

use chrono::{DateTime, Utc};

use crate::core::Value;

/// Types usable as mapper-call arguments
pub trait ToParam {
    /// Convert self into a Value for statement binding
    fn to_param(&self) -> Value;
}

impl ToParam for i64 {
    fn to_param(&self) -> Value {
        Value::Integer(*self)
    }
}

impl ToParam for i32 {
    fn to_param(&self) -> Value {
        Value::Integer(*self as i64)
    }
}

impl ToParam for i16 {
    fn to_param(&self) -> Value {
        Value::Integer(*self as i64)
    }
}

impl ToParam for u32 {
    fn to_param(&self) -> Value {
        Value::Integer(*self as i64)
    }
}

impl ToParam for usize {
    fn to_param(&self) -> Value {
        Value::Integer(*self as i64)
    }
}

impl ToParam for f64 {
    fn to_param(&self) -> Value {
        Value::Float(*self)
    }
}

impl ToParam for f32 {
    fn to_param(&self) -> Value {
        Value::Float(*self as f64)
    }
}

impl ToParam for bool {
    fn to_param(&self) -> Value {
        Value::Boolean(*self)
    }
}

impl ToParam for String {
    fn to_param(&self) -> Value {
        Value::text(self.clone())
    }
}

impl ToParam for &str {
    fn to_param(&self) -> Value {
        Value::text(*self)
    }
}

impl ToParam for DateTime<Utc> {
    fn to_param(&self) -> Value {
        Value::Timestamp(*self)
    }
}

impl ToParam for Value {
    fn to_param(&self) -> Value {
        self.clone()
    }
}

impl<T: ToParam> ToParam for Option<T> {
    fn to_param(&self) -> Value {
        match self {
            Some(inner) => inner.to_param(),
            None => Value::Null,
        }
    }
}

impl<T: ToParam> ToParam for Vec<T> {
    fn to_param(&self) -> Value {
        Value::Array(self.iter().map(ToParam::to_param).collect())
    }
}

impl<T: ToParam> ToParam for &T {
    fn to_param(&self) -> Value {
        (*self).to_param()
    }
}

/// The argument vector of one mapper call
#[derive(Debug, Clone, Default)]
pub struct Args {
    values: Vec<(Option<String>, Value)>,
}

impl Args {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a positional argument
    pub fn add<T: ToParam>(mut self, value: T) -> Self {
        self.values.push((None, value.to_param()));
        self
    }

    /// Append a named argument (an `@Param` equivalent)
    pub fn named<T: ToParam>(mut self, name: impl Into<String>, value: T) -> Self {
        self.values.push((Some(name.into()), value.to_param()));
        self
    }

    /// The (name, value) pairs in call order
    pub fn values(&self) -> &[(Option<String>, Value)] {
        &self.values
    }

    pub fn into_values(self) -> Vec<(Option<String>, Value)> {
        self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Build a positional argument vector
#[macro_export]
macro_rules! args {
    () => {
        $crate::binding::Args::new()
    };
    ($($value:expr),+ $(,)?) => {
        {
            let mut args = $crate::binding::Args::new();
            $(
                args = args.add($value);
            )+
            args
        }
    };
}

/// Build a named argument vector
#[macro_export]
macro_rules! named_args {
    () => {
        $crate::binding::Args::new()
    };
    ($($name:ident : $value:expr),+ $(,)?) => {
        {
            let mut args = $crate::binding::Args::new();
            $(
                args = args.named(stringify!($name), $value);
            )+
            args
        }
    };
}
