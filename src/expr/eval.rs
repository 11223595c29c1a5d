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

//! Expression evaluation over a binding scope
//!
//! Truthiness follows the scripting convention: NULL is false, booleans are
//! themselves, numbers compare against zero, and any other non-null value is
//! true (including the empty string).

use std::cmp::Ordering;

use crate::core::{meta, Error, Result, Value};

use super::parser::{parse, BinaryOp, Expr, UnaryOp};

/// A property-resolution scope for expression evaluation
pub trait Bindings {
    /// Resolve a property path to a value; missing paths resolve to NULL
    fn resolve(&self, path: &str) -> Result<Value>;
}

impl Bindings for Value {
    fn resolve(&self, path: &str) -> Result<Value> {
        meta::get_path(self, path)
    }
}

/// Evaluate `source` against `bindings`
pub fn evaluate(source: &str, bindings: &dyn Bindings) -> Result<Value> {
    let expr = parse(source)?;
    eval_expr(&expr, bindings)
}

/// Evaluate `source` as a boolean test
pub fn evaluate_boolean(source: &str, bindings: &dyn Bindings) -> Result<bool> {
    Ok(truthy(&evaluate(source, bindings)?))
}

/// Evaluate `source` and coerce to an iteration sequence
///
/// Arrays iterate with ordinal indexes, objects iterate with their keys, and
/// any other non-null value iterates as a single element. Returns
/// `(index_or_key, item)` pairs.
pub fn evaluate_iterable(source: &str, bindings: &dyn Bindings) -> Result<Vec<(Value, Value)>> {
    let value = evaluate(source, bindings)?;
    match value {
        Value::Null => Ok(Vec::new()),
        Value::Array(items) => Ok(items
            .into_iter()
            .enumerate()
            .map(|(i, item)| (Value::Integer(i as i64), item))
            .collect()),
        Value::Object(map) => Ok(map
            .into_iter()
            .map(|(key, item)| (Value::text(key), item))
            .collect()),
        single => Ok(vec![(Value::Integer(0), single)]),
    }
}

/// Scripting truthiness for a value
pub fn truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Boolean(b) => *b,
        Value::Integer(v) => *v != 0,
        Value::Float(v) => *v != 0.0,
        _ => true,
    }
}

fn eval_expr(expr: &Expr, bindings: &dyn Bindings) -> Result<Value> {
    match expr {
        Expr::Literal(value) => Ok(value.clone()),
        Expr::Path(path) => bindings.resolve(path),
        Expr::Unary { op, expr } => {
            let value = eval_expr(expr, bindings)?;
            match op {
                UnaryOp::Not => Ok(Value::Boolean(!truthy(&value))),
            }
        }
        Expr::Binary { op, left, right } => match op {
            BinaryOp::And => {
                let lhs = eval_expr(left, bindings)?;
                if !truthy(&lhs) {
                    return Ok(Value::Boolean(false));
                }
                let rhs = eval_expr(right, bindings)?;
                Ok(Value::Boolean(truthy(&rhs)))
            }
            BinaryOp::Or => {
                let lhs = eval_expr(left, bindings)?;
                if truthy(&lhs) {
                    return Ok(Value::Boolean(true));
                }
                let rhs = eval_expr(right, bindings)?;
                Ok(Value::Boolean(truthy(&rhs)))
            }
            BinaryOp::Eq => {
                let lhs = eval_expr(left, bindings)?;
                let rhs = eval_expr(right, bindings)?;
                Ok(Value::Boolean(values_equal(&lhs, &rhs)))
            }
            BinaryOp::Ne => {
                let lhs = eval_expr(left, bindings)?;
                let rhs = eval_expr(right, bindings)?;
                Ok(Value::Boolean(!values_equal(&lhs, &rhs)))
            }
            BinaryOp::Lt | BinaryOp::Le | BinaryOp::Gt | BinaryOp::Ge => {
                let lhs = eval_expr(left, bindings)?;
                let rhs = eval_expr(right, bindings)?;
                let ordering = compare(&lhs, &rhs)?;
                Ok(Value::Boolean(match op {
                    BinaryOp::Lt => ordering == Ordering::Less,
                    BinaryOp::Le => ordering != Ordering::Greater,
                    BinaryOp::Gt => ordering == Ordering::Greater,
                    BinaryOp::Ge => ordering != Ordering::Less,
                    _ => unreachable!(),
                }))
            }
        },
    }
}

/// Equality with NULL handling: NULL equals only NULL
fn values_equal(lhs: &Value, rhs: &Value) -> bool {
    match (lhs.is_null(), rhs.is_null()) {
        (true, true) => true,
        (true, false) | (false, true) => false,
        (false, false) => lhs == rhs,
    }
}

fn compare(lhs: &Value, rhs: &Value) -> Result<Ordering> {
    lhs.partial_cmp_value(rhs).ok_or_else(|| {
        Error::expression(format!(
            "cannot compare {} with {}",
            lhs.data_type(),
            rhs.data_type()
        ))
    })
}
