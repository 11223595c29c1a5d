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

//! Expression engine for `test`, `value` and `collection` attributes
//!
//! A small lexer/Pratt-parser/evaluator over binding scopes. Covers boolean
//! tests (`==`, `!=`, `<`, `<=`, `>`, `>=`, `&&`/`and`, `||`/`or`,
//! `!`/`not`), string and numeric literals, `null`, property paths across
//! objects and arrays, and iterable coercion for `<foreach>`.

mod eval;
mod lexer;
mod parser;

pub use eval::{evaluate, evaluate_boolean, evaluate_iterable, truthy, Bindings};
pub use parser::{parse, BinaryOp, Expr, UnaryOp};
