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

//! Core types: errors, runtime values, lazy objects and property traversal

pub mod error;
pub mod lazy;
pub mod meta;
pub mod value;

pub use error::{Error, Result};
pub use lazy::{LazyLoad, LazyObject};
pub use meta::MetaObject;
pub use value::{DataType, FromValue, ObjectMap, Value};
