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

//! Mapper binding: declared interfaces, argument coercion and the
//! per-method dispatch table

pub mod method;
pub mod params;
pub mod proxy;
pub mod registry;
pub mod resolver;

pub use method::{MapperMethod, SqlCommand};
pub use params::{Args, ToParam};
pub use proxy::{Mapper, MapperProxy, ProxyCache};
pub use registry::{MapperRegistry, MapperSpec, MethodSpec, ReturnShape};
pub use resolver::resolve_parameter;
