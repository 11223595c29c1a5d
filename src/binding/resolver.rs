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

//! Argument-to-parameter coercion
//!
//! Turns a mapper call's argument vector into the statement's parameter
//! object. Explicit names win; unnamed arguments get positional `arg0..N`
//! names; `param1..paramN` aliases are always added. A single unnamed,
//! undeclared argument is forwarded as-is, preserving collection and array
//! semantics for `<foreach>`.

use crate::core::{ObjectMap, Value};

use super::params::Args;
use super::registry::MethodSpec;

/// Generic parameter-name prefix always available as an alias
const GENERIC_NAME_PREFIX: &str = "param";

/// Resolve the argument vector into the statement parameter object
pub fn resolve_parameter(spec: &MethodSpec, args: Args) -> Value {
    let values = args.into_values();
    if values.is_empty() {
        return Value::Null;
    }

    // a single unnamed, undeclared argument passes through untouched
    if values.len() == 1 {
        let declared = spec.param_names.first().cloned().flatten();
        let (explicit, _) = &values[0];
        if explicit.is_none() && declared.is_none() {
            return values
                .into_iter()
                .next()
                .map(|(_, v)| v)
                .unwrap_or(Value::Null);
        }
    }

    let mut map = ObjectMap::new();
    for (i, (explicit, value)) in values.into_iter().enumerate() {
        let declared = spec.param_names.get(i).cloned().flatten();
        let name = explicit
            .or(declared)
            .unwrap_or_else(|| format!("arg{}", i));
        map.insert(name, value.clone());

        let generic = format!("{}{}", GENERIC_NAME_PREFIX, i + 1);
        map.entry(generic).or_insert(value);
    }
    Value::Object(map)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::binding::params::Args;
    use crate::binding::registry::MethodSpec;

    #[test]
    fn test_single_unnamed_passes_through() {
        let spec = MethodSpec::new("findByIds");
        let args = Args::new().add(Value::array(vec![Value::Integer(1), Value::Integer(2)]));
        let parameter = resolve_parameter(&spec, args);
        // the collection keeps its shape for <foreach>
        assert_eq!(
            parameter,
            Value::array(vec![Value::Integer(1), Value::Integer(2)])
        );
    }

    #[test]
    fn test_declared_name_wraps_single_argument() {
        let spec = MethodSpec::new("findById").param("id");
        let parameter = resolve_parameter(&spec, Args::new().add(7i64));
        assert_eq!(
            crate::core::meta::get_path(&parameter, "id").unwrap(),
            Value::Integer(7)
        );
        assert_eq!(
            crate::core::meta::get_path(&parameter, "param1").unwrap(),
            Value::Integer(7)
        );
    }

    #[test]
    fn test_positional_fallback_names() {
        let spec = MethodSpec::new("findByRange");
        let parameter = resolve_parameter(&spec, Args::new().add(1i64).add(9i64));
        assert_eq!(
            crate::core::meta::get_path(&parameter, "arg0").unwrap(),
            Value::Integer(1)
        );
        assert_eq!(
            crate::core::meta::get_path(&parameter, "arg1").unwrap(),
            Value::Integer(9)
        );
        assert_eq!(
            crate::core::meta::get_path(&parameter, "param2").unwrap(),
            Value::Integer(9)
        );
    }

    #[test]
    fn test_explicit_names_win() {
        let spec = MethodSpec::new("find").param("declared");
        let parameter = resolve_parameter(&spec, Args::new().named("explicit", 5i64));
        assert_eq!(
            crate::core::meta::get_path(&parameter, "explicit").unwrap(),
            Value::Integer(5)
        );
    }

    #[test]
    fn test_no_arguments() {
        let spec = MethodSpec::new("findAll");
        assert_eq!(resolve_parameter(&spec, Args::new()), Value::Null);
    }
}
