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

//! Property traversal over values
//!
//! [`MetaObject`] is the only capability result mapping, parameter binding
//! and token substitution use to read and write object state: dotted and
//! indexed paths (`author.username`, `orders[0].sku`, `map[key]`) over
//! [`Value`] trees. Reads through a lazy object trigger its pending loads;
//! writes create missing intermediate objects.

use super::error::{Error, Result};
use super::value::{DataType, ObjectMap, Value};
use crate::parsing::PropertyTokenizer;

/// Read/write property access over one value tree
pub struct MetaObject<'a> {
    value: &'a mut Value,
}

impl<'a> MetaObject<'a> {
    /// Wrap a value for property access
    pub fn new(value: &'a mut Value) -> Self {
        Self { value }
    }

    /// Read the value at `path`, NULL when any step is missing
    pub fn get(&self, path: &str) -> Result<Value> {
        get_path(self.value, path)
    }

    /// True if `path` resolves to an existing property
    pub fn has_getter(&self, path: &str) -> bool {
        has_path(self.value, path)
    }

    /// True if `path` can be written (container steps exist or can be grown)
    pub fn has_setter(&self, path: &str) -> bool {
        matches!(
            self.value,
            Value::Object(_) | Value::Lazy(_) | Value::Array(_)
        ) || path.is_empty()
    }

    /// Data type of the value at `path`
    pub fn getter_type(&self, path: &str) -> DataType {
        get_path(self.value, path)
            .map(|v| v.data_type())
            .unwrap_or(DataType::Null)
    }

    /// Write `value` at `path`, creating missing intermediate objects
    pub fn set(&mut self, path: &str, value: Value) -> Result<()> {
        set_path(self.value, path, value)
    }

    /// Append `item` to the array at `path`, creating the array if missing
    pub fn append(&mut self, path: &str, item: Value) -> Result<()> {
        append_path(self.value, path, item)
    }
}

/// Read the value at `path`; missing steps resolve to NULL
pub fn get_path(value: &Value, path: &str) -> Result<Value> {
    if path.is_empty() {
        return Ok(value.clone());
    }
    let tokenizer = PropertyTokenizer::new(path);
    let head = match get_segment(value, &tokenizer)? {
        Some(v) => v,
        None => return Ok(Value::Null),
    };
    match tokenizer.children() {
        Some(rest) => get_path(&head, rest),
        None => Ok(head),
    }
}

/// True if every step of `path` resolves to an existing property
pub fn has_path(value: &Value, path: &str) -> bool {
    if path.is_empty() {
        return true;
    }
    let tokenizer = PropertyTokenizer::new(path);
    let head = match get_segment(value, &tokenizer) {
        Ok(Some(v)) => v,
        _ => return false,
    };
    match tokenizer.children() {
        Some(rest) => has_path(&head, rest),
        None => true,
    }
}

/// Write `new_value` at `path`, creating missing intermediate objects
pub fn set_path(value: &mut Value, path: &str, new_value: Value) -> Result<()> {
    let tokenizer = PropertyTokenizer::new(path);
    match tokenizer.children() {
        None => set_segment(value, &tokenizer, new_value),
        Some(rest) => {
            // lazy objects hand out clones; write through and store back
            if let Value::Lazy(lazy) = value {
                let mut child = lazy
                    .get(tokenizer.name())?
                    .unwrap_or_else(Value::empty_object);
                let child_path = match tokenizer.index() {
                    Some(index) => {
                        let mut indexed =
                            indexed_child(&mut child, index)?.unwrap_or_else(Value::empty_object);
                        set_path(&mut indexed, rest, new_value)?;
                        set_index(&mut child, index, indexed)?;
                        lazy.set(tokenizer.name(), child);
                        return Ok(());
                    }
                    None => &mut child,
                };
                set_path(child_path, rest, new_value)?;
                lazy.set(tokenizer.name(), child);
                return Ok(());
            }
            let container = walk_mut(value, &tokenizer)?;
            set_path(container, rest, new_value)
        }
    }
}

/// Append `item` to the array at `path`, creating the array if missing
pub fn append_path(value: &mut Value, path: &str, item: Value) -> Result<()> {
    let current = get_path(value, path)?;
    match current {
        Value::Array(mut items) => {
            items.push(item);
            set_path(value, path, Value::Array(items))
        }
        Value::Null => set_path(value, path, Value::Array(vec![item])),
        other => Err(Error::row_value(format!(
            "cannot append to non-array property '{}' of type {}",
            path,
            other.data_type()
        ))),
    }
}

/// Convert an `underscore_separated` column label to `camelCase`
pub fn underscore_to_camel(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut upper_next = false;
    for ch in name.chars() {
        if ch == '_' {
            upper_next = true;
        } else if upper_next {
            out.extend(ch.to_uppercase());
            upper_next = false;
        } else {
            out.extend(ch.to_lowercase());
        }
    }
    out
}

/// Derive the auto-mapped property name for a column label
pub fn auto_mapped_property(column_label: &str, map_underscore_to_camel: bool) -> String {
    if map_underscore_to_camel {
        underscore_to_camel(column_label)
    } else {
        column_label.to_string()
    }
}

// =============================================================================
// Internals
// =============================================================================

/// Resolve one path segment against `value`
fn get_segment(value: &Value, tokenizer: &PropertyTokenizer) -> Result<Option<Value>> {
    let name = tokenizer.name();
    let base = if name.is_empty() {
        Some(value.clone())
    } else {
        match value {
            Value::Object(map) => lookup_property(map, name),
            Value::Lazy(lazy) => lazy.get(name)?,
            _ => None,
        }
    };
    let Some(base) = base else {
        return Ok(None);
    };
    match tokenizer.index() {
        None => Ok(Some(base)),
        Some(index) => match &base {
            Value::Array(items) => {
                let i = parse_index(index)?;
                Ok(items.get(i).cloned())
            }
            Value::Object(map) => Ok(lookup_property(map, index)),
            _ => Ok(None),
        },
    }
}

/// Object property lookup: exact key first, case-insensitive fallback
fn lookup_property(map: &ObjectMap, name: &str) -> Option<Value> {
    if let Some(v) = map.get(name) {
        return Some(v.clone());
    }
    map.iter()
        .find(|(k, _)| k.eq_ignore_ascii_case(name))
        .map(|(_, v)| v.clone())
}

fn parse_index(index: &str) -> Result<usize> {
    index
        .parse::<usize>()
        .map_err(|_| Error::row_value(format!("invalid collection index '{}'", index)))
}

/// Borrow the container one segment down, growing missing intermediates
fn walk_mut<'v>(value: &'v mut Value, tokenizer: &PropertyTokenizer) -> Result<&'v mut Value> {
    let name = tokenizer.name();
    if let Value::Null = value {
        *value = Value::empty_object();
    }
    let slot = match value {
        Value::Object(map) => map
            .entry(name.to_string())
            .or_insert_with(Value::empty_object),
        other => {
            return Err(Error::row_value(format!(
                "cannot traverse property '{}' of {}",
                name,
                other.data_type()
            )))
        }
    };
    match tokenizer.index() {
        None => Ok(slot),
        Some(index) => {
            let i = parse_index(index)?;
            if let Value::Null = slot {
                *slot = Value::Array(Vec::new());
            }
            match slot {
                Value::Array(items) => {
                    while items.len() <= i {
                        items.push(Value::Null);
                    }
                    Ok(&mut items[i])
                }
                Value::Object(map) => Ok(map
                    .entry(index.to_string())
                    .or_insert_with(Value::empty_object)),
                other => Err(Error::row_value(format!(
                    "cannot index into {} at '{}'",
                    other.data_type(),
                    name
                ))),
            }
        }
    }
}

/// Write the final segment of a path
fn set_segment(value: &mut Value, tokenizer: &PropertyTokenizer, new_value: Value) -> Result<()> {
    let name = tokenizer.name();
    match tokenizer.index() {
        None => match value {
            Value::Object(map) => {
                map.insert(name.to_string(), new_value);
                Ok(())
            }
            Value::Lazy(lazy) => {
                lazy.set(name, new_value);
                Ok(())
            }
            Value::Null => {
                let mut map = ObjectMap::new();
                map.insert(name.to_string(), new_value);
                *value = Value::Object(map);
                Ok(())
            }
            other => Err(Error::row_value(format!(
                "cannot set property '{}' on {}",
                name,
                other.data_type()
            ))),
        },
        Some(index) => {
            let container = walk_container(value, name)?;
            set_index(container, index, new_value)
        }
    }
}

/// Borrow (or create) the named container for an indexed write
fn walk_container<'v>(value: &'v mut Value, name: &str) -> Result<&'v mut Value> {
    if name.is_empty() {
        return Ok(value);
    }
    if let Value::Null = value {
        *value = Value::empty_object();
    }
    match value {
        Value::Object(map) => Ok(map
            .entry(name.to_string())
            .or_insert_with(|| Value::Array(Vec::new()))),
        other => Err(Error::row_value(format!(
            "cannot set indexed property '{}' on {}",
            name,
            other.data_type()
        ))),
    }
}

fn set_index(container: &mut Value, index: &str, new_value: Value) -> Result<()> {
    if let Value::Null = container {
        *container = Value::Array(Vec::new());
    }
    match container {
        Value::Array(items) => {
            let i = parse_index(index)?;
            while items.len() <= i {
                items.push(Value::Null);
            }
            items[i] = new_value;
            Ok(())
        }
        Value::Object(map) => {
            map.insert(index.to_string(), new_value);
            Ok(())
        }
        other => Err(Error::row_value(format!(
            "cannot index into {}",
            other.data_type()
        ))),
    }
}

/// Read an indexed child out of a container (lazy write-back path)
fn indexed_child(container: &mut Value, index: &str) -> Result<Option<Value>> {
    match container {
        Value::Array(items) => {
            let i = parse_index(index)?;
            Ok(items.get(i).cloned())
        }
        Value::Object(map) => Ok(map.get(index).cloned()),
        _ => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn author() -> Value {
        let mut inner = ObjectMap::new();
        inner.insert("username".to_string(), Value::text("clinton"));
        let mut map = ObjectMap::new();
        map.insert("id".to_string(), Value::Integer(7));
        map.insert("author".to_string(), Value::Object(inner));
        map.insert(
            "tags".to_string(),
            Value::array(vec![Value::text("a"), Value::text("b")]),
        );
        Value::Object(map)
    }

    #[test]
    fn test_get_nested_paths() {
        let value = author();
        assert_eq!(get_path(&value, "id").unwrap(), Value::Integer(7));
        assert_eq!(
            get_path(&value, "author.username").unwrap(),
            Value::text("clinton")
        );
        assert_eq!(get_path(&value, "tags[1]").unwrap(), Value::text("b"));
        assert_eq!(get_path(&value, "missing.deep").unwrap(), Value::Null);
    }

    #[test]
    fn test_has_path() {
        let value = author();
        assert!(has_path(&value, "author.username"));
        assert!(has_path(&value, "tags[0]"));
        assert!(!has_path(&value, "tags[9]"));
        assert!(!has_path(&value, "author.email"));
    }

    #[test]
    fn test_case_insensitive_fallback() {
        let value = author();
        assert_eq!(get_path(&value, "ID").unwrap(), Value::Integer(7));
    }

    #[test]
    fn test_set_creates_intermediates() {
        let mut value = Value::empty_object();
        set_path(&mut value, "author.address.city", Value::text("pdx")).unwrap();
        assert_eq!(
            get_path(&value, "author.address.city").unwrap(),
            Value::text("pdx")
        );
    }

    #[test]
    fn test_set_indexed_grows_array() {
        let mut value = Value::empty_object();
        set_path(&mut value, "lines[2]", Value::Integer(3)).unwrap();
        assert_eq!(get_path(&value, "lines[2]").unwrap(), Value::Integer(3));
        assert_eq!(get_path(&value, "lines[0]").unwrap(), Value::Null);
    }

    #[test]
    fn test_append_path() {
        let mut value = Value::empty_object();
        append_path(&mut value, "comments", Value::Integer(1)).unwrap();
        append_path(&mut value, "comments", Value::Integer(2)).unwrap();
        assert_eq!(
            get_path(&value, "comments").unwrap(),
            Value::array(vec![Value::Integer(1), Value::Integer(2)])
        );
    }

    #[test]
    fn test_underscore_to_camel() {
        assert_eq!(underscore_to_camel("post_id"), "postId");
        assert_eq!(underscore_to_camel("POST_SUBJECT"), "postSubject");
        assert_eq!(underscore_to_camel("plain"), "plain");
    }

    #[test]
    fn test_meta_object_wrapper() {
        let mut value = author();
        let mut meta = MetaObject::new(&mut value);
        assert!(meta.has_getter("author.username"));
        assert_eq!(meta.getter_type("id"), DataType::Integer);
        meta.set("author.username", Value::text("eduardo")).unwrap();
        assert_eq!(
            meta.get("author.username").unwrap(),
            Value::text("eduardo")
        );
    }
}
