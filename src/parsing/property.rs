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

//! Property paths and configuration placeholders
//!
//! [`PropertyTokenizer`] walks dotted, optionally indexed property paths
//! (`orders[0].lines[2].sku`). [`resolve_placeholders`] substitutes
//! `${key}` / `${key:default}` placeholders in configuration documents.

use std::collections::HashMap;

use super::token::GenericTokenParser;

/// Property key that turns on the `${key:default}` default-value branch
pub const ENABLE_DEFAULT_VALUE: &str = "sqlbind.property.enable-default-value";

/// Separator between a placeholder key and its default value
const DEFAULT_VALUE_SEPARATOR: char = ':';

/// One step of a dotted property path
///
/// Splits `orders[0].lines[2].sku` into a head segment (`name` = "orders",
/// `index` = Some("0")) and the remaining `children` path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropertyTokenizer<'a> {
    name: &'a str,
    indexed_name: &'a str,
    index: Option<&'a str>,
    children: Option<&'a str>,
}

impl<'a> PropertyTokenizer<'a> {
    /// Tokenize the head segment of `path`
    pub fn new(path: &'a str) -> Self {
        let (indexed_name, children) = match path.find('.') {
            Some(delim) => (&path[..delim], Some(&path[delim + 1..])),
            None => (path, None),
        };
        let (name, index) = match indexed_name.find('[') {
            Some(open) if indexed_name.ends_with(']') => (
                &indexed_name[..open],
                Some(&indexed_name[open + 1..indexed_name.len() - 1]),
            ),
            _ => (indexed_name, None),
        };
        Self {
            name,
            indexed_name,
            index,
            children,
        }
    }

    /// Property name without any index suffix
    pub fn name(&self) -> &'a str {
        self.name
    }

    /// Property name including its `[index]` suffix
    pub fn indexed_name(&self) -> &'a str {
        self.indexed_name
    }

    /// The index between brackets, if any
    pub fn index(&self) -> Option<&'a str> {
        self.index
    }

    /// The remaining path after this segment
    pub fn children(&self) -> Option<&'a str> {
        self.children
    }

    /// True if more segments follow
    pub fn has_next(&self) -> bool {
        self.children.is_some()
    }

    /// Tokenizer for the next segment
    pub fn next_segment(&self) -> Option<PropertyTokenizer<'a>> {
        self.children.map(PropertyTokenizer::new)
    }
}

/// Substitute `${key}` placeholders in `text` from `variables`
///
/// When the `ENABLE_DEFAULT_VALUE` variable is `"true"`, `${key:default}`
/// falls back to `default` for missing keys. An unresolvable placeholder is
/// kept in its literal `${key}` form.
pub fn resolve_placeholders(text: &str, variables: &HashMap<String, String>) -> String {
    let defaults_enabled = variables
        .get(ENABLE_DEFAULT_VALUE)
        .map(|v| v == "true")
        .unwrap_or(false);

    let parser = GenericTokenParser::new("${", "}");
    // the handler is infallible; unresolved keys echo their literal form
    parser
        .parse(text, &mut |content| {
            if defaults_enabled {
                if let Some(sep) = content.find(DEFAULT_VALUE_SEPARATOR) {
                    let key = &content[..sep];
                    let default = &content[sep + 1..];
                    return Ok(variables
                        .get(key)
                        .cloned()
                        .unwrap_or_else(|| default.to_string()));
                }
            }
            Ok(variables
                .get(content)
                .cloned()
                .unwrap_or_else(|| format!("${{{}}}", content)))
        })
        .unwrap_or_else(|_| text.to_string())
}
