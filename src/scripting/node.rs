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

//! The dynamic SQL node tree
//!
//! Each node's `apply` evaluates against a [`DynamicContext`] and reports
//! whether it produced content. `<where>` and `<set>` are trim nodes with
//! fixed prefixes and overrides. `${}` substitution inside text nodes is
//! textual, not parameterized; an optional injection-filter regex can reject
//! a substitution.

use regex::Regex;

use crate::core::{Error, Result};
use crate::expr;
use crate::parsing::GenericTokenParser;

use super::context::DynamicContext;

/// Prefix overrides stripped by `<where>`
const WHERE_PREFIX_OVERRIDES: &[&str] = &["AND ", "OR ", "AND\n", "OR\n", "AND\t", "OR\t"];

/// Suffix overrides stripped by `<set>`
const SET_SUFFIX_OVERRIDES: &[&str] = &[","];

/// One node of a dynamic SQL tree
#[derive(Debug, Clone)]
pub enum SqlNode {
    /// Literal text with no substitutions
    Static(String),

    /// Text carrying `${}` substitutions
    Text {
        text: String,
        injection_filter: Option<Regex>,
    },

    /// `<if test="...">`
    If { test: String, body: Box<SqlNode> },

    /// `<choose>` with its `<when>` tests and optional `<otherwise>`
    Choose {
        whens: Vec<(String, SqlNode)>,
        otherwise: Option<Box<SqlNode>>,
    },

    /// `<trim>` (also backing `<where>` and `<set>`)
    Trim {
        body: Box<SqlNode>,
        prefix: Option<String>,
        suffix: Option<String>,
        prefix_overrides: Vec<String>,
        suffix_overrides: Vec<String>,
    },

    /// `<foreach>`
    Foreach {
        collection: String,
        item: Option<String>,
        index: Option<String>,
        open: Option<String>,
        close: Option<String>,
        separator: Option<String>,
        body: Box<SqlNode>,
    },

    /// `<bind name="..." value="..."/>`
    VarDecl { name: String, expression: String },

    /// Ordered sequence of child nodes
    Mixed(Vec<SqlNode>),
}

impl SqlNode {
    /// Create a literal text node
    pub fn static_text(text: impl Into<String>) -> SqlNode {
        SqlNode::Static(text.into())
    }

    /// Create a `${}`-carrying text node without an injection filter
    pub fn text(text: impl Into<String>) -> SqlNode {
        SqlNode::Text {
            text: text.into(),
            injection_filter: None,
        }
    }

    /// Create a `<where>` node
    pub fn where_node(body: SqlNode) -> SqlNode {
        SqlNode::Trim {
            body: Box::new(body),
            prefix: Some("WHERE".to_string()),
            suffix: None,
            prefix_overrides: WHERE_PREFIX_OVERRIDES
                .iter()
                .map(|s| s.to_string())
                .collect(),
            suffix_overrides: Vec::new(),
        }
    }

    /// Create a `<set>` node
    pub fn set_node(body: SqlNode) -> SqlNode {
        SqlNode::Trim {
            body: Box::new(body),
            prefix: Some("SET".to_string()),
            suffix: None,
            prefix_overrides: Vec::new(),
            suffix_overrides: SET_SUFFIX_OVERRIDES.iter().map(|s| s.to_string()).collect(),
        }
    }

    /// True if evaluation depends on the parameter object
    pub fn is_dynamic(&self) -> bool {
        match self {
            SqlNode::Static(_) => false,
            SqlNode::Mixed(children) => children.iter().any(SqlNode::is_dynamic),
            _ => true,
        }
    }

    /// Evaluate this node into the context; true if it produced content
    pub fn apply(&self, ctx: &mut DynamicContext) -> Result<bool> {
        match self {
            SqlNode::Static(text) => {
                ctx.append_sql(text);
                Ok(true)
            }

            SqlNode::Text {
                text,
                injection_filter,
            } => {
                let substituted = substitute_text(text, injection_filter.as_ref(), ctx)?;
                ctx.append_sql(&substituted);
                Ok(true)
            }

            SqlNode::If { test, body } => {
                if expr::evaluate_boolean(test, ctx)? {
                    body.apply(ctx)?;
                    Ok(true)
                } else {
                    Ok(false)
                }
            }

            SqlNode::Choose { whens, otherwise } => {
                for (test, body) in whens {
                    if expr::evaluate_boolean(test, ctx)? {
                        body.apply(ctx)?;
                        return Ok(true);
                    }
                }
                if let Some(body) = otherwise {
                    body.apply(ctx)?;
                    return Ok(true);
                }
                Ok(false)
            }

            SqlNode::Trim {
                body,
                prefix,
                suffix,
                prefix_overrides,
                suffix_overrides,
            } => {
                let (produced, captured) = ctx.capture(|inner| body.apply(inner))?;
                let trimmed = apply_trim(
                    &captured,
                    prefix.as_deref(),
                    suffix.as_deref(),
                    prefix_overrides,
                    suffix_overrides,
                );
                if let Some(sql) = trimmed {
                    ctx.append_sql(&sql);
                }
                Ok(produced)
            }

            SqlNode::Foreach {
                collection,
                item,
                index,
                open,
                close,
                separator,
                body,
            } => {
                let items = expr::evaluate_iterable(collection, ctx)?;
                if items.is_empty() {
                    return Ok(true);
                }
                let mut chunks: Vec<String> = Vec::with_capacity(items.len());
                for (key, item_value) in items {
                    let n = ctx.next_unique();
                    if let Some(index_name) = index {
                        ctx.bind(index_name.clone(), key.clone());
                        ctx.bind(itemize(index_name, n), key.clone());
                    }
                    if let Some(item_name) = item {
                        ctx.bind(item_name.clone(), item_value.clone());
                        ctx.bind(itemize(item_name, n), item_value.clone());
                    }
                    let (_, chunk) = ctx.capture(|inner| body.apply(inner))?;
                    let chunk =
                        rewrite_iteration_placeholders(&chunk, item.as_deref(), index.as_deref(), n)?;
                    let chunk = chunk.trim().to_string();
                    if !chunk.is_empty() {
                        chunks.push(chunk);
                    }
                }

                let mut out = String::new();
                if let Some(open) = open {
                    out.push_str(open);
                }
                out.push_str(&chunks.join(separator.as_deref().unwrap_or("")));
                if let Some(close) = close {
                    out.push_str(close);
                }
                ctx.append_sql(&out);

                if let Some(item_name) = item {
                    ctx.unbind(item_name);
                }
                if let Some(index_name) = index {
                    ctx.unbind(index_name);
                }
                Ok(true)
            }

            SqlNode::VarDecl { name, expression } => {
                let value = expr::evaluate(expression, ctx)?;
                ctx.bind(name.clone(), value);
                Ok(true)
            }

            SqlNode::Mixed(children) => {
                for child in children {
                    child.apply(ctx)?;
                }
                Ok(true)
            }
        }
    }
}

/// Unique binding name for one foreach iteration of `name`
pub fn itemize(name: &str, n: u32) -> String {
    format!("__frch_{}_{}", name, n)
}

/// Resolve `${}` tokens against the context bindings
fn substitute_text(
    text: &str,
    injection_filter: Option<&Regex>,
    ctx: &DynamicContext,
) -> Result<String> {
    let parser = GenericTokenParser::new("${", "}");
    parser.parse(text, &mut |expression| {
        let value = expr::evaluate(expression, ctx)?;
        let substituted = value.to_string();
        if let Some(filter) = injection_filter {
            if !filter.is_match(&substituted) {
                return Err(Error::expression(format!(
                    "substitution '{}' rejected by injection filter",
                    substituted
                )));
            }
        }
        Ok(substituted)
    })
}

/// Trim policy: strip the first matching overrides, then wrap with
/// prefix/suffix when the body produced non-whitespace
fn apply_trim(
    body_sql: &str,
    prefix: Option<&str>,
    suffix: Option<&str>,
    prefix_overrides: &[String],
    suffix_overrides: &[String],
) -> Option<String> {
    let trimmed = body_sql.trim();
    if trimmed.is_empty() {
        return None;
    }
    let mut sql = trimmed.to_string();

    let upper = sql.to_ascii_uppercase();
    for over in prefix_overrides {
        if upper.starts_with(&over.to_ascii_uppercase()) {
            sql.drain(..over.len());
            sql = sql.trim_start().to_string();
            break;
        }
    }

    let upper = sql.to_ascii_uppercase();
    for over in suffix_overrides {
        if upper.ends_with(&over.to_ascii_uppercase()) {
            sql.truncate(sql.len() - over.len());
            sql = sql.trim_end().to_string();
            break;
        }
    }

    let mut out = String::with_capacity(sql.len() + 16);
    if let Some(prefix) = prefix {
        out.push_str(prefix);
        out.push(' ');
    }
    out.push_str(&sql);
    if let Some(suffix) = suffix {
        out.push(' ');
        out.push_str(suffix);
    }
    Some(out)
}

/// Rewrite bare `#{item}` / `#{index}` heads to their per-iteration names
fn rewrite_iteration_placeholders(
    chunk: &str,
    item: Option<&str>,
    index: Option<&str>,
    n: u32,
) -> Result<String> {
    let parser = GenericTokenParser::new("#{", "}");
    parser.parse(chunk, &mut |content| {
        let (head, options) = match content.find(',') {
            Some(pos) => (&content[..pos], &content[pos..]),
            None => (content, ""),
        };
        let head = head.trim();
        let rewritten = item
            .and_then(|name| rewrite_head(head, name, n))
            .or_else(|| index.and_then(|name| rewrite_head(head, name, n)))
            .unwrap_or_else(|| head.to_string());
        Ok(format!("#{{{}{}}}", rewritten, options))
    })
}

/// Rewrite `name`, `name.prop` or `name[i]` heads to `__frch_name_N...`
fn rewrite_head(head: &str, name: &str, n: u32) -> Option<String> {
    if head == name {
        return Some(itemize(name, n));
    }
    let rest = head.strip_prefix(name)?;
    if rest.starts_with('.') || rest.starts_with('[') {
        Some(format!("{}{}", itemize(name, n), rest))
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{ObjectMap, Value};

    fn object(pairs: &[(&str, Value)]) -> Value {
        let mut map = ObjectMap::new();
        for (k, v) in pairs {
            map.insert(k.to_string(), v.clone());
        }
        Value::Object(map)
    }

    fn render(node: &SqlNode, parameter: &Value) -> String {
        let mut ctx = DynamicContext::new(parameter, None);
        node.apply(&mut ctx).unwrap();
        ctx.sql()
    }

    #[test]
    fn test_where_with_all_ifs_false_is_empty() {
        let node = SqlNode::where_node(SqlNode::Mixed(vec![
            SqlNode::If {
                test: "id != null".to_string(),
                body: Box::new(SqlNode::static_text("AND id = #{id}")),
            },
            SqlNode::If {
                test: "title != null".to_string(),
                body: Box::new(SqlNode::static_text("AND title = #{title}")),
            },
        ]));
        assert_eq!(render(&node, &Value::empty_object()), "");
    }

    #[test]
    fn test_where_strips_leading_and_once() {
        let node = SqlNode::where_node(SqlNode::If {
            test: "id != null".to_string(),
            body: Box::new(SqlNode::static_text("AND id = #{id}")),
        });
        let parameter = object(&[("id", Value::Integer(1))]);
        assert_eq!(render(&node, &parameter), "WHERE id = #{id}");
    }

    #[test]
    fn test_where_keeps_inner_and() {
        let node = SqlNode::where_node(SqlNode::static_text("AND a = 1 AND b = 2"));
        assert_eq!(render(&node, &Value::Null), "WHERE a = 1 AND b = 2");
    }

    #[test]
    fn test_set_strips_trailing_comma() {
        let node = SqlNode::set_node(SqlNode::static_text("title = #{title},"));
        assert_eq!(render(&node, &Value::Null), "SET title = #{title}");
    }

    #[test]
    fn test_trim_custom_overrides() {
        let node = SqlNode::Trim {
            body: Box::new(SqlNode::static_text("or a = 1")),
            prefix: Some("WHERE".to_string()),
            suffix: None,
            prefix_overrides: vec!["OR ".to_string()],
            suffix_overrides: Vec::new(),
        };
        assert_eq!(render(&node, &Value::Null), "WHERE a = 1");
    }

    #[test]
    fn test_choose_picks_first_match() {
        let node = SqlNode::Choose {
            whens: vec![
                (
                    "kind == 'a'".to_string(),
                    SqlNode::static_text("from_a"),
                ),
                (
                    "kind == 'b'".to_string(),
                    SqlNode::static_text("from_b"),
                ),
            ],
            otherwise: Some(Box::new(SqlNode::static_text("fallback"))),
        };
        assert_eq!(
            render(&node, &object(&[("kind", Value::text("b"))])),
            "from_b"
        );
        assert_eq!(
            render(&node, &object(&[("kind", Value::text("z"))])),
            "fallback"
        );
    }

    #[test]
    fn test_foreach_uniquifies_placeholders() {
        let node = SqlNode::Foreach {
            collection: "list".to_string(),
            item: Some("x".to_string()),
            index: None,
            open: None,
            close: None,
            separator: Some(",".to_string()),
            body: Box::new(SqlNode::static_text("#{x}")),
        };
        let parameter = object(&[(
            "list",
            Value::array(vec![Value::Integer(1), Value::Integer(2), Value::Integer(3)]),
        )]);
        let mut ctx = DynamicContext::new(&parameter, None);
        node.apply(&mut ctx).unwrap();
        assert_eq!(
            ctx.sql(),
            "#{__frch_x_0},#{__frch_x_1},#{__frch_x_2}"
        );
        // per-iteration bindings stay for statement binding
        assert_eq!(
            ctx.bindings().get("__frch_x_1"),
            Some(&Value::Integer(2))
        );
        // loop variable removed after the loop
        assert!(!ctx.bindings().contains_key("x"));
    }

    #[test]
    fn test_foreach_open_close_and_properties() {
        let node = SqlNode::Foreach {
            collection: "items".to_string(),
            item: Some("it".to_string()),
            index: Some("i".to_string()),
            open: Some("(".to_string()),
            close: Some(")".to_string()),
            separator: Some(", ".to_string()),
            body: Box::new(SqlNode::static_text("#{it.sku}")),
        };
        let mut line = ObjectMap::new();
        line.insert("sku".to_string(), Value::text("A"));
        let parameter = object(&[("items", Value::array(vec![Value::Object(line)]))]);
        assert_eq!(render(&node, &parameter), "(#{__frch_it_0.sku})");
    }

    #[test]
    fn test_foreach_empty_collection_emits_nothing() {
        let node = SqlNode::Foreach {
            collection: "list".to_string(),
            item: Some("x".to_string()),
            index: None,
            open: Some("(".to_string()),
            close: Some(")".to_string()),
            separator: Some(",".to_string()),
            body: Box::new(SqlNode::static_text("#{x}")),
        };
        let parameter = object(&[("list", Value::array(vec![]))]);
        assert_eq!(render(&node, &parameter), "");
    }

    #[test]
    fn test_text_substitution_is_textual() {
        let node = SqlNode::text("ORDER BY ${column}");
        let parameter = object(&[("column", Value::text("created_at"))]);
        assert_eq!(render(&node, &parameter), "ORDER BY created_at");
    }

    #[test]
    fn test_injection_filter_rejects() {
        let node = SqlNode::Text {
            text: "ORDER BY ${column}".to_string(),
            injection_filter: Some(Regex::new(r"^[a-zA-Z0-9_]+$").unwrap()),
        };
        let ok = object(&[("column", Value::text("created_at"))]);
        assert_eq!(render(&node, &ok), "ORDER BY created_at");

        let bad = object(&[("column", Value::text("1; drop table posts"))]);
        let mut ctx = DynamicContext::new(&bad, None);
        assert!(node.apply(&mut ctx).is_err());
    }

    #[test]
    fn test_bind_variable() {
        let node = SqlNode::Mixed(vec![
            SqlNode::VarDecl {
                name: "pattern".to_string(),
                expression: "title".to_string(),
            },
            SqlNode::text("LIKE '${pattern}'"),
        ]);
        let parameter = object(&[("title", Value::text("rust%"))]);
        assert_eq!(render(&node, &parameter), "LIKE 'rust%'");
    }

    #[test]
    fn test_is_dynamic() {
        assert!(!SqlNode::static_text("select 1").is_dynamic());
        assert!(SqlNode::text("select ${x}").is_dynamic());
        assert!(!SqlNode::Mixed(vec![SqlNode::static_text("a")]).is_dynamic());
        assert!(SqlNode::Mixed(vec![SqlNode::text("${x}")]).is_dynamic());
    }
}
