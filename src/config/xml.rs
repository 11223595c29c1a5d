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

//! XML builders
//!
//! Parses `<configuration>` and `<mapper>` documents into the registry:
//! settings (unknown keys fatal), type aliases, environments, caches and
//! cache-refs, result maps (with inline associations, collections and
//! discriminators), `<sql>` fragments with `<include>` expansion, and the
//! dynamic SQL element tree. `${key}` placeholders are substituted in
//! attribute values from the configuration properties; statement text keeps
//! its `${}` tokens for runtime substitution.

use std::collections::HashMap;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use log::debug;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use rustc_hash::FxHashMap;

use crate::cache::{CacheBuilder, Eviction};
use crate::core::{DataType, Error, Result};
use crate::driver::{DataSource, ResultSetType};
use crate::mapping::{
    parse_data_type, Discriminator, KeyGeneratorSpec, MappedStatement, ResultFlags, ResultMap,
    ResultMapping, StatementKind,
};
use crate::parsing::resolve_placeholders;
use crate::scripting::{SqlNode, SqlSource};

use super::{Configuration, Environment};

// =============================================================================
// Minimal DOM
// =============================================================================

/// One parsed element
#[derive(Debug, Clone)]
pub struct XNode {
    pub name: String,
    attributes: Vec<(String, String)>,
    pub children: Vec<XContent>,
}

/// Element content: child elements interleaved with text
#[derive(Debug, Clone)]
pub enum XContent {
    Element(XNode),
    Text(String),
}

impl XNode {
    /// Parse a document's root element, substituting `${}` placeholders in
    /// attribute values from `variables`
    pub fn parse(xml: &str, variables: &HashMap<String, String>) -> Result<XNode> {
        let mut reader = Reader::from_str(xml);
        reader.trim_text(true);

        let mut stack: Vec<XNode> = Vec::new();
        let mut root: Option<XNode> = None;
        loop {
            let event = reader
                .read_event()
                .map_err(|e| Error::malformed(e.to_string()))?;
            match event {
                Event::Start(e) => {
                    stack.push(make_node(&e, variables)?);
                }
                Event::Empty(e) => {
                    let node = make_node(&e, variables)?;
                    attach(&mut stack, &mut root, node)?;
                }
                Event::Text(t) => {
                    let text = t
                        .unescape()
                        .map_err(|e| Error::malformed(e.to_string()))?
                        .to_string();
                    if let Some(parent) = stack.last_mut() {
                        if !text.is_empty() {
                            parent.children.push(XContent::Text(text));
                        }
                    }
                }
                Event::CData(t) => {
                    let text = String::from_utf8_lossy(&t.into_inner()).to_string();
                    if let Some(parent) = stack.last_mut() {
                        parent.children.push(XContent::Text(text));
                    }
                }
                Event::End(_) => {
                    let node = stack
                        .pop()
                        .ok_or_else(|| Error::malformed("unbalanced end tag"))?;
                    attach(&mut stack, &mut root, node)?;
                }
                Event::Eof => break,
                _ => {}
            }
        }
        root.ok_or_else(|| Error::malformed("document has no root element"))
    }

    /// Attribute value by name
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    /// Attribute value or a malformed-document error
    pub fn required_attr(&self, name: &str) -> Result<&str> {
        self.attr(name).ok_or_else(|| {
            Error::malformed(format!(
                "element <{}> is missing required attribute '{}'",
                self.name, name
            ))
        })
    }

    fn bool_attr(&self, name: &str) -> Option<bool> {
        self.attr(name).map(|v| v == "true")
    }

    /// Child elements in document order
    pub fn elements(&self) -> impl Iterator<Item = &XNode> {
        self.children.iter().filter_map(|c| match c {
            XContent::Element(node) => Some(node),
            XContent::Text(_) => None,
        })
    }

    /// First child element with `name`
    pub fn element(&self, name: &str) -> Option<&XNode> {
        self.elements().find(|e| e.name == name)
    }
}

fn make_node(e: &BytesStart<'_>, variables: &HashMap<String, String>) -> Result<XNode> {
    let name = String::from_utf8_lossy(e.name().as_ref()).to_string();
    let mut attributes = Vec::new();
    for attr in e.attributes() {
        let attr = attr.map_err(|err| Error::malformed(err.to_string()))?;
        let key = String::from_utf8_lossy(attr.key.as_ref()).to_string();
        let raw = attr
            .unescape_value()
            .map_err(|err| Error::malformed(err.to_string()))?
            .to_string();
        attributes.push((key, resolve_placeholders(&raw, variables)));
    }
    Ok(XNode {
        name,
        attributes,
        children: Vec::new(),
    })
}

fn attach(stack: &mut Vec<XNode>, root: &mut Option<XNode>, node: XNode) -> Result<()> {
    match stack.last_mut() {
        Some(parent) => {
            parent.children.push(XContent::Element(node));
            Ok(())
        }
        None => {
            if root.is_some() {
                return Err(Error::malformed("multiple root elements"));
            }
            *root = Some(node);
            Ok(())
        }
    }
}

// =============================================================================
// Mapper documents
// =============================================================================

/// Builder for one `<mapper>` document
pub struct XmlMapperBuilder<'c> {
    config: &'c mut Configuration,
    namespace: String,
    fragments: FxHashMap<String, XNode>,
    cache_active: bool,
}

impl<'c> XmlMapperBuilder<'c> {
    /// Parse a mapper document into the configuration
    pub fn parse(config: &'c mut Configuration, xml: &str) -> Result<()> {
        let variables = config.properties.clone();
        let root = XNode::parse(xml, &variables)?;
        if root.name != "mapper" {
            return Err(Error::malformed(format!(
                "expected <mapper> root, found <{}>",
                root.name
            )));
        }
        let namespace = root.required_attr("namespace")?.to_string();
        let mut builder = XmlMapperBuilder {
            config,
            namespace,
            fragments: FxHashMap::default(),
            cache_active: false,
        };
        builder.parse_root(&root)
    }

    fn parse_root(&mut self, root: &XNode) -> Result<()> {
        // fragments first so <include> can reference forward declarations
        for node in root.elements() {
            if node.name == "sql" {
                let id = node.required_attr("id")?.to_string();
                self.fragments.insert(id.clone(), node.clone());
                self.fragments
                    .insert(format!("{}.{}", self.namespace, id), node.clone());
            }
        }
        // cache declarations decide statement cache binding
        for node in root.elements() {
            match node.name.as_str() {
                "cache" => self.parse_cache(node)?,
                "cache-ref" => {
                    let referenced = node.required_attr("namespace")?.to_string();
                    self.config.add_cache_ref(self.namespace.clone(), referenced);
                    self.cache_active = true;
                }
                _ => {}
            }
        }
        for node in root.elements() {
            match node.name.as_str() {
                "resultMap" => {
                    self.parse_result_map(node, None)?;
                }
                "select" | "insert" | "update" | "delete" => self.parse_statement(node)?,
                "sql" | "cache" | "cache-ref" => {}
                other => {
                    return Err(Error::malformed(format!(
                        "unexpected element <{}> in mapper '{}'",
                        other, self.namespace
                    )))
                }
            }
        }
        Ok(())
    }

    fn parse_cache(&mut self, node: &XNode) -> Result<()> {
        let mut builder = CacheBuilder::new(self.namespace.clone());
        if let Some(eviction) = node.attr("eviction") {
            builder = builder.eviction(Eviction::from_str(eviction)?);
        }
        if let Some(interval) = node.attr("flushInterval") {
            let millis: u64 = interval.parse().map_err(|_| {
                Error::malformed(format!("invalid flushInterval '{}'", interval))
            })?;
            builder = builder.flush_interval(Duration::from_millis(millis));
        }
        if let Some(size) = node.attr("size") {
            let size: usize = size
                .parse()
                .map_err(|_| Error::malformed(format!("invalid cache size '{}'", size)))?;
            builder = builder.size(size);
        }
        if let Some(read_only) = node.bool_attr("readOnly") {
            builder = builder.read_only(read_only);
        }
        if let Some(blocking) = node.bool_attr("blocking") {
            builder = builder.blocking(blocking);
        }
        self.config.add_cache(builder.build());
        self.cache_active = true;
        Ok(())
    }

    // =========================================================================
    // Result maps
    // =========================================================================

    /// Build one result map; `inline_id` names synthesized nested maps
    fn parse_result_map(&mut self, node: &XNode, inline_id: Option<String>) -> Result<String> {
        let id = match inline_id {
            Some(id) => id,
            None => format!("{}.{}", self.namespace, node.required_attr("id")?),
        };
        let type_name = node
            .attr("type")
            .or_else(|| node.attr("ofType"))
            .or_else(|| node.attr("javaType"))
            .unwrap_or("map")
            .to_string();
        let type_name = self.config.resolve_type_alias(&type_name).to_string();

        let mut builder = ResultMap::builder(id.clone(), type_name);
        if let Some(auto) = node.bool_attr("autoMapping") {
            builder = builder.auto_mapping(auto);
        }

        for child in node.elements().cloned().collect::<Vec<_>>() {
            match child.name.as_str() {
                "constructor" => {
                    for (i, arg) in child.elements().cloned().collect::<Vec<_>>().iter().enumerate()
                    {
                        let property = arg
                            .attr("name")
                            .map(String::from)
                            .unwrap_or_else(|| format!("arg{}", i));
                        let flags = ResultFlags {
                            id: arg.name == "idArg",
                            constructor: true,
                        };
                        let mapping = self.parse_mapping(arg, property, flags, &id)?;
                        builder = builder.mapping(mapping);
                    }
                }
                "id" | "result" => {
                    let property = child.required_attr("property")?.to_string();
                    let flags = ResultFlags {
                        id: child.name == "id",
                        constructor: false,
                    };
                    let mapping = self.parse_mapping(&child, property, flags, &id)?;
                    builder = builder.mapping(mapping);
                }
                "association" | "collection" => {
                    let property = child.required_attr("property")?.to_string();
                    let mut mapping =
                        self.parse_mapping(&child, property, ResultFlags::default(), &id)?;
                    if child.name == "collection" {
                        mapping.data_type = Some(DataType::Array);
                    } else if mapping.data_type.is_none() {
                        mapping.data_type = Some(DataType::Object);
                    }
                    builder = builder.mapping(mapping);
                }
                "discriminator" => {
                    builder = builder.discriminator(self.parse_discriminator(&child, &id)?);
                }
                other => {
                    return Err(Error::malformed(format!(
                        "unexpected element <{}> in result map '{}'",
                        other, id
                    )))
                }
            }
        }

        let result_map = builder.build()?;
        self.config.add_result_map(result_map)?;
        Ok(id)
    }

    fn parse_mapping(
        &mut self,
        node: &XNode,
        property: String,
        flags: ResultFlags,
        owner_id: &str,
    ) -> Result<ResultMapping> {
        let mut mapping = ResultMapping::column(property.clone(), "");
        mapping.column = None;
        mapping.flags = flags;

        if let Some(column) = node.attr("column") {
            if let Some(composite) = column.strip_prefix('{').and_then(|c| c.strip_suffix('}')) {
                for pair in composite.split(',') {
                    let (prop, col) = pair.split_once('=').ok_or_else(|| {
                        Error::malformed(format!("invalid composite column '{}'", column))
                    })?;
                    mapping
                        .composites
                        .push((prop.trim().to_string(), col.trim().to_string()));
                }
            } else {
                mapping.column = Some(column.to_string());
            }
        }
        if let Some(java_type) = node.attr("javaType").or_else(|| node.attr("ofType")) {
            let resolved = self.config.resolve_type_alias(java_type).to_string();
            if let Ok(data_type) = parse_data_type(&resolved) {
                mapping.data_type = Some(data_type);
            }
        }
        if let Some(jdbc_type) = node.attr("jdbcType") {
            mapping.jdbc_type = Some(jdbc_type.parse()?);
        }
        if let Some(handler) = node.attr("typeHandler") {
            mapping.type_handler = Some(handler.to_string());
        }
        if let Some(select) = node.attr("select") {
            mapping.nested_query_id = Some(self.qualify(select));
        }
        if let Some(nested) = node.attr("resultMap") {
            mapping.nested_result_map_id = Some(self.qualify(nested));
        }
        if let Some(prefix) = node.attr("columnPrefix") {
            mapping.column_prefix = Some(prefix.to_string());
        }
        if let Some(not_null) = node.attr("notNullColumn") {
            mapping.not_null_columns = split_list(not_null);
        }
        if let Some(foreign) = node.attr("foreignColumn") {
            mapping.foreign_column = Some(foreign.to_string());
        }
        if let Some(result_set) = node.attr("resultSet") {
            mapping.result_set = Some(result_set.to_string());
        }
        mapping.lazy = match node.attr("fetchType") {
            Some("lazy") => true,
            Some("eager") => false,
            _ => self.config.settings.lazy_loading_enabled && mapping.nested_query_id.is_some(),
        };

        // inline nested children synthesize an anonymous result map
        let has_inline_children = node.elements().next().is_some()
            && matches!(node.name.as_str(), "association" | "collection" | "case");
        if has_inline_children
            && mapping.nested_result_map_id.is_none()
            && mapping.nested_query_id.is_none()
        {
            let inline_id = format!("{}_{}_{}", owner_id, node.name, property);
            let id = self.parse_result_map(node, Some(inline_id))?;
            mapping.nested_result_map_id = Some(id);
        }

        mapping.validate()?;
        Ok(mapping)
    }

    fn parse_discriminator(&mut self, node: &XNode, owner_id: &str) -> Result<Discriminator> {
        let column = node.required_attr("column")?.to_string();
        let data_type = node
            .attr("javaType")
            .map(|t| self.config.resolve_type_alias(t).to_string())
            .and_then(|t| parse_data_type(&t).ok());
        let jdbc_type = node.attr("jdbcType").map(str::parse).transpose()?;
        let mut cases = Vec::new();
        for case in node.elements().cloned().collect::<Vec<_>>() {
            if case.name != "case" {
                continue;
            }
            let value = case.required_attr("value")?.to_string();
            let map_id = if let Some(referenced) = case.attr("resultMap") {
                self.qualify(referenced)
            } else {
                let inline_id = format!("{}_case_{}", owner_id, value);
                self.parse_result_map(&case, Some(inline_id))?
            };
            cases.push((value, map_id));
        }
        Ok(Discriminator {
            column,
            data_type,
            jdbc_type,
            cases,
        })
    }

    // =========================================================================
    // Statements
    // =========================================================================

    fn parse_statement(&mut self, node: &XNode) -> Result<()> {
        let id = format!("{}.{}", self.namespace, node.required_attr("id")?);
        let kind: StatementKind = node.name.parse()?;

        // vendor-tagged statements only apply to their database id
        if let Some(database_id) = node.attr("databaseId") {
            if self.config.database_id.as_deref() != Some(database_id) {
                return Ok(());
            }
        } else if self.config.has_statement(&id) {
            // a vendor-specific variant already won
            return Ok(());
        }

        let mut key_generator = KeyGeneratorSpec::None;
        if let Some(select_key) = node.element("selectKey") {
            key_generator = self.parse_select_key(select_key, &id)?;
        } else {
            let use_keys = node
                .bool_attr("useGeneratedKeys")
                .unwrap_or(self.config.settings.use_generated_keys && kind == StatementKind::Insert);
            if use_keys {
                key_generator = KeyGeneratorSpec::GeneratedKeys {
                    key_properties: node.attr("keyProperty").map(split_list).unwrap_or_default(),
                    key_columns: node.attr("keyColumn").map(split_list).unwrap_or_default(),
                };
            }
        }

        let body = self.parse_dynamic(node)?;
        let sql_source = SqlSource::from_node(body, &self.config.type_handlers)?;

        let result_map_ids = if let Some(result_map) = node.attr("resultMap") {
            split_list(result_map)
                .into_iter()
                .map(|m| self.qualify(&m))
                .collect()
        } else if let Some(result_type) = node.attr("resultType") {
            let type_name = self.config.resolve_type_alias(result_type).to_string();
            let inline_id = format!("{}-Inline", id);
            if !self.config.has_result_map(&inline_id) {
                self.config
                    .add_result_map(ResultMap::builder(inline_id.clone(), type_name).build()?)?;
            }
            vec![inline_id]
        } else {
            Vec::new()
        };

        let mut builder = MappedStatement::builder(id, kind, sql_source)
            .result_maps(result_map_ids)
            .key_generator(key_generator);

        if let Some(statement_type) = node.attr("statementType") {
            builder = builder.statement_type(statement_type.parse()?);
        }
        if let Some(flush) = node.bool_attr("flushCache") {
            builder = builder.flush_cache(flush);
        }
        if let Some(use_cache) = node.bool_attr("useCache") {
            builder = builder.use_cache(use_cache);
        }
        if let Some(timeout) = node.attr("timeout") {
            let seconds: u64 = timeout
                .parse()
                .map_err(|_| Error::malformed(format!("invalid timeout '{}'", timeout)))?;
            builder = builder.timeout(seconds);
        }
        if let Some(ordered) = node.bool_attr("resultOrdered") {
            builder = builder.result_ordered(ordered);
        }
        if let Some(result_sets) = node.attr("resultSets") {
            builder = builder.result_sets(split_list(result_sets));
        }
        if let Some(rst) = node.attr("resultSetType") {
            builder = builder.result_set_type(parse_result_set_type(rst)?);
        }
        if let Some(database_id) = node.attr("databaseId") {
            builder = builder.database_id(database_id);
        }
        if self.cache_active {
            builder = builder.cache_namespace(self.namespace.clone());
        }

        self.config.add_statement(builder.build())
    }

    fn parse_select_key(&mut self, node: &XNode, parent_id: &str) -> Result<KeyGeneratorSpec> {
        let key_statement_id = format!("{}!selectKey", parent_id);
        let key_properties = split_list(node.required_attr("keyProperty")?);
        let before = node
            .attr("order")
            .map(|o| o.eq_ignore_ascii_case("BEFORE"))
            .unwrap_or(false);

        let body = self.parse_dynamic(node)?;
        let sql_source = SqlSource::from_node(body, &self.config.type_handlers)?;
        let result_type = node
            .attr("resultType")
            .map(|t| self.config.resolve_type_alias(t).to_string())
            .unwrap_or_else(|| "map".to_string());
        let inline_id = format!("{}-Inline", key_statement_id);
        self.config
            .add_result_map(ResultMap::builder(inline_id.clone(), result_type).build()?)?;
        self.config.add_statement(
            MappedStatement::builder(key_statement_id.clone(), StatementKind::Select, sql_source)
                .result_map(inline_id)
                .use_cache(false)
                .build(),
        )?;

        Ok(KeyGeneratorSpec::SelectKey {
            statement_id: key_statement_id,
            key_properties,
            before,
        })
    }

    // =========================================================================
    // Dynamic SQL elements
    // =========================================================================

    fn parse_dynamic(&self, node: &XNode) -> Result<SqlNode> {
        let mut children = Vec::new();
        for content in &node.children {
            match content {
                XContent::Text(text) => {
                    let text = text.trim();
                    if text.is_empty() {
                        continue;
                    }
                    if text.contains("${") {
                        children.push(SqlNode::text(text));
                    } else {
                        children.push(SqlNode::static_text(text));
                    }
                }
                XContent::Element(element) => match element.name.as_str() {
                    "include" => {
                        let refid = element.required_attr("refid")?;
                        let fragment = self.fragments.get(refid).cloned().ok_or_else(|| {
                            Error::malformed(format!("unknown sql fragment '{}'", refid))
                        })?;
                        children.push(self.parse_dynamic(&fragment)?);
                    }
                    "if" => children.push(SqlNode::If {
                        test: element.required_attr("test")?.to_string(),
                        body: Box::new(self.parse_dynamic(element)?),
                    }),
                    "choose" => {
                        let mut whens = Vec::new();
                        let mut otherwise = None;
                        for branch in element.elements() {
                            match branch.name.as_str() {
                                "when" => whens.push((
                                    branch.required_attr("test")?.to_string(),
                                    self.parse_dynamic(branch)?,
                                )),
                                "otherwise" => {
                                    otherwise = Some(Box::new(self.parse_dynamic(branch)?))
                                }
                                other => {
                                    return Err(Error::malformed(format!(
                                        "unexpected element <{}> in <choose>",
                                        other
                                    )))
                                }
                            }
                        }
                        children.push(SqlNode::Choose { whens, otherwise });
                    }
                    "where" => {
                        children.push(SqlNode::where_node(self.parse_dynamic(element)?))
                    }
                    "set" => children.push(SqlNode::set_node(self.parse_dynamic(element)?)),
                    "trim" => children.push(SqlNode::Trim {
                        body: Box::new(self.parse_dynamic(element)?),
                        prefix: element.attr("prefix").map(String::from),
                        suffix: element.attr("suffix").map(String::from),
                        prefix_overrides: split_overrides(element.attr("prefixOverrides")),
                        suffix_overrides: split_overrides(element.attr("suffixOverrides")),
                    }),
                    "foreach" => children.push(SqlNode::Foreach {
                        collection: element.required_attr("collection")?.to_string(),
                        item: element.attr("item").map(String::from),
                        index: element.attr("index").map(String::from),
                        open: element.attr("open").map(String::from),
                        close: element.attr("close").map(String::from),
                        separator: element.attr("separator").map(String::from),
                        body: Box::new(self.parse_dynamic(element)?),
                    }),
                    "bind" => children.push(SqlNode::VarDecl {
                        name: element.required_attr("name")?.to_string(),
                        expression: element.required_attr("value")?.to_string(),
                    }),
                    "selectKey" => {} // handled by the statement builder
                    other => {
                        return Err(Error::malformed(format!(
                            "unexpected dynamic element <{}>",
                            other
                        )))
                    }
                },
            }
        }
        Ok(SqlNode::Mixed(children))
    }

    /// Qualify a referenced id with this mapper's namespace when bare
    fn qualify(&self, id: &str) -> String {
        if id.contains('.') {
            id.to_string()
        } else {
            format!("{}.{}", self.namespace, id)
        }
    }
}

// =============================================================================
// Configuration documents
// =============================================================================

/// A `<mappers>` entry for the caller to load
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MapperSource {
    pub resource: Option<String>,
    pub url: Option<String>,
}

/// Creates data sources for `<dataSource type="...">` declarations
pub type DataSourceFactory<'f> =
    dyn Fn(&str, &HashMap<String, String>) -> Result<Arc<dyn DataSource>> + 'f;

/// Parse a `<configuration>` document
///
/// Returns the configuration and the declared mapper sources; the caller
/// resolves each source's content and feeds it to [`XmlMapperBuilder`].
pub fn parse_config(
    xml: &str,
    data_source_factory: &DataSourceFactory<'_>,
) -> Result<(Configuration, Vec<MapperSource>)> {
    let mut config = Configuration::new();
    let mut mappers = Vec::new();

    let root = XNode::parse(xml, &HashMap::new())?;
    if root.name != "configuration" {
        return Err(Error::malformed(format!(
            "expected <configuration> root, found <{}>",
            root.name
        )));
    }

    for node in root.elements() {
        match node.name.as_str() {
            "properties" => {
                if node.attr("resource").is_some() && node.attr("url").is_some() {
                    return Err(Error::malformed(
                        "<properties> resource and url are mutually exclusive",
                    ));
                }
                for property in node.elements() {
                    if property.name == "property" {
                        config.properties.insert(
                            property.required_attr("name")?.to_string(),
                            property.required_attr("value")?.to_string(),
                        );
                    }
                }
            }
            "settings" => {
                for setting in node.elements() {
                    if setting.name == "setting" {
                        config.settings.apply(
                            setting.required_attr("name")?,
                            setting.required_attr("value")?,
                        )?;
                    }
                }
            }
            "typeAliases" => {
                for alias in node.elements() {
                    if alias.name == "typeAlias" {
                        config.add_type_alias(
                            alias.required_attr("alias")?,
                            alias.required_attr("type")?,
                        );
                    }
                }
            }
            "environments" => {
                let default = node.required_attr("default")?;
                for environment in node.elements() {
                    if environment.name != "environment"
                        || environment.required_attr("id")? != default
                    {
                        continue;
                    }
                    let managed = environment
                        .element("transactionManager")
                        .and_then(|tm| tm.attr("type"))
                        .map(|t| t.eq_ignore_ascii_case("MANAGED"))
                        .unwrap_or(false);
                    let data_source_node =
                        environment.element("dataSource").ok_or_else(|| {
                            Error::malformed("environment is missing <dataSource>")
                        })?;
                    let ds_type = data_source_node.required_attr("type")?;
                    let mut properties = HashMap::new();
                    for property in data_source_node.elements() {
                        if property.name == "property" {
                            properties.insert(
                                property.required_attr("name")?.to_string(),
                                resolve_placeholders(
                                    property.required_attr("value")?,
                                    &config.properties,
                                ),
                            );
                        }
                    }
                    let data_source = data_source_factory(ds_type, &properties)?;
                    let mut env = Environment::new(default, data_source);
                    env.managed = managed;
                    config.environment = Some(env);
                }
            }
            "mappers" => {
                for mapper in node.elements() {
                    if mapper.name == "mapper" {
                        mappers.push(MapperSource {
                            resource: mapper.attr("resource").map(String::from),
                            url: mapper.attr("url").map(String::from),
                        });
                    }
                }
            }
            "databaseIdProvider" | "plugins" | "objectFactory" | "objectWrapperFactory"
            | "reflectorFactory" | "typeHandlers" => {
                debug!("skipping externally provided section <{}>", node.name);
            }
            other => {
                return Err(Error::malformed(format!(
                    "unexpected element <{}> in configuration",
                    other
                )))
            }
        }
    }

    Ok((config, mappers))
}

fn parse_result_set_type(value: &str) -> Result<ResultSetType> {
    match value.to_ascii_uppercase().as_str() {
        "DEFAULT" => Ok(ResultSetType::Default),
        "FORWARD_ONLY" => Ok(ResultSetType::ForwardOnly),
        "SCROLL_INSENSITIVE" => Ok(ResultSetType::ScrollInsensitive),
        "SCROLL_SENSITIVE" => Ok(ResultSetType::ScrollSensitive),
        other => Err(Error::malformed(format!(
            "unknown resultSetType '{}'",
            other
        ))),
    }
}

fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

fn split_overrides(value: Option<&str>) -> Vec<String> {
    value
        .map(|v| v.split('|').map(String::from).collect())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Value;

    const MAPPER: &str = r#"
    <mapper namespace="blog.PostMapper">
      <cache eviction="FIFO" size="128" readOnly="true"/>
      <sql id="columns">id, title, author_id</sql>
      <resultMap id="postMap" type="map">
        <id property="id" column="post_id"/>
        <result property="subject" column="post_subject"/>
        <collection property="comments" ofType="map" resultMap="blog.CommentMapper.commentMap"/>
      </resultMap>
      <select id="selectPost" resultMap="postMap" useCache="false">
        select <include refid="columns"/> from post
        <where>
          <if test="id != null">AND id = #{id}</if>
        </where>
      </select>
      <insert id="insertPost" useGeneratedKeys="true" keyProperty="id">
        insert into post (title) values (#{title})
      </insert>
    </mapper>
    "#;

    #[test]
    fn test_mapper_document_parses() {
        let mut config = Configuration::new();
        XmlMapperBuilder::parse(&mut config, MAPPER).unwrap();

        let select = config.statement("blog.PostMapper.selectPost").unwrap();
        assert_eq!(select.kind, StatementKind::Select);
        assert!(!select.use_cache);
        assert_eq!(
            select.cache_namespace.as_deref(),
            Some("blog.PostMapper")
        );
        assert_eq!(select.result_map_ids, vec!["blog.PostMapper.postMap"]);

        let insert = config.statement("blog.PostMapper.insertPost").unwrap();
        assert!(matches!(
            insert.key_generator,
            KeyGeneratorSpec::GeneratedKeys { .. }
        ));

        let map = config.result_map("blog.PostMapper.postMap").unwrap();
        assert_eq!(map.id_indices.len(), 1);
        assert!(map.has_nested_result_maps);
        assert!(config.cache("blog.PostMapper").is_some());
    }

    #[test]
    fn test_include_expansion_and_dynamic_where() {
        let mut config = Configuration::new();
        XmlMapperBuilder::parse(&mut config, MAPPER).unwrap();
        let select = config.statement("blog.PostMapper.selectPost").unwrap();

        let mut with_id = crate::core::ObjectMap::new();
        with_id.insert("id".to_string(), Value::Integer(5));
        let bound = select
            .bound_sql(&config.type_handlers, &Value::Object(with_id), None)
            .unwrap();
        assert_eq!(
            bound.sql,
            "select id, title, author_id from post WHERE id = ?"
        );

        let bound_empty = select
            .bound_sql(&config.type_handlers, &Value::empty_object(), None)
            .unwrap();
        assert_eq!(bound_empty.sql, "select id, title, author_id from post");
    }

    #[test]
    fn test_unknown_fragment_rejected() {
        let xml = r#"
        <mapper namespace="m">
          <select id="s" resultType="map">select <include refid="missing"/></select>
        </mapper>"#;
        let mut config = Configuration::new();
        assert!(XmlMapperBuilder::parse(&mut config, xml).is_err());
    }

    #[test]
    fn test_inline_association_synthesizes_map() {
        let xml = r#"
        <mapper namespace="m">
          <resultMap id="postMap" type="map">
            <id property="id" column="id"/>
            <association property="author" columnPrefix="author_">
              <id property="id" column="id"/>
              <result property="name" column="name"/>
            </association>
          </resultMap>
        </mapper>"#;
        let mut config = Configuration::new();
        XmlMapperBuilder::parse(&mut config, xml).unwrap();

        let map = config.result_map("m.postMap").unwrap();
        let nested = map
            .mappings
            .iter()
            .find(|m| m.property == "author")
            .unwrap();
        let nested_id = nested.nested_result_map_id.as_ref().unwrap();
        assert!(config.has_result_map(nested_id));
        assert_eq!(nested.column_prefix.as_deref(), Some("author_"));
    }

    #[test]
    fn test_select_key_registers_statement() {
        let xml = r#"
        <mapper namespace="m">
          <insert id="insertPost">
            <selectKey keyProperty="id" order="BEFORE" resultType="integer">
              select nextval('post_seq')
            </selectKey>
            insert into post (id, title) values (#{id}, #{title})
          </insert>
        </mapper>"#;
        let mut config = Configuration::new();
        XmlMapperBuilder::parse(&mut config, xml).unwrap();

        let insert = config.statement("m.insertPost").unwrap();
        match &insert.key_generator {
            KeyGeneratorSpec::SelectKey {
                statement_id,
                before,
                key_properties,
            } => {
                assert!(before);
                assert_eq!(key_properties, &vec!["id".to_string()]);
                assert!(config.has_statement(statement_id));
            }
            other => panic!("expected select-key generator, got {:?}", other),
        }
    }

    #[test]
    fn test_bound_sql_with_bind_and_substitution() {
        let xml = r#"
        <mapper namespace="m">
          <select id="search" resultType="map">
            <bind name="pattern" value="title"/>
            select * from post where title like '${pattern}'
          </select>
        </mapper>"#;
        let mut config = Configuration::new();
        XmlMapperBuilder::parse(&mut config, xml).unwrap();
        let select = config.statement("m.search").unwrap();

        let mut parameter = crate::core::ObjectMap::new();
        parameter.insert("title".to_string(), Value::text("rust%"));
        let bound = select
            .bound_sql(&config.type_handlers, &Value::Object(parameter), None)
            .unwrap();
        assert_eq!(bound.sql, "select * from post where title like 'rust%'");
    }

    #[test]
    fn test_config_document() {
        let xml = r#"
        <configuration>
          <properties>
            <property name="db.user" value="app"/>
          </properties>
          <settings>
            <setting name="mapUnderscoreToCamelCase" value="true"/>
            <setting name="cacheEnabled" value="true"/>
          </settings>
          <typeAliases>
            <typeAlias alias="Post" type="map"/>
          </typeAliases>
          <environments default="dev">
            <environment id="dev">
              <transactionManager type="JDBC"/>
              <dataSource type="TEST">
                <property name="user" value="${db.user}"/>
              </dataSource>
            </environment>
          </environments>
          <mappers>
            <mapper resource="blog/PostMapper.xml"/>
          </mappers>
        </configuration>"#;

        struct NoDataSource;
        impl DataSource for NoDataSource {
            fn connection(&self) -> Result<Box<dyn crate::driver::Connection>> {
                Err(Error::driver("test data source opens no connections"))
            }
        }

        let seen = std::cell::RefCell::new(HashMap::new());
        let factory = |ds_type: &str,
                       props: &HashMap<String, String>|
         -> Result<Arc<dyn DataSource>> {
            seen.borrow_mut().insert(ds_type.to_string(), props.clone());
            Ok(Arc::new(NoDataSource))
        };
        let (config, mappers) = parse_config(xml, &factory).unwrap();

        assert!(config.settings.map_underscore_to_camel_case);
        assert_eq!(config.resolve_type_alias("Post"), "map");
        assert!(config.environment.is_some());
        assert_eq!(
            mappers,
            vec![MapperSource {
                resource: Some("blog/PostMapper.xml".to_string()),
                url: None,
            }]
        );
        // the environment property went through placeholder substitution
        let seen = seen.borrow();
        assert_eq!(
            seen.get("TEST").and_then(|p| p.get("user")).map(String::as_str),
            Some("app")
        );
    }

    #[test]
    fn test_unknown_setting_fails_load() {
        let xml = r#"
        <configuration>
          <settings><setting name="nope" value="1"/></settings>
        </configuration>"#;
        let factory = |_: &str, _: &HashMap<String, String>| -> Result<Arc<dyn DataSource>> {
            Err(Error::driver("unused"))
        };
        assert!(matches!(
            parse_config(xml, &factory),
            Err(Error::UnknownSetting(_))
        ));
    }

    #[test]
    fn test_trim_overrides_from_document() {
        let xml = r#"
        <mapper namespace="m">
          <select id="s" resultType="map">
            select * from t
            <trim prefix="WHERE" prefixOverrides="AND |OR ">
              AND a = #{a}
            </trim>
          </select>
        </mapper>"#;
        let mut config = Configuration::new();
        XmlMapperBuilder::parse(&mut config, xml).unwrap();
        let select = config.statement("m.s").unwrap();

        let mut parameter = crate::core::ObjectMap::new();
        parameter.insert("a".to_string(), Value::Integer(1));
        let bound = select
            .bound_sql(&config.type_handlers, &Value::Object(parameter), None)
            .unwrap();
        assert_eq!(bound.sql, "select * from t WHERE a = ?");
    }
}
